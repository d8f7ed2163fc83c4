//! Bit Helpers
//!
//! Conversions scripts use to move between boolean pin sequences and numbers.
//! Sequences are least-significant bit first.

use serde_json::Value;

/// Read a bit sequence as an unsigned integer. Bits past 64 are ignored.
pub fn to_int(bits: &[bool]) -> u64 {
    bits.iter()
        .take(64)
        .enumerate()
        .filter(|(_, &b)| b)
        .fold(0, |acc, (i, _)| acc | (1 << i))
}

/// Minimal bit sequence for `n`. Zero is the empty sequence.
pub fn from_int(n: u64) -> Vec<bool> {
    let width = (u64::BITS - n.leading_zeros()) as usize;
    from_int_width(n, width)
}

/// Exactly `width` bits of `n`, padding with `false` past bit 63.
pub fn from_int_width(n: u64, width: usize) -> Vec<bool> {
    (0..width)
        .map(|i| i < 64 && (n >> i) & 1 == 1)
        .collect()
}

/// Bit sequence as a JSON array of booleans, for script memory.
pub fn to_array(bits: &[bool]) -> Value {
    Value::Array(bits.iter().copied().map(Value::Bool).collect())
}

/// JSON array back to bits. Non-arrays decode as empty; elements use JSON
/// truthiness (`false`, `null`, `0`, `""` are false).
pub fn from_array(value: &Value) -> Vec<bool> {
    match value {
        Value::Array(items) => items.iter().map(truthy).collect(),
        _ => Vec::new(),
    }
}

fn truthy(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_f64().map(|f| f != 0.0).unwrap_or(false),
        Value::String(s) => !s.is_empty(),
        Value::Array(_) | Value::Object(_) => true,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn lsb_first() {
        assert_eq!(from_int(6), vec![false, true, true]);
        assert_eq!(to_int(&[true, false, true]), 5);
        assert!(from_int(0).is_empty());
    }

    #[test]
    fn int_round_trip() {
        for n in [0, 1, 2, 3, 255, 256, 1 << 40, u64::MAX - 1, u64::MAX] {
            assert_eq!(to_int(&from_int(n)), n);
        }
    }

    #[test]
    fn fixed_width() {
        assert_eq!(from_int_width(1, 4), vec![true, false, false, false]);
        assert_eq!(from_int_width(7, 2), vec![true, true]);
        assert_eq!(from_int_width(u64::MAX, 66).len(), 66);
    }

    #[test]
    fn array_round_trip() {
        let seqs: [&[bool]; 3] = [&[], &[true], &[false, true, true, false]];
        for seq in seqs {
            assert_eq!(from_array(&to_array(seq)), seq);
        }
    }

    #[test]
    fn loose_arrays() {
        assert_eq!(from_array(&json!([1, 0, "x", null])), vec![true, false, true, false]);
        assert!(from_array(&json!({"a": 1})).is_empty());
    }
}
