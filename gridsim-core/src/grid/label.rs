//! Connectivity Labeling
//!
//! Turns a [`Grid`] into a label matrix of the same size that groups
//! orthogonally adjacent cells of the same code into one logical node.
//!
//! # Label values
//!
//! - `0`: empty, never labeled
//! - positive: id of a connected group of like-typed cells
//! - [`BOUNDARY_LABEL`] (`-1`): an in/out/clock-in connector, always a singleton
//! - [`CROSS_LABEL`] (`-2`): a cross cell
//!
//! # Algorithm
//!
//! We relabel until a fixed point instead of running a one-pass union-find.
//! Each pass scans row-major; a cell adopts the label of a same-kind
//! neighbor to its left, else above, else keeps its own, else takes a fresh
//! label. Whenever two different labels meet at one cell (left vs above, or
//! a neighbor vs the cell's previous label) every occurrence of the losing
//! label is rewritten, so L- and U-shaped runs collapse into one group even
//! when they were discovered from two directions.
//!
//! Worst case is O(cells²). Grids are editor-sized (hundreds per side), and
//! in practice the scan settles on the second pass.

use crate::error::BuildError;

use super::{BlockCode, Grid, Pos};

/// Label of an in/out/clock-in connector cell.
pub const BOUNDARY_LABEL: i32 = -1;

/// Label of a cross cell.
pub const CROSS_LABEL: i32 = -2;

/// Label matrix derived from a grid. Never persisted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Labels {
    width: usize,
    height: usize,
    data: Vec<i32>,
}

impl Labels {
    fn new(width: usize, height: usize) -> Self {
        Self {
            width,
            height,
            data: vec![0; width * height],
        }
    }

    /// Width in cells.
    pub fn width(&self) -> usize {
        self.width
    }

    /// Height in cells.
    pub fn height(&self) -> usize {
        self.height
    }

    fn index(&self, pos: Pos) -> Option<usize> {
        if pos.x < 0 || pos.y < 0 {
            return None;
        }
        let (x, y) = (pos.x as usize, pos.y as usize);
        (x < self.width && y < self.height).then(|| y * self.width + x)
    }

    /// Label at `pos`; `0` outside the matrix.
    pub fn get(&self, pos: Pos) -> i32 {
        self.index(pos).map(|i| self.data[i]).unwrap_or(0)
    }

    fn set(&mut self, pos: Pos, label: i32) {
        if let Some(i) = self.index(pos) {
            self.data[i] = label;
        }
    }

    /// Rewrite every occurrence of `from` to `to`.
    pub fn union(&mut self, from: i32, to: i32) {
        if from == to || from <= 0 || to <= 0 {
            return;
        }
        for label in &mut self.data {
            if *label == from {
                *label = to;
            }
        }
    }

    /// Positions labeled `label`, row-major.
    pub fn positions_of(&self, label: i32) -> impl Iterator<Item = Pos> + '_ {
        let width = self.width;
        self.data
            .iter()
            .enumerate()
            .filter(move |(_, &l)| l == label)
            .map(move |(i, _)| Pos::new((i % width) as i32, (i / width) as i32))
    }

    /// Distinct positive labels, in order of first appearance.
    pub fn groups(&self) -> Vec<i32> {
        let mut seen = Vec::new();
        for &label in &self.data {
            if label > 0 && !seen.contains(&label) {
                seen.push(label);
            }
        }
        seen
    }
}

/// Label a grid's connected groups.
///
/// Fails with [`BuildError::Diverged`] if no fixed point is reached within
/// one pass per cell; that would be a bug in the merge rules, not a property
/// of the input.
pub fn label(grid: &Grid) -> Result<Labels, BuildError> {
    let mut labels = Labels::new(grid.width(), grid.height());
    let mut next_label = 1;
    let max_passes = grid.len() + 1;

    for _ in 0..max_passes {
        let mut changed = false;

        for pos in grid.bounds().cells() {
            let code = grid.get(pos);
            let wanted = if code.is_none() {
                0
            } else if code.is_boundary() {
                BOUNDARY_LABEL
            } else if code.is_cross() {
                CROSS_LABEL
            } else {
                let left = same_kind_label(grid, &labels, pos.left(), code);
                let up = same_kind_label(grid, &labels, pos.up(), code);
                let own = Some(labels.get(pos)).filter(|&l| l > 0);

                let target = match left.or(up).or(own) {
                    Some(l) => l,
                    None => {
                        next_label += 1;
                        next_label - 1
                    }
                };

                for other in [up, own].into_iter().flatten() {
                    if other != target {
                        labels.union(other, target);
                        changed = true;
                    }
                }
                target
            };

            if labels.get(pos) != wanted {
                labels.set(pos, wanted);
                changed = true;
            }
        }

        if !changed {
            return Ok(labels);
        }
    }

    Err(BuildError::Diverged { passes: max_passes })
}

fn same_kind_label(grid: &Grid, labels: &Labels, pos: Pos, code: BlockCode) -> Option<i32> {
    if grid.get(pos) != code {
        return None;
    }
    Some(labels.get(pos)).filter(|&l| l > 0)
}

/// Join wire groups that pass straight through cross cells.
///
/// For each cross cell, the wire groups on its left and right are unioned,
/// and independently the groups above and below. Returns the cross cell
/// positions in row-major order.
pub fn merge_through_crosses(grid: &Grid, labels: &mut Labels) -> Vec<Pos> {
    let crosses: Vec<Pos> = labels.positions_of(CROSS_LABEL).collect();

    for &pos in &crosses {
        for (a, b) in [(pos.left(), pos.right()), (pos.up(), pos.down())] {
            if grid.get(a).is_wire() && grid.get(b).is_wire() {
                let (la, lb) = (labels.get(a), labels.get(b));
                labels.union(lb, la);
            }
        }
    }

    crosses
}
