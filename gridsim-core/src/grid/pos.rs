//! Grid Coordinates
//!
//! Positions and rectangles on the editor grid. Coordinates are signed so
//! that neighbor arithmetic at the edges produces out-of-bounds positions
//! instead of wrapping; the grid treats those as empty.

use serde::{Deserialize, Serialize};

/// An integer (x, y) cell coordinate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default, Serialize, Deserialize)]
pub struct Pos {
    pub x: i32,
    pub y: i32,
}

impl Pos {
    /// Create a position.
    pub const fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }

    /// Offset this position by another one.
    pub fn offset(self, by: Pos) -> Self {
        Self::new(self.x.saturating_add(by.x), self.y.saturating_add(by.y))
    }

    /// The cell above.
    pub fn up(self) -> Self {
        Self::new(self.x, self.y.saturating_sub(1))
    }

    /// The cell below.
    pub fn down(self) -> Self {
        Self::new(self.x, self.y.saturating_add(1))
    }

    /// The cell to the left.
    pub fn left(self) -> Self {
        Self::new(self.x.saturating_sub(1), self.y)
    }

    /// The cell to the right.
    pub fn right(self) -> Self {
        Self::new(self.x.saturating_add(1), self.y)
    }

    /// The four orthogonal neighbors in attachment scan order:
    /// up, left, down, right.
    pub fn neighbors(self) -> [Pos; 4] {
        [self.up(), self.left(), self.down(), self.right()]
    }
}

impl From<(i32, i32)> for Pos {
    fn from((x, y): (i32, i32)) -> Self {
        Self::new(x, y)
    }
}

/// An axis-aligned rectangle of cells, `min` inclusive and `max` exclusive.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Rect {
    pub min: Pos,
    pub max: Pos,
}

impl Rect {
    /// Build a rectangle covering both corner cells, in any order.
    pub fn from_corners(a: Pos, b: Pos) -> Self {
        Self {
            min: Pos::new(a.x.min(b.x), a.y.min(b.y)),
            max: Pos::new(a.x.max(b.x).saturating_add(1), a.y.max(b.y).saturating_add(1)),
        }
    }

    /// Width in cells.
    pub fn width(&self) -> usize {
        (i64::from(self.max.x) - i64::from(self.min.x)).max(0) as usize
    }

    /// Height in cells.
    pub fn height(&self) -> usize {
        (i64::from(self.max.y) - i64::from(self.min.y)).max(0) as usize
    }

    /// Check whether `pos` lies inside.
    pub fn contains(&self, pos: Pos) -> bool {
        pos.x >= self.min.x && pos.x < self.max.x && pos.y >= self.min.y && pos.y < self.max.y
    }

    /// Iterate the rectangle's cells in row-major order.
    pub fn cells(self) -> impl Iterator<Item = Pos> {
        let Rect { min, max } = self;
        (min.y..max.y).flat_map(move |y| (min.x..max.x).map(move |x| Pos::new(x, y)))
    }
}
