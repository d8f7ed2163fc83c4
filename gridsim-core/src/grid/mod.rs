//! Editor Grid
//!
//! The grid is the raw material of every circuit: a width × height matrix of
//! [`BlockCode`]s painted by the user. It is pure data. Compilation into a
//! runnable graph happens in [`crate::field`], starting from the connectivity
//! labels computed in [`label`].
//!
//! # Bounds
//!
//! Reads outside the grid return [`BlockCode::NONE`] and writes outside the
//! grid are silently dropped. Nothing in this module reports a bounds error;
//! callers (pastes at an offset, neighbor scans at the edges) rely on that.

mod block;
mod pos;
pub mod label;

pub use block::BlockCode;
pub use label::{Labels, BOUNDARY_LABEL, CROSS_LABEL};
pub use pos::{Pos, Rect};

/// A width × height matrix of block codes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Grid {
    width: usize,
    height: usize,
    cells: Vec<BlockCode>,
}

impl Grid {
    /// Create an empty grid.
    pub fn new(width: usize, height: usize) -> Self {
        Self {
            width,
            height,
            cells: vec![BlockCode::NONE; width * height],
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

    /// Number of cells, occupied or not.
    pub fn len(&self) -> usize {
        self.cells.len()
    }

    /// Check whether every cell is empty.
    pub fn is_empty(&self) -> bool {
        self.cells.iter().all(|c| c.is_none())
    }

    /// The rectangle covering the whole grid.
    pub fn bounds(&self) -> Rect {
        Rect {
            min: Pos::new(0, 0),
            max: Pos::new(self.width as i32, self.height as i32),
        }
    }

    /// Check whether `pos` lies inside the grid.
    pub fn in_bounds(&self, pos: Pos) -> bool {
        self.index(pos).is_some()
    }

    fn index(&self, pos: Pos) -> Option<usize> {
        if pos.x < 0 || pos.y < 0 {
            return None;
        }
        let (x, y) = (pos.x as usize, pos.y as usize);
        (x < self.width && y < self.height).then(|| y * self.width + x)
    }

    /// Read a cell. Out-of-bounds positions read as empty.
    pub fn get(&self, pos: Pos) -> BlockCode {
        self.index(pos)
            .map(|i| self.cells[i])
            .unwrap_or(BlockCode::NONE)
    }

    /// Write a cell. No-op outside the grid.
    pub fn set(&mut self, pos: Pos, code: BlockCode) {
        if let Some(i) = self.index(pos) {
            self.cells[i] = code;
        }
    }

    /// Empty a cell. No-op outside the grid.
    pub fn delete(&mut self, pos: Pos) {
        self.set(pos, BlockCode::NONE);
    }

    /// Empty every cell.
    pub fn clear(&mut self) {
        self.cells.fill(BlockCode::NONE);
    }

    /// Empty every in-bounds cell of `rect`.
    pub fn clear_rect(&mut self, rect: Rect) {
        for pos in rect.cells() {
            self.delete(pos);
        }
    }

    /// Change the grid's dimensions, keeping the cells that still fit.
    pub fn resize(&mut self, width: usize, height: usize) {
        let mut resized = Grid::new(width, height);
        resized.overlay(self, Pos::new(0, 0));
        *self = resized;
    }

    /// Copy `rect` into a new grid of the rectangle's size.
    /// Cells of `rect` outside this grid come out empty.
    pub fn sub_grid(&self, rect: Rect) -> Grid {
        let mut out = Grid::new(rect.width(), rect.height());
        for pos in rect.cells() {
            let local = Pos::new(pos.x.saturating_sub(rect.min.x), pos.y.saturating_sub(rect.min.y));
            out.set(local, self.get(pos));
        }
        out
    }

    /// Write the non-empty cells of `src` onto this grid with `src`'s origin
    /// placed at `at`. Existing cells under non-empty source cells are
    /// overwritten; cells landing outside this grid are dropped.
    pub fn overlay(&mut self, src: &Grid, at: Pos) {
        for (pos, code) in src.occupied() {
            self.set(pos.offset(at), code);
        }
    }

    /// Replace every occurrence of a code. Used when custom codes are remapped.
    pub fn remap(&mut self, mut map: impl FnMut(BlockCode) -> BlockCode) {
        for cell in &mut self.cells {
            if !cell.is_none() {
                *cell = map(*cell);
            }
        }
    }

    /// Iterate the non-empty cells in row-major order.
    pub fn occupied(&self) -> impl Iterator<Item = (Pos, BlockCode)> + '_ {
        self.cells.iter().enumerate().filter_map(move |(i, &code)| {
            if code.is_none() {
                return None;
            }
            let pos = Pos::new((i % self.width) as i32, (i / self.width) as i32);
            Some((pos, code))
        })
    }
}
