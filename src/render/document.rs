//! The row/cell tree produced by the renderer.

use serde::Serialize;

/// An 8-bit RGB color.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub struct Rgb {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

impl Rgb {
    pub const fn new(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b }
    }

    pub const fn gray(level: u8) -> Self {
        Self::new(level, level, level)
    }
}

/// One rendered pixel.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Cell {
    pub background: Rgb,
    pub foreground: Rgb,
    pub character: char,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Row {
    cells: Vec<Cell>,
}

impl Row {
    pub(crate) fn new(cells: Vec<Cell>) -> Self {
        Self { cells }
    }

    pub fn cells(&self) -> &[Cell] {
        &self.cells
    }
}

/// Rows top to bottom, cells left to right; one cell per source pixel.
///
/// Built once by [`render`](crate::render::render) and never modified.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Document {
    width: u32,
    height: u32,
    rows: Vec<Row>,
}

impl Document {
    pub(crate) fn new(width: u32, height: u32, rows: Vec<Row>) -> Self {
        Self {
            width,
            height,
            rows,
        }
    }

    /// Cells per row.
    pub fn width(&self) -> u32 {
        self.width
    }

    /// Number of rows.
    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn rows(&self) -> &[Row] {
        &self.rows
    }

    pub fn cell(&self, x: u32, y: u32) -> Option<&Cell> {
        self.rows.get(y as usize)?.cells.get(x as usize)
    }

    /// All cells in row-major order.
    pub fn cells(&self) -> impl Iterator<Item = &Cell> {
        self.rows.iter().flat_map(|row| row.cells.iter())
    }
}
