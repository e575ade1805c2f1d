//! Dense voxel grids of palette codes.
//!
//! A [`RoomVoxelGrid`] stores one byte per block, `x` fastest, then `z`,
//! then `y`. Catalog grids are immutable once loaded; the same type is used
//! for observed samples, where code 0 marks a cell that was not observed.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::palette::{self, UNMAPPED};

/// Grid extent along each axis
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct GridDims {
    /// Extent along x
    pub width: u16,
    /// Extent along y (vertical)
    pub height: u16,
    /// Extent along z
    pub depth: u16,
}

impl GridDims {
    pub const fn new(width: u16, height: u16, depth: u16) -> Self {
        Self { width, height, depth }
    }

    pub fn volume(&self) -> usize {
        self.width as usize * self.height as usize * self.depth as usize
    }

    pub fn is_empty(&self) -> bool {
        self.width == 0 || self.height == 0 || self.depth == 0
    }
}

impl std::fmt::Display for GridDims {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}x{}x{}", self.width, self.height, self.depth)
    }
}

/// Voxel grid construction errors
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum VoxelError {
    #[error("grid has an empty dimension ({0})")]
    EmptyDimension(GridDims),

    #[error("expected {expected} cells for a grid, found {found}")]
    LengthMismatch { expected: usize, found: usize },

    #[error("code {code} at index {index} is outside the palette")]
    CodeOutOfRange { code: u8, index: usize },
}

/// Immutable 3D grid of block codes
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RoomVoxelGrid {
    dims: GridDims,
    cells: Box<[u8]>,
}

impl RoomVoxelGrid {
    /// Build a grid from raw cells, validating length and palette range.
    pub fn from_cells(dims: GridDims, cells: Vec<u8>) -> Result<Self, VoxelError> {
        if dims.is_empty() {
            return Err(VoxelError::EmptyDimension(dims));
        }
        if cells.len() != dims.volume() {
            return Err(VoxelError::LengthMismatch {
                expected: dims.volume(),
                found: cells.len(),
            });
        }
        if let Some(index) = cells.iter().position(|c| !palette::is_valid_code(*c)) {
            return Err(VoxelError::CodeOutOfRange {
                code: cells[index],
                index,
            });
        }
        Ok(Self {
            dims,
            cells: cells.into_boxed_slice(),
        })
    }

    /// Build a grid by evaluating `f(x, y, z)` for every cell.
    pub fn from_fn(
        dims: GridDims,
        mut f: impl FnMut(u16, u16, u16) -> u8,
    ) -> Result<Self, VoxelError> {
        let mut cells = Vec::with_capacity(dims.volume());
        for y in 0..dims.height {
            for z in 0..dims.depth {
                for x in 0..dims.width {
                    cells.push(f(x, y, z));
                }
            }
        }
        Self::from_cells(dims, cells)
    }

    /// A grid with every cell set to `code`.
    pub fn filled(dims: GridDims, code: u8) -> Result<Self, VoxelError> {
        Self::from_cells(dims, vec![code; dims.volume()])
    }

    pub fn dims(&self) -> GridDims {
        self.dims
    }

    pub fn cells(&self) -> &[u8] {
        &self.cells
    }

    fn index(&self, x: i32, y: i32, z: i32) -> Option<usize> {
        let d = self.dims;
        if x < 0 || y < 0 || z < 0 {
            return None;
        }
        let (x, y, z) = (x as usize, y as usize, z as usize);
        if x >= d.width as usize || y >= d.height as usize || z >= d.depth as usize {
            return None;
        }
        Some((y * d.depth as usize + z) * d.width as usize + x)
    }

    /// Code at a cell, [`UNMAPPED`] when out of bounds.
    pub fn get(&self, x: i32, y: i32, z: i32) -> u8 {
        self.index(x, y, z).map(|i| self.cells[i]).unwrap_or(UNMAPPED)
    }

    /// Number of cells carrying a non-zero code
    pub fn defined_count(&self) -> usize {
        self.cells.iter().filter(|c| **c != UNMAPPED).count()
    }

    /// Every defined cell as `(x, y, z, code)`, in storage order.
    pub fn defined_cells(&self) -> impl Iterator<Item = (i32, i32, i32, u8)> + '_ {
        let w = self.dims.width as usize;
        let d = self.dims.depth as usize;
        self.cells
            .iter()
            .enumerate()
            .filter(|(_, c)| **c != UNMAPPED)
            .map(move |(i, c)| {
                let x = i % w;
                let z = (i / w) % d;
                let y = i / (w * d);
                (x as i32, y as i32, z as i32, *c)
            })
    }
}
