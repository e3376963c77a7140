//! Dense 3D grid of cell states.
//!
//! A cell value of `0` is dead, a positive value is a live cell tagged with its
//! cluster identity and a negative value marks a static environment cell.

use crate::engine::Neighborhoods;
use crate::{Error, Pos3, Result};

/// Largest number of cells a volume can hold
pub const MAX_CELLS: usize = isize::MAX as usize / std::mem::size_of::<i32>();

/// The extent of a volume along each axis
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct Shape {
    pub x: usize,
    pub y: usize,
    pub z: usize,
}

impl Shape {
    #[inline]
    pub const fn new(x: usize, y: usize, z: usize) -> Self {
        Self { x, y, z }
    }

    /// Total number of cells, saturating at `usize::MAX`
    ///
    /// Exact for the shape of any [`Volume`], which is checked on construction.
    #[inline]
    pub fn len(&self) -> usize {
        self.try_len().unwrap_or(usize::MAX)
    }

    /// Total number of cells, or [`None`] if the product overflows
    #[inline]
    pub fn try_len(&self) -> Option<usize> {
        self.x.checked_mul(self.y)?.checked_mul(self.z)
    }

    /// Number of cells a volume of this shape holds
    ///
    /// Fails if an axis does not fit a [`Pos3`] coordinate or the cell count
    /// exceeds [`MAX_CELLS`].
    pub fn check(&self) -> Result<usize> {
        let axes_fit = [self.x, self.y, self.z]
            .iter()
            .all(|&axis| i32::try_from(axis).is_ok());
        self.try_len()
            .filter(|&len| axes_fit && len <= MAX_CELLS)
            .ok_or_else(|| {
                Error::config(format!(
                    "shape {}x{}x{} is too large",
                    self.x, self.y, self.z
                ))
            })
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    #[inline]
    pub fn contains(&self, pos: Pos3) -> bool {
        self.index_of(pos).is_some()
    }

    /// Flat row-major index of `pos`, or [`None`] if it lies outside the shape
    #[inline]
    pub fn index_of(&self, pos: Pos3) -> Option<usize> {
        let x = usize::try_from(pos.x).ok().filter(|&x| x < self.x)?;
        let y = usize::try_from(pos.y).ok().filter(|&y| y < self.y)?;
        let z = usize::try_from(pos.z).ok().filter(|&z| z < self.z)?;
        Some((x * self.y + y) * self.z + z)
    }

    /// Inverse of [`Shape::index_of`]
    #[inline]
    pub fn pos_of(&self, index: usize) -> Pos3 {
        debug_assert!(index < self.len(), "index out of bounds");
        let z = index % self.z;
        let y = (index / self.z) % self.y;
        let x = index / (self.z * self.y);
        Pos3::new(x as i32, y as i32, z as i32)
    }

    /// Iterates every position in row-major order
    pub fn positions(&self) -> impl Iterator<Item = Pos3> + use<> {
        let shape = *self;
        (0..shape.len()).map(move |i| shape.pos_of(i))
    }
}

impl From<(usize, usize, usize)> for Shape {
    #[inline]
    fn from((x, y, z): (usize, usize, usize)) -> Self {
        Self::new(x, y, z)
    }
}

/// Validates a neighborhood window side and returns its radius
pub(crate) fn window_radius(window: usize) -> Result<i32> {
    if window == 0 || window % 2 == 0 {
        return Err(Error::config(format!(
            "window size must be odd and at least 1, got {window}"
        )));
    }
    i32::try_from(window / 2)
        .map_err(|_| Error::config(format!("window size {window} is too large")))
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Volume {
    shape: Shape,
    cells: Vec<i32>,
}

impl Volume {
    /// Creates an all-dead volume
    ///
    /// Fails with [`Error::InvalidConfiguration`] if the shape is too large.
    pub fn zeros(shape: Shape) -> Result<Self> {
        let len = shape.check()?;
        Ok(Self {
            shape,
            cells: vec![0; len],
        })
    }

    /// Wraps a flat row-major buffer
    ///
    /// Fails with [`Error::InvalidConfiguration`] if the shape is too large or
    /// the buffer length does not match it.
    pub fn from_cells(shape: Shape, cells: Vec<i32>) -> Result<Self> {
        if cells.len() != shape.check()? {
            return Err(Error::config(format!(
                "buffer of {} cells does not match shape {}x{}x{}",
                cells.len(),
                shape.x,
                shape.y,
                shape.z
            )));
        }
        Ok(Self { shape, cells })
    }

    #[inline]
    pub fn shape(&self) -> Shape {
        self.shape
    }
    #[inline]
    pub fn cells(&self) -> &[i32] {
        &self.cells
    }
    #[inline]
    pub fn into_cells(self) -> Vec<i32> {
        self.cells
    }

    #[inline]
    pub fn get(&self, pos: Pos3) -> Option<i32> {
        self.shape.index_of(pos).map(|i| self.cells[i])
    }

    /// Sets a cell, returning `false` if `pos` is out of bounds
    pub fn set(&mut self, pos: Pos3, value: i32) -> bool {
        match self.shape.index_of(pos) {
            Some(i) => {
                self.cells[i] = value;
                true
            }
            None => false,
        }
    }

    /// Iterates `(position, value)` pairs in row-major order
    pub fn iter(&self) -> impl Iterator<Item = (Pos3, i32)> + '_ {
        self.cells
            .iter()
            .enumerate()
            .map(|(i, &v)| (self.shape.pos_of(i), v))
    }

    /// Number of live (positive) cells
    pub fn live_count(&self) -> usize {
        self.cells.iter().filter(|&&v| v > 0).count()
    }
    /// Number of environment (negative) cells
    pub fn environment_count(&self) -> usize {
        self.cells.iter().filter(|&&v| v < 0).count()
    }

    /// Distinct live identities in ascending order
    pub fn identities(&self) -> Vec<i32> {
        let mut ids: Vec<i32> = self.cells.iter().copied().filter(|&v| v > 0).collect();
        ids.sort_unstable();
        ids.dedup();
        ids
    }

    /// Writes the flattened window of side `window` centered on `pos` into `buf`
    ///
    /// Positions outside the volume contribute `0`. The window must already be
    /// validated as odd.
    pub(crate) fn neighborhood_into(&self, pos: Pos3, window: usize, buf: &mut Vec<i32>) {
        let r = (window / 2) as i32;
        buf.clear();
        for dx in -r..=r {
            for dy in -r..=r {
                for dz in -r..=r {
                    let value = self.get(pos + Pos3::new(dx, dy, dz)).unwrap_or(0);
                    buf.push(value);
                }
            }
        }
    }

    /// Lazily yields every cell's neighborhood vector in row-major order
    ///
    /// Each call starts a fresh scan of the volume. The center of each vector is
    /// at index `window³ / 2`.
    pub fn neighborhoods(&self, window: usize) -> Result<Neighborhoods<'_>> {
        window_radius(window)?;
        Ok(Neighborhoods::new(self, window))
    }

    /// Coordinates (scaled by `voxel_size`) and values of every live cell
    pub fn point_cloud(&self, voxel_size: f32) -> (Vec<[f32; 3]>, Vec<i32>) {
        self.iter()
            .filter(|&(_, v)| v > 0)
            .map(|(pos, v)| {
                let point = [
                    pos.x as f32 * voxel_size,
                    pos.y as f32 * voxel_size,
                    pos.z as f32 * voxel_size,
                ];
                (point, v)
            })
            .unzip()
    }
}
