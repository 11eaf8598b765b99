//! Generic bounded lattice for per-cell data

use crate::core::error::{Result, SimError};
use crate::core::types::Position;

/// Dense 2D grid, row-major, one `T` per cell
#[derive(Debug, Clone)]
pub struct Grid<T: Clone + Default> {
    width: u32,
    height: u32,
    data: Vec<T>,
}

impl<T: Clone + Default> Grid<T> {
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            width,
            height,
            data: vec![T::default(); width as usize * height as usize],
        }
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    #[inline]
    pub fn contains(&self, pos: Position) -> bool {
        pos.x >= 0 && pos.y >= 0 && (pos.x as u32) < self.width && (pos.y as u32) < self.height
    }

    #[inline]
    fn index(&self, pos: Position) -> Option<usize> {
        if self.contains(pos) {
            Some(pos.y as usize * self.width as usize + pos.x as usize)
        } else {
            None
        }
    }

    /// `OutOfBounds` unless `pos` lies on the grid
    pub fn check_bounds(&self, pos: Position) -> Result<()> {
        if self.contains(pos) {
            Ok(())
        } else {
            Err(SimError::OutOfBounds {
                position: pos,
                width: self.width,
                height: self.height,
            })
        }
    }

    #[inline]
    pub fn get(&self, pos: Position) -> Option<&T> {
        self.index(pos).map(|i| &self.data[i])
    }

    #[inline]
    pub fn get_mut(&mut self, pos: Position) -> Option<&mut T> {
        self.index(pos).map(move |i| &mut self.data[i])
    }

    /// All on-grid cells within Euclidean `radius` of `center`, row-major.
    ///
    /// The center itself may lie off-grid; a negative radius yields nothing.
    pub fn cells_within(&self, center: Position, radius: f64) -> impl Iterator<Item = Position> + Clone {
        let reach = if radius >= 0.0 {
            radius.min(f64::from(i32::MAX)).floor() as i64
        } else {
            -1
        };
        let x0 = (i64::from(center.x) - reach).max(0);
        let x1 = (i64::from(center.x) + reach).min(i64::from(self.width) - 1);
        let y0 = (i64::from(center.y) - reach).max(0);
        let y1 = (i64::from(center.y) + reach).min(i64::from(self.height) - 1);

        (y0..=y1)
            .flat_map(move |y| (x0..=x1).map(move |x| Position::new(x as i32, y as i32)))
            .filter(move |p| p.distance(&center) <= radius)
    }

    /// Every cell in row-major order
    pub fn positions(&self) -> impl Iterator<Item = Position> + Clone {
        let (w, h) = (self.width as i32, self.height as i32);
        (0..h).flat_map(move |y| (0..w).map(move |x| Position::new(x, y)))
    }
}
