//! Cumulative moment tables over the 33×33×33×33 bucket space.
//!
//! After [`cumulate`] runs, each cell holds the sum of every raw cell with
//! indices less than or equal to it on all four axes, so the sum over any
//! box is a 16 term inclusion-exclusion of its corners.

use core::ops::{Add, Neg, Sub};

use crate::{error::try_zeroed_vec, ApngResult};

use super::{cube::ColorCube, Channel, SIDE_SIZE};

const SIDE: usize = SIDE_SIZE as usize;

/// Number of cells in one table.
pub const TABLE_LEN: usize = SIDE * SIDE * SIDE * SIDE;

/// Flat index of `[alpha][red][green][blue]`.
#[inline]
#[must_use]
pub const fn cell_index(coords: [u8; 4]) -> usize {
  let [a, r, g, b] = coords;
  ((a as usize * SIDE + r as usize) * SIDE + g as usize) * SIDE + b as usize
}

/// A dense 4-D table of `T`, indexed by alpha, red, green, blue buckets.
#[derive(Clone, PartialEq)]
pub struct MomentTable<T> {
  cells: Vec<T>,
}
impl<T> core::fmt::Debug for MomentTable<T> {
  fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
    f.debug_struct("MomentTable").field("len", &self.cells.len()).finish()
  }
}
impl<T> MomentTable<T>
where
  T: Copy + Default + Add<Output = T> + Sub<Output = T> + Neg<Output = T>,
{
  /// A zeroed table.
  pub fn new() -> ApngResult<Self> {
    Ok(Self { cells: try_zeroed_vec(TABLE_LEN)? })
  }

  #[inline]
  #[must_use]
  pub fn get(&self, coords: [u8; 4]) -> T {
    self.cells[cell_index(coords)]
  }

  #[inline]
  pub fn get_mut(&mut self, coords: [u8; 4]) -> &mut T {
    &mut self.cells[cell_index(coords)]
  }

  /// Sum of the raw cells inside `cube`, excluding the `min` plane on every
  /// axis (the box covers `min+1..=max`).
  #[must_use]
  pub fn volume(&self, cube: &ColorCube) -> T {
    let mut total = T::default();
    for corner in 0..16_u32 {
      let mut coords = cube.max;
      for axis in 0..4 {
        if corner & (1 << axis) != 0 {
          coords[axis] = cube.min[axis];
        }
      }
      let v = self.get(coords);
      total = if corner.count_ones() % 2 == 0 { total + v } else { total - v };
    }
    total
  }

  /// The part of the range query that varies when the upper bound along
  /// `direction` is moved to `position`.
  #[must_use]
  pub fn top(&self, cube: &ColorCube, direction: Channel, position: u8) -> T {
    let fixed = direction as usize;
    let mut total = T::default();
    for corner in 0..8_u32 {
      let mut coords = cube.max;
      coords[fixed] = position;
      for (bit, axis) in (0..4).filter(|&axis| axis != fixed).enumerate() {
        if corner & (1 << bit) != 0 {
          coords[axis] = cube.min[axis];
        }
      }
      let v = self.get(coords);
      total = if corner.count_ones() % 2 == 0 { total + v } else { total - v };
    }
    total
  }

  /// The part of the range query that stays fixed while the upper bound along
  /// `direction` moves, so `bottom + top(position)` is the box cut at
  /// `position`.
  #[inline]
  #[must_use]
  pub fn bottom(&self, cube: &ColorCube, direction: Channel) -> T {
    -self.top(cube, direction, cube.min[direction as usize])
  }

  /// Turns raw per-bucket sums into cumulative sums in place.
  ///
  /// The pass walks alpha outermost and blue innermost, carrying a running
  /// line sum along blue, an area sum over green and blue, and a volume sum
  /// over red, green, and blue.
  pub fn cumulate(&mut self) -> ApngResult<()> {
    let mut xarea: Vec<T> = try_zeroed_vec(SIDE * SIDE * SIDE)?;
    let mut area: [T; SIDE] = [T::default(); SIDE];
    for a in 1..SIDE_SIZE {
      xarea.iter_mut().for_each(|x| *x = T::default());
      for r in 1..SIDE_SIZE {
        area.iter_mut().for_each(|x| *x = T::default());
        for g in 1..SIDE_SIZE {
          let mut line = T::default();
          for b in 1..SIDE_SIZE {
            line = line + self.get([a, r, g, b]);
            area[b as usize] = area[b as usize] + line;
            let xi = (r as usize * SIDE + g as usize) * SIDE + b as usize;
            let above = (r as usize - 1) * SIDE * SIDE + g as usize * SIDE + b as usize;
            xarea[xi] = xarea[above] + area[b as usize];
            let prev = self.get([a - 1, r, g, b]);
            *self.get_mut([a, r, g, b]) = prev + xarea[xi];
          }
        }
      }
    }
    Ok(())
  }
}

/// The five integer moments of one region of color space.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Moments {
  pub alpha: i64,
  pub red: i64,
  pub green: i64,
  pub blue: i64,
  pub weight: i64,
}
impl Moments {
  /// `α² + r² + g² + b²` of the channel sums.
  #[inline]
  #[must_use]
  pub fn distance(self) -> i128 {
    let sq = |v: i64| i128::from(v) * i128::from(v);
    sq(self.alpha) + sq(self.red) + sq(self.green) + sq(self.blue)
  }
}
impl Add for Moments {
  type Output = Self;
  #[inline]
  fn add(self, o: Self) -> Self {
    Self {
      alpha: self.alpha + o.alpha,
      red: self.red + o.red,
      green: self.green + o.green,
      blue: self.blue + o.blue,
      weight: self.weight + o.weight,
    }
  }
}
impl Sub for Moments {
  type Output = Self;
  #[inline]
  fn sub(self, o: Self) -> Self {
    Self {
      alpha: self.alpha - o.alpha,
      red: self.red - o.red,
      green: self.green - o.green,
      blue: self.blue - o.blue,
      weight: self.weight - o.weight,
    }
  }
}
