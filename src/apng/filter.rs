//! Per-row PNG filter selection.
//!
//! > Filters are applied to **bytes**, not to pixels, regardless of the bit
//! > depth or color type of the image.
//!
//! Every row is tried with each filter type and the one whose output bytes
//! are "smallest" (treating each byte as a signed distance from zero) is
//! kept, the usual minimum sum of absolute differences heuristic.

use log::trace;

use crate::{error::try_zeroed_vec, ApngResult};

/// Bytes per pixel of the RGBA8 rows this encoder filters.
const BPP: usize = 4;

/// The five PNG filter types, by their tag byte.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum FilterType {
  None = 0,
  Sub = 1,
  Up = 2,
  Average = 3,
  Paeth = 4,
}
impl FilterType {
  pub const ALL: [Self; 5] = [Self::None, Self::Sub, Self::Up, Self::Average, Self::Paeth];
}

/// The Paeth filter function computes a simple linear function of the three
/// neighboring pixels (left `a`, above `b`, upper left `c`).
///
/// The output is the "predictor" of the neighboring pixel closest to the
/// computed value.
#[inline]
#[must_use]
pub const fn paeth_predictor(a: u8, b: u8, c: u8) -> u8 {
  // i32 math is wide enough to never overflow for any u8 inputs.
  let a = a as i32;
  let b = b as i32;
  let c = c as i32;
  let p = a + b - c;
  let pa = (p - a).abs();
  let pb = (p - b).abs();
  let pc = (p - c).abs();
  if pa <= pb && pa <= pc {
    a as u8
  } else if pb <= pc {
    b as u8
  } else {
    c as u8
  }
}

/// How far a filtered byte is from zero, reading it as signed.
#[inline]
#[must_use]
const fn cost(v: u8) -> u64 {
  if v < 128 {
    v as u64
  } else {
    256 - v as u64
  }
}

/// Total cost of a whole row. Wide rows overflow a `u32`.
fn row_cost(row: &[u8]) -> u64 {
  row.iter().map(|&v| cost(v)).sum()
}

/// Scratch rows for every filter type, each with its tag byte in front.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FilterScratch {
  rows: [Vec<u8>; 5],
}
impl FilterScratch {
  /// Scratch for rows of up to `row_bytes` bytes.
  pub fn new(row_bytes: usize) -> ApngResult<Self> {
    let mut rows: [Vec<u8>; 5] = Default::default();
    for (row, ty) in rows.iter_mut().zip(FilterType::ALL) {
      *row = try_zeroed_vec(row_bytes + 1)?;
      row[0] = ty as u8;
    }
    Ok(Self { rows })
  }

  /// The tagged output for `ty` from the last [`select_row`](Self::select_row)
  /// over a `row_bytes` wide row.
  ///
  /// Filters that lost early may have left the tail of their row stale.
  #[inline]
  #[must_use]
  pub fn tagged(&self, ty: FilterType, row_bytes: usize) -> &[u8] {
    &self.rows[ty as usize][..=row_bytes]
  }

  /// Filters `row` every way and returns the filter with the lowest cost.
  ///
  /// `prev` is the unfiltered row above, if any. Without one only `None`
  /// and `Sub` are tried. Ties keep the earlier filter, and a filter stops
  /// scoring as soon as it's already worse than the best so far.
  pub fn select_row(&mut self, row: &[u8], prev: Option<&[u8]>) -> FilterType {
    let n = row.len();
    let [none, sub, up, avg, paeth] = &mut self.rows;

    let out = &mut none[1..=n];
    out.copy_from_slice(row);
    let mut mins = row_cost(out);
    let mut best = FilterType::None;

    let out = &mut sub[1..=n];
    let mut sum = 0;
    for i in 0..n.min(BPP) {
      out[i] = row[i];
      sum += cost(out[i]);
    }
    for i in BPP..n {
      out[i] = row[i].wrapping_sub(row[i - BPP]);
      sum += cost(out[i]);
      if sum > mins {
        break;
      }
    }
    if sum < mins {
      mins = sum;
      best = FilterType::Sub;
    }

    let Some(prev) = prev else {
      return best;
    };

    let out = &mut up[1..=n];
    let mut sum = 0;
    for i in 0..n {
      out[i] = row[i].wrapping_sub(prev[i]);
      sum += cost(out[i]);
      if sum > mins {
        break;
      }
    }
    if sum < mins {
      mins = sum;
      best = FilterType::Up;
    }

    let out = &mut avg[1..=n];
    let mut sum = 0;
    for i in 0..n.min(BPP) {
      out[i] = row[i].wrapping_sub(prev[i] / 2);
      sum += cost(out[i]);
    }
    for i in BPP..n {
      let mean = ((u16::from(prev[i]) + u16::from(row[i - BPP])) / 2) as u8;
      out[i] = row[i].wrapping_sub(mean);
      sum += cost(out[i]);
      if sum > mins {
        break;
      }
    }
    if sum < mins {
      mins = sum;
      best = FilterType::Average;
    }

    let out = &mut paeth[1..=n];
    let mut sum = 0;
    for i in 0..n.min(BPP) {
      out[i] = row[i].wrapping_sub(prev[i]);
      sum += cost(out[i]);
    }
    for i in BPP..n {
      out[i] = row[i].wrapping_sub(paeth_predictor(row[i - BPP], prev[i], prev[i - BPP]));
      sum += cost(out[i]);
      if sum > mins {
        break;
      }
    }
    if sum < mins {
      best = FilterType::Paeth;
    }
    best
  }
}

/// Runs filter selection down every `row_bytes` wide row of `pixels`.
///
/// For each row `each_row` gets the tagged unfiltered row and the tagged
/// best-filtered row.
pub fn process_rect(
  scratch: &mut FilterScratch, pixels: &[u8], row_bytes: usize, mut each_row: impl FnMut(&[u8], &[u8]),
) {
  let mut prev: Option<&[u8]> = None;
  for row in pixels.chunks_exact(row_bytes) {
    let best = scratch.select_row(row, prev);
    trace!("filter: {best:?}");
    each_row(scratch.tagged(FilterType::None, row_bytes), scratch.tagged(best, row_bytes));
    prev = Some(row);
  }
}
