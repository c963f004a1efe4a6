//! Bucketing source pixels and accumulating their moments.

use log::trace;

use crate::{bitmap::BitmapView, pixel::Pixel, ApngResult};

use super::{cube::ColorCube, moments::{MomentTable, Moments}};

/// Maps an 8-bit channel value to its bucket, `1..=32`.
///
/// Bucket 0 is never produced; it's the always-empty plane that the
/// cumulative range queries subtract against.
#[inline]
#[must_use]
pub const fn bucket_of(v: u8) -> u8 {
  (v >> 3) + 1
}

/// Rounds a partially transparent alpha to one of 16 levels, clamped to 255.
#[inline]
#[must_use]
pub const fn round_alpha(a: u8) -> u8 {
  let rounded = (a as u16 + 8) & !0xF;
  if rounded > 255 {
    255
  } else {
    rounded as u8
  }
}

/// The four bucket coordinates of one pixel, in alpha, red, green, blue
/// order.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct PackedBuckets(pub [u8; 4]);
impl PackedBuckets {
  #[inline]
  #[must_use]
  pub const fn of(p: Pixel) -> Self {
    Self([bucket_of(p.a), bucket_of(p.r), bucket_of(p.g), bucket_of(p.b)])
  }
}

/// The histogram and per-pixel records that the rest of the quantizer reads.
#[derive(Debug, Clone)]
pub struct ColorData {
  pub weights: MomentTable<i64>,
  pub moments_alpha: MomentTable<i64>,
  pub moments_red: MomentTable<i64>,
  pub moments_green: MomentTable<i64>,
  pub moments_blue: MomentTable<i64>,
  /// Sum of `a² + r² + g² + b²`.
  pub moments: MomentTable<f64>,
  /// Every source pixel, top-down, with its alpha possibly rounded.
  pub pixels: Vec<Pixel>,
  /// The bucket coordinates of each entry of `pixels`, `None` when the
  /// pixel's source alpha was at or below the threshold.
  pub quantized: Vec<Option<PackedBuckets>>,
}
impl ColorData {
  /// Converts all six tables into their cumulative form.
  pub fn calculate_moments(&mut self) -> ApngResult<()> {
    self.weights.cumulate()?;
    self.moments_alpha.cumulate()?;
    self.moments_red.cumulate()?;
    self.moments_green.cumulate()?;
    self.moments_blue.cumulate()?;
    self.moments.cumulate()
  }

  /// The integer moments of `cube`.
  #[must_use]
  pub fn volume(&self, cube: &ColorCube) -> Moments {
    Moments {
      alpha: self.moments_alpha.volume(cube),
      red: self.moments_red.volume(cube),
      green: self.moments_green.volume(cube),
      blue: self.moments_blue.volume(cube),
      weight: self.weights.volume(cube),
    }
  }

  #[must_use]
  pub fn top(&self, cube: &ColorCube, direction: super::Channel, position: u8) -> Moments {
    Moments {
      alpha: self.moments_alpha.top(cube, direction, position),
      red: self.moments_red.top(cube, direction, position),
      green: self.moments_green.top(cube, direction, position),
      blue: self.moments_blue.top(cube, direction, position),
      weight: self.weights.top(cube, direction, position),
    }
  }

  #[must_use]
  pub fn bottom(&self, cube: &ColorCube, direction: super::Channel) -> Moments {
    Moments {
      alpha: self.moments_alpha.bottom(cube, direction),
      red: self.moments_red.bottom(cube, direction),
      green: self.moments_green.bottom(cube, direction),
      blue: self.moments_blue.bottom(cube, direction),
      weight: self.weights.bottom(cube, direction),
    }
  }
}

/// Fills the raw (not yet cumulative) moment tables from `image`.
///
/// Pixels with alpha at or below `alpha_threshold` are recorded but add
/// nothing to the tables.
pub fn build_histogram(image: &BitmapView<'_>, alpha_threshold: u8) -> ApngResult<ColorData> {
  let pixel_count = image.width() as usize * image.height() as usize;
  let mut pixels = Vec::new();
  pixels.try_reserve_exact(pixel_count)?;
  let mut quantized = Vec::new();
  quantized.try_reserve_exact(pixel_count)?;
  let mut data = ColorData {
    weights: MomentTable::new()?,
    moments_alpha: MomentTable::new()?,
    moments_red: MomentTable::new()?,
    moments_green: MomentTable::new()?,
    moments_blue: MomentTable::new()?,
    moments: MomentTable::new()?,
    pixels,
    quantized,
  };
  let mut counted = 0_usize;
  for row in image.rows() {
    for &src in row {
      let mut p = src;
      let mut buckets = None;
      if p.a > alpha_threshold {
        if p.a < 255 {
          p.a = round_alpha(p.a);
        }
        let cell = PackedBuckets::of(p).0;
        buckets = Some(PackedBuckets(cell));
        *data.weights.get_mut(cell) += 1;
        *data.moments_alpha.get_mut(cell) += i64::from(p.a);
        *data.moments_red.get_mut(cell) += i64::from(p.r);
        *data.moments_green.get_mut(cell) += i64::from(p.g);
        *data.moments_blue.get_mut(cell) += i64::from(p.b);
        let sq = |v: u8| f64::from(v) * f64::from(v);
        *data.moments.get_mut(cell) += sq(p.a) + sq(p.r) + sq(p.g) + sq(p.b);
        counted += 1;
      }
      data.quantized.push(buckets);
      data.pixels.push(p);
    }
  }
  trace!("histogram: {counted} of {pixel_count} pixels above alpha {alpha_threshold}");
  Ok(data)
}
