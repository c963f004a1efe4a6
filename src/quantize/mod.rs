//! Wu's variance-minimizing color quantizer, with alpha.
//!
//! Colors are bucketed 5 bits per channel into a 33⁴ grid of moment tables
//! (index 0 on each axis stays empty so range queries need no bounds checks).
//! The grid is split into boxes by always cutting the box with the largest
//! variance at the plane that best separates its moments. Each pixel is then
//! mapped to the nearest box mean, and the means are refined to the average
//! of the pixels they received.
//!
//! Pixels at or below the alpha threshold don't take part; they all map to a
//! fully transparent sentinel placed after the real palette entries.

use log::debug;

use crate::{
  bitmap::{BitmapView, IndexedBitmapMut},
  pixel::Pixel,
  ApngError, ApngResult,
};

pub mod cube;
pub mod histogram;
pub mod moments;
pub mod palette;

/// Pixels with alpha at or below this are treated as fully transparent.
pub const ALPHA_THRESHOLD: u8 = 10;
/// Palette slots including the transparency sentinel.
pub const MAX_COLORS: u16 = 256;
/// Bucket cells per axis, including the empty 0 plane.
pub const SIDE_SIZE: u8 = 33;
pub const MAX_SIDE_INDEX: u8 = 32;

/// The four axes of color space, in table order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(usize)]
pub enum Channel {
  Alpha = 0,
  Red = 1,
  Green = 2,
  Blue = 3,
}
impl Channel {
  pub const ALL: [Self; 4] = [Self::Alpha, Self::Red, Self::Green, Self::Blue];
}

/// Quantizer settings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct QuantizeOptions {
  /// Palette size including the transparency sentinel, clamped to `2..=256`.
  pub max_colors: u16,
  /// Alpha at or below this goes to the sentinel.
  pub alpha_threshold: u8,
}
impl Default for QuantizeOptions {
  #[inline]
  fn default() -> Self {
    Self { max_colors: MAX_COLORS, alpha_threshold: ALPHA_THRESHOLD }
  }
}
impl QuantizeOptions {
  /// How many boxes the splitter may produce.
  #[inline]
  #[must_use]
  pub fn max_boxes(&self) -> usize {
    usize::from(self.max_colors.clamp(2, MAX_COLORS)) - 1
  }
}

/// An 8-bit indexed image with its palette.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QuantizedImage {
  pub width: u32,
  pub height: u32,
  /// Never longer than 256. The last entry is the transparent sentinel.
  pub palette: Vec<Pixel>,
  /// Top-down, tightly packed, one byte per pixel.
  pub indices: Vec<u8>,
}
impl QuantizedImage {
  /// Replaces each index with its palette color.
  pub fn expand(&self) -> ApngResult<Vec<Pixel>> {
    let mut out = Vec::new();
    out.try_reserve_exact(self.indices.len())?;
    out.extend(self.indices.iter().map(|&i| self.palette.get(usize::from(i)).copied().unwrap_or_default()));
    Ok(out)
  }
}

/// Quantizes `src` to at most `options.max_colors` palette entries.
pub fn quantize(src: &BitmapView<'_>, options: &QuantizeOptions) -> ApngResult<QuantizedImage> {
  let mut data = histogram::build_histogram(src, options.alpha_threshold)?;
  data.calculate_moments()?;
  let cubes = cube::split_cubes(&data, options.max_boxes());
  let lookups = palette::build_lookups(&cubes, &data)?;
  let result = palette::quantized_palette(cubes.len(), &data, &lookups)?;
  debug!(
    "quantized {}x{} into {} boxes ({} non-empty)",
    src.width(),
    src.height(),
    cubes.len(),
    lookups.lookups.len()
  );
  let mut indices = Vec::new();
  indices.try_reserve_exact(result.assignments.len())?;
  indices.extend(result.indices());
  Ok(QuantizedImage { width: src.width(), height: src.height(), palette: result.colors, indices })
}

/// Quantizes `src` into `dst` with the default options.
///
/// The destination must have the same dimensions as the source. Returns the
/// number of palette entries written, the sentinel included.
pub fn quantize_image(src: &BitmapView<'_>, dst: &mut IndexedBitmapMut<'_>) -> ApngResult<usize> {
  quantize_image_with_options(src, dst, &QuantizeOptions::default())
}

/// [`quantize_image`] with explicit options.
pub fn quantize_image_with_options(
  src: &BitmapView<'_>, dst: &mut IndexedBitmapMut<'_>, options: &QuantizeOptions,
) -> ApngResult<usize> {
  if src.width() != dst.width() || src.height() != dst.height() {
    return Err(ApngError::ArgumentError);
  }
  let image = quantize(src, options)?;
  let width = image.width as usize;
  for (y, row) in image.indices.chunks_exact(width).enumerate() {
    dst.row_mut(y as u32).copy_from_slice(row);
  }
  dst.palette_mut()[..image.palette.len()].copy_from_slice(&image.palette);
  Ok(image.palette.len())
}
