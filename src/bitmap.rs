//! Borrowed views of caller-owned pixel buffers.
//!
//! Both views use a signed row stride. A negative stride means the rows are
//! stored bottom-up: the first row in memory is the bottom row of the image.
//! The absolute value is always the byte distance between two rows, and it
//! may be larger than the bytes a row actually needs.

use crate::{pixel::Pixel, ApngError, ApngResult};

/// Byte offset of logical row `y` (counted top to bottom).
#[inline]
#[must_use]
const fn row_offset(y: u32, height: u32, stride: isize) -> usize {
  let abs = stride.unsigned_abs();
  if stride < 0 {
    (height - 1 - y) as usize * abs
  } else {
    y as usize * abs
  }
}

/// Checks that `len` bytes hold `height` rows of `row_bytes` at `stride`.
fn check_geometry(width: u32, height: u32, stride: isize, row_bytes: usize, len: usize) -> ApngResult<()> {
  if width == 0 || height == 0 {
    return Err(ApngError::ArgumentError);
  }
  let abs = stride.unsigned_abs();
  if abs < row_bytes {
    return Err(ApngError::ArgumentError);
  }
  let needed = (height as usize - 1).checked_mul(abs).and_then(|n| n.checked_add(row_bytes));
  match needed {
    Some(n) if n <= len => Ok(()),
    _ => Err(ApngError::ArgumentError),
  }
}

/// A borrow of 32-bit B,G,R,A pixel data.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct BitmapView<'a> {
  width: u32,
  height: u32,
  stride: isize,
  data: &'a [u8],
}
impl<'a> BitmapView<'a> {
  /// Wraps `data` after checking that it's large enough for the geometry.
  pub fn new(width: u32, height: u32, stride: isize, data: &'a [u8]) -> ApngResult<Self> {
    check_geometry(width, height, stride, width as usize * 4, data.len())?;
    Ok(Self { width, height, stride, data })
  }

  /// A tightly packed, top-down view (`stride = width * 4`).
  #[inline]
  pub fn packed(width: u32, height: u32, data: &'a [u8]) -> ApngResult<Self> {
    Self::new(width, height, (width as isize) * 4, data)
  }

  /// A tightly packed view over a pixel slice.
  #[inline]
  pub fn from_pixels(width: u32, height: u32, pixels: &'a [Pixel]) -> ApngResult<Self> {
    Self::packed(width, height, bytemuck::cast_slice(pixels))
  }

  #[inline]
  #[must_use]
  pub const fn width(&self) -> u32 {
    self.width
  }
  #[inline]
  #[must_use]
  pub const fn height(&self) -> u32 {
    self.height
  }

  /// Bytes of pixel data in one row.
  #[inline]
  #[must_use]
  pub const fn row_bytes(&self) -> usize {
    self.width as usize * 4
  }

  /// The raw bytes of logical row `y`.
  ///
  /// ## Panics
  /// * If `y >= height`.
  #[inline]
  #[must_use]
  pub fn row_bytes_at(&self, y: u32) -> &'a [u8] {
    assert!(y < self.height);
    let start = row_offset(y, self.height, self.stride);
    &self.data[start..start + self.row_bytes()]
  }

  /// The pixels of logical row `y`.
  ///
  /// ## Panics
  /// * If `y >= height`.
  #[inline]
  #[must_use]
  pub fn row(&self, y: u32) -> &'a [Pixel] {
    bytemuck::cast_slice(self.row_bytes_at(y))
  }

  /// Iterates the rows top to bottom.
  #[inline]
  pub fn rows(&self) -> impl Iterator<Item = &'a [Pixel]> + '_ {
    (0..self.height).map(move |y| self.row(y))
  }

  /// A view of the sub-rectangle at `(x, y)` sized `width * height`.
  ///
  /// The stride is kept, so no pixels are copied.
  pub fn crop(&self, x: u32, y: u32, width: u32, height: u32) -> ApngResult<Self> {
    let x_end = x.checked_add(width).ok_or(ApngError::ArgumentError)?;
    let y_end = y.checked_add(height).ok_or(ApngError::ArgumentError)?;
    if width == 0 || height == 0 || x_end > self.width || y_end > self.height {
      return Err(ApngError::ArgumentError);
    }
    // the crop's first row in memory depends on which end of the buffer the
    // image starts from.
    let first_row = if self.stride < 0 { y_end - 1 } else { y };
    let start = row_offset(first_row, self.height, self.stride) + x as usize * 4;
    Self::new(width, height, self.stride, &self.data[start..])
  }
}

/// A mutable borrow of an 8-bit indexed image plus its palette storage.
#[derive(Debug, PartialEq, Eq, Hash)]
pub struct IndexedBitmapMut<'a> {
  width: u32,
  height: u32,
  stride: isize,
  indices: &'a mut [u8],
  palette: &'a mut [Pixel],
}
impl<'a> IndexedBitmapMut<'a> {
  /// Minimum palette slots a destination must provide (256 colors plus the
  /// transparency sentinel).
  pub const MIN_PALETTE_LEN: usize = 257;

  /// Wraps the index and palette buffers after checking their sizes.
  pub fn new(
    width: u32, height: u32, stride: isize, indices: &'a mut [u8], palette: &'a mut [Pixel],
  ) -> ApngResult<Self> {
    check_geometry(width, height, stride, width as usize, indices.len())?;
    if palette.len() < Self::MIN_PALETTE_LEN {
      return Err(ApngError::ArgumentError);
    }
    Ok(Self { width, height, stride, indices, palette })
  }

  #[inline]
  #[must_use]
  pub const fn width(&self) -> u32 {
    self.width
  }
  #[inline]
  #[must_use]
  pub const fn height(&self) -> u32 {
    self.height
  }

  /// The index bytes of logical row `y`.
  ///
  /// ## Panics
  /// * If `y >= height`.
  #[inline]
  pub fn row_mut(&mut self, y: u32) -> &mut [u8] {
    assert!(y < self.height);
    let start = row_offset(y, self.height, self.stride);
    &mut self.indices[start..start + self.width as usize]
  }

  #[inline]
  pub fn palette_mut(&mut self) -> &mut [Pixel] {
    self.palette
  }
}
