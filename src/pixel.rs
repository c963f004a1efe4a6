//! The 32-bit pixel that both the quantizer and the encoder consume.

use bytemuck::{Pod, Zeroable};

/// One 32-bit pixel with 8-bit alpha, red, green, and blue channels.
///
/// The fields are declared in memory order: a `&[u8]` of caller pixel data in
/// B,G,R,A byte order can be viewed as `&[Pixel]` with
/// [`bytemuck::cast_slice`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Pod, Zeroable)]
#[repr(C)]
pub struct Pixel {
  pub b: u8,
  pub g: u8,
  pub r: u8,
  pub a: u8,
}
impl Pixel {
  /// Fully transparent black, used as the palette's transparency sentinel.
  pub const TRANSPARENT: Self = Self::new(0, 0, 0, 0);

  /// Makes a pixel from channels given in A,R,G,B order.
  #[inline]
  #[must_use]
  pub const fn new(a: u8, r: u8, g: u8, b: u8) -> Self {
    Self { b, g, r, a }
  }

  /// The four channels packed as one `u32` (`0xAARRGGBB`).
  #[inline]
  #[must_use]
  pub const fn packed(self) -> u32 {
    u32::from_le_bytes([self.b, self.g, self.r, self.a])
  }

  /// Inverse of [`packed`](Self::packed).
  #[inline]
  #[must_use]
  pub const fn from_packed(v: u32) -> Self {
    let [b, g, r, a] = v.to_le_bytes();
    Self { b, g, r, a }
  }

  /// The pixel as R,G,B,A bytes, the order a PNG stores color type 6 in.
  #[inline]
  #[must_use]
  pub const fn to_rgba(self) -> [u8; 4] {
    [self.r, self.g, self.b, self.a]
  }

  /// Squared euclidean distance in (alpha, red, green, blue) space.
  #[inline]
  #[must_use]
  pub fn distance_squared(self, other: Self) -> u32 {
    let da = i32::from(self.a) - i32::from(other.a);
    let dr = i32::from(self.r) - i32::from(other.r);
    let dg = i32::from(self.g) - i32::from(other.g);
    let db = i32::from(self.b) - i32::from(other.b);
    (da * da + dr * dr + dg * dg + db * db) as u32
  }
}
