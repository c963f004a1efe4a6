use super::*;

/// Image header, as it sits in the file (length, type, payload, CRC).
///
/// Spec: [IHDR](https://www.w3.org/TR/png/#11IHDR)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Pod, Zeroable)]
#[repr(C)]
pub struct IHDR {
  length: U32BE,
  chunk_ty: PngChunkType,
  width: U32BE,
  height: U32BE,
  bit_depth: u8,
  color_type: u8,
  compression_method: u8,
  filter: u8,
  interlace_method: u8,
  crc_claim: U32BE,
}
impl IHDR {
  /// Color type 6: red, green, blue, alpha.
  pub const COLOR_TYPE_RGBA: u8 = 6;

  /// A header for a non-interlaced 8-bit RGBA image.
  #[must_use]
  pub fn rgba8(width: u32, height: u32) -> Self {
    let mut out = Self {
      length: U32BE::from_u32(13),
      chunk_ty: PngChunkType::IHDR,
      width: width.into(),
      height: height.into(),
      bit_depth: 8,
      color_type: Self::COLOR_TYPE_RGBA,
      compression_method: 0,
      filter: 0,
      interlace_method: 0,
      crc_claim: U32BE::default(),
    };
    out.crc_claim = U32BE::from_u32(sealed_crc(bytes_of(&out)));
    out
  }
  #[inline]
  #[must_use]
  pub const fn width(&self) -> u32 {
    self.width.to_u32()
  }
  #[inline]
  #[must_use]
  pub const fn height(&self) -> u32 {
    self.height.to_u32()
  }
  #[inline]
  #[must_use]
  pub fn as_bytes(&self) -> &[u8] {
    bytes_of(self)
  }
}

#[test]
fn test_ihdr_layout() {
  let h = IHDR::rgba8(3, 2);
  let bytes = h.as_bytes();
  assert_eq!(bytes.len(), 25);
  assert_eq!(&bytes[..8], &[0, 0, 0, 13, b'I', b'H', b'D', b'R']);
  assert_eq!(&bytes[8..21], &[0, 0, 0, 3, 0, 0, 0, 2, 8, 6, 0, 0, 0]);
  assert_eq!(&bytes[21..], &png_crc(&bytes[4..21]).to_be_bytes());
  assert_eq!((h.width(), h.height()), (3, 2));
}
