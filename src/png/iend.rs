use super::*;

/// Image trailer, always empty.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Pod, Zeroable)]
#[repr(C)]
pub struct IEND {
  length: U32BE,
  chunk_ty: PngChunkType,
  crc_claim: U32BE,
}
impl Default for IEND {
  #[inline]
  #[must_use]
  fn default() -> Self {
    let mut out =
      Self { length: U32BE::from_u32(0), chunk_ty: PngChunkType::IEND, crc_claim: Default::default() };
    out.crc_claim = U32BE::from_u32(out.compute_crc());
    out
  }
}
impl IEND {
  #[inline]
  #[must_use]
  pub fn compute_crc(&self) -> u32 {
    png_crc(&self.chunk_ty.0)
  }
  #[inline]
  #[must_use]
  pub fn as_bytes(&self) -> &[u8] {
    bytes_of(self)
  }
}

#[test]
fn test_iend_bytes() {
  assert_eq!(IEND::default().as_bytes(), b"\0\0\0\0IEND\xAE\x42\x60\x82");
}
