use super::*;

/// Animation control: how many frames and how many times to loop.
///
/// Spec: [acTL](https://www.w3.org/TR/png/#acTL-chunk)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Pod, Zeroable)]
#[repr(C)]
pub struct acTL {
  length: U32BE,
  chunk_ty: PngChunkType,
  num_frames: U32BE,
  num_plays: U32BE,
  crc_claim: U32BE,
}
impl acTL {
  /// `num_plays` of 0 loops forever.
  #[must_use]
  pub fn new(num_frames: u32, num_plays: u32) -> Self {
    let mut out = Self {
      length: U32BE::from_u32(8),
      chunk_ty: PngChunkType::acTL,
      num_frames: num_frames.into(),
      num_plays: num_plays.into(),
      crc_claim: U32BE::default(),
    };
    out.crc_claim = U32BE::from_u32(sealed_crc(bytes_of(&out)));
    out
  }
  #[inline]
  #[must_use]
  pub const fn num_frames(&self) -> u32 {
    self.num_frames.to_u32()
  }
  #[inline]
  #[must_use]
  pub fn as_bytes(&self) -> &[u8] {
    bytes_of(self)
  }
}

#[test]
fn test_actl_layout() {
  let c = acTL::new(5, 0);
  let bytes = c.as_bytes();
  assert_eq!(bytes.len(), 20);
  assert_eq!(&bytes[4..16], b"acTL\0\0\0\x05\0\0\0\0");
  assert_eq!(u32::from_be_bytes(bytes[16..].try_into().unwrap()), png_crc(&bytes[4..16]));
}
