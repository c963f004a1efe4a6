use super::*;

/// Frame control: where a frame goes, how long it shows, and how it's
/// composited.
///
/// Spec: [fcTL](https://www.w3.org/TR/png/#fcTL-chunk)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Pod, Zeroable)]
#[repr(C)]
pub struct fcTL {
  length: U32BE,
  chunk_ty: PngChunkType,
  sequence_number: U32BE,
  width: U32BE,
  height: U32BE,
  x_offset: U32BE,
  y_offset: U32BE,
  delay_num: U16BE,
  delay_den: U16BE,
  dispose_op: u8,
  blend_op: u8,
  crc_claim: U32BE,
}

/// What happens to a frame's region before the next frame is drawn.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum DisposeOp {
  None = 0,
  Background = 1,
  Previous = 2,
}

/// How a frame's pixels combine with the canvas.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum BlendOp {
  Source = 0,
  Over = 1,
}

/// The parts of an [`fcTL`] that describe a frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct FrameControl {
  pub sequence_number: u32,
  pub width: u32,
  pub height: u32,
  pub x_offset: u32,
  pub y_offset: u32,
  pub delay_num: u16,
  pub delay_den: u16,
  pub dispose_op: DisposeOp,
  pub blend_op: BlendOp,
}

impl From<FrameControl> for fcTL {
  #[must_use]
  fn from(f: FrameControl) -> Self {
    let mut out = Self {
      length: U32BE::from_u32(26),
      chunk_ty: PngChunkType::fcTL,
      sequence_number: f.sequence_number.into(),
      width: f.width.into(),
      height: f.height.into(),
      x_offset: f.x_offset.into(),
      y_offset: f.y_offset.into(),
      delay_num: f.delay_num.into(),
      delay_den: f.delay_den.into(),
      dispose_op: f.dispose_op as u8,
      blend_op: f.blend_op as u8,
      crc_claim: U32BE::default(),
    };
    out.crc_claim = U32BE::from_u32(sealed_crc(bytes_of(&out)));
    out
  }
}
impl fcTL {
  #[inline]
  #[must_use]
  pub fn as_bytes(&self) -> &[u8] {
    bytes_of(self)
  }

  /// Reads the payload of a raw `fcTL` chunk.
  #[must_use]
  pub fn parse_payload(data: &[u8]) -> Option<FrameControl> {
    if data.len() != 26 {
      return None;
    }
    let u32_at = |i: usize| u32::from_be_bytes([data[i], data[i + 1], data[i + 2], data[i + 3]]);
    let u16_at = |i: usize| u16::from_be_bytes([data[i], data[i + 1]]);
    let dispose_op = match data[24] {
      0 => DisposeOp::None,
      1 => DisposeOp::Background,
      2 => DisposeOp::Previous,
      _ => return None,
    };
    let blend_op = match data[25] {
      0 => BlendOp::Source,
      1 => BlendOp::Over,
      _ => return None,
    };
    Some(FrameControl {
      sequence_number: u32_at(0),
      width: u32_at(4),
      height: u32_at(8),
      x_offset: u32_at(12),
      y_offset: u32_at(16),
      delay_num: u16_at(20),
      delay_den: u16_at(22),
      dispose_op,
      blend_op,
    })
  }
}

#[test]
fn test_fctl_layout() {
  let f = FrameControl {
    sequence_number: 3,
    width: 10,
    height: 20,
    x_offset: 1,
    y_offset: 2,
    delay_num: 40,
    delay_den: 1000,
    dispose_op: DisposeOp::Background,
    blend_op: BlendOp::Source,
  };
  let c = fcTL::from(f);
  let bytes = c.as_bytes();
  assert_eq!(bytes.len(), 8 + 26 + 4);
  assert_eq!(&bytes[..8], b"\0\0\0\x1afcTL");
  assert_eq!(fcTL::parse_payload(&bytes[8..34]), Some(f));
  assert_eq!(&bytes[34..], &png_crc(&bytes[4..34]).to_be_bytes());
}
