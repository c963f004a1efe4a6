const CRC_TABLE: [u32; 256] = make_crc_table();

const fn make_crc_table() -> [u32; 256] {
  let mut out = [0; 256];
  let mut n = 0;
  while n < 256 {
    let mut c = n as u32;
    let mut k = 0;
    while k < 8 {
      if (c & 1) != 0 {
        c = 0xEDB8_8320_u32 ^ (c >> 1);
      } else {
        c >>= 1;
      }
      //
      k += 1;
    }
    out[n] = c;
    //
    n += 1;
  }
  out
}

fn update_crc(mut crc: u32, bytes: &[u8]) -> u32 {
  for &byte in bytes {
    let i = (crc ^ u32::from(byte)) as u8 as usize;
    crc = CRC_TABLE[i] ^ (crc >> 8);
  }
  crc
}

/// A running PNG CRC-32, for chunks whose bytes arrive in pieces.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Crc32(u32);
impl Default for Crc32 {
  #[inline]
  fn default() -> Self {
    Self::new()
  }
}
impl Crc32 {
  #[inline]
  #[must_use]
  pub const fn new() -> Self {
    Self(u32::MAX)
  }
  #[inline]
  pub fn update(&mut self, bytes: &[u8]) {
    self.0 = update_crc(self.0, bytes);
  }
  #[inline]
  #[must_use]
  pub const fn finish(self) -> u32 {
    self.0 ^ u32::MAX
  }
}

/// The CRC of a chunk, computed over its type bytes then its data bytes.
#[inline]
#[must_use]
pub fn png_crc(bytes: &[u8]) -> u32 {
  let mut crc = Crc32::new();
  crc.update(bytes);
  crc.finish()
}

#[test]
fn test_known_crcs() {
  assert_eq!(png_crc(b"IEND"), 0xAE42_6082);
  // the standard CRC-32 check value
  assert_eq!(png_crc(b"123456789"), 0xCBF4_3926);
  let mut split = Crc32::new();
  split.update(b"1234");
  split.update(b"56789");
  assert_eq!(split.finish(), 0xCBF4_3926);
}
