use std::io::Write;

use super::*;

/// Writes one chunk: length, type, optional sequence number, data, CRC.
///
/// The sequence number (used by `fdAT`) counts toward the length and the
/// CRC, exactly as if it were the first four bytes of `data`.
pub fn write_chunk<W: Write>(
  w: &mut W, chunk_ty: PngChunkType, sequence_number: Option<u32>, data: &[u8],
) -> ApngResult<()> {
  let prefix = sequence_number.map(u32::to_be_bytes);
  let prefix: &[u8] = match &prefix {
    Some(p) => p,
    None => &[],
  };
  let len = u32::try_from(prefix.len() + data.len()).map_err(|_| ApngError::ArgumentError)?;
  let mut crc = Crc32::new();
  crc.update(&chunk_ty.0);
  crc.update(prefix);
  crc.update(data);
  w.write_all(&len.to_be_bytes())?;
  w.write_all(&chunk_ty.0)?;
  w.write_all(prefix)?;
  w.write_all(data)?;
  w.write_all(&crc.finish().to_be_bytes())?;
  Ok(())
}
