//! zlib compression of filtered frames.

use log::trace;
use miniz_oxide::deflate::core::{
  compress_to_output, create_comp_flags_from_zip_params, CompressionStrategy, CompressorOxide, TDEFLFlush,
  TDEFLStatus,
};

use super::filter::{process_rect, FilterScratch};
use crate::{ApngError, ApngResult};

/// zlib window size, as a base-2 exponent.
const WINDOW_BITS: i32 = 15;

fn compressor(level: u8, strategy: CompressionStrategy) -> Box<CompressorOxide> {
  let flags = create_comp_flags_from_zip_params(i32::from(level), WINDOW_BITS, strategy as i32);
  Box::new(CompressorOxide::new(flags))
}

/// Feeds `input` to `d`, adding the number of output bytes to `total` and
/// (if given) appending them to `out`.
fn feed(
  d: &mut CompressorOxide, mut input: &[u8], flush: TDEFLFlush, total: &mut usize, mut out: Option<&mut Vec<u8>>,
) -> ApngResult<()> {
  loop {
    let (status, consumed) = compress_to_output(d, input, flush, |bytes| {
      *total += bytes.len();
      match out.as_deref_mut() {
        Some(out) => out.try_reserve(bytes.len()).map(|_| out.extend_from_slice(bytes)).is_ok(),
        None => true,
      }
    });
    input = &input[consumed..];
    match status {
      TDEFLStatus::Done => return Ok(()),
      TDEFLStatus::Okay if input.is_empty() && flush != TDEFLFlush::Finish => return Ok(()),
      TDEFLStatus::Okay => continue,
      _ => return Err(ApngError::MemoryError),
    }
  }
}

/// The pair of fast compressors used to guess whether filtering helps.
///
/// One gets every row unfiltered, the other gets every row with its best
/// filter. Only their output sizes matter, so nothing is kept.
pub struct TrialCompressors {
  unfiltered: Box<CompressorOxide>,
  filtered: Box<CompressorOxide>,
}
impl core::fmt::Debug for TrialCompressors {
  fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
    f.debug_struct("TrialCompressors").finish_non_exhaustive()
  }
}
impl TrialCompressors {
  #[must_use]
  pub fn new(level: u8) -> Self {
    Self {
      unfiltered: compressor(level, CompressionStrategy::Default),
      filtered: compressor(level, CompressionStrategy::Filtered),
    }
  }

  /// Compresses `pixels` both ways and reports whether the filtered rows
  /// are worth keeping. Filtering wins ties.
  pub fn should_filter(
    &mut self, scratch: &mut FilterScratch, pixels: &[u8], row_bytes: usize,
  ) -> ApngResult<bool> {
    let mut plain_size = 0;
    let mut filtered_size = 0;
    let mut result = Ok(());
    process_rect(scratch, pixels, row_bytes, |plain, best| {
      if result.is_ok() {
        result = feed(&mut self.unfiltered, plain, TDEFLFlush::None, &mut plain_size, None)
          .and_then(|_| feed(&mut self.filtered, best, TDEFLFlush::None, &mut filtered_size, None));
      }
    });
    let finished = result
      .and_then(|_| feed(&mut self.unfiltered, &[], TDEFLFlush::Finish, &mut plain_size, None))
      .and_then(|_| feed(&mut self.filtered, &[], TDEFLFlush::Finish, &mut filtered_size, None));
    self.unfiltered.reset();
    self.filtered.reset();
    finished?;
    trace!("trial sizes: unfiltered {plain_size}, filtered {filtered_size}");
    Ok(plain_size >= filtered_size)
  }
}

/// Compresses the already tagged rows in `data` into a zlib stream.
pub fn compress_frame(data: &[u8], level: u8, filtered: bool, out: &mut Vec<u8>) -> ApngResult<()> {
  let strategy = if filtered { CompressionStrategy::Filtered } else { CompressionStrategy::Default };
  let mut d = compressor(level, strategy);
  out.clear();
  let mut total = 0;
  feed(&mut d, data, TDEFLFlush::Finish, &mut total, Some(out))
}

/// Shrinks the window size a zlib header declares to the smallest that still
/// covers `data_len` bytes of input.
///
/// Only headers for method 8 with a window of at most 32K are touched, and
/// the window never drops below 256 bytes. The check bits are recomputed
/// after the change.
pub fn tighten_zlib_header(stream: &mut [u8], data_len: usize) {
  let [cmf, flg, ..] = stream else {
    return;
  };
  if *cmf & 0x0F != 8 || *cmf & 0xF0 > 0x70 {
    return;
  }
  let mut cinfo = *cmf >> 4;
  let mut half_window = 1_usize << (cinfo + 7);
  while data_len <= half_window && half_window >= 256 {
    cinfo -= 1;
    half_window >>= 1;
  }
  let new_cmf = (*cmf & 0x0F) | (cinfo << 4);
  if new_cmf != *cmf {
    *cmf = new_cmf;
    *flg &= 0xE0;
    let check = (u32::from(new_cmf) * 256 + u32::from(*flg)) % 31;
    *flg += (31 - check) as u8;
  }
}
