//! Streaming animated PNG encoder.
//!
//! Frames are 32-bit B,G,R,A bitmaps. The first frame must cover the whole
//! canvas and goes into `IDAT` (so viewers without APNG support show it as a
//! still image). Later frames are cropped to the bounding box of their
//! non-transparent pixels and go into `fdAT` chunks, each placed with
//! "dispose to background" and "blend source".
//!
//! The frame count in `acTL` isn't known until the end, so a placeholder is
//! written up front and patched by [`ApngEncoder::finish`]. That's why the
//! output has to be [`Seek`].
//!
//! ```no_run
//! use apngkit::{ApngEncoder, BitmapView, Pixel};
//! # fn main() -> apngkit::ApngResult<()> {
//! let mut enc = ApngEncoder::open("out.png", 16, 16)?;
//! let red = vec![Pixel::new(255, 255, 0, 0); 16 * 16];
//! enc.append_frame(&BitmapView::from_pixels(16, 16, &red)?, 0, 0, 100, false)?;
//! enc.finish()?;
//! # Ok(())
//! # }
//! ```

use std::{
  fs::File,
  io::{BufWriter, Seek, SeekFrom, Write},
  path::Path,
};

use log::{debug, trace, warn};

use crate::{
  bitmap::BitmapView,
  png::{acTL, fcTL, tEXt, write_chunk, BlendOp, DisposeOp, FrameControl, PngChunkType, IEND, IHDR, PNG_SIGNATURE},
  quantize::{quantize, QuantizeOptions},
  ApngError, ApngResult,
};

pub mod deflate;
pub mod filter;
pub mod rect;

use deflate::{compress_frame, tighten_zlib_header, TrialCompressors};
use filter::{process_rect, FilterScratch};
use rect::dirty_rect;

/// Largest canvas side a PNG allows.
const MAX_DIMENSION: u32 = i32::MAX as u32;

/// Encoder settings.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct EncoderOptions {
  /// Level of the two throwaway compressors that decide if filtering pays.
  pub trial_level: u8,
  /// Level of the real compression pass.
  pub final_level: u8,
  /// Largest `IDAT`/`fdAT` payload. Bigger frames are split.
  pub max_chunk_len: usize,
  /// Times to play the animation; 0 loops forever.
  pub num_plays: u32,
  /// `tEXt` keyword and text written at the end, if any.
  pub text: Option<(String, String)>,
  /// Used for frames appended with `optimize`.
  pub quantize: QuantizeOptions,
  /// Frame delays are `delay_ms / delay_den` seconds.
  pub delay_den: u16,
}
impl Default for EncoderOptions {
  fn default() -> Self {
    Self {
      trial_level: 2,
      final_level: 9,
      max_chunk_len: 32 * 1024,
      num_plays: 0,
      text: Some(("Software".into(), "libapng for WzComparerR2".into())),
      quantize: QuantizeOptions::default(),
      delay_den: 1000,
    }
  }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum EncoderState {
  /// Nothing written yet.
  Empty,
  /// Header written, `acTL` placeholder at this offset.
  Writing { actl_pos: u64 },
  Finalized,
}

/// Writes frames into an APNG stream.
///
/// Dropping the encoder flushes the output but does not finish the file;
/// call [`finish`](Self::finish) first.
pub struct ApngEncoder<W: Write + Seek> {
  out: W,
  width: u32,
  height: u32,
  options: EncoderOptions,
  state: EncoderState,
  frame_count: u32,
  sequence_number: u32,
  trials: TrialCompressors,
  scratch: Option<FilterScratch>,
  rgba: Vec<u8>,
  filtered: Vec<u8>,
  compressed: Vec<u8>,
}
impl<W: Write + Seek> core::fmt::Debug for ApngEncoder<W> {
  fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
    f.debug_struct("ApngEncoder")
      .field("width", &self.width)
      .field("height", &self.height)
      .field("state", &self.state)
      .field("frame_count", &self.frame_count)
      .field("sequence_number", &self.sequence_number)
      .finish_non_exhaustive()
  }
}

impl ApngEncoder<BufWriter<File>> {
  /// Creates (or truncates) the file at `path` for a `width` × `height`
  /// animation.
  pub fn open(path: impl AsRef<Path>, width: u32, height: u32) -> ApngResult<Self> {
    Self::open_with_options(path, width, height, EncoderOptions::default())
  }

  pub fn open_with_options(
    path: impl AsRef<Path>, width: u32, height: u32, options: EncoderOptions,
  ) -> ApngResult<Self> {
    check_canvas(width, height)?;
    let file = File::create(path.as_ref())?;
    debug!("opened {} for a {width}x{height} animation", path.as_ref().display());
    Self::new(BufWriter::new(file), width, height, options)
  }
}

fn check_canvas(width: u32, height: u32) -> ApngResult<()> {
  if width == 0 || height == 0 || width > MAX_DIMENSION / 4 || height > MAX_DIMENSION {
    Err(ApngError::ContextCreateFailed)
  } else {
    Ok(())
  }
}

impl<W: Write + Seek> ApngEncoder<W> {
  /// Wraps any seekable output.
  pub fn new(out: W, width: u32, height: u32, options: EncoderOptions) -> ApngResult<Self> {
    check_canvas(width, height)?;
    Ok(Self {
      out,
      width,
      height,
      trials: TrialCompressors::new(options.trial_level),
      options,
      state: EncoderState::Empty,
      frame_count: 0,
      sequence_number: 0,
      scratch: None,
      rgba: Vec::new(),
      filtered: Vec::new(),
      compressed: Vec::new(),
    })
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
  /// Frames appended so far.
  #[inline]
  #[must_use]
  pub const fn frame_count(&self) -> u32 {
    self.frame_count
  }
  #[inline]
  #[must_use]
  pub fn get_ref(&self) -> &W {
    &self.out
  }

  fn next_sequence_number(&mut self) -> u32 {
    let n = self.sequence_number;
    self.sequence_number += 1;
    n
  }

  /// Signature, `IHDR`, and the `acTL` placeholder.
  fn write_header(&mut self) -> ApngResult<u64> {
    self.out.write_all(&PNG_SIGNATURE)?;
    self.out.write_all(IHDR::rgba8(self.width, self.height).as_bytes())?;
    let actl_pos = self.out.stream_position()?;
    trace!("acTL at offset {actl_pos}");
    self.out.write_all(acTL::new(0, self.options.num_plays).as_bytes())?;
    Ok(actl_pos)
  }

  /// Adds one frame at `(x, y)` on the canvas, shown for `delay_ms`
  /// (over `delay_den`) seconds.
  ///
  /// The first frame must be placed at the origin and match the canvas
  /// size. After that, only the part of `frame` holding pixels with nonzero
  /// alpha is stored. With `optimize`, the frame is first reduced to a 256
  /// color palette (then stored as RGBA anyway), which tends to compress
  /// better.
  pub fn append_frame(
    &mut self, frame: &BitmapView<'_>, x: u32, y: u32, delay_ms: u16, optimize: bool,
  ) -> ApngResult<()> {
    let (mut view, x, y) = match self.state {
      EncoderState::Finalized => return Err(ApngError::ArgumentError),
      EncoderState::Empty => {
        if x != 0 || y != 0 || frame.width() != self.width || frame.height() != self.height {
          return Err(ApngError::ArgumentError);
        }
        (*frame, x, y)
      }
      EncoderState::Writing { .. } => {
        let r = dirty_rect(frame);
        (frame.crop(r.x, r.y, r.width, r.height)?, x.saturating_add(r.x), y.saturating_add(r.y))
      }
    };
    let fits = |pos: u32, len: u32, max: u32| pos.checked_add(len).is_some_and(|end| end <= max);
    if !fits(x, view.width(), self.width) || !fits(y, view.height(), self.height) {
      return Err(ApngError::ArgumentError);
    }

    let scratch = match self.scratch.take() {
      Some(s) => s,
      None => FilterScratch::new(self.width as usize * 4)?,
    };
    let scratch = self.scratch.insert(scratch);

    let quantized;
    if optimize {
      let image = quantize(&view, &self.options.quantize)?;
      quantized = image.expand()?;
      view = BitmapView::from_pixels(image.width, image.height, &quantized)?;
    }
    let row_bytes = view.row_bytes();
    self.rgba.clear();
    self.rgba.try_reserve(row_bytes * view.height() as usize)?;
    for row in view.rows() {
      self.rgba.extend(row.iter().flat_map(|p| p.to_rgba()));
    }

    let filter = self.trials.should_filter(scratch, &self.rgba, row_bytes)?;
    self.filtered.clear();
    self.filtered.try_reserve((row_bytes + 1) * view.height() as usize)?;
    if filter {
      let filtered = &mut self.filtered;
      process_rect(scratch, &self.rgba, row_bytes, |_, best| filtered.extend_from_slice(best));
    } else {
      for row in self.rgba.chunks_exact(row_bytes) {
        self.filtered.push(0);
        self.filtered.extend_from_slice(row);
      }
    }
    compress_frame(&self.filtered, self.options.final_level, filter, &mut self.compressed)?;
    tighten_zlib_header(&mut self.compressed, self.filtered.len());

    if self.state == EncoderState::Empty {
      let actl_pos = self.write_header()?;
      self.state = EncoderState::Writing { actl_pos };
    }
    let control = FrameControl {
      sequence_number: self.next_sequence_number(),
      width: view.width(),
      height: view.height(),
      x_offset: x,
      y_offset: y,
      delay_num: delay_ms,
      delay_den: self.options.delay_den,
      dispose_op: DisposeOp::Background,
      blend_op: BlendOp::Source,
    };
    self.out.write_all(fcTL::from(control).as_bytes())?;
    self.write_image_data()?;
    debug!(
      "frame {}: {}x{} at ({x}, {y}), filtered: {filter}, {} bytes compressed",
      self.frame_count,
      view.width(),
      view.height(),
      self.compressed.len()
    );
    self.frame_count += 1;
    Ok(())
  }

  /// Splits the compressed frame into `IDAT` (first frame) or `fdAT` chunks.
  fn write_image_data(&mut self) -> ApngResult<()> {
    let max_len = self.options.max_chunk_len.max(1);
    let mut sequence_number = self.sequence_number;
    for piece in self.compressed.chunks(max_len) {
      if self.frame_count == 0 {
        write_chunk(&mut self.out, PngChunkType::IDAT, None, piece)?;
      } else {
        write_chunk(&mut self.out, PngChunkType::fdAT, Some(sequence_number), piece)?;
        sequence_number += 1;
      }
    }
    self.sequence_number = sequence_number;
    Ok(())
  }

  /// Patches the frame count into `acTL` and writes the trailing chunks.
  ///
  /// If the output can't seek back, the count is left at 0 (with a warning)
  /// and the trailer is still written. Calling this again does nothing, and
  /// appending afterwards is an error.
  pub fn finish(&mut self) -> ApngResult<()> {
    let actl_pos = match self.state {
      EncoderState::Finalized => return Ok(()),
      EncoderState::Empty => None,
      EncoderState::Writing { actl_pos } => Some(actl_pos),
    };
    self.state = EncoderState::Finalized;
    if let Some(pos) = actl_pos {
      match self.out.seek(SeekFrom::Start(pos)) {
        Ok(_) => {
          self.out.write_all(acTL::new(self.frame_count, self.options.num_plays).as_bytes())?;
          self.out.seek(SeekFrom::End(0))?;
        }
        Err(e) => warn!("couldn't seek back to acTL, frame count left at 0: {e}"),
      }
    }
    if let Some((keyword, text)) = &self.options.text {
      let payload = tEXt { keyword, text }.to_payload()?;
      write_chunk(&mut self.out, PngChunkType::tEXt, None, &payload)?;
    }
    self.out.write_all(IEND::default().as_bytes())?;
    self.out.flush()?;
    debug!("finished with {} frames", self.frame_count);
    Ok(())
  }

  /// Releases the encoder, reporting any error from the final flush.
  pub fn destroy(mut self) -> ApngResult<()> {
    self.out.flush()?;
    Ok(())
  }
}
impl<W: Write + Seek> Drop for ApngEncoder<W> {
  fn drop(&mut self) {
    if let Err(e) = self.out.flush() {
      warn!("flushing the APNG output failed: {e}");
    }
  }
}
