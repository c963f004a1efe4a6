use std::{
  collections::HashSet,
  io::{self, Cursor, Seek, SeekFrom, Write},
};

use apngkit::{
  png::{acTL, fcTL, tEXt, FrameControl, PngChunkType, PngRawChunk, PngRawChunkIter, PNG_SIGNATURE},
  ApngEncoder, ApngError, BitmapView, EncoderOptions, Pixel,
};
use miniz_oxide::inflate::decompress_to_vec_zlib;

fn paeth(a: u8, b: u8, c: u8) -> u8 {
  let (ia, ib, ic) = (i32::from(a), i32::from(b), i32::from(c));
  let p = ia + ib - ic;
  let (pa, pb, pc) = ((p - ia).abs(), (p - ib).abs(), (p - ic).abs());
  if pa <= pb && pa <= pc {
    a
  } else if pb <= pc {
    b
  } else {
    c
  }
}

/// Inflates and unfilters one frame's image data into RGBA rows.
fn decode_frame(zlib: &[u8], width: u32, height: u32) -> Vec<u8> {
  let raw = decompress_to_vec_zlib(zlib).unwrap();
  let row_bytes = width as usize * 4;
  assert_eq!(raw.len(), (row_bytes + 1) * height as usize);
  let mut out: Vec<u8> = Vec::new();
  for (y, line) in raw.chunks_exact(row_bytes + 1).enumerate() {
    let start = out.len();
    for i in 0..row_bytes {
      let a = if i >= 4 { out[start + i - 4] } else { 0 };
      let b = if y > 0 { out[start - row_bytes + i] } else { 0 };
      let c = if y > 0 && i >= 4 { out[start - row_bytes + i - 4] } else { 0 };
      let f = line[1 + i];
      out.push(match line[0] {
        0 => f,
        1 => f.wrapping_add(a),
        2 => f.wrapping_add(b),
        3 => f.wrapping_add(((u16::from(a) + u16::from(b)) / 2) as u8),
        4 => f.wrapping_add(paeth(a, b, c)),
        other => panic!("bad filter {other}"),
      });
    }
  }
  out
}

fn rgba_of(px: &[Pixel]) -> Vec<u8> {
  px.iter().flat_map(|p| p.to_rgba()).collect()
}

/// One decoded frame: its control chunk and concatenated image data.
struct Frame {
  control: FrameControl,
  data: Vec<u8>,
}

/// Checks the chunk level structure and pulls the frames back out.
fn read_apng(bytes: &[u8]) -> (u32, Vec<Frame>) {
  assert_eq!(&bytes[..8], &PNG_SIGNATURE);
  let chunks: Vec<PngRawChunk<'_>> = PngRawChunkIter::new(bytes).collect();
  for c in &chunks {
    assert_eq!(c.declared_crc(), c.actual_crc(), "{c:?}");
  }
  assert_eq!(chunks[0].type_(), PngChunkType::IHDR);
  assert_eq!(chunks[1].type_(), PngChunkType::acTL);
  assert_eq!(chunks.last().unwrap().type_(), PngChunkType::IEND);
  // IHDR is always 25 bytes, so acTL sits right after it
  let actl: acTL = bytemuck::pod_read_unaligned(&bytes[33..53]);
  assert_eq!(actl.as_bytes()[8..16], *chunks[1].data());
  let num_frames = actl.num_frames();

  let mut frames: Vec<Frame> = Vec::new();
  let mut expected_sequence = 0;
  for c in &chunks[2..] {
    match c.type_() {
      PngChunkType::fcTL => {
        let control = fcTL::parse_payload(c.data()).unwrap();
        assert_eq!(control.sequence_number, expected_sequence);
        expected_sequence += 1;
        frames.push(Frame { control, data: Vec::new() });
      }
      PngChunkType::IDAT => {
        assert_eq!(frames.len(), 1, "IDAT only belongs to the first frame");
        frames[0].data.extend_from_slice(c.data());
      }
      PngChunkType::fdAT => {
        assert!(frames.len() > 1);
        let seq = u32::from_be_bytes(c.data()[..4].try_into().unwrap());
        assert_eq!(seq, expected_sequence);
        expected_sequence += 1;
        frames.last_mut().unwrap().data.extend_from_slice(&c.data()[4..]);
      }
      _ => (),
    }
  }
  (num_frames, frames)
}

fn square(width: u32, height: u32, x0: u32, y0: u32, size: u32, color: Pixel) -> Vec<Pixel> {
  let mut px = vec![Pixel::TRANSPARENT; (width * height) as usize];
  for y in y0..y0 + size {
    for x in x0..x0 + size {
      px[(y * width + x) as usize] = color;
    }
  }
  px
}

#[test]
fn test_frames_round_trip_through_a_file() {
  let dir = tempfile::tempdir().unwrap();
  let path = dir.path().join("anim.png");
  let (w, h) = (24, 16);
  let background: Vec<Pixel> = (0..w * h).map(|i| Pixel::new(255, (i * 3) as u8, (i / 7) as u8, 90)).collect();
  let moving: Vec<Vec<Pixel>> =
    (0..3).map(|i| square(w, h, 2 + i * 5, 3 + i, 4, Pixel::new(200, 255, 0, 0))).collect();

  let mut enc = ApngEncoder::open(&path, w, h).unwrap();
  enc.append_frame(&BitmapView::from_pixels(w, h, &background).unwrap(), 0, 0, 100, false).unwrap();
  for (i, f) in moving.iter().enumerate() {
    enc.append_frame(&BitmapView::from_pixels(w, h, f).unwrap(), 0, 0, 40 + i as u16, false).unwrap();
  }
  assert_eq!(enc.frame_count(), 4);
  enc.finish().unwrap();
  drop(enc);

  let bytes = std::fs::read(&path).unwrap();
  let (num_frames, frames) = read_apng(&bytes);
  assert_eq!(num_frames, 4);
  assert_eq!(frames.len(), 4);

  let first = &frames[0].control;
  assert_eq!((first.width, first.height, first.x_offset, first.y_offset), (w, h, 0, 0));
  assert_eq!((first.delay_num, first.delay_den), (100, 1000));
  assert_eq!(decode_frame(&frames[0].data, w, h), rgba_of(&background));

  for (i, frame) in frames[1..].iter().enumerate() {
    let c = &frame.control;
    let i = i as u32;
    assert_eq!((c.x_offset, c.y_offset, c.width, c.height), (2 + i * 5, 3 + i, 4, 4));
    assert_eq!(c.delay_num, 40 + i as u16);
    assert_eq!(decode_frame(&frame.data, 4, 4), rgba_of(&[Pixel::new(200, 255, 0, 0); 16]));
  }

  let text = PngRawChunkIter::new(&bytes).find(|c| c.type_() == PngChunkType::tEXt).unwrap();
  assert_eq!(tEXt::parse_payload(text.data()), Some((&b"Software"[..], &b"libapng for WzComparerR2"[..])));
}

#[test]
fn test_single_visible_pixel_frame() {
  let mut out = Cursor::new(Vec::new());
  let mut enc = ApngEncoder::new(&mut out, 10, 10, EncoderOptions::default()).unwrap();
  let first = vec![Pixel::TRANSPARENT; 100];
  enc.append_frame(&BitmapView::from_pixels(10, 10, &first).unwrap(), 0, 0, 10, false).unwrap();
  let mut second = first.clone();
  second[4 * 10 + 3] = Pixel::new(255, 1, 2, 3);
  enc.append_frame(&BitmapView::from_pixels(10, 10, &second).unwrap(), 0, 0, 10, false).unwrap();
  // nothing visible at all still takes one pixel
  enc.append_frame(&BitmapView::from_pixels(10, 10, &first).unwrap(), 0, 0, 10, false).unwrap();
  enc.finish().unwrap();
  drop(enc);

  let (num_frames, frames) = read_apng(out.get_ref());
  assert_eq!(num_frames, 3);
  let c = &frames[1].control;
  assert_eq!((c.x_offset, c.y_offset, c.width, c.height), (3, 4, 1, 1));
  assert_eq!(decode_frame(&frames[1].data, 1, 1), [1, 2, 3, 255]);
  let c = &frames[2].control;
  assert_eq!((c.x_offset, c.y_offset, c.width, c.height), (0, 0, 1, 1));
}

#[test]
fn test_large_frames_split_into_chunks() {
  let (w, h) = (40, 40);
  let px = super::rand_pixels((w * h) as usize);
  let mut out = Cursor::new(Vec::new());
  let options = EncoderOptions { max_chunk_len: 500, text: None, num_plays: 3, ..Default::default() };
  let mut enc = ApngEncoder::new(&mut out, w, h, options).unwrap();
  let view = BitmapView::from_pixels(w, h, &px).unwrap();
  enc.append_frame(&view, 0, 0, 10, false).unwrap();
  enc.append_frame(&view, 0, 0, 10, false).unwrap();
  enc.finish().unwrap();
  drop(enc);

  let bytes = out.into_inner();
  let chunks: Vec<_> = PngRawChunkIter::new(&bytes).collect();
  let idats = chunks.iter().filter(|c| c.type_() == PngChunkType::IDAT).count();
  let fdats: Vec<_> = chunks.iter().filter(|c| c.type_() == PngChunkType::fdAT).collect();
  assert!(idats > 1);
  assert!(fdats.len() > 1);
  assert!(chunks.iter().all(|c| c.data().len() <= 504));
  assert!(chunks.iter().all(|c| c.type_() != PngChunkType::tEXt));
  let actl = chunks[1].data();
  assert_eq!(actl, &[0, 0, 0, 2, 0, 0, 0, 3]);

  let (_, frames) = read_apng(&bytes);
  assert_eq!(decode_frame(&frames[0].data, w, h), rgba_of(&px));
  // random alpha is almost never zero everywhere on an edge, but the rect
  // is whatever the visible pixels say
  let c = &frames[1].control;
  let expected: Vec<u8> = (c.y_offset..c.y_offset + c.height)
    .flat_map(|y| {
      let row = &px[(y * w) as usize..((y + 1) * w) as usize];
      rgba_of(&row[c.x_offset as usize..(c.x_offset + c.width) as usize])
    })
    .collect();
  assert_eq!(decode_frame(&frames[1].data, c.width, c.height), expected);
}

#[test]
fn test_optimized_frame_uses_at_most_256_colors() {
  let (w, h) = (32, 32);
  let px = super::rand_pixels((w * h) as usize);
  let mut out = Cursor::new(Vec::new());
  let mut enc = ApngEncoder::new(&mut out, w, h, EncoderOptions::default()).unwrap();
  enc.append_frame(&BitmapView::from_pixels(w, h, &px).unwrap(), 0, 0, 10, true).unwrap();
  enc.finish().unwrap();
  drop(enc);

  let (_, frames) = read_apng(out.get_ref());
  let rgba = decode_frame(&frames[0].data, w, h);
  let distinct: HashSet<&[u8]> = rgba.chunks_exact(4).collect();
  assert!(distinct.len() <= 256);
  for (p, q) in px.iter().zip(rgba.chunks_exact(4)) {
    if p.a <= 10 {
      assert_eq!(q, [0, 0, 0, 0]);
    }
  }
}

#[test]
fn test_argument_errors() {
  let mut out = Cursor::new(Vec::new());
  let mut enc = ApngEncoder::new(&mut out, 8, 8, EncoderOptions::default()).unwrap();
  let px = vec![Pixel::new(255, 1, 1, 1); 64];
  let partial = BitmapView::from_pixels(8, 4, &px[..32]).unwrap();
  assert_eq!(enc.append_frame(&partial, 0, 0, 10, false), Err(ApngError::ArgumentError));
  // nothing is written for a rejected first frame
  drop(enc);
  assert!(out.get_ref().is_empty());
}

#[test]
fn test_open_bad_path_is_a_file_error() {
  let dir = tempfile::tempdir().unwrap();
  let path = dir.path().join("missing").join("anim.png");
  let e = ApngEncoder::open(&path, 4, 4).unwrap_err();
  assert!(matches!(e, ApngError::FileError(_)));
}

/// An output that can report its position but can't move it.
struct NoSeek(Vec<u8>);
impl Write for NoSeek {
  fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
    self.0.write(buf)
  }
  fn flush(&mut self) -> io::Result<()> {
    Ok(())
  }
}
impl Seek for NoSeek {
  fn seek(&mut self, pos: SeekFrom) -> io::Result<u64> {
    match pos {
      SeekFrom::Current(0) => Ok(self.0.len() as u64),
      _ => Err(io::Error::new(io::ErrorKind::Unsupported, "no seeking")),
    }
  }
}

#[test]
fn test_seek_failure_still_writes_the_trailer() {
  let mut out = NoSeek(Vec::new());
  let mut enc = ApngEncoder::new(&mut out, 2, 2, EncoderOptions::default()).unwrap();
  let px = [Pixel::new(255, 9, 8, 7); 4];
  let view = BitmapView::from_pixels(2, 2, &px).unwrap();
  enc.append_frame(&view, 0, 0, 10, false).unwrap();
  enc.append_frame(&view, 0, 0, 10, false).unwrap();
  enc.finish().unwrap();
  drop(enc);

  let (num_frames, frames) = read_apng(&out.0);
  // the placeholder count stays
  assert_eq!(num_frames, 0);
  assert_eq!(frames.len(), 2);
  assert_eq!(acTL::new(0, 0).as_bytes(), &out.0[33..53]);
}

#[test]
fn test_dropping_without_finish_leaves_no_trailer() {
  let mut out = Cursor::new(Vec::new());
  let mut enc = ApngEncoder::new(&mut out, 2, 2, EncoderOptions::default()).unwrap();
  let px = [Pixel::new(255, 9, 8, 7); 4];
  enc.append_frame(&BitmapView::from_pixels(2, 2, &px).unwrap(), 0, 0, 10, false).unwrap();
  enc.destroy().unwrap();
  let bytes = out.into_inner();
  let last = PngRawChunkIter::new(&bytes).last().unwrap();
  assert_ne!(last.type_(), PngChunkType::IEND);
}
