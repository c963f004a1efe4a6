//! Writes a short demo animation, then lists the chunks of the result.
//!
//! `apngkit <out.png> [--optimize]`

use std::process::ExitCode;

use apngkit::{png::PngRawChunkIter, ApngEncoder, ApngResult, BitmapView, Pixel};

const SIZE: u32 = 64;
const FRAMES: u32 = 12;

/// A square sliding along the diagonal over a gradient backdrop (frame 0)
/// or over nothing (later frames).
fn frame_pixels(n: u32) -> Vec<Pixel> {
  let mut px = Vec::with_capacity((SIZE * SIZE) as usize);
  let offset = n * (SIZE - 16) / FRAMES;
  for y in 0..SIZE {
    for x in 0..SIZE {
      let in_square = (offset..offset + 16).contains(&x) && (offset..offset + 16).contains(&y);
      px.push(if in_square {
        Pixel::new(255, 240, (n * 20) as u8, 40)
      } else if n == 0 {
        Pixel::new(255, (x * 4) as u8, (y * 4) as u8, 128)
      } else {
        Pixel::TRANSPARENT
      });
    }
  }
  px
}

fn write_demo(path: &str, optimize: bool) -> ApngResult<()> {
  let mut enc = ApngEncoder::open(path, SIZE, SIZE)?;
  for n in 0..FRAMES {
    let px = frame_pixels(n);
    enc.append_frame(&BitmapView::from_pixels(SIZE, SIZE, &px)?, 0, 0, 80, optimize)?;
  }
  enc.finish()?;
  enc.destroy()
}

fn main() -> ExitCode {
  let args: Vec<String> = std::env::args().skip(1).collect();
  let optimize = args.iter().any(|a| a == "--optimize");
  let Some(path) = args.iter().find(|a| !a.starts_with("--")) else {
    eprintln!("usage: apngkit <out.png> [--optimize]");
    return ExitCode::FAILURE;
  };

  if let Err(e) = write_demo(path, optimize) {
    eprintln!("{path}: {e}");
    return ExitCode::FAILURE;
  }

  let bytes = match std::fs::read(path) {
    Ok(bytes) => bytes,
    Err(e) => {
      eprintln!("{path}: {e}");
      return ExitCode::FAILURE;
    }
  };
  for chunk in PngRawChunkIter::new(&bytes) {
    let ok = if chunk.declared_crc() == chunk.actual_crc() { "ok" } else { "BAD CRC" };
    println!("{:?} {:>6} bytes  {ok}", chunk.type_(), chunk.data().len());
  }
  ExitCode::SUCCESS
}
