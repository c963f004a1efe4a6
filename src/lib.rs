#![cfg_attr(docs_rs, feature(doc_cfg))]

//! Wu color quantization and an animated PNG encoder.
//!
//! * [`quantize`] reduces a 32-bit image to at most 256 palette entries,
//!   reserving the last one as a fully transparent sentinel.
//! * [`apng`] streams frames into an APNG file. Frames after the first are
//!   trimmed to the bounding box of their visible pixels, each row gets the
//!   PNG filter that looks most compressible, and the whole frame is DEFLATE
//!   compressed into `IDAT`/`fdAT` chunks.
//! * [`png`] has the chunk level pieces both of those are built from.
//!
//! Pixel data is always 32 bits per pixel, stored B,G,R,A in memory. See
//! [`BitmapView`] for how row strides (including negative ones) work.

#[cfg(target_pointer_width = "16")]
compile_error!("this crate assumes 32-bit or bigger pointers!");

mod int_endian;
pub use int_endian::*;

mod error;
pub use error::*;

pub mod pixel;
pub use pixel::Pixel;

pub mod bitmap;
pub use bitmap::{BitmapView, IndexedBitmapMut};

pub mod png;

pub mod quantize;
pub use quantize::{quantize_image, quantize_image_with_options, QuantizeOptions, QuantizedImage};

#[cfg(feature = "apng")]
#[cfg_attr(docs_rs, doc(cfg(feature = "apng")))]
pub mod apng;
#[cfg(feature = "apng")]
pub use apng::{ApngEncoder, EncoderOptions};
