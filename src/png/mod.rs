//! PNG chunk building blocks.
//!
//! A PNG file is the 8 byte [`PNG_SIGNATURE`] followed by "chunks". Each
//! chunk is a big-endian `u32` data length, four ASCII type bytes, the data,
//! and a CRC-32 of the type plus data.
//!
//! The fixed size chunks this crate writes ([`IHDR`], [`acTL`], [`fcTL`],
//! [`IEND`]) are `#[repr(C)]` structs laid out exactly as they appear in the
//! file, so writing one is a single `write_all` of its bytes. Variable size
//! chunks go through [`write_chunk`].
//!
//! [`PngRawChunkIter`] walks an existing PNG byte stream, which is handy for
//! checking what an encoder produced.

use bytemuck::{bytes_of, Pod, Zeroable};

use crate::{ApngError, ApngResult, U16BE, U32BE};

mod crc32;
pub use crc32::*;

mod raw_chunk;
pub use raw_chunk::*;

mod write;
pub use write::*;

#[allow(nonstandard_style)]
mod ihdr;
pub use ihdr::*;

#[allow(nonstandard_style)]
mod actl;
pub use actl::*;

#[allow(nonstandard_style)]
mod fctl;
pub use fctl::*;

#[allow(nonstandard_style)]
mod text;
pub use text::*;

#[allow(nonstandard_style)]
mod iend;
pub use iend::*;

/// The first eight bytes of every PNG.
pub const PNG_SIGNATURE: [u8; 8] = [137, 80, 78, 71, 13, 10, 26, 10];

/// CRC of a whole fixed-layout chunk's bytes: everything between the length
/// field and the CRC field.
#[inline]
#[must_use]
fn sealed_crc(chunk: &[u8]) -> u32 {
  png_crc(&chunk[4..chunk.len() - 4])
}
