use std::{collections::TryReserveError, io};

use thiserror::Error;

/// An error from the `apngkit` crate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum ApngError {
  /// The encoder context couldn't be created.
  #[error("failed to create the encoder context")]
  ContextCreateFailed,

  /// Opening, writing, or seeking the output failed.
  #[error("file error: {0}")]
  FileError(io::ErrorKind),

  /// The arguments don't describe a frame this encoder can accept.
  ///
  /// The first frame must cover the full canvas, and every pixel buffer must
  /// be large enough for its declared width, height, and stride.
  #[error("invalid argument")]
  ArgumentError,

  /// The allocator couldn't give us enough space.
  #[error("memory allocation failed")]
  MemoryError,
}
impl From<TryReserveError> for ApngError {
  #[inline]
  fn from(_: TryReserveError) -> Self {
    Self::MemoryError
  }
}
impl From<io::Error> for ApngError {
  #[inline]
  fn from(e: io::Error) -> Self {
    Self::FileError(e.kind())
  }
}

/// Result alias for fallible operations in this crate.
pub type ApngResult<T> = Result<T, ApngError>;

/// Allocates a zeroed `Vec` of `len` elements, reporting allocation failure
/// as [`ApngError::MemoryError`] instead of aborting.
pub(crate) fn try_zeroed_vec<T: Clone + Default>(len: usize) -> ApngResult<Vec<T>> {
  let mut v = Vec::new();
  v.try_reserve_exact(len)?;
  v.resize(len, T::default());
  Ok(v)
}
