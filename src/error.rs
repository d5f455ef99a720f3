use std::io;

use crate::AsciiArray;

/// Shorthand for results from this crate.
pub type Result<T, E = Error> = core::result::Result<T, E>;

/// An error from the `vszimg` crate.
#[derive(Debug, thiserror::Error)]
pub enum Error {
  /// The API was used incorrectly, such as a negative chunk index.
  ///
  /// These are never caused by file content, and are reported before any I/O
  /// happens.
  #[error("protocol error: {0}")]
  Protocol(String),

  /// The input data isn't a well-formed container.
  #[error(transparent)]
  Format(#[from] FormatError),

  /// The file system said no.
  #[error(transparent)]
  Io(#[from] io::Error),

  /// The SVG document couldn't be parsed.
  #[cfg(feature = "svg")]
  #[error("svg error: {0}")]
  Xml(#[from] quick_xml::Error),

  /// A stored script couldn't be turned into commands.
  #[error("script error on line {line}: {message}")]
  Script { line: usize, message: String },

  /// The host application failed to perform a request.
  #[error("host error: {0}")]
  Host(String),
}
impl Error {
  #[inline]
  pub(crate) fn protocol(message: impl Into<String>) -> Self {
    Self::Protocol(message.into())
  }

  /// If this error is a checksum mismatch, gives the `(declared, actual)`
  /// checksum values.
  #[inline]
  #[must_use]
  pub fn checksum_mismatch(&self) -> Option<(u32, u32)> {
    match self {
      Self::Format(FormatError::Chunk(ChunkError::ChecksumMismatch {
        declared, actual, ..
      })) => Some((*declared, *actual)),
      _ => None,
    }
  }
}
impl From<ChunkError> for Error {
  #[inline]
  fn from(e: ChunkError) -> Self {
    Self::Format(FormatError::Chunk(e))
  }
}

/// The data stream is malformed.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum FormatError {
  /// The first eight bytes aren't the PNG signature.
  #[error("PNG file has invalid signature")]
  BadSignature,

  /// The stream ended partway through a chunk's length and type.
  #[error("end of file whilst reading chunk length and type (at byte {position})")]
  TruncatedHeader { position: u64 },

  /// A chunk declared a length over `2^31 - 1`.
  #[error("chunk {ty} is too large: {length}")]
  ChunkTooLarge { ty: AsciiArray<4>, length: u32 },

  /// A chunk type byte was outside of `A-Z` and `a-z`.
  #[error("chunk {:?} has invalid chunk type", .ty.0)]
  InvalidChunkType { ty: AsciiArray<4> },

  /// The SVG document parsed, but isn't shaped like a document.
  #[error("malformed SVG: {0}")]
  Svg(String),

  /// A structural problem with a particular chunk.
  #[error(transparent)]
  Chunk(#[from] ChunkError),
}

/// A chunk-level structural problem.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ChunkError {
  /// The stream ended at a chunk boundary without an `IEND` chunk.
  #[error("no more chunks, the stream has no IEND chunk")]
  MissingEnd,

  /// There were fewer data bytes than the chunk's declared length.
  #[error("chunk {ty} too short for required {expected} octets (got {actual})")]
  TruncatedPayload { ty: AsciiArray<4>, expected: u32, actual: usize },

  /// The stream ended before the chunk's checksum.
  #[error("chunk {ty} too short for checksum")]
  TruncatedChecksum { ty: AsciiArray<4> },

  /// The declared checksum doesn't match the checksum of the chunk.
  #[error("checksum error in {ty} chunk: 0x{declared:08X} != 0x{actual:08X}")]
  ChecksumMismatch { ty: AsciiArray<4>, declared: u32, actual: u32 },
}
