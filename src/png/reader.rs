use std::io::{self, Read};

use bytemuck::{Pod, Zeroable};

use crate::{ChunkError, FormatError, Result};

use super::*;

/// The length and type that start every chunk.
#[derive(Debug, Clone, Copy, Pod, Zeroable)]
#[repr(C)]
struct RawChunkHeader {
  length: [u8; 4],
  ty: [u8; 4],
}

/// Reads successive chunks out of a PNG datastream.
///
/// The reader owns its source and a cursor of how many bytes it has consumed.
/// It is forward-only: once a chunk has been produced there's no going back,
/// and to read the stream again you need a new reader over a fresh source.
///
/// As an [`Iterator`] it produces `Result<PngChunk>` values. It stops after the
/// `IEND` chunk, and it also stops after the first error.
#[derive(Debug)]
pub struct PngChunkReader<R> {
  source: R,
  position: u64,
  lenient: bool,
  signature_checked: bool,
  finished: bool,
}
impl<R: Read> PngChunkReader<R> {
  /// Makes a strict reader over the source, which should be positioned at the
  /// very start of the PNG signature.
  #[inline]
  #[must_use]
  pub fn new(source: R) -> Self {
    Self { source, position: 0, lenient: false, signature_checked: false, finished: false }
  }

  /// In lenient mode, a bad chunk checksum is logged as a warning and the
  /// chunk is returned anyway.
  #[inline]
  #[must_use]
  pub fn lenient(mut self, lenient: bool) -> Self {
    self.lenient = lenient;
    self
  }

  /// The number of bytes consumed from the source so far.
  #[inline]
  #[must_use]
  pub const fn position(&self) -> u64 {
    self.position
  }

  /// If the reader has seen `IEND` (or an error) and won't produce more.
  #[inline]
  #[must_use]
  pub const fn is_finished(&self) -> bool {
    self.finished
  }

  /// Gives back the source, wherever it's currently positioned.
  #[inline]
  #[must_use]
  pub fn into_inner(self) -> R {
    self.source
  }

  /// Reads and checks the 8 byte signature, if that hasn't happened yet.
  ///
  /// Calling this more than once is fine, the check only happens the first
  /// time. [`read_chunk`](Self::read_chunk) calls this for you.
  ///
  /// Any failure, I/O included, finishes the reader. Later calls then keep
  /// failing with [`FormatError::BadSignature`], since the signature was
  /// never confirmed.
  pub fn validate_signature(&mut self) -> Result<()> {
    if self.signature_checked {
      return Ok(());
    }
    if self.finished {
      return Err(FormatError::BadSignature.into());
    }
    let mut signature = [0_u8; 8];
    let got = match self.fill(&mut signature) {
      Ok(got) => got,
      Err(e) => {
        self.finished = true;
        return Err(e.into());
      }
    };
    if got != signature.len() || signature != PNG_SIGNATURE {
      self.finished = true;
      return Err(FormatError::BadSignature.into());
    }
    self.signature_checked = true;
    Ok(())
  }

  /// Reads the next chunk.
  ///
  /// Gives `Ok(None)` once the `IEND` chunk has been read. If the source runs
  /// out cleanly *before* an `IEND` chunk that's a
  /// [`ChunkError::MissingEnd`] error.
  pub fn read_chunk(&mut self) -> Result<Option<PngChunk>> {
    if self.finished {
      return Ok(None);
    }
    let out = self.read_chunk_inner();
    if out.is_err() {
      self.finished = true;
    }
    out.map(Some)
  }

  fn read_chunk_inner(&mut self) -> Result<PngChunk> {
    self.validate_signature()?;
    let (length, ty) = match self.read_header()? {
      Some(header) => header,
      None => return Err(ChunkError::MissingEnd.into()),
    };

    let mut data = Vec::new();
    let got = (&mut self.source).take(u64::from(length)).read_to_end(&mut data)?;
    self.position += got as u64;
    if got != length as usize {
      return Err(
        ChunkError::TruncatedPayload { ty: ty.into(), expected: length, actual: got }.into(),
      );
    }

    let mut crc_bytes = [0_u8; 4];
    if self.fill(&mut crc_bytes)? != crc_bytes.len() {
      return Err(ChunkError::TruncatedChecksum { ty: ty.into() }.into());
    }
    let declared = u32::from_be_bytes(crc_bytes);

    let chunk = PngChunk::new(ty, data);
    let actual = chunk.compute_crc();
    if declared != actual {
      let err = ChunkError::ChecksumMismatch { ty: ty.into(), declared, actual };
      if self.lenient {
        log::warn!("{err}");
      } else {
        return Err(err.into());
      }
    }

    if ty == ChunkType::IEND {
      self.finished = true;
    }
    log::trace!("read {ty} chunk, {length} bytes, ending at byte {}", self.position);
    Ok(chunk)
  }

  /// Gives `None` if the source is already empty.
  fn read_header(&mut self) -> Result<Option<(u32, ChunkType)>> {
    let mut header = RawChunkHeader::zeroed();
    let start = self.position;
    match self.fill(bytemuck::bytes_of_mut(&mut header))? {
      0 => return Ok(None),
      8 => (),
      _ => return Err(FormatError::TruncatedHeader { position: start }.into()),
    }
    let length = u32::from_be_bytes(header.length);
    let ty = ChunkType(header.ty);
    if length > MAX_CHUNK_LENGTH {
      return Err(FormatError::ChunkTooLarge { ty: ty.into(), length }.into());
    }
    if !ty.is_valid() {
      return Err(FormatError::InvalidChunkType { ty: ty.into() }.into());
    }
    Ok(Some((length, ty)))
  }

  /// Like `read_exact`, but a short read reports how far it got instead of
  /// being an error.
  fn fill(&mut self, buf: &mut [u8]) -> io::Result<usize> {
    let mut filled = 0;
    while filled < buf.len() {
      match self.source.read(&mut buf[filled..]) {
        Ok(0) => break,
        Ok(n) => filled += n,
        Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
        Err(e) => return Err(e),
      }
    }
    self.position += filled as u64;
    Ok(filled)
  }
}
impl<R: Read> Iterator for PngChunkReader<R> {
  type Item = Result<PngChunk>;

  #[inline]
  fn next(&mut self) -> Option<Self::Item> {
    self.read_chunk().transpose()
  }
}

/// Reads an entire PNG datastream into a list of chunks, ending with `IEND`.
#[inline]
pub fn read_png_chunks<R: Read>(source: R, lenient: bool) -> Result<Vec<PngChunk>> {
  PngChunkReader::new(source).lenient(lenient).collect()
}
