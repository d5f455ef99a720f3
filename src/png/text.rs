//! Storing a script inside of a PNG's `tEXt` chunk.
//!
//! The script goes into the chunk data as-is (UTF-8), without the usual
//! `keyword\0text` split. What marks a `tEXt` chunk as one of ours is that its
//! text starts with [`SCRIPT_MARKER`], which every saved Veusz document does.

use std::io::{Read, Write};

pub use crate::SCRIPT_MARKER;
use crate::{Error, Result};

use super::*;

/// Where the script chunk goes in the chunk list: right after `IHDR`.
pub const DEFAULT_INSERT_INDEX: isize = 1;

/// Makes a `tEXt` chunk holding the script.
#[inline]
#[must_use]
pub fn script_chunk(script: &str) -> PngChunk {
  PngChunk::new(ChunkType::tEXt, script.as_bytes())
}

/// If this chunk is a `tEXt` chunk holding a script, gives the script.
///
/// Bytes that aren't valid UTF-8 are replaced rather than rejected.
#[must_use]
pub fn chunk_script(chunk: &PngChunk) -> Option<String> {
  if chunk.ty() != ChunkType::tEXt {
    return None;
  }
  let text = String::from_utf8_lossy(chunk.data());
  // compares characters, not bytes, so a replaced byte can't split the marker
  let marker_len = SCRIPT_MARKER.chars().count();
  if text.chars().take(marker_len).eq(SCRIPT_MARKER.chars()) {
    Some(text.into_owned())
  } else {
    None
  }
}

/// Finds the embedded script in a chunk list.
///
/// All chunks are checked, and if there's more than one script the *last* one
/// wins.
#[must_use]
pub fn find_script(chunks: &[PngChunk]) -> Option<String> {
  chunks.iter().filter_map(chunk_script).last()
}

/// Puts a new script chunk into the list at `index`.
///
/// Existing chunks are never removed or reordered, so an older script chunk
/// stays where it was. An index past the end of the list just appends.
///
/// ## Failure
/// * A negative index is a [`Error::Protocol`].
pub fn insert_script_chunk(chunks: &mut Vec<PngChunk>, script: &str, index: isize) -> Result<()> {
  let index = checked_index(index)?;
  let index = index.min(chunks.len());
  chunks.insert(index, script_chunk(script));
  Ok(())
}

/// Reads a PNG and gives the embedded script, if any.
///
/// Any failure to read the PNG counts as there being no script.
pub fn extract_png_script<R: Read>(source: R) -> Option<String> {
  match read_png_chunks(source, false) {
    Ok(chunks) => find_script(&chunks),
    Err(e) => {
      log::debug!("no script, couldn't read the png: {e}");
      None
    }
  }
}

/// Reads a PNG from `source` and writes it to `out` with a script chunk
/// inserted at `index`.
///
/// The index is checked before anything is read. The whole PNG must read
/// without error (checksums included, unless `lenient`) before anything is
/// written.
pub fn embed_png_script<R: Read, W: Write>(
  source: R, out: &mut W, script: &str, index: isize, lenient: bool,
) -> Result<()> {
  checked_index(index)?;
  let mut chunks = read_png_chunks(source, lenient)?;
  insert_script_chunk(&mut chunks, script, index)?;
  log::debug!("inserted {} byte script at chunk {index} of {}", script.len(), chunks.len());
  write_png(out, &chunks)
}

#[inline]
fn checked_index(index: isize) -> Result<usize> {
  usize::try_from(index)
    .map_err(|_| Error::protocol(format!("the index value {index} is less than 0")))
}
