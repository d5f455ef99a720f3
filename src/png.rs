#![forbid(unsafe_code)]

//! Module for working with PNG chunk framing.
//!
//! * [Portable Network Graphics Specification (Second Edition)][png-spec]
//!
//! [png-spec]: https://www.w3.org/TR/2003/REC-PNG-20031110/
//!
//! A PNG datastream is an 8 byte signature followed by a series of "chunks".
//! Each chunk is laid out as:
//!
//! ```text
//! length: u32 (big-endian) | type: [u8; 4] | data: [u8; length] | crc: u32 (big-endian)
//! ```
//!
//! The CRC covers the type and data bytes (not the length). The last chunk is
//! always `IEND`.
//!
//! This module never looks inside of the chunks beyond what it needs to carry
//! a script around: pixel data, palettes, interlacing and so on are all passed
//! through untouched.
//!
//! ## Reading
//!
//! A [`PngChunkReader`] wraps any [`Read`](std::io::Read) and produces each
//! chunk in turn. Unlike the usual PNG decoder attitude of "ignore whatever we
//! can", the reader here is strict: since we're about to rewrite the file we
//! want to know it's sound first. Only checksum failures can be relaxed, by
//! asking for a *lenient* reader.
//!
//! ```no_run
//! use vszimg::png::*;
//! # fn f() -> vszimg::Result<()> {
//! let file = std::fs::File::open("plot.png")?;
//! for chunk in PngChunkReader::new(std::io::BufReader::new(file)) {
//!   let chunk = chunk?;
//!   println!("{}: {} bytes", chunk.ty(), chunk.data().len());
//! }
//! # Ok(())
//! # }
//! ```
//!
//! ## Writing
//!
//! [`write_png`] takes the chunks and writes them back out with the signature,
//! lengths, and fresh checksums. It doesn't check that what you give it makes
//! sense as a PNG.
//!
//! ## Scripts
//!
//! The [`text`] functions handle putting a script into a `tEXt` chunk and
//! finding it again later.

mod chunk;
pub use chunk::*;

mod crc32;
pub use crc32::*;

mod reader;
pub use reader::*;

mod writer;
pub use writer::*;

pub mod text;

/// The first eight bytes of a PNG datastream should match these bytes.
pub const PNG_SIGNATURE: [u8; 8] = [137, 80, 78, 71, 13, 10, 26, 10];

/// The largest chunk length a PNG may declare.
pub const MAX_CHUNK_LENGTH: u32 = (1 << 31) - 1;

/// Checks if the PNG's initial 8 bytes are correct.
#[inline]
#[must_use]
pub fn is_png_header_correct(png: &[u8]) -> bool {
  png.len() >= 8 && png[..8] == PNG_SIGNATURE
}
