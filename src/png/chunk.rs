use core::fmt::Write;

use crate::AsciiArray;

use super::*;

/// The four byte tag of a chunk.
///
/// Each byte of a well-formed tag is an ascii letter, and the case of each
/// letter is a property bit (see the `is_` methods).
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[repr(transparent)]
pub struct ChunkType(pub [u8; 4]);
#[allow(nonstandard_style)]
impl ChunkType {
  /// Image header, always the first chunk.
  pub const IHDR: Self = Self(*b"IHDR");
  /// Compressed image data.
  pub const IDAT: Self = Self(*b"IDAT");
  /// Image end, always the last chunk.
  pub const IEND: Self = Self(*b"IEND");
  /// Uncompressed text.
  pub const tEXt: Self = Self(*b"tEXt");

  /// If every byte is within `A-Z` or `a-z`.
  #[inline]
  #[must_use]
  pub const fn is_valid(self) -> bool {
    let mut i = 0;
    while i < 4 {
      if !self.0[i].is_ascii_alphabetic() {
        return false;
      }
      i += 1;
    }
    true
  }

  /// Ancillary chunks can be skipped by a decoder that doesn't know them.
  #[inline]
  #[must_use]
  pub const fn is_ancillary(self) -> bool {
    (self.0[0] & 32) != 0
  }
  /// Private chunks aren't registered with the PNG spec.
  #[inline]
  #[must_use]
  pub const fn is_private(self) -> bool {
    (self.0[1] & 32) != 0
  }
  /// Reserved for future expansion, must be unset in current files.
  #[inline]
  #[must_use]
  pub const fn is_reserved_bit_set(self) -> bool {
    (self.0[2] & 32) != 0
  }
  /// Editors that don't understand the chunk may still copy it.
  #[inline]
  #[must_use]
  pub const fn is_safe_to_copy(self) -> bool {
    (self.0[3] & 32) != 0
  }
}
impl core::fmt::Debug for ChunkType {
  fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
    f.write_char('\"')?;
    core::fmt::Display::fmt(self, f)?;
    f.write_char('\"')
  }
}
impl core::fmt::Display for ChunkType {
  fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
    let [a, b, c, d] = self.0;
    write!(f, "{}{}{}{}", a as char, b as char, c as char, d as char)
  }
}
impl From<[u8; 4]> for ChunkType {
  #[inline]
  fn from(bytes: [u8; 4]) -> Self {
    Self(bytes)
  }
}
impl From<ChunkType> for AsciiArray<4> {
  #[inline]
  fn from(ty: ChunkType) -> Self {
    AsciiArray(ty.0)
  }
}

/// A chunk from a PNG, holding its own copy of the data.
///
/// The length and checksum aren't stored: the length is just the data's
/// length, and the checksum has already been checked (or will be computed
/// fresh) by the time you have one of these.
#[derive(Clone, PartialEq, Eq, Hash)]
pub struct PngChunk {
  ty: ChunkType,
  data: Vec<u8>,
}
impl PngChunk {
  /// Makes a chunk out of a type and some data.
  #[inline]
  #[must_use]
  pub fn new(ty: ChunkType, data: impl Into<Vec<u8>>) -> Self {
    Self { ty, data: data.into() }
  }
  #[inline]
  #[must_use]
  pub const fn ty(&self) -> ChunkType {
    self.ty
  }
  #[inline]
  #[must_use]
  pub fn data(&self) -> &[u8] {
    &self.data
  }
  /// Breaks the chunk into its type and data.
  #[inline]
  #[must_use]
  pub fn into_parts(self) -> (ChunkType, Vec<u8>) {
    (self.ty, self.data)
  }
  /// The checksum this chunk should have when written out.
  #[inline]
  #[must_use]
  pub fn compute_crc(&self) -> u32 {
    png_crc(&[&self.ty.0[..], &self.data[..]])
  }
}
impl core::fmt::Debug for PngChunk {
  #[inline]
  fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
    f.debug_struct("PngChunk")
      .field("ty", &self.ty)
      .field("data", &(&self.data[..self.data.len().min(12)], self.data.len()))
      .finish()
  }
}
impl From<(ChunkType, Vec<u8>)> for PngChunk {
  #[inline]
  fn from((ty, data): (ChunkType, Vec<u8>)) -> Self {
    Self { ty, data }
  }
}

#[test]
fn test_chunk_type_properties() {
  assert!(ChunkType::IHDR.is_valid());
  assert!(!ChunkType::IHDR.is_ancillary());
  assert!(ChunkType::tEXt.is_ancillary());
  assert!(!ChunkType::tEXt.is_private());
  assert!(!ChunkType::tEXt.is_reserved_bit_set());
  assert!(ChunkType::tEXt.is_safe_to_copy());
  assert!(!ChunkType(*b"IE D").is_valid());
  assert!(!ChunkType([b'I', b'E', b'N', 0xC4]).is_valid());
  assert_eq!(format!("{}", ChunkType::IEND), "IEND");
  assert_eq!(format!("{:?}", ChunkType::IEND), "\"IEND\"");
}
