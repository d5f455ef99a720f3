use std::io::Write;

use crate::{Error, Result};

use super::*;

/// Writes a single chunk: length, type, data, and a freshly computed CRC.
///
/// The type isn't checked for being valid. The only failure other than I/O is
/// data too long for the length field to describe at all.
pub fn write_png_chunk<W: Write>(out: &mut W, ty: ChunkType, data: &[u8]) -> Result<()> {
  let length: u32 = data
    .len()
    .try_into()
    .map_err(|_| Error::protocol(format!("{ty} chunk data is {} bytes", data.len())))?;
  out.write_all(&length.to_be_bytes())?;
  out.write_all(&ty.0)?;
  out.write_all(data)?;
  out.write_all(&png_crc(&[&ty.0[..], data]).to_be_bytes())?;
  Ok(())
}

/// Writes the PNG signature and then every chunk in order.
///
/// The caller is responsible for the chunks forming a sensible PNG (`IHDR`
/// first, `IEND` last, and so on). Nothing is checked here.
pub fn write_png<'c, W, I>(out: &mut W, chunks: I) -> Result<()>
where
  W: Write,
  I: IntoIterator<Item = &'c PngChunk>,
{
  out.write_all(&PNG_SIGNATURE)?;
  for chunk in chunks {
    write_png_chunk(out, chunk.ty(), chunk.data())?;
  }
  Ok(())
}

/// Encodes chunks into a new byte vec, see [`write_png`].
pub fn png_to_vec(chunks: &[PngChunk]) -> Result<Vec<u8>> {
  let total: usize = chunks.iter().map(|c| c.data().len() + 12).sum();
  let mut out = Vec::with_capacity(PNG_SIGNATURE.len() + total);
  write_png(&mut out, chunks)?;
  Ok(out)
}
