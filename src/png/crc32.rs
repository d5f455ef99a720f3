const CRC_TABLE: [u32; 256] = make_crc_table();

const fn make_crc_table() -> [u32; 256] {
  let mut out = [0; 256];
  let mut n = 0;
  while n < 256 {
    let mut c = n as u32;
    let mut k = 0;
    while k < 8 {
      if (c & 1) != 0 {
        c = 0xEDB8_8320_u32 ^ (c >> 1);
      } else {
        c >>= 1;
      }
      //
      k += 1;
    }
    out[n] = c;
    //
    n += 1;
  }
  out
}

/// Feeds more bytes into a running (non-finalized) CRC value.
#[inline]
#[must_use]
pub fn update_crc(mut crc: u32, bytes: &[u8]) -> u32 {
  for &byte in bytes {
    let i = (crc ^ u32::from(byte)) as u8 as usize;
    crc = CRC_TABLE[i] ^ (crc >> 8);
  }
  crc
}

/// The CRC-32 that PNG uses, computed over several byte slices in order.
///
/// For a chunk you'd pass the type bytes and then the data bytes.
#[inline]
#[must_use]
pub fn png_crc(parts: &[&[u8]]) -> u32 {
  parts.iter().fold(u32::MAX, |crc, part| update_crc(crc, part)) ^ u32::MAX
}

#[test]
fn test_png_crc() {
  // check value for the standard CRC-32
  assert_eq!(png_crc(&[&b"123456789"[..]]), 0xCBF4_3926);
  // an empty IEND chunk always has this crc
  assert_eq!(png_crc(&[&b"IEND"[..], &[]]), 0xAE42_6082);
  // splitting the input doesn't change anything
  assert_eq!(png_crc(&[&b"IEN"[..], &b"D"[..]]), png_crc(&[&b"IEND"[..]]));
}
