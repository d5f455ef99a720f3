use std::fs;

use vszimg::{
  png::{read_png_chunks, ChunkType, PngChunkReader},
  ChunkError, EmbedOptions, Error, FormatError,
};
use walkdir::WalkDir;

const SCRIPT: &str = "# Veusz saved document (version 3.6.2)\nAdd('page', name='page1')\n";

#[test]
fn test_PngChunkReader_no_panics() {
  // iter ALL files in the test folder, even non-png files shouldn't panic it.
  for entry in WalkDir::new("tests/").into_iter().filter_map(|e| e.ok()) {
    println!("{}", entry.path().display());
    let v = match fs::read(entry.path()) {
      Ok(v) => v,
      Err(e) => {
        println!("Error reading file: {e:?}");
        continue;
      }
    };
    for _ in PngChunkReader::new(v.as_slice()) {
      //
    }
    let _ = vszimg::png::text::extract_png_script(v.as_slice());
  }
  // even totally random data should never panic the reader!
  for _ in 0..10 {
    let mut v = vszimg::png::PNG_SIGNATURE.to_vec();
    v.extend(super::rand_bytes(1024));
    for _ in PngChunkReader::new(v.as_slice()).lenient(true) {
      //
    }
  }
}

#[test]
fn test_embed_extract_file() {
  let (_dir, path) = super::scratch_copy("tiny.png");
  let before = read_png_chunks(fs::read(&path).unwrap().as_slice(), false).unwrap();
  assert_eq!(vszimg::extract(&path).unwrap(), None);

  vszimg::embed(&path, SCRIPT).unwrap();
  assert_eq!(vszimg::extract(&path).unwrap().as_deref(), Some(SCRIPT));

  let after = read_png_chunks(fs::read(&path).unwrap().as_slice(), false).unwrap();
  let tys: Vec<_> = after.iter().map(|c| c.ty()).collect();
  assert_eq!(
    tys,
    [ChunkType::IHDR, ChunkType::tEXt, ChunkType(*b"gAMA"), ChunkType::IDAT, ChunkType::IEND]
  );
  // every other chunk is carried over exactly
  let mut rest = after.clone();
  rest.remove(1);
  assert_eq!(rest, before);
}

#[test]
fn test_embed_at_index() {
  let (_dir, path) = super::scratch_copy("tiny.png");
  vszimg::embed_with(&path, SCRIPT, &EmbedOptions { index: 3, ..Default::default() }).unwrap();
  let chunks = read_png_chunks(fs::read(&path).unwrap().as_slice(), false).unwrap();
  assert_eq!(chunks[3].ty(), ChunkType::tEXt);
  assert_eq!(vszimg::extract(&path).unwrap().as_deref(), Some(SCRIPT));
}

#[test]
fn test_second_embed_keeps_older_script_visible() {
  let (_dir, path) = super::scratch_copy("tiny.png");
  vszimg::embed(&path, "# Veusz first").unwrap();
  vszimg::embed(&path, "# Veusz second").unwrap();
  // both at index 1, so the older one ends up later in the file
  assert_eq!(vszimg::extract(&path).unwrap().as_deref(), Some("# Veusz first"));
  let chunks = read_png_chunks(fs::read(&path).unwrap().as_slice(), false).unwrap();
  assert_eq!(chunks.iter().filter(|c| c.ty() == ChunkType::tEXt).count(), 2);

  // going in after the old chunks lets the new one win
  vszimg::embed_with(&path, "# Veusz third", &EmbedOptions { index: 3, ..Default::default() })
    .unwrap();
  assert_eq!(vszimg::extract(&path).unwrap().as_deref(), Some("# Veusz third"));
}

#[test]
fn test_failed_embed_leaves_file() {
  let (_dir, path) = super::scratch_copy("tiny.png");
  let original = fs::read(&path).unwrap();

  let err = vszimg::embed_with(&path, SCRIPT, &EmbedOptions { index: -1, ..Default::default() })
    .unwrap_err();
  assert!(matches!(err, Error::Protocol(_)), "{err:?}");
  assert_eq!(fs::read(&path).unwrap(), original);

  // corrupt the IDAT checksum
  let mut bad = original.clone();
  let last = bad.len() - 13;
  bad[last] ^= 0xFF;
  fs::write(&path, &bad).unwrap();
  let err = vszimg::embed(&path, SCRIPT).unwrap_err();
  assert!(err.checksum_mismatch().is_some(), "{err:?}");
  assert_eq!(fs::read(&path).unwrap(), bad);
  assert_eq!(vszimg::extract(&path).unwrap(), None);

  // unless asked to let it slide, in which case the checksum gets fixed
  vszimg::embed_with(&path, SCRIPT, &EmbedOptions { lenient: true, ..Default::default() }).unwrap();
  assert_eq!(vszimg::extract(&path).unwrap().as_deref(), Some(SCRIPT));
}

#[test]
fn test_truncated_file() {
  let (_dir, path) = super::scratch_copy("tiny.png");
  let bytes = fs::read(&path).unwrap();
  fs::write(&path, &bytes[..bytes.len() - 12]).unwrap();
  let err = vszimg::embed(&path, SCRIPT).unwrap_err();
  assert!(matches!(err, Error::Format(FormatError::Chunk(ChunkError::MissingEnd))), "{err:?}");
}

#[test]
fn test_missing_file() {
  let dir = tempfile::tempdir().unwrap();
  let path = dir.path().join("nope.png");
  assert!(matches!(vszimg::extract(&path), Err(Error::Io(_))));
  assert!(matches!(vszimg::embed(&path, SCRIPT), Err(Error::Io(_))));
}
