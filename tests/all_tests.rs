#![allow(bad_style)]

use std::path::{Path, PathBuf};

mod host;
mod png;
mod svg;

fn rand_bytes(count: usize) -> Vec<u8> {
  let mut buffer = vec![0; count];
  getrandom::getrandom(&mut buffer).unwrap();
  buffer
}

/// Copies a file from `tests/fixtures/` into a fresh scratch directory.
fn scratch_copy(name: &str) -> (tempfile::TempDir, PathBuf) {
  let dir = tempfile::tempdir().unwrap();
  let path = dir.path().join(name);
  std::fs::copy(Path::new("tests/fixtures").join(name), &path).unwrap();
  (dir, path)
}
