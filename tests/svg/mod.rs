use std::fs;

use vszimg::{svg::VEUSZ_NAMESPACE, Error};

const SCRIPT: &str = "# Veusz saved document (version 3.6.2)\nSet('width', '8.5cm')\nAdd('page', name=\"page1\")\n";

#[test]
fn test_embed_extract_file() {
  let (_dir, path) = super::scratch_copy("plot.svg");
  let before = fs::read_to_string(&path).unwrap();
  assert_eq!(vszimg::extract(&path).unwrap(), None);

  vszimg::embed(&path, SCRIPT).unwrap();
  assert_eq!(vszimg::extract(&path).unwrap().as_deref(), Some(SCRIPT));

  let after = fs::read_to_string(&path).unwrap();
  assert!(after.contains(VEUSZ_NAMESPACE));
  // everything before the new metadata is as it was
  let end = before.rfind("</svg>").unwrap();
  assert!(after.starts_with(&before[..end]));
}

#[test]
fn test_embed_twice_replaces() {
  let (_dir, path) = super::scratch_copy("plot.svg");
  vszimg::embed(&path, "# Veusz first").unwrap();
  vszimg::embed(&path, SCRIPT).unwrap();
  assert_eq!(vszimg::extract(&path).unwrap().as_deref(), Some(SCRIPT));
  assert_eq!(fs::read_to_string(&path).unwrap().matches("<metadata>").count(), 1);
}

#[test]
fn test_broken_svg() {
  let dir = tempfile::tempdir().unwrap();
  let path = dir.path().join("broken.svg");
  fs::write(&path, "<svg><g></svg>").unwrap();
  assert_eq!(vszimg::extract(&path).unwrap(), None);
  assert!(matches!(vszimg::embed(&path, SCRIPT), Err(Error::Xml(_))));
  assert_eq!(fs::read_to_string(&path).unwrap(), "<svg><g></svg>");
}

#[test]
fn test_unknown_extension() {
  let dir = tempfile::tempdir().unwrap();
  let path = dir.path().join("plot.jpg");
  fs::write(&path, b"whatever").unwrap();
  assert!(matches!(vszimg::embed(&path, SCRIPT), Err(Error::Protocol(_))));
  assert!(matches!(vszimg::extract(&path), Err(Error::Protocol(_))));
}
