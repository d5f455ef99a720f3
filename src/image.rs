#![forbid(unsafe_code)]

//! Embedding and extracting scripts in image files, whatever their format.

use std::{
  ffi::OsStr,
  fs,
  io::Write,
  path::{Path, PathBuf},
};

use crate::{Error, Result};

/// The image formats that can carry a script.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum ImageFormat {
  /// Script stored in a `tEXt` chunk.
  Png,
  /// Script stored in a `<metadata>` element.
  Svg,
}
impl ImageFormat {
  /// Picks the format from the file extension (ignoring case).
  ///
  /// ## Failure
  /// * Any extension other than `png` or `svg` is a [`Error::Protocol`].
  pub fn from_path(path: &Path) -> Result<Self> {
    match path.extension().and_then(OsStr::to_str) {
      Some(ext) if ext.eq_ignore_ascii_case("png") => Ok(Self::Png),
      Some(ext) if ext.eq_ignore_ascii_case("svg") => Ok(Self::Svg),
      _ => Err(Error::protocol(format!(
        "the image file format must be .png or .svg: {}",
        path.display()
      ))),
    }
  }

  /// The usual (lowercase) file extension.
  #[inline]
  #[must_use]
  pub const fn extension(self) -> &'static str {
    match self {
      Self::Png => "png",
      Self::Svg => "svg",
    }
  }

  /// Adds this format's extension to the path, unless it already has it.
  ///
  /// This appends rather than replaces, so `plot.v2` becomes `plot.v2.png`.
  #[must_use]
  pub fn with_extension(self, path: &Path) -> PathBuf {
    match path.extension().and_then(OsStr::to_str) {
      Some(ext) if ext.eq_ignore_ascii_case(self.extension()) => path.to_path_buf(),
      _ => {
        let mut name = path.as_os_str().to_os_string();
        name.push(".");
        name.push(self.extension());
        PathBuf::from(name)
      }
    }
  }

  /// Rewrites image bytes to carry the script.
  pub fn embed_bytes(self, image: &[u8], script: &str, options: &EmbedOptions) -> Result<Vec<u8>> {
    options.validate()?;
    match self {
      #[cfg(feature = "png")]
      Self::Png => {
        let mut out = Vec::with_capacity(image.len() + script.len() + 12);
        crate::png::text::embed_png_script(image, &mut out, script, options.index, options.lenient)?;
        Ok(out)
      }
      #[cfg(feature = "svg")]
      Self::Svg => crate::svg::embed_svg_script(image, script),
      #[allow(unreachable_patterns)]
      other => Err(unsupported(other)),
    }
  }

  /// Gets the script out of image bytes, if there is one.
  #[must_use]
  pub fn extract_bytes(self, image: &[u8]) -> Option<String> {
    match self {
      #[cfg(feature = "png")]
      Self::Png => crate::png::text::extract_png_script(image),
      #[cfg(feature = "svg")]
      Self::Svg => crate::svg::extract_svg_script(image),
      #[allow(unreachable_patterns)]
      other => {
        log::debug!("{}", unsupported(other));
        None
      }
    }
  }
}

#[allow(dead_code)]
fn unsupported(format: ImageFormat) -> Error {
  Error::protocol(format!("built without {} support", format.extension()))
}

/// Settings for embedding.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct EmbedOptions {
  /// Position of the new chunk in a PNG's chunk list. Ignored for SVG, but
  /// still must not be negative.
  pub index: isize,
  /// Accept PNG chunks with a bad checksum (with a logged warning). They're
  /// written back out with a corrected checksum.
  pub lenient: bool,
}
impl Default for EmbedOptions {
  #[inline]
  fn default() -> Self {
    Self { index: 1, lenient: false }
  }
}
impl EmbedOptions {
  fn validate(&self) -> Result<()> {
    if self.index < 0 {
      Err(Error::protocol(format!("the index value {} is less than 0", self.index)))
    } else {
      Ok(())
    }
  }
}

/// Embeds the script into the image file at `path`, using the default options.
///
/// See [`embed_with`] for what happens when a PNG already holds a script.
#[inline]
pub fn embed(path: impl AsRef<Path>, script: &str) -> Result<()> {
  embed_with(path, script, &EmbedOptions::default())
}

/// Embeds the script into the image file at `path`.
///
/// The format comes from the file extension. The new file is written beside
/// the old one and then renamed over it, so if this fails the original file is
/// left as it was.
///
/// ## Embedding twice
/// An SVG's existing script is replaced. A PNG's existing script chunk is
/// *kept*: the new chunk goes in at `options.index` (1 by default), ahead of
/// the old one, and [`extract`] gives the last script in the file. So after a
/// second embed at the default index, [`extract`] still gives the *first*
/// script. Embed into a freshly exported PNG, or use an index past the old
/// chunk, to have the new script win.
///
/// ## Failure
/// * Bad options or an unknown extension, before the file is touched.
/// * The file can't be read, or isn't a well-formed image.
/// * The new file can't be written or moved into place.
pub fn embed_with(path: impl AsRef<Path>, script: &str, options: &EmbedOptions) -> Result<()> {
  let path = path.as_ref();
  options.validate()?;
  let format = ImageFormat::from_path(path)?;
  let image = fs::read(path)?;
  let out = format.embed_bytes(&image, script, options)?;
  replace_file(path, &out)?;
  log::info!("embedded {} byte script into {}", script.len(), path.display());
  Ok(())
}

/// Gets the script out of the image file at `path`.
///
/// A file that isn't a well-formed image just doesn't have a script.
///
/// ## Failure
/// * An unknown extension.
/// * The file can't be read.
pub fn extract(path: impl AsRef<Path>) -> Result<Option<String>> {
  let path = path.as_ref();
  let format = ImageFormat::from_path(path)?;
  let image = fs::read(path)?;
  Ok(format.extract_bytes(&image))
}

/// Atomically replaces the contents of `path`, keeping its permissions.
fn replace_file(path: &Path, bytes: &[u8]) -> Result<()> {
  let dir = match path.parent() {
    Some(dir) if !dir.as_os_str().is_empty() => dir,
    _ => Path::new("."),
  };
  let permissions = fs::metadata(path)?.permissions();
  let mut staged = tempfile::NamedTempFile::new_in(dir)?;
  staged.write_all(bytes)?;
  staged.as_file().sync_all()?;
  staged.as_file().set_permissions(permissions)?;
  staged.persist(path).map_err(|e| e.error)?;
  Ok(())
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn test_format_from_path() {
    assert_eq!(ImageFormat::from_path(Path::new("a/b.png")).unwrap(), ImageFormat::Png);
    assert_eq!(ImageFormat::from_path(Path::new("B.SVG")).unwrap(), ImageFormat::Svg);
    assert!(matches!(ImageFormat::from_path(Path::new("plot.vsz")), Err(Error::Protocol(_))));
    assert!(matches!(ImageFormat::from_path(Path::new("png")), Err(Error::Protocol(_))));
  }

  #[test]
  fn test_with_extension() {
    let png = ImageFormat::Png;
    assert_eq!(png.with_extension(Path::new("plot.png")), Path::new("plot.png"));
    assert_eq!(png.with_extension(Path::new("plot.PNG")), Path::new("plot.PNG"));
    assert_eq!(png.with_extension(Path::new("plot")), Path::new("plot.png"));
    assert_eq!(png.with_extension(Path::new("plot.svg")), Path::new("plot.svg.png"));
    assert_eq!(ImageFormat::Svg.with_extension(Path::new("dir/plot")), Path::new("dir/plot.svg"));
  }

  #[test]
  fn test_negative_index_before_io() {
    let options = EmbedOptions { index: -1, ..Default::default() };
    // the file doesn't exist, so reaching I/O would be an Io error instead
    let err = embed_with("does/not/exist.png", "# Veusz", &options).unwrap_err();
    assert!(matches!(err, Error::Protocol(_)), "{err:?}");
  }
}
