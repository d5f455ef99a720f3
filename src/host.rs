#![forbid(unsafe_code)]

//! Saving a document as an image with its script inside, and loading it back.
//!
//! The plotting application is reached through the [`Host`] trait, so this
//! module never needs to know how documents are drawn or stored. Loading a
//! document replays parsed [`Command`]s through the host one at a time; the
//! stored script text is never run as code.

use std::{
  fs,
  path::{Path, PathBuf},
};

use crate::{
  image::{self, EmbedOptions, ImageFormat},
  script::{parse_script, Command},
  Error, Result,
};

/// What the plotting application has to be able to do.
///
/// Errors from the application itself should be [`Error::Host`].
pub trait Host {
  /// Saves the current document as a script file at `path`.
  fn save(&mut self, path: &Path) -> Result<()>;

  /// Exports one page (0-based) of the current document as an image at
  /// `path`, in the format its extension names.
  fn export(&mut self, path: &Path, page: usize) -> Result<()>;

  /// Names of the widgets directly below the document root.
  fn list_child_widgets(&self) -> Vec<String>;

  fn remove_widget(&mut self, name: &str) -> Result<()>;

  /// Performs one command of a saved document.
  fn run_command(&mut self, command: &Command) -> Result<()>;
}

/// Gets the current document's script text from the host.
///
/// The host saves into a private scratch directory, which is removed again
/// whether or not that worked.
pub fn document_script<H: Host + ?Sized>(host: &mut H) -> Result<String> {
  let dir = tempfile::tempdir()?;
  let path = dir.path().join("document.vsz");
  host.save(&path)?;
  let script = fs::read_to_string(&path)?;
  log::debug!("host saved a {} byte document", script.len());
  Ok(script)
}

/// Settings for [`save_image`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SaveOptions {
  /// The page to export, counting from 1.
  pub page: usize,
  /// The image format, or `None` to go by the path's extension.
  pub format: Option<ImageFormat>,
  pub embed: EmbedOptions,
}
impl Default for SaveOptions {
  #[inline]
  fn default() -> Self {
    Self { page: 1, format: None, embed: EmbedOptions::default() }
  }
}

/// Exports a page of the host's document to `path` with the document's
/// script embedded in the image.
///
/// When a format is given the path gets that extension added if it doesn't
/// already have it. The returned path is the file actually written.
///
/// ## Failure
/// * Page 0, a negative index, or no format and an unknown extension, all
///   before the host is asked for anything.
/// * The host can't save or export. Nothing is embedded in that case.
/// * Embedding fails. The exported image is left without a script.
pub fn save_image<H: Host + ?Sized>(
  host: &mut H, path: impl AsRef<Path>, options: &SaveOptions,
) -> Result<PathBuf> {
  let path = path.as_ref();
  if options.page == 0 {
    return Err(Error::protocol("pages are numbered from 1"));
  }
  if options.embed.index < 0 {
    return Err(Error::protocol(format!(
      "the index value {} is less than 0",
      options.embed.index
    )));
  }
  let path = match options.format {
    Some(format) => format.with_extension(path),
    None => {
      ImageFormat::from_path(path)?;
      path.to_path_buf()
    }
  };
  let script = document_script(host)?;
  if !script.starts_with(crate::SCRIPT_MARKER) {
    log::warn!("saved document doesn't start with {:?}", crate::SCRIPT_MARKER);
  }
  host.export(&path, options.page - 1)?;
  image::embed_with(&path, &script, &options.embed)?;
  Ok(path)
}

/// Replaces the host's document with the one embedded in the image at `path`.
///
/// Gives `false`, without touching the document, when the image holds no
/// script. Otherwise every widget under the root is removed and the stored
/// commands are replayed in order.
///
/// ## Failure
/// * The path's extension isn't a known format, or the file can't be read.
/// * The script doesn't parse. This is checked before anything is removed.
/// * The host fails a removal or a command. Replay stops there, leaving the
///   document partly loaded.
pub fn load_image<H: Host + ?Sized>(host: &mut H, path: impl AsRef<Path>) -> Result<bool> {
  let path = path.as_ref();
  let script = match image::extract(path)? {
    Some(script) if !script.trim().is_empty() => script,
    _ => {
      log::info!("no document found in {}", path.display());
      return Ok(false);
    }
  };
  let commands = parse_script(&script)?;
  for name in host.list_child_widgets() {
    host.remove_widget(&name)?;
  }
  for command in &commands {
    host.run_command(command)?;
  }
  log::info!("loaded {} commands from {}", commands.len(), path.display());
  Ok(true)
}
