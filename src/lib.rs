#![cfg_attr(docs_rs, feature(doc_cfg))]
#![forbid(unsafe_code)]

//! A crate for keeping a re-editable Veusz document inside of the images
//! that were exported from it.
//!
//! * PNG files carry the document's script in a `tEXt` chunk, see [`png`].
//! * SVG files carry it as an attribute in `<metadata>`, see [`svg`].
//!
//! Most of the time the file level functions are all you need:
//!
//! ```no_run
//! # fn f() -> vszimg::Result<()> {
//! vszimg::embed("plot.png", "# Veusz saved document\nTo('page1')\n")?;
//! let script = vszimg::extract("plot.png")?;
//! # Ok(())
//! # }
//! ```
//!
//! To go straight from a running application to an image and back, implement
//! [`Host`] for it and use [`save_image`] and [`load_image`]. Loading replays
//! the stored document as a list of [`Command`]s, so nothing in an image file
//! is ever run as code.

#[cfg(target_pointer_width = "16")]
compile_error!("this crate assumes 32-bit or bigger pointers!");

/// Text that every embedded script starts with.
pub const SCRIPT_MARKER: &str = "# Veusz";

pub mod ascii_array;
pub use ascii_array::*;

mod error;
pub use error::*;

#[cfg(feature = "png")]
pub mod png;

#[cfg(feature = "svg")]
pub mod svg;

pub mod image;
pub use image::{embed, embed_with, extract, EmbedOptions, ImageFormat};

pub mod script;
pub use script::{parse_script, Command, Value};

pub mod host;
pub use host::{document_script, load_image, save_image, Host, SaveOptions};
