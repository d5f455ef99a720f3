//! Storing a script inside of an SVG document.
//!
//! The script is the `script` attribute of a `veusz` element in the
//! [`VEUSZ_NAMESPACE`], which sits in a `<metadata>` element that's a direct
//! child of the root `<svg>` element:
//!
//! ```xml
//! <svg xmlns="http://www.w3.org/2000/svg" ...>
//!   ...
//!   <metadata><vsz:veusz xmlns:vsz="https://veusz.github.io/" script="# Veusz ..."/></metadata>
//! </svg>
//! ```
//!
//! Only the element *path* matters for finding it again. The `metadata`
//! element is matched by local name in any namespace, and the `veusz` element
//! by its namespace whatever prefix it uses.
//!
//! Documents are streamed through event by event, so everything other than
//! the script element comes back out byte-for-byte.

use std::borrow::Cow;

use quick_xml::{
  events::{attributes::Attribute, BytesEnd, BytesStart, Event},
  name::{Namespace, QName, ResolveResult},
  NsReader, Writer,
};

use crate::{Error, FormatError, Result};

/// The namespace of the element holding the script.
pub const VEUSZ_NAMESPACE: &str = "https://veusz.github.io/";

const METADATA: &[u8] = b"metadata";
const VEUSZ: &[u8] = b"veusz";
const SCRIPT: &[u8] = b"script";

/// Finds the embedded script in an SVG document.
///
/// If there's more than one candidate element the first one wins. Any kind of
/// parse failure counts as there being no script.
pub fn extract_svg_script(svg: &[u8]) -> Option<String> {
  match find_script(svg) {
    Ok(script) => script,
    Err(e) => {
      log::debug!("no script, couldn't read the svg: {e}");
      None
    }
  }
}

fn find_script(svg: &[u8]) -> Result<Option<String>> {
  let mut reader = NsReader::from_reader(svg);
  let mut depth = 0_usize;
  let mut in_metadata = false;
  loop {
    match reader.read_event()? {
      Event::Start(e) => {
        depth += 1;
        if depth == 2 && e.local_name().as_ref() == METADATA {
          in_metadata = true;
        } else if depth == 3 && in_metadata && is_veusz_element(&reader, &e) {
          return script_attribute(&e);
        }
      }
      Event::Empty(e) => {
        if depth == 2 && in_metadata && is_veusz_element(&reader, &e) {
          return script_attribute(&e);
        }
      }
      Event::End(_) => {
        if depth == 2 {
          in_metadata = false;
        }
        depth = depth.saturating_sub(1);
      }
      Event::Eof => return Ok(None),
      _ => (),
    }
  }
}

fn script_attribute(e: &BytesStart<'_>) -> Result<Option<String>> {
  for attr in e.attributes() {
    let attr = attr.map_err(quick_xml::Error::from)?;
    if attr.key.as_ref() == SCRIPT {
      return Ok(Some(attr.unescape_value()?.into_owned()));
    }
  }
  Ok(None)
}

fn is_veusz_element<R>(reader: &NsReader<R>, e: &BytesStart<'_>) -> bool {
  match reader.resolve_element(e.name()) {
    (ResolveResult::Bound(Namespace(ns)), local) => {
      ns == VEUSZ_NAMESPACE.as_bytes() && local.as_ref() == VEUSZ
    }
    _ => false,
  }
}

/// Writes a script into an SVG document, giving the new document.
///
/// If the document already has a script element its `script` attribute is
/// replaced. Otherwise a new `<metadata>` element holding one is added as the
/// last child of the root element.
///
/// ## Failure
/// * The script holds a character XML 1.0 can't carry at all (control
///   characters other than tab, newline and carriage return). This is a
///   [`Error::Protocol`] and is checked before the document is read.
/// * The document isn't well-formed XML.
/// * The document has no root element.
pub fn embed_svg_script(svg: &[u8], script: &str) -> Result<Vec<u8>> {
  if let Some(bad) = script.chars().find(|&c| !is_xml_char(c)) {
    return Err(Error::protocol(format!(
      "the script holds {bad:?}, which can't be stored in an svg"
    )));
  }
  let mut reader = NsReader::from_reader(svg);
  let mut writer = Writer::new(Vec::with_capacity(svg.len() + script.len() + 128));
  let mut depth = 0_usize;
  let mut seen_root = false;
  let mut in_metadata = false;
  let mut placed = false;
  loop {
    match reader.read_event()? {
      Event::Start(e) => {
        depth += 1;
        if depth == 1 {
          seen_root = true;
        }
        if depth == 2 && e.local_name().as_ref() == METADATA {
          in_metadata = true;
          writer.write_event(Event::Start(e))?;
        } else if depth == 3 && in_metadata && !placed && is_veusz_element(&reader, &e) {
          writer.write_event(Event::Start(with_script(&e, script)))?;
          placed = true;
        } else {
          writer.write_event(Event::Start(e))?;
        }
      }
      Event::Empty(e) => {
        if depth == 0 {
          // `<svg/>`, nothing inside of it to keep
          seen_root = true;
          writer.write_event(Event::Start(e.borrow()))?;
          write_metadata(&mut writer, script)?;
          writer.write_event(Event::End(e.to_end()))?;
          placed = true;
        } else if depth == 2 && in_metadata && !placed && is_veusz_element(&reader, &e) {
          writer.write_event(Event::Empty(with_script(&e, script)))?;
          placed = true;
        } else {
          writer.write_event(Event::Empty(e))?;
        }
      }
      Event::End(e) => {
        if depth == 2 {
          in_metadata = false;
        }
        if depth == 1 && !placed {
          write_metadata(&mut writer, script)?;
          placed = true;
        }
        depth = depth.saturating_sub(1);
        writer.write_event(Event::End(e))?;
      }
      Event::Eof => break,
      other => writer.write_event(other)?,
    }
  }
  if !seen_root {
    return Err(FormatError::Svg(String::from("no root element")).into());
  }
  if depth != 0 {
    return Err(FormatError::Svg(format!("{depth} unclosed element(s)")).into());
  }
  log::debug!("wrote {} byte script into svg", script.len());
  Ok(writer.into_inner())
}

/// The same element, but with its `script` attribute set to the new script.
fn with_script(e: &BytesStart<'_>, script: &str) -> BytesStart<'static> {
  let name = String::from_utf8_lossy(e.name().as_ref()).into_owned();
  let mut out = BytesStart::new(name);
  for attr in e.attributes().flatten() {
    if attr.key.as_ref() != SCRIPT {
      out.push_attribute(attr);
    }
  }
  out.push_attribute(script_attr(script));
  out
}

fn write_metadata(writer: &mut Writer<Vec<u8>>, script: &str) -> Result<()> {
  let mut veusz = BytesStart::new("vsz:veusz");
  veusz.push_attribute(("xmlns:vsz", VEUSZ_NAMESPACE));
  veusz.push_attribute(script_attr(script));
  writer.write_event(Event::Start(BytesStart::new("metadata")))?;
  writer.write_event(Event::Empty(veusz))?;
  writer.write_event(Event::End(BytesEnd::new("metadata")))?;
  Ok(())
}

/// The `Char` production of XML 1.0.
const fn is_xml_char(c: char) -> bool {
  matches!(
    c,
    '\t' | '\n' | '\r' | '\u{20}'..='\u{D7FF}' | '\u{E000}'..='\u{FFFD}' | '\u{10000}'..='\u{10FFFF}'
  )
}

/// Escapes the script for use as an attribute value.
///
/// Whitespace other than a plain space is written as a character reference,
/// otherwise XML attribute normalization would turn the script's newlines into
/// spaces when the file is read back.
fn script_attr(script: &str) -> Attribute<'static> {
  let escaped = quick_xml::escape::escape(script)
    .replace('\n', "&#10;")
    .replace('\r', "&#13;")
    .replace('\t', "&#9;");
  Attribute { key: QName(SCRIPT), value: Cow::Owned(escaped.into_bytes()) }
}

#[cfg(test)]
mod tests {
  use super::*;

  const PLAIN: &str = r##"<?xml version="1.0" encoding="UTF-8"?>
<svg xmlns="http://www.w3.org/2000/svg" width="10" height="10">
  <metadata><rdf:RDF xmlns:rdf="http://www.w3.org/1999/02/22-rdf-syntax-ns#"/></metadata>
  <path d="M0 0L10 10" stroke="#000"/>
</svg>
"##;

  #[test]
  fn test_embed_then_extract() {
    let script = "# Veusz saved document\nSet('width', \"15cm\")\n\tTo('..') & <done>";
    let out = embed_svg_script(PLAIN.as_bytes(), script).unwrap();
    assert_eq!(extract_svg_script(&out).as_deref(), Some(script));
    let text = String::from_utf8(out).unwrap();
    // untouched content comes back exactly
    assert!(text.starts_with(r#"<?xml version="1.0" encoding="UTF-8"?>"#));
    assert!(text.contains(r##"<path d="M0 0L10 10" stroke="#000"/>"##));
    assert!(text.contains("&#10;"));
    assert!(text.trim_end().ends_with("</metadata></svg>"));
  }

  #[test]
  fn test_no_script() {
    assert_eq!(extract_svg_script(PLAIN.as_bytes()), None);
    assert_eq!(extract_svg_script(b"<svg"), None);
    assert_eq!(extract_svg_script(b""), None);
  }

  #[test]
  fn test_re_embed_replaces() {
    let once = embed_svg_script(PLAIN.as_bytes(), "# Veusz one").unwrap();
    let twice = embed_svg_script(&once, "# Veusz two").unwrap();
    assert_eq!(extract_svg_script(&twice).as_deref(), Some("# Veusz two"));
    let text = String::from_utf8(twice).unwrap();
    assert_eq!(text.matches("veusz.github.io").count(), 1);
  }

  #[test]
  fn test_self_closing_root() {
    let out = embed_svg_script(b"<svg xmlns=\"http://www.w3.org/2000/svg\"/>", "# Veusz").unwrap();
    assert_eq!(extract_svg_script(&out).as_deref(), Some("# Veusz"));
  }

  #[test]
  fn test_other_prefix_is_found() {
    let svg = br##"<svg xmlns:v="https://veusz.github.io/"><metadata><v:veusz script="# Veusz x"/></metadata></svg>"##;
    assert_eq!(extract_svg_script(svg).as_deref(), Some("# Veusz x"));
    // the same element nested any deeper doesn't count
    let svg = br##"<svg xmlns:v="https://veusz.github.io/"><g><metadata><v:veusz script="# Veusz x"/></metadata></g></svg>"##;
    assert_eq!(extract_svg_script(svg), None);
  }

  #[test]
  fn test_control_characters_rejected() {
    for script in ["# Veusz\x0C", "# Veusz\0", "# Veusz \u{1B}[0m", "# Veusz\u{FFFF}"] {
      assert!(
        matches!(embed_svg_script(PLAIN.as_bytes(), script), Err(Error::Protocol(_))),
        "{script:?}"
      );
    }
    // the whitespace ones are fine, they become character references
    let script = "# Veusz\tA\r\nB";
    let out = embed_svg_script(PLAIN.as_bytes(), script).unwrap();
    assert_eq!(extract_svg_script(&out).as_deref(), Some(script));
  }

  #[test]
  fn test_embed_needs_root() {
    assert!(matches!(
      embed_svg_script(b"<?xml version=\"1.0\"?>", "# Veusz"),
      Err(Error::Format(FormatError::Svg(_)))
    ));
  }
}
