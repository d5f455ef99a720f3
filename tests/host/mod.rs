use std::{
  fs,
  path::{Path, PathBuf},
};

use vszimg::{
  document_script, load_image, save_image, Command, Error, Host, ImageFormat, Result, SaveOptions,
  Value,
};

const DOC: &str = r#"# Veusz saved document (version 3.6.2)
SetCompatLevel(1)
Set('width', '15cm')
Add('page', name='page1', autoadd=False)
To('page1')
Add('graph', name='graph1', autoadd=False)
To('..')
Add('page', name='page2', autoadd=False)
"#;

/// Keeps a tree of widget names as `parent/child` paths, and "draws" pages as
/// an SVG naming the page.
#[derive(Default)]
struct TreeHost {
  document: String,
  widgets: Vec<String>,
  cwd: Vec<String>,
  settings: Vec<(String, Value)>,
  saved_to: Option<PathBuf>,
}
impl Host for TreeHost {
  fn save(&mut self, path: &Path) -> Result<()> {
    self.saved_to = Some(path.to_path_buf());
    fs::write(path, &self.document)?;
    Ok(())
  }
  fn export(&mut self, path: &Path, page: usize) -> Result<()> {
    let svg = format!("<svg xmlns=\"http://www.w3.org/2000/svg\"><title>page {page}</title></svg>");
    fs::write(path, svg)?;
    Ok(())
  }
  fn list_child_widgets(&self) -> Vec<String> {
    self.widgets.iter().filter(|w| !w.contains('/')).cloned().collect()
  }
  fn remove_widget(&mut self, name: &str) -> Result<()> {
    let nested = format!("{name}/");
    self.widgets.retain(|w| w != name && !w.starts_with(&nested));
    Ok(())
  }
  fn run_command(&mut self, command: &Command) -> Result<()> {
    match command.name.as_str() {
      "Add" => {
        let name = command
          .kwarg("name")
          .and_then(Value::as_str)
          .ok_or_else(|| Error::Host(format!("line {}: Add needs a name", command.line)))?;
        let mut path = self.cwd.clone();
        path.push(name.to_string());
        self.widgets.push(path.join("/"));
      }
      "To" => match command.arg(0).and_then(Value::as_str) {
        Some("..") => {
          self.cwd.pop();
        }
        Some(name) => self.cwd.push(name.to_string()),
        None => return Err(Error::Host(String::from("To needs a widget"))),
      },
      "Set" => {
        let key = command.arg(0).and_then(Value::as_str).unwrap_or_default().to_string();
        self.settings.push((key, command.arg(1).cloned().unwrap_or(Value::None)));
      }
      "SetCompatLevel" => (),
      other => return Err(Error::Host(format!("unknown command {other}"))),
    }
    Ok(())
  }
}

#[test]
fn test_document_script_cleans_up() {
  let mut host = TreeHost { document: DOC.to_string(), ..Default::default() };
  assert_eq!(document_script(&mut host).unwrap(), DOC);
  let saved_to = host.saved_to.unwrap();
  assert!(!saved_to.exists());
  assert!(!saved_to.parent().unwrap().exists());
}

#[test]
fn test_svg_save_then_load() {
  let dir = tempfile::tempdir().unwrap();
  let mut host = TreeHost { document: DOC.to_string(), ..Default::default() };
  let options = SaveOptions { page: 2, format: Some(ImageFormat::Svg), ..Default::default() };
  let written = save_image(&mut host, dir.path().join("figure"), &options).unwrap();
  assert_eq!(written, dir.path().join("figure.svg"));
  assert!(fs::read_to_string(&written).unwrap().contains("<title>page 1</title>"));

  let mut viewer = TreeHost {
    widgets: vec!["old".into(), "old/graph".into(), "other".into()],
    ..Default::default()
  };
  assert!(load_image(&mut viewer, &written).unwrap());
  assert_eq!(viewer.widgets, ["page1", "page1/graph1", "page2"]);
  assert_eq!(viewer.settings, [(String::from("width"), Value::Str("15cm".into()))]);
}

#[test]
fn test_host_failure_stops_replay() {
  let dir = tempfile::tempdir().unwrap();
  let path = dir.path().join("plot.svg");
  fs::copy("tests/fixtures/plot.svg", &path).unwrap();
  vszimg::embed(&path, "# Veusz\nAdd('page', name='p')\nExport('x.pdf')\nAdd('page', name='q')\n")
    .unwrap();
  let mut host = TreeHost::default();
  assert!(matches!(load_image(&mut host, &path), Err(Error::Host(_))));
  assert_eq!(host.widgets, ["p"]);
}

#[test]
fn test_load_plain_image() {
  let (_dir, path) = super::scratch_copy("tiny.png");
  let mut host = TreeHost { widgets: vec!["page1".into()], ..Default::default() };
  assert!(!load_image(&mut host, &path).unwrap());
  assert_eq!(host.widgets, ["page1"]);
}
