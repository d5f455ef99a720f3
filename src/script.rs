#![forbid(unsafe_code)]

//! Turning a saved Veusz document into a list of commands.
//!
//! A saved document is a series of calls, one per line, such as:
//!
//! ```text
//! # Veusz saved document (version 3.6.2)
//! Set('width', '15cm')
//! Add('page', name='page1', autoadd=False)
//! To('page1')
//! ImportString('x(numeric)','''
//! 1.0
//! 2.0
//! ''')
//! ```
//!
//! Rather than running that text as code, [`parse_script`] reads each call
//! into a [`Command`] holding plain [`Value`]s. Replaying the commands is then
//! up to a [`Host`](crate::host::Host), which only ever does the specific
//! things it has methods for.
//!
//! Only literals are accepted as arguments: strings, numbers, `True`, `False`,
//! `None`, and lists, tuples, and dicts of those. Anything else (names,
//! arithmetic, nested calls) is a syntax error.

use core::fmt::{self, Write};

use crate::{Error, Result};

/// A literal argument value.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
  Str(String),
  Int(i64),
  Float(f64),
  Bool(bool),
  None,
  List(Vec<Value>),
  Tuple(Vec<Value>),
  Dict(Vec<(Value, Value)>),
}
impl Value {
  #[inline]
  #[must_use]
  pub fn as_str(&self) -> Option<&str> {
    match self {
      Self::Str(s) => Some(s),
      _ => None,
    }
  }
  #[inline]
  #[must_use]
  pub fn as_bool(&self) -> Option<bool> {
    match self {
      Self::Bool(b) => Some(*b),
      _ => None,
    }
  }
  /// Ints are also accepted, as a float.
  #[inline]
  #[must_use]
  pub fn as_f64(&self) -> Option<f64> {
    match self {
      Self::Float(f) => Some(*f),
      Self::Int(i) => Some(*i as f64),
      _ => None,
    }
  }
}
impl fmt::Display for Value {
  /// Writes the value back out in the same literal syntax it's parsed from.
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    match self {
      Self::Str(s) => {
        f.write_char('\'')?;
        for ch in s.chars() {
          match ch {
            '\\' => f.write_str("\\\\")?,
            '\'' => f.write_str("\\'")?,
            '\n' => f.write_str("\\n")?,
            '\r' => f.write_str("\\r")?,
            '\t' => f.write_str("\\t")?,
            c if c.is_control() => write!(f, "\\x{:02x}", c as u32)?,
            c => f.write_char(c)?,
          }
        }
        f.write_char('\'')
      }
      Self::Int(i) => write!(f, "{i}"),
      Self::Float(x) if x.fract() == 0.0 && x.is_finite() => write!(f, "{x:.1}"),
      Self::Float(x) => write!(f, "{x}"),
      Self::Bool(true) => f.write_str("True"),
      Self::Bool(false) => f.write_str("False"),
      Self::None => f.write_str("None"),
      Self::List(items) => {
        f.write_char('[')?;
        write_items(f, items)?;
        f.write_char(']')
      }
      Self::Tuple(items) => {
        f.write_char('(')?;
        write_items(f, items)?;
        if items.len() == 1 {
          f.write_char(',')?;
        }
        f.write_char(')')
      }
      Self::Dict(pairs) => {
        f.write_char('{')?;
        for (i, (k, v)) in pairs.iter().enumerate() {
          if i > 0 {
            f.write_str(", ")?;
          }
          write!(f, "{k}: {v}")?;
        }
        f.write_char('}')
      }
    }
  }
}

fn write_items(f: &mut fmt::Formatter<'_>, items: &[Value]) -> fmt::Result {
  for (i, item) in items.iter().enumerate() {
    if i > 0 {
      f.write_str(", ")?;
    }
    write!(f, "{item}")?;
  }
  Ok(())
}

/// One call from a saved document.
#[derive(Debug, Clone, PartialEq)]
pub struct Command {
  /// The function name, such as `Add` or `Set`.
  pub name: String,
  pub args: Vec<Value>,
  /// Keyword arguments, in the order they were written.
  pub kwargs: Vec<(String, Value)>,
  /// 1-based line the call starts on.
  pub line: usize,
}
impl Command {
  #[inline]
  #[must_use]
  pub fn arg(&self, index: usize) -> Option<&Value> {
    self.args.get(index)
  }
  #[inline]
  #[must_use]
  pub fn kwarg(&self, name: &str) -> Option<&Value> {
    self.kwargs.iter().find(|(k, _)| k == name).map(|(_, v)| v)
  }
}
impl fmt::Display for Command {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    write!(f, "{}(", self.name)?;
    write_items(f, &self.args)?;
    for (i, (k, v)) in self.kwargs.iter().enumerate() {
      if i > 0 || !self.args.is_empty() {
        f.write_str(", ")?;
      }
      write!(f, "{k}={v}")?;
    }
    f.write_char(')')
  }
}

/// Parses a saved document into commands.
///
/// ## Failure
/// * Anything other than a call of literals, reported with its line number.
pub fn parse_script(script: &str) -> Result<Vec<Command>> {
  let mut parser = Parser { src: script, pos: 0, line: 1 };
  let mut out = Vec::new();
  loop {
    parser.skip_blank();
    if parser.peek().is_none() {
      return Ok(out);
    }
    out.push(parser.command()?);
    parser.skip_inline_blank();
    parser.eat(';');
    parser.skip_inline_blank();
    match parser.peek() {
      None | Some('\n' | '\r' | '#') => (),
      Some(c) => return Err(parser.error(format!("unexpected {c:?} after a command"))),
    }
  }
}

struct Parser<'s> {
  src: &'s str,
  /// byte offset into `src`
  pos: usize,
  line: usize,
}
impl Parser<'_> {
  fn peek(&self) -> Option<char> {
    self.src[self.pos..].chars().next()
  }

  fn peek_nth(&self, n: usize) -> Option<char> {
    self.src[self.pos..].chars().nth(n)
  }

  fn bump(&mut self) -> Option<char> {
    let c = self.peek()?;
    self.pos += c.len_utf8();
    if c == '\n' {
      self.line += 1;
    }
    Some(c)
  }

  fn eat(&mut self, c: char) -> bool {
    if self.peek() == Some(c) {
      self.bump();
      true
    } else {
      false
    }
  }

  fn expect(&mut self, c: char) -> Result<()> {
    if self.eat(c) {
      Ok(())
    } else {
      Err(self.error(match self.peek() {
        Some(got) => format!("expected {c:?}, found {got:?}"),
        None => format!("expected {c:?}, found end of script"),
      }))
    }
  }

  fn error(&self, message: impl Into<String>) -> Error {
    Error::Script { line: self.line, message: message.into() }
  }

  /// Spaces, tabs, and a `\` line continuation.
  fn skip_inline_blank(&mut self) {
    loop {
      match self.peek() {
        Some(' ' | '\t') => {
          self.bump();
        }
        Some('\\') if matches!(self.peek_nth(1), Some('\n')) => {
          self.bump();
          self.bump();
        }
        _ => return,
      }
    }
  }

  /// All whitespace, newlines included, and comments.
  fn skip_blank(&mut self) {
    loop {
      self.skip_inline_blank();
      match self.peek() {
        Some('\n' | '\r') => {
          self.bump();
        }
        Some('#') => {
          while !matches!(self.peek(), None | Some('\n')) {
            self.bump();
          }
        }
        _ => return,
      }
    }
  }

  fn ident(&mut self) -> Option<&str> {
    let start = self.pos;
    match self.peek() {
      Some(c) if c.is_alphabetic() || c == '_' => (),
      _ => return None,
    }
    while matches!(self.peek(), Some(c) if c.is_alphanumeric() || c == '_') {
      self.bump();
    }
    Some(&self.src[start..self.pos])
  }

  fn command(&mut self) -> Result<Command> {
    let line = self.line;
    let name = match self.ident() {
      Some(name) => name.to_string(),
      None => return Err(self.error("expected a command name")),
    };
    self.skip_inline_blank();
    self.expect('(')?;
    let mut args = Vec::new();
    let mut kwargs: Vec<(String, Value)> = Vec::new();
    loop {
      self.skip_blank();
      if self.eat(')') {
        break;
      }
      // `name=value`, or else rewind and read a plain value
      let mark = (self.pos, self.line);
      let keyword = self.ident().map(str::to_string);
      self.skip_blank();
      match keyword {
        Some(key) if self.peek() == Some('=') && self.peek_nth(1) != Some('=') => {
          self.bump();
          self.skip_blank();
          let value = self.value()?;
          if kwargs.iter().any(|(k, _)| *k == key) {
            return Err(self.error(format!("keyword argument {key:?} repeated")));
          }
          kwargs.push((key, value));
        }
        _ => {
          (self.pos, self.line) = mark;
          if !kwargs.is_empty() {
            return Err(self.error("positional argument follows keyword argument"));
          }
          args.push(self.value()?);
        }
      }
      self.skip_blank();
      if !self.eat(',') {
        self.skip_blank();
        self.expect(')')?;
        break;
      }
    }
    Ok(Command { name, args, kwargs, line })
  }

  fn value(&mut self) -> Result<Value> {
    match self.peek() {
      Some('[') => {
        self.bump();
        self.sequence(']').map(Value::List)
      }
      Some('(') => {
        self.bump();
        self.skip_blank();
        if self.eat(')') {
          return Ok(Value::Tuple(Vec::new()));
        }
        let first = self.value()?;
        self.skip_blank();
        if self.eat(')') {
          // just parentheses, not a tuple
          return Ok(first);
        }
        self.expect(',')?;
        let mut items = vec![first];
        items.extend(self.sequence(')')?);
        Ok(Value::Tuple(items))
      }
      Some('{') => {
        self.bump();
        self.dict()
      }
      Some('\'' | '"') => self.string(false),
      Some(c) if c.is_ascii_digit() || c == '-' || c == '+' || c == '.' => self.number(),
      Some(c) if c.is_alphabetic() || c == '_' => {
        let prefix_len = self.src[self.pos..]
          .chars()
          .take_while(|c| matches!(c, 'r' | 'R' | 'u' | 'U' | 'b' | 'B'))
          .count();
        if prefix_len <= 2 && matches!(self.peek_nth(prefix_len), Some('\'' | '"')) {
          let mut raw = false;
          for _ in 0..prefix_len {
            raw |= matches!(self.bump(), Some('r' | 'R'));
          }
          return self.string(raw);
        }
        let line = self.line;
        match self.ident().unwrap_or_default() {
          "True" => Ok(Value::Bool(true)),
          "False" => Ok(Value::Bool(false)),
          "None" => Ok(Value::None),
          other => Err(Error::Script { line, message: format!("{other:?} isn't a literal value") }),
        }
      }
      Some(c) => Err(self.error(format!("unexpected {c:?}"))),
      None => Err(self.error("unexpected end of script")),
    }
  }

  /// Comma separated values up to `close`, allowing a trailing comma.
  fn sequence(&mut self, close: char) -> Result<Vec<Value>> {
    let mut items = Vec::new();
    loop {
      self.skip_blank();
      if self.eat(close) {
        return Ok(items);
      }
      items.push(self.value()?);
      self.skip_blank();
      if !self.eat(',') {
        self.skip_blank();
        self.expect(close)?;
        return Ok(items);
      }
    }
  }

  fn dict(&mut self) -> Result<Value> {
    let mut pairs = Vec::new();
    loop {
      self.skip_blank();
      if self.eat('}') {
        return Ok(Value::Dict(pairs));
      }
      let key = self.value()?;
      self.skip_blank();
      self.expect(':')?;
      self.skip_blank();
      let value = self.value()?;
      pairs.push((key, value));
      self.skip_blank();
      if !self.eat(',') {
        self.skip_blank();
        self.expect('}')?;
        return Ok(Value::Dict(pairs));
      }
    }
  }

  fn number(&mut self) -> Result<Value> {
    let start = self.pos;
    if matches!(self.peek(), Some('-' | '+')) {
      self.bump();
    }
    let mut is_float = false;
    while let Some(c) = self.peek() {
      match c {
        '0'..='9' | '_' => (),
        '.' => is_float = true,
        'e' | 'E' => {
          is_float = true;
          self.bump();
          if matches!(self.peek(), Some('-' | '+')) {
            self.bump();
          }
          continue;
        }
        _ => break,
      }
      self.bump();
    }
    let text = self.src[start..self.pos].replace('_', "");
    let parsed = if is_float {
      // `1e999` parses to infinity, which has no literal form to write back
      text.parse::<f64>().ok().filter(|x| x.is_finite()).map(Value::Float)
    } else {
      text.parse::<i64>().map(Value::Int).ok()
    };
    parsed.ok_or_else(|| self.error(format!("bad number {text:?}")))
  }

  /// The opening quote is the next character.
  fn string(&mut self, raw: bool) -> Result<Value> {
    let line = self.line;
    let quote = match self.bump() {
      Some(q) => q,
      None => return Err(self.error("expected a string")),
    };
    let triple = self.peek() == Some(quote) && self.peek_nth(1) == Some(quote);
    if triple {
      self.bump();
      self.bump();
    }
    let mut out = String::new();
    loop {
      let c = match self.bump() {
        Some(c) => c,
        None => {
          return Err(Error::Script { line, message: String::from("unterminated string") })
        }
      };
      match c {
        c if c == quote => {
          if !triple {
            return Ok(Value::Str(out));
          }
          if self.peek() == Some(quote) && self.peek_nth(1) == Some(quote) {
            self.bump();
            self.bump();
            return Ok(Value::Str(out));
          }
          out.push(c);
        }
        '\n' if !triple => {
          return Err(Error::Script { line, message: String::from("unterminated string") })
        }
        '\\' if raw => {
          // a raw string still can't end on an escaped quote
          out.push('\\');
          if let Some(next) = self.bump() {
            out.push(next);
          }
        }
        '\\' => self.escape(&mut out)?,
        c => out.push(c),
      }
    }
  }

  /// The backslash has just been read.
  fn escape(&mut self, out: &mut String) -> Result<()> {
    let c = match self.bump() {
      Some(c) => c,
      None => return Err(self.error("unterminated string")),
    };
    match c {
      '\n' => (),
      '\\' | '\'' | '"' => out.push(c),
      'n' => out.push('\n'),
      't' => out.push('\t'),
      'r' => out.push('\r'),
      'a' => out.push('\x07'),
      'b' => out.push('\x08'),
      'f' => out.push('\x0C'),
      'v' => out.push('\x0B'),
      '0'..='7' => {
        let mut code = c.to_digit(8).unwrap_or(0);
        for _ in 0..2 {
          match self.peek().and_then(|d| d.to_digit(8)) {
            Some(d) => {
              code = code * 8 + d;
              self.bump();
            }
            None => break,
          }
        }
        out.push(self.code_point(code)?);
      }
      'x' => out.push(self.hex_escape(2)?),
      'u' => out.push(self.hex_escape(4)?),
      'U' => out.push(self.hex_escape(8)?),
      other => {
        out.push('\\');
        out.push(other);
      }
    }
    Ok(())
  }

  fn hex_escape(&mut self, digits: usize) -> Result<char> {
    let mut code = 0_u32;
    for _ in 0..digits {
      match self.peek().and_then(|d| d.to_digit(16)) {
        Some(d) => {
          code = code * 16 + d;
          self.bump();
        }
        None => return Err(self.error("truncated escape sequence")),
      }
    }
    self.code_point(code)
  }

  fn code_point(&self, code: u32) -> Result<char> {
    char::from_u32(code).ok_or_else(|| self.error(format!("bad code point {code:#x}")))
  }
}
