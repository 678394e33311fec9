//! Text formatting for dumps.
//!
//! Two decisions are made here and nowhere else: how prose is wrapped, and
//! which YAML scalar style a value is written in. Both look only at the value
//! being written, so the same graph always dumps to the same bytes.

use serde_yaml::Value;
use std::fmt::Write as _;

// ============================================================================
// Wrapping
// ============================================================================

/// Greedy word wrap. Lines already within `width` characters are kept as
/// they are; longer lines are re-flowed on whitespace. A single word longer
/// than `width` gets a line of its own. Applying it twice changes nothing.
pub fn wrap_text(text: &str, width: usize) -> String {
    let text = text.replace("\r\n", "\n");
    let width = width.max(1);
    let mut out = String::with_capacity(text.len());

    for (i, line) in text.split('\n').enumerate() {
        if i > 0 {
            out.push('\n');
        }
        if line.chars().count() <= width {
            out.push_str(line);
            continue;
        }

        let mut current = 0usize;
        for word in line.split_whitespace() {
            let len = word.chars().count();
            if current > 0 && current + 1 + len > width {
                out.push('\n');
                current = 0;
            }
            if current > 0 {
                out.push(' ');
                current += 1;
            }
            out.push_str(word);
            current += len;
        }
    }
    out
}

// ============================================================================
// Scalar styles
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScalarStyle {
    /// `key: value`
    Plain,
    /// `key: "value"`
    Quoted,
    /// `key: |` block
    Literal,
}

/// Style for `value`, decided by its line breaks.
pub fn scalar_style(value: &str) -> ScalarStyle {
    if value.contains('\n') {
        if literal_safe(value) {
            ScalarStyle::Literal
        } else {
            ScalarStyle::Quoted
        }
    } else if plain_safe(value) {
        ScalarStyle::Plain
    } else {
        ScalarStyle::Quoted
    }
}

/// Characters a YAML reader treats as line breaks besides `\n` and `\r`.
fn is_unicode_break(c: char) -> bool {
    matches!(c, '\u{85}' | '\u{2028}' | '\u{2029}')
}

/// What YAML accepts unescaped in a document.
fn is_printable(c: char) -> bool {
    match c {
        '\u{feff}' => false,
        '\t' | '\n' | ' '..='~' | '\u{85}' | '\u{a0}'..='\u{d7ff}' | '\u{e000}'..='\u{fffd}' => true,
        c => c >= '\u{10000}',
    }
}

/// Safe to write bare on a line: printable, and no character the reader
/// would take as the end of the line.
fn single_line_char(c: char) -> bool {
    is_printable(c) && !c.is_control() && !is_unicode_break(c)
}

/// A plain scalar is only used when YAML reads it back as the same string.
fn plain_safe(value: &str) -> bool {
    if value.is_empty() || value.trim() != value || !value.chars().all(single_line_char) {
        return false;
    }
    matches!(serde_yaml::from_str::<Value>(value), Ok(Value::String(s)) if s == value)
}

fn literal_safe(value: &str) -> bool {
    let body = value.trim_end_matches('\n');
    if body.is_empty() {
        return false;
    }
    // Indentation of a block is taken from its first line; leading
    // whitespace anywhere would be read as indentation or as content
    // depending on position.
    body.split('\n').all(|line| {
        !line.starts_with([' ', '\t'])
            && line.chars().all(|c| c == '\t' || single_line_char(c))
    })
}

/// Double-quoted form with YAML escapes.
pub fn quote(value: &str) -> String {
    let mut out = String::with_capacity(value.len() + 2);
    out.push('"');
    for c in value.chars() {
        match c {
            '"' => out.push_str("\\\""),
            '\\' => out.push_str("\\\\"),
            '\n' => out.push_str("\\n"),
            '\r' => out.push_str("\\r"),
            '\t' => out.push_str("\\t"),
            '\u{85}' => out.push_str("\\N"),
            '\u{2028}' => out.push_str("\\L"),
            '\u{2029}' => out.push_str("\\P"),
            c if c.is_control() || !is_printable(c) => {
                let _ = write!(out, "\\u{:04X}", c as u32);
            }
            c => out.push(c),
        }
    }
    out.push('"');
    out
}

/// A value rendered where only a single line fits (list items).
pub fn inline_scalar(value: &str) -> String {
    match scalar_style(value) {
        ScalarStyle::Plain => value.to_string(),
        ScalarStyle::Quoted | ScalarStyle::Literal => quote(value),
    }
}

// ============================================================================
// Writer
// ============================================================================

const ITEM_INDENT: &str = "  ";
const BLOCK_INDENT: &str = "    ";

/// Block-style emitter for `section: [ {key: value} ]` documents.
///
/// ```text
/// terms:
/// - name: Account
///   long_description: |-
///     first line
///     second line
///   categories:
///   - Finance
///   # no related_terms
/// ```
#[derive(Debug, Default)]
pub struct YamlWriter {
    out: String,
    item_open: bool,
    dash_pending: bool,
    deferred: Vec<String>,
}

impl YamlWriter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn section(&mut self, name: &str) {
        self.end_item();
        let _ = writeln!(self.out, "{}:", inline_scalar(name));
    }

    pub fn begin_item(&mut self) {
        self.end_item();
        self.item_open = true;
        self.dash_pending = true;
    }

    pub fn scalar(&mut self, key: &str, value: &str) {
        self.key_prefix();
        match scalar_style(value) {
            ScalarStyle::Plain => {
                let _ = writeln!(self.out, "{key}: {value}");
            }
            ScalarStyle::Quoted => {
                let _ = writeln!(self.out, "{key}: {}", quote(value));
            }
            ScalarStyle::Literal => self.literal(key, value),
        }
        self.flush_deferred();
    }

    pub fn list<I, T>(&mut self, key: &str, items: I)
    where
        I: IntoIterator<Item = T>,
        T: AsRef<str>,
    {
        self.key_prefix();
        let _ = writeln!(self.out, "{key}:");
        for item in items {
            let _ = writeln!(self.out, "{ITEM_INDENT}- {}", inline_scalar(item.as_ref()));
        }
        self.flush_deferred();
    }

    pub fn empty_list(&mut self, key: &str) {
        self.key_prefix();
        let _ = writeln!(self.out, "{key}: []");
        self.flush_deferred();
    }

    /// A `# text` line inside the current item.
    pub fn comment(&mut self, text: &str) {
        let line = format!("{ITEM_INDENT}# {text}");
        if self.dash_pending {
            self.deferred.push(line);
        } else {
            self.out.push_str(&line);
            self.out.push('\n');
        }
    }

    pub fn end_item(&mut self) {
        if !self.item_open {
            return;
        }
        if self.dash_pending {
            self.out.push_str("- {}\n");
            self.dash_pending = false;
            self.flush_deferred();
        }
        self.item_open = false;
    }

    pub fn finish(mut self) -> String {
        self.end_item();
        self.out
    }

    fn key_prefix(&mut self) {
        if self.dash_pending {
            self.out.push_str("- ");
            self.dash_pending = false;
        } else {
            self.out.push_str(ITEM_INDENT);
        }
    }

    fn flush_deferred(&mut self) {
        for line in self.deferred.drain(..) {
            self.out.push_str(&line);
            self.out.push('\n');
        }
    }

    fn literal(&mut self, key: &str, value: &str) {
        let body = value.trim_end_matches('\n');
        let trailing = value.len() - body.len();
        let chomp = match trailing {
            0 => "|-",
            1 => "|",
            _ => "|+",
        };
        let _ = writeln!(self.out, "{key}: {chomp}");
        for line in body.split('\n') {
            if line.is_empty() {
                self.out.push('\n');
            } else {
                let _ = writeln!(self.out, "{BLOCK_INDENT}{line}");
            }
        }
        for _ in 1..trailing {
            self.out.push('\n');
        }
    }
}
