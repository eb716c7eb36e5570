//! Reader for `.bnd` files, which use Java `.properties` syntax.
//!
//! Only what the importer reads is supported: `key=value`, `key: value` and
//! `key value` entries, `#`/`!` comments, backslash line continuations and the
//! usual escapes. Bnd macros (`${...}`) are kept verbatim.

use std::path::Path;

use crate::ModelError;

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PropertyEntry {
    pub key: String,
    pub value: String,
}

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct BndFile {
    pub entries: Vec<PropertyEntry>,
}

impl BndFile {
    /// Value of `key`; later entries override earlier ones.
    #[must_use]
    pub fn get(&self, key: &str) -> Option<&str> {
        self.entries
            .iter()
            .rev()
            .find(|entry| entry.key == key)
            .map(|entry| entry.value.as_str())
    }

    pub fn read(path: &Path) -> Result<Self, ModelError> {
        let text = std::fs::read_to_string(path).map_err(|source| ModelError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Ok(parse(&text))
    }
}

#[must_use]
pub fn parse(text: &str) -> BndFile {
    let bytes = text.as_bytes();
    let mut offset = 0usize;
    let mut entries = Vec::new();

    while offset < bytes.len() {
        let line_start = offset;
        let logical = read_logical_line(bytes, &mut offset);
        if let Some(entry) = parse_logical_line(&logical) {
            entries.push(entry);
        }

        if offset == line_start {
            offset += 1;
        }
    }

    BndFile { entries }
}

fn read_logical_line(bytes: &[u8], offset: &mut usize) -> Vec<u8> {
    let mut out = Vec::new();

    loop {
        let segment_start = *offset;
        let mut line_end = segment_start;
        while line_end < bytes.len() && bytes[line_end] != b'\n' {
            line_end += 1;
        }

        let mut content_end = line_end;
        if content_end > segment_start && bytes[content_end - 1] == b'\r' {
            content_end -= 1;
        }

        let segment = &bytes[segment_start..content_end];
        let continues = ends_with_unescaped_backslash(segment) && !is_comment(segment);
        let copy_end = if continues {
            content_end - 1
        } else {
            content_end
        };
        out.extend_from_slice(&bytes[segment_start..copy_end]);

        *offset = if line_end < bytes.len() {
            line_end + 1
        } else {
            line_end
        };

        if !continues {
            break;
        }

        // Leading whitespace of a continuation line is not part of the value.
        while *offset < bytes.len() && is_whitespace(bytes[*offset]) {
            *offset += 1;
        }
    }

    out
}

fn is_comment(line: &[u8]) -> bool {
    line.iter()
        .find(|b| !is_whitespace(**b))
        .is_some_and(|b| *b == b'#' || *b == b'!')
}

fn ends_with_unescaped_backslash(line: &[u8]) -> bool {
    let backslashes = line.iter().rev().take_while(|b| **b == b'\\').count();
    backslashes % 2 == 1
}

fn parse_logical_line(line: &[u8]) -> Option<PropertyEntry> {
    let mut i = 0usize;
    while i < line.len() && is_whitespace(line[i]) {
        i += 1;
    }

    if i >= line.len() || line[i] == b'#' || line[i] == b'!' {
        return None;
    }

    let key_start = i;
    while i < line.len() {
        match line[i] {
            b'\\' => i += 2,
            b'=' | b':' => break,
            b if is_whitespace(b) => break,
            _ => i += 1,
        }
    }
    let key_end = i.min(line.len());

    while i < line.len() && is_whitespace(line[i]) {
        i += 1;
    }
    if i < line.len() && (line[i] == b'=' || line[i] == b':') {
        i += 1;
    }
    while i < line.len() && is_whitespace(line[i]) {
        i += 1;
    }

    Some(PropertyEntry {
        key: unescape(&line[key_start..key_end]),
        value: unescape(&line[i.min(line.len())..]),
    })
}

fn is_whitespace(b: u8) -> bool {
    matches!(b, b' ' | b'\t' | b'\x0C')
}

fn unescape(bytes: &[u8]) -> String {
    let text = String::from_utf8_lossy(bytes);
    let mut out = String::with_capacity(text.len());
    let mut chars = text.chars();

    while let Some(ch) = chars.next() {
        if ch != '\\' {
            out.push(ch);
            continue;
        }

        match chars.next() {
            None => out.push('\\'),
            Some('t') => out.push('\t'),
            Some('n') => out.push('\n'),
            Some('r') => out.push('\r'),
            Some('f') => out.push('\x0C'),
            Some('u') => {
                let hex: String = chars.clone().take(4).collect();
                match u32::from_str_radix(&hex, 16).ok().and_then(char::from_u32) {
                    Some(decoded) if hex.len() == 4 => {
                        out.push(decoded);
                        for _ in 0..4 {
                            chars.next();
                        }
                    }
                    _ => out.push('u'),
                }
            }
            Some(other) => out.push(other),
        }
    }

    out
}
