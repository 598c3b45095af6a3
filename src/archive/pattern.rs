//! Shell-style wildcard patterns for archive member selection
//!
//! Semantics follow `fnmatch`: `*` matches any run of characters including
//! `/`, `?` matches one character, `[seq]` and `[!seq]` match character
//! classes. Matching is case-sensitive. Patterns are compiled to an anchored
//! regular expression once.

use crate::error::{Error, Result};
use regex::Regex;
use std::fmt;

/// Compiled wildcard pattern
#[derive(Debug, Clone)]
pub struct MemberPattern {
    glob: String,
    regex: Regex,
}

impl MemberPattern {
    /// Compile a wildcard pattern
    pub fn new(glob: impl Into<String>) -> Result<Self> {
        let glob = glob.into();
        let regex = Regex::new(&glob_to_regex(&glob))
            .map_err(|e| Error::invalid_value("pattern", format!("'{glob}': {e}")))?;
        Ok(Self { glob, regex })
    }

    /// Check a name against the pattern
    pub fn matches(&self, name: &str) -> bool {
        self.regex.is_match(name)
    }

    /// Keep the names that match, preserving order
    pub fn filter<'a, I>(&self, names: I) -> Vec<String>
    where
        I: IntoIterator<Item = &'a String>,
    {
        names
            .into_iter()
            .filter(|name| self.matches(name))
            .cloned()
            .collect()
    }

    /// The original wildcard text
    pub fn as_str(&self) -> &str {
        &self.glob
    }
}

impl fmt::Display for MemberPattern {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.glob)
    }
}

/// Translate a wildcard into an anchored regex source
fn glob_to_regex(glob: &str) -> String {
    let chars: Vec<char> = glob.chars().collect();
    let n = chars.len();
    let mut out = String::from("^(?s:");
    let mut i = 0;

    while i < n {
        let c = chars[i];
        i += 1;
        match c {
            '*' => {
                while i < n && chars[i] == '*' {
                    i += 1;
                }
                out.push_str(".*");
            }
            '?' => out.push('.'),
            '[' => {
                // Find the closing bracket; a leading `!` or `]` is part of the class
                let mut j = i;
                if j < n && chars[j] == '!' {
                    j += 1;
                }
                if j < n && chars[j] == ']' {
                    j += 1;
                }
                while j < n && chars[j] != ']' {
                    j += 1;
                }

                if j >= n {
                    out.push_str("\\[");
                    continue;
                }

                let class = &chars[i..j];
                i = j + 1;
                out.push_str(&translate_class(class));
            }
            _ => {
                let mut buf = [0u8; 4];
                out.push_str(&regex::escape(c.encode_utf8(&mut buf)));
            }
        }
    }

    out.push_str(")$");
    out
}

/// Regex class that matches no character
const NEVER: &str = r"[^\x{0}-\x{10FFFF}]";

/// Translate the inside of a `[...]` class
///
/// `a-z` is a range. A `-` that cannot start a range is literal, and a
/// reversed range such as `z-a` is dropped. Every literal is escaped so
/// that regex set operators like `--` and `&&` never apply.
fn translate_class(class: &[char]) -> String {
    let (negate, body) = match class.split_first() {
        Some(('!', rest)) => (true, rest),
        _ => (false, class),
    };

    // Split on the hyphens that separate range endpoints. The first char
    // and the char after each separator are never separators themselves.
    let mut chunks: Vec<Vec<char>> = Vec::new();
    let mut start = 0;
    let mut k = 1;
    while k < body.len() {
        let Some(offset) = body[k..].iter().position(|&c| c == '-') else {
            break;
        };
        let hyphen = k + offset;
        chunks.push(body[start..hyphen].to_vec());
        start = hyphen + 1;
        k = hyphen + 3;
    }
    let rest = &body[start.min(body.len())..];
    if rest.is_empty() && !chunks.is_empty() {
        if let Some(last) = chunks.last_mut() {
            last.push('-');
        }
    } else {
        chunks.push(rest.to_vec());
    }

    // Drop reversed ranges by joining their neighbours
    for k in (1..chunks.len()).rev() {
        let reversed = matches!(
            (chunks[k - 1].last(), chunks[k].first()),
            (Some(lo), Some(hi)) if lo > hi
        );
        if reversed {
            let tail = chunks.remove(k);
            let head = &mut chunks[k - 1];
            head.pop();
            head.extend_from_slice(&tail[1..]);
        }
    }

    let items: Vec<String> = chunks
        .iter()
        .map(|chunk| chunk.iter().map(|&c| escape_class_char(c)).collect())
        .collect();
    let items = items.join("-");

    match (negate, items.is_empty()) {
        (false, true) => NEVER.to_string(),
        (true, true) => ".".to_string(),
        (true, false) => format!("[^{items}]"),
        (false, false) => format!("[{items}]"),
    }
}

fn escape_class_char(c: char) -> String {
    match c {
        '\\' | '[' | ']' | '-' | '^' | '&' | '~' | '|' => format!("\\{c}"),
        _ => c.to_string(),
    }
}

#[cfg(test)]
pub(crate) fn regex_source(glob: &str) -> String {
    glob_to_regex(glob)
}
