//! Delimiter-separated blocks
//!
//! A delimiter is a line containing only three or more dashes.

use once_cell::sync::Lazy;
use regex::Regex;

static DELIMITER: Lazy<Regex> = Lazy::new(|| Regex::new(r"^\s*-{3,}\s*$").expect("static regex"));

/// Result of splitting on delimiter lines
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct Blocks<'a> {
    /// Non-blank blocks, in order
    pub(crate) non_empty: Vec<String>,
    /// Whether any delimiter line was seen
    pub(crate) had_delimiter: bool,
    source: &'a str,
}

impl<'a> Blocks<'a> {
    /// Split `text` on delimiter lines
    pub(crate) fn split(text: &'a str) -> Self {
        let mut non_empty = Vec::new();
        let mut current: Vec<&str> = Vec::new();
        let mut had_delimiter = false;

        for line in text.lines() {
            if DELIMITER.is_match(line) {
                had_delimiter = true;
                flush(&mut current, &mut non_empty);
            } else {
                current.push(line);
            }
        }
        flush(&mut current, &mut non_empty);

        Self {
            non_empty,
            had_delimiter,
            source: text,
        }
    }

    /// Text to hand to the next rule when this one does not apply
    pub(crate) fn remainder(&self) -> &str {
        match self.non_empty.as_slice() {
            [single] if self.had_delimiter => single.as_str(),
            _ => self.source,
        }
    }

    /// Rule applies: more than one non-blank block
    pub(crate) fn is_multi(&self) -> bool {
        self.non_empty.len() > 1
    }
}

fn flush(current: &mut Vec<&str>, out: &mut Vec<String>) {
    let block = current.join("\n");
    current.clear();
    let trimmed = block.trim();
    if !trimmed.is_empty() {
        out.push(trimmed.to_string());
    }
}
