//! Cyclic assignment of text characters to cells.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::RenderError;

/// Non-breaking space, substituted for every literal space.
pub const NBSP: char = '\u{00A0}';

/// How a cell's linear pixel index selects a character.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CharIndexing {
    /// `text[i mod len - 1]`: pixel 0 takes the last character, pixel 1 the
    /// first. Matches output produced by earlier versions of the renderer.
    #[default]
    Legacy,
    /// `text[i mod len]`: pixel 0 takes the first character.
    Direct,
}

impl CharIndexing {
    pub fn name(self) -> &'static str {
        match self {
            CharIndexing::Legacy => "legacy",
            CharIndexing::Direct => "direct",
        }
    }
}

impl fmt::Display for CharIndexing {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for CharIndexing {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "legacy" => Ok(CharIndexing::Legacy),
            "direct" => Ok(CharIndexing::Direct),
            _ => Err(format!(
                "Unknown indexing '{}'. Available: legacy, direct",
                s
            )),
        }
    }
}

/// A non-empty text repeated over the cells of a document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TextCycle {
    chars: Vec<char>,
    indexing: CharIndexing,
}

impl TextCycle {
    /// Fails with [`RenderError::EmptyText`] if `text` has no characters.
    pub fn new(text: &str, indexing: CharIndexing) -> Result<Self, RenderError> {
        let chars: Vec<char> = text
            .chars()
            .map(|c| if c == ' ' { NBSP } else { c })
            .collect();
        if chars.is_empty() {
            return Err(RenderError::EmptyText);
        }
        Ok(Self { chars, indexing })
    }

    pub fn len(&self) -> usize {
        self.chars.len()
    }

    pub fn is_empty(&self) -> bool {
        self.chars.is_empty()
    }

    /// Character for the cell at linear pixel index `index`.
    pub fn char_at(&self, index: usize) -> char {
        let len = self.chars.len();
        let slot = match self.indexing {
            CharIndexing::Legacy => (index % len + len - 1) % len,
            CharIndexing::Direct => index % len,
        };
        self.chars[slot]
    }
}
