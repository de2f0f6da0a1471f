use std::borrow::Cow;
use std::fmt::{Display, Formatter};

use serde::{Deserialize, Serialize};

use crate::ValidationError;

const MAX_SYMBOL_LEN: usize = 20;
const CARET: char = '^';
const ESCAPED_CARET: &str = "%5E";

/// Inverse of [`Symbol::path_segment`] for a cache directory name.
pub fn decode_path_segment(segment: &str) -> String {
    segment.replace(ESCAPED_CARET, "^")
}

/// Normalized market symbol/ticker.
///
/// Index symbols keep their leading caret (`^GSPC`); [`Symbol::path_segment`]
/// yields the percent-encoded form used in URLs and cache directories.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Symbol(String);

impl Symbol {
    /// Parse and normalize a symbol to uppercase.
    pub fn parse(input: &str) -> Result<Self, ValidationError> {
        let trimmed = input.trim();
        if trimmed.is_empty() {
            return Err(ValidationError::EmptySymbol);
        }

        let normalized = trimmed.to_ascii_uppercase();
        let len = normalized.chars().count();
        if len > MAX_SYMBOL_LEN {
            return Err(ValidationError::SymbolTooLong {
                len,
                max: MAX_SYMBOL_LEN,
            });
        }

        if let Some(first) = normalized.chars().next() {
            if !(first.is_ascii_alphanumeric() || first == '^') {
                return Err(ValidationError::SymbolInvalidStart { ch: first });
            }
        }

        for (index, ch) in normalized.chars().enumerate() {
            let valid =
                ch.is_ascii_alphanumeric() || matches!(ch, '.' | '-' | '^' | '=' | '_' | '&');
            if !valid {
                return Err(ValidationError::SymbolInvalidChar { ch, index });
            }
        }

        Ok(Self(normalized))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Form used in URL paths and as the cache directory name: only the
    /// caret is escaped (`^GSPC` -> `%5EGSPC`), every other character is kept.
    pub fn path_segment(&self) -> Cow<'_, str> {
        if self.0.contains(CARET) {
            Cow::Owned(self.0.replace(CARET, ESCAPED_CARET))
        } else {
            Cow::Borrowed(&self.0)
        }
    }
}

impl Display for Symbol {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl TryFrom<String> for Symbol {
    type Error = ValidationError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value)
    }
}

impl TryFrom<&str> for Symbol {
    type Error = ValidationError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        Self::parse(value)
    }
}

impl From<Symbol> for String {
    fn from(value: Symbol) -> Self {
        value.0
    }
}
