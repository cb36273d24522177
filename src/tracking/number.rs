//! Tracking number parsing.

use std::fmt;

use thiserror::Error;

/// Why a caller-supplied identifier was refused.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum InvalidTrackingNumber {
    #[error("Tracking number must not be empty")]
    Empty,

    #[error("Invalid tracking number format '{0}'. Expected format: XX123456789XX (e.g., LP951627598IN)")]
    Format(String),
}

/// A normalized tracking identifier: trimmed and upper-cased, never empty.
///
/// The portal treats the value as opaque. [`TrackingNumber::parse_strict`]
/// additionally enforces the two letters, nine digits, two letters shape used
/// by India Post articles.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct TrackingNumber(String);

impl TrackingNumber {
    /// Normalize `raw`, rejecting only blank input.
    pub fn parse(raw: &str) -> Result<Self, InvalidTrackingNumber> {
        let normalized = raw.trim().to_uppercase();
        if normalized.is_empty() {
            return Err(InvalidTrackingNumber::Empty);
        }
        Ok(Self(normalized))
    }

    /// Normalize `raw` and require the `XX123456789XX` shape.
    pub fn parse_strict(raw: &str) -> Result<Self, InvalidTrackingNumber> {
        let number = Self::parse(raw)?;
        if !has_article_shape(&number.0) {
            return Err(InvalidTrackingNumber::Format(number.0));
        }
        Ok(number)
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

fn has_article_shape(value: &str) -> bool {
    let bytes = value.as_bytes();
    bytes.len() == 13
        && bytes[..2].iter().all(u8::is_ascii_uppercase)
        && bytes[2..11].iter().all(u8::is_ascii_digit)
        && bytes[11..].iter().all(u8::is_ascii_uppercase)
}

impl fmt::Display for TrackingNumber {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for TrackingNumber {
    fn as_ref(&self) -> &str {
        &self.0
    }
}
