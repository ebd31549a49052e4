//! Element id naming convention.
//!
//! Element ids are opaque map keys as far as resolution is concerned. They are
//! only *built* here, when a template asks for a field:
//!
//! - section field: `{section}-{field}` → `hero-title`
//! - repeated item field: `{kind}-{item}-{field}` → `team-42-name`
//!
//! Section and item ids come from the site document and are taken verbatim:
//! `about us` is a valid section id and yields `about us-title`. Only the
//! segments supplied by templates (kind slug, field name) are validated, and
//! an item id must be non-empty. Building ids through [`ElementKey`] keeps the
//! separator in one place; nothing ever parses an id back into its parts.

use serde::Serialize;
use std::fmt;
use thiserror::Error;

#[derive(Error, Debug, PartialEq)]
pub enum KeyError {
    #[error("empty element id segment")]
    EmptySegment,
    #[error("invalid character {ch:?} in element id segment {segment:?}")]
    InvalidChar { segment: String, ch: char },
}

/// An element id built from its parts.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(transparent)]
pub struct ElementKey(String);

impl ElementKey {
    /// Key of a section-level field: `{section}-{field}`.
    pub fn field(section: &str, field: &str) -> Result<Self, KeyError> {
        validate_segment(field)?;
        Ok(Self(format!("{}-{}", section, field)))
    }

    /// Key of a repeated item's field: `{kind}-{item}-{field}`.
    pub fn item(kind: &str, item: &str, field: &str) -> Result<Self, KeyError> {
        validate_segment(kind)?;
        validate_segment(field)?;
        if item.is_empty() {
            return Err(KeyError::EmptySegment);
        }
        Ok(Self(format!("{}-{}-{}", kind, item, field)))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ElementKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for ElementKey {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

/// Segments may contain anything printable except whitespace and quotes.
fn validate_segment(segment: &str) -> Result<(), KeyError> {
    if segment.is_empty() {
        return Err(KeyError::EmptySegment);
    }
    if let Some(ch) = segment
        .chars()
        .find(|c| c.is_whitespace() || c.is_control() || matches!(c, '"' | '\'' | '<' | '>'))
    {
        return Err(KeyError::InvalidChar {
            segment: segment.to_string(),
            ch,
        });
    }
    Ok(())
}
