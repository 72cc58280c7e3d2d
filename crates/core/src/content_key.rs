use serde::{Deserialize, Serialize};
use std::fmt;

use crate::error::CoreError;

/// Composite identity of a content document: `(type, subtype)`.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "RawContentKey")]
pub struct ContentKey {
    content_type: String,
    subtype: String,
}

impl ContentKey {
    pub fn new(content_type: &str, subtype: &str) -> Result<Self, CoreError> {
        validate_part("type", content_type)?;
        validate_part("subtype", subtype)?;
        Ok(Self {
            content_type: content_type.to_string(),
            subtype: subtype.to_string(),
        })
    }

    pub fn content_type(&self) -> &str {
        &self.content_type
    }

    pub fn subtype(&self) -> &str {
        &self.subtype
    }
}

#[derive(Deserialize)]
struct RawContentKey {
    content_type: String,
    subtype: String,
}

impl TryFrom<RawContentKey> for ContentKey {
    type Error = CoreError;

    fn try_from(raw: RawContentKey) -> Result<Self, Self::Error> {
        Self::new(&raw.content_type, &raw.subtype)
    }
}

fn validate_part(label: &str, part: &str) -> Result<(), CoreError> {
    if part.is_empty() {
        return Err(CoreError::InvalidKey(format!("{label} must not be empty")));
    }
    if let Some(bad) = part
        .chars()
        .find(|c| !(c.is_ascii_alphanumeric() || *c == '-' || *c == '_'))
    {
        return Err(CoreError::InvalidKey(format!(
            "{label} {part:?} contains invalid character {bad:?}"
        )));
    }
    Ok(())
}

impl fmt::Display for ContentKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.content_type, self.subtype)
    }
}
