use std::fmt;
use std::str::FromStr;

use crate::error::CoreError;

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum PathSegment {
    Key(String),
    Index(usize),
}

impl PathSegment {
    /// Key used when the segment lands on an object (or creates one).
    pub fn as_key(&self) -> String {
        match self {
            Self::Key(key) => key.clone(),
            Self::Index(idx) => idx.to_string(),
        }
    }
}

impl fmt::Display for PathSegment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Key(key) => f.write_str(key),
            Self::Index(idx) => write!(f, "{idx}"),
        }
    }
}

/// A non-empty, typed location inside a document, e.g. `gallery.0.image`.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct DocPath(Vec<PathSegment>);

impl DocPath {
    pub fn new(segments: Vec<PathSegment>) -> Result<Self, CoreError> {
        if segments.is_empty() {
            return Err(CoreError::InvalidPath("path has no segments".into()));
        }
        if segments
            .iter()
            .any(|s| matches!(s, PathSegment::Key(k) if k.is_empty()))
        {
            return Err(CoreError::InvalidPath("path has an empty segment".into()));
        }
        Ok(Self(segments))
    }

    /// Parse a dot-separated path. Canonical decimal segments become indices.
    pub fn parse(path: &str) -> Result<Self, CoreError> {
        let mut segments = Vec::new();
        for raw in path.split('.') {
            if raw.is_empty() {
                return Err(CoreError::InvalidPath(format!("empty segment in {path:?}")));
            }
            match canonical_index(raw) {
                Some(idx) => segments.push(PathSegment::Index(idx)),
                None => segments.push(PathSegment::Key(raw.to_string())),
            }
        }
        Self::new(segments)
    }

    pub fn segments(&self) -> &[PathSegment] {
        &self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

/// `raw` as an index only if it renders back to the same text.
fn canonical_index(raw: &str) -> Option<usize> {
    if !raw.bytes().all(|b| b.is_ascii_digit()) || (raw.len() > 1 && raw.starts_with('0')) {
        return None;
    }
    raw.parse().ok()
}

impl FromStr for DocPath {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl fmt::Display for DocPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, segment) in self.0.iter().enumerate() {
            if i > 0 {
                f.write_str(".")?;
            }
            write!(f, "{segment}")?;
        }
        Ok(())
    }
}
