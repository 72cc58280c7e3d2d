//! Save requests and their multipart encoding.
//!
//! A save arrives as one multipart body: a part named `data` carrying the
//! JSON patch, and one binary part per upload whose name is the dot path the
//! stored file's URL should land at.

use serde_json::Value;
use sitedeck_core::{ContentKey, DocPath};

use crate::error::EngineError;

pub const DATA_PART: &str = "data";
const DEFAULT_CONTENT_TYPE: &str = "application/octet-stream";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Part {
    pub name: String,
    pub content_type: Option<String>,
    pub bytes: Vec<u8>,
}

impl Part {
    pub fn new(name: &str, content_type: Option<&str>, bytes: Vec<u8>) -> Self {
        Self {
            name: name.to_string(),
            content_type: content_type.map(str::to_string),
            bytes,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Upload {
    pub path: DocPath,
    pub content_type: String,
    pub bytes: Vec<u8>,
}

impl Upload {
    pub fn new(path: &str, content_type: &str, bytes: Vec<u8>) -> Result<Self, EngineError> {
        if bytes.is_empty() {
            return Err(EngineError::Validation(format!("upload for {path} is empty")));
        }
        Ok(Self {
            path: DocPath::parse(path)?,
            content_type: content_type.to_string(),
            bytes,
        })
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct SaveRequest {
    pub key: ContentKey,
    pub patch: Option<Value>,
    pub uploads: Vec<Upload>,
}

impl SaveRequest {
    pub fn new(key: ContentKey) -> Self {
        Self {
            key,
            patch: None,
            uploads: Vec::new(),
        }
    }

    pub fn with_patch(mut self, patch: Value) -> Self {
        self.patch = Some(patch);
        self
    }

    pub fn with_upload(mut self, upload: Upload) -> Self {
        self.uploads.push(upload);
        self
    }

    /// Decode multipart parts. Upload order follows part order.
    pub fn from_parts(key: ContentKey, parts: Vec<Part>) -> Result<Self, EngineError> {
        let mut request = Self::new(key);
        for part in parts {
            if part.name == DATA_PART {
                if request.patch.is_some() {
                    return Err(EngineError::Validation("duplicate data part".into()));
                }
                let patch: Value = serde_json::from_slice(&part.bytes)
                    .map_err(|e| EngineError::Validation(format!("data part is not JSON: {e}")))?;
                request.patch = Some(patch);
            } else {
                let content_type = part.content_type.as_deref().unwrap_or(DEFAULT_CONTENT_TYPE);
                request
                    .uploads
                    .push(Upload::new(&part.name, content_type, part.bytes)?);
            }
        }
        Ok(request)
    }

    /// Encode back into parts, `data` first.
    pub fn to_parts(&self) -> Result<Vec<Part>, EngineError> {
        let mut parts = Vec::with_capacity(self.uploads.len() + 1);
        if let Some(patch) = &self.patch {
            let bytes = serde_json::to_vec(patch)
                .map_err(|e| EngineError::Validation(format!("patch is not serializable: {e}")))?;
            parts.push(Part::new(DATA_PART, Some("application/json"), bytes));
        }
        for upload in &self.uploads {
            parts.push(Part::new(
                &upload.path.to_string(),
                Some(&upload.content_type),
                upload.bytes.clone(),
            ));
        }
        Ok(parts)
    }
}
