use crate::error::EngineError;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Transcoded {
    pub bytes: Vec<u8>,
    pub content_type: String,
}

/// Converts uploaded files before they are stored, e.g. raster images to WebP.
pub trait Transcoder {
    fn transcode(&self, bytes: &[u8], content_type: &str) -> Result<Transcoded, EngineError>;
}

/// Stores uploads unchanged.
#[derive(Debug, Clone, Copy, Default)]
pub struct PassthroughTranscoder;

impl Transcoder for PassthroughTranscoder {
    fn transcode(&self, bytes: &[u8], content_type: &str) -> Result<Transcoded, EngineError> {
        Ok(Transcoded {
            bytes: bytes.to_vec(),
            content_type: content_type.to_string(),
        })
    }
}

/// File extension used in public blob URLs.
pub fn extension_for(content_type: &str) -> &'static str {
    match content_type {
        "image/webp" => "webp",
        "image/avif" => "avif",
        "image/png" => "png",
        "image/jpeg" => "jpg",
        "image/gif" => "gif",
        "image/svg+xml" => "svg",
        "application/pdf" => "pdf",
        "video/mp4" => "mp4",
        _ => "bin",
    }
}
