use chrono::{Duration, NaiveDate};
use sitedeck_core::analytics::{DateRange, MetricsRow};
use sitedeck_engine::{AnalyticsSource, EngineError, Transcoded, Transcoder};

/// Serves a fixed set of daily rows regardless of the requested range.
#[derive(Debug, Clone, Default)]
pub struct StaticAnalytics {
    rows: Vec<MetricsRow>,
}

impl StaticAnalytics {
    pub fn new(rows: Vec<MetricsRow>) -> Self {
        Self { rows }
    }

    /// `days` identical days ending at `end`.
    pub fn flat(end: NaiveDate, days: u32, sessions: u64, engaged: u64) -> Self {
        let rows = (0..days)
            .rev()
            .map(|back| MetricsRow {
                date: end - Duration::days(i64::from(back)),
                sessions,
                engaged_sessions: engaged,
                active_users: sessions * 4 / 5,
                page_views: sessions * 3,
                avg_session_secs: 75.0,
            })
            .collect();
        Self { rows }
    }
}

impl AnalyticsSource for StaticAnalytics {
    fn fetch(&self, _range: DateRange) -> Result<Vec<MetricsRow>, EngineError> {
        Ok(self.rows.clone())
    }
}

/// Rejects one content type, passes everything else through.
#[derive(Debug, Clone)]
pub struct FailingTranscoder {
    pub reject: String,
}

impl FailingTranscoder {
    pub fn new(reject: &str) -> Self {
        Self {
            reject: reject.to_string(),
        }
    }
}

impl Transcoder for FailingTranscoder {
    fn transcode(&self, bytes: &[u8], content_type: &str) -> Result<Transcoded, EngineError> {
        if content_type == self.reject {
            return Err(EngineError::Upload(format!("cannot decode {content_type}")));
        }
        Ok(Transcoded {
            bytes: bytes.to_vec(),
            content_type: content_type.to_string(),
        })
    }
}

/// Tags PNG and JPEG uploads as WebP, leaving other types alone.
#[derive(Debug, Clone, Copy, Default)]
pub struct WebpTranscoder;

impl Transcoder for WebpTranscoder {
    fn transcode(&self, bytes: &[u8], content_type: &str) -> Result<Transcoded, EngineError> {
        match content_type {
            "image/png" | "image/jpeg" => {
                let mut out = b"RIFFWEBP".to_vec();
                out.extend_from_slice(bytes);
                Ok(Transcoded {
                    bytes: out,
                    content_type: "image/webp".to_string(),
                })
            }
            _ => Ok(Transcoded {
                bytes: bytes.to_vec(),
                content_type: content_type.to_string(),
            }),
        }
    }
}
