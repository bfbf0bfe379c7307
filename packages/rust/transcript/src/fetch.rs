//! Caption retrieval boundary.
//!
//! The pipeline never talks to YouTube directly; it goes through
//! [`TranscriptSource`], which has a live HTTP implementation
//! ([`TimedTextClient`]) and a JSON-file replay implementation
//! ([`JsonFileSource`]) used for offline runs and tests.

use std::path::PathBuf;
use std::sync::LazyLock;
use std::time::Duration;

use regex::Regex;
use tracing::{debug, info, warn};

use atlas_shared::{AtlasError, Result, TranscriptFragment};

use crate::video::VideoId;

/// Matches one `<text start="…" dur="…">…</text>` caption entry in the
/// timedtext XML payload.
static CAPTION_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"(?s)<text start="([0-9.]+)" dur="([0-9.]+)"[^>]*>(.*?)</text>"#)
        .expect("caption regex")
});

// ---------------------------------------------------------------------------
// TranscriptSource
// ---------------------------------------------------------------------------

/// A source of ordered caption fragments for a video.
#[allow(async_fn_in_trait)]
pub trait TranscriptSource {
    /// Fetch all caption fragments for `id`, in playback order.
    async fn fetch(&self, id: &VideoId) -> Result<Vec<TranscriptFragment>>;
}

// ---------------------------------------------------------------------------
// TimedTextClient
// ---------------------------------------------------------------------------

/// Live caption client against YouTube's timedtext endpoint.
pub struct TimedTextClient {
    client: reqwest::Client,
    base_url: String,
    language: String,
}

impl TimedTextClient {
    /// Create a client for the given caption language (e.g. `"en"`).
    pub fn new(language: impl Into<String>) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(30))
            .build()
            .map_err(|e| AtlasError::Network(format!("failed to build HTTP client: {e}")))?;

        Ok(Self {
            client,
            base_url: "https://video.google.com/timedtext".to_string(),
            language: language.into(),
        })
    }

    /// Override the endpoint base URL (used by tests).
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }
}

impl TranscriptSource for TimedTextClient {
    async fn fetch(&self, id: &VideoId) -> Result<Vec<TranscriptFragment>> {
        info!(video = %id, lang = %self.language, "fetching captions");

        let response = self
            .client
            .get(&self.base_url)
            .query(&[("lang", self.language.as_str()), ("v", id.as_str())])
            .send()
            .await
            .map_err(|e| AtlasError::Network(format!("timedtext request failed: {e}")))?;

        let status = response.status();
        if !status.is_success() {
            return Err(AtlasError::Network(format!(
                "timedtext returned HTTP {status}"
            )));
        }

        let body = response
            .text()
            .await
            .map_err(|e| AtlasError::Network(format!("failed to read timedtext body: {e}")))?;

        let fragments = parse_timedtext(&body);
        if fragments.is_empty() {
            warn!(video = %id, "no captions in timedtext response");
            return Err(AtlasError::transcript(format!(
                "no captions found for video {id} (disabled or unavailable?)"
            )));
        }

        debug!(fragments = fragments.len(), "parsed caption payload");
        Ok(fragments)
    }
}

/// Parse a timedtext XML payload into ordered fragments.
///
/// Entries that fail numeric parsing are skipped rather than failing the
/// whole fetch.
fn parse_timedtext(body: &str) -> Vec<TranscriptFragment> {
    CAPTION_RE
        .captures_iter(body)
        .filter_map(|caps| {
            let start: f64 = caps[1].parse().ok()?;
            let duration: f64 = caps[2].parse().ok()?;
            let text = decode_entities(&caps[3]);
            let text = text.trim();
            if text.is_empty() {
                return None;
            }
            Some(TranscriptFragment::new(text, start, duration))
        })
        .collect()
}

/// Decode the handful of XML/HTML entities the timedtext payload uses.
fn decode_entities(text: &str) -> String {
    text.replace("&amp;", "&")
        .replace("&lt;", "<")
        .replace("&gt;", ">")
        .replace("&quot;", "\"")
        .replace("&#39;", "'")
        .replace("&apos;", "'")
}

// ---------------------------------------------------------------------------
// JsonFileSource
// ---------------------------------------------------------------------------

/// Replays a persisted fragment JSON file instead of hitting the network.
pub struct JsonFileSource {
    path: PathBuf,
}

impl JsonFileSource {
    /// Serve fragments from the JSON array at `path`.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

impl TranscriptSource for JsonFileSource {
    async fn fetch(&self, _id: &VideoId) -> Result<Vec<TranscriptFragment>> {
        let content = std::fs::read_to_string(&self.path)
            .map_err(|e| AtlasError::io(&self.path, e))?;

        serde_json::from_str(&content).map_err(|e| {
            AtlasError::parse(format!(
                "invalid fragment file {}: {e}",
                self.path.display()
            ))
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = r#"<?xml version="1.0" encoding="utf-8"?>
<transcript>
  <text start="0.0" dur="2.5">hello everyone</text>
  <text start="2.5" dur="3.1">today we&#39;re talking about &amp; parsing</text>
  <text start="5.6" dur="1.9">x &lt; y &gt; z</text>
</transcript>"#;

    #[test]
    fn parses_timedtext_payload() {
        let fragments = parse_timedtext(SAMPLE);
        assert_eq!(fragments.len(), 3);
        assert_eq!(fragments[0].text, "hello everyone");
        assert_eq!(fragments[0].start, 0.0);
        assert_eq!(fragments[0].duration, 2.5);
        assert_eq!(fragments[1].text, "today we're talking about & parsing");
        assert_eq!(fragments[2].text, "x < y > z");
    }

    #[test]
    fn empty_payload_yields_no_fragments() {
        assert!(parse_timedtext("<transcript></transcript>").is_empty());
        assert!(parse_timedtext("").is_empty());
    }

    #[test]
    fn skips_blank_caption_entries() {
        let payload = r#"<text start="0.0" dur="1.0">   </text><text start="1.0" dur="1.0">ok</text>"#;
        let fragments = parse_timedtext(payload);
        assert_eq!(fragments.len(), 1);
        assert_eq!(fragments[0].text, "ok");
    }

    #[tokio::test]
    async fn json_file_source_roundtrip() {
        let dir = std::env::temp_dir().join("atlas-transcript-test");
        std::fs::create_dir_all(&dir).expect("create temp dir");
        let path = dir.join("fragments.json");
        std::fs::write(
            &path,
            r#"[{"text":"a","start":0.0,"duration":2.0},{"text":"b","start":2.0,"duration":3.0}]"#,
        )
        .expect("write fixture");

        let id: VideoId = "dQw4w9WgXcQ".parse().expect("id");
        let fragments = JsonFileSource::new(&path).fetch(&id).await.expect("fetch");
        assert_eq!(fragments.len(), 2);
        assert_eq!(fragments[1].text, "b");
    }

    #[tokio::test]
    async fn json_file_source_missing_file_is_io_error() {
        let id: VideoId = "dQw4w9WgXcQ".parse().expect("id");
        let result = JsonFileSource::new("/nonexistent/fragments.json")
            .fetch(&id)
            .await;
        assert!(matches!(result, Err(AtlasError::Io { .. })));
    }
}
