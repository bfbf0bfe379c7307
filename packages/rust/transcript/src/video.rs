//! YouTube video id extraction.
//!
//! Accepts full watch URLs (`youtube.com/watch?v=…`, `youtu.be/…`,
//! `youtube.com/embed/…`) or a bare 11-character id.

use std::str::FromStr;
use std::sync::LazyLock;

use regex::Regex;
use url::Url;

use atlas_shared::{AtlasError, Result};

/// Matches a bare 11-character YouTube video id.
static ID_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[a-zA-Z0-9_-]{11}$").expect("id regex"));

// ---------------------------------------------------------------------------
// VideoId
// ---------------------------------------------------------------------------

/// A validated 11-character YouTube video identifier.
#[derive(Debug, Clone, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
#[serde(transparent)]
pub struct VideoId(String);

impl VideoId {
    /// The raw id string.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for VideoId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for VideoId {
    type Err = AtlasError;

    fn from_str(s: &str) -> Result<Self> {
        let input = s.trim();

        if ID_RE.is_match(input) {
            return Ok(Self(input.to_string()));
        }

        if let Some(id) = extract_from_url(input) {
            return Ok(Self(id));
        }

        Err(AtlasError::parse(format!(
            "not a YouTube URL or video id: {input}"
        )))
    }
}

/// Pull the video id out of a known YouTube URL shape.
fn extract_from_url(input: &str) -> Option<String> {
    // Tolerate scheme-less input like `youtube.com/watch?v=…`.
    let url = Url::parse(input)
        .or_else(|_| Url::parse(&format!("https://{input}")))
        .ok()?;

    let host = url.host_str()?.trim_start_matches("www.");

    let candidate = match host {
        "youtu.be" => url.path_segments()?.next().map(str::to_string),
        "youtube.com" | "m.youtube.com" | "music.youtube.com" => {
            if let Some((_, v)) = url.query_pairs().find(|(k, _)| k == "v") {
                Some(v.into_owned())
            } else {
                // `/embed/<id>` and `/shorts/<id>` carry the id in the path.
                let mut segments = url.path_segments()?;
                match segments.next() {
                    Some("embed") | Some("shorts") | Some("v") => {
                        segments.next().map(str::to_string)
                    }
                    _ => None,
                }
            }
        }
        _ => None,
    }?;

    ID_RE.is_match(&candidate).then_some(candidate)
}
