//! Core domain types shared across the Atlas pipeline.

use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// TranscriptFragment
// ---------------------------------------------------------------------------

/// One caption entry as returned by the transcript source.
///
/// Fragments are an ordered, immutable input: the segmenter never drops,
/// duplicates, or reorders them.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TranscriptFragment {
    /// Caption text for this fragment.
    pub text: String,
    /// Absolute start offset in seconds from the beginning of the video.
    #[serde(default)]
    pub start: f64,
    /// Duration of the fragment in seconds.
    pub duration: f64,
}

impl TranscriptFragment {
    /// Convenience constructor used heavily in tests.
    pub fn new(text: impl Into<String>, start: f64, duration: f64) -> Self {
        Self {
            text: text.into(),
            start,
            duration,
        }
    }
}

// ---------------------------------------------------------------------------
// Section
// ---------------------------------------------------------------------------

/// A contiguous, time-bounded grouping of transcript text.
///
/// `start`/`end`/`text` are the persisted stage-file contract: sections
/// partition the fragment sequence with no gaps or overlaps, in original
/// order, and `text` is the space-joined concatenation of fragment texts.
/// The optional fields are filled in by later pipeline stages and round-trip
/// through the stage files untouched when absent.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Section {
    /// Accumulated-duration offset at which this section opens.
    pub start: f64,
    /// Accumulated-duration offset at which this section closes.
    pub end: f64,
    /// Space-joined transcript text of the constituent fragments.
    pub text: String,
    /// Markdown summary produced by the summarizer agent.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub summary: Option<String>,
    /// Polished markdown produced by the formatter agent.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub formatted_summary: Option<String>,
}

impl Section {
    /// Build a bare section with no enrichment fields.
    pub fn new(start: f64, end: f64, text: impl Into<String>) -> Self {
        Self {
            start,
            end,
            text: text.into(),
            summary: None,
            formatted_summary: None,
        }
    }

    /// Duration covered by this section in seconds.
    pub fn duration(&self) -> f64 {
        self.end - self.start
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fragment_roundtrip() {
        let frag = TranscriptFragment::new("hello world", 1.5, 3.2);
        let json = serde_json::to_string(&frag).expect("serialize");
        let parsed: TranscriptFragment = serde_json::from_str(&json).expect("deserialize");
        assert_eq!(frag, parsed);
    }

    #[test]
    fn fragment_start_defaults_to_zero() {
        let parsed: TranscriptFragment =
            serde_json::from_str(r#"{"text":"a","duration":2.0}"#).expect("deserialize");
        assert_eq!(parsed.start, 0.0);
    }

    #[test]
    fn section_omits_empty_enrichment_fields() {
        let section = Section::new(0.0, 310.0, "transcript text");
        let json = serde_json::to_string(&section).expect("serialize");
        assert!(!json.contains("summary"));
        assert!(!json.contains("formatted_summary"));
    }

    #[test]
    fn section_preserves_enrichment_fields() {
        let mut section = Section::new(0.0, 310.0, "transcript text");
        section.summary = Some("## Summary\nA summary.".into());
        let json = serde_json::to_string(&section).expect("serialize");
        let parsed: Section = serde_json::from_str(&json).expect("deserialize");
        assert_eq!(parsed.summary.as_deref(), Some("## Summary\nA summary."));
        assert_eq!(parsed.formatted_summary, None);
    }

    #[test]
    fn section_duration() {
        let section = Section::new(300.0, 612.5, "x");
        assert!((section.duration() - 312.5).abs() < f64::EPSILON);
    }
}
