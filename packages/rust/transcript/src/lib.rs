//! Transcript acquisition and time-bounded sectioning.
//!
//! This crate owns the upstream half of the pipeline:
//! - [`VideoId`] — parse a YouTube URL or bare id
//! - [`TranscriptSource`] — the caption-retrieval boundary, with a live
//!   timedtext client and a JSON-file replay source
//! - [`segment`] — group caption fragments into contiguous sections

pub mod fetch;
pub mod segment;
pub mod video;

pub use fetch::{JsonFileSource, TimedTextClient, TranscriptSource};
pub use segment::{DEFAULT_WINDOW_SECS, segment};
pub use video::VideoId;
