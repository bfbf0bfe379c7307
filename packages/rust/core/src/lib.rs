//! Pipeline orchestration and external collaborators for Atlas.
//!
//! This crate ties together caption fetching, sectioning, LLM agents, the
//! block compiler, and Notion publishing into the end-to-end `run`
//! workflow, persisting each stage as a JSON file along the way.

pub mod agents;
pub mod notion;
pub mod pipeline;
pub mod stages;
