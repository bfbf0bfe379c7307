//! End-to-end `run` pipeline: video → captions → sections → summaries →
//! formatted markdown → research → blocks → published page.
//!
//! Every external collaborator (caption source, LLM agents, page
//! publisher) comes in through a trait, so the pipeline itself stays a
//! deterministic orchestration over in-memory values plus stage files.

use std::collections::BTreeMap;
use std::path::PathBuf;
use std::time::{Duration, Instant};

use chrono::{DateTime, Utc};
use tracing::{info, instrument, warn};

use atlas_blocks::Block;
use atlas_shared::{AtlasError, Result, Section};
use atlas_transcript::{TranscriptSource, VideoId, segment};

use crate::agents::{ChatAgent, extract_topics};
use crate::notion::PagePublisher;
use crate::stages::{self, Stage};

// ---------------------------------------------------------------------------
// Configuration and results
// ---------------------------------------------------------------------------

/// Configuration for one pipeline run.
#[derive(Debug, Clone)]
pub struct PipelineConfig {
    /// The video to process.
    pub video: VideoId,
    /// Directory for stage files.
    pub output_dir: PathBuf,
    /// Nominal section window in seconds.
    pub window_secs: f64,
    /// Maximum number of research topics.
    pub max_topics: usize,
    /// Page title override; defaults to a title derived from the video id.
    pub page_title: Option<String>,
}

/// Result of a completed pipeline run.
#[derive(Debug)]
pub struct RunResult {
    /// Reference to the created page (URL or id).
    pub page_ref: String,
    /// Number of sections produced by the segmenter.
    pub section_count: usize,
    /// Number of blocks published.
    pub block_count: usize,
    /// Topics that were researched.
    pub topics: Vec<String>,
    /// When the run finished.
    pub completed_at: DateTime<Utc>,
    /// Total elapsed time.
    pub elapsed: Duration,
}

/// The three LLM agents the pipeline drives.
pub struct AgentSet<S, F, R> {
    pub summarizer: S,
    pub formatter: F,
    pub researcher: R,
}

// ---------------------------------------------------------------------------
// Progress reporting
// ---------------------------------------------------------------------------

/// Progress callback for reporting pipeline status.
pub trait ProgressReporter: Send + Sync {
    /// Called when entering a new phase.
    fn phase(&self, name: &str);
    /// Called when one item (section or topic) of a phase completes.
    fn item_done(&self, stage: &str, current: usize, total: usize);
    /// Called when the pipeline completes.
    fn done(&self, result: &RunResult);
}

/// No-op progress reporter for headless/test usage.
pub struct SilentProgress;

impl ProgressReporter for SilentProgress {
    fn phase(&self, _name: &str) {}
    fn item_done(&self, _stage: &str, _current: usize, _total: usize) {}
    fn done(&self, _result: &RunResult) {}
}

// ---------------------------------------------------------------------------
// Pipeline
// ---------------------------------------------------------------------------

/// Run the full pipeline.
///
/// 1. Fetch captions
/// 2. Segment into sections
/// 3. Summarize each section
/// 4. Format each summary
/// 5. Research extracted topics
/// 6. Compile markdown to blocks
/// 7. Publish the page
///
/// Each stage persists its output under `config.output_dir` before the
/// next stage begins.
#[instrument(skip_all, fields(video = %config.video))]
pub async fn run_pipeline<T, S, F, R, P>(
    config: &PipelineConfig,
    source: &T,
    agents: &AgentSet<S, F, R>,
    publisher: &P,
    progress: &dyn ProgressReporter,
) -> Result<RunResult>
where
    T: TranscriptSource,
    S: ChatAgent,
    F: ChatAgent,
    R: ChatAgent,
    P: PagePublisher,
{
    let start = Instant::now();
    let video = &config.video;

    // --- Phase 1: captions ---
    progress.phase("Fetching captions");
    let fragments = source.fetch(video).await?;
    stages::save(&config.output_dir, Stage::Fragments, video, &fragments)?;

    // --- Phase 2: sections ---
    progress.phase("Segmenting transcript");
    let mut sections = segment(&fragments, config.window_secs);
    if sections.is_empty() {
        return Err(AtlasError::transcript(format!(
            "video {video} produced no transcript sections"
        )));
    }
    stages::save(&config.output_dir, Stage::Sections, video, &sections)?;
    info!(sections = sections.len(), "transcript segmented");

    // --- Phase 3: summarize ---
    progress.phase("Summarizing sections");
    let total = sections.len();
    for (i, section) in sections.iter_mut().enumerate() {
        let summary = agents.summarizer.run(&section.text).await?;
        section.summary = Some(summary);
        progress.item_done("summarize", i + 1, total);
    }
    stages::save(&config.output_dir, Stage::Summarized, video, &sections)?;

    // --- Phase 4: format ---
    progress.phase("Formatting summaries");
    for (i, section) in sections.iter_mut().enumerate() {
        let Some(summary) = section.summary.as_deref() else {
            warn!(section = i, "section has no summary, skipping format");
            continue;
        };
        let formatted = agents.formatter.run(summary).await?;
        section.formatted_summary = Some(formatted);
        progress.item_done("format", i + 1, total);
    }
    stages::save(&config.output_dir, Stage::Formatted, video, &sections)?;

    // --- Phase 5: research ---
    progress.phase("Researching topics");
    let topics = extract_topics(&sections, config.max_topics);
    let mut research: BTreeMap<String, String> = BTreeMap::new();
    for (i, topic) in topics.iter().enumerate() {
        let prompt = format!("Research and explain the topic: {topic}");
        let enrichment = agents.researcher.run(&prompt).await?;
        research.insert(topic.clone(), enrichment);
        progress.item_done("research", i + 1, topics.len());
    }
    stages::save(&config.output_dir, Stage::Research, video, &research)?;

    // --- Phase 6: compile ---
    progress.phase("Compiling blocks");
    let blocks = compile_document(&sections, &research);
    if blocks.is_empty() {
        return Err(AtlasError::validation(
            "compilation produced no blocks to publish",
        ));
    }
    stages::save(&config.output_dir, Stage::Blocks, video, &blocks)?;

    // --- Phase 7: publish ---
    progress.phase("Publishing page");
    let title = config
        .page_title
        .clone()
        .unwrap_or_else(|| format!("Atlas Summary: YouTube Video {video}"));
    let page_ref = publisher.publish(&title, &blocks).await?;

    let result = RunResult {
        page_ref,
        section_count: sections.len(),
        block_count: blocks.len(),
        topics,
        completed_at: Utc::now(),
        elapsed: start.elapsed(),
    };

    info!(
        page = %result.page_ref,
        sections = result.section_count,
        blocks = result.block_count,
        elapsed_ms = result.elapsed.as_millis() as u64,
        "pipeline complete"
    );
    progress.done(&result);
    Ok(result)
}

/// Compile all formatted sections — and any research enrichment — into one
/// ordered block sequence.
///
/// Sections that never received a formatted summary are skipped. Research
/// entries are appended after the sections, separated by a divider, in
/// topic order.
pub fn compile_document(sections: &[Section], research: &BTreeMap<String, String>) -> Vec<Block> {
    let mut blocks: Vec<Block> = Vec::new();

    for section in sections {
        let Some(text) = section.formatted_summary.as_deref() else {
            continue;
        };
        blocks.extend(atlas_blocks::compile(text));
    }

    if !research.is_empty() {
        blocks.push(Block::Divider);
        for enrichment in research.values() {
            blocks.extend(atlas_blocks::compile(enrichment));
        }
    }

    blocks
}
