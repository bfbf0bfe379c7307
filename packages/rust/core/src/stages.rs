//! Stage-file persistence.
//!
//! Every pipeline stage writes its output as JSON under the output
//! directory, keyed by video id (`sections_<id>.json`,
//! `summarized_sections_<id>.json`, …). Later stages — and the individual
//! CLI subcommands — pick up where the files left off, so a run can be
//! resumed or re-driven stage by stage.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use serde::Serialize;
use serde::de::DeserializeOwned;
use tracing::{debug, info};

use atlas_blocks::Block;
use atlas_shared::{AtlasError, Result, Section};
use atlas_transcript::VideoId;

// ---------------------------------------------------------------------------
// Stage
// ---------------------------------------------------------------------------

/// One persisted pipeline stage.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    /// Raw caption fragments, as fetched.
    Fragments,
    /// Time-bounded sections.
    Sections,
    /// Sections with `summary` filled in.
    Summarized,
    /// Sections with `formatted_summary` filled in.
    Formatted,
    /// Topic → enrichment markdown map.
    Research,
    /// Compiled block sequence.
    Blocks,
}

impl Stage {
    /// File-name prefix for this stage.
    pub fn prefix(&self) -> &'static str {
        match self {
            Self::Fragments => "fragments",
            Self::Sections => "sections",
            Self::Summarized => "summarized_sections",
            Self::Formatted => "formatted_sections",
            Self::Research => "research_enrichment",
            Self::Blocks => "blocks",
        }
    }

    /// Stage-file path for a given video under `output_dir`.
    pub fn path(&self, output_dir: &Path, video: &VideoId) -> PathBuf {
        output_dir.join(format!("{}_{video}.json", self.prefix()))
    }
}

// ---------------------------------------------------------------------------
// Generic JSON persistence
// ---------------------------------------------------------------------------

/// Write `value` as pretty JSON to the stage file for `video`.
pub fn save<T: Serialize>(
    output_dir: &Path,
    stage: Stage,
    video: &VideoId,
    value: &T,
) -> Result<PathBuf> {
    std::fs::create_dir_all(output_dir).map_err(|e| AtlasError::io(output_dir, e))?;

    let path = stage.path(output_dir, video);
    let content = serde_json::to_string_pretty(value)
        .map_err(|e| AtlasError::validation(format!("failed to serialize stage: {e}")))?;

    std::fs::write(&path, content).map_err(|e| AtlasError::io(&path, e))?;
    info!(stage = stage.prefix(), path = %path.display(), "stage file written");
    Ok(path)
}

/// Load the stage file for `video`.
pub fn load<T: DeserializeOwned>(output_dir: &Path, stage: Stage, video: &VideoId) -> Result<T> {
    let path = stage.path(output_dir, video);
    let content = std::fs::read_to_string(&path).map_err(|e| AtlasError::io(&path, e))?;

    debug!(stage = stage.prefix(), path = %path.display(), "stage file loaded");
    serde_json::from_str(&content)
        .map_err(|e| AtlasError::parse(format!("invalid stage file {}: {e}", path.display())))
}

/// Find the video id of the most recently modified stage file with the
/// given prefix. Used when a subcommand is run without an explicit video.
pub fn discover_video(output_dir: &Path, stage: Stage) -> Result<VideoId> {
    let prefix = format!("{}_", stage.prefix());
    let entries = std::fs::read_dir(output_dir).map_err(|e| AtlasError::io(output_dir, e))?;

    let mut newest: Option<(std::time::SystemTime, VideoId)> = None;
    for entry in entries {
        let entry = entry.map_err(|e| AtlasError::io(output_dir, e))?;
        let name = entry.file_name().to_string_lossy().into_owned();

        let Some(id_part) = name
            .strip_prefix(&prefix)
            .and_then(|rest| rest.strip_suffix(".json"))
        else {
            continue;
        };
        let Ok(video) = id_part.parse::<VideoId>() else {
            continue;
        };

        let modified = entry
            .metadata()
            .and_then(|m| m.modified())
            .unwrap_or(std::time::SystemTime::UNIX_EPOCH);

        if newest.as_ref().is_none_or(|(t, _)| modified > *t) {
            newest = Some((modified, video));
        }
    }

    newest.map(|(_, video)| video).ok_or_else(|| {
        AtlasError::validation(format!(
            "no {prefix}*.json stage file found in {}",
            output_dir.display()
        ))
    })
}

// ---------------------------------------------------------------------------
// Typed helpers
// ---------------------------------------------------------------------------

/// Load a section list from any of the section-shaped stages.
pub fn load_sections(output_dir: &Path, stage: Stage, video: &VideoId) -> Result<Vec<Section>> {
    load(output_dir, stage, video)
}

/// Load the topic → enrichment markdown map.
pub fn load_research(output_dir: &Path, video: &VideoId) -> Result<BTreeMap<String, String>> {
    load(output_dir, Stage::Research, video)
}

/// Load the compiled block sequence.
pub fn load_blocks(output_dir: &Path, video: &VideoId) -> Result<Vec<Block>> {
    load(output_dir, Stage::Blocks, video)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn temp_output_dir(name: &str) -> PathBuf {
        let dir = std::env::temp_dir().join("atlas-stages-test").join(name);
        let _ = std::fs::remove_dir_all(&dir);
        std::fs::create_dir_all(&dir).expect("create temp dir");
        dir
    }

    fn video() -> VideoId {
        "dQw4w9WgXcQ".parse().expect("video id")
    }

    #[test]
    fn stage_paths_match_the_naming_scheme() {
        let path = Stage::Summarized.path(Path::new("out"), &video());
        assert_eq!(
            path,
            Path::new("out").join("summarized_sections_dQw4w9WgXcQ.json")
        );
    }

    #[test]
    fn section_stage_roundtrip() {
        let dir = temp_output_dir("roundtrip");
        let sections = vec![Section::new(0.0, 310.0, "first"), {
            let mut s = Section::new(310.0, 620.0, "second");
            s.summary = Some("## Summary\nSecond section.".into());
            s
        }];

        save(&dir, Stage::Summarized, &video(), &sections).expect("save");
        let loaded = load_sections(&dir, Stage::Summarized, &video()).expect("load");
        assert_eq!(loaded, sections);
    }

    #[test]
    fn blocks_stage_roundtrip() {
        let dir = temp_output_dir("blocks");
        let blocks = atlas_blocks::compile("# Title\n\ntext");
        save(&dir, Stage::Blocks, &video(), &blocks).expect("save");
        assert_eq!(load_blocks(&dir, &video()).expect("load"), blocks);
    }

    #[test]
    fn research_stage_roundtrip() {
        let dir = temp_output_dir("research");
        let mut research = BTreeMap::new();
        research.insert("recursion".to_string(), "## Enrichment: Recursion".to_string());
        save(&dir, Stage::Research, &video(), &research).expect("save");
        assert_eq!(load_research(&dir, &video()).expect("load"), research);
    }

    #[test]
    fn discover_finds_the_stage_video() {
        let dir = temp_output_dir("discover");
        save(&dir, Stage::Sections, &video(), &Vec::<Section>::new()).expect("save");
        // A different stage's file must not be picked up.
        save(&dir, Stage::Blocks, &video(), &Vec::<Block>::new()).expect("save");

        let found = discover_video(&dir, Stage::Sections).expect("discover");
        assert_eq!(found, video());
    }

    #[test]
    fn discover_with_no_files_is_an_error() {
        let dir = temp_output_dir("empty");
        let result = discover_video(&dir, Stage::Formatted);
        assert!(result.is_err());
        assert!(
            result
                .unwrap_err()
                .to_string()
                .contains("formatted_sections_")
        );
    }

    #[test]
    fn missing_stage_file_is_io_error() {
        let dir = temp_output_dir("missing");
        let result = load_sections(&dir, Stage::Sections, &video());
        assert!(matches!(result, Err(AtlasError::Io { .. })));
    }
}
