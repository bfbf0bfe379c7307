//! Section segmenter.
//!
//! Groups a flat, ordered sequence of caption fragments into contiguous
//! time-bounded sections. The invariant this module exists to preserve:
//! every fragment lands in exactly one section, in original order, and the
//! sections tile the accumulated-duration axis with no gaps or overlaps.

use tracing::debug;

use atlas_shared::{Section, TranscriptFragment};

/// Nominal section length in seconds (five minutes).
pub const DEFAULT_WINDOW_SECS: f64 = 300.0;

/// Partition `fragments` into sections of roughly `window_secs` each.
///
/// A running clock accumulates fragment durations; once a section has
/// covered at least `window_secs` it is closed and the next one opens at
/// the same instant. The final section is flushed even when it is shorter
/// than the window. Empty input yields no sections; a single fragment
/// longer than the window yields a single section.
pub fn segment(fragments: &[TranscriptFragment], window_secs: f64) -> Vec<Section> {
    let mut sections: Vec<Section> = Vec::new();
    let mut buffer: Vec<&str> = Vec::new();
    let mut section_start = 0.0_f64;
    let mut clock = 0.0_f64;

    for fragment in fragments {
        clock += fragment.duration;
        buffer.push(&fragment.text);

        if clock - section_start >= window_secs {
            sections.push(Section::new(section_start, clock, buffer.join(" ")));
            section_start = clock;
            buffer.clear();
        }
    }

    // Whatever is left becomes one final, possibly undersized section.
    if !buffer.is_empty() {
        sections.push(Section::new(section_start, clock, buffer.join(" ")));
    }

    debug!(
        fragments = fragments.len(),
        sections = sections.len(),
        total_secs = clock,
        "segmented transcript"
    );

    sections
}
