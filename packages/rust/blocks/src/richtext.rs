//! Inline rich-text tokenizer.
//!
//! Splits a single markdown line into styled runs: `**bold**`, `*italic*`,
//! and maximal plain spans. This is a lexical pass, not a grammar — no
//! escaping, no nesting, no delimiters spanning lines. A `*` that does not
//! open a terminated run is kept as ordinary plain content, so
//! concatenating all run contents always reproduces the input line with the
//! recognized emphasis markers removed.

use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// StyledRun
// ---------------------------------------------------------------------------

/// A contiguous span of text sharing one emphasis style.
///
/// The source markup never produces `bold` and `italic` simultaneously —
/// combined bold-italic markup is not recognized.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StyledRun {
    /// Run text with delimiters stripped.
    pub content: String,
    /// Set for `**…**` runs.
    #[serde(default)]
    pub bold: bool,
    /// Set for `*…*` runs.
    #[serde(default)]
    pub italic: bool,
}

impl StyledRun {
    /// An unstyled run.
    pub fn plain(content: impl Into<String>) -> Self {
        Self {
            content: content.into(),
            bold: false,
            italic: false,
        }
    }

    /// A bold run.
    pub fn bold(content: impl Into<String>) -> Self {
        Self {
            content: content.into(),
            bold: true,
            italic: false,
        }
    }

    /// An italic run.
    pub fn italic(content: impl Into<String>) -> Self {
        Self {
            content: content.into(),
            bold: false,
            italic: true,
        }
    }
}

// ---------------------------------------------------------------------------
// Tokenizer
// ---------------------------------------------------------------------------

/// Tokenize one line into styled runs, in emission order.
///
/// Recognition priority at each position: a `**…**` bold run, then a
/// `*…*` italic run, then plain text up to the next candidate delimiter.
/// An empty line yields no runs.
pub fn tokenize(line: &str) -> Vec<StyledRun> {
    let bytes = line.as_bytes();
    let mut runs: Vec<StyledRun> = Vec::new();
    let mut plain_start = 0;
    let mut pos = 0;

    // Close out the pending plain span, if any.
    fn flush_plain(runs: &mut Vec<StyledRun>, line: &str, start: usize, end: usize) {
        if end > start {
            runs.push(StyledRun::plain(&line[start..end]));
        }
    }

    while pos < bytes.len() {
        if bytes[pos] != b'*' {
            pos += 1;
            continue;
        }

        // Bold: `**` with a terminating `**` somewhere after.
        if bytes[pos..].starts_with(b"**") {
            if let Some(rel) = find_delim(&line[pos + 2..], "**") {
                flush_plain(&mut runs, line, plain_start, pos);
                runs.push(StyledRun::bold(&line[pos + 2..pos + 2 + rel]));
                pos += 2 + rel + 2;
                plain_start = pos;
                continue;
            }
        }

        // Italic: `*` with a terminating `*` somewhere after.
        if let Some(rel) = find_delim(&line[pos + 1..], "*") {
            flush_plain(&mut runs, line, plain_start, pos);
            runs.push(StyledRun::italic(&line[pos + 1..pos + 1 + rel]));
            pos += 1 + rel + 1;
            plain_start = pos;
            continue;
        }

        // Unterminated delimiter: fold the `*` into the plain span.
        pos += 1;
    }

    flush_plain(&mut runs, line, plain_start, bytes.len());
    runs
}

/// Byte offset of the next occurrence of `delim` in `haystack`.
fn find_delim(haystack: &str, delim: &str) -> Option<usize> {
    haystack.find(delim)
}
