//! Line classifier and code-fence state machine.
//!
//! Walks the document line by line, classifying each line into a block
//! kind. Fence state takes absolute precedence over content classification:
//! while inside a fence every line is buffered verbatim until the closing
//! marker, at which point a single code block is emitted. A fence opened
//! but never closed emits nothing — its buffered lines are discarded.

use tracing::{debug, trace};

use crate::lang::normalize_language;
use crate::richtext::tokenize;
use crate::Block;

/// Maximum content length of a single styled run, imposed by the Notion
/// API. Paragraph lines longer than this are split into multiple blocks.
pub const MAX_RUN_LEN: usize = 2000;

/// Fence marker prefix.
const FENCE: &str = "```";

// ---------------------------------------------------------------------------
// State machine
// ---------------------------------------------------------------------------

/// Compiler state: either classifying lines, or buffering a fenced region.
enum State {
    Normal,
    InFence {
        language: String,
        buffer: Vec<String>,
    },
}

/// Compile a markdown document into an ordered block sequence.
pub(crate) fn compile(document: &str) -> Vec<Block> {
    let mut blocks: Vec<Block> = Vec::new();
    let mut state = State::Normal;

    for line in document.lines() {
        state = match state {
            State::InFence { language, buffer } => {
                if line.starts_with(FENCE) {
                    blocks.push(Block::Code {
                        text: buffer.join("\n"),
                        language,
                    });
                    State::Normal
                } else {
                    let mut buffer = buffer;
                    buffer.push(line.to_string());
                    State::InFence { language, buffer }
                }
            }
            State::Normal => {
                if let Some(hint) = line.strip_prefix(FENCE) {
                    State::InFence {
                        language: normalize_language(hint),
                        buffer: Vec::new(),
                    }
                } else {
                    classify_line(line, &mut blocks);
                    State::Normal
                }
            }
        };
    }

    if let State::InFence { buffer, .. } = state {
        // Unterminated fence: drop the buffered lines rather than guess at
        // a close.
        debug!(dropped_lines = buffer.len(), "unterminated code fence");
    }

    trace!(blocks = blocks.len(), "compiled document");
    blocks
}

// ---------------------------------------------------------------------------
// Line classification
// ---------------------------------------------------------------------------

/// Classify one non-fence line and append the resulting block(s).
///
/// Prefixes are checked in priority order and stripped before tokenizing
/// the remainder. Lines that are empty after trimming emit nothing.
fn classify_line(line: &str, blocks: &mut Vec<Block>) {
    if let Some(rest) = line.strip_prefix("# ") {
        blocks.push(Block::Heading1 {
            rich_text: tokenize(rest.trim()),
        });
    } else if let Some(rest) = line.strip_prefix("## ") {
        blocks.push(Block::Heading2 {
            rich_text: tokenize(rest.trim()),
        });
    } else if let Some(rest) = line.strip_prefix("### ") {
        blocks.push(Block::Heading3 {
            rich_text: tokenize(rest.trim()),
        });
    } else if let Some(rest) = line.strip_prefix("#### ") {
        // No fourth heading level downstream; render as heading_3.
        blocks.push(Block::Heading3 {
            rich_text: tokenize(rest.trim()),
        });
    } else if let Some(rest) = line.strip_prefix("- ") {
        blocks.push(Block::BulletItem {
            rich_text: tokenize(rest.trim()),
        });
    } else if let Some(rest) = line.strip_prefix('•') {
        blocks.push(Block::BulletItem {
            rich_text: tokenize(rest.trim()),
        });
    } else if line.trim() == "---" {
        blocks.push(Block::Divider);
    } else if let Some(rest) = line.strip_prefix("> ") {
        blocks.push(Block::Quote {
            rich_text: tokenize(rest.trim()),
        });
    } else if !line.trim().is_empty() {
        for chunk in chunk_line(line.trim()) {
            blocks.push(Block::Paragraph {
                rich_text: tokenize(chunk),
            });
        }
    }
}

// ---------------------------------------------------------------------------
// Chunking
// ---------------------------------------------------------------------------

/// Split a paragraph line into consecutive substrings of at most
/// [`MAX_RUN_LEN`] characters, on `char` boundaries. The final chunk may be
/// shorter. Lines at or under the limit come back whole.
fn chunk_line(line: &str) -> Vec<&str> {
    let mut chunks = Vec::new();
    let mut start = 0;
    let mut count = 0;

    for (idx, _) in line.char_indices() {
        if count == MAX_RUN_LEN {
            chunks.push(&line[start..idx]);
            start = idx;
            count = 0;
        }
        count += 1;
    }
    chunks.push(&line[start..]);
    chunks
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::richtext::StyledRun;

    #[test]
    fn heading_and_styled_paragraph() {
        let blocks = compile("# Title\n\nSome **bold** and *italic* text.");
        assert_eq!(
            blocks,
            vec![
                Block::Heading1 {
                    rich_text: vec![StyledRun::plain("Title")],
                },
                Block::Paragraph {
                    rich_text: vec![
                        StyledRun::plain("Some "),
                        StyledRun::bold("bold"),
                        StyledRun::plain(" and "),
                        StyledRun::italic("italic"),
                        StyledRun::plain(" text."),
                    ],
                },
            ]
        );
    }

    #[test]
    fn heading_levels() {
        let blocks = compile("## Two\n### Three\n#### Four");
        assert_eq!(blocks.len(), 3);
        assert!(matches!(blocks[0], Block::Heading2 { .. }));
        assert!(matches!(blocks[1], Block::Heading3 { .. }));
        // No heading_4 downstream: #### maps to heading_3.
        assert!(matches!(blocks[2], Block::Heading3 { .. }));
    }

    #[test]
    fn bullets_both_markers() {
        let blocks = compile("- dash item\n• dot item");
        assert_eq!(
            blocks,
            vec![
                Block::BulletItem {
                    rich_text: vec![StyledRun::plain("dash item")],
                },
                Block::BulletItem {
                    rich_text: vec![StyledRun::plain("dot item")],
                },
            ]
        );
    }

    #[test]
    fn divider_and_quote() {
        let blocks = compile("---\n> wise words");
        assert_eq!(blocks[0], Block::Divider);
        assert_eq!(
            blocks[1],
            Block::Quote {
                rich_text: vec![StyledRun::plain("wise words")],
            }
        );
    }

    #[test]
    fn divider_must_be_exact() {
        let blocks = compile("--- not a divider");
        assert!(matches!(blocks[0], Block::Paragraph { .. }));
    }

    #[test]
    fn empty_lines_emit_nothing() {
        assert!(compile("\n\n   \n").is_empty());
    }

    #[test]
    fn code_fence_with_known_language() {
        let blocks = compile("```python\nprint(1)\n```");
        assert_eq!(
            blocks,
            vec![Block::Code {
                text: "print(1)".into(),
                language: "python".into(),
            }]
        );
    }

    #[test]
    fn code_fence_unknown_language_falls_back() {
        let blocks = compile("```klingon\nfoo\n```");
        assert_eq!(
            blocks,
            vec![Block::Code {
                text: "foo".into(),
                language: "plain text".into(),
            }]
        );
    }

    #[test]
    fn code_fence_language_hint_is_case_insensitive() {
        let blocks = compile("```Rust\nfn main() {}\n```");
        assert_eq!(
            blocks,
            vec![Block::Code {
                text: "fn main() {}".into(),
                language: "rust".into(),
            }]
        );
    }

    #[test]
    fn fence_content_is_not_tokenized() {
        let blocks = compile("```\n**not bold**\n# not a heading\n```");
        assert_eq!(
            blocks,
            vec![Block::Code {
                text: "**not bold**\n# not a heading".into(),
                language: "plain text".into(),
            }]
        );
    }

    #[test]
    fn multiline_fence_preserves_order() {
        let blocks = compile("```rust\nline 1\nline 2\nline 3\n```\nafter");
        assert_eq!(
            blocks[0],
            Block::Code {
                text: "line 1\nline 2\nline 3".into(),
                language: "rust".into(),
            }
        );
        assert!(matches!(blocks[1], Block::Paragraph { .. }));
    }

    #[test]
    fn unterminated_fence_emits_nothing() {
        let blocks = compile("before\n```python\nbuffered\nlines");
        assert_eq!(
            blocks,
            vec![Block::Paragraph {
                rich_text: vec![StyledRun::plain("before")],
            }]
        );
    }

    #[test]
    fn compile_is_idempotent() {
        let doc = "# Title\n\n- a\n- b\n\n> quote\n\nclosing text";
        let first = compile(doc);
        let second = compile(doc);
        assert_eq!(first, second);
    }

    #[test]
    fn paragraph_at_limit_is_one_block() {
        let line = "x".repeat(MAX_RUN_LEN);
        let blocks = compile(&line);
        assert_eq!(blocks.len(), 1);
    }

    #[test]
    fn paragraph_chunking_boundary() {
        // 4001 chars must yield exactly three blocks: 2000 + 2000 + 1.
        let line = "y".repeat(2 * MAX_RUN_LEN + 1);
        let blocks = compile(&line);
        assert_eq!(blocks.len(), 3);

        let lens: Vec<usize> = blocks
            .iter()
            .map(|b| {
                b.rich_text()
                    .expect("paragraph runs")
                    .iter()
                    .map(|r| r.content.chars().count())
                    .sum()
            })
            .collect();
        assert_eq!(lens, vec![2000, 2000, 1]);
    }

    #[test]
    fn chunking_respects_char_boundaries() {
        // Multibyte chars must not be split mid-encoding.
        let line = "é".repeat(MAX_RUN_LEN + 10);
        let blocks = compile(&line);
        assert_eq!(blocks.len(), 2);
        let runs = blocks[1].rich_text().expect("paragraph runs");
        assert_eq!(runs[0].content.chars().count(), 10);
    }

    #[test]
    fn no_run_ever_exceeds_limit() {
        let doc = format!("intro\n{}\noutro", "z".repeat(5 * MAX_RUN_LEN + 7));
        for block in compile(&doc) {
            for run in block.rich_text().unwrap_or_default() {
                assert!(run.content.chars().count() <= MAX_RUN_LEN);
            }
        }
    }

    #[test]
    fn full_document_ordering() {
        let doc = "\
# Overview

Intro paragraph.

## Key Points
- first
- second

---

> A notable quote

```go
fmt.Println(\"hi\")
```";
        let blocks = compile(doc);
        let kinds: Vec<&str> = blocks
            .iter()
            .map(|b| match b {
                Block::Heading1 { .. } => "h1",
                Block::Heading2 { .. } => "h2",
                Block::Heading3 { .. } => "h3",
                Block::BulletItem { .. } => "li",
                Block::Paragraph { .. } => "p",
                Block::Quote { .. } => "q",
                Block::Divider => "hr",
                Block::Code { .. } => "code",
            })
            .collect();
        assert_eq!(kinds, vec!["h1", "p", "h2", "li", "li", "hr", "q", "code"]);
    }
}
