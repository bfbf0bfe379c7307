//! Markdown-to-block compiler for hierarchical document output.
//!
//! Converts the semi-structured markdown produced by the summarizer and
//! formatter agents into an ordered sequence of typed [`Block`]s, ready for
//! a Notion-style document API. The compiler is a deliberately small,
//! deterministic pass: a line classifier with an explicit code-fence state
//! machine, an inline bold/italic tokenizer, and a per-run length cap.
//!
//! It is not a CommonMark parser. Nested lists, tables, and combined
//! bold-italic markup are out of scope; anything the classifier does not
//! recognize degrades to a paragraph rather than failing.

mod compiler;
pub mod lang;
pub mod richtext;

use serde::{Deserialize, Serialize};

pub use compiler::MAX_RUN_LEN;
pub use lang::{PLAIN_TEXT, normalize_language};
pub use richtext::{StyledRun, tokenize};

// ---------------------------------------------------------------------------
// Block
// ---------------------------------------------------------------------------

/// One unit of structured output content.
///
/// The serialized shape (tag + styled runs / raw text + language) is the
/// contract persisted to the `blocks_<id>.json` stage file and consumed by
/// the Notion publisher. Blocks are never mutated after creation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum Block {
    /// Top-level heading (`# `).
    #[serde(rename = "heading_1")]
    Heading1 { rich_text: Vec<StyledRun> },

    /// Second-level heading (`## `).
    #[serde(rename = "heading_2")]
    Heading2 { rich_text: Vec<StyledRun> },

    /// Third-level heading (`### ` or `#### ` — no fourth visual level).
    #[serde(rename = "heading_3")]
    Heading3 { rich_text: Vec<StyledRun> },

    /// Bulleted list item (`- ` or `•`).
    #[serde(rename = "bulleted_list_item")]
    BulletItem { rich_text: Vec<StyledRun> },

    /// Plain paragraph text.
    #[serde(rename = "paragraph")]
    Paragraph { rich_text: Vec<StyledRun> },

    /// Block quote (`> `).
    #[serde(rename = "quote")]
    Quote { rich_text: Vec<StyledRun> },

    /// Horizontal divider (`---`). Carries no content.
    #[serde(rename = "divider")]
    Divider,

    /// Fenced code region. `text` is raw literal content (never tokenized
    /// for emphasis); `language` is always a whitelisted identifier.
    #[serde(rename = "code")]
    Code { text: String, language: String },
}

impl Block {
    /// The styled runs carried by this block, if its kind has any.
    pub fn rich_text(&self) -> Option<&[StyledRun]> {
        match self {
            Self::Heading1 { rich_text }
            | Self::Heading2 { rich_text }
            | Self::Heading3 { rich_text }
            | Self::BulletItem { rich_text }
            | Self::Paragraph { rich_text }
            | Self::Quote { rich_text } => Some(rich_text),
            Self::Divider | Self::Code { .. } => None,
        }
    }
}

/// Compile one markdown document into an ordered sequence of blocks.
///
/// Pure and infallible: malformed input degrades to paragraph or plain-text
/// classification, never an error. Output order is a deterministic function
/// of input order.
pub fn compile(document: &str) -> Vec<Block> {
    compiler::compile(document)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn block_json_tags_are_stable() {
        let block = Block::Heading1 {
            rich_text: vec![StyledRun::plain("Title")],
        };
        let json = serde_json::to_value(&block).expect("serialize");
        assert_eq!(json["type"], "heading_1");
        assert_eq!(json["rich_text"][0]["content"], "Title");

        let block = Block::Code {
            text: "print(1)".into(),
            language: "python".into(),
        };
        let json = serde_json::to_value(&block).expect("serialize");
        assert_eq!(json["type"], "code");
        assert_eq!(json["language"], "python");

        let json = serde_json::to_value(Block::Divider).expect("serialize");
        assert_eq!(json["type"], "divider");
    }

    #[test]
    fn block_roundtrip() {
        let blocks = vec![
            Block::Heading2 {
                rich_text: vec![StyledRun::plain("Key Points")],
            },
            Block::BulletItem {
                rich_text: vec![
                    StyledRun::plain("uses "),
                    StyledRun::bold("quicksort"),
                ],
            },
            Block::Divider,
        ];
        let json = serde_json::to_string(&blocks).expect("serialize");
        let parsed: Vec<Block> = serde_json::from_str(&json).expect("deserialize");
        assert_eq!(blocks, parsed);
    }
}
