//! LLM agent boundary.
//!
//! The pipeline treats its three agents — summarizer, formatter,
//! researcher — as opaque `markdown in → markdown out` functions behind
//! [`ChatAgent`]. The live implementation speaks the OpenAI-compatible
//! chat completions protocol; tests substitute canned agents.

use std::collections::BTreeSet;
use std::sync::LazyLock;
use std::time::Duration;

use regex::Regex;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use atlas_shared::{AtlasError, OpenAiConfig, Result, Section, resolve_secret};

/// Matches `**bold**` spans when harvesting topic candidates.
static BOLD_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\*\*(.*?)\*\*").expect("bold regex"));

// ---------------------------------------------------------------------------
// ChatAgent
// ---------------------------------------------------------------------------

/// An opaque LLM-backed text transformation.
#[allow(async_fn_in_trait)]
pub trait ChatAgent {
    /// Run the agent on `input`, returning its markdown output.
    async fn run(&self, input: &str) -> Result<String>;
}

/// The three agent roles in the pipeline, each with its own system prompt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AgentRole {
    /// Summarizes one transcript section into structured markdown.
    Summarizer,
    /// Polishes a summary for display in a Notion-style page.
    Formatter,
    /// Researches one technical topic and returns enrichment markdown.
    Researcher,
}

impl AgentRole {
    /// System prompt for this role.
    pub fn system_prompt(&self) -> &'static str {
        match self {
            Self::Summarizer => {
                "You are a concise, insightful assistant that summarizes video \
                 sections with clarity. Extract the key ideas, arguments, and \
                 topics; preserve numbers, stats, names, and sources; skip filler \
                 words, tangents, and any promotional content. Format important \
                 terms in **bold** and use *italics* for emphasis. Do not refer \
                 to the video or the speaker. Structure the output as: \
                 '## Summary' with a paragraph, '## Key Points' with bullets, \
                 and '## Notable Quotes' with bullets when relevant."
            }
            Self::Formatter => {
                "You are a formatting assistant that turns raw markdown into \
                 clean, well-structured content with headings, spacing, and \
                 readability. Always start with a single '#' heading that \
                 introduces the section; use '##' for major subsections and \
                 '###' for smaller parts. Fix formatting inconsistencies, clean \
                 up bullets, and add spacing between sections. Do not change the \
                 meaning of the content or add new information."
            }
            Self::Researcher => {
                "You are a technical researcher. Given a topic, return markdown \
                 starting with '## Enrichment: [Topic]' followed by a brief \
                 **Definition:**, an **Example:** (with a code snippet when the \
                 topic is a programming concept), and a **Further Reading:** \
                 bullet list. Prefer reliable, educational sources and do not \
                 invent URLs."
            }
        }
    }

    /// Stable name used in logs.
    pub fn name(&self) -> &'static str {
        match self {
            Self::Summarizer => "summarizer",
            Self::Formatter => "formatter",
            Self::Researcher => "researcher",
        }
    }
}

// ---------------------------------------------------------------------------
// OpenAI-compatible wire types
// ---------------------------------------------------------------------------

#[derive(Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage<'a>>,
}

#[derive(Serialize)]
struct ChatMessage<'a> {
    role: &'static str,
    content: &'a str,
}

#[derive(Deserialize)]
struct ChatResponse {
    choices: Vec<ChatChoice>,
}

#[derive(Deserialize)]
struct ChatChoice {
    message: ChatResponseMessage,
}

#[derive(Deserialize)]
struct ChatResponseMessage {
    content: String,
}

// ---------------------------------------------------------------------------
// OpenAiChatAgent
// ---------------------------------------------------------------------------

/// Live agent against an OpenAI-compatible chat completions endpoint.
pub struct OpenAiChatAgent {
    client: reqwest::Client,
    api_base: String,
    api_key: String,
    model: String,
    role: AgentRole,
}

impl OpenAiChatAgent {
    /// Build an agent for `role`, resolving the API key from the env var
    /// named in config.
    pub fn new(config: &OpenAiConfig, role: AgentRole) -> Result<Self> {
        let api_key = resolve_secret(&config.api_key_env)?;

        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(120))
            .build()
            .map_err(|e| AtlasError::Network(format!("failed to build HTTP client: {e}")))?;

        Ok(Self {
            client,
            api_base: config.api_base.trim_end_matches('/').to_string(),
            api_key,
            model: config.default_model.clone(),
            role,
        })
    }
}

impl ChatAgent for OpenAiChatAgent {
    async fn run(&self, input: &str) -> Result<String> {
        info!(agent = self.role.name(), model = %self.model, chars = input.len(), "running agent");

        let request = ChatRequest {
            model: &self.model,
            messages: vec![
                ChatMessage {
                    role: "system",
                    content: self.role.system_prompt(),
                },
                ChatMessage {
                    role: "user",
                    content: input,
                },
            ],
        };

        let response = self
            .client
            .post(format!("{}/chat/completions", self.api_base))
            .bearer_auth(&self.api_key)
            .json(&request)
            .send()
            .await
            .map_err(|e| AtlasError::Agent(format!("chat request failed: {e}")))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(AtlasError::Agent(format!(
                "chat API returned HTTP {status}: {body}"
            )));
        }

        let parsed: ChatResponse = response
            .json()
            .await
            .map_err(|e| AtlasError::Agent(format!("malformed chat response: {e}")))?;

        let content = parsed
            .choices
            .into_iter()
            .next()
            .map(|c| c.message.content)
            .ok_or_else(|| AtlasError::Agent("chat response had no choices".into()))?;

        // Research output sometimes leads with tool-call chatter; keep only
        // the markdown from the first heading onward.
        let content = match self.role {
            AgentRole::Researcher => trim_to_heading(&content),
            _ => content,
        };

        debug!(agent = self.role.name(), chars = content.len(), "agent complete");
        Ok(content)
    }
}

/// Drop everything before the first `##` heading, if one exists.
fn trim_to_heading(text: &str) -> String {
    match text.find("##") {
        Some(idx) => text[idx..].to_string(),
        None => text.to_string(),
    }
}

// ---------------------------------------------------------------------------
// Topic extraction
// ---------------------------------------------------------------------------

/// Harvest research topics from the formatted section summaries.
///
/// Collects `**bold**` spans, trims surrounding punctuation, lower-cases,
/// and keeps candidates between 3 and 49 characters. Topics come back
/// sorted and deduplicated so a given input always produces the same
/// research set.
pub fn extract_topics(sections: &[Section], max_topics: usize) -> Vec<String> {
    let mut topics: BTreeSet<String> = BTreeSet::new();

    for section in sections {
        let Some(text) = section.formatted_summary.as_deref() else {
            continue;
        };
        for caps in BOLD_RE.captures_iter(text) {
            let cleaned = caps[1]
                .trim()
                .trim_matches(|c: char| ":;,.()[]{}".contains(c))
                .to_lowercase();
            let len = cleaned.chars().count();
            if len > 2 && len < 50 {
                topics.insert(cleaned);
            }
        }
    }

    topics.into_iter().take(max_topics).collect()
}
