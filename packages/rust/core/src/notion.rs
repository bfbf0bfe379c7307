//! Notion publishing glue.
//!
//! Converts compiled [`Block`]s into Notion API block objects and creates
//! the final page. The Notion API caps children at 100 blocks per call, so
//! the publisher appends in batches: the first batch rides along with page
//! creation, the rest go through the append-children endpoint.

use std::time::Duration;

use rand::prelude::IndexedRandom;
use serde_json::{Value, json};
use tracing::{debug, info, instrument};

use atlas_blocks::{Block, StyledRun};
use atlas_shared::{AtlasError, NotionConfig, Result, resolve_secret};

const NOTION_API_BASE: &str = "https://api.notion.com/v1";
const NOTION_VERSION: &str = "2022-06-28";

/// Maximum number of child blocks the Notion API accepts per call.
pub const MAX_BLOCKS_PER_CALL: usize = 100;

/// Icon candidates for created pages.
const PAGE_ICONS: &[&str] = &["📚", "🧠", "🎓", "📖", "📝", "💡", "🧑‍🏫", "🔬", "📐", "🌐"];

/// Cover image candidates for created pages.
const PAGE_COVERS: &[&str] = &[
    "https://images.unsplash.com/photo-1551385917-889e48f92c21",
    "https://images.unsplash.com/photo-1568667256549-094345857637",
    "https://images.unsplash.com/photo-1625053376622-e462848c453f",
    "https://images.unsplash.com/photo-1543191878-2baa4ff8a570",
    "https://images.unsplash.com/photo-1567910640027-4029c4d8e9e0",
    "https://images.unsplash.com/photo-1521917441209-e886f0404a7b",
    "https://images.unsplash.com/photo-1506619216599-9d16d0903dfd",
];

// ---------------------------------------------------------------------------
// Block → Notion JSON
// ---------------------------------------------------------------------------

/// Render one compiled block as a Notion API block object.
pub fn to_notion_json(block: &Block) -> Value {
    match block {
        Block::Heading1 { rich_text } => tagged("heading_1", rich_text),
        Block::Heading2 { rich_text } => tagged("heading_2", rich_text),
        Block::Heading3 { rich_text } => tagged("heading_3", rich_text),
        Block::BulletItem { rich_text } => tagged("bulleted_list_item", rich_text),
        Block::Paragraph { rich_text } => tagged("paragraph", rich_text),
        Block::Quote { rich_text } => tagged("quote", rich_text),
        Block::Divider => json!({
            "object": "block",
            "type": "divider",
            "divider": {},
        }),
        Block::Code { text, language } => json!({
            "object": "block",
            "type": "code",
            "code": {
                "rich_text": [{
                    "type": "text",
                    "text": { "content": text },
                }],
                "language": language,
            },
        }),
    }
}

/// Build a run-carrying block object under the given type tag.
fn tagged(kind: &str, runs: &[StyledRun]) -> Value {
    let mut obj = serde_json::Map::new();
    obj.insert("object".into(), json!("block"));
    obj.insert("type".into(), json!(kind));
    obj.insert(kind.into(), json!({ "rich_text": rich_text_json(runs) }));
    Value::Object(obj)
}

/// Render styled runs as Notion rich text entries.
fn rich_text_json(runs: &[StyledRun]) -> Vec<Value> {
    runs.iter()
        .map(|run| {
            json!({
                "type": "text",
                "text": { "content": run.content },
                "annotations": { "bold": run.bold, "italic": run.italic },
            })
        })
        .collect()
}

// ---------------------------------------------------------------------------
// PagePublisher
// ---------------------------------------------------------------------------

/// Downstream page-creation boundary.
#[allow(async_fn_in_trait)]
pub trait PagePublisher {
    /// Create a page titled `title` containing `blocks`, returning a
    /// reference to the created page (URL or id).
    async fn publish(&self, title: &str, blocks: &[Block]) -> Result<String>;
}

// ---------------------------------------------------------------------------
// NotionClient
// ---------------------------------------------------------------------------

/// Live Notion API client.
pub struct NotionClient {
    client: reqwest::Client,
    api_base: String,
    token: String,
    parent_page_id: String,
}

impl NotionClient {
    /// Build a client, resolving the token and parent page id from the env
    /// vars named in config.
    pub fn new(config: &NotionConfig) -> Result<Self> {
        let token = resolve_secret(&config.token_env)?;
        let parent_page_id = resolve_secret(&config.parent_page_env)?;

        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(60))
            .build()
            .map_err(|e| AtlasError::Network(format!("failed to build HTTP client: {e}")))?;

        Ok(Self {
            client,
            api_base: NOTION_API_BASE.to_string(),
            token,
            parent_page_id,
        })
    }

    /// Override the API base URL (used by tests).
    pub fn with_api_base(mut self, api_base: impl Into<String>) -> Self {
        self.api_base = api_base.into();
        self
    }

    async fn post_json(&self, url: String, body: Value) -> Result<Value> {
        let response = self
            .client
            .post(url)
            .bearer_auth(&self.token)
            .header("Notion-Version", NOTION_VERSION)
            .json(&body)
            .send()
            .await
            .map_err(|e| AtlasError::Publish(format!("Notion request failed: {e}")))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(AtlasError::Publish(format!(
                "Notion API returned HTTP {status}: {body}"
            )));
        }

        response
            .json()
            .await
            .map_err(|e| AtlasError::Publish(format!("malformed Notion response: {e}")))
    }

    async fn patch_children(&self, page_id: &str, children: Vec<Value>) -> Result<()> {
        let response = self
            .client
            .patch(format!("{}/blocks/{page_id}/children", self.api_base))
            .bearer_auth(&self.token)
            .header("Notion-Version", NOTION_VERSION)
            .json(&json!({ "children": children }))
            .send()
            .await
            .map_err(|e| AtlasError::Publish(format!("Notion request failed: {e}")))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(AtlasError::Publish(format!(
                "Notion API returned HTTP {status}: {body}"
            )));
        }
        Ok(())
    }
}

impl PagePublisher for NotionClient {
    #[instrument(skip_all, fields(title = %title, blocks = blocks.len()))]
    async fn publish(&self, title: &str, blocks: &[Block]) -> Result<String> {
        let children: Vec<Value> = blocks.iter().map(to_notion_json).collect();
        let mut batches = children.chunks(MAX_BLOCKS_PER_CALL);

        let (icon, cover) = {
            let mut rng = rand::rng();
            (
                PAGE_ICONS.choose(&mut rng).copied().unwrap_or("📚"),
                PAGE_COVERS.choose(&mut rng).copied().unwrap_or(PAGE_COVERS[0]),
            )
        };

        info!(title, blocks = blocks.len(), "creating Notion page");

        let body = json!({
            "parent": { "page_id": self.parent_page_id },
            "properties": {
                "title": {
                    "title": [{ "type": "text", "text": { "content": title } }],
                },
            },
            "icon": { "type": "emoji", "emoji": icon },
            "cover": { "type": "external", "external": { "url": cover } },
            "children": batches.next().unwrap_or_default(),
        });

        let created = self.post_json(format!("{}/pages", self.api_base), body).await?;

        let page_id = created["id"]
            .as_str()
            .ok_or_else(|| AtlasError::Publish("page response missing id".into()))?
            .to_string();

        for batch in batches {
            debug!(page_id = %page_id, batch = batch.len(), "appending block batch");
            self.patch_children(&page_id, batch.to_vec()).await?;
        }

        let page_ref = created["url"]
            .as_str()
            .map(str::to_string)
            .unwrap_or_else(|| page_id.clone());

        info!(page = %page_ref, "page published");
        Ok(page_ref)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn paragraph_block_json_shape() {
        let block = Block::Paragraph {
            rich_text: vec![
                StyledRun::plain("Some "),
                StyledRun::bold("bold"),
                StyledRun::plain(" text."),
            ],
        };
        let value = to_notion_json(&block);

        assert_eq!(value["object"], "block");
        assert_eq!(value["type"], "paragraph");
        let runs = value["paragraph"]["rich_text"].as_array().expect("runs");
        assert_eq!(runs.len(), 3);
        assert_eq!(runs[1]["text"]["content"], "bold");
        assert_eq!(runs[1]["annotations"]["bold"], true);
        assert_eq!(runs[1]["annotations"]["italic"], false);
    }

    #[test]
    fn heading_block_json_shape() {
        let block = Block::Heading2 {
            rich_text: vec![StyledRun::plain("Key Points")],
        };
        let value = to_notion_json(&block);
        assert_eq!(value["type"], "heading_2");
        assert_eq!(
            value["heading_2"]["rich_text"][0]["text"]["content"],
            "Key Points"
        );
    }

    #[test]
    fn divider_block_json_shape() {
        let value = to_notion_json(&Block::Divider);
        assert_eq!(value["type"], "divider");
        assert!(value["divider"].as_object().expect("divider").is_empty());
    }

    #[test]
    fn code_block_json_shape() {
        let block = Block::Code {
            text: "print(1)".into(),
            language: "python".into(),
        };
        let value = to_notion_json(&block);
        assert_eq!(value["type"], "code");
        assert_eq!(value["code"]["language"], "python");
        assert_eq!(value["code"]["rich_text"][0]["text"]["content"], "print(1)");
    }

    #[test]
    fn batching_respects_the_api_limit() {
        let blocks: Vec<Block> = (0..MAX_BLOCKS_PER_CALL * 3 + 1)
            .map(|i| Block::Paragraph {
                rich_text: vec![StyledRun::plain(format!("p{i}"))],
            })
            .collect();

        let children: Vec<Value> = blocks.iter().map(to_notion_json).collect();
        let batches: Vec<_> = children.chunks(MAX_BLOCKS_PER_CALL).collect();

        assert_eq!(batches.len(), 4);
        assert!(batches.iter().all(|b| b.len() <= MAX_BLOCKS_PER_CALL));
        assert_eq!(batches[3].len(), 1);
    }
}
