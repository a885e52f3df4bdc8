use chrono::{NaiveDateTime, Utc};
use diesel::prelude::*;
use serde::{Deserialize, Serialize};

use super::text_enum::text_enum;
use super::JsonValue;

text_enum! {
    /// What a content block renders as on the profile page
    BlockKind {
        Heading => "HEADING",
        Text => "TEXT",
        List => "LIST",
        Divider => "DIVIDER",
        Image => "IMAGE",
        Video => "VIDEO",
    }
}

text_enum! {
    ListStyle {
        Bullet => "BULLET",
        Numbered => "NUMBER",
    }
}

/// One unit of a candidate's profile page
#[derive(Queryable, Selectable, Identifiable, Debug, Clone, PartialEq, Serialize, Deserialize)]
#[diesel(table_name = crate::schema::content_blocks)]
#[diesel(check_for_backend(diesel::sqlite::Sqlite))]
pub struct ContentBlock {
    pub id: i32,
    pub candidate_id: i32,
    /// Zero-based order on the page
    pub position: i32,
    pub kind: BlockKind,
    pub color: Option<String>,
    /// Heading level, 1 to 3
    pub level: Option<i32>,
    pub body: Option<String>,
    pub list_style: Option<ListStyle>,
    /// List entries as a JSON array of strings
    pub items: Option<JsonValue>,
    pub image_url: Option<String>,
    pub video_url: Option<String>,
    pub thumbnail_url: Option<String>,
    pub caption: Option<String>,
    pub created_at: NaiveDateTime,
    pub updated_at: NaiveDateTime,
}

/// The editable part of a content block
#[derive(AsChangeset, Debug, Clone, PartialEq, Serialize, Deserialize)]
#[diesel(table_name = crate::schema::content_blocks)]
#[diesel(treat_none_as_null = true)]
pub struct BlockContent {
    pub kind: BlockKind,
    #[serde(default)]
    pub color: Option<String>,
    #[serde(default)]
    pub level: Option<i32>,
    #[serde(default)]
    pub body: Option<String>,
    #[serde(default)]
    pub list_style: Option<ListStyle>,
    #[serde(default)]
    pub items: Option<JsonValue>,
    #[serde(default)]
    pub image_url: Option<String>,
    #[serde(default)]
    pub video_url: Option<String>,
    #[serde(default)]
    pub thumbnail_url: Option<String>,
    #[serde(default)]
    pub caption: Option<String>,
}

fn is_blank(value: &Option<String>) -> bool {
    value.as_deref().is_none_or(|v| v.trim().is_empty())
}

impl BlockContent {
    fn empty(kind: BlockKind) -> Self {
        Self {
            kind,
            color: None,
            level: None,
            body: None,
            list_style: None,
            items: None,
            image_url: None,
            video_url: None,
            thumbnail_url: None,
            caption: None,
        }
    }

    pub fn heading(level: i32, text: &str) -> Self {
        Self {
            level: Some(level),
            body: Some(text.to_string()),
            color: Some("purple".to_string()),
            ..Self::empty(BlockKind::Heading)
        }
    }

    pub fn text(text: &str) -> Self {
        Self {
            body: Some(text.to_string()),
            ..Self::empty(BlockKind::Text)
        }
    }

    pub fn list(entries: &[&str]) -> Self {
        Self {
            list_style: Some(ListStyle::Bullet),
            items: Some(JsonValue::string_list(entries.iter().copied())),
            ..Self::empty(BlockKind::List)
        }
    }

    pub fn divider() -> Self {
        Self::empty(BlockKind::Divider)
    }

    /// Checks that the fields required by this block's kind are present
    pub fn validate(&self) -> Result<(), String> {
        match self.kind {
            BlockKind::Heading => {
                if is_blank(&self.body) {
                    return Err("Heading blocks need text".to_string());
                }
                match self.level {
                    Some(1..=3) => Ok(()),
                    _ => Err("Heading level must be between 1 and 3".to_string()),
                }
            }
            BlockKind::Text => {
                if is_blank(&self.body) {
                    Err("Text blocks need text".to_string())
                } else {
                    Ok(())
                }
            }
            BlockKind::List => {
                let entries = self
                    .items
                    .as_ref()
                    .and_then(|items| items.as_string_list())
                    .ok_or_else(|| "List blocks need a list of strings".to_string())?;
                if entries.is_empty() {
                    Err("List blocks need at least one entry".to_string())
                } else {
                    Ok(())
                }
            }
            BlockKind::Divider => Ok(()),
            BlockKind::Image => {
                if is_blank(&self.image_url) {
                    Err("Image blocks need an image URL".to_string())
                } else {
                    Ok(())
                }
            }
            BlockKind::Video => {
                if is_blank(&self.video_url) {
                    Err("Video blocks need a video URL".to_string())
                } else {
                    Ok(())
                }
            }
        }
    }
}

impl From<&ContentBlock> for BlockContent {
    fn from(block: &ContentBlock) -> Self {
        Self {
            kind: block.kind,
            color: block.color.clone(),
            level: block.level,
            body: block.body.clone(),
            list_style: block.list_style,
            items: block.items.clone(),
            image_url: block.image_url.clone(),
            video_url: block.video_url.clone(),
            thumbnail_url: block.thumbnail_url.clone(),
            caption: block.caption.clone(),
        }
    }
}

#[derive(Insertable, Debug, Clone)]
#[diesel(table_name = crate::schema::content_blocks)]
pub struct NewContentBlock {
    pub candidate_id: i32,
    pub position: i32,
    pub kind: BlockKind,
    pub color: Option<String>,
    pub level: Option<i32>,
    pub body: Option<String>,
    pub list_style: Option<ListStyle>,
    pub items: Option<JsonValue>,
    pub image_url: Option<String>,
    pub video_url: Option<String>,
    pub thumbnail_url: Option<String>,
    pub caption: Option<String>,
    pub created_at: NaiveDateTime,
    pub updated_at: NaiveDateTime,
}

impl NewContentBlock {
    pub fn new(candidate_id: i32, position: i32, content: BlockContent) -> Self {
        let now = Utc::now().naive_utc();
        Self {
            candidate_id,
            position,
            kind: content.kind,
            color: content.color,
            level: content.level,
            body: content.body,
            list_style: content.list_style,
            items: content.items,
            image_url: content.image_url,
            video_url: content.video_url,
            thumbnail_url: content.thumbnail_url,
            caption: content.caption,
            created_at: now,
            updated_at: now,
        }
    }
}

/// The starter page every new candidate profile gets
pub fn default_template() -> Vec<BlockContent> {
    vec![
        BlockContent::heading(1, "About Me"),
        BlockContent::text("Tell voters who you are, where you come from and what you care about."),
        BlockContent::divider(),
        BlockContent::heading(2, "Key Policies"),
        BlockContent::list(&["First priority", "Second priority", "Third priority"]),
        BlockContent::heading(2, "Why I'm Running"),
        BlockContent::text("Explain what motivated you to run for this office."),
    ]
}
