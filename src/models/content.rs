use bson::oid::ObjectId;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::search::taxonomy::{TypeScope, TypeTaxonomy};

/// Maximum number of characters in a summary excerpt.
pub const EXCERPT_LEN: usize = 200;

/// A community post as stored in the `posts` collection.
///
/// Owned by the CRUD side of the platform; search only reads it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ContentRecord {
    #[serde(rename = "_id")]
    pub id: ObjectId,
    pub title: String,
    /// Markdown body.
    #[serde(default)]
    pub body: String,
    pub slug: String,
    /// The service (community section) that owns the post.
    #[serde(default)]
    pub service: Option<String>,
    /// Legacy records may carry no metadata at all.
    #[serde(default)]
    pub metadata: Option<ContentMetadata>,
    /// `published`, `deleted`, ... Absent on some imported records.
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default)]
    pub created_at: Option<bson::DateTime>,
}

/// Metadata envelope of a post.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ContentMetadata {
    /// Raw content type tag, possibly in a legacy spelling.
    #[serde(rename = "type", default)]
    pub kind: Option<String>,
}

impl ContentRecord {
    /// The raw `metadata.type` value, `None` when absent or null.
    pub fn type_tag(&self) -> Option<&str> {
        self.metadata.as_ref().and_then(|m| m.kind.as_deref())
    }
}

/// A search hit returned to the client.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ContentSummary {
    pub id: String,
    pub title: String,
    pub slug: String,
    pub service: Option<String>,
    /// Raw stored type tag.
    #[serde(rename = "type")]
    pub type_tag: Option<String>,
    /// Effective scope of the post, `None` if its tag belongs to no scope.
    pub scope: Option<TypeScope>,
    pub excerpt: String,
    /// `None` for legacy records stored without a creation time.
    pub created_at: Option<DateTime<Utc>>,
}

/// Build a summary from a stored record.
pub fn build_summary(record: &ContentRecord, taxonomy: &TypeTaxonomy) -> ContentSummary {
    ContentSummary {
        id: record.id.to_hex(),
        title: record.title.clone(),
        slug: record.slug.clone(),
        service: record.service.clone(),
        type_tag: record.type_tag().map(str::to_string),
        scope: taxonomy.scope_of_tag(record.type_tag()),
        excerpt: excerpt(&record.body, EXCERPT_LEN),
        created_at: record.created_at.map(bson::DateTime::to_chrono),
    }
}

/// Strip markdown syntax and cut to at most `max_chars` characters.
pub fn excerpt(raw: &str, max_chars: usize) -> String {
    use pulldown_cmark::{Event, Options, Parser, TagEnd};

    let options = Options::ENABLE_TABLES
        | Options::ENABLE_FOOTNOTES
        | Options::ENABLE_STRIKETHROUGH
        | Options::ENABLE_TASKLISTS;

    let parser = Parser::new_ext(raw, options);
    let mut text = String::new();

    for event in parser {
        match event {
            Event::Text(t) | Event::Code(t) => text.push_str(&t),
            Event::SoftBreak | Event::HardBreak => text.push(' '),
            Event::End(
                TagEnd::Paragraph
                | TagEnd::Heading(_)
                | TagEnd::Item
                | TagEnd::TableCell
                | TagEnd::CodeBlock,
            ) => text.push(' '),
            _ => {}
        }
    }

    // Posts are largely non-ASCII, so cut by chars rather than bytes.
    let collapsed = text.split_whitespace().collect::<Vec<_>>().join(" ");
    let cut: String = collapsed.chars().take(max_chars).collect();
    cut.trim_end().to_string()
}
