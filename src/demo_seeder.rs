use bson::oid::ObjectId;
use bson::{doc, Document};
use chrono::{DateTime, Utc};
use serde::Deserialize;

use crate::db::store::MemoryContentStore;
use crate::error::AppError;

/// Embedded so that demo mode needs no files at runtime.
const DEMO_POSTS: &str = include_str!("../demo_data/posts.yaml");

#[derive(Debug, Deserialize)]
struct DemoPost {
    title: String,
    slug: String,
    service: Option<String>,
    #[serde(default)]
    body: String,
    /// Kept as raw YAML so that a missing `type` and `type: null` stay distinct.
    metadata: Option<serde_yaml::Value>,
    status: String,
    created_at: DateTime<Utc>,
}

/// Build the in-memory store served in demo mode.
pub fn demo_store() -> Result<MemoryContentStore, AppError> {
    tracing::info!("Seeding demo posts...");

    let posts: Vec<DemoPost> = serde_yaml::from_str(DEMO_POSTS)
        .map_err(|e| AppError::Internal(format!("Invalid demo data: {e}")))?;

    let documents = posts
        .into_iter()
        .map(to_document)
        .collect::<Result<Vec<_>, _>>()?;

    tracing::info!("Seeded {} demo posts.", documents.len());
    Ok(MemoryContentStore::new(documents))
}

fn to_document(post: DemoPost) -> Result<Document, AppError> {
    let mut document = doc! {
        "_id": ObjectId::new(),
        "title": post.title,
        "body": post.body,
        "slug": post.slug,
        "status": post.status,
        "created_at": bson::DateTime::from_chrono(post.created_at),
    };
    if let Some(service) = post.service {
        document.insert("service", service);
    }
    if let Some(metadata) = post.metadata {
        let metadata = bson::to_bson(&metadata)
            .map_err(|e| AppError::Internal(format!("Invalid demo metadata: {e}")))?;
        document.insert("metadata", metadata);
    }
    Ok(document)
}
