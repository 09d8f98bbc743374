use std::cmp::Ordering;

use async_trait::async_trait;
use bson::{Bson, Document};

use crate::error::AppError;
use crate::models::content::ContentRecord;
use crate::models::search::SortKey;
use crate::search::predicate::Predicate;

/// Which slice of the matching records to return, and in what order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct QueryWindow {
    pub sort: SortKey,
    pub skip: u64,
    pub limit: u64,
}

/// Records in the requested window plus the total number of matches.
#[derive(Debug, Clone, Default)]
pub struct StorePage {
    pub records: Vec<ContentRecord>,
    pub total: u64,
}

/// Read-only access to the post collection.
///
/// This trait allows mocking the database layer in tests.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait ContentStore: Send + Sync {
    /// Run `predicate`, returning the total match count and the records in
    /// `window`.
    async fn query(&self, predicate: &Predicate, window: QueryWindow)
        -> Result<StorePage, AppError>;
}

/// In-memory store over raw BSON documents.
///
/// Used in demo mode and tests. Documents are kept exactly as stored, so an
/// absent `metadata.type` and an explicit null remain distinguishable.
#[derive(Debug, Default)]
pub struct MemoryContentStore {
    documents: Vec<Document>,
}

impl MemoryContentStore {
    pub fn new(documents: Vec<Document>) -> Self {
        Self { documents }
    }

    pub fn len(&self) -> usize {
        self.documents.len()
    }

    pub fn is_empty(&self) -> bool {
        self.documents.is_empty()
    }
}

#[async_trait]
impl ContentStore for MemoryContentStore {
    async fn query(
        &self,
        predicate: &Predicate,
        window: QueryWindow,
    ) -> Result<StorePage, AppError> {
        let mut matching: Vec<&Document> = self
            .documents
            .iter()
            .filter(|doc| predicate.matches(doc))
            .collect();
        matching.sort_by(|a, b| compare(a, b, window.sort));

        let total = matching.len() as u64;
        let records = matching
            .into_iter()
            .skip(usize::try_from(window.skip).unwrap_or(usize::MAX))
            .take(usize::try_from(window.limit).unwrap_or(usize::MAX))
            .map(|doc| {
                bson::from_document::<ContentRecord>(doc.clone())
                    .map_err(|e| AppError::Database(format!("Malformed post record: {e}")))
            })
            .collect::<Result<Vec<_>, _>>()?;

        Ok(StorePage { records, total })
    }
}

fn compare(a: &Document, b: &Document, sort: SortKey) -> Ordering {
    let primary = match sort {
        SortKey::Newest => created_at(b).cmp(&created_at(a)),
        SortKey::Oldest => created_at(a).cmp(&created_at(b)),
        SortKey::Title => a.get_str("title").ok().cmp(&b.get_str("title").ok()),
    };
    primary.then_with(|| a.get_object_id("_id").ok().cmp(&b.get_object_id("_id").ok()))
}

fn created_at(doc: &Document) -> Option<bson::DateTime> {
    match doc.get("created_at") {
        Some(Bson::DateTime(dt)) => Some(*dt),
        _ => None,
    }
}

/// The MongoDB sort document for a [`SortKey`].
pub fn sort_document(sort: SortKey) -> Document {
    match sort {
        SortKey::Newest => bson::doc! { "created_at": -1, "_id": 1 },
        SortKey::Oldest => bson::doc! { "created_at": 1, "_id": 1 },
        SortKey::Title => bson::doc! { "title": 1, "_id": 1 },
    }
}

/// MongoDB implementation of the ContentStore.
///
/// This is only available when the `ssr` feature is enabled (i.e., server-side).
#[cfg(feature = "ssr")]
pub struct MongoContentStore {
    collection: mongodb::Collection<ContentRecord>,
}

#[cfg(feature = "ssr")]
impl MongoContentStore {
    pub fn new(db: &mongodb::Database, collection: &str) -> Self {
        Self {
            collection: db.collection(collection),
        }
    }

    /// Create the index backing scoped, status-filtered, date-ordered queries.
    /// Should be called once on startup.
    pub async fn ensure_indexes(&self) -> Result<(), AppError> {
        use mongodb::IndexModel;

        let index = IndexModel::builder()
            .keys(bson::doc! { "status": 1, "metadata.type": 1, "created_at": -1 })
            .build();

        self.collection
            .create_index(index)
            .await
            .map_err(store_error)?;

        Ok(())
    }
}

#[cfg(feature = "ssr")]
#[async_trait]
impl ContentStore for MongoContentStore {
    async fn query(
        &self,
        predicate: &Predicate,
        window: QueryWindow,
    ) -> Result<StorePage, AppError> {
        use futures::TryStreamExt;
        use mongodb::options::FindOptions;

        let filter = predicate.to_filter();

        let total = self
            .collection
            .count_documents(filter.clone())
            .await
            .map_err(store_error)?;

        if window.skip >= total {
            return Ok(StorePage {
                records: vec![],
                total,
            });
        }

        let options = FindOptions::builder()
            .sort(sort_document(window.sort))
            .skip(window.skip)
            .limit(i64::try_from(window.limit).unwrap_or(i64::MAX))
            .build();

        let records: Vec<ContentRecord> = self
            .collection
            .find(filter)
            .with_options(options)
            .await
            .map_err(store_error)?
            .try_collect()
            .await
            .map_err(store_error)?;

        Ok(StorePage { records, total })
    }
}

/// Connection-level failures are transient; anything else is a query defect.
#[cfg(feature = "ssr")]
pub fn store_error(err: mongodb::error::Error) -> AppError {
    use mongodb::error::ErrorKind;

    match *err.kind {
        ErrorKind::ServerSelection { .. }
        | ErrorKind::Io(_)
        | ErrorKind::ConnectionPoolCleared { .. } => AppError::StoreUnavailable(err.to_string()),
        _ => AppError::Database(err.to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::search::predicate::PredicateBuilder;
    use crate::search::taxonomy::{TypeScope, TypeTaxonomy};
    use bson::oid::ObjectId;
    use bson::doc;

    fn post(title: &str, kind: Option<Bson>, status: &str, millis: i64) -> Document {
        let mut doc = doc! {
            "_id": ObjectId::new(),
            "title": title,
            "body": "",
            "slug": title.to_lowercase().replace(' ', "-"),
            "status": status,
            "created_at": bson::DateTime::from_millis(millis),
        };
        if let Some(kind) = kind {
            doc.insert("metadata", doc! { "type": kind });
        }
        doc
    }

    fn window(sort: SortKey, skip: u64, limit: u64) -> QueryWindow {
        QueryWindow { sort, skip, limit }
    }

    #[tokio::test]
    async fn test_memory_store_filters_and_counts() {
        let taxonomy = TypeTaxonomy::builtin().unwrap();
        let store = MemoryContentStore::new(vec![
            post("Null typed", Some(Bson::Null), "published", 1),
            post("Untyped", None, "published", 2),
            post("Property", Some(Bson::String("property-info".into())), "published", 3),
            post("Deleted", Some(Bson::Null), "deleted", 4),
        ]);
        let predicate =
            PredicateBuilder::new(&taxonomy).build("", Some(TypeScope::Board), &[]);

        let page = store
            .query(&predicate, window(SortKey::Newest, 0, 10))
            .await
            .unwrap();
        assert_eq!(page.total, 2);
        let titles: Vec<_> = page.records.iter().map(|r| r.title.as_str()).collect();
        assert_eq!(titles, vec!["Untyped", "Null typed"]);
    }

    #[tokio::test]
    async fn test_memory_store_sorts_and_windows() {
        let taxonomy = TypeTaxonomy::builtin().unwrap();
        let store = MemoryContentStore::new(vec![
            post("Charlie", None, "published", 30),
            post("Alpha", None, "published", 10),
            post("Bravo", None, "published", 20),
        ]);
        let predicate = PredicateBuilder::new(&taxonomy).build("", None, &[]);

        let oldest = store
            .query(&predicate, window(SortKey::Oldest, 1, 1))
            .await
            .unwrap();
        assert_eq!(oldest.total, 3);
        assert_eq!(oldest.records.len(), 1);
        assert_eq!(oldest.records[0].title, "Bravo");

        let by_title = store
            .query(&predicate, window(SortKey::Title, 0, 10))
            .await
            .unwrap();
        let titles: Vec<_> = by_title.records.iter().map(|r| r.title.as_str()).collect();
        assert_eq!(titles, vec!["Alpha", "Bravo", "Charlie"]);
    }

    #[tokio::test]
    async fn test_memory_store_breaks_ties_by_id() {
        let taxonomy = TypeTaxonomy::builtin().unwrap();
        let docs: Vec<Document> = (0..5)
            .map(|i| post(&format!("Same time {i}"), None, "published", 100))
            .collect();
        let mut ids: Vec<ObjectId> = docs
            .iter()
            .map(|d| d.get_object_id("_id").unwrap())
            .collect();
        ids.sort();

        let store = MemoryContentStore::new(docs.into_iter().rev().collect());
        let predicate = PredicateBuilder::new(&taxonomy).build("", None, &[]);
        let page = store
            .query(&predicate, window(SortKey::Newest, 0, 10))
            .await
            .unwrap();
        let returned: Vec<ObjectId> = page.records.iter().map(|r| r.id).collect();
        assert_eq!(returned, ids);
    }

    #[tokio::test]
    async fn test_memory_store_skip_past_end() {
        let taxonomy = TypeTaxonomy::builtin().unwrap();
        let store = MemoryContentStore::new(vec![post("Only", None, "published", 1)]);
        let predicate = PredicateBuilder::new(&taxonomy).build("", None, &[]);
        let page = store
            .query(&predicate, window(SortKey::Newest, 40, 20))
            .await
            .unwrap();
        assert_eq!(page.total, 1);
        assert!(page.records.is_empty());
    }

    #[test]
    fn test_sort_documents_end_with_id() {
        for sort in [SortKey::Newest, SortKey::Oldest, SortKey::Title] {
            let doc = sort_document(sort);
            assert_eq!(doc.keys().last().map(String::as_str), Some("_id"));
        }
    }
}
