#![allow(dead_code)]

use std::sync::Arc;

use async_trait::async_trait;
use axum::routing::get;
use axum::Router;
use bson::oid::ObjectId;
use bson::{doc, Bson, Document};
use testcontainers::runners::AsyncRunner;
use testcontainers::ContainerAsync;
use testcontainers_modules::mongo::Mongo;

use neighborly::db::store::{ContentStore, MemoryContentStore, MongoContentStore, QueryWindow, StorePage};
use neighborly::error::AppError;
use neighborly::search::predicate::Predicate;
use neighborly::search::taxonomy::TypeTaxonomy;
use neighborly::state::AppState;

/// Build the search router over any content store.
pub fn router(store: Arc<dyn ContentStore>) -> Router {
    let leptos_options = leptos::prelude::LeptosOptions::builder()
        .output_name("neighborly")
        .build();

    let app_state = AppState {
        content_store: store,
        taxonomy: Arc::new(TypeTaxonomy::builtin().expect("Built-in taxonomy must load")),
        exclude_statuses: Arc::new(vec!["deleted".to_string()]),
        leptos_options,
    };

    Router::new()
        .route("/search", get(neighborly::api::search::search_handler))
        .with_state(app_state)
}

/// `TestServer` over an in-memory store holding `documents`.
pub fn memory_server(documents: Vec<Document>) -> axum_test::TestServer {
    axum_test::TestServer::builder()
        .try_build(router(Arc::new(MemoryContentStore::new(documents))))
        .expect("Failed to build TestServer")
}

/// `TestServer` whose store is never reachable.
pub fn unavailable_server() -> axum_test::TestServer {
    axum_test::TestServer::builder()
        .try_build(router(Arc::new(UnreachableStore)))
        .expect("Failed to build TestServer")
}

struct UnreachableStore;

#[async_trait]
impl ContentStore for UnreachableStore {
    async fn query(&self, _: &Predicate, _: QueryWindow) -> Result<StorePage, AppError> {
        Err(AppError::StoreUnavailable(
            "Server selection timeout: no available servers".to_string(),
        ))
    }
}

/// A post document shaped like the production `posts` collection.
///
/// `kind` of `None` leaves `metadata` out entirely; `Some(Bson::Null)` stores
/// an explicit null type.
pub fn post(title: &str, body: &str, kind: Option<Bson>, status: &str, millis: i64) -> Document {
    let mut doc = doc! {
        "_id": ObjectId::new(),
        "title": title,
        "body": body,
        "slug": format!("{}-{}", title.to_lowercase().replace(' ', "-"), uuid::Uuid::new_v4().simple()),
        "service": "community",
        "status": status,
        "created_at": bson::DateTime::from_millis(millis),
    };
    if let Some(kind) = kind {
        doc.insert("metadata", doc! { "type": kind });
    }
    doc
}

pub fn tag(value: &str) -> Option<Bson> {
    Some(Bson::String(value.to_string()))
}

/// Holds a running MongoDB container and a router wired to it.
///
/// The container is stopped when this struct is dropped.
pub struct TestEnv {
    _mongo: ContainerAsync<Mongo>,
    pub collection: mongodb::Collection<Document>,
    pub store: Arc<MongoContentStore>,
    pub router: Router,
}

impl TestEnv {
    pub async fn start() -> Self {
        let mongo_container = Mongo::default()
            .start()
            .await
            .expect("Failed to start MongoDB container");
        let mongo_port = mongo_container
            .get_host_port_ipv4(27017)
            .await
            .expect("Failed to get MongoDB port");
        let mongo_uri = format!("mongodb://127.0.0.1:{}", mongo_port);
        let mongo_client = mongodb::Client::with_uri_str(&mongo_uri)
            .await
            .expect("Failed to connect to MongoDB");
        let db = mongo_client.database("neighborly_test");

        let store = Arc::new(MongoContentStore::new(&db, "posts"));
        store
            .ensure_indexes()
            .await
            .expect("Failed to create indexes");

        Self {
            _mongo: mongo_container,
            collection: db.collection("posts"),
            router: router(store.clone()),
            store,
        }
    }

    pub async fn insert(&self, documents: Vec<Document>) {
        self.collection
            .insert_many(documents)
            .await
            .expect("Failed to insert posts");
    }

    pub fn server(&self) -> axum_test::TestServer {
        axum_test::TestServer::builder()
            .expect_success_by_default()
            .try_build(self.router.clone())
            .expect("Failed to build TestServer")
    }
}
