use crate::db::store::ContentStore;
use crate::error::AppError;
use crate::models::search::{SearchRequest, SearchResult};
use crate::search::assembler::PaginatedResultAssembler;
use crate::search::predicate::PredicateBuilder;
use crate::search::taxonomy::TypeTaxonomy;

/// Core search logic, separated from the HTTP layer for testability.
///
/// Builds the predicate for the request's term and scope, then pages
/// through the store.
pub async fn process_search(
    store: &dyn ContentStore,
    taxonomy: &TypeTaxonomy,
    exclude_statuses: &[String],
    request: &SearchRequest,
) -> Result<SearchResult, AppError> {
    let predicate = PredicateBuilder::new(taxonomy).build(
        &request.term,
        request.scope,
        exclude_statuses,
    );

    PaginatedResultAssembler::new(store, taxonomy)
        .execute(&predicate, request.page, request.size, request.sort)
        .await
}

/// Axum handler for `GET /search`.
///
/// Only available when the `ssr` feature is enabled.
#[cfg(feature = "ssr")]
pub async fn search_handler(
    axum::extract::State(state): axum::extract::State<crate::state::AppState>,
    query: Result<
        axum::extract::Query<crate::models::search::SearchParams>,
        axum::extract::rejection::QueryRejection,
    >,
) -> Result<axum::Json<SearchResult>, AppError> {
    let axum::extract::Query(params) = query.map_err(|rejection| {
        let detail = rejection.body_text();
        tracing::debug!("Rejected search query string: {detail}");
        AppError::validation(rejected_field(&detail), detail)
    })?;

    let request = params.validate().inspect_err(|e| {
        tracing::debug!("Rejected search request: {e}");
    })?;

    tracing::debug!(
        term = %request.term,
        scope = ?request.scope,
        page = request.page,
        size = request.size,
        sort = %request.sort,
        "search"
    );

    let result = process_search(
        state.content_store.as_ref(),
        &state.taxonomy,
        &state.exclude_statuses,
        &request,
    )
    .await
    .inspect_err(|e| {
        if e.is_retryable() {
            tracing::warn!("Search store unavailable: {e}");
        } else {
            tracing::error!("Search failed: {e}");
        }
    })?;

    Ok(axum::Json(result))
}

/// The parameter named in a query-string deserialization error, e.g.
/// ``duplicate field `page` ``. Falls back to `query`.
#[cfg(any(feature = "ssr", test))]
fn rejected_field(detail: &str) -> String {
    detail
        .split_once("field `")
        .and_then(|(_, rest)| rest.split_once('`'))
        .map(|(field, _)| field.to_string())
        .unwrap_or_else(|| "query".to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::store::MemoryContentStore;
    use crate::search::taxonomy::TypeScope;
    use bson::oid::ObjectId;
    use bson::{doc, Bson, Document};

    fn post(title: &str, body: &str, kind: Option<Bson>, status: &str, millis: i64) -> Document {
        let mut doc = doc! {
            "_id": ObjectId::new(),
            "title": title,
            "body": body,
            "slug": title.to_lowercase().replace(' ', "-"),
            "service": "community",
            "status": status,
            "created_at": bson::DateTime::from_millis(millis),
        };
        if let Some(kind) = kind {
            doc.insert("metadata", doc! { "type": kind });
        }
        doc
    }

    fn tag(value: &str) -> Option<Bson> {
        Some(Bson::String(value.to_string()))
    }

    fn request(term: &str, scope: Option<TypeScope>) -> SearchRequest {
        SearchRequest::new(term, scope)
    }

    #[tokio::test]
    async fn test_board_scope_with_term_ignores_other_scopes() {
        let taxonomy = TypeTaxonomy::builtin().unwrap();
        let store = MemoryContentStore::new(vec![
            post("test board post", "", Some(Bson::Null), "published", 1),
            post("test property post", "", tag("property-info"), "published", 2),
        ]);

        let result = process_search(
            &store,
            &taxonomy,
            &[],
            &request("test", Some(TypeScope::Board)),
        )
        .await
        .unwrap();

        assert_eq!(result.total, 1);
        assert_eq!(result.items.len(), 1);
        assert_eq!(result.items[0].title, "test board post");
    }

    #[tokio::test]
    async fn test_property_scope_matches_current_and_legacy_tags() {
        let taxonomy = TypeTaxonomy::builtin().unwrap();
        let store = MemoryContentStore::new(vec![
            post("Lease guide", "", tag("property-info"), "published", 1),
            post("Deposit rules", "", tag("property_info"), "published", 2),
            post("Board chat", "", None, "published", 3),
            post("Movers", "", tag("moving-service"), "published", 4),
        ]);

        let result = process_search(
            &store,
            &taxonomy,
            &[],
            &request("", Some(TypeScope::PropertyInfo)),
        )
        .await
        .unwrap();

        let mut titles: Vec<_> = result.items.iter().map(|i| i.title.clone()).collect();
        titles.sort();
        assert_eq!(titles, vec!["Deposit rules", "Lease guide"]);
        assert!(result
            .items
            .iter()
            .all(|i| i.scope == Some(TypeScope::PropertyInfo)));
    }

    #[tokio::test]
    async fn test_scope_only_query_matches_effective_scope() {
        let taxonomy = TypeTaxonomy::builtin().unwrap();
        let records = vec![
            post("a", "", None, "published", 1),
            post("b", "", Some(Bson::Null), "published", 2),
            post("c", "", tag("board"), "published", 3),
            post("d", "", tag("general"), "published", 4),
            post("e", "", tag("propertyInfo"), "published", 5),
            post("f", "", tag("moving"), "published", 6),
            post("g", "", tag("expertTip"), "published", 7),
            post("h", "", tag("poll"), "published", 8),
        ];
        let store = MemoryContentStore::new(records.clone());

        for scope in TypeScope::ALL {
            let result = process_search(&store, &taxonomy, &[], &request("", Some(scope)))
                .await
                .unwrap();

            let expected: Vec<&str> = records
                .iter()
                .filter(|doc| {
                    let kind = doc
                        .get_document("metadata")
                        .ok()
                        .and_then(|m| m.get_str("type").ok());
                    taxonomy.scope_of_tag(kind) == Some(scope)
                })
                .map(|doc| doc.get_str("title").unwrap())
                .collect();

            let mut returned: Vec<&str> = result.items.iter().map(|i| i.title.as_str()).collect();
            returned.sort();
            let mut expected = expected;
            expected.sort();
            assert_eq!(returned, expected, "scope {scope}");
        }
    }

    #[tokio::test]
    async fn test_unscoped_query_excludes_deleted_only() {
        let taxonomy = TypeTaxonomy::builtin().unwrap();
        let store = MemoryContentStore::new(vec![
            post("kept", "", tag("poll"), "published", 1),
            post("gone", "", None, "deleted", 2),
            post("draft", "", None, "draft", 3),
        ]);

        let result = process_search(&store, &taxonomy, &[], &request("", None))
            .await
            .unwrap();
        assert_eq!(result.total, 2);

        let result = process_search(
            &store,
            &taxonomy,
            &["draft".to_string()],
            &request("", None),
        )
        .await
        .unwrap();
        assert_eq!(result.total, 1);
        assert_eq!(result.items[0].title, "kept");
    }

    #[test]
    fn test_rejected_field_names_the_parameter() {
        assert_eq!(
            rejected_field("Failed to deserialize query string: duplicate field `page`"),
            "page"
        );
        assert_eq!(rejected_field("Failed to deserialize query string"), "query");
    }

    #[tokio::test]
    async fn test_record_without_status_or_created_at_is_listed() {
        let taxonomy = TypeTaxonomy::builtin().unwrap();
        let store = MemoryContentStore::new(vec![
            doc! {
                "_id": ObjectId::new(),
                "title": "Imported notice",
                "body": "From the old board",
                "slug": "imported-notice",
            },
            post("Fresh post", "", None, "published", 1),
        ]);

        let result = process_search(&store, &taxonomy, &[], &request("", None))
            .await
            .unwrap();

        assert_eq!(result.total, 2);
        assert_eq!(result.items[0].title, "Fresh post");
        assert_eq!(result.items[1].title, "Imported notice");
        assert!(result.items[1].created_at.is_none());

        let result = process_search(&store, &taxonomy, &[], &request("", Some(TypeScope::Board)))
            .await
            .unwrap();
        assert_eq!(result.total, 2);
    }

    #[tokio::test]
    async fn test_term_matches_body_case_insensitively() {
        let taxonomy = TypeTaxonomy::builtin().unwrap();
        let store = MemoryContentStore::new(vec![
            post("Weekend plans", "Need a MOVING truck", None, "published", 1),
            post("Unrelated", "nothing here", None, "published", 2),
        ]);

        let result = process_search(&store, &taxonomy, &[], &request("moving truck", None))
            .await
            .unwrap();
        assert_eq!(result.total, 1);
        assert_eq!(result.items[0].title, "Weekend plans");
    }
}
