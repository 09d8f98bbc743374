use std::sync::Arc;

use crate::db::store::ContentStore;
use crate::search::taxonomy::TypeTaxonomy;

/// Shared, read-only state handed to every request.
///
/// Search requests share no mutable state, so nothing here is locked.
#[derive(Clone)]
pub struct AppState {
    pub content_store: Arc<dyn ContentStore>,
    pub taxonomy: Arc<TypeTaxonomy>,
    /// Statuses hidden from search in addition to `deleted`.
    pub exclude_statuses: Arc<Vec<String>>,
    pub leptos_options: leptos::prelude::LeptosOptions,
}

impl axum::extract::FromRef<AppState> for leptos::prelude::LeptosOptions {
    fn from_ref(state: &AppState) -> Self {
        state.leptos_options.clone()
    }
}
