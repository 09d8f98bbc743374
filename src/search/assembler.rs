use crate::db::store::{ContentStore, QueryWindow};
use crate::error::AppError;
use crate::models::content::build_summary;
use crate::models::search::{SearchResult, SortKey};
use crate::search::predicate::Predicate;
use crate::search::taxonomy::TypeTaxonomy;

/// Runs a predicate against the store and assembles one page of results.
pub struct PaginatedResultAssembler<'a> {
    store: &'a dyn ContentStore,
    taxonomy: &'a TypeTaxonomy,
}

impl<'a> PaginatedResultAssembler<'a> {
    pub fn new(store: &'a dyn ContentStore, taxonomy: &'a TypeTaxonomy) -> Self {
        Self { store, taxonomy }
    }

    /// Return page `page` (1-based) of `size` records ordered by `sort`.
    ///
    /// A page past the last one yields no items but still reports the total.
    pub async fn execute(
        &self,
        predicate: &Predicate,
        page: u32,
        size: u32,
        sort: SortKey,
    ) -> Result<SearchResult, AppError> {
        if page == 0 {
            return Err(AppError::validation("page", "must be at least 1"));
        }
        if size == 0 {
            return Err(AppError::validation("size", "must be at least 1"));
        }

        let window = QueryWindow {
            sort,
            skip: u64::from(page - 1) * u64::from(size),
            limit: u64::from(size),
        };

        let mut found = self.store.query(predicate, window).await?;
        found.records.truncate(size as usize);

        let items: Vec<_> = found
            .records
            .iter()
            .map(|record| build_summary(record, self.taxonomy))
            .collect();
        let total = found.total.max(items.len() as u64);

        Ok(SearchResult {
            items,
            total,
            page,
            size,
        })
    }
}
