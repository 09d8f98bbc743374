use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::AppError;
use crate::models::content::ContentSummary;
use crate::search::taxonomy::TypeScope;

pub const DEFAULT_PAGE_SIZE: u32 = 20;
pub const MAX_PAGE_SIZE: u32 = 100;
pub const MAX_TERM_CHARS: usize = 200;

/// Result ordering. Ties are always broken by record id, ascending.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortKey {
    /// Creation time, most recent first.
    #[default]
    Newest,
    Oldest,
    Title,
}

impl SortKey {
    pub fn as_str(&self) -> &'static str {
        match self {
            SortKey::Newest => "newest",
            SortKey::Oldest => "oldest",
            SortKey::Title => "title",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().as_str() {
            "newest" => Some(SortKey::Newest),
            "oldest" => Some(SortKey::Oldest),
            "title" => Some(SortKey::Title),
            _ => None,
        }
    }
}

impl fmt::Display for SortKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Raw query string of `GET /search`.
///
/// Every field is kept as text so that malformed values are reported with
/// field-level detail instead of a generic extractor rejection.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct SearchParams {
    pub q: Option<String>,
    pub scope: Option<String>,
    pub page: Option<String>,
    pub size: Option<String>,
    pub sort: Option<String>,
}

impl SearchParams {
    /// Validate into a [`SearchRequest`].
    pub fn validate(self) -> Result<SearchRequest, AppError> {
        let term = self.q.unwrap_or_default().trim().to_string();
        if term.chars().count() > MAX_TERM_CHARS {
            return Err(AppError::validation(
                "q",
                format!("must be at most {MAX_TERM_CHARS} characters"),
            ));
        }

        let scope = match self.scope.as_deref().map(str::trim) {
            None | Some("") => None,
            Some(raw) => Some(TypeScope::parse(raw)?),
        };

        let page = parse_number("page", self.page.as_deref(), 1)?;
        if page < 1 {
            return Err(AppError::validation("page", "must be at least 1"));
        }

        let size = parse_number("size", self.size.as_deref(), DEFAULT_PAGE_SIZE)?;
        if !(1..=MAX_PAGE_SIZE).contains(&size) {
            return Err(AppError::validation(
                "size",
                format!("must be between 1 and {MAX_PAGE_SIZE}"),
            ));
        }

        let sort = match self.sort.as_deref().map(str::trim) {
            None | Some("") => SortKey::default(),
            Some(raw) => SortKey::parse(raw).ok_or_else(|| {
                AppError::validation(
                    "sort",
                    format!("unknown sort key '{raw}'. Expected: newest, oldest, title"),
                )
            })?,
        };

        Ok(SearchRequest {
            term,
            scope,
            page,
            size,
            sort,
        })
    }
}

fn parse_number(field: &str, raw: Option<&str>, default: u32) -> Result<u32, AppError> {
    match raw.map(str::trim) {
        None | Some("") => Ok(default),
        Some(raw) => raw
            .parse::<u32>()
            .map_err(|_| AppError::validation(field, format!("'{raw}' is not a valid number"))),
    }
}

/// A validated search request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchRequest {
    /// Free-text term, trimmed. Empty means no text restriction.
    pub term: String,
    /// `None` means no type restriction.
    pub scope: Option<TypeScope>,
    pub page: u32,
    pub size: u32,
    pub sort: SortKey,
}

impl SearchRequest {
    /// First page of `term` within `scope`, default size and order.
    pub fn new(term: impl Into<String>, scope: Option<TypeScope>) -> Self {
        Self {
            term: term.into(),
            scope,
            page: 1,
            size: DEFAULT_PAGE_SIZE,
            sort: SortKey::default(),
        }
    }

    /// Encode as the query string accepted by `GET /search`.
    pub fn to_query_string(&self) -> String {
        let mut query = format!("q={}", urlencoding::encode(&self.term));
        if let Some(scope) = self.scope {
            query.push_str("&scope=");
            query.push_str(scope.as_str());
        }
        query.push_str(&format!(
            "&page={}&size={}&sort={}",
            self.page, self.size, self.sort
        ));
        query
    }
}

/// One page of search results.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SearchResult {
    pub items: Vec<ContentSummary>,
    /// Number of records matching the predicate across all pages.
    pub total: u64,
    pub page: u32,
    pub size: u32,
}
