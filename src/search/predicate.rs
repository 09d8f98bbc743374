//! Boolean query predicates over content records.
//!
//! A [`Predicate`] is a tree of `All`/`Any` groups over [`Condition`] leaves.
//! Groups can only be produced by combining existing predicates, so an empty
//! `$and`/`$or` cannot be represented. The same tree is translated into a
//! MongoDB filter for the real store and evaluated directly against raw BSON
//! documents by the in-memory store.

use std::collections::BTreeSet;

use bson::{doc, Bson, Document};

use crate::search::taxonomy::{TypeScope, TypeTaxonomy};

pub const FIELD_TITLE: &str = "title";
pub const FIELD_BODY: &str = "body";
pub const FIELD_TYPE: &str = "metadata.type";
pub const FIELD_STATUS: &str = "status";

/// Status that is excluded from every search.
pub const STATUS_DELETED: &str = "deleted";

/// A single test against one (possibly dotted) field.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Condition {
    /// Case-insensitive substring match on a string field.
    Contains { field: &'static str, needle: String },
    /// Field holds one of the given strings.
    OneOf {
        field: &'static str,
        values: Vec<String>,
    },
    /// Field is absent or holds none of the given strings.
    NoneOf {
        field: &'static str,
        values: Vec<String>,
    },
    /// Field is not present at all.
    Missing { field: &'static str },
    /// Field is present and explicitly null.
    Null { field: &'static str },
}

/// Shape of a predicate node.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Node {
    /// Every child must match. Always holds at least two children.
    All(Vec<Predicate>),
    /// At least one child must match. Always holds at least two children.
    Any(Vec<Predicate>),
    Leaf(Condition),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Predicate {
    node: Node,
}

impl Predicate {
    pub fn leaf(condition: Condition) -> Self {
        Self {
            node: Node::Leaf(condition),
        }
    }

    /// Conjunction with an optional clause. `None` leaves `self` unchanged.
    pub fn and(self, other: Option<Predicate>) -> Self {
        match other {
            None => self,
            Some(other) => {
                let mut children = self.into_all_children();
                children.extend(other.into_all_children());
                Self {
                    node: Node::All(children),
                }
            }
        }
    }

    /// Disjunction with another clause.
    pub fn or(self, other: Predicate) -> Self {
        let mut children = self.into_any_children();
        children.extend(other.into_any_children());
        Self {
            node: Node::Any(children),
        }
    }

    pub fn node(&self) -> &Node {
        &self.node
    }

    fn into_all_children(self) -> Vec<Predicate> {
        match self.node {
            Node::All(children) => children,
            node => vec![Self { node }],
        }
    }

    fn into_any_children(self) -> Vec<Predicate> {
        match self.node {
            Node::Any(children) => children,
            node => vec![Self { node }],
        }
    }

    /// Translate into a MongoDB query filter.
    pub fn to_filter(&self) -> Document {
        match &self.node {
            Node::All(children) => doc! { "$and": group_filters(children) },
            Node::Any(children) => doc! { "$or": group_filters(children) },
            Node::Leaf(condition) => condition.to_filter(),
        }
    }

    /// Evaluate against a raw stored document.
    pub fn matches(&self, record: &Document) -> bool {
        match &self.node {
            Node::All(children) => children.iter().all(|c| c.matches(record)),
            Node::Any(children) => children.iter().any(|c| c.matches(record)),
            Node::Leaf(condition) => condition.matches(record),
        }
    }
}

fn group_filters(children: &[Predicate]) -> Vec<Bson> {
    children
        .iter()
        .map(|child| Bson::Document(child.to_filter()))
        .collect()
}

impl Condition {
    pub fn to_filter(&self) -> Document {
        let (field, test) = match self {
            Condition::Contains { field, needle } => (
                field,
                doc! { "$regex": regex::escape(needle), "$options": "i" },
            ),
            Condition::OneOf { field, values } => (field, doc! { "$in": values.clone() }),
            Condition::NoneOf { field, values } => (field, doc! { "$nin": values.clone() }),
            Condition::Missing { field } => (field, doc! { "$exists": false }),
            Condition::Null { field } => (field, doc! { "$type": "null" }),
        };

        let mut filter = Document::new();
        filter.insert(*field, test);
        filter
    }

    pub fn matches(&self, record: &Document) -> bool {
        match self {
            Condition::Contains { field, needle } => match lookup(record, field) {
                Some(Bson::String(value)) => value.to_lowercase().contains(&needle.to_lowercase()),
                _ => false,
            },
            Condition::OneOf { field, values } => match lookup(record, field) {
                Some(Bson::String(value)) => values.iter().any(|v| v == value),
                _ => false,
            },
            Condition::NoneOf { field, values } => match lookup(record, field) {
                Some(Bson::String(value)) => !values.iter().any(|v| v == value),
                _ => true,
            },
            Condition::Missing { field } => lookup(record, field).is_none(),
            Condition::Null { field } => matches!(lookup(record, field), Some(Bson::Null)),
        }
    }
}

/// Resolve a dotted path such as `metadata.type`.
fn lookup<'a>(record: &'a Document, path: &str) -> Option<&'a Bson> {
    let mut segments = path.split('.');
    let mut current = record.get(segments.next()?)?;
    for segment in segments {
        match current {
            Bson::Document(inner) => current = inner.get(segment)?,
            _ => return None,
        }
    }
    Some(current)
}

/// Composes search predicates from a term, a type scope and excluded statuses.
pub struct PredicateBuilder<'a> {
    taxonomy: &'a TypeTaxonomy,
}

impl<'a> PredicateBuilder<'a> {
    pub fn new(taxonomy: &'a TypeTaxonomy) -> Self {
        Self { taxonomy }
    }

    /// Build `status-exclusion AND text? AND type?`.
    ///
    /// Absent clauses are dropped. `deleted` is always excluded in addition
    /// to `exclude_statuses`.
    pub fn build(
        &self,
        term: &str,
        scope: Option<TypeScope>,
        exclude_statuses: &[String],
    ) -> Predicate {
        status_clause(exclude_statuses)
            .and(text_clause(term))
            .and(scope.map(|scope| self.type_clause(scope)))
    }

    fn type_clause(&self, scope: TypeScope) -> Predicate {
        let known = Predicate::leaf(Condition::OneOf {
            field: FIELD_TYPE,
            values: self.taxonomy.variants_for(scope).iter().cloned().collect(),
        });

        match scope {
            TypeScope::Board => Predicate::leaf(Condition::Missing { field: FIELD_TYPE })
                .or(Predicate::leaf(Condition::Null { field: FIELD_TYPE }))
                .or(known),
            _ => known,
        }
    }
}

fn status_clause(exclude_statuses: &[String]) -> Predicate {
    let mut excluded: BTreeSet<String> = exclude_statuses
        .iter()
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
        .collect();
    excluded.insert(STATUS_DELETED.to_string());

    Predicate::leaf(Condition::NoneOf {
        field: FIELD_STATUS,
        values: excluded.into_iter().collect(),
    })
}

fn text_clause(term: &str) -> Option<Predicate> {
    let term = term.trim();
    if term.is_empty() {
        return None;
    }

    Some(
        Predicate::leaf(Condition::Contains {
            field: FIELD_TITLE,
            needle: term.to_string(),
        })
        .or(Predicate::leaf(Condition::Contains {
            field: FIELD_BODY,
            needle: term.to_string(),
        })),
    )
}
