//! Query model for collection scans.
//!
//! A [`Query`] is a list of AND-ed [`Element`]s and a list of OR-ed elements. An
//! element is either a leaf [`Condition`] or a nested query. The wire form is
//! JSON:
//!
//! ```json
//! {
//!   "and": [{ "field": "age", "operator": "equals", "value": "30" }],
//!   "or": [
//!     { "field": "name", "operator": "contains", "value": "oh" },
//!     { "and": [{ "field": "address.city", "operator": "equals", "value": "Leeds" }] }
//!   ]
//! }
//! ```
//!
//! Queries can also be built with [`Query::builder`]:
//!
//! ```ignore
//! use nexdb::query::{Condition, Query};
//!
//! let query = Query::builder()
//!     .and(Condition::equals("age", "30"))
//!     .or(Condition::contains("name", "oh"))
//!     .build();
//! ```
//!
//! See [`crate::evaluator`] for how queries are evaluated.

use serde::{Deserialize, Serialize};

/// Comparison operator of a [`Condition`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Operator {
    /// The field, rendered as a string, equals the value.
    Equals,
    /// The field is a string containing the value.
    Contains,
}

/// A leaf comparison of one payload field against a string value.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Condition {
    /// Dot-separated path into the payload.
    pub field: String,
    pub operator: Operator,
    pub value: String,
}

impl Condition {
    pub fn new(field: impl Into<String>, operator: Operator, value: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            operator,
            value: value.into(),
        }
    }

    /// Creates an [`Operator::Equals`] condition.
    pub fn equals(field: impl Into<String>, value: impl Into<String>) -> Self {
        Self::new(field, Operator::Equals, value)
    }

    /// Creates an [`Operator::Contains`] condition.
    pub fn contains(field: impl Into<String>, value: impl Into<String>) -> Self {
        Self::new(field, Operator::Contains, value)
    }
}

/// One entry of a query's AND or OR list.
///
/// Deserialization tries a condition first and falls back to a nested query.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Element {
    Condition(Condition),
    Query(Query),
}

impl From<Condition> for Element {
    fn from(condition: Condition) -> Self {
        Element::Condition(condition)
    }
}

impl From<Query> for Element {
    fn from(query: Query) -> Self {
        Element::Query(query)
    }
}

/// A boolean filter expression.
///
/// The empty query matches every document.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Query {
    /// Elements that must all match.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub and: Vec<Element>,
    /// Elements of which at least one must match.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub or: Vec<Element>,
}

impl Query {
    /// Creates the empty, match-everything query.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a new query builder for fluent construction.
    pub fn builder() -> QueryBuilder {
        QueryBuilder::new()
    }

    /// Returns true if the query has neither AND nor OR elements.
    pub fn is_empty(&self) -> bool {
        self.and.is_empty() && self.or.is_empty()
    }
}

#[derive(Debug, Clone, Default)]
pub struct QueryBuilder {
    query: Query,
}

impl QueryBuilder {
    pub fn new() -> Self {
        QueryBuilder { query: Query::default() }
    }

    /// Appends an element to the AND list.
    pub fn and(mut self, element: impl Into<Element>) -> Self {
        self.query.and.push(element.into());
        self
    }

    /// Appends an element to the OR list.
    pub fn or(mut self, element: impl Into<Element>) -> Self {
        self.query.or.push(element.into());
        self
    }

    pub fn build(self) -> Query {
        self.query
    }
}
