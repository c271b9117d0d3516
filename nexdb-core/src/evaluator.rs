//! Query evaluation against a single document's payload.
//!
//! Evaluation is pure and never fails: a field that cannot be resolved simply does
//! not match.
//!
//! # Rules
//!
//! - A non-empty AND list must match completely; the first failing element makes
//!   the whole query false.
//! - A non-empty OR list then decides the result on its own: true if any element
//!   matches, false otherwise.
//! - A query with neither list matches everything.
//!
//! When both lists are present the AND list acts as a gate and the OR list has the
//! final word. Existing callers depend on this ordering.

use serde_json::Value;
use std::borrow::Cow;

use crate::{
    document::{Document, Payload, resolve_path},
    query::{Condition, Element, Operator, Query},
};

/// Evaluates queries against one payload.
pub(crate) struct DocumentEvaluator<'a> {
    payload: &'a Payload,
}

impl<'a> DocumentEvaluator<'a> {
    pub fn new(payload: &'a Payload) -> Self {
        Self { payload }
    }

    /// Returns true if the payload satisfies `query`.
    pub fn evaluate(&self, query: &Query) -> bool {
        self.visit_query(query)
    }

    fn visit_query(&self, query: &Query) -> bool {
        if !query.and.is_empty() && !query.and.iter().all(|element| self.visit_element(element)) {
            return false;
        }

        if !query.or.is_empty() {
            return query.or.iter().any(|element| self.visit_element(element));
        }

        true
    }

    fn visit_element(&self, element: &Element) -> bool {
        match element {
            Element::Condition(condition) => self.visit_condition(condition),
            Element::Query(query) => self.visit_query(query),
        }
    }

    fn visit_condition(&self, condition: &Condition) -> bool {
        let Some(field) = resolve_path(self.payload, &condition.field) else {
            return false;
        };

        match condition.operator {
            Operator::Equals => {
                as_comparable_string(field).is_some_and(|text| text == condition.value)
            }
            Operator::Contains => field
                .as_str()
                .is_some_and(|text| text.contains(condition.value.as_str())),
        }
    }
}

/// Renders a scalar field value as the string an `equals` condition compares with.
///
/// Strings compare verbatim, numbers by their JSON text (`30`, `1.5`) and booleans
/// as `true`/`false`. Null, objects and arrays never compare equal.
fn as_comparable_string(value: &Value) -> Option<Cow<'_, str>> {
    match value {
        Value::String(text) => Some(Cow::Borrowed(text)),
        Value::Number(number) => Some(Cow::Owned(number.to_string())),
        Value::Bool(flag) => Some(Cow::Owned(flag.to_string())),
        Value::Null | Value::Array(_) | Value::Object(_) => None,
    }
}

/// Returns true if `document`'s payload satisfies `query`.
pub fn matches(document: &Document, query: &Query) -> bool {
    DocumentEvaluator::new(document.data()).evaluate(query)
}
