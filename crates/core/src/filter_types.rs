//! Metadata filter types for search queries.
//!
//! Defines the structured filter clause evaluated against entry metadata in
//! addition to the plain equality filter.

use serde::{Deserialize, Serialize};

/// Metadata filter clause with `must` (AND) and `must_not` (AND-NOT) conditions.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FilterClause {
    #[serde(default)]
    pub must: Vec<FilterCondition>,
    #[serde(default)]
    pub must_not: Vec<FilterCondition>,
}

/// A single filter condition on a metadata field.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FilterCondition {
    pub field: String,
    pub op: FilterOperator,
    #[serde(default)]
    pub value: Option<serde_json::Value>,
    #[serde(default)]
    pub values: Option<Vec<serde_json::Value>>,
}

impl FilterCondition {
    /// Condition comparing `field` against a single value.
    pub fn new(field: impl Into<String>, op: FilterOperator, value: serde_json::Value) -> Self {
        Self {
            field: field.into(),
            op,
            value: Some(value),
            values: None,
        }
    }

    /// `in` condition: `field` equals any of `values`.
    pub fn any_of(field: impl Into<String>, values: Vec<serde_json::Value>) -> Self {
        Self {
            field: field.into(),
            op: FilterOperator::In,
            value: None,
            values: Some(values),
        }
    }
}

/// Comparison operator for filter conditions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FilterOperator {
    Eq,
    Ne,
    Gt,
    Lt,
    Gte,
    Lte,
    In,
}
