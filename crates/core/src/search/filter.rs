//! Metadata filtering for search queries.
//!
//! Two filter forms are supported and ANDed together:
//! - an equality filter ([`Metadata`]): every key must be present with an equal value
//! - a [`FilterClause`] with `must` / `must_not` conditions and operators
//!   `eq`, `ne`, `gt`, `lt`, `gte`, `lte`, `in`
//!
//! Numbers compare as `f64`, so `1` and `1.0` are equal.

use crate::document::Metadata;
use crate::filter_types::{FilterClause, FilterCondition, FilterOperator};
use serde_json::Value;
use std::cmp::Ordering;

/// Returns `true` if every key of `filter` is present in `metadata` with an equal value.
pub fn matches_equality(metadata: &Metadata, filter: &Metadata) -> bool {
    filter
        .iter()
        .all(|(key, expected)| metadata.get(key).is_some_and(|v| values_equal(v, expected)))
}

/// Check if metadata matches the given filter clause.
/// `must` conditions are AND-ed; `must_not` conditions are AND-NOT-ed.
pub fn matches_filter(metadata: &Metadata, filter: &FilterClause) -> bool {
    filter.must.iter().all(|cond| evaluate_condition(metadata, cond))
        && !filter.must_not.iter().any(|cond| evaluate_condition(metadata, cond))
}

/// Both filter forms, each optional.
pub fn matches_metadata(
    metadata: &Metadata,
    equality: Option<&Metadata>,
    clause: Option<&FilterClause>,
) -> bool {
    equality.map_or(true, |f| matches_equality(metadata, f))
        && clause.map_or(true, |c| matches_filter(metadata, c))
}

fn evaluate_condition(metadata: &Metadata, cond: &FilterCondition) -> bool {
    let Some(field_value) = metadata.get(&cond.field) else {
        return false;
    };

    if cond.op == FilterOperator::In {
        return cond
            .values
            .as_ref()
            .is_some_and(|vals| vals.iter().any(|v| values_equal(field_value, v)));
    }

    let Some(ref val) = cond.value else {
        return false;
    };
    match cond.op {
        FilterOperator::Eq => values_equal(field_value, val),
        FilterOperator::Ne => !values_equal(field_value, val),
        FilterOperator::Gt => compare(field_value, val) == Some(Ordering::Greater),
        FilterOperator::Lt => compare(field_value, val) == Some(Ordering::Less),
        FilterOperator::Gte => compare(field_value, val).is_some_and(|o| o != Ordering::Less),
        FilterOperator::Lte => compare(field_value, val).is_some_and(|o| o != Ordering::Greater),
        FilterOperator::In => unreachable!("handled above"),
    }
}

/// Structural equality with numeric values compared as `f64`.
fn values_equal(a: &Value, b: &Value) -> bool {
    match (a, b) {
        (Value::Number(x), Value::Number(y)) => match (x.as_f64(), y.as_f64()) {
            (Some(x), Some(y)) => x == y,
            _ => x == y,
        },
        (Value::Array(xs), Value::Array(ys)) => {
            xs.len() == ys.len() && xs.iter().zip(ys).all(|(x, y)| values_equal(x, y))
        }
        (Value::Object(xs), Value::Object(ys)) => {
            xs.len() == ys.len()
                && xs
                    .iter()
                    .all(|(k, x)| ys.get(k).is_some_and(|y| values_equal(x, y)))
        }
        _ => a == b,
    }
}

/// Ordering for numbers and strings; `None` for anything else or mixed types.
fn compare(a: &Value, b: &Value) -> Option<Ordering> {
    match (a, b) {
        (Value::Number(x), Value::Number(y)) => x.as_f64()?.partial_cmp(&y.as_f64()?),
        (Value::String(x), Value::String(y)) => Some(x.cmp(y)),
        _ => None,
    }
}
