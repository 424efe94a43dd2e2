use crate::collection::Document;
use crate::common::parse_iso_datetime;
use crate::query::condition::{FieldCondition, QueryOp};
use serde_json::Value;
use std::cmp::Ordering;

/// Evaluates a conjunction of field conditions against a document.
///
/// Every condition must hold. An absent field fails every operator,
/// including `$nin`: missing fields satisfy neither positive nor negative
/// membership tests. This asymmetry is deliberate; callers that want
/// "absent or not in set" semantics must model absence explicitly.
pub fn matches_document(conditions: &[FieldCondition], document: &Document) -> bool {
    conditions
        .iter()
        .all(|condition| matches_condition(condition, document.get(&condition.field)))
}

fn matches_condition(condition: &FieldCondition, field_value: Option<&Value>) -> bool {
    let value = match field_value {
        Some(value) => value,
        None => return false,
    };

    match &condition.op {
        QueryOp::Eq(expected) => values_equal(value, expected),
        QueryOp::Gt(bound) => compare_values(value, bound) == Some(Ordering::Greater),
        QueryOp::Gte(bound) => matches!(
            compare_values(value, bound),
            Some(Ordering::Greater) | Some(Ordering::Equal)
        ),
        QueryOp::Lt(bound) => compare_values(value, bound) == Some(Ordering::Less),
        QueryOp::Lte(bound) => matches!(
            compare_values(value, bound),
            Some(Ordering::Less) | Some(Ordering::Equal)
        ),
        QueryOp::In(set) => set.iter().any(|candidate| values_equal(value, candidate)),
        QueryOp::Nin(set) => !set.iter().any(|candidate| values_equal(value, candidate)),
        QueryOp::Between(lo, hi) => {
            matches!(
                compare_values(value, lo),
                Some(Ordering::Greater) | Some(Ordering::Equal)
            ) && matches!(
                compare_values(value, hi),
                Some(Ordering::Less) | Some(Ordering::Equal)
            )
        }
    }
}

/// Strict equality after normalization.
///
/// Numbers compare numerically across integer/float representations, and
/// strings that both parse as ISO-8601 timestamps compare as instants.
fn values_equal(a: &Value, b: &Value) -> bool {
    match (a, b) {
        (Value::Number(x), Value::Number(y)) => number_cmp(x, y) == Some(Ordering::Equal),
        (Value::String(x), Value::String(y)) => {
            match (parse_iso_datetime(x), parse_iso_datetime(y)) {
                (Some(dx), Some(dy)) => dx.timestamp_millis() == dy.timestamp_millis(),
                _ => x == y,
            }
        }
        _ => a == b,
    }
}

/// Natural comparison on numbers, timestamps, and strings.
///
/// Mixed types are incomparable and return `None`, which fails the
/// enclosing predicate (rather than raising an error).
fn compare_values(a: &Value, b: &Value) -> Option<Ordering> {
    match (a, b) {
        (Value::Number(x), Value::Number(y)) => number_cmp(x, y),
        (Value::String(x), Value::String(y)) => {
            match (parse_iso_datetime(x), parse_iso_datetime(y)) {
                (Some(dx), Some(dy)) => {
                    Some(dx.timestamp_millis().cmp(&dy.timestamp_millis()))
                }
                _ => Some(x.as_str().cmp(y.as_str())),
            }
        }
        _ => None,
    }
}

fn number_cmp(x: &serde_json::Number, y: &serde_json::Number) -> Option<Ordering> {
    if let (Some(a), Some(b)) = (x.as_i64(), y.as_i64()) {
        return Some(a.cmp(&b));
    }
    if let (Some(a), Some(b)) = (x.as_u64(), y.as_u64()) {
        return Some(a.cmp(&b));
    }
    match (x.as_f64(), y.as_f64()) {
        (Some(a), Some(b)) => a.partial_cmp(&b),
        _ => None,
    }
}
