use crate::codec::{encode_tag_value, hash_tag_value};
use crate::index::IndexCatalog;
use crate::query::{FieldCondition, QueryOp};
use itertools::Itertools;
use std::fmt::{Display, Formatter};

/// An execution plan for a find operation.
///
/// The planner translates a parsed query into one of three modes:
///
/// * **Listing** - an empty predicate enumerates the container's documents
///   in natural order; offset and limit apply to the name stream.
/// * **TagFilter** - every pushable condition becomes an atom of a
///   conjunctive tag-filter expression evaluated server-side; conditions
///   the dialect cannot express stay behind as a residual evaluated in
///   memory over the fetched documents.
/// * **FullScan** - nothing is pushable; every document is fetched and the
///   whole predicate runs in memory.
#[derive(Clone, Debug, PartialEq)]
pub(crate) enum FindPlan {
    Listing,
    TagFilter {
        expr: String,
        residual: Vec<FieldCondition>,
    },
    FullScan {
        conditions: Vec<FieldCondition>,
    },
}

impl Display for FindPlan {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            FindPlan::Listing => write!(f, "listing"),
            FindPlan::TagFilter { expr, residual } if residual.is_empty() => {
                write!(f, "tag-filter [{}]", expr)
            }
            FindPlan::TagFilter { expr, residual } => {
                write!(f, "tag-filter [{}] + {} residual", expr, residual.len())
            }
            FindPlan::FullScan { conditions } => {
                write!(f, "full-scan over {} conditions", conditions.len())
            }
        }
    }
}

/// Selects the execution mode for a parsed query against the collection's
/// current catalog.
pub(crate) fn plan_find(conditions: &[FieldCondition], catalog: &IndexCatalog) -> FindPlan {
    if conditions.is_empty() {
        return FindPlan::Listing;
    }

    let mut atoms = Vec::new();
    let mut residual = Vec::new();
    for condition in conditions {
        match tag_filter_atom(condition, catalog) {
            Some(atom) => atoms.push(atom),
            None => residual.push(condition.clone()),
        }
    }

    if atoms.is_empty() {
        return FindPlan::FullScan {
            conditions: conditions.to_vec(),
        };
    }

    if residual.is_empty() {
        note_covering_compound_index(conditions, catalog);
    }

    FindPlan::TagFilter {
        expr: atoms.iter().join(" AND "),
        residual,
    }
}

/// Builds a single-field equality atom, as used by unique-constraint probes.
pub(crate) fn equality_atom(field: &str, encoded: &str) -> String {
    format!("\"{}\" = '{}'", field, quote_value(encoded))
}

/// Renders a condition as a tag-filter atom, or `None` when the condition
/// is not expressible in the server dialect.
///
/// The dialect is conjunction-only with lexicographic comparison: `$in` and
/// `$nin` (disjunction, NOT-IN) are never pushable, hashed fields only
/// support equality, and a value without a tag encoding cannot be compared
/// server-side at all.
fn tag_filter_atom(condition: &FieldCondition, catalog: &IndexCatalog) -> Option<String> {
    let field = condition.field.as_str();
    if !catalog.is_indexed(field) {
        return None;
    }

    if catalog.is_hashed(field) {
        return match &condition.op {
            QueryOp::Eq(value) => {
                let hashed = hash_tag_value(value)?;
                Some(equality_atom(field, &hashed))
            }
            _ => None,
        };
    }

    match &condition.op {
        QueryOp::Eq(value) => {
            let encoded = encode_tag_value(value)?;
            Some(equality_atom(field, &encoded))
        }
        QueryOp::Gt(value) => comparison_atom(field, ">", value),
        QueryOp::Gte(value) => comparison_atom(field, ">=", value),
        QueryOp::Lt(value) => comparison_atom(field, "<", value),
        QueryOp::Lte(value) => comparison_atom(field, "<=", value),
        QueryOp::Between(lo, hi) => {
            let lo = encode_tag_value(lo)?;
            let hi = encode_tag_value(hi)?;
            Some(format!(
                "\"{}\" BETWEEN '{}' AND '{}'",
                field,
                quote_value(&lo),
                quote_value(&hi)
            ))
        }
        QueryOp::In(_) | QueryOp::Nin(_) => None,
    }
}

fn comparison_atom(field: &str, op: &str, value: &serde_json::Value) -> Option<String> {
    let encoded = encode_tag_value(value)?;
    Some(format!("\"{}\" {} '{}'", field, op, quote_value(&encoded)))
}

/// Doubles single quotes inside a value, per the expression grammar. Codec
/// output never contains a quote; raw values passed through by callers may.
fn quote_value(value: &str) -> String {
    if value.contains('\'') {
        value.replace('\'', "''")
    } else {
        value.to_string()
    }
}

/// When a compound definition exactly covers an all-equality query, record
/// that the combination was certified at design time. The expression is the
/// same either way; the note is for plan tracing.
fn note_covering_compound_index(conditions: &[FieldCondition], catalog: &IndexCatalog) {
    if !conditions
        .iter()
        .all(|condition| matches!(condition.op, QueryOp::Eq(_)))
    {
        return;
    }
    for (name, definition) in catalog.indexes() {
        let covered = definition.fields.len() == conditions.len()
            && conditions
                .iter()
                .all(|condition| definition.fields.contains(&condition.field));
        if covered {
            log::debug!("Query covered by compound index {}", name);
            return;
        }
    }
}
