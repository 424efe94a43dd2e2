use serde_json::Value;
use std::fmt::{Display, Formatter};

/// A single query operator with its payload.
///
/// The operator set is closed: the in-memory evaluator and the tag-filter
/// generator are both total matches over this sum, so adding a variant
/// forces every execution path to account for it.
#[derive(Clone, Debug, PartialEq)]
pub enum QueryOp {
    /// Strict equality (after ISO-date normalization).
    Eq(Value),
    /// Strictly greater than.
    Gt(Value),
    /// Greater than or equal.
    Gte(Value),
    /// Strictly less than.
    Lt(Value),
    /// Less than or equal.
    Lte(Value),
    /// Membership in a finite sequence.
    In(Vec<Value>),
    /// Non-membership: true when the field is present and not in the set.
    Nin(Vec<Value>),
    /// Inclusive two-ended range.
    Between(Value, Value),
}

impl Display for QueryOp {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            QueryOp::Eq(v) => write!(f, "= {}", v),
            QueryOp::Gt(v) => write!(f, "> {}", v),
            QueryOp::Gte(v) => write!(f, ">= {}", v),
            QueryOp::Lt(v) => write!(f, "< {}", v),
            QueryOp::Lte(v) => write!(f, "<= {}", v),
            QueryOp::In(vs) => write!(f, "in [{} values]", vs.len()),
            QueryOp::Nin(vs) => write!(f, "not in [{} values]", vs.len()),
            QueryOp::Between(lo, hi) => write!(f, "between {} and {}", lo, hi),
        }
    }
}

/// A predicate on a single document field.
///
/// A query is a conjunction of field conditions; a field co-specified with
/// multiple operators (e.g. `{"age": {"$gte": 18, "$lt": 30}}`) contributes
/// one condition per operator, all of which must hold.
#[derive(Clone, Debug, PartialEq)]
pub struct FieldCondition {
    pub field: String,
    pub op: QueryOp,
}

impl FieldCondition {
    pub fn new(field: &str, op: QueryOp) -> Self {
        FieldCondition {
            field: field.to_string(),
            op,
        }
    }
}

impl Display for FieldCondition {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} {}", self.field, self.op)
    }
}
