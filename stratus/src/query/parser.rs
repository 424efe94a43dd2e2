use crate::errors::{ErrorKind, StratusError, StratusResult};
use crate::query::condition::{FieldCondition, QueryOp};
use serde_json::Value;

// external operator names
const OP_EQ: &str = "$eq";
const OP_GT: &str = "$gt";
const OP_GTE: &str = "$gte";
const OP_LT: &str = "$lt";
const OP_LTE: &str = "$lte";
const OP_IN: &str = "$in";
const OP_NIN: &str = "$nin";
const OP_BETWEEN: &str = "$between";

/// Parses a document-shaped predicate into a flat conjunction of field
/// conditions.
///
/// Each entry of the predicate object maps a field name to either a scalar
/// (implicit equality) or a nested object of `$`-prefixed operator clauses.
/// Operator clauses on the same field are returned in specification order
/// and must all hold.
///
/// # Errors
///
/// Returns a validation error when the predicate is not a JSON object, an
/// operator is unrecognized, `$in`/`$nin` payloads are not arrays, or a
/// `$between` payload is not a 2-element array. Malformed queries fail the
/// call; they are never silently dropped.
pub fn parse_query(query: &Value) -> StratusResult<Vec<FieldCondition>> {
    let object = match query {
        Value::Object(object) => object,
        other => {
            log::error!("Query must be a JSON object, got: {}", other);
            return Err(StratusError::new(
                "Query must be a JSON object",
                ErrorKind::ValidationError,
            ));
        }
    };

    let mut conditions = Vec::new();
    for (field, spec) in object {
        match spec {
            Value::Object(clauses) if clauses.keys().any(|k| k.starts_with('$')) => {
                for (name, payload) in clauses {
                    conditions.push(FieldCondition::new(field, parse_operator(name, payload)?));
                }
            }
            // a scalar, array, or operator-free object collapses to equality
            other => conditions.push(FieldCondition::new(field, QueryOp::Eq(other.clone()))),
        }
    }
    Ok(conditions)
}

fn parse_operator(name: &str, payload: &Value) -> StratusResult<QueryOp> {
    match name {
        OP_EQ => Ok(QueryOp::Eq(payload.clone())),
        OP_GT => Ok(QueryOp::Gt(payload.clone())),
        OP_GTE => Ok(QueryOp::Gte(payload.clone())),
        OP_LT => Ok(QueryOp::Lt(payload.clone())),
        OP_LTE => Ok(QueryOp::Lte(payload.clone())),
        OP_IN => Ok(QueryOp::In(sequence_payload(name, payload)?)),
        OP_NIN => Ok(QueryOp::Nin(sequence_payload(name, payload)?)),
        OP_BETWEEN => {
            let bounds = sequence_payload(name, payload)?;
            if bounds.len() != 2 {
                log::error!(
                    "{} requires a 2-element range, got {} elements",
                    OP_BETWEEN,
                    bounds.len()
                );
                return Err(StratusError::new(
                    &format!("{} requires a 2-element range", OP_BETWEEN),
                    ErrorKind::ValidationError,
                ));
            }
            let mut bounds = bounds.into_iter();
            let lo = bounds.next().unwrap_or(Value::Null);
            let hi = bounds.next().unwrap_or(Value::Null);
            Ok(QueryOp::Between(lo, hi))
        }
        unknown => {
            log::error!("Unrecognized query operator: {}", unknown);
            Err(StratusError::new(
                &format!("Unrecognized query operator: {}", unknown),
                ErrorKind::ValidationError,
            ))
        }
    }
}

fn sequence_payload(name: &str, payload: &Value) -> StratusResult<Vec<Value>> {
    match payload {
        Value::Array(items) => Ok(items.clone()),
        other => {
            log::error!("{} requires an array payload, got: {}", name, other);
            Err(StratusError::new(
                &format!("{} requires an array payload", name),
                ErrorKind::ValidationError,
            ))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_empty_query() {
        let conditions = parse_query(&json!({})).unwrap();
        assert!(conditions.is_empty());
    }

    #[test]
    fn test_scalar_collapses_to_equality() {
        let conditions = parse_query(&json!({"city": "NYC"})).unwrap();
        assert_eq!(conditions.len(), 1);
        assert_eq!(conditions[0].field, "city");
        assert_eq!(conditions[0].op, QueryOp::Eq(json!("NYC")));
    }

    #[test]
    fn test_operator_clauses() {
        let conditions = parse_query(&json!({"age": {"$gte": 18, "$lt": 30}})).unwrap();
        assert_eq!(conditions.len(), 2);
        assert_eq!(conditions[0].op, QueryOp::Gte(json!(18)));
        assert_eq!(conditions[1].op, QueryOp::Lt(json!(30)));
    }

    #[test]
    fn test_multiple_fields() {
        let conditions = parse_query(&json!({"age": 30, "city": "NYC"})).unwrap();
        assert_eq!(conditions.len(), 2);
    }

    #[test]
    fn test_in_and_nin() {
        let conditions = parse_query(&json!({"city": {"$in": ["NYC", "LA"]}})).unwrap();
        assert_eq!(conditions[0].op, QueryOp::In(vec![json!("NYC"), json!("LA")]));

        let conditions = parse_query(&json!({"city": {"$nin": ["SF"]}})).unwrap();
        assert_eq!(conditions[0].op, QueryOp::Nin(vec![json!("SF")]));
    }

    #[test]
    fn test_in_requires_array() {
        let result = parse_query(&json!({"city": {"$in": "NYC"}}));
        assert!(result.is_err());
        assert_eq!(result.unwrap_err().kind(), &ErrorKind::ValidationError);
    }

    #[test]
    fn test_between() {
        let conditions = parse_query(&json!({"age": {"$between": [26, 34]}})).unwrap();
        assert_eq!(conditions[0].op, QueryOp::Between(json!(26), json!(34)));
    }

    #[test]
    fn test_between_requires_two_elements() {
        let result = parse_query(&json!({"age": {"$between": [26]}}));
        assert!(result.is_err());
        assert_eq!(result.unwrap_err().kind(), &ErrorKind::ValidationError);

        let result = parse_query(&json!({"age": {"$between": [1, 2, 3]}}));
        assert!(result.is_err());
    }

    #[test]
    fn test_unknown_operator_rejected() {
        let result = parse_query(&json!({"age": {"$exists": true}}));
        assert!(result.is_err());
        assert_eq!(result.unwrap_err().kind(), &ErrorKind::ValidationError);
    }

    #[test]
    fn test_non_object_query_rejected() {
        assert!(parse_query(&json!("age")).is_err());
        assert!(parse_query(&json!(42)).is_err());
        assert!(parse_query(&json!([{"age": 1}])).is_err());
    }

    #[test]
    fn test_plain_object_value_is_equality() {
        // an operator-free nested object compares as a literal value
        let conditions = parse_query(&json!({"address": {"city": "NYC"}})).unwrap();
        assert_eq!(conditions.len(), 1);
        assert_eq!(conditions[0].op, QueryOp::Eq(json!({"city": "NYC"})));
    }

    #[test]
    fn test_array_value_is_equality() {
        let conditions = parse_query(&json!({"tags": ["a", "b"]})).unwrap();
        assert_eq!(conditions[0].op, QueryOp::Eq(json!(["a", "b"])));
    }
}
