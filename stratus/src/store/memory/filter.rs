//! Parser and evaluator for the conjunctive tag-filter grammar.
//!
//! The grammar accepted here is the one the query planner generates:
//!
//! ```text
//! expr := atom (" AND " atom)*
//! atom := '"' field '"' op quoted
//!       | '"' field '"' "BETWEEN" quoted "AND" quoted
//! op   := "=" | ">" | ">=" | "<" | "<="
//! ```
//!
//! Values are single-quoted with internal quotes doubled. Comparisons are
//! byte-lexicographic, matching the server-side semantics of blob tag
//! search.

use crate::errors::{ErrorKind, StratusError, StratusResult};
use std::collections::BTreeMap;

#[derive(Clone, Debug, PartialEq, Eq)]
pub(crate) enum TagPredicateOp {
    Eq(String),
    Gt(String),
    Gte(String),
    Lt(String),
    Lte(String),
    Between(String, String),
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub(crate) struct TagPredicate {
    pub field: String,
    pub op: TagPredicateOp,
}

/// Evaluates parsed predicates against a blob's tag map.
///
/// A blob without the referenced tag key never matches.
pub(crate) fn matches_tags(
    predicates: &[TagPredicate],
    tags: &BTreeMap<String, String>,
) -> bool {
    predicates.iter().all(|predicate| {
        let value = match tags.get(&predicate.field) {
            Some(value) => value.as_str(),
            None => return false,
        };
        match &predicate.op {
            TagPredicateOp::Eq(expected) => value == expected,
            TagPredicateOp::Gt(bound) => value > bound.as_str(),
            TagPredicateOp::Gte(bound) => value >= bound.as_str(),
            TagPredicateOp::Lt(bound) => value < bound.as_str(),
            TagPredicateOp::Lte(bound) => value <= bound.as_str(),
            TagPredicateOp::Between(lo, hi) => value >= lo.as_str() && value <= hi.as_str(),
        }
    })
}

/// Parses a tag-filter expression into its conjunction of predicates.
pub(crate) fn parse_tag_filter(expr: &str) -> StratusResult<Vec<TagPredicate>> {
    let mut parser = FilterParser::new(expr);
    let mut predicates = Vec::new();

    loop {
        predicates.push(parser.parse_atom()?);
        parser.skip_whitespace();
        if parser.at_end() {
            break;
        }
        parser.expect_keyword("AND")?;
    }

    Ok(predicates)
}

struct FilterParser<'a> {
    chars: Vec<char>,
    pos: usize,
    expr: &'a str,
}

impl<'a> FilterParser<'a> {
    fn new(expr: &'a str) -> Self {
        FilterParser {
            chars: expr.chars().collect(),
            pos: 0,
            expr,
        }
    }

    fn error(&self, message: &str) -> StratusError {
        log::error!("Malformed tag filter {:?}: {}", self.expr, message);
        StratusError::new(
            &format!("Malformed tag filter: {}", message),
            ErrorKind::ValidationError,
        )
    }

    fn at_end(&self) -> bool {
        self.pos >= self.chars.len()
    }

    fn peek(&self) -> Option<char> {
        self.chars.get(self.pos).copied()
    }

    fn skip_whitespace(&mut self) {
        while self.peek() == Some(' ') {
            self.pos += 1;
        }
    }

    fn parse_atom(&mut self) -> StratusResult<TagPredicate> {
        self.skip_whitespace();
        let field = self.parse_quoted('"')?;
        self.skip_whitespace();

        if self.peek() == Some('B') {
            self.expect_keyword("BETWEEN")?;
            let lo = self.parse_quoted('\'')?;
            self.skip_whitespace();
            self.expect_keyword("AND")?;
            let hi = self.parse_quoted('\'')?;
            return Ok(TagPredicate {
                field,
                op: TagPredicateOp::Between(lo, hi),
            });
        }

        let op = self.parse_comparator()?;
        let value = self.parse_quoted('\'')?;
        let op = match op {
            "=" => TagPredicateOp::Eq(value),
            ">" => TagPredicateOp::Gt(value),
            ">=" => TagPredicateOp::Gte(value),
            "<" => TagPredicateOp::Lt(value),
            "<=" => TagPredicateOp::Lte(value),
            other => return Err(self.error(&format!("unknown operator {:?}", other))),
        };
        Ok(TagPredicate { field, op })
    }

    fn parse_comparator(&mut self) -> StratusResult<&'static str> {
        let first = self
            .peek()
            .ok_or_else(|| self.error("expected comparison operator"))?;
        match first {
            '=' => {
                self.pos += 1;
                Ok("=")
            }
            '>' | '<' => {
                self.pos += 1;
                if self.peek() == Some('=') {
                    self.pos += 1;
                    Ok(if first == '>' { ">=" } else { "<=" })
                } else {
                    Ok(if first == '>' { ">" } else { "<" })
                }
            }
            other => Err(self.error(&format!("unexpected character {:?}", other))),
        }
    }

    /// Parses a delimited token. Single-quoted values escape the delimiter
    /// by doubling; double-quoted field names contain no escapes.
    fn parse_quoted(&mut self, delimiter: char) -> StratusResult<String> {
        self.skip_whitespace();
        if self.peek() != Some(delimiter) {
            return Err(self.error(&format!("expected opening {:?}", delimiter)));
        }
        self.pos += 1;

        let mut token = String::new();
        loop {
            match self.peek() {
                None => return Err(self.error(&format!("unterminated {:?} token", delimiter))),
                Some(ch) if ch == delimiter => {
                    if delimiter == '\'' && self.chars.get(self.pos + 1) == Some(&'\'') {
                        token.push('\'');
                        self.pos += 2;
                        continue;
                    }
                    self.pos += 1;
                    return Ok(token);
                }
                Some(ch) => {
                    token.push(ch);
                    self.pos += 1;
                }
            }
        }
    }

    fn expect_keyword(&mut self, keyword: &str) -> StratusResult<()> {
        self.skip_whitespace();
        for expected in keyword.chars() {
            if self.peek() != Some(expected) {
                return Err(self.error(&format!("expected keyword {}", keyword)));
            }
            self.pos += 1;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tags(pairs: &[(&str, &str)]) -> BTreeMap<String, String> {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[test]
    fn test_parse_single_equality() {
        let predicates = parse_tag_filter("\"city\" = 'NYC'").unwrap();
        assert_eq!(predicates.len(), 1);
        assert_eq!(predicates[0].field, "city");
        assert_eq!(predicates[0].op, TagPredicateOp::Eq("NYC".into()));
    }

    #[test]
    fn test_parse_conjunction() {
        let predicates =
            parse_tag_filter("\"age\" >= '.0000000000000000030' AND \"city\" = 'NYC'").unwrap();
        assert_eq!(predicates.len(), 2);
        assert_eq!(
            predicates[0].op,
            TagPredicateOp::Gte(".0000000000000000030".into())
        );
        assert_eq!(predicates[1].op, TagPredicateOp::Eq("NYC".into()));
    }

    #[test]
    fn test_parse_between() {
        let predicates = parse_tag_filter("\"age\" BETWEEN 'a' AND 'b'").unwrap();
        assert_eq!(
            predicates[0].op,
            TagPredicateOp::Between("a".into(), "b".into())
        );
    }

    #[test]
    fn test_parse_between_in_conjunction() {
        let predicates =
            parse_tag_filter("\"age\" BETWEEN 'a' AND 'b' AND \"city\" = 'LA'").unwrap();
        assert_eq!(predicates.len(), 2);
        assert_eq!(predicates[1].field, "city");
    }

    #[test]
    fn test_parse_doubled_quote_in_value() {
        let predicates = parse_tag_filter("\"name\" = 'O''Brien'").unwrap();
        assert_eq!(predicates[0].op, TagPredicateOp::Eq("O'Brien".into()));
    }

    #[test]
    fn test_parse_rejects_malformed() {
        assert!(parse_tag_filter("city = 'NYC'").is_err());
        assert!(parse_tag_filter("\"city\" ~ 'NYC'").is_err());
        assert!(parse_tag_filter("\"city\" = 'NYC").is_err());
        assert!(parse_tag_filter("\"city\" = 'NYC' OR \"a\" = 'b'").is_err());
    }

    #[test]
    fn test_matches_equality_and_missing_key() {
        let predicates = parse_tag_filter("\"city\" = 'NYC'").unwrap();
        assert!(matches_tags(&predicates, &tags(&[("city", "NYC")])));
        assert!(!matches_tags(&predicates, &tags(&[("city", "LA")])));
        assert!(!matches_tags(&predicates, &tags(&[("age", "30")])));
    }

    #[test]
    fn test_matches_lexicographic_ranges() {
        let predicates = parse_tag_filter("\"k\" >= 'b' AND \"k\" < 'd'").unwrap();
        assert!(matches_tags(&predicates, &tags(&[("k", "b")])));
        assert!(matches_tags(&predicates, &tags(&[("k", "c")])));
        assert!(!matches_tags(&predicates, &tags(&[("k", "a")])));
        assert!(!matches_tags(&predicates, &tags(&[("k", "d")])));
    }

    #[test]
    fn test_matches_between_inclusive() {
        let predicates = parse_tag_filter("\"k\" BETWEEN 'b' AND 'd'").unwrap();
        assert!(matches_tags(&predicates, &tags(&[("k", "b")])));
        assert!(matches_tags(&predicates, &tags(&[("k", "d")])));
        assert!(!matches_tags(&predicates, &tags(&[("k", "e")])));
    }
}
