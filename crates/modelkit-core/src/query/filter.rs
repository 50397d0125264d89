//! Filter evaluation for query execution.
//!
//! This module provides the `FilterEvaluator` that evaluates condition trees
//! against the values reached by each predicate's path.

use std::cmp::Ordering;

use modelkit_proto::{Condition, FieldPath, Operand, Operator, Predicate, Value};

use crate::error::Result;

/// Evaluates condition trees against record data.
pub struct FilterEvaluator;

impl FilterEvaluator {
    /// Evaluate a condition tree.
    ///
    /// `lookup` returns the values a path reaches from the record under
    /// test. A path through a to-many relation may reach several values; a
    /// path reaching nothing yields a single null.
    pub fn evaluate<F>(condition: &Condition, lookup: &mut F) -> Result<bool>
    where
        F: FnMut(&FieldPath) -> Result<Vec<Value>>,
    {
        match condition {
            Condition::Predicate(predicate) => {
                let values = lookup(&predicate.path)?;
                Ok(Self::matches(predicate, &values))
            }
            Condition::And(left, right) => {
                Ok(Self::evaluate(left, lookup)? && Self::evaluate(right, lookup)?)
            }
            Condition::Or(left, right) => {
                Ok(Self::evaluate(left, lookup)? || Self::evaluate(right, lookup)?)
            }
            Condition::Not(inner) => Ok(!Self::evaluate(inner, lookup)?),
        }
    }

    /// Check a predicate against the values its path reaches.
    ///
    /// Positive operators hold when any value matches. Negated operators
    /// hold when no value matches their positive form.
    pub fn matches(predicate: &Predicate, values: &[Value]) -> bool {
        let null = [Value::Null];
        let values = if values.is_empty() { &null[..] } else { values };
        let operand = &predicate.operand;

        match predicate.operator {
            Operator::NotEquals => !Self::any(values, Operator::Equals, operand),
            Operator::NotLike => !Self::any(values, Operator::Like, operand),
            Operator::NotIn => !Self::any(values, Operator::In, operand),
            op => Self::any(values, op, operand),
        }
    }

    fn any(values: &[Value], operator: Operator, operand: &Operand) -> bool {
        values.iter().any(|v| Self::matches_value(v, operator, operand))
    }

    fn matches_value(value: &Value, operator: Operator, operand: &Operand) -> bool {
        let target = match operand {
            Operand::Value(target) => target,
            Operand::List(list) => {
                return match operator {
                    Operator::In | Operator::Equals => {
                        list.iter().any(|t| Self::values_equal(value, t))
                    }
                    _ => false,
                };
            }
        };

        match operator {
            Operator::Equals | Operator::In => Self::values_equal(value, target),
            Operator::Like => match (value, target) {
                (Value::Text(s), Value::Text(p)) => Self::like_match(s, p),
                _ => false,
            },
            Operator::ILike => match (value, target) {
                (Value::Text(s), Value::Text(p)) => {
                    Self::like_match(&s.to_lowercase(), &p.to_lowercase())
                }
                _ => false,
            },
            Operator::Lower => Self::compare_values(value, target).is_some_and(Ordering::is_lt),
            Operator::LowerOrEqual => {
                Self::compare_values(value, target).is_some_and(Ordering::is_le)
            }
            Operator::Greater => Self::compare_values(value, target).is_some_and(Ordering::is_gt),
            Operator::GreaterOrEqual => {
                Self::compare_values(value, target).is_some_and(Ordering::is_ge)
            }
            Operator::NotEquals | Operator::NotLike | Operator::NotIn => {
                !Self::matches_value(value, Self::positive(operator), operand)
            }
        }
    }

    fn positive(operator: Operator) -> Operator {
        match operator {
            Operator::NotEquals => Operator::Equals,
            Operator::NotLike => Operator::Like,
            Operator::NotIn => Operator::In,
            op => op,
        }
    }

    /// Check if two values are equal.
    fn values_equal(a: &Value, b: &Value) -> bool {
        match (a, b) {
            (Value::Null, Value::Null) => true,
            (Value::Bool(a), Value::Bool(b)) => a == b,
            (Value::Integer(a), Value::Integer(b)) => a == b,
            (Value::Float(a), Value::Float(b)) => a == b,
            (Value::Integer(a), Value::Float(b)) => (*a as f64) == *b,
            (Value::Float(a), Value::Integer(b)) => *a == (*b as f64),
            (Value::Text(a), Value::Text(b)) => a == b,
            (Value::Timestamp(a), Value::Timestamp(b)) => a == b,
            (Value::Integer(a), Value::Relation(ids)) | (Value::Relation(ids), Value::Integer(a)) => {
                ids.as_slice() == [*a]
            }
            (Value::Relation(a), Value::Relation(b)) => {
                let mut a = a.clone();
                let mut b = b.clone();
                a.sort_unstable();
                b.sort_unstable();
                a == b
            }
            (Value::Null, Value::Relation(ids)) | (Value::Relation(ids), Value::Null) => {
                ids.is_empty()
            }
            _ => false,
        }
    }

    /// Compare two values, returning their ordering if comparable.
    fn compare_values(a: &Value, b: &Value) -> Option<Ordering> {
        match (a, b) {
            (Value::Integer(a), Value::Integer(b)) => Some(a.cmp(b)),
            (Value::Float(a), Value::Float(b)) => a.partial_cmp(b),
            (Value::Integer(a), Value::Float(b)) => (*a as f64).partial_cmp(b),
            (Value::Float(a), Value::Integer(b)) => a.partial_cmp(&(*b as f64)),
            (Value::Text(a), Value::Text(b)) => Some(a.cmp(b)),
            (Value::Timestamp(a), Value::Timestamp(b)) => Some(a.cmp(b)),
            (Value::Bool(a), Value::Bool(b)) => Some(a.cmp(b)),
            _ => None,
        }
    }

    /// Order two values for sorting; nulls and incomparable values sort first.
    pub fn sort_order(a: &Value, b: &Value) -> Ordering {
        match (a.is_null(), b.is_null()) {
            (true, true) => Ordering::Equal,
            (true, false) => Ordering::Less,
            (false, true) => Ordering::Greater,
            (false, false) => Self::compare_values(a, b).unwrap_or(Ordering::Equal),
        }
    }

    /// Match a string against a SQL LIKE pattern.
    ///
    /// Supports:
    /// - `%` matches zero or more characters
    /// - `_` matches exactly one character
    /// - `\\%` matches literal `%`
    /// - `\\_` matches literal `_`
    pub fn like_match(value: &str, pattern: &str) -> bool {
        let value: Vec<char> = value.chars().collect();
        let pattern: Vec<char> = pattern.chars().collect();
        Self::like_match_at(&value, &pattern)
    }

    fn like_match_at(value: &[char], pattern: &[char]) -> bool {
        match pattern.split_first() {
            None => value.is_empty(),
            Some(('%', rest)) => {
                if rest.is_empty() {
                    return true;
                }
                (0..=value.len()).any(|skip| Self::like_match_at(&value[skip..], rest))
            }
            Some(('_', rest)) => !value.is_empty() && Self::like_match_at(&value[1..], rest),
            Some(('\\', rest)) => match (rest.split_first(), value.split_first()) {
                (Some((p, rest)), Some((c, tail))) if p == c => Self::like_match_at(tail, rest),
                _ => false,
            },
            Some((p, rest)) => match value.split_first() {
                Some((c, tail)) if c == p => Self::like_match_at(tail, rest),
                _ => false,
            },
        }
    }
}
