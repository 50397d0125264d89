//! Condition trees used to filter record collections.
//!
//! A condition is a binary tree: leaves are predicates over a field path,
//! inner nodes are boolean connectors. The layers above rewrite the paths of
//! the leaves before handing the tree to an executor, so paths are stored as
//! [`FieldPath`]s rather than resolved column names.

use std::collections::{HashMap, HashSet};
use std::ops::Not;

use serde::{Deserialize, Serialize};

use crate::path::FieldPath;
use crate::value::Value;

/// Comparison operator of a predicate.
///
/// Operators are carried through path substitution unchanged; only the
/// executor interprets them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Operator {
    /// `=`
    Equals,
    /// `!=`
    NotEquals,
    /// SQL `LIKE` pattern (`%`, `_`).
    Like,
    /// Negated `LIKE`.
    NotLike,
    /// Case-insensitive `LIKE`.
    ILike,
    /// `<`
    Lower,
    /// `<=`
    LowerOrEqual,
    /// `>`
    Greater,
    /// `>=`
    GreaterOrEqual,
    /// Membership in a list of values.
    In,
    /// Negated membership.
    NotIn,
}

impl Operator {
    /// SQL-like symbol, for logs and diagnostics.
    pub fn symbol(&self) -> &'static str {
        match self {
            Operator::Equals => "=",
            Operator::NotEquals => "!=",
            Operator::Like => "like",
            Operator::NotLike => "not like",
            Operator::ILike => "ilike",
            Operator::Lower => "<",
            Operator::LowerOrEqual => "<=",
            Operator::Greater => ">",
            Operator::GreaterOrEqual => ">=",
            Operator::In => "in",
            Operator::NotIn => "not in",
        }
    }
}

/// Right-hand side of a predicate.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Operand {
    /// A single value.
    Value(Value),
    /// A list of values, for `In`/`NotIn`.
    List(Vec<Value>),
}

impl From<Value> for Operand {
    fn from(value: Value) -> Self {
        Operand::Value(value)
    }
}

/// A leaf predicate: `path operator operand`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Predicate {
    /// Field path the predicate applies to.
    pub path: FieldPath,
    /// Comparison operator.
    pub operator: Operator,
    /// Value(s) compared against.
    pub operand: Operand,
}

/// A boolean condition tree.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Condition {
    /// Leaf predicate.
    Predicate(Predicate),
    /// Both sides must hold.
    And(Box<Condition>, Box<Condition>),
    /// At least one side must hold.
    Or(Box<Condition>, Box<Condition>),
    /// The inner condition must not hold.
    Not(Box<Condition>),
}

impl Condition {
    /// Create a leaf predicate.
    pub fn new(path: impl Into<FieldPath>, operator: Operator, operand: impl Into<Operand>) -> Self {
        Condition::Predicate(Predicate {
            path: path.into(),
            operator,
            operand: operand.into(),
        })
    }

    /// `path = value`
    pub fn eq(path: impl Into<FieldPath>, value: impl Into<Value>) -> Self {
        Self::new(path, Operator::Equals, value.into())
    }

    /// `path != value`
    pub fn ne(path: impl Into<FieldPath>, value: impl Into<Value>) -> Self {
        Self::new(path, Operator::NotEquals, value.into())
    }

    /// `path like pattern`
    pub fn like(path: impl Into<FieldPath>, pattern: impl Into<String>) -> Self {
        Self::new(path, Operator::Like, Value::Text(pattern.into()))
    }

    /// `path ilike pattern`
    pub fn ilike(path: impl Into<FieldPath>, pattern: impl Into<String>) -> Self {
        Self::new(path, Operator::ILike, Value::Text(pattern.into()))
    }

    /// `path < value`
    pub fn lt(path: impl Into<FieldPath>, value: impl Into<Value>) -> Self {
        Self::new(path, Operator::Lower, value.into())
    }

    /// `path <= value`
    pub fn le(path: impl Into<FieldPath>, value: impl Into<Value>) -> Self {
        Self::new(path, Operator::LowerOrEqual, value.into())
    }

    /// `path > value`
    pub fn gt(path: impl Into<FieldPath>, value: impl Into<Value>) -> Self {
        Self::new(path, Operator::Greater, value.into())
    }

    /// `path >= value`
    pub fn ge(path: impl Into<FieldPath>, value: impl Into<Value>) -> Self {
        Self::new(path, Operator::GreaterOrEqual, value.into())
    }

    /// `path in (values...)`
    pub fn is_in<V: Into<Value>>(path: impl Into<FieldPath>, values: impl IntoIterator<Item = V>) -> Self {
        Self::new(
            path,
            Operator::In,
            Operand::List(values.into_iter().map(Into::into).collect()),
        )
    }

    /// `path not in (values...)`
    pub fn not_in<V: Into<Value>>(path: impl Into<FieldPath>, values: impl IntoIterator<Item = V>) -> Self {
        Self::new(
            path,
            Operator::NotIn,
            Operand::List(values.into_iter().map(Into::into).collect()),
        )
    }

    /// `path is null`
    pub fn is_null(path: impl Into<FieldPath>) -> Self {
        Self::new(path, Operator::Equals, Value::Null)
    }

    /// Join with another condition using AND.
    pub fn and(self, other: Condition) -> Self {
        Condition::And(Box::new(self), Box::new(other))
    }

    /// Join with another condition using OR.
    pub fn or(self, other: Condition) -> Self {
        Condition::Or(Box::new(self), Box::new(other))
    }

    /// AND `other` onto an optional existing condition.
    pub fn and_optional(existing: Option<Condition>, other: Condition) -> Self {
        match existing {
            Some(cond) => cond.and(other),
            None => other,
        }
    }

    /// Visit every predicate, left to right.
    pub fn for_each_predicate<'a>(&'a self, f: &mut impl FnMut(&'a Predicate)) {
        match self {
            Condition::Predicate(p) => f(p),
            Condition::And(left, right) | Condition::Or(left, right) => {
                left.for_each_predicate(f);
                right.for_each_predicate(f);
            }
            Condition::Not(inner) => inner.for_each_predicate(f),
        }
    }

    /// Visit every predicate mutably.
    pub fn for_each_predicate_mut(&mut self, f: &mut impl FnMut(&mut Predicate)) {
        match self {
            Condition::Predicate(p) => f(p),
            Condition::And(left, right) | Condition::Or(left, right) => {
                left.for_each_predicate_mut(f);
                right.for_each_predicate_mut(f);
            }
            Condition::Not(inner) => inner.for_each_predicate_mut(f),
        }
    }

    /// Distinct field paths referenced by the tree, in order of first appearance.
    pub fn field_paths(&self) -> Vec<&FieldPath> {
        let mut seen = HashSet::new();
        let mut paths = Vec::new();
        self.for_each_predicate(&mut |p| {
            if seen.insert(&p.path) {
                paths.push(&p.path);
            }
        });
        paths
    }

    /// Replace leaf paths using a map keyed by the joined original path.
    ///
    /// Leaves whose path is absent from the map are left untouched, as are
    /// connectors.
    pub fn substitute_paths(&mut self, substitutions: &HashMap<String, FieldPath>) {
        self.for_each_predicate_mut(&mut |p| {
            if let Some(resolved) = substitutions.get(&p.path.join()) {
                p.path = resolved.clone();
            }
        });
    }

    /// Number of predicates in the tree.
    pub fn predicate_count(&self) -> usize {
        let mut count = 0;
        self.for_each_predicate(&mut |_| count += 1);
        count
    }
}

impl Not for Condition {
    type Output = Condition;

    fn not(self) -> Self::Output {
        Condition::Not(Box::new(self))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builders() {
        let cond = Condition::eq("Name", "Jane").and(Condition::gt("Age", 20));
        assert_eq!(cond.predicate_count(), 2);
        match cond {
            Condition::And(left, right) => {
                assert!(matches!(*left, Condition::Predicate(ref p) if p.operator == Operator::Equals));
                assert!(matches!(*right, Condition::Predicate(ref p) if p.operator == Operator::Greater));
            }
            other => panic!("expected AND, got {:?}", other),
        }
    }

    #[test]
    fn test_field_paths_distinct_in_order() {
        let cond = Condition::eq("Profile.Age", 24)
            .or(Condition::like("Name", "J%"))
            .and(!Condition::eq("Profile.Age", 30));

        let paths: Vec<String> = cond.field_paths().iter().map(|p| p.join()).collect();
        assert_eq!(paths, vec!["Profile.Age", "Name"]);
    }

    #[test]
    fn test_substitute_paths_keeps_connectors_and_operands() {
        let mut cond = !Condition::eq("PMonth", 3).or(Condition::eq("Name", "x"));
        let mut map = HashMap::new();
        map.insert(
            "PMonth".to_string(),
            FieldPath::from_segments(["profile", "best_post", "month"]),
        );
        cond.substitute_paths(&map);

        let Condition::Not(inner) = &cond else {
            panic!("NOT connector lost");
        };
        let Condition::Or(left, right) = inner.as_ref() else {
            panic!("OR connector lost");
        };
        let Condition::Predicate(left) = left.as_ref() else {
            panic!("leaf expected");
        };
        assert_eq!(left.path.join(), "profile.best_post.month");
        assert_eq!(left.operand, Operand::Value(Value::Integer(3)));
        let Condition::Predicate(right) = right.as_ref() else {
            panic!("leaf expected");
        };
        assert_eq!(right.path.join(), "Name");
    }

    #[test]
    fn test_and_optional() {
        let single = Condition::and_optional(None, Condition::eq("a", 1));
        assert_eq!(single.predicate_count(), 1);
        let joined = Condition::and_optional(Some(single), Condition::eq("b", 2));
        assert!(matches!(joined, Condition::And(_, _)));
    }

    #[test]
    fn test_json_roundtrip() {
        let cond = Condition::is_in("Tags.Name", ["a", "b"]).and(Condition::is_null("Parent"));
        let json = serde_json::to_string(&cond).unwrap();
        let decoded: Condition = serde_json::from_str(&json).unwrap();
        assert_eq!(cond, decoded);
    }
}
