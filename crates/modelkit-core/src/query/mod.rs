//! Queries over record collections.
//!
//! A [`Query`] is owned by one record collection and carries the paths as
//! the caller wrote them. The [`QueryExecutor`] only accepts queries whose
//! paths went through the resolver.

mod executor;
mod filter;

pub use executor::QueryExecutor;
pub use filter::FilterEvaluator;

use modelkit_proto::{Condition, FieldPath};

use crate::error::Result;
use crate::resolver::PathResolver;

/// Sort direction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OrderDirection {
    /// Ascending order.
    #[default]
    Asc,
    /// Descending order.
    Desc,
}

/// One sort key.
#[derive(Debug, Clone, PartialEq)]
pub struct OrderBy {
    /// Field path to order by.
    pub path: FieldPath,
    /// Sort direction.
    pub direction: OrderDirection,
}

impl OrderBy {
    /// Ascending order on `path`.
    pub fn asc(path: impl Into<FieldPath>) -> Self {
        Self {
            path: path.into(),
            direction: OrderDirection::Asc,
        }
    }

    /// Descending order on `path`.
    pub fn desc(path: impl Into<FieldPath>) -> Self {
        Self {
            path: path.into(),
            direction: OrderDirection::Desc,
        }
    }

    /// Parse `"Name"`, `"Name asc"` or `"Profile.Age desc"`.
    pub fn parse(spec: &str) -> Self {
        let mut parts = spec.split_whitespace();
        let path = parts.next().unwrap_or_default();
        match parts.next() {
            Some(dir) if dir.eq_ignore_ascii_case("desc") => Self::desc(path),
            _ => Self::asc(path),
        }
    }
}

/// Condition and paging of a record collection.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Query {
    /// Filter; `None` matches every record.
    pub condition: Option<Condition>,
    /// Maximum number of records.
    pub limit: Option<usize>,
    /// Number of leading records skipped.
    pub offset: usize,
    /// Sort keys, most significant first. Records are ordered by id when
    /// empty and on ties.
    pub order: Vec<OrderBy>,
}

impl Query {
    /// A query matching every record.
    pub fn new() -> Self {
        Self::default()
    }

    /// A query filtered by `condition`.
    pub fn filtered(condition: Condition) -> Self {
        Self {
            condition: Some(condition),
            ..Self::default()
        }
    }

    /// AND `condition` onto the current filter.
    pub fn and(mut self, condition: Condition) -> Self {
        self.condition = Some(Condition::and_optional(self.condition.take(), condition));
        self
    }

    /// Check whether the query keeps only a window of its matches.
    pub fn is_paged(&self) -> bool {
        self.limit.is_some() || self.offset > 0
    }

    /// Resolve every path of the condition and the sort keys.
    pub fn resolve(&self, resolver: &PathResolver<'_>, model: &str) -> Result<Query> {
        let condition = self
            .condition
            .as_ref()
            .map(|c| resolver.substitute(model, c))
            .transpose()?;
        let order = self
            .order
            .iter()
            .map(|o| {
                Ok(OrderBy {
                    path: resolver.resolve(model, &o.path)?.path,
                    direction: o.direction,
                })
            })
            .collect::<Result<Vec<_>>>()?;
        Ok(Query {
            condition,
            limit: self.limit,
            offset: self.offset,
            order,
        })
    }
}
