//! Record collections: lazily searched, ordered sets of records.

use std::collections::HashSet;
use std::fmt;

use modelkit_proto::{Condition, RecordId, Value};

use crate::environment::{Context, Environment, UserId};
use crate::error::{Error, Result};
use crate::query::{OrderBy, Query};
use crate::registry::ModelDef;

/// An ordered, duplicate-free set of records of one model, bound to an
/// environment.
///
/// A collection built by a search holds only its query; the query runs
/// each time the ids are needed. Nothing is cached between calls.
#[derive(Clone)]
pub struct RecordCollection {
    pub(super) env: Environment,
    pub(super) model: String,
    /// Candidate records; `None` means every record of the model.
    pub(super) scope: Option<Vec<RecordId>>,
    /// Pending filter and paging applied within the scope.
    pub(super) query: Option<Query>,
}

impl RecordCollection {
    /// An empty collection of `model`.
    pub fn pool(env: Environment, model: &str) -> Result<Self> {
        env.registry().model(model)?;
        Ok(Self {
            env,
            model: model.to_string(),
            scope: Some(Vec::new()),
            query: None,
        })
    }

    pub(super) fn scoped(&self, ids: Vec<RecordId>) -> Self {
        self.linked(&self.model, ids)
    }

    /// Records of another model bound to the same environment.
    pub(super) fn linked(&self, model: &str, ids: Vec<RecordId>) -> Self {
        Self {
            env: self.env.clone(),
            model: model.to_string(),
            scope: Some(dedup(ids)),
            query: None,
        }
    }

    /// The collection of the given records of this model.
    pub fn browse(&self, ids: impl IntoIterator<Item = RecordId>) -> Self {
        self.scoped(ids.into_iter().collect())
    }

    /// Every record of this model matching `condition`.
    ///
    /// Lazy: the condition is checked against the registry and run when the
    /// ids are first needed.
    pub fn search(&self, condition: Condition) -> Self {
        Self {
            env: self.env.clone(),
            model: self.model.clone(),
            scope: None,
            query: Some(Query::filtered(condition)),
        }
    }

    /// Every record of this model.
    pub fn search_all(&self) -> Self {
        Self {
            env: self.env.clone(),
            model: self.model.clone(),
            scope: None,
            query: Some(Query::new()),
        }
    }

    /// Search limited to `limit` records, or the configured page size.
    pub fn search_limited(&self, condition: Condition, limit: Option<usize>) -> Self {
        let limit = limit.unwrap_or(self.env.database().config().default_limit);
        self.search(condition).limit(limit)
    }

    /// The records of this collection matching `condition`.
    pub fn filtered(&self, condition: Condition) -> Result<Self> {
        let narrowed = match &self.query {
            Some(query) if !query.is_paged() => Self {
                query: Some(query.clone().and(condition)),
                ..self.clone()
            },
            Some(_) => Self {
                query: Some(Query::filtered(condition)),
                ..self.scoped(self.ids()?)
            },
            None => Self {
                query: Some(Query::filtered(condition)),
                ..self.clone()
            },
        };
        Ok(narrowed)
    }

    fn with_query(&self, update: impl FnOnce(&mut Query)) -> Self {
        let mut query = self.query.clone().unwrap_or_default();
        update(&mut query);
        Self {
            query: Some(query),
            ..self.clone()
        }
    }

    /// Keep at most `limit` records.
    pub fn limit(&self, limit: usize) -> Self {
        self.with_query(|q| q.limit = Some(limit))
    }

    /// Skip the first `offset` records.
    pub fn offset(&self, offset: usize) -> Self {
        self.with_query(|q| q.offset = offset)
    }

    /// Add a sort key such as `"Name"` or `"Profile.Age desc"`.
    pub fn order_by(&self, spec: &str) -> Self {
        self.with_query(|q| q.order.push(OrderBy::parse(spec)))
    }

    /// Model name.
    pub fn model(&self) -> &str {
        &self.model
    }

    /// Model definition.
    pub fn model_def(&self) -> Result<&ModelDef> {
        self.env.registry().model(&self.model)
    }

    /// The environment this collection is bound to.
    pub fn env(&self) -> &Environment {
        &self.env
    }

    /// Record ids, running the pending query if any.
    pub fn ids(&self) -> Result<Vec<RecordId>> {
        let Some(query) = &self.query else {
            return Ok(self.scope.clone().unwrap_or_default());
        };
        let resolved = query.resolve(&self.env.resolver(), &self.model)?;
        self.env
            .executor()
            .search(&self.model, &resolved, self.scope.as_deref())
    }

    /// Number of records matching the filter, ignoring paging.
    pub fn search_count(&self) -> Result<usize> {
        match (&self.query, &self.scope) {
            (None, Some(ids)) => Ok(ids.len()),
            (query, scope) => {
                let resolved = query
                    .clone()
                    .unwrap_or_default()
                    .resolve(&self.env.resolver(), &self.model)?;
                self.env
                    .executor()
                    .count(&self.model, &resolved, scope.as_deref())
            }
        }
    }

    /// Number of records.
    pub fn len(&self) -> Result<usize> {
        Ok(self.ids()?.len())
    }

    /// Check if the collection holds no record.
    pub fn is_empty(&self) -> Result<bool> {
        Ok(self.ids()?.is_empty())
    }

    /// One single-record collection per record, in order.
    pub fn records(&self) -> Result<Vec<RecordCollection>> {
        Ok(self
            .ids()?
            .into_iter()
            .map(|id| self.scoped(vec![id]))
            .collect())
    }

    /// The id of the only record, or `NotSingleton`.
    pub fn ensure_one(&self) -> Result<RecordId> {
        match self.ids()?.as_slice() {
            [id] => Ok(*id),
            ids => Err(Error::NotSingleton {
                model: self.model.clone(),
                len: ids.len(),
            }),
        }
    }

    /// The ids as a relational value, for writing into a foreign key.
    pub fn to_value(&self) -> Result<Value> {
        Ok(Value::Relation(self.ids()?))
    }

    fn same_model(&self, other: &RecordCollection) -> Result<()> {
        if self.model != other.model {
            return Err(Error::InvalidOperand {
                left: self.model.clone(),
                right: other.model.clone(),
            });
        }
        Ok(())
    }

    /// Records of `self`, then the records of `other` not already present.
    pub fn union(&self, other: &RecordCollection) -> Result<Self> {
        self.same_model(other)?;
        let mut ids = self.ids()?;
        ids.extend(other.ids()?);
        Ok(self.scoped(ids))
    }

    /// Records of `self` absent from `other`.
    pub fn subtract(&self, other: &RecordCollection) -> Result<Self> {
        self.same_model(other)?;
        let removed: HashSet<RecordId> = other.ids()?.into_iter().collect();
        let ids = self.ids()?.into_iter().filter(|id| !removed.contains(id)).collect();
        Ok(self.scoped(ids))
    }

    /// Records of `self` also present in `other`.
    pub fn intersect(&self, other: &RecordCollection) -> Result<Self> {
        self.same_model(other)?;
        let kept: HashSet<RecordId> = other.ids()?.into_iter().collect();
        let ids = self.ids()?.into_iter().filter(|id| kept.contains(id)).collect();
        Ok(self.scoped(ids))
    }

    /// Whether both collections hold the same records, in any order.
    pub fn equals(&self, other: &RecordCollection) -> Result<bool> {
        self.same_model(other)?;
        let mine: HashSet<RecordId> = self.ids()?.into_iter().collect();
        let theirs: HashSet<RecordId> = other.ids()?.into_iter().collect();
        Ok(mine == theirs)
    }

    /// The same records under another environment.
    pub fn with_env(&self, env: Environment) -> Self {
        Self { env, ..self.clone() }
    }

    /// The same records with one context key set.
    pub fn with_context(&self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.with_env(self.env.with_context(key, value))
    }

    /// The same records with the context replaced.
    pub fn with_new_context(&self, context: Context) -> Self {
        self.with_env(self.env.with_new_context(context))
    }

    /// The same records as the superuser.
    pub fn sudo(&self) -> Self {
        self.with_env(self.env.sudo())
    }

    /// The same records as `uid`.
    pub fn sudo_as(&self, uid: UserId) -> Self {
        self.with_env(self.env.sudo_as(uid))
    }
}

fn dedup(ids: Vec<RecordId>) -> Vec<RecordId> {
    let mut seen = HashSet::with_capacity(ids.len());
    ids.into_iter().filter(|id| seen.insert(*id)).collect()
}

impl fmt::Debug for RecordCollection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RecordCollection")
            .field("model", &self.model)
            .field("uid", &self.env.uid())
            .field("scope", &self.scope)
            .field("query", &self.query)
            .finish()
    }
}
