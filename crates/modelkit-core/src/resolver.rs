//! Field-path resolution.
//!
//! Callers name fields by dotted paths in programming or wire form, and the
//! paths may go through related fields (aliases). Before anything reaches
//! the executor, the [`PathResolver`] rewrites every path to the real wire
//! path it stands for, both in requested field lists and in condition trees,
//! so the two always agree.

use std::collections::{BTreeSet, HashMap, HashSet, VecDeque};

use modelkit_proto::{Condition, FieldPath};
use tracing::trace;

use crate::error::{Error, Result};
use crate::registry::{FieldDef, ModelDef, Registry};

/// A path after alias expansion.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedPath {
    /// Real path, every segment in wire form.
    pub path: FieldPath,
    /// Number of related fields expanded on the way.
    pub substitutions: usize,
}

impl ResolvedPath {
    /// Whether at least one related field was expanded.
    pub fn is_substituted(&self) -> bool {
        self.substitutions > 0
    }
}

/// Expands related fields in paths, field lists and condition trees.
#[derive(Debug, Clone, Copy)]
pub struct PathResolver<'a> {
    registry: &'a Registry,
    max_depth: usize,
}

impl<'a> PathResolver<'a> {
    /// Create a resolver allowing at most `max_depth` substitutions per path.
    pub fn new(registry: &'a Registry, max_depth: usize) -> Self {
        Self {
            registry,
            max_depth: max_depth.max(1),
        }
    }

    /// Expand every related field of `path`, starting from `model`.
    ///
    /// Segments are appended one at a time. When the accumulated path ends
    /// on a related field, that last segment is replaced by the segments of
    /// the related path, which are then resolved the same way. An alias
    /// cycle, or a chain longer than the bound, is a configuration error.
    pub fn resolve(&self, model: &str, path: &FieldPath) -> Result<ResolvedPath> {
        let mut pending: VecDeque<String> = path.segments().iter().cloned().collect();
        let mut resolved: Vec<String> = Vec::with_capacity(pending.len());
        let mut substitutions = 0;
        // Related fields expanded since the last real segment.
        let mut expanding: HashSet<(&str, &str)> = HashSet::new();

        while let Some(segment) = pending.pop_front() {
            resolved.push(segment);
            let (owner, field) = self
                .registry
                .field_at(model, &resolved)
                .map_err(|e| match e {
                    Error::UnresolvedPath { .. } => Error::unresolved(model, path.join()),
                    other => other,
                })?;

            let Some(related) = field.related_path() else {
                expanding.clear();
                if let Some(last) = resolved.last_mut() {
                    last.clone_from(&field.json_name);
                }
                continue;
            };

            substitutions += 1;
            if substitutions > self.max_depth {
                return Err(Error::Configuration(format!(
                    "resolving '{}' on '{}' exceeds {} related field substitutions",
                    path, model, self.max_depth
                )));
            }
            if !expanding.insert((owner.name.as_str(), field.name.as_str())) {
                return Err(Error::Configuration(format!(
                    "related field cycle through {}.{}",
                    owner.name, field.name
                )));
            }

            let related = FieldPath::from(related);
            if related.is_empty() {
                return Err(Error::Configuration(format!(
                    "related field {}.{} has an empty path",
                    owner.name, field.name
                )));
            }

            trace!(
                model = %owner.name,
                field = %field.name,
                related = %related,
                "expanding related field"
            );
            resolved.pop();
            for segment in related.into_segments().into_iter().rev() {
                pending.push_front(segment);
            }
        }

        Ok(ResolvedPath {
            path: FieldPath::from_segments(resolved),
            substitutions,
        })
    }

    /// Resolve `path` and return the real field it ends on.
    pub fn terminal(&self, model: &str, path: &FieldPath) -> Result<(ResolvedPath, &'a ModelDef, &'a FieldDef)> {
        let resolved = self.resolve(model, path)?;
        let (owner, field) = self.registry.field_at(model, resolved.path.segments())?;
        Ok((resolved, owner, field))
    }

    /// Expand a requested field list into the set of real wire paths.
    ///
    /// A path that went through a related field contributes every prefix of
    /// its expansion, so the foreign keys needed to follow it are fetched as
    /// well. Other paths contribute their wire form. The set holds each
    /// path once.
    pub fn expand_fields<S: AsRef<str>>(&self, model: &str, fields: &[S]) -> Result<BTreeSet<String>> {
        let mut expanded = BTreeSet::new();
        for name in fields {
            let resolved = self.resolve(model, &FieldPath::from(name.as_ref()))?;
            if resolved.is_substituted() {
                expanded.extend(resolved.path.prefixes().map(|p| p.join()));
            } else {
                expanded.insert(resolved.path.join());
            }
        }
        Ok(expanded)
    }

    /// Map every distinct path of `condition`, as written, to its resolved
    /// path.
    pub fn substitutions(&self, model: &str, condition: &Condition) -> Result<HashMap<String, FieldPath>> {
        let mut map = HashMap::new();
        for path in condition.field_paths() {
            let key = path.join();
            if map.contains_key(&key) {
                continue;
            }
            let resolved = self.resolve(model, path)?;
            map.insert(key, resolved.path);
        }
        Ok(map)
    }

    /// Rewrite every leaf path of `condition` to its resolved path.
    pub fn substitute(&self, model: &str, condition: &Condition) -> Result<Condition> {
        let map = self.substitutions(model, condition)?;
        let mut substituted = condition.clone();
        substituted.substitute_paths(&map);
        Ok(substituted)
    }
}
