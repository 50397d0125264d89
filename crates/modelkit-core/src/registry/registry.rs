//! The finalized model registry.

use std::collections::BTreeMap;

use modelkit_proto::FieldPath;
use tracing::{debug, info};

use super::field::FieldDef;
use super::model::ModelDef;
use crate::config::DEFAULT_MAX_ALIAS_DEPTH;
use crate::error::{Error, Result};
use crate::resolver::PathResolver;

/// Read-only registry of every model and field.
///
/// Built once with a [`RegistryBuilder`], then shared behind an `Arc`.
/// Every definition it holds has passed validation: relational targets
/// exist, reverse keys point back, and every related path terminates.
#[derive(Debug, Default)]
pub struct Registry {
    models: BTreeMap<String, ModelDef>,
}

impl Registry {
    /// Start building a registry.
    pub fn builder() -> RegistryBuilder {
        RegistryBuilder::new()
    }

    /// Get a model by name.
    pub fn model(&self, name: &str) -> Result<&ModelDef> {
        self.models
            .get(name)
            .ok_or_else(|| Error::UnknownModel(name.to_string()))
    }

    /// Get a model by name, if registered.
    pub fn get_model(&self, name: &str) -> Option<&ModelDef> {
        self.models.get(name)
    }

    /// All models, ordered by name.
    pub fn models(&self) -> impl Iterator<Item = &ModelDef> {
        self.models.values()
    }

    /// Registered model names, ordered.
    pub fn model_names(&self) -> Vec<&str> {
        self.models.keys().map(|s| s.as_str()).collect()
    }

    /// Number of registered models.
    pub fn len(&self) -> usize {
        self.models.len()
    }

    /// Check if no model is registered.
    pub fn is_empty(&self) -> bool {
        self.models.is_empty()
    }

    /// Walk `path` from `model`, returning each field with its owning model.
    ///
    /// Every segment but the last must be a relational field. Aliases are
    /// not expanded here; use a [`PathResolver`] for that.
    pub fn walk(&self, model: &str, path: &[String]) -> Result<Vec<(&ModelDef, &FieldDef)>> {
        let mut current = self.model(model)?;
        let mut hops = Vec::with_capacity(path.len());

        for (i, segment) in path.iter().enumerate() {
            let field = current
                .field(segment)
                .ok_or_else(|| Error::unresolved(model, joined(path)))?;
            hops.push((current, field));

            if i + 1 < path.len() {
                let target = field
                    .target_model
                    .as_deref()
                    .filter(|_| field.field_type.is_relational())
                    .ok_or_else(|| Error::unresolved(model, joined(path)))?;
                current = self.model(target)?;
            }
        }

        Ok(hops)
    }

    /// The terminal field of `path` and the model owning it.
    pub fn field_at(&self, model: &str, path: &[String]) -> Result<(&ModelDef, &FieldDef)> {
        self.walk(model, path)?
            .pop()
            .ok_or_else(|| Error::unresolved(model, ""))
    }

    /// Rewrite every segment of `path` to its wire name.
    pub fn jsonize(&self, model: &str, path: &FieldPath) -> Result<FieldPath> {
        let hops = self.walk(model, path.segments())?;
        Ok(FieldPath::from_segments(
            hops.into_iter().map(|(_, field)| field.json_name.clone()),
        ))
    }
}

fn joined(path: &[String]) -> String {
    FieldPath::from_segments(path.iter().cloned()).join()
}

/// Collects model definitions and validates them into a [`Registry`].
#[derive(Debug)]
pub struct RegistryBuilder {
    models: Vec<ModelDef>,
    max_alias_depth: usize,
}

impl Default for RegistryBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl RegistryBuilder {
    /// Create an empty builder.
    pub fn new() -> Self {
        Self {
            models: Vec::new(),
            max_alias_depth: DEFAULT_MAX_ALIAS_DEPTH,
        }
    }

    /// Add a model.
    pub fn with_model(mut self, model: ModelDef) -> Self {
        self.models.push(model);
        self
    }

    /// Add a model in place.
    pub fn add_model(&mut self, model: ModelDef) {
        self.models.push(model);
    }

    /// Bound on related-field substitutions while validating related paths.
    pub fn with_max_alias_depth(mut self, depth: usize) -> Self {
        self.max_alias_depth = depth.max(1);
        self
    }

    /// Validate every definition and finalize the registry.
    pub fn build(self) -> Result<Registry> {
        let mut registry = Registry::default();
        for model in self.models {
            if registry.models.contains_key(&model.name) {
                return Err(Error::Configuration(format!(
                    "model '{}' is registered twice",
                    model.name
                )));
            }
            registry.models.insert(model.name.clone(), model);
        }

        for model in registry.models.values() {
            validate_names(model)?;
            validate_relations(&registry, model)?;
            validate_parent(model)?;
        }

        let targets = resolve_related(&registry, self.max_alias_depth)?;
        for (model, field, target) in targets {
            if let Some(def) = registry
                .models
                .get_mut(&model)
                .and_then(|m| m.field_mut(&field))
            {
                def.target_model = target;
            }
        }

        info!(models = registry.len(), "registry finalized");
        Ok(registry)
    }
}

/// Programming and wire names must each designate one field.
fn validate_names(model: &ModelDef) -> Result<()> {
    for field in model.fields() {
        let by_wire = model.field(&field.json_name).map(|f| f.name.as_str());
        if by_wire != Some(field.name.as_str()) {
            return Err(Error::Configuration(format!(
                "wire name '{}' of {}.{} is already taken",
                field.json_name, model.name, field.name
            )));
        }
    }
    Ok(())
}

fn validate_relations(registry: &Registry, model: &ModelDef) -> Result<()> {
    for field in model.fields() {
        if field.is_related() || !field.field_type.is_relational() {
            continue;
        }

        let target_name = field.target_model.as_deref().ok_or_else(|| {
            Error::Configuration(format!("{}.{} has no target model", model.name, field.name))
        })?;
        let target = registry.get_model(target_name).ok_or_else(|| {
            Error::Configuration(format!(
                "{}.{} targets unknown model '{}'",
                model.name, field.name, target_name
            ))
        })?;

        if field.field_type.is_reverse() {
            let fk_name = field.reverse_fk.as_deref().ok_or_else(|| {
                Error::Configuration(format!("{}.{} has no reverse key", model.name, field.name))
            })?;
            let points_back = target.field(fk_name).is_some_and(|fk| {
                fk.is_stored()
                    && fk.field_type.is_foreign_key()
                    && fk.target_model.as_deref() == Some(model.name.as_str())
            });
            if !points_back {
                return Err(Error::Configuration(format!(
                    "{}.{}: '{}.{}' is not a foreign key to '{}'",
                    model.name, field.name, target_name, fk_name, model.name
                )));
            }
        }
    }
    Ok(())
}

fn validate_parent(model: &ModelDef) -> Result<()> {
    let Some(name) = model.parent_field_name() else {
        return Ok(());
    };
    let valid = model.field(name).is_some_and(|f| {
        f.is_stored()
            && f.field_type.is_foreign_key()
            && f.target_model.as_deref() == Some(model.name.as_str())
    });
    if !valid {
        return Err(Error::Configuration(format!(
            "parent field '{}' of '{}' is not a foreign key to itself",
            name, model.name
        )));
    }
    Ok(())
}

/// Resolve every related path and return the target model each relational
/// alias inherits from its terminal field.
fn resolve_related(
    registry: &Registry,
    max_depth: usize,
) -> Result<Vec<(String, String, Option<String>)>> {
    let resolver = PathResolver::new(registry, max_depth);
    let mut targets = Vec::new();

    for model in registry.models() {
        for field in model.fields().filter(|f| f.is_related()) {
            let path = FieldPath::from(field.name.as_str());
            let resolved = resolver.resolve(&model.name, &path).map_err(|e| match e {
                Error::Configuration(_) => e,
                other => Error::Configuration(format!(
                    "related field {}.{} does not resolve: {}",
                    model.name, field.name, other
                )),
            })?;
            let (_, terminal) = registry.field_at(&model.name, resolved.path.segments())?;

            if terminal.field_type != field.field_type {
                return Err(Error::Configuration(format!(
                    "related field {}.{} is {:?} but '{}' is {:?}",
                    model.name, field.name, field.field_type, resolved.path, terminal.field_type
                )));
            }

            debug!(
                model = %model.name,
                field = %field.name,
                path = %resolved.path,
                "related field resolved"
            );
            targets.push((
                model.name.clone(),
                field.name.clone(),
                terminal.target_model.clone(),
            ));
        }
    }

    Ok(targets)
}
