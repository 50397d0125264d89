//! Subcommand implementations.

use std::fmt::Write;
use std::path::Path;

use clap::ValueEnum;
use modelkit_core::config::DEFAULT_MAX_ALIAS_DEPTH;
use modelkit_core::proto::FieldPath;
use modelkit_core::{FieldDef, FieldKind, PathResolver, Registry, Result, SchemaFile};
use serde_json::json;
use tracing::debug;

use crate::Command;

/// Output format for command results.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    /// Plain text
    Text,
    /// JSON
    Json,
}

/// A loaded schema with the alias bound it asks for.
struct Schema {
    registry: Registry,
    max_alias_depth: usize,
}

impl Schema {
    fn load(path: &Path) -> Result<Self> {
        let file = SchemaFile::from_file(path)?;
        let max_alias_depth = file.max_alias_depth.unwrap_or(DEFAULT_MAX_ALIAS_DEPTH);
        let registry = file.build()?;
        debug!(path = %path.display(), models = registry.len(), "schema loaded");
        Ok(Self {
            registry,
            max_alias_depth,
        })
    }

    fn resolver(&self) -> PathResolver<'_> {
        PathResolver::new(&self.registry, self.max_alias_depth)
    }
}

/// Run a subcommand and return what it prints.
pub fn run(command: &Command, format: OutputFormat) -> Result<String> {
    match command {
        Command::Check { schema } => check(&Schema::load(schema)?, format),
        Command::Expand {
            schema,
            model,
            fields,
        } => expand(&Schema::load(schema)?, model, fields, format),
        Command::Resolve {
            schema,
            model,
            path,
        } => resolve(&Schema::load(schema)?, model, path, format),
    }
}

fn kind(field: &FieldDef) -> String {
    match &field.kind {
        FieldKind::Stored => String::new(),
        FieldKind::Computed(_) => " computed".to_string(),
        FieldKind::Related { path } => format!(" -> {}", path),
        FieldKind::Reverse => " reverse".to_string(),
    }
}

fn check(schema: &Schema, format: OutputFormat) -> Result<String> {
    let registry = &schema.registry;
    if format == OutputFormat::Json {
        let models: Vec<_> = registry
            .models()
            .map(|m| {
                json!({
                    "name": m.name,
                    "fields": m.fields_get(),
                    "parent": m.parent_field().map(|f| f.json_name.as_str()),
                })
            })
            .collect();
        return Ok(json!({ "ok": true, "models": models }).to_string());
    }

    let mut out = format!("ok: {} models\n", registry.len());
    for model in registry.models() {
        let _ = writeln!(out, "{}", model.name);
        for field in model.fields() {
            let target = field
                .target_model
                .as_deref()
                .map(|t| format!("({})", t))
                .unwrap_or_default();
            let _ = writeln!(
                out,
                "  {} [{}] {:?}{}{}",
                field.name,
                field.json_name,
                field.field_type,
                target,
                kind(field)
            );
        }
    }
    Ok(out.trim_end().to_string())
}

fn expand(schema: &Schema, model: &str, fields: &[String], format: OutputFormat) -> Result<String> {
    let expanded = schema.resolver().expand_fields(model, fields)?;
    Ok(match format {
        OutputFormat::Json => json!(expanded).to_string(),
        OutputFormat::Text => expanded.into_iter().collect::<Vec<_>>().join("\n"),
    })
}

fn resolve(schema: &Schema, model: &str, path: &str, format: OutputFormat) -> Result<String> {
    let path = FieldPath::parse(path)?;
    let (resolved, owner, field) = schema.resolver().terminal(model, &path)?;
    Ok(match format {
        OutputFormat::Json => json!({
            "path": resolved.path.join(),
            "substitutions": resolved.substitutions,
            "model": owner.name,
            "field": field.name,
        })
        .to_string(),
        OutputFormat::Text => resolved.path.join(),
    })
}
