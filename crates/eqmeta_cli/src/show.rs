//! `eqmeta show`: print the equality artifacts of a declarations file.

use std::fmt::Write as _;
use std::path::Path;
use std::sync::Arc;

use eqmeta_config::EngineConfig;
use eqmeta_equals::{EqualityArtifact, FieldSelector, MetadataProvider};
use eqmeta_model::{AnnotationKind, DeclarationStore, InMemoryStore};

use crate::pipeline::open_primed;
use crate::{GlobalArgs, ReportFormat, ShowArgs};

/// Runs the `eqmeta show` command.
pub fn run(
    args: &ShowArgs,
    global: &GlobalArgs,
    config: &EngineConfig,
) -> Result<i32, Box<dyn std::error::Error>> {
    let provider = open_primed(Path::new(&args.decls), config)?;
    let artifacts = collect(&provider, args.type_name.as_deref())?;

    match args.format {
        ReportFormat::Text => {
            let selector = FieldSelector::from_config(&config.selection);
            for artifact in &artifacts {
                print!("{}", render_artifact(artifact));
                if args.explain {
                    print!("{}", explain(provider.store().as_ref(), &selector, artifact));
                }
            }
            if !global.quiet {
                eprintln!("   {} artifact(s)", artifacts.len());
            }
        }
        ReportFormat::Json => {
            let plain: Vec<&EqualityArtifact> = artifacts.iter().map(Arc::as_ref).collect();
            println!("{}", serde_json::to_string_pretty(&plain)?);
        }
    }
    Ok(0)
}

/// Every cached artifact, or only the one governed by `type_name`.
fn collect(
    provider: &MetadataProvider<InMemoryStore>,
    type_name: Option<&str>,
) -> Result<Vec<Arc<EqualityArtifact>>, Box<dyn std::error::Error>> {
    let ids = match type_name {
        Some(name) => {
            let ty = provider
                .store()
                .get_type(name)
                .ok_or_else(|| format!("unknown type '{name}'"))?;
            vec![ty.artifact_id()]
        }
        None => provider.cached_ids(),
    };
    let mut artifacts = Vec::with_capacity(ids.len());
    for id in &ids {
        artifacts.push(provider.get(id)?);
    }
    Ok(artifacts)
}

fn render_artifact(artifact: &EqualityArtifact) -> String {
    let mut out = format!(
        "{}  {}  [{}]\n",
        artifact.container_name, artifact.id, artifact.fingerprint
    );
    if artifact.delegated {
        out.push_str("    (delegated to another generator)\n");
        return out;
    }
    let identity = artifact.identifier_field.as_ref().map(|f| f.name.as_str());
    for field in &artifact.fields {
        let marker = if Some(field.name.as_str()) == identity {
            " (identity)"
        } else {
            ""
        };
        let _ = writeln!(out, "    {}: {}{marker}", field.name, field.field_type);
    }
    if artifact.append_super {
        out.push_str("    + super\n");
    }
    out
}

/// Lists the fields of the artifact's type that were left out, with reasons.
fn explain<S: DeclarationStore + ?Sized>(
    store: &S,
    selector: &FieldSelector,
    artifact: &EqualityArtifact,
) -> String {
    let Some(ty) = store.get_type(&artifact.type_name) else {
        return String::new();
    };
    let exclusions = store
        .get_annotation_config(&ty, AnnotationKind::Equality)
        .map(|values| values.exclude_fields)
        .unwrap_or_default();
    let fields = store.get_fields(&ty);
    let version = store.get_version_field(&ty);
    let (_, rejected) = selector.partition(&fields, version.as_ref(), &exclusions);

    let mut out = String::new();
    for (field, reason) in rejected {
        let _ = writeln!(out, "    - {}: {reason}", field.name);
    }
    out
}
