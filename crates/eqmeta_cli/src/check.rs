//! `eqmeta check`: report declaration problems as diagnostics.
//!
//! Runs the store-level checks below, primes a provider (which reports
//! dependency cycles and similar engine findings), and renders everything.

use std::collections::HashSet;
use std::path::Path;

use eqmeta_config::EngineConfig;
use eqmeta_diagnostics::{Category, Diagnostic, DiagnosticCode, DiagnosticSink, Severity};
use eqmeta_model::{AnnotationKind, DeclarationStore, TypeDescriptor};

use crate::pipeline::{open_primed, render_diagnostics};
use crate::{CheckArgs, GlobalArgs, ReportFormat};

/// Exclusion list names a field the type does not have.
pub const W301: DiagnosticCode = DiagnosticCode {
    category: Category::Warning,
    number: 301,
};

/// Identity hint names a field the type does not have.
pub const W302: DiagnosticCode = DiagnosticCode {
    category: Category::Warning,
    number: 302,
};

/// Version hint names a field the type does not have.
pub const W303: DiagnosticCode = DiagnosticCode {
    category: Category::Warning,
    number: 303,
};

/// Runs the `eqmeta check` command.
///
/// Returns exit code 0 if no errors were reported, 1 otherwise.
pub fn run(
    args: &CheckArgs,
    global: &GlobalArgs,
    config: &EngineConfig,
) -> Result<i32, Box<dyn std::error::Error>> {
    let provider = open_primed(Path::new(&args.decls), config)?;
    let sink = DiagnosticSink::new();
    let store = provider.store();
    for name in store.type_names() {
        if let Some(ty) = store.get_type(&name) {
            check_type(store.as_ref(), &ty, &sink);
        }
    }
    sink.extend(provider.diagnostics().take_all());

    let diagnostics = sink.diagnostics();
    match args.format {
        ReportFormat::Text => render_diagnostics(&diagnostics, global.color),
        ReportFormat::Json => println!("{}", serde_json::to_string_pretty(&diagnostics)?),
    }

    if !global.quiet && args.format == ReportFormat::Text {
        eprintln!(
            "   Result: {} error(s), {} warning(s)",
            sink.count(Severity::Error),
            sink.count(Severity::Warning)
        );
    }

    Ok(if sink.has_errors() { 1 } else { 0 })
}

/// Checks one type's annotation options and persistence hints.
fn check_type<S: DeclarationStore + ?Sized>(store: &S, ty: &TypeDescriptor, sink: &DiagnosticSink) {
    let Some(values) = store.get_annotation_config(ty, AnnotationKind::Equality) else {
        return;
    };
    let visible: HashSet<String> = store.get_fields(ty).into_iter().map(|f| f.name).collect();
    let subject = ty.artifact_id().to_string();

    for name in &values.exclude_fields {
        if !visible.contains(name) {
            sink.emit(
                Diagnostic::warning(
                    W301,
                    format!("excluded field '{name}' does not exist on '{}'", ty.name),
                )
                .with_subject(subject.clone())
                .with_help("remove it from exclude_fields or fix the spelling"),
            );
        }
    }
    if let Some(name) = &ty.identity_field {
        if store.get_identity_field(ty).is_none() {
            sink.emit(
                Diagnostic::warning(
                    W302,
                    format!("identity field '{name}' does not exist on '{}'", ty.name),
                )
                .with_subject(subject.clone()),
            );
        }
    }
    if let Some(name) = &ty.version_field {
        if store.get_version_field(ty).is_none() {
            sink.emit(
                Diagnostic::warning(
                    W303,
                    format!("version field '{name}' does not exist on '{}'", ty.name),
                )
                .with_subject(subject)
                .with_note("a version field that cannot be resolved is not excluded from equality"),
            );
        }
    }
}
