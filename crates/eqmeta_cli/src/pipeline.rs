//! Shared steps for CLI commands: configuration lookup, loading the
//! declarations file, and priming a provider over it.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use eqmeta_config::{EngineConfig, CONFIG_FILE};
use eqmeta_diagnostics::{Diagnostic, DiagnosticRenderer, TerminalRenderer};
use eqmeta_equals::MetadataProvider;
use eqmeta_model::InMemoryStore;

use crate::GlobalArgs;

/// Loads the engine configuration.
///
/// `--config` may name the file itself or the directory containing it.
/// Without it, `eqmeta.toml` in the current directory is used if present;
/// otherwise the defaults apply.
pub fn load_config(global: &GlobalArgs) -> Result<EngineConfig, Box<dyn std::error::Error>> {
    match global.config {
        Some(ref path) => {
            let path = PathBuf::from(path);
            if path.is_dir() {
                Ok(eqmeta_config::load_config(&path)?)
            } else {
                Ok(eqmeta_config::load_config_file(&path)?)
            }
        }
        None => {
            let local = std::env::current_dir()?.join(CONFIG_FILE);
            if local.is_file() {
                Ok(eqmeta_config::load_config_file(&local)?)
            } else {
                Ok(EngineConfig::default())
            }
        }
    }
}

/// Loads a declarations file and computes every requested artifact.
pub fn open_primed(
    decls: &Path,
    config: &EngineConfig,
) -> Result<MetadataProvider<InMemoryStore>, Box<dyn std::error::Error>> {
    let store = Arc::new(InMemoryStore::load(decls)?);
    tracing::debug!(path = %decls.display(), types = store.len(), "loaded declarations");
    let provider = MetadataProvider::new(store, config);
    let report = provider.prime();
    tracing::info!(
        artifacts = report.recomputed.len(),
        "computed equality artifacts"
    );
    Ok(provider)
}

/// Renders diagnostics to stderr.
pub fn render_diagnostics(diagnostics: &[Diagnostic], color: bool) {
    let renderer = TerminalRenderer::new(color);
    for diag in diagnostics {
        eprint!("{}", renderer.render(diag));
    }
}
