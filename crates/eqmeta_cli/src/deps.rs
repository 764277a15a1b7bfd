//! `eqmeta deps`: print the dependency edges of a declarations file.

use std::path::Path;

use eqmeta_common::{ArtifactId, MetadataId};
use eqmeta_config::EngineConfig;

use crate::pipeline::open_primed;
use crate::{DepsArgs, GlobalArgs, ReportFormat};

/// Runs the `eqmeta deps` command.
pub fn run(
    args: &DepsArgs,
    global: &GlobalArgs,
    config: &EngineConfig,
) -> Result<i32, Box<dyn std::error::Error>> {
    let provider = open_primed(Path::new(&args.decls), config)?;
    let edges = provider.registry().edges();

    match args.format {
        ReportFormat::Text => {
            print!("{}", render_text(&edges));
            if !global.quiet {
                eprintln!("   {} edge(s)", edges.len());
            }
        }
        ReportFormat::Json => {
            println!("{}", serde_json::to_string_pretty(&to_json(&edges))?);
        }
    }
    Ok(0)
}

fn render_text(edges: &[(MetadataId, ArtifactId)]) -> String {
    edges
        .iter()
        .map(|(upstream, artifact)| format!("{upstream} -> {artifact}\n"))
        .collect()
}

fn to_json(edges: &[(MetadataId, ArtifactId)]) -> serde_json::Value {
    edges
        .iter()
        .map(|(upstream, artifact)| {
            serde_json::json!({
                "upstream": upstream.to_string(),
                "artifact": artifact.to_string(),
            })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use eqmeta_common::FieldId;

    fn sample() -> Vec<(MetadataId, ArtifactId)> {
        vec![
            (
                FieldId::new("com.example.Order", "main", "id").into(),
                ArtifactId::new("com.example.Order", "main"),
            ),
            (
                ArtifactId::new("com.example.Party", "main").into(),
                ArtifactId::new("com.example.Customer", "main"),
            ),
        ]
    }

    #[test]
    fn text_lines() {
        assert_eq!(
            render_text(&sample()),
            "field:main?com.example.Order#id -> equals:main?com.example.Order\n\
             equals:main?com.example.Party -> equals:main?com.example.Customer\n"
        );
    }

    #[test]
    fn json_objects() {
        let json = to_json(&sample());
        assert_eq!(json[0]["upstream"], "field:main?com.example.Order#id");
        assert_eq!(json[1]["artifact"], "equals:main?com.example.Customer");
    }
}
