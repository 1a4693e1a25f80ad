//! Collect command implementation.

use super::helpers::load_config;
use crate::cli::{Args, Command, RuntimeConfig};
use crate::collector::AssetCollector;
use crate::error::Result;

/// Execute collect command
pub(super) async fn execute_collect(args: &Args, config: &RuntimeConfig) -> Result<i32> {
    let Command::Collect { json } = &args.command else {
        unreachable!("execute_collect called with non-Collect command");
    };

    let packaging = load_config(config)?;
    let manifest = AssetCollector::new(&packaging).collect();
    let output = config.output();

    if *json {
        output.data(&serde_json::to_string_pretty(&manifest)?);
        return Ok(0);
    }

    output.section("Resources");
    for mapping in &manifest.resources {
        output.indent(&format!(
            "{} -> {}",
            mapping.source.display(),
            mapping.target_path().display()
        ));
    }

    output.section("Native libraries");
    for library in &manifest.native_libraries {
        if library.is_absent() {
            let message = format!("{}: not found ({})", library.name, library.missing.join(", "));
            if library.mandatory {
                output.warn(&format!("MANDATORY {message}"));
            } else {
                output.indent(&message);
            }
            continue;
        }
        for file in &library.files {
            output.indent(&format!("{}: {}", library.name, file.path.display()));
        }
    }

    output.section("Targets");
    for target in &packaging.targets {
        output.indent(&format!("{} ({})", target.name, target.mode));
    }

    output.success(&format!(
        "{} resource(s), {} native file(s), {} target(s)",
        manifest.resources.len(),
        manifest.binaries().count(),
        packaging.targets.len()
    ));
    Ok(0)
}
