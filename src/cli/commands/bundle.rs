//! Bundle command implementation.
//!
//! Collects assets once, then builds every configured target (or the one
//! selected with `--target`) into the dist directory.

use super::helpers::{format_size, load_config};
use crate::bundler::{Bundler, Settings};
use crate::cli::{Args, Command, RuntimeConfig};
use crate::collector::AssetCollector;
use crate::error::{ConfigError, Result};

/// Execute bundle command
pub(super) async fn execute_bundle(args: &Args, config: &RuntimeConfig) -> Result<i32> {
    let Command::Bundle { target, freezer } = &args.command else {
        unreachable!("execute_bundle called with non-Bundle command");
    };
    let output = config.output();

    let packaging = load_config(config)?;
    if let Some(name) = target {
        // Fail on typos before spending time on collection
        packaging.target(name)?;
    }
    if packaging.targets.is_empty() {
        return Err(ConfigError::Invalid {
            path: config.config_path().to_path_buf(),
            reason: "no [[target]] configured".to_string(),
        }
        .into());
    }

    output.verbose("Collecting assets...");
    let manifest = AssetCollector::new(&packaging).collect();
    for name in manifest.missing_mandatory() {
        output.warn(&format!("MANDATORY library '{name}' was not found"));
    }

    let mut settings = Settings::from_config(&packaging, manifest)?;
    if let Some(name) = target {
        settings.retain_target(name)?;
    }
    if let Some(path) = freezer {
        settings.set_freezer(path);
    }

    output.info(&format!(
        "Bundling {} target(s) into {}",
        settings.targets().len(),
        settings.dist_dir().display()
    ));
    let bundler = Bundler::new(settings);
    let artifacts = bundler.bundle().await?;

    output.section("Artifacts");
    for artifact in &artifacts {
        output.success(&format!(
            "{} [{}] {}",
            artifact.target,
            artifact.mode,
            artifact.executable.display()
        ));
        output.indent(&format!("size:   {}", format_size(artifact.size)));
        output.indent(&format!("sha256: {}", artifact.checksum));
    }

    Ok(0)
}
