//! Script targets, frozen by an external PyInstaller-style tool.
//!
//! - `template` - spec file template
//! - `spec` - spec rendering from the manifest
//! - `build` - freezer discovery and execution

mod build;
mod spec;
mod template;

pub use build::locate_freezer;
pub use spec::render_spec;

use crate::bundler::error::Result;
use crate::bundler::settings::{BundleTarget, Settings};
use crate::collector::BundleManifest;
use std::path::Path;

/// Freeze a script target into the dist directory.
pub async fn bundle_script(
    settings: &Settings,
    target: &BundleTarget,
    manifest: &BundleManifest,
    entry: &Path,
    icon: Option<&Path>,
    work_dir: &Path,
) -> Result<()> {
    for hook in &target.runtime_hooks {
        if !hook.is_file() {
            crate::bail!(
                "runtime hook for '{}' not found at {}",
                target.name,
                hook.display()
            );
        }
    }
    let freezer = locate_freezer(settings.freezer())?;
    let spec_path = spec::write_spec(settings, target, manifest, entry, icon, work_dir).await?;
    build::run_freezer(&freezer, &spec_path, settings.dist_dir(), &work_dir.join("freezer")).await
}
