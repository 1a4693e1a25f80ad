//! Bundle orchestration.
//!
//! The [`Bundler`] builds each configured target in order:
//! 1. Writes the target's manifest to `<work>/<name>/bundle-manifest.json`
//! 2. Prepares the icon, if any
//! 3. Freezes a script target or stages a prebuilt one
//! 4. Verifies the output exists and records size and checksum
//!
//! # Example
//!
//! ```no_run
//! use hankstore_bundler::bundler::{Bundler, SettingsBuilder};
//!
//! # async fn example() -> hankstore_bundler::bundler::Result<()> {
//! let settings = SettingsBuilder::new()
//!     .product_name("HankstoreManager")
//!     .version("1.0.0")
//!     .dist_dir("dist")
//!     .build()?;
//!
//! let bundler = Bundler::new(settings);
//! for artifact in bundler.bundle().await? {
//!     println!("Created: {} ({} bytes)", artifact.target, artifact.size);
//!     println!("SHA256: {}", artifact.checksum);
//! }
//! # Ok(())
//! # }
//! ```

use crate::bundler::error::{Error, Result};
use crate::bundler::settings::{BundleTarget, Settings, TargetSource};
use crate::bundler::{BundledArtifact, checksum, freezer, icon, staging, utils::fs};
use crate::collector::BundleManifest;

/// File name of the per-target manifest in the work directory.
pub const MANIFEST_FILE_NAME: &str = "bundle-manifest.json";

/// Builds bundle targets from [`Settings`].
#[derive(Debug)]
pub struct Bundler {
    settings: Settings,
}

impl Bundler {
    /// Creates a new bundler with the given settings.
    pub fn new(settings: Settings) -> Self {
        Self { settings }
    }

    /// Returns a reference to the bundler settings.
    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    /// Builds every configured target, stopping at the first failure.
    pub async fn bundle(&self) -> Result<Vec<BundledArtifact>> {
        let missing = self.settings.manifest().missing_mandatory();
        if !missing.is_empty() {
            log::error!(
                "Bundling without MANDATORY native libraries: {}",
                missing.join(", ")
            );
        }

        let mut artifacts = Vec::with_capacity(self.settings.targets().len());
        for target in self.settings.targets() {
            artifacts.push(self.bundle_target(target).await?);
        }
        Ok(artifacts)
    }

    /// The manifest a target embeds: the shared one, or none, plus its hidden imports.
    pub fn manifest_for(&self, target: &BundleTarget) -> BundleManifest {
        let base = if target.include_assets {
            self.settings.manifest().clone()
        } else {
            BundleManifest::default()
        };
        base.with_hidden_imports(target.hidden_imports.iter().cloned())
    }

    /// Builds one target.
    pub async fn bundle_target(&self, target: &BundleTarget) -> Result<BundledArtifact> {
        log::info!("Bundling {} ({})", target.name, target.mode);

        let work_dir = self.settings.work_dir().join(&target.name);
        fs::create_dir_all(&work_dir, false).await?;

        let manifest = self.manifest_for(target);
        manifest.write_json(&work_dir.join(MANIFEST_FILE_NAME))?;

        let icon = icon::prepare_icon(target.icon.as_deref(), &work_dir);

        match &target.source {
            TargetSource::Script(entry) => {
                if !entry.is_file() {
                    crate::bail!(
                        "entry point for '{}' not found at {}",
                        target.name,
                        entry.display()
                    );
                }
                freezer::bundle_script(
                    &self.settings,
                    target,
                    &manifest,
                    entry,
                    icon.as_deref(),
                    &work_dir,
                )
                .await?;
            }
            TargetSource::Prebuilt(path) => {
                if icon.is_some() {
                    log::debug!("Icon ignored for prebuilt target {}", target.name);
                }
                staging::stage_prebuilt(target, &manifest, path, self.settings.dist_dir())
                    .await?;
            }
        }

        let executable = target.output_executable(self.settings.dist_dir());
        if !executable.is_file() {
            return Err(Error::MissingOutput(executable));
        }

        let root = target.output_root(self.settings.dist_dir());
        let size = fs::path_size(&root)?;
        let checksum = checksum::calculate_sha256(&root).await?;

        log::info!("Created {} ({} bytes)", executable.display(), size);

        Ok(BundledArtifact {
            target: target.name.clone(),
            mode: target.mode,
            executable,
            root,
            size,
            checksum,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bundler::settings::{BundleMode, SettingsBuilder};
    use std::path::Path;

    fn prebuilt_target(name: &str, mode: BundleMode, path: &Path) -> BundleTarget {
        BundleTarget {
            name: name.into(),
            source: TargetSource::Prebuilt(path.to_path_buf()),
            mode,
            icon: Some(path.with_file_name("missing.ico")),
            console: true,
            hidden_imports: vec!["sqlcipher3".into()],
            runtime_hooks: vec![],
            include_assets: false,
        }
    }

    #[tokio::test]
    async fn test_bundle_prebuilt_onefile() {
        let tmp = tempfile::tempdir().unwrap();
        let exe = tmp.path().join("helper.bin");
        std::fs::write(&exe, b"#!/bin/sh\nexit 0\n").unwrap();

        let settings = SettingsBuilder::new()
            .product_name("HankstoreManager")
            .version("1.0.0")
            .dist_dir(tmp.path().join("dist"))
            .work_dir(tmp.path().join("build"))
            .targets(vec![prebuilt_target("helper", BundleMode::OneFile, &exe)])
            .build()
            .unwrap();

        let artifacts = Bundler::new(settings).bundle().await.unwrap();
        assert_eq!(artifacts.len(), 1);
        let artifact = &artifacts[0];
        assert_eq!(artifact.size, 17);
        assert_eq!(artifact.checksum.len(), 64);
        assert!(artifact.executable.is_file());

        let manifest_path = tmp.path().join("build/helper").join(MANIFEST_FILE_NAME);
        let json = std::fs::read_to_string(manifest_path).unwrap();
        assert!(json.contains("sqlcipher3"));
    }

    #[tokio::test]
    async fn test_missing_entry_point_fails() {
        let tmp = tempfile::tempdir().unwrap();
        let target = BundleTarget {
            name: "HankstoreManager".into(),
            source: TargetSource::Script(tmp.path().join("main.py")),
            mode: BundleMode::OneDir,
            icon: None,
            console: false,
            hidden_imports: vec![],
            runtime_hooks: vec![],
            include_assets: true,
        };
        let settings = SettingsBuilder::new()
            .product_name("HankstoreManager")
            .version("1.0.0")
            .dist_dir(tmp.path().join("dist"))
            .targets(vec![target])
            .build()
            .unwrap();

        assert!(Bundler::new(settings).bundle().await.is_err());
    }
}
