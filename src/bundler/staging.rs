//! Prebuilt targets, staged without a freezer.
//!
//! A onefile target is a single copy of the executable. A onedir target gets a
//! fresh collection directory holding the executable, the manifest resources at
//! their bundle-relative paths and every resolved native library as a sibling.

use crate::bundler::error::{Context, Result};
use crate::bundler::settings::{BundleMode, BundleTarget};
use crate::bundler::utils::fs;
use crate::collector::BundleManifest;
use std::path::Path;

/// Stage `prebuilt` for `target` under `dist_dir`.
pub async fn stage_prebuilt(
    target: &BundleTarget,
    manifest: &BundleManifest,
    prebuilt: &Path,
    dist_dir: &Path,
) -> Result<()> {
    if !prebuilt.is_file() {
        crate::bail!(
            "prebuilt executable for '{}' not found at {}",
            target.name,
            prebuilt.display()
        );
    }

    let executable = target.output_executable(dist_dir);

    match target.mode {
        BundleMode::OneFile => {
            fs::copy_file(prebuilt, &executable)
                .await
                .with_context(|| format!("staging {}", target.name))?;
        }
        BundleMode::OneDir => {
            let root = target.output_root(dist_dir);
            fs::create_dir_all(&root, true).await?;
            fs::copy_file(prebuilt, &executable)
                .await
                .with_context(|| format!("staging {}", target.name))?;

            for resource in &manifest.resources {
                fs::copy_file(&resource.source, &root.join(resource.target_path()))
                    .await
                    .with_context(|| format!("staging resource {}", resource.source.display()))?;
            }
            for binary in manifest.binaries() {
                fs::copy_file(&binary.path, &root.join(&binary.file_name))
                    .await
                    .with_context(|| format!("staging library {}", binary.file_name))?;
            }
        }
    }

    log::debug!("Staged {} at {}", target.name, executable.display());
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bundler::settings::TargetSource;
    use crate::collector::{CandidateSource, ResolvedFile, ResolvedLibrary, ResourceMapping};

    fn target(mode: BundleMode, prebuilt: &Path) -> BundleTarget {
        BundleTarget {
            name: "hankstore_postinstall".into(),
            source: TargetSource::Prebuilt(prebuilt.to_path_buf()),
            mode,
            icon: None,
            console: true,
            hidden_imports: vec![],
            runtime_hooks: vec![],
            include_assets: true,
        }
    }

    #[tokio::test]
    async fn test_onedir_places_siblings() {
        let tmp = tempfile::tempdir().unwrap();
        let exe = tmp.path().join("helper.bin");
        let logo = tmp.path().join("logo.png");
        let dll = tmp.path().join("sqlcipher.dll");
        for p in [&exe, &logo, &dll] {
            std::fs::write(p, b"x").unwrap();
        }
        let manifest = BundleManifest {
            resources: vec![ResourceMapping::new(&logo, "assets")],
            native_libraries: vec![ResolvedLibrary {
                name: "sqlcipher".into(),
                mandatory: true,
                files: vec![ResolvedFile {
                    file_name: "sqlcipher.dll".into(),
                    path: dll.clone(),
                    source: CandidateSource::EnvOverride,
                }],
                missing: vec![],
            }],
            hidden_imports: vec![],
        };

        let dist = tmp.path().join("dist");
        let t = target(BundleMode::OneDir, &exe);
        stage_prebuilt(&t, &manifest, &exe, &dist).await.unwrap();

        let root = dist.join("hankstore_postinstall");
        assert!(t.output_executable(&dist).is_file());
        assert!(root.join("assets/logo.png").is_file());
        assert!(root.join("sqlcipher.dll").is_file());
    }

    #[tokio::test]
    async fn test_missing_prebuilt_fails() {
        let tmp = tempfile::tempdir().unwrap();
        let exe = tmp.path().join("absent");
        let t = target(BundleMode::OneFile, &exe);
        let result = stage_prebuilt(&t, &BundleManifest::default(), &exe, tmp.path()).await;
        assert!(result.is_err());
    }
}
