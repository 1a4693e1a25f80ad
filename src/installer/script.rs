//! NSIS installer script generation and compilation.
//!
//! The rendered script encodes the install sequence for the real installer
//! framework: a compile-time guard on both artifacts, file placement, the
//! helper run with exit-code inspection, and removal of the staged values.

use super::template::NSI_TEMPLATE;
use crate::bundler::error::{ErrorExt, Result as BundlerResult};
use crate::bundler::{BundleMode, executable_name};
use crate::config::PackagingConfig;
use crate::error::{ConfigError, InstallError, Result};
use crate::postinstall::INSTALL_VALUES_ENV;
use crate::INSTALL_VALUES_FILE;
use handlebars::Handlebars;
use serde::Serialize;
use std::path::{Path, PathBuf};
use std::sync::LazyLock;
use tokio::io::AsyncWriteExt;
use walkdir::WalkDir;

/// File name of the rendered script.
pub const NSI_FILE_NAME: &str = "installer.nsi";

/// Check if makensis is available, once per process.
static HAS_MAKENSIS: LazyLock<bool> = LazyLock::new(|| match which::which("makensis") {
    Ok(path) => match std::process::Command::new(&path).arg("-VERSION").output() {
        Ok(output) if output.status.success() => {
            let version = String::from_utf8_lossy(&output.stdout);
            log::info!("makensis available: {}", version.trim());
            true
        }
        Ok(output) => {
            log::warn!(
                "makensis found at {} but -VERSION check failed (exit code: {:?})",
                path.display(),
                output.status.code()
            );
            false
        }
        Err(e) => {
            log::warn!("makensis found at {} but failed to execute: {}", path.display(), e);
            false
        }
    },
    Err(e) => {
        log::debug!("makensis not found in PATH: {}", e);
        false
    }
});

/// Whether makensis can be used to compile scripts.
pub fn has_makensis() -> bool {
    *HAS_MAKENSIS
}

/// Everything the installer script needs.
#[derive(Debug, Clone)]
pub struct InstallScript {
    /// Product name shown by the installer
    pub product_name: String,
    /// Product version
    pub version: String,
    /// Publisher shown in file properties
    pub publisher: String,
    /// Description shown in file properties
    pub description: String,
    /// Main application artifact (file or onedir directory)
    pub app_source: PathBuf,
    /// Layout of the main application
    pub app_mode: BundleMode,
    /// Main application executable name
    pub app_exe: String,
    /// Helper executable
    pub helper_source: PathBuf,
    /// Values bundled for staging, if any
    pub values_source: Option<PathBuf>,
    /// Default installer output path
    pub output_file: PathBuf,
}

impl InstallScript {
    /// Derive the script inputs from `[installer]` and the bundle targets.
    pub fn from_config(config: &PackagingConfig) -> Result<Self> {
        let installer = &config.installer;
        let app_name = installer.app_target.as_deref().ok_or_else(|| ConfigError::Invalid {
            path: config.root.clone(),
            reason: "[installer] app_target is not set".to_string(),
        })?;
        let helper_name = installer
            .helper_target
            .as_deref()
            .ok_or_else(|| ConfigError::Invalid {
                path: config.root.clone(),
                reason: "[installer] helper_target is not set".to_string(),
            })?;

        let app = config.target(app_name)?;
        config.target(helper_name)?;

        let dist = config.dist_dir();
        let app_source = match app.mode {
            BundleMode::OneFile => dist.join(executable_name(app_name)),
            BundleMode::OneDir => dist.join(app_name),
        };
        let output_file = config.resolve(&installer.output_dir).join(format!(
            "{}_{}_setup.exe",
            config.package.name, config.package.version
        ));

        Ok(Self {
            product_name: config.package.name.clone(),
            version: config.package.version.clone(),
            publisher: config
                .package
                .publisher
                .clone()
                .unwrap_or_else(|| "Unknown Publisher".to_string()),
            description: config
                .package
                .description
                .clone()
                .unwrap_or_else(|| format!("{} installer", config.package.name)),
            app_source,
            app_mode: app.mode,
            app_exe: executable_name(app_name),
            helper_source: dist.join(executable_name(helper_name)),
            values_source: installer.values_file.as_deref().map(|p| config.resolve(p)),
            output_file,
        })
    }

    /// Path whose existence proves the main application was built.
    pub fn app_check(&self) -> PathBuf {
        match self.app_mode {
            BundleMode::OneFile => self.app_source.clone(),
            BundleMode::OneDir => self.app_source.join(&self.app_exe),
        }
    }

    /// Verify both artifacts exist before rendering.
    pub fn check_artifacts(&self) -> std::result::Result<(), InstallError> {
        for path in [self.app_check(), self.helper_source.clone()] {
            if !path.is_file() {
                return Err(InstallError::MissingArtifact { path });
            }
        }
        Ok(())
    }

    /// Paths placed under the install directory for the main application,
    /// relative and backslash-separated: files, then directories deepest first.
    ///
    /// A onedir collection is enumerated from disk, so the uninstaller removes
    /// exactly what was installed and leaves anything else in place.
    pub fn installed_layout(&self) -> (Vec<String>, Vec<String>) {
        if self.app_mode == BundleMode::OneFile {
            return (vec![self.app_exe.clone()], Vec::new());
        }

        let mut files = Vec::new();
        let mut dirs = Vec::new();
        for entry in WalkDir::new(&self.app_source)
            .min_depth(1)
            .into_iter()
            .filter_map(|e| e.ok())
        {
            let Ok(relative) = entry.path().strip_prefix(&self.app_source) else {
                continue;
            };
            let relative = relative
                .components()
                .map(|c| c.as_os_str().to_string_lossy())
                .collect::<Vec<_>>()
                .join("\\");
            if entry.file_type().is_dir() {
                dirs.push((entry.depth(), relative));
            } else {
                files.push(relative);
            }
        }
        files.sort();
        dirs.sort_by(|a, b| b.0.cmp(&a.0).then_with(|| a.1.cmp(&b.1)));
        (files, dirs.into_iter().map(|(_, d)| d).collect())
    }

    /// Render the script text.
    pub fn render(&self) -> BundlerResult<String> {
        let (installed_files, installed_dirs) = self.installed_layout();
        let data = ScriptData {
            product_name: nsis_escape(&self.product_name),
            version: nsis_escape(&self.version),
            version_nsis: format_version_for_nsis(&self.version),
            publisher: nsis_escape(&self.publisher),
            description: nsis_escape(&self.description),
            app_source: nsis_path(&self.app_source),
            app_check: nsis_path(&self.app_check()),
            app_is_dir: self.app_mode == BundleMode::OneDir,
            app_exe: nsis_escape(&self.app_exe),
            helper_source: nsis_path(&self.helper_source),
            helper_exe: self
                .helper_source
                .file_name()
                .map(|n| nsis_escape(&n.to_string_lossy()))
                .unwrap_or_default(),
            values_source: self.values_source.as_deref().map(nsis_path),
            values_name: INSTALL_VALUES_FILE,
            values_env: INSTALL_VALUES_ENV,
            output_file: nsis_path(&self.output_file),
            installed_files: installed_files.iter().map(|f| instdir_path(f)).collect(),
            installed_dirs: installed_dirs.iter().map(|d| instdir_path(d)).collect(),
        };

        let mut handlebars = Handlebars::new();
        handlebars.register_escape_fn(handlebars::no_escape);
        handlebars.register_template_string(NSI_FILE_NAME, NSI_TEMPLATE)?;
        Ok(handlebars.render(NSI_FILE_NAME, &data)?)
    }

    /// Render into `<output_dir>/installer.nsi` with a UTF-8 BOM.
    pub async fn write(&self, output_dir: &Path) -> BundlerResult<PathBuf> {
        tokio::fs::create_dir_all(output_dir)
            .await
            .fs_context("creating installer output directory", output_dir)?;
        let nsi_path = output_dir.join(NSI_FILE_NAME);
        write_utf8_bom(&nsi_path, &self.render()?).await?;
        log::info!("Wrote installer script {}", nsi_path.display());
        Ok(nsi_path)
    }
}

#[derive(Serialize)]
struct ScriptData {
    product_name: String,
    version: String,
    version_nsis: String,
    publisher: String,
    description: String,
    app_source: String,
    app_check: String,
    app_is_dir: bool,
    app_exe: String,
    helper_source: String,
    helper_exe: String,
    values_source: Option<String>,
    values_name: &'static str,
    values_env: &'static str,
    output_file: String,
    installed_files: Vec<String>,
    installed_dirs: Vec<String>,
}

/// Escape text for an NSIS double-quoted string.
fn nsis_escape(value: &str) -> String {
    value.replace('$', "$$").replace('"', "$\\\"")
}

fn instdir_path(relative: &str) -> String {
    format!("$INSTDIR\\{}", nsis_escape(relative))
}

fn nsis_path(path: &Path) -> String {
    nsis_escape(&path.to_string_lossy())
}

/// Format a version for `VIProductVersion`, which needs exactly four numeric parts.
///
/// Pre-release and build suffixes are dropped; missing parts become `0` and
/// parts beyond the fourth are ignored.
pub fn format_version_for_nsis(version: &str) -> String {
    let core = version
        .split(['-', '+'])
        .next()
        .unwrap_or(version);
    let mut parts: Vec<u64> = core
        .split('.')
        .map(|p| p.trim().parse().unwrap_or(0))
        .take(4)
        .collect();
    parts.resize(4, 0);
    parts
        .iter()
        .map(u64::to_string)
        .collect::<Vec<_>>()
        .join(".")
}

/// Write a file with the UTF-8 byte order mark NSIS expects.
pub async fn write_utf8_bom(path: &Path, content: &str) -> BundlerResult<()> {
    let mut file = tokio::fs::File::create(path)
        .await
        .fs_context("creating NSI script file", path)?;

    file.write_all(&[0xEF, 0xBB, 0xBF])
        .await
        .fs_context("writing UTF-8 BOM", path)?;
    file.write_all(content.as_bytes())
        .await
        .fs_context("writing NSI content", path)?;
    file.flush().await.fs_context("flushing NSI file", path)?;

    Ok(())
}

/// Compile a script with makensis into `output_path`.
pub async fn compile(nsi_path: &Path, output_path: &Path) -> std::result::Result<(), InstallError> {
    log::info!("Running makensis...");

    if let Some(parent) = output_path.parent() {
        tokio::fs::create_dir_all(parent)
            .await
            .map_err(|e| InstallError::CompileFailed {
                reason: format!("creating {}: {e}", parent.display()),
            })?;
    }

    let status = tokio::process::Command::new("makensis")
        .arg("-V3")
        .arg("-INPUTCHARSET")
        .arg("UTF8")
        .arg(format!("-DOUTPUT_FILE={}", output_path.display()))
        .arg(nsi_path)
        .status()
        .await
        .map_err(|e| InstallError::CompileFailed {
            reason: format!("failed to run makensis: {e}"),
        })?;

    if !status.success() {
        return Err(InstallError::CompileFailed {
            reason: format!("makensis exited with {:?}", status.code()),
        });
    }

    log::info!("Created installer {}", output_path.display());
    Ok(())
}
