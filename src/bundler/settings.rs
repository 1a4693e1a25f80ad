//! Configuration structures for bundling operations.
//!
//! [`Settings`] carries everything the [`Bundler`](super::Bundler) needs: output
//! locations, the shared [`BundleManifest`], and one [`BundleTarget`] per
//! executable to produce. Build it with [`SettingsBuilder`] or directly from a
//! [`PackagingConfig`] via [`Settings::from_config`].

use crate::bundler::error::{Context, Result};
use crate::collector::BundleManifest;
use crate::config::{PackagingConfig, TargetConfig};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::{Path, PathBuf};

/// Output layout of a bundle target.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BundleMode {
    /// Single self-extracting executable at `dist/<name><EXE>`.
    ///
    /// Suited to small helpers.
    #[default]
    OneFile,

    /// Directory collection at `dist/<name>/` with the executable inside.
    ///
    /// Large native libraries stay as sibling files instead of being
    /// decompressed at every launch.
    OneDir,
}

impl BundleMode {
    /// Lowercase identifier used in CLI output and config files.
    pub fn short_name(&self) -> &'static str {
        match self {
            BundleMode::OneFile => "onefile",
            BundleMode::OneDir => "onedir",
        }
    }
}

impl fmt::Display for BundleMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.short_name())
    }
}

/// How a target's executable is produced.
#[derive(Clone, Debug, Eq, PartialEq)]
pub enum TargetSource {
    /// Script entry point handed to the freezer
    Script(PathBuf),
    /// Executable that already exists and is staged as-is
    Prebuilt(PathBuf),
}

/// One executable to produce.
#[derive(Clone, Debug)]
pub struct BundleTarget {
    /// Output name and executable stem
    pub name: String,
    /// Entry point or prebuilt executable
    pub source: TargetSource,
    /// Output layout
    pub mode: BundleMode,
    /// Optional icon; absence never aborts the build
    pub icon: Option<PathBuf>,
    /// Keep a console window
    pub console: bool,
    /// Extra modules to force-include
    pub hidden_imports: Vec<String>,
    /// Startup hooks run by the frozen app before the entry point
    pub runtime_hooks: Vec<PathBuf>,
    /// Whether the shared manifest is embedded
    pub include_assets: bool,
}

impl BundleTarget {
    /// Convert a `[[target]]` entry, resolving paths against `root`.
    pub fn from_config(target: &TargetConfig, root: &Path) -> Result<Self> {
        let resolve = |p: &PathBuf| {
            if p.is_absolute() {
                p.clone()
            } else {
                root.join(p)
            }
        };
        let source = match (&target.entry, &target.prebuilt) {
            (Some(entry), None) => TargetSource::Script(resolve(entry)),
            (None, Some(prebuilt)) => TargetSource::Prebuilt(resolve(prebuilt)),
            _ => crate::bail!(
                "target '{}' needs exactly one of entry or prebuilt",
                target.name
            ),
        };
        Ok(Self {
            name: target.name.clone(),
            source,
            mode: target.mode,
            icon: target.icon.as_ref().map(resolve),
            console: target.console,
            hidden_imports: target.hidden_imports.clone(),
            runtime_hooks: target.runtime_hooks.iter().map(resolve).collect(),
            include_assets: target.include_assets,
        })
    }

    /// Executable file name for the host platform.
    pub fn executable_name(&self) -> String {
        executable_name(&self.name)
    }

    /// Root of the produced artifact: the executable (onefile) or its directory (onedir).
    pub fn output_root(&self, dist_dir: &Path) -> PathBuf {
        match self.mode {
            BundleMode::OneFile => dist_dir.join(self.executable_name()),
            BundleMode::OneDir => dist_dir.join(&self.name),
        }
    }

    /// Location of the produced executable.
    pub fn output_executable(&self, dist_dir: &Path) -> PathBuf {
        match self.mode {
            BundleMode::OneFile => dist_dir.join(self.executable_name()),
            BundleMode::OneDir => dist_dir.join(&self.name).join(self.executable_name()),
        }
    }
}

/// Executable file name for `stem` on the host platform.
pub fn executable_name(stem: &str) -> String {
    format!("{}{}", stem, std::env::consts::EXE_SUFFIX)
}

/// Complete bundler configuration.
#[derive(Clone, Debug)]
pub struct Settings {
    product_name: String,
    version: String,
    dist_dir: PathBuf,
    work_dir: PathBuf,
    targets: Vec<BundleTarget>,
    manifest: BundleManifest,
    freezer: Option<PathBuf>,
}

impl Settings {
    /// Build settings from a loaded config and a collected manifest.
    pub fn from_config(config: &PackagingConfig, manifest: BundleManifest) -> Result<Self> {
        let targets = config
            .targets
            .iter()
            .map(|t| BundleTarget::from_config(t, &config.root))
            .collect::<Result<Vec<_>>>()?;

        SettingsBuilder::new()
            .product_name(&config.package.name)
            .version(&config.package.version)
            .dist_dir(config.dist_dir())
            .work_dir(config.work_dir())
            .targets(targets)
            .manifest(manifest)
            .build()
    }

    /// Product name.
    pub fn product_name(&self) -> &str {
        &self.product_name
    }

    /// Product version string.
    pub fn version_string(&self) -> &str {
        &self.version
    }

    /// Bundle output directory.
    pub fn dist_dir(&self) -> &Path {
        &self.dist_dir
    }

    /// Intermediate work directory.
    pub fn work_dir(&self) -> &Path {
        &self.work_dir
    }

    /// Targets in build order.
    pub fn targets(&self) -> &[BundleTarget] {
        &self.targets
    }

    /// Shared manifest.
    pub fn manifest(&self) -> &BundleManifest {
        &self.manifest
    }

    /// Explicit freezer executable, if configured.
    pub fn freezer(&self) -> Option<&Path> {
        self.freezer.as_deref()
    }

    /// Override the freezer executable.
    pub fn set_freezer(&mut self, path: impl Into<PathBuf>) {
        self.freezer = Some(path.into());
    }

    /// Keep only the named target.
    pub fn retain_target(&mut self, name: &str) -> Result<()> {
        if !self.targets.iter().any(|t| t.name == name) {
            crate::bail!("unknown target '{}'", name);
        }
        self.targets.retain(|t| t.name == name);
        Ok(())
    }
}

/// Builder for [`Settings`].
#[derive(Default)]
pub struct SettingsBuilder {
    product_name: Option<String>,
    version: Option<String>,
    dist_dir: Option<PathBuf>,
    work_dir: Option<PathBuf>,
    targets: Vec<BundleTarget>,
    manifest: BundleManifest,
    freezer: Option<PathBuf>,
}

impl SettingsBuilder {
    /// Creates a new settings builder.
    pub fn new() -> Self {
        Default::default()
    }

    /// Sets the product name. Required.
    pub fn product_name(mut self, name: impl Into<String>) -> Self {
        self.product_name = Some(name.into());
        self
    }

    /// Sets the product version. Required.
    pub fn version(mut self, version: impl Into<String>) -> Self {
        self.version = Some(version.into());
        self
    }

    /// Sets the bundle output directory. Required.
    pub fn dist_dir<P: AsRef<Path>>(mut self, path: P) -> Self {
        self.dist_dir = Some(path.as_ref().to_path_buf());
        self
    }

    /// Sets the work directory.
    ///
    /// Default: `<dist_dir>/../build`
    pub fn work_dir<P: AsRef<Path>>(mut self, path: P) -> Self {
        self.work_dir = Some(path.as_ref().to_path_buf());
        self
    }

    /// Sets targets to build.
    pub fn targets(mut self, targets: Vec<BundleTarget>) -> Self {
        self.targets = targets;
        self
    }

    /// Sets the shared manifest.
    pub fn manifest(mut self, manifest: BundleManifest) -> Self {
        self.manifest = manifest;
        self
    }

    /// Uses an explicit freezer executable instead of searching `PATH`.
    pub fn freezer<P: AsRef<Path>>(mut self, path: P) -> Self {
        self.freezer = Some(path.as_ref().to_path_buf());
        self
    }

    /// Builds the settings.
    ///
    /// # Errors
    ///
    /// Returns an error if `product_name`, `version` or `dist_dir` is missing.
    pub fn build(self) -> Result<Settings> {
        let dist_dir = self.dist_dir.context("dist_dir is required")?;
        let work_dir = self.work_dir.unwrap_or_else(|| {
            dist_dir
                .parent()
                .map(|p| p.join("build"))
                .unwrap_or_else(|| PathBuf::from("build"))
        });

        Ok(Settings {
            product_name: self.product_name.context("product_name is required")?,
            version: self.version.context("version is required")?,
            dist_dir,
            work_dir,
            targets: self.targets,
            manifest: self.manifest,
            freezer: self.freezer,
        })
    }
}
