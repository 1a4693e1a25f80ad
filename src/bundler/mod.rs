//! Bundle Builder: turns collected assets and entry points into runnable bundles.
//!
//! Each `[[target]]` in `hankstore.toml` becomes one artifact in `dist/`:
//!
//! | Mode | Layout | Typical use |
//! |------|--------|-------------|
//! | onefile | `dist/<name><EXE>` | post-install helper |
//! | onedir | `dist/<name>/<name><EXE>` plus siblings | main application |
//!
//! Script targets are frozen by an external PyInstaller-style tool from a
//! rendered spec file. Prebuilt targets (such as the post-install helper built
//! from this crate) are staged directly.
//!
//! ```no_run
//! use hankstore_bundler::{AssetCollector, PackagingConfig};
//! use hankstore_bundler::bundler::{Bundler, Settings};
//! use std::path::Path;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let config = PackagingConfig::load(Path::new("hankstore.toml"))?;
//! let manifest = AssetCollector::new(&config).collect();
//! let bundler = Bundler::new(Settings::from_config(&config, manifest)?);
//! let artifacts = bundler.bundle().await?;
//! # Ok(())
//! # }
//! ```

mod builder;
mod checksum;
pub mod error;
mod freezer;
mod icon;
mod settings;
mod staging;
pub(crate) mod utils;

pub use builder::{Bundler, MANIFEST_FILE_NAME};
pub use checksum::calculate_sha256;
pub use error::{Error, Result};
pub use freezer::render_spec;
pub use icon::{create_ico_file, prepare_icon};
pub use settings::{
    BundleMode, BundleTarget, Settings, SettingsBuilder, TargetSource, executable_name,
};

use serde::Serialize;
use std::path::PathBuf;

/// A bundled target and its integrity metadata.
#[derive(Debug, Clone, Serialize)]
pub struct BundledArtifact {
    /// Target name
    pub target: String,

    /// Layout the target was built with
    pub mode: BundleMode,

    /// The runnable executable
    pub executable: PathBuf,

    /// The executable itself (onefile) or its collection directory (onedir)
    pub root: PathBuf,

    /// Total size of `root` in bytes.
    pub size: u64,

    /// SHA-256 checksum of `root` for integrity verification.
    ///
    /// Directories hash every file path and content in sorted order.
    pub checksum: String,
}
