//! # Hankstore Bundler
//!
//! Packaging and first-run configuration toolkit for the HankstoreManager
//! desktop billing application.
//!
//! The workflow runs in four sequential steps:
//!
//! - **Asset collection** ([`collector`]): resource folders, explicit files and
//!   native library candidates are resolved into a [`BundleManifest`].
//! - **Bundling** ([`bundler`]): each configured target is turned into a
//!   single-file executable or a directory collection under `dist/`.
//! - **Installation** ([`installer`]): the build outputs are placed into the
//!   target directory and the post-install helper is run once.
//! - **Post-install configuration** ([`postinstall`]): the staged
//!   `install_values.txt` is validated and merged into the per-user `.env`.
//!
//! ## Usage
//!
//! ```bash
//! hankstore_bundler collect --json          # Show the resolved manifest
//! hankstore_bundler bundle                  # Build every target in hankstore.toml
//! hankstore_bundler installer               # Render and compile the NSIS script
//! hankstore_bundler install --build-dir dist --target-dir /opt/hankstore
//! hankstore_postinstall --write-env         # Run on the end-user machine
//! ```

#![deny(unsafe_code)]
#![warn(missing_docs)]
#![warn(rust_2018_idioms)]

// Core modules
pub mod bundler;
pub mod cli;
pub mod collector;
pub mod config;
pub mod error;
pub mod installer;
pub mod postinstall;

// Re-export main types for public API
pub use bundler::{BundleMode, BundledArtifact, Bundler};
pub use cli::Args;
pub use collector::{AssetCollector, BundleManifest, ResourceMapping};
pub use config::PackagingConfig;
pub use error::{CliError, PackagerError, Result};
pub use installer::{InstallOutcome, InstallPhase, InstallPlan, Installer};
pub use postinstall::{InstallValues, PostInstallOptions};

/// Application name used for the per-user data directory.
pub const APP_NAME: &str = "hankstoremanager";

/// Name of the required secret entry in the staged values and persisted config.
pub const FERNET_KEY_NAME: &str = "FACTURATION_OBR_FERNET_KEY";

/// File name of the staged key/value file delivered with the installer payload.
pub const INSTALL_VALUES_FILE: &str = "install_values.txt";
