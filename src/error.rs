//! Comprehensive error types for hankstore_bundler operations.
//!
//! This module defines all error types with actionable error messages and recovery suggestions.

use std::path::PathBuf;
use thiserror::Error;

/// Result type alias for hankstore_bundler operations
pub type Result<T> = std::result::Result<T, PackagerError>;

/// Main error type for all hankstore_bundler operations
#[derive(Error, Debug)]
pub enum PackagerError {
    /// Packaging configuration errors
    #[error("Config error: {0}")]
    Config(#[from] ConfigError),

    /// Installer orchestration errors
    #[error("Install error: {0}")]
    Install(#[from] InstallError),

    /// Post-install configurator errors
    #[error("Post-install error: {0}")]
    PostInstall(#[from] PostInstallError),

    /// CLI argument errors
    #[error("CLI error: {0}")]
    Cli(#[from] CliError),

    /// IO errors
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON serialization errors
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// TOML parsing errors
    #[error("TOML error: {0}")]
    Toml(#[from] toml::de::Error),

    /// Bundler errors
    #[error("Bundler error: {0}")]
    Bundler(#[from] crate::bundler::Error),
}

/// Packaging configuration errors
#[derive(Error, Debug)]
pub enum ConfigError {
    /// Configuration file not found
    #[error("Packaging config not found at {path}")]
    NotFound {
        /// Path that was probed
        path: PathBuf,
    },

    /// Configuration file could not be parsed
    #[error("Invalid packaging config {path}: {reason}")]
    Invalid {
        /// Path to the config file
        path: PathBuf,
        /// Reason for the error
        reason: String,
    },

    /// A target referenced by name does not exist
    #[error("Unknown bundle target '{name}'")]
    UnknownTarget {
        /// Target name
        name: String,
    },
}

/// Installer orchestration errors
#[derive(Error, Debug)]
pub enum InstallError {
    /// Required build artifact missing before file placement
    #[error("Required build artifact missing: {path}")]
    MissingArtifact {
        /// Expected artifact location
        path: PathBuf,
    },

    /// Copying files into the target directory failed
    #[error("Failed to place {path}: {reason}")]
    PlacementFailed {
        /// File or directory being placed
        path: PathBuf,
        /// Reason for the error
        reason: String,
    },

    /// The installer compiler reported a failure
    #[error("Installer compilation failed: {reason}")]
    CompileFailed {
        /// Reason for the error
        reason: String,
    },

    /// Phase change not allowed by the install sequence
    #[error("Invalid install phase transition from {from} to {to}")]
    InvalidTransition {
        /// Current phase
        from: String,
        /// Requested phase
        to: String,
    },

    /// Writing the install report failed
    #[error("Failed to write install report {path}: {reason}")]
    ReportFailed {
        /// Report path
        path: PathBuf,
        /// Reason for the error
        reason: String,
    },
}

/// Post-install configurator errors.
///
/// Each variant maps onto a stable process exit code via [`PostInstallError::exit_code`],
/// since the installer only observes the exit status.
#[derive(Error, Debug)]
pub enum PostInstallError {
    /// No staged values file could be found or read
    #[error("Staged values file not found (searched: {searched:?})")]
    ValuesNotFound {
        /// Locations that were probed
        searched: Vec<PathBuf>,
    },

    /// Staged values file exists but could not be read
    #[error("Failed to read staged values {path}: {source}")]
    ValuesUnreadable {
        /// Path of the staged file
        path: PathBuf,
        /// Underlying I/O error
        #[source]
        source: std::io::Error,
    },

    /// Required key is absent
    #[error("Required entry '{key}' missing from staged values")]
    MissingKey {
        /// Key name
        key: String,
    },

    /// Required key has an unusable value
    #[error("Malformed value for '{key}': {reason}")]
    MalformedValue {
        /// Key name
        key: String,
        /// Reason for the error
        reason: String,
    },

    /// Writing the persisted configuration failed
    #[error("Failed to write {path}: {reason}")]
    WriteFailed {
        /// Target path
        path: PathBuf,
        /// Reason for the error
        reason: String,
    },

    /// Per-user data directory could not be determined
    #[error("Could not determine the per-user data directory")]
    NoDataDir,

    /// The OS random source failed while generating a key
    #[error("Failed to generate a key: {reason}")]
    KeyGeneration {
        /// Reason for the error
        reason: String,
    },
}

impl PostInstallError {
    /// Process exit code reported to the installer.
    pub fn exit_code(&self) -> i32 {
        match self {
            PostInstallError::WriteFailed { .. } | PostInstallError::NoDataDir => 2,
            PostInstallError::ValuesNotFound { .. } | PostInstallError::ValuesUnreadable { .. } => 4,
            PostInstallError::MissingKey { .. } | PostInstallError::MalformedValue { .. } => 5,
            PostInstallError::KeyGeneration { .. } => 3,
        }
    }

    /// The staged values carry no key at all, as opposed to a bad one.
    pub fn is_key_absent(&self) -> bool {
        matches!(
            self,
            PostInstallError::ValuesNotFound { .. } | PostInstallError::MissingKey { .. }
        )
    }
}

/// CLI-specific errors
#[derive(Error, Debug)]
pub enum CliError {
    /// Invalid command line arguments
    #[error("Invalid arguments: {reason}")]
    InvalidArguments {
        /// Reason for the error
        reason: String,
    },
}

impl PackagerError {
    /// Get actionable recovery suggestions for this error
    pub fn recovery_suggestions(&self) -> Vec<String> {
        match self {
            PackagerError::Config(ConfigError::NotFound { path }) => vec![
                format!("Create {} or pass --config <PATH>", path.display()),
            ],
            PackagerError::Config(ConfigError::UnknownTarget { .. }) => vec![
                "Run 'hankstore_bundler collect' to list configured targets".to_string(),
            ],
            PackagerError::Install(InstallError::MissingArtifact { .. }) => vec![
                "Run 'hankstore_bundler bundle' before building the installer".to_string(),
                "Check that [installer] app_target and helper_target match [[target]] names"
                    .to_string(),
            ],
            PackagerError::PostInstall(PostInstallError::ValuesNotFound { .. }) => vec![
                "Set HANKSTORE_INSTALL_VALUES or pass --values <PATH>".to_string(),
            ],
            PackagerError::Bundler(_) => vec![
                "Re-run with RUST_LOG=debug for the freezer output".to_string(),
            ],
            _ => vec!["Check the error message above for specific details".to_string()],
        }
    }

    /// Check if this error is recoverable
    pub fn is_recoverable(&self) -> bool {
        !matches!(self, PackagerError::Install(InstallError::MissingArtifact { .. }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_postinstall_exit_codes_are_distinct_by_class() {
        let missing = PostInstallError::ValuesNotFound { searched: vec![] };
        let key = PostInstallError::MissingKey {
            key: "K".to_string(),
        };
        let write = PostInstallError::WriteFailed {
            path: PathBuf::from("/x"),
            reason: "denied".to_string(),
        };
        assert_eq!(missing.exit_code(), 4);
        assert_eq!(key.exit_code(), 5);
        assert_eq!(write.exit_code(), 2);
    }

    #[test]
    fn test_missing_artifact_not_recoverable() {
        let err = PackagerError::Install(InstallError::MissingArtifact {
            path: PathBuf::from("dist/app"),
        });
        assert!(!err.is_recoverable());
        assert!(!err.recovery_suggestions().is_empty());
    }
}
