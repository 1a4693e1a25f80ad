//! Command line argument parsing and validation.

use crate::config::DEFAULT_CONFIG_FILE;
use crate::postinstall::PostInstallOptions;
use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// Packaging tool for HankstoreManager
#[derive(Parser, Debug)]
#[command(
    name = "hankstore_bundler",
    version,
    about = "Collect assets, bundle executables and build the installer for HankstoreManager",
    long_about = "Collect assets, bundle executables and build the installer for HankstoreManager.

Usage:
  hankstore_bundler collect --json
  hankstore_bundler bundle --target HankstoreManager
  hankstore_bundler installer --no-compile
  hankstore_bundler install --target-dir /opt/hankstore --values install_values.txt"
)]
pub struct Args {
    /// Packaging configuration file
    #[arg(
        short,
        long,
        global = true,
        env = "HANKSTORE_CONFIG",
        default_value = DEFAULT_CONFIG_FILE,
        value_name = "PATH"
    )]
    pub config: PathBuf,

    /// Show debug output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Only print errors and requested data
    #[arg(short, long, global = true, conflicts_with = "verbose")]
    pub quiet: bool,

    /// Step to run
    #[command(subcommand)]
    pub command: Command,
}

/// Packaging steps
#[derive(Subcommand, Debug, Clone)]
pub enum Command {
    /// Resolve resources and native libraries into a bundle manifest
    Collect {
        /// Print the manifest as JSON
        #[arg(long)]
        json: bool,
    },

    /// Build bundle targets into the dist directory
    Bundle {
        /// Build only this target
        #[arg(long, value_name = "NAME")]
        target: Option<String>,

        /// Freezer executable to use instead of the one on PATH
        #[arg(long, env = "HANKSTORE_FREEZER", value_name = "PATH")]
        freezer: Option<PathBuf>,
    },

    /// Render the NSIS installer script and compile it when makensis is available
    Installer {
        /// Only write the script
        #[arg(long)]
        no_compile: bool,

        /// Override [installer] output_dir
        #[arg(long, value_name = "DIR")]
        output_dir: Option<PathBuf>,
    },

    /// Install bundle outputs into a directory and run the post-install helper
    Install {
        /// Directory holding the bundle outputs (default: the configured dist dir)
        #[arg(long, value_name = "DIR")]
        build_dir: Option<PathBuf>,

        /// Installation directory
        #[arg(long, value_name = "DIR")]
        target_dir: PathBuf,

        /// Values file to stage for the helper
        #[arg(long, value_name = "PATH")]
        values: Option<PathBuf>,

        /// Bound on the helper run (default: [installer] postinstall_timeout_secs)
        #[arg(long, value_name = "SECS")]
        timeout_secs: Option<u64>,

        /// Write the final install state as JSON
        #[arg(long, value_name = "PATH")]
        report: Option<PathBuf>,
    },
}

impl Command {
    /// Subcommand name for messages.
    pub fn name(&self) -> &'static str {
        match self {
            Command::Collect { .. } => "collect",
            Command::Bundle { .. } => "bundle",
            Command::Installer { .. } => "installer",
            Command::Install { .. } => "install",
        }
    }
}

impl Args {
    /// Parse command line arguments
    pub fn parse_args() -> Self {
        Self::parse()
    }

    /// Validate arguments for consistency
    pub fn validate(&self) -> Result<(), String> {
        match &self.command {
            Command::Bundle {
                target: Some(name), ..
            } if name.trim().is_empty() => Err("--target must not be empty".to_string()),
            Command::Install {
                timeout_secs: Some(0),
                ..
            } => Err("--timeout-secs must be greater than zero".to_string()),
            _ => Ok(()),
        }
    }
}

/// Configuration derived from command line arguments
#[derive(Debug, Clone)]
pub struct RuntimeConfig {
    output: super::OutputManager,
    config_path: PathBuf,
}

impl RuntimeConfig {
    /// Get a reference to the output manager
    pub fn output(&self) -> &super::OutputManager {
        &self.output
    }

    /// Packaging configuration path
    pub fn config_path(&self) -> &std::path::Path {
        &self.config_path
    }
}

impl From<&Args> for RuntimeConfig {
    fn from(args: &Args) -> Self {
        Self {
            output: super::OutputManager::new(args.verbose, args.quiet),
            config_path: args.config.clone(),
        }
    }
}

/// Post-install configurator for HankstoreManager
#[derive(Parser, Debug)]
#[command(
    name = "hankstore_postinstall",
    version,
    about = "Write the staged encryption key into the per-user .env",
    long_about = "Reads install_values.txt staged by the installer, validates \
FACTURATION_OBR_FERNET_KEY and merges it into the per-user .env.

Exit codes: 0 success, 1 usage error, 2 write failure, 3 internal fault, \
4 staged file missing or unreadable, 5 key missing or malformed."
)]
pub struct PostInstallArgs {
    /// Write the key into .env (otherwise only validate)
    #[arg(long)]
    pub write_env: bool,

    /// Staged values file, searched before the default locations
    #[arg(long, env = "HANKSTORE_INSTALL_VALUES", value_name = "PATH")]
    pub values: Option<PathBuf>,

    /// Leave an existing key in .env untouched
    #[arg(long)]
    pub keep_existing: bool,

    /// Require a URL-safe base64 key of 32 bytes
    #[arg(long)]
    pub strict_key: bool,

    /// Generate a key when none is staged and .env has none
    #[arg(long, requires = "write_env")]
    pub generate_if_missing: bool,

    /// Enable verbose debug output
    #[arg(short, long)]
    pub verbose: bool,
}

impl From<&PostInstallArgs> for PostInstallOptions {
    fn from(args: &PostInstallArgs) -> Self {
        Self {
            write_env: args.write_env,
            values: args.values.clone(),
            keep_existing: args.keep_existing,
            strict_key: args.strict_key,
            generate_if_missing: args.generate_if_missing,
            ..Default::default()
        }
    }
}
