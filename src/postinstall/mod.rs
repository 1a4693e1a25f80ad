//! Post-Install Configurator.
//!
//! Runs once on the end-user machine, right after the installer placed the
//! files. It reads the staged `install_values.txt`, checks the encryption key,
//! and merges it into the per-user `.env`:
//!
//! 1. Locate and parse the staged values
//! 2. Validate the key
//! 3. Seed `.env` from the shipped `.env.example` when it does not exist yet
//! 4. Merge the key and write atomically
//! 5. Copy a shipped `app.inv` next to `.env`
//!
//! Steps 1 and 2 run before anything touches the data directory, so a missing
//! or malformed key never leaves a partial write behind. With
//! `generate_if_missing` an absent key is replaced by a fresh random one,
//! unless `.env` already holds a key.

mod env_file;
mod paths;
mod secret;
mod values;

pub use env_file::{ENV_EXAMPLE_FILE_NAME, ENV_FILE_NAME, EnvFile, merge_or_set};
pub use paths::{
    DATA_DIR_ENV, INSTALL_VALUES_ENV, exe_dir, find_shipped_file, locate_values_file,
    user_data_dir, values_candidates,
};
pub use secret::{generate_fernet_key, is_fernet_key, validate_secret};
pub use values::InstallValues;

use crate::FERNET_KEY_NAME;
use crate::error::PostInstallError;
use serde::Serialize;
use std::path::{Path, PathBuf};

/// Inventory file copied next to `.env` when shipped.
pub const APP_INVENTORY_FILE: &str = "app.inv";

/// Exit code for success.
pub const EXIT_OK: i32 = 0;
/// Exit code for command-line usage errors.
pub const EXIT_USAGE: i32 = 1;
/// Exit code for unexpected internal faults.
pub const EXIT_INTERNAL: i32 = 3;

/// What the configurator should do.
#[derive(Debug, Clone, Default)]
pub struct PostInstallOptions {
    /// Write the key into `.env`; otherwise only locate and validate
    pub write_env: bool,
    /// Explicit staged values file, searched before the defaults
    pub values: Option<PathBuf>,
    /// Leave an existing key line untouched
    pub keep_existing: bool,
    /// Require a well-formed Fernet key
    pub strict_key: bool,
    /// When the staged key is absent and `.env` has none, write a fresh one
    pub generate_if_missing: bool,
    /// Directory the shipped files live in; defaults to the executable's
    pub exe_dir: Option<PathBuf>,
    /// Per-user data directory; defaults to [`user_data_dir`]
    pub data_dir: Option<PathBuf>,
}

/// Result of a successful run.
#[derive(Debug, Clone, Default, Serialize)]
pub struct PostInstallReport {
    /// Staged file that was read, if one held the key
    pub values_path: Option<PathBuf>,
    /// Persisted config path, when writing
    pub env_path: Option<PathBuf>,
    /// Template `.env` was seeded from
    pub seeded_from: Option<PathBuf>,
    /// Whether the key line changed
    pub key_updated: bool,
    /// Whether the key was generated rather than taken from the staged values
    pub key_generated: bool,
    /// Whether `.env` was written
    pub written: bool,
    /// Where `app.inv` was copied, if it was
    pub inventory_copied: Option<PathBuf>,
}

/// Run the configurator.
pub fn run(options: &PostInstallOptions) -> Result<PostInstallReport, PostInstallError> {
    let exe_dir = options.exe_dir.clone().unwrap_or_else(exe_dir);
    let mut report = PostInstallReport::default();

    let staged_key = match load_staged_key(options, &exe_dir) {
        Ok((path, key)) => {
            report.values_path = Some(path);
            Some(key)
        }
        Err(e) if options.generate_if_missing && options.write_env && e.is_key_absent() => {
            log::warn!("{e}; a new key is generated unless .env already holds one");
            None
        }
        Err(e) => return Err(e),
    };

    if !options.write_env {
        log::info!("{} present and valid; nothing written", FERNET_KEY_NAME);
        return Ok(report);
    }

    let data_dir = options
        .data_dir
        .clone()
        .or_else(user_data_dir)
        .ok_or(PostInstallError::NoDataDir)?;
    let env_path = data_dir.join(ENV_FILE_NAME);
    log::info!("exe_dir={} data_dir={}", exe_dir.display(), data_dir.display());

    let mut env = EnvFile::load(&env_path)?;
    if !env_path.exists() {
        if let Some(example) = find_shipped_file(ENV_EXAMPLE_FILE_NAME, &exe_dir) {
            match std::fs::read_to_string(&example) {
                Ok(text) => {
                    log::info!("Seeding {} from {}", env_path.display(), example.display());
                    env = EnvFile::new(&env_path, text);
                    report.seeded_from = Some(example);
                }
                Err(e) => log::warn!("Could not read {}: {}", example.display(), e),
            }
        }
    }

    match staged_key {
        Some(key) => {
            report.key_updated = env.set(FERNET_KEY_NAME, &key, !options.keep_existing);
            log::info!("Injected {} into {}", FERNET_KEY_NAME, env_path.display());
        }
        None if env.get(FERNET_KEY_NAME).is_some_and(|v| !v.is_empty()) => {
            log::info!("{} already set in {}; kept", FERNET_KEY_NAME, env_path.display());
        }
        None => {
            let key = generate_fernet_key()?;
            report.key_updated = env.set(FERNET_KEY_NAME, &key, true);
            report.key_generated = true;
            log::info!("Generated {} into {}", FERNET_KEY_NAME, env_path.display());
        }
    }
    env.save()?;
    report.written = true;
    report.env_path = Some(env_path);

    if let Some(inventory) = find_shipped_file(APP_INVENTORY_FILE, &exe_dir) {
        let dest = data_dir.join(APP_INVENTORY_FILE);
        match std::fs::copy(&inventory, &dest) {
            Ok(_) => {
                log::info!("Copied {} to {}", inventory.display(), dest.display());
                report.inventory_copied = Some(dest);
            }
            Err(e) => log::warn!("Could not copy {}: {}", inventory.display(), e),
        }
    }

    Ok(report)
}

fn load_staged_key(
    options: &PostInstallOptions,
    exe_dir: &Path,
) -> Result<(PathBuf, String), PostInstallError> {
    let values_path = locate_values_file(options.values.as_deref(), exe_dir)?;
    log::info!("Loading staged values from {}", values_path.display());
    let values = InstallValues::load(&values_path)?;
    log::debug!(
        "Staged entries: {}",
        values.iter().map(|(k, _)| k).collect::<Vec<_>>().join(", ")
    );
    let key = validate_secret(&values, options.strict_key)?;
    Ok((values_path, key))
}
