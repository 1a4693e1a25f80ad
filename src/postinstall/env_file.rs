//! Dotenv-style persisted configuration.

use crate::error::PostInstallError;
use std::io::Write;
use std::path::{Path, PathBuf};

/// Persisted config file name inside the user data directory.
pub const ENV_FILE_NAME: &str = ".env";

/// Template shipped next to the application.
pub const ENV_EXAMPLE_FILE_NAME: &str = ".env.example";

/// In-memory `.env` contents tied to their path.
#[derive(Debug, Clone)]
pub struct EnvFile {
    path: PathBuf,
    text: String,
}

impl EnvFile {
    /// Wrap existing text for `path`.
    pub fn new(path: impl Into<PathBuf>, text: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            text: text.into(),
        }
    }

    /// Read `path`, or start empty when it does not exist.
    pub fn load(path: &Path) -> Result<Self, PostInstallError> {
        let unusable = |reason: String| PostInstallError::WriteFailed {
            path: path.to_path_buf(),
            reason,
        };

        if let Some(dir) = path.parent().filter(|d| d.exists() && !d.is_dir()) {
            return Err(unusable(format!(
                "data directory unusable: {} is not a directory",
                dir.display()
            )));
        }

        match std::fs::read_to_string(path) {
            Ok(text) => Ok(Self::new(path, text)),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(Self::new(path, "")),
            Err(e) if e.kind() == std::io::ErrorKind::PermissionDenied => {
                Err(unusable(format!("permission denied reading existing file: {e}")))
            }
            Err(e) => Err(unusable(format!("existing file unreadable: {e}"))),
        }
    }

    /// Target path.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Current contents.
    pub fn text(&self) -> &str {
        &self.text
    }

    /// Value of the first `key=` line.
    pub fn get(&self, key: &str) -> Option<&str> {
        let prefix = format!("{key}=");
        self.text
            .lines()
            .map(str::trim)
            .find_map(|line| line.strip_prefix(prefix.as_str()))
            .map(str::trim)
    }

    /// Set `key`; returns whether the text changed.
    pub fn set(&mut self, key: &str, value: &str, overwrite: bool) -> bool {
        let merged = merge_or_set(&self.text, key, value, overwrite);
        let changed = merged != self.text;
        self.text = merged;
        changed
    }

    /// Atomically replace the file on disk with the current text.
    ///
    /// Writes a temporary file in the same directory and renames it over the
    /// target. The result is restricted to the owner: mode 0600 on unix, and a
    /// best-effort `icacls` grant on Windows.
    pub fn save(&self) -> Result<(), PostInstallError> {
        let write_failed = |reason: String| PostInstallError::WriteFailed {
            path: self.path.clone(),
            reason,
        };

        let dir = self
            .path
            .parent()
            .filter(|p| !p.as_os_str().is_empty())
            .unwrap_or_else(|| Path::new("."));
        std::fs::create_dir_all(dir).map_err(|e| write_failed(e.to_string()))?;

        let mut tmp = tempfile::Builder::new()
            .prefix(".tmp_")
            .tempfile_in(dir)
            .map_err(|e| write_failed(e.to_string()))?;
        tmp.write_all(self.text.as_bytes())
            .and_then(|_| tmp.as_file().sync_all())
            .map_err(|e| write_failed(e.to_string()))?;

        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            tmp.as_file()
                .set_permissions(std::fs::Permissions::from_mode(0o600))
                .map_err(|e| write_failed(e.to_string()))?;
        }

        tmp.persist(&self.path)
            .map_err(|e| write_failed(e.error.to_string()))?;

        #[cfg(windows)]
        restrict_to_current_user(&self.path);

        log::debug!("Wrote {}", self.path.display());
        Ok(())
    }
}

/// Drop inherited ACEs and grant read/write to `user` alone.
#[cfg(any(windows, test))]
fn icacls_args(path: &Path, user: &std::ffi::OsStr) -> Vec<std::ffi::OsString> {
    let mut grant = user.to_os_string();
    grant.push(":(R,W)");
    vec![
        path.as_os_str().to_os_string(),
        "/inheritance:r".into(),
        "/grant:r".into(),
        grant,
        "/C".into(),
    ]
}

/// A failure only warns: the file is already written.
#[cfg(windows)]
fn restrict_to_current_user(path: &Path) {
    let Some(user) = std::env::var_os("USERNAME") else {
        log::warn!("USERNAME is not set; {} keeps inherited permissions", path.display());
        return;
    };
    match std::process::Command::new("icacls")
        .args(icacls_args(path, &user))
        .output()
    {
        Ok(output) if output.status.success() => {
            log::debug!("Restricted {} to {}", path.display(), user.to_string_lossy())
        }
        Ok(output) => log::warn!(
            "icacls exited with {:?} for {}: {}",
            output.status.code(),
            path.display(),
            String::from_utf8_lossy(&output.stderr).trim()
        ),
        Err(e) => log::warn!("Could not run icacls for {}: {}", path.display(), e),
    }
}

/// Ensure `key=value` is present in dotenv `text`.
///
/// The first line whose trimmed form starts with `key=` is replaced when
/// `overwrite` is set and kept otherwise. Every other line is preserved, as is
/// the presence of a trailing newline. A missing key is appended on its own line.
pub fn merge_or_set(text: &str, key: &str, value: &str, overwrite: bool) -> String {
    let prefix = format!("{key}=");
    let mut found = false;
    let lines: Vec<String> = text
        .lines()
        .map(|line| {
            if !found && line.trim().starts_with(&prefix) {
                found = true;
                if overwrite {
                    return format!("{key}={value}");
                }
            }
            line.to_string()
        })
        .collect();

    if !found {
        let mut out = text.to_string();
        if !out.is_empty() && !out.ends_with('\n') {
            out.push('\n');
        }
        out.push_str(&format!("{key}={value}\n"));
        return out;
    }

    let mut out = lines.join("\n");
    if text.ends_with('\n') {
        out.push('\n');
    }
    out
}
