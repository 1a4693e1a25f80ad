//! Filesystem locations used by the configurator.

use crate::error::PostInstallError;
use crate::{APP_NAME, INSTALL_VALUES_FILE};
use std::path::{Path, PathBuf};

/// Overrides the per-user application data directory.
pub const DATA_DIR_ENV: &str = "HANKSTORE_DATA_DIR";

/// Explicit staged values path, set by the installer.
pub const INSTALL_VALUES_ENV: &str = "HANKSTORE_INSTALL_VALUES";

/// Per-user directory holding `.env`.
///
/// `HANKSTORE_DATA_DIR` wins when set and non-empty; otherwise the platform
/// data directory joined with the application name.
pub fn user_data_dir() -> Option<PathBuf> {
    if let Some(dir) = std::env::var_os(DATA_DIR_ENV).filter(|v| !v.is_empty()) {
        return Some(PathBuf::from(dir));
    }
    dirs::data_dir().map(|d| d.join(APP_NAME))
}

/// Directory of the running executable, or the working directory.
pub fn exe_dir() -> PathBuf {
    std::env::current_exe()
        .ok()
        .and_then(|p| p.parent().map(Path::to_path_buf))
        .or_else(|| std::env::current_dir().ok())
        .unwrap_or_else(|| PathBuf::from("."))
}

/// Places the staged values file may be, in search order.
pub fn values_candidates(explicit: Option<&Path>, exe_dir: &Path) -> Vec<PathBuf> {
    let mut candidates = Vec::with_capacity(5);
    if let Some(path) = explicit {
        candidates.push(path.to_path_buf());
    }
    candidates.push(exe_dir.join(INSTALL_VALUES_FILE));
    candidates.push(std::env::temp_dir().join(INSTALL_VALUES_FILE));
    if let Ok(cwd) = std::env::current_dir() {
        candidates.push(cwd.join("install").join(INSTALL_VALUES_FILE));
        candidates.push(cwd.join(INSTALL_VALUES_FILE));
    }
    candidates
}

/// First existing staged values file.
pub fn locate_values_file(
    explicit: Option<&Path>,
    exe_dir: &Path,
) -> Result<PathBuf, PostInstallError> {
    let searched = values_candidates(explicit, exe_dir);
    for candidate in &searched {
        log::debug!("Checking staged values candidate {}", candidate.display());
        if candidate.is_file() {
            return Ok(candidate.clone());
        }
    }
    Err(PostInstallError::ValuesNotFound { searched })
}

/// First existing `name` next to the executable, one level up, or in the working directory.
pub fn find_shipped_file(name: &str, exe_dir: &Path) -> Option<PathBuf> {
    let mut candidates = vec![exe_dir.join(name)];
    if let Some(parent) = exe_dir.parent() {
        candidates.push(parent.join(name));
    }
    if let Ok(cwd) = std::env::current_dir() {
        candidates.push(cwd.join(name));
    }
    candidates.into_iter().find(|p| p.is_file())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_explicit_path_searched_first() {
        let tmp = tempfile::tempdir().unwrap();
        let explicit = tmp.path().join("staged.txt");
        std::fs::write(&explicit, "K=V").unwrap();
        std::fs::write(tmp.path().join(INSTALL_VALUES_FILE), "K=W").unwrap();

        let found = locate_values_file(Some(&explicit), tmp.path()).unwrap();
        assert_eq!(found, explicit);
    }

    #[test]
    fn test_exe_dir_candidate() {
        let tmp = tempfile::tempdir().unwrap();
        std::fs::write(tmp.path().join(INSTALL_VALUES_FILE), "K=V").unwrap();
        let found = locate_values_file(Some(&tmp.path().join("absent")), tmp.path()).unwrap();
        assert_eq!(found, tmp.path().join(INSTALL_VALUES_FILE));
    }

    #[test]
    fn test_candidate_order() {
        let exe = Path::new("/opt/hank");
        let candidates = values_candidates(Some(Path::new("/x/v.txt")), exe);
        assert_eq!(candidates[0], PathBuf::from("/x/v.txt"));
        assert_eq!(candidates[1], exe.join(INSTALL_VALUES_FILE));
        assert_eq!(candidates[2], std::env::temp_dir().join(INSTALL_VALUES_FILE));
    }

    #[test]
    fn test_shipped_file_one_level_up() {
        let tmp = tempfile::tempdir().unwrap();
        let exe_dir = tmp.path().join("bin");
        std::fs::create_dir_all(&exe_dir).unwrap();
        std::fs::write(tmp.path().join(".env.example"), "A=1\n").unwrap();
        assert_eq!(
            find_shipped_file(".env.example", &exe_dir),
            Some(tmp.path().join(".env.example"))
        );
    }
}
