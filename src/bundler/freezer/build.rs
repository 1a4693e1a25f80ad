//! Freezer execution.

use crate::bundler::error::{Error, ErrorExt, Result};
use std::path::{Path, PathBuf};
use std::sync::LazyLock;

/// Freezer found on `PATH`, checked once per process.
static FREEZER: LazyLock<Option<PathBuf>> = LazyLock::new(|| match which::which("pyinstaller") {
    Ok(path) => {
        log::debug!("Found pyinstaller at: {}", path.display());
        Some(path)
    }
    Err(e) => {
        log::debug!("pyinstaller not found in PATH: {}", e);
        None
    }
});

/// Locate the freezer, preferring an explicit path.
pub fn locate_freezer(explicit: Option<&Path>) -> Result<PathBuf> {
    if let Some(path) = explicit {
        return Ok(path.to_path_buf());
    }
    FREEZER.clone().ok_or_else(|| Error::ToolNotFound {
        tool: "pyinstaller".into(),
        hint: "install it with `pip install pyinstaller` or set a prebuilt target".into(),
    })
}

/// Run the freezer on a spec, writing output into `dist_dir`.
pub async fn run_freezer(
    freezer: &Path,
    spec_path: &Path,
    dist_dir: &Path,
    work_dir: &Path,
) -> Result<()> {
    log::info!("Running {} on {}", freezer.display(), spec_path.display());

    tokio::fs::create_dir_all(dist_dir)
        .await
        .fs_context("creating dist directory", dist_dir)?;

    let status = tokio::process::Command::new(freezer)
        .arg("--noconfirm")
        .arg("--clean")
        .arg("--distpath")
        .arg(dist_dir)
        .arg("--workpath")
        .arg(work_dir)
        .arg(spec_path)
        .status()
        .await
        .map_err(|e| Error::CommandFailed {
            command: freezer.display().to_string(),
            error: e,
        })?;

    if !status.success() {
        return Err(Error::GenericError(format!(
            "freezer failed on {} (exit code {:?})",
            spec_path.display(),
            status.code()
        )));
    }

    Ok(())
}
