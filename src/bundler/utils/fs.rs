//! File system helpers shared by bundle staging and file placement.

use crate::bundler::error::{Error, ErrorExt, Result};
use std::io;
use std::path::Path;
use tokio::fs;

/// Creates all of the directories of the specified path, erasing it first if specified.
pub async fn create_dir_all(path: &Path, erase: bool) -> Result<()> {
    if erase && path.exists() {
        remove_dir_all(path).await?;
    }
    fs::create_dir_all(path)
        .await
        .fs_context("creating directory", path)
}

/// Removes the directory and its contents if it exists.
pub async fn remove_dir_all(path: &Path) -> Result<()> {
    if path.exists() {
        fs::remove_dir_all(path)
            .await
            .fs_context("removing directory", path)
    } else {
        Ok(())
    }
}

#[cfg(unix)]
fn symlink_dir(src: &Path, dst: &Path) -> io::Result<()> {
    std::os::unix::fs::symlink(src, dst)
}

#[cfg(windows)]
fn symlink_dir(src: &Path, dst: &Path) -> io::Result<()> {
    std::os::windows::fs::symlink_dir(src, dst)
}

#[cfg(unix)]
fn symlink_file(src: &Path, dst: &Path) -> io::Result<()> {
    std::os::unix::fs::symlink(src, dst)
}

#[cfg(windows)]
fn symlink_file(src: &Path, dst: &Path) -> io::Result<()> {
    std::os::windows::fs::symlink_file(src, dst)
}

/// Copies a regular file, creating parent directories of `to` as needed.
///
/// Overwrites an existing destination. Fails if `from` is missing or not a file.
pub async fn copy_file(from: &Path, to: &Path) -> Result<()> {
    if !from.exists() {
        return Err(Error::GenericError(format!("{from:?} does not exist")));
    }
    if !from.is_file() {
        return Err(Error::GenericError(format!("{from:?} is not a file")));
    }
    if let Some(dest_dir) = to.parent() {
        fs::create_dir_all(dest_dir)
            .await
            .fs_context("creating destination directory", dest_dir)?;
    }
    fs::copy(from, to).await.fs_context("copying file", from)?;
    Ok(())
}

/// Recursively copies a directory, merging into `to` if it already exists.
///
/// Symlinks are recreated rather than followed.
pub async fn copy_dir(from: &Path, to: &Path) -> Result<()> {
    if !from.is_dir() {
        return Err(Error::GenericError(format!("{from:?} is not a directory")));
    }
    fs::create_dir_all(to)
        .await
        .fs_context("creating destination directory", to)?;

    for entry in walkdir::WalkDir::new(from) {
        let entry = entry?;
        let rel_path = entry.path().strip_prefix(from)?;
        let dest_path = to.join(rel_path);

        if entry.file_type().is_symlink() {
            let target = fs::read_link(entry.path())
                .await
                .fs_context("reading symlink", entry.path())?;
            if dest_path.symlink_metadata().is_ok() {
                fs::remove_file(&dest_path)
                    .await
                    .fs_context("replacing symlink", &dest_path)?;
            }
            if entry.path().is_dir() {
                symlink_dir(&target, &dest_path)?;
            } else {
                symlink_file(&target, &dest_path)?;
            }
        } else if entry.file_type().is_dir() {
            fs::create_dir_all(&dest_path)
                .await
                .fs_context("creating directory", &dest_path)?;
        } else {
            fs::copy(entry.path(), &dest_path)
                .await
                .fs_context("copying file", entry.path())?;
        }
    }

    Ok(())
}

/// Total size in bytes of a file or of every regular file under a directory.
pub fn path_size(path: &Path) -> Result<u64> {
    let metadata = std::fs::metadata(path).fs_context("reading artifact metadata", path)?;
    if metadata.is_file() {
        return Ok(metadata.len());
    }
    let mut total = 0u64;
    for entry in walkdir::WalkDir::new(path).follow_links(false) {
        let entry = entry?;
        if entry.file_type().is_file() {
            total += entry
                .metadata()
                .map_err(|e| Error::GenericError(e.to_string()))?
                .len();
        }
    }
    Ok(total)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_copy_file_creates_parents() {
        let tmp = tempfile::tempdir().unwrap();
        let src = tmp.path().join("a.txt");
        std::fs::write(&src, b"hello").unwrap();
        let dst = tmp.path().join("deep/nested/a.txt");

        copy_file(&src, &dst).await.unwrap();
        assert_eq!(std::fs::read(&dst).unwrap(), b"hello");
    }

    #[tokio::test]
    async fn test_copy_file_missing_source() {
        let tmp = tempfile::tempdir().unwrap();
        let result = copy_file(&tmp.path().join("nope"), &tmp.path().join("out")).await;
        assert!(result.is_err());
    }

    #[tokio::test]
    async fn test_copy_dir_merges_and_sizes() {
        let tmp = tempfile::tempdir().unwrap();
        let src = tmp.path().join("app");
        std::fs::create_dir_all(src.join("_tcl_data")).unwrap();
        std::fs::write(src.join("app.bin"), b"1234").unwrap();
        std::fs::write(src.join("_tcl_data/init.tcl"), b"12").unwrap();

        let dst = tmp.path().join("target/app");
        std::fs::create_dir_all(&dst).unwrap();
        std::fs::write(dst.join("existing.txt"), b"x").unwrap();

        copy_dir(&src, &dst).await.unwrap();
        assert!(dst.join("_tcl_data/init.tcl").is_file());
        assert!(dst.join("existing.txt").is_file());
        assert_eq!(path_size(&src).unwrap(), 6);
    }
}
