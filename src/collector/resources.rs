//! Resource folder walking and file mapping.

use crate::config::FileEntry;
use serde::{Deserialize, Serialize};
use std::path::{Component, Path, PathBuf};
use walkdir::{DirEntry, WalkDir};

/// Extensions of compiled bytecode that never belong in a bundle.
const COMPILED_EXTENSIONS: &[&str] = &["pyc", "pyo"];

/// Cache directory names pruned during the walk.
const CACHE_DIRS: &[&str] = &["__pycache__", ".pytest_cache", ".mypy_cache"];

/// Executable or library extensions treated as stale when found under build output.
const BINARY_EXTENSIONS: &[&str] = &["exe", "dll", "pyd", "so", "dylib"];

/// A file to embed and the bundle-relative directory it lands in.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct ResourceMapping {
    /// File on the build machine
    pub source: PathBuf,
    /// Directory relative to the bundle root; `.` is the root itself
    pub destination: PathBuf,
}

impl ResourceMapping {
    /// Create a mapping, normalising the destination to a relative path.
    pub fn new(source: impl Into<PathBuf>, destination: impl AsRef<Path>) -> Self {
        Self {
            source: source.into(),
            destination: normalize_destination(destination.as_ref()),
        }
    }

    /// Bundle-relative path of the file once placed.
    pub fn target_path(&self) -> PathBuf {
        let name = self.source.file_name().map(PathBuf::from).unwrap_or_default();
        if self.destination == Path::new(".") {
            name
        } else {
            self.destination.join(name)
        }
    }
}

/// Strip roots, prefixes and parent hops so the destination stays inside the bundle.
pub fn normalize_destination(path: &Path) -> PathBuf {
    let cleaned: PathBuf = path
        .components()
        .filter_map(|c| match c {
            Component::Normal(part) => Some(part),
            _ => None,
        })
        .collect();
    if cleaned.as_os_str().is_empty() {
        PathBuf::from(".")
    } else {
        cleaned
    }
}

fn file_name_str(entry: &DirEntry) -> &str {
    entry.file_name().to_str().unwrap_or("")
}

fn is_hidden(entry: &DirEntry) -> bool {
    entry.depth() > 0 && file_name_str(entry).starts_with('.')
}

fn is_cache_dir(entry: &DirEntry) -> bool {
    entry.file_type().is_dir() && CACHE_DIRS.contains(&file_name_str(entry))
}

fn has_extension(path: &Path, set: &[&str]) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .map(|e| set.iter().any(|s| s.eq_ignore_ascii_case(e)))
        .unwrap_or(false)
}

fn under_build_output(relative: &Path, build_output_dirs: &[String]) -> bool {
    relative.components().any(|c| match c {
        Component::Normal(part) => build_output_dirs
            .iter()
            .any(|d| part.to_str() == Some(d.as_str())),
        _ => false,
    })
}

/// Walk `dir` and map every eligible file under `dest_prefix`, mirroring sub-directories.
///
/// `build_output_dirs` is matched against paths relative to `base`.
pub(crate) fn walk_folder(
    base: &Path,
    dir: &Path,
    dest_prefix: &Path,
    build_output_dirs: &[String],
) -> Vec<ResourceMapping> {
    let mut mappings = Vec::new();

    let walker = WalkDir::new(dir)
        .follow_links(false)
        .into_iter()
        .filter_entry(|e| !is_hidden(e) && !is_cache_dir(e));

    for entry in walker {
        let entry = match entry {
            Ok(entry) => entry,
            Err(e) => {
                log::warn!("Skipping unreadable entry under {}: {}", dir.display(), e);
                continue;
            }
        };
        if !entry.file_type().is_file() {
            continue;
        }
        let path = entry.path();
        if has_extension(path, COMPILED_EXTENSIONS) {
            continue;
        }

        let relative_to_base = path.strip_prefix(base).unwrap_or(path);
        if has_extension(path, BINARY_EXTENSIONS)
            && under_build_output(relative_to_base, build_output_dirs)
        {
            log::debug!("Skipping stale build artifact {}", path.display());
            continue;
        }

        let relative_to_dir = path.strip_prefix(dir).unwrap_or(path);
        let destination = match relative_to_dir.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => dest_prefix.join(parent),
            _ => dest_prefix.to_path_buf(),
        };
        mappings.push(ResourceMapping::new(path, destination));
    }

    mappings
}

/// Collect resource folders below `root`.
///
/// Each folder keeps its own name under the bundle root. Folders that do not
/// exist contribute nothing. Output is sorted and deduplicated.
pub fn collect_resources(
    root: &Path,
    folders: &[String],
    build_output_dirs: &[String],
) -> Vec<ResourceMapping> {
    let mut mappings = Vec::new();

    for folder in folders {
        let dir = root.join(folder);
        if !dir.is_dir() {
            log::debug!("Resource folder {} not present, skipping", dir.display());
            continue;
        }
        let found = walk_folder(root, &dir, Path::new(folder), build_output_dirs);
        log::debug!("Collected {} file(s) from {}", found.len(), dir.display());
        mappings.extend(found);
    }

    mappings.sort();
    mappings.dedup();
    mappings
}

/// Map explicitly listed files; missing ones are skipped silently.
pub fn collect_files(root: &Path, files: &[FileEntry]) -> Vec<ResourceMapping> {
    let mut mappings: Vec<ResourceMapping> = files
        .iter()
        .filter_map(|entry| {
            let source = if entry.source.is_absolute() {
                entry.source.clone()
            } else {
                root.join(&entry.source)
            };
            if source.is_file() {
                Some(ResourceMapping::new(source, &entry.destination))
            } else {
                log::debug!("Optional file {} not present, skipping", source.display());
                None
            }
        })
        .collect();

    mappings.sort();
    mappings.dedup();
    mappings
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    fn touch(path: &Path) {
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(path, b"x").unwrap();
    }

    #[test]
    fn test_normalize_destination() {
        assert_eq!(normalize_destination(Path::new("/abs/dir")), PathBuf::from("abs/dir"));
        assert_eq!(normalize_destination(Path::new("../up")), PathBuf::from("up"));
        assert_eq!(normalize_destination(Path::new("")), PathBuf::from("."));
        assert_eq!(normalize_destination(Path::new("./")), PathBuf::from("."));
    }

    #[test]
    fn test_target_path() {
        let root = ResourceMapping::new("/src/.env.example", ".");
        assert_eq!(root.target_path(), PathBuf::from(".env.example"));
        let nested = ResourceMapping::new("/src/assets/logo.png", "assets");
        assert_eq!(nested.target_path(), PathBuf::from("assets/logo.png"));
    }

    #[test]
    fn test_walk_mirrors_subdirectories() {
        let tmp = tempfile::tempdir().unwrap();
        touch(&tmp.path().join("images/icons/a.png"));
        touch(&tmp.path().join("images/b.png"));

        let found = collect_resources(tmp.path(), &["images".to_string()], &[]);
        let dests: Vec<_> = found.iter().map(|m| m.target_path()).collect();
        assert!(dests.contains(&PathBuf::from("images/icons/a.png")));
        assert!(dests.contains(&PathBuf::from("images/b.png")));
    }

    #[test]
    fn test_walk_skips_cache_and_hidden() {
        let tmp = tempfile::tempdir().unwrap();
        touch(&tmp.path().join("data/keep.json"));
        touch(&tmp.path().join("data/__pycache__/mod.cpython-311.pyc"));
        touch(&tmp.path().join("data/stale.pyc"));
        touch(&tmp.path().join("data/.secret"));
        touch(&tmp.path().join("data/.git/config"));

        let found = collect_resources(tmp.path(), &["data".to_string()], &[]);
        assert_eq!(found.len(), 1);
        assert!(found[0].source.ends_with("keep.json"));
    }

    #[test]
    fn test_binaries_under_build_output_are_skipped() {
        let tmp = tempfile::tempdir().unwrap();
        touch(&tmp.path().join("assets/dist/old.exe"));
        touch(&tmp.path().join("assets/dist/readme.txt"));
        touch(&tmp.path().join("assets/lib/tool.dll"));

        let found = collect_resources(
            tmp.path(),
            &["assets".to_string()],
            &["build".to_string(), "dist".to_string()],
        );
        let names: Vec<_> = found.iter().map(|m| m.target_path()).collect();
        assert!(!names.contains(&PathBuf::from("assets/dist/old.exe")));
        assert!(names.contains(&PathBuf::from("assets/dist/readme.txt")));
        assert!(names.contains(&PathBuf::from("assets/lib/tool.dll")));
    }

    #[test]
    fn test_duplicate_folders_are_deduplicated() {
        let tmp = tempfile::tempdir().unwrap();
        touch(&tmp.path().join("assets/a.txt"));
        let found = collect_resources(
            tmp.path(),
            &["assets".to_string(), "assets".to_string()],
            &[],
        );
        assert_eq!(found.len(), 1);
    }

    #[test]
    fn test_collect_files_skips_missing() {
        let tmp = tempfile::tempdir().unwrap();
        touch(&tmp.path().join(".env.example"));
        let files = vec![
            FileEntry {
                source: PathBuf::from(".env.example"),
                destination: PathBuf::from("."),
            },
            FileEntry {
                source: PathBuf::from("app.inv"),
                destination: PathBuf::from("."),
            },
        ];
        let found = collect_files(tmp.path(), &files);
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].target_path(), PathBuf::from(".env.example"));
    }
}
