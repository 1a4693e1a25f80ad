//! Native library resolution through ordered candidate chains.
//!
//! Each library file is resolved by walking candidates lazily in priority order:
//!
//! 1. explicit path from an environment variable
//! 2. installed language package directories
//! 3. well-known toolchain locations (glob patterns allowed)
//! 4. the language runtime's own library directories
//!
//! The first existing candidate wins. Nothing here aborts the build: misses are
//! logged and the manifest simply has no entry for that file.

use super::resources::{ResourceMapping, walk_folder};
use crate::config::{NativeLibraryConfig, NativeSection};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::{Path, PathBuf};

/// Where a candidate path came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum CandidateSource {
    /// Environment variable override
    EnvOverride,
    /// Installed language package
    Package,
    /// Well-known toolchain install location
    WellKnown,
    /// Runtime-local fallback
    RuntimeLocal,
}

/// A single path probed for a library file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Candidate {
    /// Origin of the path
    pub source: CandidateSource,
    /// Path probed
    pub path: PathBuf,
}

/// A library file found on disk.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResolvedFile {
    /// File name the library was searched by
    pub file_name: String,
    /// Concrete path
    pub path: PathBuf,
    /// Candidate tier that matched
    pub source: CandidateSource,
}

/// Resolution result for one logical library.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ResolvedLibrary {
    /// Logical name
    pub name: String,
    /// Whether absence was reported as mandatory
    pub mandatory: bool,
    /// Files found
    pub files: Vec<ResolvedFile>,
    /// File names with no existing candidate
    pub missing: Vec<String>,
}

impl ResolvedLibrary {
    /// True when no file of this library was found.
    pub fn is_absent(&self) -> bool {
        self.files.is_empty()
    }
}

/// Inputs for candidate generation, snapshotting the environment once.
#[derive(Debug, Clone, Default)]
pub struct NativeSearchContext {
    overrides: HashMap<String, PathBuf>,
    package_dirs: Vec<PathBuf>,
    runtime_dir: Option<PathBuf>,
}

impl NativeSearchContext {
    /// Build a context from config, reading override variables from the process environment.
    pub fn from_env(native: &NativeSection) -> Self {
        let mut ctx = Self {
            overrides: HashMap::new(),
            package_dirs: native.package_dirs.clone(),
            runtime_dir: native.runtime_dir.clone(),
        };
        let vars = native
            .libraries
            .iter()
            .filter_map(|l| l.env.as_deref())
            .chain(std::iter::once(native.toolkit_resource_env.as_str()));
        for var in vars {
            if let Some(value) = std::env::var_os(var).filter(|v| !v.is_empty()) {
                log::debug!("Native override {}={}", var, PathBuf::from(&value).display());
                ctx.overrides.insert(var.to_string(), PathBuf::from(value));
            }
        }
        ctx
    }

    /// Context without any environment overrides.
    pub fn new(package_dirs: Vec<PathBuf>, runtime_dir: Option<PathBuf>) -> Self {
        Self {
            overrides: HashMap::new(),
            package_dirs,
            runtime_dir,
        }
    }

    /// Add or replace an override as if `var` were set in the environment.
    pub fn with_override(mut self, var: impl Into<String>, path: impl Into<PathBuf>) -> Self {
        self.overrides.insert(var.into(), path.into());
        self
    }

    /// Override value for a variable, if set.
    pub fn override_for(&self, var: &str) -> Option<&Path> {
        self.overrides.get(var).map(PathBuf::as_path)
    }

    fn env_candidate(&self, lib: &NativeLibraryConfig, file: &str) -> Option<Candidate> {
        let value = self.override_for(lib.env.as_deref()?)?;
        let path = if value.is_dir() {
            value.join(file)
        } else {
            let same_name = value.file_name().and_then(|n| n.to_str()) == Some(file);
            if !same_name && lib.files.len() > 1 {
                return None;
            }
            value.to_path_buf()
        };
        Some(Candidate {
            source: CandidateSource::EnvOverride,
            path,
        })
    }

    /// Candidates for one file, in priority order. Evaluated lazily.
    pub fn candidates<'a>(
        &'a self,
        lib: &'a NativeLibraryConfig,
        file: &'a str,
    ) -> impl Iterator<Item = Candidate> + 'a {
        let env = self.env_candidate(lib, file).into_iter();

        let package = self.package_dirs.iter().flat_map(move |dir| {
            std::iter::once(dir.join(file))
                .chain(lib.package_subdirs.iter().map(move |sub| dir.join(sub).join(file)))
                .map(|path| Candidate {
                    source: CandidateSource::Package,
                    path,
                })
        });

        let well_known = lib.well_known.iter().flat_map(move |pattern| {
            expand_well_known(pattern, file)
                .into_iter()
                .map(|path| Candidate {
                    source: CandidateSource::WellKnown,
                    path,
                })
        });

        let runtime = self.runtime_dir.iter().flat_map(move |root| {
            [
                root.join("DLLs").join(file),
                root.join("Library").join("bin").join(file),
                root.join(file),
            ]
            .into_iter()
            .map(|path| Candidate {
                source: CandidateSource::RuntimeLocal,
                path,
            })
        });

        env.chain(package).chain(well_known).chain(runtime)
    }

    /// Resolve every file of a library, logging misses.
    pub fn resolve(&self, lib: &NativeLibraryConfig) -> ResolvedLibrary {
        let mut files = Vec::new();
        let mut missing = Vec::new();

        for file in &lib.files {
            match self.candidates(lib, file).find(|c| c.path.is_file()) {
                Some(found) => {
                    log::debug!(
                        "Native library {}: {} -> {} ({:?})",
                        lib.name,
                        file,
                        found.path.display(),
                        found.source
                    );
                    files.push(ResolvedFile {
                        file_name: file.clone(),
                        path: found.path,
                        source: found.source,
                    });
                }
                None => {
                    log::warn!(
                        "Native library {}: {} not found in any candidate location",
                        lib.name,
                        file
                    );
                    missing.push(file.clone());
                }
            }
        }

        if files.is_empty() {
            if lib.mandatory {
                log::error!(
                    "MANDATORY native library '{}' not found{}; the bundle will build but fail at first run",
                    lib.name,
                    lib.env
                        .as_deref()
                        .map(|v| format!(" (set {} to its path)", v))
                        .unwrap_or_default()
                );
            } else {
                log::warn!("Optional native library '{}' not bundled", lib.name);
            }
        }

        ResolvedLibrary {
            name: lib.name.clone(),
            mandatory: lib.mandatory,
            files,
            missing,
        }
    }

    /// Locate the UI-toolkit resource folder and map its contents under `dest`.
    pub fn resolve_resource_dir(&self, env_var: &str, dest: &Path) -> Vec<ResourceMapping> {
        let fallback = self
            .runtime_dir
            .as_ref()
            .map(|r| r.join("tcl").join("tcl8.6"));
        let dir = self
            .override_for(env_var)
            .map(Path::to_path_buf)
            .into_iter()
            .chain(fallback)
            .find(|p| p.is_dir());

        match dir {
            Some(dir) => {
                log::debug!("Toolkit resources from {}", dir.display());
                walk_folder(&dir, &dir, dest, &[])
            }
            None => {
                log::warn!(
                    "Toolkit resource folder not found (set {} to override)",
                    env_var
                );
                Vec::new()
            }
        }
    }
}

fn has_glob_meta(pattern: &str) -> bool {
    pattern.contains(['*', '?', '['])
}

/// Expand one well-known directory pattern into concrete file paths.
fn expand_well_known(pattern: &str, file: &str) -> Vec<PathBuf> {
    let base = Path::new(pattern);
    if !has_glob_meta(pattern) {
        return vec![base.join(file)];
    }
    let full = base.join(file);
    let Some(full) = full.to_str() else {
        return Vec::new();
    };
    match glob::glob(full) {
        Ok(paths) => {
            let mut found: Vec<PathBuf> = paths.filter_map(|p| p.ok()).collect();
            found.sort();
            found
        }
        Err(e) => {
            log::debug!("Ignoring invalid well-known pattern {}: {}", pattern, e);
            Vec::new()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    fn lib(files: &[&str], env: Option<&str>, well_known: Vec<String>) -> NativeLibraryConfig {
        NativeLibraryConfig {
            name: "sqlcipher".to_string(),
            files: files.iter().map(|s| s.to_string()).collect(),
            env: env.map(str::to_string),
            mandatory: true,
            package_subdirs: vec!["sqlcipher3".to_string()],
            well_known,
        }
    }

    fn touch(path: &Path) {
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(path, b"bin").unwrap();
    }

    #[test]
    fn test_env_override_wins() {
        let tmp = tempfile::tempdir().unwrap();
        let env_file = tmp.path().join("custom/sqlcipher.dll");
        let pkg_file = tmp.path().join("site/sqlcipher3/sqlcipher.dll");
        touch(&env_file);
        touch(&pkg_file);

        let ctx = NativeSearchContext::new(vec![tmp.path().join("site")], None)
            .with_override("SQLCIPHER", &env_file);
        let resolved = ctx.resolve(&lib(&["sqlcipher.dll"], Some("SQLCIPHER"), vec![]));
        assert_eq!(resolved.files.len(), 1);
        assert_eq!(resolved.files[0].path, env_file);
        assert_eq!(resolved.files[0].source, CandidateSource::EnvOverride);
    }

    #[test]
    fn test_falls_through_to_package_dir() {
        let tmp = tempfile::tempdir().unwrap();
        let pkg_file = tmp.path().join("site/sqlcipher3/sqlcipher.dll");
        touch(&pkg_file);

        let ctx = NativeSearchContext::new(vec![tmp.path().join("site")], None)
            .with_override("SQLCIPHER", tmp.path().join("missing.dll"));
        let resolved = ctx.resolve(&lib(&["sqlcipher.dll"], Some("SQLCIPHER"), vec![]));
        assert_eq!(resolved.files[0].path, pkg_file);
        assert_eq!(resolved.files[0].source, CandidateSource::Package);
    }

    #[test]
    fn test_well_known_glob_then_runtime() {
        let tmp = tempfile::tempdir().unwrap();
        let wk = tmp.path().join("Python311/DLLs/tcl86t.dll");
        let rt = tmp.path().join("runtime/DLLs/tk86t.dll");
        touch(&wk);
        touch(&rt);

        let pattern = format!("{}/Python3*/DLLs", tmp.path().display());
        let ctx = NativeSearchContext::new(vec![], Some(tmp.path().join("runtime")));
        let resolved = ctx.resolve(&lib(&["tcl86t.dll", "tk86t.dll"], None, vec![pattern]));
        assert_eq!(resolved.files.len(), 2);
        assert_eq!(resolved.files[0].source, CandidateSource::WellKnown);
        assert_eq!(resolved.files[1].source, CandidateSource::RuntimeLocal);
        assert!(resolved.missing.is_empty());
    }

    #[test]
    fn test_missing_library_is_not_fatal() {
        let ctx = NativeSearchContext::new(vec![PathBuf::from("/nonexistent/site")], None);
        let resolved = ctx.resolve(&lib(&["sqlcipher.dll"], None, vec!["/nonexistent".into()]));
        assert!(resolved.is_absent());
        assert_eq!(resolved.missing, vec!["sqlcipher.dll".to_string()]);
    }

    #[test]
    fn test_env_file_ignored_for_other_names_in_multi_file_library() {
        let tmp = tempfile::tempdir().unwrap();
        let tcl = tmp.path().join("tcl86t.dll");
        touch(&tcl);
        let ctx = NativeSearchContext::new(vec![], None).with_override("TK", &tcl);
        let resolved = ctx.resolve(&lib(&["tcl86t.dll", "tk86t.dll"], Some("TK"), vec![]));
        assert_eq!(resolved.files.len(), 1);
        assert_eq!(resolved.missing, vec!["tk86t.dll".to_string()]);
    }

    #[test]
    fn test_resource_dir_override() {
        let tmp = tempfile::tempdir().unwrap();
        touch(&tmp.path().join("tcl8.6/init.tcl"));
        touch(&tmp.path().join("tcl8.6/encoding/utf-8.enc"));
        let ctx = NativeSearchContext::new(vec![], None)
            .with_override("TCL_LIBRARY", tmp.path().join("tcl8.6"));
        let mappings = ctx.resolve_resource_dir("TCL_LIBRARY", Path::new("_tcl_data"));
        let targets: Vec<_> = mappings.iter().map(|m| m.target_path()).collect();
        assert!(targets.contains(&PathBuf::from("_tcl_data/init.tcl")));
        assert!(targets.contains(&PathBuf::from("_tcl_data/encoding/utf-8.enc")));
    }

    #[test]
    fn test_resource_dir_absent_is_empty() {
        let ctx = NativeSearchContext::new(vec![], None);
        assert!(ctx
            .resolve_resource_dir("TCL_LIBRARY", Path::new("_tcl_data"))
            .is_empty());
    }
}
