//! Packaging configuration loaded from `hankstore.toml`.
//!
//! ```toml
//! [package]
//! name = "HankstoreManager"
//! version = "1.4.0"
//! publisher = "Hankstore"
//!
//! [assets]
//! folders = ["assets", "images", "data"]
//! files = [{ source = ".env.example" }, { source = "app.inv" }]
//!
//! [[target]]
//! name = "HankstoreManager"
//! entry = "src/hankstoremanager.py"
//! mode = "onedir"
//! icon = "assets/app.ico"
//! console = false
//! hidden_imports = ["babel.numbers", "sqlcipher3"]
//! runtime_hooks = ["src/runtime_hooks/load_dotenv.py"]
//!
//! [[target]]
//! name = "postinstall_writer"
//! prebuilt = "target/release/hankstore_postinstall.exe"
//! mode = "onefile"
//! include_assets = false
//!
//! [installer]
//! app_target = "HankstoreManager"
//! helper_target = "postinstall_writer"
//! values_file = "install/install_values.txt"
//! ```

use crate::bundler::BundleMode;
use crate::error::{ConfigError, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Default config file name looked up in the working directory.
pub const DEFAULT_CONFIG_FILE: &str = "hankstore.toml";

/// Root of `hankstore.toml`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PackagingConfig {
    /// Product metadata
    pub package: PackageSection,
    /// Resource collection rules
    #[serde(default)]
    pub assets: AssetsSection,
    /// Native library resolution rules
    #[serde(default)]
    pub native: NativeSection,
    /// Bundle targets, built in declaration order
    #[serde(default, rename = "target")]
    pub targets: Vec<TargetConfig>,
    /// Installer settings
    #[serde(default)]
    pub installer: InstallerSection,
    /// Directory containing the config file; relative paths resolve against it
    #[serde(skip)]
    pub root: PathBuf,
}

/// `[package]` section.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PackageSection {
    /// Product name shown in the installer
    pub name: String,
    /// Product version (semver, normalised to four parts for the installer)
    pub version: String,
    /// Publisher shown in the installer
    #[serde(default)]
    pub publisher: Option<String>,
    /// Short description
    #[serde(default)]
    pub description: Option<String>,
}

/// `[assets]` section.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AssetsSection {
    /// Folders walked recursively; each keeps its own name under the bundle root
    #[serde(default = "default_folders")]
    pub folders: Vec<String>,
    /// Individual files to embed
    #[serde(default)]
    pub files: Vec<FileEntry>,
    /// Directory names treated as stale build output
    #[serde(default = "default_build_output_dirs")]
    pub build_output_dirs: Vec<String>,
    /// Bundle output directory
    #[serde(default = "default_dist_dir")]
    pub dist_dir: PathBuf,
    /// Intermediate work directory
    #[serde(default = "default_work_dir")]
    pub work_dir: PathBuf,
}

impl Default for AssetsSection {
    fn default() -> Self {
        Self {
            folders: default_folders(),
            files: Vec::new(),
            build_output_dirs: default_build_output_dirs(),
            dist_dir: default_dist_dir(),
            work_dir: default_work_dir(),
        }
    }
}

/// Single file embedded into the bundle.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FileEntry {
    /// Source path, relative to the config root
    pub source: PathBuf,
    /// Destination directory relative to the bundle root
    #[serde(default = "default_destination")]
    pub destination: PathBuf,
}

/// `[native]` section.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NativeSection {
    /// Language runtime install directory used for the runtime-local fallback
    #[serde(default)]
    pub runtime_dir: Option<PathBuf>,
    /// Installed language package directories (site-packages)
    #[serde(default)]
    pub package_dirs: Vec<PathBuf>,
    /// Libraries to resolve
    #[serde(default = "default_libraries")]
    pub libraries: Vec<NativeLibraryConfig>,
    /// Env var naming the UI-toolkit resource folder override
    #[serde(default = "default_toolkit_resource_env")]
    pub toolkit_resource_env: String,
    /// Bundle-relative destination of the UI-toolkit resource folder
    #[serde(default = "default_toolkit_resource_dest")]
    pub toolkit_resource_dest: PathBuf,
}

impl Default for NativeSection {
    fn default() -> Self {
        Self {
            runtime_dir: None,
            package_dirs: Vec::new(),
            libraries: default_libraries(),
            toolkit_resource_env: default_toolkit_resource_env(),
            toolkit_resource_dest: default_toolkit_resource_dest(),
        }
    }
}

/// A logical native library and where to look for it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NativeLibraryConfig {
    /// Logical name used in log output
    pub name: String,
    /// File names that make up the library
    pub files: Vec<String>,
    /// Env var holding an explicit path (file or directory)
    #[serde(default)]
    pub env: Option<String>,
    /// Absence is reported louder but never aborts the build
    #[serde(default)]
    pub mandatory: bool,
    /// Sub-directories probed inside each package directory
    #[serde(default)]
    pub package_subdirs: Vec<String>,
    /// Well-known directories; glob patterns allowed
    #[serde(default)]
    pub well_known: Vec<String>,
}

/// `[[target]]` entry.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TargetConfig {
    /// Output name, also the executable stem
    pub name: String,
    /// Script entry point handed to the freezer
    #[serde(default)]
    pub entry: Option<PathBuf>,
    /// Already-built executable staged as-is
    #[serde(default)]
    pub prebuilt: Option<PathBuf>,
    /// Output mode
    #[serde(default)]
    pub mode: BundleMode,
    /// Optional icon (.ico or .png)
    #[serde(default)]
    pub icon: Option<PathBuf>,
    /// Keep a console window
    #[serde(default = "default_true")]
    pub console: bool,
    /// Modules loaded dynamically that the freezer cannot detect
    #[serde(default)]
    pub hidden_imports: Vec<String>,
    /// Scripts the frozen app runs at startup, before the entry point
    #[serde(default)]
    pub runtime_hooks: Vec<PathBuf>,
    /// Embed the collected manifest into this target
    #[serde(default = "default_true")]
    pub include_assets: bool,
}

/// `[installer]` section.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InstallerSection {
    /// Target holding the main application
    #[serde(default)]
    pub app_target: Option<String>,
    /// Target holding the post-install helper
    #[serde(default)]
    pub helper_target: Option<String>,
    /// Staged key/value file shipped in the installer payload
    #[serde(default)]
    pub values_file: Option<PathBuf>,
    /// Output directory for the rendered script and compiled setup
    #[serde(default = "default_installer_output")]
    pub output_dir: PathBuf,
    /// Bounded wait for the post-install helper
    #[serde(default = "default_postinstall_timeout")]
    pub postinstall_timeout_secs: u64,
}

impl Default for InstallerSection {
    fn default() -> Self {
        Self {
            app_target: None,
            helper_target: None,
            values_file: None,
            output_dir: default_installer_output(),
            postinstall_timeout_secs: default_postinstall_timeout(),
        }
    }
}

impl PackagingConfig {
    /// Load and validate a config file.
    pub fn load(path: &Path) -> Result<Self> {
        if !path.is_file() {
            return Err(ConfigError::NotFound {
                path: path.to_path_buf(),
            }
            .into());
        }
        let text = std::fs::read_to_string(path)?;
        let mut config = Self::from_toml_str(&text).map_err(|e| ConfigError::Invalid {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })?;
        config.root = path
            .parent()
            .filter(|p| !p.as_os_str().is_empty())
            .map(Path::to_path_buf)
            .unwrap_or_else(|| PathBuf::from("."));
        config.validate().map_err(|reason| ConfigError::Invalid {
            path: path.to_path_buf(),
            reason,
        })?;
        Ok(config)
    }

    /// Parse config text; `root` is left empty.
    pub fn from_toml_str(text: &str) -> std::result::Result<Self, toml::de::Error> {
        toml::from_str(text)
    }

    /// Check cross-field consistency.
    pub fn validate(&self) -> std::result::Result<(), String> {
        if self.package.name.trim().is_empty() {
            return Err("package.name cannot be empty".to_string());
        }
        semver::Version::parse(&self.package.version)
            .map_err(|e| format!("package.version '{}': {}", self.package.version, e))?;

        let mut seen = std::collections::HashSet::new();
        for target in &self.targets {
            if !seen.insert(target.name.as_str()) {
                return Err(format!("duplicate target '{}'", target.name));
            }
            match (&target.entry, &target.prebuilt) {
                (Some(_), Some(_)) => {
                    return Err(format!(
                        "target '{}' sets both entry and prebuilt",
                        target.name
                    ));
                }
                (None, None) => {
                    return Err(format!(
                        "target '{}' needs either entry or prebuilt",
                        target.name
                    ));
                }
                _ => {}
            }
        }

        for name in [&self.installer.app_target, &self.installer.helper_target]
            .into_iter()
            .flatten()
        {
            if !seen.contains(name.as_str()) {
                return Err(format!("installer references unknown target '{}'", name));
            }
        }
        Ok(())
    }

    /// Resolve a config-relative path.
    pub fn resolve(&self, path: &Path) -> PathBuf {
        if path.is_absolute() {
            path.to_path_buf()
        } else {
            self.root.join(path)
        }
    }

    /// Look up a target by name.
    pub fn target(&self, name: &str) -> Result<&TargetConfig> {
        self.targets
            .iter()
            .find(|t| t.name == name)
            .ok_or_else(|| {
                ConfigError::UnknownTarget {
                    name: name.to_string(),
                }
                .into()
            })
    }

    /// Absolute bundle output directory.
    pub fn dist_dir(&self) -> PathBuf {
        self.resolve(&self.assets.dist_dir)
    }

    /// Absolute intermediate work directory.
    pub fn work_dir(&self) -> PathBuf {
        self.resolve(&self.assets.work_dir)
    }
}

fn default_true() -> bool {
    true
}

fn default_folders() -> Vec<String> {
    vec!["assets".into(), "images".into(), "data".into()]
}

fn default_build_output_dirs() -> Vec<String> {
    vec!["build".into(), "dist".into()]
}

fn default_dist_dir() -> PathBuf {
    PathBuf::from("dist")
}

fn default_work_dir() -> PathBuf {
    PathBuf::from("build")
}

fn default_destination() -> PathBuf {
    PathBuf::from(".")
}

fn default_installer_output() -> PathBuf {
    PathBuf::from("dist/installer")
}

fn default_postinstall_timeout() -> u64 {
    120
}

fn default_toolkit_resource_env() -> String {
    "TCL_LIBRARY".to_string()
}

fn default_toolkit_resource_dest() -> PathBuf {
    PathBuf::from("_tcl_data")
}

fn default_libraries() -> Vec<NativeLibraryConfig> {
    vec![
        NativeLibraryConfig {
            name: "sqlcipher".to_string(),
            files: vec!["sqlcipher.dll".to_string()],
            env: Some("HANKSTORE_SQLCIPHER_DLL".to_string()),
            mandatory: true,
            package_subdirs: vec!["sqlcipher3".to_string(), "pysqlcipher3".to_string()],
            well_known: vec![
                "C:/vcpkg/installed/x64-windows/bin".to_string(),
                "C:/msys64/mingw64/bin".to_string(),
                "C:/Program Files/SQLCipher/bin".to_string(),
                "C:/tools/miniconda3/Library/bin".to_string(),
            ],
        },
        NativeLibraryConfig {
            name: "tk-runtime".to_string(),
            files: vec!["tcl86t.dll".to_string(), "tk86t.dll".to_string()],
            env: Some("HANKSTORE_TK_DLL".to_string()),
            mandatory: false,
            package_subdirs: Vec::new(),
            well_known: vec![
                "C:/Python3*/DLLs".to_string(),
                "C:/Program Files/Python3*/DLLs".to_string(),
            ],
        },
    ]
}

#[cfg(test)]
mod tests {
    use super::*;

    const MINIMAL: &str = r#"
[package]
name = "HankstoreManager"
version = "1.4.0"

[[target]]
name = "HankstoreManager"
entry = "src/hankstoremanager.py"
mode = "onedir"

[[target]]
name = "postinstall_writer"
prebuilt = "bin/postinstall"

[installer]
app_target = "HankstoreManager"
helper_target = "postinstall_writer"
"#;

    #[test]
    fn test_defaults_applied() {
        let config = PackagingConfig::from_toml_str(MINIMAL).unwrap();
        assert_eq!(config.assets.folders, vec!["assets", "images", "data"]);
        assert_eq!(config.assets.build_output_dirs, vec!["build", "dist"]);
        assert_eq!(config.targets[1].mode, BundleMode::OneFile);
        assert_eq!(config.targets[0].mode, BundleMode::OneDir);
        assert_eq!(config.installer.postinstall_timeout_secs, 120);
        assert!(config.native.libraries.iter().any(|l| l.mandatory));
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_rejects_unknown_installer_target() {
        let text = MINIMAL.replace("helper_target = \"postinstall_writer\"", "helper_target = \"nope\"");
        let config = PackagingConfig::from_toml_str(&text).unwrap();
        let err = config.validate().unwrap_err();
        assert!(err.contains("nope"));
    }

    #[test]
    fn test_rejects_target_without_source() {
        let text = MINIMAL.replace("prebuilt = \"bin/postinstall\"", "");
        let config = PackagingConfig::from_toml_str(&text).unwrap();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_load_sets_root() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(DEFAULT_CONFIG_FILE);
        std::fs::write(&path, MINIMAL).unwrap();
        let config = PackagingConfig::load(&path).unwrap();
        assert_eq!(config.root, dir.path());
        assert_eq!(config.dist_dir(), dir.path().join("dist"));
    }

    #[test]
    fn test_load_missing_file() {
        let err = PackagingConfig::load(Path::new("/no/such/hankstore.toml")).unwrap_err();
        assert!(matches!(
            err,
            crate::error::PackagerError::Config(ConfigError::NotFound { .. })
        ));
    }
}
