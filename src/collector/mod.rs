//! Asset collection for bundle targets.
//!
//! Walks declared resource folders, explicit files, the UI-toolkit resource
//! folder and native library candidates, producing a [`BundleManifest`].
//!
//! Collection never fails: anything optional that is missing contributes
//! nothing and is reported through `log`.
//!
//! ```no_run
//! use hankstore_bundler::{AssetCollector, PackagingConfig};
//! use std::path::Path;
//!
//! # fn example() -> hankstore_bundler::Result<()> {
//! let config = PackagingConfig::load(Path::new("hankstore.toml"))?;
//! let manifest = AssetCollector::new(&config).collect();
//! println!("{} resources", manifest.resources.len());
//! # Ok(())
//! # }
//! ```

mod native;
mod resources;

pub use native::{
    Candidate, CandidateSource, NativeSearchContext, ResolvedFile, ResolvedLibrary,
};
pub use resources::{ResourceMapping, collect_files, collect_resources, normalize_destination};

use crate::bundler::error::{ErrorExt, Result};
use crate::config::PackagingConfig;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Everything a bundle target embeds besides its entry point.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct BundleManifest {
    /// Data files and their bundle-relative directories
    pub resources: Vec<ResourceMapping>,
    /// Native libraries, resolved or not
    pub native_libraries: Vec<ResolvedLibrary>,
    /// Module names the freezer must include explicitly
    pub hidden_imports: Vec<String>,
}

impl BundleManifest {
    /// Every native library file that was found.
    pub fn binaries(&self) -> impl Iterator<Item = &ResolvedFile> {
        self.native_libraries.iter().flat_map(|l| l.files.iter())
    }

    /// Mandatory libraries with no file found.
    pub fn missing_mandatory(&self) -> Vec<&str> {
        self.native_libraries
            .iter()
            .filter(|l| l.mandatory && l.is_absent())
            .map(|l| l.name.as_str())
            .collect()
    }

    /// Append hidden imports, keeping first-seen order without duplicates.
    pub fn with_hidden_imports<I, S>(mut self, imports: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        for import in imports {
            let import = import.into();
            if !self.hidden_imports.contains(&import) {
                self.hidden_imports.push(import);
            }
        }
        self
    }

    /// Persist as pretty JSON for inspection.
    pub fn write_json(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).fs_context("creating manifest directory", parent)?;
        }
        let json = serde_json::to_string_pretty(self)?;
        std::fs::write(path, json).fs_context("writing bundle manifest", path)?;
        Ok(())
    }
}

/// Runs all collection steps for a packaging config.
#[derive(Debug)]
pub struct AssetCollector<'a> {
    config: &'a PackagingConfig,
    search: NativeSearchContext,
}

impl<'a> AssetCollector<'a> {
    /// Collector reading native overrides from the process environment.
    pub fn new(config: &'a PackagingConfig) -> Self {
        Self {
            config,
            search: NativeSearchContext::from_env(&config.native),
        }
    }

    /// Collector with an explicit search context.
    pub fn with_search_context(config: &'a PackagingConfig, search: NativeSearchContext) -> Self {
        Self { config, search }
    }

    /// Build the manifest shared by all targets.
    pub fn collect(&self) -> BundleManifest {
        let root = self.config.root.as_path();
        let assets = &self.config.assets;

        let mut resources = collect_resources(root, &assets.folders, &assets.build_output_dirs);
        resources.extend(collect_files(root, &assets.files));
        resources.extend(self.search.resolve_resource_dir(
            &self.config.native.toolkit_resource_env,
            &self.config.native.toolkit_resource_dest,
        ));
        resources.sort();
        resources.dedup();

        let native_libraries: Vec<ResolvedLibrary> = self
            .config
            .native
            .libraries
            .iter()
            .map(|lib| self.search.resolve(lib))
            .collect();

        let manifest = BundleManifest {
            resources,
            native_libraries,
            hidden_imports: Vec::new(),
        };

        log::info!(
            "Collected {} resource(s) and {} native file(s)",
            manifest.resources.len(),
            manifest.binaries().count()
        );
        manifest
    }
}
