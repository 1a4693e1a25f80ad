//! Freezer spec rendering.

use super::template::SPEC_TEMPLATE;
use crate::bundler::error::{ErrorExt, Result};
use crate::bundler::settings::{BundleMode, BundleTarget, Settings};
use crate::collector::BundleManifest;
use handlebars::Handlebars;
use serde::Serialize;
use std::path::Path;

#[derive(Serialize)]
struct SpecEntry {
    source: String,
    dest: String,
}

#[derive(Serialize)]
struct SpecData {
    name: String,
    version: String,
    mode: &'static str,
    onefile: bool,
    exe_name: String,
    entry: String,
    pathex: String,
    console: &'static str,
    icon: Option<String>,
    datas: Vec<SpecEntry>,
    binaries: Vec<SpecEntry>,
    hidden_imports: Vec<String>,
    runtime_hooks: Vec<String>,
}

/// Quote `value` as a Python string literal.
///
/// JSON string escapes are a subset of Python's, so serde_json does the work.
fn py_str(value: &str) -> String {
    serde_json::Value::String(value.to_string()).to_string()
}

fn py_path(path: &Path) -> String {
    py_str(&path.to_string_lossy())
}

/// Render the spec for one script target.
pub fn render_spec(
    settings: &Settings,
    target: &BundleTarget,
    manifest: &BundleManifest,
    entry: &Path,
    icon: Option<&Path>,
) -> Result<String> {
    let pathex = entry
        .parent()
        .map(py_path)
        .unwrap_or_else(|| py_str("."));

    let data = SpecData {
        name: target.name.clone(),
        version: settings.version_string().to_string(),
        mode: target.mode.short_name(),
        onefile: target.mode == BundleMode::OneFile,
        exe_name: py_str(&target.name),
        entry: py_path(entry),
        pathex,
        console: if target.console { "True" } else { "False" },
        icon: icon.map(py_path),
        datas: manifest
            .resources
            .iter()
            .map(|r| SpecEntry {
                source: py_path(&r.source),
                dest: py_path(&r.destination),
            })
            .collect(),
        binaries: manifest
            .binaries()
            .map(|b| SpecEntry {
                source: py_path(&b.path),
                dest: py_str("."),
            })
            .collect(),
        hidden_imports: manifest.hidden_imports.iter().map(|h| py_str(h)).collect(),
        runtime_hooks: target.runtime_hooks.iter().map(|h| py_path(h)).collect(),
    };

    let mut handlebars = Handlebars::new();
    handlebars.register_escape_fn(handlebars::no_escape);
    handlebars.register_template_string("freezer.spec", SPEC_TEMPLATE)?;
    Ok(handlebars.render("freezer.spec", &data)?)
}

/// Render and write `<work_dir>/<name>.spec`.
pub async fn write_spec(
    settings: &Settings,
    target: &BundleTarget,
    manifest: &BundleManifest,
    entry: &Path,
    icon: Option<&Path>,
    work_dir: &Path,
) -> Result<std::path::PathBuf> {
    let content = render_spec(settings, target, manifest, entry, icon)?;
    let spec_path = work_dir.join(format!("{}.spec", target.name));
    tokio::fs::write(&spec_path, content)
        .await
        .fs_context("writing freezer spec", &spec_path)?;
    log::debug!("Wrote freezer spec {}", spec_path.display());
    Ok(spec_path)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bundler::settings::{SettingsBuilder, TargetSource};
    use crate::collector::{CandidateSource, ResolvedFile, ResolvedLibrary, ResourceMapping};
    use std::path::PathBuf;

    fn settings() -> Settings {
        SettingsBuilder::new()
            .product_name("HankstoreManager")
            .version("2.1.0")
            .dist_dir("dist")
            .build()
            .unwrap()
    }

    fn target(mode: BundleMode) -> BundleTarget {
        BundleTarget {
            name: "HankstoreManager".into(),
            source: TargetSource::Script(PathBuf::from("app/main.py")),
            mode,
            icon: None,
            console: false,
            hidden_imports: vec![],
            runtime_hooks: vec![PathBuf::from("hooks/load_dotenv.py")],
            include_assets: true,
        }
    }

    fn manifest() -> BundleManifest {
        BundleManifest {
            resources: vec![ResourceMapping::new("/src/assets/logo.png", "assets")],
            native_libraries: vec![ResolvedLibrary {
                name: "sqlcipher".into(),
                mandatory: true,
                files: vec![ResolvedFile {
                    file_name: "sqlcipher.dll".into(),
                    path: PathBuf::from("/opt/sqlcipher/sqlcipher.dll"),
                    source: CandidateSource::EnvOverride,
                }],
                missing: vec![],
            }],
            hidden_imports: vec!["babel.numbers".into()],
        }
    }

    #[test]
    fn test_onedir_spec_has_collect() {
        let spec = render_spec(
            &settings(),
            &target(BundleMode::OneDir),
            &manifest(),
            Path::new("app/main.py"),
            None,
        )
        .unwrap();

        assert!(spec.contains("coll = COLLECT("));
        assert!(spec.contains("exclude_binaries=True"));
        assert!(spec.contains(r#"("/opt/sqlcipher/sqlcipher.dll", "."),"#));
        assert!(spec.contains(r#"("/src/assets/logo.png", "assets"),"#));
        assert!(spec.contains(r#""babel.numbers","#));
        assert!(spec.contains("console=False"));
        assert!(spec.contains(r#"runtime_hooks=["hooks/load_dotenv.py"],"#));
        assert!(!spec.contains("icon="));
    }

    #[test]
    fn test_onefile_spec_with_icon() {
        let mut t = target(BundleMode::OneFile);
        t.console = true;
        let spec = render_spec(
            &settings(),
            &t,
            &BundleManifest::default(),
            Path::new("main.py"),
            Some(Path::new("build/app.ico")),
        )
        .unwrap();

        assert!(!spec.contains("COLLECT"));
        assert!(spec.contains("console=True"));
        assert!(spec.contains(r#"icon=["build/app.ico"]"#));
    }

    #[test]
    fn test_no_runtime_hooks_renders_empty_list() {
        let mut t = target(BundleMode::OneDir);
        t.runtime_hooks.clear();
        let spec = render_spec(&settings(), &t, &manifest(), Path::new("main.py"), None).unwrap();
        assert!(spec.contains("runtime_hooks=[],"));
    }

    #[test]
    fn test_quotes_are_escaped() {
        assert_eq!(py_str(r#"C:\dir "x""#), r#""C:\\dir \"x\"""#);
    }
}
