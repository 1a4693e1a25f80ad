#[cfg(test)]
mod tests {
    use hankstore_bundler::bundler::{BundleMode, Bundler, Settings, calculate_sha256};
    use hankstore_bundler::collector::{AssetCollector, NativeSearchContext};
    use hankstore_bundler::config::PackagingConfig;
    use std::path::Path;

    const CONFIG: &str = r#"
[package]
name = "HankstoreManager"
version = "1.4.0"

[assets]
folders = ["assets", "data"]
files = [{ source = ".env.example" }]

[native]
libraries = [
    { name = "sqlcipher", files = ["sqlcipher.dll"], env = "HANKSTORE_SQLCIPHER_DLL", mandatory = true },
]

[[target]]
name = "HankstoreManager"
prebuilt = "bin/app"
mode = "onedir"
hidden_imports = ["babel.numbers"]

[[target]]
name = "hankstore_postinstall"
prebuilt = "bin/helper"
include_assets = false
"#;

    fn project() -> tempfile::TempDir {
        let dir = tempfile::tempdir().unwrap();
        let root = dir.path();
        for sub in ["assets/icons", "data", "bin", "native", "assets/build"] {
            std::fs::create_dir_all(root.join(sub)).unwrap();
        }
        std::fs::write(root.join("assets/icons/app.png"), b"png").unwrap();
        std::fs::write(root.join("assets/build/stale.dll"), b"stale").unwrap();
        std::fs::write(root.join("data/tax_rates.json"), b"{}").unwrap();
        std::fs::write(root.join(".env.example"), b"DB_PATH=\n").unwrap();
        std::fs::write(root.join("bin/app"), b"application").unwrap();
        std::fs::write(root.join("bin/helper"), b"helper").unwrap();
        std::fs::write(root.join("native/sqlcipher.dll"), b"dll").unwrap();
        std::fs::write(root.join("hankstore.toml"), CONFIG).unwrap();
        dir
    }

    fn load(root: &Path) -> PackagingConfig {
        PackagingConfig::load(&root.join("hankstore.toml")).unwrap()
    }

    #[test]
    fn test_collect_resolves_resources_and_override() {
        let dir = project();
        let config = load(dir.path());
        let search = NativeSearchContext::new(vec![], None)
            .with_override("HANKSTORE_SQLCIPHER_DLL", dir.path().join("native"));

        let manifest = AssetCollector::with_search_context(&config, search).collect();

        let targets: Vec<_> = manifest.resources.iter().map(|r| r.target_path()).collect();
        assert!(targets.contains(&Path::new("assets/icons/app.png").to_path_buf()));
        assert!(targets.contains(&Path::new("data/tax_rates.json").to_path_buf()));
        assert!(targets.contains(&Path::new(".env.example").to_path_buf()));
        assert!(!targets.iter().any(|t| t.to_string_lossy().contains("stale")));
        assert_eq!(manifest.binaries().count(), 1);
        assert!(manifest.missing_mandatory().is_empty());
    }

    #[test]
    fn test_missing_mandatory_library_does_not_fail_collection() {
        let dir = project();
        let config = load(dir.path());
        let manifest =
            AssetCollector::with_search_context(&config, NativeSearchContext::new(vec![], None))
                .collect();
        assert_eq!(manifest.missing_mandatory(), vec!["sqlcipher"]);
        assert!(!manifest.resources.is_empty());
    }

    #[tokio::test]
    async fn test_bundle_prebuilt_targets() {
        let dir = project();
        let config = load(dir.path());
        let search = NativeSearchContext::new(vec![], None)
            .with_override("HANKSTORE_SQLCIPHER_DLL", dir.path().join("native"));
        let manifest = AssetCollector::with_search_context(&config, search).collect();

        let settings = Settings::from_config(&config, manifest).unwrap();
        let artifacts = Bundler::new(settings).bundle().await.unwrap();
        assert_eq!(artifacts.len(), 2);

        let app = &artifacts[0];
        assert_eq!(app.mode, BundleMode::OneDir);
        assert!(app.root.join("assets/icons/app.png").is_file());
        assert!(app.root.join("sqlcipher.dll").is_file());
        assert!(app.root.join(".env.example").is_file());
        assert_eq!(app.checksum, calculate_sha256(&app.root).await.unwrap());

        let helper = &artifacts[1];
        assert_eq!(helper.mode, BundleMode::OneFile);
        assert_eq!(helper.root, helper.executable);
        assert_eq!(helper.size, 6);

        // manifests are kept for inspection
        let manifest_json = std::fs::read_to_string(
            dir.path().join("build/HankstoreManager/bundle-manifest.json"),
        )
        .unwrap();
        assert!(manifest_json.contains("babel.numbers"));
    }

    #[test]
    fn test_retain_unknown_target_fails() {
        let dir = project();
        let config = load(dir.path());
        let mut settings = Settings::from_config(&config, Default::default()).unwrap();
        assert!(settings.retain_target("nope").is_err());
        settings.retain_target("hankstore_postinstall").unwrap();
        assert_eq!(settings.targets().len(), 1);
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_script_target_runs_freezer() {
        use std::os::unix::fs::PermissionsExt;

        let dir = project();
        let root = dir.path();
        std::fs::create_dir_all(root.join("src")).unwrap();
        std::fs::write(root.join("src/main.py"), b"print('hi')\n").unwrap();
        std::fs::create_dir_all(root.join("hooks")).unwrap();
        std::fs::write(root.join("hooks/load_dotenv.py"), b"# load .env\n").unwrap();
        std::fs::write(
            root.join("hankstore.toml"),
            CONFIG.replace(
                "prebuilt = \"bin/app\"",
                "entry = \"src/main.py\"\nruntime_hooks = [\"hooks/load_dotenv.py\"]",
            ),
        )
        .unwrap();

        let freezer = root.join("fake-freezer");
        std::fs::write(
            &freezer,
            "#!/bin/sh\n\
             while [ $# -gt 1 ]; do\n\
               case \"$1\" in --distpath) shift; dist=\"$1\";; esac\n\
               shift\n\
             done\n\
             mkdir -p \"$dist/HankstoreManager\"\n\
             cp \"$1\" \"$dist/HankstoreManager/HankstoreManager\"\n",
        )
        .unwrap();
        std::fs::set_permissions(&freezer, std::fs::Permissions::from_mode(0o755)).unwrap();

        let config = load(root);
        let mut settings = Settings::from_config(&config, Default::default()).unwrap();
        settings.retain_target("HankstoreManager").unwrap();
        settings.set_freezer(&freezer);

        let artifacts = Bundler::new(settings).bundle().await.unwrap();
        // the fake freezer copies the spec into place as the executable
        let spec = std::fs::read_to_string(&artifacts[0].executable).unwrap();
        assert!(spec.contains("main.py"));
        assert!(spec.contains("babel.numbers"));
        assert!(spec.contains("COLLECT("));
        assert!(spec.contains("load_dotenv.py"));
    }

    #[tokio::test]
    async fn test_missing_runtime_hook_fails_before_freezing() {
        let dir = project();
        let root = dir.path();
        std::fs::create_dir_all(root.join("src")).unwrap();
        std::fs::write(root.join("src/main.py"), b"print('hi')\n").unwrap();
        std::fs::write(
            root.join("hankstore.toml"),
            CONFIG.replace(
                "prebuilt = \"bin/app\"",
                "entry = \"src/main.py\"\nruntime_hooks = [\"hooks/absent.py\"]",
            ),
        )
        .unwrap();

        let config = load(root);
        let mut settings = Settings::from_config(&config, Default::default()).unwrap();
        settings.retain_target("HankstoreManager").unwrap();
        settings.set_freezer(root.join("no-freezer"));

        let err = Bundler::new(settings).bundle().await.unwrap_err();
        assert!(err.to_string().contains("absent.py"), "{err}");
    }
}
