use assert_cmd::Command;
use predicates::prelude::*;
use std::path::Path;

const KEY_LINE: &str = "FACTURATION_OBR_FERNET_KEY=abc123";

struct Sandbox {
    dir: tempfile::TempDir,
}

impl Sandbox {
    fn new() -> Self {
        let dir = tempfile::tempdir().unwrap();
        for sub in ["data", "tmp", "cwd"] {
            std::fs::create_dir_all(dir.path().join(sub)).unwrap();
        }
        Self { dir }
    }

    fn path(&self, rel: &str) -> std::path::PathBuf {
        self.dir.path().join(rel)
    }

    fn write_values(&self, text: &str) -> std::path::PathBuf {
        let path = self.path("tmp/install_values.txt");
        std::fs::write(&path, text).unwrap();
        path
    }

    /// Helper command isolated from the real user profile.
    fn helper(&self) -> Command {
        let mut cmd = Command::cargo_bin("hankstore_postinstall").unwrap();
        cmd.env("HANKSTORE_DATA_DIR", self.path("data"))
            .env("TMPDIR", self.path("tmp"))
            .env_remove("HANKSTORE_INSTALL_VALUES")
            .current_dir(self.path("cwd"));
        cmd
    }

    fn env_file(&self) -> std::path::PathBuf {
        self.path("data/.env")
    }
}

fn read(path: &Path) -> String {
    std::fs::read_to_string(path).unwrap()
}

#[test]
fn test_writes_key_into_env() {
    let sandbox = Sandbox::new();
    let values = sandbox.write_values(&format!("{KEY_LINE}\n"));

    sandbox
        .helper()
        .arg("--write-env")
        .env("HANKSTORE_INSTALL_VALUES", &values)
        .assert()
        .success();

    let env = read(&sandbox.env_file());
    assert!(env.lines().any(|l| l == KEY_LINE), "env was: {env:?}");
}

#[test]
fn test_second_run_is_byte_identical() {
    let sandbox = Sandbox::new();
    let values = sandbox.write_values(&format!("# staged\n{KEY_LINE}\n"));

    sandbox
        .helper()
        .args(["--write-env", "--values"])
        .arg(&values)
        .assert()
        .success();
    let first = read(&sandbox.env_file());

    sandbox
        .helper()
        .args(["--write-env", "--values"])
        .arg(&values)
        .assert()
        .success();
    assert_eq!(read(&sandbox.env_file()), first);
    assert_eq!(first.matches("FACTURATION_OBR_FERNET_KEY=").count(), 1);
}

#[test]
fn test_replaces_existing_key_and_keeps_other_lines() {
    let sandbox = Sandbox::new();
    std::fs::write(
        sandbox.env_file(),
        "DB_PATH=/var/hank.db\nFACTURATION_OBR_FERNET_KEY=old\n",
    )
    .unwrap();
    let values = sandbox.write_values(&format!("{KEY_LINE}\n"));

    sandbox
        .helper()
        .args(["--write-env", "--values"])
        .arg(&values)
        .assert()
        .success();

    assert_eq!(
        read(&sandbox.env_file()),
        format!("DB_PATH=/var/hank.db\n{KEY_LINE}\n")
    );
}

#[test]
fn test_missing_key_fails_without_writing() {
    let sandbox = Sandbox::new();
    let values = sandbox.write_values("OTHER=1\n");

    sandbox
        .helper()
        .args(["--write-env", "--values"])
        .arg(&values)
        .assert()
        .code(5)
        .stderr(predicate::str::contains("FACTURATION_OBR_FERNET_KEY"));

    assert!(!sandbox.env_file().exists());
}

#[test]
fn test_missing_values_file_exits_4() {
    let sandbox = Sandbox::new();

    sandbox
        .helper()
        .args(["--write-env", "--values"])
        .arg(sandbox.path("nowhere.txt"))
        .assert()
        .code(4);

    assert!(!sandbox.env_file().exists());
}

#[test]
fn test_values_found_in_temp_dir() {
    let sandbox = Sandbox::new();
    sandbox.write_values(&format!("{KEY_LINE}\n"));

    sandbox.helper().arg("--write-env").assert().success();

    assert!(read(&sandbox.env_file()).contains(KEY_LINE));
}

#[test]
fn test_validate_only_writes_nothing() {
    let sandbox = Sandbox::new();
    let values = sandbox.write_values(&format!("{KEY_LINE}\n"));

    sandbox.helper().arg("--values").arg(&values).assert().success();

    assert!(!sandbox.env_file().exists());
}

#[test]
fn test_strict_key_rejects_short_value() {
    let sandbox = Sandbox::new();
    let values = sandbox.write_values(&format!("{KEY_LINE}\n"));

    sandbox
        .helper()
        .args(["--write-env", "--strict-key", "--values"])
        .arg(&values)
        .assert()
        .code(5);
}

#[test]
fn test_unknown_flag_is_usage_error() {
    let sandbox = Sandbox::new();
    sandbox.helper().arg("--bogus").assert().code(1);
}

#[test]
fn test_help_exits_zero() {
    let sandbox = Sandbox::new();
    sandbox
        .helper()
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("--write-env"));
}

#[test]
fn test_unusable_data_dir_is_write_failure() {
    let sandbox = Sandbox::new();
    let values = sandbox.write_values(&format!("{KEY_LINE}\n"));
    let not_a_dir = sandbox.path("data-file");
    std::fs::write(&not_a_dir, b"occupied").unwrap();

    sandbox
        .helper()
        .env("HANKSTORE_DATA_DIR", &not_a_dir)
        .args(["--write-env", "--values"])
        .arg(&values)
        .assert()
        .code(2)
        .stderr(predicate::str::contains("data directory unusable"));

    assert_eq!(read(&not_a_dir), "occupied");
}

#[test]
fn test_generate_if_missing_writes_fresh_key() {
    let sandbox = Sandbox::new();
    let values = sandbox.write_values("OTHER=1\n");

    sandbox
        .helper()
        .args(["--write-env", "--generate-if-missing", "--values"])
        .arg(&values)
        .assert()
        .success();

    let env = read(&sandbox.env_file());
    let key = env
        .lines()
        .find_map(|l| l.strip_prefix("FACTURATION_OBR_FERNET_KEY="))
        .unwrap();
    assert!(hankstore_bundler::postinstall::is_fernet_key(key), "key was: {key:?}");
}

#[test]
fn test_generate_if_missing_keeps_existing_key() {
    let sandbox = Sandbox::new();
    std::fs::write(sandbox.env_file(), "FACTURATION_OBR_FERNET_KEY=kept\n").unwrap();

    sandbox
        .helper()
        .args(["--write-env", "--generate-if-missing", "--values"])
        .arg(sandbox.path("nowhere.txt"))
        .assert()
        .success();

    assert_eq!(read(&sandbox.env_file()), "FACTURATION_OBR_FERNET_KEY=kept\n");
}

#[test]
fn test_generate_requires_write_env() {
    let sandbox = Sandbox::new();
    sandbox
        .helper()
        .arg("--generate-if-missing")
        .assert()
        .code(1);
    assert!(!sandbox.env_file().exists());
}
