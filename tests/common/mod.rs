//! Shared test infrastructure for integration tests.

use serde_json::json;
use std::fs;
use std::path::{Path, PathBuf};
use std::process::{Command, Output, Stdio};
use tempfile::TempDir;

pub const TEAM_DOC: &str = "\
# managed by access-sync
accounts:
  - account_name: team-a
    account_number: \"1001\"
    roles:
      viewer:
        - alice@example.com   # owner
      editor: []
  - account_name: team-b
    account_number: \"1002\"
    roles:
      viewer:
      - carol@example.com
      - alice@example.com
";

/// A scratch repository checkout plus a config file pointing at it.
pub struct Fixture {
    pub temp: TempDir,
    pub repo: PathBuf,
    pub config: PathBuf,
}

impl Fixture {
    pub fn new(identifier: &str) -> Self {
        let temp = TempDir::new().expect("tempdir");
        let root = temp.path().canonicalize().expect("canonical tempdir");
        let repo = root.join("work");
        fs::create_dir_all(&repo).expect("create repo dir");
        let config = root.join("config.json");
        let body = json!({
            "schema_version": 1,
            "environments": {
                "KP": {
                    "path": repo,
                    "base_branch": "main",
                    "identifier": identifier,
                    "pull_request_url": "https://git.example.com/kp/pull/new"
                }
            }
        });
        fs::write(&config, serde_json::to_vec_pretty(&body).expect("config json"))
            .expect("write config");
        Self { temp, repo, config }
    }

    pub fn write(&self, rel: &str, contents: &str) {
        let path = self.repo.join(rel);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).expect("create parent");
        }
        fs::write(path, contents).expect("write document");
    }

    pub fn read(&self, rel: &str) -> String {
        fs::read_to_string(self.repo.join(rel)).expect("read document")
    }

    pub fn home(&self) -> PathBuf {
        self.temp.path().join("home")
    }

    /// Run the binary with the fixture config and an isolated git home.
    pub fn run(&self, args: &[&str]) -> Output {
        let mut command = Command::new(env!("CARGO_BIN_EXE_access-sync"));
        command.args(args).arg("--config").arg(&self.config);
        isolate(&mut command, &self.home());
        command.output().expect("spawn access-sync")
    }

    #[allow(dead_code)]
    pub fn git(&self, dir: &Path, args: &[&str]) -> String {
        let mut command = Command::new("git");
        command.args(args).current_dir(dir);
        isolate(&mut command, &self.home());
        let output = command.output().expect("spawn git");
        assert!(
            output.status.success(),
            "git {:?} failed: {}",
            args,
            String::from_utf8_lossy(&output.stderr)
        );
        String::from_utf8_lossy(&output.stdout).trim().to_string()
    }
}

fn isolate(command: &mut Command, home: &Path) {
    command
        .env("HOME", home)
        .env("XDG_CONFIG_HOME", home.join(".config"))
        .env("GIT_CONFIG_NOSYSTEM", "1")
        .env_remove("ACCESS_SYNC_CONFIG")
        .env_remove("RUST_LOG");
}

/// Check if git is available; skip test if not.
#[allow(dead_code)]
pub fn skip_if_git_missing() -> bool {
    let missing = Command::new("git")
        .arg("--version")
        .stdout(Stdio::null())
        .stderr(Stdio::null())
        .status()
        .is_err();
    if missing {
        eprintln!("Skipping: git not available");
    }
    missing
}

pub fn stdout(output: &Output) -> String {
    String::from_utf8_lossy(&output.stdout).into_owned()
}

pub fn assert_success(output: &Output) {
    assert!(
        output.status.success(),
        "access-sync failed: {}",
        String::from_utf8_lossy(&output.stderr)
    );
}
