//! Common test utilities
//!
//! A `FakeToolchain` puts shell-script stand-ins for `az`, `gh` and `whoami`
//! on an isolated `PATH`. Each script appends its command line to a log file
//! so tests can assert exactly what the binary invoked.

use assert_cmd::Command;
use std::os::unix::fs::PermissionsExt;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

/// Environment variables that must not leak in from the developer's shell
const ISOLATED_VARS: &[&str] = &[
    "AZPROV_CONFIG",
    "AZPROV_USER",
    "AZPROV_LOCATION",
    "AZPROV_SUBSCRIPTION",
    "AZPROV_DB_PASSWORD",
    "AZPROV_GITHUB_REPOSITORY",
    "RUST_LOG",
];

pub struct FakeToolchain {
    dir: TempDir,
}

impl FakeToolchain {
    /// `az`, `gh` and `whoami` (answering `Alice.Smith`)
    pub fn new() -> Self {
        let toolchain = Self::empty();
        toolchain.install("az", "");
        toolchain.install("gh", "");
        toolchain.install("whoami", "echo Alice.Smith\n");
        toolchain
    }

    /// An empty `PATH` directory
    pub fn empty() -> Self {
        let dir = TempDir::new().expect("Failed to create temp dir");
        std::fs::create_dir_all(dir.path().join("bin")).expect("Failed to create bin dir");
        Self { dir }
    }

    /// Install a fake tool that logs its arguments and then runs `body`
    pub fn install(&self, name: &str, body: &str) {
        let path = self.bin_dir().join(name);
        let script = format!(
            "#!/bin/sh\necho \"{name} $*\" >> \"{log}\"\n{body}exit 0\n",
            log = self.log_path().display(),
        );
        std::fs::write(&path, script).expect("Failed to write fake tool");
        std::fs::set_permissions(&path, std::fs::Permissions::from_mode(0o755))
            .expect("Failed to mark fake tool executable");
    }

    pub fn root(&self) -> &Path {
        self.dir.path()
    }

    pub fn bin_dir(&self) -> PathBuf {
        self.dir.path().join("bin")
    }

    pub fn log_path(&self) -> PathBuf {
        self.dir.path().join("calls.log")
    }

    /// Every logged invocation, in order
    pub fn calls(&self) -> Vec<String> {
        std::fs::read_to_string(self.log_path())
            .unwrap_or_default()
            .lines()
            .map(str::to_string)
            .collect()
    }

    /// The binary with `PATH` restricted to the fake tools
    pub fn command(&self) -> Command {
        let mut cmd = Command::cargo_bin("azprov").expect("binary should be built");
        for var in ISOLATED_VARS {
            cmd.env_remove(var);
        }
        cmd.env("PATH", self.bin_dir())
            .env("NO_COLOR", "1")
            .current_dir(self.root());
        cmd
    }

    /// Write a file below the toolchain root, creating parent directories
    pub fn write_file(&self, relative: &str, content: &str) -> PathBuf {
        let path = self.root().join(relative);
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).expect("Failed to create parent dir");
        }
        std::fs::write(&path, content).expect("Failed to write file");
        path
    }
}
