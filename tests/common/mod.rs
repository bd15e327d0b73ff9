// Shared helpers for integration tests.
//
// Provides a temporary-directory-backed workspace and a fluent builder so
// each integration test can run the `azstack` binary in isolation: its own
// config file, output directory and log cache.
//
// Used by all integration test binaries that declare `mod common;`.
#![allow(dead_code)]

use std::path::{Path, PathBuf};
use std::process::{Command, Output};

use azstack::config::Config;

/// Tenant id passed with `--tenant-id` so no lookup leaves the machine.
pub const TENANT: &str = "72f988bf-86f1-41af-91ab-2d7cd011db47";

/// Password placed in the admin password variable of every run.
pub const PASSWORD: &str = "integration-test-password";

/// An isolated workspace backed by a [`tempfile::TempDir`].
///
/// The directory is deleted when dropped.
pub struct IntegrationTestContext {
    /// Temporary directory holding the config, output and log cache.
    pub root: tempfile::TempDir,
    password: Option<String>,
}

impl IntegrationTestContext {
    /// Create a context with no config file (defaults apply) and the admin
    /// password set.
    pub fn new() -> Self {
        Self {
            root: tempfile::tempdir().expect("create temp dir"),
            password: Some(PASSWORD.to_string()),
        }
    }

    /// Path to the workspace root.
    pub fn root_path(&self) -> &Path {
        self.root.path()
    }

    /// Path of the config file passed with `-c`.
    pub fn config_path(&self) -> PathBuf {
        self.root.path().join("azstack.toml")
    }

    /// Output directory used by `synth`.
    pub fn out_dir(&self) -> PathBuf {
        self.root.path().join("out")
    }

    /// Load the workspace config the way the binary does.
    pub fn load_config(&self) -> Config {
        Config::load(&self.config_path()).expect("load config")
    }

    /// Run the binary with `-c <config>` followed by `args`.
    ///
    /// `XDG_CACHE_HOME` points into the workspace so log files never touch
    /// the real cache.
    pub fn run(&self, args: &[&str]) -> Output {
        let mut cmd = Command::new(env!("CARGO_BIN_EXE_azstack"));
        cmd.arg("-c")
            .arg(self.config_path())
            .args(args)
            .env("XDG_CACHE_HOME", self.root.path().join("cache"))
            .env_remove(azstack::config::DEFAULT_PASSWORD_ENV);
        if let Some(password) = &self.password {
            cmd.env(azstack::config::DEFAULT_PASSWORD_ENV, password);
        }
        cmd.output().expect("run azstack")
    }

    /// Read a synthesized file relative to the output directory as JSON.
    pub fn read_json(&self, relative: &str) -> serde_json::Value {
        let text = std::fs::read_to_string(self.out_dir().join(relative)).expect("read output");
        serde_json::from_str(&text).expect("parse output")
    }
}

/// Fluent builder for [`IntegrationTestContext`].
pub struct TestContextBuilder {
    ctx: IntegrationTestContext,
}

impl TestContextBuilder {
    /// Begin building a new context.
    pub fn new() -> Self {
        Self {
            ctx: IntegrationTestContext::new(),
        }
    }

    /// Write `content` as the config file.
    pub fn with_config(self, content: &str) -> Self {
        std::fs::write(self.ctx.config_path(), content).expect("write config file");
        self
    }

    /// Leave the admin password variable unset.
    pub fn without_password(mut self) -> Self {
        self.ctx.password = None;
        self
    }

    /// Finish building and return the configured context.
    pub fn build(self) -> IntegrationTestContext {
        self.ctx
    }
}

/// Captured stdout as text.
pub fn stdout(output: &Output) -> String {
    String::from_utf8_lossy(&output.stdout).into_owned()
}

/// Captured stderr as text.
pub fn stderr(output: &Output) -> String {
    String::from_utf8_lossy(&output.stderr).into_owned()
}
