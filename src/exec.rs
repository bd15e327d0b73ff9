//! External command execution.
use anyhow::{Context, Result, bail};
use std::fmt::Debug;
use std::process::{Command, Output};

/// Result of a command execution.
#[derive(Debug, Clone)]
pub struct ExecResult {
    /// Captured standard output.
    pub stdout: String,
    /// Captured standard error.
    pub stderr: String,
    /// Whether the process exited successfully.
    pub success: bool,
    /// Exit code, if the process exited normally.
    pub code: Option<i32>,
}

impl From<Output> for ExecResult {
    fn from(output: Output) -> Self {
        Self {
            stdout: String::from_utf8_lossy(&output.stdout).to_string(),
            stderr: String::from_utf8_lossy(&output.stderr).to_string(),
            success: output.status.success(),
            code: output.status.code(),
        }
    }
}

/// Runs external programs. The tenant lookup talks to the Azure CLI through
/// this trait so tests can substitute canned responses.
pub trait Executor: Debug + Send + Sync {
    /// Run `program` and return its output. Fails if the command exits non-zero.
    ///
    /// # Errors
    ///
    /// Returns an error if the process cannot be spawned or exits non-zero.
    fn run(&self, program: &str, args: &[&str]) -> Result<ExecResult>;

    /// Run `program`, returning its output even when it exits non-zero.
    ///
    /// # Errors
    ///
    /// Returns an error if the process cannot be spawned.
    fn run_unchecked(&self, program: &str, args: &[&str]) -> Result<ExecResult>;

    /// `true` if `program` resolves on `PATH`.
    fn which(&self, program: &str) -> bool;
}

/// [`Executor`] backed by [`std::process::Command`].
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemExecutor;

impl Executor for SystemExecutor {
    fn run(&self, program: &str, args: &[&str]) -> Result<ExecResult> {
        let result = self.run_unchecked(program, args)?;
        if !result.success {
            bail!(
                "{program} failed (exit {}): {}",
                result.code.unwrap_or(-1),
                result.stderr.trim()
            );
        }
        Ok(result)
    }

    fn run_unchecked(&self, program: &str, args: &[&str]) -> Result<ExecResult> {
        // Resolve through PATHEXT so `az` finds `az.cmd` on Windows.
        let resolved = which::which(program).unwrap_or_else(|_| program.into());
        let output = Command::new(resolved)
            .args(args)
            .output()
            .with_context(|| format!("failed to execute: {program}"))?;
        Ok(ExecResult::from(output))
    }

    fn which(&self, program: &str) -> bool {
        which::which(program).is_ok()
    }
}

#[cfg(test)]
#[allow(clippy::expect_used, clippy::unwrap_used, clippy::indexing_slicing)]
/// Test doubles for the executor.
pub mod test_helpers {
    use std::collections::VecDeque;
    use std::sync::Mutex;

    use super::{ExecResult, Executor};

    /// Executor that replays queued `(success, stdout)` responses and records
    /// every invocation.
    #[derive(Debug, Default)]
    pub struct MockExecutor {
        responses: Mutex<VecDeque<(bool, String)>>,
        calls: Mutex<Vec<String>>,
        /// Value returned by `which()` regardless of program name.
        pub which_result: bool,
    }

    impl MockExecutor {
        /// Executor whose `which()` succeeds and that replays `responses`.
        pub fn with_responses(responses: Vec<(bool, &str)>) -> Self {
            Self {
                responses: Mutex::new(
                    responses
                        .into_iter()
                        .map(|(ok, out)| (ok, out.to_string()))
                        .collect(),
                ),
                calls: Mutex::default(),
                which_result: true,
            }
        }

        /// Executor for which no program is on `PATH`.
        pub fn missing_everything() -> Self {
            Self::default()
        }

        /// Command lines seen so far, space-joined.
        pub fn calls(&self) -> Vec<String> {
            self.calls.lock().unwrap().clone()
        }

        fn next(&self, program: &str, args: &[&str]) -> (bool, String) {
            let mut line = vec![program];
            line.extend_from_slice(args);
            self.calls.lock().unwrap().push(line.join(" "));
            self.responses
                .lock()
                .unwrap()
                .pop_front()
                .unwrap_or((false, String::new()))
        }
    }

    impl Executor for MockExecutor {
        fn run(&self, program: &str, args: &[&str]) -> anyhow::Result<ExecResult> {
            let (success, stdout) = self.next(program, args);
            if success {
                Ok(ExecResult {
                    stdout,
                    stderr: String::new(),
                    success,
                    code: Some(0),
                })
            } else {
                anyhow::bail!("{program} failed (exit 1): {stdout}")
            }
        }

        fn run_unchecked(&self, program: &str, args: &[&str]) -> anyhow::Result<ExecResult> {
            let (success, stdout) = self.next(program, args);
            Ok(ExecResult {
                stdout,
                stderr: String::new(),
                success,
                code: Some(i32::from(!success)),
            })
        }

        fn which(&self, _: &str) -> bool {
            self.which_result
        }
    }
}
