//! Structured logger with per-stack summary collection.
use std::path::PathBuf;
use std::sync::Mutex;

use super::subscriber::STAGE_TARGET;
use super::types::{Log, StackEntry, StackStatus};
use super::utils::log_file_path;

/// Implement the display methods of [`Log`] by delegating to inherent methods
/// of the same name on the implementing type.
macro_rules! forward_log_methods {
    ($($method:ident),+ $(,)?) => {
        $(
            fn $method(&self, msg: &str) {
                self.$method(msg);
            }
        )+
    };
}

/// Structured logger with summary collection.
///
/// All messages are also written to `$XDG_CACHE_HOME/azstack/<command>.log`
/// by the file layer installed in [`init_subscriber`](super::init_subscriber),
/// regardless of the verbose flag.
#[derive(Debug)]
pub struct Logger {
    stacks: Mutex<Vec<StackEntry>>,
    log_file: Option<PathBuf>,
}

impl Logger {
    /// Create a new logger for `command`.
    ///
    /// Only remembers the log file path for the summary; the file itself is
    /// created by the subscriber.
    #[must_use]
    pub fn new(command: &str) -> Self {
        Self {
            stacks: Mutex::new(Vec::new()),
            log_file: log_file_path(command),
        }
    }

    /// Return the log file path, if available.
    #[cfg(test)]
    pub const fn log_path(&self) -> Option<&PathBuf> {
        self.log_file.as_ref()
    }

    /// Return a clone of all recorded stack entries (test-only).
    #[cfg(test)]
    pub(crate) fn stack_entries(&self) -> Vec<StackEntry> {
        self.stacks.lock().map_or_else(|_| vec![], |g| g.clone())
    }

    /// Log an error message.
    pub fn error(&self, msg: &str) {
        tracing::error!("{msg}");
    }

    /// Log a warning message.
    pub fn warn(&self, msg: &str) {
        tracing::warn!("{msg}");
    }

    /// Log a stage header (major section).
    pub fn stage(&self, msg: &str) {
        tracing::info!(target: STAGE_TARGET, "{msg}");
    }

    /// Log an informational message.
    pub fn info(&self, msg: &str) {
        tracing::info!("{msg}");
    }

    /// Log a debug message (suppressed on console unless verbose).
    pub fn debug(&self, msg: &str) {
        tracing::debug!("{msg}");
    }

    /// Record a stack result for the summary.
    pub fn record_stack(&self, name: &str, status: StackStatus, message: Option<&str>) {
        if let Ok(mut guard) = self.stacks.lock() {
            guard.push(StackEntry {
                name: name.to_string(),
                status,
                message: message.map(String::from),
            });
        }
    }

    /// Count the stacks that failed.
    #[must_use]
    pub fn failure_count(&self) -> usize {
        self.stacks.lock().map_or(0, |guard| {
            guard
                .iter()
                .filter(|s| s.status == StackStatus::Failed)
                .count()
        })
    }

    /// Print the summary of all recorded stacks.
    pub fn print_summary(&self) {
        let stacks = match self.stacks.lock() {
            Ok(guard) => guard.clone(),
            Err(_) => return,
        };
        if stacks.is_empty() {
            return;
        }

        self.stage("Summary");

        let mut ok = 0u32;
        let mut failed = 0u32;

        for stack in &stacks {
            let (icon, color) = match stack.status {
                StackStatus::Ok => {
                    ok += 1;
                    ("✓", "\x1b[32m")
                }
                StackStatus::Failed => {
                    failed += 1;
                    ("✗", "\x1b[31m")
                }
            };

            let suffix = stack
                .message
                .as_ref()
                .map_or_else(String::new, |msg| format!(" ({msg})"));

            self.info(&format!("{color}{icon} {}{suffix}\x1b[0m", stack.name));
        }

        self.info(&format!(
            "{} stacks: \x1b[32m{ok} ok\x1b[0m, \x1b[31m{failed} failed\x1b[0m",
            ok + failed
        ));

        if let Some(path) = &self.log_file {
            self.info(&format!("\x1b[2mlog: {}\x1b[0m", path.display()));
        }
    }
}

impl Log for Logger {
    forward_log_methods!(stage, info, debug, warn, error);

    fn record_stack(&self, name: &str, status: StackStatus, message: Option<&str>) {
        self.record_stack(name, status, message);
    }
}

#[cfg(test)]
#[allow(clippy::expect_used, clippy::unwrap_used, clippy::indexing_slicing)]
mod tests {
    use super::*;
    use crate::logging::{enter_stack, isolated_logger};
    use std::fs;

    #[test]
    fn logger_new() {
        let (log, _tmp, _guard) = isolated_logger();
        assert!(log.stack_entries().is_empty());
    }

    #[test]
    fn record_stack_with_message() {
        let (log, _tmp, _guard) = isolated_logger();
        log.record_stack("its_networking", StackStatus::Ok, Some("27 resources"));
        let entries = log.stack_entries();
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].name, "its_networking");
        assert_eq!(entries[0].message, Some("27 resources".to_string()));
    }

    #[test]
    fn failure_count_counts_failed_stacks_only() {
        let (log, _tmp, _guard) = isolated_logger();
        assert_eq!(log.failure_count(), 0);
        log.record_stack("a", StackStatus::Ok, None);
        log.record_stack("b", StackStatus::Failed, Some("cycle"));
        log.record_stack("c", StackStatus::Ok, None);
        assert_eq!(log.failure_count(), 1);
    }

    #[test]
    fn log_trait_delegates_to_logger() {
        let (log, _tmp, _guard) = isolated_logger();
        let log_ref: &dyn Log = &log;
        log_ref.record_stack("via-trait", StackStatus::Ok, None);
        assert_eq!(log.stack_entries().len(), 1);
    }

    #[test]
    fn debug_always_written_to_file() {
        let (log, _tmp, _guard) = isolated_logger();
        let marker = format!("debug-marker-{}", std::process::id());
        log.debug(&marker);
        let contents = fs::read_to_string(log.log_path().expect("log path")).unwrap();
        assert!(contents.contains("[debug]"));
        assert!(contents.contains(&marker));
    }

    #[test]
    fn warn_and_error_are_tagged_in_file() {
        let (log, _tmp, _guard) = isolated_logger();
        log.warn("subnet overlaps");
        log.error("cycle detected");
        let contents = fs::read_to_string(log.log_path().expect("log path")).unwrap();
        assert!(contents.contains("[warn] subnet overlaps"));
        assert!(contents.contains("[error] cycle detected"));
    }

    #[test]
    fn stage_written_to_file_with_arrow() {
        let (log, _tmp, _guard) = isolated_logger();
        log.stage("Synthesizing");
        let contents = fs::read_to_string(log.log_path().expect("log path")).unwrap();
        assert!(contents.contains("==> Synthesizing"));
    }

    #[test]
    fn header_names_command() {
        let (log, _tmp, _guard) = isolated_logger();
        let contents = fs::read_to_string(log.log_path().expect("log path")).unwrap();
        let header = contents.lines().next().unwrap();
        assert!(header.starts_with("# azstack "));
        assert!(header.contains(" test started "));
    }

    #[test]
    fn events_in_stack_span_carry_stack_name() {
        let (log, _tmp, _guard) = isolated_logger();
        log.stage("Assembling its_networking");
        {
            let _stack = enter_stack("its_networking");
            log.debug("27 resources assembled");
            log.error("dangling dependency");
        }
        log.info("outside");
        let contents = fs::read_to_string(log.log_path().expect("log path")).unwrap();
        let line = |needle: &str| {
            contents
                .lines()
                .find(|l| l.contains(needle))
                .unwrap()
                .to_string()
        };
        assert!(!line("==> Assembling").contains("] its_networking"));
        assert!(line("27 resources").contains("] its_networking [debug] 27 resources assembled"));
        assert!(line("dangling").contains("] its_networking [error] dangling dependency"));
        assert!(line("outside").ends_with("] outside"));
    }

    #[test]
    fn summary_strips_colours_in_file() {
        let (log, _tmp, _guard) = isolated_logger();
        log.record_stack("its_azure_vd", StackStatus::Failed, Some("bad ref"));
        log.print_summary();
        let contents = fs::read_to_string(log.log_path().expect("log path")).unwrap();
        assert!(contents.contains("✗ its_azure_vd (bad ref)"));
        assert!(contents.contains("1 stacks: 0 ok, 1 failed"));
    }
}
