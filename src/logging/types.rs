//! Core logging types: stack entries, status, and the [`Log`] trait.

/// Per-stack result for summary reporting.
#[derive(Debug, Clone)]
pub struct StackEntry {
    /// Stack name.
    pub name: String,
    /// Final status of the stack.
    pub status: StackStatus,
    /// Optional detail message (resource count, output path or error).
    pub message: Option<String>,
}

/// Outcome of processing one stack.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StackStatus {
    /// The stack assembled and the command finished for it.
    Ok,
    /// Input resolution, assembly, validation or synthesis failed.
    Failed,
}

/// Abstraction over logging backends, so assembly helpers can log without
/// holding the concrete [`Logger`](super::logger::Logger).
pub trait Log: Send + Sync {
    /// Log a stage header (major section).
    fn stage(&self, msg: &str);
    /// Log an informational message.
    fn info(&self, msg: &str);
    /// Log a debug message (may be suppressed on console).
    fn debug(&self, msg: &str);
    /// Log a warning message.
    fn warn(&self, msg: &str);
    /// Log an error message.
    fn error(&self, msg: &str);
    /// Record a stack result for the summary.
    fn record_stack(&self, name: &str, status: StackStatus, message: Option<&str>);
}

#[cfg(test)]
#[allow(clippy::expect_used, clippy::unwrap_used, clippy::indexing_slicing)]
mod tests {
    use super::*;

    #[test]
    fn stack_status_equality() {
        assert_eq!(StackStatus::Ok, StackStatus::Ok);
        assert_ne!(StackStatus::Ok, StackStatus::Failed);
    }
}
