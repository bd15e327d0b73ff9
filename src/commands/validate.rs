//! Command: assemble and validate stacks without writing output.
use anyhow::Result;

use crate::cli::GlobalOpts;
use crate::logging::Logger;

use super::CommandSetup;

/// Run the validate command.
///
/// # Errors
///
/// Returns an error if configuration loading fails or any stack is invalid.
pub fn run(global: &GlobalOpts, log: &Logger) -> Result<()> {
    let setup = CommandSetup::init(global, log)?;
    setup.for_each_stack(global, log, |stack| {
        let providers = stack.providers().count();
        log.debug(&format!(
            "{}: {providers} provider(s), backend {}",
            stack.name(),
            if stack.backend().is_some() { "attached" } else { "none" }
        ));
        Ok(format!("{} resources", stack.len()))
    });
    super::finish(log)
}
