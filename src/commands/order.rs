//! Command: print the creation order of each stack.
use std::io::Write;

use anyhow::{Context as _, Result};

use crate::cli::GlobalOpts;
use crate::logging::Logger;

use super::CommandSetup;

/// Run the order command, writing one block per valid stack to `out`:
/// the stack name followed by one `<position> <id> <type>` line per
/// resource.
///
/// # Errors
///
/// Returns an error if configuration loading fails, `out` cannot be written,
/// or any stack is invalid.
pub fn run(global: &GlobalOpts, log: &Logger, out: &mut dyn Write) -> Result<()> {
    let setup = CommandSetup::init(global, log)?;
    setup.for_each_stack(global, log, |stack| {
        writeln!(out, "{}", stack.name()).context("writing order")?;
        for (position, id) in stack.topological_order().enumerate() {
            let resource_type = stack
                .node(id)
                .map_or("", |node| node.kind().resource_type());
            writeln!(out, "{:>4} {id} {resource_type}", position + 1)
                .context("writing order")?;
        }
        Ok(format!("{} resources", stack.len()))
    });
    super::finish(log)
}
