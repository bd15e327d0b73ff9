//! Command: validate stacks and write their synthesized documents.
use anyhow::Result;

use crate::cli::{GlobalOpts, SynthOpts};
use crate::logging::Logger;
use crate::stack::synth::Manifest;

use super::CommandSetup;

/// Run the synth command.
///
/// Every selected stack that validates is written to
/// `<out>/stacks/<name>/stack.json`; `<out>/manifest.json` lists the stacks
/// written by this run and is rewritten even when none were.
///
/// # Errors
///
/// Returns an error if configuration loading fails, the manifest cannot be
/// written, or any stack failed.
pub fn run(global: &GlobalOpts, opts: &SynthOpts, log: &Logger) -> Result<()> {
    log.info(&format!("azstack {}", crate::version()));
    let setup = CommandSetup::init(global, log)?;

    let mut written = Vec::new();
    setup.for_each_stack(global, log, |stack| {
        let synthesized = stack.synthesize()?;
        let path = synthesized.write_to(&opts.out)?;
        log.info(&format!("wrote {}", path.display()));
        let message = format!("{} resources", synthesized.resources.len());
        written.push(synthesized);
        Ok(message)
    });

    let path = Manifest::for_stacks(&written).write_to(&opts.out)?;
    log.debug(&format!(
        "manifest: {} ({} stacks)",
        path.display(),
        written.len()
    ));

    super::finish(log)
}
