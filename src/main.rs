//! azstack command-line entry point.
use anyhow::Result;
use clap::Parser;

use azstack::{cli, commands, logging};

fn main() -> Result<()> {
    let _ = enable_ansi_support::enable_ansi_support();
    let args = cli::Cli::parse();

    if matches!(args.command, cli::Command::Version) {
        commands::version::run();
        return Ok(());
    }

    let command = args.command.name();
    logging::init_subscriber(args.verbose, command);
    let log = logging::Logger::new(command);

    match &args.command {
        cli::Command::Synth(opts) => commands::synth::run(&args.global, opts, &log),
        cli::Command::Validate => commands::validate::run(&args.global, &log),
        cli::Command::Order => {
            commands::order::run(&args.global, &log, &mut std::io::stdout().lock())
        }
        cli::Command::Version => Ok(()),
    }
}
