//! Command-line interface definition.
use std::path::PathBuf;

use clap::{Parser, Subcommand, ValueEnum};

use crate::blueprints::Blueprint;

/// Top-level CLI entry point.
#[derive(Parser, Debug)]
#[command(
    name = "azstack",
    about = "Assemble, validate and synthesize Azure infrastructure stacks",
    version
)]
pub struct Cli {
    /// Subcommand to run.
    #[command(subcommand)]
    pub command: Command,

    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Options shared by every subcommand.
    #[command(flatten)]
    pub global: GlobalOpts,
}

/// Options shared across all subcommands.
#[derive(Parser, Debug, Clone)]
pub struct GlobalOpts {
    /// Configuration file
    #[arg(short, long, global = true, default_value = crate::config::DEFAULT_CONFIG_FILE)]
    pub config: PathBuf,

    /// Use this tenant id instead of the configured tenant lookup
    #[arg(long, global = true, value_name = "GUID")]
    pub tenant_id: Option<String>,

    /// Which stacks to process
    #[arg(short, long, global = true, value_enum, default_value_t = StackSelection::All)]
    pub stack: StackSelection,
}

/// Stack selection for `--stack`.
#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum StackSelection {
    /// The hub networking stack
    Networking,
    /// The virtual desktop stack
    Desktop,
    /// Both stacks
    All,
}

impl StackSelection {
    /// The blueprints this selection covers, in assembly order.
    #[must_use]
    pub fn blueprints(self) -> Vec<Blueprint> {
        match self {
            Self::Networking => vec![Blueprint::Networking],
            Self::Desktop => vec![Blueprint::Desktop],
            Self::All => Blueprint::ALL.to_vec(),
        }
    }
}

/// Available subcommands.
#[derive(Subcommand, Debug)]
pub enum Command {
    /// Validate stacks and write their synthesized documents
    Synth(SynthOpts),
    /// Assemble and validate stacks without writing anything
    Validate,
    /// Print the creation order of each stack
    Order,
    /// Print version information
    Version,
}

impl Command {
    /// Name used for the per-command log file.
    #[must_use]
    pub const fn name(&self) -> &'static str {
        match self {
            Self::Synth(_) => "synth",
            Self::Validate => "validate",
            Self::Order => "order",
            Self::Version => "version",
        }
    }
}

/// Options for the `synth` subcommand.
#[derive(Parser, Debug, Clone)]
pub struct SynthOpts {
    /// Output directory
    #[arg(short, long, default_value = "out")]
    pub out: PathBuf,
}

#[cfg(test)]
#[allow(clippy::expect_used, clippy::unwrap_used, clippy::indexing_slicing)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn verify_cli() {
        Cli::command().debug_assert();
    }

    #[test]
    fn defaults() {
        let cli = Cli::parse_from(["azstack", "validate"]);
        assert_eq!(cli.global.config, PathBuf::from("azstack.toml"));
        assert_eq!(cli.global.stack, StackSelection::All);
        assert!(cli.global.tenant_id.is_none());
        assert!(!cli.verbose);
    }

    #[test]
    fn parse_synth_with_out() {
        let cli = Cli::parse_from(["azstack", "synth", "--out", "/tmp/stacks"]);
        assert!(
            matches!(&cli.command, Command::Synth(_)),
            "Expected Synth command"
        );
        if let Command::Synth(opts) = cli.command {
            assert_eq!(opts.out, PathBuf::from("/tmp/stacks"));
        }
    }

    #[test]
    fn synth_out_defaults_to_out() {
        let cli = Cli::parse_from(["azstack", "synth"]);
        assert!(matches!(cli.command, Command::Synth(ref o) if o.out == PathBuf::from("out")));
    }

    #[test]
    fn parse_stack_selection_after_subcommand() {
        let cli = Cli::parse_from(["azstack", "order", "--stack", "desktop"]);
        assert_eq!(cli.global.stack, StackSelection::Desktop);
        assert!(matches!(cli.command, Command::Order));
    }

    #[test]
    fn parse_config_short() {
        let cli = Cli::parse_from(["azstack", "-c", "prod.toml", "-v", "validate"]);
        assert_eq!(cli.global.config, PathBuf::from("prod.toml"));
        assert!(cli.verbose);
    }

    #[test]
    fn parse_tenant_override() {
        let cli = Cli::parse_from([
            "azstack",
            "--tenant-id",
            "72f988bf-86f1-41af-91ab-2d7cd011db47",
            "synth",
        ]);
        assert_eq!(
            cli.global.tenant_id.as_deref(),
            Some("72f988bf-86f1-41af-91ab-2d7cd011db47")
        );
    }

    #[test]
    fn unknown_stack_is_rejected() {
        assert!(Cli::try_parse_from(["azstack", "--stack", "storage", "validate"]).is_err());
    }

    #[test]
    fn selection_expands_to_blueprints() {
        assert_eq!(StackSelection::All.blueprints(), Blueprint::ALL.to_vec());
        assert_eq!(StackSelection::Networking.blueprints(), vec![Blueprint::Networking]);
    }

    #[test]
    fn command_names() {
        assert_eq!(Cli::parse_from(["azstack", "version"]).command.name(), "version");
        assert_eq!(Cli::parse_from(["azstack", "order"]).command.name(), "order");
    }
}
