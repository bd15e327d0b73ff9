//! Subcommand orchestration.
//!
//! Each subcommand loads the configuration through [`CommandSetup::init`],
//! then runs every selected stack through [`CommandSetup::for_each_stack`]
//! and reports with [`finish`].
pub mod order;
pub mod synth;
pub mod validate;
pub mod version;

use std::sync::Arc;

use anyhow::Result;

use crate::blueprints::{Blueprint, Inputs};
use crate::cli::GlobalOpts;
use crate::config::Config;
use crate::error::AzstackError;
use crate::exec::{Executor, SystemExecutor};
use crate::logging::{Log, StackStatus, enter_stack};
use crate::lookup::{self, StaticTenant, TenantLookup};
use crate::stack::Stack;

/// Shared state produced by the common command setup sequence.
#[derive(Debug)]
pub struct CommandSetup {
    /// Loaded configuration.
    pub config: Config,
    executor: Arc<dyn Executor>,
}

impl CommandSetup {
    /// Load the configuration named by `--config` and log its warnings.
    ///
    /// # Errors
    ///
    /// Returns an error if the configuration file cannot be read or parsed,
    /// or names its stacks unusably.
    pub fn init(global: &GlobalOpts, log: &dyn Log) -> Result<Self> {
        log.stage("Loading configuration");
        let config = Config::load(&global.config)?;
        log.debug(&format!("config: {}", global.config.display()));
        log.info(&format!("region: {}", config.region));

        let warnings = config.validate();
        if !warnings.is_empty() {
            log.warn(&format!(
                "found {} configuration warning(s):",
                warnings.len()
            ));
            for warning in &warnings {
                log.warn(&format!(
                    "  {} [{}]: {}",
                    warning.source, warning.item, warning.message
                ));
            }
        }

        Ok(Self::new(config, Arc::new(SystemExecutor)))
    }

    /// Build a setup from an already loaded configuration.
    #[must_use]
    pub fn new(config: Config, executor: Arc<dyn Executor>) -> Self {
        Self { config, executor }
    }

    /// Resolve the tenant id: the `--tenant-id` override if given, otherwise
    /// the configured lookup source.
    fn tenant_id(&self, global: &GlobalOpts, log: &dyn Log) -> Result<String, AzstackError> {
        let lookup: Box<dyn TenantLookup> = match &global.tenant_id {
            Some(id) => Box::new(StaticTenant::new(id.clone())),
            None => lookup::from_source(
                &self.config.networking.vpn.tenant,
                Arc::clone(&self.executor),
            ),
        };
        log.debug(&format!("tenant lookup: {}", lookup.describe()));
        let id = lookup::resolve(lookup.as_ref())?;
        log.info(&format!("tenant: {id}"));
        Ok(id)
    }

    /// Resolve the inputs `blueprint` needs and assemble its stack.
    ///
    /// # Errors
    ///
    /// Returns an [`AzstackError`] if an input cannot be resolved or the
    /// stack cannot be assembled.
    pub fn assemble(
        &self,
        blueprint: Blueprint,
        global: &GlobalOpts,
        log: &dyn Log,
    ) -> Result<Stack, AzstackError> {
        let inputs = match blueprint {
            Blueprint::Networking => Inputs {
                tenant_id: Some(self.tenant_id(global, log)?),
                ..Inputs::default()
            },
            Blueprint::Desktop => Inputs {
                admin_password: Some(self.config.admin_password()?),
                ..Inputs::default()
            },
        };
        let stack = blueprint.assemble(&self.config, &inputs)?;
        log.debug(&format!("{}: {} resources assembled", stack.name(), stack.len()));
        Ok(stack)
    }

    /// Assemble and validate every selected stack, hand each valid stack to
    /// `action`, and record the outcome per stack.
    ///
    /// A failing stack does not stop the remaining ones. `action` returns
    /// the summary message for its stack.
    pub fn for_each_stack(
        &self,
        global: &GlobalOpts,
        log: &dyn Log,
        mut action: impl FnMut(&Stack) -> Result<String>,
    ) {
        for blueprint in global.stack.blueprints() {
            let name = blueprint.stack_name(&self.config).to_string();
            log.stage(&format!("Assembling {name}"));
            let _stack = enter_stack(&name);
            let outcome = self
                .assemble(blueprint, global, log)
                .and_then(|mut stack| {
                    stack.validate()?;
                    Ok(stack)
                })
                .map_err(anyhow::Error::from)
                .and_then(|stack| action(&stack));
            match outcome {
                Ok(message) => log.record_stack(&name, StackStatus::Ok, Some(&message)),
                Err(e) => {
                    log.error(&format!("{name}: {e:#}"));
                    log.record_stack(&name, StackStatus::Failed, Some(&e.to_string()));
                }
            }
        }
    }
}

/// Print the summary and bail if any stack failed.
///
/// # Errors
///
/// Returns an error if one or more stacks recorded a failure.
pub fn finish(log: &crate::logging::Logger) -> Result<()> {
    log.print_summary();
    let count = log.failure_count();
    if count > 0 {
        anyhow::bail!("{count} stack(s) failed");
    }
    Ok(())
}
