//! Typed Azure stack assembly.
//!
//! Builds two infrastructure stacks (hub networking with a point-to-site VPN
//! gateway, and a virtual desktop host) as graphs of typed resource nodes,
//! validates them, and synthesizes one JSON document per stack for an
//! external provisioning engine.
//!
//! The public API is organised into layers:
//!
//! - **[`resources`]**: resource kinds, attribute values and the node builder
//! - **[`stack`]**: the dependency graph, validation, ordering and synthesis
//! - **[`blueprints`]**: the two concrete stacks assembled from [`config`]
//! - **[`commands`]**: top-level subcommand orchestration (`synth`, `validate`, `order`)
#![deny(clippy::or_fun_call)]
#![deny(clippy::bool_to_int_with_if)]

pub mod blueprints;
pub mod cli;
pub mod commands;
pub mod config;
pub mod error;
pub mod exec;
pub mod logging;
pub mod lookup;
pub mod resources;
pub mod stack;

/// Version string: `AZSTACK_VERSION` at build time (git describe or release
/// tag), else the crate version.
#[must_use]
pub fn version() -> &'static str {
    option_env!("AZSTACK_VERSION").unwrap_or(env!("CARGO_PKG_VERSION"))
}
