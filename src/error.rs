//! Domain-specific error types for stack assembly and synthesis.
//!
//! This module provides a structured error hierarchy using [`thiserror`].
//! Internal modules return typed errors (e.g., [`NodeError`], [`StackError`])
//! while command handlers at the CLI boundary convert them to [`anyhow::Error`]
//! via the standard `?` operator.
//!
//! # Error hierarchy
//!
//! ```text
//! AzstackError
//! ├── Node(NodeError)     — malformed resource definitions
//! ├── Stack(StackError)   — graph structure, backend, synthesis sequencing
//! ├── Lookup(LookupError) — the external tenant lookup
//! ├── Config(ConfigError) — TOML loading, stack names, secrets
//! └── MissingInput        — a blueprint input was not resolved
//! ```
//!
//! Every variant is terminal for the current assembly attempt.

use thiserror::Error;

use crate::resources::ResourceKind;

/// Top-level error type for stack assembly.
///
/// Aggregates domain-specific sub-errors and is convertible to
/// [`anyhow::Error`] for use at CLI command boundaries.
#[derive(Error, Debug)]
pub enum AzstackError {
    /// A resource node could not be built.
    #[error("Resource error: {0}")]
    Node(#[from] NodeError),

    /// The stack graph or its sequencing is invalid.
    #[error("Stack error: {0}")]
    Stack(#[from] StackError),

    /// An external lookup did not succeed.
    #[error("Lookup error: {0}")]
    Lookup(#[from] LookupError),

    /// Configuration could not be loaded.
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// A blueprint was assembled without an input it needs.
    #[error("Missing input: {0}")]
    MissingInput(&'static str),
}

/// Errors raised while building a single resource node.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum NodeError {
    /// The node id is empty or not a valid identifier.
    #[error("invalid resource id '{id}': {reason}")]
    InvalidId {
        /// The rejected id.
        id: String,
        /// Why the id was rejected.
        reason: String,
    },

    /// A field required by the node's kind is absent.
    #[error("{kind} '{node}' is missing required attribute '{attribute}'")]
    MissingRequiredAttribute {
        /// Id of the node being built.
        node: String,
        /// Kind of the node being built.
        kind: ResourceKind,
        /// Attribute path, e.g. `ip_configuration[0].subnet_id`.
        attribute: String,
    },

    /// A supplied value does not have the shape the kind's schema expects.
    #[error("{kind} '{node}' attribute '{attribute}' must be {expected}")]
    InvalidAttributeType {
        /// Id of the node being built.
        node: String,
        /// Kind of the node being built.
        kind: ResourceKind,
        /// Attribute path, e.g. `address_prefixes[1]`.
        attribute: String,
        /// Human-readable description of the expected shape.
        expected: String,
    },
}

/// Structural and sequencing errors on a [`Stack`](crate::stack::Stack).
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum StackError {
    /// A node with the same id is already part of the stack.
    #[error("duplicate resource id '{0}'")]
    DuplicateId(String),

    /// A provider block with the same name is already part of the stack.
    #[error("duplicate provider '{0}'")]
    DuplicateProvider(String),

    /// A dependency does not resolve to a node of the stack.
    #[error("resource '{node}' depends on unknown resource '{dependency}'")]
    DanglingDependency {
        /// Id of the node declaring the dependency.
        node: String,
        /// The unresolved id.
        dependency: String,
    },

    /// A reference points at a node of a different kind than it declares.
    #[error("resource '{node}' expects '{dependency}' to be {expected}, found {actual}")]
    ReferenceKindMismatch {
        /// Id of the node holding the reference.
        node: String,
        /// Id of the referenced node.
        dependency: String,
        /// Kind declared by the reference.
        expected: ResourceKind,
        /// Kind of the node actually registered under that id.
        actual: ResourceKind,
    },

    /// The dependency relation contains a cycle.
    #[error("dependency cycle detected: {}", .0.join(" -> "))]
    CyclicDependency(Vec<String>),

    /// A backend binding was attached twice.
    #[error("stack '{0}' already has a backend attached")]
    BackendAlreadyAttached(String),

    /// Synthesis was attempted without a clean validation.
    #[error("stack '{stack}' cannot be synthesized: {reason}")]
    ValidationFailed {
        /// Name of the stack.
        stack: String,
        /// Why synthesis was refused.
        reason: String,
    },
}

/// Errors from the single external lookup (the client tenant id).
#[derive(Error, Debug)]
pub enum LookupError {
    /// The lookup did not produce a usable value.
    #[error("external lookup '{source_name}' failed: {reason}")]
    ExternalLookupFailed {
        /// Description of the lookup source (e.g. `azure-cli`).
        source_name: String,
        /// Human-readable reason for the failure.
        reason: String,
    },
}

/// Errors that arise from configuration loading.
#[derive(Error, Debug)]
pub enum ConfigError {
    /// The config file exists but could not be read.
    #[error("IO error reading config file {path}: {source}")]
    Io {
        /// Path to the file that could not be read.
        path: String,
        /// Underlying I/O error.
        source: std::io::Error,
    },

    /// The config file is not valid TOML for the expected schema.
    #[error("invalid TOML in {path}: {message}")]
    InvalidSyntax {
        /// Path to the offending file.
        path: String,
        /// Parser message.
        message: String,
    },

    /// A secret that must come from the environment is unset or empty.
    #[error("environment variable '{0}' is not set")]
    MissingSecret(String),

    /// A configured stack name cannot name a deployable unit or its
    /// output directory.
    #[error("invalid stack name '{name}': {reason}")]
    InvalidStackName {
        /// The offending name.
        name: String,
        /// Why the name was rejected.
        reason: String,
    },

    /// Two blueprints were configured with the same stack name.
    #[error("stack name '{0}' is used by more than one stack")]
    DuplicateStackName(String),
}

#[cfg(test)]
#[allow(clippy::expect_used)]
mod tests {
    use super::*;
    use std::io;

    // -----------------------------------------------------------------------
    // NodeError
    // -----------------------------------------------------------------------

    #[test]
    fn missing_required_attribute_display() {
        let e = NodeError::MissingRequiredAttribute {
            node: "its-client-subnet".to_string(),
            kind: ResourceKind::Subnet,
            attribute: "address_prefixes".to_string(),
        };
        assert_eq!(
            e.to_string(),
            "Subnet 'its-client-subnet' is missing required attribute 'address_prefixes'"
        );
    }

    #[test]
    fn invalid_attribute_type_display() {
        let e = NodeError::InvalidAttributeType {
            node: "its-vnet".to_string(),
            kind: ResourceKind::VirtualNetwork,
            attribute: "address_space[0]".to_string(),
            expected: "a CIDR block".to_string(),
        };
        assert_eq!(
            e.to_string(),
            "VirtualNetwork 'its-vnet' attribute 'address_space[0]' must be a CIDR block"
        );
    }

    #[test]
    fn invalid_id_display() {
        let e = NodeError::InvalidId {
            id: "9lives".to_string(),
            reason: "must start with a letter or underscore".to_string(),
        };
        assert!(e.to_string().contains("9lives"));
    }

    // -----------------------------------------------------------------------
    // StackError
    // -----------------------------------------------------------------------

    #[test]
    fn cyclic_dependency_display_joins_ids() {
        let e = StackError::CyclicDependency(vec!["a".to_string(), "b".to_string()]);
        assert_eq!(e.to_string(), "dependency cycle detected: a -> b");
    }

    #[test]
    fn dangling_dependency_display() {
        let e = StackError::DanglingDependency {
            node: "subnet".to_string(),
            dependency: "nonexistent-vnet".to_string(),
        };
        assert_eq!(
            e.to_string(),
            "resource 'subnet' depends on unknown resource 'nonexistent-vnet'"
        );
    }

    #[test]
    fn reference_kind_mismatch_display() {
        let e = StackError::ReferenceKindMismatch {
            node: "nic".to_string(),
            dependency: "vnet".to_string(),
            expected: ResourceKind::Subnet,
            actual: ResourceKind::VirtualNetwork,
        };
        assert_eq!(
            e.to_string(),
            "resource 'nic' expects 'vnet' to be Subnet, found VirtualNetwork"
        );
    }

    #[test]
    fn validation_failed_display() {
        let e = StackError::ValidationFailed {
            stack: "its_azure_vd".to_string(),
            reason: "validation has not been run".to_string(),
        };
        assert!(e.to_string().contains("its_azure_vd"));
        assert!(e.to_string().contains("has not been run"));
    }

    // -----------------------------------------------------------------------
    // LookupError / ConfigError
    // -----------------------------------------------------------------------

    #[test]
    fn external_lookup_failed_display() {
        let e = LookupError::ExternalLookupFailed {
            source_name: "azure-cli".to_string(),
            reason: "az not found on PATH".to_string(),
        };
        assert_eq!(
            e.to_string(),
            "external lookup 'azure-cli' failed: az not found on PATH"
        );
    }

    #[test]
    fn config_error_io_has_source() {
        use std::error::Error as StdError;
        let e = ConfigError::Io {
            path: "azstack.toml".to_string(),
            source: io::Error::new(io::ErrorKind::PermissionDenied, "permission denied"),
        };
        assert!(e.source().is_some());
        assert!(e.to_string().contains("azstack.toml"));
    }

    #[test]
    fn stack_name_errors_display() {
        let e = ConfigError::InvalidStackName {
            name: "../x".to_string(),
            reason: "must start with a letter or underscore".to_string(),
        };
        assert_eq!(
            e.to_string(),
            "invalid stack name '../x': must start with a letter or underscore"
        );
        let e = ConfigError::DuplicateStackName("its_networking".to_string());
        assert_eq!(
            e.to_string(),
            "stack name 'its_networking' is used by more than one stack"
        );
    }

    // -----------------------------------------------------------------------
    // AzstackError conversions
    // -----------------------------------------------------------------------

    #[test]
    fn azstack_error_from_stack_error() {
        let e: AzstackError = StackError::DuplicateId("rg".to_string()).into();
        assert!(e.to_string().contains("Stack error"));
        assert!(e.to_string().contains("rg"));
    }

    #[test]
    fn azstack_error_from_config_error() {
        let e: AzstackError = ConfigError::MissingSecret("X".to_string()).into();
        assert!(e.to_string().contains("Configuration error"));
    }

    fn assert_send_sync<T: Send + Sync>() {}

    #[test]
    fn all_error_types_are_send_sync() {
        assert_send_sync::<AzstackError>();
        assert_send_sync::<NodeError>();
        assert_send_sync::<StackError>();
        assert_send_sync::<LookupError>();
        assert_send_sync::<ConfigError>();
    }

    #[test]
    fn stack_error_converts_to_anyhow() {
        let e = StackError::BackendAlreadyAttached("s".to_string());
        let _anyhow_err: anyhow::Error = e.into();
    }
}
