//! Stack assembly: an ordered collection of resource nodes forming a DAG.
//!
//! A [`Stack`] is the unit handed to the provisioning engine. Nodes are added
//! bottom-up with [`Stack::add_node`], a [`BackendBinding`] is attached once,
//! [`Stack::validate`] checks the dependency graph and records the outcome,
//! and [`Stack::synthesize`] produces the document only after a clean
//! validation.
mod backend;
pub mod graph;
pub mod synth;

pub use backend::BackendBinding;
pub use graph::TopologicalOrder;
pub use synth::{SynthesizedResource, SynthesizedStack};

use indexmap::IndexMap;

use crate::error::StackError;
use crate::resources::{Reference, ResourceKind, ResourceNode, Value};

/// A provider configuration block carried by a stack.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Provider {
    name: String,
    config: IndexMap<String, Value>,
}

impl Provider {
    /// A provider named `name` with no configuration.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            config: IndexMap::new(),
        }
    }

    /// The `azurerm` provider with an empty `features` block.
    #[must_use]
    pub fn azurerm() -> Self {
        Self::new("azurerm").with("features", Value::empty_record())
    }

    /// Add a configuration entry.
    #[must_use]
    pub fn with(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.config.insert(key.into(), value.into());
        self
    }

    /// Provider name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Configuration entries in insertion order.
    #[must_use]
    pub const fn config(&self) -> &IndexMap<String, Value> {
        &self.config
    }
}

/// Outcome of the most recent [`Stack::validate`] call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ValidationStatus {
    /// Never validated, or modified since.
    NotRun,
    /// The last validation succeeded.
    Passed,
    /// The last validation failed with this message.
    Failed(String),
}

/// Handle to a node already added to a stack, used to reference its outputs
/// from nodes added later.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NodeRef {
    id: String,
    kind: ResourceKind,
}

impl NodeRef {
    /// Id of the node.
    #[must_use]
    pub fn id(&self) -> &str {
        &self.id
    }

    /// Kind of the node.
    #[must_use]
    pub const fn kind(&self) -> ResourceKind {
        self.kind
    }

    /// Reference to the node's `field` output.
    #[must_use]
    pub fn output(&self, field: &str) -> Reference {
        Reference::new(self.kind, self.id.as_str(), field)
    }
}

/// One deployable unit of resource nodes.
#[derive(Debug, Clone)]
pub struct Stack {
    name: String,
    providers: IndexMap<String, Provider>,
    nodes: IndexMap<String, ResourceNode>,
    backend: Option<BackendBinding>,
    validation: ValidationStatus,
}

impl Stack {
    /// An empty stack named `name`.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            providers: IndexMap::new(),
            nodes: IndexMap::new(),
            backend: None,
            validation: ValidationStatus::NotRun,
        }
    }

    /// Stack name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Number of nodes.
    #[must_use]
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    /// `true` if the stack has no nodes.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Nodes in insertion order.
    pub fn nodes(&self) -> impl Iterator<Item = &ResourceNode> {
        self.nodes.values()
    }

    /// Look up a node by id.
    #[must_use]
    pub fn node(&self, id: &str) -> Option<&ResourceNode> {
        self.nodes.get(id)
    }

    /// Providers in insertion order.
    pub fn providers(&self) -> impl Iterator<Item = &Provider> {
        self.providers.values()
    }

    /// The attached backend, if any.
    #[must_use]
    pub const fn backend(&self) -> Option<&BackendBinding> {
        self.backend.as_ref()
    }

    /// Outcome of the most recent validation.
    #[must_use]
    pub const fn validation(&self) -> &ValidationStatus {
        &self.validation
    }

    /// Append `node`.
    ///
    /// Resets the validation status to [`ValidationStatus::NotRun`].
    ///
    /// # Errors
    ///
    /// Returns [`StackError::DuplicateId`] if a node with the same id is
    /// already present; the stack is left unchanged.
    pub fn add_node(&mut self, node: ResourceNode) -> Result<NodeRef, StackError> {
        if self.nodes.contains_key(node.id()) {
            return Err(StackError::DuplicateId(node.id().to_string()));
        }
        let handle = NodeRef {
            id: node.id().to_string(),
            kind: node.kind(),
        };
        self.nodes.insert(handle.id.clone(), node);
        self.validation = ValidationStatus::NotRun;
        Ok(handle)
    }

    /// Add a provider block.
    ///
    /// # Errors
    ///
    /// Returns [`StackError::DuplicateProvider`] if a provider with the same
    /// name is already present.
    pub fn add_provider(&mut self, provider: Provider) -> Result<(), StackError> {
        if self.providers.contains_key(provider.name()) {
            return Err(StackError::DuplicateProvider(provider.name().to_string()));
        }
        self.providers.insert(provider.name().to_string(), provider);
        Ok(())
    }

    /// Attach the remote state backend.
    ///
    /// # Errors
    ///
    /// Returns [`StackError::BackendAlreadyAttached`] if a binding is already
    /// present; the original binding is kept.
    pub fn attach_backend(&mut self, binding: BackendBinding) -> Result<(), StackError> {
        if self.backend.is_some() {
            return Err(StackError::BackendAlreadyAttached(self.name.clone()));
        }
        self.backend = Some(binding);
        Ok(())
    }

    /// Check the dependency graph and record the outcome.
    ///
    /// Checks run in this order, each over nodes in insertion order:
    /// unresolved dependencies, references whose declared kind differs from
    /// the referenced node's kind, then cycles.
    ///
    /// # Errors
    ///
    /// - [`StackError::DanglingDependency`] for the first unresolved dependency.
    /// - [`StackError::ReferenceKindMismatch`] for the first mistyped reference.
    /// - [`StackError::CyclicDependency`] with the ids along the first cycle found.
    pub fn validate(&mut self) -> Result<(), StackError> {
        let result = self.check_graph();
        self.validation = match &result {
            Ok(()) => ValidationStatus::Passed,
            Err(e) => ValidationStatus::Failed(e.to_string()),
        };
        result
    }

    fn check_graph(&self) -> Result<(), StackError> {
        for node in self.nodes.values() {
            if let Some(missing) = node
                .dependencies()
                .iter()
                .find(|d| !self.nodes.contains_key(d.as_str()))
            {
                return Err(StackError::DanglingDependency {
                    node: node.id().to_string(),
                    dependency: missing.clone(),
                });
            }
        }

        for node in self.nodes.values() {
            for r in node.references() {
                if let Some(target) = self.nodes.get(&r.node)
                    && target.kind() != r.kind
                {
                    return Err(StackError::ReferenceKindMismatch {
                        node: node.id().to_string(),
                        dependency: r.node.clone(),
                        expected: r.kind,
                        actual: target.kind(),
                    });
                }
            }
        }

        match graph::find_cycle(&self.nodes) {
            Some(cycle) => Err(StackError::CyclicDependency(cycle)),
            None => Ok(()),
        }
    }

    /// Node ids in a dependency-respecting order.
    ///
    /// The iterator is lazy and deterministic: among ready nodes, the one
    /// inserted first comes first. Unresolved dependencies are ignored; on a
    /// cyclic graph the iteration ends before every node is yielded.
    ///
    /// # Examples
    ///
    /// ```
    /// use azstack::resources::{ResourceKind, ResourceNode};
    /// use azstack::stack::Stack;
    ///
    /// let mut stack = Stack::new("demo");
    /// let rg = stack
    ///     .add_node(
    ///         ResourceNode::builder(ResourceKind::ResourceGroup, "rg")
    ///             .attr("name", "demo")
    ///             .attr("location", "westus2")
    ///             .build()
    ///             .unwrap(),
    ///     )
    ///     .unwrap();
    /// stack
    ///     .add_node(
    ///         ResourceNode::builder(ResourceKind::VirtualNetwork, "vnet")
    ///             .attr("name", "demo-vnet")
    ///             .attr("location", "westus2")
    ///             .attr("resource_group_name", rg.output("name"))
    ///             .attr("address_space", vec!["10.0.0.0/16"])
    ///             .build()
    ///             .unwrap(),
    ///     )
    ///     .unwrap();
    /// assert_eq!(stack.topological_order().collect::<Vec<_>>(), ["rg", "vnet"]);
    /// ```
    pub fn topological_order(&self) -> TopologicalOrder<'_> {
        TopologicalOrder::new(&self.nodes)
    }

    /// Produce the document for the provisioning engine.
    ///
    /// Resources appear in [`Stack::topological_order`].
    ///
    /// # Errors
    ///
    /// Returns [`StackError::ValidationFailed`] unless the most recent
    /// [`Stack::validate`] call passed and no node was added since.
    pub fn synthesize(&self) -> Result<SynthesizedStack, StackError> {
        let reason = match &self.validation {
            ValidationStatus::Passed => None,
            ValidationStatus::NotRun => Some("validation has not been run".to_string()),
            ValidationStatus::Failed(reason) => Some(format!("validation failed: {reason}")),
        };
        if let Some(reason) = reason {
            return Err(StackError::ValidationFailed {
                stack: self.name.clone(),
                reason,
            });
        }

        let resources = self
            .topological_order()
            .filter_map(|id| self.nodes.get(id))
            .map(|node| (node.id().to_string(), SynthesizedResource::from_node(node)))
            .collect();

        Ok(SynthesizedStack {
            stack: self.name.clone(),
            provider: self
                .providers
                .values()
                .map(|p| (p.name().to_string(), p.config().clone()))
                .collect(),
            backend: self.backend.clone().map(synth::BackendDocument::from),
            resources,
        })
    }
}
