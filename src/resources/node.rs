//! Resource nodes and their builder.
use indexmap::{IndexMap, IndexSet};

use super::{Reference, ResourceKind, Value, schema};
use crate::error::NodeError;

/// A typed, immutable configuration record for one infrastructure object.
///
/// Nodes are created through [`ResourceNode::builder`], which checks the
/// attributes against the kind's schema and infers dependencies from every
/// [`Reference`] found in them.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResourceNode {
    id: String,
    kind: ResourceKind,
    attributes: IndexMap<String, Value>,
    dependencies: IndexSet<String>,
}

impl ResourceNode {
    /// Start building a node of `kind` identified by `id`.
    ///
    /// # Examples
    ///
    /// ```
    /// use azstack::resources::{ResourceKind, ResourceNode};
    ///
    /// let rg = ResourceNode::builder(ResourceKind::ResourceGroup, "rg")
    ///     .attr("name", "its-networking-stack")
    ///     .attr("location", "westus2")
    ///     .build()
    ///     .unwrap();
    /// assert_eq!(rg.id(), "rg");
    /// assert!(rg.dependencies().is_empty());
    /// ```
    pub fn builder(kind: ResourceKind, id: impl Into<String>) -> NodeBuilder {
        NodeBuilder {
            id: id.into(),
            kind,
            attributes: IndexMap::new(),
            explicit: Vec::new(),
        }
    }

    /// Stack-unique identifier.
    #[must_use]
    pub fn id(&self) -> &str {
        &self.id
    }

    /// Kind of infrastructure object.
    #[must_use]
    pub const fn kind(&self) -> ResourceKind {
        self.kind
    }

    /// Attributes in insertion order.
    #[must_use]
    pub const fn attributes(&self) -> &IndexMap<String, Value> {
        &self.attributes
    }

    /// Ids this node must be created after, inferred ones first.
    #[must_use]
    pub const fn dependencies(&self) -> &IndexSet<String> {
        &self.dependencies
    }

    /// A reference to one of this node's output fields.
    #[must_use]
    pub fn output(&self, field: &str) -> Reference {
        Reference::new(self.kind, self.id.as_str(), field)
    }

    /// Every reference held in the attributes, in attribute order.
    #[must_use]
    pub fn references(&self) -> Vec<&Reference> {
        let mut out = Vec::new();
        for value in self.attributes.values() {
            value.collect_references(&mut out);
        }
        out
    }
}

/// Builder returned by [`ResourceNode::builder`].
#[derive(Debug, Clone)]
#[must_use]
pub struct NodeBuilder {
    id: String,
    kind: ResourceKind,
    attributes: IndexMap<String, Value>,
    explicit: Vec<String>,
}

impl NodeBuilder {
    /// Set an attribute. Setting the same name twice keeps the last value.
    pub fn attr(mut self, name: impl Into<String>, value: impl Into<Value>) -> Self {
        self.attributes.insert(name.into(), value.into());
        self
    }

    /// Set an attribute only when `value` is `Some`.
    pub fn attr_opt<V: Into<Value>>(self, name: impl Into<String>, value: Option<V>) -> Self {
        match value {
            Some(v) => self.attr(name, v),
            None => self,
        }
    }

    /// Add a dependency not expressed through any reference.
    pub fn depends_on(mut self, id: impl Into<String>) -> Self {
        self.explicit.push(id.into());
        self
    }

    /// Validate and produce the node.
    ///
    /// # Errors
    ///
    /// - [`NodeError::InvalidId`] if the id is empty or not an identifier.
    /// - [`NodeError::MissingRequiredAttribute`] / [`NodeError::InvalidAttributeType`]
    ///   if the attributes do not satisfy the kind's schema.
    pub fn build(self) -> Result<ResourceNode, NodeError> {
        check_id(&self.id)?;
        schema::check(self.kind, &self.id, &self.attributes)?;

        let mut dependencies = IndexSet::new();
        let mut refs = Vec::new();
        for value in self.attributes.values() {
            value.collect_references(&mut refs);
        }
        for r in refs {
            dependencies.insert(r.node.clone());
        }
        for id in self.explicit {
            check_id(&id)?;
            dependencies.insert(id);
        }

        Ok(ResourceNode {
            id: self.id,
            kind: self.kind,
            attributes: self.attributes,
            dependencies,
        })
    }
}

fn check_id(id: &str) -> Result<(), NodeError> {
    identifier_problem(id).map_or(Ok(()), |reason| {
        Err(NodeError::InvalidId {
            id: id.to_string(),
            reason: reason.to_string(),
        })
    })
}

/// Why `s` is not a plain identifier, or `None` if it is one.
///
/// Identifiers start with an ASCII letter or underscore and continue with
/// ASCII letters, digits, `-` and `_`. Node ids and stack names share the rule.
pub(crate) fn identifier_problem(s: &str) -> Option<&'static str> {
    let mut chars = s.chars();
    let Some(first) = chars.next() else {
        return Some("must not be empty");
    };
    if !(first.is_ascii_alphabetic() || first == '_') {
        return Some("must start with a letter or underscore");
    }
    if !chars.all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-') {
        return Some("may only contain ASCII letters, digits, '-' and '_'");
    }
    None
}
