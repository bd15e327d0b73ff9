//! Network security rule factory.
//!
//! Stacks declare their rules as [`SecurityRuleSpec`] values and turn them
//! into [`ResourceNode`]s with [`SecurityRuleSpec::into_node`], so the shape
//! of an "allow RDP from the VPN range" rule is written once.
use std::fmt;

use super::{Reference, ResourceKind, ResourceNode, Value};
use crate::error::NodeError;

/// Rule direction.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    /// Traffic entering the subnet.
    Inbound,
    /// Traffic leaving the subnet.
    Outbound,
}

/// Rule verdict.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Access {
    /// Permit matching traffic.
    Allow,
    /// Drop matching traffic.
    Deny,
}

/// Matched protocol.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Protocol {
    /// TCP only.
    Tcp,
    /// Any protocol.
    Any,
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Inbound => "Inbound",
            Self::Outbound => "Outbound",
        })
    }
}

impl fmt::Display for Access {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Allow => "Allow",
            Self::Deny => "Deny",
        })
    }
}

impl fmt::Display for Protocol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Tcp => "Tcp",
            Self::Any => "*",
        })
    }
}

/// One security rule, independent of the group it is attached to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SecurityRuleSpec {
    /// Rule name shown by the provider.
    pub name: String,
    /// Evaluation priority, 100 to 4096; lower wins.
    pub priority: u16,
    /// Direction.
    pub direction: Direction,
    /// Verdict.
    pub access: Access,
    /// Protocol.
    pub protocol: Protocol,
    /// Source port or range.
    pub source_port_range: String,
    /// Destination port or range.
    pub destination_port_range: String,
    /// Source prefix, tag or `*`.
    pub source_address_prefix: String,
    /// Destination prefix, tag or `*`.
    pub destination_address_prefix: String,
}

impl SecurityRuleSpec {
    /// Allow inbound TCP to `port` from `source` towards `destination`.
    #[must_use]
    pub fn allow_tcp_inbound(
        name: impl Into<String>,
        priority: u16,
        port: u16,
        source: impl Into<String>,
        destination: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            priority,
            direction: Direction::Inbound,
            access: Access::Allow,
            protocol: Protocol::Tcp,
            source_port_range: "*".to_string(),
            destination_port_range: port.to_string(),
            source_address_prefix: source.into(),
            destination_address_prefix: destination.into(),
        }
    }

    /// Allow any inbound traffic from `source` towards `destination`.
    #[must_use]
    pub fn allow_all_from(
        name: impl Into<String>,
        priority: u16,
        source: impl Into<String>,
        destination: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            priority,
            direction: Direction::Inbound,
            access: Access::Allow,
            protocol: Protocol::Any,
            source_port_range: "*".to_string(),
            destination_port_range: "*".to_string(),
            source_address_prefix: source.into(),
            destination_address_prefix: destination.into(),
        }
    }

    /// Deny everything in `direction`.
    #[must_use]
    pub fn deny_all(name: impl Into<String>, priority: u16, direction: Direction) -> Self {
        Self {
            name: name.into(),
            priority,
            direction,
            access: Access::Deny,
            protocol: Protocol::Any,
            source_port_range: "*".to_string(),
            destination_port_range: "*".to_string(),
            source_address_prefix: "*".to_string(),
            destination_address_prefix: "*".to_string(),
        }
    }

    /// Build the security rule node attached to `nsg`.
    ///
    /// # Errors
    ///
    /// Returns a [`NodeError`] if the id is invalid or a field (priority,
    /// prefix, port range) falls outside what the schema accepts.
    pub fn into_node(
        self,
        id: impl Into<String>,
        resource_group: impl Into<Value>,
        nsg: Reference,
    ) -> Result<ResourceNode, NodeError> {
        ResourceNode::builder(ResourceKind::SecurityRule, id)
            .attr("name", self.name)
            .attr("priority", self.priority)
            .attr("direction", self.direction.to_string())
            .attr("access", self.access.to_string())
            .attr("protocol", self.protocol.to_string())
            .attr("source_port_range", self.source_port_range)
            .attr("destination_port_range", self.destination_port_range)
            .attr("source_address_prefix", self.source_address_prefix)
            .attr("destination_address_prefix", self.destination_address_prefix)
            .attr("resource_group_name", resource_group)
            .attr("network_security_group_name", nsg)
            .build()
    }
}

/// Paired RDP (3389) and SSH (22) inbound rules from `source` to
/// `destination`, at `priority` and `priority + 10`, named
/// `Allow<label>RdpInbound` and `Allow<label>SshInbound`.
#[must_use]
pub fn remote_access_rules(
    label: &str,
    source: &str,
    destination: &str,
    priority: u16,
) -> [SecurityRuleSpec; 2] {
    [
        SecurityRuleSpec::allow_tcp_inbound(
            format!("Allow{label}RdpInbound"),
            priority,
            3389,
            source,
            destination,
        ),
        SecurityRuleSpec::allow_tcp_inbound(
            format!("Allow{label}SshInbound"),
            priority.saturating_add(10),
            22,
            source,
            destination,
        ),
    ]
}
