//! Resource kinds and their provider type names.
use std::fmt;

use serde::Serialize;

/// The type of infrastructure object a [`ResourceNode`](super::ResourceNode)
/// declares.
///
/// # Examples
///
/// ```
/// use azstack::resources::ResourceKind;
///
/// assert_eq!(ResourceKind::Subnet.resource_type(), "azurerm_subnet");
/// assert_eq!(ResourceKind::Subnet.to_string(), "Subnet");
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum ResourceKind {
    /// `azurerm_resource_group`
    ResourceGroup,
    /// `azurerm_virtual_network`
    VirtualNetwork,
    /// `azurerm_subnet`
    Subnet,
    /// `azurerm_network_security_group`
    NetworkSecurityGroup,
    /// `azurerm_network_security_rule`
    SecurityRule,
    /// `azurerm_public_ip`
    PublicIp,
    /// `azurerm_nat_gateway`
    NatGateway,
    /// `azurerm_nat_gateway_public_ip_association`
    NatGatewayAssociation,
    /// `azurerm_subnet_network_security_group_association`
    SubnetNsgAssociation,
    /// `azurerm_subnet_nat_gateway_association`
    SubnetNatGatewayAssociation,
    /// `azurerm_virtual_network_gateway`
    VirtualNetworkGateway,
    /// `azurerm_network_interface`
    NetworkInterface,
    /// `azurerm_windows_virtual_machine`
    VirtualMachine,
    /// `azurerm_virtual_desktop_workspace`
    Workspace,
    /// `azurerm_virtual_desktop_host_pool`
    HostPool,
    /// `azurerm_virtual_desktop_application_group`
    ApplicationGroup,
}

impl ResourceKind {
    /// Every kind, in declaration order.
    pub const ALL: [Self; 16] = [
        Self::ResourceGroup,
        Self::VirtualNetwork,
        Self::Subnet,
        Self::NetworkSecurityGroup,
        Self::SecurityRule,
        Self::PublicIp,
        Self::NatGateway,
        Self::NatGatewayAssociation,
        Self::SubnetNsgAssociation,
        Self::SubnetNatGatewayAssociation,
        Self::VirtualNetworkGateway,
        Self::NetworkInterface,
        Self::VirtualMachine,
        Self::Workspace,
        Self::HostPool,
        Self::ApplicationGroup,
    ];

    /// The provider's resource type name used in the synthesized document.
    #[must_use]
    pub const fn resource_type(self) -> &'static str {
        match self {
            Self::ResourceGroup => "azurerm_resource_group",
            Self::VirtualNetwork => "azurerm_virtual_network",
            Self::Subnet => "azurerm_subnet",
            Self::NetworkSecurityGroup => "azurerm_network_security_group",
            Self::SecurityRule => "azurerm_network_security_rule",
            Self::PublicIp => "azurerm_public_ip",
            Self::NatGateway => "azurerm_nat_gateway",
            Self::NatGatewayAssociation => "azurerm_nat_gateway_public_ip_association",
            Self::SubnetNsgAssociation => "azurerm_subnet_network_security_group_association",
            Self::SubnetNatGatewayAssociation => "azurerm_subnet_nat_gateway_association",
            Self::VirtualNetworkGateway => "azurerm_virtual_network_gateway",
            Self::NetworkInterface => "azurerm_network_interface",
            Self::VirtualMachine => "azurerm_windows_virtual_machine",
            Self::Workspace => "azurerm_virtual_desktop_workspace",
            Self::HostPool => "azurerm_virtual_desktop_host_pool",
            Self::ApplicationGroup => "azurerm_virtual_desktop_application_group",
        }
    }

    /// Stable display name (the variant name).
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::ResourceGroup => "ResourceGroup",
            Self::VirtualNetwork => "VirtualNetwork",
            Self::Subnet => "Subnet",
            Self::NetworkSecurityGroup => "NetworkSecurityGroup",
            Self::SecurityRule => "SecurityRule",
            Self::PublicIp => "PublicIp",
            Self::NatGateway => "NatGateway",
            Self::NatGatewayAssociation => "NatGatewayAssociation",
            Self::SubnetNsgAssociation => "SubnetNsgAssociation",
            Self::SubnetNatGatewayAssociation => "SubnetNatGatewayAssociation",
            Self::VirtualNetworkGateway => "VirtualNetworkGateway",
            Self::NetworkInterface => "NetworkInterface",
            Self::VirtualMachine => "VirtualMachine",
            Self::Workspace => "Workspace",
            Self::HostPool => "HostPool",
            Self::ApplicationGroup => "ApplicationGroup",
        }
    }
}

impl fmt::Display for ResourceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

#[cfg(test)]
#[allow(clippy::expect_used, clippy::unwrap_used, clippy::indexing_slicing)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn resource_types_are_unique() {
        let types: HashSet<&str> = ResourceKind::ALL.iter().map(|k| k.resource_type()).collect();
        assert_eq!(types.len(), ResourceKind::ALL.len());
    }

    #[test]
    fn resource_types_use_provider_prefix() {
        for kind in ResourceKind::ALL {
            assert!(
                kind.resource_type().starts_with("azurerm_"),
                "{kind} has unexpected type {}",
                kind.resource_type()
            );
        }
    }

    #[test]
    fn serializes_as_variant_name() {
        let json = serde_json::to_string(&ResourceKind::HostPool).unwrap();
        assert_eq!(json, "\"HostPool\"");
    }
}
