//! Hub networking stack: segmented subnets, NAT egress and a point-to-site
//! VPN gateway authenticated against Azure AD.
use crate::config::Config;
use crate::error::AzstackError;
use crate::lookup::aad_urls;
use crate::resources::rules::{Direction, SecurityRuleSpec, remote_access_rules};
use crate::resources::{ResourceKind, ResourceNode, Value};
use crate::stack::{NodeRef, Provider, Stack};

/// Assemble the networking stack for the client tenant `tenant_id`.
///
/// The stack is returned unvalidated.
///
/// # Errors
///
/// Returns an [`AzstackError`] if a configured value is rejected by a node
/// schema or a node cannot be added.
pub fn assemble(config: &Config, tenant_id: &str) -> Result<Stack, AzstackError> {
    let net = &config.networking;
    let region = config.region.as_str();
    let mut stack = Stack::new(&net.stack_name);
    stack.add_provider(Provider::azurerm())?;

    let rg = stack.add_node(
        ResourceNode::builder(ResourceKind::ResourceGroup, "its-networking-stack")
            .attr("name", &net.resource_group)
            .attr("location", region)
            .build()?,
    )?;
    let rg_name = rg.output("name");

    let vnet = stack.add_node(
        ResourceNode::builder(ResourceKind::VirtualNetwork, "its-vnet")
            .attr("name", &net.vnet_name)
            .attr("location", region)
            .attr("resource_group_name", rg_name.clone())
            .attr("address_space", vec![net.address_space.as_str()])
            .build()?,
    )?;

    let mut subnet = |id: &str, name: &str, prefix: &str| -> Result<NodeRef, AzstackError> {
        Ok(stack.add_node(
            ResourceNode::builder(ResourceKind::Subnet, id)
                .attr("name", name)
                .attr("resource_group_name", rg_name.clone())
                .attr("virtual_network_name", vnet.output("name"))
                .attr("address_prefixes", vec![prefix])
                .build()?,
        )?)
    };
    let client_subnet = subnet("its-client-subnet", "its-client-subnet", &net.client_subnet)?;
    let server_subnet = subnet("its-server-subnet", "its-server-subnet", &net.server_subnet)?;
    let dmz_subnet = subnet("its-dmz-subnet", "its-dmz-subnet", &net.dmz_subnet)?;
    // The gateway subnet name is fixed by Azure.
    let gateway_subnet = subnet("its-vngw-subnet", "GatewaySubnet", &net.gateway_subnet)?;

    let mut nsg = |id: &str| -> Result<NodeRef, AzstackError> {
        Ok(stack.add_node(
            ResourceNode::builder(ResourceKind::NetworkSecurityGroup, id)
                .attr("name", id)
                .attr("location", region)
                .attr("resource_group_name", rg_name.clone())
                .build()?,
        )?)
    };
    let client_nsg = nsg("its-client-nsg")?;
    let server_nsg = nsg("its-server-nsg")?;
    let dmz_nsg = nsg("its-dmz-nsg")?;

    let vpn_pool = net.vpn.client_address_space.as_str();
    let [client_rdp, client_ssh] =
        remote_access_rules("Vngw", vpn_pool, &net.client_subnet, 100);
    let [server_rdp, server_ssh] =
        remote_access_rules("Vngw", vpn_pool, &net.server_subnet, 100);
    let rules = [
        ("its-client-vngw-rdp-inbound", client_rdp, &client_nsg),
        ("its-client-vngw-ssh-inbound", client_ssh, &client_nsg),
        (
            "its-client-server-any-inbound",
            SecurityRuleSpec::allow_all_from(
                "AllowServerAnyInbound",
                120,
                net.server_subnet.as_str(),
                net.client_subnet.as_str(),
            ),
            &client_nsg,
        ),
        ("its-server-vngw-rdp-inbound", server_rdp, &server_nsg),
        ("its-server-vngw-ssh-inbound", server_ssh, &server_nsg),
        (
            "its-server-client-any-inbound",
            SecurityRuleSpec::allow_all_from(
                "AllowClientAnyInbound",
                120,
                net.client_subnet.as_str(),
                net.server_subnet.as_str(),
            ),
            &server_nsg,
        ),
        (
            "its-dmz-deny-all-inbound",
            SecurityRuleSpec::deny_all("DenyAllInbound", 400, Direction::Inbound),
            &dmz_nsg,
        ),
        (
            "its-dmz-deny-all-outbound",
            SecurityRuleSpec::deny_all("DenyAllOutbound", 410, Direction::Outbound),
            &dmz_nsg,
        ),
    ];
    let mut gateway_prerequisites = Vec::new();
    for (id, rule, group) in rules {
        let node = rule.into_node(id, rg_name.clone(), group.output("name"))?;
        gateway_prerequisites.push(stack.add_node(node)?);
    }

    let natgw_ip = stack.add_node(
        ResourceNode::builder(ResourceKind::PublicIp, "its-natgw-public-ip")
            .attr("name", "its-natgw-public-ip")
            .attr("resource_group_name", rg_name.clone())
            .attr("location", region)
            .attr("allocation_method", "Static")
            .attr("sku", "Standard")
            .attr("zones", vec!["1"])
            .build()?,
    )?;

    // The NAT gateway does not reference its address; the association does.
    let natgw = stack.add_node(
        ResourceNode::builder(ResourceKind::NatGateway, "its-natgw")
            .attr("name", "its-natgw")
            .attr("resource_group_name", rg_name.clone())
            .attr("location", region)
            .attr("sku_name", "Standard")
            .attr("idle_timeout_in_minutes", 10)
            .attr("zones", vec!["1"])
            .depends_on(natgw_ip.id())
            .build()?,
    )?;

    let natgw_ip_association = stack.add_node(
        ResourceNode::builder(
            ResourceKind::NatGatewayAssociation,
            "its-natgw-public-ip-association",
        )
        .attr("nat_gateway_id", natgw.output("id"))
        .attr("public_ip_address_id", natgw_ip.output("id"))
        .build()?,
    )?;
    gateway_prerequisites.push(natgw_ip_association.clone());

    for (id, subnet, group) in [
        ("its-client-nsg-association", &client_subnet, &client_nsg),
        ("its-server-nsg-association", &server_subnet, &server_nsg),
        ("its-dmz-nsg-association", &dmz_subnet, &dmz_nsg),
    ] {
        gateway_prerequisites.push(stack.add_node(
            ResourceNode::builder(ResourceKind::SubnetNsgAssociation, id)
                .attr("subnet_id", subnet.output("id"))
                .attr("network_security_group_id", group.output("id"))
                .build()?,
        )?);
    }

    // Egress through the NAT gateway only once its address is attached.
    for (id, subnet) in [
        ("its-client-natgw-association", &client_subnet),
        ("its-server-natgw-association", &server_subnet),
    ] {
        gateway_prerequisites.push(stack.add_node(
            ResourceNode::builder(ResourceKind::SubnetNatGatewayAssociation, id)
                .attr("subnet_id", subnet.output("id"))
                .attr("nat_gateway_id", natgw.output("id"))
                .depends_on(natgw_ip_association.id())
                .build()?,
        )?);
    }

    let vngw_ip = stack.add_node(
        ResourceNode::builder(ResourceKind::PublicIp, "its-vngw-public-ip")
            .attr("name", "its-vngw-public-ip")
            .attr("location", region)
            .attr("allocation_method", "Dynamic")
            .attr("resource_group_name", rg_name.clone())
            .build()?,
    )?;

    let aad = aad_urls(tenant_id);
    let mut gateway = ResourceNode::builder(ResourceKind::VirtualNetworkGateway, "its-vngw")
        .attr("name", "its-vngw")
        .attr("resource_group_name", rg_name)
        .attr("location", region)
        .attr("type", "Vpn")
        .attr("sku", &net.vpn.gateway_sku)
        .attr("vpn_type", "RouteBased")
        .attr(
            "ip_configuration",
            vec![Value::record([
                ("name", Value::from("vngw-config")),
                ("public_ip_address_id", vngw_ip.output("id").into()),
                ("private_ip_address_allocation", "Dynamic".into()),
                ("subnet_id", gateway_subnet.output("id").into()),
            ])],
        )
        .attr(
            "vpn_client_configuration",
            Value::record([
                ("address_space", vec![vpn_pool].into()),
                ("vpn_client_protocols", net.vpn.protocols.clone().into()),
                ("aad_tenant", aad.authority.into()),
                ("aad_audience", net.vpn.aad_audience.as_str().into()),
                ("aad_issuer", aad.issuer.into()),
            ]),
        );
    for prerequisite in &gateway_prerequisites {
        gateway = gateway.depends_on(prerequisite.id());
    }
    stack.add_node(gateway.build()?)?;

    Ok(stack)
}

#[cfg(test)]
#[allow(
    clippy::expect_used,
    clippy::unwrap_used,
    clippy::indexing_slicing,
    clippy::panic
)]
mod tests {
    use super::*;
    use crate::error::NodeError;

    const TENANT: &str = "72f988bf-86f1-41af-91ab-2d7cd011db47";

    fn stack() -> Stack {
        assemble(&Config::default(), TENANT).unwrap()
    }

    #[test]
    fn default_stack_validates() {
        let mut s = stack();
        s.validate().unwrap();
        assert_eq!(s.name(), "its_networking");
        assert_eq!(s.len(), 27);
    }

    #[test]
    fn resource_group_comes_first_and_gateway_last() {
        let s = stack();
        let order: Vec<_> = s.topological_order().collect();
        assert_eq!(order.first(), Some(&"its-networking-stack"));
        assert_eq!(order.last(), Some(&"its-vngw"));
        assert_eq!(order.len(), s.len());
    }

    #[test]
    fn gateway_waits_for_every_rule_and_association() {
        let s = stack();
        let deps = s.node("its-vngw").unwrap().dependencies();
        for id in [
            "its-vngw-public-ip",
            "its-vngw-subnet",
            "its-client-vngw-rdp-inbound",
            "its-dmz-deny-all-outbound",
            "its-dmz-nsg-association",
            "its-server-natgw-association",
            "its-natgw-public-ip-association",
        ] {
            assert!(deps.contains(id), "gateway does not depend on {id}");
        }
    }

    #[test]
    fn vpn_client_configuration_uses_tenant_urls() {
        let s = stack();
        let attrs = s.node("its-vngw").unwrap().attributes();
        let Value::Record(vpn) = &attrs["vpn_client_configuration"] else {
            panic!("vpn_client_configuration is not a record");
        };
        assert_eq!(
            vpn["aad_tenant"],
            Value::from(format!("https://login.microsoftonline.com/{TENANT}"))
        );
        assert_eq!(
            vpn["aad_issuer"],
            Value::from(format!("https://sts.windows.net/{TENANT}/"))
        );
        assert_eq!(vpn["vpn_client_protocols"], Value::from(vec!["OpenVPN"]));
    }

    #[test]
    fn subnets_reference_the_virtual_network() {
        let s = stack();
        for id in ["its-client-subnet", "its-server-subnet", "its-dmz-subnet", "its-vngw-subnet"] {
            assert!(s.node(id).unwrap().dependencies().contains("its-vnet"));
        }
        assert_eq!(
            s.node("its-vngw-subnet").unwrap().attributes()["name"],
            Value::from("GatewaySubnet")
        );
    }

    #[test]
    fn subnet_rules_target_their_subnet() {
        let s = stack();
        let rule = s.node("its-server-client-any-inbound").unwrap().attributes();
        assert_eq!(rule["source_address_prefix"], Value::from("10.0.2.0/24"));
        assert_eq!(rule["destination_address_prefix"], Value::from("10.0.1.0/24"));
        assert_eq!(rule["priority"], Value::Integer(120));
    }

    #[test]
    fn malformed_subnet_prefix_is_rejected() {
        let mut config = Config::default();
        config.networking.dmz_subnet = "10.0.0.0".to_string();
        let err = assemble(&config, TENANT).unwrap_err();
        assert!(matches!(
            err,
            AzstackError::Node(NodeError::InvalidAttributeType { ref node, .. }) if node == "its-dmz-subnet"
        ));
    }

    #[test]
    fn backend_is_not_attached_by_assembly() {
        assert!(stack().backend().is_none());
    }
}
