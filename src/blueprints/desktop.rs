//! Virtual desktop stack: a single Windows session host on its own network,
//! published through a personal host pool.
use crate::config::Config;
use crate::error::AzstackError;
use crate::resources::{ResourceKind, ResourceNode, SecurityRuleSpec, Value};
use crate::stack::{Provider, Stack};

/// Assemble the virtual desktop stack. `admin_password` is placed on the VM
/// node and never logged.
///
/// The stack is returned unvalidated.
///
/// # Errors
///
/// Returns an [`AzstackError`] if a configured value is rejected by a node
/// schema or a node cannot be added.
pub fn assemble(config: &Config, admin_password: &str) -> Result<Stack, AzstackError> {
    let desk = &config.desktop;
    let region = config.region.as_str();
    let mut stack = Stack::new(&desk.stack_name);
    stack.add_provider(Provider::azurerm())?;

    let rg = stack.add_node(
        ResourceNode::builder(ResourceKind::ResourceGroup, "azure-virtual-desktop")
            .attr("name", &desk.resource_group)
            .attr("location", region)
            .build()?,
    )?;
    let rg_name = rg.output("name");

    let vnet = stack.add_node(
        ResourceNode::builder(ResourceKind::VirtualNetwork, "avd-vnet-id")
            .attr("name", &desk.vnet_name)
            .attr("location", region)
            .attr("resource_group_name", rg_name.clone())
            .attr("address_space", vec![desk.address_space.as_str()])
            .build()?,
    )?;

    let subnet = stack.add_node(
        ResourceNode::builder(ResourceKind::Subnet, "avd-subnet-id")
            .attr("name", &desk.subnet_name)
            .attr("resource_group_name", rg_name.clone())
            .attr("virtual_network_name", vnet.output("name"))
            .attr("address_prefixes", vec![desk.subnet.as_str()])
            .build()?,
    )?;

    let nsg = stack.add_node(
        ResourceNode::builder(ResourceKind::NetworkSecurityGroup, "avd-sg-id")
            .attr("name", "avd-sg")
            .attr("location", region)
            .attr("resource_group_name", rg_name.clone())
            .build()?,
    )?;

    let https = SecurityRuleSpec::allow_tcp_inbound("HTTPS", 100, 443, "*", "*").into_node(
        "avd-security-rule-id",
        rg_name.clone(),
        nsg.output("name"),
    )?;
    let https = stack.add_node(https)?;

    let association = stack.add_node(
        ResourceNode::builder(ResourceKind::SubnetNsgAssociation, "avd-subnet-sg-association-id")
            .attr("subnet_id", subnet.output("id"))
            .attr("network_security_group_id", nsg.output("id"))
            .build()?,
    )?;

    // The session host's interface comes up only behind the filtered subnet.
    let nic = stack.add_node(
        ResourceNode::builder(ResourceKind::NetworkInterface, "avd-vm-nic-id")
            .attr("name", "avd-nic")
            .attr("location", region)
            .attr("resource_group_name", rg_name.clone())
            .attr(
                "ip_configuration",
                vec![Value::record([
                    ("name", Value::from("avd-ip-config")),
                    ("subnet_id", subnet.output("id").into()),
                    ("private_ip_address_allocation", "Dynamic".into()),
                ])],
            )
            .depends_on(association.id())
            .depends_on(https.id())
            .build()?,
    )?;

    let vm = &desk.vm;
    stack.add_node(
        ResourceNode::builder(ResourceKind::VirtualMachine, "windows-vm")
            .attr("name", &vm.name)
            .attr("computer_name", &vm.computer_name)
            .attr("location", region)
            .attr("resource_group_name", rg_name.clone())
            .attr("size", &vm.size)
            .attr(
                "os_disk",
                Value::record([
                    ("storage_account_type", Value::from(&vm.os_disk_type)),
                    ("disk_size_gb", vm.os_disk_size_gb.into()),
                    ("caching", "ReadWrite".into()),
                ]),
            )
            .attr("network_interface_ids", vec![nic.output("id")])
            .attr(
                "source_image_reference",
                Value::record([
                    ("publisher", Value::from(&vm.image.publisher)),
                    ("offer", (&vm.image.offer).into()),
                    ("sku", (&vm.image.sku).into()),
                    ("version", (&vm.image.version).into()),
                ]),
            )
            .attr("admin_username", &vm.admin_username)
            .attr("admin_password", admin_password)
            .build()?,
    )?;

    stack.add_node(
        ResourceNode::builder(ResourceKind::Workspace, "workspace")
            .attr("name", &desk.workspace_name)
            .attr("location", region)
            .attr("resource_group_name", rg_name.clone())
            .build()?,
    )?;

    let pool = &desk.host_pool;
    let host_pool = stack.add_node(
        ResourceNode::builder(ResourceKind::HostPool, "avd-host-pool")
            .attr("name", &pool.name)
            .attr("location", region)
            .attr("resource_group_name", rg_name.clone())
            .attr("friendly_name", &pool.friendly_name)
            .attr("type", &pool.pool_type)
            .attr("load_balancer_type", &pool.load_balancer_type)
            .attr("start_vm_on_connect", pool.start_vm_on_connect)
            .attr("validate_environment", pool.validate_environment)
            .build()?,
    )?;

    stack.add_node(
        ResourceNode::builder(ResourceKind::ApplicationGroup, "application-group")
            .attr("name", &desk.application_group_name)
            .attr("type", "Desktop")
            .attr("default_desktop_display_name", "azure-vd")
            .attr("location", region)
            .attr("resource_group_name", rg_name)
            .attr("host_pool_id", host_pool.output("id"))
            .attr("friendly_name", "AVD Application Group")
            .build()?,
    )?;

    Ok(stack)
}

#[cfg(test)]
#[allow(clippy::expect_used, clippy::unwrap_used, clippy::indexing_slicing)]
mod tests {
    use super::*;
    use crate::error::NodeError;
    use crate::resources::Reference;

    fn stack() -> Stack {
        assemble(&Config::default(), "not-a-real-password").unwrap()
    }

    #[test]
    fn default_stack_validates() {
        let mut s = stack();
        s.validate().unwrap();
        assert_eq!(s.name(), "its_azure_vd");
        assert_eq!(s.len(), 11);
    }

    #[test]
    fn vm_interface_depends_on_subnet() {
        let s = stack();
        let nic = s.node("avd-vm-nic-id").unwrap();
        assert!(nic.references().contains(&&Reference::new(
            ResourceKind::Subnet,
            "avd-subnet-id",
            "id"
        )));
        let vm = s.node("windows-vm").unwrap();
        assert!(vm.dependencies().contains("avd-vm-nic-id"));
    }

    #[test]
    fn order_puts_vm_after_its_interface() {
        let s = stack();
        let order: Vec<_> = s.topological_order().collect();
        let pos = |id: &str| order.iter().position(|o| *o == id).unwrap();
        assert!(pos("avd-subnet-sg-association-id") < pos("avd-vm-nic-id"));
        assert!(pos("avd-vm-nic-id") < pos("windows-vm"));
        assert!(pos("avd-host-pool") < pos("application-group"));
    }

    #[test]
    fn host_pool_uses_configured_type() {
        let mut config = Config::default();
        config.desktop.host_pool.pool_type = "Pooled".to_string();
        config.desktop.host_pool.load_balancer_type = "BreadthFirst".to_string();
        let s = assemble(&config, "pw").unwrap();
        assert_eq!(
            s.node("avd-host-pool").unwrap().attributes()["type"],
            Value::from("Pooled")
        );
    }

    #[test]
    fn unknown_host_pool_type_is_rejected() {
        let mut config = Config::default();
        config.desktop.host_pool.pool_type = "Shared".to_string();
        let err = assemble(&config, "pw").unwrap_err();
        assert!(matches!(
            err,
            AzstackError::Node(NodeError::InvalidAttributeType { ref attribute, .. }) if attribute == "type"
        ));
    }

    #[test]
    fn empty_password_is_rejected() {
        let err = assemble(&Config::default(), "").unwrap_err();
        assert!(matches!(
            err,
            AzstackError::Node(NodeError::InvalidAttributeType { ref attribute, .. }) if attribute == "admin_password"
        ));
    }
}
