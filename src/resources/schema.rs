//! Per-kind attribute schemas and the checks the node builder runs.
//!
//! A schema lists the fields a kind knows about, whether each is required,
//! and the shape its value must have. Attributes not named by the schema are
//! passed through unchecked; the provisioning engine owns the full provider
//! schema, this layer only guards the fields the stacks rely on.
use indexmap::IndexMap;

use super::cidr::{is_address_prefix, is_cidr, is_port_range};
use super::{ResourceKind, Value};
use crate::error::NodeError;

/// Expected shape of an attribute value.
#[derive(Debug, Clone, Copy)]
pub enum AttrType {
    /// Non-empty string literal.
    Str,
    /// Non-empty string literal or a reference to any node.
    Text,
    /// Integer within an inclusive range.
    Int {
        /// Lowest accepted value.
        min: i64,
        /// Highest accepted value.
        max: i64,
    },
    /// Boolean.
    Bool,
    /// One of a fixed set of string literals.
    OneOf(&'static [&'static str]),
    /// A CIDR block.
    Cidr,
    /// Non-empty list of CIDR blocks.
    CidrList,
    /// `*`, a CIDR block, an address, or a service tag.
    AddressPrefix,
    /// `*`, a port, or a `low-high` port range.
    PortRange,
    /// Non-empty list of non-empty strings.
    StrList,
    /// Reference to a node of the given kind.
    RefTo(ResourceKind),
    /// Non-empty list of references to nodes of the given kind.
    RefList(ResourceKind),
    /// Nested record with its own fields.
    Record(&'static [FieldSpec]),
    /// Non-empty list of nested records sharing one schema.
    Records(&'static [FieldSpec]),
}

impl AttrType {
    /// Human-readable description used in [`NodeError::InvalidAttributeType`].
    #[must_use]
    pub fn describe(&self) -> String {
        match self {
            Self::Str => "a non-empty string".to_string(),
            Self::Text => "a non-empty string or a reference".to_string(),
            Self::Int { min, max } => format!("an integer between {min} and {max}"),
            Self::Bool => "a boolean".to_string(),
            Self::OneOf(options) => format!("one of {}", options.join(", ")),
            Self::Cidr => "a CIDR block".to_string(),
            Self::CidrList => "a non-empty list of CIDR blocks".to_string(),
            Self::AddressPrefix => "'*', a CIDR block, an address or a service tag".to_string(),
            Self::PortRange => "'*', a port or a port range".to_string(),
            Self::StrList => "a non-empty list of strings".to_string(),
            Self::RefTo(kind) => format!("a reference to a {kind}"),
            Self::RefList(kind) => format!("a non-empty list of references to {kind} resources"),
            Self::Record(_) => "a record".to_string(),
            Self::Records(_) => "a non-empty list of records".to_string(),
        }
    }
}

/// One field of a schema.
#[derive(Debug, Clone, Copy)]
pub struct FieldSpec {
    /// Attribute name.
    pub name: &'static str,
    /// Expected shape.
    pub ty: AttrType,
    /// Whether the attribute must be present.
    pub required: bool,
}

const fn req(name: &'static str, ty: AttrType) -> FieldSpec {
    FieldSpec {
        name,
        ty,
        required: true,
    }
}

const fn opt(name: &'static str, ty: AttrType) -> FieldSpec {
    FieldSpec {
        name,
        ty,
        required: false,
    }
}

const NAME: FieldSpec = req("name", AttrType::Str);
const LOCATION: FieldSpec = req("location", AttrType::Str);
const RESOURCE_GROUP: FieldSpec = req("resource_group_name", AttrType::Text);
const ZONES: FieldSpec = opt("zones", AttrType::StrList);

const RESOURCE_GROUP_FIELDS: &[FieldSpec] = &[NAME, LOCATION];

const VIRTUAL_NETWORK_FIELDS: &[FieldSpec] = &[
    NAME,
    LOCATION,
    RESOURCE_GROUP,
    req("address_space", AttrType::CidrList),
];

const SUBNET_FIELDS: &[FieldSpec] = &[
    NAME,
    RESOURCE_GROUP,
    req(
        "virtual_network_name",
        AttrType::RefTo(ResourceKind::VirtualNetwork),
    ),
    req("address_prefixes", AttrType::CidrList),
];

const NETWORK_SECURITY_GROUP_FIELDS: &[FieldSpec] = &[NAME, LOCATION, RESOURCE_GROUP];

const SECURITY_RULE_FIELDS: &[FieldSpec] = &[
    NAME,
    req("priority", AttrType::Int { min: 100, max: 4096 }),
    req("direction", AttrType::OneOf(&["Inbound", "Outbound"])),
    req("access", AttrType::OneOf(&["Allow", "Deny"])),
    req(
        "protocol",
        AttrType::OneOf(&["Tcp", "Udp", "Icmp", "Esp", "Ah", "*"]),
    ),
    req("source_port_range", AttrType::PortRange),
    req("destination_port_range", AttrType::PortRange),
    req("source_address_prefix", AttrType::AddressPrefix),
    req("destination_address_prefix", AttrType::AddressPrefix),
    RESOURCE_GROUP,
    req(
        "network_security_group_name",
        AttrType::RefTo(ResourceKind::NetworkSecurityGroup),
    ),
];

const PUBLIC_IP_FIELDS: &[FieldSpec] = &[
    NAME,
    RESOURCE_GROUP,
    LOCATION,
    req("allocation_method", AttrType::OneOf(&["Static", "Dynamic"])),
    opt("sku", AttrType::OneOf(&["Basic", "Standard"])),
    ZONES,
];

const NAT_GATEWAY_FIELDS: &[FieldSpec] = &[
    NAME,
    RESOURCE_GROUP,
    LOCATION,
    opt("sku_name", AttrType::OneOf(&["Standard"])),
    opt("idle_timeout_in_minutes", AttrType::Int { min: 4, max: 120 }),
    ZONES,
];

const NAT_GATEWAY_ASSOCIATION_FIELDS: &[FieldSpec] = &[
    req("nat_gateway_id", AttrType::RefTo(ResourceKind::NatGateway)),
    req("public_ip_address_id", AttrType::RefTo(ResourceKind::PublicIp)),
];

const SUBNET_NSG_ASSOCIATION_FIELDS: &[FieldSpec] = &[
    req("subnet_id", AttrType::RefTo(ResourceKind::Subnet)),
    req(
        "network_security_group_id",
        AttrType::RefTo(ResourceKind::NetworkSecurityGroup),
    ),
];

const SUBNET_NAT_GATEWAY_ASSOCIATION_FIELDS: &[FieldSpec] = &[
    req("subnet_id", AttrType::RefTo(ResourceKind::Subnet)),
    req("nat_gateway_id", AttrType::RefTo(ResourceKind::NatGateway)),
];

const GATEWAY_IP_CONFIGURATION_FIELDS: &[FieldSpec] = &[
    opt("name", AttrType::Str),
    req("public_ip_address_id", AttrType::RefTo(ResourceKind::PublicIp)),
    req("subnet_id", AttrType::RefTo(ResourceKind::Subnet)),
    opt(
        "private_ip_address_allocation",
        AttrType::OneOf(&["Static", "Dynamic"]),
    ),
];

const VPN_CLIENT_CONFIGURATION_FIELDS: &[FieldSpec] = &[
    req("address_space", AttrType::CidrList),
    opt("vpn_client_protocols", AttrType::StrList),
    opt("aad_tenant", AttrType::Str),
    opt("aad_audience", AttrType::Str),
    opt("aad_issuer", AttrType::Str),
];

const VIRTUAL_NETWORK_GATEWAY_FIELDS: &[FieldSpec] = &[
    NAME,
    RESOURCE_GROUP,
    LOCATION,
    req("type", AttrType::OneOf(&["Vpn", "ExpressRoute"])),
    req("sku", AttrType::Str),
    opt("vpn_type", AttrType::OneOf(&["RouteBased", "PolicyBased"])),
    req(
        "ip_configuration",
        AttrType::Records(GATEWAY_IP_CONFIGURATION_FIELDS),
    ),
    opt(
        "vpn_client_configuration",
        AttrType::Record(VPN_CLIENT_CONFIGURATION_FIELDS),
    ),
];

const NIC_IP_CONFIGURATION_FIELDS: &[FieldSpec] = &[
    req("name", AttrType::Str),
    req("subnet_id", AttrType::RefTo(ResourceKind::Subnet)),
    req(
        "private_ip_address_allocation",
        AttrType::OneOf(&["Static", "Dynamic"]),
    ),
];

const NETWORK_INTERFACE_FIELDS: &[FieldSpec] = &[
    NAME,
    LOCATION,
    RESOURCE_GROUP,
    req(
        "ip_configuration",
        AttrType::Records(NIC_IP_CONFIGURATION_FIELDS),
    ),
];

const OS_DISK_FIELDS: &[FieldSpec] = &[
    req(
        "storage_account_type",
        AttrType::OneOf(&[
            "Standard_LRS",
            "StandardSSD_LRS",
            "Premium_LRS",
            "StandardSSD_ZRS",
            "Premium_ZRS",
        ]),
    ),
    req("caching", AttrType::OneOf(&["None", "ReadOnly", "ReadWrite"])),
    opt("disk_size_gb", AttrType::Int { min: 1, max: 4095 }),
];

const SOURCE_IMAGE_FIELDS: &[FieldSpec] = &[
    req("publisher", AttrType::Str),
    req("offer", AttrType::Str),
    req("sku", AttrType::Str),
    req("version", AttrType::Str),
];

const VIRTUAL_MACHINE_FIELDS: &[FieldSpec] = &[
    NAME,
    opt("computer_name", AttrType::Str),
    LOCATION,
    RESOURCE_GROUP,
    req("size", AttrType::Str),
    req("admin_username", AttrType::Str),
    req("admin_password", AttrType::Str),
    req(
        "network_interface_ids",
        AttrType::RefList(ResourceKind::NetworkInterface),
    ),
    req("os_disk", AttrType::Record(OS_DISK_FIELDS)),
    req("source_image_reference", AttrType::Record(SOURCE_IMAGE_FIELDS)),
];

const WORKSPACE_FIELDS: &[FieldSpec] = &[
    NAME,
    LOCATION,
    RESOURCE_GROUP,
    opt("friendly_name", AttrType::Str),
];

const HOST_POOL_FIELDS: &[FieldSpec] = &[
    NAME,
    LOCATION,
    RESOURCE_GROUP,
    req("type", AttrType::OneOf(&["Personal", "Pooled"])),
    req(
        "load_balancer_type",
        AttrType::OneOf(&["BreadthFirst", "DepthFirst", "Persistent"]),
    ),
    opt("friendly_name", AttrType::Str),
    opt("start_vm_on_connect", AttrType::Bool),
    opt("validate_environment", AttrType::Bool),
];

const APPLICATION_GROUP_FIELDS: &[FieldSpec] = &[
    NAME,
    LOCATION,
    RESOURCE_GROUP,
    req("type", AttrType::OneOf(&["Desktop", "RemoteApp"])),
    req("host_pool_id", AttrType::RefTo(ResourceKind::HostPool)),
    opt("friendly_name", AttrType::Str),
    opt("default_desktop_display_name", AttrType::Str),
];

/// The schema for `kind`.
#[must_use]
pub const fn schema(kind: ResourceKind) -> &'static [FieldSpec] {
    match kind {
        ResourceKind::ResourceGroup => RESOURCE_GROUP_FIELDS,
        ResourceKind::VirtualNetwork => VIRTUAL_NETWORK_FIELDS,
        ResourceKind::Subnet => SUBNET_FIELDS,
        ResourceKind::NetworkSecurityGroup => NETWORK_SECURITY_GROUP_FIELDS,
        ResourceKind::SecurityRule => SECURITY_RULE_FIELDS,
        ResourceKind::PublicIp => PUBLIC_IP_FIELDS,
        ResourceKind::NatGateway => NAT_GATEWAY_FIELDS,
        ResourceKind::NatGatewayAssociation => NAT_GATEWAY_ASSOCIATION_FIELDS,
        ResourceKind::SubnetNsgAssociation => SUBNET_NSG_ASSOCIATION_FIELDS,
        ResourceKind::SubnetNatGatewayAssociation => SUBNET_NAT_GATEWAY_ASSOCIATION_FIELDS,
        ResourceKind::VirtualNetworkGateway => VIRTUAL_NETWORK_GATEWAY_FIELDS,
        ResourceKind::NetworkInterface => NETWORK_INTERFACE_FIELDS,
        ResourceKind::VirtualMachine => VIRTUAL_MACHINE_FIELDS,
        ResourceKind::Workspace => WORKSPACE_FIELDS,
        ResourceKind::HostPool => HOST_POOL_FIELDS,
        ResourceKind::ApplicationGroup => APPLICATION_GROUP_FIELDS,
    }
}

/// Identifies the node being checked, for error reporting.
struct Subject<'a> {
    node: &'a str,
    kind: ResourceKind,
}

impl Subject<'_> {
    fn missing(&self, attribute: String) -> NodeError {
        NodeError::MissingRequiredAttribute {
            node: self.node.to_string(),
            kind: self.kind,
            attribute,
        }
    }

    fn invalid(&self, attribute: String, ty: &AttrType) -> NodeError {
        NodeError::InvalidAttributeType {
            node: self.node.to_string(),
            kind: self.kind,
            attribute,
            expected: ty.describe(),
        }
    }
}

/// Check `attributes` against the schema of `kind`.
///
/// # Errors
///
/// Returns [`NodeError::MissingRequiredAttribute`] for the first absent
/// required field and [`NodeError::InvalidAttributeType`] for the first value
/// whose shape does not match, in schema order.
pub fn check(
    kind: ResourceKind,
    node: &str,
    attributes: &IndexMap<String, Value>,
) -> Result<(), NodeError> {
    let subject = Subject { node, kind };
    check_fields(&subject, "", schema(kind), attributes)
}

fn check_fields(
    subject: &Subject<'_>,
    prefix: &str,
    fields: &[FieldSpec],
    values: &IndexMap<String, Value>,
) -> Result<(), NodeError> {
    for spec in fields {
        let path = if prefix.is_empty() {
            spec.name.to_string()
        } else {
            format!("{prefix}.{}", spec.name)
        };
        match values.get(spec.name) {
            Some(value) => check_value(subject, &path, &spec.ty, value)?,
            None if spec.required => return Err(subject.missing(path)),
            None => {}
        }
    }
    Ok(())
}

fn check_value(
    subject: &Subject<'_>,
    path: &str,
    ty: &AttrType,
    value: &Value,
) -> Result<(), NodeError> {
    let ok = match (ty, value) {
        (AttrType::Str | AttrType::Text, Value::String(s)) => !s.trim().is_empty(),
        (AttrType::Text, Value::Ref(_)) | (AttrType::Bool, Value::Bool(_)) => true,
        (AttrType::Int { min, max }, Value::Integer(n)) => (*min..=*max).contains(n),
        (AttrType::OneOf(options), Value::String(s)) => options.contains(&s.as_str()),
        (AttrType::Cidr, Value::String(s)) => is_cidr(s),
        (AttrType::AddressPrefix, Value::String(s)) => is_address_prefix(s),
        (AttrType::PortRange, Value::String(s)) => is_port_range(s),
        (AttrType::RefTo(kind), Value::Ref(r)) => r.kind == *kind,
        (AttrType::CidrList, Value::List(items)) => {
            return check_list(subject, path, ty, &AttrType::Cidr, items);
        }
        (AttrType::StrList, Value::List(items)) => {
            return check_list(subject, path, ty, &AttrType::Str, items);
        }
        (AttrType::RefList(kind), Value::List(items)) => {
            return check_list(subject, path, ty, &AttrType::RefTo(*kind), items);
        }
        (AttrType::Record(fields), Value::Record(values)) => {
            return check_fields(subject, path, fields, values);
        }
        (AttrType::Records(fields), Value::List(items)) => {
            return check_list(subject, path, ty, &AttrType::Record(fields), items);
        }
        _ => false,
    };
    if ok {
        Ok(())
    } else {
        Err(subject.invalid(path.to_string(), ty))
    }
}

fn check_list(
    subject: &Subject<'_>,
    path: &str,
    list_ty: &AttrType,
    item_ty: &AttrType,
    items: &[Value],
) -> Result<(), NodeError> {
    if items.is_empty() {
        return Err(subject.invalid(path.to_string(), list_ty));
    }
    for (i, item) in items.iter().enumerate() {
        check_value(subject, &format!("{path}[{i}]"), item_ty, item)?;
    }
    Ok(())
}
