//! Attribute values carried by resource nodes.
use indexmap::IndexMap;
use serde::ser::{Serialize, SerializeMap, SerializeSeq, Serializer};

use super::ResourceKind;

/// A reference to an output field of another node (e.g. a subnet's `id`).
///
/// References are how nodes point at each other; the builder turns every
/// reference it finds into a dependency, and synthesis renders it as an
/// interpolation string the provisioning engine resolves at apply time.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Reference {
    /// Id of the referenced node.
    pub node: String,
    /// Kind the referenced node is expected to have.
    pub kind: ResourceKind,
    /// Output field being referenced (`id`, `name`, ...).
    pub field: String,
}

impl Reference {
    /// Build a reference to `field` of the node `node` of kind `kind`.
    #[must_use]
    pub fn new(kind: ResourceKind, node: impl Into<String>, field: impl Into<String>) -> Self {
        Self {
            node: node.into(),
            kind,
            field: field.into(),
        }
    }

    /// Render as `${<type>.<id>.<field>}`.
    ///
    /// ```
    /// use azstack::resources::{Reference, ResourceKind};
    ///
    /// let r = Reference::new(ResourceKind::VirtualNetwork, "its-vnet", "name");
    /// assert_eq!(r.interpolation(), "${azurerm_virtual_network.its-vnet.name}");
    /// ```
    #[must_use]
    pub fn interpolation(&self) -> String {
        format!(
            "${{{}.{}.{}}}",
            self.kind.resource_type(),
            self.node,
            self.field
        )
    }
}

/// An attribute value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Value {
    /// A string literal.
    String(String),
    /// An integer.
    Integer(i64),
    /// A boolean.
    Bool(bool),
    /// A nested record; field order is preserved.
    Record(IndexMap<String, Value>),
    /// An ordered sequence.
    List(Vec<Value>),
    /// A reference to another node's output.
    Ref(Reference),
}

impl Value {
    /// Build a record from `(name, value)` pairs.
    ///
    /// ```
    /// use azstack::resources::Value;
    ///
    /// let disk = Value::record([("caching", Value::from("ReadWrite")), ("disk_size_gb", 128.into())]);
    /// assert!(matches!(disk, Value::Record(ref fields) if fields.len() == 2));
    /// ```
    pub fn record<I, K>(entries: I) -> Self
    where
        I: IntoIterator<Item = (K, Self)>,
        K: Into<String>,
    {
        Self::Record(entries.into_iter().map(|(k, v)| (k.into(), v)).collect())
    }

    /// An empty record (e.g. the provider's `features {}` block).
    #[must_use]
    pub fn empty_record() -> Self {
        Self::Record(IndexMap::new())
    }

    /// Push every reference contained in this value (depth-first) onto `out`.
    pub fn collect_references<'a>(&'a self, out: &mut Vec<&'a Reference>) {
        match self {
            Self::Ref(r) => out.push(r),
            Self::Record(fields) => fields.values().for_each(|v| v.collect_references(out)),
            Self::List(items) => items.iter().for_each(|v| v.collect_references(out)),
            Self::String(_) | Self::Integer(_) | Self::Bool(_) => {}
        }
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Self::String(s.to_string())
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Self::String(s)
    }
}

impl From<&String> for Value {
    fn from(s: &String) -> Self {
        Self::String(s.clone())
    }
}

impl From<i64> for Value {
    fn from(n: i64) -> Self {
        Self::Integer(n)
    }
}

impl From<i32> for Value {
    fn from(n: i32) -> Self {
        Self::Integer(i64::from(n))
    }
}

impl From<u32> for Value {
    fn from(n: u32) -> Self {
        Self::Integer(i64::from(n))
    }
}

impl From<u16> for Value {
    fn from(n: u16) -> Self {
        Self::Integer(i64::from(n))
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Self::Bool(b)
    }
}

impl From<Reference> for Value {
    fn from(r: Reference) -> Self {
        Self::Ref(r)
    }
}

impl From<IndexMap<String, Self>> for Value {
    fn from(fields: IndexMap<String, Self>) -> Self {
        Self::Record(fields)
    }
}

impl<T: Into<Self>> From<Vec<T>> for Value {
    fn from(items: Vec<T>) -> Self {
        Self::List(items.into_iter().map(Into::into).collect())
    }
}

impl Serialize for Value {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Self::String(s) => serializer.serialize_str(s),
            Self::Integer(n) => serializer.serialize_i64(*n),
            Self::Bool(b) => serializer.serialize_bool(*b),
            Self::Ref(r) => serializer.serialize_str(&r.interpolation()),
            Self::Record(fields) => {
                let mut map = serializer.serialize_map(Some(fields.len()))?;
                for (k, v) in fields {
                    map.serialize_entry(k, v)?;
                }
                map.end()
            }
            Self::List(items) => {
                let mut seq = serializer.serialize_seq(Some(items.len()))?;
                for item in items {
                    seq.serialize_element(item)?;
                }
                seq.end()
            }
        }
    }
}
