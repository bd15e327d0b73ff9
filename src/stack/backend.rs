//! Remote state backend binding.
use serde::{Deserialize, Serialize};

/// Identifies the remote state store the provisioning engine uses for a
/// stack. All four fields are opaque to this crate; empty values are only
/// flagged as configuration warnings.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct BackendBinding {
    /// Resource group holding the storage account.
    pub resource_group_name: String,
    /// Storage account name.
    pub storage_account_name: String,
    /// Blob container name.
    pub container_name: String,
    /// Blob key of the state file.
    pub key: String,
}

impl BackendBinding {
    /// Names of fields whose value is empty or whitespace, in declaration
    /// order.
    #[must_use]
    pub fn empty_fields(&self) -> Vec<&'static str> {
        [
            ("resource_group_name", &self.resource_group_name),
            ("storage_account_name", &self.storage_account_name),
            ("container_name", &self.container_name),
            ("key", &self.key),
        ]
        .into_iter()
        .filter(|(_, v)| v.trim().is_empty())
        .map(|(name, _)| name)
        .collect()
    }
}
