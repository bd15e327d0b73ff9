//! Synthesized stack documents and their on-disk layout.
//!
//! ```text
//! <out>/
//! ├── manifest.json
//! └── stacks/
//!     └── <stack>/
//!         └── stack.json
//! ```
use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context as _, Result};
use indexmap::IndexMap;
use serde::Serialize;

use super::BackendBinding;
use crate::resources::{ResourceKind, ResourceNode, Value};

/// The document handed to the provisioning engine for one stack.
#[derive(Debug, Clone, Serialize)]
pub struct SynthesizedStack {
    /// Stack name.
    pub stack: String,
    /// Provider blocks keyed by provider name.
    pub provider: IndexMap<String, IndexMap<String, Value>>,
    /// Remote state backend, when one is attached.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub backend: Option<BackendDocument>,
    /// Resources keyed by id, in dependency order.
    pub resources: IndexMap<String, SynthesizedResource>,
}

/// Backend section of a [`SynthesizedStack`], keyed by backend type.
#[derive(Debug, Clone, Serialize)]
pub struct BackendDocument {
    /// Azure storage backend settings.
    pub azurerm: BackendBinding,
}

impl From<BackendBinding> for BackendDocument {
    fn from(azurerm: BackendBinding) -> Self {
        Self { azurerm }
    }
}

/// One resource entry of a [`SynthesizedStack`].
#[derive(Debug, Clone, Serialize)]
pub struct SynthesizedResource {
    /// Resource kind.
    pub kind: ResourceKind,
    /// Provider resource type name.
    #[serde(rename = "type")]
    pub resource_type: &'static str,
    /// Attributes with references rendered as interpolations.
    pub attributes: IndexMap<String, Value>,
    /// Ids that must be created first.
    pub depends_on: Vec<String>,
}

impl SynthesizedResource {
    pub(super) fn from_node(node: &ResourceNode) -> Self {
        Self {
            kind: node.kind(),
            resource_type: node.kind().resource_type(),
            attributes: node.attributes().clone(),
            depends_on: node.dependencies().iter().cloned().collect(),
        }
    }
}

impl SynthesizedStack {
    /// Pretty-printed JSON with a trailing newline.
    ///
    /// # Errors
    ///
    /// Returns an error if serialization fails.
    pub fn to_json_pretty(&self) -> Result<String> {
        let mut json = serde_json::to_string_pretty(self)
            .with_context(|| format!("serializing stack '{}'", self.stack))?;
        json.push('\n');
        Ok(json)
    }

    /// Path of this stack's document relative to the output directory.
    #[must_use]
    pub fn relative_path(&self) -> PathBuf {
        Path::new("stacks").join(&self.stack).join("stack.json")
    }

    /// Write the document under `out_dir`, creating directories as needed.
    /// Returns the path written.
    ///
    /// Documents can carry credentials (the desktop VM admin password), so on
    /// Unix the file is restricted to its owner.
    ///
    /// # Errors
    ///
    /// Returns an error if serialization or any filesystem operation fails.
    pub fn write_to(&self, out_dir: &Path) -> Result<PathBuf> {
        let path = out_dir.join(self.relative_path());
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)
                .with_context(|| format!("creating directory {}", parent.display()))?;
        }
        fs::write(&path, self.to_json_pretty()?)
            .with_context(|| format!("writing {}", path.display()))?;
        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            fs::set_permissions(&path, fs::Permissions::from_mode(0o600))
                .with_context(|| format!("restricting permissions on {}", path.display()))?;
        }
        Ok(path)
    }
}

/// Index of every document written by one synthesis run.
#[derive(Debug, Clone, Serialize)]
pub struct Manifest {
    /// Tool name and version that produced the documents.
    pub generator: String,
    /// One entry per stack, in synthesis order.
    pub stacks: Vec<ManifestEntry>,
}

/// One stack listed in a [`Manifest`].
#[derive(Debug, Clone, Serialize)]
pub struct ManifestEntry {
    /// Stack name.
    pub name: String,
    /// Document path relative to the output directory, `/`-separated.
    pub path: String,
    /// Number of resources in the document.
    pub resources: usize,
}

impl Manifest {
    /// Build a manifest for `stacks`.
    #[must_use]
    pub fn for_stacks(stacks: &[SynthesizedStack]) -> Self {
        Self {
            generator: format!("azstack {}", crate::version()),
            stacks: stacks
                .iter()
                .map(|s| ManifestEntry {
                    name: s.stack.clone(),
                    path: format!("stacks/{}/stack.json", s.stack),
                    resources: s.resources.len(),
                })
                .collect(),
        }
    }

    /// Write `manifest.json` under `out_dir`. Returns the path written.
    ///
    /// # Errors
    ///
    /// Returns an error if serialization or the write fails.
    pub fn write_to(&self, out_dir: &Path) -> Result<PathBuf> {
        fs::create_dir_all(out_dir)
            .with_context(|| format!("creating directory {}", out_dir.display()))?;
        let path = out_dir.join("manifest.json");
        let mut json = serde_json::to_string_pretty(self).context("serializing manifest")?;
        json.push('\n');
        fs::write(&path, json).with_context(|| format!("writing {}", path.display()))?;
        Ok(path)
    }
}

#[cfg(test)]
#[allow(clippy::expect_used, clippy::unwrap_used, clippy::indexing_slicing)]
mod tests {
    use super::*;
    use crate::stack::{Provider, Stack};

    fn validated_stack() -> Stack {
        let mut stack = Stack::new("demo");
        stack.add_provider(Provider::azurerm()).unwrap();
        let rg = stack
            .add_node(
                ResourceNode::builder(ResourceKind::ResourceGroup, "rg")
                    .attr("name", "demo-rg")
                    .attr("location", "westus2")
                    .build()
                    .unwrap(),
            )
            .unwrap();
        stack
            .add_node(
                ResourceNode::builder(ResourceKind::VirtualNetwork, "vnet")
                    .attr("name", "demo-vnet")
                    .attr("location", "westus2")
                    .attr("resource_group_name", rg.output("name"))
                    .attr("address_space", vec!["10.0.0.0/16"])
                    .build()
                    .unwrap(),
            )
            .unwrap();
        stack.validate().unwrap();
        stack
    }

    #[test]
    fn document_shape() {
        let doc = validated_stack().synthesize().unwrap();
        let json: serde_json::Value = serde_json::from_str(&doc.to_json_pretty().unwrap()).unwrap();

        assert_eq!(json["stack"], "demo");
        assert_eq!(json["provider"]["azurerm"]["features"], serde_json::json!({}));
        assert!(json.get("backend").is_none());
        let vnet = &json["resources"]["vnet"];
        assert_eq!(vnet["kind"], "VirtualNetwork");
        assert_eq!(vnet["type"], "azurerm_virtual_network");
        assert_eq!(
            vnet["attributes"]["resource_group_name"],
            "${azurerm_resource_group.rg.name}"
        );
        assert_eq!(vnet["depends_on"], serde_json::json!(["rg"]));
    }

    #[test]
    fn backend_is_keyed_by_type() {
        let mut stack = validated_stack();
        stack
            .attach_backend(BackendBinding {
                resource_group_name: "tfstate".to_string(),
                storage_account_name: "itsstate".to_string(),
                container_name: "tfstate".to_string(),
                key: "demo.tfstate".to_string(),
            })
            .unwrap();
        let doc = stack.synthesize().unwrap();
        let json = serde_json::to_value(&doc).unwrap();
        assert_eq!(json["backend"]["azurerm"]["key"], "demo.tfstate");
    }

    #[test]
    fn write_to_uses_stack_directory() {
        let dir = tempfile::tempdir().unwrap();
        let doc = validated_stack().synthesize().unwrap();
        let path = doc.write_to(dir.path()).unwrap();
        assert_eq!(path, dir.path().join("stacks").join("demo").join("stack.json"));
        let written = fs::read_to_string(&path).unwrap();
        assert!(written.ends_with('\n'));
        assert!(written.contains("\"azurerm_virtual_network\""));
    }

    #[cfg(unix)]
    #[test]
    fn written_document_is_owner_only() {
        use std::os::unix::fs::PermissionsExt;

        let dir = tempfile::tempdir().unwrap();
        let path = validated_stack().synthesize().unwrap().write_to(dir.path()).unwrap();
        let mode = fs::metadata(&path).unwrap().permissions().mode();
        assert_eq!(mode & 0o777, 0o600);
    }

    #[test]
    fn manifest_lists_documents() {
        let dir = tempfile::tempdir().unwrap();
        let doc = validated_stack().synthesize().unwrap();
        let manifest = Manifest::for_stacks(std::slice::from_ref(&doc));
        let path = manifest.write_to(dir.path()).unwrap();

        let json: serde_json::Value =
            serde_json::from_str(&fs::read_to_string(path).unwrap()).unwrap();
        assert_eq!(json["stacks"][0]["name"], "demo");
        assert_eq!(json["stacks"][0]["path"], "stacks/demo/stack.json");
        assert_eq!(json["stacks"][0]["resources"], 2);
        assert!(json["generator"].as_str().unwrap().starts_with("azstack "));
    }
}
