//! Deployment configuration.
//!
//! Everything a blueprint needs beyond code: region, names, the address plan,
//! the VM image, the tenant lookup source and optional backends. A missing
//! file yields the defaults below, which describe the reference deployment.
//!
//! ```toml
//! region = "westus2"
//!
//! [networking]
//! address_space = "10.0.0.0/16"
//!
//! [networking.vpn.tenant]
//! source = "discovery"
//! domain = "contoso.onmicrosoft.com"
//!
//! [desktop.vm]
//! admin_username = "avdadmin"
//! admin_password_env = "AZSTACK_ADMIN_PASSWORD"
//! ```
pub mod toml_loader;
pub mod validation;

use serde::Deserialize;
use std::path::Path;

use crate::error::ConfigError;
use crate::resources::identifier_problem;
use crate::stack::BackendBinding;
use validation::{AddressPlanValidator, BackendValidator, ConfigValidator, ValidationWarning};

/// Default configuration file name, resolved against the working directory.
pub const DEFAULT_CONFIG_FILE: &str = "azstack.toml";

/// Default environment variable holding the VM admin password.
pub const DEFAULT_PASSWORD_ENV: &str = "AZSTACK_ADMIN_PASSWORD";

/// Top-level configuration.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Config {
    /// Azure region every resource is placed in.
    pub region: String,
    /// Networking stack settings.
    pub networking: NetworkingConfig,
    /// Virtual desktop stack settings.
    pub desktop: DesktopConfig,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            region: "westus2".to_string(),
            networking: NetworkingConfig::default(),
            desktop: DesktopConfig::default(),
        }
    }
}

/// `[networking]`
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct NetworkingConfig {
    /// Stack name, also the output directory name.
    pub stack_name: String,
    /// Resource group name.
    pub resource_group: String,
    /// Virtual network name.
    pub vnet_name: String,
    /// Virtual network address space.
    pub address_space: String,
    /// Client subnet prefix.
    pub client_subnet: String,
    /// Server subnet prefix.
    pub server_subnet: String,
    /// DMZ subnet prefix.
    pub dmz_subnet: String,
    /// Gateway subnet prefix.
    pub gateway_subnet: String,
    /// Point-to-site VPN settings.
    pub vpn: VpnConfig,
    /// Remote state backend.
    pub backend: Option<BackendBinding>,
}

impl Default for NetworkingConfig {
    fn default() -> Self {
        Self {
            stack_name: "its_networking".to_string(),
            resource_group: "its-networking-stack".to_string(),
            vnet_name: "its-vnet".to_string(),
            address_space: "10.0.0.0/16".to_string(),
            client_subnet: "10.0.2.0/24".to_string(),
            server_subnet: "10.0.1.0/24".to_string(),
            dmz_subnet: "10.0.0.0/24".to_string(),
            gateway_subnet: "10.0.254.0/24".to_string(),
            vpn: VpnConfig::default(),
            backend: None,
        }
    }
}

/// `[networking.vpn]`
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct VpnConfig {
    /// Address pool handed to VPN clients.
    pub client_address_space: String,
    /// Enabled client protocols.
    pub protocols: Vec<String>,
    /// Application id of the Azure VPN client.
    pub aad_audience: String,
    /// Gateway SKU.
    pub gateway_sku: String,
    /// Where the client tenant id comes from.
    pub tenant: TenantSource,
}

impl Default for VpnConfig {
    fn default() -> Self {
        Self {
            client_address_space: "10.10.10.0/24".to_string(),
            protocols: vec!["OpenVPN".to_string()],
            aad_audience: "41b23e61-6c1e-4545-b367-cd054e0ed4b4".to_string(),
            gateway_sku: "Standard".to_string(),
            tenant: TenantSource::default(),
        }
    }
}

/// `[networking.vpn.tenant]`
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(tag = "source", rename_all = "kebab-case")]
pub enum TenantSource {
    /// A fixed tenant id.
    Static {
        /// The tenant GUID.
        id: String,
    },
    /// The tenant of the account the Azure CLI is logged in with.
    #[default]
    AzureCli,
    /// The tenant owning `domain`, from its OpenID discovery document.
    Discovery {
        /// Tenant domain, e.g. `contoso.onmicrosoft.com`.
        domain: String,
        /// Override of the authority host.
        #[serde(default)]
        authority_host: Option<String>,
    },
}

/// `[desktop]`
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct DesktopConfig {
    /// Stack name, also the output directory name.
    pub stack_name: String,
    /// Resource group name.
    pub resource_group: String,
    /// Virtual network name.
    pub vnet_name: String,
    /// Virtual network address space.
    pub address_space: String,
    /// Subnet name.
    pub subnet_name: String,
    /// Subnet prefix.
    pub subnet: String,
    /// Session host VM.
    pub vm: VmConfig,
    /// Workspace name.
    pub workspace_name: String,
    /// Host pool settings.
    pub host_pool: HostPoolConfig,
    /// Desktop application group name.
    pub application_group_name: String,
    /// Remote state backend.
    pub backend: Option<BackendBinding>,
}

impl Default for DesktopConfig {
    fn default() -> Self {
        Self {
            stack_name: "its_azure_vd".to_string(),
            resource_group: "azure-virtual-desktop".to_string(),
            vnet_name: "avd-vnet".to_string(),
            address_space: "10.0.0.0/16".to_string(),
            subnet_name: "avd-subnet".to_string(),
            subnet: "10.0.1.0/24".to_string(),
            vm: VmConfig::default(),
            workspace_name: "avd-workspace".to_string(),
            host_pool: HostPoolConfig::default(),
            application_group_name: "avd-application-group".to_string(),
            backend: None,
        }
    }
}

/// `[desktop.vm]`
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct VmConfig {
    /// Resource name.
    pub name: String,
    /// Windows computer name.
    pub computer_name: String,
    /// VM size.
    pub size: String,
    /// Local administrator account.
    pub admin_username: String,
    /// Environment variable holding the administrator password.
    pub admin_password_env: String,
    /// OS disk storage type.
    pub os_disk_type: String,
    /// OS disk size in GiB.
    pub os_disk_size_gb: u32,
    /// Marketplace image.
    pub image: ImageConfig,
}

impl Default for VmConfig {
    fn default() -> Self {
        Self {
            name: "azure-virtual-desktop-vm".to_string(),
            computer_name: "mason-avd".to_string(),
            size: "Standard_D2s_v3".to_string(),
            admin_username: "Tom".to_string(),
            admin_password_env: DEFAULT_PASSWORD_ENV.to_string(),
            os_disk_type: "StandardSSD_LRS".to_string(),
            os_disk_size_gb: 128,
            image: ImageConfig::default(),
        }
    }
}

/// `[desktop.vm.image]`
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ImageConfig {
    /// Image publisher.
    pub publisher: String,
    /// Image offer.
    pub offer: String,
    /// Image SKU.
    pub sku: String,
    /// Image version.
    pub version: String,
}

impl Default for ImageConfig {
    fn default() -> Self {
        Self {
            publisher: "MicrosoftWindowsDesktop".to_string(),
            offer: "windows-11".to_string(),
            sku: "win11-21h2-pro".to_string(),
            version: "22000.2176.230707".to_string(),
        }
    }
}

/// `[desktop.host_pool]`
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct HostPoolConfig {
    /// Resource name.
    pub name: String,
    /// Display name.
    pub friendly_name: String,
    /// `Personal` or `Pooled`.
    #[serde(rename = "type")]
    pub pool_type: String,
    /// Session load balancing.
    pub load_balancer_type: String,
    /// Start the session host when a user connects.
    pub start_vm_on_connect: bool,
    /// Receive service updates before other pools.
    pub validate_environment: bool,
}

impl Default for HostPoolConfig {
    fn default() -> Self {
        Self {
            name: "avd-host-pool".to_string(),
            friendly_name: "Virtual Desktop Host".to_string(),
            pool_type: "Personal".to_string(),
            load_balancer_type: "Persistent".to_string(),
            start_vm_on_connect: true,
            validate_environment: true,
        }
    }
}

impl Config {
    /// Load configuration from `path`; a missing file yields the defaults.
    ///
    /// # Errors
    ///
    /// Returns a [`ConfigError`] if the file cannot be read or parsed, or
    /// if its stack names are rejected by [`Config::check_stack_names`].
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let config: Self = toml_loader::load_config(path)?;
        config.check_stack_names()?;
        Ok(config)
    }

    /// Stack names become output directories and must identify one
    /// deployable unit each, so they must be plain identifiers and distinct.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::InvalidStackName`] for a name that is not a
    /// plain identifier and [`ConfigError::DuplicateStackName`] when both
    /// stacks share a name.
    pub fn check_stack_names(&self) -> Result<(), ConfigError> {
        let names = [&self.networking.stack_name, &self.desktop.stack_name];
        for name in names {
            if let Some(reason) = identifier_problem(name) {
                return Err(ConfigError::InvalidStackName {
                    name: name.clone(),
                    reason: reason.to_string(),
                });
            }
        }
        if self.networking.stack_name == self.desktop.stack_name {
            return Err(ConfigError::DuplicateStackName(self.networking.stack_name.clone()));
        }
        Ok(())
    }

    /// Run every validator and collect their warnings.
    #[must_use]
    pub fn validate(&self) -> Vec<ValidationWarning> {
        let net = &self.networking;
        let desk = &self.desktop;
        let validators: Vec<Box<dyn ConfigValidator + '_>> = vec![
            Box::new(BackendValidator::new(&net.stack_name, net.backend.as_ref())),
            Box::new(BackendValidator::new(&desk.stack_name, desk.backend.as_ref())),
            Box::new(
                AddressPlanValidator::new(&net.stack_name, &net.address_space)
                    .subnet("client", &net.client_subnet)
                    .subnet("server", &net.server_subnet)
                    .subnet("dmz", &net.dmz_subnet)
                    .subnet("gateway", &net.gateway_subnet)
                    .external("vpn client pool", &net.vpn.client_address_space),
            ),
            Box::new(
                AddressPlanValidator::new(&desk.stack_name, &desk.address_space)
                    .subnet(&desk.subnet_name, &desk.subnet),
            ),
        ];
        validators.iter().flat_map(|v| v.validate()).collect()
    }

    /// Read the VM administrator password from the environment.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::MissingSecret`] if the variable is unset or empty.
    pub fn admin_password(&self) -> Result<String, ConfigError> {
        read_secret(&self.desktop.vm.admin_password_env, |k| std::env::var(k).ok())
    }
}

/// Read secret `name` through `env`, rejecting unset and blank values.
///
/// # Errors
///
/// Returns [`ConfigError::MissingSecret`] naming the variable.
pub fn read_secret(
    name: &str,
    env: impl Fn(&str) -> Option<String>,
) -> Result<String, ConfigError> {
    env(name)
        .filter(|v| !v.trim().is_empty())
        .ok_or_else(|| ConfigError::MissingSecret(name.to_string()))
}
