//! Concrete stacks assembled from configuration.
//!
//! Each blueprint returns an assembled but unvalidated [`Stack`]; the
//! configured backend binding, if any, is attached by [`Blueprint::assemble`].
pub mod desktop;
pub mod networking;

use crate::config::Config;
use crate::error::AzstackError;
use crate::stack::{BackendBinding, Stack};

/// A deployable unit.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Blueprint {
    /// Hub network with VPN gateway.
    Networking,
    /// Virtual desktop host and its network.
    Desktop,
}

/// Inputs that come from outside the configuration file.
#[derive(Debug, Clone, Default)]
pub struct Inputs {
    /// Resolved client tenant id, required by [`Blueprint::Networking`].
    pub tenant_id: Option<String>,
    /// VM admin password, required by [`Blueprint::Desktop`].
    pub admin_password: Option<String>,
}

impl Blueprint {
    /// Every blueprint, in assembly order.
    pub const ALL: [Self; 2] = [Self::Networking, Self::Desktop];

    /// The stack name this blueprint produces under `config`.
    #[must_use]
    pub fn stack_name(self, config: &Config) -> &str {
        match self {
            Self::Networking => &config.networking.stack_name,
            Self::Desktop => &config.desktop.stack_name,
        }
    }

    /// The backend configured for this blueprint's stack.
    #[must_use]
    pub const fn backend(self, config: &Config) -> Option<&BackendBinding> {
        match self {
            Self::Networking => config.networking.backend.as_ref(),
            Self::Desktop => config.desktop.backend.as_ref(),
        }
    }

    /// Assemble the stack and attach its configured backend.
    ///
    /// # Errors
    ///
    /// Returns [`AzstackError::MissingInput`] if the input this blueprint
    /// needs is absent, or any node or stack error raised during assembly.
    pub fn assemble(self, config: &Config, inputs: &Inputs) -> Result<Stack, AzstackError> {
        let mut stack = match self {
            Self::Networking => {
                let tenant = inputs
                    .tenant_id
                    .as_deref()
                    .ok_or(AzstackError::MissingInput("tenant id"))?;
                networking::assemble(config, tenant)?
            }
            Self::Desktop => {
                let password = inputs
                    .admin_password
                    .as_deref()
                    .ok_or(AzstackError::MissingInput("admin password"))?;
                desktop::assemble(config, password)?
            }
        };
        if let Some(binding) = self.backend(config) {
            stack.attach_backend(binding.clone())?;
        }
        Ok(stack)
    }
}

impl std::fmt::Display for Blueprint {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Networking => write!(f, "networking"),
            Self::Desktop => write!(f, "desktop"),
        }
    }
}
