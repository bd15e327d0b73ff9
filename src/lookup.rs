//! Client tenant lookup.
//!
//! The networking stack needs the Azure AD tenant id of the deploying
//! client to configure VPN authentication. It is the single external input of
//! assembly and can come from configuration, the Azure CLI, or the tenant's
//! OpenID discovery document.
use std::sync::Arc;
use std::time::Duration;

use serde::Deserialize;

use crate::config::TenantSource;
use crate::error::LookupError;
use crate::exec::Executor;

/// Default authority host for discovery requests.
pub const DEFAULT_AUTHORITY_HOST: &str = "https://login.microsoftonline.com";

/// A source of the client tenant id.
#[cfg_attr(test, mockall::automock)]
pub trait TenantLookup {
    /// Fetch the tenant id. Implementations make at most one external call
    /// and never retry.
    ///
    /// # Errors
    ///
    /// Returns [`LookupError::ExternalLookupFailed`] if the source cannot
    /// produce a value.
    fn tenant_id(&self) -> Result<String, LookupError>;

    /// Short name used in log lines and errors.
    fn describe(&self) -> String;
}

fn failed(source: &dyn TenantLookup, reason: impl Into<String>) -> LookupError {
    LookupError::ExternalLookupFailed {
        source_name: source.describe(),
        reason: reason.into(),
    }
}

/// Tenant id fixed in configuration.
#[derive(Debug, Clone)]
pub struct StaticTenant {
    id: String,
}

impl StaticTenant {
    /// Wrap a configured id.
    pub fn new(id: impl Into<String>) -> Self {
        Self { id: id.into() }
    }
}

impl TenantLookup for StaticTenant {
    fn tenant_id(&self) -> Result<String, LookupError> {
        if self.id.trim().is_empty() {
            return Err(failed(self, "no tenant id configured"));
        }
        Ok(self.id.clone())
    }

    fn describe(&self) -> String {
        "static".to_string()
    }
}

/// Tenant id of the account the Azure CLI is logged in with.
#[derive(Debug, Clone)]
pub struct AzureCliTenant {
    executor: Arc<dyn Executor>,
}

impl AzureCliTenant {
    /// Query through `executor`.
    #[must_use]
    pub fn new(executor: Arc<dyn Executor>) -> Self {
        Self { executor }
    }
}

impl TenantLookup for AzureCliTenant {
    fn tenant_id(&self) -> Result<String, LookupError> {
        if !self.executor.which("az") {
            return Err(failed(self, "az not found on PATH"));
        }
        let result = self
            .executor
            .run("az", &["account", "show", "--query", "tenantId", "-o", "tsv"])
            .map_err(|e| failed(self, format!("{e:#}")))?;
        let id = result.stdout.trim();
        if id.is_empty() {
            return Err(failed(self, "az returned an empty tenant id"));
        }
        Ok(id.to_string())
    }

    fn describe(&self) -> String {
        "azure-cli".to_string()
    }
}

#[derive(Deserialize)]
struct OpenIdConfiguration {
    issuer: String,
}

/// Tenant id read from the OpenID discovery document of a tenant domain.
#[derive(Debug, Clone)]
pub struct DiscoveryTenant {
    domain: String,
    authority_host: String,
    timeout: Duration,
}

impl DiscoveryTenant {
    /// Discover the tenant of `domain` (e.g. `contoso.onmicrosoft.com`).
    pub fn new(domain: impl Into<String>) -> Self {
        Self {
            domain: domain.into(),
            authority_host: DEFAULT_AUTHORITY_HOST.to_string(),
            timeout: Duration::from_secs(10),
        }
    }

    /// Use a different authority host.
    #[must_use]
    pub fn with_authority_host(mut self, host: impl Into<String>) -> Self {
        self.authority_host = host.into().trim_end_matches('/').to_string();
        self
    }

    /// Overall request timeout.
    #[must_use]
    pub const fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// URL of the discovery document.
    #[must_use]
    pub fn discovery_url(&self) -> String {
        format!(
            "{}/{}/.well-known/openid-configuration",
            self.authority_host, self.domain
        )
    }
}

impl TenantLookup for DiscoveryTenant {
    fn tenant_id(&self) -> Result<String, LookupError> {
        let agent: ureq::Agent = ureq::Agent::config_builder()
            .timeout_global(Some(self.timeout))
            .build()
            .into();
        let url = self.discovery_url();
        let body = agent
            .get(&url)
            .header("Accept", "application/json")
            .call()
            .map_err(|e| failed(self, format!("GET {url}: {e}")))?
            .body_mut()
            .read_to_string()
            .map_err(|e| failed(self, format!("reading {url}: {e}")))?;
        let doc: OpenIdConfiguration = serde_json::from_str(&body)
            .map_err(|e| failed(self, format!("invalid discovery document: {e}")))?;
        tenant_from_issuer(&doc.issuer)
            .ok_or_else(|| failed(self, format!("no tenant id in issuer '{}'", doc.issuer)))
    }

    fn describe(&self) -> String {
        format!("discovery ({})", self.domain)
    }
}

/// Extract the tenant GUID from an issuer URL such as
/// `https://sts.windows.net/<id>/` or
/// `https://login.microsoftonline.com/<id>/v2.0`.
#[must_use]
pub fn tenant_from_issuer(issuer: &str) -> Option<String> {
    let path = issuer.split_once("://").map_or(issuer, |(_, rest)| rest);
    path.split('/')
        .skip(1)
        .find(|segment| is_guid(segment))
        .map(str::to_ascii_lowercase)
}

/// `true` for the canonical `8-4-4-4-12` hexadecimal GUID form.
#[must_use]
pub fn is_guid(s: &str) -> bool {
    let groups: Vec<&str> = s.split('-').collect();
    groups.len() == 5
        && groups
            .iter()
            .zip([8, 4, 4, 4, 12])
            .all(|(g, len)| g.len() == len && g.chars().all(|c| c.is_ascii_hexdigit()))
}

/// Build the lookup configured by `source`.
#[must_use]
pub fn from_source(source: &TenantSource, executor: Arc<dyn Executor>) -> Box<dyn TenantLookup> {
    match source {
        TenantSource::Static { id } => Box::new(StaticTenant::new(id.clone())),
        TenantSource::AzureCli => Box::new(AzureCliTenant::new(executor)),
        TenantSource::Discovery {
            domain,
            authority_host,
        } => {
            let lookup = DiscoveryTenant::new(domain.clone());
            Box::new(match authority_host {
                Some(host) => lookup.with_authority_host(host.clone()),
                None => lookup,
            })
        }
    }
}

/// Fetch the tenant id from `lookup` and check that it is a GUID.
///
/// # Errors
///
/// Returns [`LookupError::ExternalLookupFailed`] if the lookup fails or the
/// value is not a GUID.
pub fn resolve(lookup: &dyn TenantLookup) -> Result<String, LookupError> {
    let id = lookup.tenant_id()?;
    let id = id.trim();
    if !is_guid(id) {
        return Err(failed(lookup, format!("'{id}' is not a tenant GUID")));
    }
    Ok(id.to_ascii_lowercase())
}

/// Azure AD endpoints derived from a tenant id.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AadUrls {
    /// Token issuer, `https://sts.windows.net/<id>/`.
    pub issuer: String,
    /// Authority, `https://login.microsoftonline.com/<id>`.
    pub authority: String,
}

/// Compose the issuer and authority URLs for `tenant_id`.
///
/// ```
/// use azstack::lookup::aad_urls;
///
/// let urls = aad_urls("72f988bf-86f1-41af-91ab-2d7cd011db47");
/// assert_eq!(urls.issuer, "https://sts.windows.net/72f988bf-86f1-41af-91ab-2d7cd011db47/");
/// assert_eq!(urls.authority, "https://login.microsoftonline.com/72f988bf-86f1-41af-91ab-2d7cd011db47");
/// ```
#[must_use]
pub fn aad_urls(tenant_id: &str) -> AadUrls {
    AadUrls {
        issuer: format!("https://sts.windows.net/{tenant_id}/"),
        authority: format!("{DEFAULT_AUTHORITY_HOST}/{tenant_id}"),
    }
}

#[cfg(test)]
#[allow(clippy::expect_used, clippy::unwrap_used, clippy::indexing_slicing)]
mod tests {
    use super::*;
    use crate::exec::test_helpers::MockExecutor;
    use std::io::{Read, Write};
    use std::net::TcpListener;

    const TENANT: &str = "72f988bf-86f1-41af-91ab-2d7cd011db47";

    /// Serve one canned HTTP response on a loopback port and return its base URL.
    fn serve_once(status: &str, body: &'static str) -> String {
        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        let addr = listener.local_addr().unwrap();
        let status = status.to_string();
        std::thread::spawn(move || {
            if let Ok((mut stream, _)) = listener.accept() {
                let mut buf = [0_u8; 4096];
                let mut seen = Vec::new();
                while !seen.windows(4).any(|w| w == b"\r\n\r\n") {
                    match stream.read(&mut buf) {
                        Ok(0) | Err(_) => break,
                        Ok(n) => seen.extend_from_slice(&buf[..n]),
                    }
                }
                let response = format!(
                    "HTTP/1.1 {status}\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{body}",
                    body.len()
                );
                let _ = stream.write_all(response.as_bytes());
            }
        });
        format!("http://{addr}")
    }

    // -----------------------------------------------------------------------
    // Pure helpers
    // -----------------------------------------------------------------------

    #[test]
    fn guid_shape() {
        assert!(is_guid(TENANT));
        assert!(is_guid("72F988BF-86F1-41AF-91AB-2D7CD011DB47"));
        assert!(!is_guid("72f988bf86f141af91ab2d7cd011db47"));
        assert!(!is_guid("72f988bf-86f1-41af-91ab-2d7cd011db4"));
        assert!(!is_guid("zzf988bf-86f1-41af-91ab-2d7cd011db47"));
    }

    #[test]
    fn tenant_from_v1_and_v2_issuers() {
        assert_eq!(
            tenant_from_issuer(&format!("https://sts.windows.net/{TENANT}/")),
            Some(TENANT.to_string())
        );
        assert_eq!(
            tenant_from_issuer(&format!("https://login.microsoftonline.com/{TENANT}/v2.0")),
            Some(TENANT.to_string())
        );
        assert_eq!(tenant_from_issuer("https://sts.windows.net/common/"), None);
    }

    #[test]
    fn aad_urls_compose() {
        let urls = aad_urls(TENANT);
        assert_eq!(urls.issuer, format!("https://sts.windows.net/{TENANT}/"));
        assert_eq!(
            urls.authority,
            format!("https://login.microsoftonline.com/{TENANT}")
        );
    }

    // -----------------------------------------------------------------------
    // resolve
    // -----------------------------------------------------------------------

    #[test]
    fn resolve_normalizes_case() {
        let mut lookup = MockTenantLookup::new();
        lookup
            .expect_tenant_id()
            .times(1)
            .returning(|| Ok(format!(" {} \n", TENANT.to_uppercase())));
        assert_eq!(resolve(&lookup).unwrap(), TENANT);
    }

    #[test]
    fn resolve_rejects_non_guid() {
        let mut lookup = MockTenantLookup::new();
        lookup
            .expect_tenant_id()
            .returning(|| Ok("contoso".to_string()));
        lookup.expect_describe().returning(|| "mock".to_string());
        let err = resolve(&lookup).unwrap_err();
        assert!(err.to_string().contains("'mock'"));
        assert!(err.to_string().contains("not a tenant GUID"));
    }

    #[test]
    fn resolve_propagates_lookup_failure() {
        let mut lookup = MockTenantLookup::new();
        lookup.expect_tenant_id().times(1).returning(|| {
            Err(LookupError::ExternalLookupFailed {
                source_name: "mock".to_string(),
                reason: "offline".to_string(),
            })
        });
        assert!(resolve(&lookup).unwrap_err().to_string().contains("offline"));
    }

    // -----------------------------------------------------------------------
    // Sources
    // -----------------------------------------------------------------------

    #[test]
    fn static_tenant_returns_configured_id() {
        assert_eq!(StaticTenant::new(TENANT).tenant_id().unwrap(), TENANT);
        assert!(StaticTenant::new("").tenant_id().is_err());
    }

    #[test]
    fn azure_cli_reads_trimmed_stdout() {
        let exec = Arc::new(MockExecutor::with_responses(vec![(
            true,
            "72f988bf-86f1-41af-91ab-2d7cd011db47\n",
        )]));
        let lookup = AzureCliTenant::new(exec.clone());
        assert_eq!(lookup.tenant_id().unwrap(), TENANT);
        assert_eq!(
            exec.calls(),
            vec!["az account show --query tenantId -o tsv"]
        );
    }

    #[test]
    fn azure_cli_missing_binary_fails_without_running() {
        let exec = Arc::new(MockExecutor::missing_everything());
        let err = AzureCliTenant::new(exec.clone()).tenant_id().unwrap_err();
        assert!(err.to_string().contains("az not found on PATH"));
        assert!(exec.calls().is_empty());
    }

    #[test]
    fn azure_cli_command_failure_is_lookup_error() {
        let exec = Arc::new(MockExecutor::with_responses(vec![(false, "Please run 'az login'")]));
        let err = AzureCliTenant::new(exec).tenant_id().unwrap_err();
        assert!(matches!(
            err,
            LookupError::ExternalLookupFailed { ref source_name, .. } if source_name == "azure-cli"
        ));
    }

    #[test]
    fn discovery_parses_issuer() {
        let base = serve_once(
            "200 OK",
            r#"{"issuer":"https://sts.windows.net/72f988bf-86f1-41af-91ab-2d7cd011db47/","token_endpoint":"x"}"#,
        );
        let lookup = DiscoveryTenant::new("contoso.onmicrosoft.com")
            .with_authority_host(base)
            .with_timeout(Duration::from_secs(5));
        assert_eq!(lookup.tenant_id().unwrap(), TENANT);
    }

    #[test]
    fn discovery_http_error_is_lookup_error() {
        let base = serve_once("404 Not Found", r#"{"error":"invalid_tenant"}"#);
        let lookup = DiscoveryTenant::new("nope.example").with_authority_host(base);
        let err = lookup.tenant_id().unwrap_err();
        assert!(err.to_string().contains("discovery (nope.example)"));
    }

    #[test]
    fn discovery_url_shape() {
        let lookup = DiscoveryTenant::new("contoso.onmicrosoft.com");
        assert_eq!(
            lookup.discovery_url(),
            "https://login.microsoftonline.com/contoso.onmicrosoft.com/.well-known/openid-configuration"
        );
    }

    #[test]
    fn from_source_picks_implementation() {
        let exec: Arc<dyn Executor> = Arc::new(MockExecutor::default());
        let lookup = from_source(
            &TenantSource::Static {
                id: TENANT.to_string(),
            },
            exec.clone(),
        );
        assert_eq!(lookup.describe(), "static");
        assert_eq!(from_source(&TenantSource::AzureCli, exec).describe(), "azure-cli");
    }
}
