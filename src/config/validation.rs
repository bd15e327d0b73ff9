//! Configuration validators.
//!
//! Validators never fail: they return [`ValidationWarning`]s that the
//! command layer logs before assembly starts. Hard errors come later, from
//! the node builder and [`Stack::validate`](crate::stack::Stack::validate).
use crate::resources::cidr::Ipv4Cidr;
use crate::stack::BackendBinding;

/// A validation warning detected during configuration loading.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationWarning {
    /// The configuration section (e.g. `its_networking.backend`).
    pub source: String,
    /// The specific item that triggered the warning.
    pub item: String,
    /// Human-readable warning message.
    pub message: String,
}

impl ValidationWarning {
    /// Build a warning.
    #[must_use]
    pub fn new(
        source: impl Into<String>,
        item: impl Into<String>,
        message: impl Into<String>,
    ) -> Self {
        Self {
            source: source.into(),
            item: item.into(),
            message: message.into(),
        }
    }
}

/// Trait for configuration validators.
pub trait ConfigValidator {
    /// Validate the configuration and return any warnings found.
    fn validate(&self) -> Vec<ValidationWarning>;

    /// Return a human-readable name for this validator.
    fn name(&self) -> &'static str;
}

/// Flags backend bindings with blank fields.
#[derive(Debug)]
pub struct BackendValidator<'a> {
    stack: &'a str,
    backend: Option<&'a BackendBinding>,
}

impl<'a> BackendValidator<'a> {
    /// Validate `backend` of the stack named `stack`.
    #[must_use]
    pub const fn new(stack: &'a str, backend: Option<&'a BackendBinding>) -> Self {
        Self { stack, backend }
    }
}

impl ConfigValidator for BackendValidator<'_> {
    fn validate(&self) -> Vec<ValidationWarning> {
        let Some(backend) = self.backend else {
            return Vec::new();
        };
        backend
            .empty_fields()
            .into_iter()
            .map(|field| {
                ValidationWarning::new(
                    format!("{}.backend", self.stack),
                    field,
                    "backend field is empty",
                )
            })
            .collect()
    }

    fn name(&self) -> &'static str {
        "backend"
    }
}

/// Checks that subnets parse, sit inside the address space, and do not
/// overlap each other or any external range (e.g. a VPN client pool).
#[derive(Debug)]
pub struct AddressPlanValidator<'a> {
    stack: &'a str,
    address_space: &'a str,
    subnets: Vec<(&'a str, &'a str)>,
    external: Vec<(&'a str, &'a str)>,
}

impl<'a> AddressPlanValidator<'a> {
    /// Start a plan for `stack` with the given virtual network space.
    #[must_use]
    pub const fn new(stack: &'a str, address_space: &'a str) -> Self {
        Self {
            stack,
            address_space,
            subnets: Vec::new(),
            external: Vec::new(),
        }
    }

    /// Add a subnet that must fall inside the address space.
    #[must_use]
    pub fn subnet(mut self, name: &'a str, prefix: &'a str) -> Self {
        self.subnets.push((name, prefix));
        self
    }

    /// Add a range that must stay outside the address space.
    #[must_use]
    pub fn external(mut self, name: &'a str, prefix: &'a str) -> Self {
        self.external.push((name, prefix));
        self
    }

    fn warning(&self, item: &str, message: impl Into<String>) -> ValidationWarning {
        ValidationWarning::new(format!("{}.address_plan", self.stack), item, message)
    }

    fn parse(
        &self,
        item: &str,
        prefix: &str,
        out: &mut Vec<ValidationWarning>,
    ) -> Option<Ipv4Cidr> {
        match prefix.parse::<Ipv4Cidr>() {
            Ok(cidr) => Some(cidr),
            Err(e) => {
                out.push(self.warning(item, e));
                None
            }
        }
    }
}

impl ConfigValidator for AddressPlanValidator<'_> {
    fn validate(&self) -> Vec<ValidationWarning> {
        let mut warnings = Vec::new();
        let space = self.parse("address_space", self.address_space, &mut warnings);

        let mut parsed: Vec<(&str, Ipv4Cidr)> = Vec::new();
        for &(name, prefix) in &self.subnets {
            let Some(cidr) = self.parse(name, prefix, &mut warnings) else {
                continue;
            };
            if let Some(space) = space
                && !space.contains(cidr)
            {
                warnings.push(self.warning(
                    name,
                    format!("subnet {cidr} is outside the address space {space}"),
                ));
            }
            if let Some((other, _)) = parsed.iter().find(|(_, o)| o.overlaps(cidr)) {
                warnings.push(self.warning(
                    name,
                    format!("subnet {cidr} overlaps subnet '{other}'"),
                ));
            }
            parsed.push((name, cidr));
        }

        for &(name, prefix) in &self.external {
            let Some(cidr) = self.parse(name, prefix, &mut warnings) else {
                continue;
            };
            if let Some(space) = space
                && space.overlaps(cidr)
            {
                warnings.push(self.warning(
                    name,
                    format!("{cidr} overlaps the address space {space}"),
                ));
            }
        }

        warnings
    }

    fn name(&self) -> &'static str {
        "address plan"
    }
}

#[cfg(test)]
#[allow(clippy::expect_used, clippy::unwrap_used, clippy::indexing_slicing)]
mod tests {
    use super::*;

    #[test]
    fn absent_backend_is_fine() {
        assert!(BackendValidator::new("s", None).validate().is_empty());
    }

    #[test]
    fn blank_backend_fields_warn_once_each() {
        let b = BackendBinding::default();
        let warnings = BackendValidator::new("its_azure_vd", Some(&b)).validate();
        assert_eq!(warnings.len(), 4);
        assert_eq!(warnings[0].source, "its_azure_vd.backend");
        assert_eq!(warnings[0].item, "resource_group_name");
        assert_eq!(warnings[3].item, "key");
    }

    #[test]
    fn valid_plan_has_no_warnings() {
        let v = AddressPlanValidator::new("net", "10.0.0.0/16")
            .subnet("client", "10.0.2.0/24")
            .subnet("server", "10.0.1.0/24")
            .external("vpn", "10.10.10.0/24");
        assert!(v.validate().is_empty());
    }

    #[test]
    fn subnet_outside_space_warns() {
        let warnings = AddressPlanValidator::new("net", "10.0.0.0/16")
            .subnet("stray", "10.1.0.0/24")
            .validate();
        assert_eq!(warnings.len(), 1);
        assert_eq!(warnings[0].item, "stray");
        assert!(warnings[0].message.contains("outside"));
    }

    #[test]
    fn overlapping_subnets_warn() {
        let warnings = AddressPlanValidator::new("net", "10.0.0.0/16")
            .subnet("a", "10.0.0.0/23")
            .subnet("b", "10.0.1.0/24")
            .validate();
        assert_eq!(warnings.len(), 1);
        assert_eq!(warnings[0].item, "b");
        assert!(warnings[0].message.contains("'a'"));
    }

    #[test]
    fn external_range_inside_space_warns() {
        let warnings = AddressPlanValidator::new("net", "10.0.0.0/16")
            .external("vpn client pool", "10.0.200.0/24")
            .validate();
        assert_eq!(warnings.len(), 1);
        assert_eq!(warnings[0].item, "vpn client pool");
    }

    #[test]
    fn unparsable_prefix_warns() {
        let warnings = AddressPlanValidator::new("net", "10.0.0.0/16")
            .subnet("bad", "10.0.0.1/24")
            .validate();
        assert_eq!(warnings.len(), 1);
        assert!(warnings[0].message.contains("host bits"));
    }

    #[test]
    fn validator_names() {
        assert_eq!(BackendValidator::new("s", None).name(), "backend");
        assert_eq!(AddressPlanValidator::new("s", "10.0.0.0/8").name(), "address plan");
    }
}
