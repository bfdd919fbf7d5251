//! Configuration types for the registry core
//!
//! This module defines the configuration consumed by the lifecycle engines
//! and the router. Transport and storage configuration live with their
//! respective collaborators.

use serde::{Deserialize, Serialize};

/// Registry configuration
///
/// The registry manages a single top-level label. Quotas are hard ceilings
/// checked before every creation attempt.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RegistryConfig {
    /// Top-level label every domain must end with (without the leading dot)
    #[serde(default = "default_tld")]
    pub tld: String,

    /// Maximum number of domains the registry accepts
    #[serde(default = "default_max_domains")]
    pub max_domains: u64,

    /// Maximum number of contacts the registry accepts
    #[serde(default = "default_max_contacts")]
    pub max_contacts: u64,

    /// Handle of the registry-operator contact, which can never be deleted
    #[serde(default = "default_operator_contact")]
    pub operator_contact: u64,
}

impl RegistryConfig {
    /// Create a configuration with defaults
    pub fn new() -> Self {
        Self {
            tld: default_tld(),
            max_domains: default_max_domains(),
            max_contacts: default_max_contacts(),
            operator_contact: default_operator_contact(),
        }
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<(), crate::Error> {
        if self.tld.is_empty() {
            return Err(crate::Error::internal("Top-level label cannot be empty"));
        }
        if self.tld.contains('.') {
            return Err(crate::Error::internal(
                "Top-level label must be a single label",
            ));
        }
        if self.max_domains == 0 || self.max_contacts == 0 {
            return Err(crate::Error::internal("Quotas must be greater than zero"));
        }
        Ok(())
    }

    /// The permanently immutable registry service domain
    pub fn nic_domain(&self) -> String {
        format!("nic.{}", self.tld)
    }

    /// The suffix every registered name must carry
    pub fn tld_suffix(&self) -> String {
        format!(".{}", self.tld)
    }
}

impl Default for RegistryConfig {
    fn default() -> Self {
        Self::new()
    }
}

fn default_tld() -> String {
    "example".to_string()
}

fn default_max_domains() -> u64 {
    5000
}

fn default_max_contacts() -> u64 {
    5000
}

fn default_operator_contact() -> u64 {
    1
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_sane() {
        let cfg = RegistryConfig::default();
        assert_eq!(cfg.tld, "example");
        assert_eq!(cfg.max_domains, 5000);
        assert_eq!(cfg.max_contacts, 5000);
        assert_eq!(cfg.operator_contact, 1);
        assert!(cfg.validate().is_ok());
        assert_eq!(cfg.nic_domain(), "nic.example");
        assert_eq!(cfg.tld_suffix(), ".example");
    }

    #[test]
    fn rejects_empty_or_dotted_tld() {
        let mut cfg = RegistryConfig::default();
        cfg.tld = String::new();
        assert!(cfg.validate().is_err());

        cfg.tld = "co.example".to_string();
        assert!(cfg.validate().is_err());
    }

    #[test]
    fn rejects_zero_quotas() {
        let mut cfg = RegistryConfig::default();
        cfg.max_domains = 0;
        assert!(cfg.validate().is_err());
    }

    #[test]
    fn deserializes_with_partial_fields() {
        let cfg: RegistryConfig = serde_json::from_str(r#"{"tld": "test"}"#).unwrap();
        assert_eq!(cfg.tld, "test");
        assert_eq!(cfg.max_domains, 5000);
    }
}
