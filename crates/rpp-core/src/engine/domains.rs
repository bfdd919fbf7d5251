//! Domain lifecycle engine
//!
//! Availability checks, creation validation, read, patch and delete rules.
//! Names reaching this engine are lowercase and end with the configured
//! top-level label; the router enforces that before dispatching.

use std::sync::Arc;

use tracing::{debug, info};

use crate::config::RegistryConfig;
use crate::error::{Error, Result, Unregisterable};
use crate::schema::{DomainCreate, DomainPatch};
use crate::traits::registry_store::{ContactRole, DomainRecord, NewDomain, RegistryStore, StoreError};

/// Outcome of an availability check on a name
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Availability {
    /// The name is already registered
    Registered,
    /// The name is free and passes the registerability rule
    Registerable,
    /// The name is free but refused registration
    Unregisterable(Unregisterable),
}

/// Check the registerability rule on a not-yet-registered name
///
/// The first label must be at least two characters and must not start
/// with a zero.
pub fn registerable(name: &str) -> std::result::Result<(), Unregisterable> {
    let label = name.split('.').next().unwrap_or("");
    if label.len() < 2 {
        Err(Unregisterable::LabelTooShort)
    } else if label.starts_with('0') {
        Err(Unregisterable::LeadingZero)
    } else {
        Ok(())
    }
}

/// Domain lifecycle engine
pub struct DomainEngine {
    store: Arc<dyn RegistryStore>,
    config: Arc<RegistryConfig>,
}

impl DomainEngine {
    pub fn new(store: Arc<dyn RegistryStore>, config: Arc<RegistryConfig>) -> Self {
        Self { store, config }
    }

    /// Whether the name is registered
    pub async fn exists(&self, name: &str) -> Result<bool> {
        let mut tx = self.store.begin().await?;
        let found = tx.find_domain(name).await?.is_some();
        tx.rollback().await?;
        Ok(found)
    }

    /// Full record of a registered domain
    pub async fn info(&self, name: &str) -> Result<DomainRecord> {
        let mut tx = self.store.begin().await?;
        let record = tx.find_domain(name).await?;
        tx.rollback().await?;
        record.ok_or_else(|| Error::NotFound(format!("Domain {name}")))
    }

    /// All registered names
    pub async fn list(&self) -> Result<Vec<String>> {
        let mut tx = self.store.begin().await?;
        let names = tx.list_domains().await?;
        tx.rollback().await?;
        Ok(names)
    }

    /// Availability of a name, with the registerability verdict for free names
    pub async fn availability(&self, name: &str) -> Result<Availability> {
        if self.exists(name).await? {
            return Ok(Availability::Registered);
        }
        Ok(match registerable(name) {
            Ok(()) => Availability::Registerable,
            Err(reason) => Availability::Unregisterable(reason),
        })
    }

    /// Register a domain under the authenticated registrar
    pub async fn create(&self, name: &str, body: &DomainCreate, registrar: u32) -> Result<()> {
        let mut tx = self.store.begin().await?;

        if tx.count_domains().await? >= self.config.max_domains {
            tx.rollback().await?;
            return Err(Error::TooManyDomains);
        }
        if tx.find_domain(name).await?.is_some() {
            tx.rollback().await?;
            return Err(Error::AlreadyExists(name.to_string()));
        }
        if let Err(reason) = registerable(name) {
            tx.rollback().await?;
            return Err(Error::NotRegisterable {
                name: name.to_string(),
                reason,
            });
        }

        let insert = tx
            .insert_domain(NewDomain {
                name: name.to_string(),
                holder: body.holder.clone(),
                tech: body.tech.clone(),
                admin: body.admin.clone(),
                registrar,
            })
            .await;
        match insert {
            Ok(()) => {}
            Err(StoreError::AlreadyExists) => {
                tx.rollback().await?;
                return Err(Error::AlreadyExists(name.to_string()));
            }
            Err(e) => {
                tx.rollback().await?;
                return Err(e.into());
            }
        }
        tx.commit().await?;

        info!(domain = name, registrar, "domain created");
        Ok(())
    }

    /// Apply a patch to the mutable contact references
    ///
    /// Each field present must affect exactly one row; otherwise the whole
    /// operation fails and no update from this request survives.
    pub async fn patch(&self, name: &str, patch: &DomainPatch, registrar: u32) -> Result<()> {
        let mut tx = self.store.begin().await?;

        let record = match tx.find_domain(name).await? {
            Some(record) => record,
            None => {
                tx.rollback().await?;
                return Err(Error::NotFound(format!("Domain {name}")));
            }
        };
        if record.registrar != registrar {
            tx.rollback().await?;
            return Err(Error::NotOwner {
                caller: registrar,
                domain: name.to_string(),
                owner: record.registrar,
            });
        }

        for (role, handle) in [
            (ContactRole::Tech, &patch.change.tech),
            (ContactRole::Admin, &patch.change.admin),
        ] {
            if let Some(handle) = handle {
                let rows = tx.update_domain_contact(name, role, handle).await?;
                if rows != 1 {
                    tx.rollback().await?;
                    return Err(Error::internal(format!(
                        "Update of {} contact failed",
                        role.as_str()
                    )));
                }
            }
        }
        tx.commit().await?;

        debug!(domain = name, "domain patched");
        Ok(())
    }

    /// Delete a domain sponsored by the caller
    pub async fn delete(&self, name: &str, registrar: u32) -> Result<()> {
        let mut tx = self.store.begin().await?;

        let record = match tx.find_domain(name).await? {
            Some(record) => record,
            None => {
                tx.rollback().await?;
                return Err(Error::DoesNotExist(name.to_string()));
            }
        };
        if record.registrar != registrar {
            tx.rollback().await?;
            return Err(Error::NotOwner {
                caller: registrar,
                domain: name.to_string(),
                owner: record.registrar,
            });
        }
        if name == self.config.nic_domain() {
            tx.rollback().await?;
            return Err(Error::Immutable(name.to_string()));
        }

        if tx.delete_domain(name).await? == 0 {
            tx.rollback().await?;
            return Err(Error::DoesNotExist(name.to_string()));
        }
        tx.commit().await?;

        info!(domain = name, registrar, "domain deleted");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn registerability_rule() {
        assert!(registerable("ab.example").is_ok());
        assert!(registerable("longname.example").is_ok());
        assert_eq!(
            registerable("a.example"),
            Err(Unregisterable::LabelTooShort)
        );
        assert_eq!(
            registerable("0ab.example"),
            Err(Unregisterable::LeadingZero)
        );
        // Only the first character matters for the zero rule
        assert!(registerable("a0.example").is_ok());
    }
}
