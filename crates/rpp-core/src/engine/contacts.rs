//! Contact lifecycle engine
//!
//! Contacts are created from a structured name, read by handle, and
//! deleted. They are never mutated. The registry-operator contact is
//! permanently immutable.

use std::sync::Arc;

use tracing::info;

use crate::config::RegistryConfig;
use crate::error::{Error, Result};
use crate::schema::ContactCreate;
use crate::traits::registry_store::{ContactRecord, RegistryStore};

/// Contact lifecycle engine
pub struct ContactEngine {
    store: Arc<dyn RegistryStore>,
    config: Arc<RegistryConfig>,
}

impl ContactEngine {
    pub fn new(store: Arc<dyn RegistryStore>, config: Arc<RegistryConfig>) -> Self {
        Self { store, config }
    }

    /// Full record of a contact
    pub async fn info(&self, handle: u64) -> Result<ContactRecord> {
        let mut tx = self.store.begin().await?;
        let record = tx.find_contact(handle).await?;
        tx.rollback().await?;
        record.ok_or_else(|| Error::NotFound(format!("Contact {handle}")))
    }

    /// Create a contact from a structured name, returning the new handle
    pub async fn create(&self, body: &ContactCreate) -> Result<u64> {
        let name = body.full_name()?;

        let mut tx = self.store.begin().await?;
        if tx.count_contacts().await? >= self.config.max_contacts {
            tx.rollback().await?;
            return Err(Error::TooManyContacts);
        }
        let handle = tx.insert_contact(&name).await?;
        tx.commit().await?;

        info!(handle, "contact created");
        Ok(handle)
    }

    /// Delete a contact
    pub async fn delete(&self, handle: u64) -> Result<()> {
        if handle == self.config.operator_contact {
            return Err(Error::Immutable(handle.to_string()));
        }

        let mut tx = self.store.begin().await?;
        if tx.delete_contact(handle).await? == 0 {
            tx.rollback().await?;
            return Err(Error::DoesNotExist(handle.to_string()));
        }
        tx.commit().await?;

        info!(handle, "contact deleted");
        Ok(())
    }
}
