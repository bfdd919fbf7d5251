//! Transfer state machine
//!
//! A domain transfer moves through: no open transfer, pending (one row with
//! `completed = false`), then either approved (row completed, domain
//! reassigned) or removed by cancellation/rejection. At most one pending
//! transfer exists per domain; the store enforces that on insertion.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use tracing::info;

use crate::error::{Error, Result};
use crate::traits::registry_store::{DomainRecord, RegistryStore, StoreError, StoreTx};

/// Sub-actions on a pending transfer
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransferAction {
    /// Withdrawn by the requesting registrar
    Cancelation,
    /// Accepted by the current registrar; the domain changes hands
    Approval,
    /// Refused by the current registrar
    Rejection,
}

impl TransferAction {
    /// Parse the action segment of a transfer path
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "cancelation" => Some(Self::Cancelation),
            "approval" => Some(Self::Approval),
            "rejection" => Some(Self::Rejection),
            _ => None,
        }
    }

    /// Past-tense verb for the wire message
    pub fn done(&self) -> &'static str {
        match self {
            Self::Cancelation => "cancelled",
            Self::Approval => "approved",
            Self::Rejection => "rejected",
        }
    }
}

/// State of a domain's transfer, as reported to a query
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TransferStatus {
    /// No open transfer
    None,
    /// One pending transfer
    Pending {
        winner: u32,
        since: DateTime<Utc>,
    },
}

/// Outcome of a transfer request
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TransferRequested {
    /// The requester already sponsors the domain; nothing was created
    AlreadyOwner,
    /// A pending transfer already exists; nothing was created
    AlreadyPending {
        winner: u32,
        since: DateTime<Utc>,
    },
    /// A pending transfer was created for the requester
    Started,
}

/// Transfer state machine
pub struct TransferEngine {
    store: Arc<dyn RegistryStore>,
}

impl TransferEngine {
    pub fn new(store: Arc<dyn RegistryStore>) -> Self {
        Self { store }
    }

    async fn require_domain(
        tx: &mut Box<dyn StoreTx>,
        name: &str,
    ) -> Result<DomainRecord> {
        tx.find_domain(name)
            .await?
            .ok_or_else(|| Error::NotFound(format!("Domain {name}")))
    }

    /// Report the pending transfer of a domain, if any
    pub async fn query(&self, name: &str) -> Result<TransferStatus> {
        let mut tx = self.store.begin().await?;
        Self::require_domain(&mut tx, name).await?;
        let pending = tx.find_pending_transfer(name).await?;
        tx.rollback().await?;

        Ok(match pending {
            Some(t) => TransferStatus::Pending {
                winner: t.winner,
                since: t.created,
            },
            None => TransferStatus::None,
        })
    }

    /// Request a transfer of the domain to the calling registrar
    pub async fn request(&self, name: &str, registrar: u32) -> Result<TransferRequested> {
        let mut tx = self.store.begin().await?;
        let domain = Self::require_domain(&mut tx, name).await?;

        if domain.registrar == registrar {
            tx.rollback().await?;
            return Ok(TransferRequested::AlreadyOwner);
        }
        if let Some(pending) = tx.find_pending_transfer(name).await? {
            tx.rollback().await?;
            return Ok(TransferRequested::AlreadyPending {
                winner: pending.winner,
                since: pending.created,
            });
        }

        match tx.insert_transfer(name, registrar).await {
            Ok(_) => {}
            // The snapshot held no pending row, so a duplicate here means a
            // concurrent request won; surface it as a conflict.
            Err(StoreError::AlreadyExists) => {
                tx.rollback().await?;
                return Err(Error::Conflict);
            }
            Err(e) => {
                tx.rollback().await?;
                return Err(e.into());
            }
        }
        tx.commit().await?;

        info!(domain = name, winner = registrar, "transfer requested");
        Ok(TransferRequested::Started)
    }

    /// Resolve the pending transfer of a domain
    ///
    /// Cancellation requires the caller to be the transfer's initiator;
    /// approval and rejection require the current sponsoring registrar.
    /// Approval completes the row and reassigns the domain in one
    /// transaction: if either write does not affect exactly one row, the
    /// whole transition is rolled back.
    pub async fn resolve(&self, name: &str, action: TransferAction, registrar: u32) -> Result<()> {
        let mut tx = self.store.begin().await?;
        let domain = Self::require_domain(&mut tx, name).await?;

        let pending = match tx.find_pending_transfer(name).await? {
            Some(pending) => pending,
            None => {
                tx.rollback().await?;
                return Err(Error::NoPendingTransfer(name.to_string()));
            }
        };

        match action {
            TransferAction::Cancelation => {
                if pending.winner != registrar {
                    tx.rollback().await?;
                    return Err(Error::NotYourTransfer);
                }
                if tx.delete_pending_transfer(name).await? != 1 {
                    tx.rollback().await?;
                    return Err(Error::internal("Delete of transfer failed"));
                }
            }
            TransferAction::Approval => {
                if domain.registrar != registrar {
                    tx.rollback().await?;
                    return Err(Error::NotCurrentRegistrar);
                }
                if tx.complete_transfer(name).await? != 1 {
                    tx.rollback().await?;
                    return Err(Error::internal("Update of transfer failed"));
                }
                if tx.reassign_domain(name, pending.winner).await? != 1 {
                    tx.rollback().await?;
                    return Err(Error::internal(format!("Update of {name} failed")));
                }
            }
            TransferAction::Rejection => {
                if domain.registrar != registrar {
                    tx.rollback().await?;
                    return Err(Error::NotCurrentRegistrar);
                }
                if tx.delete_pending_transfer(name).await? != 1 {
                    tx.rollback().await?;
                    return Err(Error::internal("Delete of transfer failed"));
                }
            }
        }
        tx.commit().await?;

        info!(domain = name, registrar, action = action.done(), "transfer resolved");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_actions() {
        assert_eq!(
            TransferAction::parse("cancelation"),
            Some(TransferAction::Cancelation)
        );
        assert_eq!(
            TransferAction::parse("approval"),
            Some(TransferAction::Approval)
        );
        assert_eq!(
            TransferAction::parse("rejection"),
            Some(TransferAction::Rejection)
        );
        assert_eq!(TransferAction::parse("escalation"), None);
        // The protocol spells it with one l
        assert_eq!(TransferAction::parse("cancellation"), None);
    }
}
