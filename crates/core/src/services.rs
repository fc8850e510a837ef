//! Contracts for everything the core consumes but does not own: money,
//! catalogs, inventory rows, progression rows, experience and notifications.
//!
//! All calls are synchronous from the core's point of view. A front end with
//! asynchronous storage awaits its IO and then feeds the result into the
//! same state machine transitions.

use crate::{CaseDefinition, GoalState, ResolvedOutcome};
use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct AccountId(pub String);

impl AccountId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }
}

impl fmt::Display for AccountId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[derive(Debug, Error, Clone, PartialEq)]
pub enum LedgerError {
    #[error("ledger rejected the request: {0}")]
    Rejected(String),
    #[error("ledger unavailable: {0}")]
    Unavailable(String),
}

#[derive(Debug, Error, Clone, PartialEq)]
pub enum PersistenceError {
    #[error("catalog unavailable: {0}")]
    Catalog(String),
    #[error("inventory write failed: {0}")]
    Inventory(String),
    #[error("progress write failed: {0}")]
    Progress(String),
    #[error("experience write failed: {0}")]
    Experience(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct SubscriptionId(pub u64);

pub type BalanceListener = Box<dyn FnMut(f64)>;

pub trait FundsLedger {
    fn balance(&mut self, account: &AccountId) -> Result<f64, LedgerError>;
    /// Returns the balance after the withdrawal.
    fn withdraw(&mut self, account: &AccountId, amount: f64) -> Result<f64, LedgerError>;
    /// Returns the balance after the credit.
    fn credit(&mut self, account: &AccountId, amount: f64) -> Result<f64, LedgerError>;
    fn on_balance_changed(&mut self, listener: BalanceListener) -> SubscriptionId;
    fn unsubscribe(&mut self, id: SubscriptionId);
}

pub trait CatalogStore {
    fn load_catalog(&mut self, case_id: &str) -> Result<CaseDefinition, PersistenceError>;
}

pub trait InventoryStore {
    fn append_item(
        &mut self,
        account: &AccountId,
        outcome: &ResolvedOutcome,
    ) -> Result<(), PersistenceError>;
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ProgressSnapshot {
    #[serde(default)]
    pub goals: Vec<GoalState>,
    #[serde(default)]
    pub seen_cases: Vec<String>,
}

pub trait ProgressionStore {
    fn load_progress(&mut self, account: &AccountId) -> Result<ProgressSnapshot, PersistenceError>;
    fn save_progress(&mut self, account: &AccountId, state: &GoalState)
        -> Result<(), PersistenceError>;
    fn save_seen_cases(
        &mut self,
        account: &AccountId,
        case_ids: &[String],
    ) -> Result<(), PersistenceError>;
}

pub trait ExperienceLedger {
    fn experience(&mut self, account: &AccountId) -> Result<u64, PersistenceError>;
    fn set_experience(&mut self, account: &AccountId, total: u64) -> Result<(), PersistenceError>;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NotificationKind {
    Quest,
    Achievement,
    LevelUp,
    Error,
}

/// Fire-and-forget user-facing messages.
pub trait NotificationSink {
    fn notify(&mut self, kind: NotificationKind, title: &str, detail: &str);
}

/// Collaborators for one account session, passed explicitly to every
/// operation that touches the outside world.
pub struct Services<'a> {
    pub account: &'a AccountId,
    pub ledger: &'a mut dyn FundsLedger,
    pub inventory: &'a mut dyn InventoryStore,
    pub progress: &'a mut dyn ProgressionStore,
    pub experience: &'a mut dyn ExperienceLedger,
    pub notifier: &'a mut dyn NotificationSink,
}
