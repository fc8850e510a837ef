//! In-memory collaborators, used by the simulator front end and by tests.

use crate::{
    AccountId, BalanceListener, CaseDefinition, CatalogStore, ExperienceLedger, FundsLedger,
    GoalState, InventoryStore, LedgerError, NotificationKind, NotificationSink, PersistenceError,
    ProgressSnapshot, ProgressionStore, ResolvedOutcome, SubscriptionId,
};
use std::collections::{BTreeMap, HashMap};

#[derive(Default)]
pub struct MemoryLedger {
    balances: HashMap<AccountId, f64>,
    listeners: Vec<(SubscriptionId, BalanceListener)>,
    next_listener: u64,
    offline: bool,
    withdrawals: u32,
}

impl MemoryLedger {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_balance(account: &AccountId, balance: f64) -> Self {
        let mut ledger = Self::new();
        ledger.balances.insert(account.clone(), balance);
        ledger
    }

    /// While offline every call fails with [`LedgerError::Unavailable`].
    pub fn set_offline(&mut self, offline: bool) {
        self.offline = offline;
    }

    pub fn peek(&self, account: &AccountId) -> f64 {
        self.balances.get(account).copied().unwrap_or(0.0)
    }

    pub fn withdrawals(&self) -> u32 {
        self.withdrawals
    }

    fn check_online(&self) -> Result<(), LedgerError> {
        if self.offline {
            return Err(LedgerError::Unavailable("ledger offline".to_string()));
        }
        Ok(())
    }

    fn publish(&mut self, balance: f64) {
        for (_, listener) in &mut self.listeners {
            listener(balance);
        }
    }
}

impl FundsLedger for MemoryLedger {
    fn balance(&mut self, account: &AccountId) -> Result<f64, LedgerError> {
        self.check_online()?;
        Ok(self.peek(account))
    }

    fn withdraw(&mut self, account: &AccountId, amount: f64) -> Result<f64, LedgerError> {
        self.check_online()?;
        let current = self.peek(account);
        if amount < 0.0 || current < amount {
            return Err(LedgerError::Rejected(format!(
                "cannot withdraw {amount:.2} from {current:.2}"
            )));
        }
        let balance = current - amount;
        self.balances.insert(account.clone(), balance);
        self.withdrawals += 1;
        self.publish(balance);
        Ok(balance)
    }

    fn credit(&mut self, account: &AccountId, amount: f64) -> Result<f64, LedgerError> {
        self.check_online()?;
        if amount < 0.0 {
            return Err(LedgerError::Rejected(format!("negative credit {amount:.2}")));
        }
        let balance = self.peek(account) + amount;
        self.balances.insert(account.clone(), balance);
        self.publish(balance);
        Ok(balance)
    }

    fn on_balance_changed(&mut self, listener: BalanceListener) -> SubscriptionId {
        let id = SubscriptionId(self.next_listener);
        self.next_listener += 1;
        self.listeners.push((id, listener));
        id
    }

    fn unsubscribe(&mut self, id: SubscriptionId) {
        self.listeners.retain(|(existing, _)| *existing != id);
    }
}

#[derive(Debug, Default)]
pub struct MemoryCatalog {
    cases: BTreeMap<String, CaseDefinition>,
}

impl MemoryCatalog {
    pub fn new(cases: impl IntoIterator<Item = CaseDefinition>) -> Self {
        Self {
            cases: cases.into_iter().map(|case| (case.id.clone(), case)).collect(),
        }
    }
}

impl CatalogStore for MemoryCatalog {
    fn load_catalog(&mut self, case_id: &str) -> Result<CaseDefinition, PersistenceError> {
        self.cases
            .get(case_id)
            .cloned()
            .ok_or_else(|| PersistenceError::Catalog(format!("unknown case {case_id}")))
    }
}

#[derive(Debug, Default)]
pub struct MemoryInventory {
    items: Vec<(AccountId, ResolvedOutcome)>,
    failing: bool,
}

impl MemoryInventory {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_failing(&mut self, failing: bool) {
        self.failing = failing;
    }

    pub fn items(&self, account: &AccountId) -> Vec<&ResolvedOutcome> {
        self.items
            .iter()
            .filter(|(owner, _)| owner == account)
            .map(|(_, item)| item)
            .collect()
    }

    /// Removes and returns every item owned by `account`.
    pub fn take_all(&mut self, account: &AccountId) -> Vec<ResolvedOutcome> {
        let (taken, kept): (Vec<_>, Vec<_>) = std::mem::take(&mut self.items)
            .into_iter()
            .partition(|(owner, _)| owner == account);
        self.items = kept;
        taken.into_iter().map(|(_, item)| item).collect()
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}

impl InventoryStore for MemoryInventory {
    fn append_item(
        &mut self,
        account: &AccountId,
        outcome: &ResolvedOutcome,
    ) -> Result<(), PersistenceError> {
        if self.failing {
            return Err(PersistenceError::Inventory("inventory offline".to_string()));
        }
        self.items.push((account.clone(), outcome.clone()));
        Ok(())
    }
}

#[derive(Debug, Default)]
pub struct MemoryProgressStore {
    rows: BTreeMap<(AccountId, String), GoalState>,
    seen: HashMap<AccountId, Vec<String>>,
    saves: u32,
    failing: bool,
}

impl MemoryProgressStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_failing(&mut self, failing: bool) {
        self.failing = failing;
    }

    pub fn row(&self, account: &AccountId, id: &str) -> Option<&GoalState> {
        self.rows.get(&(account.clone(), id.to_string()))
    }

    pub fn seen_cases(&self, account: &AccountId) -> &[String] {
        self.seen.get(account).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn saves(&self) -> u32 {
        self.saves
    }

    fn check(&self) -> Result<(), PersistenceError> {
        if self.failing {
            return Err(PersistenceError::Progress("progress store offline".to_string()));
        }
        Ok(())
    }
}

impl ProgressionStore for MemoryProgressStore {
    fn load_progress(&mut self, account: &AccountId) -> Result<ProgressSnapshot, PersistenceError> {
        self.check()?;
        let goals = self
            .rows
            .iter()
            .filter(|((owner, _), _)| owner == account)
            .map(|(_, state)| state.clone())
            .collect();
        Ok(ProgressSnapshot {
            goals,
            seen_cases: self.seen_cases(account).to_vec(),
        })
    }

    fn save_progress(
        &mut self,
        account: &AccountId,
        state: &GoalState,
    ) -> Result<(), PersistenceError> {
        self.check()?;
        self.saves += 1;
        self.rows
            .insert((account.clone(), state.id.clone()), state.clone());
        Ok(())
    }

    fn save_seen_cases(
        &mut self,
        account: &AccountId,
        case_ids: &[String],
    ) -> Result<(), PersistenceError> {
        self.check()?;
        self.seen.insert(account.clone(), case_ids.to_vec());
        Ok(())
    }
}

#[derive(Debug, Default)]
pub struct MemoryExperience {
    totals: HashMap<AccountId, u64>,
    failing: bool,
}

impl MemoryExperience {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_total(account: &AccountId, total: u64) -> Self {
        let mut ledger = Self::new();
        ledger.totals.insert(account.clone(), total);
        ledger
    }

    pub fn set_failing(&mut self, failing: bool) {
        self.failing = failing;
    }

    pub fn peek(&self, account: &AccountId) -> u64 {
        self.totals.get(account).copied().unwrap_or(0)
    }
}

impl ExperienceLedger for MemoryExperience {
    fn experience(&mut self, account: &AccountId) -> Result<u64, PersistenceError> {
        Ok(self.peek(account))
    }

    fn set_experience(&mut self, account: &AccountId, total: u64) -> Result<(), PersistenceError> {
        if self.failing {
            return Err(PersistenceError::Experience("experience store offline".to_string()));
        }
        self.totals.insert(account.clone(), total);
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Notification {
    pub kind: NotificationKind,
    pub title: String,
    pub detail: String,
}

#[derive(Debug, Default)]
pub struct MemoryNotifier {
    pub sent: Vec<Notification>,
}

impl MemoryNotifier {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn count(&self, kind: NotificationKind) -> usize {
        self.sent.iter().filter(|note| note.kind == kind).count()
    }
}

impl NotificationSink for MemoryNotifier {
    fn notify(&mut self, kind: NotificationKind, title: &str, detail: &str) {
        self.sent.push(Notification {
            kind,
            title: title.to_string(),
            detail: detail.to_string(),
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::RefCell;
    use std::rc::Rc;

    #[test]
    fn ledger_publishes_balance_changes() {
        let account = AccountId::new("u1");
        let mut ledger = MemoryLedger::with_balance(&account, 10.0);
        let seen = Rc::new(RefCell::new(Vec::new()));
        let sink = Rc::clone(&seen);
        let id = ledger.on_balance_changed(Box::new(move |balance| sink.borrow_mut().push(balance)));

        assert_eq!(ledger.withdraw(&account, 2.5), Ok(7.5));
        assert_eq!(ledger.credit(&account, 1.0), Ok(8.5));
        ledger.unsubscribe(id);
        ledger.credit(&account, 1.0).expect("credit");

        assert_eq!(*seen.borrow(), vec![7.5, 8.5]);
        assert_eq!(ledger.withdrawals(), 1);
    }

    #[test]
    fn ledger_refuses_overdraft() {
        let account = AccountId::new("u1");
        let mut ledger = MemoryLedger::with_balance(&account, 1.0);
        assert!(matches!(
            ledger.withdraw(&account, 2.0),
            Err(LedgerError::Rejected(_))
        ));
        assert_eq!(ledger.peek(&account), 1.0);
        ledger.set_offline(true);
        assert!(matches!(
            ledger.balance(&account),
            Err(LedgerError::Unavailable(_))
        ));
    }

    #[test]
    fn progress_rows_are_per_account() {
        let a = AccountId::new("a");
        let b = AccountId::new("b");
        let mut store = MemoryProgressStore::new();
        store
            .save_progress(&a, &GoalState::new("first_case"))
            .expect("save");
        store.save_seen_cases(&a, &["gamma".to_string()]).expect("seen");
        assert_eq!(store.load_progress(&a).expect("load").goals.len(), 1);
        assert_eq!(store.load_progress(&a).expect("load").seen_cases, vec!["gamma"]);
        assert!(store.load_progress(&b).expect("load").goals.is_empty());
    }
}
