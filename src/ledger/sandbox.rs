//! The transactional overlay a strand executes against.
//!
//! A sandbox is created once per strand, mutated freely by the steps it is
//! handed to, reset any number of times (§4.8's inline-reset discipline),
//! and finally either discarded (the strand was dry) or merged into the
//! parent view (the strand succeeded). `reset` is the operation the whole
//! two-pass executor hinges on: it must roll back every overlay write *and*
//! every hook adjustment in one step, since a bound step invalidates
//! everything a later step inferred about account balances or reserve
//! counts.

use hashbrown::{HashMap, HashSet};

use crate::amount::Amount;
use crate::types::{AccountId, Issue};

use super::exceptions::LedgerError;
use super::keys::LedgerKey;
use super::objects::LedgerEntry;
use super::view::View;

/// Transaction identity threaded through by the driver once per payment.
pub type TxHash = [u8; 32];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct TransactionContext {
    pub tx_hash: TxHash,
    pub ledger_seq: u32,
}

/// A layered, resettable view over a parent [`View`].
pub struct Sandbox<'a> {
    parent: &'a dyn View,
    overlay: HashMap<LedgerKey, Option<LedgerEntry>>,
    credits: HashMap<(AccountId, Issue), Amount>,
    owner_count_adjustments: HashMap<AccountId, i64>,
    context: TransactionContext,
}

impl<'a> Sandbox<'a> {
    pub fn new(parent: &'a dyn View, context: TransactionContext) -> Self {
        Sandbox {
            parent,
            overlay: HashMap::new(),
            credits: HashMap::new(),
            owner_count_adjustments: HashMap::new(),
            context,
        }
    }

    pub fn read(&self, key: &LedgerKey) -> Option<LedgerEntry> {
        match self.overlay.get(key) {
            Some(Some(entry)) => Some(entry.clone()),
            Some(None) => None,
            None => self.parent.read(key),
        }
    }

    pub fn exists(&self, key: &LedgerKey) -> bool {
        self.read(key).is_some()
    }

    pub fn insert(&mut self, key: LedgerKey, entry: LedgerEntry) -> Result<(), LedgerError> {
        if self.exists(&key) {
            return Err(LedgerError::AlreadyExists);
        }
        self.overlay.insert(key, Some(entry));
        Ok(())
    }

    pub fn update(&mut self, key: LedgerKey, entry: LedgerEntry) -> Result<(), LedgerError> {
        if !self.exists(&key) {
            return Err(LedgerError::NotFound);
        }
        self.overlay.insert(key, Some(entry));
        Ok(())
    }

    /// Inserts or replaces `key` unconditionally — used by call sites that
    /// have already confirmed presence/absence via a prior `read`.
    pub fn put(&mut self, key: LedgerKey, entry: LedgerEntry) {
        self.overlay.insert(key, Some(entry));
    }

    pub fn erase(&mut self, key: &LedgerKey) {
        self.overlay.insert(*key, None);
    }

    /// Visits the union of overlay and parent entries, overlay winning and
    /// tombstoned keys suppressed.
    pub fn for_each(&self, mut visitor: impl FnMut(&LedgerKey, &LedgerEntry)) {
        let mut seen: HashSet<LedgerKey> = HashSet::new();
        for (key, value) in self.overlay.iter() {
            seen.insert(*key);
            if let Some(entry) = value {
                visitor(key, entry);
            }
        }
        self.parent.for_each(&mut |key, entry| {
            if !seen.contains(key) {
                visitor(key, entry);
            }
        });
    }

    /// Discards every overlay mutation and every hook adjustment recorded
    /// since the sandbox (or its last reset) began.
    pub fn reset(&mut self) {
        self.overlay.clear();
        self.credits.clear();
        self.owner_count_adjustments.clear();
    }

    /// Records that `amount` moved from `src` to `dst`; later `balance_hook`
    /// lookups for `dst` (and debits against `src`, via the negated entry)
    /// reflect this before it is materialized into a stored balance blob.
    pub fn credit_hook(&mut self, src: AccountId, dst: AccountId, amount: &Amount) {
        let issue = amount.issue();
        let dst_entry = self.credits.entry((dst, issue)).or_insert_with(|| amount.zero_like());
        *dst_entry = dst_entry.add(amount).unwrap_or(*dst_entry);
        let src_entry = self.credits.entry((src, issue)).or_insert_with(|| amount.zero_like());
        *src_entry = src_entry.sub(amount).unwrap_or(*src_entry);
    }

    /// Adjusts a stored balance by whatever `credit_hook` has accumulated
    /// for `account`/`issue` so far this sandbox generation.
    pub fn balance_hook(&self, account: AccountId, issue: Issue, stored: &Amount) -> Amount {
        match self.credits.get(&(account, issue)) {
            Some(delta) => stored.add(delta).unwrap_or(*stored),
            None => *stored,
        }
    }

    pub fn adjust_owner_count(&mut self, account: AccountId, delta: i64) {
        *self.owner_count_adjustments.entry(account).or_insert(0) += delta;
    }

    /// Adjusts a stored owner count by the net of insertions/deletions of
    /// ownable entries recorded against `account` this sandbox generation.
    pub fn owner_count_hook(&self, account: AccountId, stored: u32) -> u32 {
        let delta = self.owner_count_adjustments.get(&account).copied().unwrap_or(0);
        (stored as i64 + delta).max(0) as u32
    }

    pub fn transaction_context(&self) -> TransactionContext {
        self.context
    }

    /// Folds every overlay write, credit, and owner-count adjustment `other`
    /// recorded into `self`. Both sandboxes must share the same `parent`
    /// view; `other`'s maps already hold only the diff against it, so the
    /// fold is a straight union with `other` winning on key collisions.
    pub fn absorb(&mut self, other: Sandbox<'a>) {
        for (key, value) in other.overlay {
            self.overlay.insert(key, value);
        }
        for ((account, issue), delta) in other.credits {
            let entry = self.credits.entry((account, issue)).or_insert_with(|| delta.zero_like());
            *entry = entry.add(&delta).unwrap_or(*entry);
        }
        for (account, delta) in other.owner_count_adjustments {
            *self.owner_count_adjustments.entry(account).or_insert(0) += delta;
        }
    }
}
