//! In-memory ledger object shapes (`AccountRoot`, `TrustLine`, `Offer`).
//!
//! Field sets mirror the wire ledger objects (`models/ledger/objects/*.rs`
//! in spirit), but carry the core's own richly-typed `Amount`/`AccountId`/
//! `Currency` rather than serialized blobs — blob (de)serialization is an
//! external collaborator the core never touches (see crate docs).

use serde::{Deserialize, Serialize};

use crate::amount::Amount;
use crate::quality::Quality;
use crate::types::{AccountId, Currency};

/// Per-side flags on a trust line.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct TrustLineSideFlags {
    /// Set when this side's reserve slot was charged by auto-creation.
    pub reserve: bool,
    pub no_ripple: bool,
    pub freeze: bool,
    pub auth: bool,
}

/// A bilateral trust line between two accounts, balance stored from the
/// low account's perspective: positive means low is owed by high.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrustLine {
    pub low: AccountId,
    pub high: AccountId,
    pub currency: Currency,
    pub balance: Amount,
    pub low_limit: Amount,
    pub high_limit: Amount,
    pub low_flags: TrustLineSideFlags,
    pub high_flags: TrustLineSideFlags,
    /// 0 encodes 1.0, the ledger's quality-rate convention.
    pub low_quality_in: u32,
    pub low_quality_out: u32,
    pub high_quality_in: u32,
    pub high_quality_out: u32,
}

impl TrustLine {
    pub fn is_low(&self, account: AccountId) -> bool {
        account == self.low
    }

    pub fn other(&self, account: AccountId) -> AccountId {
        if account == self.low {
            self.high
        } else {
            self.low
        }
    }

    pub fn flags(&self, account: AccountId) -> TrustLineSideFlags {
        if self.is_low(account) {
            self.low_flags
        } else {
            self.high_flags
        }
    }

    pub fn flags_mut(&mut self, account: AccountId) -> &mut TrustLineSideFlags {
        if self.is_low(account) {
            &mut self.low_flags
        } else {
            &mut self.high_flags
        }
    }

    pub fn limit(&self, account: AccountId) -> &Amount {
        if self.is_low(account) {
            &self.low_limit
        } else {
            &self.high_limit
        }
    }

    /// The rate `account` applies when receiving (`qualityIn`); 0 encodes 1.0.
    pub fn quality_in(&self, account: AccountId) -> u32 {
        if self.is_low(account) {
            self.low_quality_in
        } else {
            self.high_quality_in
        }
    }

    /// The rate `account` applies when sending (`qualityOut`); 0 encodes 1.0.
    pub fn quality_out(&self, account: AccountId) -> u32 {
        if self.is_low(account) {
            self.low_quality_out
        } else {
            self.high_quality_out
        }
    }

    /// The balance `account` holds as a claim against the other side
    /// (positive ⇒ `account` is owed): the low side's claim is `balance`
    /// as stored; the high side's claim is its negation.
    pub fn balance_held_by(&self, account: AccountId) -> Amount {
        if self.is_low(account) {
            self.balance
        } else {
            self.balance.negate()
        }
    }

    pub fn limit_mut(&mut self, account: AccountId) -> &mut Amount {
        if self.is_low(account) {
            &mut self.low_limit
        } else {
            &mut self.high_limit
        }
    }

    /// True once neither side carries an auto-created reserve — the point
    /// at which the line itself should be deleted rather than kept at a
    /// zero balance.
    pub fn both_sides_reserve_free(&self) -> bool {
        !self.low_flags.reserve && !self.high_flags.reserve
    }
}

/// A limit order in an order book. `taker_pays`/`taker_gets` are the
/// remaining NET amounts (i.e. already excluding any transfer fee).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Offer {
    pub owner: AccountId,
    pub sequence: u32,
    pub taker_pays: Amount,
    pub taker_gets: Amount,
    /// Seconds since the XRPL epoch; 0 = no expiration.
    pub expiration: u32,
}

impl Offer {
    /// This offer's quality, `takerGets / takerPays` — larger is better for
    /// the taker (more output delivered per unit input).
    pub fn quality(&self) -> Result<Quality, crate::amount::AmountError> {
        Quality::from_amounts(&self.taker_gets, &self.taker_pays)
    }

    pub fn is_expired(&self, parent_close_time: u32) -> bool {
        parent_close_time > 0 && self.expiration != 0 && self.expiration <= parent_close_time
    }

    pub fn is_depleted(&self) -> bool {
        self.taker_pays.is_zero() || self.taker_gets.is_zero()
    }
}

/// Flags on an `AccountRoot`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct AccountRootFlags {
    pub require_auth: bool,
    pub global_freeze: bool,
    pub default_ripple: bool,
}

/// An account's root ledger entry: native balance, owner count, and the fee
/// it charges on its own issued currency.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AccountRoot {
    pub account: AccountId,
    /// Native balance, in drops.
    pub balance: i64,
    pub owner_count: u32,
    /// Parts-per-billion transfer rate; 0 encodes 1.0 (no fee).
    pub transfer_rate: u32,
    pub flags: AccountRootFlags,
}

impl AccountRoot {
    /// The rate as a parts-per-billion ratio with 0 normalized to 1.0
    /// (`1_000_000_000`), ready to feed `Amount::mul_ratio`.
    pub fn effective_transfer_rate(&self) -> u32 {
        if self.transfer_rate == 0 {
            QUALITY_ONE_PPB
        } else {
            self.transfer_rate
        }
    }
}

/// Parts-per-billion denominator matching a transfer rate of exactly 1.0.
pub const QUALITY_ONE_PPB: u32 = 1_000_000_000;

/// The sum type the sandbox actually stores per key.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum LedgerEntry {
    AccountRoot(AccountRoot),
    TrustLine(TrustLine),
    Offer(Offer),
}

impl LedgerEntry {
    pub fn as_account_root(&self) -> Option<&AccountRoot> {
        match self {
            LedgerEntry::AccountRoot(a) => Some(a),
            _ => None,
        }
    }

    pub fn as_trust_line(&self) -> Option<&TrustLine> {
        match self {
            LedgerEntry::TrustLine(t) => Some(t),
            _ => None,
        }
    }

    pub fn as_offer(&self) -> Option<&Offer> {
        match self {
            LedgerEntry::Offer(o) => Some(o),
            _ => None,
        }
    }

    pub fn into_account_root(self) -> Option<AccountRoot> {
        match self {
            LedgerEntry::AccountRoot(a) => Some(a),
            _ => None,
        }
    }

    pub fn into_trust_line(self) -> Option<TrustLine> {
        match self {
            LedgerEntry::TrustLine(t) => Some(t),
            _ => None,
        }
    }

    pub fn into_offer(self) -> Option<Offer> {
        match self {
            LedgerEntry::Offer(o) => Some(o),
            _ => None,
        }
    }
}
