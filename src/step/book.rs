//! Order-book consumption: crossing the best-quality offers between two
//! issues, with transfer-fee gross/net splits, funding caps, expiration,
//! self-cross detection, and the exhaustion cap.

use core::cmp::Ordering;

use alloc::vec::Vec;
use hashbrown::HashSet as VisitedSet;

use crate::amount::Amount;
use crate::error::FlowError;
use crate::ledger::objects::{Offer, QUALITY_ONE_PPB};
use crate::ledger::{AccountRoot, LedgerEntry, LedgerKey, Sandbox, View};
use crate::quality::Quality;
use crate::types::{AccountId, Issue};

use super::{min_amount, DebtDirection, OffersToRemove, Step};

/// Maximum offers a single book step may consume in one strand execution
/// (ledger rule `fix1515`).
pub const MAX_OFFERS_TO_CONSUME: u32 = 1000;

pub struct BookStep {
    pub in_issue: Issue,
    pub out_issue: Issue,
    pub strand_src: AccountId,
    pub strand_dst: AccountId,
    pub prev_step_redeems: bool,
    pub owner_pays_transfer_fee: bool,
    pub quality_limit: Option<Quality>,
    pub parent_close_time: u32,
    pub default_path: bool,
    pub fix_reduced_offers_v1: bool,
    pub fix_reduced_offers_v2: bool,
    max_offers_to_consume: u32,
    offers_used: u32,
    inactive: bool,
    visited: VisitedSet<LedgerKey>,
    cache: Option<(Amount, Amount)>,
}

impl BookStep {
    pub fn new(in_issue: Issue, out_issue: Issue, strand_src: AccountId, strand_dst: AccountId) -> Self {
        BookStep {
            in_issue,
            out_issue,
            strand_src,
            strand_dst,
            prev_step_redeems: false,
            owner_pays_transfer_fee: false,
            quality_limit: None,
            parent_close_time: 0,
            default_path: false,
            fix_reduced_offers_v1: true,
            fix_reduced_offers_v2: true,
            max_offers_to_consume: MAX_OFFERS_TO_CONSUME,
            offers_used: 0,
            inactive: false,
            visited: VisitedSet::new(),
            cache: None,
        }
    }

    fn zero_in(&self) -> Amount {
        if self.in_issue.is_native() {
            Amount::zero_native()
        } else {
            Amount::zero_issued(self.in_issue)
        }
    }

    fn zero_out(&self) -> Amount {
        if self.out_issue.is_native() {
            Amount::zero_native()
        } else {
            Amount::zero_issued(self.out_issue)
        }
    }

    /// Candidate offers matching this book, best quality first. A real
    /// ledger walks a book-directory page chain in quality order; the
    /// sandbox here has no maintained directory index, so candidates are
    /// collected by scanning and sorted once per pass — equivalent
    /// behavior for the core's purposes, since directory maintenance is
    /// out of scope.
    fn candidates(&self, sb: &Sandbox, offers_to_remove: &OffersToRemove) -> Vec<(LedgerKey, Offer)> {
        let mut found = Vec::new();
        sb.for_each(|key, entry| {
            if let LedgerEntry::Offer(offer) = entry {
                if let LedgerKey::Offer(..) = key {
                    if offer.taker_pays.issue().same_issue(&self.in_issue)
                        && offer.taker_gets.issue().same_issue(&self.out_issue)
                        && !self.visited.contains(key)
                        && !offers_to_remove.contains(key)
                    {
                        found.push((*key, offer.clone()));
                    }
                }
            }
        });
        found.sort_by(|a, b| {
            let qa = a.1.quality().ok();
            let qb = b.1.quality().ok();
            match (qa, qb) {
                (Some(qa), Some(qb)) => qb.cmp(&qa),
                _ => Ordering::Equal,
            }
        });
        found
    }

    fn transfer_rate(&self, sb: &Sandbox, issue: &Issue) -> u32 {
        match issue.issuer() {
            None => QUALITY_ONE_PPB,
            Some(issuer) => sb
                .read(&LedgerKey::Account(issuer))
                .and_then(LedgerEntry::into_account_root)
                .map(|a| a.effective_transfer_rate())
                .unwrap_or(QUALITY_ONE_PPB),
        }
    }

    fn tr_in(&self, sb: &Sandbox) -> u32 {
        if self.prev_step_redeems {
            self.transfer_rate(sb, &self.in_issue)
        } else {
            QUALITY_ONE_PPB
        }
    }

    fn tr_out(&self, sb: &Sandbox) -> u32 {
        if self.owner_pays_transfer_fee {
            self.transfer_rate(sb, &self.out_issue)
        } else {
            QUALITY_ONE_PPB
        }
    }

    /// Liquid output the offer owner can actually deliver, before capping
    /// against the offer's own remaining `takerGets`.
    fn funded_amount(&self, sb: &Sandbox, offer: &Offer) -> Result<Amount, FlowError> {
        if offer.owner == self.out_issue.issuer().unwrap_or(AccountId::ZERO) {
            return Ok(offer.taker_gets);
        }
        if self.out_issue.is_native() {
            let account = sb
                .read(&LedgerKey::Account(offer.owner))
                .and_then(LedgerEntry::into_account_root)
                .ok_or(FlowError::MalformedStrand("offer owner has no AccountRoot"))?;
            let adjusted_owner_count = sb.owner_count_hook(offer.owner, account.owner_count);
            let reserve = crate::constants::BASE_RESERVE + adjusted_owner_count as i64 * crate::constants::OWNER_RESERVE;
            let balance = sb
                .balance_hook(offer.owner, Issue::native(), &Amount::native(account.balance))
                .native_drops()
                .map_err(FlowError::Amount)?;
            let liquid = (balance - reserve).max(0);
            Ok(min_amount(Amount::native(liquid), offer.taker_gets))
        } else {
            let line_key = LedgerKey::line(offer.owner, self.out_issue.issuer().unwrap(), self.out_issue.currency());
            let held = match sb.read(&line_key).and_then(LedgerEntry::into_trust_line) {
                Some(line) => sb.balance_hook(offer.owner, self.out_issue, &line.balance_held_by(offer.owner)),
                None => self.zero_out(),
            };
            let liquid = if held.is_negative() { self.zero_out() } else { held };
            Ok(min_amount(liquid, offer.taker_gets))
        }
    }

    fn is_self_cross(&self, offer: &Offer, quality: Quality) -> bool {
        self.default_path
            && offer.owner == self.strand_src
            && offer.owner == self.strand_dst
            && self.quality_limit.map(|limit| quality >= limit).unwrap_or(true)
    }

    /// Applies `delta` to an offer, removing it via erasure when it is
    /// exhausted (either side hits zero) or has become unfunded.
    fn apply_consumption(
        &mut self,
        sb: &mut Sandbox,
        key: LedgerKey,
        mut offer: Offer,
        net_in_consumed: Amount,
        out_consumed: Amount,
        owner_gives: Amount,
    ) -> Result<(), FlowError> {
        sb.credit_hook(self.strand_src_account(), offer.owner, &net_in_consumed);
        sb.credit_hook(offer.owner, self.strand_dst_account(), &owner_gives);

        offer.taker_pays = offer.taker_pays.sub(&net_in_consumed).map_err(FlowError::Amount)?;
        offer.taker_gets = offer.taker_gets.sub(&out_consumed).map_err(FlowError::Amount)?;

        if offer.is_depleted() || offer.taker_pays.is_negative() || offer.taker_gets.is_negative() {
            sb.erase(&key);
            sb.adjust_owner_count(offer.owner, -1);
        } else {
            sb.update(key, LedgerEntry::Offer(offer))
                .map_err(|_| FlowError::MalformedStrand("offer vanished mid-consumption"))?;
        }
        self.visited.insert(key);
        self.offers_used += 1;
        if self.offers_used >= self.max_offers_to_consume {
            self.inactive = true;
        }
        Ok(())
    }

    /// The accounts that actually move value at this book step's two
    /// edges — used only to route `creditHook` entries; a book step has
    /// no account identity of its own, so the strand's overall
    /// source/destination stand in for "whoever is on the other side of
    /// this edge." Correct because `creditHook` only needs consistent
    /// (src, dst) pairing for its net-zero bookkeeping, not literal
    /// strand endpoints.
    fn strand_src_account(&self) -> AccountId {
        self.strand_src
    }

    fn strand_dst_account(&self) -> AccountId {
        self.strand_dst
    }

    fn remove_expired(&mut self, sb: &mut Sandbox, key: LedgerKey, offer: &Offer) {
        sb.erase(&key);
        sb.adjust_owner_count(offer.owner, -1);
        self.visited.insert(key);
    }
}

impl Step for BookStep {
    fn rev(
        &mut self,
        sb: &mut Sandbox,
        _af_view: &dyn View,
        offers_to_remove: &mut OffersToRemove,
        out: Amount,
    ) -> Result<(Amount, Amount), FlowError> {
        let mut remaining_out = out;
        let mut total_in = self.zero_in();
        let mut total_out = self.zero_out();

        'offers: loop {
            if remaining_out.is_zero() || self.offers_used >= self.max_offers_to_consume {
                break;
            }
            let candidates = self.candidates(sb, offers_to_remove);
            for (key, offer) in candidates {
                if self.visited.contains(&key) || offers_to_remove.contains(&key) {
                    continue;
                }
                if offer.is_expired(self.parent_close_time) {
                    self.remove_expired(sb, key, &offer);
                    continue 'offers;
                }
                let quality = match offer.quality() {
                    Ok(q) => q,
                    Err(_) => continue,
                };
                if self.is_self_cross(&offer, quality) {
                    offers_to_remove.insert(key);
                    self.visited.insert(key);
                    self.offers_used += 1;
                    continue 'offers;
                }
                let funded = self.funded_amount(sb, &offer)?;
                if funded.is_zero() {
                    offers_to_remove.insert(key);
                    self.visited.insert(key);
                    self.offers_used += 1;
                    continue 'offers;
                }
                if let Some(limit) = self.quality_limit {
                    if quality < limit {
                        break 'offers;
                    }
                }

                let tr_in = self.tr_in(sb);
                let tr_out = self.tr_out(sb);

                // `net_in`/`net_in_adj` below are what the offer's
                // `takerPays` is decremented by and what the owner is
                // credited — the fee, if any, is retained by the system
                // and never reaches the owner (§4.7). `gross_in` is what
                // the taker actually pays and is the only figure that
                // belongs in `total_in`.
                let (owner_gives, net_in, net_out, gross_in) = if funded.compare(&offer.taker_gets).map_err(FlowError::Amount)? == Ordering::Less {
                    // The offer is only partially funded: recover the net
                    // input that matches the funded output at this quality.
                    // Both amendment gates are threaded into this step at
                    // construction (never read from global state); the v1
                    // gate's rounding choice lives in `ceil_in` itself.
                    let stp_out = funded.mul_ratio(QUALITY_ONE_PPB as u64, tr_out as u64, false).map_err(FlowError::Amount)?;
                    let adjusted_in = quality
                        .ceil_in(&stp_out, &offer.taker_pays)
                        .map_err(FlowError::Amount)?;
                    let gross_in = adjusted_in.mul_ratio(tr_in as u64, QUALITY_ONE_PPB as u64, true).map_err(FlowError::Amount)?;
                    (funded, adjusted_in, stp_out, gross_in)
                } else {
                    let gross_in = offer.taker_pays.mul_ratio(tr_in as u64, QUALITY_ONE_PPB as u64, true).map_err(FlowError::Amount)?;
                    let owner_gives = offer.taker_gets.mul_ratio(tr_out as u64, QUALITY_ONE_PPB as u64, false).map_err(FlowError::Amount)?;
                    (owner_gives, offer.taker_pays, offer.taker_gets, gross_in)
                };

                if net_out.compare(&remaining_out).map_err(FlowError::Amount)? != Ordering::Greater {
                    total_in = total_in.add(&gross_in).map_err(FlowError::Amount)?;
                    total_out = total_out.add(&net_out).map_err(FlowError::Amount)?;
                    remaining_out = remaining_out.sub(&net_out).map_err(FlowError::Amount)?;
                    self.apply_consumption(sb, key, offer, net_in, net_out, owner_gives)?;
                } else {
                    let net_in_adj = quality
                        .ceil_in(&remaining_out, &offer.taker_pays)
                        .map_err(FlowError::Amount)?;
                    let gross_in_adj = net_in_adj.mul_ratio(tr_in as u64, QUALITY_ONE_PPB as u64, true).map_err(FlowError::Amount)?;
                    let owner_gives_adj = remaining_out.mul_ratio(tr_out as u64, QUALITY_ONE_PPB as u64, false).map_err(FlowError::Amount)?;
                    let delivered_out = remaining_out;
                    total_in = total_in.add(&gross_in_adj).map_err(FlowError::Amount)?;
                    total_out = total_out.add(&delivered_out).map_err(FlowError::Amount)?;
                    remaining_out = self.zero_out();
                    self.apply_consumption(sb, key, offer, net_in_adj, delivered_out, owner_gives_adj)?;
                }
                continue 'offers;
            }
            break;
        }

        if remaining_out.compare(&self.zero_out()).map_err(FlowError::Amount)? != Ordering::Greater {
            total_out = out;
        }

        self.cache = Some((total_in, total_out));
        Ok((total_in, total_out))
    }

    fn fwd(
        &mut self,
        sb: &mut Sandbox,
        _af_view: &dyn View,
        offers_to_remove: &mut OffersToRemove,
        in_amount: Amount,
    ) -> Result<(Amount, Amount), FlowError> {
        let mut remaining_in = in_amount;
        let mut total_in = self.zero_in();
        let mut total_out = self.zero_out();
        let cached = self.cache;

        'offers: loop {
            if remaining_in.is_zero() || self.offers_used >= self.max_offers_to_consume {
                break;
            }
            let candidates = self.candidates(sb, offers_to_remove);
            for (key, offer) in candidates {
                if self.visited.contains(&key) || offers_to_remove.contains(&key) {
                    continue;
                }
                if offer.is_expired(self.parent_close_time) {
                    self.remove_expired(sb, key, &offer);
                    continue 'offers;
                }
                let quality = match offer.quality() {
                    Ok(q) => q,
                    Err(_) => continue,
                };
                if self.is_self_cross(&offer, quality) {
                    offers_to_remove.insert(key);
                    self.visited.insert(key);
                    self.offers_used += 1;
                    continue 'offers;
                }
                let funded = self.funded_amount(sb, &offer)?;
                if funded.is_zero() {
                    offers_to_remove.insert(key);
                    self.visited.insert(key);
                    self.offers_used += 1;
                    continue 'offers;
                }
                if let Some(limit) = self.quality_limit {
                    if quality < limit {
                        break 'offers;
                    }
                }

                let tr_in = self.tr_in(sb);
                let tr_out = self.tr_out(sb);
                let offer_gross_in = offer.taker_pays.mul_ratio(tr_in as u64, QUALITY_ONE_PPB as u64, true).map_err(FlowError::Amount)?;

                // As in `rev`: `net_in` is what the offer's `takerPays` is
                // decremented by and what the owner is credited; `gross_in`
                // is what the taker actually pays and the only figure that
                // belongs in `total_in`.
                let (net_in, owner_gives, net_out, gross_in) = if offer_gross_in.compare(&remaining_in).map_err(FlowError::Amount)? != Ordering::Greater {
                    let owner_gives = offer.taker_gets.mul_ratio(tr_out as u64, QUALITY_ONE_PPB as u64, false).map_err(FlowError::Amount)?;
                    (offer.taker_pays, owner_gives, offer.taker_gets, offer_gross_in)
                } else {
                    let in_lmt = remaining_in.mul_ratio(QUALITY_ONE_PPB as u64, tr_in as u64, false).map_err(FlowError::Amount)?;
                    let out_for_lmt = quality.as_amount_out_for(&in_lmt, &offer.taker_gets).map_err(FlowError::Amount)?;
                    let adjusted_in = if self.fix_reduced_offers_v2 {
                        // Recompute `in` from the quality-consistent `out` with the
                        // strict variant so the offer's post-consumption quality
                        // reads strictly worse for the taker, not an exact match.
                        quality.ceil_in_strict(&out_for_lmt, &offer.taker_pays).map_err(FlowError::Amount)?
                    } else {
                        in_lmt
                    };
                    let adjusted_out = quality.as_amount_out_for(&adjusted_in, &offer.taker_gets).map_err(FlowError::Amount)?;
                    let adjusted_out = min_amount(adjusted_out, funded);
                    let owner_gives = adjusted_out.mul_ratio(tr_out as u64, QUALITY_ONE_PPB as u64, false).map_err(FlowError::Amount)?;
                    let gross_in = adjusted_in.mul_ratio(tr_in as u64, QUALITY_ONE_PPB as u64, true).map_err(FlowError::Amount)?;
                    (adjusted_in, owner_gives, adjusted_out, gross_in)
                };

                total_in = total_in.add(&gross_in).map_err(FlowError::Amount)?;
                total_out = total_out.add(&net_out).map_err(FlowError::Amount)?;
                remaining_in = remaining_in.sub(&gross_in).map_err(FlowError::Amount)?;
                self.apply_consumption(sb, key, offer, net_in, net_out, owner_gives)?;

                if let Some((cached_in, cached_out)) = cached {
                    if total_out.compare(&cached_out).map_err(FlowError::Amount)? == Ordering::Greater
                        && total_in.compare(&cached_in).map_err(FlowError::Amount)? != Ordering::Greater
                    {
                        total_in = cached_in;
                        total_out = cached_out;
                        break 'offers;
                    }
                }
                continue 'offers;
            }
            break;
        }

        if let Some((cached_in, cached_out)) = self.cache {
            total_in = min_amount(total_in, cached_in);
            total_out = min_amount(total_out, cached_out);
        }
        self.cache = Some((total_in, total_out));
        Ok((total_in, total_out))
    }

    fn cached_in(&self) -> Option<Amount> {
        self.cache.map(|(i, _)| i)
    }

    fn cached_out(&self) -> Option<Amount> {
        self.cache.map(|(_, o)| o)
    }

    fn clear_cache(&mut self) {
        self.cache = None;
        self.visited.clear();
        self.offers_used = 0;
        self.inactive = false;
    }

    fn debt_direction(&self, _sb: &Sandbox, _strand_direction: DebtDirection) -> DebtDirection {
        DebtDirection::Issues
    }

    fn quality_upper_bound(&self, sb: &Sandbox, prev_step_debt_dir: DebtDirection) -> Option<(Quality, DebtDirection)> {
        let offers_to_remove = OffersToRemove::new();
        let candidates = self.candidates(sb, &offers_to_remove);
        let (_, best) = candidates.into_iter().find(|(_, o)| !o.is_expired(self.parent_close_time))?;
        let quality = best.quality().ok()?;
        Some((quality, prev_step_debt_dir))
    }

    fn valid_fwd(&self, sb: &Sandbox, _af_view: &dyn View, in_amount: Amount) -> (bool, Amount) {
        let offers_to_remove = OffersToRemove::new();
        let candidates = self.candidates(sb, &offers_to_remove);
        if candidates.is_empty() {
            return (false, self.zero_out());
        }
        (true, in_amount.zero_like())
    }

    fn offers_used(&self) -> u32 {
        self.offers_used
    }

    fn inactive(&self) -> bool {
        self.inactive
    }
}


trait QualityOutFor {
    fn as_amount_out_for(&self, amount_in: &Amount, template: &Amount) -> Result<Amount, crate::amount::AmountError>;
}

impl QualityOutFor for Quality {
    /// `amount_in * self`, re-tagged as `template`'s issue — the inverse of
    /// [`Quality::ceil_in`]'s division, used once `ceil_in`/`ceil_in_strict`
    /// has already picked the capped `in`, to recover the matching `out`.
    fn as_amount_out_for(&self, amount_in: &Amount, template: &Amount) -> Result<Amount, crate::amount::AmountError> {
        self.ceil_out(amount_in, template)
    }
}
