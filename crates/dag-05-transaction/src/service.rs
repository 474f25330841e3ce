//! # Transaction Service
//!
//! Owns one ledger instance: its store handle, witness and tip caches, the
//! pending and stable processors, and the event bus it reports to.
//!
//! ## Flow per unit
//!
//! ```text
//! review ──→ insert + pending apply ──→ stabilize while possible ──→ publish
//!   │              (one batch)            (one batch per layer)
//!   └─ referential failure ──→ cache.<hash>, retried after sync
//! ```
//!
//! A layer that marks a unit invalid also rebuilds the pending set of that
//! unit's author when their change no longer traces back to stable outputs.
//!
//! Insertion and stabilization run under one lock per ledger, so at most one
//! frontier advance is in flight and callers that race simply queue behind
//! it.

use crate::config::LedgerConfig;
use crate::errors::{ErrorKind, TransactionError, TransactionResult};
use crate::ports::{AcceptAllVerifier, SignatureVerifier};
use crate::review::{
    check_conservation, check_graph_position, check_hash, check_ownership, check_parents,
    check_shape, check_witness_list,
};
use dag_01_storage::{DagRead, DagStore};
use dag_02_witness::{TipSet, WitnessError, WitnessReplacer, WitnessSet};
use dag_03_graph::{GraphInfoGetter, MainChainUpdater, ProofNode, SystemTimeSource, TimeSource};
use dag_04_ledger::{
    balance_of, pending_balance_of, spendable_utxos, PendingPool, StableProcess, UnitComposer,
};
use parking_lot::Mutex;
use shared_bus::{
    EventFilter, EventPublisher, EventStream, EventTopic, FinalizedBatch, InMemoryEventBus,
    LedgerEvent, Subscription,
};
use shared_types::{Address, Hash, Unit, Utxo, VoteResult};
use std::collections::BTreeSet;
use std::sync::Arc;
use tracing::{debug, info, warn};

/// A unit that made it into the DAG.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Accepted {
    pub unit: Hash,
    pub author: Address,
    pub level: i64,
    /// Layers its arrival stabilized, oldest first.
    pub finalized: Vec<FinalizedBatch>,
}

/// Outcome of one pass over the referential cache.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RetryReport {
    pub accepted: Vec<Hash>,
    /// Failed for a reason sync cannot fix; removed from the cache.
    pub dropped: Vec<Hash>,
    /// Still missing ancestry; kept.
    pub waiting: Vec<Hash>,
}

pub struct TransactionService {
    config: LedgerConfig,
    store: DagStore,
    witnesses: Arc<WitnessSet>,
    tips: TipSet,
    pending: PendingPool,
    stable: StableProcess,
    verifier: Arc<dyn SignatureVerifier>,
    clock: Arc<dyn TimeSource>,
    bus: Arc<InMemoryEventBus>,
    ledger_lock: Mutex<()>,
}

impl TransactionService {
    pub fn new(store: DagStore, config: LedgerConfig, bus: Arc<InMemoryEventBus>) -> Self {
        Self {
            witnesses: Arc::new(WitnessSet::new(store.clone(), config.stable_rounds)),
            tips: TipSet::new(store.clone()),
            pending: PendingPool::new(),
            stable: StableProcess::new(),
            verifier: Arc::new(AcceptAllVerifier),
            clock: Arc::new(SystemTimeSource),
            ledger_lock: Mutex::new(()),
            config,
            store,
            bus,
        }
    }

    pub fn with_verifier(mut self, verifier: Arc<dyn SignatureVerifier>) -> Self {
        self.verifier = verifier;
        self
    }

    pub fn with_clock(mut self, clock: Arc<dyn TimeSource>) -> Self {
        self.clock = clock;
        self
    }

    pub fn config(&self) -> &LedgerConfig {
        &self.config
    }

    pub fn store(&self) -> &DagStore {
        &self.store
    }

    pub fn witness_set(&self) -> &Arc<WitnessSet> {
        &self.witnesses
    }

    pub fn tip_set(&self) -> &TipSet {
        &self.tips
    }

    // =========================================================================
    // SUBMISSION
    // =========================================================================

    /// Decide whether `unit` may enter the DAG. Writes nothing.
    pub fn review_unit(&self, unit: &Unit) -> TransactionResult<()> {
        if self.store.has_unit(&unit.hash)? {
            return Err(TransactionError::AlreadyExists(unit.hash));
        }
        check_shape(unit)?;
        check_ownership(unit)?;
        check_conservation(unit)?;
        check_hash(unit)?;
        if !self.verifier.verify(unit) {
            return Err(TransactionError::InvalidSignature(unit.hash));
        }
        check_witness_list(
            unit,
            &self.witnesses.witnesses()?,
            self.config.max_witness_list_mutations,
        )?;
        check_parents(
            &self.store,
            unit,
            self.clock.now(),
            self.config.max_future_drift_secs,
        )?;
        check_graph_position(&self.store, unit)?;
        Ok(())
    }

    /// Insert a reviewed unit, apply it to the pending set, and advance the
    /// stability frontier as far as it will go.
    pub fn handle_new_unit(&self, unit: &Unit) -> TransactionResult<Accepted> {
        let _guard = self.ledger_lock.lock();

        if self.store.has_unit(&unit.hash)? {
            return Err(TransactionError::AlreadyExists(unit.hash));
        }
        let author = unit.author().ok_or(TransactionError::Malformed {
            unit: unit.hash,
            reason: "exactly one author required",
        })?;

        let mut unit = unit.clone();
        unit.reset_stable_state();
        unit.sub_stable_min_hash = Hash::MAX;
        unit.sub_stable_author = None;
        unit.invalid = false;

        let mut batch = self.store.batch();
        self.pending.apply(&mut batch, &unit)?;
        batch.put_unit(&unit)?;
        for parent_hash in &unit.parent_list {
            let mut parent = batch
                .unit(parent_hash)?
                .ok_or(TransactionError::MissingParent {
                    unit: unit.hash,
                    parent: *parent_hash,
                })?;
            let mut children = batch.children(parent_hash)?;
            children.push(unit.hash);
            batch.put_children(parent_hash, &children)?;
            if parent.update_sub_stable_min_hash(unit.hash, author) {
                batch.put_unit(&parent)?;
            }
        }
        self.tips.stage(&mut batch, &unit)?;
        batch.commit()?;
        self.tips.apply(&unit);

        debug!(
            unit = %unit.hash,
            author = %author,
            level = unit.level,
            witnessed_level = unit.witnessed_level,
            "unit inserted"
        );

        let finalized = self.stabilize(&unit)?;
        Ok(Accepted {
            unit: unit.hash,
            author,
            level: unit.level,
            finalized,
        })
    }

    /// Review, handle and publish. Referential failures are cached for
    /// [`TransactionService::retry_cached`].
    pub async fn submit_unit(&self, unit: Unit) -> TransactionResult<Accepted> {
        let outcome = self
            .review_unit(&unit)
            .and_then(|()| self.handle_new_unit(&unit));

        match outcome {
            Ok(accepted) => {
                for batch in &accepted.finalized {
                    self.bus
                        .publish(LedgerEvent::BatchFinalized(batch.clone()))
                        .await;
                }
                self.bus
                    .publish(LedgerEvent::UnitAccepted {
                        unit_hash: accepted.unit,
                        author: accepted.author,
                        level: accepted.level,
                    })
                    .await;
                Ok(accepted)
            }
            Err(e) => {
                let retryable = e.is_retryable();
                if retryable {
                    let mut batch = self.store.batch();
                    batch.put_cached_unit(&unit)?;
                    batch.commit()?;
                }
                warn!(unit = %unit.hash, error = %e, retryable, "unit rejected");
                self.bus
                    .publish(LedgerEvent::UnitRejected {
                        unit_hash: unit.hash,
                        reason: e.to_string(),
                        retryable,
                    })
                    .await;
                Err(e)
            }
        }
    }

    /// Resubmit cached units in level order.
    pub async fn retry_cached(&self) -> TransactionResult<RetryReport> {
        let mut cached = self.store.cached_units()?;
        cached.sort_by(|a, b| a.level.cmp(&b.level).then(a.hash.cmp(&b.hash)));

        let mut report = RetryReport::default();
        for unit in cached {
            let hash = unit.hash;
            match self.submit_unit(unit).await {
                Ok(_) => report.accepted.push(hash),
                Err(e) if e.is_retryable() => {
                    report.waiting.push(hash);
                    continue;
                }
                Err(e) if e.kind() == ErrorKind::Resource => return Err(e),
                Err(_) => report.dropped.push(hash),
            }
            let mut batch = self.store.batch();
            batch.delete_cached_unit(&hash);
            batch.commit()?;
        }

        info!(
            accepted = report.accepted.len(),
            dropped = report.dropped.len(),
            waiting = report.waiting.len(),
            "cached units retried"
        );
        Ok(report)
    }

    // =========================================================================
    // STABILIZATION
    // =========================================================================

    fn stabilize(&self, unit: &Unit) -> TransactionResult<Vec<FinalizedBatch>> {
        let mut updater = match MainChainUpdater::new(&self.store, unit) {
            Ok(updater) => updater,
            Err(e) if e.is_missing_ancestor() => {
                warn!(unit = %unit.hash, error = %e, "stabilization skipped");
                return Ok(Vec::new());
            }
            Err(e) => return Err(e.into()),
        };

        let mut finalized = Vec::new();
        loop {
            match self.advance(&mut updater) {
                Ok(Some(batch)) => finalized.push(batch),
                Ok(None) => break,
                Err(TransactionError::Graph(e)) if e.is_missing_ancestor() => {
                    warn!(unit = %unit.hash, error = %e, "stabilization stopped early");
                    break;
                }
                Err(e) => return Err(e),
            }
        }
        Ok(finalized)
    }

    /// One layer: settle, extend, commit. `None` when the frontier holds.
    fn advance(&self, updater: &mut MainChainUpdater) -> TransactionResult<Option<FinalizedBatch>> {
        let tips = self.tips.tips()?;
        if !updater.can_extend(&self.store, &tips)? {
            return Ok(None);
        }

        let main_chain_unit = updater.point().sub;
        let mut batch = self.store.batch();
        let mut units = updater.next_batch(&batch)?;
        let settlement = self
            .stable
            .settle_layer(&mut batch, &mut units, &main_chain_unit)?;
        let conflicted: BTreeSet<Address> = units
            .iter()
            .filter(|unit| unit.invalid)
            .filter_map(Unit::author)
            .collect();
        let layer = updater.extend(&mut batch, units, self.clock.now())?;

        // Change built on a losing double spend goes with it.
        for author in &conflicted {
            if !self.pending.backtrack(&batch, author)? {
                self.pending.rebuild(&mut batch, &tips, author)?;
            }
        }
        batch.commit()?;

        debug!(
            mci = layer.main_chain_index,
            paid = settlement.paid as u64,
            payees = settlement.commissions.len(),
            "layer committed"
        );
        Ok(Some(FinalizedBatch {
            main_chain_index: layer.main_chain_index,
            main_chain_unit: layer.main_chain_unit,
            units: layer.units,
            invalid: layer.invalid,
        }))
    }

    // =========================================================================
    // SYNC
    // =========================================================================

    /// Units a peer that knows the main chain up to `last_known_mci` lacks,
    /// as `(stable, unstable)`. Empty when the peer is ahead of
    /// `last_stable_mci`.
    pub fn get_missing_units(
        &self,
        last_stable_mci: u64,
        last_known_mci: u64,
    ) -> TransactionResult<(Vec<Unit>, Vec<Unit>)> {
        let tips = self.tips.tips()?;
        let witnesses = self.witnesses.witnesses()?;
        let info = GraphInfoGetter::new(&self.store, &tips, &witnesses)?;
        Ok(info.missing_units(last_stable_mci, last_known_mci)?)
    }

    /// Main-chain hashes with index in `[last_known_mci, last_stable_mci]`.
    pub fn get_missing_main_chain_units(
        &self,
        last_stable_mci: u64,
        last_known_mci: u64,
    ) -> TransactionResult<Vec<Hash>> {
        let tips = self.tips.tips()?;
        let witnesses = self.witnesses.witnesses()?;
        let info = GraphInfoGetter::new(&self.store, &tips, &witnesses)?;
        Ok(info.missing_stable_units_on_main_chain(last_stable_mci, last_known_mci)?)
    }

    /// Merkle root over every stable unit above genesis, so a peer can
    /// compare its stable history in one hash.
    pub fn main_chain_merkle_root(&self) -> TransactionResult<Hash> {
        let tips = self.tips.tips()?;
        let witnesses = self.witnesses.witnesses()?;
        let info = GraphInfoGetter::new(&self.store, &tips, &witnesses)?;
        Ok(info.main_chain_merkle_root()?)
    }

    pub fn merkle_proof(&self, unit: &Hash) -> TransactionResult<Option<Vec<ProofNode>>> {
        let tips = self.tips.tips()?;
        let witnesses = self.witnesses.witnesses()?;
        let info = GraphInfoGetter::new(&self.store, &tips, &witnesses)?;
        Ok(info.merkle_proof(unit)?)
    }

    pub fn is_unit_in_merkle_tree(&self, unit: &Hash) -> TransactionResult<bool> {
        let tips = self.tips.tips()?;
        let witnesses = self.witnesses.witnesses()?;
        let info = GraphInfoGetter::new(&self.store, &tips, &witnesses)?;
        Ok(info.is_unit_in_merkle_tree(unit)?)
    }

    /// Stream of stabilized layers.
    pub fn subscribe_finalized(&self) -> EventStream {
        self.bus
            .event_stream(EventFilter::topics(vec![EventTopic::Stability]))
    }

    pub fn subscribe(&self, filter: EventFilter) -> Subscription {
        self.bus.subscribe(filter)
    }

    // =========================================================================
    // GOVERNANCE
    // =========================================================================

    /// Close the current vote window at `end_time`. Saves a result when a
    /// campaigner authored more than `min_times` units in it.
    pub fn close_vote_round(
        &self,
        end_time: u64,
        min_times: u64,
    ) -> TransactionResult<Option<VoteResult>> {
        let _guard = self.ledger_lock.lock();
        let replacer = WitnessReplacer::new(
            self.store.clone(),
            Arc::clone(&self.witnesses),
            &self.tips,
            end_time,
        )?;
        let Some((replaced, authored)) = replacer.get_replaced_witness()? else {
            return Ok(None);
        };
        let Some(campaigner) = replacer.get_campaign_list(min_times)?.first().copied() else {
            debug!(round = replacer.round(), "no campaigner qualified");
            return Ok(None);
        };
        debug!(replaced = %replaced, authored, campaigner = %campaigner, "vote decided");
        Ok(Some(replacer.save_vote_result(campaigner, replaced)?))
    }

    /// Apply the saved result of `round` to the witness set.
    pub async fn apply_witness_replacement(&self, round: i64) -> TransactionResult<VoteResult> {
        let result = {
            let _guard = self.ledger_lock.lock();
            let result = self
                .store
                .vote_result(round)?
                .ok_or(WitnessError::MissingVoteResult(round))?;
            self.witnesses.replace_witness_by_result(&result)?;
            result
        };

        self.bus
            .publish(LedgerEvent::WitnessReplaced {
                round,
                replaced: result.replaced_witness,
                replacement: result.vote_result,
            })
            .await;
        Ok(result)
    }

    // =========================================================================
    // WALLET
    // =========================================================================

    /// Payment from `from` to `to` positioned on the current tips. Still
    /// needs a signature before submission.
    pub fn compose_payment(&self, from: Address, to: Address, amount: u64) -> TransactionResult<Unit> {
        let unit = UnitComposer::new(&self.store, &self.witnesses, &self.tips)
            .with_commissions(self.config.header_commission, self.config.payload_commission)
            .with_max_witness_list_mutations(self.config.max_witness_list_mutations)
            .compose_payment(from, to, amount, self.clock.now())?;
        Ok(unit)
    }

    pub fn balance_of(&self, address: &Address) -> TransactionResult<u128> {
        Ok(balance_of(&self.store, address)?)
    }

    pub fn pending_balance_of(&self, address: &Address) -> TransactionResult<u128> {
        Ok(pending_balance_of(&self.store, address)?)
    }

    pub fn spendable_utxos(&self, address: &Address) -> TransactionResult<Vec<Utxo>> {
        Ok(spendable_utxos(&self.store, &self.tips.tips()?, address)?)
    }
}
