//! Change registry
//!
//! Owns every transaction of the process. One read-write lock guards the
//! transaction map and each transaction's change list; id allocation has
//! its own lock.

use std::collections::HashMap;

use chrono::{DateTime, TimeDelta, Utc};
use meshcfg_compare::{deep_compare, diff_summary};
use parking_lot::{Mutex, RwLock};

use crate::change::{ChangeRequest, ChangeStatus, PendingChange};
use crate::error::RegistryError;
use crate::transaction::{ChangeTransaction, NodeId, RevertEntry, TransactionId, TransactionSummary};

/// Failure message given to pending changes of an aborted transaction
pub const ABORT_MESSAGE: &str = "Transaction aborted";

/// Registry of configuration change transactions
#[derive(Debug, Default)]
pub struct ChangeRegistry {
    transactions: RwLock<HashMap<TransactionId, ChangeTransaction>>,
    sequence: Mutex<u64>,
}

impl ChangeRegistry {
    /// Create empty registry
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    fn next_transaction_id(&self, node_id: NodeId) -> TransactionId {
        let mut sequence = self.sequence.lock();
        *sequence += 1;
        TransactionId::generate(node_id, *sequence)
    }

    /// Start a new, empty, active transaction for `node_id`
    ///
    /// Returns a snapshot of the stored transaction.
    pub fn begin_transaction(&self, node_id: impl Into<NodeId>) -> ChangeTransaction {
        let node_id = node_id.into();
        let transaction = ChangeTransaction::new(self.next_transaction_id(node_id), node_id);

        self.transactions
            .write()
            .insert(transaction.transaction_id.clone(), transaction.clone());

        tracing::debug!(transaction_id = %transaction.transaction_id, %node_id, "started transaction");
        transaction
    }

    /// Snapshot of a transaction
    #[must_use]
    pub fn get_transaction(&self, tx_id: &TransactionId) -> Option<ChangeTransaction> {
        self.transactions.read().get(tx_id).cloned()
    }

    /// Run `op` on an active transaction under the write lock
    fn with_active<R>(
        &self,
        tx_id: &TransactionId,
        op: impl FnOnce(&mut ChangeTransaction) -> R,
    ) -> Result<R, RegistryError> {
        let mut transactions = self.transactions.write();
        let Some(transaction) = transactions.get_mut(tx_id) else {
            tracing::warn!(transaction_id = %tx_id, "transaction not found");
            return Err(RegistryError::TransactionNotFound(tx_id.clone()));
        };
        if !transaction.is_active {
            tracing::warn!(transaction_id = %tx_id, "transaction is not active");
            return Err(RegistryError::TransactionInactive(tx_id.clone()));
        }
        Ok(op(transaction))
    }

    /// Append a change to an active transaction
    ///
    /// With skip-if-unchanged set and a known original that already matches
    /// the new value, the change is appended as `Skipped` and must not be
    /// transmitted. Otherwise it is appended as `Pending`. Earlier changes
    /// for the same key are never replaced.
    pub fn register_change(
        &self,
        tx_id: &TransactionId,
        request: ChangeRequest,
    ) -> Result<PendingChange, RegistryError> {
        let diffs = request.original_value.as_ref().map(|original| {
            deep_compare(&request.new_value, original, Some(request.config_key.as_str()), true)
        });

        let status = match &diffs {
            Some(diffs) if request.skip_if_unchanged && diffs.is_empty() => ChangeStatus::Skipped,
            _ => ChangeStatus::Pending,
        };

        let change = PendingChange::from_request(request, status);
        self.with_active(tx_id, |tx| tx.changes.push(change.clone()))?;

        match status {
            ChangeStatus::Skipped => tracing::debug!(
                transaction_id = %tx_id,
                config_key = %change.config_key,
                node_id = %change.node_id,
                "skipping change, node already has the value"
            ),
            _ => {
                tracing::debug!(
                    transaction_id = %tx_id,
                    change_type = %change.change_type,
                    config_key = %change.config_key,
                    node_id = %change.node_id,
                    "registered change"
                );
                if let Some(diffs) = diffs.filter(|d| !d.is_empty()) {
                    tracing::debug!(config_key = %change.config_key, "change diff: {}", diff_summary(&diffs));
                }
            }
        }

        Ok(change)
    }

    /// Whether any change of the transaction is still pending
    ///
    /// `false` for unknown transactions.
    #[must_use]
    pub fn has_pending_changes(&self, tx_id: &TransactionId) -> bool {
        self.transactions
            .read()
            .get(tx_id)
            .is_some_and(ChangeTransaction::has_pending_changes)
    }

    /// Pending changes in registration order
    #[must_use]
    pub fn get_pending_changes(&self, tx_id: &TransactionId) -> Vec<PendingChange> {
        self.transactions
            .read()
            .get(tx_id)
            .map(|tx| tx.pending_changes().cloned().collect())
            .unwrap_or_default()
    }

    /// All changes, including skipped ones, in registration order
    #[must_use]
    pub fn get_all_changes(&self, tx_id: &TransactionId) -> Vec<PendingChange> {
        self.transactions
            .read()
            .get(tx_id)
            .map(|tx| tx.changes.clone())
            .unwrap_or_default()
    }

    /// Resolve the first pending change for `config_key` as applied
    ///
    /// Returns `false` when the transaction is unknown or inactive, or no
    /// pending change matches.
    pub fn mark_change_applied(
        &self,
        tx_id: &TransactionId,
        config_key: &str,
        packet_id: Option<u32>,
    ) -> bool {
        let marked = self
            .with_active(tx_id, |tx| match tx.first_pending_mut(config_key) {
                Some(change) => {
                    change.apply(packet_id);
                    true
                }
                None => false,
            })
            .unwrap_or(false);

        if marked {
            tracing::debug!(transaction_id = %tx_id, config_key, ?packet_id, "marked change applied");
        }
        marked
    }

    /// Resolve the first pending change for `config_key` as failed
    pub fn mark_change_failed(
        &self,
        tx_id: &TransactionId,
        config_key: &str,
        error_message: &str,
    ) -> bool {
        let marked = self
            .with_active(tx_id, |tx| match tx.first_pending_mut(config_key) {
                Some(change) => {
                    change.fail(error_message);
                    true
                }
                None => false,
            })
            .unwrap_or(false);

        if marked {
            tracing::debug!(transaction_id = %tx_id, config_key, error_message, "marked change failed");
        }
        marked
    }

    /// Record that the begin-edit marker was transmitted
    pub fn mark_begin_sent(&self, tx_id: &TransactionId) -> bool {
        self.with_active(tx_id, |tx| tx.begin_sent = true).is_ok()
    }

    /// Record that the commit-edit marker was transmitted
    pub fn mark_commit_sent(&self, tx_id: &TransactionId) -> bool {
        self.with_active(tx_id, |tx| tx.commit_sent = true).is_ok()
    }

    /// Deactivate a transaction and report its change counts
    ///
    /// Completing an already ended transaction reports the same counts again.
    pub fn complete_transaction(
        &self,
        tx_id: &TransactionId,
    ) -> Result<TransactionSummary, RegistryError> {
        let mut transactions = self.transactions.write();
        let Some(transaction) = transactions.get_mut(tx_id) else {
            tracing::warn!(transaction_id = %tx_id, "transaction not found");
            return Err(RegistryError::TransactionNotFound(tx_id.clone()));
        };

        transaction.end();
        let summary = transaction.summary();
        drop(transactions);

        tracing::info!(
            transaction_id = %tx_id,
            applied = summary.applied,
            skipped = summary.skipped,
            failed = summary.failed,
            pending = summary.pending,
            "completed transaction"
        );
        Ok(summary)
    }

    /// Deactivate a transaction, failing every pending change
    ///
    /// Applied and skipped changes are untouched. Returns `false` for
    /// unknown or already ended transactions.
    pub fn abort_transaction(&self, tx_id: &TransactionId) -> bool {
        let aborted = self
            .with_active(tx_id, |tx| {
                let mut failed = 0_usize;
                for change in tx.changes.iter_mut().filter(|c| c.status == ChangeStatus::Pending) {
                    change.fail(ABORT_MESSAGE);
                    failed += 1;
                }
                tx.end();
                failed
            })
            .ok();

        match aborted {
            Some(failed) => {
                tracing::info!(transaction_id = %tx_id, failed, "aborted transaction");
                true
            }
            None => false,
        }
    }

    /// Original values of applied changes, in registration order
    ///
    /// Empty for unknown transactions.
    #[must_use]
    pub fn get_revert_data(&self, tx_id: &TransactionId) -> Vec<RevertEntry> {
        self.transactions
            .read()
            .get(tx_id)
            .map(ChangeTransaction::revert_data)
            .unwrap_or_default()
    }

    /// Remove inactive transactions that ended at least `max_age_seconds` ago
    ///
    /// Zero removes every inactive transaction. Returns the number removed.
    pub fn cleanup_old_transactions(&self, max_age_seconds: u64) -> usize {
        let cutoff = i64::try_from(max_age_seconds)
            .ok()
            .and_then(TimeDelta::try_seconds)
            .and_then(|age| Utc::now().checked_sub_signed(age));

        match cutoff {
            Some(cutoff) => self.cleanup_ended_before(cutoff),
            None => 0,
        }
    }

    /// Remove inactive transactions that ended at or before `cutoff`
    pub fn cleanup_ended_before(&self, cutoff: DateTime<Utc>) -> usize {
        let mut transactions = self.transactions.write();
        let before = transactions.len();
        transactions.retain(|_, tx| tx.is_active || tx.ended_at.is_some_and(|t| t > cutoff));
        let removed = before - transactions.len();
        drop(transactions);

        if removed > 0 {
            tracing::info!(removed, "cleaned up old transactions");
        }
        removed
    }

    /// Number of stored transactions
    #[must_use]
    pub fn transaction_count(&self) -> usize {
        self.transactions.read().len()
    }

    /// Ids of active transactions, sorted
    #[must_use]
    pub fn active_transaction_ids(&self) -> Vec<TransactionId> {
        let mut ids: Vec<_> = self
            .transactions
            .read()
            .values()
            .filter(|tx| tx.is_active)
            .map(|tx| tx.transaction_id.clone())
            .collect();
        ids.sort();
        ids
    }
}
