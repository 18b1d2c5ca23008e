//! Transactions and their reports

use std::fmt;

use chrono::{DateTime, Utc};
use meshcfg_compare::ConfigValue;
use serde::{Deserialize, Serialize};

use crate::change::{ChangeStatus, ChangeType, PendingChange};

/// Mesh node number, displayed as 8 lowercase hex digits
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct NodeId(pub u32);

impl From<u32> for NodeId {
    fn from(value: u32) -> Self {
        Self(value)
    }
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:08x}", self.0)
    }
}

/// Process-unique transaction identifier: `tx_<node hex>_<sequence>`
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TransactionId(String);

impl TransactionId {
    pub(crate) fn generate(node_id: NodeId, sequence: u64) -> Self {
        Self(format!("tx_{node_id}_{sequence}"))
    }

    /// String form
    #[inline]
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<&str> for TransactionId {
    fn from(value: &str) -> Self {
        Self(value.to_string())
    }
}

impl From<String> for TransactionId {
    fn from(value: String) -> Self {
        Self(value)
    }
}

impl fmt::Display for TransactionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// A group of changes for one node, bracketed by begin/commit markers
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChangeTransaction {
    /// Identifier
    pub transaction_id: TransactionId,
    /// Target node
    pub node_id: NodeId,
    /// Changes in registration order
    pub changes: Vec<PendingChange>,
    /// Accepts registration and status transitions while true
    pub is_active: bool,
    /// Begin-edit marker transmitted
    pub begin_sent: bool,
    /// Commit-edit marker transmitted
    pub commit_sent: bool,
    /// Creation time
    pub created_at: DateTime<Utc>,
    /// Time of completion or abort
    pub ended_at: Option<DateTime<Utc>>,
}

impl ChangeTransaction {
    pub(crate) fn new(transaction_id: TransactionId, node_id: NodeId) -> Self {
        Self {
            transaction_id,
            node_id,
            changes: Vec::new(),
            is_active: true,
            begin_sent: false,
            commit_sent: false,
            created_at: Utc::now(),
            ended_at: None,
        }
    }

    /// Changes still awaiting resolution
    pub fn pending_changes(&self) -> impl Iterator<Item = &PendingChange> {
        self.changes
            .iter()
            .filter(|c| c.status == ChangeStatus::Pending)
    }

    /// Whether any change is still pending
    #[must_use]
    pub fn has_pending_changes(&self) -> bool {
        self.pending_changes().next().is_some()
    }

    pub(crate) fn first_pending_mut(&mut self, config_key: &str) -> Option<&mut PendingChange> {
        self.changes.iter_mut().find(|c| c.is_pending_for(config_key))
    }

    /// Deactivate; the first end time is kept
    pub(crate) fn end(&mut self) {
        self.is_active = false;
        self.ended_at.get_or_insert_with(Utc::now);
    }

    /// Counts of changes per status
    #[must_use]
    pub fn summary(&self) -> TransactionSummary {
        let count = |status: ChangeStatus| self.changes.iter().filter(|c| c.status == status).count();

        TransactionSummary {
            transaction_id: self.transaction_id.clone(),
            node_id: self.node_id,
            total_changes: self.changes.len(),
            applied: count(ChangeStatus::Applied),
            skipped: count(ChangeStatus::Skipped),
            failed: count(ChangeStatus::Failed),
            pending: count(ChangeStatus::Pending),
            begin_sent: self.begin_sent,
            commit_sent: self.commit_sent,
        }
    }

    /// Original values of applied changes, in registration order
    ///
    /// Changes without a known original are left out.
    #[must_use]
    pub fn revert_data(&self) -> Vec<RevertEntry> {
        self.changes
            .iter()
            .filter(|c| c.status == ChangeStatus::Applied)
            .filter_map(|c| {
                c.original_value.clone().map(|original_value| RevertEntry {
                    change_type: c.change_type,
                    config_key: c.config_key.clone(),
                    original_value,
                    node_id: c.node_id,
                })
            })
            .collect()
    }
}

/// Completion report
///
/// `applied + skipped + failed + pending == total_changes`. A non-zero
/// `pending` means unresolved changes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransactionSummary {
    /// Transaction
    pub transaction_id: TransactionId,
    /// Target node
    pub node_id: NodeId,
    /// All registered changes
    pub total_changes: usize,
    /// Applied changes
    pub applied: usize,
    /// Skipped changes
    pub skipped: usize,
    /// Failed changes
    pub failed: usize,
    /// Unresolved changes
    pub pending: usize,
    /// Begin marker transmitted
    pub begin_sent: bool,
    /// Commit marker transmitted
    pub commit_sent: bool,
}

/// Value needed to restore one applied change
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RevertEntry {
    /// Kind of configuration
    pub change_type: ChangeType,
    /// Slot identifier
    pub config_key: String,
    /// Value before the change
    pub original_value: ConfigValue,
    /// Target node
    pub node_id: NodeId,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn node_id_is_zero_padded_hex() {
        assert_eq!(NodeId(0x1234_5678).to_string(), "12345678");
        assert_eq!(NodeId(0xab).to_string(), "000000ab");
    }

    #[test]
    fn transaction_id_format() {
        let id = TransactionId::generate(NodeId(0xdead_beef), 42);
        assert_eq!(id.as_str(), "tx_deadbeef_42");
        assert_eq!(TransactionId::from("tx_deadbeef_42"), id);
    }

    #[test]
    fn end_keeps_first_timestamp() {
        let mut tx = ChangeTransaction::new(TransactionId::from("tx"), NodeId(1));
        assert!(tx.is_active);
        tx.end();
        let first = tx.ended_at;
        assert!(first.is_some());
        tx.end();
        assert_eq!(tx.ended_at, first);
        assert!(!tx.is_active);
    }

    #[test]
    fn empty_summary() {
        let tx = ChangeTransaction::new(TransactionId::from("tx"), NodeId(1));
        let summary = tx.summary();
        assert_eq!(summary.total_changes, 0);
        assert_eq!(summary.pending, 0);
        assert!(tx.revert_data().is_empty());
    }
}
