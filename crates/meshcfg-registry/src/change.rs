//! Pending change records

use std::fmt;

use meshcfg_compare::ConfigValue;
use serde::{Deserialize, Serialize};

use crate::transaction::NodeId;

/// Kind of configuration being changed
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ChangeType {
    /// Core radio configuration section
    Config,
    /// Module configuration section
    ModuleConfig,
    /// Channel slot
    Channel,
    /// Owner (long/short name)
    Owner,
}

impl ChangeType {
    /// Lowercase name
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Config => "config",
            Self::ModuleConfig => "module_config",
            Self::Channel => "channel",
            Self::Owner => "owner",
        }
    }
}

impl fmt::Display for ChangeType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Lifecycle state of a change
///
/// `Pending` moves exactly once to `Applied` or `Failed`. `Skipped` is only
/// ever assigned at creation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ChangeStatus {
    /// Awaiting transmission or acknowledgment
    Pending,
    /// Acknowledged by the node
    Applied,
    /// Rejected, timed out or aborted
    Failed,
    /// Already satisfied on the node, never transmitted
    Skipped,
}

impl ChangeStatus {
    /// Whether no further transition is possible
    #[inline]
    #[must_use]
    pub fn is_terminal(self) -> bool {
        match self {
            Self::Pending => false,
            Self::Applied | Self::Failed | Self::Skipped => true,
        }
    }
}

/// One configuration mutation tracked by a transaction
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PendingChange {
    /// Kind of configuration
    pub change_type: ChangeType,
    /// Target node
    pub node_id: NodeId,
    /// Slot identifier, e.g. `device`, `lora`, `channel_0`
    pub config_key: String,
    /// Value read from the node before the change, if known
    pub original_value: Option<ConfigValue>,
    /// Desired value
    pub new_value: ConfigValue,
    /// Lifecycle state
    pub status: ChangeStatus,
    /// Failure reason
    pub error_message: Option<String>,
    /// Packet id of the transmission that applied the change
    pub packet_id: Option<u32>,
}

impl PendingChange {
    pub(crate) fn from_request(request: ChangeRequest, status: ChangeStatus) -> Self {
        Self {
            change_type: request.change_type,
            node_id: request.node_id,
            config_key: request.config_key,
            original_value: request.original_value,
            new_value: request.new_value,
            status,
            error_message: None,
            packet_id: None,
        }
    }

    #[inline]
    pub(crate) fn is_pending_for(&self, config_key: &str) -> bool {
        self.status == ChangeStatus::Pending && self.config_key == config_key
    }

    pub(crate) fn apply(&mut self, packet_id: Option<u32>) {
        self.status = ChangeStatus::Applied;
        self.packet_id = packet_id;
    }

    pub(crate) fn fail(&mut self, message: impl Into<String>) {
        self.status = ChangeStatus::Failed;
        self.error_message = Some(message.into());
    }
}

/// Arguments of [`ChangeRegistry::register_change`](crate::ChangeRegistry::register_change)
///
/// `skip_if_unchanged` defaults to `true`.
#[derive(Debug, Clone, PartialEq)]
pub struct ChangeRequest {
    /// Kind of configuration
    pub change_type: ChangeType,
    /// Target node
    pub node_id: NodeId,
    /// Slot identifier
    pub config_key: String,
    /// Current value on the node, if known
    pub original_value: Option<ConfigValue>,
    /// Desired value
    pub new_value: ConfigValue,
    /// Register as skipped when the node already has `new_value`
    pub skip_if_unchanged: bool,
}

impl ChangeRequest {
    /// Create a request with an unknown original value
    #[must_use]
    pub fn new(
        change_type: ChangeType,
        node_id: impl Into<NodeId>,
        config_key: impl Into<String>,
        new_value: impl Into<ConfigValue>,
    ) -> Self {
        Self {
            change_type,
            node_id: node_id.into(),
            config_key: config_key.into(),
            original_value: None,
            new_value: new_value.into(),
            skip_if_unchanged: true,
        }
    }

    /// With the value currently on the node
    #[inline]
    #[must_use]
    pub fn with_original(mut self, original_value: impl Into<ConfigValue>) -> Self {
        self.original_value = Some(original_value.into());
        self
    }

    /// With skip-if-unchanged toggled
    #[inline]
    #[must_use]
    pub fn with_skip_if_unchanged(mut self, skip: bool) -> Self {
        self.skip_if_unchanged = skip;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn terminal_states() {
        assert!(!ChangeStatus::Pending.is_terminal());
        assert!(ChangeStatus::Applied.is_terminal());
        assert!(ChangeStatus::Failed.is_terminal());
        assert!(ChangeStatus::Skipped.is_terminal());
    }

    #[test]
    fn request_defaults() {
        let request = ChangeRequest::new(ChangeType::Config, 1_u32, "device", ConfigValue::empty_map());
        assert!(request.skip_if_unchanged);
        assert!(request.original_value.is_none());

        let request = request.with_original(ConfigValue::Int(1)).with_skip_if_unchanged(false);
        assert_eq!(request.original_value, Some(ConfigValue::Int(1)));
        assert!(!request.skip_if_unchanged);
    }

    #[test]
    fn change_type_names() {
        assert_eq!(ChangeType::ModuleConfig.to_string(), "module_config");
        assert_eq!(serde_json::to_value(ChangeType::Owner).unwrap(), "owner");
    }

    #[test]
    fn first_pending_only() {
        let mut change = PendingChange::from_request(
            ChangeRequest::new(ChangeType::Config, 1_u32, "lora", ConfigValue::empty_map()),
            ChangeStatus::Pending,
        );
        assert!(change.is_pending_for("lora"));
        assert!(!change.is_pending_for("device"));

        change.apply(Some(7));
        assert!(!change.is_pending_for("lora"));
        assert_eq!(change.packet_id, Some(7));
    }
}
