//! meshcfg Registry
//!
//! Tracks pending remote-configuration changes to mesh nodes, grouped into
//! transactions bracketed by begin/commit markers.
//!
//! # Core Concepts
//!
//! - [`ChangeRegistry`]: owns all transactions; thread-safe
//! - [`ChangeTransaction`]: ordered, append-only list of changes for one node
//! - [`PendingChange`]: one change and its lifecycle
//!   (`Pending -> Applied | Failed`, or `Skipped` at creation)
//!
//! Changes whose new value is already on the node are registered as
//! `Skipped` and never need transmitting.
//!
//! # Example
//!
//! ```rust
//! use meshcfg_registry::{ChangeRegistry, ChangeRequest, ChangeType};
//! use serde_json::json;
//!
//! let registry = ChangeRegistry::new();
//! let tx = registry.begin_transaction(0x1234_5678_u32).transaction_id;
//!
//! let request = ChangeRequest::new(ChangeType::Config, 0x1234_5678_u32, "device", json!({"role": 1}))
//!     .with_original(json!({"role": 0}));
//! registry.register_change(&tx, request).unwrap();
//!
//! assert!(registry.mark_change_applied(&tx, "device", Some(99)));
//! let summary = registry.complete_transaction(&tx).unwrap();
//! assert_eq!(summary.applied, 1);
//! ```

#![warn(missing_docs)]
#![warn(unreachable_pub)]

mod change;
mod error;
mod registry;
mod transaction;

pub use change::{ChangeRequest, ChangeStatus, ChangeType, PendingChange};
pub use error::RegistryError;
pub use registry::{ChangeRegistry, ABORT_MESSAGE};
pub use transaction::{ChangeTransaction, NodeId, RevertEntry, TransactionId, TransactionSummary};

/// Version of this crate
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
