//! meshcfg Core
//!
//! Application layer of the configuration change transaction engine. Owns
//! the shared [`ChangeRegistry`] and [`ConnectionManager`], loads
//! [`EngineConfig`], registers configured connections, and turns admin
//! error codes from nodes into registry updates.
//!
//! # Example
//!
//! ```rust
//! use meshcfg_core::{AdminEngine, EngineConfig};
//! use meshcfg_core::registry::{ChangeRequest, ChangeType};
//! use meshcfg_core::pki::ErrorClass;
//! use serde_json::json;
//!
//! let engine = AdminEngine::new(EngineConfig::default());
//! let registry = engine.registry();
//!
//! let tx = registry.begin_transaction(0x1234_5678_u32).transaction_id;
//! let request = ChangeRequest::new(ChangeType::Config, 0x1234_5678_u32, "security", json!({"is_managed": true}))
//!     .with_original(json!({"is_managed": false}));
//! registry.register_change(&tx, request).unwrap();
//!
//! let class = engine.handle_admin_error(&tx, "security", "PKI_UNKNOWN_PUBKEY");
//! assert_eq!(class, ErrorClass::RequiresKeyConfiguration);
//! assert!(!registry.has_pending_changes(&tx));
//! ```

#![warn(missing_docs)]
#![warn(unreachable_pub)]

mod bootstrap;
mod config;
mod engine;
mod error;
mod logging;

pub use bootstrap::{connection_from_definition, register_connections, PublisherFactory};
pub use config::{
    ConnectionDefinition, EngineConfig, DEFAULT_LOG_FILTER, DEFAULT_TRANSACTION_MAX_AGE_SECS,
};
pub use engine::AdminEngine;
pub use error::EngineError;
pub use logging::init_tracing;

pub use meshcfg_compare as compare;
pub use meshcfg_connection as connection;
pub use meshcfg_pki as pki;
pub use meshcfg_registry as registry;

pub use meshcfg_connection::ConnectionManager;
pub use meshcfg_registry::ChangeRegistry;

/// Version of this crate
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
