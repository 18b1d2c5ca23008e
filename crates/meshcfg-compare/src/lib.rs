//! meshcfg Compare
//!
//! Recursive, type-coercing comparison of node configuration values.
//!
//! # Core Concepts
//!
//! - [`ConfigValue`]: schema-free nested configuration value
//! - [`deep_compare`]: diff an expected configuration against a node's
//! - [`configs_equal`]: the skip-if-unchanged predicate
//! - [`normalize_bytes`]: canonical bytes for key material in any encoding
//!
//! # Example
//!
//! ```rust
//! use meshcfg_compare::{configs_equal, ConfigValue};
//! use serde_json::json;
//!
//! let desired: ConfigValue = json!({"device": {"role": 1}}).into();
//! let on_node: ConfigValue = json!({"role": 1}).into();
//!
//! assert!(configs_equal(&desired, &on_node, Some("device")));
//! ```

#![warn(missing_docs)]
#![warn(unreachable_pub)]

mod bytes;
mod compare;
mod diff;
mod value;

pub use bytes::{is_bytes_field, is_empty, normalize_bytes, BYTES_FIELDS};
pub use compare::{
    compare_dicts, compare_lists, configs_equal, deep_compare, values_equal, ENVELOPE_KEYS,
    FLOAT_EPSILON,
};
pub use diff::{diff_summary, ConfigDiff, DiffKind, SUMMARY_LIMIT};
pub use value::{ConfigMap, ConfigValue, ValueError};

/// Version of this crate
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
