//! meshcfg Connection
//!
//! Named transport connections to mesh nodes, each tagged with a role
//! (privileged admin traffic or ordinary client traffic) and a transport
//! kind. The manager only depends on the minimal [`Publisher`] capability;
//! framing and I/O live behind it.
//!
//! # Example
//!
//! ```rust,ignore
//! use meshcfg_connection::{ConnectionInfo, ConnectionManager, ConnectionRole, ConnectionType};
//!
//! let manager = ConnectionManager::new();
//! manager.add_connection(ConnectionInfo::new(
//!     "radio-tcp",
//!     ConnectionType::Tcp,
//!     ConnectionRole::Admin,
//!     publisher,
//! ));
//!
//! let results = manager.connect_all(Some(ConnectionRole::Admin));
//! let admin = manager.get_admin_publisher();
//! ```

#![warn(missing_docs)]
#![warn(unreachable_pub)]

mod error;
mod manager;
mod publisher;
mod types;

pub use error::ConnectionError;
pub use manager::{ConnectionInfo, ConnectionManager, ConnectionParams, ConnectionStatus};
pub use publisher::{Publisher, TransportParams};
pub use types::{ConnectionRole, ConnectionType};

/// Version of this crate
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
