//! Connection manager
//!
//! Provides [`ConnectionManager`], the registry of named connections:
//! - Registration and removal
//! - Lookup by id and by role
//! - Bulk connect/disconnect
//! - Aggregate status reporting

use std::fmt;
use std::sync::Arc;

use indexmap::IndexMap;
use parking_lot::RwLock;
use serde::Serialize;

use crate::publisher::Publisher;
use crate::types::{ConnectionRole, ConnectionType};

/// A registered connection
#[derive(Clone)]
pub struct ConnectionInfo {
    /// Caller-supplied unique id
    pub connection_id: String,
    /// Transport kind
    pub connection_type: ConnectionType,
    /// Role designation
    pub role: ConnectionRole,
    /// Shared transport capability
    pub publisher: Arc<dyn Publisher>,
    /// Human-readable description
    pub description: String,
    /// Whether bulk connects include this connection
    pub auto_connect: bool,
}

impl ConnectionInfo {
    /// Create connection info with an empty description and auto-connect on
    #[must_use]
    pub fn new(
        connection_id: impl Into<String>,
        connection_type: ConnectionType,
        role: ConnectionRole,
        publisher: Arc<dyn Publisher>,
    ) -> Self {
        Self {
            connection_id: connection_id.into(),
            connection_type,
            role,
            publisher,
            description: String::new(),
            auto_connect: true,
        }
    }

    /// With description
    #[inline]
    #[must_use]
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    /// With auto-connect flag
    #[inline]
    #[must_use]
    pub fn with_auto_connect(mut self, auto_connect: bool) -> Self {
        self.auto_connect = auto_connect;
        self
    }

    /// Connected state, delegated to the publisher
    #[inline]
    #[must_use]
    pub fn is_connected(&self) -> bool {
        self.publisher.is_connected()
    }

    /// Parameter dump for status reporting
    #[must_use]
    pub fn params(&self) -> ConnectionParams {
        let transport = self.publisher.transport_params();
        let (host, port, serial_port) = match self.connection_type {
            ConnectionType::Tcp => (transport.host, transport.port, None),
            ConnectionType::Serial => (None, None, transport.serial_port),
            ConnectionType::Mqtt => (None, None, None),
        };

        ConnectionParams {
            connection_id: self.connection_id.clone(),
            connection_type: self.connection_type,
            role: self.role,
            description: self.description.clone(),
            is_connected: self.is_connected(),
            auto_connect: self.auto_connect,
            host,
            port,
            serial_port,
        }
    }
}

impl fmt::Debug for ConnectionInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ConnectionInfo")
            .field("connection_id", &self.connection_id)
            .field("connection_type", &self.connection_type)
            .field("role", &self.role)
            .field("description", &self.description)
            .field("auto_connect", &self.auto_connect)
            .field("is_connected", &self.is_connected())
            .finish_non_exhaustive()
    }
}

fn same_publisher(a: &Arc<dyn Publisher>, b: &Arc<dyn Publisher>) -> bool {
    std::ptr::eq(Arc::as_ptr(a).cast::<()>(), Arc::as_ptr(b).cast::<()>())
}

/// Per-connection status entry
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ConnectionParams {
    /// Connection id
    pub connection_id: String,
    /// Transport kind
    pub connection_type: ConnectionType,
    /// Role designation
    pub role: ConnectionRole,
    /// Description
    pub description: String,
    /// Connected state at the time of the snapshot
    pub is_connected: bool,
    /// Auto-connect flag
    pub auto_connect: bool,
    /// TCP host
    #[serde(skip_serializing_if = "Option::is_none")]
    pub host: Option<String>,
    /// TCP port
    #[serde(skip_serializing_if = "Option::is_none")]
    pub port: Option<u16>,
    /// Serial device path
    #[serde(skip_serializing_if = "Option::is_none")]
    pub serial_port: Option<String>,
}

/// Aggregate status of all connections
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ConnectionStatus {
    /// Number of registered connections
    pub total_connections: usize,
    /// Number of admin connections
    pub admin_connections: usize,
    /// Number of client connections
    pub client_connections: usize,
    /// Whether any admin connection is up
    pub admin_connected: bool,
    /// Whether any client connection is up
    pub client_connected: bool,
    /// Per-connection entries, in registration order
    pub connections: Vec<ConnectionParams>,
}

/// Registry of named transport connections
///
/// One instance is shared by the whole process; the map is guarded by a
/// single read-write lock. Publisher calls happen outside the lock on a
/// snapshot of the affected entries.
#[derive(Default)]
pub struct ConnectionManager {
    connections: RwLock<IndexMap<String, ConnectionInfo>>,
}

impl ConnectionManager {
    /// Create empty manager
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a connection, replacing any entry with the same id
    ///
    /// A replaced publisher that is still connected is disconnected, unless
    /// the new entry shares it.
    pub fn add_connection(&self, info: ConnectionInfo) {
        let id = info.connection_id.clone();
        let connection_type = info.connection_type;
        let role = info.role;
        let publisher = Arc::clone(&info.publisher);

        let previous = self.connections.write().insert(id.clone(), info);
        if let Some(previous) = previous {
            tracing::warn!(connection_id = %id, "connection already exists, replaced");
            if !same_publisher(&previous.publisher, &publisher) && previous.is_connected() {
                previous.publisher.disconnect();
                tracing::info!(connection_id = %id, "disconnected replaced connection");
            }
        }
        tracing::info!(connection_id = %id, %connection_type, %role, "added connection");
    }

    /// Register a connection and connect it right away if it auto-connects
    ///
    /// Returns the connect outcome, `false` when auto-connect is off.
    pub fn add_and_connect(&self, info: ConnectionInfo) -> bool {
        let publisher = Arc::clone(&info.publisher);
        let auto_connect = info.auto_connect;
        let id = info.connection_id.clone();
        self.add_connection(info);

        if !auto_connect {
            return false;
        }
        let connected = publisher.connect();
        if !connected {
            tracing::warn!(connection_id = %id, "failed to connect");
        }
        connected
    }

    /// Disconnect (if connected) and remove a connection
    ///
    /// Returns `false` if the id is unknown.
    pub fn remove_connection(&self, connection_id: &str) -> bool {
        let Some(info) = self.connections.write().shift_remove(connection_id) else {
            tracing::warn!(connection_id, "connection not found");
            return false;
        };

        if info.is_connected() {
            info.publisher.disconnect();
            tracing::info!(connection_id, "disconnected connection");
        }
        tracing::info!(connection_id, "removed connection");
        true
    }

    /// Look up a connection by id
    #[must_use]
    pub fn get_connection(&self, connection_id: &str) -> Option<ConnectionInfo> {
        self.connections.read().get(connection_id).cloned()
    }

    /// First registered connection with `role`
    #[must_use]
    pub fn get_connection_by_role(&self, role: ConnectionRole) -> Option<ConnectionInfo> {
        self.connections
            .read()
            .values()
            .find(|c| c.role == role)
            .cloned()
    }

    /// All connections with `role`, in registration order
    #[must_use]
    pub fn get_all_connections_by_role(&self, role: ConnectionRole) -> Vec<ConnectionInfo> {
        self.connections
            .read()
            .values()
            .filter(|c| c.role == role)
            .cloned()
            .collect()
    }

    /// All connections, in registration order
    #[must_use]
    pub fn get_all_connections(&self) -> Vec<ConnectionInfo> {
        self.connections.read().values().cloned().collect()
    }

    /// Number of registered connections
    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.connections.read().len()
    }

    /// Whether no connection is registered
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.connections.read().is_empty()
    }

    /// Publisher for privileged configuration traffic
    #[must_use]
    pub fn get_admin_publisher(&self) -> Option<Arc<dyn Publisher>> {
        self.publisher_for(ConnectionRole::Admin)
    }

    /// Publisher for ordinary traffic
    #[must_use]
    pub fn get_client_publisher(&self) -> Option<Arc<dyn Publisher>> {
        self.publisher_for(ConnectionRole::Client)
    }

    /// First connected connection of `role`, else the first of that role
    fn publisher_for(&self, role: ConnectionRole) -> Option<Arc<dyn Publisher>> {
        let candidates = self.get_all_connections_by_role(role);

        let Some(first) = candidates.first() else {
            tracing::warn!(%role, "no connection configured for role");
            return None;
        };

        if let Some(connected) = candidates.iter().find(|c| c.is_connected()) {
            tracing::debug!(connection_id = %connected.connection_id, %role, "using connected connection");
            return Some(Arc::clone(&connected.publisher));
        }

        tracing::debug!(connection_id = %first.connection_id, %role, "using connection (not yet connected)");
        Some(Arc::clone(&first.publisher))
    }

    /// Change the role of a connection
    ///
    /// Returns `false` if the id is unknown.
    pub fn set_connection_role(&self, connection_id: &str, role: ConnectionRole) -> bool {
        let mut connections = self.connections.write();
        let Some(info) = connections.get_mut(connection_id) else {
            tracing::warn!(connection_id, "connection not found");
            return false;
        };

        let old_role = std::mem::replace(&mut info.role, role);
        tracing::info!(connection_id, from = %old_role, to = %role, "changed connection role");
        true
    }

    fn snapshot(&self, role: Option<ConnectionRole>) -> Vec<ConnectionInfo> {
        match role {
            Some(role) => self.get_all_connections_by_role(role),
            None => self.get_all_connections(),
        }
    }

    /// Connect every connection, optionally only those with `role`
    ///
    /// Connections with auto-connect off report `false` without being
    /// touched.
    pub fn connect_all(&self, role: Option<ConnectionRole>) -> IndexMap<String, bool> {
        self.snapshot(role)
            .into_iter()
            .map(|conn| {
                if !conn.auto_connect {
                    tracing::debug!(connection_id = %conn.connection_id, "skipping connection (auto_connect = false)");
                    return (conn.connection_id, false);
                }

                let connected = conn.publisher.connect();
                if connected {
                    tracing::info!(connection_id = %conn.connection_id, role = %conn.role, "connected");
                } else {
                    tracing::warn!(connection_id = %conn.connection_id, "failed to connect");
                }
                (conn.connection_id, connected)
            })
            .collect()
    }

    /// Disconnect every connection, optionally only those with `role`
    pub fn disconnect_all(&self, role: Option<ConnectionRole>) -> IndexMap<String, bool> {
        self.snapshot(role)
            .into_iter()
            .map(|conn| {
                conn.publisher.disconnect();
                tracing::info!(connection_id = %conn.connection_id, "disconnected");
                (conn.connection_id, true)
            })
            .collect()
    }

    /// Aggregate status with per-connection parameters
    #[must_use]
    pub fn get_status(&self) -> ConnectionStatus {
        let connections = self.get_all_connections();
        let of_role = |role: ConnectionRole| connections.iter().filter(move |c| c.role == role);

        ConnectionStatus {
            total_connections: connections.len(),
            admin_connections: of_role(ConnectionRole::Admin).count(),
            client_connections: of_role(ConnectionRole::Client).count(),
            admin_connected: of_role(ConnectionRole::Admin).any(ConnectionInfo::is_connected),
            client_connected: of_role(ConnectionRole::Client).any(ConnectionInfo::is_connected),
            connections: connections.iter().map(ConnectionInfo::params).collect(),
        }
    }
}

impl fmt::Debug for ConnectionManager {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ConnectionManager")
            .field("connections", &self.connections.read().keys().collect::<Vec<_>>())
            .finish()
    }
}
