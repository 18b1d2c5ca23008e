//! Transport capability consumed by the connection manager

/// Transport-specific fields exposed for status reporting
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TransportParams {
    /// Remote host (TCP)
    pub host: Option<String>,
    /// Remote port (TCP)
    pub port: Option<u16>,
    /// Device path (Serial)
    pub serial_port: Option<String>,
}

/// Minimal capability of a transport connection
///
/// Implementations use interior mutability; the manager shares each
/// publisher between callers through an `Arc`.
pub trait Publisher: Send + Sync {
    /// Attempt to connect, returning whether the connection is up
    fn connect(&self) -> bool;

    /// Tear down the connection
    fn disconnect(&self);

    /// Current connected state
    fn is_connected(&self) -> bool;

    /// Transport-specific fields, empty unless overridden
    fn transport_params(&self) -> TransportParams {
        TransportParams::default()
    }
}
