//! Testing utilities for meshcfg workspace
//!
//! Shared mock publishers and configuration fixtures.

#![allow(missing_docs)]

use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;

use meshcfg_compare::ConfigValue;
use meshcfg_connection::{ConnectionInfo, ConnectionRole, ConnectionType, Publisher, TransportParams};
use serde_json::json;

/// In-memory publisher with a configurable connect outcome
#[derive(Debug)]
pub struct MockPublisher {
    connected: AtomicBool,
    connect_succeeds: bool,
    connect_calls: AtomicUsize,
    disconnect_calls: AtomicUsize,
    params: TransportParams,
}

impl Default for MockPublisher {
    fn default() -> Self {
        Self::new()
    }
}

impl MockPublisher {
    pub fn new() -> Self {
        Self {
            connected: AtomicBool::new(false),
            connect_succeeds: true,
            connect_calls: AtomicUsize::new(0),
            disconnect_calls: AtomicUsize::new(0),
            params: TransportParams::default(),
        }
    }

    /// Publisher whose `connect` always fails
    pub fn failing() -> Self {
        Self {
            connect_succeeds: false,
            ..Self::new()
        }
    }

    pub fn tcp(host: &str, port: u16) -> Self {
        Self {
            params: TransportParams {
                host: Some(host.to_string()),
                port: Some(port),
                serial_port: None,
            },
            ..Self::new()
        }
    }

    pub fn serial(path: &str) -> Self {
        Self {
            params: TransportParams {
                serial_port: Some(path.to_string()),
                ..TransportParams::default()
            },
            ..Self::new()
        }
    }

    /// Already connected
    #[must_use]
    pub fn connected(self) -> Self {
        self.connected.store(true, Ordering::SeqCst);
        self
    }

    pub fn connect_calls(&self) -> usize {
        self.connect_calls.load(Ordering::SeqCst)
    }

    pub fn disconnect_calls(&self) -> usize {
        self.disconnect_calls.load(Ordering::SeqCst)
    }
}

impl Publisher for MockPublisher {
    fn connect(&self) -> bool {
        self.connect_calls.fetch_add(1, Ordering::SeqCst);
        self.connected.store(self.connect_succeeds, Ordering::SeqCst);
        self.connect_succeeds
    }

    fn disconnect(&self) {
        self.disconnect_calls.fetch_add(1, Ordering::SeqCst);
        self.connected.store(false, Ordering::SeqCst);
    }

    fn is_connected(&self) -> bool {
        self.connected.load(Ordering::SeqCst)
    }

    fn transport_params(&self) -> TransportParams {
        self.params.clone()
    }
}

/// Connection backed by `publisher`, returned alongside a handle for assertions
pub fn mock_connection(
    id: &str,
    connection_type: ConnectionType,
    role: ConnectionRole,
    publisher: MockPublisher,
) -> (ConnectionInfo, Arc<MockPublisher>) {
    let publisher = Arc::new(publisher);
    let info = ConnectionInfo::new(id, connection_type, role, publisher.clone());
    (info, publisher)
}

pub fn device_config() -> ConfigValue {
    json!({"role": 1, "serial_enabled": true, "node_info_broadcast_secs": 10800}).into()
}

pub fn lora_config() -> ConfigValue {
    json!({"region": 1, "modem_preset": 0, "hop_limit": 3, "tx_enabled": true, "tx_power": 20}).into()
}

/// Security section holding key material as base64
pub fn security_config() -> ConfigValue {
    json!({
        "public_key": "AQIDBA==",
        "admin_key": ["AQIDBA==", "BQYHCA=="],
        "is_managed": false,
    })
    .into()
}

/// Channel as a node reports it, psk as raw bytes
pub fn channel_config(index: i64, psk: &[u8]) -> ConfigValue {
    let mut channel: ConfigValue = json!({
        "index": index,
        "role": "PRIMARY",
        "settings": {"name": "LongFast", "uplink_enabled": false}
    })
    .into();
    if let ConfigValue::Map(map) = &mut channel {
        if let Some(ConfigValue::Map(settings)) = map.get_mut("settings") {
            settings.insert("psk".to_string(), ConfigValue::Bytes(psk.to_vec()));
        }
    }
    channel
}

/// Wrap `inner` in a single-key section envelope
pub fn enveloped(section: &str, inner: ConfigValue) -> ConfigValue {
    std::iter::once((section.to_string(), inner)).collect()
}
