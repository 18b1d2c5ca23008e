//! End-to-end engine tests

use std::io::Write;
use std::sync::Arc;

use meshcfg_core::connection::{ConnectionRole, ConnectionType, Publisher};
use meshcfg_core::pki::ErrorClass;
use meshcfg_core::registry::{ChangeRequest, ChangeStatus, ChangeType, TransactionId};
use meshcfg_core::{AdminEngine, ConnectionDefinition, EngineError};
use meshcfg_test_utils::{
    channel_config, device_config, enveloped, lora_config, security_config, MockPublisher,
};
use pretty_assertions::assert_eq;
use serde_json::json;

const NODE: u32 = 0xa1b2_c3d4;

fn mock_factory(definition: &ConnectionDefinition, connection_type: ConnectionType) -> Option<Arc<dyn Publisher>> {
    let publisher = match connection_type {
        ConnectionType::Tcp => MockPublisher::tcp(definition.host.as_deref().unwrap_or("localhost"), definition.port.unwrap_or(4403)),
        ConnectionType::Serial => MockPublisher::serial(definition.serial_port.as_deref().unwrap_or("/dev/ttyUSB0")),
        ConnectionType::Mqtt => return None,
    };
    Some(Arc::new(publisher))
}

fn engine_with_change(key: &str) -> (AdminEngine, TransactionId) {
    let engine = AdminEngine::default();
    let registry = engine.registry();
    let tx = registry.begin_transaction(NODE).transaction_id;
    registry
        .register_change(
            &tx,
            ChangeRequest::new(ChangeType::Config, NODE, key, json!({"is_managed": true}))
                .with_original(json!({"is_managed": false})),
        )
        .unwrap();
    (engine, tx)
}

#[test]
fn initialize_connections_from_toml_file() {
    let mut file = tempfile::Builder::new().suffix(".toml").tempfile().unwrap();
    write!(
        file,
        r#"
transaction_max_age_secs = 120

[[connections]]
id = "radio"
type = "tcp"
role = "admin"
host = "10.1.1.1"
port = 4403
description = "Roof node"

[[connections]]
id = "usb"
type = "SERIAL"
role = "operator"
serial_port = "/dev/ttyACM0"

[[connections]]
id = "broker"
type = "mqtt"

[[connections]]
id = "bt"
type = "bluetooth"

[[connections]]
type = "tcp"
"#
    )
    .unwrap();

    let engine = AdminEngine::from_config_file(file.path()).unwrap();
    assert_eq!(engine.config().transaction_max_age_secs, 120);
    assert_eq!(engine.initialize_connections(&mock_factory), 2);

    let radio = engine.connections().get_connection("radio").unwrap();
    assert_eq!(radio.role, ConnectionRole::Admin);
    assert_eq!(radio.description, "Roof node");

    let usb = engine.connections().get_connection("usb").unwrap();
    assert_eq!(usb.connection_type, ConnectionType::Serial);
    assert_eq!(usb.role, ConnectionRole::Client);

    let status = engine.connection_status();
    assert_eq!(status.admin_connections, 1);
    assert_eq!(status.connections[0].host.as_deref(), Some("10.1.1.1"));
    assert_eq!(status.connections[1].serial_port.as_deref(), Some("/dev/ttyACM0"));
}

#[test]
fn yaml_file_by_extension() {
    let mut file = tempfile::Builder::new().suffix(".yml").tempfile().unwrap();
    writeln!(file, "log_filter: debug\nconnections:\n  - id: radio\n    type: tcp\n    auto_connect: false").unwrap();

    let engine = AdminEngine::from_config_file(file.path()).unwrap();
    assert_eq!(engine.config().log_filter, "debug");
    engine.initialize_connections(&mock_factory);

    let results = engine.connections().connect_all(None);
    assert_eq!(results.get("radio"), Some(&false));
}

#[test]
fn missing_file_is_io_error() {
    let dir = tempfile::tempdir().unwrap();
    let err = AdminEngine::from_config_file(dir.path().join("absent.toml")).unwrap_err();
    assert!(matches!(err, EngineError::Io { .. }));
}

#[test]
fn key_configuration_error_fails_change() {
    let (engine, tx) = engine_with_change("security");

    let class = engine.handle_admin_error(&tx, "security", "ADMIN_PUBLIC_KEY_UNAUTHORIZED");
    assert_eq!(class, ErrorClass::RequiresKeyConfiguration);
    assert!(!class.is_retryable());

    let change = &engine.registry().get_all_changes(&tx)[0];
    assert_eq!(change.status, ChangeStatus::Failed);
    assert!(change
        .error_message
        .as_deref()
        .unwrap()
        .starts_with("ADMIN_PUBLIC_KEY_UNAUTHORIZED"));
}

#[test]
fn recoverable_and_unrelated_errors_leave_change_pending() {
    let (engine, tx) = engine_with_change("security");

    assert_eq!(
        engine.handle_admin_error(&tx, "security", "ADMIN_BAD_SESSION_KEY"),
        ErrorClass::RecoverableSession
    );
    assert_eq!(engine.handle_admin_error(&tx, "security", "TIMEOUT"), ErrorClass::Unrelated);
    assert_eq!(engine.handle_admin_error(&tx, "security", "SOMETHING_ELSE"), ErrorClass::Unrelated);
    assert!(engine.registry().has_pending_changes(&tx));
}

#[test]
fn full_transaction_flow() {
    let engine = AdminEngine::default();
    let registry = engine.registry();
    let tx = registry.begin_transaction(NODE).transaction_id;

    let unchanged = ChangeRequest::new(ChangeType::Config, NODE, "device", device_config())
        .with_original(enveloped("device", device_config()));
    let lora = ChangeRequest::new(ChangeType::Config, NODE, "lora", json!({"region": 3, "hop_limit": 3}))
        .with_original(lora_config());
    let security = ChangeRequest::new(ChangeType::Config, NODE, "security", json!({"admin_key": ["BQYHCA==", "AQIDBA=="]}))
        .with_original(security_config());

    assert_eq!(registry.register_change(&tx, unchanged).unwrap().status, ChangeStatus::Skipped);
    assert_eq!(registry.register_change(&tx, lora).unwrap().status, ChangeStatus::Pending);
    assert_eq!(registry.register_change(&tx, security).unwrap().status, ChangeStatus::Skipped);

    assert!(registry.mark_begin_sent(&tx));
    assert!(registry.mark_change_applied(&tx, "lora", Some(1001)));
    assert!(registry.mark_commit_sent(&tx));

    let summary = registry.complete_transaction(&tx).unwrap();
    assert_eq!((summary.applied, summary.skipped, summary.total_changes), (1, 2, 3));
    assert!(summary.begin_sent && summary.commit_sent);

    let revert = registry.get_revert_data(&tx);
    assert_eq!(revert.len(), 1);
    assert_eq!(revert[0].original_value, lora_config());
}

#[test]
fn channel_with_raw_psk_matches_base64_request() {
    let engine = AdminEngine::default();
    let registry = engine.registry();
    let tx = registry.begin_transaction(NODE).transaction_id;

    let desired = json!({
        "index": 0,
        "role": "PRIMARY",
        "settings": {"name": "LongFast", "uplink_enabled": false, "psk": "AQ=="}
    });
    let unchanged = ChangeRequest::new(ChangeType::Channel, NODE, "channel_0", desired)
        .with_original(channel_config(0, &[0x01]));
    assert_eq!(registry.register_change(&tx, unchanged).unwrap().status, ChangeStatus::Skipped);

    let new_key = ChangeRequest::new(ChangeType::Channel, NODE, "channel_1", json!({"settings": {"psk": "Ag=="}}))
        .with_original(channel_config(1, &[0x01]));
    assert_eq!(registry.register_change(&tx, new_key).unwrap().status, ChangeStatus::Pending);
}
