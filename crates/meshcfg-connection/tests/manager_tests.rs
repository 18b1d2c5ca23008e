//! Connection manager integration tests

use std::sync::Arc;
use std::thread;

use meshcfg_connection::{ConnectionManager, ConnectionRole, ConnectionType, Publisher};
use meshcfg_test_utils::{mock_connection, MockPublisher};
use pretty_assertions::assert_eq;
use serde_json::json;

fn manager_with_two_roles() -> (ConnectionManager, Arc<MockPublisher>, Arc<MockPublisher>) {
    let manager = ConnectionManager::new();
    let (admin, admin_pub) = mock_connection(
        "radio-tcp",
        ConnectionType::Tcp,
        ConnectionRole::Admin,
        MockPublisher::tcp("192.168.1.50", 4403),
    );
    let (client, client_pub) = mock_connection(
        "radio-serial",
        ConnectionType::Serial,
        ConnectionRole::Client,
        MockPublisher::serial("/dev/ttyACM0"),
    );
    manager.add_connection(admin.with_description("Admin radio"));
    manager.add_connection(client);
    (manager, admin_pub, client_pub)
}

#[test]
fn add_and_lookup() {
    let (manager, _, _) = manager_with_two_roles();

    assert_eq!(manager.len(), 2);
    let admin = manager.get_connection("radio-tcp").unwrap();
    assert_eq!(admin.role, ConnectionRole::Admin);
    assert_eq!(admin.description, "Admin radio");
    assert!(manager.get_connection("missing").is_none());

    let by_role = manager.get_connection_by_role(ConnectionRole::Client).unwrap();
    assert_eq!(by_role.connection_id, "radio-serial");
}

#[test]
fn add_connection_does_not_connect() {
    let (manager, admin_pub, _) = manager_with_two_roles();
    assert_eq!(admin_pub.connect_calls(), 0);
    assert!(!manager.get_connection("radio-tcp").unwrap().is_connected());
}

#[test]
fn remove_disconnects_connected() {
    let manager = ConnectionManager::new();
    let (info, publisher) = mock_connection(
        "a",
        ConnectionType::Tcp,
        ConnectionRole::Admin,
        MockPublisher::new().connected(),
    );
    manager.add_connection(info);

    assert!(manager.remove_connection("a"));
    assert_eq!(publisher.disconnect_calls(), 1);
    assert!(manager.is_empty());
    assert!(!manager.remove_connection("a"));
}

#[test]
fn replacing_connected_entry_disconnects_old_publisher() {
    let manager = ConnectionManager::new();
    let (old, old_pub) = mock_connection(
        "radio",
        ConnectionType::Tcp,
        ConnectionRole::Admin,
        MockPublisher::new().connected(),
    );
    let (idle, idle_pub) =
        mock_connection("spare", ConnectionType::Tcp, ConnectionRole::Admin, MockPublisher::new());
    let (new, new_pub) =
        mock_connection("radio", ConnectionType::Serial, ConnectionRole::Admin, MockPublisher::new());
    let (new_spare, _) =
        mock_connection("spare", ConnectionType::Tcp, ConnectionRole::Client, MockPublisher::new());
    manager.add_connection(old);
    manager.add_connection(idle);

    manager.add_connection(new);
    manager.add_connection(new_spare);

    assert_eq!(old_pub.disconnect_calls(), 1);
    assert!(!old_pub.is_connected());
    assert_eq!(idle_pub.disconnect_calls(), 0);
    assert_eq!(new_pub.connect_calls(), 0);
    assert_eq!(manager.len(), 2);
}

#[test]
fn remove_skips_disconnect_when_down() {
    let manager = ConnectionManager::new();
    let (info, publisher) =
        mock_connection("a", ConnectionType::Mqtt, ConnectionRole::Client, MockPublisher::new());
    manager.add_connection(info);

    assert!(manager.remove_connection("a"));
    assert_eq!(publisher.disconnect_calls(), 0);
}

#[test]
fn all_connections_by_role_keeps_order() {
    let manager = ConnectionManager::new();
    for id in ["c1", "a1", "c2", "c3"] {
        let role = if id.starts_with('a') {
            ConnectionRole::Admin
        } else {
            ConnectionRole::Client
        };
        let (info, _) = mock_connection(id, ConnectionType::Tcp, role, MockPublisher::new());
        manager.add_connection(info);
    }

    let ids: Vec<_> = manager
        .get_all_connections_by_role(ConnectionRole::Client)
        .into_iter()
        .map(|c| c.connection_id)
        .collect();
    assert_eq!(ids, vec!["c1", "c2", "c3"]);
    assert_eq!(manager.get_all_connections().len(), 4);
}

#[test]
fn publisher_getters_prefer_connected() {
    let manager = ConnectionManager::new();
    let (first, _) =
        mock_connection("first", ConnectionType::Tcp, ConnectionRole::Admin, MockPublisher::new());
    let (second, second_pub) = mock_connection(
        "second",
        ConnectionType::Tcp,
        ConnectionRole::Admin,
        MockPublisher::new().connected(),
    );
    manager.add_connection(first);
    manager.add_connection(second);

    let admin = manager.get_admin_publisher().unwrap();
    assert!(admin.is_connected());
    admin.disconnect();
    assert_eq!(second_pub.disconnect_calls(), 1);

    assert!(manager.get_client_publisher().is_none());
}

#[test]
fn publisher_getter_falls_back_to_first() {
    let (manager, admin_pub, _) = manager_with_two_roles();
    let admin = manager.get_admin_publisher().unwrap();
    assert!(!admin.is_connected());
    admin.connect();
    assert_eq!(admin_pub.connect_calls(), 1);
}

#[test]
fn set_role_moves_connection() {
    let (manager, _, _) = manager_with_two_roles();

    assert!(manager.set_connection_role("radio-serial", ConnectionRole::Admin));
    assert_eq!(manager.get_all_connections_by_role(ConnectionRole::Admin).len(), 2);
    assert!(manager.get_connection_by_role(ConnectionRole::Client).is_none());

    assert!(!manager.set_connection_role("missing", ConnectionRole::Client));
}

#[test]
fn connect_all_reports_per_connection() {
    let manager = ConnectionManager::new();
    let (ok, _) = mock_connection("ok", ConnectionType::Tcp, ConnectionRole::Admin, MockPublisher::new());
    let (bad, _) =
        mock_connection("bad", ConnectionType::Tcp, ConnectionRole::Admin, MockPublisher::failing());
    let (manual, manual_pub) =
        mock_connection("manual", ConnectionType::Tcp, ConnectionRole::Client, MockPublisher::new());
    manager.add_connection(ok);
    manager.add_connection(bad);
    manager.add_connection(manual.with_auto_connect(false));

    let results = manager.connect_all(None);
    let flat: Vec<_> = results.iter().map(|(k, v)| (k.as_str(), *v)).collect();
    assert_eq!(flat, vec![("ok", true), ("bad", false), ("manual", false)]);
    assert_eq!(manual_pub.connect_calls(), 0);
}

#[test]
fn connect_and_disconnect_by_role() {
    let (manager, admin_pub, client_pub) = manager_with_two_roles();

    let results = manager.connect_all(Some(ConnectionRole::Admin));
    assert_eq!(results.len(), 1);
    assert_eq!(results.get("radio-tcp"), Some(&true));
    assert_eq!(client_pub.connect_calls(), 0);

    let results = manager.disconnect_all(Some(ConnectionRole::Client));
    assert_eq!(results.get("radio-serial"), Some(&true));
    assert_eq!(admin_pub.disconnect_calls(), 0);
    assert_eq!(client_pub.disconnect_calls(), 1);

    let results = manager.disconnect_all(None);
    assert_eq!(results.len(), 2);
    assert!(!manager.get_connection("radio-tcp").unwrap().is_connected());
}

#[test]
fn status_counts_and_params() {
    let (manager, _, _) = manager_with_two_roles();
    manager.connect_all(Some(ConnectionRole::Admin));

    let status = manager.get_status();
    assert_eq!(status.total_connections, 2);
    assert_eq!(status.admin_connections, 1);
    assert_eq!(status.client_connections, 1);
    assert!(status.admin_connected);
    assert!(!status.client_connected);

    let json = serde_json::to_value(&status).unwrap();
    assert_eq!(
        json["connections"][0],
        json!({
            "connection_id": "radio-tcp",
            "connection_type": "tcp",
            "role": "admin",
            "description": "Admin radio",
            "is_connected": true,
            "auto_connect": true,
            "host": "192.168.1.50",
            "port": 4403,
        })
    );
    assert_eq!(json["connections"][1]["serial_port"], json!("/dev/ttyACM0"));
    assert!(json["connections"][1].get("host").is_none());
}

#[test]
fn empty_status() {
    let status = ConnectionManager::new().get_status();
    assert_eq!(status.total_connections, 0);
    assert!(!status.admin_connected);
    assert!(status.connections.is_empty());
}

#[test]
fn concurrent_add_and_remove() {
    let manager = Arc::new(ConnectionManager::new());

    let handles: Vec<_> = (0..8)
        .map(|t| {
            let manager = Arc::clone(&manager);
            thread::spawn(move || {
                for i in 0..50 {
                    let id = format!("conn-{t}-{i}");
                    let (info, _) =
                        mock_connection(&id, ConnectionType::Tcp, ConnectionRole::Client, MockPublisher::new());
                    manager.add_connection(info);
                    if i % 2 == 0 {
                        assert!(manager.remove_connection(&id));
                    }
                }
            })
        })
        .collect();

    for handle in handles {
        handle.join().unwrap();
    }

    assert_eq!(manager.len(), 8 * 25);
}
