use super::{Connection, Role};
use std::time::Duration;
use tokio::sync::mpsc::error::TrySendError;
use tokio::sync::mpsc;
use tungstenite::protocol::Message as WsMessage;

#[test]
fn test_connection_new() {
    let (tx, _rx) = mpsc::channel::<WsMessage>(8);
    let conn = Connection::new(Role::Subscriber, "127.0.0.1:5000", tx);
    assert!(conn.id.starts_with("conn-"));
    assert_eq!(conn.role, Role::Subscriber);
    assert_eq!(conn.remote, "127.0.0.1:5000");
}

#[test]
fn test_connection_ids_are_unique() {
    let (tx, _rx) = mpsc::channel::<WsMessage>(8);
    let a = Connection::new(Role::Subscriber, "a", tx.clone());
    let b = Connection::new(Role::Subscriber, "b", tx);
    assert_ne!(a.id, b.id);
}

#[test]
fn test_send_fails_after_receiver_dropped() {
    let (tx, rx) = mpsc::channel::<WsMessage>(8);
    let conn = Connection::new(Role::Subscriber, "peer", tx);
    assert!(conn.send(WsMessage::text("before")).is_ok());

    drop(rx);
    match conn.send(WsMessage::text("after")) {
        Err(TrySendError::Closed(returned)) => assert_eq!(returned, WsMessage::text("after")),
        other => panic!("expected closed channel, got {other:?}"),
    }
}

#[test]
fn test_send_fails_when_queue_is_full() {
    let (tx, mut rx) = mpsc::channel::<WsMessage>(2);
    let conn = Connection::new(Role::Subscriber, "peer", tx);
    assert!(conn.send(WsMessage::text("1")).is_ok());
    assert!(conn.send(WsMessage::text("2")).is_ok());

    assert!(matches!(
        conn.send(WsMessage::text("3")),
        Err(TrySendError::Full(_))
    ));

    // Draining frees a slot again.
    assert_eq!(rx.try_recv().unwrap(), WsMessage::text("1"));
    assert!(conn.send(WsMessage::text("3")).is_ok());
}

#[tokio::test]
async fn test_evict_reaches_every_clone() {
    let (tx, _rx) = mpsc::channel::<WsMessage>(8);
    let conn = Connection::new(Role::Subscriber, "peer", tx);
    let registered_copy = conn.clone();

    registered_copy.evict();

    tokio::time::timeout(Duration::from_secs(1), conn.evicted())
        .await
        .expect("eviction was not observed");
}

#[test]
fn test_browser_path_is_publisher() {
    assert_eq!(Role::from_path("/browser"), Role::Publisher);
}

#[test]
fn test_other_paths_are_subscribers() {
    for path in ["/", "", "/unity", "/browser/", "/Browser", "browser"] {
        assert_eq!(Role::from_path(path), Role::Subscriber, "path {path:?}");
    }
}

#[test]
fn test_role_display() {
    assert_eq!(Role::Publisher.to_string(), "publisher");
    assert_eq!(Role::Subscriber.to_string(), "subscriber");
}
