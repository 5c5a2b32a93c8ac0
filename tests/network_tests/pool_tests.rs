//! Pool Tests
//!
//! Tests for socket caching keyed by persistence id and endpoint.

use std::net::TcpListener;
use std::sync::{Arc, Barrier};
use std::thread;
use std::time::{Duration, Instant};

use memwire::network::{endpoint_hash, ConnectionPool, SocketOptions};
use memwire::protocol::{encode_line, Command};
use memwire::MemwireError;

fn listener() -> (TcpListener, u16) {
    let listener = TcpListener::bind("127.0.0.1:0").unwrap();
    let port = listener.local_addr().unwrap().port();
    (listener, port)
}

#[test]
fn test_endpoint_hash_is_stable() {
    assert_eq!(endpoint_hash("127.0.0.1", 11211), endpoint_hash("127.0.0.1", 11211));
    assert_ne!(endpoint_hash("127.0.0.1", 11211), endpoint_hash("127.0.0.1", 11212));
    assert_eq!(
        endpoint_hash("localhost", 11211),
        crc32fast::hash(b"localhost:11211")
    );
}

#[test]
fn test_generated_ids_are_unique() {
    let pool = ConnectionPool::new();
    let first = pool.generate_persistence_id();
    let second = pool.generate_persistence_id();
    assert_ne!(first, second);
}

#[test]
fn test_same_id_reuses_socket() {
    let (_listener, port) = listener();
    let pool = ConnectionPool::new();
    let options = SocketOptions::default();

    let first = pool.connect("app", "127.0.0.1", port, &options).unwrap();
    let second = pool.connect("app", "127.0.0.1", port, &options).unwrap();

    assert!(Arc::ptr_eq(&first, &second));
    assert_eq!(pool.len("app"), 1);
}

#[test]
fn test_distinct_ids_get_distinct_sockets() {
    let (_listener, port) = listener();
    let pool = ConnectionPool::new();
    let options = SocketOptions::default();

    let a = pool.connect("a", "127.0.0.1", port, &options).unwrap();
    let b = pool.connect("b", "127.0.0.1", port, &options).unwrap();

    assert!(!Arc::ptr_eq(&a, &b));
    assert_ne!(a.lock().local_addr().unwrap(), b.lock().local_addr().unwrap());
}

#[test]
fn test_racing_connects_share_one_socket() {
    let (_listener, port) = listener();
    let pool = Arc::new(ConnectionPool::new());
    let barrier = Arc::new(Barrier::new(8));

    let handles: Vec<_> = (0..8)
        .map(|_| {
            let pool = Arc::clone(&pool);
            let barrier = Arc::clone(&barrier);
            thread::spawn(move || {
                barrier.wait();
                pool.connect("app", "127.0.0.1", port, &SocketOptions::default())
                    .unwrap()
            })
        })
        .collect();

    let conns: Vec<_> = handles.into_iter().map(|h| h.join().unwrap()).collect();
    let cached = pool
        .connect("app", "127.0.0.1", port, &SocketOptions::default())
        .unwrap();

    assert_eq!(pool.len("app"), 1);
    for conn in &conns {
        assert!(Arc::ptr_eq(conn, &cached));
    }
}

#[test]
fn test_slow_connect_does_not_block_other_ids() {
    let (_listener, port) = listener();
    let pool = Arc::new(ConnectionPool::new());

    // Non-routable address: the connect hangs until its timeout
    let slow_pool = Arc::clone(&pool);
    let slow = thread::spawn(move || {
        let options = SocketOptions {
            connect_timeout: Some(Duration::from_secs(3)),
            ..SocketOptions::default()
        };
        let _ = slow_pool.connect("slow", "10.255.255.1", 11211, &options);
    });

    thread::sleep(Duration::from_millis(200));
    let start = Instant::now();
    pool.connect("fast", "127.0.0.1", port, &SocketOptions::default())
        .unwrap();
    assert!(start.elapsed() < Duration::from_secs(1));

    slow.join().unwrap();
}

#[test]
fn test_evict_forces_reconnect() {
    let (_listener, port) = listener();
    let pool = ConnectionPool::new();
    let options = SocketOptions::default();

    let before = pool.connect("app", "127.0.0.1", port, &options).unwrap();
    assert!(pool.contains("app", "127.0.0.1", port));

    assert!(pool.evict("app", "127.0.0.1", port));
    assert!(!pool.contains("app", "127.0.0.1", port));
    assert!(!pool.evict("app", "127.0.0.1", port));

    let after = pool.connect("app", "127.0.0.1", port, &options).unwrap();
    assert!(!Arc::ptr_eq(&before, &after));
}

#[test]
fn test_clear() {
    let (_listener, port) = listener();
    let pool = ConnectionPool::new();
    pool.connect("app", "127.0.0.1", port, &SocketOptions::default())
        .unwrap();

    assert!(!pool.is_empty());
    pool.clear();
    assert!(pool.is_empty());
}

#[test]
fn test_connect_failure() {
    let (listener, port) = listener();
    drop(listener);

    let pool = ConnectionPool::new();
    let err = pool
        .connect("app", "127.0.0.1", port, &SocketOptions::default())
        .unwrap_err();

    match err {
        MemwireError::Connection { host, port: p, .. } => {
            assert_eq!(host, "127.0.0.1");
            assert_eq!(p, port);
        }
        other => panic!("Expected connection error, got {:?}", other),
    }
    assert_eq!(pool.len("app"), 0);
}

#[test]
fn test_round_trip_over_pooled_socket() {
    let (listener, port) = listener();
    thread::spawn(move || {
        use std::io::{Read, Write};
        let (mut stream, _) = listener.accept().unwrap();
        let mut buf = [0u8; 64];
        let n = stream.read(&mut buf).unwrap();
        assert_eq!(&buf[..n], b"version\r\n");
        stream.write_all(b"VERSION 1.6.21\r\n").unwrap();
    });

    let pool = ConnectionPool::new();
    let conn = pool
        .connect("app", "127.0.0.1", port, &SocketOptions::default())
        .unwrap();

    let wire = encode_line::<&str>(Command::Version, &[]);
    let reply = conn.lock().round_trip(Command::Version, &wire).unwrap();
    assert_eq!(&reply[..], b"VERSION 1.6.21\r\n");
}
