//! Integration tests for the store library and the line-protocol server.

use proptest::prelude::*;
use std::collections::{HashMap, HashSet};
use std::thread;
use std::time::Duration;

use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tokio::net::{TcpListener, TcpStream};
use ttl_store::{server, State, Store, StoreConfig, StoreError, SweepPolicy, Value};

fn store_with_ttl(ttl: Duration) -> Store {
    Store::new(StoreConfig::new().default_ttl(ttl).build())
}

#[test]
fn test_create_get_scenario() {
    let store = store_with_ttl(Duration::from_secs(1));

    store.create("foo", "bar").unwrap();
    assert_eq!(store.get("foo").unwrap(), Value::from("bar"));

    assert!(matches!(
        store.create("foo", 1),
        Err(StoreError::KeyExists(_))
    ));
    assert_eq!(store.get("foo").unwrap(), Value::from("bar"));
}

#[test]
fn test_update_scenario() {
    let store = store_with_ttl(Duration::from_secs(1));

    assert!(matches!(
        store.update("foo", 1),
        Err(StoreError::KeyNotFound(_))
    ));
    store.create("foo", "bar").unwrap();
    store.update("foo", 1).unwrap();
    assert_eq!(store.get("foo").unwrap(), Value::from(1));
}

#[test]
fn test_missing_key_fails_everywhere() {
    let store = Store::default();

    assert!(matches!(store.get("nope"), Err(StoreError::KeyNotFound(_))));
    assert!(matches!(
        store.update("nope", "v"),
        Err(StoreError::KeyNotFound(_))
    ));
    assert!(matches!(
        store.set_ttl("nope", "1s"),
        Err(StoreError::KeyNotFound(_))
    ));
    assert!(matches!(store.remove("nope"), Err(StoreError::KeyNotFound(_))));
}

#[test]
fn test_set_ttl_expiry_scenario() {
    let store = store_with_ttl(Duration::from_secs(10));

    store.create("foo", "bar").unwrap();
    store.set_ttl("foo", Duration::from_millis(30)).unwrap();
    assert_eq!(store.get("foo").unwrap(), Value::from("bar"));

    thread::sleep(Duration::from_millis(40));
    assert!(matches!(store.get("foo"), Err(StoreError::KeyNotFound(_))));
    assert_eq!(store.stats().expirations, 1);
}

#[test]
fn test_set_ttl_spec_forms() {
    let store = store_with_ttl(Duration::from_millis(50));
    store.create("a", 1).unwrap();
    store.create("b", 2).unwrap();
    store.create("c", 3).unwrap();

    store.set_ttl("a", "10s").unwrap();
    store.set_ttl("b", "1").unwrap();
    store.set_ttl("c", Duration::from_secs(1)).unwrap();
    assert!(matches!(
        store.set_ttl("a", "not-a-duration"),
        Err(StoreError::InvalidTtl(_))
    ));

    // All three outlive the 50ms default.
    thread::sleep(Duration::from_millis(100));
    for key in ["a", "b", "c"] {
        assert!(store.get(key).is_ok(), "{} should still be live", key);
    }
}

#[test]
fn test_negative_ttl_expires_key() {
    let store = store_with_ttl(Duration::from_secs(10));

    store.create("foo", "bar").unwrap();
    store.set_ttl("foo", "-1s").unwrap();
    assert!(matches!(store.get("foo"), Err(StoreError::KeyNotFound(_))));

    store.create("foo", "bar").unwrap();
    store.set_ttl("foo", "-5").unwrap();
    assert!(matches!(store.get("foo"), Err(StoreError::KeyNotFound(_))));

    store.create("foo", "bar").unwrap();
    store.set_ttl("foo", "-0").unwrap();
    assert_eq!(store.get("foo").unwrap(), Value::from("bar"));
}

#[test]
fn test_expired_key_behaves_as_never_created() {
    let store = store_with_ttl(Duration::from_millis(20));
    store.create("foo", "bar").unwrap();
    thread::sleep(Duration::from_millis(40));

    assert!(matches!(store.get("foo"), Err(StoreError::KeyNotFound(_))));
    assert!(matches!(
        store.update("foo", 1),
        Err(StoreError::KeyNotFound(_))
    ));
    assert!(matches!(
        store.set_ttl("foo", "1s"),
        Err(StoreError::KeyNotFound(_))
    ));
    assert!(matches!(store.remove("foo"), Err(StoreError::KeyNotFound(_))));

    store.create("foo", "again").unwrap();
    assert_eq!(store.get("foo").unwrap(), Value::from("again"));
}

#[test]
fn test_list_scenario() {
    let store = store_with_ttl(Duration::from_secs(1));

    store.create("foo", "bar").unwrap();
    store.create("meow", "mooooo").unwrap();
    store.create("wtf", 42).unwrap();

    let keys: HashSet<String> = store.list().unwrap().into_iter().collect();
    let expected: HashSet<String> = ["foo", "meow", "wtf"].iter().map(|s| s.to_string()).collect();
    assert_eq!(keys, expected);
}

#[test]
fn test_list_sweeps_expired_entries() {
    let store = store_with_ttl(Duration::from_millis(30));
    store.create("old", 1).unwrap();
    thread::sleep(Duration::from_millis(50));
    store.create("new", 2).unwrap();

    assert_eq!(store.list().unwrap(), vec!["new"]);
    let stats = store.stats();
    assert_eq!(stats.size, 1);
    assert_eq!(stats.expirations, 1);
}

#[test]
fn test_sweep_policy_default_ttl_ignores_override() {
    let config = StoreConfig::new()
        .default_ttl(Duration::from_millis(30))
        .sweep_policy(SweepPolicy::DefaultTtl)
        .build();
    let store = Store::new(config);

    store.create("long", 1).unwrap();
    store.set_ttl("long", "1h").unwrap();
    thread::sleep(Duration::from_millis(50));

    assert!(store.list().unwrap().is_empty());
    assert!(store.get("long").is_err());
}

#[test]
fn test_sweep_policy_entry_ttl_respects_override() {
    let config = StoreConfig::new()
        .default_ttl(Duration::from_millis(30))
        .sweep_policy(SweepPolicy::EntryTtl)
        .build();
    let store = Store::new(config);

    store.create("long", 1).unwrap();
    store.set_ttl("long", "1h").unwrap();
    store.create("plain", 2).unwrap();
    thread::sleep(Duration::from_millis(50));

    assert_eq!(store.list().unwrap(), vec!["long"]);
    assert_eq!(store.get("long").unwrap(), Value::from(1));
}

#[test]
fn test_concurrent_callers() {
    let store = Store::default();

    let handles: Vec<_> = (0..8)
        .map(|t| {
            let store = store.clone();
            thread::spawn(move || {
                for i in 0..250 {
                    let key = format!("thread_{}_key_{}", t, i);
                    store.create(key.clone(), i).unwrap();
                    assert_eq!(store.get(&key).unwrap(), Value::from(i));
                }
            })
        })
        .collect();

    for handle in handles {
        handle.join().expect("Thread panicked");
    }

    assert_eq!(store.list().unwrap().len(), 2000);
}

#[test]
fn test_racing_creates_have_one_winner() {
    let store = Store::default();

    let handles: Vec<_> = (0..8)
        .map(|t| {
            let store = store.clone();
            thread::spawn(move || store.create("contested", t).is_ok())
        })
        .collect();

    let winners = handles
        .into_iter()
        .map(|h| h.join().expect("Thread panicked"))
        .filter(|won| *won)
        .count();
    assert_eq!(winners, 1);
}

#[test]
fn test_shutdown_drains_then_rejects() {
    let store = Store::default();
    store.create("foo", "bar").unwrap();

    store.shutdown();
    assert_eq!(store.state(), State::Stopped);
    assert!(matches!(store.get("foo"), Err(StoreError::ShuttingDown)));
}

#[tokio::test]
async fn test_tcp_round_trip() {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let store = store_with_ttl(Duration::from_secs(10));
    tokio::spawn(server::serve(listener, store));

    let stream = TcpStream::connect(addr).await.unwrap();
    let (reader, mut writer) = stream.into_split();
    let mut lines = BufReader::new(reader).lines();

    let exchanges = [
        ("{\"command\":\"Create\",\"key\":\"foo\",\"value\":\"bar\"}\n", "OK"),
        ("Get foo\n", "bar"),
        ("Create foo baz\n", "ERR key already exists: 'foo'"),
        ("Update foo hello world\n", "OK"),
        ("Get foo\n", "hello world"),
        ("TTL foo 10s\n", "OK"),
        ("Create meow 1\n", "OK"),
        ("List\n", "[\"foo\",\"meow\"]"),
        ("Remove foo\n", "OK"),
        ("Get foo\n", "ERR key not found: 'foo'"),
        ("Bogus\n", "ERR invalid command: unknown command 'Bogus'"),
    ];

    for (request, expected) in exchanges {
        writer.write_all(request.as_bytes()).await.unwrap();
        let reply = lines.next_line().await.unwrap().unwrap();
        assert_eq!(reply, expected, "reply to {:?}", request);
    }

    writer.write_all(b"Close\n").await.unwrap();
    assert!(lines.next_line().await.unwrap().is_none());
}

#[tokio::test]
async fn test_tcp_invalid_utf8_gets_error_reply() {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(server::serve(listener, Store::default()));

    let stream = TcpStream::connect(addr).await.unwrap();
    let (reader, mut writer) = stream.into_split();
    let mut lines = BufReader::new(reader).lines();

    writer.write_all(b"Get \xff\xfe\n").await.unwrap();
    let reply = lines.next_line().await.unwrap().unwrap();
    assert!(reply.starts_with("ERR parse error:"), "got {:?}", reply);
    assert!(lines.next_line().await.unwrap().is_none());
}

#[derive(Debug, Clone)]
enum Op {
    Create(String, i64),
    Get(String),
    Update(String, i64),
    Remove(String),
}

fn op_strategy() -> impl Strategy<Value = Op> {
    let key = "[a-d]";
    prop_oneof![
        (key, any::<i64>()).prop_map(|(k, v)| Op::Create(k, v)),
        key.prop_map(Op::Get),
        (key, any::<i64>()).prop_map(|(k, v)| Op::Update(k, v)),
        key.prop_map(Op::Remove),
    ]
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(32))]

    // With nothing expiring, the store behaves like a plain map that
    // refuses duplicate creates.
    #[test]
    fn prop_matches_map_model(ops in prop::collection::vec(op_strategy(), 1..60)) {
        let store = store_with_ttl(Duration::from_secs(3600));
        let mut model: HashMap<String, i64> = HashMap::new();

        for op in ops {
            match op {
                Op::Create(k, v) => {
                    let result = store.create(k.clone(), v);
                    if model.contains_key(&k) {
                        prop_assert!(matches!(result, Err(StoreError::KeyExists(_))));
                    } else {
                        prop_assert!(result.is_ok());
                        model.insert(k, v);
                    }
                }
                Op::Get(k) => match model.get(&k) {
                    Some(v) => prop_assert_eq!(store.get(k).unwrap(), Value::from(*v)),
                    None => prop_assert!(store.get(k).is_err()),
                },
                Op::Update(k, v) => {
                    let result = store.update(k.clone(), v);
                    prop_assert_eq!(result.is_ok(), model.contains_key(&k));
                    if let Some(slot) = model.get_mut(&k) {
                        *slot = v;
                    }
                }
                Op::Remove(k) => {
                    prop_assert_eq!(store.remove(k.clone()).is_ok(), model.remove(&k).is_some());
                }
            }
        }

        let listed: HashSet<String> = store.list().unwrap().into_iter().collect();
        let expected: HashSet<String> = model.keys().cloned().collect();
        prop_assert_eq!(listed, expected);
    }
}
