//! # TTL Store
//!
//! An in-memory key-value store where every entry expires after a
//! time-to-live, served to any number of threads by a single worker that
//! owns all the data.
//!
//! ## Features
//!
//! - **Single writer**: one worker thread applies every operation; callers
//!   talk to it over bounded queues and never share the map
//! - **Per-entry TTL**: a store-wide default, overridable per key
//! - **Lazy expiry**: an expired entry is evicted when an operation touches
//!   it, and `list` sweeps the whole store
//! - **Graceful shutdown**: draining rejects new requests and answers
//!   admitted ones before the worker exits
//!
//! ## Quick Start
//!
//! ```rust
//! use std::time::Duration;
//! use ttl_store::{Store, StoreConfig, Value};
//!
//! let config = StoreConfig::new()
//!     .default_ttl(Duration::from_secs(10))
//!     .build();
//! let store = Store::new(config);
//!
//! store.create("user:123", "Alice").unwrap();
//! assert_eq!(store.get("user:123").unwrap(), Value::from("Alice"));
//!
//! // Per-key TTL: a duration string, whole seconds, or a Duration
//! store.set_ttl("user:123", "1m").unwrap();
//!
//! let keys = store.list().unwrap();
//! assert_eq!(keys, vec!["user:123"]);
//! ```
//!
//! ## Thread Safety
//!
//! Cloning a `Store` creates a new handle to the same worker:
//!
//! ```rust
//! use ttl_store::Store;
//! use std::thread;
//!
//! let store = Store::default();
//!
//! let handles: Vec<_> = (0..4).map(|i| {
//!     let store = store.clone();
//!     thread::spawn(move || {
//!         store.create(format!("key_{}", i), i).unwrap();
//!     })
//! }).collect();
//!
//! for handle in handles {
//!     handle.join().unwrap();
//! }
//! assert_eq!(store.list().unwrap().len(), 4);
//! ```

pub mod config;
pub mod error;
pub mod stats;
pub mod store;
pub mod ttl;
pub mod value;

pub use config::{StoreConfig, SweepPolicy};
pub use error::{StoreError, StoreResult};
pub use stats::{StatsSnapshot, StoreStats};
pub use store::{State, Store};
pub use value::Value;

pub(crate) mod entry;
pub(crate) mod storage;

// Network layer used by the server and client binaries
pub mod cli;
pub mod command;
pub mod server;

pub use cli::{Cli, ClientCommand, ServerArgs};
pub use command::{Command, CommandKind};
