//! The main store interface.
//!
//! `Store` is a cloneable, thread-safe handle to a storage worker. Every
//! method blocks the calling thread until the worker has applied the
//! operation and replied.

use crossbeam_channel::{bounded, Sender};
use std::sync::{Arc, Condvar, Mutex, MutexGuard, PoisonError};
use std::thread::{self, JoinHandle};
use tracing::{debug, warn};

use crate::config::StoreConfig;
use crate::error::{StoreError, StoreResult};
use crate::stats::{StatsSnapshot, StoreStats};
use crate::storage::{queues, Queues, Request, Worker};
use crate::value::Value;

/// Lifecycle of a store.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum State {
    /// Accepting requests.
    Running,
    /// Shutdown has begun: new requests are rejected while admitted ones
    /// finish.
    Draining,
    /// The worker has exited.
    Stopped,
}

/// An in-memory key-value store with per-entry TTL.
///
/// All reads and writes are applied by a single worker thread that owns
/// the data, so no lock ever guards the map itself.
///
/// # Example
/// ```
/// use std::time::Duration;
/// use ttl_store::{Store, StoreConfig, StoreError, Value};
///
/// let store = Store::new(StoreConfig::new().default_ttl(Duration::from_secs(10)));
///
/// store.create("foo", "bar").unwrap();
/// assert_eq!(store.get("foo").unwrap(), Value::from("bar"));
/// assert!(matches!(store.create("foo", 1), Err(StoreError::KeyExists(_))));
///
/// store.set_ttl("foo", "1s").unwrap();
/// store.shutdown();
/// assert!(matches!(store.get("foo"), Err(StoreError::ShuttingDown)));
/// ```
#[derive(Debug, Clone)]
pub struct Store {
    inner: Arc<Inner>,
}

#[derive(Debug)]
struct Inner {
    queues: Queues,
    gate: Mutex<Gate>,
    idle: Condvar,
    worker: Mutex<Option<JoinHandle<()>>>,
    stats: Arc<StoreStats>,
    config: StoreConfig,
}

/// Admission state: requests only enter while `Running`, and shutdown
/// waits for `in_flight` to reach zero. `idle` is signalled when it does
/// and again once the state reaches `Stopped`.
#[derive(Debug)]
struct Gate {
    state: State,
    in_flight: usize,
}

/// Marks one admitted request; releasing it may wake a pending shutdown.
struct Admission<'a> {
    inner: &'a Inner,
}

impl Drop for Admission<'_> {
    fn drop(&mut self) {
        let mut gate = self.inner.gate();
        gate.in_flight -= 1;
        if gate.in_flight == 0 {
            self.inner.idle.notify_all();
        }
    }
}

impl Store {
    /// Create a store and start its worker thread.
    pub fn new(config: StoreConfig) -> Self {
        let stats = Arc::new(StoreStats::new());
        let (queues, inbox) = queues(config.get_queue_capacity());
        let worker = Worker::new(&config, Arc::clone(&stats));
        let handle = thread::spawn(move || worker.run(inbox));

        Self {
            inner: Arc::new(Inner {
                queues,
                gate: Mutex::new(Gate {
                    state: State::Running,
                    in_flight: 0,
                }),
                idle: Condvar::new(),
                worker: Mutex::new(Some(handle)),
                stats,
                config,
            }),
        }
    }

    /// Insert a new entry.
    ///
    /// Fails with [`StoreError::KeyExists`] if a live entry already holds
    /// `key`. An expired entry is replaced.
    pub fn create(&self, key: impl Into<String>, value: impl Into<Value>) -> StoreResult<()> {
        self.call(&self.inner.queues.create, (key.into(), value.into()))
    }

    /// Get the value stored under `key`.
    ///
    /// An expired entry is evicted and reported as [`StoreError::KeyNotFound`].
    pub fn get(&self, key: impl Into<String>) -> StoreResult<Value> {
        self.call(&self.inner.queues.get, key.into())
    }

    /// Replace the value of a live entry and restart its window.
    ///
    /// Any TTL override on the entry is kept.
    pub fn update(&self, key: impl Into<String>, value: impl Into<Value>) -> StoreResult<()> {
        self.call(&self.inner.queues.update, (key.into(), value.into()))
    }

    /// Set a per-entry TTL and restart the entry's window.
    ///
    /// `spec` may be a duration string (`"10s"`), a whole number of
    /// seconds as a string (`"10"`), or a `Duration`. A zero TTL reverts
    /// the entry to the store-wide default; a negative one expires it, so
    /// the next operation on `key` finds nothing. Fails with
    /// [`StoreError::KeyNotFound`] before the spec is looked at, then with
    /// [`StoreError::InvalidTtl`] if it cannot be parsed.
    pub fn set_ttl(&self, key: impl Into<String>, spec: impl Into<Value>) -> StoreResult<()> {
        self.call(&self.inner.queues.set_ttl, (key.into(), spec.into()))
    }

    /// Delete a live entry.
    pub fn remove(&self, key: impl Into<String>) -> StoreResult<()> {
        self.call(&self.inner.queues.remove, key.into())
    }

    /// List live keys, sweeping expired entries out of the store first.
    ///
    /// Which TTL the sweep applies is set by
    /// [`SweepPolicy`](crate::SweepPolicy). Keys come back in creation
    /// order, though callers should not rely on any order.
    pub fn list(&self) -> StoreResult<Vec<String>> {
        self.call(&self.inner.queues.list, ())
    }

    /// Get a snapshot of the store statistics.
    pub fn stats(&self) -> StatsSnapshot {
        self.inner.stats.snapshot()
    }

    /// Get a reference to the live statistics counters.
    pub fn stats_ref(&self) -> Arc<StoreStats> {
        Arc::clone(&self.inner.stats)
    }

    /// The configuration this store was built with.
    pub fn config(&self) -> &StoreConfig {
        &self.inner.config
    }

    /// Current lifecycle state.
    pub fn state(&self) -> State {
        self.inner.gate().state
    }

    /// Stop the store.
    ///
    /// New requests fail with [`StoreError::ShuttingDown`] from this point.
    /// Requests already admitted are answered, then the worker exits and
    /// this call returns. Calling it again, from any clone, is a no-op.
    pub fn shutdown(&self) {
        self.inner.shutdown();
    }

    fn call<A, R>(&self, queue: &Sender<Request<A, R>>, args: A) -> StoreResult<R> {
        let _admission = self.inner.admit()?;
        let (reply, response) = bounded(1);
        queue
            .send(Request { args, reply })
            .map_err(|_| StoreError::ShuttingDown)?;
        response.recv().map_err(|_| StoreError::ShuttingDown)?
    }
}

impl Default for Store {
    fn default() -> Self {
        Self::new(StoreConfig::default())
    }
}

impl Inner {
    fn gate(&self) -> MutexGuard<'_, Gate> {
        self.gate.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn admit(&self) -> StoreResult<Admission<'_>> {
        let mut gate = self.gate();
        if gate.state != State::Running {
            return Err(StoreError::ShuttingDown);
        }
        gate.in_flight += 1;
        Ok(Admission { inner: self })
    }

    fn shutdown(&self) {
        {
            let mut gate = self.gate();
            if gate.state != State::Running {
                // Another caller is stopping the worker; wait for it.
                while gate.state != State::Stopped {
                    gate = self
                        .idle
                        .wait(gate)
                        .unwrap_or_else(PoisonError::into_inner);
                }
                return;
            }
            gate.state = State::Draining;
            debug!(in_flight = gate.in_flight, "store draining");
            while gate.in_flight > 0 {
                gate = self
                    .idle
                    .wait(gate)
                    .unwrap_or_else(PoisonError::into_inner);
            }
        }

        // The worker may already be gone; either way it is told to stop.
        let _ = self.queues.stop.send(());
        let handle = self
            .worker
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take();
        if let Some(handle) = handle {
            if handle.join().is_err() {
                warn!("storage worker panicked");
            }
        }

        self.gate().state = State::Stopped;
        self.idle.notify_all();
    }
}

impl Drop for Inner {
    fn drop(&mut self) {
        self.shutdown();
    }
}
