//! The storage worker.
//!
//! A single thread owns the entry map and applies every operation against
//! it. Callers never touch the map; they enqueue a request carrying a
//! one-shot reply channel on one of six bounded queues and wait for the
//! answer. The worker picks among ready queues at random, so no operation
//! kind can starve another, while each queue is served in FIFO order.

use crossbeam_channel::{bounded, select, Receiver, RecvError, Sender};
use indexmap::IndexMap;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::{debug, info};

use crate::config::{StoreConfig, SweepPolicy};
use crate::entry::{window_elapsed, Entry};
use crate::error::{StoreError, StoreResult};
use crate::stats::StoreStats;
use crate::ttl::{parse_ttl, Ttl};
use crate::value::Value;

/// A queued operation and the channel its result goes back on.
#[derive(Debug)]
pub(crate) struct Request<A, R> {
    pub(crate) args: A,
    pub(crate) reply: Sender<StoreResult<R>>,
}

pub(crate) type CreateRequest = Request<(String, Value), ()>;
pub(crate) type UpdateRequest = Request<(String, Value), ()>;
pub(crate) type SetTtlRequest = Request<(String, Value), ()>;
pub(crate) type RemoveRequest = Request<String, ()>;
pub(crate) type GetRequest = Request<String, Value>;
pub(crate) type ListRequest = Request<(), Vec<String>>;

/// Sending halves of the request queues, held by the store handle.
#[derive(Debug)]
pub(crate) struct Queues {
    pub(crate) create: Sender<CreateRequest>,
    pub(crate) update: Sender<UpdateRequest>,
    pub(crate) set_ttl: Sender<SetTtlRequest>,
    pub(crate) remove: Sender<RemoveRequest>,
    pub(crate) get: Sender<GetRequest>,
    pub(crate) list: Sender<ListRequest>,
    pub(crate) stop: Sender<()>,
}

/// Receiving halves, owned by the worker thread.
#[derive(Debug)]
pub(crate) struct Inbox {
    create: Receiver<CreateRequest>,
    update: Receiver<UpdateRequest>,
    set_ttl: Receiver<SetTtlRequest>,
    remove: Receiver<RemoveRequest>,
    get: Receiver<GetRequest>,
    list: Receiver<ListRequest>,
    stop: Receiver<()>,
}

/// Create the six request queues plus the stop signal.
pub(crate) fn queues(capacity: usize) -> (Queues, Inbox) {
    let (create_tx, create_rx) = bounded(capacity);
    let (update_tx, update_rx) = bounded(capacity);
    let (set_ttl_tx, set_ttl_rx) = bounded(capacity);
    let (remove_tx, remove_rx) = bounded(capacity);
    let (get_tx, get_rx) = bounded(capacity);
    let (list_tx, list_rx) = bounded(capacity);
    let (stop_tx, stop_rx) = bounded(1);

    let queues = Queues {
        create: create_tx,
        update: update_tx,
        set_ttl: set_ttl_tx,
        remove: remove_tx,
        get: get_tx,
        list: list_tx,
        stop: stop_tx,
    };
    let inbox = Inbox {
        create: create_rx,
        update: update_rx,
        set_ttl: set_ttl_rx,
        remove: remove_rx,
        get: get_rx,
        list: list_rx,
        stop: stop_rx,
    };
    (queues, inbox)
}

enum Op {
    Create(CreateRequest),
    Update(UpdateRequest),
    SetTtl(SetTtlRequest),
    Remove(RemoveRequest),
    Get(GetRequest),
    List(ListRequest),
}

impl Inbox {
    /// Block until some queue has a request. `Err` means stop.
    fn next(&self) -> Result<Op, RecvError> {
        select! {
            recv(self.create) -> msg => msg.map(Op::Create),
            recv(self.update) -> msg => msg.map(Op::Update),
            recv(self.set_ttl) -> msg => msg.map(Op::SetTtl),
            recv(self.remove) -> msg => msg.map(Op::Remove),
            recv(self.get) -> msg => msg.map(Op::Get),
            recv(self.list) -> msg => msg.map(Op::List),
            recv(self.stop) -> _ => Err(RecvError),
        }
    }

    /// Take any request still waiting in a queue, without blocking.
    fn try_next(&self) -> Option<Op> {
        self.create
            .try_recv()
            .map(Op::Create)
            .or_else(|_| self.update.try_recv().map(Op::Update))
            .or_else(|_| self.set_ttl.try_recv().map(Op::SetTtl))
            .or_else(|_| self.remove.try_recv().map(Op::Remove))
            .or_else(|_| self.get.try_recv().map(Op::Get))
            .or_else(|_| self.list.try_recv().map(Op::List))
            .ok()
    }
}

/// Owner of the entry map.
#[derive(Debug)]
pub(crate) struct Worker {
    /// Insertion-ordered so `list` reports keys in creation order.
    entries: IndexMap<String, Entry>,

    default_ttl: Option<Duration>,

    sweep_policy: SweepPolicy,

    stats: Arc<StoreStats>,
}

impl Worker {
    pub(crate) fn new(config: &StoreConfig, stats: Arc<StoreStats>) -> Self {
        Self {
            entries: IndexMap::new(),
            default_ttl: config.default_ttl,
            sweep_policy: config.sweep_policy,
            stats,
        }
    }

    /// Serve requests until told to stop, then answer whatever is still
    /// queued before returning.
    pub(crate) fn run(mut self, inbox: Inbox) {
        debug!(default_ttl = ?self.default_ttl, "storage worker started");

        while let Ok(op) = inbox.next() {
            self.handle(op);
        }

        let mut drained = 0usize;
        while let Some(op) = inbox.try_next() {
            self.handle(op);
            drained += 1;
        }
        drop(inbox);

        info!(
            drained,
            entries = self.entries.len(),
            "storage worker stopped"
        );
    }

    fn handle(&mut self, op: Op) {
        let now = Instant::now();
        // A caller that went away no longer needs its answer.
        match op {
            Op::Create(Request { args: (key, value), reply }) => {
                let _ = reply.send(self.create(key, value, now));
            }
            Op::Update(Request { args: (key, value), reply }) => {
                let _ = reply.send(self.update(&key, value, now));
            }
            Op::SetTtl(Request { args: (key, spec), reply }) => {
                let _ = reply.send(self.set_ttl(&key, &spec, now));
            }
            Op::Remove(Request { args: key, reply }) => {
                let _ = reply.send(self.remove(&key, now));
            }
            Op::Get(Request { args: key, reply }) => {
                let _ = reply.send(self.get(&key, now));
            }
            Op::List(Request { reply, .. }) => {
                let _ = reply.send(Ok(self.list(now)));
            }
        }
    }

    /// Look up a live entry, evicting it first if its window has elapsed.
    fn live_entry(&mut self, key: &str, now: Instant) -> Option<&mut Entry> {
        let expired = self.entries.get(key)?.is_expired_at(now, self.default_ttl);
        if expired {
            self.entries.shift_remove(key);
            self.stats.record_expirations(1);
            self.stats.set_size(self.entries.len());
            return None;
        }
        self.entries.get_mut(key)
    }

    pub(crate) fn create(&mut self, key: String, value: Value, now: Instant) -> StoreResult<()> {
        if self.live_entry(&key, now).is_some() {
            return Err(StoreError::KeyExists(key));
        }
        self.entries.insert(key, Entry::created_at(value, now));
        self.stats.record_create();
        self.stats.set_size(self.entries.len());
        Ok(())
    }

    pub(crate) fn get(&mut self, key: &str, now: Instant) -> StoreResult<Value> {
        match self.live_entry(key, now) {
            Some(entry) => {
                let value = entry.value().clone();
                self.stats.record_hit();
                Ok(value)
            }
            None => {
                self.stats.record_miss();
                Err(StoreError::KeyNotFound(key.to_string()))
            }
        }
    }

    pub(crate) fn update(&mut self, key: &str, value: Value, now: Instant) -> StoreResult<()> {
        let entry = self
            .live_entry(key, now)
            .ok_or_else(|| StoreError::KeyNotFound(key.to_string()))?;
        entry.refresh(value, now);
        self.stats.record_update();
        Ok(())
    }

    pub(crate) fn set_ttl(&mut self, key: &str, spec: &Value, now: Instant) -> StoreResult<()> {
        let entry = self
            .live_entry(key, now)
            .ok_or_else(|| StoreError::KeyNotFound(key.to_string()))?;
        match parse_ttl(spec)? {
            Ttl::After(ttl) => entry.set_ttl(ttl, now),
            Ttl::Elapsed => entry.expire(now),
        }
        self.stats.record_ttl_set();
        Ok(())
    }

    pub(crate) fn remove(&mut self, key: &str, now: Instant) -> StoreResult<()> {
        if self.live_entry(key, now).is_none() {
            return Err(StoreError::KeyNotFound(key.to_string()));
        }
        self.entries.shift_remove(key);
        self.stats.record_remove();
        self.stats.set_size(self.entries.len());
        Ok(())
    }

    /// Sweep the whole map, then return the surviving keys.
    pub(crate) fn list(&mut self, now: Instant) -> Vec<String> {
        let default_ttl = self.default_ttl;
        let policy = self.sweep_policy;
        let before = self.entries.len();

        self.entries.retain(|_, entry| match policy {
            SweepPolicy::DefaultTtl => !window_elapsed(entry.created_at, default_ttl, now),
            SweepPolicy::EntryTtl => !entry.is_expired_at(now, default_ttl),
        });

        self.stats.record_expirations((before - self.entries.len()) as u64);
        self.stats.record_sweep();
        self.stats.set_size(self.entries.len());
        self.entries.keys().cloned().collect()
    }

    #[cfg(test)]
    fn insert_raw(&mut self, key: &str, entry: Entry) {
        self.entries.insert(key.to_string(), entry);
        self.stats.set_size(self.entries.len());
    }
}
