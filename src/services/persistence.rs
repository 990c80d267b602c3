//! Persistence Port for Hideout.
//!
//! The only component that touches durable storage. Reads happen once at
//! bootstrap through [`load_state`]; writes go through
//! [`PersistencePort::schedule_save`], which hands snapshots to a background
//! writer task. The writer coalesces bursts: a snapshot is written only after
//! `debounce` has passed without a newer one arriving. Pending snapshots are
//! written when the port is flushed, shut down or dropped.
//!
//! Each write goes to the local key space first. When an identity is set, the
//! same snapshot is then mirrored to the remote store on a detached task;
//! mirror failures are logged and never affect the local write.

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use futures_util::future::BoxFuture;
use parking_lot::Mutex;
use serde::de::DeserializeOwned;
use tokio::sync::{mpsc, oneshot};
use tokio::task::{JoinHandle, JoinSet};
use tokio::time::Instant;
use tracing::{debug, error, info, warn};

use crate::database::Database;
use crate::types::errors::{PersistenceError, SyncError};
use crate::types::session::{PersistedState, Snapshot};

pub const KEY_TABS: &str = "hideout.tabs";
pub const KEY_BOOKMARKS: &str = "hideout.bookmarks";
pub const KEY_HISTORY: &str = "hideout.history";
pub const KEY_SETTINGS: &str = "hideout.settings";

/// Default quiet period before a scheduled save is written.
pub const DEFAULT_DEBOUNCE: Duration = Duration::from_millis(1000);

/// How long shutdown waits for in-flight remote mirrors.
const MIRROR_DRAIN_TIMEOUT: Duration = Duration::from_secs(5);

/// Local durable key space.
pub trait LocalStore: Send {
    fn read(&self, key: &str) -> Result<Option<String>, PersistenceError>;
    /// Writes all entries atomically where the backend allows it.
    fn write_all(&mut self, entries: &[(&str, String)]) -> Result<(), PersistenceError>;
}

/// Remote, identity-keyed copy of the local state.
pub trait RemoteMirror: Send + Sync {
    fn mirror<'a>(&'a self, identity: &'a str, snapshot: &'a Snapshot) -> BoxFuture<'a, Result<(), SyncError>>;
}

impl LocalStore for Database {
    fn read(&self, key: &str) -> Result<Option<String>, PersistenceError> {
        Ok(self.get_value(key)?)
    }

    fn write_all(&mut self, entries: &[(&str, String)]) -> Result<(), PersistenceError> {
        Ok(self.put_values(entries)?)
    }
}

/// Volatile store, shared between clones. Used for throwaway sessions and tests.
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    values: Arc<Mutex<HashMap<String, String>>>,
    writes: Arc<AtomicUsize>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, key: &str) -> Option<String> {
        self.values.lock().get(key).cloned()
    }

    pub fn insert(&self, key: &str, value: &str) {
        self.values.lock().insert(key.to_string(), value.to_string());
    }

    /// Number of `write_all` calls so far.
    pub fn write_count(&self) -> usize {
        self.writes.load(Ordering::SeqCst)
    }
}

impl LocalStore for MemoryStore {
    fn read(&self, key: &str) -> Result<Option<String>, PersistenceError> {
        Ok(self.get(key))
    }

    fn write_all(&mut self, entries: &[(&str, String)]) -> Result<(), PersistenceError> {
        let mut values = self.values.lock();
        for (key, value) in entries {
            values.insert(key.to_string(), value.clone());
        }
        self.writes.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}

/// Reads everything persisted so far. Values that fail to parse are logged and
/// replaced by defaults; storage errors are returned.
pub fn load_state(store: &dyn LocalStore) -> Result<PersistedState, PersistenceError> {
    Ok(PersistedState {
        session: read_key(store, KEY_TABS)?,
        bookmarks: read_key(store, KEY_BOOKMARKS)?.unwrap_or_default(),
        history: read_key(store, KEY_HISTORY)?.unwrap_or_default(),
        settings: read_key(store, KEY_SETTINGS)?.unwrap_or_default(),
    })
}

fn read_key<T: DeserializeOwned>(store: &dyn LocalStore, key: &str) -> Result<Option<T>, PersistenceError> {
    let Some(raw) = store.read(key)? else {
        return Ok(None);
    };
    match serde_json::from_str(&raw) {
        Ok(value) => Ok(Some(value)),
        Err(e) => {
            warn!(key, error = %e, "Discarding unreadable stored value");
            Ok(None)
        }
    }
}

/// Splits a snapshot into its per-key JSON values.
pub fn encode_snapshot(snapshot: &Snapshot) -> Result<Vec<(&'static str, String)>, PersistenceError> {
    Ok(vec![
        (KEY_TABS, serde_json::to_string(&snapshot.session)?),
        (KEY_BOOKMARKS, serde_json::to_string(&snapshot.bookmarks)?),
        (KEY_HISTORY, serde_json::to_string(&snapshot.history)?),
        (KEY_SETTINGS, serde_json::to_string(&snapshot.settings)?),
    ])
}

enum WriterMessage {
    Save {
        snapshot: Box<Snapshot>,
        identity: Option<String>,
    },
    Flush(oneshot::Sender<()>),
}

struct PendingSave {
    snapshot: Box<Snapshot>,
    identity: Option<String>,
}

/// Handle to the background writer.
pub struct PersistencePort {
    tx: mpsc::UnboundedSender<WriterMessage>,
    handle: JoinHandle<()>,
    identity: Option<String>,
}

impl PersistencePort {
    /// Starts the writer task. Must be called from within a tokio runtime.
    pub fn spawn(
        store: Box<dyn LocalStore>,
        remote: Option<Arc<dyn RemoteMirror>>,
        debounce: Duration,
    ) -> Self {
        let (tx, rx) = mpsc::unbounded_channel();
        let handle = tokio::spawn(run_writer(store, remote, debounce, rx));
        Self {
            tx,
            handle,
            identity: None,
        }
    }

    /// Sets the authenticated identity used to key remote mirrors. `None`
    /// turns mirroring off.
    pub fn set_identity(&mut self, identity: Option<String>) {
        self.identity = identity.filter(|i| !i.trim().is_empty());
    }

    pub fn identity(&self) -> Option<&str> {
        self.identity.as_deref()
    }

    /// Queues `snapshot`; it replaces any snapshot still waiting out the debounce.
    pub fn schedule_save(&self, snapshot: Snapshot) {
        let message = WriterMessage::Save {
            snapshot: Box::new(snapshot),
            identity: self.identity.clone(),
        };
        if self.tx.send(message).is_err() {
            warn!("Persistence writer stopped, save dropped");
        }
    }

    /// Writes any pending snapshot now and waits for the local write.
    pub async fn flush(&self) -> Result<(), PersistenceError> {
        let (ack_tx, ack_rx) = oneshot::channel();
        self.tx
            .send(WriterMessage::Flush(ack_tx))
            .map_err(|_| PersistenceError::WriterStopped)?;
        ack_rx.await.map_err(|_| PersistenceError::WriterStopped)
    }

    /// Flushes, stops the writer and waits for it (and in-flight mirrors) to finish.
    pub async fn shutdown(self) {
        let Self { tx, handle, .. } = self;
        drop(tx);
        if let Err(e) = handle.await {
            error!(error = %e, "Persistence writer panicked");
        }
    }
}

async fn run_writer(
    mut store: Box<dyn LocalStore>,
    remote: Option<Arc<dyn RemoteMirror>>,
    debounce: Duration,
    mut rx: mpsc::UnboundedReceiver<WriterMessage>,
) {
    let mut pending: Option<PendingSave> = None;
    let mut deadline: Option<Instant> = None;
    let mut mirrors = JoinSet::new();

    loop {
        let message = match deadline {
            Some(at) => {
                tokio::select! {
                    message = rx.recv() => message,
                    _ = tokio::time::sleep_until(at) => {
                        deadline = None;
                        if let Some(save) = pending.take() {
                            write_snapshot(store.as_mut(), remote.as_ref(), &mut mirrors, save);
                        }
                        continue;
                    }
                }
            }
            None => rx.recv().await,
        };

        while mirrors.try_join_next().is_some() {}

        match message {
            Some(WriterMessage::Save { snapshot, identity }) => {
                pending = Some(PendingSave { snapshot, identity });
                deadline = Some(Instant::now() + debounce);
            }
            Some(WriterMessage::Flush(ack)) => {
                deadline = None;
                if let Some(save) = pending.take() {
                    write_snapshot(store.as_mut(), remote.as_ref(), &mut mirrors, save);
                }
                let _ = ack.send(());
            }
            None => {
                if let Some(save) = pending.take() {
                    write_snapshot(store.as_mut(), remote.as_ref(), &mut mirrors, save);
                }
                break;
            }
        }
    }

    if !mirrors.is_empty() {
        let drain = async { while mirrors.join_next().await.is_some() {} };
        if tokio::time::timeout(MIRROR_DRAIN_TIMEOUT, drain).await.is_err() {
            warn!("Gave up waiting for remote mirrors");
        }
    }
    info!("Persistence writer stopped");
}

fn write_snapshot(
    store: &mut dyn LocalStore,
    remote: Option<&Arc<dyn RemoteMirror>>,
    mirrors: &mut JoinSet<()>,
    save: PendingSave,
) {
    let written = encode_snapshot(&save.snapshot).and_then(|entries| store.write_all(&entries));
    match written {
        Ok(()) => debug!(tabs = save.snapshot.session.tabs.len(), "Snapshot written"),
        Err(e) => error!(error = %e, "Local snapshot write failed"),
    }

    if let (Some(remote), Some(identity)) = (remote, save.identity) {
        let remote = Arc::clone(remote);
        let snapshot = save.snapshot;
        mirrors.spawn(async move {
            match remote.mirror(&identity, &snapshot).await {
                Ok(()) => debug!(identity = %identity, "Remote mirror updated"),
                Err(e) => warn!(identity = %identity, error = %e, "Remote mirror failed"),
            }
        });
    }
}
