//! Concurrency-safe store of active ingest sessions.
//!
//! The registry is the only shared mutable structure the RPC operations
//! coordinate through. It provides atomic get-or-create: the factory for a
//! new session runs under the registry's own lock and gets a view of the
//! live sessions, so conflict checks against other ingests commit in the
//! same step as the insert.

use super::session::{IngestKey, IngestSession};
use crate::error::Result;
use parking_lot::Mutex;
use std::collections::HashMap;
use std::sync::Arc;

/// View of the live sessions handed to a creation factory.
///
/// Only exposes iteration; the factory cannot mutate the map it is about
/// to be inserted into.
pub struct CreateView<'a> {
    sessions: &'a HashMap<IngestKey, Arc<IngestSession>>,
}

impl CreateView<'_> {
    /// Iterate over the currently registered sessions.
    pub fn iter(&self) -> impl Iterator<Item = (&IngestKey, &Arc<IngestSession>)> {
        self.sessions.iter()
    }
}

/// Keyed store of active ingest sessions with atomic get-or-create.
#[derive(Default)]
pub struct IngestRegistry {
    sessions: Mutex<HashMap<IngestKey, Arc<IngestSession>>>,
}

impl IngestRegistry {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Atomic get-or-create.
    ///
    /// When an entry exists for `key` it is returned unchanged with
    /// `loaded = true` and the factory never runs. Otherwise the factory
    /// runs under the registry lock with a [`CreateView`] of the other
    /// live sessions; on success the new session is committed and returned
    /// with `loaded = false`. A factory error aborts the creation and
    /// inserts nothing.
    ///
    /// Across any number of concurrent callers for the same key, exactly
    /// one factory invocation commits; the rest observe the committed
    /// session. Factory side effects must therefore be safe to repeat.
    pub fn compute_or_load<F>(&self, key: IngestKey, factory: F) -> Result<(Arc<IngestSession>, bool)>
    where
        F: FnOnce(&CreateView<'_>) -> Result<IngestSession>,
    {
        let mut sessions = self.sessions.lock();
        if let Some(existing) = sessions.get(&key) {
            return Ok((existing.clone(), true));
        }
        let session = factory(&CreateView {
            sessions: &*sessions,
        })?;
        let session = Arc::new(session);
        sessions.insert(key, session.clone());
        Ok((session, false))
    }

    /// Look up a session by exact key.
    pub fn get(&self, key: &IngestKey) -> Option<Arc<IngestSession>> {
        self.sessions.lock().get(key).cloned()
    }

    /// Delete an entry. No-op when the key is already absent; returns the
    /// removed session when there was one.
    pub fn remove(&self, key: &IngestKey) -> Option<Arc<IngestSession>> {
        self.sessions.lock().remove(key)
    }

    /// Visit a consistent-at-the-time snapshot of the registry.
    ///
    /// The visit runs without the registry lock held, so it never blocks
    /// concurrent mutation and the visitor may call back into the
    /// registry. Returning `false` stops the iteration.
    pub fn range<F>(&self, mut visit: F)
    where
        F: FnMut(&IngestKey, &Arc<IngestSession>) -> bool,
    {
        let snapshot: Vec<(IngestKey, Arc<IngestSession>)> = {
            let sessions = self.sessions.lock();
            sessions
                .iter()
                .map(|(k, v)| (k.clone(), v.clone()))
                .collect()
        };
        for (key, session) in &snapshot {
            if !visit(key, session) {
                break;
            }
        }
    }

    /// Number of live sessions.
    pub fn len(&self) -> usize {
        self.sessions.lock().len()
    }

    /// True when no sessions are live.
    pub fn is_empty(&self) -> bool {
        self.sessions.lock().is_empty()
    }
}
