//! # Connection Registry
//!
//! Maps a chat session identifier to the one live websocket connection that
//! currently serves it. The registry is owned by [`crate::state::AppState`]
//! and handed to whoever needs to reach a session, there is no global.
//!
//! ## Semantics:
//! - **connect**: registers a handle, silently replacing any previous one for
//!   the same id (the old connection is not closed, it is simply no longer
//!   reachable through the registry)
//! - **disconnect**: removes the entry; removing an absent id is a no-op
//! - **release**: removes the entry only if it still points at the given
//!   handle, used by a connection tearing itself down
//!
//! ## Thread Safety:
//! A single `RwLock<HashMap>` behind an `Arc`. Operations on different ids
//! never observe each other's partial state; racing operations on the same
//! id resolve as last-write-wins.

use std::collections::HashMap;
use std::sync::{Arc, RwLock};

/// Live-connection store keyed by session id.
///
/// Generic over the handle type so the websocket layer can store actor
/// addresses while tests use plain values.
#[derive(Debug)]
pub struct ConnectionRegistry<H> {
    connections: Arc<RwLock<HashMap<String, H>>>,
}

// Manual impl: cloning the registry shares the map and needs no `H: Clone`
impl<H> Clone for ConnectionRegistry<H> {
    fn clone(&self) -> Self {
        Self {
            connections: self.connections.clone(),
        }
    }
}

impl<H> Default for ConnectionRegistry<H> {
    fn default() -> Self {
        Self::new()
    }
}

impl<H> ConnectionRegistry<H> {
    pub fn new() -> Self {
        Self {
            connections: Arc::new(RwLock::new(HashMap::new())),
        }
    }

    /// Register `handle` for `session_id`, returning the handle it replaced.
    pub fn connect(&self, session_id: &str, handle: H) -> Option<H> {
        self.write().insert(session_id.to_string(), handle)
    }

    /// Remove the entry for `session_id`, if any.
    pub fn disconnect(&self, session_id: &str) -> Option<H> {
        self.write().remove(session_id)
    }

    /// Number of sessions with a live connection.
    pub fn len(&self) -> usize {
        self.read().len()
    }

    // A panic while holding the lock cannot leave the map half-updated, so a
    // poisoned lock is still safe to use.
    fn read(&self) -> std::sync::RwLockReadGuard<'_, HashMap<String, H>> {
        self.connections.read().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn write(&self) -> std::sync::RwLockWriteGuard<'_, HashMap<String, H>> {
        self.connections.write().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

impl<H: Clone> ConnectionRegistry<H> {
    /// The handle currently registered for `session_id`.
    pub fn get(&self, session_id: &str) -> Option<H> {
        self.read().get(session_id).cloned()
    }
}

impl<H: PartialEq> ConnectionRegistry<H> {
    /// Remove the entry only if it is still `handle`.
    ///
    /// Returns `true` when an entry was removed. A connection that was
    /// replaced by a newer one for the same id gets `false` and leaves the
    /// newer registration in place.
    pub fn release(&self, session_id: &str, handle: &H) -> bool {
        let mut connections = self.write();
        if connections.get(session_id) == Some(handle) {
            connections.remove(session_id);
            true
        } else {
            false
        }
    }
}
