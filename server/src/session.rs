//! Session lifecycle management for the game server
//!
//! This module owns the in-memory table of game sessions. Sessions are
//! created implicitly the first time a connection references an unknown
//! session id and live for the lifetime of the process: there is no
//! eviction and no TTL, an abandoned session simply goes unreferenced.
//!
//! The store is held behind a single `Arc<RwLock<_>>` and injected into
//! the protocol layer, so all mutation goes through one shared-owner
//! table rather than a process-wide singleton.

use log::info;
use shared::Session;
use std::collections::HashMap;

/// Keyed table of live game sessions.
#[derive(Debug, Default)]
pub struct SessionStore {
    sessions: HashMap<String, Session>,
}

impl SessionStore {
    pub fn new() -> Self {
        Self {
            sessions: HashMap::new(),
        }
    }

    /// Looks up an existing session.
    pub fn get(&self, session_id: &str) -> Option<&Session> {
        self.sessions.get(session_id)
    }

    /// Looks up an existing session for in-place mutation.
    pub fn get_mut(&mut self, session_id: &str) -> Option<&mut Session> {
        self.sessions.get_mut(session_id)
    }

    /// Returns the session with the given id, creating an empty one on
    /// first reference. Creation is logged for server monitoring.
    pub fn get_or_create(&mut self, session_id: &str) -> &mut Session {
        self.sessions.entry(session_id.to_string()).or_insert_with(|| {
            info!("Created session {}", session_id);
            Session::new(session_id)
        })
    }

    /// Clears the draw history and player statuses of a session, keeping
    /// roster and theme. Returns false if the session does not exist.
    pub fn reset_draws(&mut self, session_id: &str) -> bool {
        match self.sessions.get_mut(session_id) {
            Some(session) => {
                session.reset_draws();
                info!("Reset session {}", session_id);
                true
            }
            None => false,
        }
    }

    /// Returns the number of live sessions.
    pub fn len(&self) -> usize {
        self.sessions.len()
    }

    /// Returns true if no session has been created yet.
    pub fn is_empty(&self) -> bool {
        self.sessions.is_empty()
    }
}
