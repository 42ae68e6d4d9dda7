// SPDX-License-Identifier: MIT

//! In-memory session store for the HTTP API

use chrono::Duration;
use std::collections::HashMap;
use tokio::sync::RwLock;
use uuid::Uuid;

use crate::engine::error::DossierError;
use crate::platform::session::ReportSession;

/// Open sessions, bounded by age and count
pub struct SessionStore {
    sessions: RwLock<HashMap<Uuid, ReportSession>>,
    ttl: Duration,
    max_sessions: usize,
}

impl SessionStore {
    pub fn new(ttl: Duration, max_sessions: usize) -> Self {
        Self {
            sessions: RwLock::new(HashMap::new()),
            ttl,
            max_sessions,
        }
    }

    /// Store a session, dropping expired ones first
    pub async fn insert(&self, session: ReportSession) -> Result<Uuid, DossierError> {
        let mut sessions = self.sessions.write().await;

        let before = sessions.len();
        sessions.retain(|_, s| !s.is_expired(self.ttl));
        if sessions.len() < before {
            log::debug!("Discarded {} expired sessions", before - sessions.len());
        }

        if sessions.len() >= self.max_sessions {
            log::warn!("Session limit of {} reached", self.max_sessions);
            return Err(DossierError::TooManySessions(self.max_sessions));
        }

        let id = session.id();
        sessions.insert(id, session);
        Ok(id)
    }

    /// Run `f` on a live session; an expired one is removed and reported
    /// as not found
    pub async fn with_session<T, F>(&self, id: Uuid, f: F) -> Result<T, DossierError>
    where
        F: FnOnce(&mut ReportSession) -> Result<T, DossierError>,
    {
        let mut sessions = self.sessions.write().await;
        let expired = match sessions.get(&id) {
            Some(session) => session.is_expired(self.ttl),
            None => return Err(DossierError::SessionNotFound(id.to_string())),
        };
        if expired {
            sessions.remove(&id);
            log::debug!("Session {} expired", id);
            return Err(DossierError::SessionNotFound(id.to_string()));
        }

        match sessions.get_mut(&id) {
            Some(session) => f(session),
            None => Err(DossierError::SessionNotFound(id.to_string())),
        }
    }

    /// Remove a session; `false` when it was not there
    pub async fn remove(&self, id: Uuid) -> bool {
        self.sessions.write().await.remove(&id).is_some()
    }

    pub async fn len(&self) -> usize {
        self.sessions.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.sessions.read().await.is_empty()
    }
}
