use std::collections::BTreeSet;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Sessions keep at most this many search history entries, newest last.
const SEARCH_HISTORY_CAP: usize = 20;

/// Opaque session identifier supplied by the client.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct SessionId(pub String);

impl SessionId {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Language {
    #[default]
    En,
    Hi,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SearchEntry {
    pub query: String,
    pub recorded_at: DateTime<Utc>,
}

/// Ephemeral per-session flags; reset when the session ends, never persisted.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SessionState {
    pub bookmarks: BTreeSet<String>,
    pub expanded: BTreeSet<String>,
    pub language: Language,
    pub accessibility_mode: bool,
    pub last_profile: Option<String>,
    pub search_history: Vec<SearchEntry>,
}

impl SessionState {
    /// Toggle a bookmark; returns whether the scheme is bookmarked afterward.
    pub fn toggle_bookmark(&mut self, scheme_id: &str) -> bool {
        if !self.bookmarks.remove(scheme_id) {
            self.bookmarks.insert(scheme_id.to_string());
            return true;
        }
        false
    }

    /// Toggle a card's expanded flag; returns whether it is expanded afterward.
    pub fn toggle_expanded(&mut self, scheme_id: &str) -> bool {
        if !self.expanded.remove(scheme_id) {
            self.expanded.insert(scheme_id.to_string());
            return true;
        }
        false
    }

    pub fn is_bookmarked(&self, scheme_id: &str) -> bool {
        self.bookmarks.contains(scheme_id)
    }

    pub fn set_preferences(&mut self, language: Language, accessibility_mode: bool) {
        self.language = language;
        self.accessibility_mode = accessibility_mode;
    }

    pub fn remember_profile(&mut self, profile_text: impl Into<String>) {
        self.last_profile = Some(profile_text.into());
    }

    /// Append a non-blank query to the history, dropping the oldest entries
    /// beyond the cap.
    pub fn record_search(&mut self, query: &str) {
        let query = query.trim();
        if query.is_empty() {
            return;
        }
        self.search_history.push(SearchEntry {
            query: query.to_string(),
            recorded_at: Utc::now(),
        });
        if self.search_history.len() > SEARCH_HISTORY_CAP {
            let excess = self.search_history.len() - SEARCH_HISTORY_CAP;
            self.search_history.drain(..excess);
        }
    }
}

/// Storage abstraction so the HTTP layer can be exercised in isolation.
/// `load` returns a default state for unknown sessions.
pub trait SessionStore: Send + Sync {
    fn load(&self, id: &SessionId) -> Result<SessionState, SessionStoreError>;
    fn save(&self, id: &SessionId, state: SessionState) -> Result<(), SessionStoreError>;
}

/// Error enumeration for session storage failures.
#[derive(Debug, thiserror::Error)]
pub enum SessionStoreError {
    #[error("session store unavailable: {0}")]
    Unavailable(String),
}
