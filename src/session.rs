//! # Session Module
//!
//! Per-user conversation state held in memory.
//!
//! ## Layout
//!
//! Every session history starts with the system-prompt turn, followed by at
//! most `max_history_turns` user/assistant turns. The system turn is never
//! trimmed; it is replaced in place when the local calendar date changes.
//!
//! ## Locking
//!
//! The user map is guarded by a synchronous mutex that is only held for map
//! lookups. Each session sits behind its own async mutex, and
//! [`SessionStore::get_or_create`] hands out the owned guard, so one user's
//! requests run strictly one after another while different users proceed
//! concurrently.

use chrono::{DateTime, Local, NaiveDate};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard};
use tokio::sync::OwnedMutexGuard;
use tracing::{debug, info};

use crate::config::SessionConfig;
use crate::daily_prompt::system_prompt_for;

/// Telegram user identifier
pub type UserKey = u64;

/// Exclusive access to one user's session for the duration of a request
pub type SessionGuard = OwnedMutexGuard<Session>;

/// Author of a turn
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Role {
    #[serde(rename = "user")]
    User,
    #[serde(rename = "model")]
    Assistant,
}

/// Binary attachment sent inline with a turn
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InlineData {
    pub mime_type: String,
    /// Base64-encoded payload
    pub data: String,
}

/// One part of a turn's content
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Part {
    Text { text: String },
    InlineData { inline_data: InlineData },
}

impl Part {
    pub fn text(text: impl Into<String>) -> Self {
        Part::Text { text: text.into() }
    }

    pub fn as_text(&self) -> Option<&str> {
        match self {
            Part::Text { text } => Some(text),
            Part::InlineData { .. } => None,
        }
    }
}

/// One message of the conversation
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Turn {
    pub role: Role,
    pub parts: Vec<Part>,
}

impl Turn {
    pub fn user(text: impl Into<String>) -> Self {
        Self {
            role: Role::User,
            parts: vec![Part::text(text)],
        }
    }

    pub fn assistant(text: impl Into<String>) -> Self {
        Self {
            role: Role::Assistant,
            parts: vec![Part::text(text)],
        }
    }

    /// Text of the first text part, if any
    pub fn text(&self) -> Option<&str> {
        self.parts.iter().find_map(Part::as_text)
    }
}

/// Conversation state of one user
#[derive(Debug, Clone)]
pub struct Session {
    history: Vec<Turn>,
    created_on: NaiveDate,
    last_activity: DateTime<Local>,
}

impl Session {
    /// Start a session whose history holds only today's system prompt
    pub fn new(now: DateTime<Local>) -> Self {
        Self {
            history: vec![Turn::user(system_prompt_for(now))],
            created_on: now.date_naive(),
            last_activity: now,
        }
    }

    pub fn history(&self) -> &[Turn] {
        &self.history
    }

    pub fn system_turn(&self) -> &Turn {
        &self.history[0]
    }

    pub fn created_on(&self) -> NaiveDate {
        self.created_on
    }

    pub fn last_activity(&self) -> DateTime<Local> {
        self.last_activity
    }

    /// Replace the system turn if `now` falls on a different local date.
    ///
    /// Returns `true` when the prompt was regenerated. All other turns are
    /// left untouched.
    pub fn refresh_for_day(&mut self, now: DateTime<Local>) -> bool {
        let today = now.date_naive();
        if self.created_on == today {
            return false;
        }
        self.history[0] = Turn::user(system_prompt_for(now));
        self.created_on = today;
        true
    }

    pub fn is_expired(&self, now: DateTime<Local>, timeout: chrono::TimeDelta) -> bool {
        now - self.last_activity > timeout
    }

    fn push_exchange(
        &mut self,
        user_turn: Turn,
        assistant_turn: Turn,
        max_turns: usize,
        now: DateTime<Local>,
    ) {
        self.history.push(user_turn);
        self.history.push(assistant_turn);
        let history = std::mem::take(&mut self.history);
        self.history = trim_history(history, max_turns);
        self.last_activity = now;
    }
}

/// Drop the oldest non-system turns so that at most `max_turns` remain after
/// the system turn at index 0.
pub fn trim_history(mut history: Vec<Turn>, max_turns: usize) -> Vec<Turn> {
    if history.len() <= max_turns + 1 {
        return history;
    }
    let excess = history.len() - 1 - max_turns;
    history.drain(1..1 + excess);
    history
}

/// Read-only view of a session for diagnostics
#[derive(Debug, Clone, PartialEq)]
pub struct SessionSnapshot {
    pub history_len: usize,
    pub last_activity: DateTime<Local>,
    pub created_on: NaiveDate,
}

impl From<&Session> for SessionSnapshot {
    fn from(session: &Session) -> Self {
        Self {
            history_len: session.history.len(),
            last_activity: session.last_activity,
            created_on: session.created_on,
        }
    }
}

type SessionHandle = Arc<tokio::sync::Mutex<Session>>;

/// In-memory store of all user sessions
pub struct SessionStore {
    sessions: Mutex<HashMap<UserKey, SessionHandle>>,
    last_cleanup: Mutex<DateTime<Local>>,
    config: SessionConfig,
}

impl SessionStore {
    pub fn new(config: SessionConfig) -> Self {
        Self {
            sessions: Mutex::new(HashMap::new()),
            last_cleanup: Mutex::new(Local::now()),
            config,
        }
    }

    pub fn config(&self) -> &SessionConfig {
        &self.config
    }

    /// Fetch the user's session, creating it if absent, and lock it.
    ///
    /// Runs the periodic expiry sweep when the cleanup interval has elapsed,
    /// then applies the daily prompt refresh. The returned guard keeps other
    /// requests of the same user waiting until it is dropped.
    pub async fn get_or_create(&self, user_id: UserKey, now: DateTime<Local>) -> SessionGuard {
        self.maybe_cleanup(now);

        // The cloned handle keeps the entry alive across sweeps until the guard drops
        let handle = {
            let mut sessions = self.lock_sessions();
            Arc::clone(sessions.entry(user_id).or_insert_with(|| {
                debug!(user_id = %user_id, "Creating new session");
                Arc::new(tokio::sync::Mutex::new(Session::new(now)))
            }))
        };

        let mut session = handle.lock_owned().await;
        if session.refresh_for_day(now) {
            info!(user_id = %user_id, date = %session.created_on, "System prompt refreshed for new day");
        }
        session
    }

    /// Record a successful exchange, trim the history and mark the session active
    pub fn append_exchange(
        &self,
        session: &mut Session,
        user_turn: Turn,
        assistant_turn: Turn,
        now: DateTime<Local>,
    ) {
        session.push_exchange(user_turn, assistant_turn, self.config.max_history_turns, now);
    }

    /// Apply the store's retention limit to a history
    pub fn trim(&self, history: Vec<Turn>) -> Vec<Turn> {
        trim_history(history, self.config.max_history_turns)
    }

    /// Delete the user's session. Returns `false` if there was none.
    pub fn reset(&self, user_id: UserKey) -> bool {
        let removed = self.lock_sessions().remove(&user_id).is_some();
        if removed {
            info!(user_id = %user_id, "Session reset");
        }
        removed
    }

    /// Evict sessions idle for longer than the session timeout.
    ///
    /// A session whose handle is held outside the map belongs to an
    /// in-flight request (waiting for or holding its lock) and counts as
    /// active.
    pub fn delete_expired(&self, now: DateTime<Local>) -> usize {
        let timeout = self.config.session_timeout;
        let mut sessions = self.lock_sessions();
        let before = sessions.len();
        sessions.retain(|user_id, handle| {
            if Arc::strong_count(handle) > 1 {
                return true;
            }
            match handle.try_lock() {
                Ok(session) => {
                    let expired = session.is_expired(now, timeout);
                    if expired {
                        info!(user_id = %user_id, "Expired session removed");
                    }
                    !expired
                }
                Err(_) => true,
            }
        });
        before - sessions.len()
    }

    /// Diagnostic view of a session without creating one
    pub async fn snapshot(&self, user_id: UserKey) -> Option<SessionSnapshot> {
        let handle = self.lock_sessions().get(&user_id).cloned()?;
        let session = handle.lock().await;
        Some(SessionSnapshot::from(&*session))
    }

    pub fn contains(&self, user_id: UserKey) -> bool {
        self.lock_sessions().contains_key(&user_id)
    }

    pub fn len(&self) -> usize {
        self.lock_sessions().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn maybe_cleanup(&self, now: DateTime<Local>) {
        let mut last_cleanup = self
            .last_cleanup
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        if now - *last_cleanup > self.config.cleanup_interval {
            let removed = self.delete_expired(now);
            debug!(removed, "Session cleanup completed");
            *last_cleanup = now;
        }
    }

    fn lock_sessions(&self) -> MutexGuard<'_, HashMap<UserKey, SessionHandle>> {
        self.sessions
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

impl Default for SessionStore {
    fn default() -> Self {
        Self::new(SessionConfig::default())
    }
}
