//! In-memory session store for the web front end.
//!
//! Sessions are keyed by a random 128-bit id carried in an HttpOnly cookie.
//! Each holds the logged-in username (if any) and a queue of flash messages
//! that is drained when the next page renders. A session is only stored once
//! something is written to it, and an anonymous one is dropped again when its
//! flashes are drained. Idle sessions expire after the configured TTL and are
//! purged lazily.

use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard, PoisonError};

use axum::http::{header, HeaderMap, HeaderValue};
use chrono::{DateTime, Duration, Utc};
use rand::{RngCore, SeedableRng};
use rand_chacha::ChaCha20Rng;

/// Name of the session cookie.
pub const SESSION_COOKIE: &str = "hq_session";

/// One queued flash message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Flash {
    /// `success`, `danger` or `info`
    pub category: &'static str,
    pub message: String,
}

#[derive(Debug)]
struct Session {
    username: Option<String>,
    flashes: Vec<Flash>,
    last_seen: DateTime<Utc>,
}

impl Session {
    fn new(now: DateTime<Utc>) -> Self {
        Self {
            username: None,
            flashes: Vec::new(),
            last_seen: now,
        }
    }
}

/// The session a request is bound to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionHandle {
    pub id: String,
    /// True when the client does not hold a cookie for this id yet.
    pub fresh: bool,
}

impl SessionHandle {
    /// `Set-Cookie` value for this session.
    #[must_use]
    pub fn cookie(&self) -> Option<HeaderValue> {
        HeaderValue::from_str(&format!(
            "{SESSION_COOKIE}={}; Path=/; HttpOnly; SameSite=Lax",
            self.id
        ))
        .ok()
    }
}

/// Shared session store.
pub struct SessionStore {
    sessions: Mutex<HashMap<String, Session>>,
    rng: Mutex<ChaCha20Rng>,
    ttl: Duration,
}

impl SessionStore {
    /// Create an empty store whose sessions expire after `ttl` of inactivity.
    #[must_use]
    pub fn new(ttl: Duration) -> Self {
        Self {
            sessions: Mutex::new(HashMap::new()),
            rng: Mutex::new(ChaCha20Rng::from_entropy()),
            ttl,
        }
    }

    fn sessions(&self) -> MutexGuard<'_, HashMap<String, Session>> {
        self.sessions.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn new_id(&self) -> String {
        let mut bytes = [0u8; 16];
        self.rng
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .fill_bytes(&mut bytes);
        bytes.iter().map(|b| format!("{b:02x}")).collect()
    }

    /// Resolve the session named by the request cookies, or hand out a new
    /// id if the cookie is absent, unknown or expired. A new id is not stored
    /// until the first write.
    pub fn begin(&self, headers: &HeaderMap) -> SessionHandle {
        self.begin_at(cookie_value(headers, SESSION_COOKIE).as_deref(), Utc::now())
    }

    fn begin_at(&self, cookie: Option<&str>, now: DateTime<Utc>) -> SessionHandle {
        let mut sessions = self.sessions();
        let ttl = self.ttl;
        let before = sessions.len();
        sessions.retain(|_, s| now - s.last_seen < ttl);
        if sessions.len() < before {
            tracing::debug!("Purged {} expired sessions", before - sessions.len());
        }

        if let Some(id) = cookie {
            if let Some(session) = sessions.get_mut(id) {
                session.last_seen = now;
                return SessionHandle {
                    id: id.to_string(),
                    fresh: false,
                };
            }
        }

        SessionHandle {
            id: self.new_id(),
            fresh: true,
        }
    }

    fn write<T>(&self, handle: &SessionHandle, f: impl FnOnce(&mut Session) -> T) -> T {
        let mut sessions = self.sessions();
        let session = sessions.entry(handle.id.clone()).or_insert_with(|| {
            tracing::debug!("Started session {}", handle.id);
            Session::new(Utc::now())
        });
        f(session)
    }

    /// Logged-in username, if any.
    #[must_use]
    pub fn username(&self, handle: &SessionHandle) -> Option<String> {
        self.sessions()
            .get(&handle.id)
            .and_then(|s| s.username.clone())
    }

    pub fn set_username(&self, handle: &SessionHandle, username: &str) {
        self.write(handle, |s| s.username = Some(username.to_string()));
    }

    /// Queue a flash message for the next rendered page.
    pub fn flash(
        &self,
        handle: &SessionHandle,
        category: &'static str,
        message: impl Into<String>,
    ) {
        let flash = Flash {
            category,
            message: message.into(),
        };
        self.write(handle, |s| s.flashes.push(flash));
    }

    /// Drain queued flash messages. An anonymous session holds nothing
    /// afterwards and is removed.
    pub fn take_flashes(&self, handle: &SessionHandle) -> Vec<Flash> {
        let mut sessions = self.sessions();
        let Some(session) = sessions.get_mut(&handle.id) else {
            return Vec::new();
        };
        let flashes = std::mem::take(&mut session.flashes);
        if session.username.is_none() {
            sessions.remove(&handle.id);
        }
        flashes
    }

    /// `Set-Cookie` value for a fresh handle whose session got stored.
    #[must_use]
    pub fn set_cookie(&self, handle: &SessionHandle) -> Option<HeaderValue> {
        if handle.fresh && self.sessions().contains_key(&handle.id) {
            handle.cookie()
        } else {
            None
        }
    }

    /// Number of live sessions.
    #[must_use]
    pub fn len(&self) -> usize {
        self.sessions().len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Value of cookie `name` from the request's `Cookie` headers.
#[must_use]
pub fn cookie_value(headers: &HeaderMap, name: &str) -> Option<String> {
    headers
        .get_all(header::COOKIE)
        .iter()
        .filter_map(|v| v.to_str().ok())
        .flat_map(|v| v.split(';'))
        .filter_map(|pair| pair.trim().split_once('='))
        .find(|(k, _)| *k == name)
        .map(|(_, v)| v.to_string())
}
