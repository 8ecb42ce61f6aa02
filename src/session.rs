//! # Session Module
//!
//! A [`Session`] is a client-scoped key/value store with a cookie domain and a
//! time-to-live. The orchestrator starts (or resumes) it when the application
//! is constructed and closes it exactly once when the request ends, whatever
//! path the request took.
//!
//! ## Cookie domain policy
//!
//! The delegate chooses the domain per request:
//!
//! - `".example.com"` (leading dot) → [`CookieScope::AllSubdomains`], the
//!   cookie carries `Domain=.example.com`;
//! - `"example.com"`, `"sub.example.com"` or `""` → [`CookieScope::HostOnly`],
//!   no `Domain` attribute, the browser binds the cookie to the current host.
//!
//! Persistence goes through the [`SessionStore`] trait; [`MemorySessionStore`]
//! is the in-process reference store.

use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::{Duration, SystemTime};
use tracing::{debug, info, warn};

use crate::config::SessionConfig;
use crate::ids::SessionId;
use crate::request::Request;

/// Cookie visibility derived from the delegate's session domain.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CookieScope {
    /// Valid for the domain and all of its subdomains
    AllSubdomains(String),
    /// Valid only for the host that set it
    HostOnly,
}

impl CookieScope {
    #[must_use]
    pub fn from_domain(domain: &str) -> Self {
        let domain = domain.trim();
        if domain.len() > 1 && domain.starts_with('.') {
            CookieScope::AllSubdomains(domain.to_ascii_lowercase())
        } else {
            CookieScope::HostOnly
        }
    }

    /// Value of the `Domain` cookie attribute, if any
    #[must_use]
    pub fn cookie_domain(&self) -> Option<&str> {
        match self {
            CookieScope::AllSubdomains(d) => Some(d),
            CookieScope::HostOnly => None,
        }
    }
}

/// Persisted form of a session.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionRecord {
    pub data: Map<String, Value>,
    pub expires_at: SystemTime,
}

/// Backing store for sessions.
pub trait SessionStore: Send + Sync {
    /// Load a non-expired record.
    fn load(&self, id: &SessionId) -> anyhow::Result<Option<SessionRecord>>;
    fn save(&self, id: &SessionId, record: SessionRecord) -> anyhow::Result<()>;
}

/// In-memory store, mainly for tests and single-process hosts.
#[derive(Debug, Default)]
pub struct MemorySessionStore {
    records: Mutex<HashMap<SessionId, SessionRecord>>,
}

impl MemorySessionStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.records.lock().len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.records.lock().is_empty()
    }

    #[must_use]
    pub fn record(&self, id: &SessionId) -> Option<SessionRecord> {
        self.records.lock().get(id).cloned()
    }
}

impl SessionStore for MemorySessionStore {
    fn load(&self, id: &SessionId) -> anyhow::Result<Option<SessionRecord>> {
        let mut records = self.records.lock();
        match records.get(id) {
            Some(record) if record.expires_at <= SystemTime::now() => {
                records.remove(id);
                Ok(None)
            }
            Some(record) => Ok(Some(record.clone())),
            None => Ok(None),
        }
    }

    fn save(&self, id: &SessionId, record: SessionRecord) -> anyhow::Result<()> {
        self.records.lock().insert(*id, record);
        Ok(())
    }
}

/// Client-scoped key/value store for one request.
pub struct Session {
    id: SessionId,
    cookie_name: String,
    scope: CookieScope,
    ttl: Duration,
    secure: bool,
    is_new: bool,
    data: Mutex<Map<String, Value>>,
    closed: AtomicBool,
    store: Arc<dyn SessionStore>,
}

impl std::fmt::Debug for Session {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Session")
            .field("id", &self.id)
            .field("cookie_name", &self.cookie_name)
            .field("scope", &self.scope)
            .field("ttl", &self.ttl)
            .field("is_new", &self.is_new)
            .field("closed", &self.closed.load(Ordering::SeqCst))
            .finish_non_exhaustive()
    }
}

impl Session {
    /// Resume the session named by the request cookie, or start a new one.
    ///
    /// Store failures while resuming are logged and a fresh session is started.
    pub fn start(
        config: &SessionConfig,
        domain: &str,
        request: &Request,
        store: Arc<dyn SessionStore>,
    ) -> Session {
        let scope = CookieScope::from_domain(domain);
        let ttl = Duration::from_secs(config.ttl_secs);

        let resumed = request
            .cookie(&config.name)
            .and_then(|raw| raw.parse::<SessionId>().ok())
            .and_then(|id| match store.load(&id) {
                Ok(Some(record)) => Some((id, record.data)),
                Ok(None) => None,
                Err(err) => {
                    warn!(session_id = %id, error = %err, "Session load failed, starting new session");
                    None
                }
            });

        let (id, data, is_new) = match resumed {
            Some((id, data)) => (id, data, false),
            None => (SessionId::new(), Map::new(), true),
        };

        info!(
            session_id = %id,
            resumed = !is_new,
            scope = ?scope,
            ttl_secs = config.ttl_secs,
            "Session started"
        );

        Session {
            id,
            cookie_name: config.name.clone(),
            scope,
            ttl,
            secure: request.is_https(),
            is_new,
            data: Mutex::new(data),
            closed: AtomicBool::new(false),
            store,
        }
    }

    #[must_use]
    pub fn id(&self) -> SessionId {
        self.id
    }

    #[must_use]
    pub fn scope(&self) -> &CookieScope {
        &self.scope
    }

    #[must_use]
    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    /// True when no existing session was resumed
    #[must_use]
    pub fn is_new(&self) -> bool {
        self.is_new
    }

    #[must_use]
    pub fn is_closed(&self) -> bool {
        self.closed.load(Ordering::SeqCst)
    }

    #[must_use]
    pub fn get(&self, key: &str) -> Option<Value> {
        self.data.lock().get(key).cloned()
    }

    pub fn set(&self, key: impl Into<String>, value: Value) {
        self.data.lock().insert(key.into(), value);
    }

    pub fn remove(&self, key: &str) -> Option<Value> {
        self.data.lock().remove(key)
    }

    pub fn clear(&self) {
        self.data.lock().clear();
    }

    /// `Set-Cookie` header value for this session.
    #[must_use]
    pub fn set_cookie_header(&self) -> String {
        let mut cookie = format!(
            "{}={}; Path=/; Max-Age={}",
            self.cookie_name,
            self.id,
            self.ttl.as_secs()
        );
        if let Some(domain) = self.scope.cookie_domain() {
            cookie.push_str("; Domain=");
            cookie.push_str(domain);
        }
        if self.secure {
            cookie.push_str("; Secure");
        }
        cookie.push_str("; HttpOnly");
        cookie
    }

    /// Persist the session.
    ///
    /// Only the first call writes; it returns `Ok(true)`. Later calls are
    /// no-ops returning `Ok(false)`.
    pub fn close(&self) -> anyhow::Result<bool> {
        if self.closed.swap(true, Ordering::SeqCst) {
            debug!(session_id = %self.id, "Session already closed");
            return Ok(false);
        }
        let record = SessionRecord {
            data: self.data.lock().clone(),
            expires_at: SystemTime::now() + self.ttl,
        };
        self.store.save(&self.id, record)?;
        info!(session_id = %self.id, "Session closed");
        Ok(true)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Ports;
    use serde_json::json;

    fn request() -> Request {
        Request::builder().host("www.example.com").build(&Ports::default())
    }

    #[test]
    fn test_scope_from_domain() {
        assert_eq!(
            CookieScope::from_domain(".example.com"),
            CookieScope::AllSubdomains(".example.com".into())
        );
        assert_eq!(CookieScope::from_domain("example.com"), CookieScope::HostOnly);
        assert_eq!(CookieScope::from_domain(""), CookieScope::HostOnly);
        assert_eq!(CookieScope::from_domain("."), CookieScope::HostOnly);
    }

    #[test]
    fn test_cookie_header_domain_attribute() {
        let store: Arc<dyn SessionStore> = Arc::new(MemorySessionStore::new());
        let config = SessionConfig::default();
        let wide = Session::start(&config, ".example.com", &request(), Arc::clone(&store));
        assert!(wide.set_cookie_header().contains("; Domain=.example.com"));
        let host = Session::start(&config, "example.com", &request(), store);
        assert!(!host.set_cookie_header().contains("Domain="));
        assert!(host.set_cookie_header().starts_with("BASESESSID="));
    }

    #[test]
    fn test_close_persists_once() {
        let store = Arc::new(MemorySessionStore::new());
        let session = Session::start(
            &SessionConfig::default(),
            "",
            &request(),
            Arc::clone(&store) as Arc<dyn SessionStore>,
        );
        session.set("user", json!(7));
        assert!(session.close().unwrap());
        session.set("user", json!(8));
        assert!(!session.close().unwrap());
        let record = store.record(&session.id()).unwrap();
        assert_eq!(record.data.get("user"), Some(&json!(7)));
    }

    #[test]
    fn test_resume_from_cookie() {
        let store = Arc::new(MemorySessionStore::new());
        let config = SessionConfig::default();
        let first = Session::start(&config, "", &request(), Arc::clone(&store) as Arc<dyn SessionStore>);
        first.set("cart", json!(["apple"]));
        first.close().unwrap();

        let again = Request::builder()
            .cookie(&config.name, &first.id().to_string())
            .build(&Ports::default());
        let second = Session::start(&config, "", &again, store);
        assert!(!second.is_new());
        assert_eq!(second.id(), first.id());
        assert_eq!(second.get("cart"), Some(json!(["apple"])));
    }

    #[test]
    fn test_unknown_cookie_starts_new_session() {
        let store: Arc<dyn SessionStore> = Arc::new(MemorySessionStore::new());
        let config = SessionConfig::default();
        let req = Request::builder()
            .cookie(&config.name, "garbage")
            .build(&Ports::default());
        let session = Session::start(&config, "", &req, store);
        assert!(session.is_new());
    }

    #[test]
    fn test_expired_record_is_dropped() {
        let store = MemorySessionStore::new();
        let id = SessionId::new();
        store
            .save(
                &id,
                SessionRecord {
                    data: Map::new(),
                    expires_at: SystemTime::now() - Duration::from_secs(1),
                },
            )
            .unwrap();
        assert!(store.load(&id).unwrap().is_none());
        assert!(store.is_empty());
    }
}
