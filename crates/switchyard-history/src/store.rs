//! Session context storage
//!
//! Conversation state is keyed by company, user, and model; the write
//! lock is per company and user.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use dashmap::DashMap;
use switchyard_core::{Error, Result};
use switchyard_llm::ConversationItem;
use tokio::sync::{Mutex, OwnedMutexGuard};

/// How long [`InMemorySessionStore::acquire_lock`] waits by default
pub const DEFAULT_LOCK_TIMEOUT: Duration = Duration::from_secs(30);

/// Address of one stored conversation
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct SessionKey {
    pub company: String,
    pub user: String,
    pub model: String,
}

impl SessionKey {
    pub fn new(company: &str, user: &str, model: &str) -> Self {
        Self {
            company: company.to_lowercase(),
            user: user.to_owned(),
            model: model.to_owned(),
        }
    }
}

#[async_trait]
pub trait SessionStore: Send + Sync {
    async fn get_last_response_id(&self, key: &SessionKey) -> Result<Option<String>>;

    async fn save_last_response_id(&self, key: &SessionKey, response_id: &str) -> Result<()>;

    async fn clear_last_response_id(&self, key: &SessionKey) -> Result<()>;

    /// Id of the turn that carried the preamble, used when a query
    /// ignores history
    async fn get_initial_response_id(&self, key: &SessionKey) -> Result<Option<String>>;

    async fn save_initial_response_id(&self, key: &SessionKey, response_id: &str) -> Result<()>;

    async fn get_context_history(&self, key: &SessionKey) -> Result<Vec<ConversationItem>>;

    async fn save_context_history(&self, key: &SessionKey, history: &[ConversationItem]) -> Result<()>;

    async fn clear_context_history(&self, key: &SessionKey) -> Result<()>;

    /// Wait until no other writer holds `(company, user)`
    async fn acquire_lock(&self, company: &str, user: &str) -> Result<()>;

    async fn release_lock(&self, company: &str, user: &str) -> Result<()>;
}

/// Held session lock for `(company, user)`
///
/// [`SessionLease::release`] unlocks explicitly. A lease dropped before
/// that, such as by a cancelled query, unlocks from a spawned task.
pub struct SessionLease {
    store: Arc<dyn SessionStore>,
    company: String,
    user: String,
    released: bool,
}

impl SessionLease {
    pub async fn acquire(store: Arc<dyn SessionStore>, company: &str, user: &str) -> Result<Self> {
        store.acquire_lock(company, user).await?;
        Ok(Self {
            store,
            company: company.to_owned(),
            user: user.to_owned(),
            released: false,
        })
    }

    pub async fn release(mut self) -> Result<()> {
        let result = self.store.release_lock(&self.company, &self.user).await;
        self.released = true;
        result
    }
}

impl Drop for SessionLease {
    fn drop(&mut self) {
        if self.released {
            return;
        }

        let store = Arc::clone(&self.store);
        let company = std::mem::take(&mut self.company);
        let user = std::mem::take(&mut self.user);
        let Ok(runtime) = tokio::runtime::Handle::try_current() else {
            tracing::error!(company = %company, user = %user, "no runtime to release abandoned session lock");
            return;
        };

        tracing::debug!(company = %company, user = %user, "releasing abandoned session lock");
        runtime.spawn(async move {
            if let Err(e) = store.release_lock(&company, &user).await {
                tracing::error!(company = %company, user = %user, error = %e, "failed to release session lock");
            }
        });
    }
}

#[derive(Debug, Default, Clone)]
struct SessionState {
    last_response_id: Option<String>,
    initial_response_id: Option<String>,
    /// JSON-encoded history, the same shape an external store persists
    history: Option<String>,
}

type LockKey = (String, String);

/// Process-local store for the binary and tests
pub struct InMemorySessionStore {
    sessions: DashMap<SessionKey, SessionState>,
    locks: DashMap<LockKey, Arc<Mutex<()>>>,
    held: DashMap<LockKey, OwnedMutexGuard<()>>,
    lock_timeout: Duration,
}

impl Default for InMemorySessionStore {
    fn default() -> Self {
        Self::new()
    }
}

impl InMemorySessionStore {
    pub fn new() -> Self {
        Self {
            sessions: DashMap::new(),
            locks: DashMap::new(),
            held: DashMap::new(),
            lock_timeout: DEFAULT_LOCK_TIMEOUT,
        }
    }

    #[must_use]
    pub const fn with_lock_timeout(mut self, timeout: Duration) -> Self {
        self.lock_timeout = timeout;
        self
    }

    /// Whether `(company, user)` is currently locked
    pub fn is_locked(&self, company: &str, user: &str) -> bool {
        self.held.contains_key(&lock_key(company, user))
    }

    fn update(&self, key: &SessionKey, f: impl FnOnce(&mut SessionState)) {
        f(&mut self.sessions.entry(key.clone()).or_default());
    }

    fn read<T>(&self, key: &SessionKey, f: impl FnOnce(&SessionState) -> T) -> Option<T> {
        self.sessions.get(key).map(|state| f(state.value()))
    }
}

fn lock_key(company: &str, user: &str) -> LockKey {
    (company.to_lowercase(), user.to_owned())
}

#[async_trait]
impl SessionStore for InMemorySessionStore {
    async fn get_last_response_id(&self, key: &SessionKey) -> Result<Option<String>> {
        Ok(self.read(key, |s| s.last_response_id.clone()).flatten())
    }

    async fn save_last_response_id(&self, key: &SessionKey, response_id: &str) -> Result<()> {
        self.update(key, |s| s.last_response_id = Some(response_id.to_owned()));
        Ok(())
    }

    async fn clear_last_response_id(&self, key: &SessionKey) -> Result<()> {
        self.update(key, |s| s.last_response_id = None);
        Ok(())
    }

    async fn get_initial_response_id(&self, key: &SessionKey) -> Result<Option<String>> {
        Ok(self.read(key, |s| s.initial_response_id.clone()).flatten())
    }

    async fn save_initial_response_id(&self, key: &SessionKey, response_id: &str) -> Result<()> {
        self.update(key, |s| s.initial_response_id = Some(response_id.to_owned()));
        Ok(())
    }

    async fn get_context_history(&self, key: &SessionKey) -> Result<Vec<ConversationItem>> {
        let Some(encoded) = self.read(key, |s| s.history.clone()).flatten() else {
            return Ok(Vec::new());
        };
        serde_json::from_str(&encoded).map_err(|e| anyhow::anyhow!("corrupt context history: {e}").into())
    }

    async fn save_context_history(&self, key: &SessionKey, history: &[ConversationItem]) -> Result<()> {
        let encoded = serde_json::to_string(history).map_err(|e| anyhow::anyhow!("encode context history: {e}"))?;
        self.update(key, |s| s.history = Some(encoded));
        Ok(())
    }

    async fn clear_context_history(&self, key: &SessionKey) -> Result<()> {
        self.update(key, |s| s.history = None);
        Ok(())
    }

    async fn acquire_lock(&self, company: &str, user: &str) -> Result<()> {
        let key = lock_key(company, user);
        let mutex = Arc::clone(self.locks.entry(key.clone()).or_default().value());

        let guard = tokio::time::timeout(self.lock_timeout, mutex.lock_owned())
            .await
            .map_err(|_| {
                tracing::warn!(company = %company, user = %user, "timed out waiting for session lock");
                Error::Internal(anyhow::anyhow!(
                    "session for user '{user}' in company '{company}' is busy"
                ))
            })?;
        self.held.insert(key, guard);
        Ok(())
    }

    async fn release_lock(&self, company: &str, user: &str) -> Result<()> {
        self.held.remove(&lock_key(company, user));
        Ok(())
    }
}
