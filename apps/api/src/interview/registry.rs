use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::{Mutex, RwLock};
use tokio::task::JoinHandle;
use tokio::time::Instant;
use tracing::{debug, info};
use uuid::Uuid;

use crate::interview::session::{InterviewServices, InterviewSession, InterviewState};

pub type SharedSession = Arc<Mutex<InterviewSession>>;

/// How long sessions stay registered without activity.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetentionPolicy {
    /// Any session untouched for this long is evicted.
    pub idle_ttl: Duration,
    /// ENDED sessions are evicted this long after their last access.
    pub ended_grace: Duration,
}

impl Default for RetentionPolicy {
    fn default() -> Self {
        Self {
            idle_ttl: Duration::from_secs(30 * 60),
            ended_grace: Duration::from_secs(60),
        }
    }
}

struct Entry {
    session: SharedSession,
    last_active: Instant,
}

/// Live sessions by id. Each session has its own lock, so inputs to one session
/// are serialized while different sessions run concurrently.
pub struct SessionRegistry {
    services: Arc<InterviewServices>,
    retention: RetentionPolicy,
    sessions: RwLock<HashMap<Uuid, Entry>>,
}

impl SessionRegistry {
    pub fn new(services: Arc<InterviewServices>, retention: RetentionPolicy) -> Self {
        Self {
            services,
            retention,
            sessions: RwLock::new(HashMap::new()),
        }
    }

    /// Registers a fresh session in GREETING and returns it.
    pub async fn create(&self) -> (Uuid, SharedSession) {
        let id = Uuid::new_v4();
        let session = Arc::new(Mutex::new(InterviewSession::new(
            id,
            Arc::clone(&self.services),
        )));

        let mut sessions = self.sessions.write().await;
        sessions.insert(
            id,
            Entry {
                session: Arc::clone(&session),
                last_active: Instant::now(),
            },
        );
        info!("Session {id} created ({} live)", sessions.len());

        (id, session)
    }

    /// Looks the session up and marks it active.
    pub async fn get(&self, id: Uuid) -> Option<SharedSession> {
        let mut sessions = self.sessions.write().await;
        let entry = sessions.get_mut(&id)?;
        entry.last_active = Instant::now();
        Some(Arc::clone(&entry.session))
    }

    /// Drops the session. Returns false when it was not registered.
    pub async fn remove(&self, id: Uuid) -> bool {
        let removed = self.sessions.write().await.remove(&id).is_some();
        if removed {
            info!("Session {id} discarded");
        }
        removed
    }

    pub async fn len(&self) -> usize {
        self.sessions.read().await.len()
    }

    /// Evicts ENDED sessions past the grace period and idle sessions past the TTL.
    /// A session whose lock is held is in use and always kept. Returns the eviction count.
    pub async fn sweep(&self) -> usize {
        let now = Instant::now();
        let RetentionPolicy {
            idle_ttl,
            ended_grace,
        } = self.retention;

        let mut sessions = self.sessions.write().await;
        let before = sessions.len();
        sessions.retain(|id, entry| {
            let idle = now.saturating_duration_since(entry.last_active);
            let Ok(session) = entry.session.try_lock() else {
                return true;
            };
            let expired = idle >= idle_ttl
                || (session.state() == InterviewState::Ended && idle >= ended_grace);
            if expired {
                debug!("Evicting session {id} ({:?}, idle {}s)", session.state(), idle.as_secs());
            }
            !expired
        });

        let evicted = before - sessions.len();
        if evicted > 0 {
            info!("Evicted {evicted} session(s) ({} live)", sessions.len());
        }
        evicted
    }

    /// Runs `sweep` every `every` for the life of the process.
    pub fn spawn_sweeper(self: Arc<Self>, every: Duration) -> JoinHandle<()> {
        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(every);
            loop {
                ticker.tick().await;
                self.sweep().await;
            }
        })
    }
}
