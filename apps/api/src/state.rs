use std::sync::Arc;

use crate::config::Config;
use crate::interview::registry::{RetentionPolicy, SessionRegistry};
use crate::interview::session::InterviewServices;

/// Shared application state injected into all route handlers via Axum extractors.
#[derive(Clone)]
pub struct AppState {
    pub config: Config,
    /// Reasoning service, session store and question bank shared by every session.
    pub services: Arc<InterviewServices>,
    pub sessions: Arc<SessionRegistry>,
}

impl AppState {
    pub fn new(config: Config, services: Arc<InterviewServices>) -> Self {
        let retention = RetentionPolicy {
            idle_ttl: config.session_idle_ttl,
            ended_grace: config.session_ended_grace,
        };
        Self {
            sessions: Arc::new(SessionRegistry::new(Arc::clone(&services), retention)),
            config,
            services,
        }
    }
}
