//! Application state.

use spirit_core::config::SpiritConfig;
use spirit_core::session::{Generators, QuizSession, SessionSettings};
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::RwLock;
use tracing::{debug, info};
use uuid::Uuid;

/// Default bound on live sessions.
pub const DEFAULT_MAX_SESSIONS: usize = 1000;

/// Application state shared across handlers.
#[derive(Clone)]
pub struct AppState {
    pub generators: Generators,
    pub settings: SessionSettings,
    pub session_idle: Duration,
    pub max_sessions: usize,
    sessions: Arc<RwLock<HashMap<String, Arc<QuizSession>>>>,
}

impl AppState {
    pub fn new(generators: Generators, settings: SessionSettings, session_idle: Duration) -> Self {
        Self {
            generators,
            settings,
            session_idle,
            max_sessions: DEFAULT_MAX_SESSIONS,
            sessions: Arc::new(RwLock::new(HashMap::new())),
        }
    }

    pub fn from_config(config: &SpiritConfig, generators: Generators) -> Self {
        Self::new(generators, SessionSettings::from_config(config), config.session_idle())
            .with_max_sessions(config.quiz.max_sessions)
    }

    pub fn with_max_sessions(mut self, max_sessions: usize) -> Self {
        self.max_sessions = max_sessions.max(1);
        self
    }

    /// Start a new locked quiz session. Idle sessions are dropped first, then
    /// the least recently used ones while the map is full.
    pub async fn create_session(&self) -> Arc<QuizSession> {
        let id = Uuid::new_v4().to_string();
        let session = Arc::new(QuizSession::new(
            id.clone(),
            self.generators.clone(),
            self.settings.clone(),
        ));

        let mut sessions = self.sessions.write().await;
        let before = sessions.len();
        sessions.retain(|_, s| s.idle_for() < self.session_idle);
        if sessions.len() < before {
            debug!(pruned = before - sessions.len(), "Dropped idle sessions");
        }
        while sessions.len() >= self.max_sessions {
            let Some(oldest) = sessions
                .iter()
                .max_by_key(|(_, s)| s.idle_for())
                .map(|(id, _)| id.clone())
            else {
                break;
            };
            sessions.remove(&oldest);
            info!(session = %oldest, "Session limit reached, evicted least recently used");
        }
        sessions.insert(id, session.clone());

        session
    }

    /// Look up a session and mark it active.
    pub async fn session(&self, id: &str) -> Option<Arc<QuizSession>> {
        let session = self.sessions.read().await.get(id).cloned()?;
        session.touch();
        Some(session)
    }

    pub async fn session_count(&self) -> usize {
        self.sessions.read().await.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use spirit_core::card::Card;
    use spirit_core::provider::{CardGenerator, ImageGenerator, RenderedImage};
    use spirit_core::quiz::model::AnswerSet;
    use spirit_core::{SpiritError, SpiritResult};

    struct Offline;

    #[async_trait]
    impl CardGenerator for Offline {
        async fn generate_card(&self, _answers: &AnswerSet) -> SpiritResult<Card> {
            Err(SpiritError::Transport("offline".to_string()))
        }
    }

    #[async_trait]
    impl ImageGenerator for Offline {
        async fn generate_image(&self, _image_prompt: &str) -> SpiritResult<RenderedImage> {
            Err(SpiritError::Transport("offline".to_string()))
        }
    }

    fn state(max_sessions: usize) -> AppState {
        AppState::new(
            Generators {
                cards: Arc::new(Offline),
                images: Arc::new(Offline),
            },
            SessionSettings {
                passcode: "sloan".to_string(),
                failure_reset_delay: Duration::from_millis(10),
            },
            Duration::from_secs(3600),
        )
        .with_max_sessions(max_sessions)
    }

    #[tokio::test]
    async fn test_session_map_is_capped() {
        let state = state(3);
        for _ in 0..25 {
            state.create_session().await;
        }
        assert_eq!(state.session_count().await, 3);
    }

    #[tokio::test]
    async fn test_cap_evicts_least_recently_used() {
        let state = state(2);
        let first = state.create_session().await;
        tokio::time::sleep(Duration::from_millis(5)).await;
        let second = state.create_session().await;
        tokio::time::sleep(Duration::from_millis(5)).await;

        // Touching the first makes the second the oldest.
        assert!(state.session(first.id()).await.is_some());
        tokio::time::sleep(Duration::from_millis(5)).await;
        let third = state.create_session().await;

        assert!(state.session(first.id()).await.is_some());
        assert!(state.session(second.id()).await.is_none());
        assert!(state.session(third.id()).await.is_some());
    }

    #[test]
    fn test_from_config_uses_limits() {
        let mut config = SpiritConfig::default();
        config.quiz.max_sessions = 12;
        config.quiz.failure_reset_secs = 9;
        let state = AppState::from_config(
            &config,
            Generators {
                cards: Arc::new(Offline),
                images: Arc::new(Offline),
            },
        );
        assert_eq!(state.max_sessions, 12);
        assert_eq!(state.settings.failure_reset_delay, Duration::from_secs(9));
    }
}
