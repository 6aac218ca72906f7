//! Exercise session registry.
//!
//! Each started session owns its own rep counter and form detector. Callers
//! address a session by id; requests without an id fall back to the most
//! recently started session so single-user clients keep working.
//!
//! Spans:
//! - `session.start` - new session registered
//! - `session.end` - explicit end with summary
//! - `session.expire` - removed by idle cleanup

use chrono::{DateTime, Utc};
use dashmap::DashMap;
use kinetics::form::FormSummary;
use kinetics::{
    ExerciseKind, FormDetector, FormReport, KineticsError, LandmarkRecord, RepCounter, RepUpdate,
};
use serde::Serialize;
use std::sync::{Arc, PoisonError, RwLock};
use std::time::{Duration, Instant};
use thiserror::Error;
use tokio_util::sync::CancellationToken;
use uuid::Uuid;

#[derive(Debug, Error)]
pub enum SessionError {
    #[error("No active session. Call /start_session first")]
    NotInitialized,

    #[error("Unknown session: {0}")]
    NotFound(String),

    #[error("Analysis failed: {0}")]
    Analysis(#[from] KineticsError),
}

/// One athlete's exercise session.
#[derive(Debug)]
pub struct ExerciseSession {
    pub id: String,
    pub exercise: ExerciseKind,
    pub started_at: DateTime<Utc>,
    created: Instant,
    last_seen: Instant,
    counter: RepCounter,
    detector: FormDetector,
}

impl ExerciseSession {
    fn new(id: String, exercise: ExerciseKind) -> Self {
        let now = Instant::now();
        Self {
            id,
            exercise,
            started_at: Utc::now(),
            created: now,
            last_seen: now,
            counter: RepCounter::new(exercise),
            detector: FormDetector::new(exercise),
        }
    }

    fn touch(&mut self) {
        self.last_seen = Instant::now();
    }

    pub fn idle_duration(&self) -> Duration {
        self.last_seen.elapsed()
    }

    pub fn rep_count(&self) -> u32 {
        self.counter.rep_count()
    }

    fn summary(&self) -> SessionSummary {
        SessionSummary {
            session_id: self.id.clone(),
            exercise_type: self.exercise,
            started_at: self.started_at,
            duration_secs: self.created.elapsed().as_secs_f64(),
            rep_count: self.counter.rep_count(),
            frames_counted: self.counter.frames(),
            form: self.detector.summary(),
        }
    }
}

/// What an ended session accomplished.
#[derive(Debug, Clone, Serialize)]
pub struct SessionSummary {
    pub session_id: String,
    pub exercise_type: ExerciseKind,
    pub started_at: DateTime<Utc>,
    pub duration_secs: f64,
    pub rep_count: u32,
    pub frames_counted: u64,
    pub form: FormSummary,
}

#[derive(Debug, Clone, Default)]
pub struct SessionStats {
    pub active: usize,
}

#[derive(Debug, Default)]
pub struct SessionRegistry {
    sessions: DashMap<String, ExerciseSession>,
    latest: RwLock<Option<String>>,
}

impl SessionRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn new_shared() -> Arc<Self> {
        Arc::new(Self::new())
    }

    /// Register a fresh session and make it the fallback target.
    pub fn start(&self, exercise: ExerciseKind) -> String {
        let nonce = Uuid::new_v4().simple().to_string();
        let id = format!("session_{}_{}_{}", Utc::now().timestamp(), &nonce[..8], exercise);

        let _span = tracing::info_span!(
            "session.start",
            session.id = %id,
            exercise = %exercise,
        )
        .entered();

        self.sessions.insert(id.clone(), ExerciseSession::new(id.clone(), exercise));
        *self.latest.write().unwrap_or_else(PoisonError::into_inner) = Some(id.clone());
        tracing::info!(active = self.sessions.len(), "Session started");
        id
    }

    fn resolve(&self, id: Option<&str>) -> Result<String, SessionError> {
        match id {
            Some(id) if self.sessions.contains_key(id) => Ok(id.to_string()),
            Some(id) => Err(SessionError::NotFound(id.to_string())),
            None => self
                .latest
                .read()
                .unwrap_or_else(PoisonError::into_inner)
                .clone()
                .ok_or(SessionError::NotInitialized),
        }
    }

    /// Run `f` against the addressed session under its entry lock.
    fn with_session<T>(
        &self,
        id: Option<&str>,
        f: impl FnOnce(&mut ExerciseSession) -> Result<T, KineticsError>,
    ) -> Result<(String, T), SessionError> {
        let resolved = self.resolve(id)?;
        let mut session = self.sessions.get_mut(&resolved).ok_or_else(|| match id {
            Some(id) => SessionError::NotFound(id.to_string()),
            None => SessionError::NotInitialized,
        })?;
        session.touch();
        let out = f(session.value_mut())?;
        Ok((resolved, out))
    }

    pub fn count_reps(
        &self,
        id: Option<&str>,
        landmarks: &[LandmarkRecord],
    ) -> Result<(String, RepUpdate), SessionError> {
        self.with_session(id, |s| s.counter.update(landmarks))
    }

    pub fn detect_cheat(
        &self,
        id: Option<&str>,
        landmarks: &[LandmarkRecord],
    ) -> Result<(String, FormReport), SessionError> {
        self.with_session(id, |s| s.detector.analyze_form(landmarks))
    }

    /// Exercise and rep count of a session, if it exists.
    pub fn peek(&self, id: Option<&str>) -> Option<(ExerciseKind, u32)> {
        let resolved = self.resolve(id).ok()?;
        self.sessions
            .get(&resolved)
            .map(|s| (s.exercise, s.rep_count()))
    }

    /// End a session. Without an id nothing is removed.
    pub fn end(&self, id: Option<&str>) -> Result<Option<SessionSummary>, SessionError> {
        let Some(id) = id else {
            return Ok(None);
        };
        let (_, session) = self
            .sessions
            .remove(id)
            .ok_or_else(|| SessionError::NotFound(id.to_string()))?;
        self.forget_latest(id);

        let summary = session.summary();
        let _span = tracing::info_span!("session.end", session.id = %id).entered();
        tracing::info!(
            exercise = %summary.exercise_type,
            reps = summary.rep_count,
            duration_secs = summary.duration_secs,
            "Session ended"
        );
        Ok(Some(summary))
    }

    fn forget_latest(&self, id: &str) {
        let mut latest = self.latest.write().unwrap_or_else(PoisonError::into_inner);
        if latest.as_deref() == Some(id) {
            *latest = None;
        }
    }

    /// Remove sessions idle longer than `max_idle`. Returns how many went.
    pub fn cleanup(&self, max_idle: Duration) -> usize {
        let stale: Vec<String> = self
            .sessions
            .iter()
            .filter(|entry| entry.value().idle_duration() > max_idle)
            .map(|entry| entry.key().clone())
            .collect();

        let mut removed = 0;
        for id in stale {
            if self
                .sessions
                .remove_if(&id, |_, s| s.idle_duration() > max_idle)
                .is_some()
            {
                let _span = tracing::info_span!("session.expire", session.id = %id).entered();
                tracing::info!("Removed idle session");
                self.forget_latest(&id);
                removed += 1;
            }
        }

        if removed > 0 {
            tracing::info!(
                removed = removed,
                remaining = self.sessions.len(),
                "Session cleanup completed"
            );
        }
        removed
    }

    pub fn stats(&self) -> SessionStats {
        SessionStats {
            active: self.sessions.len(),
        }
    }
}

/// Spawn a background task that periodically drops idle sessions.
pub fn spawn_cleanup_task(
    registry: Arc<SessionRegistry>,
    interval: Duration,
    max_idle: Duration,
    cancel: CancellationToken,
) -> tokio::task::JoinHandle<()> {
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(interval);
        ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);

        loop {
            tokio::select! {
                _ = cancel.cancelled() => {
                    tracing::info!("Session cleanup task shutting down");
                    break;
                }
                _ = ticker.tick() => {
                    registry.cleanup(max_idle);
                }
            }
        }
    })
}
