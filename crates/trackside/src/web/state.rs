use crate::demo::DemoSupervisor;
use crate::frame::DecodeLimits;
use crate::pose::{self, PoseDetector, PoseError};
use crate::scorecard::PlaceholderScorer;
use crate::sessions::SessionRegistry;
use kinetics::{ReadinessPredictor, TalentPredictor, WeightedReadinessModel, WeightedTalentModel};
use std::sync::Arc;
use std::time::Instant;
use trackconf::TrackConfig;

/// Shared state for HTTP handlers.
#[derive(Clone)]
pub struct AppState {
    /// Live exercise sessions
    pub sessions: Arc<SessionRegistry>,
    pub pose: Arc<dyn PoseDetector>,
    pub talent: Arc<dyn TalentPredictor>,
    pub readiness: Arc<dyn ReadinessPredictor>,
    pub demos: Arc<DemoSupervisor>,
    pub scorer: Arc<PlaceholderScorer>,
    pub decode_limits: DecodeLimits,
    /// Server start, for uptime
    pub started: Instant,
}

impl AppState {
    pub fn from_config(config: &TrackConfig) -> Result<Self, PoseError> {
        let pose: Arc<dyn PoseDetector> = Arc::from(pose::from_config(&config.bootstrap.models)?);

        Ok(Self {
            sessions: SessionRegistry::new_shared(),
            pose,
            talent: Arc::new(WeightedTalentModel::default()),
            readiness: Arc::new(WeightedReadinessModel),
            demos: Arc::new(DemoSupervisor::new(&config.bootstrap.demo)),
            scorer: Arc::new(PlaceholderScorer::new(&config.bootstrap.scorecard)),
            decode_limits: DecodeLimits::from(&config.infra.limits),
            started: Instant::now(),
        })
    }

    /// Swap the pose detector, e.g. for a stub in tests.
    pub fn with_pose(mut self, pose: Arc<dyn PoseDetector>) -> Self {
        self.pose = pose;
        self
    }
}
