//! Pose detection clients.
//!
//! The pose model runs as its own HTTP service. [`RemotePoseDetector`] ships
//! decoded RGB frames to it; [`DisabledPoseDetector`] stands in when no model
//! URL is configured and always reports that no person was found.

use crate::frame::Frame;
use async_trait::async_trait;
use base64::Engine;
use kinetics::LandmarkRecord;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use thiserror::Error;
use trackconf::ModelsConfig;

#[derive(Debug, Error)]
pub enum PoseError {
    #[error("Failed to build pose client: {0}")]
    Client(#[source] reqwest::Error),

    #[error("Pose service request failed: {0}")]
    Request(#[source] reqwest::Error),

    #[error("Pose service returned status {0}")]
    Status(reqwest::StatusCode),
}

#[async_trait]
pub trait PoseDetector: Send + Sync {
    /// Landmarks for the most prominent person, or `None` if nobody is found.
    async fn detect(&self, frame: &Frame) -> Result<Option<Vec<LandmarkRecord>>, PoseError>;

    fn name(&self) -> &'static str;
}

/// Always returns no pose.
#[derive(Debug, Default)]
pub struct DisabledPoseDetector;

#[async_trait]
impl PoseDetector for DisabledPoseDetector {
    async fn detect(&self, _frame: &Frame) -> Result<Option<Vec<LandmarkRecord>>, PoseError> {
        Ok(None)
    }

    fn name(&self) -> &'static str {
        "disabled"
    }
}

#[derive(Serialize)]
struct DetectRequest<'a> {
    width: u32,
    height: u32,
    encoding: &'a str,
    data: String,
}

#[derive(Deserialize)]
struct DetectResponse {
    #[serde(default)]
    landmarks: Option<Vec<LandmarkRecord>>,
}

/// Client for a pose model service exposing `POST /detect_pose`.
pub struct RemotePoseDetector {
    client: Client,
    base_url: String,
}

impl RemotePoseDetector {
    pub fn new(base_url: &str, timeout: Duration) -> Result<Self, PoseError> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(PoseError::Client)?;

        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }
}

#[async_trait]
impl PoseDetector for RemotePoseDetector {
    #[tracing::instrument(
        name = "pose.detect",
        skip_all,
        fields(width = frame.width, height = frame.height)
    )]
    async fn detect(&self, frame: &Frame) -> Result<Option<Vec<LandmarkRecord>>, PoseError> {
        let body = DetectRequest {
            width: frame.width,
            height: frame.height,
            encoding: "rgb8",
            data: base64::engine::general_purpose::STANDARD.encode(&frame.pixels),
        };

        let response = self
            .client
            .post(format!("{}/detect_pose", self.base_url))
            .json(&body)
            .send()
            .await
            .map_err(PoseError::Request)?;

        if !response.status().is_success() {
            return Err(PoseError::Status(response.status()));
        }

        let parsed: DetectResponse = response.json().await.map_err(PoseError::Request)?;
        tracing::debug!(
            landmarks = parsed.landmarks.as_ref().map(Vec::len).unwrap_or(0),
            "pose service replied"
        );
        Ok(parsed.landmarks)
    }

    fn name(&self) -> &'static str {
        "remote"
    }
}

/// Pick the detector implied by configuration.
pub fn from_config(cfg: &ModelsConfig) -> Result<Box<dyn PoseDetector>, PoseError> {
    match cfg.pose_url.as_deref() {
        Some(url) => {
            tracing::info!(url, timeout_ms = cfg.timeout_ms, "Using remote pose detector");
            Ok(Box::new(RemotePoseDetector::new(
                url,
                Duration::from_millis(cfg.timeout_ms),
            )?))
        }
        None => {
            tracing::warn!("No pose model configured; /analyze_pose will report no landmarks");
            Ok(Box::new(DisabledPoseDetector))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::{routing::post, Json, Router};

    fn frame() -> Frame {
        Frame {
            width: 2,
            height: 1,
            pixels: vec![1, 2, 3, 4, 5, 6],
        }
    }

    async fn serve(app: Router) -> String {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });
        format!("http://{addr}")
    }

    #[tokio::test]
    async fn test_disabled_reports_nothing() {
        assert_eq!(DisabledPoseDetector.detect(&frame()).await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_remote_round_trip() {
        let app = Router::new().route(
            "/detect_pose",
            post(|Json(req): Json<serde_json::Value>| async move {
                assert_eq!(req["encoding"], "rgb8");
                assert_eq!(req["width"], 2);
                assert_eq!(req["data"], "AQIDBAUG");
                Json(serde_json::json!({
                    "landmarks": [{"x": 0.1, "y": 0.2, "z": 0.0, "visibility": 0.9}]
                }))
            }),
        );
        let url = serve(app).await;

        let detector = RemotePoseDetector::new(&url, Duration::from_secs(5)).unwrap();
        let landmarks = detector.detect(&frame()).await.unwrap().unwrap();
        assert_eq!(landmarks.len(), 1);
        assert_eq!(landmarks[0].visibility, 0.9);
    }

    #[tokio::test]
    async fn test_remote_no_person() {
        let app = Router::new().route(
            "/detect_pose",
            post(|| async { Json(serde_json::json!({ "landmarks": null })) }),
        );
        let url = serve(app).await;
        let detector = RemotePoseDetector::new(&url, Duration::from_secs(5)).unwrap();
        assert_eq!(detector.detect(&frame()).await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_remote_error_status() {
        let app = Router::new().route(
            "/detect_pose",
            post(|| async { axum::http::StatusCode::SERVICE_UNAVAILABLE }),
        );
        let url = serve(app).await;
        let detector = RemotePoseDetector::new(&url, Duration::from_secs(5)).unwrap();
        let err = detector.detect(&frame()).await.unwrap_err();
        assert!(matches!(err, PoseError::Status(s) if s.as_u16() == 503));
    }

    #[test]
    fn test_from_config() {
        let disabled = from_config(&ModelsConfig::default()).unwrap();
        assert_eq!(disabled.name(), "disabled");

        let cfg = ModelsConfig {
            pose_url: Some("http://127.0.0.1:9/".to_string()),
            ..ModelsConfig::default()
        };
        assert_eq!(from_config(&cfg).unwrap().name(), "remote");
    }
}
