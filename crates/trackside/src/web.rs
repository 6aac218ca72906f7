//! HTTP endpoints for the assessment API.
//!
//! Every response is JSON with a `success` flag. Handlers accept a missing or
//! partial body and fill in the same defaults the frontend relies on.

pub mod state;

pub use state::AppState;

use crate::error::{ApiError, JsonBody};
use crate::feedback::{self, CurrentMetrics};
use crate::frame;
use crate::sessions::SessionError;
use axum::{
    extract::{DefaultBodyLimit, State},
    http::{header, HeaderValue, Method},
    routing::{get, post},
    Json, Router,
};
use kinetics::{AthleteProfile, ExerciseKind, LandmarkRecord, PerformanceData};
use serde::Deserialize;
use serde_json::{json, Value};
use tower_http::cors::{AllowOrigin, CorsLayer};
use tower_http::trace::TraceLayer;
use trackconf::InfraConfig;

type ApiResult = Result<Json<Value>, ApiError>;

/// Routes only; see [`app`] for the served stack.
pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/start_session", post(start_session))
        .route("/launch_demo", post(launch_demo))
        .route("/demos", get(list_demos))
        .route("/analyze_pose", post(analyze_pose))
        .route("/count_reps", post(count_reps))
        .route("/detect_cheat", post(detect_cheat))
        .route("/scorecard", post(scorecard))
        .route("/predict_talent", post(predict_talent))
        .route("/olympic_readiness", post(olympic_readiness))
        .route("/voice_feedback", post(voice_feedback))
        .route("/end_session", post(end_session))
        .with_state(state)
}

/// Routes plus CORS, body limit and request tracing.
pub fn app(state: AppState, infra: &InfraConfig) -> Router {
    router(state)
        .layer(DefaultBodyLimit::max(infra.limits.max_body_bytes))
        .layer(cors_layer(&infra.cors.allowed_origins))
        .layer(TraceLayer::new_for_http())
}

fn cors_layer(origins: &[String]) -> CorsLayer {
    let allowed: Vec<HeaderValue> = origins
        .iter()
        .filter_map(|origin| match HeaderValue::from_str(origin) {
            Ok(value) => Some(value),
            Err(_) => {
                tracing::warn!(origin = %origin, "Ignoring invalid CORS origin");
                None
            }
        })
        .collect();

    CorsLayer::new()
        .allow_origin(AllowOrigin::list(allowed))
        .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
        .allow_headers([header::CONTENT_TYPE])
}

#[tracing::instrument(name = "http.health", skip(state))]
async fn health(State(state): State<AppState>) -> Json<Value> {
    Json(json!({
        "success": true,
        "status": "healthy",
        "timestamp": chrono::Local::now().to_rfc3339(),
        "message": "Sports assessment API is running",
        "version": env!("CARGO_PKG_VERSION"),
        "uptime_secs": state.started.elapsed().as_secs(),
        "sessions": {
            "active": state.sessions.stats().active,
        },
    }))
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct StartSessionRequest {
    exercise_type: Option<String>,
}

#[tracing::instrument(name = "http.start_session", skip(state))]
async fn start_session(
    State(state): State<AppState>,
    JsonBody(req): JsonBody<StartSessionRequest>,
) -> ApiResult {
    let raw = req.exercise_type.as_deref().unwrap_or("pushup");
    let exercise: ExerciseKind = raw
        .parse()
        .map_err(|e: kinetics::KineticsError| ApiError::BadRequest(e.to_string()))?;

    let session_id = state.sessions.start(exercise);
    Ok(Json(json!({
        "success": true,
        "session_id": session_id,
        "exercise_type": exercise,
        "message": format!("AI session started for {exercise}"),
    })))
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct LaunchDemoRequest {
    exercise_type: Option<String>,
    mode: Option<String>,
}

#[tracing::instrument(name = "http.launch_demo", skip(state))]
async fn launch_demo(
    State(state): State<AppState>,
    JsonBody(req): JsonBody<LaunchDemoRequest>,
) -> ApiResult {
    let exercise_type = req.exercise_type.unwrap_or_else(|| "pushup".to_string());
    let mode = req.mode.unwrap_or_else(|| "full".to_string());

    let launch = state.demos.launch(&exercise_type, &mode)?;
    Ok(Json(json!({
        "success": true,
        "message": "Desktop demo launching",
        "launch_id": launch.launch_id,
        "pid": launch.pid,
        "exercise_type": launch.exercise_type,
        "mode": launch.mode,
    })))
}

#[tracing::instrument(name = "http.demos", skip(state))]
async fn list_demos(State(state): State<AppState>) -> Json<Value> {
    Json(json!({
        "success": true,
        "demos": state.demos.list(),
    }))
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct AnalyzePoseRequest {
    image_data: Option<String>,
}

#[tracing::instrument(name = "http.analyze_pose", skip_all)]
async fn analyze_pose(
    State(state): State<AppState>,
    JsonBody(req): JsonBody<AnalyzePoseRequest>,
) -> ApiResult {
    let image_data = req
        .image_data
        .filter(|s| !s.is_empty())
        .ok_or_else(|| ApiError::BadRequest("No image data provided".to_string()))?;

    let frame = frame::decode_data_url_blocking(image_data, state.decode_limits).await?;
    let landmarks = state.pose.detect(&frame).await?.unwrap_or_default();
    tracing::debug!(
        width = frame.width,
        height = frame.height,
        landmarks = landmarks.len(),
        detector = state.pose.name(),
        "Frame analyzed"
    );

    let confidence = if landmarks.is_empty() { 0.0 } else { 0.9 };
    Ok(Json(json!({
        "success": true,
        "landmarks": landmarks,
        "confidence": confidence,
        "frame_quality": 85.0,
    })))
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct LandmarksRequest {
    landmarks: Vec<LandmarkRecord>,
    session_id: Option<String>,
}

impl LandmarksRequest {
    fn require_landmarks(&self) -> Result<(), ApiError> {
        if self.landmarks.is_empty() {
            return Err(ApiError::BadRequest("No landmarks provided".to_string()));
        }
        Ok(())
    }
}

#[tracing::instrument(
    name = "http.count_reps",
    skip_all,
    fields(session.id = ?req.session_id, landmarks = req.landmarks.len())
)]
async fn count_reps(
    State(state): State<AppState>,
    JsonBody(req): JsonBody<LandmarksRequest>,
) -> ApiResult {
    req.require_landmarks()?;
    let (session_id, update) = state
        .sessions
        .count_reps(req.session_id.as_deref(), &req.landmarks)?;

    Ok(Json(json!({
        "success": true,
        "session_id": session_id,
        "rep_count": update.rep_count,
        "current_state": update.current_state,
        "confidence": update.confidence,
        "angle": update.angle,
        "debug_info": update.debug_info,
    })))
}

#[tracing::instrument(
    name = "http.detect_cheat",
    skip_all,
    fields(session.id = ?req.session_id, landmarks = req.landmarks.len())
)]
async fn detect_cheat(
    State(state): State<AppState>,
    JsonBody(req): JsonBody<LandmarksRequest>,
) -> ApiResult {
    req.require_landmarks()?;
    let (session_id, report) = state
        .sessions
        .detect_cheat(req.session_id.as_deref(), &req.landmarks)?;

    Ok(Json(json!({
        "success": true,
        "session_id": session_id,
        "violations": report.violations,
        "form_quality": report.form_quality,
        "confidence": report.confidence,
        "recommendations": report.recommendations,
        "severity": report.violation_severity,
    })))
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct ScorecardRequest {
    exercise_type: Option<String>,
    session_id: Option<String>,
}

#[tracing::instrument(name = "http.scorecard", skip(state))]
async fn scorecard(
    State(state): State<AppState>,
    JsonBody(req): JsonBody<ScorecardRequest>,
) -> ApiResult {
    let exercise_type = match (req.exercise_type, req.session_id) {
        (Some(explicit), _) => explicit,
        (None, Some(id)) => match state.sessions.peek(Some(&id)) {
            Some((kind, _)) => kind.to_string(),
            None => return Err(SessionError::NotFound(id).into()),
        },
        (None, None) => "pushup".to_string(),
    };

    let card = state.scorer.score(&exercise_type);
    Ok(Json(json!({
        "success": true,
        "score": card.score,
        "percentile": card.percentile,
        "analysis": card.analysis,
        "metrics": card.metrics,
        "placeholder": card.placeholder,
    })))
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct TalentRequest {
    performance_data: PerformanceData,
}

#[tracing::instrument(name = "http.predict_talent", skip(state))]
async fn predict_talent(
    State(state): State<AppState>,
    JsonBody(req): JsonBody<TalentRequest>,
) -> ApiResult {
    let report = state
        .talent
        .generate_talent_report(&req.performance_data)
        .map_err(|e| ApiError::Internal(e.to_string()))?;

    let profile = report.talent_profile;
    let recommendations: Vec<String> = profile
        .development_recommendations
        .into_iter()
        .take(3)
        .collect();

    Ok(Json(json!({
        "success": true,
        "talent_score": profile.composite_talent_score,
        "category": profile.talent_category.category,
        "description": profile.talent_category.description,
        "percentile": profile.talent_category.percentile,
        "recommendations": recommendations,
        "potential_predictions": report.future_potential.potential_predictions,
    })))
}

/// Readiness input; anything omitted keeps the default athlete profile.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct ReadinessData {
    exercise_type: Option<String>,
    form_quality: Option<f64>,
    name: Option<String>,
    age: Option<u32>,
    gender: Option<String>,
    training_years: Option<f64>,
    reps_per_minute: Option<f64>,
    consistency_score: Option<f64>,
    endurance_score: Option<f64>,
    power_output: Option<f64>,
    learning_rate_score: Option<f64>,
}

impl ReadinessData {
    fn into_profile(self) -> AthleteProfile {
        let d = AthleteProfile::default();
        AthleteProfile {
            name: self.name.unwrap_or(d.name),
            age: self.age.unwrap_or(d.age),
            gender: self.gender.unwrap_or(d.gender),
            primary_exercise: self.exercise_type.unwrap_or(d.primary_exercise),
            training_years: self.training_years.unwrap_or(d.training_years),
            reps_per_minute: self.reps_per_minute.unwrap_or(d.reps_per_minute),
            average_form_quality: self.form_quality.unwrap_or(d.average_form_quality),
            consistency_score: self.consistency_score.unwrap_or(d.consistency_score),
            endurance_score: self.endurance_score.unwrap_or(d.endurance_score),
            power_output: self.power_output.unwrap_or(d.power_output),
            learning_rate_score: self.learning_rate_score.unwrap_or(d.learning_rate_score),
        }
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct ReadinessRequest {
    performance_data: ReadinessData,
}

#[tracing::instrument(name = "http.olympic_readiness", skip(state))]
async fn olympic_readiness(
    State(state): State<AppState>,
    JsonBody(req): JsonBody<ReadinessRequest>,
) -> ApiResult {
    let profile = req.performance_data.into_profile();
    let report = state
        .readiness
        .generate_assessment_report(&profile)
        .map_err(|e| ApiError::Internal(e.to_string()))?;

    Ok(Json(json!({
        "success": true,
        "readiness_score": report.readiness_score,
        "category": report.category,
        "description": report.description,
        "percentile": report.percentile,
        "key_indicators": report.key_indicators,
        "development_path": report.development_path,
    })))
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct VoiceFeedbackRequest {
    current_metrics: CurrentMetrics,
}

#[tracing::instrument(name = "http.voice_feedback", skip_all)]
async fn voice_feedback(JsonBody(req): JsonBody<VoiceFeedbackRequest>) -> ApiResult {
    let fb = feedback::voice_feedback(&req.current_metrics);
    Ok(Json(json!({
        "success": true,
        "feedback_text": fb.feedback_text,
        "priority": fb.priority,
        "timestamp": chrono::Utc::now().timestamp_millis(),
    })))
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct EndSessionRequest {
    session_id: Option<String>,
}

#[tracing::instrument(name = "http.end_session", skip(state))]
async fn end_session(
    State(state): State<AppState>,
    JsonBody(req): JsonBody<EndSessionRequest>,
) -> ApiResult {
    let summary = state.sessions.end(req.session_id.as_deref())?;

    let mut body = json!({
        "success": true,
        "message": "Session ended successfully",
        "ended": summary.is_some(),
    });
    if let Some(summary) = summary {
        body["summary"] = serde_json::to_value(summary)
            .map_err(|e| ApiError::Internal(e.to_string()))?;
    }
    Ok(Json(body))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::frame::tests::png_data_url;
    use crate::frame::Frame;
    use crate::pose::{PoseDetector, PoseError};
    use async_trait::async_trait;
    use axum::body::{to_bytes, Body};
    use axum::http::{Request, StatusCode};
    use std::sync::Arc;
    use tower::ServiceExt;
    use trackconf::TrackConfig;

    struct FixedPose(Option<usize>);

    #[async_trait]
    impl PoseDetector for FixedPose {
        async fn detect(&self, _frame: &Frame) -> Result<Option<Vec<LandmarkRecord>>, PoseError> {
            Ok(self
                .0
                .map(|n| vec![LandmarkRecord::new(0.5, 0.5, 0.0, 0.9); n]))
        }

        fn name(&self) -> &'static str {
            "fixed"
        }
    }

    fn test_state() -> AppState {
        AppState::from_config(&TrackConfig::default()).unwrap()
    }

    async fn call(app: &Router, method: &str, uri: &str, body: Value) -> (StatusCode, Value) {
        let response = app
            .clone()
            .oneshot(
                Request::builder()
                    .method(method)
                    .uri(uri)
                    .header("content-type", "application/json")
                    .body(Body::from(body.to_string()))
                    .unwrap(),
            )
            .await
            .unwrap();
        let status = response.status();
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        (status, serde_json::from_slice(&bytes).unwrap())
    }

    #[tokio::test]
    async fn test_health() {
        let app = router(test_state());
        let response = app
            .oneshot(Request::builder().uri("/health").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        let body = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let json: Value = serde_json::from_slice(&body).unwrap();
        assert_eq!(json["status"], "healthy");
        assert_eq!(json["sessions"]["active"], 0);
        let ts = json["timestamp"].as_str().unwrap();
        assert!(chrono::DateTime::parse_from_rfc3339(ts).is_ok());
    }

    #[tokio::test]
    async fn test_start_session_defaults_to_pushup() {
        let app = router(test_state());
        let (status, json) = call(&app, "POST", "/start_session", json!({})).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(json["exercise_type"], "pushup");
        assert!(json["session_id"].as_str().unwrap().ends_with("_pushup"));
    }

    #[tokio::test]
    async fn test_start_session_unknown_exercise() {
        let app = router(test_state());
        let (status, json) =
            call(&app, "POST", "/start_session", json!({"exercise_type": "burpee"})).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(json["success"], false);
        assert!(json["error"].as_str().unwrap().contains("burpee"));
    }

    #[tokio::test]
    async fn test_analyze_pose_with_and_without_person() {
        let found = router(test_state().with_pose(Arc::new(FixedPose(Some(33)))));
        let (status, json) = call(
            &found,
            "POST",
            "/analyze_pose",
            json!({"image_data": png_data_url(8, 8)}),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(json["landmarks"].as_array().unwrap().len(), 33);
        assert_eq!(json["landmarks"][0]["visibility"], 0.9);
        assert_eq!(json["landmarks"][0]["x"], 0.5);
        assert_eq!(json["confidence"], 0.9);
        assert_eq!(json["frame_quality"], 85.0);

        let empty = router(test_state().with_pose(Arc::new(FixedPose(None))));
        let (_, json) = call(
            &empty,
            "POST",
            "/analyze_pose",
            json!({"image_data": png_data_url(8, 8)}),
        )
        .await;
        assert_eq!(json["landmarks"].as_array().unwrap().len(), 0);
        assert_eq!(json["confidence"], 0.0);
    }

    #[tokio::test]
    async fn test_analyze_pose_errors() {
        let app = router(test_state());
        let (status, _) = call(&app, "POST", "/analyze_pose", json!({})).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);

        let (status, json) =
            call(&app, "POST", "/analyze_pose", json!({"image_data": "no-comma"})).await;
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(json["success"], false);
    }

    #[tokio::test]
    async fn test_count_reps_requires_landmarks() {
        let app = router(test_state());
        call(&app, "POST", "/start_session", json!({})).await;
        let (status, json) = call(&app, "POST", "/count_reps", json!({"landmarks": []})).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(json["error"], "No landmarks provided");
    }

    #[tokio::test]
    async fn test_malformed_landmark_is_bad_request() {
        let app = router(test_state());
        call(&app, "POST", "/start_session", json!({})).await;
        let (status, json) = call(
            &app,
            "POST",
            "/count_reps",
            json!({"landmarks": [{"x": 0.1, "y": 0.2, "z": 0.0}]}),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(json["success"], false);
    }

    #[tokio::test]
    async fn test_readiness_defaults() {
        let app = router(test_state());
        let (status, json) = call(&app, "POST", "/olympic_readiness", json!({})).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(json["readiness_score"], 74.5);
        assert_eq!(json["category"], "Developing");
        assert_eq!(json["key_indicators"].as_array().unwrap().len(), 3);
        assert_eq!(json["development_path"].as_array().unwrap().len(), 2);
    }

    #[test]
    fn test_readiness_overrides() {
        let data = ReadinessData {
            form_quality: Some(50.0),
            age: Some(19),
            ..Default::default()
        };
        let profile = data.into_profile();
        assert_eq!(profile.average_form_quality, 50.0);
        assert_eq!(profile.age, 19);
        assert_eq!(profile.name, "SIH Athlete");
        assert_eq!(profile.primary_exercise, "pushup");
    }

    #[tokio::test]
    async fn test_predict_talent_caps_recommendations() {
        let app = router(test_state());
        let (status, json) = call(
            &app,
            "POST",
            "/predict_talent",
            json!({"performance_data": {
                "exercise_type": "squat",
                "form_quality": 40,
                "consistency_score": 45,
                "endurance_score": 50,
                "power_output": 55
            }}),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(json["recommendations"].as_array().unwrap().len(), 3);
        assert!(json["potential_predictions"]["1_year"].is_number());
    }

    #[tokio::test]
    async fn test_scorecard_uses_session_exercise() {
        let app = router(test_state());
        let (_, started) =
            call(&app, "POST", "/start_session", json!({"exercise_type": "squat"})).await;

        let (status, json) = call(
            &app,
            "POST",
            "/scorecard",
            json!({"session_id": started["session_id"]}),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(json["analysis"], "AI-analyzed performance for squat");
        assert_eq!(json["placeholder"], true);
    }

    #[tokio::test]
    async fn test_scorecard_unknown_session() {
        let app = router(test_state());
        let (status, json) = call(
            &app,
            "POST",
            "/scorecard",
            json!({"session_id": "session_0_deadbeef_squat"}),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(json["success"], false);
        assert!(json["error"].as_str().unwrap().contains("session_0_deadbeef_squat"));

        // An explicit exercise needs no session
        let (status, json) = call(
            &app,
            "POST",
            "/scorecard",
            json!({"exercise_type": "lunge", "session_id": "session_0_deadbeef_squat"}),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(json["analysis"], "AI-analyzed performance for lunge");
    }

    #[tokio::test]
    async fn test_voice_feedback() {
        let app = router(test_state());
        let (status, json) = call(
            &app,
            "POST",
            "/voice_feedback",
            json!({"current_metrics": {"rep_count": 10, "form_quality": 90}}),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(json["feedback_text"], "Great job! 10 reps completed");
        assert_eq!(json["priority"], "low");
        assert!(json["timestamp"].as_i64().unwrap() > 1_600_000_000_000);
    }

    #[tokio::test]
    async fn test_end_session_without_body() {
        let app = router(test_state());
        let response = app
            .oneshot(
                Request::builder()
                    .method("POST")
                    .uri("/end_session")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let body = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let json: Value = serde_json::from_slice(&body).unwrap();
        assert_eq!(json["ended"], false);
        assert_eq!(json["message"], "Session ended successfully");
    }

    #[tokio::test]
    async fn test_cors_preflight() {
        let app = app(test_state(), &InfraConfig::default());
        let response = app
            .oneshot(
                Request::builder()
                    .method("OPTIONS")
                    .uri("/count_reps")
                    .header("origin", "http://localhost:3004")
                    .header("access-control-request-method", "POST")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(
            response.headers().get("access-control-allow-origin").unwrap(),
            "http://localhost:3004"
        );
    }
}
