use std::sync::Arc;

use axum::{
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::post,
    Router,
};
use serde_json::{json, Value};
use tracing::{info, warn};

use super::scoring::CandidateScorer;
use super::{analyze, process, AnalysisReport, AnalysisRequest, CandidateVerdict};
use crate::domain::AtsSource;
use crate::status::{is_application_id, StatusUpdate, StatusUpdater};
use crate::transform::fields::Fields;

/// Scoring plus the optional BambooHR side channel.
pub struct AnalysisService {
    scorer: Box<dyn CandidateScorer>,
    status_updater: Option<StatusUpdater>,
    transitions_on_analyze: bool,
}

impl AnalysisService {
    pub fn new(scorer: impl CandidateScorer + 'static) -> Self {
        Self {
            scorer: Box::new(scorer),
            status_updater: None,
            transitions_on_analyze: false,
        }
    }

    pub fn with_status_updater(mut self, updater: StatusUpdater) -> Self {
        self.status_updater = Some(updater);
        self
    }

    /// Whether `/analyze` pushes proposed statuses upstream.
    pub fn apply_transitions_on_analyze(mut self, enabled: bool) -> Self {
        self.transitions_on_analyze = enabled;
        self
    }

    pub fn analyze(&self, request: &AnalysisRequest) -> AnalysisReport {
        analyze(request, self.scorer.as_ref())
    }

    pub fn process(&self, candidate: &Value) -> CandidateVerdict {
        process(candidate, self.scorer.as_ref())
    }

    pub async fn update_status(&self, application_id: &str, status_id: u32) -> Option<StatusUpdate> {
        let updater = self.status_updater.as_ref()?;
        Some(updater.update(application_id, status_id).await)
    }

    /// Sends each BambooHR application's proposed status, one at a time.
    /// Returns how many transitions were accepted.
    pub async fn apply_transitions(&self, report: &AnalysisReport) -> usize {
        let Some(updater) = self.status_updater.as_ref() else {
            return 0;
        };

        let mut applied = 0;
        for candidate in &report.candidates {
            let is_bamboohr = candidate
                .source
                .as_deref()
                .and_then(|source| source.parse::<AtsSource>().ok())
                == Some(AtsSource::BambooHr);
            let Some(application_id) = candidate.application_id.as_deref() else {
                continue;
            };
            if !is_bamboohr {
                continue;
            }

            if updater
                .update(application_id, candidate.proposed_status)
                .await
                .is_applied()
            {
                applied += 1;
            }
        }
        applied
    }
}

/// Router exposing the analysis and status-update endpoints.
pub fn analysis_router(service: Arc<AnalysisService>) -> Router {
    Router::new()
        .route("/analyze", post(analyze_handler))
        .route("/process", post(process_handler))
        .route("/bamboohr/update-status", post(update_status_handler))
        .with_state(service)
}

pub(crate) async fn analyze_handler(
    State(service): State<Arc<AnalysisService>>,
    axum::Json(request): axum::Json<AnalysisRequest>,
) -> Response {
    info!(
        profiles = request.profiles.len(),
        jobs = request.jobs.len(),
        applications = request.applications.len(),
        "analysis requested"
    );

    let report = service.analyze(&request);
    let transitions = if service.transitions_on_analyze {
        service.apply_transitions(&report).await
    } else {
        0
    };
    info!(
        analyzed = report.analyzed,
        grouped_jobs = report.grouped_jobs,
        transitions,
        "analysis complete"
    );

    (StatusCode::OK, axum::Json(report)).into_response()
}

/// Scores one candidate document sent as `{"data": {...}}`.
pub(crate) async fn process_handler(
    State(service): State<Arc<AnalysisService>>,
    axum::Json(body): axum::Json<Value>,
) -> Response {
    let Some(candidate) = body.get("data").filter(|data| !data.is_null()) else {
        let payload = json!({ "error": "Missing candidate data" });
        return (StatusCode::BAD_REQUEST, axum::Json(payload)).into_response();
    };

    let verdict = service.process(candidate);
    info!(
        candidate = %verdict.candidate,
        ai_score = verdict.ai_score,
        "single candidate processed"
    );
    (StatusCode::OK, axum::Json(verdict)).into_response()
}

pub(crate) async fn update_status_handler(
    State(service): State<Arc<AnalysisService>>,
    axum::Json(body): axum::Json<Value>,
) -> Response {
    let fields = Fields::new(&body);
    let application_id = fields
        .text("application_id")
        .filter(|id| is_application_id(id));
    let status_id = fields
        .text("status_id")
        .and_then(|raw| raw.parse::<u32>().ok())
        .filter(|id| *id > 0);

    let (Some(application_id), Some(status_id)) = (application_id, status_id) else {
        let payload = json!({
            "error": "application_id and status_id required",
        });
        return (StatusCode::BAD_REQUEST, axum::Json(payload)).into_response();
    };

    match service.update_status(&application_id, status_id).await {
        Some(update @ StatusUpdate::Applied { .. }) => {
            (StatusCode::OK, axum::Json(update)).into_response()
        }
        Some(update) => (StatusCode::BAD_GATEWAY, axum::Json(update)).into_response(),
        None => {
            warn!(%application_id, "status update requested but no BambooHR token configured");
            let payload = json!({
                "success": false,
                "error": "status updates are not configured",
            });
            (StatusCode::SERVICE_UNAVAILABLE, axum::Json(payload)).into_response()
        }
    }
}
