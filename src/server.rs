use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::{delete, get, post, put};
use axum::{Json, Router};
use log::{error, info};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::sync::Arc;
use tokio::sync::Mutex;
use tokio::task::{JoinError, spawn_blocking};

use crate::config::Config;
use crate::data::{LabSubject, SchedulingInput, SchedulingOutput, Slot, TeacherId, TheorySubject};
use crate::grid::ScheduleGrid;
use crate::labs::LabConflict;
use crate::planner::{Planner, PlannerError, TeacherStatus};
use crate::solver::{self, GenerationError, OptimizerConfig};
use crate::validator::{Violation, validate};

/// Shared handler state. Workspace mutations are serialized by the mutex.
#[derive(Clone)]
pub struct AppState {
    planner: Arc<Mutex<Planner>>,
    defaults: OptimizerConfig,
}

impl AppState {
    pub fn new(defaults: OptimizerConfig) -> Self {
        Self {
            planner: Arc::new(Mutex::new(Planner::new(defaults))),
            defaults,
        }
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct ErrorBody {
    error: String,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    conflicts: Vec<LabConflict>,
}

/// Error response: a status code and a JSON body.
#[derive(Debug)]
pub struct ApiError {
    status: StatusCode,
    body: ErrorBody,
}

impl ApiError {
    fn new(status: StatusCode, error: impl ToString) -> Self {
        Self {
            status,
            body: ErrorBody {
                error: error.to_string(),
                conflicts: Vec::new(),
            },
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        (self.status, Json(self.body)).into_response()
    }
}

impl From<GenerationError> for ApiError {
    fn from(err: GenerationError) -> Self {
        let status = match &err {
            GenerationError::LabConflicts(_) => StatusCode::CONFLICT,
            GenerationError::InvalidIterations { .. } | GenerationError::InvalidInput(_) => {
                StatusCode::BAD_REQUEST
            }
            GenerationError::NoCandidate => StatusCode::UNPROCESSABLE_ENTITY,
        };
        let mut api = ApiError::new(status, &err);
        if let GenerationError::LabConflicts(conflicts) = err {
            api.body.conflicts = conflicts;
        }
        api
    }
}

impl From<PlannerError> for ApiError {
    fn from(err: PlannerError) -> Self {
        let status = match err {
            PlannerError::Generation(inner) => return inner.into(),
            PlannerError::UnknownSubject(_) => StatusCode::NOT_FOUND,
            PlannerError::InvalidSubject(_) => StatusCode::BAD_REQUEST,
            PlannerError::DuplicateSubject(_)
            | PlannerError::AlreadyConfirmed(_)
            | PlannerError::NotConfirmed(_)
            | PlannerError::Registry(_) => StatusCode::CONFLICT,
            PlannerError::NothingConfirmed => StatusCode::UNPROCESSABLE_ENTITY,
        };
        ApiError::new(status, err)
    }
}

impl From<JoinError> for ApiError {
    fn from(err: JoinError) -> Self {
        error!("Generation task failed: {}", err);
        ApiError::new(StatusCode::INTERNAL_SERVER_ERROR, "generation task failed")
    }
}

type ApiResult<T> = Result<Json<T>, ApiError>;

// Optimizer runs are CPU-bound and go to the blocking pool.
async fn solve_handler(
    State(state): State<AppState>,
    Json(input): Json<SchedulingInput>,
) -> ApiResult<SchedulingOutput> {
    let defaults = state.defaults;
    let output = spawn_blocking(move || solver::solve(&input, &defaults)).await??;
    Ok(Json(output))
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ValidateRequest {
    grid: ScheduleGrid,
    theory: Vec<TheorySubject>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct ValidateResponse {
    satisfied: bool,
    violations: Vec<Violation>,
}

async fn validate_handler(Json(req): Json<ValidateRequest>) -> Json<ValidateResponse> {
    let violations = validate(&req.grid, &req.theory);
    Json(ValidateResponse {
        satisfied: violations.is_empty(),
        violations,
    })
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GenerateRequest {
    #[serde(default)]
    seed: Option<u64>,
    #[serde(default)]
    iterations: Option<usize>,
}

async fn generate_handler(
    State(state): State<AppState>,
    Json(req): Json<GenerateRequest>,
) -> ApiResult<SchedulingOutput> {
    let mut planner = state.planner.clone().lock_owned().await;
    let output = spawn_blocking(move || planner.generate(req.seed, req.iterations)).await??;
    Ok(Json(output))
}

async fn add_theory_handler(
    State(state): State<AppState>,
    Json(subject): Json<TheorySubject>,
) -> Result<StatusCode, ApiError> {
    state.planner.lock().await.add_theory_subject(subject)?;
    Ok(StatusCode::CREATED)
}

async fn add_lab_handler(
    State(state): State<AppState>,
    Json(lab): Json<LabSubject>,
) -> Result<StatusCode, ApiError> {
    state.planner.lock().await.add_lab_subject(lab)?;
    Ok(StatusCode::CREATED)
}

async fn remove_subject_handler(
    State(state): State<AppState>,
    Path(name): Path<String>,
) -> Result<StatusCode, ApiError> {
    state.planner.lock().await.remove_subject(&name)?;
    Ok(StatusCode::NO_CONTENT)
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct AssignRequest {
    subject: String,
    teacher_id: TeacherId,
}

async fn assign_handler(
    State(state): State<AppState>,
    Json(req): Json<AssignRequest>,
) -> ApiResult<TeacherStatus> {
    let mut planner = state.planner.lock().await;
    planner.assign_teacher(&req.subject, &req.teacher_id)?;
    Ok(Json(planner.teacher(&req.teacher_id)))
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct UnassignRequest {
    subject: String,
}

async fn unassign_handler(
    State(state): State<AppState>,
    Json(req): Json<UnassignRequest>,
) -> ApiResult<TeacherStatus> {
    let mut planner = state.planner.lock().await;
    let teacher = planner.unassign_teacher(&req.subject)?;
    Ok(Json(planner.teacher(&teacher)))
}

async fn teacher_handler(
    State(state): State<AppState>,
    Path(teacher): Path<TeacherId>,
) -> Json<TeacherStatus> {
    Json(state.planner.lock().await.teacher(&teacher))
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct ExclusionsResponse {
    teacher_id: TeacherId,
    slots: Vec<Slot>,
}

async fn exclusions_handler(
    State(state): State<AppState>,
    Path(teacher): Path<TeacherId>,
    Json(slots): Json<HashSet<Slot>>,
) -> Json<ExclusionsResponse> {
    let mut planner = state.planner.lock().await;
    planner.set_exclusions(&teacher, slots);
    let mut slots: Vec<Slot> = planner
        .exclusions(&teacher)
        .map(|set| set.iter().copied().collect())
        .unwrap_or_default();
    slots.sort();
    Json(ExclusionsResponse {
        teacher_id: teacher,
        slots,
    })
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/v1/schedule/solve", post(solve_handler))
        .route("/v1/schedule/validate", post(validate_handler))
        .route("/v1/schedule/generate", post(generate_handler))
        .route("/v1/subjects/theory", post(add_theory_handler))
        .route("/v1/subjects/lab", post(add_lab_handler))
        .route("/v1/subjects/:name", delete(remove_subject_handler))
        .route("/v1/teachers/assign", post(assign_handler))
        .route("/v1/teachers/unassign", post(unassign_handler))
        .route("/v1/teachers/:id", get(teacher_handler))
        .route("/v1/teachers/:id/exclusions", put(exclusions_handler))
        .with_state(state)
}

pub async fn run_server(config: &Config) -> std::io::Result<()> {
    let app = router(AppState::new(config.optimizer()));

    let listener = tokio::net::TcpListener::bind(config.addr).await?;
    info!("Server running at http://{}", listener.local_addr()?);

    axum::serve(listener, app).await
}
