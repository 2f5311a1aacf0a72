//! REST API handlers
//!
//! Every response uses the `{ success, data?, error? }` envelope.

use std::collections::BTreeMap;

use axum::{
    extract::{rejection::JsonRejection, Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{delete, get, post, put},
    Json, Router,
};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::error::{Error, ErrorCategory, HielErrorTrait};
use crate::models::{
    Assignment, Assignments, AttendanceRecord, EventType, Member, OptionTally, RosterRecord,
    RosterStatus, ServiceRecord, Song, Survey, SurveyAnswer,
};
use crate::scheduler::{
    parse_answer, parse_date, parse_month, parse_position, service_week_number,
    setlist_week_number, MonthView, SchedulerError,
};
use crate::session::Session;
use crate::store::Stored;
use crate::team::CalendarDay;

use super::server::AppState;

// ============================================================================
// API Response Types
// ============================================================================

/// Generic API response wrapper
#[derive(Debug, Serialize)]
pub struct ApiResponse<T: Serialize> {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl<T: Serialize> ApiResponse<T> {
    pub fn success(data: T) -> Self {
        Self {
            success: true,
            data: Some(data),
            error: None,
        }
    }
}

/// Simple error response
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub success: bool,
    pub error: String,
}

impl ErrorResponse {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            success: false,
            error: message.into(),
        }
    }
}

/// Error returned from handlers, mapped to a status by category
#[derive(Debug)]
pub struct ApiError {
    status: StatusCode,
    message: String,
}

impl ApiError {
    pub fn not_found(message: impl Into<String>) -> Self {
        Self {
            status: StatusCode::NOT_FOUND,
            message: message.into(),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        (self.status, Json(ErrorResponse::new(self.message))).into_response()
    }
}

impl From<Error> for ApiError {
    fn from(err: Error) -> Self {
        let status = if err.is_not_found() {
            StatusCode::NOT_FOUND
        } else {
            match err.category() {
                ErrorCategory::Validation => StatusCode::BAD_REQUEST,
                ErrorCategory::Session => StatusCode::FORBIDDEN,
                _ => StatusCode::INTERNAL_SERVER_ERROR,
            }
        };

        if status.is_server_error() {
            tracing::error!(error = %err, "Request failed");
        }

        Self {
            status,
            message: err.to_string(),
        }
    }
}

impl From<SchedulerError> for ApiError {
    fn from(err: SchedulerError) -> Self {
        Error::from(err).into()
    }
}

/// Unreadable request bodies keep the error envelope
impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        tracing::debug!(error = %rejection.body_text(), "Request body rejected");
        Self {
            status: rejection.status(),
            message: rejection.body_text(),
        }
    }
}

type ApiResult<T> = Result<Json<ApiResponse<T>>, ApiError>;

/// JSON body extractor whose rejection is mapped by [`ApiError`]
type JsonBody<T> = Result<Json<T>, JsonRejection>;

/// Health check response
#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
    pub uptime_secs: u64,
    pub backend: String,
}

/// Week numbers for one date
#[derive(Debug, Serialize)]
pub struct WeekResponse {
    pub date: NaiveDate,
    pub service_week: u32,
    pub setlist_week: u32,
}

/// Availability answer from a member
#[derive(Debug, Deserialize)]
pub struct AttendanceRequest {
    pub member_id: String,
    pub member_name: String,
    pub date: String,
    #[serde(default)]
    pub event_type: Option<String>,
    pub status: String,
}

/// Roster save; keys are position names, `null` leaves a slot unassigned
#[derive(Debug, Deserialize)]
pub struct RosterRequest {
    #[serde(default)]
    pub assignments: BTreeMap<String, Option<Assignment>>,
    #[serde(default)]
    pub status: Option<String>,
}

/// Sign in as a member
#[derive(Debug, Deserialize)]
pub struct SignInRequest {
    pub member_id: String,
}

/// The signed-in profile
#[derive(Debug, Serialize)]
pub struct SessionResponse {
    pub id: String,
    pub email: String,
    pub display_name: String,
    pub is_team_leader: bool,
    pub is_anonymous: bool,
}

impl From<&Session> for SessionResponse {
    fn from(session: &Session) -> Self {
        let user = session.user();
        Self {
            id: user.id.clone(),
            email: user.email.clone(),
            display_name: user.display_name.clone(),
            is_team_leader: user.is_team_leader,
            is_anonymous: session.is_anonymous(),
        }
    }
}

/// Answers keyed by question id
#[derive(Debug, Deserialize)]
pub struct SurveyResponseRequest {
    pub answers: BTreeMap<String, SurveyAnswer>,
}

/// Free-text search
#[derive(Debug, Default, Deserialize)]
pub struct SearchParams {
    #[serde(default)]
    pub q: String,
}

/// Id of a removed record
#[derive(Debug, Serialize)]
pub struct DeletedResponse {
    pub id: String,
}

// ============================================================================
// API Routes
// ============================================================================

/// Create the API router
pub fn create_router(state: AppState) -> Router {
    Router::new()
        // Health endpoints
        .route("/api/health", get(health_check))
        // Week classifier
        .route("/api/weeks/{date}", get(get_week))
        // Scheduler
        .route("/api/months/{year_month}", get(get_month))
        .route("/api/attendance", put(put_attendance))
        .route("/api/rosters/{date}", get(get_roster).put(put_roster))
        .route("/api/rosters/{date}/available/{position}", get(get_available))
        // Session
        .route(
            "/api/session",
            get(get_session).post(sign_in).delete(sign_out),
        )
        // Directory
        .route("/api/members", get(list_members))
        .route("/api/members/{id}", delete(delete_member))
        // Boards
        .route("/api/announcements/{id}", delete(delete_announcement))
        .route("/api/prayers/{id}", delete(delete_prayer))
        .route("/api/setlists/{id}", delete(delete_setlist))
        // Library, minutes, calendar, archive
        .route("/api/songs", get(search_songs))
        .route("/api/songs/{id}", delete(delete_song))
        .route("/api/meetings/{id}", delete(delete_meeting))
        .route("/api/surveys", get(list_surveys))
        .route("/api/surveys/{id}", delete(delete_survey))
        .route("/api/surveys/{id}/responses", post(respond_survey))
        .route("/api/surveys/{id}/tally/{question_id}", get(tally_survey))
        .route("/api/calendar/{date}", get(get_calendar_day))
        .route("/api/events/{id}", delete(delete_event))
        .route("/api/service-records", get(search_service_records))
        .route("/api/service-records/{id}", delete(delete_service_record))
        .with_state(state)
}

fn today() -> NaiveDate {
    chrono::Local::now().date_naive()
}

// ============================================================================
// Health Handlers
// ============================================================================

async fn health_check(State(state): State<AppState>) -> impl IntoResponse {
    Json(ApiResponse::success(HealthResponse {
        status: "healthy".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        uptime_secs: state.start_time.elapsed().as_secs(),
        backend: state.store.backend_name().to_string(),
    }))
}

// ============================================================================
// Scheduler Handlers
// ============================================================================

async fn get_week(Path(date): Path<String>) -> ApiResult<WeekResponse> {
    let date = parse_date(&date)?;
    Ok(Json(ApiResponse::success(WeekResponse {
        date,
        service_week: service_week_number(date),
        setlist_week: setlist_week_number(date),
    })))
}

async fn get_month(
    State(state): State<AppState>,
    Path(year_month): Path<String>,
) -> ApiResult<MonthView> {
    let year_month = parse_month(&year_month)?;
    let view = state.scheduler.view_month(year_month).await?;
    Ok(Json(ApiResponse::success(view)))
}

async fn put_attendance(
    State(state): State<AppState>,
    body: JsonBody<AttendanceRequest>,
) -> ApiResult<Stored<AttendanceRecord>> {
    let Json(request) = body?;
    let date = parse_date(&request.date)?;
    let status = parse_answer(&request.status)?;
    let event_type = match request.event_type.as_deref() {
        None => EventType::default(),
        Some(raw) => raw
            .parse()
            .map_err(|e: String| Error::validation(e))?,
    };

    let record = state
        .scheduler
        .set_availability(
            &request.member_id,
            &request.member_name,
            date,
            event_type,
            status,
        )
        .await?;
    Ok(Json(ApiResponse::success(record)))
}

async fn get_roster(
    State(state): State<AppState>,
    Path(date): Path<String>,
) -> ApiResult<Stored<RosterRecord>> {
    let date = parse_date(&date)?;
    match state.scheduler.get_roster(date).await? {
        Some(roster) => Ok(Json(ApiResponse::success(roster))),
        None => Err(ApiError::not_found(format!("No roster for {date}"))),
    }
}

async fn put_roster(
    State(state): State<AppState>,
    Path(date): Path<String>,
    body: JsonBody<RosterRequest>,
) -> ApiResult<Stored<RosterRecord>> {
    let Json(request) = body?;
    let date = parse_date(&date)?;
    let status = match request.status.as_deref() {
        None => RosterStatus::default(),
        Some(raw) => raw.parse().map_err(|e: String| Error::validation(e))?,
    };

    let mut assignments = Assignments::new();
    for (name, assignment) in request.assignments {
        let position = parse_position(&name)?;
        if let Some(assignment) = assignment {
            assignments.insert(position, assignment);
        }
    }

    let roster = state
        .scheduler
        .save_assignments(date, assignments, status)
        .await?;
    Ok(Json(ApiResponse::success(roster)))
}

async fn get_available(
    State(state): State<AppState>,
    Path((date, position)): Path<(String, String)>,
) -> ApiResult<Vec<String>> {
    let date = parse_date(&date)?;
    let position = parse_position(&position)?;
    let names = state
        .scheduler
        .get_available_members(date, position)
        .await?
        .into_iter()
        .map(|m| m.value.name)
        .collect();
    Ok(Json(ApiResponse::success(names)))
}

// ============================================================================
// Directory Handlers
// ============================================================================

async fn list_members(State(state): State<AppState>) -> ApiResult<Vec<Stored<Member>>> {
    let members = state.team.members.list().await?;
    Ok(Json(ApiResponse::success(members)))
}

async fn delete_member(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ApiResult<DeletedResponse> {
    let session = state.session().await;
    state.team.members.delete(&session, &id).await?;
    Ok(Json(ApiResponse::success(DeletedResponse { id })))
}

// ============================================================================
// Session Handlers
// ============================================================================

async fn get_session(State(state): State<AppState>) -> ApiResult<SessionResponse> {
    let session = state.session().await;
    Ok(Json(ApiResponse::success(SessionResponse::from(&session))))
}

async fn sign_in(
    State(state): State<AppState>,
    body: JsonBody<SignInRequest>,
) -> ApiResult<SessionResponse> {
    let Json(request) = body?;
    let member = state
        .team
        .members
        .get(&request.member_id)
        .await?
        .ok_or_else(|| ApiError::not_found(format!("No member '{}'", request.member_id)))?;

    let session = state.sign_in(&member, today()).await.map_err(Error::from)?;
    Ok(Json(ApiResponse::success(SessionResponse::from(&session))))
}

async fn sign_out(State(state): State<AppState>) -> ApiResult<SessionResponse> {
    let session = state.sign_out().await.map_err(Error::from)?;
    Ok(Json(ApiResponse::success(SessionResponse::from(&session))))
}

// ============================================================================
// Board Handlers
// ============================================================================

async fn delete_announcement(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ApiResult<DeletedResponse> {
    let session = state.session().await;
    state.team.announcements.delete(&session, &id).await?;
    Ok(Json(ApiResponse::success(DeletedResponse { id })))
}

async fn delete_prayer(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ApiResult<DeletedResponse> {
    let session = state.session().await;
    state.team.prayers.delete(&session, &id).await?;
    Ok(Json(ApiResponse::success(DeletedResponse { id })))
}

async fn delete_setlist(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ApiResult<DeletedResponse> {
    let session = state.session().await;
    state.team.setlists.delete(&session, &id).await?;
    Ok(Json(ApiResponse::success(DeletedResponse { id })))
}

// ============================================================================
// Library, Minutes, Calendar and Archive Handlers
// ============================================================================

async fn search_songs(
    State(state): State<AppState>,
    Query(params): Query<SearchParams>,
) -> ApiResult<Vec<Stored<Song>>> {
    let songs = state.team.songs.search(&params.q).await?;
    Ok(Json(ApiResponse::success(songs)))
}

async fn delete_song(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ApiResult<DeletedResponse> {
    let session = state.session().await;
    state.team.songs.delete(&session, &id).await?;
    Ok(Json(ApiResponse::success(DeletedResponse { id })))
}

async fn delete_meeting(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ApiResult<DeletedResponse> {
    let session = state.session().await;
    state.team.meetings.delete(&session, &id).await?;
    Ok(Json(ApiResponse::success(DeletedResponse { id })))
}

async fn list_surveys(State(state): State<AppState>) -> ApiResult<Vec<Stored<Survey>>> {
    let surveys = state.team.surveys.list().await?;
    Ok(Json(ApiResponse::success(surveys)))
}

async fn respond_survey(
    State(state): State<AppState>,
    Path(id): Path<String>,
    body: JsonBody<SurveyResponseRequest>,
) -> ApiResult<Stored<Survey>> {
    let Json(request) = body?;
    let session = state.session().await;
    let survey = state
        .team
        .surveys
        .respond(&session, &id, request.answers, today())
        .await?;
    Ok(Json(ApiResponse::success(survey)))
}

async fn tally_survey(
    State(state): State<AppState>,
    Path((id, question_id)): Path<(String, String)>,
) -> ApiResult<Vec<OptionTally>> {
    let tally = state.team.surveys.tally(&id, &question_id).await?;
    Ok(Json(ApiResponse::success(tally)))
}

async fn delete_survey(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ApiResult<DeletedResponse> {
    let session = state.session().await;
    state.team.surveys.delete(&session, &id).await?;
    Ok(Json(ApiResponse::success(DeletedResponse { id })))
}

async fn get_calendar_day(
    State(state): State<AppState>,
    Path(date): Path<String>,
) -> ApiResult<CalendarDay> {
    let date = parse_date(&date)?;
    let day = state.team.events.day(date).await?;
    Ok(Json(ApiResponse::success(day)))
}

async fn delete_event(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ApiResult<DeletedResponse> {
    let session = state.session().await;
    state.team.events.delete(&session, &id).await?;
    Ok(Json(ApiResponse::success(DeletedResponse { id })))
}

async fn search_service_records(
    State(state): State<AppState>,
    Query(params): Query<SearchParams>,
) -> ApiResult<Vec<Stored<ServiceRecord>>> {
    let records = state.team.archive.search(&params.q).await?;
    Ok(Json(ApiResponse::success(records)))
}

async fn delete_service_record(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ApiResult<DeletedResponse> {
    let session = state.session().await;
    state.team.archive.delete(&session, &id).await?;
    Ok(Json(ApiResponse::success(DeletedResponse { id })))
}
