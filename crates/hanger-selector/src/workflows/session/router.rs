use std::sync::Arc;

use axum::{
    extract::{Path, Query, State},
    http::{header, StatusCode},
    response::{IntoResponse, Response},
    routing::{get, post, put},
    Json, Router,
};
use chrono::Utc;
use serde::Deserialize;
use serde_json::{json, Value};

use super::domain::{FieldChangeView, SearchView, SelectorSession, SessionId};
use super::repository::SessionRepository;
use super::service::{EntryUpdate, SelectorSessionService, SessionServiceError};
use crate::workflows::catalog::CandidateService;
use crate::workflows::configuration::{jurisdiction, FieldOutcome};
use crate::workflows::job_list::EntryId;

type SharedService<R, C> = Arc<SelectorSessionService<R, C>>;

/// Router builder exposing session, job list and jurisdiction endpoints.
pub fn session_router<R, C>(service: SharedService<R, C>) -> Router
where
    R: SessionRepository + 'static,
    C: CandidateService + 'static,
{
    Router::new()
        .route("/api/v1/sessions", post(create_handler::<R, C>))
        .route("/api/v1/sessions/:session_id", get(session_handler::<R, C>))
        .route(
            "/api/v1/sessions/:session_id/fields/:field",
            put(field_handler::<R, C>),
        )
        .route(
            "/api/v1/sessions/:session_id/jurisdiction",
            put(jurisdiction_handler::<R, C>),
        )
        .route(
            "/api/v1/sessions/:session_id/language",
            put(language_handler::<R, C>),
        )
        .route(
            "/api/v1/sessions/:session_id/reset",
            post(reset_handler::<R, C>),
        )
        .route(
            "/api/v1/sessions/:session_id/search",
            post(search_handler::<R, C>),
        )
        .route(
            "/api/v1/sessions/:session_id/job-list",
            post(add_entry_handler::<R, C>),
        )
        .route(
            "/api/v1/sessions/:session_id/job-list/export",
            get(export_handler::<R, C>),
        )
        .route(
            "/api/v1/sessions/:session_id/job-list/:entry_id",
            axum::routing::patch(update_entry_handler::<R, C>).delete(remove_entry_handler::<R, C>),
        )
        .route(
            "/api/v1/sessions/:session_id/job-list/:entry_id/duplicate",
            post(duplicate_entry_handler::<R, C>),
        )
        .route("/api/v1/jurisdictions", get(jurisdictions_handler))
        .route("/api/v1/jurisdictions/:key", get(jurisdiction_lookup_handler))
        .with_state(service)
}

#[derive(Debug, Default, Deserialize)]
pub(crate) struct CreateSessionRequest {
    #[serde(default)]
    jurisdiction: Option<String>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct FieldValueRequest {
    #[serde(default)]
    value: Value,
}

#[derive(Debug, Deserialize)]
pub(crate) struct JurisdictionRequest {
    key: String,
    #[serde(default)]
    reset_language: bool,
}

#[derive(Debug, Deserialize)]
pub(crate) struct LanguageRequest {
    code: String,
}

#[derive(Debug, Deserialize)]
pub(crate) struct AddEntryRequest {
    candidate_id: String,
    #[serde(default)]
    job_label: Option<String>,
    #[serde(default)]
    quantity: Option<i64>,
}

#[derive(Debug, Default, Deserialize)]
pub(crate) struct ExportQuery {
    #[serde(default)]
    format: Option<String>,
}

pub(crate) async fn create_handler<R, C>(
    State(service): State<SharedService<R, C>>,
    Json(request): Json<CreateSessionRequest>,
) -> Response
where
    R: SessionRepository + 'static,
    C: CandidateService + 'static,
{
    match service.create(request.jurisdiction.as_deref()) {
        Ok(session) => (StatusCode::CREATED, Json(session.view())).into_response(),
        Err(error) => error_response(error),
    }
}

pub(crate) async fn session_handler<R, C>(
    State(service): State<SharedService<R, C>>,
    Path(session_id): Path<String>,
) -> Response
where
    R: SessionRepository + 'static,
    C: CandidateService + 'static,
{
    match service.get(&SessionId(session_id)) {
        Ok(session) => (StatusCode::OK, Json(session.view())).into_response(),
        Err(error) => error_response(error),
    }
}

pub(crate) async fn field_handler<R, C>(
    State(service): State<SharedService<R, C>>,
    Path((session_id, field)): Path<(String, String)>,
    Json(request): Json<FieldValueRequest>,
) -> Response
where
    R: SessionRepository + 'static,
    C: CandidateService + 'static,
{
    let raw = match request.value {
        Value::String(text) => text,
        Value::Null => String::new(),
        other => other.to_string(),
    };
    field_change_response(service.set_field(&SessionId(session_id), &field, &raw))
}

pub(crate) async fn jurisdiction_handler<R, C>(
    State(service): State<SharedService<R, C>>,
    Path(session_id): Path<String>,
    Json(request): Json<JurisdictionRequest>,
) -> Response
where
    R: SessionRepository + 'static,
    C: CandidateService + 'static,
{
    field_change_response(service.change_jurisdiction(
        &SessionId(session_id),
        &request.key,
        request.reset_language,
    ))
}

pub(crate) async fn language_handler<R, C>(
    State(service): State<SharedService<R, C>>,
    Path(session_id): Path<String>,
    Json(request): Json<LanguageRequest>,
) -> Response
where
    R: SessionRepository + 'static,
    C: CandidateService + 'static,
{
    field_change_response(service.set_language(&SessionId(session_id), &request.code))
}

pub(crate) async fn reset_handler<R, C>(
    State(service): State<SharedService<R, C>>,
    Path(session_id): Path<String>,
) -> Response
where
    R: SessionRepository + 'static,
    C: CandidateService + 'static,
{
    match service.reset(&SessionId(session_id)) {
        Ok(session) => (StatusCode::OK, Json(session.spec_view())).into_response(),
        Err(error) => error_response(error),
    }
}

pub(crate) async fn search_handler<R, C>(
    State(service): State<SharedService<R, C>>,
    Path(session_id): Path<String>,
) -> Response
where
    R: SessionRepository + 'static,
    C: CandidateService + 'static,
{
    match service.search(&SessionId(session_id)).await {
        Ok(outcome) => (StatusCode::OK, Json(SearchView::from(outcome))).into_response(),
        Err(error) => error_response(error),
    }
}

pub(crate) async fn add_entry_handler<R, C>(
    State(service): State<SharedService<R, C>>,
    Path(session_id): Path<String>,
    Json(request): Json<AddEntryRequest>,
) -> Response
where
    R: SessionRepository + 'static,
    C: CandidateService + 'static,
{
    match service.add_to_job_list(
        &SessionId(session_id),
        &request.candidate_id,
        request.job_label,
        request.quantity,
    ) {
        Ok(entry) => {
            let payload = json!({ "entry_id": entry.id, "entry": entry });
            (StatusCode::CREATED, Json(payload)).into_response()
        }
        Err(error) => error_response(error),
    }
}

pub(crate) async fn update_entry_handler<R, C>(
    State(service): State<SharedService<R, C>>,
    Path((session_id, entry_id)): Path<(String, String)>,
    Json(update): Json<EntryUpdate>,
) -> Response
where
    R: SessionRepository + 'static,
    C: CandidateService + 'static,
{
    let Some(entry_id) = parse_entry_id(&entry_id) else {
        return invalid_entry_id(&entry_id);
    };
    match service.update_entry(&SessionId(session_id), entry_id, update) {
        Ok(entry) => (StatusCode::OK, Json(entry)).into_response(),
        Err(error) => error_response(error),
    }
}

pub(crate) async fn duplicate_entry_handler<R, C>(
    State(service): State<SharedService<R, C>>,
    Path((session_id, entry_id)): Path<(String, String)>,
) -> Response
where
    R: SessionRepository + 'static,
    C: CandidateService + 'static,
{
    let Some(entry_id) = parse_entry_id(&entry_id) else {
        return invalid_entry_id(&entry_id);
    };
    match service.duplicate_entry(&SessionId(session_id), entry_id) {
        Ok(entry) => (StatusCode::CREATED, Json(entry)).into_response(),
        Err(error) => error_response(error),
    }
}

pub(crate) async fn remove_entry_handler<R, C>(
    State(service): State<SharedService<R, C>>,
    Path((session_id, entry_id)): Path<(String, String)>,
) -> Response
where
    R: SessionRepository + 'static,
    C: CandidateService + 'static,
{
    let Some(entry_id) = parse_entry_id(&entry_id) else {
        return invalid_entry_id(&entry_id);
    };
    match service.remove_entry(&SessionId(session_id), entry_id) {
        Ok(_) => StatusCode::NO_CONTENT.into_response(),
        Err(error) => error_response(error),
    }
}

pub(crate) async fn export_handler<R, C>(
    State(service): State<SharedService<R, C>>,
    Path(session_id): Path<String>,
    Query(query): Query<ExportQuery>,
) -> Response
where
    R: SessionRepository + 'static,
    C: CandidateService + 'static,
{
    let export = match service.export(&SessionId(session_id), Utc::now()) {
        Ok(export) => export,
        Err(error) => return error_response(error),
    };

    let wants_csv = query
        .format
        .as_deref()
        .is_some_and(|format| format.eq_ignore_ascii_case("csv"));
    if !wants_csv {
        return (StatusCode::OK, Json(export)).into_response();
    }

    match export.to_csv_string() {
        Ok(csv) => (
            StatusCode::OK,
            [(header::CONTENT_TYPE, "text/csv; charset=utf-8")],
            csv,
        )
            .into_response(),
        Err(error) => {
            let payload = json!({ "error": error.to_string() });
            (StatusCode::INTERNAL_SERVER_ERROR, Json(payload)).into_response()
        }
    }
}

pub(crate) async fn jurisdictions_handler() -> Response {
    let profiles: Vec<_> = jurisdiction::profiles()
        .iter()
        .chain(std::iter::once(jurisdiction::fallback()))
        .collect();
    (StatusCode::OK, Json(profiles)).into_response()
}

/// Unknown keys answer with the fallback profile, flagged as such.
pub(crate) async fn jurisdiction_lookup_handler(Path(key): Path<String>) -> Response {
    let matched = jurisdiction::find(&key).is_some();
    let profile = jurisdiction::resolve(&key);
    let payload = json!({
        "requested": key,
        "matched": matched,
        "profile": profile,
    });
    (StatusCode::OK, Json(payload)).into_response()
}

fn field_change_response(
    result: Result<(FieldOutcome, SelectorSession), SessionServiceError>,
) -> Response {
    match result {
        Ok((outcome, session)) => {
            let view = FieldChangeView {
                outcome,
                spec: session.spec_view(),
            };
            (StatusCode::OK, Json(view)).into_response()
        }
        Err(error) => error_response(error),
    }
}

fn parse_entry_id(raw: &str) -> Option<EntryId> {
    raw.parse().ok()
}

fn invalid_entry_id(raw: &str) -> Response {
    let payload = json!({ "error": format!("'{raw}' is not a job list entry id") });
    (StatusCode::BAD_REQUEST, Json(payload)).into_response()
}

pub(crate) fn error_response(error: SessionServiceError) -> Response {
    let status = error.status_code();
    let payload = json!({ "error": error.to_string() });
    (status, Json(payload)).into_response()
}
