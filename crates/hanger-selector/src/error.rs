use crate::config::ConfigError;
use crate::telemetry::TelemetryError;
use crate::workflows::session::SessionServiceError;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde_json::json;
use std::fmt;

#[derive(Debug)]
pub enum AppError {
    Config(ConfigError),
    Telemetry(TelemetryError),
    Io(std::io::Error),
    Server(axum::Error),
    Session(SessionServiceError),
}

impl fmt::Display for AppError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AppError::Config(err) => write!(f, "configuration error: {}", err),
            AppError::Telemetry(err) => write!(f, "telemetry error: {}", err),
            AppError::Io(err) => write!(f, "io error: {}", err),
            AppError::Server(err) => write!(f, "server error: {}", err),
            AppError::Session(err) => write!(f, "session error: {}", err),
        }
    }
}

impl std::error::Error for AppError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            AppError::Config(err) => Some(err),
            AppError::Telemetry(err) => Some(err),
            AppError::Io(err) => Some(err),
            AppError::Server(err) => Some(err),
            AppError::Session(err) => Some(err),
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = match &self {
            AppError::Session(err) => err.status_code(),
            AppError::Config(_)
            | AppError::Telemetry(_)
            | AppError::Io(_)
            | AppError::Server(_) => StatusCode::INTERNAL_SERVER_ERROR,
        };

        let body = Json(json!({ "error": self.to_string() }));
        (status, body).into_response()
    }
}

impl From<ConfigError> for AppError {
    fn from(value: ConfigError) -> Self {
        Self::Config(value)
    }
}

impl From<TelemetryError> for AppError {
    fn from(value: TelemetryError) -> Self {
        Self::Telemetry(value)
    }
}

impl From<std::io::Error> for AppError {
    fn from(value: std::io::Error) -> Self {
        Self::Io(value)
    }
}

impl From<axum::Error> for AppError {
    fn from(value: axum::Error) -> Self {
        Self::Server(value)
    }
}

impl From<SessionServiceError> for AppError {
    fn from(value: SessionServiceError) -> Self {
        Self::Session(value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::workflows::job_list::{EntryId, JobListError};
    use crate::workflows::session::router::error_response;
    use crate::workflows::session::{RepositoryError, SessionId};

    #[test]
    fn session_errors_map_to_client_statuses() {
        let missing: AppError =
            SessionServiceError::UnknownSession(SessionId("sess-000001".to_string())).into();
        assert_eq!(missing.into_response().status(), StatusCode::NOT_FOUND);

        let invalid: AppError = SessionServiceError::JobList(JobListError::InvalidQuantity(0)).into();
        assert_eq!(invalid.into_response().status(), StatusCode::BAD_REQUEST);

        let offline: AppError =
            SessionServiceError::Repository(RepositoryError::Unavailable("down".to_string())).into();
        assert_eq!(offline.into_response().status(), StatusCode::INTERNAL_SERVER_ERROR);
    }

    #[test]
    fn session_statuses_match_the_session_router() {
        let cases: [(fn() -> SessionServiceError, StatusCode); 3] = [
            (
                || SessionServiceError::JobList(JobListError::UnknownEntry(EntryId(7))),
                StatusCode::NOT_FOUND,
            ),
            (
                || SessionServiceError::Repository(RepositoryError::Conflict),
                StatusCode::CONFLICT,
            ),
            (
                || SessionServiceError::UnknownCandidate("hu26".to_string()),
                StatusCode::BAD_REQUEST,
            ),
        ];

        for (error, expected) in cases {
            assert_eq!(error_response(error()).status(), expected);
            assert_eq!(AppError::from(error()).into_response().status(), expected);
        }
    }

    #[test]
    fn io_errors_keep_their_source() {
        let error: AppError = std::io::Error::new(std::io::ErrorKind::AddrInUse, "port busy").into();
        assert_eq!(error.to_string(), "io error: port busy");
        assert!(std::error::Error::source(&error).is_some());
    }
}
