use crate::infra::AppState;
use axum::http::{header, StatusCode};
use axum::response::IntoResponse;
use axum::Extension;
use axum::Json;
use hanger_selector::workflows::catalog::CandidateService;
use hanger_selector::workflows::session::{
    session_router, SelectorSessionService, SessionRepository,
};
use serde_json::json;
use std::sync::Arc;

pub(crate) fn with_session_routes<R, C>(service: Arc<SelectorSessionService<R, C>>) -> axum::Router
where
    R: SessionRepository + 'static,
    C: CandidateService + 'static,
{
    session_router(service)
        .route("/health", axum::routing::get(healthcheck))
        .route("/ready", axum::routing::get(readiness_endpoint))
        .route("/metrics", axum::routing::get(metrics_endpoint))
}

pub(crate) async fn healthcheck() -> Json<serde_json::Value> {
    Json(json!({ "status": "ok" }))
}

pub(crate) async fn readiness_endpoint(Extension(state): Extension<AppState>) -> impl IntoResponse {
    let ready = state.readiness.load(std::sync::atomic::Ordering::Relaxed);
    let status = if ready {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    };

    let payload = if ready {
        json!({ "status": "ready" })
    } else {
        json!({ "status": "initializing" })
    };

    (status, Json(payload))
}

pub(crate) async fn metrics_endpoint(Extension(state): Extension<AppState>) -> impl IntoResponse {
    (
        StatusCode::OK,
        [(header::CONTENT_TYPE, "text/plain; version=0.0.4")],
        state.metrics.render(),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::infra::{InMemoryCandidateCatalog, InMemorySessionRepository};
    use axum::body::Body;
    use axum::http::Request;
    use hanger_selector::config::SelectorConfig;
    use tower::ServiceExt;

    fn app() -> axum::Router {
        let service = SelectorSessionService::new(
            Arc::new(InMemorySessionRepository::default()),
            Arc::new(InMemoryCandidateCatalog),
            &SelectorConfig::default(),
        );
        with_session_routes(Arc::new(service))
    }

    async fn json_body(response: axum::response::Response) -> serde_json::Value {
        let bytes = axum::body::to_bytes(response.into_body(), 1 << 20)
            .await
            .expect("read body");
        serde_json::from_slice(&bytes).expect("json payload")
    }

    #[tokio::test]
    async fn health_route_reports_ok() {
        let response = app()
            .oneshot(Request::get("/health").body(Body::empty()).expect("request"))
            .await
            .expect("route executes");

        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(json_body(response).await["status"], "ok");
    }

    #[tokio::test]
    async fn session_routes_are_mounted_next_to_service_routes() {
        let router = app();
        let created = router
            .clone()
            .oneshot(
                Request::post("/api/v1/sessions")
                    .header(header::CONTENT_TYPE, "application/json")
                    .body(Body::from(r#"{"jurisdiction":"NZ"}"#))
                    .expect("request"),
            )
            .await
            .expect("route executes");
        assert_eq!(created.status(), StatusCode::CREATED);
        let session = json_body(created).await;
        assert_eq!(session["spec"]["jurisdiction"], "NZL");
        assert_eq!(session["profile"]["design_standard"], "NZS AS 1720.1");

        let id = session["session_id"].as_str().expect("session id");
        let response = router
            .oneshot(
                Request::put(format!("/api/v1/sessions/{id}/fields/connection_type"))
                    .header(header::CONTENT_TYPE, "application/json")
                    .body(Body::from(r#"{"value":"Multi-Truss"}"#))
                    .expect("request"),
            )
            .await
            .expect("route executes");
        assert_eq!(json_body(response).await["spec"]["connection_type"], "Multi-Truss");
    }
}
