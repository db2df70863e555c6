use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use axum::body::Body;
use axum::http::{header, Request};
use axum::response::Response;
use serde_json::Value;
use tokio::sync::Notify;

use crate::config::SelectorConfig;
use crate::workflows::catalog::{
    Candidate, CandidateService, CatalogError, CostTier, SearchRequest,
};
use crate::workflows::session::domain::{SelectorSession, SessionId};
use crate::workflows::session::repository::{RepositoryError, SessionRepository};
use crate::workflows::session::{session_router, SelectorSessionService};

pub(super) fn hu26() -> Candidate {
    Candidate {
        id: "hu26".to_string(),
        model: "HU26".to_string(),
        cost_tier: CostTier::Lowest,
        rated_load: "1,165 lbs".to_string(),
        material: "14 ga G90".to_string(),
        face_fastener_descriptor: Some(r#"(6) 10HDG (0.148" x 3" HDG 10d Common)"#.to_string()),
        joist_fastener_descriptor: None,
    }
}

pub(super) fn lus26() -> Candidate {
    Candidate {
        id: "lus26".to_string(),
        model: "LUS26".to_string(),
        cost_tier: CostTier::Delta(12),
        rated_load: "1,040 lbs".to_string(),
        material: "18 ga G90".to_string(),
        face_fastener_descriptor: Some(r#"(4) N10 (0.148" x 1 1/2" HDG)"#.to_string()),
        joist_fastener_descriptor: None,
    }
}

pub(super) fn selector_config() -> SelectorConfig {
    SelectorConfig {
        default_jurisdiction: "USA".to_string(),
        search_timeout: Duration::from_secs(5),
    }
}

/// Catalog answering every search with the same two candidates.
#[derive(Default)]
pub(super) struct StaticCatalog {
    pub(super) calls: AtomicUsize,
}

impl CandidateService for StaticCatalog {
    async fn search(&self, _request: SearchRequest) -> Result<Vec<Candidate>, CatalogError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Ok(vec![hu26(), lus26()])
    }
}

/// The first search waits for `release`; later searches answer at once.
/// Each answer carries a candidate id naming the call that produced it.
#[derive(Default)]
pub(super) struct GatedCatalog {
    pub(super) release: Notify,
    calls: AtomicUsize,
}

impl CandidateService for GatedCatalog {
    async fn search(&self, _request: SearchRequest) -> Result<Vec<Candidate>, CatalogError> {
        let call = self.calls.fetch_add(1, Ordering::SeqCst);
        if call == 0 {
            self.release.notified().await;
        }
        let mut candidate = hu26();
        candidate.id = format!("call-{call}");
        Ok(vec![candidate])
    }
}

pub(super) struct OfflineCatalog;

impl CandidateService for OfflineCatalog {
    async fn search(&self, _request: SearchRequest) -> Result<Vec<Candidate>, CatalogError> {
        Err(CatalogError::Unavailable("catalog offline".to_string()))
    }
}

#[derive(Default, Clone)]
pub(super) struct MemoryRepository {
    pub(super) sessions: Arc<Mutex<HashMap<SessionId, SelectorSession>>>,
}

impl SessionRepository for MemoryRepository {
    fn insert(&self, session: SelectorSession) -> Result<SelectorSession, RepositoryError> {
        let mut guard = self.sessions.lock().expect("repository mutex poisoned");
        if guard.contains_key(&session.id) {
            return Err(RepositoryError::Conflict);
        }
        guard.insert(session.id.clone(), session.clone());
        Ok(session)
    }

    fn update(&self, session: SelectorSession) -> Result<(), RepositoryError> {
        let mut guard = self.sessions.lock().expect("repository mutex poisoned");
        guard.insert(session.id.clone(), session);
        Ok(())
    }

    fn fetch(&self, id: &SessionId) -> Result<Option<SelectorSession>, RepositoryError> {
        let guard = self.sessions.lock().expect("repository mutex poisoned");
        Ok(guard.get(id).cloned())
    }
}

pub(super) struct UnavailableRepository;

impl SessionRepository for UnavailableRepository {
    fn insert(&self, _session: SelectorSession) -> Result<SelectorSession, RepositoryError> {
        Err(RepositoryError::Unavailable("database offline".to_string()))
    }

    fn update(&self, _session: SelectorSession) -> Result<(), RepositoryError> {
        Err(RepositoryError::Unavailable("database offline".to_string()))
    }

    fn fetch(&self, _id: &SessionId) -> Result<Option<SelectorSession>, RepositoryError> {
        Err(RepositoryError::Unavailable("database offline".to_string()))
    }
}

pub(super) fn build_service<C>(
    catalog: Arc<C>,
) -> (SelectorSessionService<MemoryRepository, C>, Arc<MemoryRepository>)
where
    C: CandidateService + 'static,
{
    let repository = Arc::new(MemoryRepository::default());
    let service = SelectorSessionService::new(repository.clone(), catalog, &selector_config());
    (service, repository)
}

pub(super) fn static_router() -> axum::Router {
    let (service, _) = build_service(Arc::new(StaticCatalog::default()));
    session_router(Arc::new(service))
}

pub(super) fn json_request(method: &str, uri: &str, body: Value) -> Request<Body> {
    Request::builder()
        .method(method)
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(body.to_string()))
        .expect("request builds")
}

pub(super) fn empty_request(method: &str, uri: &str) -> Request<Body> {
    Request::builder()
        .method(method)
        .uri(uri)
        .body(Body::empty())
        .expect("request builds")
}

pub(super) async fn read_body(response: Response) -> String {
    let body = axum::body::to_bytes(response.into_body(), 1 << 20)
        .await
        .expect("read body");
    String::from_utf8(body.to_vec()).expect("utf-8 body")
}

pub(super) async fn read_json_body(response: Response) -> Value {
    serde_json::from_str(&read_body(response).await).expect("json payload")
}
