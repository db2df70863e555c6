use hanger_selector::workflows::catalog::{
    Candidate, CandidateService, CatalogError, CostTier, SearchRequest,
};
use hanger_selector::workflows::configuration::{ConnectionType, HangerType};
use hanger_selector::workflows::session::{
    RepositoryError, SelectorSession, SessionId, SessionRepository,
};
use metrics_exporter_prometheus::PrometheusHandle;
use std::collections::HashMap;
use std::sync::atomic::AtomicBool;
use std::sync::{Arc, Mutex};

#[derive(Clone)]
pub(crate) struct AppState {
    pub(crate) readiness: Arc<AtomicBool>,
    pub(crate) metrics: Arc<PrometheusHandle>,
}

#[derive(Default, Clone)]
pub(crate) struct InMemorySessionRepository {
    sessions: Arc<Mutex<HashMap<SessionId, SelectorSession>>>,
}

impl SessionRepository for InMemorySessionRepository {
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
        if guard.contains_key(&session.id) {
            guard.insert(session.id.clone(), session);
            Ok(())
        } else {
            Err(RepositoryError::NotFound)
        }
    }

    fn fetch(&self, id: &SessionId) -> Result<Option<SelectorSession>, RepositoryError> {
        let guard = self.sessions.lock().expect("repository mutex poisoned");
        Ok(guard.get(id).cloned())
    }
}

/// Canned connector data standing in for the remote catalog.
struct CatalogItem {
    id: &'static str,
    model: &'static str,
    hanger_type: HangerType,
    connection_types: &'static [ConnectionType],
    unit_cost_cents: u32,
    rated_load: &'static str,
    material: &'static str,
    face_fasteners: Option<&'static str>,
    joist_fasteners: Option<&'static str>,
}

const JOIST: &[ConnectionType] = &[ConnectionType::Joist];
const TRUSS: &[ConnectionType] = &[ConnectionType::Truss, ConnectionType::MultiTruss];
const ANY: &[ConnectionType] = &[
    ConnectionType::Joist,
    ConnectionType::Truss,
    ConnectionType::MultiTruss,
];

const CATALOG: &[CatalogItem] = &[
    CatalogItem {
        id: "lus26",
        model: "LUS26",
        hanger_type: HangerType::FaceMount,
        connection_types: JOIST,
        unit_cost_cents: 189,
        rated_load: "1,040 lbs",
        material: "18 ga G90",
        face_fasteners: Some("(4) 10d (0.148\" x 3\" Common)"),
        joist_fasteners: Some("(4) 10d (0.148\" x 3\" Common)"),
    },
    CatalogItem {
        id: "hu26",
        model: "HU26",
        hanger_type: HangerType::FaceMount,
        connection_types: ANY,
        unit_cost_cents: 212,
        rated_load: "1,165 lbs",
        material: "14 ga G90",
        face_fasteners: Some("(6) 10HDG (0.148\" x 3\" HDG 10d Common)"),
        joist_fasteners: Some("(4) N10 (0.148\" x 1 1/2\" HDG)"),
    },
    CatalogItem {
        id: "hus26",
        model: "HUS26",
        hanger_type: HangerType::FaceMount,
        connection_types: ANY,
        unit_cost_cents: 298,
        rated_load: "1,550 lbs",
        material: "16 ga G90",
        face_fasteners: Some("(14) 16d / (0.162in x 3 1/2in Common)"),
        joist_fasteners: Some("(6) 16d / (0.162in x 3 1/2in Common)"),
    },
    CatalogItem {
        id: "lbv1.56/5.5",
        model: "LBV1.56/5.5",
        hanger_type: HangerType::TopFlange,
        connection_types: JOIST,
        unit_cost_cents: 356,
        rated_load: "1,330 lbs",
        material: "14 ga G90",
        face_fasteners: Some("(6) 10d<br/>(0.148\" x 3\" Common)"),
        joist_fasteners: None,
    },
    CatalogItem {
        id: "htu26",
        model: "HTU26",
        hanger_type: HangerType::FaceMount,
        connection_types: TRUSS,
        unit_cost_cents: 341,
        rated_load: "2,205 lbs",
        material: "16 ga G90",
        face_fasteners: Some("(20) 10DX1.5 (0.148\" x 1 1/2\")"),
        joist_fasteners: Some("(14) 10DX1.5 (0.148\" x 1 1/2\")"),
    },
    CatalogItem {
        id: "hcu4-sds",
        model: "HCU4 SDS",
        hanger_type: HangerType::ConcealedFlange,
        connection_types: TRUSS,
        unit_cost_cents: 1245,
        rated_load: "4,120 lbs",
        material: "12 ga G185",
        face_fasteners: Some("(8) SDS25212 (1/4\" x 2 1/2\")"),
        joist_fasteners: Some("(6) SDS25212 (1/4\" x 2 1/2\")"),
    },
];

/// In-process catalog returning the canned items that fit a connection spec, cheapest first.
#[derive(Default, Clone)]
pub(crate) struct InMemoryCandidateCatalog;

impl InMemoryCandidateCatalog {
    fn matching(request: &SearchRequest) -> Vec<&'static CatalogItem> {
        let Some(connection_type) = request.spec.connection_type else {
            return Vec::new();
        };
        let mut items: Vec<_> = CATALOG
            .iter()
            .filter(|item| item.connection_types.contains(&connection_type))
            .filter(|item| {
                request.spec.hanger_type == HangerType::AllTypes
                    || request.spec.hanger_type == item.hanger_type
            })
            .collect();
        items.sort_by_key(|item| item.unit_cost_cents);
        items
    }
}

impl CandidateService for InMemoryCandidateCatalog {
    async fn search(&self, request: SearchRequest) -> Result<Vec<Candidate>, CatalogError> {
        let items = Self::matching(&request);
        let Some(baseline) = items.first().map(|item| u64::from(item.unit_cost_cents)) else {
            return Ok(Vec::new());
        };

        Ok(items
            .into_iter()
            .map(|item| {
                let extra = u64::from(item.unit_cost_cents) - baseline;
                let percent = (extra * 100 + baseline / 2) / baseline;
                let cost_tier = match u16::try_from(percent) {
                    Ok(0) => CostTier::Lowest,
                    Ok(percent) => CostTier::Delta(percent),
                    Err(_) => CostTier::Delta(u16::MAX),
                };
                Candidate {
                    id: item.id.to_string(),
                    model: item.model.to_string(),
                    cost_tier,
                    rated_load: item.rated_load.to_string(),
                    material: item.material.to_string(),
                    face_fastener_descriptor: item.face_fasteners.map(str::to_string),
                    joist_fastener_descriptor: item.joist_fasteners.map(str::to_string),
                }
            })
            .collect())
    }
}
