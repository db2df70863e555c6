use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use serde::Serialize;
use tracing::{debug, info, warn};

use super::{Candidate, CandidateService, CatalogError, SearchRequest};
use crate::workflows::configuration::{jurisdiction, ConnectionSpec};

/// Sequence number handed out when a search starts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(transparent)]
pub struct SearchTicket(u64);

impl SearchTicket {
    pub fn sequence(self) -> u64 {
        self.0
    }
}

/// Per-session record of the latest search issued.
#[derive(Debug, Default)]
pub struct SearchTracker {
    latest: AtomicU64,
}

impl SearchTracker {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn issue(&self) -> SearchTicket {
        SearchTicket(self.latest.fetch_add(1, Ordering::SeqCst) + 1)
    }

    pub fn is_current(&self, ticket: SearchTicket) -> bool {
        self.latest.load(Ordering::SeqCst) == ticket.0
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum SearchOutcome {
    Completed {
        ticket: SearchTicket,
        candidates: Vec<Candidate>,
    },
    /// A newer search was issued while this one was in flight.
    Stale { ticket: SearchTicket },
    Failed {
        ticket: SearchTicket,
        message: String,
    },
}

impl SearchOutcome {
    pub fn ticket(&self) -> SearchTicket {
        match self {
            Self::Completed { ticket, .. } | Self::Stale { ticket } | Self::Failed { ticket, .. } => {
                *ticket
            }
        }
    }

    /// Candidates to display; empty for failed and stale searches.
    pub fn candidates(&self) -> &[Candidate] {
        match self {
            Self::Completed { candidates, .. } => candidates,
            Self::Stale { .. } | Self::Failed { .. } => &[],
        }
    }

    pub fn is_failed(&self) -> bool {
        matches!(self, Self::Failed { .. })
    }

    pub fn is_stale(&self) -> bool {
        matches!(self, Self::Stale { .. })
    }
}

/// Runs catalog searches so that only the newest request per tracker is observed.
pub struct SearchCoordinator<C> {
    catalog: Arc<C>,
    timeout: Duration,
}

impl<C> SearchCoordinator<C>
where
    C: CandidateService + 'static,
{
    pub fn new(catalog: Arc<C>, timeout: Duration) -> Self {
        Self { catalog, timeout }
    }

    pub async fn search(&self, tracker: &SearchTracker, spec: &ConnectionSpec) -> SearchOutcome {
        let ticket = tracker.issue();

        let missing = spec.missing_for_search();
        if !missing.is_empty() {
            let fields = missing
                .iter()
                .map(|field| field.name())
                .collect::<Vec<_>>()
                .join(", ");
            return SearchOutcome::Failed {
                ticket,
                message: format!("specification incomplete: {fields}"),
            };
        }

        let profile = jurisdiction::resolve(&spec.jurisdiction);
        let request = SearchRequest::new(spec.clone(), profile);
        let result = match tokio::time::timeout(self.timeout, self.catalog.search(request)).await {
            Ok(result) => result,
            Err(_) => Err(CatalogError::TimedOut(self.timeout.as_millis())),
        };

        if !tracker.is_current(ticket) {
            debug!(ticket = ticket.sequence(), "discarding superseded search response");
            return SearchOutcome::Stale { ticket };
        }

        match result {
            Ok(candidates) => {
                info!(
                    ticket = ticket.sequence(),
                    jurisdiction = profile.id,
                    candidates = candidates.len(),
                    "catalog search completed"
                );
                SearchOutcome::Completed { ticket, candidates }
            }
            Err(error) => {
                warn!(ticket = ticket.sequence(), %error, "catalog search failed");
                SearchOutcome::Failed {
                    ticket,
                    message: error.to_string(),
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::workflows::catalog::CostTier;
    use crate::workflows::configuration::{ConnectionSpecStore, ConnectionType, FieldUpdate};
    use std::sync::atomic::AtomicUsize;
    use tokio::sync::Notify;

    fn candidate(id: &str) -> Candidate {
        Candidate {
            id: id.to_string(),
            model: id.to_uppercase(),
            cost_tier: CostTier::Lowest,
            rated_load: "1,000 lbs".to_string(),
            material: "18 ga".to_string(),
            face_fastener_descriptor: None,
            joist_fastener_descriptor: None,
        }
    }

    fn ready_spec(label: &str) -> ConnectionSpec {
        let mut store = ConnectionSpecStore::new("USA");
        store.apply([
            FieldUpdate::ConnectionType(Some(ConnectionType::Joist)),
            FieldUpdate::JobLabel(label.to_string()),
        ]);
        store.into_spec()
    }

    /// Answers with a candidate named after the job label; `slow` waits for a release.
    #[derive(Default)]
    struct GatedCatalog {
        release: Notify,
        calls: AtomicUsize,
    }

    impl CandidateService for GatedCatalog {
        async fn search(&self, request: SearchRequest) -> Result<Vec<Candidate>, CatalogError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            if request.spec.job_label == "slow" {
                self.release.notified().await;
            }
            Ok(vec![candidate(&request.spec.job_label)])
        }
    }

    struct FailingCatalog;

    impl CandidateService for FailingCatalog {
        async fn search(&self, _request: SearchRequest) -> Result<Vec<Candidate>, CatalogError> {
            Err(CatalogError::Unavailable("offline".to_string()))
        }
    }

    struct HangingCatalog;

    impl CandidateService for HangingCatalog {
        async fn search(&self, _request: SearchRequest) -> Result<Vec<Candidate>, CatalogError> {
            std::future::pending::<()>().await;
            Ok(Vec::new())
        }
    }

    #[test]
    fn tracker_issues_increasing_tickets() {
        let tracker = SearchTracker::new();
        let first = tracker.issue();
        let second = tracker.issue();
        assert!(second > first);
        assert!(!tracker.is_current(first));
        assert!(tracker.is_current(second));
    }

    #[tokio::test]
    async fn only_the_latest_search_is_observed() {
        let catalog = Arc::new(GatedCatalog::default());
        let coordinator = SearchCoordinator::new(catalog.clone(), Duration::from_secs(5));
        let tracker = SearchTracker::new();
        let slow = ready_spec("slow");
        let fast = ready_spec("fast");

        let (first, second) = tokio::join!(coordinator.search(&tracker, &slow), async {
            let outcome = coordinator.search(&tracker, &fast).await;
            catalog.release.notify_one();
            outcome
        });

        assert!(first.is_stale(), "first search should be discarded: {first:?}");
        assert!(first.candidates().is_empty());
        match second {
            SearchOutcome::Completed { candidates, .. } => {
                assert_eq!(candidates, vec![candidate("fast")]);
            }
            other => panic!("expected completed search, got {other:?}"),
        }
        assert_eq!(catalog.calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn incomplete_spec_fails_without_calling_the_catalog() {
        let catalog = Arc::new(GatedCatalog::default());
        let coordinator = SearchCoordinator::new(catalog.clone(), Duration::from_secs(5));
        let tracker = SearchTracker::new();
        let spec = ConnectionSpecStore::new("USA").into_spec();

        let outcome = coordinator.search(&tracker, &spec).await;

        match &outcome {
            SearchOutcome::Failed { message, .. } => assert!(message.contains("connection_type")),
            other => panic!("expected failure, got {other:?}"),
        }
        assert!(outcome.candidates().is_empty());
        assert_eq!(catalog.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn catalog_errors_become_failed_outcomes() {
        let coordinator = SearchCoordinator::new(Arc::new(FailingCatalog), Duration::from_secs(5));
        let tracker = SearchTracker::new();

        let outcome = coordinator.search(&tracker, &ready_spec("any")).await;

        assert!(outcome.is_failed());
        assert!(outcome.candidates().is_empty());
    }

    #[tokio::test]
    async fn searches_past_the_timeout_fail() {
        let coordinator =
            SearchCoordinator::new(Arc::new(HangingCatalog), Duration::from_millis(20));
        let tracker = SearchTracker::new();

        let outcome = coordinator.search(&tracker, &ready_spec("any")).await;

        match outcome {
            SearchOutcome::Failed { message, .. } => assert!(message.contains("20 ms")),
            other => panic!("expected timeout failure, got {other:?}"),
        }
    }
}
