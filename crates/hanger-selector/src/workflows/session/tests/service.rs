use super::common::*;
use std::sync::atomic::Ordering;
use std::sync::Arc;

use chrono::Utc;

use crate::workflows::catalog::SearchOutcome;
use crate::workflows::configuration::{FieldOutcome, LanguageMode, SpecFieldError};
use crate::workflows::job_list::{EntryId, JobListError};
use crate::workflows::session::domain::SessionId;
use crate::workflows::session::repository::{RepositoryError, SessionRepository};
use crate::workflows::session::{EntryUpdate, SelectorSessionService, SessionServiceError};

#[test]
fn create_uses_requested_or_configured_jurisdiction() {
    let (service, _) = build_service(Arc::new(StaticCatalog::default()));

    let default = service.create(None).expect("session created");
    assert_eq!(default.store.snapshot().jurisdiction, "USA");

    let germany = service.create(Some("Germany")).expect("session created");
    assert_eq!(germany.store.snapshot().jurisdiction, "DEU");
    assert_eq!(germany.store.snapshot().language, "de");
    assert_ne!(default.id, germany.id);
}

#[test]
fn get_reports_unknown_sessions() {
    let (service, _) = build_service(Arc::new(StaticCatalog::default()));

    match service.get(&SessionId("sess-missing".to_string())) {
        Err(SessionServiceError::UnknownSession(id)) => assert_eq!(id.0, "sess-missing"),
        other => panic!("expected unknown session, got {other:?}"),
    }
}

#[test]
fn repository_failures_propagate() {
    let service = SelectorSessionService::new(
        Arc::new(UnavailableRepository),
        Arc::new(StaticCatalog::default()),
        &selector_config(),
    );

    assert!(matches!(
        service.create(None),
        Err(SessionServiceError::Repository(RepositoryError::Unavailable(_)))
    ));
}

#[test]
fn field_edits_are_persisted_with_their_outcome() {
    let (service, repository) = build_service(Arc::new(StaticCatalog::default()));
    let session = service.create(None).expect("session created");

    let (outcome, _) = service
        .set_field(&session.id, "quantity", "-3")
        .expect("known field");
    assert!(matches!(outcome, FieldOutcome::Coerced { .. }));

    let stored = repository
        .fetch(&session.id)
        .expect("fetch succeeds")
        .expect("session present");
    assert_eq!(stored.store.snapshot().quantity, 1);

    match service.set_field(&session.id, "colour", "red") {
        Err(SessionServiceError::Field(SpecFieldError::UnknownField(name))) => {
            assert_eq!(name, "colour")
        }
        other => panic!("expected unknown field, got {other:?}"),
    }
}

#[test]
fn manual_language_survives_jurisdiction_changes_until_reset() {
    let (service, _) = build_service(Arc::new(StaticCatalog::default()));
    let session = service.create(Some("USA")).expect("session created");

    service.set_language(&session.id, "fr").expect("language set");
    let (_, changed) = service
        .change_jurisdiction(&session.id, "Poland", false)
        .expect("jurisdiction changed");
    assert_eq!(changed.store.snapshot().language, "fr");
    assert_eq!(changed.store.language_mode(), LanguageMode::Manual);

    let (_, released) = service
        .change_jurisdiction(&session.id, "Poland", true)
        .expect("jurisdiction changed");
    assert_eq!(released.store.snapshot().language, "pl");
    assert_eq!(released.store.language_mode(), LanguageMode::Auto);
}

#[tokio::test]
async fn incomplete_spec_search_fails_and_clears_results() {
    let catalog = Arc::new(StaticCatalog::default());
    let (service, _) = build_service(catalog.clone());
    let session = service.create(None).expect("session created");

    let outcome = service.search(&session.id).await.expect("search runs");

    assert!(outcome.is_failed());
    assert_eq!(catalog.calls.load(Ordering::SeqCst), 0);
    let stored = service.get(&session.id).expect("session present");
    assert!(stored.results.is_empty());
    assert!(stored.last_search.as_ref().is_some_and(|summary| summary.failed));
}

#[tokio::test]
async fn failed_catalog_yields_empty_results() {
    let (service, _) = build_service(Arc::new(OfflineCatalog));
    let session = service.create(None).expect("session created");
    service
        .set_field(&session.id, "connection_type", "Joist")
        .expect("known field");

    let outcome = service.search(&session.id).await.expect("search runs");

    match outcome {
        SearchOutcome::Failed { message, .. } => assert!(message.contains("offline")),
        other => panic!("expected failure, got {other:?}"),
    }
    assert!(service.get(&session.id).expect("present").results.is_empty());
}

#[tokio::test]
async fn newest_search_wins_across_requests() {
    let catalog = Arc::new(GatedCatalog::default());
    let (service, _) = build_service(catalog.clone());
    let session = service.create(None).expect("session created");
    service
        .set_field(&session.id, "connection_type", "Truss")
        .expect("known field");

    let (first, second) = tokio::join!(service.search(&session.id), async {
        let outcome = service.search(&session.id).await;
        catalog.release.notify_one();
        outcome
    });

    assert!(first.expect("first search runs").is_stale());
    assert!(matches!(
        second.expect("second search runs"),
        SearchOutcome::Completed { .. }
    ));
    let stored = service.get(&session.id).expect("present");
    assert_eq!(stored.results.len(), 1);
    assert_eq!(stored.results[0].id, "call-1");
}

#[tokio::test]
async fn job_list_totals_follow_entry_quantities() {
    let (service, _) = build_service(Arc::new(StaticCatalog::default()));
    let session = service.create(None).expect("session created");
    service
        .set_field(&session.id, "connection_type", "Joist")
        .expect("known field");
    service.search(&session.id).await.expect("search runs");

    let heavy = service
        .add_to_job_list(&session.id, "hu26", None, None)
        .expect("candidate accepted");
    service
        .add_to_job_list(&session.id, "lus26", Some("Deck".to_string()), Some(1))
        .expect("candidate accepted");
    assert_eq!(heavy.job_label, "Job 1");

    let totals = service.get(&session.id).expect("present").job_list.totals();
    assert_eq!(totals.count_for("10HDG"), 6);
    assert_eq!(totals.count_for("N10"), 4);

    service
        .update_entry(
            &session.id,
            heavy.id,
            EntryUpdate {
                quantity: Some(2),
                ..EntryUpdate::default()
            },
        )
        .expect("entry updated");
    let export = service.export(&session.id, Utc::now()).expect("export");
    let ten_hdg = export
        .totals
        .iter()
        .find(|line| line.key.spec_code == "10HDG")
        .expect("10HDG total");
    assert_eq!(ten_hdg.count, 12);
    let n10 = export
        .totals
        .iter()
        .find(|line| line.key.spec_code == "N10")
        .expect("N10 total");
    assert_eq!(n10.count, 4);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn concurrent_edits_keep_every_acknowledged_entry() {
    let (service, _) = build_service(Arc::new(StaticCatalog::default()));
    let session = service.create(None).expect("session created");
    service
        .set_field(&session.id, "connection_type", "Joist")
        .expect("known field");
    service.search(&session.id).await.expect("search runs");

    let runtime = tokio::runtime::Handle::current();
    let service = &service;
    let id = &session.id;
    let acknowledged: Vec<EntryId> = std::thread::scope(|scope| {
        let searcher = scope.spawn(move || {
            for _ in 0..20 {
                runtime
                    .block_on(service.search(id))
                    .expect("search runs");
            }
        });
        let workers: Vec<_> = (0..8)
            .map(|_| {
                scope.spawn(move || {
                    (0..100)
                        .map(|_| {
                            service
                                .add_to_job_list(id, "hu26", None, None)
                                .expect("candidate accepted")
                                .id
                        })
                        .collect::<Vec<_>>()
                })
            })
            .collect();
        searcher.join().expect("searcher finishes");
        workers
            .into_iter()
            .flat_map(|worker| worker.join().expect("worker finishes"))
            .collect()
    });

    let stored = service.get(&session.id).expect("present").job_list;
    assert_eq!(stored.len(), 800);
    let unique: std::collections::HashSet<_> = acknowledged.iter().copied().collect();
    assert_eq!(unique.len(), 800, "entry ids are never handed out twice");
    assert!(acknowledged.iter().all(|id| stored.get(*id).is_some()));
    assert_eq!(stored.totals().count_for("10HDG"), 6 * 800);
}

#[tokio::test]
async fn entries_outlive_later_searches() {
    let (service, _) = build_service(Arc::new(StaticCatalog::default()));
    let session = service.create(None).expect("session created");
    service
        .set_field(&session.id, "connection_type", "Joist")
        .expect("known field");
    service.search(&session.id).await.expect("search runs");
    let entry = service
        .add_to_job_list(&session.id, "hu26", None, None)
        .expect("candidate accepted");

    service
        .set_field(&session.id, "connection_type", "")
        .expect("known field");
    service.search(&session.id).await.expect("search runs");

    let stored = service.get(&session.id).expect("present");
    assert!(stored.results.is_empty());
    assert_eq!(stored.job_list.get(entry.id).map(|e| e.candidate.model.as_str()), Some("HU26"));
}

#[tokio::test]
async fn job_list_edits_report_domain_errors() {
    let (service, _) = build_service(Arc::new(StaticCatalog::default()));
    let session = service.create(None).expect("session created");

    assert!(matches!(
        service.add_to_job_list(&session.id, "hu26", None, None),
        Err(SessionServiceError::UnknownCandidate(_))
    ));

    service
        .set_field(&session.id, "connection_type", "Joist")
        .expect("known field");
    service.search(&session.id).await.expect("search runs");
    let entry = service
        .add_to_job_list(&session.id, "hu26", None, Some(3))
        .expect("candidate accepted");

    let invalid = service.update_entry(
        &session.id,
        entry.id,
        EntryUpdate {
            quantity: Some(0),
            ..EntryUpdate::default()
        },
    );
    assert!(matches!(
        invalid,
        Err(SessionServiceError::JobList(JobListError::InvalidQuantity(0)))
    ));
    let stored = service.get(&session.id).expect("present");
    assert_eq!(stored.job_list.get(entry.id).map(|e| e.quantity.get()), Some(3));

    assert!(matches!(
        service.duplicate_entry(&session.id, EntryId(404)),
        Err(SessionServiceError::JobList(JobListError::UnknownEntry(_)))
    ));
}

#[tokio::test]
async fn duplicate_then_remove_original() {
    let (service, _) = build_service(Arc::new(StaticCatalog::default()));
    let session = service.create(None).expect("session created");
    service
        .set_field(&session.id, "connection_type", "Joist")
        .expect("known field");
    service.search(&session.id).await.expect("search runs");
    let original = service
        .add_to_job_list(&session.id, "hu26", None, Some(4))
        .expect("candidate accepted");

    let copy = service
        .duplicate_entry(&session.id, original.id)
        .expect("duplicated");
    let removed = service
        .remove_entry(&session.id, original.id)
        .expect("removed")
        .expect("original present");
    assert!(service
        .remove_entry(&session.id, original.id)
        .expect("idempotent")
        .is_none());

    let stored = service.get(&session.id).expect("present");
    assert_eq!(stored.job_list.len(), 1);
    let remaining = stored.job_list.get(copy.id).expect("copy present");
    assert_eq!(remaining.candidate, removed.candidate);
    assert_eq!(remaining.quantity.get(), 1);
}

#[test]
fn reset_restores_defaults_but_keeps_the_job_list() {
    let (service, _) = build_service(Arc::new(StaticCatalog::default()));
    let session = service.create(Some("Canada")).expect("session created");
    service
        .set_field(&session.id, "job_label", "Warehouse")
        .expect("known field");
    service.set_language(&session.id, "fr").expect("language set");

    let reset = service.reset(&session.id).expect("reset");

    let spec = reset.store.snapshot();
    assert_eq!(spec.job_label, "Job 1");
    assert_eq!(spec.language, "en");
    assert_eq!(spec.load_duration, "standard_term_100");
    assert!(reset.job_list.is_empty());
}
