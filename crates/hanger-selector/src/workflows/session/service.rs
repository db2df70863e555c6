use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};

use axum::http::StatusCode;
use chrono::{DateTime, Utc};
use tracing::{debug, info};

use super::domain::{SearchSummary, SelectorSession, SessionId};
use super::repository::{RepositoryError, SessionRepository};
use crate::config::SelectorConfig;
use crate::workflows::catalog::{CandidateService, SearchCoordinator, SearchOutcome};
use crate::workflows::configuration::{FieldOutcome, SpecFieldError};
use crate::workflows::job_list::{EntryId, JobListEntry, JobListError, JobListExport, Quantity};

/// Service composing the session repository, the spec cascade and the catalog search.
pub struct SelectorSessionService<R, C> {
    repository: Arc<R>,
    coordinator: SearchCoordinator<C>,
    default_jurisdiction: String,
    /// Serializes read-modify-write cycles per session.
    session_locks: Mutex<HashMap<SessionId, Arc<Mutex<()>>>>,
}

static SESSION_SEQUENCE: AtomicU64 = AtomicU64::new(1);

fn next_session_id() -> SessionId {
    let id = SESSION_SEQUENCE.fetch_add(1, Ordering::Relaxed);
    SessionId(format!("sess-{id:06}"))
}

/// Partial edit of a job list entry.
#[derive(Debug, Clone, Default, PartialEq, serde::Deserialize)]
pub struct EntryUpdate {
    pub quantity: Option<i64>,
    pub job_label: Option<String>,
    pub position: Option<usize>,
}

impl<R, C> SelectorSessionService<R, C>
where
    R: SessionRepository + 'static,
    C: CandidateService + 'static,
{
    pub fn new(repository: Arc<R>, catalog: Arc<C>, config: &SelectorConfig) -> Self {
        Self {
            repository,
            coordinator: SearchCoordinator::new(catalog, config.search_timeout),
            default_jurisdiction: config.default_jurisdiction.clone(),
            session_locks: Mutex::new(HashMap::new()),
        }
    }

    /// Opens a session with the defaults of `jurisdiction`, or of the configured default.
    pub fn create(&self, jurisdiction: Option<&str>) -> Result<SelectorSession, SessionServiceError> {
        let key = jurisdiction
            .filter(|key| !key.trim().is_empty())
            .unwrap_or(&self.default_jurisdiction);
        let session = SelectorSession::new(next_session_id(), key);
        let stored = self.repository.insert(session)?;
        info!(
            session = %stored.id,
            jurisdiction = %stored.store.snapshot().jurisdiction,
            "selector session created"
        );
        Ok(stored)
    }

    pub fn get(&self, id: &SessionId) -> Result<SelectorSession, SessionServiceError> {
        self.repository
            .fetch(id)?
            .ok_or_else(|| SessionServiceError::UnknownSession(id.clone()))
    }

    /// Raw form edit addressed by wire field name.
    pub fn set_field(
        &self,
        id: &SessionId,
        field: &str,
        value: &str,
    ) -> Result<(FieldOutcome, SelectorSession), SessionServiceError> {
        self.modify(id, |session| {
            Ok(session.store.set_field_raw(field, value)?)
        })
    }

    pub fn change_jurisdiction(
        &self,
        id: &SessionId,
        key: &str,
        reset_language: bool,
    ) -> Result<(FieldOutcome, SelectorSession), SessionServiceError> {
        self.modify(id, |session| {
            Ok(session.store.change_jurisdiction(key, reset_language))
        })
    }

    pub fn set_language(
        &self,
        id: &SessionId,
        code: &str,
    ) -> Result<(FieldOutcome, SelectorSession), SessionServiceError> {
        self.modify(id, |session| Ok(session.store.set_language(code)))
    }

    /// Restores jurisdiction defaults. Results and the job list are kept.
    pub fn reset(&self, id: &SessionId) -> Result<SelectorSession, SessionServiceError> {
        let ((), session) = self.modify(id, |session| {
            session.store.reset();
            Ok(())
        })?;
        Ok(session)
    }

    /// Searches with the current connection spec. Only the newest search per session updates its results.
    pub async fn search(&self, id: &SessionId) -> Result<SearchOutcome, SessionServiceError> {
        let session = self.get(id)?;
        let outcome = self
            .coordinator
            .search(&session.tracker, session.store.snapshot())
            .await;
        if outcome.is_stale() {
            return Ok(outcome);
        }

        let lock = self.session_lock(id)?;
        let _guard = lock.lock().expect("session lock poisoned");
        let mut latest = self.get(id)?;
        if !latest.tracker.is_current(outcome.ticket()) {
            debug!(session = %id, ticket = outcome.ticket().sequence(), "search superseded before commit");
            return Ok(SearchOutcome::Stale {
                ticket: outcome.ticket(),
            });
        }
        latest.results = outcome.candidates().to_vec();
        latest.last_search = Some(SearchSummary::from(&outcome));
        self.repository.update(latest)?;
        Ok(outcome)
    }

    /// Promotes a result into the job list. Label and quantity default to the connection spec.
    pub fn add_to_job_list(
        &self,
        id: &SessionId,
        candidate_id: &str,
        job_label: Option<String>,
        quantity: Option<i64>,
    ) -> Result<JobListEntry, SessionServiceError> {
        let (entry, _) = self.modify(id, |session| {
            let candidate = session
                .candidate(candidate_id)
                .cloned()
                .ok_or_else(|| SessionServiceError::UnknownCandidate(candidate_id.to_string()))?;
            let spec = session.store.snapshot();
            let quantity = match quantity {
                Some(requested) => Quantity::try_from(requested)?,
                None => Quantity::new(spec.quantity).unwrap_or(Quantity::ONE),
            };
            let job_label = job_label.unwrap_or_else(|| spec.job_label.clone());
            let entry_id = session.job_list.add(candidate, job_label, quantity);
            entry_of(session, entry_id)
        })?;
        Ok(entry)
    }

    pub fn update_entry(
        &self,
        id: &SessionId,
        entry_id: EntryId,
        update: EntryUpdate,
    ) -> Result<JobListEntry, SessionServiceError> {
        let (entry, _) = self.modify(id, |session| {
            if let Some(quantity) = update.quantity {
                session.job_list.set_quantity(entry_id, quantity)?;
            }
            if let Some(job_label) = update.job_label {
                session.job_list.set_label(entry_id, job_label)?;
            }
            if let Some(position) = update.position {
                session.job_list.move_entry(entry_id, position)?;
            }
            entry_of(session, entry_id)
        })?;
        Ok(entry)
    }

    pub fn duplicate_entry(
        &self,
        id: &SessionId,
        entry_id: EntryId,
    ) -> Result<JobListEntry, SessionServiceError> {
        let (entry, _) = self.modify(id, |session| {
            let copy = session.job_list.duplicate(entry_id)?;
            entry_of(session, copy)
        })?;
        Ok(entry)
    }

    /// Idempotent: removing an absent entry succeeds with `None`.
    pub fn remove_entry(
        &self,
        id: &SessionId,
        entry_id: EntryId,
    ) -> Result<Option<JobListEntry>, SessionServiceError> {
        let (removed, _) = self.modify(id, |session| Ok(session.job_list.remove(entry_id)))?;
        Ok(removed)
    }

    pub fn export(
        &self,
        id: &SessionId,
        generated_at: DateTime<Utc>,
    ) -> Result<JobListExport, SessionServiceError> {
        Ok(self.get(id)?.job_list.export(generated_at))
    }

    /// Applies `change` to a copy of the session and stores it only when the change succeeds.
    fn modify<T, F>(&self, id: &SessionId, change: F) -> Result<(T, SelectorSession), SessionServiceError>
    where
        F: FnOnce(&mut SelectorSession) -> Result<T, SessionServiceError>,
    {
        let lock = self.session_lock(id)?;
        let _guard = lock.lock().expect("session lock poisoned");
        let mut session = self.get(id)?;
        let value = change(&mut session)?;
        self.repository.update(session.clone())?;
        Ok((value, session))
    }

    /// Lock for one stored session. Unknown ids get no entry.
    fn session_lock(&self, id: &SessionId) -> Result<Arc<Mutex<()>>, SessionServiceError> {
        let mut locks = self.session_locks.lock().expect("session lock table poisoned");
        if let Some(lock) = locks.get(id) {
            return Ok(lock.clone());
        }
        if self.repository.fetch(id)?.is_none() {
            return Err(SessionServiceError::UnknownSession(id.clone()));
        }
        Ok(locks.entry(id.clone()).or_default().clone())
    }
}

fn entry_of(session: &SelectorSession, entry_id: EntryId) -> Result<JobListEntry, SessionServiceError> {
    session
        .job_list
        .get(entry_id)
        .cloned()
        .ok_or(SessionServiceError::JobList(JobListError::UnknownEntry(entry_id)))
}

#[derive(Debug, thiserror::Error)]
pub enum SessionServiceError {
    #[error("session {0} not found")]
    UnknownSession(SessionId),
    #[error("candidate '{0}' is not among the current search results")]
    UnknownCandidate(String),
    #[error(transparent)]
    Field(#[from] SpecFieldError),
    #[error(transparent)]
    JobList(#[from] JobListError),
    #[error(transparent)]
    Repository(#[from] RepositoryError),
}

impl SessionServiceError {
    /// HTTP status shared by the session router and `AppError`.
    pub fn status_code(&self) -> StatusCode {
        match self {
            Self::UnknownSession(_)
            | Self::Repository(RepositoryError::NotFound)
            | Self::JobList(JobListError::UnknownEntry(_)) => StatusCode::NOT_FOUND,
            Self::UnknownCandidate(_)
            | Self::Field(_)
            | Self::JobList(JobListError::InvalidQuantity(_)) => StatusCode::BAD_REQUEST,
            Self::Repository(RepositoryError::Conflict) => StatusCode::CONFLICT,
            Self::Repository(RepositoryError::Unavailable(_)) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}
