use std::fmt;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::workflows::catalog::{Candidate, SearchOutcome, SearchTicket, SearchTracker};
use crate::workflows::configuration::{
    ConnectionSpec, ConnectionSpecStore, FieldOutcome, JurisdictionProfile, LanguageMode, SpecField,
};
use crate::workflows::job_list::{FastenerTotals, JobList, JobListEntry};

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SessionId(pub String);

impl fmt::Display for SessionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Everything one user works on: the connection spec being edited, the last results and the job list.
#[derive(Debug, Clone)]
pub struct SelectorSession {
    pub id: SessionId,
    pub store: ConnectionSpecStore,
    pub job_list: JobList,
    pub results: Vec<Candidate>,
    pub last_search: Option<SearchSummary>,
    pub tracker: Arc<SearchTracker>,
    pub created_at: DateTime<Utc>,
}

impl SelectorSession {
    pub fn new(id: SessionId, jurisdiction_key: &str) -> Self {
        Self {
            id,
            store: ConnectionSpecStore::new(jurisdiction_key),
            job_list: JobList::new(),
            results: Vec::new(),
            last_search: None,
            tracker: Arc::new(SearchTracker::new()),
            created_at: Utc::now(),
        }
    }

    /// Looks a candidate up in the results of the last observed search.
    pub fn candidate(&self, candidate_id: &str) -> Option<&Candidate> {
        self.results.iter().find(|candidate| candidate.id == candidate_id)
    }

    pub fn spec_view(&self) -> SpecView {
        SpecView {
            spec: self.store.snapshot().clone(),
            language_mode: self.store.language_mode(),
            profile: self.store.profile(),
            missing_fields: self.store.snapshot().missing_for_search(),
        }
    }

    pub fn view(&self) -> SessionView {
        SessionView {
            session_id: self.id.clone(),
            created_at: self.created_at,
            spec: self.spec_view(),
            last_search: self.last_search.clone(),
            results: self.results.clone(),
            job_list: self.job_list.entries().to_vec(),
            totals: self.job_list.totals(),
        }
    }
}

/// What the session remembers about the last search it accepted.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SearchSummary {
    pub ticket: SearchTicket,
    pub failed: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    pub candidates: usize,
}

impl From<&SearchOutcome> for SearchSummary {
    fn from(outcome: &SearchOutcome) -> Self {
        let message = match outcome {
            SearchOutcome::Failed { message, .. } => Some(message.clone()),
            SearchOutcome::Completed { .. } | SearchOutcome::Stale { .. } => None,
        };
        Self {
            ticket: outcome.ticket(),
            failed: outcome.is_failed(),
            message,
            candidates: outcome.candidates().len(),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct SpecView {
    pub spec: ConnectionSpec,
    pub language_mode: LanguageMode,
    pub profile: &'static JurisdictionProfile,
    pub missing_fields: Vec<SpecField>,
}

#[derive(Debug, Clone, Serialize)]
pub struct FieldChangeView {
    pub outcome: FieldOutcome,
    #[serde(flatten)]
    pub spec: SpecView,
}

#[derive(Debug, Clone, Serialize)]
pub struct SessionView {
    pub session_id: SessionId,
    pub created_at: DateTime<Utc>,
    #[serde(flatten)]
    pub spec: SpecView,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_search: Option<SearchSummary>,
    pub results: Vec<Candidate>,
    pub job_list: Vec<JobListEntry>,
    pub totals: FastenerTotals,
}

/// Search response as reported to API clients.
#[derive(Debug, Clone, Serialize)]
pub struct SearchView {
    pub status: &'static str,
    pub ticket: SearchTicket,
    pub candidates: Vec<Candidate>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

impl From<SearchOutcome> for SearchView {
    fn from(outcome: SearchOutcome) -> Self {
        match outcome {
            SearchOutcome::Completed { ticket, candidates } => Self {
                status: "completed",
                ticket,
                candidates,
                message: None,
            },
            SearchOutcome::Stale { ticket } => Self {
                status: "discarded",
                ticket,
                candidates: Vec::new(),
                message: Some("superseded by a newer search".to_string()),
            },
            SearchOutcome::Failed { ticket, message } => Self {
                status: "failed",
                ticket,
                candidates: Vec::new(),
                message: Some(message),
            },
        }
    }
}
