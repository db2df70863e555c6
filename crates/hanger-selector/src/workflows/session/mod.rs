//! Per-user selector sessions and the HTTP surface over them.
//!
//! A session bundles one spec store, the results of its latest search and its job list.
//! Sessions are isolated by [`SessionId`]; no route reaches another session's state.

pub mod domain;
pub mod repository;
pub mod router;
pub mod service;

#[cfg(test)]
mod tests;

pub use domain::{
    FieldChangeView, SearchSummary, SearchView, SelectorSession, SessionId, SessionView, SpecView,
};
pub use repository::{RepositoryError, SessionRepository};
pub use router::session_router;
pub use service::{EntryUpdate, SelectorSessionService, SessionServiceError};
