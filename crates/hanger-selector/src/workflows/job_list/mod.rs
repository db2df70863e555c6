//! Accepted candidates and the fastener totals derived from them.

mod aggregator;
pub mod domain;
mod export;

pub use aggregator::{FastenerTotal, FastenerTotals, JobList, UnparsedDescriptor};
pub use domain::{EntryId, JobListEntry, JobListError, Quantity};
pub use export::{ExportedEntry, JobListExport};
