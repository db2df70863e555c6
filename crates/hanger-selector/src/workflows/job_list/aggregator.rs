use std::collections::BTreeMap;

use chrono::Utc;
use serde::Serialize;

use super::domain::{EntryId, JobListEntry, JobListError, Quantity};
use crate::workflows::catalog::Candidate;
use crate::workflows::fasteners::{self, FastenerKey, ParseFailureKind};

/// Ordered collection of accepted candidates for one session.
#[derive(Debug, Clone, Default)]
pub struct JobList {
    entries: Vec<JobListEntry>,
    next_id: u64,
}

impl JobList {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn entries(&self) -> &[JobListEntry] {
        &self.entries
    }

    pub fn get(&self, id: EntryId) -> Option<&JobListEntry> {
        self.entries.iter().find(|entry| entry.id == id)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn add(&mut self, candidate: Candidate, job_label: impl Into<String>, quantity: Quantity) -> EntryId {
        let entry = self.new_entry(candidate, job_label.into(), quantity);
        let id = entry.id;
        self.entries.push(entry);
        id
    }

    /// Removing an absent id is a no-op.
    pub fn remove(&mut self, id: EntryId) -> Option<JobListEntry> {
        let index = self.position(id).ok()?;
        Some(self.entries.remove(index))
    }

    /// Leaves the prior quantity in place when `quantity` is not positive.
    pub fn set_quantity(&mut self, id: EntryId, quantity: i64) -> Result<Quantity, JobListError> {
        let index = self.position(id)?;
        let quantity = Quantity::try_from(quantity)?;
        self.entries[index].quantity = quantity;
        Ok(quantity)
    }

    pub fn set_label(&mut self, id: EntryId, job_label: impl Into<String>) -> Result<(), JobListError> {
        let index = self.position(id)?;
        self.entries[index].job_label = job_label.into();
        Ok(())
    }

    /// Copies an entry directly below the original with a quantity of one.
    pub fn duplicate(&mut self, id: EntryId) -> Result<EntryId, JobListError> {
        let index = self.position(id)?;
        let candidate = self.entries[index].candidate.clone();
        let job_label = self.entries[index].job_label.clone();
        let copy = self.new_entry(candidate, job_label, Quantity::ONE);
        let copy_id = copy.id;
        self.entries.insert(index + 1, copy);
        Ok(copy_id)
    }

    /// Moves an entry to `index`, clamped to the end of the list. Returns the final index.
    pub fn move_entry(&mut self, id: EntryId, index: usize) -> Result<usize, JobListError> {
        let current = self.position(id)?;
        let entry = self.entries.remove(current);
        let target = index.min(self.entries.len());
        self.entries.insert(target, entry);
        Ok(target)
    }

    /// Fastener counts across every entry, multiplied by entry quantity.
    pub fn totals(&self) -> FastenerTotals {
        let mut counts: BTreeMap<FastenerKey, u64> = BTreeMap::new();
        let mut unparsed = Vec::new();

        for entry in &self.entries {
            for text in entry.candidate.fastener_descriptors() {
                match fasteners::parse(text) {
                    Ok(descriptor) => {
                        *counts.entry(descriptor.key()).or_default() +=
                            u64::from(descriptor.count) * u64::from(entry.quantity.get());
                    }
                    Err(failure) => unparsed.push(UnparsedDescriptor {
                        entry_id: entry.id,
                        model: entry.candidate.model.clone(),
                        raw: failure.raw,
                        recovered_count: failure.recovered_count,
                        kind: failure.kind,
                    }),
                }
            }
        }

        FastenerTotals {
            lines: counts
                .into_iter()
                .map(|(key, count)| FastenerTotal {
                    label: key.to_string(),
                    key,
                    count,
                })
                .collect(),
            unparsed,
        }
    }

    fn new_entry(&mut self, candidate: Candidate, job_label: String, quantity: Quantity) -> JobListEntry {
        self.next_id += 1;
        JobListEntry {
            id: EntryId(self.next_id),
            job_label,
            quantity,
            candidate,
            added_at: Utc::now(),
        }
    }

    fn position(&self, id: EntryId) -> Result<usize, JobListError> {
        self.entries
            .iter()
            .position(|entry| entry.id == id)
            .ok_or(JobListError::UnknownEntry(id))
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FastenerTotal {
    pub key: FastenerKey,
    pub label: String,
    pub count: u64,
}

/// Descriptor text that stays out of the totals and is shown as written.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct UnparsedDescriptor {
    pub entry_id: EntryId,
    pub model: String,
    pub raw: String,
    pub recovered_count: u32,
    pub kind: ParseFailureKind,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct FastenerTotals {
    pub lines: Vec<FastenerTotal>,
    pub unparsed: Vec<UnparsedDescriptor>,
}

impl FastenerTotals {
    /// Sum over every size and finish sharing a spec code.
    pub fn count_for(&self, spec_code: &str) -> u64 {
        self.lines
            .iter()
            .filter(|line| line.key.spec_code.eq_ignore_ascii_case(spec_code.trim()))
            .map(|line| line.count)
            .sum()
    }

    pub fn is_empty(&self) -> bool {
        self.lines.is_empty() && self.unparsed.is_empty()
    }
}
