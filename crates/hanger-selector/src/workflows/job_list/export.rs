use std::io::Write;

use chrono::{DateTime, Utc};
use serde::Serialize;

use super::aggregator::{FastenerTotal, JobList, UnparsedDescriptor};
use super::domain::EntryId;

#[derive(Debug, Clone, Serialize)]
pub struct ExportedEntry {
    pub position: usize,
    pub entry_id: EntryId,
    pub job_label: String,
    pub quantity: u32,
    pub model: String,
    pub cost_tier: String,
    pub rated_load: String,
    pub material: String,
    pub face_fasteners: Option<String>,
    pub joist_fasteners: Option<String>,
}

/// Printable job list: entries in list order followed by the fastener totals.
#[derive(Debug, Clone, Serialize)]
pub struct JobListExport {
    pub generated_at: DateTime<Utc>,
    pub entries: Vec<ExportedEntry>,
    pub totals: Vec<FastenerTotal>,
    pub unparsed: Vec<UnparsedDescriptor>,
}

const CSV_HEADER: [&str; 9] = [
    "section",
    "position",
    "job_label",
    "model",
    "quantity",
    "material",
    "rated_load",
    "fastener",
    "count",
];

#[derive(Serialize)]
struct CsvRow<'a> {
    section: &'static str,
    position: Option<usize>,
    job_label: Option<&'a str>,
    model: Option<&'a str>,
    quantity: Option<u32>,
    material: Option<&'a str>,
    rated_load: Option<&'a str>,
    fastener: Option<&'a str>,
    count: Option<u64>,
}

impl<'a> CsvRow<'a> {
    fn blank(section: &'static str) -> Self {
        Self {
            section,
            position: None,
            job_label: None,
            model: None,
            quantity: None,
            material: None,
            rated_load: None,
            fastener: None,
            count: None,
        }
    }
}

impl JobList {
    pub fn export(&self, generated_at: DateTime<Utc>) -> JobListExport {
        let totals = self.totals();
        let entries = self
            .entries()
            .iter()
            .enumerate()
            .map(|(index, entry)| ExportedEntry {
                position: index + 1,
                entry_id: entry.id,
                job_label: entry.job_label.clone(),
                quantity: entry.quantity.get(),
                model: entry.candidate.model.clone(),
                cost_tier: entry.candidate.cost_tier.to_string(),
                rated_load: entry.candidate.rated_load.clone(),
                material: entry.candidate.material.clone(),
                face_fasteners: entry.candidate.face_fastener_descriptor.clone(),
                joist_fasteners: entry.candidate.joist_fastener_descriptor.clone(),
            })
            .collect();

        JobListExport {
            generated_at,
            entries,
            totals: totals.lines,
            unparsed: totals.unparsed,
        }
    }
}

impl JobListExport {
    /// Writes one `entry` row per connection, then `total` and `unparsed` fastener rows.
    pub fn write_csv<W: Write>(&self, writer: W) -> Result<(), csv::Error> {
        let mut csv_writer = csv::WriterBuilder::new()
            .has_headers(false)
            .from_writer(writer);
        csv_writer.write_record(CSV_HEADER)?;

        for entry in &self.entries {
            csv_writer.serialize(CsvRow {
                position: Some(entry.position),
                job_label: Some(&entry.job_label),
                model: Some(&entry.model),
                quantity: Some(entry.quantity),
                material: Some(&entry.material),
                rated_load: Some(&entry.rated_load),
                ..CsvRow::blank("entry")
            })?;
        }
        for total in &self.totals {
            csv_writer.serialize(CsvRow {
                fastener: Some(&total.label),
                count: Some(total.count),
                ..CsvRow::blank("total")
            })?;
        }
        for line in &self.unparsed {
            csv_writer.serialize(CsvRow {
                model: Some(&line.model),
                fastener: Some(&line.raw),
                ..CsvRow::blank("unparsed")
            })?;
        }

        csv_writer.flush()?;
        Ok(())
    }

    pub fn to_csv_string(&self) -> Result<String, csv::Error> {
        let mut buffer = Vec::new();
        self.write_csv(&mut buffer)?;
        String::from_utf8(buffer).map_err(|error| {
            csv::Error::from(std::io::Error::new(std::io::ErrorKind::InvalidData, error))
        })
    }
}
