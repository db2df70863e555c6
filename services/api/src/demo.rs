use crate::infra::{InMemoryCandidateCatalog, InMemorySessionRepository};
use chrono::Utc;
use clap::Args;
use hanger_selector::config::SelectorConfig;
use hanger_selector::error::AppError;
use hanger_selector::workflows::catalog::SearchOutcome;
use hanger_selector::workflows::configuration::jurisdiction::{self, JurisdictionProfile};
use hanger_selector::workflows::fasteners;
use hanger_selector::workflows::job_list::{FastenerTotals, JobListExport};
use hanger_selector::workflows::session::{EntryUpdate, SelectorSessionService};
use std::io;
use std::sync::Arc;

#[derive(Args, Debug)]
pub(crate) struct ProfileArgs {
    /// Jurisdiction id, ISO code or country name
    pub(crate) jurisdiction: String,
}

#[derive(Args, Debug)]
pub(crate) struct ParseArgs {
    /// Descriptor text as printed on a product sheet
    pub(crate) descriptor: String,
}

#[derive(Args, Debug)]
pub(crate) struct DemoArgs {
    /// Jurisdiction for the demo session (defaults to the configured default)
    #[arg(long)]
    pub(crate) jurisdiction: Option<String>,
    /// Quantity of the first accepted connector
    #[arg(long, default_value_t = 2)]
    pub(crate) quantity: i64,
    /// Connection type to search for (Joist, Truss or Multi-Truss)
    #[arg(long, default_value = "Joist")]
    pub(crate) connection_type: String,
}

pub(crate) fn run_profile(args: ProfileArgs) -> Result<(), AppError> {
    let matched = jurisdiction::find(&args.jurisdiction).is_some();
    let profile = jurisdiction::resolve(&args.jurisdiction);
    if !matched {
        println!(
            "'{}' is not a known jurisdiction; using the default profile",
            args.jurisdiction
        );
    }
    render_profile(profile);
    Ok(())
}

pub(crate) fn run_parse(args: ParseArgs) -> Result<(), AppError> {
    match fasteners::parse(&args.descriptor) {
        Ok(descriptor) => {
            println!("Count:     {}", descriptor.count);
            println!("Spec code: {}", descriptor.spec_code);
            println!("Diameter:  {}", descriptor.diameter);
            println!("Length:    {}", descriptor.length);
            println!(
                "Finish:    {}",
                if descriptor.finish.is_empty() {
                    "-"
                } else {
                    descriptor.finish.as_str()
                }
            );
            println!("Canonical: {}", descriptor);
            println!("Total key: {}", descriptor.key());
        }
        Err(failure) => {
            println!("Unparsed: {}", failure.raw);
            println!("  Reason: {}", failure.kind.label());
            println!("  Recovered count: {}", failure.recovered_count);
        }
    }
    Ok(())
}

pub(crate) async fn run_demo(args: DemoArgs) -> Result<(), AppError> {
    let config = SelectorConfig::default();
    let service = SelectorSessionService::new(
        Arc::new(InMemorySessionRepository::default()),
        Arc::new(InMemoryCandidateCatalog),
        &config,
    );

    let session = service.create(args.jurisdiction.as_deref())?;
    println!("Hanger selector demo");
    render_profile(session.store.profile());

    let (outcome, _) = service.set_field(&session.id, "connection_type", &args.connection_type)?;
    if !outcome.was_applied() {
        println!(
            "\nConnection type '{}' ignored; search will report the gap",
            args.connection_type
        );
    }

    println!("\nCandidates");
    let outcome = service.search(&session.id).await?;
    let candidates = match &outcome {
        SearchOutcome::Completed { candidates, .. } => candidates.clone(),
        SearchOutcome::Failed { message, .. } => {
            println!("  Search failed: {message}");
            return Ok(());
        }
        SearchOutcome::Stale { .. } => {
            println!("  Search superseded");
            return Ok(());
        }
    };
    if candidates.is_empty() {
        println!("  No connectors match this specification");
        return Ok(());
    }
    for candidate in &candidates {
        println!(
            "  - {:<14} {:<8} {:<10} {}",
            candidate.model,
            candidate.cost_tier.to_string(),
            candidate.rated_load,
            candidate.material
        );
    }

    let mut accepted = Vec::new();
    for candidate in candidates.iter().take(2) {
        accepted.push(service.add_to_job_list(&session.id, &candidate.id, None, None)?);
    }
    if let Some(first) = accepted.first() {
        let update = EntryUpdate {
            quantity: Some(args.quantity),
            ..EntryUpdate::default()
        };
        if let Err(err) = service.update_entry(&session.id, first.id, update) {
            println!("\nQuantity {} rejected: {}", args.quantity, err);
        }
    }

    let export = service.export(&session.id, Utc::now())?;
    render_job_list(&export);
    render_totals(&service.get(&session.id)?.job_list.totals());

    println!("\nCSV export");
    export
        .write_csv(io::stdout())
        .map_err(|err| AppError::Io(io::Error::other(err)))?;
    Ok(())
}

fn render_profile(profile: &JurisdictionProfile) {
    println!("Jurisdiction: {} ({})", profile.display_name, profile.id);
    println!("  Design standard: {}", profile.design_standard);
    println!("  Design method:   {}", profile.design_method.label());
    println!("  Language:        {}", profile.default_language);
    let load: Vec<_> = profile.load_durations.iter().map(|option| option.label).collect();
    println!(
        "  Load durations:  {}{}",
        load.join(", "),
        if profile.load_duration_locked {
            " (fixed)"
        } else {
            ""
        }
    );
    let uplift: Vec<_> = profile.uplift_durations.iter().map(|option| option.label).collect();
    println!("  Uplift durations: {}", uplift.join(", "));
}

fn render_job_list(export: &JobListExport) {
    println!("\nJob list");
    for entry in &export.entries {
        println!(
            "  {}. {} x{} [{}] {}",
            entry.position, entry.model, entry.quantity, entry.job_label, entry.cost_tier
        );
    }
}

fn render_totals(totals: &FastenerTotals) {
    if totals.is_empty() {
        println!("\nFastener totals: none");
        return;
    }
    println!("\nFastener totals");
    for line in &totals.lines {
        println!("  {:>5}  {}", line.count, line.label);
    }
    for line in &totals.unparsed {
        println!("  {:>5}  {} (not counted: {})", "-", line.raw, line.kind.label());
    }
}
