// Sync pipeline: import → fetch → reconcile → create missing → report payload.

use std::collections::HashSet;
use std::path::PathBuf;

use acctsync_io::ReportPayload;
use acctsync_qb::{QbGateway, RequestProcessor};
use acctsync_recon::{reconcile_with_summary, ComparisonReport, Conflict, Dataset, Record};
use tracing::{info, warn};

#[derive(Debug, Clone)]
pub struct SyncOptions {
    pub workbook: PathBuf,
    pub dataset: Dataset,
    /// Reconcile and report, but create nothing.
    pub dry_run: bool,
}

/// A run that stopped early, with the conflicts it had already computed.
struct Aborted {
    error: String,
    conflicts: Vec<Conflict>,
}

impl Aborted {
    fn before_reconcile(error: impl std::fmt::Display) -> Self {
        Self {
            error: error.to_string(),
            conflicts: Vec::new(),
        }
    }
}

/// Run one sync. Never fails: collaborator errors become an error payload.
pub fn run<P: RequestProcessor>(options: &SyncOptions, gateway: &mut QbGateway<P>) -> ReportPayload {
    match sync(options, gateway) {
        Ok(payload) => payload,
        Err(Aborted { error, conflicts }) => {
            warn!(%error, conflicts = conflicts.len(), "sync failed");
            ReportPayload::failure_with(Vec::new(), conflicts, error)
        }
    }
}

/// Error payload for a run that could not start.
pub fn failed(error: impl std::fmt::Display) -> ReportPayload {
    warn!(error = %error, "sync failed");
    ReportPayload::failure(error)
}

fn sync<P: RequestProcessor>(
    options: &SyncOptions,
    gateway: &mut QbGateway<P>,
) -> Result<ReportPayload, Aborted> {
    let dataset = options.dataset;

    let primary = acctsync_io::load(&options.workbook, dataset).map_err(Aborted::before_reconcile)?;
    let external = gateway.fetch_all(dataset).map_err(Aborted::before_reconcile)?;

    let (report, summary) = reconcile_with_summary(&primary, &external);
    info!(
        %dataset,
        primary = summary.primary_ids,
        external = summary.external_ids,
        matched = summary.matched,
        conflicts = summary.conflicts,
        to_create = summary.primary_only,
        missing_in_workbook = summary.external_only,
        "reconciled"
    );

    let created = if options.dry_run || report.primary_only.is_empty() {
        Vec::new()
    } else {
        // nothing is confirmed when the batch itself fails
        gateway
            .create_batch(dataset, &report.primary_only)
            .map_err(|e| Aborted {
                error: e.to_string(),
                conflicts: collect_conflicts(&report, &[]),
            })?
    };

    let conflicts = collect_conflicts(&report, &created);
    Ok(ReportPayload::success(created, conflicts))
}

/// Field mismatches, then external-only records, then primary-only records
/// that were not created.
fn collect_conflicts(report: &ComparisonReport, created: &[Record]) -> Vec<Conflict> {
    let created_ids: HashSet<&str> = created.iter().map(|r| r.id.as_str()).collect();

    report
        .conflicts
        .iter()
        .cloned()
        .chain(report.external_only.iter().map(Conflict::missing_in_primary))
        .chain(
            report
                .primary_only
                .iter()
                .filter(|r| !created_ids.contains(r.id.as_str()))
                .map(Conflict::missing_in_external),
        )
        .collect()
}
