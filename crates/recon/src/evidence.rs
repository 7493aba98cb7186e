use crate::matcher::KeyedTable;
use crate::model::{ComparisonReport, ReconSummary};

/// Counters describing one reconciliation run.
pub fn compute_summary(
    report: &ComparisonReport,
    primary: &KeyedTable<'_>,
    external: &KeyedTable<'_>,
) -> ReconSummary {
    let intersection = primary.len() - report.primary_only.len();

    ReconSummary {
        primary_ids: primary.len(),
        external_ids: external.len(),
        primary_only: report.primary_only.len(),
        external_only: report.external_only.len(),
        conflicts: report.conflicts.len(),
        matched: intersection - report.conflicts.len(),
        primary_duplicates: primary.duplicates().len(),
        external_duplicates: external.duplicates().len(),
    }
}
