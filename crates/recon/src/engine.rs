use tracing::{debug, warn};

use crate::classify::classify_pair;
use crate::evidence::compute_summary;
use crate::matcher::{partition, KeyedTable};
use crate::model::{ComparisonReport, Origin, ReconSummary, Record};

/// Compare two record collections keyed by `id`.
///
/// Pure and infallible. Duplicate ids within one collection resolve
/// last-write-wins. Empty inputs are valid.
pub fn reconcile(primary: &[Record], external: &[Record]) -> ComparisonReport {
    reconcile_with_summary(primary, external).0
}

/// Same as [`reconcile`], plus the counters the runner logs.
pub fn reconcile_with_summary(
    primary: &[Record],
    external: &[Record],
) -> (ComparisonReport, ReconSummary) {
    let primary_table = KeyedTable::build(primary);
    let external_table = KeyedTable::build(external);

    report_duplicates(Origin::Primary, &primary_table);
    report_duplicates(Origin::External, &external_table);

    let split = partition(&primary_table, &external_table);

    let conflicts = split
        .matched
        .iter()
        .filter_map(|(p, e)| classify_pair(p, e))
        .collect();

    let report = ComparisonReport {
        primary_only: split.primary_only.into_iter().cloned().collect(),
        external_only: split.external_only.into_iter().cloned().collect(),
        conflicts,
    };

    let summary = compute_summary(&report, &primary_table, &external_table);
    debug!(
        primary = summary.primary_ids,
        external = summary.external_ids,
        matched = summary.matched,
        conflicts = summary.conflicts,
        "reconciled"
    );

    (report, summary)
}

fn report_duplicates(origin: Origin, table: &KeyedTable<'_>) {
    for (id, count) in table.duplicates() {
        warn!(%origin, id, count, "duplicate id, keeping last occurrence");
    }
}
