//! `acctsync-recon`: keyed reconciliation of spreadsheet and ledger records.
//!
//! Pure engine crate: receives pre-loaded records, returns a comparison report.
//! No CLI, IO or network dependencies.

pub mod classify;
pub mod engine;
pub mod error;
pub mod evidence;
pub mod matcher;
pub mod model;
pub mod normalize;

pub use engine::{reconcile, reconcile_with_summary};
pub use error::ErrorKind;
pub use model::{ComparisonReport, Conflict, ConflictReason, Dataset, Origin, ReconSummary, Record};
pub use normalize::{canonical_float, canonical_id};
