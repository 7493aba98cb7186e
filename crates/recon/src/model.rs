use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// Field names
// ---------------------------------------------------------------------------

pub const FIELD_NAME: &str = "name";
pub const FIELD_NUMBER: &str = "number";
pub const FIELD_TYPE: &str = "type";

// ---------------------------------------------------------------------------
// Origin + Dataset
// ---------------------------------------------------------------------------

/// Which source produced a record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Origin {
    /// The spreadsheet.
    Primary,
    /// The accounting system.
    External,
}

impl std::fmt::Display for Origin {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Primary => write!(f, "primary"),
            Self::External => write!(f, "external"),
        }
    }
}

/// The entity family being synchronised.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Dataset {
    /// Chart of accounts.
    #[default]
    Accounts,
    /// Payment terms.
    Terms,
}

impl Dataset {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Accounts => "accounts",
            Self::Terms => "terms",
        }
    }

    /// Secondary fields carried by records of this dataset, besides `name`.
    pub fn secondary_fields(&self) -> &'static [&'static str] {
        match self {
            Self::Accounts => &[FIELD_NUMBER, FIELD_TYPE],
            Self::Terms => &[],
        }
    }

    /// Report filename used when the caller gives no output path.
    pub fn default_report_name(&self) -> &'static str {
        match self {
            Self::Accounts => "chart_of_accounts_report.json",
            Self::Terms => "payment_terms_report.json",
        }
    }
}

impl std::fmt::Display for Dataset {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

// ---------------------------------------------------------------------------
// Record
// ---------------------------------------------------------------------------

/// One reconciled entity (an account or a payment term).
///
/// `fields` holds the secondary fields (e.g. `number`, `type`). They take part
/// in equality checking but never in the join, which uses `id` only.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Record {
    pub id: String,
    pub name: String,
    #[serde(flatten)]
    pub fields: BTreeMap<String, String>,
    pub origin: Origin,
}

impl Record {
    pub fn new(id: impl Into<String>, name: impl Into<String>, origin: Origin) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            fields: BTreeMap::new(),
            origin,
        }
    }

    /// Builder-style secondary field setter.
    pub fn with_field(mut self, field: impl Into<String>, value: impl Into<String>) -> Self {
        self.fields.insert(field.into(), value.into());
        self
    }

    /// Value of a compared field. `name` resolves to the display label.
    pub fn field(&self, field: &str) -> Option<&str> {
        if field == FIELD_NAME {
            Some(&self.name)
        } else {
            self.fields.get(field).map(String::as_str)
        }
    }

    /// Snapshot of the given fields, `None` where this record lacks one.
    pub fn projection<'f>(
        &self,
        fields: impl IntoIterator<Item = &'f str>,
    ) -> BTreeMap<String, Option<String>> {
        fields
            .into_iter()
            .map(|f| (f.to_string(), self.field(f).map(str::to_string)))
            .collect()
    }

    /// Every field this record carries, `name` first.
    pub fn field_names(&self) -> impl Iterator<Item = &str> {
        std::iter::once(FIELD_NAME).chain(self.fields.keys().map(String::as_str))
    }
}

// ---------------------------------------------------------------------------
// Conflict
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ConflictReason {
    FieldMismatch,
    MissingInPrimary,
    MissingInExternal,
}

impl std::fmt::Display for ConflictReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::FieldMismatch => write!(f, "field_mismatch"),
            Self::MissingInPrimary => write!(f, "missing_in_primary"),
            Self::MissingInExternal => write!(f, "missing_in_external"),
        }
    }
}

/// A field-level mismatch between two records sharing an `id`.
///
/// `primary` and `external` carry the full projection of every compared
/// field from each side, not only the fields that differ.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Conflict {
    pub id: String,
    pub reason: ConflictReason,
    pub primary: BTreeMap<String, Option<String>>,
    pub external: BTreeMap<String, Option<String>>,
}

impl Conflict {
    /// Conflict for an external record the spreadsheet does not know about.
    pub fn missing_in_primary(record: &Record) -> Self {
        Self::one_sided(record, ConflictReason::MissingInPrimary)
    }

    /// Conflict for a spreadsheet record the accounting system does not hold.
    pub fn missing_in_external(record: &Record) -> Self {
        Self::one_sided(record, ConflictReason::MissingInExternal)
    }

    fn one_sided(record: &Record, reason: ConflictReason) -> Self {
        let present = record.projection(record.field_names());
        let absent = present.keys().map(|k| (k.clone(), None)).collect();
        let (primary, external) = match reason {
            ConflictReason::MissingInPrimary => (absent, present),
            _ => (present, absent),
        };
        Self {
            id: record.id.clone(),
            reason,
            primary,
            external,
        }
    }

    pub fn primary_value(&self, field: &str) -> Option<&str> {
        self.primary.get(field).and_then(|v| v.as_deref())
    }

    pub fn external_value(&self, field: &str) -> Option<&str> {
        self.external.get(field).and_then(|v| v.as_deref())
    }

    /// Fields whose values differ between the two snapshots.
    pub fn differing_fields(&self) -> Vec<&str> {
        self.primary
            .keys()
            .chain(self.external.keys().filter(|k| !self.primary.contains_key(*k)))
            .map(String::as_str)
            .filter(|f| self.primary_value(f).unwrap_or("") != self.external_value(f).unwrap_or(""))
            .collect()
    }
}

// ---------------------------------------------------------------------------
// Report + Summary
// ---------------------------------------------------------------------------

/// The reconciler's sole output. Sequences follow table iteration order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ComparisonReport {
    pub primary_only: Vec<Record>,
    pub external_only: Vec<Record>,
    pub conflicts: Vec<Conflict>,
}

impl ComparisonReport {
    /// True when both sources agree on every id.
    pub fn is_reconciled(&self) -> bool {
        self.primary_only.is_empty() && self.external_only.is_empty() && self.conflicts.is_empty()
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ReconSummary {
    /// Unique ids in the primary input.
    pub primary_ids: usize,
    /// Unique ids in the external input.
    pub external_ids: usize,
    pub primary_only: usize,
    pub external_only: usize,
    pub conflicts: usize,
    pub matched: usize,
    /// Primary ids that occurred more than once (last occurrence kept).
    pub primary_duplicates: usize,
    /// External ids that occurred more than once (last occurrence kept).
    pub external_duplicates: usize,
}
