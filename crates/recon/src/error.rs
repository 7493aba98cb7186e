use serde::Serialize;

/// Failure taxonomy shared by every collaborator crate.
///
/// The reconciler itself never fails; importer, gateway and reporter errors
/// each map onto one of these kinds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    /// Missing input file or worksheet.
    NotFound,
    /// A record fails a format precondition (e.g. a non-numeric id).
    InvalidArgument,
    /// Error status from the accounting system, or a transport failure.
    ExternalSystem,
}

impl std::fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::NotFound => write!(f, "not_found"),
            Self::InvalidArgument => write!(f, "invalid_argument"),
            Self::ExternalSystem => write!(f, "external_system"),
        }
    }
}
