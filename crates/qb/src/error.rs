use acctsync_recon::ErrorKind;
use thiserror::Error;

/// Error type for gateway operations.
#[derive(Error, Debug)]
pub enum GatewayError {
    /// Record fails a precondition before anything is sent.
    #[error("invalid record '{id}': {message}")]
    InvalidArgument { id: String, message: String },

    /// Non-success status code reported by QuickBooks.
    #[error("QuickBooks error ({code}): {message}")]
    Status { code: i64, message: String },

    #[error("QuickBooks response missing status information")]
    MissingStatus,

    #[error("malformed qbXML: {0}")]
    Xml(String),

    /// Connection or session failure talking to the request processor.
    #[error("request processor error: {0}")]
    Transport(String),

    #[error("request processor returned HTTP {0}: {1}")]
    Http(u16, String),

    #[error("invalid gateway config: {0}")]
    Config(String),
}

impl GatewayError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::InvalidArgument { .. } | Self::Config(_) => ErrorKind::InvalidArgument,
            Self::Status { .. }
            | Self::MissingStatus
            | Self::Xml(_)
            | Self::Transport(_)
            | Self::Http(..) => ErrorKind::ExternalSystem,
        }
    }
}
