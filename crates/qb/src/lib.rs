//! QuickBooks Desktop gateway.
//!
//! Speaks qbXML to a request processor: fetch every account or payment term,
//! batch-create the ones the spreadsheet adds. Sessions are opened per request
//! and released on every exit path.

mod client;
mod config;
mod error;
pub mod qbxml;
mod session;
mod transport;

pub use client::QbGateway;
pub use config::GatewayConfig;
pub use error::GatewayError;
pub use session::{RequestProcessor, Session};
pub use transport::HttpProcessor;
