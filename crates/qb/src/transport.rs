use std::time::Duration;

use reqwest::blocking::{Client, Response};
use tracing::debug;

use crate::config::GatewayConfig;
use crate::error::GatewayError;
use crate::session::RequestProcessor;

const USER_AGENT: &str = concat!("acctsync/", env!("CARGO_PKG_VERSION"));

const HEADER_APP: &str = "X-QB-App-Name";
const HEADER_COMPANY: &str = "X-QB-Company-File";
const HEADER_TICKET: &str = "X-QB-Ticket";

/// Request processor reached over HTTP through a qbXML bridge running next to
/// QuickBooks.
///
/// Bridge routes, relative to the configured endpoint:
/// - `POST /session`: begin a session, response body is the ticket
/// - `POST /process`: body is a qbXML request, response body the qbXML reply
/// - `DELETE /session`: end the session named by the ticket header
pub struct HttpProcessor {
    http: Client,
    endpoint: String,
    app_name: Option<String>,
}

impl HttpProcessor {
    pub fn new(config: &GatewayConfig) -> Result<Self, GatewayError> {
        let http = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .user_agent(USER_AGENT)
            .build()
            .map_err(|e| GatewayError::Transport(format!("cannot build HTTP client: {e}")))?;

        Ok(Self {
            http,
            endpoint: config.endpoint.trim_end_matches('/').to_string(),
            app_name: None,
        })
    }

    fn url(&self, route: &str) -> String {
        format!("{}/{}", self.endpoint, route)
    }

    fn app_name(&self) -> Result<&str, GatewayError> {
        self.app_name
            .as_deref()
            .ok_or_else(|| GatewayError::Transport("connection not open".into()))
    }
}

/// Read the body of a 2xx response; any other status becomes an error.
fn body_of(resp: Result<Response, reqwest::Error>) -> Result<String, GatewayError> {
    let resp = resp.map_err(|e| GatewayError::Transport(e.to_string()))?;
    let status = resp.status();
    let body = resp
        .text()
        .map_err(|e| GatewayError::Transport(format!("cannot read response body: {e}")))?;
    if !status.is_success() {
        return Err(GatewayError::Http(status.as_u16(), body.trim().to_string()));
    }
    Ok(body)
}

impl RequestProcessor for HttpProcessor {
    fn open_connection(&mut self, app_name: &str) -> Result<(), GatewayError> {
        self.app_name = Some(app_name.to_string());
        Ok(())
    }

    fn begin_session(&mut self, company_file: &str) -> Result<String, GatewayError> {
        let resp = self
            .http
            .post(self.url("session"))
            .header(HEADER_APP, self.app_name()?)
            .header(HEADER_COMPANY, company_file)
            .send();
        let ticket = body_of(resp)?.trim().to_string();
        if ticket.is_empty() {
            return Err(GatewayError::Transport("bridge returned an empty session ticket".into()));
        }
        debug!(endpoint = %self.endpoint, "bridge session opened");
        Ok(ticket)
    }

    fn process_request(&mut self, ticket: &str, qbxml: &str) -> Result<String, GatewayError> {
        let resp = self
            .http
            .post(self.url("process"))
            .header(HEADER_APP, self.app_name()?)
            .header(HEADER_TICKET, ticket)
            .header("Content-Type", "application/xml")
            .body(qbxml.to_string())
            .send();
        body_of(resp)
    }

    fn end_session(&mut self, ticket: &str) -> Result<(), GatewayError> {
        let resp = self
            .http
            .delete(self.url("session"))
            .header(HEADER_APP, self.app_name()?)
            .header(HEADER_TICKET, ticket)
            .send();
        body_of(resp).map(|_| ())
    }

    fn close_connection(&mut self) -> Result<(), GatewayError> {
        self.app_name = None;
        Ok(())
    }
}
