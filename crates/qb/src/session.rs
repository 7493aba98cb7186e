use tracing::{debug, warn};

use crate::error::GatewayError;

/// The request-processor lifecycle exposed by QuickBooks Desktop:
/// open connection → begin session → process request(s) → end session →
/// close connection.
pub trait RequestProcessor {
    fn open_connection(&mut self, app_name: &str) -> Result<(), GatewayError>;

    /// Returns the session ticket.
    fn begin_session(&mut self, company_file: &str) -> Result<String, GatewayError>;

    fn process_request(&mut self, ticket: &str, qbxml: &str) -> Result<String, GatewayError>;

    fn end_session(&mut self, ticket: &str) -> Result<(), GatewayError>;

    fn close_connection(&mut self) -> Result<(), GatewayError>;
}

/// An open session. Dropping it ends the session, then closes the
/// connection, even if ending fails.
pub struct Session<'p, P: RequestProcessor + ?Sized> {
    processor: &'p mut P,
    ticket: String,
}

impl<'p, P: RequestProcessor + ?Sized> Session<'p, P> {
    pub fn open(processor: &'p mut P, app_name: &str, company_file: &str) -> Result<Self, GatewayError> {
        processor.open_connection(app_name)?;

        match processor.begin_session(company_file) {
            Ok(ticket) => {
                debug!("session started");
                Ok(Self { processor, ticket })
            }
            Err(e) => {
                if let Err(close) = processor.close_connection() {
                    warn!(error = %close, "close connection failed");
                }
                Err(e)
            }
        }
    }

    pub fn process(&mut self, qbxml: &str) -> Result<String, GatewayError> {
        self.processor.process_request(&self.ticket, qbxml)
    }
}

impl<P: RequestProcessor + ?Sized> Drop for Session<'_, P> {
    fn drop(&mut self) {
        if let Err(e) = self.processor.end_session(&self.ticket) {
            warn!(error = %e, "end session failed");
        }
        if let Err(e) = self.processor.close_connection() {
            warn!(error = %e, "close connection failed");
        }
        debug!("session released");
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;

    /// Processor double that records lifecycle calls and replays canned responses.
    #[derive(Default)]
    pub(crate) struct Scripted {
        pub calls: Vec<String>,
        pub requests: Vec<String>,
        pub responses: Vec<Result<String, GatewayError>>,
        pub fail_begin: bool,
        pub fail_end: bool,
    }

    impl Scripted {
        pub fn replying(responses: Vec<&str>) -> Self {
            Self {
                responses: responses.into_iter().map(|r| Ok(r.to_string())).collect(),
                ..Self::default()
            }
        }
    }

    impl RequestProcessor for Scripted {
        fn open_connection(&mut self, app_name: &str) -> Result<(), GatewayError> {
            self.calls.push(format!("open:{app_name}"));
            Ok(())
        }

        fn begin_session(&mut self, _company_file: &str) -> Result<String, GatewayError> {
            self.calls.push("begin".into());
            if self.fail_begin {
                return Err(GatewayError::Transport("company file locked".into()));
            }
            Ok("T-1".into())
        }

        fn process_request(&mut self, ticket: &str, qbxml: &str) -> Result<String, GatewayError> {
            self.calls.push(format!("process:{ticket}"));
            self.requests.push(qbxml.to_string());
            if self.responses.is_empty() {
                return Err(GatewayError::Transport("no scripted response".into()));
            }
            self.responses.remove(0)
        }

        fn end_session(&mut self, ticket: &str) -> Result<(), GatewayError> {
            self.calls.push(format!("end:{ticket}"));
            if self.fail_end {
                return Err(GatewayError::Transport("end failed".into()));
            }
            Ok(())
        }

        fn close_connection(&mut self) -> Result<(), GatewayError> {
            self.calls.push("close".into());
            Ok(())
        }
    }

    #[test]
    fn session_releases_in_order() {
        let mut p = Scripted::replying(vec!["<QBXML/>"]);
        {
            let mut s = Session::open(&mut p, "app", "").unwrap();
            s.process("<QBXML/>").unwrap();
        }
        assert_eq!(p.calls, vec!["open:app", "begin", "process:T-1", "end:T-1", "close"]);
    }

    #[test]
    fn session_releases_after_failed_request() {
        let mut p = Scripted::default();
        {
            let mut s = Session::open(&mut p, "app", "").unwrap();
            assert!(s.process("<QBXML/>").is_err());
        }
        assert_eq!(p.calls.last().map(String::as_str), Some("close"));
    }

    #[test]
    fn close_runs_even_when_end_fails() {
        let mut p = Scripted {
            fail_end: true,
            ..Scripted::default()
        };
        drop(Session::open(&mut p, "app", "").unwrap());
        assert_eq!(p.calls, vec!["open:app", "begin", "end:T-1", "close"]);
    }

    #[test]
    fn failed_begin_closes_connection() {
        let mut p = Scripted {
            fail_begin: true,
            ..Scripted::default()
        };
        assert!(Session::open(&mut p, "app", "").is_err());
        assert_eq!(p.calls, vec!["open:app", "begin", "close"]);
    }
}
