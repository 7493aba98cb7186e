use acctsync_recon::{canonical_id, Dataset, Origin, Record};
use tracing::{debug, info, warn};

use crate::config::GatewayConfig;
use crate::error::GatewayError;
use crate::qbxml::{self, Entity, OnError, STATUS_DUPLICATE_NAME};
use crate::session::{RequestProcessor, Session};
use crate::transport::HttpProcessor;

/// Reads and writes accounts and payment terms in QuickBooks.
///
/// Each call opens its own session and releases it before returning.
pub struct QbGateway<P: RequestProcessor> {
    processor: P,
    config: GatewayConfig,
}

impl QbGateway<HttpProcessor> {
    /// Gateway over the HTTP bridge named in `config.endpoint`.
    pub fn connect(config: GatewayConfig) -> Result<Self, GatewayError> {
        config.validate()?;
        let processor = HttpProcessor::new(&config)?;
        Ok(Self::new(processor, config))
    }
}

impl<P: RequestProcessor> QbGateway<P> {
    pub fn new(processor: P, config: GatewayConfig) -> Self {
        Self { processor, config }
    }

    pub fn config(&self) -> &GatewayConfig {
        &self.config
    }

    fn send(&mut self, request: &str) -> Result<String, GatewayError> {
        let mut session = Session::open(
            &mut self.processor,
            &self.config.app_name,
            &self.config.company_file,
        )?;
        session.process(request)
    }

    /// Every entity of the dataset, tagged `origin = external`.
    pub fn fetch_all(&mut self, dataset: Dataset) -> Result<Vec<Record>, GatewayError> {
        let entity = Entity::for_dataset(dataset);
        let request = qbxml::build_query(entity, &self.config.query_version)?;

        let raw = self.send(&request)?;
        let response = qbxml::parse_response(&raw)?;
        response.check_all()?;

        let records: Vec<Record> = response
            .rets(entity.ret)
            .filter_map(|ret| entity.to_record(ret))
            .collect();

        info!(%dataset, count = records.len(), "fetched from QuickBooks");
        Ok(records)
    }

    /// Create every record in one `continueOnError` request.
    ///
    /// Returns the records QuickBooks confirmed. Rejected adds are logged and
    /// left out; a document-level failure yields an empty list. Transport
    /// failures are returned as errors.
    pub fn create_batch(
        &mut self,
        dataset: Dataset,
        records: &[Record],
    ) -> Result<Vec<Record>, GatewayError> {
        if records.is_empty() {
            return Ok(Vec::new());
        }
        for record in records {
            require_numeric_id(record)?;
        }

        let entity = Entity::for_dataset(dataset);
        let batch: Vec<&Record> = records.iter().collect();
        let request =
            qbxml::build_add(entity, &self.config.add_version, &batch, OnError::ContinueOnError)?;

        let raw = self.send(&request)?;
        let response = match qbxml::parse_response(&raw).and_then(|r| r.check().map(|_| r)) {
            Ok(r) => r,
            Err(e) => {
                warn!(%dataset, error = %e, "batch add failed");
                return Ok(Vec::new());
            }
        };

        let mut created = Vec::new();
        for block in &response.blocks {
            if block.status.code != 0 {
                warn!(
                    request_id = block.request_id.as_deref().unwrap_or("?"),
                    code = block.status.code,
                    message = %block.status.message,
                    "add rejected"
                );
                continue;
            }
            created.extend(
                block
                    .rets
                    .iter()
                    .filter(|r| r.element == entity.ret)
                    .filter_map(|r| entity.to_record(r)),
            );
        }

        info!(%dataset, requested = records.len(), created = created.len(), "batch add finished");
        Ok(created)
    }

    /// Create a single record with `stopOnError`.
    ///
    /// A name already in use counts as present: the input is echoed back as
    /// an external record.
    pub fn create(&mut self, dataset: Dataset, record: &Record) -> Result<Record, GatewayError> {
        require_numeric_id(record)?;

        let entity = Entity::for_dataset(dataset);
        let request =
            qbxml::build_add(entity, &self.config.add_version, &[record], OnError::StopOnError)?;

        let raw = self.send(&request)?;
        let response = qbxml::parse_response(&raw)?;

        match response.check_all() {
            Ok(()) => {}
            Err(GatewayError::Status { code, .. }) if code == STATUS_DUPLICATE_NAME => {
                debug!(id = %record.id, "already present in QuickBooks");
                return Ok(as_external(record));
            }
            Err(e) => return Err(e),
        }

        let created = response
            .rets(entity.ret)
            .find_map(|r| entity.to_record(r))
            .map(|mut stored| {
                if stored.name.is_empty() {
                    stored.name = record.name.clone();
                }
                for (field, value) in &record.fields {
                    stored.fields.entry(field.clone()).or_insert_with(|| value.clone());
                }
                stored
            })
            .unwrap_or_else(|| as_external(record));
        Ok(created)
    }
}

fn require_numeric_id(record: &Record) -> Result<(), GatewayError> {
    match record.id.trim().parse::<i64>() {
        Ok(_) => Ok(()),
        Err(_) => Err(GatewayError::InvalidArgument {
            id: record.id.clone(),
            message: "id must be numeric for QuickBooks".into(),
        }),
    }
}

fn as_external(record: &Record) -> Record {
    Record {
        id: canonical_id(&record.id),
        origin: Origin::External,
        ..record.clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::session::tests::Scripted;
    use acctsync_recon::ErrorKind;

    fn gateway(responses: Vec<&str>) -> QbGateway<Scripted> {
        QbGateway::new(Scripted::replying(responses), GatewayConfig::default())
    }

    fn term(id: &str, name: &str) -> Record {
        Record::new(id, name, Origin::Primary)
    }

    const TERMS_QUERY: &str = r#"<?xml version="1.0" ?>
<QBXML><QBXMLMsgsRs>
<StandardTermsQueryRs requestID="1" statusCode="0" statusSeverity="Info" statusMessage="Status OK">
<StandardTermsRet><Name>Net 30</Name><StdDueDays>30</StdDueDays></StandardTermsRet>
<StandardTermsRet><Name>Due on receipt</Name><StdDueDays>0</StdDueDays></StandardTermsRet>
<StandardTermsRet><Name>Broken</Name><StdDueDays> </StdDueDays></StandardTermsRet>
</StandardTermsQueryRs>
</QBXMLMsgsRs></QBXML>"#;

    #[test]
    fn fetch_all_maps_and_releases_session() {
        let mut gw = gateway(vec![TERMS_QUERY]);
        let records = gw.fetch_all(Dataset::Terms).unwrap();

        let ids: Vec<&str> = records.iter().map(|r| r.id.as_str()).collect();
        assert_eq!(ids, vec!["30", "0"]);
        assert!(records.iter().all(|r| r.origin == Origin::External));

        let p = &gw.processor;
        assert!(p.requests[0].contains("<StandardTermsQueryRq"));
        assert!(p.requests[0].contains("<?qbxml version=\"16.0\"?>"));
        assert_eq!(p.calls.last().map(String::as_str), Some("close"));
    }

    #[test]
    fn fetch_all_empty_status_is_empty() {
        let mut gw = gateway(vec![
            r#"<QBXML><QBXMLMsgsRs><AccountQueryRs statusCode="1" statusMessage="none"/></QBXMLMsgsRs></QBXML>"#,
        ]);
        assert!(gw.fetch_all(Dataset::Accounts).unwrap().is_empty());
    }

    #[test]
    fn fetch_all_error_status_is_external_system() {
        let mut gw = gateway(vec![
            r#"<QBXML><QBXMLMsgsRs><AccountQueryRs statusCode="500" statusMessage="boom"/></QBXMLMsgsRs></QBXML>"#,
        ]);
        let err = gw.fetch_all(Dataset::Accounts).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::ExternalSystem);
        assert!(err.to_string().contains("boom"));
        assert_eq!(gw.processor.calls.last().map(String::as_str), Some("close"));
    }

    #[test]
    fn create_batch_rejects_non_numeric_before_sending() {
        let mut gw = gateway(vec![]);
        let err = gw
            .create_batch(Dataset::Terms, &[term("30", "Net 30"), term("NET", "Bad")])
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidArgument);
        assert!(gw.processor.calls.is_empty());
    }

    #[test]
    fn create_batch_empty_opens_nothing() {
        let mut gw = gateway(vec![]);
        assert!(gw.create_batch(Dataset::Terms, &[]).unwrap().is_empty());
        assert!(gw.processor.calls.is_empty());
    }

    #[test]
    fn create_batch_keeps_confirmed_only() {
        let mut gw = gateway(vec![
            r#"<QBXML><QBXMLMsgsRs>
<StandardTermsAddRs requestID="1" statusCode="0" statusSeverity="Info" statusMessage="Status OK">
<StandardTermsRet><Name>Net 30</Name><StdDueDays>30</StdDueDays></StandardTermsRet>
</StandardTermsAddRs>
<StandardTermsAddRs requestID="2" statusCode="3100" statusSeverity="Error" statusMessage="already in use"/>
</QBXMLMsgsRs></QBXML>"#,
        ]);
        let created = gw
            .create_batch(Dataset::Terms, &[term("30", "Net 30"), term("60", "Net 60")])
            .unwrap();

        assert_eq!(created.len(), 1);
        assert_eq!(created[0].id, "30");
        assert_eq!(created[0].origin, Origin::External);

        let request = &gw.processor.requests[0];
        assert!(request.contains("onError=\"continueOnError\""));
        assert!(request.contains("<?qbxml version=\"13.0\"?>"));
        assert!(request.contains("requestID=\"2\""));
    }

    #[test]
    fn padded_ids_are_sent_canonical() {
        let mut gw = gateway(vec![
            r#"<QBXML><QBXMLMsgsRs><StandardTermsAddRs requestID="1" statusCode="3100" statusMessage="already in use"/></QBXMLMsgsRs></QBXML>"#,
            r#"<QBXML><QBXMLMsgsRs><StandardTermsAddRs requestID="1" statusCode="3100" statusMessage="already in use"/></QBXMLMsgsRs></QBXML>"#,
        ]);
        gw.create_batch(Dataset::Terms, &[term(" 45", "Net 45")]).unwrap();
        assert!(gw.processor.requests[0].contains("<StdDueDays>45</StdDueDays>"));

        let echoed = gw.create(Dataset::Terms, &term("030 ", "Net 30")).unwrap();
        assert!(gw.processor.requests[1].contains("<StdDueDays>30</StdDueDays>"));
        assert_eq!(echoed.id, "30");
    }

    #[test]
    fn create_batch_document_failure_is_empty() {
        let mut gw = gateway(vec!["<QBXML><QBXMLMsgsRs/></QBXML>"]);
        let created = gw.create_batch(Dataset::Terms, &[term("30", "Net 30")]).unwrap();
        assert!(created.is_empty());

        let mut gw = gateway(vec!["not xml <"]);
        assert!(gw.create_batch(Dataset::Terms, &[term("30", "Net 30")]).unwrap().is_empty());
    }

    #[test]
    fn create_batch_transport_failure_propagates() {
        let mut gw = gateway(vec![]);
        let err = gw.create_batch(Dataset::Terms, &[term("30", "Net 30")]).unwrap_err();
        assert!(matches!(err, GatewayError::Transport(_)));
        assert_eq!(gw.processor.calls.last().map(String::as_str), Some("close"));
    }

    #[test]
    fn create_duplicate_name_echoes_input() {
        let mut gw = gateway(vec![
            r#"<QBXML><QBXMLMsgsRs><StandardTermsAddRs requestID="1" statusCode="3100" statusMessage="The name is already in use."/></QBXMLMsgsRs></QBXML>"#,
        ]);
        let record = gw.create(Dataset::Terms, &term("30", "Net 30")).unwrap();
        assert_eq!(record.id, "30");
        assert_eq!(record.name, "Net 30");
        assert_eq!(record.origin, Origin::External);
        assert!(gw.processor.requests[0].contains("onError=\"stopOnError\""));
    }

    #[test]
    fn create_other_error_propagates() {
        let mut gw = gateway(vec![
            r#"<QBXML><QBXMLMsgsRs><AccountAddRs requestID="1" statusCode="3000" statusMessage="invalid"/></QBXMLMsgsRs></QBXML>"#,
        ]);
        let err = gw.create(Dataset::Accounts, &term("1", "Cash")).unwrap_err();
        assert!(matches!(err, GatewayError::Status { code: 3000, .. }));
    }

    #[test]
    fn create_returns_stored_record() {
        let mut gw = gateway(vec![
            r#"<QBXML><QBXMLMsgsRs><AccountAddRs requestID="1" statusCode="0"><AccountRet><Name>Cash</Name><AccountType>Bank</AccountType><Desc>1</Desc></AccountRet></AccountAddRs></QBXMLMsgsRs></QBXML>"#,
        ]);
        let input = term("1", "Cash").with_field("number", "1000");
        let stored = gw.create(Dataset::Accounts, &input).unwrap();
        assert_eq!(stored.field("type"), Some("Bank"));
        assert_eq!(stored.field("number"), Some("1000"));
        assert_eq!(stored.origin, Origin::External);
    }
}
