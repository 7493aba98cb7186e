//! qbXML request building and response parsing.
//!
//! Requests are written with `quick_xml::Writer`, so element text is always
//! escaped. Responses are walked with `quick_xml::Reader`: every element
//! carrying a `statusCode` attribute is one response block, and every `…Ret`
//! element directly inside a block is one returned entity.

use std::collections::BTreeMap;

use acctsync_recon::model::{FIELD_NAME, FIELD_NUMBER, FIELD_TYPE};
use acctsync_recon::{canonical_id, Dataset, Origin, Record};
use quick_xml::events::{BytesDecl, BytesEnd, BytesPI, BytesStart, BytesText, Event};
use quick_xml::{Reader, Writer};

use crate::error::GatewayError;

/// Status code for "no matching objects found" on queries.
pub const STATUS_EMPTY: i64 = 1;
/// Status code for "name already in use" on adds.
pub const STATUS_DUPLICATE_NAME: i64 = 3100;

// ---------------------------------------------------------------------------
// Entity mapping
// ---------------------------------------------------------------------------

/// Source of an element value in an add request.
#[derive(Debug, Clone, Copy)]
enum Value {
    Id,
    Field(&'static str),
}

/// qbXML element names for one dataset.
#[derive(Debug)]
pub struct Entity {
    pub query_rq: &'static str,
    pub add_rq: &'static str,
    pub add: &'static str,
    pub ret: &'static str,
    /// Element holding the value that joins with the spreadsheet id.
    pub id_element: &'static str,
    /// (element, record field, canonicalize as id)
    fields: &'static [(&'static str, &'static str, bool)],
    /// Children of the add aggregate, in schema order.
    add_elements: &'static [(&'static str, Value)],
}

const ACCOUNT: Entity = Entity {
    query_rq: "AccountQueryRq",
    add_rq: "AccountAddRq",
    add: "AccountAdd",
    ret: "AccountRet",
    id_element: "Desc",
    fields: &[
        ("Name", FIELD_NAME, false),
        ("AccountNumber", FIELD_NUMBER, true),
        ("AccountType", FIELD_TYPE, false),
    ],
    add_elements: &[
        ("Name", Value::Field(FIELD_NAME)),
        ("AccountType", Value::Field(FIELD_TYPE)),
        ("AccountNumber", Value::Field(FIELD_NUMBER)),
        ("Desc", Value::Id),
    ],
};

const STANDARD_TERMS: Entity = Entity {
    query_rq: "StandardTermsQueryRq",
    add_rq: "StandardTermsAddRq",
    add: "StandardTermsAdd",
    ret: "StandardTermsRet",
    id_element: "StdDueDays",
    fields: &[("Name", FIELD_NAME, false)],
    add_elements: &[("Name", Value::Field(FIELD_NAME)), ("StdDueDays", Value::Id)],
};

impl Entity {
    pub fn for_dataset(dataset: Dataset) -> &'static Entity {
        match dataset {
            Dataset::Accounts => &ACCOUNT,
            Dataset::Terms => &STANDARD_TERMS,
        }
    }

    /// Map a returned entity to an external record. `None` when the id
    /// element is missing or blank.
    pub fn to_record(&self, ret: &Ret) -> Option<Record> {
        let id = canonical_id(ret.get(self.id_element)?);
        if id.is_empty() {
            return None;
        }

        let mut record = Record::new(id, "", Origin::External);
        for &(element, field, is_numeric) in self.fields {
            let Some(value) = ret.get(element).map(str::trim).filter(|v| !v.is_empty()) else {
                continue;
            };
            let value = if is_numeric {
                canonical_id(value)
            } else {
                value.to_string()
            };
            if field == FIELD_NAME {
                record.name = value;
            } else {
                record.fields.insert(field.to_string(), value);
            }
        }
        Some(record)
    }
}

// ---------------------------------------------------------------------------
// Requests
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OnError {
    StopOnError,
    ContinueOnError,
}

impl OnError {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::StopOnError => "stopOnError",
            Self::ContinueOnError => "continueOnError",
        }
    }
}

fn emit<W: std::io::Write>(writer: &mut Writer<W>, event: Event<'_>) -> Result<(), GatewayError> {
    writer
        .write_event(event)
        .map_err(|e| GatewayError::Xml(e.to_string()))
}

/// Write the document prologue and open `QBXML` / `QBXMLMsgsRq`.
fn begin_document(version: &str, on_error: OnError) -> Result<Writer<Vec<u8>>, GatewayError> {
    let mut w = Writer::new_with_indent(Vec::new(), b' ', 2);
    emit(&mut w, Event::Decl(BytesDecl::new("1.0", Some("utf-8"), None)))?;
    emit(&mut w, Event::PI(BytesPI::new(format!("qbxml version=\"{version}\""))))?;
    emit(&mut w, Event::Start(BytesStart::new("QBXML")))?;
    emit(
        &mut w,
        Event::Start(BytesStart::new("QBXMLMsgsRq").with_attributes([("onError", on_error.as_str())])),
    )?;
    Ok(w)
}

fn end_document(mut w: Writer<Vec<u8>>) -> Result<String, GatewayError> {
    emit(&mut w, Event::End(BytesEnd::new("QBXMLMsgsRq")))?;
    emit(&mut w, Event::End(BytesEnd::new("QBXML")))?;
    String::from_utf8(w.into_inner()).map_err(|e| GatewayError::Xml(e.to_string()))
}

/// Query request for every entity of the dataset.
pub fn build_query(entity: &Entity, version: &str) -> Result<String, GatewayError> {
    let mut w = begin_document(version, OnError::StopOnError)?;
    emit(
        &mut w,
        Event::Empty(BytesStart::new(entity.query_rq).with_attributes([("requestID", "1")])),
    )?;
    end_document(w)
}

/// One add request per record, `requestID` = position + 1.
///
/// The id is written in canonical form. Secondary fields the record lacks
/// are omitted.
pub fn build_add(
    entity: &Entity,
    version: &str,
    records: &[&Record],
    on_error: OnError,
) -> Result<String, GatewayError> {
    let mut w = begin_document(version, on_error)?;

    for (idx, record) in records.iter().enumerate() {
        let request_id = (idx + 1).to_string();
        emit(
            &mut w,
            Event::Start(BytesStart::new(entity.add_rq).with_attributes([("requestID", request_id.as_str())])),
        )?;
        emit(&mut w, Event::Start(BytesStart::new(entity.add)))?;

        for &(element, source) in entity.add_elements {
            let value = match source {
                Value::Id => Some(canonical_id(&record.id)),
                Value::Field(field) => record.field(field).map(str::to_string),
            };
            let Some(value) = value.filter(|v| !v.is_empty()) else {
                continue;
            };
            emit(&mut w, Event::Start(BytesStart::new(element)))?;
            emit(&mut w, Event::Text(BytesText::new(&value)))?;
            emit(&mut w, Event::End(BytesEnd::new(element)))?;
        }

        emit(&mut w, Event::End(BytesEnd::new(entity.add)))?;
        emit(&mut w, Event::End(BytesEnd::new(entity.add_rq)))?;
    }

    end_document(w)
}

// ---------------------------------------------------------------------------
// Responses
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Status {
    pub code: i64,
    pub severity: String,
    pub message: String,
}

impl Status {
    /// `0` and `1` (no matching objects) are both success.
    pub fn is_ok(&self) -> bool {
        self.code == 0 || self.code == STATUS_EMPTY
    }

    pub fn into_error(self) -> GatewayError {
        GatewayError::Status {
            code: self.code,
            message: self.message,
        }
    }
}

/// A returned entity: text of its direct children by element name.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Ret {
    pub element: String,
    values: BTreeMap<String, String>,
}

impl Ret {
    pub fn get(&self, element: &str) -> Option<&str> {
        self.values.get(element).map(String::as_str)
    }
}

/// One `…Rs` element.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResponseBlock {
    pub element: String,
    pub request_id: Option<String>,
    pub status: Status,
    pub rets: Vec<Ret>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Response {
    /// Status on `QBXMLMsgsRs` itself, reported when the whole document is rejected.
    pub envelope: Option<Status>,
    pub blocks: Vec<ResponseBlock>,
}

impl Response {
    /// Document-level check: the envelope must not carry an error and at
    /// least one element must carry status information.
    pub fn check(&self) -> Result<(), GatewayError> {
        if let Some(status) = &self.envelope {
            if !status.is_ok() {
                return Err(status.clone().into_error());
            }
        }
        if self.envelope.is_none() && self.blocks.is_empty() {
            return Err(GatewayError::MissingStatus);
        }
        Ok(())
    }

    /// `check` plus every block must succeed.
    pub fn check_all(&self) -> Result<(), GatewayError> {
        self.check()?;
        match self.blocks.iter().find(|b| !b.status.is_ok()) {
            Some(block) => Err(block.status.clone().into_error()),
            None => Ok(()),
        }
    }

    pub fn rets<'a>(&'a self, element: &'a str) -> impl Iterator<Item = &'a Ret> + 'a {
        self.blocks
            .iter()
            .flat_map(|b| b.rets.iter())
            .filter(move |r| r.element == element)
    }
}

fn read_status(e: &BytesStart<'_>) -> (Option<Status>, Option<String>) {
    let mut code = None;
    let mut severity = String::new();
    let mut message = String::new();
    let mut request_id = None;

    for attr in e.attributes().flatten() {
        let value = String::from_utf8_lossy(&attr.value).to_string();
        match attr.key.as_ref() {
            b"statusCode" => code = Some(value.trim().parse::<i64>().unwrap_or(-1)),
            b"statusSeverity" => severity = value,
            b"statusMessage" => message = unescape(&value),
            b"requestID" => request_id = Some(value),
            _ => {}
        }
    }

    let status = code.map(|code| Status {
        code,
        severity,
        message,
    });
    (status, request_id)
}

fn unescape(raw: &str) -> String {
    quick_xml::escape::unescape(raw)
        .map(|s| s.into_owned())
        .unwrap_or_else(|_| raw.to_string())
}

/// Parse a qbXML response document.
pub fn parse_response(xml: &str) -> Result<Response, GatewayError> {
    let mut reader = Reader::from_str(xml);
    reader.config_mut().trim_text(false); // keep spaces around entity references
    let mut buf = Vec::new();

    let mut response = Response::default();
    let mut depth = 0usize;
    // Depth of the open response block, of the open Ret, and the open Ret child.
    let mut block_depth: Option<usize> = None;
    let mut ret: Option<(usize, Ret)> = None;
    let mut child: Option<(String, String)> = None;

    loop {
        let event = reader
            .read_event_into(&mut buf)
            .map_err(|e| GatewayError::Xml(e.to_string()))?;

        match event {
            Event::Start(ref e) | Event::Empty(ref e) => {
                let is_empty = matches!(event, Event::Empty(_));
                let name = String::from_utf8_lossy(e.name().as_ref()).to_string();
                depth += 1;

                if name == "QBXMLMsgsRs" {
                    response.envelope = read_status(e).0;
                } else if block_depth.is_none() {
                    if let (Some(status), request_id) = read_status(e) {
                        response.blocks.push(ResponseBlock {
                            element: name,
                            request_id,
                            status,
                            rets: Vec::new(),
                        });
                        block_depth = Some(depth);
                    }
                } else if ret.is_none() && Some(depth - 1) == block_depth && name.ends_with("Ret") {
                    ret = Some((
                        depth,
                        Ret {
                            element: name,
                            values: BTreeMap::new(),
                        },
                    ));
                } else if let Some((ret_depth, _)) = &ret {
                    if depth == ret_depth + 1 {
                        child = Some((name, String::new()));
                    }
                }

                if is_empty {
                    close_element(&mut depth, &mut block_depth, &mut ret, &mut child, &mut response);
                }
            }
            Event::Text(ref t) => {
                if let Some(text) = child_text(depth, &ret, &mut child) {
                    text.push_str(&unescape(&String::from_utf8_lossy(t.as_ref())));
                }
            }
            Event::CData(ref t) => {
                if let Some(text) = child_text(depth, &ret, &mut child) {
                    text.push_str(&String::from_utf8_lossy(t.as_ref()));
                }
            }
            Event::GeneralRef(ref r) => {
                if let Some(text) = child_text(depth, &ret, &mut child) {
                    text.push_str(&unescape(&format!("&{};", String::from_utf8_lossy(r.as_ref()))));
                }
            }
            Event::End(_) => {
                close_element(&mut depth, &mut block_depth, &mut ret, &mut child, &mut response);
            }
            Event::Eof => break,
            _ => {}
        }
        buf.clear();
    }

    Ok(response)
}

/// Text buffer of the open Ret child, only while no deeper element is open.
fn child_text<'c>(
    depth: usize,
    ret: &Option<(usize, Ret)>,
    child: &'c mut Option<(String, String)>,
) -> Option<&'c mut String> {
    match ret {
        Some((ret_depth, _)) if depth == ret_depth + 1 => child.as_mut().map(|(_, text)| text),
        _ => None,
    }
}

fn close_element(
    depth: &mut usize,
    block_depth: &mut Option<usize>,
    ret: &mut Option<(usize, Ret)>,
    child: &mut Option<(String, String)>,
    response: &mut Response,
) {
    if let Some((ret_depth, current)) = ret.as_mut() {
        if *depth == *ret_depth + 1 {
            if let Some((name, text)) = child.take() {
                current.values.insert(name, text);
            }
        }
    }

    if ret.as_ref().is_some_and(|(d, _)| *d == *depth) {
        if let (Some((_, done)), Some(block)) = (ret.take(), response.blocks.last_mut()) {
            block.rets.push(done);
        }
    }

    if *block_depth == Some(*depth) {
        *block_depth = None;
    }

    *depth = depth.saturating_sub(1);
}
