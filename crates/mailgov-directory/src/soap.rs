//! SOAP envelope codec.
//!
//! Requests are built by escaped string assembly; responses are parsed with a
//! single-pass `quick_xml` event reader matching on local names, so namespaced
//! and un-namespaced variants of the same element parse identically.

use quick_xml::events::Event;
use quick_xml::Reader;

use crate::constants::{
    ACCOUNT_ATTRS, A_ACCOUNT_STATUS, A_COS_ID, A_DISPLAY_NAME, A_FORWARDING, A_LAST_LOGON,
    A_MAIL_HOST, A_MAIL_QUOTA, A_PREF_FORWARDING,
};
use crate::types::{AccountBy, AccountPage, RemoteAccount};

/// An in-band protocol fault carried inside a successful HTTP response.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SoapFault {
    /// Human-readable fault reason.
    pub message: String,
    /// Directory fault code, e.g. `account.NO_SUCH_ACCOUNT`.
    pub code: Option<String>,
}

/// A parsed response body: either the operation's value or a fault.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SoapOutcome<T> {
    Value(T),
    Fault(SoapFault),
}

/// Malformed-response error: the body was not a recognizable envelope for
/// the operation. Distinct from a fault, which is a well-formed response.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MalformedResponse(pub String);

impl std::fmt::Display for MalformedResponse {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "malformed directory response: {}", self.0)
    }
}

impl std::error::Error for MalformedResponse {}

type ParseResult<T> = Result<SoapOutcome<T>, MalformedResponse>;

// ── Request building ──────────────────────────────────────────────────────

const ENVELOPE_OPEN: &str = concat!(
    r#"<?xml version="1.0" encoding="UTF-8"?>"#,
    r#"<soap:Envelope xmlns:soap="http://www.w3.org/2003/05/soap-envelope">"#,
);
const ENVELOPE_CLOSE: &str = "</soap:Envelope>";
const HEADER_NO_AUTH: &str = r#"<soap:Header><context xmlns="urn:zimbra"/></soap:Header>"#;

/// Escape text for use in XML content or attribute values.
#[must_use]
pub fn xml_escape(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    for c in raw.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&apos;"),
            _ => out.push(c),
        }
    }
    out
}

fn wrap(body: &str, auth_token: Option<&str>) -> String {
    let mut xml = String::with_capacity(body.len() + 256);
    xml.push_str(ENVELOPE_OPEN);
    match auth_token {
        Some(token) => {
            xml.push_str(r#"<soap:Header><context xmlns="urn:zimbra"><authToken>"#);
            xml.push_str(&xml_escape(token));
            xml.push_str("</authToken><nosession/></context></soap:Header>");
        }
        None => xml.push_str(HEADER_NO_AUTH),
    }
    xml.push_str("<soap:Body>");
    xml.push_str(body);
    xml.push_str("</soap:Body>");
    xml.push_str(ENVELOPE_CLOSE);
    xml
}

/// Build an `AuthRequest` envelope.
#[must_use]
pub fn build_auth_request(username: &str, password: &str) -> String {
    let body = format!(
        r#"<AuthRequest xmlns="urn:zimbraAdmin"><name>{}</name><password>{}</password></AuthRequest>"#,
        xml_escape(username),
        xml_escape(password),
    );
    wrap(&body, None)
}

/// Build a `SearchDirectoryRequest` envelope for one page of accounts.
#[must_use]
pub fn build_search_request(
    auth_token: &str,
    query: &str,
    domain: &str,
    limit: u32,
    offset: u32,
) -> String {
    let mut body = format!(
        r#"<SearchDirectoryRequest xmlns="urn:zimbraAdmin" limit="{limit}" offset="{offset}" types="accounts" sortBy="name" sortAscending="1" attrs="{}""#,
        xml_escape(&ACCOUNT_ATTRS.join(",")),
    );
    if !domain.is_empty() {
        body.push_str(&format!(r#" domain="{}""#, xml_escape(domain)));
    }
    body.push('>');
    if !query.is_empty() {
        body.push_str(&format!("<query>{}</query>", xml_escape(query)));
    }
    body.push_str("</SearchDirectoryRequest>");
    wrap(&body, Some(auth_token))
}

/// Build a `GetAccountRequest` envelope.
#[must_use]
pub fn build_get_account_request(auth_token: &str, by: AccountBy, key: &str) -> String {
    let body = format!(
        r#"<GetAccountRequest xmlns="urn:zimbraAdmin"><account by="{}">{}</account></GetAccountRequest>"#,
        by.as_str(),
        xml_escape(key),
    );
    wrap(&body, Some(auth_token))
}

/// Build a `ModifyAccountRequest` envelope.
#[must_use]
pub fn build_modify_request(auth_token: &str, id: &str, attrs: &[(String, String)]) -> String {
    let mut body = format!(
        r#"<ModifyAccountRequest xmlns="urn:zimbraAdmin"><id>{}</id>"#,
        xml_escape(id),
    );
    for (name, value) in attrs {
        body.push_str(&format!(
            r#"<a n="{}">{}</a>"#,
            xml_escape(name),
            xml_escape(value),
        ));
    }
    body.push_str("</ModifyAccountRequest>");
    wrap(&body, Some(auth_token))
}

/// Build a `GetMailboxRequest` envelope.
#[must_use]
pub fn build_get_mailbox_request(auth_token: &str, id: &str) -> String {
    let body = format!(
        r#"<GetMailboxRequest xmlns="urn:zimbraAdmin"><mbox id="{}"/></GetMailboxRequest>"#,
        xml_escape(id),
    );
    wrap(&body, Some(auth_token))
}

/// Build a `DeleteAccountRequest` envelope.
#[must_use]
pub fn build_delete_request(auth_token: &str, id: &str) -> String {
    let body = format!(
        r#"<DeleteAccountRequest xmlns="urn:zimbraAdmin"><id>{}</id></DeleteAccountRequest>"#,
        xml_escape(id),
    );
    wrap(&body, Some(auth_token))
}

// ── Response parsing ──────────────────────────────────────────────────────

fn local(name: &[u8]) -> &str {
    std::str::from_utf8(name).unwrap_or("")
}

/// Scan a response body for a fault element.
///
/// Prefers the `Reason/Text` message; falls back to the detail `Trace`. The
/// detail `Code` rides along when present. Returns `None` for fault-free
/// bodies; malformed XML is reported as an error.
pub fn scan_fault(xml: &str) -> Result<Option<SoapFault>, MalformedResponse> {
    let mut reader = Reader::from_str(xml);
    reader.config_mut().trim_text(true);

    let mut in_fault = false;
    let mut in_detail = false;
    let mut capture: Option<&'static str> = None;
    let mut reason = None;
    let mut trace = None;
    let mut code = None;
    let mut saw_fault = false;

    loop {
        match reader.read_event() {
            Ok(Event::Start(e)) => match local(e.local_name().as_ref()) {
                "Fault" => {
                    in_fault = true;
                    saw_fault = true;
                }
                "Detail" if in_fault => in_detail = true,
                "Text" if in_fault => capture = Some("text"),
                // The fault-level Code/Value pair carries the generic SOAP
                // sender/receiver class; only the detail Code is the
                // directory's error code.
                "Code" if in_detail => capture = Some("code"),
                "Trace" if in_detail => capture = Some("trace"),
                _ => {}
            },
            Ok(Event::Text(e)) => {
                if let Some(slot) = capture {
                    let value = e.unescape().unwrap_or_default().to_string();
                    match slot {
                        "text" => reason = Some(value),
                        "trace" => trace = Some(value),
                        "code" => code = Some(value),
                        _ => {}
                    }
                }
            }
            Ok(Event::End(e)) => {
                match local(e.local_name().as_ref()) {
                    "Fault" => in_fault = false,
                    "Detail" => in_detail = false,
                    "Text" | "Code" | "Trace" => capture = None,
                    _ => {}
                }
            }
            Ok(Event::Eof) => break,
            Err(e) => return Err(MalformedResponse(format!("XML parse error: {e}"))),
            _ => {}
        }
    }

    if !saw_fault {
        return Ok(None);
    }
    let message = reason
        .or(trace)
        .unwrap_or_else(|| "unknown SOAP fault".to_string());
    Ok(Some(SoapFault { message, code }))
}

/// Parse an `AuthResponse`, extracting the auth token.
pub fn parse_auth_response(xml: &str) -> ParseResult<String> {
    if let Some(fault) = scan_fault(xml)? {
        return Ok(SoapOutcome::Fault(fault));
    }

    let mut reader = Reader::from_str(xml);
    reader.config_mut().trim_text(true);
    let mut in_token = false;

    loop {
        match reader.read_event() {
            Ok(Event::Start(e)) => {
                if local(e.local_name().as_ref()) == "authToken" {
                    in_token = true;
                }
            }
            Ok(Event::Text(e)) => {
                if in_token {
                    let token = e.unescape().unwrap_or_default().to_string();
                    if !token.is_empty() {
                        return Ok(SoapOutcome::Value(token));
                    }
                }
            }
            Ok(Event::End(e)) => {
                if local(e.local_name().as_ref()) == "authToken" {
                    in_token = false;
                }
            }
            Ok(Event::Eof) => break,
            Err(e) => return Err(MalformedResponse(format!("XML parse error: {e}"))),
            _ => {}
        }
    }

    Err(MalformedResponse("no authToken in AuthResponse".to_string()))
}

/// Streaming builder for one `<account>` element.
#[derive(Default)]
struct AccountBuilder {
    account: RemoteAccount,
    attr_name: Option<String>,
}

impl AccountBuilder {
    fn start(e: &quick_xml::events::BytesStart<'_>) -> Self {
        let mut builder = Self::default();
        for attr in e.attributes().flatten() {
            let value = attr.unescape_value().unwrap_or_default().to_string();
            match local(attr.key.as_ref()) {
                "id" => builder.account.id = value.into(),
                "name" => builder.account.name = value,
                _ => {}
            }
        }
        builder
    }

    fn set_attr(&mut self, value: String) {
        let Some(name) = self.attr_name.as_deref() else {
            return;
        };
        // Unknown attributes fall through: the typed struct holds exactly
        // the fields the engine consumes.
        match name {
            A_DISPLAY_NAME => self.account.display_name = value,
            A_ACCOUNT_STATUS => self.account.status = value,
            A_FORWARDING => self.account.forwarding_address = value,
            A_PREF_FORWARDING => self.account.pref_forwarding_address = value,
            A_MAIL_QUOTA => self.account.mail_quota = value,
            A_LAST_LOGON => self.account.last_logon = value,
            A_COS_ID => self.account.cos_id = value,
            A_MAIL_HOST => self.account.mail_host = value,
            _ => {}
        }
    }
}

/// Parse a `SearchDirectoryResponse` into one page of accounts.
pub fn parse_search_response(xml: &str) -> ParseResult<AccountPage> {
    if let Some(fault) = scan_fault(xml)? {
        return Ok(SoapOutcome::Fault(fault));
    }

    let mut reader = Reader::from_str(xml);
    reader.config_mut().trim_text(true);

    let mut page = AccountPage::default();
    let mut saw_response = false;
    let mut current: Option<AccountBuilder> = None;

    loop {
        match reader.read_event() {
            Ok(Event::Start(e) | Event::Empty(e)) => {
                match local(e.local_name().as_ref()) {
                    "SearchDirectoryResponse" => {
                        saw_response = true;
                        for attr in e.attributes().flatten() {
                            let value = attr.unescape_value().unwrap_or_default();
                            match local(attr.key.as_ref()) {
                                "more" => page.more = value.eq_ignore_ascii_case("true") || value.as_ref() == "1",
                                "searchTotal" => page.total = value.parse().unwrap_or(0),
                                _ => {}
                            }
                        }
                    }
                    "account" => current = Some(AccountBuilder::start(&e)),
                    "a" => {
                        if let Some(builder) = current.as_mut() {
                            for attr in e.attributes().flatten() {
                                if local(attr.key.as_ref()) == "n" {
                                    builder.attr_name =
                                        Some(attr.unescape_value().unwrap_or_default().to_string());
                                }
                            }
                        }
                    }
                    _ => {}
                }
            }
            Ok(Event::Text(e)) => {
                if let Some(builder) = current.as_mut() {
                    if builder.attr_name.is_some() {
                        builder.set_attr(e.unescape().unwrap_or_default().to_string());
                    }
                }
            }
            Ok(Event::End(e)) => match local(e.local_name().as_ref()) {
                "account" => {
                    if let Some(builder) = current.take() {
                        page.accounts.push(builder.account);
                    }
                }
                "a" => {
                    if let Some(builder) = current.as_mut() {
                        builder.attr_name = None;
                    }
                }
                _ => {}
            },
            Ok(Event::Eof) => break,
            Err(e) => return Err(MalformedResponse(format!("XML parse error: {e}"))),
            _ => {}
        }
    }

    if !saw_response {
        return Err(MalformedResponse(
            "no SearchDirectoryResponse in body".to_string(),
        ));
    }
    if page.total == 0 {
        page.total = page.accounts.len() as u64;
    }
    Ok(SoapOutcome::Value(page))
}

/// Parse a `GetAccountResponse` into a single account.
pub fn parse_get_account_response(xml: &str) -> ParseResult<RemoteAccount> {
    if let Some(fault) = scan_fault(xml)? {
        return Ok(SoapOutcome::Fault(fault));
    }

    let mut reader = Reader::from_str(xml);
    reader.config_mut().trim_text(true);
    let mut current: Option<AccountBuilder> = None;

    loop {
        match reader.read_event() {
            Ok(Event::Start(e) | Event::Empty(e)) => match local(e.local_name().as_ref()) {
                "account" if current.is_none() => current = Some(AccountBuilder::start(&e)),
                "a" => {
                    if let Some(builder) = current.as_mut() {
                        for attr in e.attributes().flatten() {
                            if local(attr.key.as_ref()) == "n" {
                                builder.attr_name =
                                    Some(attr.unescape_value().unwrap_or_default().to_string());
                            }
                        }
                    }
                }
                _ => {}
            },
            Ok(Event::Text(e)) => {
                if let Some(builder) = current.as_mut() {
                    if builder.attr_name.is_some() {
                        builder.set_attr(e.unescape().unwrap_or_default().to_string());
                    }
                }
            }
            Ok(Event::End(e)) => match local(e.local_name().as_ref()) {
                "account" => {
                    if let Some(builder) = current.take() {
                        return Ok(SoapOutcome::Value(builder.account));
                    }
                }
                "a" => {
                    if let Some(builder) = current.as_mut() {
                        builder.attr_name = None;
                    }
                }
                _ => {}
            },
            Ok(Event::Eof) => break,
            Err(e) => return Err(MalformedResponse(format!("XML parse error: {e}"))),
            _ => {}
        }
    }

    Err(MalformedResponse("no account in GetAccountResponse".to_string()))
}

/// Parse a `GetMailboxResponse`, extracting the mailbox size in bytes.
///
/// A missing or unparseable size reads as 0; mailbox size is telemetry.
pub fn parse_mailbox_response(xml: &str) -> ParseResult<u64> {
    if let Some(fault) = scan_fault(xml)? {
        return Ok(SoapOutcome::Fault(fault));
    }

    let mut reader = Reader::from_str(xml);
    reader.config_mut().trim_text(true);

    loop {
        match reader.read_event() {
            Ok(Event::Start(e) | Event::Empty(e)) => {
                if local(e.local_name().as_ref()) == "mbox" {
                    for attr in e.attributes().flatten() {
                        if local(attr.key.as_ref()) == "s" {
                            let size = attr
                                .unescape_value()
                                .unwrap_or_default()
                                .parse()
                                .unwrap_or(0);
                            return Ok(SoapOutcome::Value(size));
                        }
                    }
                    return Ok(SoapOutcome::Value(0));
                }
            }
            Ok(Event::Eof) => break,
            Err(e) => return Err(MalformedResponse(format!("XML parse error: {e}"))),
            _ => {}
        }
    }

    Ok(SoapOutcome::Value(0))
}

/// Parse an acknowledgement-only response (modify, delete).
pub fn parse_ack_response(xml: &str) -> ParseResult<()> {
    match scan_fault(xml)? {
        Some(fault) => Ok(SoapOutcome::Fault(fault)),
        None => Ok(SoapOutcome::Value(())),
    }
}
