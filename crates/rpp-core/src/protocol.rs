//! Wire protocol types
//!
//! The core is transport-free: a request is a (method, path, body, headers)
//! tuple and a response is an envelope of status code, status message and
//! operation-specific fields. The HTTP collaborator moves these to and from
//! the socket; correlation identifiers travel as headers.

use base64::{Engine as _, engine::general_purpose::STANDARD as BASE64};
use serde_json::{Map, Value, json};
use uuid::Uuid;

use crate::error::Error;

/// Media type of every response body
pub const CONTENT_TYPE: &str = "application/rpp+json";

/// Header carrying the client transaction id
pub const CLTRID_HEADER: &str = "RPP-Cltrid";

/// Header carrying the server transaction id
pub const SVTRID_HEADER: &str = "RPP-Svtrid";

/// HTTP method of a request
///
/// Methods outside the protocol's set are kept verbatim so rejections can
/// name them.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Method {
    Head,
    Get,
    Put,
    Post,
    Patch,
    Delete,
    Other(String),
}

impl Method {
    /// Parse a method name (case-sensitive, per HTTP)
    pub fn parse(s: &str) -> Self {
        match s {
            "HEAD" => Self::Head,
            "GET" => Self::Get,
            "PUT" => Self::Put,
            "POST" => Self::Post,
            "PATCH" => Self::Patch,
            "DELETE" => Self::Delete,
            other => Self::Other(other.to_string()),
        }
    }

    /// The method name as it appeared on the wire
    pub fn as_str(&self) -> &str {
        match self {
            Self::Head => "HEAD",
            Self::Get => "GET",
            Self::Put => "PUT",
            Self::Post => "POST",
            Self::Patch => "PATCH",
            Self::Delete => "DELETE",
            Self::Other(s) => s,
        }
    }
}

impl std::fmt::Display for Method {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Parsed registrar credentials
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Credentials {
    /// Registrar handle (the Basic username)
    pub registrar: u32,
    /// Shared secret (the Basic password)
    pub secret: String,
}

/// Parse an HTTP Basic authorization header value
///
/// Returns `None` for anything that does not decode to a numeric registrar
/// id and a password: a malformed header means "unauthenticated", never a
/// hard failure.
pub fn parse_basic(header: &str) -> Option<Credentials> {
    let encoded = header.strip_prefix("Basic ")?;
    let decoded = BASE64.decode(encoded.trim()).ok()?;
    let decoded = String::from_utf8(decoded).ok()?;
    let (user, secret) = decoded.split_once(':')?;
    let registrar = user.parse().ok()?;
    Some(Credentials {
        registrar,
        secret: secret.to_string(),
    })
}

/// One protocol request, as handed over by the transport
#[derive(Debug, Clone)]
pub struct Request {
    pub method: Method,
    pub path: String,
    /// Raw JSON body, if the transport received one
    pub body: Option<String>,
    /// Raw Authorization header value, if present
    pub authorization: Option<String>,
    /// Client transaction id, if the client supplied one
    pub cltrid: Option<String>,
}

impl Request {
    /// Build a request without body or credentials
    pub fn new(method: Method, path: impl Into<String>) -> Self {
        Self {
            method,
            path: path.into(),
            body: None,
            authorization: None,
            cltrid: None,
        }
    }

    /// Attach a JSON body
    pub fn with_body(mut self, body: impl Into<String>) -> Self {
        self.body = Some(body.into());
        self
    }

    /// Attach Basic credentials for a registrar
    pub fn with_credentials(mut self, registrar: u32, secret: &str) -> Self {
        let token = BASE64.encode(format!("{registrar}:{secret}"));
        self.authorization = Some(format!("Basic {token}"));
        self
    }

    /// Attach a client transaction id
    pub fn with_cltrid(mut self, cltrid: impl Into<String>) -> Self {
        self.cltrid = Some(cltrid.into());
        self
    }

    /// The credentials carried by the request, if usable
    pub fn credentials(&self) -> Option<Credentials> {
        self.authorization.as_deref().and_then(parse_basic)
    }
}

/// The response envelope
///
/// `status_code` and `status_message` are merged into the JSON body next to
/// the operation-specific fields; the correlation ids travel as headers.
/// `svtrid` is a fresh collision-resistant identifier on every response.
#[derive(Debug, Clone)]
pub struct Response {
    pub status_code: u16,
    pub status_message: String,
    pub fields: Map<String, Value>,
    pub cltrid: Option<String>,
    pub svtrid: String,
}

impl Response {
    /// Build a response from status parts
    pub fn new(status_code: u16, status_message: impl Into<String>) -> Self {
        Self {
            status_code,
            status_message: status_message.into(),
            fields: Map::new(),
            cltrid: None,
            svtrid: Uuid::new_v4().to_string(),
        }
    }

    /// 200 OK with a `result` text
    pub fn ok(result: impl Into<String>) -> Self {
        Self::new(200, "OK").with_result(result)
    }

    /// Build the response for a failed operation
    pub fn from_error(err: &Error) -> Self {
        Self::new(err.status_code(), err.status_message()).with_result(err.to_string())
    }

    /// Set the `result` field
    pub fn with_result(self, result: impl Into<String>) -> Self {
        self.with_field("result", Value::String(result.into()))
    }

    /// Set an operation-specific field
    pub fn with_field(mut self, key: &str, value: Value) -> Self {
        self.fields.insert(key.to_string(), value);
        self
    }

    /// Echo the client transaction id
    pub fn with_cltrid(mut self, cltrid: Option<String>) -> Self {
        self.cltrid = cltrid;
        self
    }

    /// The complete JSON body
    pub fn to_json(&self) -> Value {
        let mut body = self.fields.clone();
        body.insert("status_code".to_string(), json!(self.status_code));
        body.insert("status_message".to_string(), json!(self.status_message));
        Value::Object(body)
    }

    /// The serialized body, CRLF-terminated
    pub fn to_body(&self) -> String {
        format!("{}\r\n", self.to_json())
    }
}
