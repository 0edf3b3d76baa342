//! Apistore Interface: contracts between the request executor and its collaborators
//!
//! This crate defines the seams the executor is built on, so the executor never depends
//! on a concrete HTTP stack, reachability monitor, or payload format.
//!
//! # Architecture
//!
//! - **Endpoint**: an immutable description of one call, naming its response type
//! - **ConnectivityGate**: a synchronous "is the network reachable right now" signal
//! - **Transport**: issues a call and reports the result through a one-shot completion
//! - **Decoder**: turns raw bytes into a typed value
//!
//! # Example
//!
//! ```rust
//! use apistore_interface::{Endpoint, Method, ParameterEncoding, Parameters, ResponseBody};
//! use serde::Deserialize;
//!
//! #[derive(Deserialize)]
//! struct Berry {
//!     id: u32,
//!     name: String,
//! }
//!
//! impl ResponseBody for Berry {}
//!
//! struct GetBerry(u32);
//!
//! impl Endpoint for GetBerry {
//!     type Response = Berry;
//!
//!     fn url(&self) -> String {
//!         format!("berry/{}", self.0)
//!     }
//! }
//!
//! let endpoint = GetBerry(7);
//! assert_eq!(endpoint.method(), Method::Get);
//! assert_eq!(endpoint.encoding(), ParameterEncoding::Url);
//! assert!(endpoint.parameters().is_empty());
//! ```

use bytes::Bytes;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;
use thiserror::Error;

/// Boxed error used to preserve underlying causes across the contract boundary
pub type BoxError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// Request parameters, encoded according to the endpoint's [`ParameterEncoding`]
pub type Parameters = serde_json::Map<String, Value>;

/// Request or response headers
pub type Headers = BTreeMap<String, String>;

/// One-shot completion handed to [`Transport::issue`]
///
/// Invoked at most once, from whatever thread the transport finishes on.
pub type Completion = Box<dyn FnOnce(Result<RawResponse, TransportError>) + Send + 'static>;

// ═══════════════════════════════════════════════════════════════════════════
// Errors
// ═══════════════════════════════════════════════════════════════════════════

/// Failures reported by a [`Transport`]
#[derive(Error, Debug)]
pub enum TransportError {
    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    #[error("Connection failed: {0}")]
    Connect(#[source] BoxError),

    #[error("Request timed out: {0}")]
    Timeout(#[source] BoxError),

    #[error("Protocol error: {0}")]
    Protocol(#[source] BoxError),

    #[error("Response status {status} is outside the accepted range")]
    UnacceptableStatus { status: u16, body: Bytes },

    #[error("Transport dropped the completion without reporting a result")]
    CompletionDropped,
}

impl TransportError {
    /// Whether a caller-side retry could plausibly succeed
    pub fn is_transient(&self) -> bool {
        match self {
            TransportError::Connect(_) | TransportError::Timeout(_) => true,
            TransportError::UnacceptableStatus { status, .. } => *status == 429 || *status >= 500,
            TransportError::InvalidRequest(_)
            | TransportError::Protocol(_)
            | TransportError::CompletionDropped => false,
        }
    }

    /// HTTP status carried by the error, if any
    pub fn status(&self) -> Option<u16> {
        match self {
            TransportError::UnacceptableStatus { status, .. } => Some(*status),
            _ => None,
        }
    }
}

/// A payload that could not be turned into the requested type
#[derive(Error, Debug)]
#[error("Failed to decode response as `{target}`: {source}")]
pub struct DecodeError {
    target: &'static str,
    #[source]
    source: BoxError,
}

impl DecodeError {
    /// Create a decode error for target type `T`
    pub fn new<T: ?Sized>(source: impl Into<BoxError>) -> Self {
        Self {
            target: std::any::type_name::<T>(),
            source: source.into(),
        }
    }

    /// Name of the type the payload was decoded into
    pub fn target(&self) -> &'static str {
        self.target
    }
}

// ═══════════════════════════════════════════════════════════════════════════
// Request description
// ═══════════════════════════════════════════════════════════════════════════

/// HTTP verb of an endpoint call
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Method {
    Get,
    Head,
    Post,
    Put,
    Patch,
    Delete,
    Options,
}

impl Method {
    pub fn as_str(&self) -> &'static str {
        match self {
            Method::Get => "GET",
            Method::Head => "HEAD",
            Method::Post => "POST",
            Method::Put => "PUT",
            Method::Patch => "PATCH",
            Method::Delete => "DELETE",
            Method::Options => "OPTIONS",
        }
    }

    /// Whether URL-encoded parameters go into the query string for this verb
    pub fn encodes_in_url(&self) -> bool {
        matches!(self, Method::Get | Method::Head | Method::Delete)
    }
}

impl fmt::Display for Method {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// How an endpoint's parameters are put on the wire
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ParameterEncoding {
    /// Query string for GET/HEAD/DELETE, form body for everything else
    #[default]
    Url,
    /// Always the query string
    QueryString,
    /// JSON request body
    Json,
}

/// Where encoded parameters end up for a given verb
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParameterPlacement {
    Query,
    FormBody,
    JsonBody,
}

impl ParameterEncoding {
    pub fn placement(&self, method: Method) -> ParameterPlacement {
        match self {
            ParameterEncoding::Url if method.encodes_in_url() => ParameterPlacement::Query,
            ParameterEncoding::Url => ParameterPlacement::FormBody,
            ParameterEncoding::QueryString => ParameterPlacement::Query,
            ParameterEncoding::Json => ParameterPlacement::JsonBody,
        }
    }
}

/// Flatten parameters into `key=value` pairs for query strings and form bodies
///
/// Arrays become `key[]` entries and nested objects become `key[sub]` entries.
/// Strings are emitted without JSON quoting; `null` becomes an empty value.
pub fn encode_pairs(parameters: &Parameters) -> Vec<(String, String)> {
    let mut pairs = Vec::with_capacity(parameters.len());
    for (key, value) in parameters {
        push_pairs(key.clone(), value, &mut pairs);
    }
    pairs
}

fn push_pairs(key: String, value: &Value, pairs: &mut Vec<(String, String)>) {
    match value {
        Value::Null => pairs.push((key, String::new())),
        Value::Bool(b) => pairs.push((key, b.to_string())),
        Value::Number(n) => pairs.push((key, n.to_string())),
        Value::String(s) => pairs.push((key, s.clone())),
        Value::Array(items) => {
            for item in items {
                push_pairs(format!("{}[]", key), item, pairs);
            }
        }
        Value::Object(map) => {
            for (sub, item) in map {
                push_pairs(format!("{}[{}]", key, sub), item, pairs);
            }
        }
    }
}

/// A response type the executor can produce
///
/// Types that set `ACCEPTS_NO_CONTENT` resolve with `Outcome::NoContent` when the
/// transport reports the no-content status; the decoder is not consulted.
pub trait ResponseBody: DeserializeOwned + Send + 'static {
    const ACCEPTS_NO_CONTENT: bool = false;
}

/// Response type for endpoints that answer with an empty payload
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct NoContent;

impl ResponseBody for NoContent {
    const ACCEPTS_NO_CONTENT: bool = true;
}

impl ResponseBody for Value {}

/// Description of one endpoint call and the type it answers with
///
/// Implementations are plain values: created per call and never mutated.
pub trait Endpoint: Send + Sync + 'static {
    type Response: ResponseBody;

    /// Absolute URL, or a path resolved against the transport's base URL
    fn url(&self) -> String;

    fn method(&self) -> Method {
        Method::Get
    }

    fn parameters(&self) -> Parameters {
        Parameters::new()
    }

    fn headers(&self) -> Headers {
        Headers::new()
    }

    fn encoding(&self) -> ParameterEncoding {
        ParameterEncoding::default()
    }
}

/// Wire-level view of an endpoint, as handed to the transport
#[derive(Debug, Clone, PartialEq)]
pub struct TransportRequest {
    pub url: String,
    pub method: Method,
    pub parameters: Parameters,
    pub headers: Headers,
    pub encoding: ParameterEncoding,
}

impl TransportRequest {
    pub fn from_endpoint<E: Endpoint + ?Sized>(endpoint: &E) -> Self {
        Self {
            url: endpoint.url(),
            method: endpoint.method(),
            parameters: endpoint.parameters(),
            headers: endpoint.headers(),
            encoding: endpoint.encoding(),
        }
    }
}

/// Status, headers and body of a completed call
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawResponse {
    pub status: u16,
    pub headers: Headers,
    pub body: Bytes,
}

impl RawResponse {
    pub fn new(status: u16, body: impl Into<Bytes>) -> Self {
        Self {
            status,
            headers: Headers::new(),
            body: body.into(),
        }
    }

    pub fn with_headers(mut self, headers: Headers) -> Self {
        self.headers = headers;
        self
    }
}

// ═══════════════════════════════════════════════════════════════════════════
// Collaborator contracts
// ═══════════════════════════════════════════════════════════════════════════

/// Cancellable reference to one in-flight transport operation
///
/// Dropping a handle must not cancel the operation.
pub trait CancelHandle: Send + 'static {
    /// Abort the operation. A no-op once the completion has fired.
    fn cancel(&self);
}

/// Issues calls and reports each result exactly once through its completion
pub trait Transport: Send + Sync + 'static {
    type Handle: CancelHandle;

    /// Start `request` and return a handle for cancelling it
    ///
    /// `on_complete` may run before this method returns. An aborted operation may
    /// drop `on_complete` without calling it.
    fn issue(&self, request: TransportRequest, on_complete: Completion) -> Self::Handle;
}

/// Synchronous connectivity precondition, evaluated once per call
pub trait ConnectivityGate: Send + Sync + 'static {
    fn is_reachable(&self) -> bool;
}

impl<G: ConnectivityGate + ?Sized> ConnectivityGate for Arc<G> {
    fn is_reachable(&self) -> bool {
        (**self).is_reachable()
    }
}

impl<G: ConnectivityGate + ?Sized> ConnectivityGate for Box<G> {
    fn is_reachable(&self) -> bool {
        (**self).is_reachable()
    }
}

/// Converts raw payload bytes into a typed value
pub trait Decoder: Send + Sync + 'static {
    fn decode<T: DeserializeOwned>(&self, bytes: &[u8]) -> Result<T, DecodeError>;
}

impl<D: Decoder> Decoder for Arc<D> {
    fn decode<T: DeserializeOwned>(&self, bytes: &[u8]) -> Result<T, DecodeError> {
        (**self).decode(bytes)
    }
}
