//! HttpTransport: Transport implementation over a shared reqwest client

use apistore_interface::{
    encode_pairs, CancelHandle, Completion, Headers, Method, ParameterPlacement, RawResponse,
    Transport, TransportError, TransportRequest,
};
use reqwest::header::{HeaderMap, HeaderName, HeaderValue};
use tokio::runtime::Handle;
use tokio::task::AbortHandle;
use tracing::debug;
use url::Url;

use crate::config::HttpConfig;
use crate::error::{self, HttpSetupError};

/// Transport that runs each call as a tokio task on the runtime it was built in.
///
/// Cheap to clone: the reqwest client and runtime handle are reference-counted.
/// Status codes are reported as received; range validation is left to the caller.
#[derive(Clone, Debug)]
pub struct HttpTransport {
    client: reqwest::Client,
    base_url: Option<Url>,
    runtime: Handle,
}

impl HttpTransport {
    /// Create a transport bound to the current tokio runtime
    ///
    /// # Errors
    ///
    /// Returns `HttpSetupError::NoRuntime` outside a runtime, or a configuration error
    /// for an unparsable base URL or default header.
    pub fn new(config: &HttpConfig) -> Result<Self, HttpSetupError> {
        let runtime = Handle::try_current().map_err(|_| HttpSetupError::NoRuntime)?;
        Self::with_runtime(config, runtime)
    }

    /// Create a transport that spawns calls onto `runtime`
    pub fn with_runtime(config: &HttpConfig, runtime: Handle) -> Result<Self, HttpSetupError> {
        let client = reqwest::Client::builder()
            .timeout(config.timeout())
            .connect_timeout(config.connect_timeout())
            .user_agent(config.user_agent.clone())
            .default_headers(default_headers(config)?)
            .build()?;

        let base_url = config
            .base_url
            .as_deref()
            .map(|raw| {
                Url::parse(raw).map_err(|e| HttpSetupError::InvalidBaseUrl {
                    url: raw.to_string(),
                    reason: e.to_string(),
                })
            })
            .transpose()?;

        Ok(Self {
            client,
            base_url,
            runtime,
        })
    }

    pub fn base_url(&self) -> Option<&Url> {
        self.base_url.as_ref()
    }

    /// Resolve an endpoint target against the base URL
    fn resolve_url(&self, target: &str) -> Result<Url, TransportError> {
        match Url::parse(target) {
            Ok(url) => Ok(url),
            Err(url::ParseError::RelativeUrlWithoutBase) => {
                let base = self.base_url.as_ref().ok_or_else(|| {
                    TransportError::InvalidRequest(format!(
                        "Relative URL {} requires a configured base URL",
                        target
                    ))
                })?;
                base.join(target).map_err(|e| {
                    TransportError::InvalidRequest(format!("Cannot join {} onto {}: {}", target, base, e))
                })
            }
            Err(e) => Err(TransportError::InvalidRequest(format!(
                "Invalid URL {}: {}",
                target, e
            ))),
        }
    }

    fn prepare(&self, request: &TransportRequest) -> Result<reqwest::RequestBuilder, TransportError> {
        let url = self.resolve_url(&request.url)?;
        let mut builder = self.client.request(to_reqwest_method(request.method), url);

        for (name, value) in &request.headers {
            builder = builder.header(name.as_str(), value.as_str());
        }

        if !request.parameters.is_empty() {
            builder = match request.encoding.placement(request.method) {
                ParameterPlacement::Query => builder.query(&encode_pairs(&request.parameters)),
                ParameterPlacement::FormBody => builder.form(&encode_pairs(&request.parameters)),
                ParameterPlacement::JsonBody => builder.json(&request.parameters),
            };
        }

        Ok(builder)
    }
}

impl Transport for HttpTransport {
    type Handle = HttpHandle;

    fn issue(&self, request: TransportRequest, on_complete: Completion) -> HttpHandle {
        debug!("Issuing {} {}", request.method, request.url);
        let prepared = self.prepare(&request);

        let task = self.runtime.spawn(async move {
            let result = match prepared {
                Ok(builder) => execute(builder).await,
                Err(e) => Err(e),
            };
            if let Err(ref e) = result {
                debug!("{} {} failed: {}", request.method, request.url, e);
            }
            on_complete(result);
        });

        HttpHandle {
            task: task.abort_handle(),
        }
    }
}

/// Cancels an `HttpTransport` call by aborting its task
///
/// An aborted call drops its completion without invoking it.
#[derive(Debug)]
pub struct HttpHandle {
    task: AbortHandle,
}

impl HttpHandle {
    /// Whether the call's task has finished (completed or aborted)
    pub fn is_finished(&self) -> bool {
        self.task.is_finished()
    }
}

impl CancelHandle for HttpHandle {
    fn cancel(&self) {
        self.task.abort();
    }
}

async fn execute(builder: reqwest::RequestBuilder) -> Result<RawResponse, TransportError> {
    let response = builder.send().await.map_err(error::classify)?;
    let status = response.status().as_u16();

    let headers: Headers = response
        .headers()
        .iter()
        .filter_map(|(name, value)| {
            value
                .to_str()
                .ok()
                .map(|v| (name.as_str().to_string(), v.to_string()))
        })
        .collect();

    let body = response.bytes().await.map_err(error::classify)?;

    Ok(RawResponse {
        status,
        headers,
        body,
    })
}

fn default_headers(config: &HttpConfig) -> Result<HeaderMap, HttpSetupError> {
    let mut headers = HeaderMap::with_capacity(config.default_headers.len());
    for (name, value) in &config.default_headers {
        let header_name =
            HeaderName::from_bytes(name.as_bytes()).map_err(|e| HttpSetupError::InvalidHeader {
                name: name.clone(),
                reason: e.to_string(),
            })?;
        let header_value = HeaderValue::from_str(value).map_err(|e| HttpSetupError::InvalidHeader {
            name: name.clone(),
            reason: e.to_string(),
        })?;
        headers.insert(header_name, header_value);
    }
    Ok(headers)
}

fn to_reqwest_method(method: Method) -> reqwest::Method {
    match method {
        Method::Get => reqwest::Method::GET,
        Method::Head => reqwest::Method::HEAD,
        Method::Post => reqwest::Method::POST,
        Method::Put => reqwest::Method::PUT,
        Method::Patch => reqwest::Method::PATCH,
        Method::Delete => reqwest::Method::DELETE,
        Method::Options => reqwest::Method::OPTIONS,
    }
}
