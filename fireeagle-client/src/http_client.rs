//! HTTP transport seam
//!
//! [`HttpTransport`] executes one signed request and reports what came back.
//! A transport never fails with an error value: a request that never reached
//! the server comes back with status `0`, and
//! [`HttpResponse::transport_error_code`] says why. Classification of the
//! outcome happens in [`crate::classify`].

use std::collections::HashMap;
use std::env;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use reqwest::blocking::Client;
use reqwest::header::CONTENT_TYPE;
use serde::{Deserialize, Serialize};

use crate::error::{FireEagleError, Result};
use crate::utils::log_sanitizer::redact_oauth_params;

/// Environment variable naming a PEM CA bundle to trust.
pub const CA_BUNDLE_ENV: &str = "CURL_CA_BUNDLE_PATH";

/// Default connect timeout (seconds).
const DEFAULT_CONNECT_TIMEOUT_SECS: u64 = 30;
/// Default timeout for the whole exchange, body included (seconds).
const DEFAULT_TIMEOUT_SECS: u64 = 30;

const FORM_CONTENT_TYPE: &str = "application/x-www-form-urlencoded";

// ============ Request / response ============

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum HttpMethod {
    Get,
    Post,
}

impl HttpMethod {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Get => "GET",
            Self::Post => "POST",
        }
    }
}

/// A fully signed request, ready to send.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HttpRequest {
    pub method: HttpMethod,
    /// Complete URL; for GET it carries the encoded query.
    pub url: String,
    /// Encoded form body; only set for POST.
    pub body: Option<String>,
    pub headers: Vec<(String, String)>,
}

impl HttpRequest {
    pub fn get(url: impl Into<String>) -> Self {
        Self {
            method: HttpMethod::Get,
            url: url.into(),
            body: None,
            headers: Vec::new(),
        }
    }

    pub fn post(url: impl Into<String>, body: impl Into<String>) -> Self {
        Self {
            method: HttpMethod::Post,
            url: url.into(),
            body: Some(body.into()),
            headers: Vec::new(),
        }
    }

    #[must_use]
    pub fn with_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.push((name.into(), value.into()));
        self
    }

    /// First header with the given name (case-insensitive).
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }
}

/// Why a request never produced an HTTP status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TransportErrorKind {
    /// DNS resolution, connection refused, TLS handshake.
    Connect = 1,
    Timeout = 2,
    /// Any other failure while sending.
    Request = 3,
    /// The status arrived but the body could not be read.
    Body = 4,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransportError {
    pub kind: TransportErrorKind,
    pub detail: String,
}

/// Outcome of one transport call.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct HttpResponse {
    /// HTTP status, or `0` when the request never completed.
    pub status: u16,
    pub body: String,
    headers: HashMap<String, String>,
    transport_error: Option<TransportError>,
}

impl HttpResponse {
    pub fn new(status: u16, body: impl Into<String>) -> Self {
        Self {
            status,
            body: body.into(),
            ..Self::default()
        }
    }

    /// A response for a request that never completed.
    pub fn transport_failure(kind: TransportErrorKind, detail: impl Into<String>) -> Self {
        Self {
            transport_error: Some(TransportError {
                kind,
                detail: detail.into(),
            }),
            ..Self::default()
        }
    }

    #[must_use]
    pub fn with_header(mut self, name: &str, value: impl Into<String>) -> Self {
        self.headers.insert(name.to_ascii_lowercase(), value.into());
        self
    }

    /// Response header by name (case-insensitive).
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .get(&name.to_ascii_lowercase())
            .map(String::as_str)
    }

    /// Declared content type without parameters, or empty.
    pub fn content_type(&self) -> &str {
        self.header("content-type")
            .and_then(|ct| ct.split(';').next())
            .map_or("", str::trim)
    }

    pub fn transport_error(&self) -> Option<&TransportError> {
        self.transport_error.as_ref()
    }

    /// Transport-specific failure code; `0` when the transport succeeded.
    pub fn transport_error_code(&self) -> i32 {
        self.transport_error.as_ref().map_or(0, |e| e.kind as i32)
    }
}

/// Executes signed requests.
///
/// Implementations are synchronous and block for the whole round trip.
pub trait HttpTransport: Send + Sync {
    fn execute(&self, request: &HttpRequest) -> HttpResponse;
}

// ============ reqwest transport ============

/// Settings for [`ReqwestTransport`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HttpOptions {
    pub connect_timeout: Duration,
    /// Limit for the whole exchange, reading the body included.
    pub timeout: Duration,
    verify_peer: bool,
    /// PEM bundle of extra trusted CAs.
    pub ca_bundle: Option<PathBuf>,
    pub user_agent: String,
}

impl Default for HttpOptions {
    fn default() -> Self {
        Self {
            connect_timeout: Duration::from_secs(DEFAULT_CONNECT_TIMEOUT_SECS),
            timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
            verify_peer: true,
            ca_bundle: env::var_os(CA_BUNDLE_ENV).map(PathBuf::from),
            user_agent: concat!("fireeagle-client/", env!("CARGO_PKG_VERSION")).to_string(),
        }
    }
}

impl HttpOptions {
    #[must_use]
    pub fn connect_timeout(mut self, timeout: Duration) -> Self {
        self.connect_timeout = timeout;
        self
    }

    #[must_use]
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    #[must_use]
    pub fn ca_bundle(mut self, path: impl Into<PathBuf>) -> Self {
        self.ca_bundle = Some(path.into());
        self
    }

    /// Turn off TLS certificate and host verification.
    ///
    /// Dangerous: anyone on the network path can impersonate the API. Never
    /// use this in production.
    #[must_use]
    pub fn danger_disable_verification(mut self) -> Self {
        self.verify_peer = false;
        self
    }

    pub fn verifies_peer(&self) -> bool {
        self.verify_peer
    }
}

/// Blocking transport backed by `reqwest`.
#[derive(Debug, Clone)]
pub struct ReqwestTransport {
    client: Client,
}

impl ReqwestTransport {
    pub fn new(options: &HttpOptions) -> Result<Self> {
        let mut builder = Client::builder()
            .connect_timeout(options.connect_timeout)
            .timeout(options.timeout)
            .user_agent(options.user_agent.as_str());

        if let Some(path) = &options.ca_bundle {
            for certificate in load_ca_bundle(path)? {
                builder = builder.add_root_certificate(certificate);
            }
        }
        if !options.verify_peer {
            log::warn!("TLS certificate verification is disabled");
            builder = builder.danger_accept_invalid_certs(true);
        }

        let client = builder.build().map_err(|e| {
            FireEagleError::internal(format!("Failed to initialize HTTP client: {e}"))
        })?;
        Ok(Self { client })
    }
}

fn load_ca_bundle(path: &Path) -> Result<Vec<reqwest::Certificate>> {
    let pem = fs::read(path).map_err(|e| {
        FireEagleError::config_read(format!(
            "Could not read CA bundle ({}): {e}",
            path.display()
        ))
    })?;
    parse_ca_bundle(&pem).map_err(|detail| {
        FireEagleError::config_read(format!("Invalid CA bundle ({}): {detail}", path.display()))
    })
}

/// Every certificate of a concatenated PEM bundle.
fn parse_ca_bundle(pem: &[u8]) -> std::result::Result<Vec<reqwest::Certificate>, String> {
    let certificates = reqwest::Certificate::from_pem_bundle(pem).map_err(|e| e.to_string())?;
    if certificates.is_empty() {
        return Err("no certificates found".to_string());
    }
    Ok(certificates)
}

fn transport_error_kind(e: &reqwest::Error) -> TransportErrorKind {
    if e.is_timeout() {
        TransportErrorKind::Timeout
    } else if e.is_connect() {
        TransportErrorKind::Connect
    } else {
        TransportErrorKind::Request
    }
}

impl HttpTransport for ReqwestTransport {
    fn execute(&self, request: &HttpRequest) -> HttpResponse {
        let mut builder = match request.method {
            HttpMethod::Get => self.client.get(&request.url),
            HttpMethod::Post => self
                .client
                .post(&request.url)
                .header(CONTENT_TYPE, FORM_CONTENT_TYPE)
                .body(request.body.clone().unwrap_or_default()),
        };
        for (name, value) in &request.headers {
            builder = builder.header(name.as_str(), value.as_str());
        }

        let response = match builder.send() {
            Ok(response) => response,
            Err(e) => {
                let kind = transport_error_kind(&e);
                log::debug!(
                    "{} {} failed before a response: {e}",
                    request.method.as_str(),
                    redact_oauth_params(&request.url)
                );
                return HttpResponse::transport_failure(kind, e.to_string());
            }
        };

        let status = response.status().as_u16();
        let headers: HashMap<String, String> = response
            .headers()
            .iter()
            .filter_map(|(name, value)| {
                value
                    .to_str()
                    .ok()
                    .map(|v| (name.as_str().to_ascii_lowercase(), v.to_string()))
            })
            .collect();

        // text() drains chunked bodies completely
        match response.text() {
            Ok(body) => HttpResponse {
                status,
                body,
                headers,
                transport_error: None,
            },
            Err(e) => HttpResponse::transport_failure(
                TransportErrorKind::Body,
                format!("Failed to read response body: {e}"),
            ),
        }
    }
}
