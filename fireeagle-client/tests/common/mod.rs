//! Shared test helpers: a scripted transport and assertion macros

#![allow(dead_code)]

use std::collections::VecDeque;
use std::sync::{Arc, Mutex, PoisonError};

use fireeagle_client::{
    ApiClient, ClientConfig, HttpRequest, HttpResponse, HttpTransport, TokenPair,
    TransportErrorKind,
};

/// Assert that an `Option` is `Some` and unwrap it (fails the test otherwise).
#[macro_export]
macro_rules! require_some {
    ($expr:expr $(,)?) => {{
        let opt = $expr;
        assert!(opt.is_some(), "expected Some(..), got None");
        let Some(val) = opt else {
            return;
        };
        val
    }};
    ($expr:expr, $($msg:tt)+) => {{
        let opt = $expr;
        assert!(opt.is_some(), "{}", format_args!($($msg)+));
        let Some(val) = opt else {
            return;
        };
        val
    }};
}

/// Assert that a `Result` is `Ok` and unwrap it (fails the test otherwise).
#[macro_export]
macro_rules! require_ok {
    ($expr:expr $(,)?) => {{
        let res = $expr;
        assert!(res.is_ok(), "expected Ok(..), got {res:?}");
        let Ok(val) = res else {
            return;
        };
        val
    }};
    ($expr:expr, $($msg:tt)+) => {{
        let res = $expr;
        assert!(
            res.is_ok(),
            "{}: {res:?}",
            format_args!($($msg)+)
        );
        let Ok(val) = res else {
            return;
        };
        val
    }};
}

/// Replays queued responses and records every request it sees.
///
/// With an empty queue it answers like an unreachable host.
#[derive(Default)]
pub struct StubTransport {
    responses: Mutex<VecDeque<HttpResponse>>,
    requests: Mutex<Vec<HttpRequest>>,
}

impl StubTransport {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn push(&self, response: HttpResponse) {
        self.responses
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push_back(response);
    }

    pub fn push_ok(&self, body: &str) {
        self.push(HttpResponse::new(200, body).with_header("Content-Type", "application/xml"));
    }

    pub fn push_xml(&self, status: u16, body: &str) {
        self.push(HttpResponse::new(status, body).with_header("Content-Type", "application/xml"));
    }

    pub fn requests(&self) -> Vec<HttpRequest> {
        self.requests
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    pub fn request_count(&self) -> usize {
        self.requests
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }
}

impl HttpTransport for StubTransport {
    fn execute(&self, request: &HttpRequest) -> HttpResponse {
        self.requests
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(request.clone());
        self.responses
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .pop_front()
            .unwrap_or_else(|| {
                HttpResponse::transport_failure(TransportErrorKind::Connect, "no scripted response")
            })
    }
}

pub const API_ROOT: &str = "https://api.fireeagle.test";
pub const ROOT: &str = "http://fireeagle.test";

pub fn app_token() -> TokenPair {
    TokenPair::new("consumer-key", "consumer-secret")
}

pub fn config_builder() -> fireeagle_client::ClientConfigBuilder {
    ClientConfig::builder(app_token())
        .root_url(ROOT)
        .api_root_url(API_ROOT)
}

/// Client on a fresh stub transport.
pub fn stub_client(config: ClientConfig) -> (ApiClient, Arc<StubTransport>) {
    let transport = StubTransport::new();
    let client = ApiClient::with_transport(Arc::new(config), transport.clone());
    (client, transport)
}

/// Value of a query or form parameter in `key=value&...` text.
pub fn param<'a>(encoded: &'a str, name: &str) -> Option<&'a str> {
    let pairs = encoded.split_once('?').map_or(encoded, |(_, q)| q);
    pairs
        .split('&')
        .find_map(|kv| kv.strip_prefix(name)?.strip_prefix('='))
}
