//! OAuth 1.0 request signing
//!
//! [`OAuthSigner`] turns a target URL and parameter set into a ready-to-send
//! [`HttpRequest`]. Protocol parameters (`oauth_*`) travel in the query or body
//! by default; with header mode they move to an `Authorization: OAuth ...`
//! header and only the application parameters stay in the URL or body.

mod sign;

use chrono::Utc;
use uuid::Uuid;

use crate::error::Result;
use crate::http_client::{HttpMethod, HttpRequest};
use crate::types::{Params, TokenPair};

pub use sign::{hmac_sha1_signature, percent_encode, signature_base_string};

pub const SIGNATURE_METHOD: &str = "HMAC-SHA1";
/// Value of `oauth_version`; 1.0a does not change it.
pub const OAUTH_VERSION: &str = "1.0";

const OAUTH_PREFIX: &str = "oauth_";

/// Signs requests with a consumer key and an optional token.
#[derive(Debug, Clone, Copy)]
pub struct OAuthSigner<'a> {
    consumer: &'a TokenPair,
    token: Option<&'a TokenPair>,
    auth_header: bool,
}

impl<'a> OAuthSigner<'a> {
    pub fn new(consumer: &'a TokenPair) -> Self {
        Self {
            consumer,
            token: None,
            auth_header: false,
        }
    }

    #[must_use]
    pub fn with_token(mut self, token: &'a TokenPair) -> Self {
        self.token = Some(token);
        self
    }

    /// Carry protocol parameters in an `Authorization` header.
    #[must_use]
    pub fn auth_header(mut self, enabled: bool) -> Self {
        self.auth_header = enabled;
        self
    }

    /// Sign with a fresh nonce and the current time.
    pub fn sign(&self, url: &str, params: &Params, method: HttpMethod) -> Result<HttpRequest> {
        let nonce = Uuid::new_v4().simple().to_string();
        self.sign_with(url, params, method, &nonce, Utc::now().timestamp())
    }

    /// Sign with a caller-supplied nonce and timestamp.
    ///
    /// `params` may contain protocol parameters such as `oauth_callback` or
    /// `oauth_verifier`; they are signed like the rest and follow the
    /// protocol parameters in header mode. A POST with no parameters is sent
    /// as GET.
    pub fn sign_with(
        &self,
        url: &str,
        params: &Params,
        method: HttpMethod,
        nonce: &str,
        timestamp: i64,
    ) -> Result<HttpRequest> {
        let method = if params.is_empty() {
            HttpMethod::Get
        } else {
            method
        };
        let (base_url, query) = sign::split_request_url(url)?;

        let mut protocol: Vec<(String, String)> = vec![
            ("oauth_consumer_key".into(), self.consumer.token.clone()),
            ("oauth_nonce".into(), nonce.to_string()),
            ("oauth_signature_method".into(), SIGNATURE_METHOD.into()),
            ("oauth_timestamp".into(), timestamp.to_string()),
            ("oauth_version".into(), OAUTH_VERSION.into()),
        ];
        if let Some(token) = self.token {
            protocol.push(("oauth_token".into(), token.token.clone()));
        }

        let mut application = query;
        for (name, value) in params {
            let pair = (name.clone(), value.clone());
            if name.starts_with(OAUTH_PREFIX) {
                protocol.push(pair);
            } else {
                application.push(pair);
            }
        }

        let mut all = application.clone();
        all.extend(protocol.iter().cloned());
        let normalized = sign::normalize_params(&all);
        let base_string = signature_base_string(method.as_str(), &base_url, &normalized);
        log::debug!("OAuth base string:\n{base_string}");

        let token_secret = self.token.map_or("", |t| t.secret.as_str());
        let signature = hmac_sha1_signature(&self.consumer.secret, token_secret, &base_string)?;

        let (payload, authorization) = if self.auth_header {
            protocol.push(("oauth_signature".into(), signature));
            (
                sign::normalize_params(&application),
                Some(authorization_header(&protocol)),
            )
        } else {
            (
                format!(
                    "{normalized}&oauth_signature={}",
                    percent_encode(&signature)
                ),
                None,
            )
        };

        let mut request = match method {
            HttpMethod::Get if payload.is_empty() => HttpRequest::get(base_url),
            HttpMethod::Get => HttpRequest::get(format!("{base_url}?{payload}")),
            HttpMethod::Post => HttpRequest::post(base_url, payload),
        };
        if let Some(value) = authorization {
            request = request.with_header("Authorization", value);
        }
        Ok(request)
    }
}

/// `OAuth realm="", oauth_consumer_key="...", ...`
fn authorization_header(protocol: &[(String, String)]) -> String {
    let mut parts = vec!["realm=\"\"".to_string()];
    parts.extend(
        protocol
            .iter()
            .map(|(k, v)| format!("{}=\"{}\"", percent_encode(k), percent_encode(v))),
    );
    format!("OAuth {}", parts.join(", "))
}

/// Extract `oauth_token` and `oauth_token_secret` from a form-encoded token
/// response. Unknown pairs are ignored; missing halves come back empty.
pub fn parse_token_response(body: &str) -> TokenPair {
    let mut pair = TokenPair::empty();
    for (name, value) in url::form_urlencoded::parse(body.trim().as_bytes()) {
        match name.as_ref() {
            "oauth_token" => pair.token = value.into_owned(),
            "oauth_token_secret" => pair.secret = value.into_owned(),
            _ => {}
        }
    }
    pair
}
