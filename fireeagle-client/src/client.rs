//! API facade

use std::fmt;
use std::sync::Arc;

use crate::classify::{DUMP_TARGET, classify_response, log_request};
use crate::config::ClientConfig;
use crate::error::{FireEagleError, Result};
use crate::http_client::{HttpMethod, HttpTransport, ReqwestTransport};
use crate::oauth::{OAuthSigner, parse_token_response, percent_encode};
use crate::objects::{self, Location, User};
use crate::types::{OAuthVersion, Params, ResponseFormat, TokenPair, TokenRole, TokenStage};

/// Callback value for clients that cannot receive redirects.
pub const OUT_OF_BAND_CALLBACK: &str = "oob";

/// Fire Eagle API client.
///
/// Carries the current user token through the exchange flow: a fresh client
/// starts with the config's general token (or none), holds a request token
/// after [`get_request_token`](Self::get_request_token) and an access token
/// after [`get_access_token`](Self::get_access_token). Only those two calls
/// change the token; API calls never do.
///
/// API calls return the raw response body. Decoding into [`User`] and
/// [`Location`] records is a separate step.
///
/// Cloning copies the current token; clones share the config and transport.
#[derive(Clone)]
pub struct ApiClient {
    config: Arc<ClientConfig>,
    current: Option<(TokenPair, TokenStage)>,
    transport: Arc<dyn HttpTransport>,
}

impl fmt::Debug for ApiClient {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ApiClient")
            .field("api_root_url", &self.config.api_root_url())
            .field("token", &self.current.as_ref().map(|(pair, _)| &pair.token))
            .field("stage", &self.token_stage())
            .finish_non_exhaustive()
    }
}

impl ApiClient {
    /// A client using the `reqwest` transport configured by the config's HTTP options.
    pub fn new(config: Arc<ClientConfig>) -> Result<Self> {
        let transport = ReqwestTransport::new(config.http_options())?;
        Ok(Self::with_transport(config, Arc::new(transport)))
    }

    /// A client that already holds a token, e.g. a stored access token.
    pub fn with_token(config: Arc<ClientConfig>, token: TokenPair, stage: TokenStage) -> Result<Self> {
        let mut client = Self::new(config)?;
        client.set_token(token, stage)?;
        Ok(client)
    }

    /// A client on a caller-supplied transport.
    pub fn with_transport(config: Arc<ClientConfig>, transport: Arc<dyn HttpTransport>) -> Self {
        let current = config
            .general_token()
            .map(|general| (general.clone(), TokenStage::General));
        Self {
            config,
            current,
            transport,
        }
    }

    pub fn set_token(&mut self, token: TokenPair, stage: TokenStage) -> Result<()> {
        if !token.is_valid() {
            return Err(FireEagleError::internal("Invalid token pair for client"));
        }
        self.current = Some((token, stage));
        Ok(())
    }

    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    pub fn token(&self) -> Option<&TokenPair> {
        self.current.as_ref().map(|(pair, _)| pair)
    }

    pub fn token_stage(&self) -> Option<TokenStage> {
        self.current.as_ref().map(|(_, stage)| *stage)
    }

    // ============ Token exchange ============

    pub fn request_token_url(&self) -> String {
        self.config.request_token_url()
    }

    pub fn authorize_url(&self) -> String {
        self.config.authorize_url()
    }

    pub fn access_token_url(&self) -> String {
        self.config.access_token_url()
    }

    /// Page the user visits to approve a request token.
    ///
    /// Under OAuth 1.0 the callback travels here; 1.0a signs it into the
    /// request-token call instead, so `callback` is ignored.
    pub fn get_authorize_url(&self, token: &TokenPair, callback: Option<&str>) -> String {
        let mut url = format!(
            "{}?oauth_token={}",
            self.authorize_url(),
            percent_encode(&token.token)
        );
        if self.config.oauth_version() == OAuthVersion::V1_0
            && let Some(callback) = callback
        {
            url.push_str("&oauth_callback=");
            url.push_str(&percent_encode(callback));
        }
        url
    }

    /// Obtain a request token, signed with the consumer key only.
    ///
    /// `callback` defaults to [`OUT_OF_BAND_CALLBACK`] and is only sent under
    /// OAuth 1.0a. When the response carries a complete pair it becomes the
    /// current token; otherwise the client is left as it was and the
    /// incomplete pair is returned, so check [`TokenPair::is_valid`].
    pub fn get_request_token(&mut self, callback: Option<&str>) -> Result<TokenPair> {
        let mut params = Params::new();
        if self.config.oauth_version() == OAuthVersion::V1_0a {
            params.insert(
                "oauth_callback".to_string(),
                callback.unwrap_or(OUT_OF_BAND_CALLBACK).to_string(),
            );
        }

        let body = self.signed_request(&self.request_token_url(), TokenRole::None, &params, false)?;
        let pair = parse_token_response(&body);
        self.adopt(&pair, TokenStage::Request);

        if self.config.dump_requests() {
            log::info!(
                target: DUMP_TARGET,
                "Now the user is redirected to {}",
                self.get_authorize_url(&pair, callback)
            );
        }
        Ok(pair)
    }

    /// Exchange the current request token for an access token.
    ///
    /// Requires a request token. Under OAuth 1.0a a non-empty `verifier` is
    /// required and checked before any network traffic. An incomplete pair in
    /// the response leaves the client unchanged, as with
    /// [`get_request_token`](Self::get_request_token).
    pub fn get_access_token(&mut self, verifier: Option<&str>) -> Result<TokenPair> {
        if self.token_stage() != Some(TokenStage::Request) {
            return Err(FireEagleError::token_required(
                "Access token exchange requires a request token",
            ));
        }

        let mut params = Params::new();
        if self.config.oauth_version() == OAuthVersion::V1_0a {
            let verifier = verifier.filter(|v| !v.is_empty()).ok_or_else(|| {
                FireEagleError::token_required("OAuth 1.0a access token exchange requires a verifier")
            })?;
            params.insert("oauth_verifier".to_string(), verifier.to_string());
        }

        let body =
            self.signed_request(&self.access_token_url(), TokenRole::Request, &params, false)?;
        let pair = parse_token_response(&body);
        self.adopt(&pair, TokenStage::Access);
        Ok(pair)
    }

    fn adopt(&mut self, pair: &TokenPair, stage: TokenStage) {
        if pair.is_valid() {
            log::debug!("Token exchange moved client to {stage:?} stage");
            self.current = Some((pair.clone(), stage));
        } else {
            log::warn!("Token exchange returned no usable token pair; keeping current token");
        }
    }

    // ============ Signed requests ============

    fn require_token(&self) -> Result<&TokenPair> {
        self.token()
            .filter(|t| t.is_valid())
            .ok_or_else(|| FireEagleError::token_required("This function requires an OAuth token"))
    }

    /// Sign and send a request, returning the body of a successful response.
    ///
    /// `role` picks the token signed in besides the consumer key:
    /// [`TokenRole::General`] uses the config's general token,
    /// [`TokenRole::Request`] and [`TokenRole::Access`] the client's current
    /// one. A POST without parameters goes out as GET.
    pub fn signed_request(
        &self,
        url: &str,
        role: TokenRole,
        params: &Params,
        is_post: bool,
    ) -> Result<String> {
        let token = match role {
            TokenRole::None => None,
            TokenRole::General => Some(self.config.general_token().ok_or_else(|| {
                FireEagleError::token_required("This function requires a general purpose token")
            })?),
            TokenRole::Request | TokenRole::Access => Some(self.require_token()?),
        };

        let mut signer =
            OAuthSigner::new(self.config.app_token()).auth_header(self.config.auth_header());
        if let Some(token) = token {
            signer = signer.with_token(token);
        }
        let method = if is_post {
            HttpMethod::Post
        } else {
            HttpMethod::Get
        };
        let request = signer.sign(url, params, method)?;

        log_request(&self.config, &request);
        let response = self.transport.execute(&request);
        classify_response(&self.config, url, response)
    }

    fn call(
        &self,
        method: &str,
        role: TokenRole,
        params: &Params,
        is_post: bool,
        format: ResponseFormat,
    ) -> Result<String> {
        self.signed_request(&self.config.method_url(method, format), role, params, is_post)
    }

    // ============ API methods ============

    pub fn user(&self, format: ResponseFormat) -> Result<String> {
        self.call("user", TokenRole::Access, &Params::new(), false, format)
    }

    /// Resolve a place query to candidate locations.
    pub fn lookup(&self, params: &Params, format: ResponseFormat) -> Result<String> {
        require_location("lookup", params)?;
        self.call("lookup", TokenRole::Access, params, false, format)
    }

    pub fn update(&self, params: &Params, format: ResponseFormat) -> Result<String> {
        require_location("update", params)?;
        self.call("update", TokenRole::Access, params, true, format)
    }

    /// Users currently within a place. Uses the general token.
    pub fn within(&self, params: &Params, format: ResponseFormat) -> Result<String> {
        require_location("within", params)?;
        self.call("within", TokenRole::General, params, false, format)
    }

    /// Recently updated users. Uses the general token; parameters are optional.
    pub fn recent(&self, params: &Params, format: ResponseFormat) -> Result<String> {
        self.call("recent", TokenRole::General, params, false, format)
    }

    // ============ Decoding ============

    pub fn user_from_response(&self, body: &str, format: ResponseFormat) -> Result<User> {
        objects::user_from_response(self.config.parsers(), body, format)
    }

    pub fn locations_from_response(
        &self,
        body: &str,
        format: ResponseFormat,
    ) -> Result<Vec<Location>> {
        objects::locations_from_response(self.config.parsers(), body, format)
    }

    pub fn users_from_response(&self, body: &str, format: ResponseFormat) -> Result<Vec<User>> {
        objects::users_from_response(self.config.parsers(), body, format)
    }
}

fn require_location(operation: &str, params: &Params) -> Result<()> {
    if params.is_empty() {
        return Err(FireEagleError::LocationRequired {
            operation: operation.to_string(),
        });
    }
    Ok(())
}
