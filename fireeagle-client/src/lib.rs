//! # fireeagle-client
//!
//! Client for the Fire Eagle location service: OAuth 1.0/1.0a token
//! exchange and request signing, a blocking HTTP transport, classification
//! of failed responses, and decoding of XML responses into typed records.
//!
//! ## Feature Flags
//!
//! - **`native-tls`** *(default)*: Use the platform's native TLS implementation.
//! - **`rustls`**: Use rustls.
//!
//! ## Authorizing a User
//!
//! ```rust,no_run
//! use std::sync::Arc;
//!
//! use fireeagle_client::{ApiClient, ClientConfig, TokenPair};
//!
//! fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = Arc::new(ClientConfig::new(TokenPair::new("consumer-key", "consumer-secret")));
//!     let mut client = ApiClient::new(Arc::clone(&config))?;
//!
//!     // 1. Request token, then send the user to the authorize page
//!     let request = client.get_request_token(None)?;
//!     println!("Visit {}", client.get_authorize_url(&request, None));
//!
//!     // 2. Trade the approved request token for an access token
//!     let access = client.get_access_token(Some("verifier-from-user"))?;
//!     access.save("access_token.txt")?;
//!     Ok(())
//! }
//! ```
//!
//! ## Calling the API
//!
//! ```rust,no_run
//! # use std::sync::Arc;
//! # use fireeagle_client::*;
//! # fn example(config: Arc<ClientConfig>) -> Result<()> {
//! let access = TokenPair::load("access_token.txt")?;
//! let client = ApiClient::with_token(config, access, TokenStage::Access)?;
//!
//! let params = Params::from([("q".to_string(), "London".to_string())]);
//! let body = client.lookup(&params, ResponseFormat::Xml)?;
//! for location in client.locations_from_response(&body, ResponseFormat::Xml)? {
//!     println!("{} ({:?})", location.full_location, location.geometry);
//! }
//!
//! let user = client.user_from_response(&client.user(ResponseFormat::Xml)?, ResponseFormat::Xml)?;
//! println!("best guess: {:?}", user.best_guess().map(|l| &l.full_location));
//! # Ok(())
//! # }
//! ```
//!
//! ## Error Handling
//!
//! Every operation returns [`Result<T, FireEagleError>`](FireEagleError).
//! Locally detected problems and server-reported failures share the type:
//!
//! - [`FireEagleError::Remote`]: the server answered with a `stat="fail"` envelope
//! - [`FireEagleError::ConnectFailed`]: the request never completed
//! - [`FireEagleError::RequestFailed`]: a non-200 answer that could not be parsed
//! - [`FireEagleError::TokenRequired`] / [`FireEagleError::LocationRequired`]:
//!   preconditions checked before any network traffic
//!
//! Nothing is retried automatically.

mod classify;
mod client;
mod config;
mod error;
mod http_client;
mod objects;
mod oauth;
mod parser;
mod types;
mod utils;

// Re-export error types
pub use error::{ErrorKind, FireEagleError, RemoteErrorCode, Result};

pub use client::{ApiClient, OUT_OF_BAND_CALLBACK};
pub use config::{ClientConfig, ClientConfigBuilder, DEFAULT_API_ROOT_URL, DEFAULT_ROOT_URL};

pub use classify::{DUMP_TARGET, inspect_envelope};

pub use http_client::{
    CA_BUNDLE_ENV, HttpMethod, HttpOptions, HttpRequest, HttpResponse, HttpTransport,
    ReqwestTransport, TransportError, TransportErrorKind,
};

pub use oauth::{
    OAUTH_VERSION, OAuthSigner, SIGNATURE_METHOD, hmac_sha1_signature, parse_token_response,
    percent_encode, signature_base_string,
};

pub use parser::{
    ParseError, ParsedNode, ParserFactory, ParserRegistry, ResponseParser, TEXT_PROPERTY,
    XmlParser,
};

pub use objects::{
    Geometry, Location, User, locations_from_node, locations_from_response, parse_response,
    user_from_response, users_from_response,
};

pub use types::{OAuthVersion, Params, ResponseFormat, TokenPair, TokenRole, TokenStage};

// Re-export utils module
pub use utils::datetime;
