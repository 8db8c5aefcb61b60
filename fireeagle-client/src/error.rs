use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Unified error type for every Fire Eagle operation.
///
/// Two sources collapse into this one shape: conditions detected locally
/// (missing token, malformed response, unreachable host) and failures the
/// server reported inside a well-formed `stat="fail"` envelope. They are told
/// apart by [`kind`](Self::kind) or [`is_remote`](Self::is_remote); the
/// numeric [`code`](Self::code) is the local kind number for local errors and
/// the server's own code for [`Remote`](Self::Remote).
///
/// All variants are serializable for structured error reporting.
#[derive(Debug, Clone, Error, Serialize, Deserialize)]
#[serde(tag = "kind")]
pub enum FireEagleError {
    /// The call needs a request/access (or general) token that is absent or incomplete.
    #[error("{message}")]
    TokenRequired {
        /// What was missing.
        message: String,
    },

    /// `update`/`lookup` was called without any location parameters.
    #[error("{operation}() needs a location")]
    LocationRequired {
        /// API method that was called.
        operation: String,
    },

    /// The server answered with a well-formed failure envelope.
    #[error("Remote error: {message}")]
    Remote {
        /// Numeric code from the `err` element.
        code: i64,
        /// Message from the `err` element, verbatim.
        message: String,
        /// Raw response body.
        raw_response: Option<String>,
    },

    /// Non-200 response whose body could not be classified.
    #[error("Request to {url} failed: HTTP error {status} Content Type: {content_type}")]
    RequestFailed {
        /// Requested URL (credentials redacted).
        url: String,
        /// HTTP status code.
        status: u16,
        /// Declared content type, without parameters.
        content_type: String,
        /// Raw response body.
        raw_response: String,
    },

    /// The request never completed at the transport layer (DNS, connect, TLS, timeout).
    #[error("Connection to {url} failed with transport error {transport_code}: {detail}")]
    ConnectFailed {
        /// Requested URL (credentials redacted).
        url: String,
        /// Transport-specific secondary code.
        transport_code: i32,
        /// Transport error details.
        detail: String,
    },

    /// A local invariant was violated: malformed envelope, unexpected element,
    /// unsupported format, missing parser registration, and so on.
    #[error("{message}")]
    Internal {
        /// Error details.
        message: String,
        /// Raw response body, when the error came from decoding one.
        raw_response: Option<String>,
    },

    /// A config or token file is missing, truncated or unparsable.
    #[error("{message}")]
    ConfigRead {
        /// Error details, including the file name.
        message: String,
    },
}

/// Local classification of a [`FireEagleError`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ErrorKind {
    TokenRequired = 1,
    LocationRequired = 2,
    Remote = 3,
    RequestFailed = 4,
    ConnectFailed = 5,
    Internal = 6,
    ConfigRead = 7,
}

impl FireEagleError {
    pub(crate) fn token_required(message: impl Into<String>) -> Self {
        Self::TokenRequired {
            message: message.into(),
        }
    }

    pub(crate) fn internal(message: impl Into<String>) -> Self {
        Self::Internal {
            message: message.into(),
            raw_response: None,
        }
    }

    pub(crate) fn internal_with_response(
        message: impl Into<String>,
        raw_response: impl Into<String>,
    ) -> Self {
        Self::Internal {
            message: message.into(),
            raw_response: Some(raw_response.into()),
        }
    }

    pub(crate) fn config_read(message: impl Into<String>) -> Self {
        Self::ConfigRead {
            message: message.into(),
        }
    }

    /// Which kind of failure this is.
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::TokenRequired { .. } => ErrorKind::TokenRequired,
            Self::LocationRequired { .. } => ErrorKind::LocationRequired,
            Self::Remote { .. } => ErrorKind::Remote,
            Self::RequestFailed { .. } => ErrorKind::RequestFailed,
            Self::ConnectFailed { .. } => ErrorKind::ConnectFailed,
            Self::Internal { .. } => ErrorKind::Internal,
            Self::ConfigRead { .. } => ErrorKind::ConfigRead,
        }
    }

    /// Numeric code: the server's code for [`Remote`](Self::Remote), the
    /// local kind number otherwise.
    pub fn code(&self) -> i64 {
        match self {
            Self::Remote { code, .. } => *code,
            other => other.kind() as i64,
        }
    }

    /// `true` when the server itself reported the failure.
    pub fn is_remote(&self) -> bool {
        matches!(self, Self::Remote { .. })
    }

    /// Known meaning of a server code, if this is a remote error with a documented code.
    pub fn remote_code(&self) -> Option<RemoteErrorCode> {
        match self {
            Self::Remote { code, .. } => RemoteErrorCode::from_code(*code),
            _ => None,
        }
    }

    /// The raw response body attached to the error, if any.
    pub fn raw_response(&self) -> Option<&str> {
        match self {
            Self::Remote { raw_response, .. } | Self::Internal { raw_response, .. } => {
                raw_response.as_deref()
            }
            Self::RequestFailed { raw_response, .. } => Some(raw_response),
            _ => None,
        }
    }
}

/// Error codes documented by the Fire Eagle API.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum RemoteErrorCode {
    Success = 0,
    UpdateProhibited = 1,
    UpdateOnly = 2,
    QueryProhibited = 3,
    Suspended = 4,
    PlaceNotFound = 6,
    UserNotFound = 7,
    InvalidQuery = 8,
    IsFrob = 10,
    NotValidated = 11,
    RequestTokenRequired = 12,
    Expired = 13,
    GeneralTokenRequired = 14,
    UnknownConsumer = 15,
    UnknownToken = 16,
    BadIpAddress = 17,
    ConsumerKeyRequired = 20,
    OAuthTokenRequired = 21,
    BadSignatureMethod = 22,
    InvalidSignature = 23,
    RepeatedNonce = 24,
    YahooapisRequired = 30,
    SslRequired = 31,
    RateLimiting = 32,
    InternalError = 50,
}

impl RemoteErrorCode {
    /// Map a raw server code onto a documented code.
    pub fn from_code(code: i64) -> Option<Self> {
        let known = match code {
            0 => Self::Success,
            1 => Self::UpdateProhibited,
            2 => Self::UpdateOnly,
            3 => Self::QueryProhibited,
            4 => Self::Suspended,
            6 => Self::PlaceNotFound,
            7 => Self::UserNotFound,
            8 => Self::InvalidQuery,
            10 => Self::IsFrob,
            11 => Self::NotValidated,
            12 => Self::RequestTokenRequired,
            13 => Self::Expired,
            14 => Self::GeneralTokenRequired,
            15 => Self::UnknownConsumer,
            16 => Self::UnknownToken,
            17 => Self::BadIpAddress,
            20 => Self::ConsumerKeyRequired,
            21 => Self::OAuthTokenRequired,
            22 => Self::BadSignatureMethod,
            23 => Self::InvalidSignature,
            24 => Self::RepeatedNonce,
            30 => Self::YahooapisRequired,
            31 => Self::SslRequired,
            32 => Self::RateLimiting,
            50 => Self::InternalError,
            _ => return None,
        };
        Some(known)
    }

    /// Short English description of the code.
    pub fn description(self) -> &'static str {
        match self {
            Self::Success => "Request succeeded",
            Self::UpdateProhibited => "Update not permitted for that user",
            Self::UpdateOnly => "Update successful, but read access prohibited",
            Self::QueryProhibited => "Query not permitted for that user",
            Self::Suspended => "User account is suspended",
            Self::PlaceNotFound => "Place can't be identified",
            Self::UserNotFound => "Authentication token can't be matched to a user",
            Self::InvalidQuery => "Invalid location query",
            Self::IsFrob => "Token provided is a request token, not an auth token",
            Self::NotValidated => "Request token has not been validated",
            Self::RequestTokenRequired => "Token provided must be an access token",
            Self::Expired => "Token has expired",
            Self::GeneralTokenRequired => "Token provided must be a general purpose token",
            Self::UnknownConsumer => "Unknown consumer key",
            Self::UnknownToken => "Token not found",
            Self::BadIpAddress => "Request made from non-blessed ip address",
            Self::ConsumerKeyRequired => "oauth_consumer_key parameter required",
            Self::OAuthTokenRequired => "oauth_token parameter required",
            Self::BadSignatureMethod => "Unsupported signature method",
            Self::InvalidSignature => "Invalid OAuth signature",
            Self::RepeatedNonce => "Provided nonce has been seen before",
            Self::YahooapisRequired => "All api methods should use fireeagle.yahooapis.com",
            Self::SslRequired => "SSL / https is required",
            Self::RateLimiting => "Rate limit/IP Block due to excessive requests",
            Self::InternalError => "Internal error occurred; try again later",
        }
    }
}

/// Convenience type alias for `Result<T, FireEagleError>`.
pub type Result<T> = std::result::Result<T, FireEagleError>;
