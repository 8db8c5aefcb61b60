use std::collections::BTreeMap;
use std::fmt;
use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{FireEagleError, Result};

/// API call parameters, kept sorted by name.
pub type Params = BTreeMap<String, String>;

// ============ Token pair ============

/// An OAuth token and its secret.
///
/// Consumer (app), general, request and access tokens all share this shape;
/// which role a pair plays depends only on where it is used. A pair is valid
/// when both halves are non-empty.
///
/// The serialized form is one line: `"<token> <secret>"`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TokenPair {
    pub token: String,
    pub secret: String,
}

impl TokenPair {
    pub fn new(token: impl Into<String>, secret: impl Into<String>) -> Self {
        Self {
            token: token.into(),
            secret: secret.into(),
        }
    }

    pub fn empty() -> Self {
        Self::default()
    }

    pub fn is_valid(&self) -> bool {
        !self.token.is_empty() && !self.secret.is_empty()
    }

    /// Parse the single-line `"<token> <secret>"` form. Exactly one space.
    pub fn parse(line: &str) -> Result<Self> {
        let line = line.trim_end_matches(['\r', '\n']);
        let Some((token, secret)) = line.split_once(' ') else {
            return Err(FireEagleError::config_read(
                "Invalid token format: missing separator",
            ));
        };
        if token.is_empty() || secret.is_empty() {
            return Err(FireEagleError::config_read(
                "Invalid token format: empty token or secret",
            ));
        }
        if secret.contains(char::is_whitespace) {
            return Err(FireEagleError::config_read(
                "Invalid token format: more than one separator",
            ));
        }
        Ok(Self::new(token, secret))
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let data = fs::read_to_string(path).map_err(|e| {
            FireEagleError::config_read(format!(
                "Could not open token file ({}): {e}",
                path.display()
            ))
        })?;
        let line = data.lines().next().unwrap_or_default();
        Self::parse(line).map_err(|e| {
            FireEagleError::config_read(format!(
                "Token file: {} . Invalid format. ({e})",
                path.display()
            ))
        })
    }

    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        self.check_serializable()?;
        let path = path.as_ref();
        fs::write(path, format!("{self}\n")).map_err(|e| {
            FireEagleError::internal(format!(
                "Could not open token file ({}) for saving: {e}",
                path.display()
            ))
        })
    }

    /// Reject pairs that would not survive a save/load round trip.
    pub(crate) fn check_serializable(&self) -> Result<()> {
        if !self.is_valid() {
            return Err(FireEagleError::internal("Cannot save an empty TokenPair."));
        }
        if self.token.contains(char::is_whitespace) || self.secret.contains(char::is_whitespace)
        {
            return Err(FireEagleError::internal(
                "Cannot save a TokenPair whose token or secret contains whitespace.",
            ));
        }
        Ok(())
    }
}

impl fmt::Display for TokenPair {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.token, self.secret)
    }
}

// ============ Token roles ============

/// Which credential a signed call carries besides the consumer key.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TokenRole {
    /// Consumer credentials only.
    None,
    /// The general-purpose token configured on [`ClientConfig`](crate::ClientConfig).
    General,
    Request,
    Access,
}

/// Where a client's current token sits in the exchange flow.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TokenStage {
    General,
    /// Obtained from `/oauth/request_token`.
    Request,
    /// Obtained from `/oauth/access_token`.
    Access,
}

/// OAuth protocol revision.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum OAuthVersion {
    /// OAuth Core 1.0: callback travels with the authorize URL.
    #[serde(rename = "1.0")]
    V1_0,
    /// OAuth Core 1.0a: signed `oauth_callback` and `oauth_verifier`.
    #[default]
    #[serde(rename = "1.0a")]
    V1_0a,
}

impl OAuthVersion {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::V1_0 => "1.0",
            Self::V1_0a => "1.0a",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s.trim() {
            "1.0" => Some(Self::V1_0),
            "1.0a" => Some(Self::V1_0a),
            _ => None,
        }
    }
}

// ============ Response format ============

/// Wire format requested from the API.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ResponseFormat {
    #[default]
    Xml,
    Json,
}

impl ResponseFormat {
    /// Suffix appended to API method URLs.
    pub fn suffix(self) -> &'static str {
        match self {
            Self::Xml => ".xml",
            Self::Json => ".json",
        }
    }

    /// Content type the server declares for this format.
    pub fn content_type(self) -> &'static str {
        match self {
            Self::Xml => "application/xml",
            Self::Json => "application/json",
        }
    }
}
