//! Client configuration and the `key:value` config file

use std::fmt::Write as _;
use std::fs;
use std::path::Path;

use crate::error::{FireEagleError, Result};
use crate::http_client::HttpOptions;
use crate::parser::ParserRegistry;
use crate::types::{OAuthVersion, ResponseFormat, TokenPair};

pub const DEFAULT_ROOT_URL: &str = "http://fireeagle.yahoo.net";
pub const DEFAULT_API_ROOT_URL: &str = "https://fireeagle.yahooapis.com";

/// Settings shared by every [`ApiClient`](crate::ApiClient) built from them.
///
/// Holds the consumer (app) token, the optional general-purpose token, the
/// service URLs, protocol switches and the parser registry. Immutable once
/// built; clients share it through an `Arc`.
#[derive(Debug, Clone)]
pub struct ClientConfig {
    app_token: TokenPair,
    general_token: Option<TokenPair>,
    root_url: String,
    api_root_url: String,
    oauth_version: OAuthVersion,
    auth_header: bool,
    debug: bool,
    dump_requests: bool,
    http: HttpOptions,
    parsers: ParserRegistry,
    /// Unrecognized `key:value` lines, in file order.
    extra: Vec<(String, String)>,
}

/// Builder for [`ClientConfig`].
#[derive(Debug, Clone)]
pub struct ClientConfigBuilder {
    config: ClientConfig,
}

impl ClientConfigBuilder {
    fn new(app_token: TokenPair) -> Self {
        Self {
            config: ClientConfig {
                app_token,
                general_token: None,
                root_url: DEFAULT_ROOT_URL.to_string(),
                api_root_url: DEFAULT_API_ROOT_URL.to_string(),
                oauth_version: OAuthVersion::default(),
                auth_header: false,
                debug: false,
                dump_requests: false,
                http: HttpOptions::default(),
                parsers: ParserRegistry::with_defaults(),
                extra: Vec::new(),
            },
        }
    }

    /// Site root used for the authorize page (default: `http://fireeagle.yahoo.net`).
    pub fn root_url(mut self, url: impl Into<String>) -> Self {
        self.config.root_url = trim_url(url.into());
        self
    }

    /// API root for token and method calls (default: `https://fireeagle.yahooapis.com`).
    pub fn api_root_url(mut self, url: impl Into<String>) -> Self {
        self.config.api_root_url = trim_url(url.into());
        self
    }

    /// General-purpose token used by `within` and `recent`.
    pub fn general_token(mut self, token: TokenPair) -> Self {
        self.config.general_token = Some(token);
        self
    }

    pub fn oauth_version(mut self, version: OAuthVersion) -> Self {
        self.config.oauth_version = version;
        self
    }

    /// Send OAuth parameters in an `Authorization` header instead of the query or body.
    pub fn auth_header(mut self, enabled: bool) -> Self {
        self.config.auth_header = enabled;
        self
    }

    /// Trace requests and responses at `info` level.
    pub fn debug(mut self, enabled: bool) -> Self {
        self.config.debug = enabled;
        self
    }

    /// Dump full, untruncated requests and responses on the `fireeagle_client::dump` target.
    pub fn dump_requests(mut self, enabled: bool) -> Self {
        self.config.dump_requests = enabled;
        self
    }

    pub fn http(mut self, options: HttpOptions) -> Self {
        self.config.http = options;
        self
    }

    /// Replace the parser registry.
    pub fn parsers(mut self, parsers: ParserRegistry) -> Self {
        self.config.parsers = parsers;
        self
    }

    pub fn build(self) -> ClientConfig {
        self.config
    }
}

fn trim_url(url: String) -> String {
    url.trim_end_matches('/').to_string()
}

fn push_line(out: &mut String, key: &str, value: &str) {
    let _ = writeln!(out, "{key}:{value}");
}

impl ClientConfig {
    /// A config with default URLs and settings.
    pub fn new(app_token: TokenPair) -> Self {
        Self::builder(app_token).build()
    }

    pub fn builder(app_token: TokenPair) -> ClientConfigBuilder {
        ClientConfigBuilder::new(app_token)
    }

    // ============ Accessors ============

    pub fn app_token(&self) -> &TokenPair {
        &self.app_token
    }

    /// The general-purpose token, when one is configured and valid.
    pub fn general_token(&self) -> Option<&TokenPair> {
        self.general_token.as_ref().filter(|t| t.is_valid())
    }

    pub fn root_url(&self) -> &str {
        &self.root_url
    }

    pub fn api_root_url(&self) -> &str {
        &self.api_root_url
    }

    pub fn oauth_version(&self) -> OAuthVersion {
        self.oauth_version
    }

    pub fn auth_header(&self) -> bool {
        self.auth_header
    }

    pub fn debug(&self) -> bool {
        self.debug
    }

    pub fn dump_requests(&self) -> bool {
        self.dump_requests
    }

    pub fn http_options(&self) -> &HttpOptions {
        &self.http
    }

    pub fn parsers(&self) -> &ParserRegistry {
        &self.parsers
    }

    /// Unrecognized settings carried over from a loaded file.
    pub fn extra_settings(&self) -> &[(String, String)] {
        &self.extra
    }

    // ============ Endpoints ============

    pub fn request_token_url(&self) -> String {
        format!("{}/oauth/request_token", self.api_root_url)
    }

    pub fn authorize_url(&self) -> String {
        format!("{}/oauth/authorize", self.root_url)
    }

    pub fn access_token_url(&self) -> String {
        format!("{}/oauth/access_token", self.api_root_url)
    }

    /// `<api_root>/api/0.1/<method>.xml|.json`
    pub fn method_url(&self, method: &str, format: ResponseFormat) -> String {
        format!("{}/api/0.1/{method}{}", self.api_root_url, format.suffix())
    }

    // ============ Config file ============

    /// Load a `key:value` config file.
    ///
    /// Recognized keys: `app_token_file`, `app_token_data`,
    /// `general_token_file`, `general_token_data`, `root_url`, `api_base_url`,
    /// `oauth_version` and `auth_header`. Lines starting with `#` and blank
    /// lines are skipped; other keys are kept for [`save`](Self::save).
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let data = fs::read_to_string(path).map_err(|e| {
            FireEagleError::config_read(format!(
                "Failed to open configuration file {} for loading: {e}",
                path.display()
            ))
        })?;

        let mut builder = Self::builder(TokenPair::empty());
        for (index, raw_line) in data.lines().enumerate() {
            let line = raw_line.trim();
            if line.is_empty() || line.starts_with('#') {
                continue;
            }
            let Some((key, value)) = line.split_once(':') else {
                return Err(FireEagleError::config_read(format!(
                    "Invalid config statement '{line}' in config file {} at line {}",
                    path.display(),
                    index + 1
                )));
            };
            let (key, value) = (key.trim(), value.trim());
            let invalid_value = |what: &str| {
                FireEagleError::config_read(format!(
                    "Invalid {what} '{value}' in config file {} at line {}",
                    path.display(),
                    index + 1
                ))
            };

            match key {
                "app_token_file" => builder.config.app_token = TokenPair::load(value)?,
                "app_token_data" => builder.config.app_token = TokenPair::parse(value)?,
                "general_token_file" => builder = builder.general_token(TokenPair::load(value)?),
                "general_token_data" => builder = builder.general_token(TokenPair::parse(value)?),
                "root_url" => builder = builder.root_url(value),
                "api_base_url" => builder = builder.api_root_url(value),
                "oauth_version" => {
                    let version =
                        OAuthVersion::parse(value).ok_or_else(|| invalid_value("oauth_version"))?;
                    builder = builder.oauth_version(version);
                }
                "auth_header" => {
                    let enabled = match value {
                        "true" => true,
                        "false" => false,
                        _ => return Err(invalid_value("auth_header")),
                    };
                    builder = builder.auth_header(enabled);
                }
                _ => builder
                    .config
                    .extra
                    .push((key.to_string(), value.to_string())),
            }
        }

        if !builder.config.app_token.is_valid() {
            return Err(FireEagleError::config_read(format!(
                "Could not initialize application token from config file {}",
                path.display()
            )));
        }
        log::debug!("Loaded Fire Eagle config from {}", path.display());
        Ok(builder.build())
    }

    /// Write the config in the format [`load`](Self::load) reads.
    ///
    /// Tokens are written inline (`*_token_data`).
    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        if !self.app_token.is_valid() {
            return Err(FireEagleError::internal(
                "Cannot save an invalid config: missing application token.",
            ));
        }
        self.app_token.check_serializable()?;

        let mut out = String::new();
        push_line(&mut out, "app_token_data", &self.app_token.to_string());
        push_line(&mut out, "root_url", &self.root_url);
        push_line(&mut out, "api_base_url", &self.api_root_url);
        if let Some(general) = self.general_token() {
            general.check_serializable()?;
            push_line(&mut out, "general_token_data", &general.to_string());
        }
        push_line(&mut out, "oauth_version", self.oauth_version.as_str());
        push_line(
            &mut out,
            "auth_header",
            if self.auth_header { "true" } else { "false" },
        );
        for (key, value) in &self.extra {
            push_line(&mut out, key, value);
        }

        let path = path.as_ref();
        fs::write(path, out).map_err(|e| {
            FireEagleError::internal(format!(
                "Could not open config file ({}) for saving: {e}",
                path.display()
            ))
        })
    }
}
