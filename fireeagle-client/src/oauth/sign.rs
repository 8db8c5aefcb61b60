//! OAuth 1.0 HMAC-SHA1 signature
//! Reference: <https://oauth.net/core/1.0a/#signing_process>

use base64::Engine;
use base64::engine::general_purpose::STANDARD as BASE64;
use hmac::{Hmac, Mac};
use sha1::Sha1;
use url::Url;

use crate::error::{FireEagleError, Result};

type HmacSha1 = Hmac<Sha1>;

/// RFC 3986 percent-encoding: everything but `A-Z a-z 0-9 - . _ ~` is escaped.
pub fn percent_encode(s: &str) -> String {
    urlencoding::encode(s).into_owned()
}

/// Split a request URL into its normalized base (scheme and host lowercased,
/// default port, query and fragment dropped) and its decoded query pairs.
pub(crate) fn split_request_url(raw: &str) -> Result<(String, Vec<(String, String)>)> {
    let url = Url::parse(raw)
        .map_err(|e| FireEagleError::internal(format!("Invalid request URL {raw}: {e}")))?;
    let Some(host) = url.host_str() else {
        return Err(FireEagleError::internal(format!(
            "Request URL has no host: {raw}"
        )));
    };

    let port = url.port().map(|p| format!(":{p}")).unwrap_or_default();
    let base = format!("{}://{host}{port}{}", url.scheme(), url.path());
    let query = url
        .query_pairs()
        .map(|(k, v)| (k.into_owned(), v.into_owned()))
        .collect();
    Ok((base, query))
}

/// Encode every pair, sort by encoded name then value, join with `&`.
pub(crate) fn normalize_params(params: &[(String, String)]) -> String {
    let mut encoded: Vec<(String, String)> = params
        .iter()
        .map(|(k, v)| (percent_encode(k), percent_encode(v)))
        .collect();
    encoded.sort();
    encoded
        .iter()
        .map(|(k, v)| format!("{k}={v}"))
        .collect::<Vec<_>>()
        .join("&")
}

/// `METHOD&enc(base_url)&enc(normalized_params)`
pub fn signature_base_string(method: &str, base_url: &str, normalized_params: &str) -> String {
    format!(
        "{method}&{}&{}",
        percent_encode(base_url),
        percent_encode(normalized_params)
    )
}

/// Base64 HMAC-SHA1 of the base string, keyed by `enc(consumer_secret)&enc(token_secret)`.
pub fn hmac_sha1_signature(
    consumer_secret: &str,
    token_secret: &str,
    base_string: &str,
) -> Result<String> {
    let key = format!(
        "{}&{}",
        percent_encode(consumer_secret),
        percent_encode(token_secret)
    );
    let mut mac = HmacSha1::new_from_slice(key.as_bytes())
        .map_err(|e| FireEagleError::internal(format!("OAuth signing failed: {e}")))?;
    mac.update(base_string.as_bytes());
    Ok(BASE64.encode(mac.finalize().into_bytes()))
}
