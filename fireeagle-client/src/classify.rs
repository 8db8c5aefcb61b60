//! Response classification
//!
//! Every completed exchange passes through [`classify_response`]: transport
//! failures become [`FireEagleError::ConnectFailed`], non-200 answers are
//! parsed (when a parser is registered for their content type) and checked
//! with [`inspect_envelope`], 200 bodies are handed back untouched.

use log::Level;

use crate::config::ClientConfig;
use crate::error::{FireEagleError, Result};
use crate::http_client::{HttpRequest, HttpResponse};
use crate::parser::ParsedNode;
use crate::utils::log_sanitizer::{redact_oauth_params, truncate_for_log};

/// Log target for full request/response dumps.
pub const DUMP_TARGET: &str = "fireeagle_client::dump";

const UNKNOWN_FORMAT: &str = "Unknown XML response format from Fire Eagle";

/// Check the `<rsp stat="...">` envelope of a parsed response.
///
/// `stat="ok"` passes whatever else the root holds. `stat="fail"` becomes
/// [`FireEagleError::Remote`] only when the root has exactly one child, an
/// `err` element whose `code` is a complete integer; every other shape is
/// [`FireEagleError::Internal`].
pub fn inspect_envelope(root: &ParsedNode, raw: &str) -> Result<()> {
    let malformed = || FireEagleError::internal_with_response(UNKNOWN_FORMAT, raw);

    if root.name() != "rsp" {
        return Err(malformed());
    }
    match root.get_string("stat") {
        "ok" => return Ok(()),
        "fail" => {}
        _ => return Err(malformed()),
    }

    let err = match root.children() {
        [only] if only.name() == "err" => only,
        _ => return Err(malformed()),
    };
    let (code, code_ok) = err.get_long("code");
    if !code_ok {
        return Err(FireEagleError::internal_with_response(
            format!(
                "Invalid error code '{}' in Fire Eagle error response",
                err.get_string("code")
            ),
            raw,
        ));
    }

    let message = err.get_string("msg").to_string();
    log::error!("Fire Eagle remote error {code}: {message}");
    Err(FireEagleError::Remote {
        code,
        message,
        raw_response: Some(raw.to_string()),
    })
}

/// Level for request/response tracing: `info` in debug mode, `debug` otherwise.
pub(crate) fn trace_level(config: &ClientConfig) -> Level {
    if config.debug() {
        Level::Info
    } else {
        Level::Debug
    }
}

pub(crate) fn log_request(config: &ClientConfig, request: &HttpRequest) {
    let level = trace_level(config);
    log::log!(
        level,
        "FireEagle {} Request: {}",
        request.method.as_str(),
        redact_oauth_params(&request.url)
    );
    if let Some(body) = &request.body {
        log::log!(level, "Request body: {}", redact_oauth_params(body));
    }
    if config.dump_requests() {
        log::info!(
            target: DUMP_TARGET,
            "[FE HTTP request: url: {}, post data: {}]",
            request.url,
            request.body.as_deref().unwrap_or_default()
        );
    }
}

fn log_response(config: &ClientConfig, url: &str, response: &HttpResponse) {
    log::log!(
        trace_level(config),
        "Response from {url}: HTTP {}, {}",
        response.status,
        truncate_for_log(&response.body)
    );
    if config.dump_requests() {
        log::info!(
            target: DUMP_TARGET,
            "HTTP/1.0 {}\nContent-Type: {}\nContent-Length: {}\n\n{}",
            response.status,
            response.content_type(),
            response.header("content-length").unwrap_or_default(),
            response.body
        );
    }
}

/// Turn a transport outcome into the body to return or an error.
///
/// `url` is the requested URL as it should appear in error messages.
pub(crate) fn classify_response(
    config: &ClientConfig,
    url: &str,
    response: HttpResponse,
) -> Result<String> {
    if let Some(failure) = response.transport_error() {
        log::warn!("Connection to {url} failed: {}", failure.detail);
        return Err(FireEagleError::ConnectFailed {
            url: url.to_string(),
            transport_code: response.transport_error_code(),
            detail: failure.detail.clone(),
        });
    }
    if response.status == 0 {
        return Err(FireEagleError::ConnectFailed {
            url: url.to_string(),
            transport_code: 0,
            detail: "no response".to_string(),
        });
    }

    log_response(config, url, &response);

    if response.status != 200 {
        log::warn!("Request to {url} returned HTTP {}", response.status);
        let content_type = response.content_type();
        let Some(parser) = config.parsers().parser_for(content_type) else {
            return Err(FireEagleError::RequestFailed {
                url: url.to_string(),
                status: response.status,
                content_type: content_type.to_string(),
                raw_response: response.body,
            });
        };
        let root = parser
            .parse(&response.body)
            .map_err(|e| e.into_internal(&response.body))?;
        // a success envelope wins over the HTTP status
        inspect_envelope(&root, &response.body)?;
    }

    Ok(response.body)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::http_client::TransportErrorKind;
    use crate::parser::{ResponseParser, XmlParser};
    use crate::types::TokenPair;

    const URL: &str = "https://api.test/api/0.1/user.xml";

    fn config() -> ClientConfig {
        ClientConfig::new(TokenPair::new("ck", "cs"))
    }

    fn xml(text: &str) -> ParsedNode {
        XmlParser::new().parse(text).unwrap()
    }

    fn xml_response(status: u16, body: &str) -> HttpResponse {
        HttpResponse::new(status, body).with_header("Content-Type", "application/xml; charset=utf-8")
    }

    // ============ Envelope ============

    #[test]
    fn ok_envelope_passes_with_or_without_err_child() {
        assert!(inspect_envelope(&xml(r#"<rsp stat="ok"/>"#), "").is_ok());
        assert!(
            inspect_envelope(&xml(r#"<rsp stat="ok"><err code="1" msg="x"/></rsp>"#), "").is_ok()
        );
    }

    #[test]
    fn fail_envelope_is_remote_error() {
        let raw = r#"<rsp stat="fail"><err code="13" msg="Token has expired"/></rsp>"#;
        let err = inspect_envelope(&xml(raw), raw).unwrap_err();
        match err {
            FireEagleError::Remote {
                code,
                ref message,
                ref raw_response,
            } => {
                assert_eq!(code, 13);
                assert_eq!(message, "Token has expired");
                assert_eq!(raw_response.as_deref(), Some(raw));
            }
            other => panic!("expected Remote, got {other:?}"),
        }
    }

    #[test]
    fn fail_envelope_with_wrong_shape_is_internal() {
        for raw in [
            r#"<rsp stat="fail"/>"#,
            r#"<rsp stat="fail"><err code="1" msg="a"/><err code="2" msg="b"/></rsp>"#,
            r#"<rsp stat="fail"><error code="1" msg="a"/></rsp>"#,
            r#"<rsp stat="fail"><err code="1x" msg="a"/></rsp>"#,
            r#"<rsp stat="fail"><err msg="a"/></rsp>"#,
            r#"<rsp stat="maybe"/>"#,
            r#"<response stat="ok"/>"#,
        ] {
            let err = inspect_envelope(&xml(raw), raw).unwrap_err();
            assert!(
                matches!(err, FireEagleError::Internal { .. }),
                "{raw} gave {err:?}"
            );
        }
    }

    // ============ Classification ============

    #[test]
    fn status_zero_is_connect_failed() {
        let response = HttpResponse::transport_failure(TransportErrorKind::Connect, "refused");
        let err = classify_response(&config(), URL, response).unwrap_err();
        match err {
            FireEagleError::ConnectFailed { transport_code, .. } => assert_eq!(transport_code, 1),
            other => panic!("expected ConnectFailed, got {other:?}"),
        }
    }

    #[test]
    fn ok_body_returned_without_envelope_check() {
        let body = classify_response(&config(), URL, xml_response(200, "not even xml")).unwrap();
        assert_eq!(body, "not even xml");
    }

    #[test]
    fn non_200_with_fail_envelope_is_remote() {
        let body = r#"<rsp stat="fail"><err code="13" msg="Token has expired"/></rsp>"#;
        let err = classify_response(&config(), URL, xml_response(401, body)).unwrap_err();
        assert!(err.is_remote());
        assert_eq!(err.code(), 13);
        assert!(err.to_string().contains("Token has expired"));
    }

    #[test]
    fn non_200_with_ok_envelope_continues() {
        let body = r#"<rsp stat="ok"><user/></rsp>"#;
        let out = classify_response(&config(), URL, xml_response(500, body)).unwrap();
        assert_eq!(out, body);
    }

    #[test]
    fn non_200_without_parser_is_request_failed() {
        let response = HttpResponse::new(503, "<html/>").with_header("Content-Type", "text/html");
        let err = classify_response(&config(), URL, response).unwrap_err();
        assert_eq!(
            err.to_string(),
            format!("Request to {URL} failed: HTTP error 503 Content Type: text/html")
        );
        assert_eq!(err.raw_response(), Some("<html/>"));
    }

    #[test]
    fn non_200_with_unparsable_body_is_internal() {
        let err =
            classify_response(&config(), URL, xml_response(500, "<rsp><oops></rsp>")).unwrap_err();
        assert!(matches!(err, FireEagleError::Internal { .. }));
        assert_eq!(err.raw_response(), Some("<rsp><oops></rsp>"));
    }

    #[test]
    fn trace_level_follows_debug_flag() {
        assert_eq!(trace_level(&config()), Level::Debug);
        let debug = ClientConfig::builder(TokenPair::new("ck", "cs"))
            .debug(true)
            .build();
        assert_eq!(trace_level(&debug), Level::Info);
    }
}
