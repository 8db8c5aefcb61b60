//! End-to-end client flows against a scripted transport

mod common;

use common::{API_ROOT, config_builder, param, stub_client};
use fireeagle_client::{
    FireEagleError, HttpMethod, HttpResponse, OAuthVersion, Params, RemoteErrorCode,
    ResponseFormat, TokenPair, TokenRole, TokenStage, TransportErrorKind,
};

fn params(items: &[(&str, &str)]) -> Params {
    items
        .iter()
        .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
        .collect()
}

// ============ Token exchange ============

#[test]
fn request_token_moves_client_to_request_stage() {
    let (mut client, transport) = stub_client(config_builder().build());
    transport.push(HttpResponse::new(200, "oauth_token=R1&oauth_token_secret=S1"));

    let pair = require_ok!(client.get_request_token(None));

    assert_eq!(pair, TokenPair::new("R1", "S1"));
    assert_eq!(client.token(), Some(&TokenPair::new("R1", "S1")));
    assert_eq!(client.token_stage(), Some(TokenStage::Request));

    let requests = transport.requests();
    assert_eq!(requests.len(), 1);
    let request = &requests[0];
    assert_eq!(request.method, HttpMethod::Get);
    assert!(request.url.starts_with(&format!("{API_ROOT}/oauth/request_token?")));
    assert_eq!(param(&request.url, "oauth_callback"), Some("oob"));
    assert_eq!(param(&request.url, "oauth_consumer_key"), Some("consumer-key"));
    assert_eq!(param(&request.url, "oauth_token"), None);
    assert!(param(&request.url, "oauth_signature").is_some());
}

#[test]
fn request_token_on_1_0_omits_callback() {
    let (mut client, transport) =
        stub_client(config_builder().oauth_version(OAuthVersion::V1_0).build());
    transport.push(HttpResponse::new(200, "oauth_token=R1&oauth_token_secret=S1"));

    require_ok!(client.get_request_token(Some("http://cb.test/")));

    let requests = transport.requests();
    assert_eq!(param(&requests[0].url, "oauth_callback"), None);
}

#[test]
fn empty_exchange_leaves_client_unchanged() {
    let (mut client, transport) = stub_client(
        config_builder()
            .general_token(TokenPair::new("G1", "GS"))
            .build(),
    );
    transport.push(HttpResponse::new(200, "oauth_problem=nope"));

    let pair = require_ok!(client.get_request_token(None));

    assert!(!pair.is_valid());
    assert_eq!(client.token(), Some(&TokenPair::new("G1", "GS")));
    assert_eq!(client.token_stage(), Some(TokenStage::General));
}

#[test]
fn full_exchange_reaches_access_stage() {
    let (mut client, transport) = stub_client(config_builder().build());
    transport.push(HttpResponse::new(200, "oauth_token=R1&oauth_token_secret=S1"));
    transport.push(HttpResponse::new(200, "oauth_token=A1&oauth_token_secret=AS1"));

    require_ok!(client.get_request_token(None));
    let access = require_ok!(client.get_access_token(Some("V123")));

    assert_eq!(access, TokenPair::new("A1", "AS1"));
    assert_eq!(client.token_stage(), Some(TokenStage::Access));

    let requests = transport.requests();
    let url = &requests[1].url;
    assert!(url.starts_with(&format!("{API_ROOT}/oauth/access_token?")));
    assert_eq!(param(url, "oauth_token"), Some("R1"));
    assert_eq!(param(url, "oauth_verifier"), Some("V123"));
}

#[test]
fn access_token_without_verifier_fails_before_network() {
    let (mut client, transport) = stub_client(config_builder().build());
    transport.push(HttpResponse::new(200, "oauth_token=R1&oauth_token_secret=S1"));
    require_ok!(client.get_request_token(None));

    let err = client.get_access_token(None).unwrap_err();

    assert!(matches!(err, FireEagleError::TokenRequired { .. }));
    assert_eq!(transport.request_count(), 1);
}

#[test]
fn access_token_on_1_0_needs_no_verifier() {
    let (mut client, transport) =
        stub_client(config_builder().oauth_version(OAuthVersion::V1_0).build());
    client
        .set_token(TokenPair::new("R1", "S1"), TokenStage::Request)
        .unwrap();
    transport.push(HttpResponse::new(200, "oauth_token=A1&oauth_token_secret=AS1"));

    require_ok!(client.get_access_token(None));

    let requests = transport.requests();
    assert_eq!(param(&requests[0].url, "oauth_verifier"), None);
    assert_eq!(client.token_stage(), Some(TokenStage::Access));
}

// ============ API calls ============

#[test]
fn lookup_without_params_never_touches_transport() {
    let (mut client, transport) = stub_client(config_builder().build());
    client
        .set_token(TokenPair::new("A1", "AS1"), TokenStage::Access)
        .unwrap();

    let err = client.lookup(&Params::new(), ResponseFormat::Xml).unwrap_err();

    assert!(matches!(err, FireEagleError::LocationRequired { .. }));
    assert_eq!(err.to_string(), "lookup() needs a location");
    assert_eq!(transport.request_count(), 0);
}

#[test]
fn expired_token_is_remote_error() {
    let (mut client, transport) = stub_client(config_builder().build());
    client
        .set_token(TokenPair::new("A1", "AS1"), TokenStage::Access)
        .unwrap();
    transport.push_xml(
        401,
        r#"<rsp stat="fail"><err code="13" msg="Token has expired"/></rsp>"#,
    );

    let err = client.user(ResponseFormat::Xml).unwrap_err();

    assert!(err.is_remote());
    assert_eq!(err.code(), 13);
    assert_eq!(err.remote_code(), Some(RemoteErrorCode::Expired));
    assert!(err.to_string().contains("Token has expired"));
}

#[test]
fn unreachable_host_is_connect_failed() {
    let (mut client, transport) = stub_client(config_builder().build());
    client
        .set_token(TokenPair::new("A1", "AS1"), TokenStage::Access)
        .unwrap();
    transport.push(HttpResponse::transport_failure(
        TransportErrorKind::Timeout,
        "operation timed out",
    ));

    let err = client.user(ResponseFormat::Xml).unwrap_err();

    match err {
        FireEagleError::ConnectFailed {
            url,
            transport_code,
            ..
        } => {
            assert_eq!(url, format!("{API_ROOT}/api/0.1/user.xml"));
            assert_eq!(transport_code, TransportErrorKind::Timeout as i32);
        }
        other => panic!("expected ConnectFailed, got {other:?}"),
    }
}

#[test]
fn html_error_page_is_request_failed() {
    let (mut client, transport) = stub_client(config_builder().build());
    client
        .set_token(TokenPair::new("A1", "AS1"), TokenStage::Access)
        .unwrap();
    transport.push(
        HttpResponse::new(502, "<html>bad gateway</html>").with_header("Content-Type", "text/html"),
    );

    let err = client.user(ResponseFormat::Xml).unwrap_err();

    assert!(matches!(
        err,
        FireEagleError::RequestFailed { status: 502, .. }
    ));
    assert_eq!(err.raw_response(), Some("<html>bad gateway</html>"));
}

#[test]
fn update_posts_signed_body() {
    let (mut client, transport) = stub_client(config_builder().build());
    client
        .set_token(TokenPair::new("A1", "AS1"), TokenStage::Access)
        .unwrap();
    transport.push_ok(r#"<rsp stat="ok"/>"#);

    require_ok!(client.update(&params(&[("q", "Palo Alto, CA")]), ResponseFormat::Xml));

    let requests = transport.requests();
    let request = &requests[0];
    assert_eq!(request.method, HttpMethod::Post);
    assert_eq!(request.url, format!("{API_ROOT}/api/0.1/update.xml"));
    let body = require_some!(request.body.as_deref());
    assert_eq!(param(body, "q"), Some("Palo%20Alto%2C%20CA"));
    assert_eq!(param(body, "oauth_token"), Some("A1"));
}

#[test]
fn header_mode_moves_credentials_to_authorization() {
    let (mut client, transport) = stub_client(config_builder().auth_header(true).build());
    client
        .set_token(TokenPair::new("A1", "AS1"), TokenStage::Access)
        .unwrap();
    transport.push_ok(r#"<rsp stat="ok"/>"#);

    require_ok!(client.lookup(&params(&[("q", "London")]), ResponseFormat::Xml));

    let requests = transport.requests();
    let request = &requests[0];
    assert_eq!(request.url, format!("{API_ROOT}/api/0.1/lookup.xml?q=London"));
    let header = require_some!(request.header("Authorization"));
    assert!(header.starts_with("OAuth realm=\"\""));
    assert!(header.contains("oauth_token=\"A1\""));
    assert!(header.contains("oauth_signature=\""));
}

#[test]
fn header_mode_update_body_carries_no_credentials() {
    let (mut client, transport) = stub_client(config_builder().auth_header(true).build());
    client
        .set_token(TokenPair::new("A1", "AS1"), TokenStage::Access)
        .unwrap();
    transport.push_ok(r#"<rsp stat="ok"/>"#);

    require_ok!(client.update(&params(&[("q", "Palo Alto, CA")]), ResponseFormat::Xml));

    let requests = transport.requests();
    let request = &requests[0];
    assert_eq!(request.method, HttpMethod::Post);
    assert_eq!(request.url, format!("{API_ROOT}/api/0.1/update.xml"));
    assert_eq!(request.body.as_deref(), Some("q=Palo%20Alto%2C%20CA"));
    let header = require_some!(request.header("Authorization"));
    assert!(header.contains("oauth_token=\"A1\""));
    assert!(header.contains("oauth_signature=\""));
}

#[test]
fn within_and_recent_sign_with_general_token() {
    let (mut client, transport) = stub_client(
        config_builder()
            .general_token(TokenPair::new("G1", "GS"))
            .build(),
    );
    client
        .set_token(TokenPair::new("A1", "AS1"), TokenStage::Access)
        .unwrap();
    transport.push_ok(r#"<rsp stat="ok"><users/></rsp>"#);
    transport.push_ok(r#"<rsp stat="ok"><users/></rsp>"#);

    require_ok!(client.within(&params(&[("woeid", "2487956")]), ResponseFormat::Xml));
    require_ok!(client.recent(&Params::new(), ResponseFormat::Json));

    let requests = transport.requests();
    assert_eq!(param(&requests[0].url, "oauth_token"), Some("G1"));
    assert!(requests[1].url.starts_with(&format!("{API_ROOT}/api/0.1/recent.json")));
    assert_eq!(param(&requests[1].url, "oauth_token"), Some("G1"));
}

#[test]
fn within_without_general_token_fails_locally() {
    let (mut client, transport) = stub_client(config_builder().build());
    client
        .set_token(TokenPair::new("A1", "AS1"), TokenStage::Access)
        .unwrap();

    let err = client
        .within(&params(&[("woeid", "2487956")]), ResponseFormat::Xml)
        .unwrap_err();

    assert!(matches!(err, FireEagleError::TokenRequired { .. }));
    assert_eq!(transport.request_count(), 0);
}

#[test]
fn signed_request_with_no_token_role() {
    let (client, transport) = stub_client(config_builder().build());
    transport.push(HttpResponse::new(200, "plain"));

    let body = require_ok!(client.signed_request(
        &format!("{API_ROOT}/custom"),
        TokenRole::None,
        &Params::new(),
        true,
    ));

    assert_eq!(body, "plain");
    let requests = transport.requests();
    let request = &requests[0];
    assert_eq!(request.method, HttpMethod::Get);
    assert_eq!(param(&request.url, "oauth_token"), None);
}

// ============ Decoding ============

#[test]
fn user_round_trip_through_client() {
    let (mut client, transport) = stub_client(config_builder().build());
    client
        .set_token(TokenPair::new("A1", "AS1"), TokenStage::Access)
        .unwrap();
    transport.push_ok(
        r#"<?xml version="1.0" encoding="utf-8"?>
<rsp stat="ok">
  <user token="A1" readable="true" writable="true" located-at="2008-07-01T14:00:00-07:00">
    <location-hierarchy string="23424977|2487956" timezone="America/Los_Angeles">
      <location best-guess="true">
        <level>3</level>
        <level-name>city</level-name>
        <name>San Francisco, CA</name>
        <georss:box>37.70 -122.52 37.81 -122.35</georss:box>
        <woeid exact-match="true">2487956</woeid>
      </location>
    </location-hierarchy>
  </user>
</rsp>"#,
    );

    let body = require_ok!(client.user(ResponseFormat::Xml));
    let user = require_ok!(client.user_from_response(&body, ResponseFormat::Xml));

    assert_eq!(user.token, "A1");
    assert!(user.writable);
    assert_eq!(user.woeid_hierarchy_levels(), vec!["23424977", "2487956"]);
    let best = require_some!(user.best_guess());
    assert_eq!(best.level, Some(3));
    assert_eq!(best.woeid, Some(2_487_956));
    assert!(best.woeid_exact);
    assert!(best.geometry.is_some());
}

#[test]
fn typed_json_decoding_is_internal_error() {
    let (client, _transport) = stub_client(config_builder().build());
    let err = client
        .user_from_response(r#"{"rsp":{"stat":"ok"}}"#, ResponseFormat::Json)
        .unwrap_err();
    assert!(matches!(err, FireEagleError::Internal { .. }));
}
