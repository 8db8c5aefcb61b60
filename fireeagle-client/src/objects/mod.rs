//! Typed records decoded from API responses
//!
//! The `*_from_response` functions parse a raw body with the registered
//! parser for the format, run the envelope check and walk the tree into
//! [`User`] / [`Location`] values. Only XML is decoded; JSON bodies are
//! rejected with [`FireEagleError::Internal`].

mod geometry;
mod location;
mod user;

use crate::classify::inspect_envelope;
use crate::error::{FireEagleError, Result};
use crate::parser::{ParsedNode, ParserRegistry};
use crate::types::ResponseFormat;

pub use geometry::Geometry;
pub use location::Location;
pub use user::User;

/// Parse a response body and check its envelope.
pub fn parse_response(
    parsers: &ParserRegistry,
    body: &str,
    format: ResponseFormat,
    what: &str,
) -> Result<ParsedNode> {
    if format == ResponseFormat::Json {
        return Err(FireEagleError::internal_with_response(
            format!("Decoding a {what} is not implemented for JSON"),
            body,
        ));
    }
    let Some(parser) = parsers.parser_for(format.content_type()) else {
        return Err(FireEagleError::internal_with_response(
            format!(
                "Cannot parse response to make a {what}. No registered handler for requested format."
            ),
            body,
        ));
    };
    let root = parser.parse(body).map_err(|e| e.into_internal(body))?;
    inspect_envelope(&root, body)?;
    Ok(root)
}

/// First child of the envelope with the given name.
fn payload<'a>(root: &'a ParsedNode, name: &str, api: &str, body: &str) -> Result<&'a ParsedNode> {
    root.children_named(name).next().ok_or_else(|| {
        FireEagleError::internal_with_response(
            format!("Unknown XML response format for {api} API: No {name} element present"),
            body,
        )
    })
}

/// Decode the `user` response: `<rsp><user .../></rsp>`.
pub fn user_from_response(
    parsers: &ParserRegistry,
    body: &str,
    format: ResponseFormat,
) -> Result<User> {
    let root = parse_response(parsers, body, format, "user object")?;
    match root.get_child(0) {
        Some(node) => User::from_node(node),
        None => Err(FireEagleError::internal_with_response(
            "Expected element = user. Got: nothing",
            body,
        )),
    }
}

/// Decode the `lookup` response: `<rsp><locations><location/>...</locations></rsp>`.
pub fn locations_from_response(
    parsers: &ParserRegistry,
    body: &str,
    format: ResponseFormat,
) -> Result<Vec<Location>> {
    let root = parse_response(parsers, body, format, "location list")?;
    locations_from_node(payload(&root, "locations", "lookup", body)?)
}

/// Decode `within`/`recent` responses: `<rsp><users><user/>...</users></rsp>`.
pub fn users_from_response(
    parsers: &ParserRegistry,
    body: &str,
    format: ResponseFormat,
) -> Result<Vec<User>> {
    let root = parse_response(parsers, body, format, "user list")?;
    payload(&root, "users", "user list", body)?
        .children()
        .iter()
        .map(User::from_node)
        .collect()
}

/// Decode a `<locations>` element; every child must be a `<location>`.
pub fn locations_from_node(node: &ParsedNode) -> Result<Vec<Location>> {
    if node.name() != "locations" {
        return Err(FireEagleError::internal(format!(
            "Expected element = locations. Got: {}",
            node.name()
        )));
    }
    node.children().iter().map(Location::from_node).collect()
}
