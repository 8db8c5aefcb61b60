//! Response parsing
//!
//! Raw response text becomes a [`ParsedNode`] tree that decoding code can walk
//! without knowing the serialization format. Parsers are looked up by content
//! type in a [`ParserRegistry`] held by the client configuration.

mod node;
mod xml;

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use thiserror::Error;

use crate::error::FireEagleError;

pub use node::{ParsedNode, TEXT_PROPERTY};
pub use xml::XmlParser;

/// Failure to turn response text into a tree.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ParseError {
    #[error("malformed document at byte {position}: {detail}")]
    Malformed { position: u64, detail: String },

    #[error("document ended inside element <{element}>")]
    Truncated { element: String },

    #[error("document has no root element")]
    NoRootElement,

    #[error("document has more than one root element")]
    MultipleRoots,

    #[error("text outside the root element")]
    TextOutsideRoot,

    #[error("invalid attribute: {0}")]
    Attribute(String),

    #[error("invalid encoding: {0}")]
    Encoding(String),
}

impl ParseError {
    /// Wrap as an internal error carrying the text that failed to parse.
    pub(crate) fn into_internal(self, raw: &str) -> FireEagleError {
        FireEagleError::internal_with_response(format!("Parse failed for response: {self}"), raw)
    }
}

/// Turns response text into a tree.
pub trait ResponseParser: Send {
    fn parse(&self, text: &str) -> Result<ParsedNode, ParseError>;
}

/// Creates a fresh parser instance.
pub type ParserFactory = Arc<dyn Fn() -> Box<dyn ResponseParser> + Send + Sync>;

/// Content type → parser factory.
///
/// Keys are matched case-insensitively and without parameters, so
/// `application/xml; charset=utf-8` finds the `application/xml` entry.
#[derive(Clone, Default)]
pub struct ParserRegistry {
    factories: HashMap<String, ParserFactory>,
}

impl ParserRegistry {
    /// An empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// A registry with the bundled XML parser for `application/xml` and `text/xml`.
    pub fn with_defaults() -> Self {
        let mut registry = Self::new();
        let xml: ParserFactory =
            Arc::new(|| Box::new(XmlParser::new()) as Box<dyn ResponseParser>);
        registry.register_factory("application/xml", Arc::clone(&xml));
        registry.register_factory("text/xml", xml);
        registry
    }

    /// Register (or replace) the parser for a content type.
    pub fn register<F, P>(&mut self, content_type: &str, factory: F)
    where
        F: Fn() -> P + Send + Sync + 'static,
        P: ResponseParser + 'static,
    {
        self.register_factory(
            content_type,
            Arc::new(move || Box::new(factory()) as Box<dyn ResponseParser>),
        );
    }

    pub fn register_factory(&mut self, content_type: &str, factory: ParserFactory) {
        self.factories
            .insert(normalize_content_type(content_type), factory);
    }

    pub fn unregister(&mut self, content_type: &str) -> bool {
        self.factories
            .remove(&normalize_content_type(content_type))
            .is_some()
    }

    pub fn contains(&self, content_type: &str) -> bool {
        self.factories
            .contains_key(&normalize_content_type(content_type))
    }

    /// A new parser for the content type, if one is registered.
    pub fn parser_for(&self, content_type: &str) -> Option<Box<dyn ResponseParser>> {
        self.factories
            .get(&normalize_content_type(content_type))
            .map(|factory| factory())
    }
}

impl fmt::Debug for ParserRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut keys: Vec<_> = self.factories.keys().collect();
        keys.sort();
        f.debug_struct("ParserRegistry")
            .field("content_types", &keys)
            .finish()
    }
}

/// `"Application/XML; charset=utf-8"` → `"application/xml"`.
pub(crate) fn normalize_content_type(content_type: &str) -> String {
    content_type
        .split(';')
        .next()
        .unwrap_or_default()
        .trim()
        .to_ascii_lowercase()
}

#[cfg(test)]
mod tests {
    use super::*;

    struct FixedParser;

    impl ResponseParser for FixedParser {
        fn parse(&self, _text: &str) -> Result<ParsedNode, ParseError> {
            Ok(ParsedNode::new("fixed"))
        }
    }

    #[test]
    fn defaults_cover_xml_content_types() {
        let registry = ParserRegistry::with_defaults();
        assert!(registry.contains("application/xml"));
        assert!(registry.contains("text/xml"));
        assert!(!registry.contains("application/json"));
    }

    #[test]
    fn lookup_ignores_case_and_parameters() {
        let registry = ParserRegistry::with_defaults();
        let parser = registry
            .parser_for("Application/XML; charset=utf-8")
            .unwrap();
        let root = parser.parse("<rsp stat=\"ok\"/>").unwrap();
        assert_eq!(root.name(), "rsp");
    }

    #[test]
    fn custom_parser_registration() {
        let mut registry = ParserRegistry::new();
        registry.register("application/json", || FixedParser);
        let root = registry
            .parser_for("application/json")
            .unwrap()
            .parse("{}")
            .unwrap();
        assert_eq!(root.name(), "fixed");

        assert!(registry.unregister("application/json"));
        assert!(registry.parser_for("application/json").is_none());
    }

    #[test]
    fn parse_error_becomes_internal() {
        let err = ParseError::NoRootElement.into_internal("junk");
        assert!(matches!(err, FireEagleError::Internal { .. }));
        assert_eq!(err.raw_response(), Some("junk"));
    }

    #[test]
    fn normalize_strips_parameters() {
        assert_eq!(
            normalize_content_type(" text/XML ;charset=UTF-8"),
            "text/xml"
        );
        assert_eq!(normalize_content_type(""), "");
    }
}
