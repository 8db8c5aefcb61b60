//! XML response parser backed by quick-xml

use quick_xml::Reader;
use quick_xml::events::{BytesStart, Event};

use super::{ParseError, ParsedNode, ResponseParser};

/// Builds a [`ParsedNode`] tree from an XML document.
///
/// Element names keep their namespace prefix (`georss:point`), attributes
/// and text are entity-unescaped, CDATA is treated as text. Declarations,
/// comments and processing instructions are skipped.
#[derive(Debug, Clone, Copy, Default)]
pub struct XmlParser;

impl XmlParser {
    pub fn new() -> Self {
        Self
    }
}

impl ResponseParser for XmlParser {
    fn parse(&self, text: &str) -> Result<ParsedNode, ParseError> {
        let mut reader = Reader::from_str(text);
        reader.config_mut().check_end_names = true;

        let mut stack: Vec<ParsedNode> = Vec::new();
        let mut root: Option<ParsedNode> = None;

        loop {
            let event = reader.read_event().map_err(|e| ParseError::Malformed {
                position: reader.buffer_position(),
                detail: e.to_string(),
            })?;

            match event {
                Event::Start(start) => {
                    if root.is_some() {
                        return Err(ParseError::MultipleRoots);
                    }
                    stack.push(element_node(&start)?);
                }
                Event::Empty(start) => {
                    let node = element_node(&start)?;
                    attach(&mut stack, &mut root, node)?;
                }
                Event::End(_) => {
                    let Some(node) = stack.pop() else {
                        return Err(ParseError::Malformed {
                            position: reader.buffer_position(),
                            detail: "closing tag without matching opening tag".to_string(),
                        });
                    };
                    attach(&mut stack, &mut root, node)?;
                }
                Event::Text(content) => {
                    let fragment = content.unescape().map_err(|e| ParseError::Malformed {
                        position: reader.buffer_position(),
                        detail: e.to_string(),
                    })?;
                    match stack.last_mut() {
                        Some(top) => top.append_text(&fragment),
                        None if fragment.trim().is_empty() => {}
                        None => return Err(ParseError::TextOutsideRoot),
                    }
                }
                Event::CData(data) => {
                    if let Some(top) = stack.last_mut() {
                        top.append_text(&String::from_utf8_lossy(&data.into_inner()));
                    }
                }
                Event::Eof => break,
                _ => {}
            }
        }

        if let Some(open) = stack.last() {
            return Err(ParseError::Truncated {
                element: open.name().to_string(),
            });
        }
        root.ok_or(ParseError::NoRootElement)
    }
}

fn element_node(start: &BytesStart<'_>) -> Result<ParsedNode, ParseError> {
    let name = std::str::from_utf8(start.name().as_ref())
        .map_err(|e| ParseError::Encoding(e.to_string()))?
        .to_string();
    let mut node = ParsedNode::new(name);

    for attr in start.attributes() {
        let attr = attr.map_err(|e| ParseError::Attribute(e.to_string()))?;
        let key = std::str::from_utf8(attr.key.as_ref())
            .map_err(|e| ParseError::Encoding(e.to_string()))?
            .to_string();
        let value = attr
            .unescape_value()
            .map_err(|e| ParseError::Attribute(e.to_string()))?;
        node.set_attribute(key, value.into_owned());
    }

    Ok(node)
}

/// Hang a finished element under the current parent, or make it the root.
fn attach(
    stack: &mut [ParsedNode],
    root: &mut Option<ParsedNode>,
    node: ParsedNode,
) -> Result<(), ParseError> {
    if let Some(parent) = stack.last_mut() {
        parent.push_child(node);
        return Ok(());
    }
    if root.is_some() {
        return Err(ParseError::MultipleRoots);
    }
    *root = Some(node);
    Ok(())
}
