//! Generic read-only response tree

use std::collections::BTreeMap;

/// Pseudo-attribute exposing a node's text content.
///
/// XML elements carry both attributes and text; formats that only have
/// key/value pairs do not. Reading text through this reserved attribute name
/// lets decoding code use one lookup path for both.
pub const TEXT_PROPERTY: &str = "text()";

/// One labeled node of a parsed response.
///
/// Children keep document order. Text and children are mutually exclusive:
/// the first appended child discards any text gathered so far, and text
/// appended once a child exists is ignored.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ParsedNode {
    name: String,
    children: Vec<ParsedNode>,
    attributes: BTreeMap<String, String>,
    text: String,
}

impl ParsedNode {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn child_count(&self) -> usize {
        self.children.len()
    }

    /// The `i`-th child in document order.
    ///
    /// # Panics
    ///
    /// Panics if `i >= child_count()`.
    pub fn child(&self, i: usize) -> &ParsedNode {
        &self.children[i]
    }

    /// Non-panicking variant of [`child`](Self::child).
    pub fn get_child(&self, i: usize) -> Option<&ParsedNode> {
        self.children.get(i)
    }

    pub fn children(&self) -> &[ParsedNode] {
        &self.children
    }

    /// Direct children with the given name. Does not recurse.
    pub fn children_named<'a, 'n>(
        &'a self,
        name: &'n str,
    ) -> impl Iterator<Item = &'a ParsedNode> + use<'a, 'n> {
        self.children.iter().filter(move |c| c.name == name)
    }

    /// Text content; empty when the node has children.
    pub fn text(&self) -> &str {
        &self.text
    }

    fn lookup(&self, name: &str) -> Option<&str> {
        if name == TEXT_PROPERTY {
            return Some(&self.text);
        }
        self.attributes.get(name).map(String::as_str)
    }

    /// Whether the attribute exists. For [`TEXT_PROPERTY`], whether there is any text.
    pub fn has_attribute(&self, name: &str) -> bool {
        if name == TEXT_PROPERTY {
            return !self.text.is_empty();
        }
        self.attributes.contains_key(name)
    }

    /// Attribute value, or an empty string when absent.
    pub fn get_string(&self, name: &str) -> &str {
        self.lookup(name).unwrap_or_default()
    }

    /// Attribute as an integer: `(value, ok)`.
    ///
    /// Parsing follows `strtol`: leading whitespace, optional sign, then the
    /// longest run of decimal digits. Trailing characters keep the parsed
    /// prefix but clear `ok`; no digits at all yields `(0, false)`.
    pub fn get_long(&self, name: &str) -> (i64, bool) {
        self.lookup(name).map_or((0, false), scan_long)
    }

    /// Attribute as a floating point number: `(value, ok)`, with `strtod` prefix rules.
    pub fn get_double(&self, name: &str) -> (f64, bool) {
        self.lookup(name).map_or((0.0, false), scan_double)
    }

    /// Attribute as a boolean: only `"true"` and `"false"` are accepted.
    pub fn get_bool(&self, name: &str) -> (bool, bool) {
        match self.lookup(name) {
            Some("true") => (true, true),
            Some("false") => (false, true),
            _ => (false, false),
        }
    }

    // ============ Builder side ============

    /// Append a new child and return it for further building.
    pub fn append_child(&mut self, name: impl Into<String>) -> &mut ParsedNode {
        self.push_child(ParsedNode::new(name))
    }

    /// Append an already built subtree.
    pub fn push_child(&mut self, child: ParsedNode) -> &mut ParsedNode {
        if self.children.is_empty() {
            self.text.clear();
        }
        self.children.push(child);
        let last = self.children.len() - 1;
        &mut self.children[last]
    }

    /// Append a text fragment. Ignored once the node has a child.
    pub fn append_text(&mut self, fragment: &str) {
        if self.children.is_empty() {
            self.text.push_str(fragment);
        }
    }

    /// Set an attribute. Calls with an empty name are ignored.
    pub fn set_attribute(&mut self, name: impl Into<String>, value: impl Into<String>) {
        let name = name.into();
        if name.is_empty() {
            return;
        }
        self.attributes.insert(name, value.into());
    }
}

fn skip_c_space(s: &str) -> &str {
    s.trim_start_matches([' ', '\t', '\n', '\r', '\x0b', '\x0c'])
}

fn scan_long(raw: &str) -> (i64, bool) {
    let s = skip_c_space(raw);
    let (negative, digits) = match s.as_bytes().first() {
        Some(b'-') => (true, &s[1..]),
        Some(b'+') => (false, &s[1..]),
        _ => (false, s),
    };
    let len = digits.bytes().take_while(u8::is_ascii_digit).count();
    if len == 0 {
        return (0, false);
    }

    let mut value: i64 = 0;
    for b in digits[..len].bytes() {
        let d = i64::from(b - b'0');
        value = if negative {
            value.saturating_mul(10).saturating_sub(d)
        } else {
            value.saturating_mul(10).saturating_add(d)
        };
    }
    (value, len == digits.len())
}

fn scan_double(raw: &str) -> (f64, bool) {
    let s = skip_c_space(raw);
    let bytes = s.as_bytes();
    let mut end = 0;

    if matches!(bytes.first(), Some(b'+' | b'-')) {
        end += 1;
    }
    let int_digits = bytes[end..].iter().take_while(|b| b.is_ascii_digit()).count();
    end += int_digits;
    let mut frac_digits = 0;
    if bytes.get(end) == Some(&b'.') {
        frac_digits = bytes[end + 1..]
            .iter()
            .take_while(|b| b.is_ascii_digit())
            .count();
        if int_digits + frac_digits > 0 {
            end += 1 + frac_digits;
        }
    }
    if int_digits + frac_digits == 0 {
        return (0.0, false);
    }

    if matches!(bytes.get(end), Some(b'e' | b'E')) {
        let mut exp_end = end + 1;
        if matches!(bytes.get(exp_end), Some(b'+' | b'-')) {
            exp_end += 1;
        }
        let exp_digits = bytes[exp_end..]
            .iter()
            .take_while(|b| b.is_ascii_digit())
            .count();
        if exp_digits > 0 {
            end = exp_end + exp_digits;
        }
    }

    let value = s[..end].parse::<f64>().unwrap_or(0.0);
    (value, end == s.len())
}
