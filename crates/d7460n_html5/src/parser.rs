//! Markup reader. Turns an HTML string into a structural snapshot.
//!
//! The reader is forgiving in the way authored pages need: tag and attribute names are
//! lowercased, void elements never get children, list items and cells close their open sibling,
//! and stray end tags are dropped. Authoring defects (class, id and data-* attributes) abort the
//! parse since state could no longer be derived from structure alone.
use crate::document::Document;
use crate::errors::Error;
use crate::node::data::element::ElementData;
use crate::node::elements::{forbidden_attribute, is_void, RAW_TEXT_ELEMENTS, SELF_CLOSING_SIBLINGS, SIBLING_SCOPE_BOUNDARIES};
use crate::node::Node;
use d7460n_shared::location::Location;
use d7460n_shared::node::NodeId;
use d7460n_shared::types::ParseError;
use lazy_static::lazy_static;
use log::trace;
use std::collections::HashMap;

lazy_static! {
    static ref NAMED_ENTITIES: HashMap<&'static str, char> = HashMap::from([
        ("amp", '&'),
        ("lt", '<'),
        ("gt", '>'),
        ("quot", '"'),
        ("apos", '\''),
        ("nbsp", '\u{a0}'),
        ("copy", '\u{a9}'),
        ("reg", '\u{ae}'),
        ("hellip", '\u{2026}'),
        ("ndash", '\u{2013}'),
        ("mdash", '\u{2014}'),
    ]);
}

/// A start or end tag as read from the source
#[derive(Debug)]
struct Tag {
    name: String,
    attributes: Vec<(String, String)>,
    is_end: bool,
    self_closing: bool,
}

pub struct Html5Parser<'a> {
    source: &'a str,
    bytes: &'a [u8],
    pos: usize,
    /// Byte offsets at which each line starts
    line_starts: Vec<usize>,
    document: Document,
    open_elements: Vec<NodeId>,
}

impl<'a> Html5Parser<'a> {
    fn new(source: &'a str) -> Self {
        let line_starts = std::iter::once(0)
            .chain(source.match_indices('\n').map(|(idx, _)| idx + 1))
            .collect();

        Self {
            source,
            bytes: source.as_bytes(),
            pos: 0,
            line_starts,
            document: Document::new(),
            open_elements: Vec::new(),
        }
    }

    /// Parses the markup into a new document
    pub fn parse_document(source: &str) -> Result<Document, Error> {
        let mut parser = Html5Parser::new(source);
        parser.run()?;

        trace!("parser: {} nodes read", parser.document.node_count());
        Ok(parser.document)
    }

    fn run(&mut self) -> Result<(), Error> {
        while self.pos < self.bytes.len() {
            if self.bytes[self.pos] != b'<' {
                self.read_text();
                continue;
            }

            if starts_with(self.bytes, self.pos, b"<!--") {
                self.read_comment()?;
                continue;
            }
            if starts_with(self.bytes, self.pos, b"<!") || starts_with(self.bytes, self.pos, b"<?") {
                // doctype and processing instructions carry no structure
                self.pos = skip_to_gt(self.bytes, self.pos + 2);
                continue;
            }

            let start = self.pos;
            let Some((tag, next)) = self.read_tag(start) else {
                // a lone '<' is text
                self.insert_text("<", start);
                self.pos = start + 1;
                continue;
            };
            self.pos = next;

            if tag.is_end {
                self.close_element(&tag.name);
            } else {
                self.open_element(tag, start)?;
            }
        }

        Ok(())
    }

    fn current_node(&self) -> NodeId {
        self.open_elements.last().copied().unwrap_or_else(NodeId::root)
    }

    fn location(&self, offset: usize) -> Location {
        let line = self.line_starts.partition_point(|start| *start <= offset);
        let line_start = self.line_starts.get(line.saturating_sub(1)).copied().unwrap_or(0);
        let column = self.source.get(line_start..offset).map_or(0, |prefix| prefix.chars().count());

        Location::new(line, column + 1, offset)
    }

    fn read_text(&mut self) {
        let start = self.pos;
        let end = find_byte(self.bytes, start, b'<').unwrap_or(self.bytes.len());
        self.pos = end;

        let raw = &self.source[start..end];
        if self.open_elements.is_empty() && raw.trim().is_empty() {
            return;
        }
        self.insert_text(&decode_entities(raw), start);
    }

    fn insert_text(&mut self, value: &str, offset: usize) {
        if value.is_empty() {
            return;
        }
        let parent = self.current_node();

        // merge with a directly preceding text node
        if let Some(last) = self.document.children(parent).last().copied() {
            if let Some(text) = self.document.arena.node_mut(last).and_then(|node| match &mut node.data {
                crate::node::NodeData::Text(text) => Some(text),
                _ => None,
            }) {
                text.value.push_str(value);
                return;
            }
        }

        let node = Node::new_text(value, self.location(offset));
        self.document.register_node_at(node, parent, None);
    }

    fn read_comment(&mut self) -> Result<(), Error> {
        let start = self.pos;
        let body_start = start + 4;
        let Some(body_end) = find_subslice(self.bytes, body_start, b"-->") else {
            return Err(Error::Parse(ParseError {
                message: "unterminated comment".into(),
                location: self.location(start),
            }));
        };
        self.pos = body_end + 3;

        let value = self.source.get(body_start..body_end).unwrap_or_default();
        let node = Node::new_comment(value, self.location(start));
        let parent = self.current_node();
        self.document.register_node_at(node, parent, None);
        Ok(())
    }

    fn read_tag(&self, start: usize) -> Option<(Tag, usize)> {
        let bytes = self.bytes;
        let mut idx = start + 1;
        let is_end = bytes.get(idx).copied() == Some(b'/');
        if is_end {
            idx += 1;
        }

        let name_start = idx;
        while idx < bytes.len() && is_tag_name_char(bytes[idx]) {
            idx += 1;
        }
        if idx == name_start || !bytes[name_start].is_ascii_alphabetic() {
            return None;
        }
        let name = self.source[name_start..idx].to_ascii_lowercase();

        let mut attributes: Vec<(String, String)> = Vec::new();
        let mut self_closing = false;

        loop {
            idx = skip_spaces(bytes, idx);
            match bytes.get(idx).copied() {
                None => return None,
                Some(b'>') => return Some((Tag { name, attributes, is_end, self_closing }, idx + 1)),
                Some(b'/') => {
                    self_closing = true;
                    idx += 1;
                    continue;
                }
                Some(_) => {}
            }
            self_closing = false;

            let attr_start = idx;
            while idx < bytes.len() && !bytes[idx].is_ascii_whitespace() && !matches!(bytes[idx], b'=' | b'>' | b'/') {
                idx += 1;
            }
            if idx == attr_start {
                // a stray '=' without a name
                idx += 1;
                continue;
            }
            let attr_name = self.source[attr_start..idx].to_ascii_lowercase();

            idx = skip_spaces(bytes, idx);
            let mut value = String::new();
            if bytes.get(idx).copied() == Some(b'=') {
                idx = skip_spaces(bytes, idx + 1);
                let (raw, next) = match bytes.get(idx).copied() {
                    Some(quote @ (b'"' | b'\'')) => {
                        let end = find_byte(bytes, idx + 1, quote)?;
                        (&self.source[idx + 1..end], end + 1)
                    }
                    _ => {
                        let value_start = idx;
                        while idx < bytes.len() && !bytes[idx].is_ascii_whitespace() && bytes[idx] != b'>' {
                            idx += 1;
                        }
                        (&self.source[value_start..idx], idx)
                    }
                };
                value = decode_entities(raw);
                idx = next;
            }

            // the first occurrence of an attribute wins
            if !attributes.iter().any(|(existing, _)| *existing == attr_name) {
                attributes.push((attr_name, value));
            }
        }
    }

    fn open_element(&mut self, tag: Tag, offset: usize) -> Result<(), Error> {
        let location = self.location(offset);

        let mut data = ElementData::new(&tag.name);
        for (name, value) in &tag.attributes {
            if let Some(reason) = forbidden_attribute(name) {
                return Err(Error::AuthoringDefect(format!("{reason} (<{}> at {location})", tag.name)));
            }
            data.add_attribute(name, value);
        }

        self.close_implied_sibling(&tag.name);

        let parent = self.current_node();
        let node_id = self.document.register_node_at(Node::new_element(data, location), parent, None);

        if is_void(&tag.name) {
            return Ok(());
        }
        if RAW_TEXT_ELEMENTS.contains(&tag.name.as_str()) {
            self.read_raw_text(node_id, &tag.name);
            return Ok(());
        }
        if tag.self_closing {
            return Ok(());
        }

        self.open_elements.push(node_id);
        Ok(())
    }

    /// Reads everything up to the matching end tag as the single text child of the element
    fn read_raw_text(&mut self, node_id: NodeId, name: &str) {
        let start = self.pos;
        let mut idx = start;
        let mut end = (self.bytes.len(), self.bytes.len());

        while let Some(candidate) = find_subslice(self.bytes, idx, b"</") {
            let name_start = candidate + 2;
            if starts_with_ignore_ascii_case(self.bytes, name_start, name.as_bytes())
                && tag_name_boundary(self.bytes, name_start + name.len())
            {
                end = (candidate, skip_to_gt(self.bytes, name_start));
                break;
            }
            idx = candidate + 2;
        }
        self.pos = end.1;

        let raw = &self.source[start..end.0];
        // a single newline directly after <textarea> is not part of its value
        let raw = match name {
            "textarea" => raw.strip_prefix("\r\n").or_else(|| raw.strip_prefix('\n')).unwrap_or(raw),
            _ => raw,
        };
        if raw.is_empty() {
            return;
        }

        let value = match name {
            "textarea" => decode_entities(raw),
            _ => raw.to_owned(),
        };
        let node = Node::new_text(&value, self.location(start));
        self.document.register_node_at(node, node_id, None);
    }

    fn close_element(&mut self, name: &str) {
        let position = self
            .open_elements
            .iter()
            .rposition(|id| self.document.is_element_named(*id, name));

        match position {
            Some(position) => self.open_elements.truncate(position),
            None => trace!("parser: dropping stray end tag </{name}>"),
        }
    }

    /// A new list item, row, cell or option closes the open one of its kind
    fn close_implied_sibling(&mut self, name: &str) {
        let Some(group) = SELF_CLOSING_SIBLINGS.iter().find(|group| group.contains(&name)) else {
            return;
        };

        for (position, id) in self.open_elements.iter().enumerate().rev() {
            let Some(open) = self.document.element(*id) else {
                continue;
            };
            if group.contains(&open.name()) {
                self.open_elements.truncate(position);
                return;
            }
            let is_boundary = SIBLING_SCOPE_BOUNDARIES.contains(&open.name())
                || (open.name() == "tr" && matches!(name, "td" | "th"));
            if is_boundary {
                return;
            }
        }
    }
}

/// Replaces character references. Unknown references are kept as written.
pub fn decode_entities(raw: &str) -> String {
    if !raw.contains('&') {
        return raw.to_owned();
    }

    let mut decoded = String::with_capacity(raw.len());
    let mut rest = raw;

    while let Some(amp) = rest.find('&') {
        decoded.push_str(&rest[..amp]);
        rest = &rest[amp..];

        let reference = rest[1..].find(';').map(|semi| &rest[1..=semi]);
        match reference.and_then(decode_reference) {
            Some(ch) => {
                decoded.push(ch);
                // '&' + reference + ';'
                rest = &rest[reference.map_or(0, str::len) + 2..];
            }
            None => {
                decoded.push('&');
                rest = &rest[1..];
            }
        }
    }
    decoded.push_str(rest);

    decoded
}

fn decode_reference(reference: &str) -> Option<char> {
    if let Some(number) = reference.strip_prefix('#') {
        let code = match number.strip_prefix(['x', 'X']) {
            Some(hex) => u32::from_str_radix(hex, 16).ok()?,
            None => number.parse::<u32>().ok()?,
        };
        return char::from_u32(code).filter(|ch| *ch != '\0');
    }

    NAMED_ENTITIES.get(reference).copied()
}

fn skip_to_gt(bytes: &[u8], from: usize) -> usize {
    find_byte(bytes, from, b'>').map_or(bytes.len(), |idx| idx + 1)
}

fn tag_name_boundary(bytes: &[u8], idx: usize) -> bool {
    match bytes.get(idx).copied() {
        None => true,
        Some(byte) => byte.is_ascii_whitespace() || byte == b'>' || byte == b'/',
    }
}

fn skip_spaces(bytes: &[u8], mut idx: usize) -> usize {
    while idx < bytes.len() && bytes[idx].is_ascii_whitespace() {
        idx += 1;
    }
    idx
}

fn is_tag_name_char(byte: u8) -> bool {
    byte.is_ascii_alphanumeric() || matches!(byte, b'-' | b'_' | b':')
}

fn starts_with(bytes: &[u8], idx: usize, pattern: &[u8]) -> bool {
    bytes.get(idx..idx + pattern.len()) == Some(pattern)
}

fn starts_with_ignore_ascii_case(bytes: &[u8], idx: usize, pattern: &[u8]) -> bool {
    bytes
        .get(idx..idx + pattern.len())
        .is_some_and(|window| window.eq_ignore_ascii_case(pattern))
}

fn find_subslice(bytes: &[u8], from: usize, needle: &[u8]) -> Option<usize> {
    bytes
        .get(from..)?
        .windows(needle.len())
        .position(|window| window == needle)
        .map(|offset| from + offset)
}

fn find_byte(bytes: &[u8], from: usize, byte: u8) -> Option<usize> {
    bytes
        .get(from..)?
        .iter()
        .position(|candidate| *candidate == byte)
        .map(|offset| from + offset)
}

#[cfg(test)]
mod tests {
    use super::*;
    use test_case::test_case;

    fn names(doc: &Document, parent: NodeId) -> Vec<String> {
        doc.element_children(parent)
            .into_iter()
            .filter_map(|child| doc.element(child).map(|data| data.name().to_owned()))
            .collect()
    }

    #[test]
    fn builds_nested_tree() {
        let doc = Html5Parser::parse_document(
            "<!DOCTYPE html>\n<HTML><body><main><table><tbody><tr><td>a</td></tr></tbody></table><aside></aside></main></body></HTML>",
        )
        .unwrap();

        let html = doc.element_children(doc.root())[0];
        assert!(doc.is_element_named(html, "html"));
        let main = doc.elements_named("main")[0];
        assert_eq!(names(&doc, main), vec!["table", "aside"]);
        assert_eq!(doc.text_content(doc.elements_named("td")[0]), "a");
    }

    #[test]
    fn void_and_self_closing_elements_have_no_children() {
        let doc = Html5Parser::parse_document("<form><input name=q><br/><label>x</label></form>").unwrap();
        let form = doc.elements_named("form")[0];
        assert_eq!(names(&doc, form), vec!["input", "br", "label"]);
    }

    #[test]
    fn implied_siblings_are_closed() {
        let doc = Html5Parser::parse_document("<ul><li>one<li>two<ul><li>inner</ul></ul><table><tr><td>a<td>b<tr><td>c</table>")
            .unwrap();

        let outer = doc.elements_named("ul")[0];
        assert_eq!(doc.element_children(outer).len(), 2);
        assert_eq!(doc.elements_named("tr").len(), 2);
        let first_row = doc.elements_named("tr")[0];
        assert_eq!(names(&doc, first_row), vec!["td", "td"]);
    }

    #[test]
    fn attributes() {
        let doc = Html5Parser::parse_document(
            r#"<input TYPE="email" required value='a &amp; b' pattern=[a-z]+ name="x" name="y">"#,
        )
        .unwrap();
        let input = doc.elements_named("input")[0];

        assert_eq!(doc.attribute(input, "type"), Some("email"));
        assert_eq!(doc.attribute(input, "required"), Some(""));
        assert_eq!(doc.attribute(input, "value"), Some("a & b"));
        assert_eq!(doc.attribute(input, "pattern"), Some("[a-z]+"));
        assert_eq!(doc.attribute(input, "name"), Some("x"));
    }

    #[test]
    fn raw_text_is_kept_verbatim() {
        let doc = Html5Parser::parse_document("<script>if (a < b) {}</script><textarea>\n&lt;b&gt;</textarea>").unwrap();
        assert_eq!(doc.text_content(doc.elements_named("script")[0]), "if (a < b) {}");
        assert_eq!(doc.text_content(doc.elements_named("textarea")[0]), "<b>");
    }

    #[test]
    fn comments_and_whitespace() {
        let doc = Html5Parser::parse_document("<aside> <!-- nothing here --> </aside>").unwrap();
        let aside = doc.elements_named("aside")[0];

        assert_eq!(doc.children(aside).len(), 3);
        assert!(doc.is_empty_region(aside));
    }

    #[test_case(r#"<div class="x"></div>"#; "class")]
    #[test_case(r#"<div id="x"></div>"#; "id")]
    #[test_case(r#"<div data-state="open"></div>"#; "data attribute")]
    fn forbidden_attributes_are_authoring_defects(html: &str) {
        assert!(matches!(Html5Parser::parse_document(html), Err(Error::AuthoringDefect(_))));
    }

    #[test]
    fn unterminated_comment_is_a_parse_error() {
        let err = Html5Parser::parse_document("<main>\n<!-- open").unwrap_err();
        let Error::Parse(parse_error) = err else {
            panic!("expected a parse error, got {err:?}");
        };
        assert_eq!(parse_error.location.line, 2);
    }

    #[test]
    fn locations_are_tracked() {
        let doc = Html5Parser::parse_document("<main>\n  <aside></aside>\n</main>").unwrap();
        let aside = doc.elements_named("aside")[0];
        let location = doc.node_by_id(aside).unwrap().location;

        assert_eq!(location.line, 2);
        assert_eq!(location.column, 3);
    }

    #[test]
    fn stray_end_tags_and_lone_brackets() {
        let doc = Html5Parser::parse_document("<p>a < b</span></p>").unwrap();
        assert_eq!(doc.text_content(doc.elements_named("p")[0]), "a < b");
    }

    #[test_case("a &amp; b", "a & b")]
    #[test_case("&#65;&#x42;", "AB")]
    #[test_case("&unknown; &", "&unknown; &")]
    #[test_case("&nbsp;", "\u{a0}")]
    fn entities(raw: &str, expected: &str) {
        assert_eq!(decode_entities(raw), expected);
    }
}
