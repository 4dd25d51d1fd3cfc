//! Parser for the attribute-free XML dialect used in agent prompts and memory
//!
//! Each element becomes a member keyed by its tag name. Element content is
//! either text (a leaf), child elements (an object), or nothing (null).
//! Comments, processing instructions and `<!...>` declarations are skipped
//! wherever they appear.

use crate::{
    config::ParseLimits,
    error::{Error, Result, XmlErrorKind},
    memory::{Arena, SlabString},
    scan::{Cursor, is_whitespace},
    security::DepthTracker,
    tree::{Member, Node, NodeKind},
    xml::entities::decode_into,
};
use tracing::{debug, trace};

/// XML parser bound to an arena
#[derive(Debug, Clone)]
pub struct XmlParser<'a> {
    arena: &'a Arena,
    limits: ParseLimits,
}

impl<'a> XmlParser<'a> {
    pub fn new(arena: &'a Arena) -> Self {
        Self {
            arena,
            limits: ParseLimits::default(),
        }
    }

    /// Override the nesting limit
    pub fn with_limits(mut self, limits: ParseLimits) -> Self {
        self.limits = limits;
        self
    }

    /// Parse a document into an object with one member per top-level element
    pub fn parse(&self, input: &str) -> Result<Node> {
        trace!(bytes = input.len(), "parsing XML");
        if input.is_empty() {
            return Err(Error::xml(0, XmlErrorKind::EmptyInput));
        }

        let mut state = ParseState {
            arena: self.arena,
            cursor: Cursor::new(input),
            depth: DepthTracker::from_limits(&self.limits),
        };
        let result = state.document();
        match &result {
            Ok(node) => trace!(nodes = node.count_nodes(), "parsed XML"),
            Err(error) => debug!(%error, "XML parse failed"),
        }
        result
    }
}

struct ParseState<'a, 'i> {
    arena: &'a Arena,
    cursor: Cursor<'i>,
    depth: DepthTracker,
}

impl<'i> ParseState<'_, 'i> {
    fn document(&mut self) -> Result<Node> {
        let mut members = Vec::new();
        loop {
            // Text outside any element is ignored
            match self.cursor.find(b'<') {
                Some(open) => self.cursor.set_pos(open),
                None => break,
            }
            if self.skip_markup()? {
                continue;
            }
            members.push(self.element()?);
        }
        Node::from_kind(self.arena, NodeKind::Object(members))
    }

    /// Skip a comment, declaration or processing instruction at the cursor
    fn skip_markup(&mut self) -> Result<bool> {
        let start = self.cursor.pos();
        let (terminator, from, kind) = if self.cursor.starts_with("<!--") {
            ("-->", 4, XmlErrorKind::UnterminatedComment)
        } else if self.cursor.starts_with("<![CDATA[") {
            return Ok(false);
        } else if self.cursor.starts_with("<?") {
            ("?>", 2, XmlErrorKind::UnterminatedDeclaration)
        } else if self.cursor.starts_with("<!") {
            (">", 2, XmlErrorKind::UnterminatedDeclaration)
        } else {
            return Ok(false);
        };

        match self.cursor.find_str(terminator, from) {
            Some(end) => {
                self.cursor.set_pos(end + terminator.len());
                Ok(true)
            }
            None => Err(Error::xml(start, kind)),
        }
    }

    /// Parse `<name>...</name>` or `<name/>` at the cursor
    fn element(&mut self) -> Result<Member> {
        self.cursor.bump();
        let name = self.tag_name()?;
        let key = self.arena.string_from(name)?;

        self.cursor.skip_whitespace();
        if self.cursor.starts_with("/>") {
            self.cursor.advance(2);
            return Ok(Member::new(key, Node::null(self.arena)?));
        }
        self.expect_tag_end()?;

        self.depth.enter()?;
        let value = self.content(name)?;
        self.depth.exit();
        Ok(Member::new(key, value))
    }

    fn content(&mut self, name: &'i str) -> Result<Node> {
        let mut text: Option<SlabString> = None;
        let mut children = Vec::new();

        loop {
            let Some(open) = self.cursor.find(b'<') else {
                self.cursor.set_pos(self.cursor.len());
                return Err(self.error(XmlErrorKind::UnexpectedEnd));
            };
            let run = self.cursor.slice(self.cursor.pos(), open);
            if text.is_some() || !run.bytes().all(is_whitespace) {
                if !children.is_empty() {
                    return Err(self.mixed(name));
                }
                let run = match text {
                    Some(_) => run,
                    None => run.trim_start_matches(is_xml_space),
                };
                decode_into(run, self.text_buf(&mut text)?)?;
            }
            self.cursor.set_pos(open);

            if self.cursor.starts_with("</") {
                self.closing_tag(name)?;
                break;
            }
            if self.cursor.starts_with("<![CDATA[") {
                if !children.is_empty() {
                    return Err(self.mixed(name));
                }
                let raw = self.cdata()?;
                self.text_buf(&mut text)?.push_str(raw)?;
                continue;
            }
            if self.skip_markup()? {
                continue;
            }
            if text.is_some() {
                return Err(self.mixed(name));
            }
            children.push(self.element()?);
        }

        if !children.is_empty() {
            return Node::from_kind(self.arena, NodeKind::Object(children));
        }
        match text {
            Some(mut buf) => {
                let trimmed = buf.as_str()?.trim_end_matches(is_xml_space).len();
                buf.truncate(trimmed);
                Node::leaf_from(buf)
            }
            None => Node::null(self.arena),
        }
    }

    fn text_buf<'t>(&self, text: &'t mut Option<SlabString>) -> Result<&'t mut SlabString> {
        match *text {
            Some(ref mut buf) => Ok(buf),
            None => Ok(text.insert(self.arena.alloc_string(0)?)),
        }
    }

    fn cdata(&mut self) -> Result<&'i str> {
        let start = self.cursor.pos();
        let body = start + "<![CDATA[".len();
        let Some(end) = self.cursor.find_str("]]>", "<![CDATA[".len()) else {
            return Err(Error::xml(start, XmlErrorKind::UnterminatedCdata));
        };
        self.cursor.set_pos(end + "]]>".len());
        Ok(self.cursor.slice(body, end))
    }

    fn closing_tag(&mut self, name: &str) -> Result<()> {
        self.cursor.advance(2);
        let found = self.tag_name()?;
        if found != name {
            return Err(Error::xml(
                self.cursor.pos() - found.len(),
                XmlErrorKind::TagMismatch {
                    expected: name.to_owned(),
                    found: found.to_owned(),
                },
            ));
        }
        self.cursor.skip_whitespace();
        self.expect_tag_end()
    }

    fn tag_name(&mut self) -> Result<&'i str> {
        match self.cursor.peek() {
            Some(b) if b.is_ascii_alphabetic() || b == b'_' => {}
            None => return Err(self.error(XmlErrorKind::UnexpectedEnd)),
            Some(_) => return Err(self.error(XmlErrorKind::InvalidTagName)),
        }
        Ok(self
            .cursor
            .take_while(|b| b.is_ascii_alphanumeric() || matches!(b, b'-' | b'_' | b'.' | b':')))
    }

    fn expect_tag_end(&mut self) -> Result<()> {
        if self.cursor.eat(b'>') {
            return Ok(());
        }
        if self.cursor.is_eof() {
            Err(self.error(XmlErrorKind::UnexpectedEnd))
        } else {
            Err(self.error(XmlErrorKind::ExpectedTagEnd))
        }
    }

    fn mixed(&self, name: &str) -> Error {
        self.error(XmlErrorKind::MixedContent {
            tag: name.to_owned(),
        })
    }

    fn error(&self, kind: XmlErrorKind) -> Error {
        Error::xml(self.cursor.pos(), kind)
    }
}

fn is_xml_space(ch: char) -> bool {
    matches!(ch, ' ' | '\t' | '\r' | '\n')
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ArenaConfig;

    fn arena() -> Arena {
        Arena::new(ArenaConfig::testing()).unwrap()
    }

    fn parse(arena: &Arena, input: &str) -> Result<Node> {
        XmlParser::new(arena).parse(input)
    }

    fn error_kind(input: &str) -> (usize, XmlErrorKind) {
        match parse(&arena(), input) {
            Err(Error::Xml { position, kind }) => (position, kind),
            other => panic!("expected XML error for {input:?}, got {other:?}"),
        }
    }

    #[test]
    fn test_nested_elements() {
        let arena = arena();
        let root = parse(
            &arena,
            "<?xml version=\"1.0\"?>\n<agent>\n  <name> helper </name>\n  <state><mode>idle</mode></state>\n</agent>",
        )
        .unwrap();

        let agent = root.get_key("agent").unwrap();
        assert!(agent.is_object());
        assert_eq!(agent.get_key("name").unwrap().text().unwrap(), "helper");
        let state = agent.get_key("state").unwrap();
        assert_eq!(state.get_key("mode").unwrap().text().unwrap(), "idle");
    }

    #[test]
    fn test_empty_elements_are_null() {
        let arena = arena();
        let root = parse(&arena, "<r><a/><b></b><c>  \n </c><d />  </r>").unwrap();
        let r = root.get_key("r").unwrap();
        assert_eq!(r.len(), 4);
        assert!(r.members().iter().all(|m| m.value().is_null()));
    }

    #[test]
    fn test_multiple_roots_and_root_text() {
        let arena = arena();
        let root = parse(&arena, "stray <a>1</a> text <!-- note --> <b>2</b> tail").unwrap();
        assert_eq!(root.len(), 2);
        assert_eq!(root.get_key("a").unwrap().text().unwrap(), "1");
        assert_eq!(root.get_key("b").unwrap().text().unwrap(), "2");

        let root = parse(&arena, "  just text  ").unwrap();
        assert!(root.is_object());
        assert!(root.is_empty());
    }

    #[test]
    fn test_text_with_comments_entities_and_cdata() {
        let arena = arena();
        let root = parse(
            &arena,
            "<t> a &lt; b <!-- gone --> &amp; c<![CDATA[ <raw> & ]]>d </t>",
        )
        .unwrap();
        assert_eq!(root.get_key("t").unwrap().text().unwrap(), "a < b  & c <raw> & d");
    }

    #[test]
    fn test_duplicate_child_tags_kept_in_order() {
        let arena = arena();
        let root = parse(&arena, "<l><i>1</i><i>2</i><i>3</i></l>").unwrap();
        let list = root.get_key("l").unwrap();
        assert_eq!(list.len(), 3);
        assert_eq!(list.get_index(2).unwrap().text().unwrap(), "3");
        assert_eq!(list.get_key("i").unwrap().text().unwrap(), "1");
    }

    #[test]
    fn test_error_kinds() {
        assert_eq!(error_kind(""), (0, XmlErrorKind::EmptyInput));
        assert_eq!(error_kind("<a>text").1, XmlErrorKind::UnexpectedEnd);
        assert_eq!(error_kind("<1a></1a>"), (1, XmlErrorKind::InvalidTagName));
        assert_eq!(error_kind("<a x=\"1\"></a>"), (3, XmlErrorKind::ExpectedTagEnd));
        assert_eq!(
            error_kind("<a><b></c></a>"),
            (
                8,
                XmlErrorKind::TagMismatch {
                    expected: "b".into(),
                    found: "c".into()
                }
            )
        );
        assert_eq!(
            error_kind("<A></a>").1,
            XmlErrorKind::TagMismatch {
                expected: "A".into(),
                found: "a".into()
            }
        );
        assert_eq!(
            error_kind("<a>text<b/></a>").1,
            XmlErrorKind::MixedContent { tag: "a".into() }
        );
        assert_eq!(
            error_kind("<a><b/>text</a>").1,
            XmlErrorKind::MixedContent { tag: "a".into() }
        );
        assert_eq!(error_kind("<a><!-- open</a>"), (3, XmlErrorKind::UnterminatedComment));
        assert_eq!(error_kind("<a><![CDATA[x</a>"), (3, XmlErrorKind::UnterminatedCdata));
        assert_eq!(error_kind("<?xml version"), (0, XmlErrorKind::UnterminatedDeclaration));
    }

    #[test]
    fn test_depth_limit() {
        let arena = arena();
        let parser = XmlParser::new(&arena).with_limits(ParseLimits { max_depth: 2 });
        assert!(parser.parse("<a><b>x</b></a>").is_ok());
        assert!(matches!(
            parser.parse("<a><b><c>x</c></b></a>"),
            Err(Error::TooDeep { depth: 3, max: 2 })
        ));
    }

    #[test]
    fn test_failed_parse_returns_all_slots() {
        let arena = arena();
        let before = arena.stats();
        assert!(parse(&arena, "<a><b>one</b><c><d>two</d></c><e>three</f></a>").is_err());
        for (after, before) in arena.stats().pools.iter().zip(&before.pools) {
            assert_eq!(after.free_slots, before.free_slots, "{} leaked", after.pool);
        }
    }
}
