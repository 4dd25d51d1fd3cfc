//! Integration tests for the XML parser and serializer
//!
//! Covers:
//! - Sorted re-emission and root element handling
//! - Comments, declarations, CDATA and entities in realistic prompts
//! - JSON -> XML -> JSON structural equivalence
//! - Error reporting and arena conservation

mod common;

use common::{assert_conserved, free_counts, test_arena};
use slabtree::{
    EntityStyle, Error, KeyOrder, Node, ParseLimits, XmlErrorKind, XmlOptions, XmlParser,
    XmlWriter, json, xml,
};

#[test]
fn test_children_reemitted_sorted() {
    let arena = test_arena();
    let node = xml::parse(&arena, "<root><y>2</y><x>1</x></root>").unwrap();
    assert_eq!(
        xml::to_string(&arena, &node).unwrap(),
        "<root><x>1</x><y>2</y></root>"
    );
}

#[test]
fn test_llm_response_with_prologue() {
    let arena = test_arena();
    let response = r#"Sure, here is the action:
<?xml version="1.0" encoding="UTF-8"?>
<!DOCTYPE agent>
<agent>
    <!-- chosen after reflection -->
    <action>
        <type>working_memory_add</type>
        <tags>plan, todo</tags>
        <value><![CDATA[if a < b && c > d then stop]]></value>
    </action>
</agent>
Let me know if you need anything else."#;

    let node = xml::parse(&arena, response).unwrap();
    assert_eq!(node.len(), 1);
    assert_eq!(
        node.get_text("agent.action.type").unwrap(),
        "working_memory_add"
    );
    assert_eq!(node.get_text("agent.action.tags").unwrap(), "plan, todo");
    assert_eq!(
        node.get_text("agent.action.value").unwrap(),
        "if a < b && c > d then stop"
    );
}

#[test]
fn test_entities_decoded_and_reencoded() {
    let arena = test_arena();
    let node = xml::parse(&arena, "<m>1 &lt; 2 &amp;&amp; &#x33; &gt; 2</m>").unwrap();
    assert_eq!(node.get_text("m").unwrap(), "1 < 2 && 3 > 2");

    let padded = xml::to_string(&arena, &node).unwrap();
    assert_eq!(padded, "<m>1  &lt;  2  &amp;  &amp;  3  &gt;  2</m>");

    let compact = XmlWriter::new(&arena)
        .with_options(XmlOptions {
            escape: EntityStyle::Compact,
            ..XmlOptions::default()
        })
        .write(&node)
        .unwrap();
    assert_eq!(compact, "<m>1 &lt; 2 &amp;&amp; 3 &gt; 2</m>");

    // Compact output parses back to the same tree
    let again = xml::parse(&arena, compact.as_str().unwrap()).unwrap();
    assert_eq!(again, node);
}

#[test]
fn test_insertion_order_option() {
    let arena = test_arena();
    let node = xml::parse(&arena, "<b>1</b><a>2</a>").unwrap();
    let out = XmlWriter::new(&arena)
        .with_options(XmlOptions {
            key_order: KeyOrder::Insertion,
            ..XmlOptions::default()
        })
        .write(&node)
        .unwrap();
    assert_eq!(out, "<b>1</b><a>2</a>");
}

#[test]
fn test_json_to_xml_to_json_keeps_structure() {
    let arena = test_arena();
    let source = json::parse(
        &arena,
        r#"{"name": "scout", "n": 3, "obj": {"b": "2", "a": true}, "list": ["p", "q"], "none": null}"#,
    )
    .unwrap();

    // A JSON null is leaf text, so it becomes element text
    let as_xml = xml::to_string(&arena, &source).unwrap();
    assert_eq!(
        as_xml,
        "<list><item0>p</item0><item1>q</item1></list><n>3</n><name>scout</name><none>null</none><obj><a>true</a><b>2</b></obj>"
    );

    let back = xml::parse(&arena, &as_xml).unwrap();
    // Arrays return as objects keyed item0, item1, ...
    assert_eq!(
        json::to_string(&arena, &back).unwrap(),
        r#"{"list":{"item0":"p","item1":"q"},"n":3,"name":"scout","none":null,"obj":{"a":true,"b":2}}"#
    );
    assert_eq!(back.get_text("obj.a").unwrap(), source.get_text("obj.a").unwrap());
    assert_eq!(back.get_text("list[1]").unwrap(), "q");
}

#[test]
fn test_root_forms() {
    let arena = test_arena();
    let array = json::parse(&arena, "[1, [2]]").unwrap();
    assert_eq!(
        xml::to_string(&arena, &array).unwrap(),
        "<item0>1</item0><item1><item0>2</item0></item1>"
    );

    let scalar = json::parse(&arena, r#""a & b""#).unwrap();
    assert_eq!(
        xml::to_string(&arena, &scalar).unwrap(),
        "<value>a  &amp;  b</value>"
    );

    let empty = json::parse(&arena, "[]").unwrap();
    assert_eq!(xml::to_string(&arena, &empty).unwrap(), "<value/>");
}

#[test]
fn test_error_kinds() {
    let arena = test_arena();
    let cases = [
        ("", XmlErrorKind::EmptyInput),
        ("<a><b>x</b>", XmlErrorKind::UnexpectedEnd),
        ("<a><-b/></a>", XmlErrorKind::InvalidTagName),
        ("<a id=\"1\">x</a>", XmlErrorKind::ExpectedTagEnd),
        (
            "<a>x</b>",
            XmlErrorKind::TagMismatch {
                expected: "a".into(),
                found: "b".into(),
            },
        ),
        ("<a>x<b/>y</a>", XmlErrorKind::MixedContent { tag: "a".into() }),
        ("<a><!-- x </a>", XmlErrorKind::UnterminatedComment),
        ("<a><![CDATA[ x </a>", XmlErrorKind::UnterminatedCdata),
        ("<!DOCTYPE x", XmlErrorKind::UnterminatedDeclaration),
    ];
    for (input, expected) in cases {
        match xml::parse(&arena, input) {
            Err(Error::Xml { kind, .. }) => assert_eq!(kind, expected, "input {input:?}"),
            other => panic!("expected XML error for {input:?}, got {other:?}"),
        }
    }
}

#[test]
fn test_failed_parses_leave_arena_untouched() {
    let arena = test_arena();
    let before = free_counts(&arena);
    for input in [
        "<a><b>1</b><c><d>2</d><e>3</e></c><f>mixed<g/></f></a>",
        "<a><b>1</b><c>unterminated",
        "<one>1</one><two><three>3</three></four>",
    ] {
        assert!(xml::parse(&arena, input).is_err(), "{input}");
        assert_conserved(&arena, &before);
    }
}

#[test]
fn test_depth_limit() {
    let arena = test_arena();
    let parser = XmlParser::new(&arena).with_limits(ParseLimits { max_depth: 4 });
    assert!(parser.parse("<a><b><c><d>x</d></c></b></a>").is_ok());
    assert_eq!(
        parser.parse("<a><b><c><d><e>x</e></d></c></b></a>").unwrap_err(),
        Error::TooDeep { depth: 5, max: 4 }
    );
}

#[test]
fn test_node_convenience_methods() {
    let arena = test_arena();
    let node = Node::parse_xml(&arena, "<cfg><port>8080</port><debug>true</debug></cfg>").unwrap();
    assert_eq!(node.get_i64("cfg.port").unwrap(), 8080);
    assert!(node.get_bool("cfg.debug").unwrap());
    assert_eq!(
        node.to_xml().unwrap(),
        "<cfg><debug>true</debug><port>8080</port></cfg>"
    );
}
