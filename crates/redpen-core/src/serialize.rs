//! Host document formats.
//!
//! Two renderings of an [`AnnotatedDocument`] that a rich-text host can
//! load: a ProseMirror-style JSON node tree where diff metadata rides on a
//! `diffHighlight` mark, and HTML where it rides on `data-*` attributes of
//! `<span>` elements. Both parse back into a document.

use std::sync::LazyLock;

use pulldown_cmark_escape::escape_html;
use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::annotation::AnnotatedDocument;
use crate::classify::{AnnotatedSpan, SpanKind};

/// Name of the mark carrying diff metadata.
pub const DIFF_MARK: &str = "diffHighlight";

#[derive(Debug, thiserror::Error)]
pub enum HostFormatError {
    #[error("invalid host document json: {0}")]
    Json(#[from] serde_json::Error),

    #[error("unknown diff type '{0}'")]
    UnknownKind(String),
}

/// A node of the host document tree.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum Node {
    Doc {
        #[serde(default)]
        content: Vec<Node>,
    },
    Paragraph {
        #[serde(default)]
        content: Vec<Node>,
    },
    Text {
        text: String,
        #[serde(default, skip_serializing_if = "Vec::is_empty")]
        marks: Vec<Mark>,
    },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum Mark {
    DiffHighlight { attrs: DiffAttrs },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DiffAttrs {
    #[serde(rename = "type")]
    pub kind: SpanKind,
    #[serde(default)]
    pub correction: String,
}

/// The document as one paragraph of text nodes.
pub fn to_node(doc: &AnnotatedDocument) -> Node {
    Node::Paragraph {
        content: doc.spans().map(text_node).collect(),
    }
}

fn text_node(span: &AnnotatedSpan) -> Node {
    let marks = match span.kind {
        SpanKind::Unchanged => Vec::new(),
        kind => vec![Mark::DiffHighlight {
            attrs: DiffAttrs {
                kind,
                correction: span.correction.clone().unwrap_or_default(),
            },
        }],
    };
    Node::Text {
        text: span.text.clone(),
        marks,
    }
}

/// Read a node tree back. Containers are flattened in order.
pub fn from_node(node: &Node) -> AnnotatedDocument {
    let mut doc = AnnotatedDocument::new();
    collect_spans(node, &mut doc);
    doc
}

fn collect_spans(node: &Node, doc: &mut AnnotatedDocument) {
    match node {
        Node::Doc { content } | Node::Paragraph { content } => {
            for child in content {
                collect_spans(child, doc);
            }
        }
        Node::Text { text, marks } => {
            let attrs = marks.iter().map(|m| match m {
                Mark::DiffHighlight { attrs } => attrs,
            });
            let span = match attrs.last() {
                Some(attrs) => span_from_parts(text, attrs.kind, &attrs.correction),
                None => AnnotatedSpan::unchanged(text.as_str()),
            };
            doc.push(span);
        }
    }
}

fn span_from_parts(text: &str, kind: SpanKind, correction: &str) -> AnnotatedSpan {
    match kind {
        SpanKind::Unchanged => AnnotatedSpan::unchanged(text),
        SpanKind::Deletion => AnnotatedSpan::deletion(text),
        SpanKind::Addition => AnnotatedSpan::addition(text),
        SpanKind::Change => AnnotatedSpan::change(text, correction),
    }
}

pub fn to_json(doc: &AnnotatedDocument) -> Result<String, HostFormatError> {
    Ok(serde_json::to_string(&to_node(doc))?)
}

pub fn to_json_pretty(doc: &AnnotatedDocument) -> Result<String, HostFormatError> {
    Ok(serde_json::to_string_pretty(&to_node(doc))?)
}

pub fn from_json(json: &str) -> Result<AnnotatedDocument, HostFormatError> {
    let node: Node = serde_json::from_str(json)?;
    Ok(from_node(&node))
}

fn push_escaped(out: &mut String, text: &str) {
    escape_html(out, text).expect("writing to a String cannot fail");
}

/// Render as a `<p>` with one `<span>` per pending span.
pub fn to_html(doc: &AnnotatedDocument) -> String {
    let mut out = String::from("<p>");
    for span in doc.spans() {
        if span.kind == SpanKind::Unchanged {
            push_escaped(&mut out, &span.text);
            continue;
        }
        out.push_str("<span data-diff-type=\"");
        out.push_str(span.kind.as_str());
        out.push_str("\" data-correction=\"");
        push_escaped(&mut out, span.correction.as_deref().unwrap_or_default());
        out.push_str("\">");
        push_escaped(&mut out, &span.text);
        out.push_str("</span>");
    }
    out.push_str("</p>");
    out
}

static SPAN_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"<span data-diff-type="([a-z]+)" data-correction="([^"]*)">([^<]*)</span>"#)
        .expect("diff span pattern is valid")
});

/// Parse HTML produced by [`to_html`].
pub fn from_html(html: &str) -> Result<AnnotatedDocument, HostFormatError> {
    let body = html.trim();
    let body = body.strip_prefix("<p>").unwrap_or(body);
    let body = body.strip_suffix("</p>").unwrap_or(body);

    let mut doc = AnnotatedDocument::new();
    let mut last = 0;
    for caps in SPAN_RE.captures_iter(body) {
        let Some(whole) = caps.get(0) else {
            continue;
        };
        if whole.start() > last {
            doc.push(AnnotatedSpan::unchanged(unescape_html(&body[last..whole.start()])));
        }
        let kind = SpanKind::parse(&caps[1])
            .ok_or_else(|| HostFormatError::UnknownKind(caps[1].to_string()))?;
        doc.push(span_from_parts(
            &unescape_html(&caps[3]),
            kind,
            &unescape_html(&caps[2]),
        ));
        last = whole.end();
    }
    if last < body.len() {
        doc.push(AnnotatedSpan::unchanged(unescape_html(&body[last..])));
    }
    Ok(doc)
}

fn unescape_html(s: &str) -> String {
    s.replace("&lt;", "<")
        .replace("&gt;", ">")
        .replace("&quot;", "\"")
        .replace("&#39;", "'")
        .replace("&#x27;", "'")
        .replace("&amp;", "&")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::annotation::annotate;

    fn sample() -> AnnotatedDocument {
        AnnotatedDocument::from_spans([
            AnnotatedSpan::unchanged("I saw "),
            AnnotatedSpan::change("teh", "the"),
            AnnotatedSpan::unchanged(" cat"),
            AnnotatedSpan::addition("."),
        ])
    }

    #[test]
    fn test_node_json_shape() {
        let json = to_json_pretty(&sample()).unwrap();
        insta::assert_snapshot!(json, @r#"
        {
          "type": "paragraph",
          "content": [
            {
              "type": "text",
              "text": "I saw "
            },
            {
              "type": "text",
              "text": "teh",
              "marks": [
                {
                  "type": "diffHighlight",
                  "attrs": {
                    "type": "change",
                    "correction": "the"
                  }
                }
              ]
            },
            {
              "type": "text",
              "text": " cat"
            },
            {
              "type": "text",
              "text": ".",
              "marks": [
                {
                  "type": "diffHighlight",
                  "attrs": {
                    "type": "addition",
                    "correction": "."
                  }
                }
              ]
            }
          ]
        }
        "#);
    }

    #[test]
    fn test_json_round_trip() {
        let doc = annotate("Their going too the store", "They're going to the store.");
        let parsed = from_json(&to_json(&doc).unwrap()).unwrap();
        let spans: Vec<_> = parsed.spans().cloned().collect();
        let expected: Vec<_> = doc.spans().cloned().collect();
        assert_eq!(spans, expected);
    }

    #[test]
    fn test_json_accepts_doc_wrapper() {
        let json = r#"{"type":"doc","content":[{"type":"paragraph","content":[
            {"type":"text","text":"very ","marks":[{"type":"diffHighlight","attrs":{"type":"deletion","correction":""}}]},
            {"type":"text","text":"good"}
        ]}]}"#;
        let doc = from_json(json).unwrap();
        assert_eq!(doc.pending_count(), 1);
        assert_eq!(doc.corrected_text(), "good");
        assert_eq!(doc.original_text(), "very good");
    }

    #[test]
    fn test_json_rejects_unknown_kind() {
        let json = r#"{"type":"text","text":"x","marks":[{"type":"diffHighlight","attrs":{"type":"bold"}}]}"#;
        assert!(matches!(from_json(json), Err(HostFormatError::Json(_))));
    }

    #[test]
    fn test_html_shape() {
        insta::assert_snapshot!(
            to_html(&sample()),
            @r#"<p>I saw <span data-diff-type="change" data-correction="the">teh</span> cat<span data-diff-type="addition" data-correction=".">.</span></p>"#
        );
    }

    #[test]
    fn test_html_escapes_and_round_trips() {
        let doc = AnnotatedDocument::from_spans([
            AnnotatedSpan::unchanged("a < b & "),
            AnnotatedSpan::change("\"quoted\"", "'quoted'"),
            AnnotatedSpan::deletion(" <br>"),
        ]);
        let html = to_html(&doc);
        assert!(!html.contains("<br>"));
        assert!(html.contains("&lt;br&gt;"));

        let parsed = from_html(&html).unwrap();
        let spans: Vec<_> = parsed.spans().cloned().collect();
        let expected: Vec<_> = doc.spans().cloned().collect();
        assert_eq!(spans, expected);
    }

    #[test]
    fn test_push_escaped_appends() {
        let mut out = String::from("<p>");
        push_escaped(&mut out, r#"a < b & "c""#);
        assert_eq!(out, "<p>a &lt; b &amp; &quot;c&quot;");
    }

    #[test]
    fn test_html_unknown_kind() {
        let html = r#"<p><span data-diff-type="bold" data-correction="">x</span></p>"#;
        assert!(matches!(
            from_html(html),
            Err(HostFormatError::UnknownKind(kind)) if kind == "bold"
        ));
    }

    #[test]
    fn test_empty_document() {
        let doc = AnnotatedDocument::new();
        assert_eq!(to_html(&doc), "<p></p>");
        assert!(from_html("<p></p>").unwrap().is_empty());
        assert!(from_json(&to_json(&doc).unwrap()).unwrap().is_empty());
    }
}
