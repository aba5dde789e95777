//! Part XML serializer.

use super::{XmlDocument, XmlNode};

/// Declaration written in front of every serialized part.
const DECLARATION: &str = "<?xml version=\"1.0\" encoding=\"UTF-8\" standalone=\"yes\"?>\r\n";

/// Serialize a document back to part XML.
pub fn serialize_document(document: &XmlDocument) -> String {
    let mut out = String::with_capacity(4096);
    if document.declaration {
        out.push_str(DECLARATION);
    }
    serialize_node(&document.root, &mut out);
    out
}

fn serialize_node(node: &XmlNode, out: &mut String) {
    out.push('<');
    out.push_str(&node.tag);

    for (key, value) in &node.attrs {
        out.push(' ');
        out.push_str(key);
        out.push_str("=\"");
        out.push_str(&escape_xml(value, true));
        out.push('"');
    }

    if node.children.is_empty() && node.text.is_empty() {
        out.push_str("/>");
    } else {
        out.push('>');
        out.push_str(&escape_xml(&node.text, false));
        for child in &node.children {
            serialize_node(child, out);
        }
        out.push_str("</");
        out.push_str(&node.tag);
        out.push('>');
    }

    out.push_str(&escape_xml(&node.tail, false));
}

/// Escape XML special characters.
fn escape_xml(text: &str, escape_quotes: bool) -> String {
    let mut result = String::with_capacity(text.len());
    for ch in text.chars() {
        match ch {
            '&' => result.push_str("&amp;"),
            '<' => result.push_str("&lt;"),
            '>' => result.push_str("&gt;"),
            '"' if escape_quotes => result.push_str("&quot;"),
            '\'' if escape_quotes => result.push_str("&apos;"),
            _ => result.push(ch),
        }
    }
    result
}
