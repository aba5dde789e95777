//! Part XML parser.

use quick_xml::events::{BytesStart, Event};
use quick_xml::reader::Reader;

use super::{XmlDocument, XmlNode};
use crate::error::DocxError;

/// Parse a part into an [`XmlDocument`].
///
/// `name` is only used for error messages. A leading byte-order mark is
/// ignored. Comments and processing instructions are dropped.
pub fn parse_document(xml: &str, name: &str) -> Result<XmlDocument, DocxError> {
    let xml = xml.strip_prefix('\u{feff}').unwrap_or(xml);
    let mut reader = Reader::from_str(xml);
    reader.config_mut().trim_text(false);

    let mut buf = Vec::new();
    let mut declaration = false;

    loop {
        match reader.read_event_into(&mut buf)? {
            Event::Decl(_) => declaration = true,
            Event::Start(e) => {
                let tag = decode_tag(&reader, e.name().as_ref());
                let attrs = decode_attrs(&reader, &e);
                let mut root = parse_children(&mut reader, &tag)?;
                root.tag = tag;
                root.attrs = attrs;
                return Ok(XmlDocument { declaration, root });
            }
            Event::Empty(e) => {
                let root = XmlNode {
                    tag: decode_tag(&reader, e.name().as_ref()),
                    attrs: decode_attrs(&reader, &e),
                    ..Default::default()
                };
                return Ok(XmlDocument { declaration, root });
            }
            Event::Eof => return Err(DocxError::Empty(name.to_owned())),
            // Whitespace, comments and doctype before the root
            Event::Text(_)
            | Event::GeneralRef(_)
            | Event::CData(_)
            | Event::End(_)
            | Event::Comment(_)
            | Event::PI(_)
            | Event::DocType(_) => {}
        }
        buf.clear();
    }
}

fn parse_children<R: std::io::BufRead>(
    reader: &mut Reader<R>,
    parent_tag: &str,
) -> Result<XmlNode, DocxError> {
    let mut buf = Vec::new();
    let mut node = XmlNode::default();

    loop {
        match reader.read_event_into(&mut buf)? {
            Event::Start(e) => {
                let child_tag = decode_tag(reader, e.name().as_ref());
                let child_attrs = decode_attrs(reader, &e);
                let mut child = parse_children(reader, &child_tag)?;
                child.tag = child_tag;
                child.attrs = child_attrs;
                node.children.push(child);
            }
            Event::Empty(e) => {
                node.children.push(XmlNode {
                    tag: decode_tag(reader, e.name().as_ref()),
                    attrs: decode_attrs(reader, &e),
                    ..Default::default()
                });
            }
            Event::Text(e) => {
                let text = reader.decoder().decode(&e)?.into_owned();
                append_text(&mut node, &text);
            }
            Event::GeneralRef(e) => {
                let entity = reader.decoder().decode(&e)?.into_owned();
                append_text(&mut node, &decode_entity(&entity));
            }
            Event::CData(e) => {
                let text = String::from_utf8_lossy(&e).into_owned();
                append_text(&mut node, &text);
            }
            Event::End(e) => {
                if decode_tag(reader, e.name().as_ref()) == parent_tag {
                    return Ok(node);
                }
            }
            Event::Eof => {
                return Err(DocxError::Truncated {
                    tag: parent_tag.to_owned(),
                });
            }
            Event::Comment(_) | Event::Decl(_) | Event::PI(_) | Event::DocType(_) => {}
        }
        buf.clear();
    }
}

fn decode_tag<R>(reader: &Reader<R>, name: &[u8]) -> String {
    reader.decoder().decode(name).map_or_else(
        |_| String::from_utf8_lossy(name).into_owned(),
        std::borrow::Cow::into_owned,
    )
}

fn decode_attrs<R>(reader: &Reader<R>, e: &BytesStart) -> Vec<(String, String)> {
    e.attributes()
        .flatten()
        .map(|attr| {
            let key = decode_tag(reader, attr.key.as_ref());
            let value = attr.unescape_value().map_or_else(
                |_| String::from_utf8_lossy(&attr.value).into_owned(),
                std::borrow::Cow::into_owned,
            );
            (key, value)
        })
        .collect()
}

/// Append text to the node's text or its last child's tail.
fn append_text(node: &mut XmlNode, text: &str) {
    if let Some(last_child) = node.children.last_mut() {
        last_child.tail.push_str(text);
    } else {
        node.text.push_str(text);
    }
}

/// Decode an entity reference name to its character value.
fn decode_entity(entity: &str) -> String {
    match entity {
        "lt" => "<".to_owned(),
        "gt" => ">".to_owned(),
        "amp" => "&".to_owned(),
        "apos" => "'".to_owned(),
        "quot" => "\"".to_owned(),
        s if s.starts_with('#') => {
            let code = if s.starts_with("#x") || s.starts_with("#X") {
                u32::from_str_radix(&s[2..], 16).ok()
            } else {
                s[1..].parse::<u32>().ok()
            };
            code.and_then(char::from_u32)
                .map_or_else(|| format!("&{entity};"), |c| c.to_string())
        }
        // Unknown entity, keep it literally
        _ => format!("&{entity};"),
    }
}
