//! Text-node view and editor for `w:p` elements.

use docfill_core::{InlineImage, ParagraphNodes, TextNode};

use crate::drawing::inline_drawing;
use crate::part::Part;
use crate::xml::XmlNode;

/// Text nodes of `paragraph` in reading order.
///
/// Every `w:t` counts, except those that belong to a nested paragraph (text
/// boxes). The run handle is the position of the enclosing `w:r` among the
/// paragraph's runs.
pub fn text_nodes(paragraph: &XmlNode) -> Vec<TextNode> {
    located_text_nodes(paragraph)
        .into_iter()
        .map(|(_, node)| node)
        .collect()
}

/// Text nodes with their child-index path relative to the paragraph.
fn located_text_nodes(paragraph: &XmlNode) -> Vec<(Vec<usize>, TextNode)> {
    fn walk(
        node: &XmlNode,
        path: &mut Vec<usize>,
        run: usize,
        runs: &mut usize,
        out: &mut Vec<(Vec<usize>, TextNode)>,
    ) {
        for (i, child) in node.children.iter().enumerate() {
            path.push(i);
            match child.tag.as_str() {
                "w:p" => {}
                "w:r" => {
                    let handle = *runs;
                    *runs += 1;
                    walk(child, path, handle, runs, out);
                }
                "w:t" => out.push((path.clone(), TextNode::new(child.text.clone(), run))),
                _ => walk(child, path, run, runs, out),
            }
            path.pop();
        }
    }

    let mut out = Vec::new();
    walk(paragraph, &mut Vec::new(), 0, &mut 0, &mut out);
    out
}

/// Editor for one paragraph of a part.
///
/// Node indices refer to the order returned by [`text_nodes`]. Structural
/// edits refresh that order immediately; the part's paragraph index is
/// rebuilt when the editor is dropped.
pub struct DocxParagraph<'a> {
    part: &'a mut Part,
    index: usize,
    next_drawing_id: &'a mut u32,
    nodes: Vec<Vec<usize>>,
    edited: bool,
}

impl<'a> DocxParagraph<'a> {
    pub(crate) fn new(
        part: &'a mut Part,
        index: usize,
        next_drawing_id: &'a mut u32,
    ) -> Option<Self> {
        let nodes = located_paths(part.paragraph(index)?);
        Some(Self {
            part,
            index,
            next_drawing_id,
            nodes,
            edited: false,
        })
    }

    fn refresh(&mut self) {
        self.nodes = self
            .part
            .paragraph(self.index)
            .map(located_paths)
            .unwrap_or_default();
    }
}

impl ParagraphNodes for DocxParagraph<'_> {
    fn text_nodes(&self) -> Vec<TextNode> {
        self.part
            .paragraph(self.index)
            .map(text_nodes)
            .unwrap_or_default()
    }

    fn set_text(&mut self, index: usize, text: &str) {
        let Some(path) = self.nodes.get(index) else {
            return;
        };
        let Some(node) = self
            .part
            .paragraph_mut(self.index)
            .and_then(|p| p.at_mut(path))
        else {
            return;
        };
        node.text = text.to_owned();
        if needs_preserve(text) {
            node.set_attr("xml:space", "preserve");
        }
        self.edited = true;
    }

    fn remove(&mut self, index: usize) {
        let Some((&position, run_path)) = self.nodes.get(index).and_then(|p| p.split_last())
        else {
            return;
        };
        let Some(paragraph) = self.part.paragraph_mut(self.index) else {
            return;
        };
        let Some(run) = paragraph.at_mut(run_path) else {
            return;
        };

        run.detach_child(position);
        let run_is_empty = run.tag == "w:r" && run.children.iter().all(|c| c.tag == "w:rPr");
        if run_is_empty
            && let Some((&run_position, parent_path)) = run_path.split_last()
            && let Some(parent) = paragraph.at_mut(parent_path)
        {
            parent.detach_child(run_position);
        }

        self.edited = true;
        self.refresh();
    }

    fn insert_image(&mut self, index: usize, at: usize, image: &InlineImage) {
        let Some((&position, run_path)) = self.nodes.get(index).and_then(|p| p.split_last())
        else {
            return;
        };
        let Some(run) = self
            .part
            .paragraph_mut(self.index)
            .and_then(|p| p.at_mut(run_path))
        else {
            return;
        };
        if position >= run.children.len() {
            return;
        }

        let id = *self.next_drawing_id;
        *self.next_drawing_id += 1;

        let mut original = run.children.remove(position);
        let tail = std::mem::take(&mut original.tail);
        let at = floor_char_boundary(&original.text, at);
        let (before, after) = original.text.split_at(at);

        let mut replacement = Vec::with_capacity(3);
        if !before.is_empty() {
            replacement.push(text_element(&original, before));
        }
        replacement.push(inline_drawing(image, id));
        if !after.is_empty() {
            replacement.push(text_element(&original, after));
        }
        if let Some(last) = replacement.last_mut() {
            last.tail = tail;
        }
        run.children.splice(position..position, replacement);

        self.edited = true;
        self.refresh();
    }
}

impl Drop for DocxParagraph<'_> {
    fn drop(&mut self) {
        if self.edited {
            self.part.reindex();
            self.part.modified = true;
        }
    }
}

fn located_paths(paragraph: &XmlNode) -> Vec<Vec<usize>> {
    located_text_nodes(paragraph)
        .into_iter()
        .map(|(path, _)| path)
        .collect()
}

/// A `w:t` carrying `template`'s attributes with new text.
fn text_element(template: &XmlNode, text: &str) -> XmlNode {
    let mut node = XmlNode {
        tag: template.tag.clone(),
        attrs: template.attrs.clone(),
        text: text.to_owned(),
        ..Default::default()
    };
    if needs_preserve(text) {
        node.set_attr("xml:space", "preserve");
    }
    node
}

/// Word collapses leading and trailing whitespace unless told otherwise.
fn needs_preserve(text: &str) -> bool {
    text.starts_with(char::is_whitespace) || text.ends_with(char::is_whitespace)
}

fn floor_char_boundary(text: &str, at: usize) -> usize {
    (0..=at.min(text.len()))
        .rev()
        .find(|&i| text.is_char_boundary(i))
        .unwrap_or(0)
}

#[cfg(test)]
mod tests {
    use docfill_core::RunHandle;
    use pretty_assertions::assert_eq;

    use super::*;
    use crate::xml::serialize_document;

    fn body(paragraphs: &str) -> Part {
        Part::parse(
            "word/document.xml",
            &format!("<w:document><w:body>{paragraphs}</w:body></w:document>"),
        )
        .unwrap()
    }

    fn paragraph_xml(part: &Part, index: usize) -> String {
        let document = crate::xml::XmlDocument {
            declaration: false,
            root: part.paragraph(index).unwrap().clone(),
        };
        serialize_document(&document)
    }

    fn image() -> InlineImage {
        InlineImage {
            relationship_id: "rId5".to_owned(),
            name: "logo".to_owned(),
            width_emu: 9525,
            height_emu: 9525,
        }
    }

    #[test]
    fn test_text_nodes_follow_runs() {
        let part = body(concat!(
            "<w:p><w:r><w:rPr><w:b/></w:rPr><w:t>{{cli</w:t></w:r>",
            "<w:hyperlink><w:r><w:t>ent</w:t><w:tab/><w:t>}}</w:t></w:r></w:hyperlink></w:p>"
        ));
        let nodes = text_nodes(part.paragraph(0).unwrap());

        assert_eq!(
            nodes,
            vec![
                TextNode::new("{{cli", 0),
                TextNode::new("ent", 1),
                TextNode::new("}}", 1),
            ]
        );
        assert_eq!(nodes[2].run, RunHandle(1));
    }

    #[test]
    fn test_nested_paragraph_text_excluded() {
        let part = body(concat!(
            "<w:p><w:r><w:t>outer</w:t></w:r><w:r><w:drawing><w:txbxContent>",
            "<w:p><w:r><w:t>inner</w:t></w:r></w:p>",
            "</w:txbxContent></w:drawing></w:r></w:p>"
        ));

        assert_eq!(part.paragraph_count(), 2);
        assert_eq!(text_nodes(part.paragraph(0).unwrap()), vec![TextNode::new("outer", 0)]);
        assert_eq!(text_nodes(part.paragraph(1).unwrap()), vec![TextNode::new("inner", 0)]);
    }

    #[test]
    fn test_set_text_marks_whitespace() {
        let mut part = body("<w:p><w:r><w:t>x</w:t></w:r><w:r><w:t>y</w:t></w:r></w:p>");
        let mut next_id = 1;
        {
            let mut paragraph = DocxParagraph::new(&mut part, 0, &mut next_id).unwrap();
            paragraph.set_text(0, "Dear ");
            paragraph.set_text(1, "Acme");
        }

        assert!(part.modified);
        assert_eq!(
            paragraph_xml(&part, 0),
            r#"<w:p><w:r><w:t xml:space="preserve">Dear </w:t></w:r><w:r><w:t>Acme</w:t></w:r></w:p>"#
        );
    }

    #[test]
    fn test_remove_drops_emptied_run() {
        let mut part = body(concat!(
            "<w:p><w:r><w:t>a</w:t></w:r>",
            "<w:r><w:rPr><w:i/></w:rPr><w:t>b</w:t></w:r>",
            "<w:r><w:t>c</w:t><w:br/><w:t>d</w:t></w:r></w:p>"
        ));
        let mut next_id = 1;
        {
            let mut paragraph = DocxParagraph::new(&mut part, 0, &mut next_id).unwrap();
            paragraph.remove(3);
            paragraph.remove(1);
            assert_eq!(
                paragraph.text_nodes(),
                vec![TextNode::new("a", 0), TextNode::new("c", 1)]
            );
        }

        assert_eq!(
            paragraph_xml(&part, 0),
            "<w:p><w:r><w:t>a</w:t></w:r><w:r><w:t>c</w:t><w:br/></w:r></w:p>"
        );
    }

    #[test]
    fn test_insert_image_splits_text() {
        let mut part = body(r#"<w:p><w:r><w:rPr><w:b/></w:rPr><w:t>Logo: here</w:t></w:r></w:p>"#);
        let mut next_id = 4;
        {
            let mut paragraph = DocxParagraph::new(&mut part, 0, &mut next_id).unwrap();
            paragraph.insert_image(0, 6, &image());
            assert_eq!(
                paragraph.text_nodes(),
                vec![TextNode::new("Logo: ", 0), TextNode::new("here", 0)]
            );
        }

        assert_eq!(next_id, 5);
        let run = part.paragraph(0).unwrap().at(&[0]).unwrap();
        let tags: Vec<&str> = run.children.iter().map(|c| c.tag.as_str()).collect();
        assert_eq!(tags, vec!["w:rPr", "w:t", "w:drawing", "w:t"]);
        assert_eq!(run.children[1].attr("xml:space"), Some("preserve"));
    }

    #[test]
    fn test_insert_image_drops_empty_halves() {
        let mut part = body("<w:p><w:r><w:t>x</w:t></w:r></w:p>");
        let mut next_id = 1;
        {
            let mut paragraph = DocxParagraph::new(&mut part, 0, &mut next_id).unwrap();
            paragraph.set_text(0, "");
            paragraph.insert_image(0, 0, &image());
            assert!(paragraph.text_nodes().is_empty());
        }

        let run = part.paragraph(0).unwrap().at(&[0]).unwrap();
        assert_eq!(run.children.len(), 1);
        assert_eq!(run.children[0].tag, "w:drawing");
    }

    #[test]
    fn test_floor_char_boundary() {
        assert_eq!(floor_char_boundary("añb", 2), 1);
        assert_eq!(floor_char_boundary("abc", 10), 3);
        assert_eq!(floor_char_boundary("abc", 0), 0);
    }
}
