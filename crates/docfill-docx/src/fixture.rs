//! Minimal DOCX packages for tests.

use std::io::{Cursor, Write};
use std::path::{Path, PathBuf};

use zip::write::SimpleFileOptions;

const W_NS: &str = "http://schemas.openxmlformats.org/wordprocessingml/2006/main";
const R_NS: &str = "http://schemas.openxmlformats.org/officeDocument/2006/relationships";
const REL_TYPE_BASE: &str = "http://schemas.openxmlformats.org/officeDocument/2006/relationships";

/// A `w:p` with one run per text.
pub(crate) fn paragraph(runs: &[&str]) -> String {
    let runs: String = runs
        .iter()
        .map(|text| format!(r#"<w:r><w:t xml:space="preserve">{text}</w:t></w:r>"#))
        .collect();
    format!("<w:p>{runs}</w:p>")
}

/// Encoded PNG of the given dimensions.
pub(crate) fn png_bytes(width: u32, height: u32) -> Vec<u8> {
    let mut bytes = Cursor::new(Vec::new());
    image::DynamicImage::new_rgb8(width, height)
        .write_to(&mut bytes, image::ImageFormat::Png)
        .unwrap();
    bytes.into_inner()
}

pub(crate) struct DocxBuilder {
    body: String,
    headers: Vec<String>,
    footers: Vec<String>,
    extra: Vec<(String, Vec<u8>)>,
    with_document: bool,
}

impl DocxBuilder {
    pub(crate) fn new(body: &str) -> Self {
        Self {
            body: body.to_owned(),
            headers: Vec::new(),
            footers: Vec::new(),
            extra: Vec::new(),
            with_document: true,
        }
    }

    pub(crate) fn with_header(mut self, content: &str) -> Self {
        self.headers.push(content.to_owned());
        self
    }

    pub(crate) fn with_footer(mut self, content: &str) -> Self {
        self.footers.push(content.to_owned());
        self
    }

    pub(crate) fn with_entry(mut self, name: &str, data: &[u8]) -> Self {
        self.extra.push((name.to_owned(), data.to_vec()));
        self
    }

    pub(crate) fn without_document(mut self) -> Self {
        self.with_document = false;
        self
    }

    /// Write the package to `dir/name` and return its path.
    pub(crate) fn write(&self, dir: &Path, name: &str) -> PathBuf {
        let path = dir.join(name);
        let file = std::fs::File::create(&path).unwrap();
        let mut zip = zip::ZipWriter::new(file);
        let options = SimpleFileOptions::default();

        let mut add = |name: &str, data: &[u8]| {
            zip.start_file(name, options).unwrap();
            zip.write_all(data).unwrap();
        };

        add("[Content_Types].xml", self.content_types().as_bytes());
        add(
            "_rels/.rels",
            relationships(&[(
                "rId1",
                "officeDocument",
                "word/document.xml",
            )])
            .as_bytes(),
        );

        if self.with_document {
            add(
                "word/document.xml",
                format!(
                    r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<w:document xmlns:w="{W_NS}" xmlns:r="{R_NS}"><w:body>{}<w:sectPr/></w:body></w:document>"#,
                    self.body
                )
                .as_bytes(),
            );
        }

        let mut rels = Vec::new();
        for (i, content) in self.headers.iter().enumerate() {
            let part = format!("header{}.xml", i + 1);
            add(&format!("word/{part}"), story("w:hdr", content).as_bytes());
            rels.push((format!("rIdH{i}"), "header", part));
        }
        for (i, content) in self.footers.iter().enumerate() {
            let part = format!("footer{}.xml", i + 1);
            add(&format!("word/{part}"), story("w:ftr", content).as_bytes());
            rels.push((format!("rIdF{i}"), "footer", part));
        }
        let rels: Vec<(&str, &str, &str)> = rels
            .iter()
            .map(|(id, kind, target)| (id.as_str(), *kind, target.as_str()))
            .collect();
        add("word/_rels/document.xml.rels", relationships(&rels).as_bytes());

        for (name, data) in &self.extra {
            add(name, data);
        }

        zip.finish().unwrap();
        path
    }

    fn content_types(&self) -> String {
        let mut overrides = String::new();
        for (prefix, count) in [("header", self.headers.len()), ("footer", self.footers.len())] {
            for i in 1..=count {
                overrides.push_str(&format!(
                    r#"<Override PartName="/word/{prefix}{i}.xml" ContentType="application/vnd.openxmlformats-officedocument.wordprocessingml.{prefix}+xml"/>"#
                ));
            }
        }
        format!(
            r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<Types xmlns="http://schemas.openxmlformats.org/package/2006/content-types"><Default Extension="rels" ContentType="application/vnd.openxmlformats-package.relationships+xml"/><Default Extension="xml" ContentType="application/xml"/><Override PartName="/word/document.xml" ContentType="application/vnd.openxmlformats-officedocument.wordprocessingml.document.main+xml"/>{overrides}</Types>"#
        )
    }
}

fn story(tag: &str, content: &str) -> String {
    format!(
        r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<{tag} xmlns:w="{W_NS}" xmlns:r="{R_NS}">{content}</{tag}>"#
    )
}

fn relationships(rels: &[(&str, &str, &str)]) -> String {
    let body: String = rels
        .iter()
        .map(|(id, kind, target)| {
            format!(r#"<Relationship Id="{id}" Type="{REL_TYPE_BASE}/{kind}" Target="{target}"/>"#)
        })
        .collect();
    format!(
        r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<Relationships xmlns="http://schemas.openxmlformats.org/package/2006/relationships">{body}</Relationships>"#
    )
}
