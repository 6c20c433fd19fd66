//! DOCX package model
//!
//! A `.docx` file is an OPC zip package. The main document part (normally
//! `word/document.xml`) is parsed eagerly; all other parts stay as raw bytes until
//! something asks for them.

use std::fs;
use std::io::{Cursor, Read, Write};
use std::path::Path;

use tracing::debug;
use zip::write::SimpleFileOptions;
use zip::{CompressionMethod, ZipArchive, ZipWriter};

use crate::error::DocxError;
use crate::xml::{XmlDocument, XmlElement, XmlNode};

pub const CONTENT_TYPES_PART: &str = "[Content_Types].xml";
pub const PACKAGE_RELS_PART: &str = "_rels/.rels";
pub const DEFAULT_MAIN_PART: &str = "word/document.xml";
pub const WORDML_NS: &str = "http://schemas.openxmlformats.org/wordprocessingml/2006/main";
pub const RELATIONSHIPS_NS: &str = "http://schemas.openxmlformats.org/package/2006/relationships";
pub const CONTENT_TYPES_NS: &str = "http://schemas.openxmlformats.org/package/2006/content-types";

const OFFICE_DOCUMENT_REL_TYPE: &str =
    "http://schemas.openxmlformats.org/officeDocument/2006/relationships/officeDocument";
const MAIN_CONTENT_TYPE: &str =
    "application/vnd.openxmlformats-officedocument.wordprocessingml.document.main+xml";

/// A body-level paragraph and its plain text
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Paragraph {
    pub index: usize,
    pub text: String,
}

#[derive(Debug, Clone)]
struct PackageEntry {
    name: String,
    data: Vec<u8>,
}

/// An opened word-processor document
#[derive(Debug, Clone)]
pub struct DocxDocument {
    entries: Vec<PackageEntry>,
    main_part: String,
    document: XmlDocument,
}

impl DocxDocument {
    /// Open a `.docx` file from disk
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self, DocxError> {
        let bytes = fs::read(path.as_ref())?;
        Self::from_bytes(&bytes)
    }

    /// Parse a `.docx` package held in memory
    pub fn from_bytes(bytes: &[u8]) -> Result<Self, DocxError> {
        let mut archive = ZipArchive::new(Cursor::new(bytes))?;
        let mut entries = Vec::with_capacity(archive.len());

        for i in 0..archive.len() {
            let mut file = archive.by_index(i)?;
            if file.is_dir() {
                continue;
            }
            let name = file.name().to_string();
            let mut data = Vec::with_capacity(file.size() as usize);
            file.read_to_end(&mut data)?;
            entries.push(PackageEntry { name, data });
        }

        let main_part = resolve_main_part(&entries)?;
        let main_bytes = entries
            .iter()
            .find(|e| e.name == main_part)
            .map(|e| e.data.as_slice())
            .ok_or_else(|| DocxError::MissingPart(main_part.clone()))?;
        let document = XmlDocument::parse(main_bytes)?;

        match document.root() {
            Some(root) if root.name == "w:document" => {
                if root.child("w:body").is_none() {
                    return Err(DocxError::Malformed("document has no body".to_string()));
                }
            }
            Some(root) => {
                return Err(DocxError::Malformed(format!(
                    "unexpected root element <{}>",
                    root.name
                )))
            }
            None => return Err(DocxError::Malformed("empty main part".to_string())),
        }

        debug!(
            "Opened package: {} parts, main part {}",
            entries.len(),
            main_part
        );

        Ok(Self {
            entries,
            main_part,
            document,
        })
    }

    /// Build a minimal, valid package whose body holds one paragraph per entry
    pub fn new_with_paragraphs(paragraphs: &[&str]) -> Self {
        let mut body = XmlElement::new("w:body");
        for text in paragraphs {
            body.push(text_paragraph(text));
        }
        let root = XmlElement::new("w:document")
            .with_attr("xmlns:w", WORDML_NS)
            .with_child(body);

        let content_types = format!(
            r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<Types xmlns="{CONTENT_TYPES_NS}"><Default Extension="rels" ContentType="application/vnd.openxmlformats-package.relationships+xml"/><Default Extension="xml" ContentType="application/xml"/><Override PartName="/{DEFAULT_MAIN_PART}" ContentType="{MAIN_CONTENT_TYPE}"/></Types>"#
        );
        let package_rels = format!(
            r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<Relationships xmlns="{RELATIONSHIPS_NS}"><Relationship Id="rId1" Type="{OFFICE_DOCUMENT_REL_TYPE}" Target="{DEFAULT_MAIN_PART}"/></Relationships>"#
        );
        let document_rels = format!(
            r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<Relationships xmlns="{RELATIONSHIPS_NS}"></Relationships>"#
        );

        let entries = vec![
            PackageEntry {
                name: CONTENT_TYPES_PART.to_string(),
                data: content_types.into_bytes(),
            },
            PackageEntry {
                name: PACKAGE_RELS_PART.to_string(),
                data: package_rels.into_bytes(),
            },
            PackageEntry {
                name: DEFAULT_MAIN_PART.to_string(),
                data: Vec::new(), // serialized from `document` on save
            },
            PackageEntry {
                name: rels_part_for(DEFAULT_MAIN_PART),
                data: document_rels.into_bytes(),
            },
        ];

        Self {
            entries,
            main_part: DEFAULT_MAIN_PART.to_string(),
            document: XmlDocument::with_root(root),
        }
    }

    /// Body paragraphs in document order (paragraphs nested in tables are not included)
    pub fn paragraphs(&self) -> Vec<Paragraph> {
        self.body()
            .map(|body| {
                body.elements()
                    .filter(|el| el.name == "w:p")
                    .enumerate()
                    .map(|(index, p)| Paragraph {
                        index,
                        text: paragraph_text(p),
                    })
                    .collect()
            })
            .unwrap_or_default()
    }

    pub fn paragraph_count(&self) -> usize {
        self.body()
            .map(|body| body.elements().filter(|el| el.name == "w:p").count())
            .unwrap_or(0)
    }

    /// Mutable access to the `index`-th body paragraph element
    pub fn paragraph_element_mut(&mut self, index: usize) -> Option<&mut XmlElement> {
        self.body_mut()?
            .elements_mut()
            .filter(|el| el.name == "w:p")
            .nth(index)
    }

    /// Append a plain paragraph at the end of the body, ahead of the section properties.
    /// Line feeds in `text` become line breaks. Returns the new paragraph's index.
    pub fn append_paragraph(&mut self, text: &str) -> Result<usize, DocxError> {
        let index = self.paragraph_count();
        let body = self
            .body_mut()
            .ok_or_else(|| DocxError::Malformed("document has no body".to_string()))?;

        let paragraph = XmlNode::Element(text_paragraph(text));
        match body.position_of("w:sectPr") {
            Some(pos) => body.children.insert(pos, paragraph),
            None => body.children.push(paragraph),
        }
        Ok(index)
    }

    /// Ids of every comment reference marker in the body
    pub fn comment_reference_ids(&self) -> Vec<u32> {
        let mut refs = Vec::new();
        if let Some(body) = self.body() {
            body.descendants("w:commentReference", &mut refs);
        }
        refs.iter()
            .filter_map(|el| el.attr("w:id").and_then(|id| id.parse().ok()))
            .collect()
    }

    /// Raw bytes of a package part
    pub fn part(&self, name: &str) -> Option<&[u8]> {
        self.entries
            .iter()
            .find(|e| e.name == name)
            .map(|e| e.data.as_slice())
    }

    /// Replace a part's bytes, adding the part if it does not exist yet
    pub fn set_part(&mut self, name: &str, data: Vec<u8>) {
        match self.entries.iter_mut().find(|e| e.name == name) {
            Some(entry) => entry.data = data,
            None => self.entries.push(PackageEntry {
                name: name.to_string(),
                data,
            }),
        }
    }

    /// Remove a part from the package. The main document part cannot be removed.
    pub fn remove_part(&mut self, name: &str) -> Option<Vec<u8>> {
        if name == self.main_part {
            return None;
        }
        let pos = self.entries.iter().position(|e| e.name == name)?;
        Some(self.entries.remove(pos).data)
    }

    pub fn part_names(&self) -> Vec<&str> {
        self.entries.iter().map(|e| e.name.as_str()).collect()
    }

    pub fn main_part(&self) -> &str {
        &self.main_part
    }

    /// Folder holding the main part, e.g. `word`
    pub fn main_part_dir(&self) -> &str {
        self.main_part
            .rsplit_once('/')
            .map(|(dir, _)| dir)
            .unwrap_or("")
    }

    /// Relationships part of the main document, e.g. `word/_rels/document.xml.rels`
    pub fn main_rels_part(&self) -> String {
        rels_part_for(&self.main_part)
    }

    /// Serialize the package
    pub fn to_bytes(&self) -> Result<Vec<u8>, DocxError> {
        let main_bytes = self.document.to_bytes()?;

        let mut writer = ZipWriter::new(Cursor::new(Vec::new()));
        let options = SimpleFileOptions::default().compression_method(CompressionMethod::Deflated);

        for entry in &self.entries {
            writer.start_file(entry.name.as_str(), options)?;
            if entry.name == self.main_part {
                writer.write_all(&main_bytes)?;
            } else {
                writer.write_all(&entry.data)?;
            }
        }

        let cursor = writer.finish()?;
        Ok(cursor.into_inner())
    }

    /// Write the package to `path`
    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<(), DocxError> {
        let bytes = self.to_bytes()?;
        fs::write(path.as_ref(), bytes)?;
        Ok(())
    }

    fn body(&self) -> Option<&XmlElement> {
        self.document.root()?.child("w:body")
    }

    fn body_mut(&mut self) -> Option<&mut XmlElement> {
        self.document.root_mut()?.child_mut("w:body")
    }
}

/// `word/document.xml` -> `word/_rels/document.xml.rels`
pub fn rels_part_for(part: &str) -> String {
    match part.rsplit_once('/') {
        Some((dir, file)) => format!("{}/_rels/{}.rels", dir, file),
        None => format!("_rels/{}.rels", part),
    }
}

/// Resolve a relationship target relative to the folder of its source part
pub fn resolve_target(source_dir: &str, target: &str) -> String {
    if let Some(absolute) = target.strip_prefix('/') {
        return absolute.to_string();
    }
    let mut segments: Vec<&str> = source_dir.split('/').filter(|s| !s.is_empty()).collect();
    for segment in target.split('/') {
        match segment {
            "" | "." => {}
            ".." => {
                segments.pop();
            }
            other => segments.push(other),
        }
    }
    segments.join("/")
}

fn resolve_main_part(entries: &[PackageEntry]) -> Result<String, DocxError> {
    let rels = match entries.iter().find(|e| e.name == PACKAGE_RELS_PART) {
        Some(entry) => XmlDocument::parse(&entry.data)?,
        None => return Ok(DEFAULT_MAIN_PART.to_string()),
    };

    let target = rels.root().and_then(|root| {
        root.elements()
            .filter(|el| el.name == "Relationship")
            .find(|el| el.attr("Type") == Some(OFFICE_DOCUMENT_REL_TYPE))
            .and_then(|el| el.attr("Target"))
            .map(|t| resolve_target("", t))
    });

    Ok(target.unwrap_or_else(|| DEFAULT_MAIN_PART.to_string()))
}

/// Plain text of a paragraph: direct runs plus runs inside hyperlinks
pub fn paragraph_text(paragraph: &XmlElement) -> String {
    let mut text = String::new();
    for child in paragraph.elements() {
        match child.name.as_str() {
            "w:r" => push_run_text(child, &mut text),
            "w:hyperlink" => {
                for run in child.elements().filter(|el| el.name == "w:r") {
                    push_run_text(run, &mut text);
                }
            }
            _ => {}
        }
    }
    text
}

fn push_run_text(run: &XmlElement, out: &mut String) {
    for el in run.elements() {
        match el.name.as_str() {
            "w:t" => {
                for node in &el.children {
                    if let XmlNode::Text(t) = node {
                        out.push_str(t);
                    }
                }
            }
            "w:tab" => out.push('\t'),
            "w:br" | "w:cr" => out.push('\n'),
            "w:noBreakHyphen" => out.push('-'),
            _ => {}
        }
    }
}

/// A single run carrying `text`; line feeds become `w:br`
pub fn text_run(text: &str) -> XmlElement {
    let mut run = XmlElement::new("w:r");
    for (i, line) in text.split('\n').enumerate() {
        if i > 0 {
            run.push(XmlElement::new("w:br"));
        }
        if !line.is_empty() {
            run.push(
                XmlElement::new("w:t")
                    .with_attr("xml:space", "preserve")
                    .with_text(line),
            );
        }
    }
    run
}

pub fn text_paragraph(text: &str) -> XmlElement {
    XmlElement::new("w:p").with_child(text_run(text))
}
