//! Review comments (`word/comments.xml`)
//!
//! Adding a comment to a WordprocessingML package touches four places:
//! 1. the comments part itself, holding `w:comment` bodies
//! 2. the main part's relationships, pointing at the comments part
//! 3. `[Content_Types].xml`, declaring the comments part's content type
//! 4. the anchored paragraph, which gets range start/end markers and a reference run

use tracing::debug;

use crate::error::DocxError;
use crate::package::{
    paragraph_text, resolve_target, text_run, DocxDocument, CONTENT_TYPES_PART, WORDML_NS,
};
use crate::xml::{XmlDocument, XmlElement, XmlNode};

pub const COMMENTS_REL_TYPE: &str =
    "http://schemas.openxmlformats.org/officeDocument/2006/relationships/comments";
pub const COMMENTS_CONTENT_TYPE: &str =
    "application/vnd.openxmlformats-officedocument.wordprocessingml.comments+xml";

/// A comment as read back from a package
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Comment {
    pub id: u32,
    pub author: String,
    pub initials: String,
    pub text: String,
}

/// The comments container of one document, loaded or created on first use
#[derive(Debug, Clone)]
pub struct CommentsPart {
    part_name: String,
    xml: XmlDocument,
}

impl CommentsPart {
    /// Load the document's comments part, registering a new empty one if the package
    /// has none. Nothing in `doc` is modified unless every step succeeds.
    pub fn open_or_create(doc: &mut DocxDocument) -> Result<Self, DocxError> {
        let rels_name = doc.main_rels_part();
        let mut rels = parse_part(doc, &rels_name)?;
        let mut content_types = parse_part(doc, CONTENT_TYPES_PART)?;

        let rels_root = rels
            .root_mut()
            .ok_or_else(|| DocxError::Malformed(format!("{} has no root", rels_name)))?;
        let existing_target = rels_root
            .elements()
            .filter(|el| el.name == "Relationship")
            .find(|el| el.attr("Type") == Some(COMMENTS_REL_TYPE))
            .and_then(|el| el.attr("Target"))
            .map(str::to_string);

        let rels_changed = existing_target.is_none();
        let part_name = match existing_target {
            Some(target) => resolve_target(doc.main_part_dir(), &target),
            None => {
                let id = next_relationship_id(rels_root);
                rels_root.push(
                    XmlElement::new("Relationship")
                        .with_attr("Id", &id)
                        .with_attr("Type", COMMENTS_REL_TYPE)
                        .with_attr("Target", "comments.xml"),
                );
                resolve_target(doc.main_part_dir(), "comments.xml")
            }
        };

        let types_root = content_types.root_mut().ok_or_else(|| {
            DocxError::Malformed(format!("{} has no root", CONTENT_TYPES_PART))
        })?;
        let override_name = format!("/{}", part_name);
        let types_changed = !types_root
            .elements()
            .any(|el| el.name == "Override" && el.attr("PartName") == Some(override_name.as_str()));
        if types_changed {
            types_root.push(
                XmlElement::new("Override")
                    .with_attr("PartName", &override_name)
                    .with_attr("ContentType", COMMENTS_CONTENT_TYPE),
            );
        }

        let xml = match doc.part(&part_name) {
            Some(bytes) => {
                let xml = XmlDocument::parse(bytes)?;
                match xml.root() {
                    Some(root) if root.name == "w:comments" => xml,
                    _ => {
                        return Err(DocxError::Malformed(format!(
                            "{} is not a comments part",
                            part_name
                        )))
                    }
                }
            }
            None => XmlDocument::with_root(XmlElement::new("w:comments").with_attr("xmlns:w", WORDML_NS)),
        };

        // Serialize everything before touching the package
        let rels_bytes = if rels_changed { Some(rels.to_bytes()?) } else { None };
        let types_bytes = if types_changed {
            Some(content_types.to_bytes()?)
        } else {
            None
        };

        if let Some(bytes) = rels_bytes {
            doc.set_part(&rels_name, bytes);
        }
        if let Some(bytes) = types_bytes {
            doc.set_part(CONTENT_TYPES_PART, bytes);
        }

        debug!(
            "Comments part {} ready (registered: {})",
            part_name, rels_changed
        );

        Ok(Self { part_name, xml })
    }

    pub fn part_name(&self) -> &str {
        &self.part_name
    }

    /// Id following the largest id of any comment already in the part. Fails when that
    /// id is `u32::MAX`.
    pub fn next_free_id(&self) -> Result<u32, DocxError> {
        let largest = self.xml.root().and_then(|root| {
            root.elements()
                .filter(|el| el.name == "w:comment")
                .filter_map(|el| el.attr("w:id").and_then(|id| id.parse::<u32>().ok()))
                .max()
        });
        match largest {
            None => Ok(0),
            Some(id) => id
                .checked_add(1)
                .ok_or_else(|| DocxError::Malformed("comment ids exhausted".to_string())),
        }
    }

    pub fn len(&self) -> usize {
        self.xml
            .root()
            .map(|root| root.elements().filter(|el| el.name == "w:comment").count())
            .unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn push(&mut self, comment: XmlElement) -> Result<(), DocxError> {
        let root = self
            .xml
            .root_mut()
            .ok_or_else(|| DocxError::Malformed("comments part has no root".to_string()))?;
        root.push(comment);
        Ok(())
    }

    /// Write the comments back into the package
    pub fn store(&self, doc: &mut DocxDocument) -> Result<(), DocxError> {
        let bytes = self.xml.to_bytes()?;
        doc.set_part(&self.part_name, bytes);
        Ok(())
    }
}

/// Build a `w:comment` body element
pub fn comment_element(id: u32, author: &str, initials: &str, date: &str, text: &str) -> XmlElement {
    let annotation_ref = XmlElement::new("w:r").with_child(XmlElement::new("w:annotationRef"));
    let paragraph = XmlElement::new("w:p")
        .with_child(annotation_ref)
        .with_child(text_run(text));

    XmlElement::new("w:comment")
        .with_attr("w:id", &id.to_string())
        .with_attr("w:author", author)
        .with_attr("w:date", date)
        .with_attr("w:initials", initials)
        .with_child(paragraph)
}

/// Mark a paragraph's content as the range of comment `id`: a range start after the
/// paragraph properties, a range end and a reference run at the end.
pub fn anchor_comment(paragraph: &mut XmlElement, id: u32) {
    let id = id.to_string();

    let start_pos = paragraph
        .position_of("w:pPr")
        .map(|pos| pos + 1)
        .unwrap_or(0);
    paragraph.children.insert(
        start_pos,
        XmlNode::Element(XmlElement::new("w:commentRangeStart").with_attr("w:id", &id)),
    );

    paragraph.push(XmlElement::new("w:commentRangeEnd").with_attr("w:id", &id));
    paragraph.push(
        XmlElement::new("w:r")
            .with_child(XmlElement::new("w:commentReference").with_attr("w:id", &id)),
    );
}

impl DocxDocument {
    /// Comments stored in the package, in part order. Empty if there is no comments part.
    pub fn comments(&self) -> Result<Vec<Comment>, DocxError> {
        let rels = match self.part(&self.main_rels_part()) {
            Some(bytes) => XmlDocument::parse(bytes)?,
            None => return Ok(Vec::new()),
        };
        let target = rels.root().and_then(|root| {
            root.elements()
                .filter(|el| el.name == "Relationship")
                .find(|el| el.attr("Type") == Some(COMMENTS_REL_TYPE))
                .and_then(|el| el.attr("Target"))
                .map(|t| resolve_target(self.main_part_dir(), t))
        });
        let Some(part_name) = target else {
            return Ok(Vec::new());
        };
        let Some(bytes) = self.part(&part_name) else {
            return Ok(Vec::new());
        };

        let xml = XmlDocument::parse(bytes)?;
        let comments = xml
            .root()
            .map(|root| {
                root.elements()
                    .filter(|el| el.name == "w:comment")
                    .map(|el| Comment {
                        id: el.attr("w:id").and_then(|id| id.parse().ok()).unwrap_or(0),
                        author: el.attr("w:author").unwrap_or_default().to_string(),
                        initials: el.attr("w:initials").unwrap_or_default().to_string(),
                        text: el
                            .elements()
                            .filter(|p| p.name == "w:p")
                            .map(paragraph_text)
                            .collect::<Vec<_>>()
                            .join("\n"),
                    })
                    .collect()
            })
            .unwrap_or_default();
        Ok(comments)
    }
}

fn parse_part(doc: &DocxDocument, name: &str) -> Result<XmlDocument, DocxError> {
    let bytes = doc
        .part(name)
        .ok_or_else(|| DocxError::MissingPart(name.to_string()))?;
    XmlDocument::parse(bytes)
}

/// `rIdN` one past the highest numeric relationship id in use
fn next_relationship_id(rels_root: &XmlElement) -> String {
    let max = rels_root
        .elements()
        .filter_map(|el| el.attr("Id"))
        .filter_map(|id| id.strip_prefix("rId").and_then(|n| n.parse::<u32>().ok()))
        .max()
        .unwrap_or(0);
    format!("rId{}", max + 1)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_open_or_create_registers_part_once() {
        let mut doc = DocxDocument::new_with_paragraphs(&["clause"]);

        let part = CommentsPart::open_or_create(&mut doc).unwrap();
        assert_eq!(part.part_name(), "word/comments.xml");
        assert!(part.is_empty());
        assert_eq!(part.next_free_id().unwrap(), 0);
        part.store(&mut doc).unwrap();

        // second open finds the registered part instead of adding another relationship
        let again = CommentsPart::open_or_create(&mut doc).unwrap();
        again.store(&mut doc).unwrap();

        let rels = String::from_utf8(doc.part("word/_rels/document.xml.rels").unwrap().to_vec()).unwrap();
        assert_eq!(rels.matches(COMMENTS_REL_TYPE).count(), 1);
        let types = String::from_utf8(doc.part(CONTENT_TYPES_PART).unwrap().to_vec()).unwrap();
        assert_eq!(types.matches("/word/comments.xml").count(), 1);
    }

    #[test]
    fn test_missing_relationships_part_leaves_package_untouched() {
        let mut doc = DocxDocument::new_with_paragraphs(&["clause"]);
        doc.remove_part("word/_rels/document.xml.rels");
        let types_before = doc.part(CONTENT_TYPES_PART).unwrap().to_vec();

        let result = CommentsPart::open_or_create(&mut doc);

        assert!(matches!(result, Err(DocxError::MissingPart(_))));
        assert_eq!(doc.part(CONTENT_TYPES_PART).unwrap(), types_before.as_slice());
        assert!(doc.part("word/comments.xml").is_none());
    }

    #[test]
    fn test_comment_round_trip() {
        let mut doc = DocxDocument::new_with_paragraphs(&["first", "second"]);
        let mut part = CommentsPart::open_or_create(&mut doc).unwrap();

        part.push(comment_element(
            0,
            "Corporate Agent",
            "AI",
            "2024-01-01T00:00:00Z",
            "Issue \u{2013} cite\nSuggestion: fix",
        ))
        .unwrap();
        anchor_comment(doc.paragraph_element_mut(1).unwrap(), 0);
        part.store(&mut doc).unwrap();

        let reopened = DocxDocument::from_bytes(&doc.to_bytes().unwrap()).unwrap();
        assert_eq!(reopened.comment_reference_ids(), vec![0]);
        assert_eq!(reopened.paragraphs()[1].text, "second");

        let comments = reopened.comments().unwrap();
        assert_eq!(
            comments,
            vec![Comment {
                id: 0,
                author: "Corporate Agent".to_string(),
                initials: "AI".to_string(),
                text: "Issue \u{2013} cite\nSuggestion: fix".to_string(),
            }]
        );
    }

    #[test]
    fn test_anchor_goes_after_paragraph_properties() {
        let mut paragraph = XmlElement::new("w:p")
            .with_child(XmlElement::new("w:pPr"))
            .with_child(XmlElement::new("w:r"));
        anchor_comment(&mut paragraph, 7);

        let names: Vec<&str> = paragraph.elements().map(|el| el.name.as_str()).collect();
        assert_eq!(
            names,
            vec!["w:pPr", "w:commentRangeStart", "w:r", "w:commentRangeEnd", "w:r"]
        );
        assert_eq!(paragraph.elements().nth(1).unwrap().attr("w:id"), Some("7"));
    }

    #[test]
    fn test_next_free_id_follows_existing_comments() {
        let mut doc = DocxDocument::new_with_paragraphs(&["clause"]);
        let mut part = CommentsPart::open_or_create(&mut doc).unwrap();
        part.push(comment_element(4, "Someone", "S", "2024-01-01T00:00:00Z", "old"))
            .unwrap();
        assert_eq!(part.next_free_id().unwrap(), 5);
        assert_eq!(part.len(), 1);
    }

    #[test]
    fn test_next_free_id_fails_after_largest_id() {
        let mut doc = DocxDocument::new_with_paragraphs(&["clause"]);
        let mut part = CommentsPart::open_or_create(&mut doc).unwrap();
        part.push(comment_element(u32::MAX, "Someone", "S", "2024-01-01T00:00:00Z", "old"))
            .unwrap();
        assert!(matches!(part.next_free_id(), Err(DocxError::Malformed(_))));
    }

    #[test]
    fn test_next_relationship_id_skips_used_ids() {
        let rels = XmlElement::new("Relationships")
            .with_child(XmlElement::new("Relationship").with_attr("Id", "rId1"))
            .with_child(XmlElement::new("Relationship").with_attr("Id", "rId7"))
            .with_child(XmlElement::new("Relationship").with_attr("Id", "custom"));
        assert_eq!(next_relationship_id(&rels), "rId8");
    }

    #[test]
    fn test_comments_empty_without_part() {
        let doc = DocxDocument::new_with_paragraphs(&["clause"]);
        assert!(doc.comments().unwrap().is_empty());
        assert!(doc.comment_reference_ids().is_empty());
    }
}
