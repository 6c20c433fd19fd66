//! Shared DOCX handling utilities
//!
//! This crate provides the word-processor package layer used across the workspace:
//! opening a `.docx` package, exposing its body paragraphs as plain text, appending
//! paragraphs, registering a comments part and writing the package back out.
//!
//! Only the parts that are touched get re-serialized; every other part of the
//! package is copied through byte-for-byte.

pub mod comments;
pub mod error;
pub mod package;
pub mod xml;

pub use comments::{Comment, CommentsPart};
pub use error::DocxError;
pub use package::{DocxDocument, Paragraph};
pub use xml::{XmlDocument, XmlElement, XmlNode};
