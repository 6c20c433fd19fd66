use thiserror::Error;

#[derive(Error, Debug)]
pub enum DocxError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Invalid document package: {0}")]
    Zip(#[from] zip::result::ZipError),

    #[error("XML error: {0}")]
    Xml(String),

    #[error("Missing package part: {0}")]
    MissingPart(String),

    #[error("Malformed document: {0}")]
    Malformed(String),
}

pub(crate) fn xml_err<E: std::fmt::Display>(err: E) -> DocxError {
    DocxError::Xml(err.to_string())
}
