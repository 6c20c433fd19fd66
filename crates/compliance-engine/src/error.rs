use std::path::PathBuf;

use shared_docx::DocxError;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ReviewError {
    #[error("Cannot read document {path}: {source}")]
    Unreadable {
        path: PathBuf,
        #[source]
        source: DocxError,
    },

    #[error("Document error: {0}")]
    Docx(#[from] DocxError),

    #[error("Refusing to overwrite the source document {0}")]
    DestinationIsSource(PathBuf),
}
