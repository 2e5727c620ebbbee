use std::fs;
use std::path::Path;

use thiserror::Error;

use docgenius_core::MediaType;

mod export;

pub use export::render_download;

const PDF_PLACEHOLDER: &str = "This is extracted text from a PDF file. In a real implementation, this would contain the actual text content extracted from the PDF using a library like pdf-parse.";
const DOCX_PLACEHOLDER: &str = "This is extracted text from a DOCX file. In a real implementation, this would contain the actual text content extracted from the Word document using a library like mammoth.";
const PPT_PLACEHOLDER: &str = "This is extracted text from a PowerPoint presentation. In a real implementation, this would contain the actual text content extracted from the slides.";

#[derive(Debug, Error)]
pub enum ExtractError {
    #[error("unsupported file type: {0}")]
    UnsupportedType(String),
    #[error("failed to read document: {0}")]
    Io(#[from] std::io::Error),
}

pub trait TextExtractor: Send + Sync {
    fn extract(&self, path: &Path, media_type: &str) -> Result<String, ExtractError>;
}

#[derive(Debug, Default, Clone, Copy)]
pub struct DocumentExtractor;

impl TextExtractor for DocumentExtractor {
    fn extract(&self, path: &Path, media_type: &str) -> Result<String, ExtractError> {
        let media = MediaType::from_mime(media_type)
            .ok_or_else(|| ExtractError::UnsupportedType(media_type.to_string()))?;
        match media {
            MediaType::Text => Ok(fs::read_to_string(path)?),
            // Binary formats are stubbed until real parsers are wired in.
            MediaType::Pdf => Ok(PDF_PLACEHOLDER.to_string()),
            MediaType::Doc | MediaType::Docx => Ok(DOCX_PLACEHOLDER.to_string()),
            MediaType::Ppt | MediaType::Pptx => Ok(PPT_PLACEHOLDER.to_string()),
        }
    }
}
