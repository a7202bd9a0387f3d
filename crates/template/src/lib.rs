//! Template Engine - `{{placeholder}}` substitution in word-processing documents
//!
//! This crate provides:
//! - A rich paragraph model: ordered `(text, style)` segments
//! - Segment-splice placeholder substitution that keeps the formatting of
//!   untouched text and underlines substituted values
//! - Reading and rewriting `.docx` packages, touching only the paragraphs
//!   that actually contained a placeholder
//! - Laying out rich paragraphs as PDF pages
//!
//! # Example
//!
//! ```ignore
//! use std::collections::BTreeMap;
//! use template::{DocxTemplate, ParagraphRenderer, SubstitutionOptions};
//!
//! let mut values = BTreeMap::new();
//! values.insert("seller_name".to_string(), "Acme".to_string());
//!
//! let mut docx = DocxTemplate::open("templates/General_Agreement_Template.docx")?;
//! let report = docx.fill(&values, &SubstitutionOptions::default())?;
//! docx.save("output/Acme-General_Agreement_filled.docx")?;
//!
//! let pdf_bytes = ParagraphRenderer::new().render(&docx.paragraphs())?;
//! ```

mod docx;
mod paragraph;
mod renderer;
mod substitute;

pub use docx::{DocxTemplate, FillReport, DOCUMENT_PART};
pub use paragraph::{ParagraphAlign, RichParagraph, RunStyle, Segment};
pub use renderer::{PageLayout, ParagraphRenderer};
pub use substitute::{
    find_placeholders, substitute_paragraph, PlaceholderMatch, SubstitutedRange,
    Substitution, SubstitutionOptions, DEFAULT_EXEMPT_KEY,
};

use std::path::PathBuf;
use thiserror::Error;

/// Errors that can occur during template processing
#[derive(Debug, Error)]
pub enum TemplateError {
    #[error("Template not found: {}", .0.display())]
    NotFound(PathBuf),

    #[error("Template is missing part: {0}")]
    MissingPart(String),

    #[error("Failed to parse document XML: {0}")]
    XmlError(String),

    #[error("Invalid template package: {0}")]
    ZipError(#[from] zip::result::ZipError),

    #[error("PDF error: {0}")]
    PdfError(#[from] pdf_core::PdfError),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),
}

/// Result type for template operations
pub type Result<T> = std::result::Result<T, TemplateError>;
