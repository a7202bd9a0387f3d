//! PDF Core - Low-level PDF writing
//!
//! This crate provides functionality for:
//! - Creating blank A4 documents and appending pages
//! - The built-in Helvetica family and embedded TrueType families
//! - Inserting text at specific coordinates with alignment and colour
//! - Drawing lines and rectangles (table grids, cell backgrounds)
//!
//! # Example
//!
//! ```ignore
//! use pdf_core::{Align, PdfDocument};
//!
//! let mut doc = PdfDocument::new();
//! let page = doc.add_blank_page()?;
//! doc.set_font("helvetica", 12.0)?;
//! doc.insert_text("Hello, World!", page, 100.0, 100.0, Align::Left)?;
//! doc.save("output.pdf")?;
//! ```

mod document;
mod font;
mod text;

pub use document::{Color, PdfDocument, A4_HEIGHT, A4_WIDTH, DEFAULT_FAMILY};
pub use font::{BuiltinFont, FontData, FontFamily, FontFamilyBuilder, FontStyle, FontWeight};
pub use text::{
    generate_line_operators, generate_rect_operators, generate_text_operators, wrap_text,
    RectPaint, TextRenderContext,
};

use thiserror::Error;

/// Points per millimetre
pub const MM: f64 = 72.0 / 25.4;

/// Points per inch
pub const INCH: f64 = 72.0;

/// Errors that can occur during PDF operations
#[derive(Debug, Error)]
pub enum PdfError {
    #[error("Failed to save PDF: {0}")]
    SaveError(String),

    #[error("Font not found: {0}")]
    FontNotFound(String),

    #[error("Font already exists: {0}")]
    FontAlreadyExists(String),

    #[error("Failed to parse font: {0}")]
    FontParseError(String),

    #[error("Invalid page number: {0} (document has {1} pages)")]
    InvalidPage(usize, usize),

    #[error("PDF structure error: {0}")]
    ParseError(String),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Lopdf error: {0}")]
    LopdfError(#[from] lopdf::Error),
}

/// Result type for PDF operations
pub type Result<T> = std::result::Result<T, PdfError>;

/// Text alignment options
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Align {
    #[default]
    Left,
    Center,
    Right,
}
