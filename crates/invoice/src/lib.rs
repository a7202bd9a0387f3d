//! Invoice - priced line-item tables and invoice PDFs
//!
//! This crate provides:
//! - Parsing free-text line items (`description, asin, ...`) for the AD and
//!   Promo invoice variants, with per-row and total amounts
//! - Planning vertical merges for contiguous repeated values
//! - Composing the invoice document: addresses, priced table, bank details
//!   and remarks
//!
//! # Example
//!
//! ```
//! use invoice::{PricedTable, Variant};
//!
//! let table = PricedTable::parse("Widget,A1,10.00,3\nWidget,A1,20.00,2", Variant::Ad);
//! assert_eq!(table.total_display(), "USD 70.00");
//! ```

mod bank;
mod composer;
mod line_items;
mod merge;

pub use bank::BankDetails;
pub use composer::{
    address_lines, InvoiceComposer, InvoiceDetails, InvoiceTexts, CHINESE_TEXTS, ENGLISH_TEXTS,
    TITLE,
};
pub use line_items::{LineItem, LineItemError, PricedTable, SkippedRow, Variant, MIN_FIELDS};
pub use merge::{plan_spans, CellSpan, ColumnGroups, MergeInfo, RowSpan};

use thiserror::Error;

/// Errors that can occur while producing an invoice
#[derive(Debug, Error)]
pub enum InvoiceError {
    #[error("PDF error: {0}")]
    PdfError(#[from] pdf_core::PdfError),
}

/// Result type for invoice operations
pub type Result<T> = std::result::Result<T, InvoiceError>;
