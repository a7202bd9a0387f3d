//! autopdf - fill a form, get a PDF
//!
//! Three document families are supported: a general agreement produced from a
//! word template with `{{field}}` placeholders, and AD / Promo invoices laid
//! out directly from line-item text.
//!
//! This crate provides:
//! - The per-template field schema and validation
//! - The configuration/history store and the company address book
//! - The generation pipeline and its submission log
//!
//! # Example
//!
//! ```ignore
//! use autopdf::{FormData, GenerationRequest, Generator, TemplateKind};
//!
//! let mut generator = Generator::open(".");
//! let mut form = FormData::new(TemplateKind::InvoiceAd);
//! form.set("invoice_my_address", "Room 1, 2 Main St, Hong Kong");
//! form.set("invoice_address", "Acme Ltd, 5 Market Road, London");
//! form.set("invoice_no", "INV-001");
//! form.set("invoice_date", "2024-01-15");
//! form.set("table_data", "Widget,A1,10.00,3\nWidget,A1,20.00,2");
//!
//! let outcome = generator.generate(GenerationRequest {
//!     form,
//!     company: Some("香港公司".into()),
//!     bank: None,
//! })?;
//! println!("{}", outcome.pdf_path.display());
//! ```

pub mod address_book;
pub mod config;
pub mod form;
pub mod pipeline;
pub mod schema;
pub mod submission_log;
pub mod validate;

pub use address_book::AddressBook;
pub use config::{recent_display_name, ConfigError, ConfigStore};
pub use form::FormData;
pub use pipeline::{
    Clock, FixedClock, GenerateError, GenerationOutcome, GenerationRequest, Generator,
    SystemClock, Workspace,
};
pub use schema::{FieldSpec, InputKind, Rule, TemplateKind};
pub use submission_log::SubmissionLog;
pub use validate::{validate, ValidationError};
