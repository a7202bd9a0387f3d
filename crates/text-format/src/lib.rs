//! Text Format - small formatting helpers shared by the document generators
//!
//! This crate provides:
//! - Long English date formatting from loosely formatted input dates
//! - Money formatting (`70.00`, `USD 70.00`) and day counts (`3 days`)
//! - Title casing of `snake_case` record keys (`swift_code` -> `Swift Code`)
//! - Path-safe output file name components
//!
//! # Example
//!
//! ```
//! use text_format::{format_english_date, format_usd};
//! use rust_decimal::Decimal;
//!
//! assert_eq!(format_english_date("2023-10-01"), "October 01, 2023");
//! assert_eq!(format_usd(Decimal::new(7000, 2)), "USD 70.00");
//! ```

mod date;
mod filename;
mod formatter;

pub use date::{format_english_date, parse_input_date, INPUT_DATE_FORMATS};
pub use filename::{file_prefix, sanitize_file_component, template_base_name, MAX_COMPONENT_CHARS};
pub use formatter::{format_days, format_money, format_usd, title_case_key};
