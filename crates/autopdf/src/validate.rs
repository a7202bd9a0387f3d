//! Form validation, run before any file is touched

use crate::form::FormData;
use crate::schema::{Rule, TemplateKind};
use regex::Regex;
use std::sync::OnceLock;
use thiserror::Error;

/// Why a form cannot be used to generate a document
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ValidationError {
    #[error("Please fill in all fields: '{0}' is empty")]
    MissingField(String),

    #[error("Invalid email address: {0}")]
    InvalidEmail(String),

    #[error("Link #{index} must start with http:// or https://: {url}")]
    InvalidUrl { index: usize, url: String },

    #[error("Unknown template: {0}")]
    UnknownTemplate(String),
}

fn email_regex() -> &'static Regex {
    static EMAIL: OnceLock<Regex> = OnceLock::new();
    EMAIL.get_or_init(|| {
        Regex::new(r"^[a-zA-Z0-9_.+-]+@[a-zA-Z0-9-]+\.[a-zA-Z0-9-.]+$")
            .expect("email pattern compiles")
    })
}

fn url_regex() -> &'static Regex {
    static URL: OnceLock<Regex> = OnceLock::new();
    URL.get_or_init(|| Regex::new(r"^https?://").expect("url pattern compiles"))
}

pub fn is_valid_email(value: &str) -> bool {
    email_regex().is_match(value)
}

/// Check each comma-separated link; `index` in the error is 1-based
pub fn check_url_list(value: &str) -> Result<(), ValidationError> {
    for (i, url) in value.split(',').enumerate() {
        if !url_regex().is_match(url.trim()) {
            return Err(ValidationError::InvalidUrl {
                index: i + 1,
                url: url.to_string(),
            });
        }
    }
    Ok(())
}

/// Validate a form against its template's field list
///
/// Every field must be present and non-blank; then the email and link rules
/// are applied in field order.
pub fn validate(kind: TemplateKind, form: &FormData) -> Result<(), ValidationError> {
    for field in kind.fields() {
        if form.get(field.name).map_or(true, |v| v.trim().is_empty()) {
            return Err(ValidationError::MissingField(field.name.to_string()));
        }
    }

    for field in kind.fields() {
        let value = form.get(field.name).unwrap_or_default();
        match field.rule {
            Rule::None => {}
            Rule::Email => {
                if !is_valid_email(value) {
                    return Err(ValidationError::InvalidEmail(value.to_string()));
                }
            }
            Rule::UrlList => check_url_list(value)?,
        }
    }

    Ok(())
}
