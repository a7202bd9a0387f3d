//! The generation pipeline
//!
//! One request runs strictly in order: validate, remember inputs, produce the
//! document (fill and render a word template, or price and compose an
//! invoice), append the submission log, register the PDF as recent.

use crate::address_book::{AddressBook, ADDRESS_FILE};
use crate::config::{ConfigStore, CONFIG_FILE};
use crate::form::FormData;
use crate::schema::{TemplateKind, SUGGEST_FIELDS};
use crate::submission_log::SubmissionLog;
use crate::validate::{validate, ValidationError};
use chrono::NaiveDateTime;
use invoice::{InvoiceComposer, InvoiceDetails, InvoiceError, PricedTable, Variant};
use rust_decimal::Decimal;
use serde_json::Value;
use std::path::{Path, PathBuf};
use template::{DocxTemplate, FillReport, ParagraphRenderer, SubstitutionOptions, TemplateError};
use text_format::{file_prefix, format_money};
use thiserror::Error;

pub const TEMPLATES_DIR: &str = "templates";
pub const OUTPUT_DIR: &str = "output";

#[derive(Debug, Error)]
pub enum GenerateError {
    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error(transparent)]
    Template(#[from] TemplateError),

    #[error("Invoice error: {0}")]
    Invoice(#[from] InvoiceError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Source of the timestamp used in output names and the log
pub trait Clock {
    fn now(&self) -> NaiveDateTime;
}

/// Local wall-clock time
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> NaiveDateTime {
        chrono::Local::now().naive_local()
    }
}

/// Always returns the same instant
#[derive(Debug, Clone, Copy)]
pub struct FixedClock(pub NaiveDateTime);

impl Clock for FixedClock {
    fn now(&self) -> NaiveDateTime {
        self.0
    }
}

/// Directory layout under one base directory
#[derive(Debug, Clone)]
pub struct Workspace {
    base_dir: PathBuf,
}

impl Workspace {
    pub fn new<P: AsRef<Path>>(base_dir: P) -> Self {
        Self {
            base_dir: base_dir.as_ref().to_path_buf(),
        }
    }

    pub fn base_dir(&self) -> &Path {
        &self.base_dir
    }

    pub fn templates_dir(&self) -> PathBuf {
        self.base_dir.join(TEMPLATES_DIR)
    }

    pub fn output_dir(&self) -> PathBuf {
        self.base_dir.join(OUTPUT_DIR)
    }

    pub fn config_path(&self) -> PathBuf {
        self.base_dir.join(CONFIG_FILE)
    }

    pub fn address_path(&self) -> PathBuf {
        self.base_dir.join(ADDRESS_FILE)
    }

    /// Create the address file, `templates/` and `output/` when missing
    pub fn init(&self) -> std::io::Result<()> {
        std::fs::create_dir_all(self.templates_dir())?;
        std::fs::create_dir_all(self.output_dir())?;
        let address = self.address_path();
        if !address.exists() {
            crate::address_book::write_default(&address)?;
            log::info!("created {}", address.display());
        }
        Ok(())
    }
}

/// One generation request
#[derive(Debug, Clone, Default)]
pub struct GenerationRequest {
    pub form: FormData,
    /// Issuing company, used to pick its bank record (invoices)
    pub company: Option<String>,
    /// Explicit bank record name (invoices)
    pub bank: Option<String>,
}

/// What a successful generation produced
#[derive(Debug, Clone, PartialEq)]
pub struct GenerationOutcome {
    pub pdf_path: PathBuf,
    /// Filled word document (word-template family only)
    pub docx_path: Option<PathBuf>,
    pub fill_report: Option<FillReport>,
    /// Invoice total (invoice families only)
    pub total: Option<Decimal>,
    /// Line-item rows that could not be parsed
    pub skipped_rows: usize,
}

pub struct Generator<C: Clock = SystemClock> {
    workspace: Workspace,
    config: ConfigStore,
    address_book: AddressBook,
    clock: C,
    font_data: Option<Vec<u8>>,
}

impl Generator<SystemClock> {
    /// Load configuration and the address book from `base_dir`
    pub fn open<P: AsRef<Path>>(base_dir: P) -> Self {
        Self::with_clock(base_dir, SystemClock)
    }
}

impl<C: Clock> Generator<C> {
    pub fn with_clock<P: AsRef<Path>>(base_dir: P, clock: C) -> Self {
        let workspace = Workspace::new(base_dir);
        let config = ConfigStore::load(workspace.config_path());
        let address_book = AddressBook::load_or_create(workspace.address_path());

        let font_data = config.pdf_font().and_then(|path| match std::fs::read(&path) {
            Ok(data) => Some(data),
            Err(e) => {
                log::warn!("cannot read font {}: {}", path.display(), e);
                None
            }
        });

        Self {
            workspace,
            config,
            address_book,
            clock,
            font_data,
        }
    }

    pub fn workspace(&self) -> &Workspace {
        &self.workspace
    }

    pub fn config(&self) -> &ConfigStore {
        &self.config
    }

    pub fn address_book(&self) -> &AddressBook {
        &self.address_book
    }

    /// Use a TrueType font for all PDF text
    pub fn set_font_data(&mut self, data: Vec<u8>) {
        self.font_data = Some(data);
    }

    /// Run one request to completion
    pub fn generate(
        &mut self,
        request: GenerationRequest,
    ) -> Result<GenerationOutcome, GenerateError> {
        let GenerationRequest {
            mut form,
            company,
            bank,
        } = request;

        let kind = form.kind()?;
        form.normalize_business_name();
        validate(kind, &form)?;

        self.remember_inputs(kind, &form);

        let now = self.clock.now();
        let output_dir = self
            .workspace
            .output_dir()
            .join(now.format("%Y%m%d").to_string());
        let prefix = file_prefix(
            form.get("seller_name"),
            &kind.base_name(),
            &now.format("%Y%m%d_%H%M%S").to_string(),
        );
        let mut log_data = form.to_json();

        let outcome = match kind.variant() {
            None => self.generate_from_template(kind, &form, &output_dir, &prefix)?,
            Some(variant) => {
                let (outcome, bank_info) = self.generate_invoice(
                    variant,
                    &form,
                    company.as_deref(),
                    bank.as_deref(),
                    &output_dir,
                    &prefix,
                )?;
                if let Some(total) = outcome.total {
                    log_data.insert("amount".to_string(), Value::String(format_money(total)));
                }
                log_data.insert("bank_info".to_string(), Value::Object(bank_info));
                outcome
            }
        };

        let log = SubmissionLog::in_dir(self.workspace.base_dir());
        if let Err(e) = log.append(now, &outcome.pdf_path, &log_data) {
            log::warn!("cannot write {}: {}", log.path().display(), e);
        }
        if let Err(e) = self.config.add_recent_file(&outcome.pdf_path) {
            log::warn!("cannot save recent files: {}", e);
        }

        log::info!("PDF generated at {}", outcome.pdf_path.display());
        Ok(outcome)
    }

    fn remember_inputs(&mut self, kind: TemplateKind, form: &FormData) {
        if let Err(e) = self.config.update_recent_inputs(kind.file_name(), form) {
            log::warn!("cannot save recent inputs: {}", e);
        }
        for field in SUGGEST_FIELDS {
            if let Some(value) = form.get(field) {
                if let Err(e) = self.config.update_common_values(field, value) {
                    log::warn!("cannot save common values: {}", e);
                }
            }
        }
    }

    fn generate_from_template(
        &self,
        kind: TemplateKind,
        form: &FormData,
        output_dir: &Path,
        prefix: &str,
    ) -> Result<GenerationOutcome, GenerateError> {
        let template_path = self.workspace.templates_dir().join(kind.file_name());
        let mut docx = DocxTemplate::open(&template_path)?;
        let report = docx.fill(&form.substitution_values(), &SubstitutionOptions::default())?;

        std::fs::create_dir_all(output_dir)?;
        let docx_path = output_dir.join(format!("{prefix}_filled.docx"));
        docx.save(&docx_path)?;

        let pdf_path = output_dir.join(format!("{prefix}.pdf"));
        let mut renderer = ParagraphRenderer::new();
        if let Some(data) = &self.font_data {
            renderer = renderer.with_font_data(data.clone());
        }
        renderer.save(&docx.paragraphs(), &pdf_path)?;

        Ok(GenerationOutcome {
            pdf_path,
            docx_path: Some(docx_path),
            fill_report: Some(report),
            total: None,
            skipped_rows: 0,
        })
    }

    fn generate_invoice(
        &self,
        variant: Variant,
        form: &FormData,
        company: Option<&str>,
        bank: Option<&str>,
        output_dir: &Path,
        prefix: &str,
    ) -> Result<(GenerationOutcome, serde_json::Map<String, Value>), GenerateError> {
        let table = PricedTable::parse(form.get("table_data").unwrap_or_default(), variant);
        let bank = self.address_book.select_bank(company, bank);

        let details = InvoiceDetails {
            from_address: form.get("invoice_my_address").unwrap_or_default().to_string(),
            to_address: form.get("invoice_address").unwrap_or_default().to_string(),
            invoice_no: form.get("invoice_no").unwrap_or_default().to_string(),
            invoice_date: form.get("invoice_date").unwrap_or_default().to_string(),
            bank,
        };

        std::fs::create_dir_all(output_dir)?;
        let pdf_path = output_dir.join(format!("{prefix}.pdf"));
        let mut composer = InvoiceComposer::new();
        if let Some(data) = &self.font_data {
            composer = composer.with_font_data(data.clone());
        }
        composer.save(&details, &table, &pdf_path)?;

        Ok((
            GenerationOutcome {
                pdf_path,
                docx_path: None,
                fill_report: None,
                total: Some(table.total),
                skipped_rows: table.skipped.len(),
            },
            details.bank.to_json(),
        ))
    }
}
