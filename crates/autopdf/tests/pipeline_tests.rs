//! End-to-end generation against a temporary workspace

use autopdf::{
    ConfigStore, FixedClock, FormData, GenerateError, GenerationRequest, Generator, TemplateKind,
    ValidationError, Workspace,
};
use chrono::{NaiveDate, NaiveDateTime};
use pretty_assertions::assert_eq;
use rust_decimal::Decimal;
use std::io::{Cursor, Read, Write};
use std::path::Path;
use template::TemplateError;
use zip::write::SimpleFileOptions;

const AGREEMENT_XML: &str = r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<w:document xmlns:w="http://schemas.openxmlformats.org/wordprocessingml/2006/main"><w:body><w:p><w:r><w:rPr><w:b/></w:rPr><w:t>General Agreement</w:t></w:r></w:p><w:p><w:r><w:t xml:space="preserve">Between {{business_name}} and {{seller_</w:t></w:r><w:r><w:t>name}}</w:t></w:r></w:p><w:p><w:r><w:t xml:space="preserve">Contact: {{seller_email}}</w:t></w:r></w:p><w:sectPr/></w:body></w:document>"#;

fn morning() -> NaiveDateTime {
    NaiveDate::from_ymd_opt(2024, 1, 15)
        .and_then(|d| d.and_hms_opt(9, 30, 0))
        .unwrap()
}

fn generator(dir: &Path) -> Generator<FixedClock> {
    Generator::with_clock(dir, FixedClock(morning()))
}

fn ad_form() -> FormData {
    let mut form = FormData::new(TemplateKind::InvoiceAd);
    form.set("invoice_my_address", "Room 1, 2 Main St, Hong Kong");
    form.set("invoice_address", "Acme Ltd, 5 Market Road, London");
    form.set("invoice_no", "INV-001");
    form.set("invoice_date", "2024-01-15");
    form.set(
        "table_data",
        "Widget,A1,10.00,3\nWidget,A1,20.00,2\nbroken line",
    );
    form
}

fn agreement_form() -> FormData {
    let mut form = FormData::new(TemplateKind::GeneralAgreement);
    form.set("business_name", "香港公司: Number Seven Trading Limited");
    form.set("agreement_date", "2024-01-15");
    form.set("seller_name", "Acme");
    form.set("seller_email", "sales@acme.com");
    form.set("store_link", "https://acme.example, https://shop.acme.example");
    form
}

fn write_agreement_template(dir: &Path) {
    let mut zip = zip::ZipWriter::new(Cursor::new(Vec::new()));
    let options = SimpleFileOptions::default();
    zip.start_file("[Content_Types].xml", options).unwrap();
    zip.write_all(b"<?xml version=\"1.0\"?><Types/>").unwrap();
    zip.start_file(template::DOCUMENT_PART, options).unwrap();
    zip.write_all(AGREEMENT_XML.as_bytes()).unwrap();
    let bytes = zip.finish().unwrap().into_inner();

    let templates = Workspace::new(dir).templates_dir();
    std::fs::create_dir_all(&templates).unwrap();
    std::fs::write(
        templates.join(TemplateKind::GeneralAgreement.file_name()),
        bytes,
    )
    .unwrap();
}

fn read_document_xml(docx: &Path) -> String {
    let file = std::fs::File::open(docx).unwrap();
    let mut archive = zip::ZipArchive::new(file).unwrap();
    let mut part = archive.by_name(template::DOCUMENT_PART).unwrap();
    let mut xml = String::new();
    part.read_to_string(&mut xml).unwrap();
    xml
}

#[test]
fn test_invoice_generation() {
    let dir = tempfile::tempdir().unwrap();
    let mut generator = generator(dir.path());

    let outcome = generator
        .generate(GenerationRequest {
            form: ad_form(),
            company: Some("公司1".into()),
            bank: None,
        })
        .unwrap();

    let expected = dir
        .path()
        .join("output")
        .join("20240115")
        .join("Invoice_AD_20240115_093000.pdf");
    assert_eq!(outcome.pdf_path, expected);
    assert!(expected.exists());
    assert_eq!(outcome.docx_path, None);
    assert_eq!(outcome.total, Some(Decimal::new(7000, 2)));
    assert_eq!(outcome.skipped_rows, 1);

    let pdf = lopdf::Document::load(&expected).unwrap();
    assert_eq!(pdf.get_pages().len(), 1);
}

#[test]
fn test_invoice_generation_logs_and_remembers() {
    let dir = tempfile::tempdir().unwrap();
    let mut generator = generator(dir.path());
    let outcome = generator
        .generate(GenerationRequest {
            form: ad_form(),
            ..Default::default()
        })
        .unwrap();

    let log = std::fs::read_to_string(dir.path().join("logs").join("submission_log.txt")).unwrap();
    assert_eq!(log.lines().count(), 1);
    assert!(log.starts_with("[2024-01-15 09:30:00] Generated file: "));
    assert!(log.contains("\"template_type\":\"Invoice_AD_Template.docx\""));
    assert!(log.contains("\"amount\":\"70.00\""));
    assert!(log.contains("\"bank_info\":{\"account_name\":"));

    let config = ConfigStore::load(Workspace::new(dir.path()).config_path());
    assert_eq!(config.recent_files(), vec![outcome.pdf_path]);
    assert_eq!(
        config
            .recent_inputs("Invoice_AD_Template.docx")
            .and_then(|form| form.get("invoice_no")),
        Some("INV-001")
    );
}

#[test]
fn test_validation_error_writes_nothing() {
    let dir = tempfile::tempdir().unwrap();
    let mut generator = generator(dir.path());

    let mut form = ad_form();
    form.set("invoice_no", "   ");
    let err = generator
        .generate(GenerationRequest {
            form,
            ..Default::default()
        })
        .unwrap_err();

    assert!(matches!(
        err,
        GenerateError::Validation(ValidationError::MissingField(ref field)) if field == "invoice_no"
    ));
    assert!(!dir.path().join("output").exists());
    assert!(!dir.path().join("logs").exists());
    assert!(!dir.path().join("config.json").exists());
}

#[test]
fn test_invalid_email_is_rejected() {
    let dir = tempfile::tempdir().unwrap();
    let mut form = agreement_form();
    form.set("seller_email", "not-an-email");

    let err = generator(dir.path())
        .generate(GenerationRequest {
            form,
            ..Default::default()
        })
        .unwrap_err();
    assert!(matches!(
        err,
        GenerateError::Validation(ValidationError::InvalidEmail(_))
    ));
}

#[test]
fn test_missing_template_is_reported() {
    let dir = tempfile::tempdir().unwrap();
    let err = generator(dir.path())
        .generate(GenerationRequest {
            form: agreement_form(),
            ..Default::default()
        })
        .unwrap_err();

    assert!(matches!(err, GenerateError::Template(TemplateError::NotFound(_))));
}

#[test]
fn test_agreement_generation() {
    let dir = tempfile::tempdir().unwrap();
    write_agreement_template(dir.path());

    let outcome = generator(dir.path())
        .generate(GenerationRequest {
            form: agreement_form(),
            ..Default::default()
        })
        .unwrap();

    let day_dir = dir.path().join("output").join("20240115");
    assert_eq!(
        outcome.pdf_path,
        day_dir.join("Acme-General_Agreement_20240115_093000.pdf")
    );
    let docx_path = day_dir.join("Acme-General_Agreement_20240115_093000_filled.docx");
    assert_eq!(outcome.docx_path.as_deref(), Some(docx_path.as_path()));
    assert!(outcome.pdf_path.exists());

    let report = outcome.fill_report.unwrap();
    assert_eq!(report.changed_paragraphs, 2);
    assert_eq!(
        report.substituted_keys,
        vec!["business_name", "seller_name", "seller_email"]
    );

    let xml = read_document_xml(&docx_path);
    assert!(xml.contains("Number Seven Trading Limited"));
    assert!(!xml.contains("香港公司"));
    assert!(!xml.contains("{{"));

    let config = ConfigStore::load(Workspace::new(dir.path()).config_path());
    assert_eq!(
        config.common_values("store_link").to_vec(),
        vec![
            "https://shop.acme.example".to_string(),
            "https://acme.example".to_string()
        ]
    );
}
