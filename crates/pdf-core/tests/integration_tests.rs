//! Integration tests for pdf-core
//!
//! Documents are built, serialized, and reloaded with lopdf to check the output.

use pdf_core::{Align, Color, FontWeight, PdfDocument, PdfError, A4_HEIGHT};

fn reload(doc: &mut PdfDocument) -> lopdf::Document {
    let bytes = doc.to_bytes().expect("serialize");
    lopdf::Document::load_mem(&bytes).expect("reload")
}

fn page_text(doc: &lopdf::Document, page: u32) -> String {
    let pages = doc.get_pages();
    let page_id = pages[&page];
    let content = doc.get_page_content(page_id).expect("page content");
    String::from_utf8_lossy(&content).into_owned()
}

/// BaseFont names of every font dictionary in the file, sorted
fn font_names(doc: &lopdf::Document) -> Vec<String> {
    let mut names: Vec<String> = doc
        .objects
        .values()
        .filter_map(|object| object.as_dict().ok())
        .filter(|dict| {
            dict.get(b"Type")
                .and_then(|t| t.as_name())
                .map(|t| t == b"Font")
                .unwrap_or(false)
        })
        .filter_map(|dict| dict.get(b"BaseFont").and_then(|n| n.as_name()).ok())
        .map(|name| String::from_utf8_lossy(name).into_owned())
        .collect();
    names.sort();
    names
}

#[test]
fn test_empty_page_roundtrip() {
    let mut doc = PdfDocument::new();
    doc.add_blank_page().unwrap();

    let loaded = reload(&mut doc);
    assert_eq!(loaded.get_pages().len(), 1);
}

#[test]
fn test_insert_text_positions_from_top() {
    let mut doc = PdfDocument::new();
    let page = doc.add_blank_page().unwrap();
    doc.set_font("helvetica", 12.0).unwrap();
    doc.insert_text("Invoice", page, 100.0, 100.0, Align::Left)
        .unwrap();

    let loaded = reload(&mut doc);
    let content = page_text(&loaded, 1);

    let expected_y = format!("{:.2}", A4_HEIGHT - 100.0);
    let expected_y = expected_y.trim_end_matches('0').trim_end_matches('.');
    assert!(content.contains("(Invoice) Tj"), "content was: {content}");
    assert!(content.contains(&format!("100 {expected_y} Td")));
    assert!(content.contains("/F1 12 Tf"));
}

#[test]
fn test_fonts_land_in_page_resources() {
    let mut doc = PdfDocument::new();
    let page = doc.add_blank_page().unwrap();
    doc.insert_text("Regular", page, 10.0, 50.0, Align::Left)
        .unwrap();
    doc.set_font_weight(FontWeight::Bold);
    doc.insert_text("Bold", page, 10.0, 70.0, Align::Left).unwrap();

    let loaded = reload(&mut doc);
    assert_eq!(font_names(&loaded), vec!["Helvetica", "Helvetica-Bold"]);
}

#[test]
fn test_multiple_pages_keep_separate_content() {
    let mut doc = PdfDocument::new();
    let first = doc.add_blank_page().unwrap();
    let second = doc.add_blank_page().unwrap();
    doc.insert_text("First", first, 10.0, 10.0, Align::Left)
        .unwrap();
    doc.insert_text("Second", second, 10.0, 10.0, Align::Left)
        .unwrap();

    let loaded = reload(&mut doc);
    assert_eq!(loaded.get_pages().len(), 2);
    assert!(page_text(&loaded, 1).contains("(First) Tj"));
    assert!(!page_text(&loaded, 1).contains("(Second) Tj"));
    assert!(page_text(&loaded, 2).contains("(Second) Tj"));
}

#[test]
fn test_graphics_operators() {
    let mut doc = PdfDocument::new();
    let page = doc.add_blank_page().unwrap();
    doc.fill_rect(page, 10.0, 10.0, 100.0, 20.0, Color::rgb(0.9, 0.9, 0.95))
        .unwrap();
    doc.stroke_rect(page, 10.0, 10.0, 100.0, 20.0, 0.5, Color::gray(0.5))
        .unwrap();
    doc.draw_line(page, 0.0, 0.0, 50.0, 0.0, 1.0, Color::black())
        .unwrap();

    let loaded = reload(&mut doc);
    let content = page_text(&loaded, 1);
    assert!(content.contains(" re"));
    assert!(content.contains("0.9 0.9 0.95 rg"));
    assert!(content.contains("0.5 0.5 0.5 RG"));
}

#[test]
fn test_saving_twice_is_stable() {
    let mut doc = PdfDocument::new();
    let page = doc.add_blank_page().unwrap();
    doc.insert_text("Hello", page, 10.0, 10.0, Align::Left)
        .unwrap();

    doc.to_bytes().unwrap();
    let loaded = reload(&mut doc);
    assert_eq!(loaded.get_pages().len(), 1);
    assert_eq!(font_names(&loaded), vec!["Helvetica"]);
}

#[test]
fn test_save_to_file() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("out.pdf");

    let mut doc = PdfDocument::new();
    doc.add_blank_page().unwrap();
    doc.save(&path).unwrap();

    let loaded = lopdf::Document::load(&path).unwrap();
    assert_eq!(loaded.get_pages().len(), 1);
}

#[test]
fn test_invalid_page_error() {
    let mut doc = PdfDocument::new();
    let result = doc.fill_rect(1, 0.0, 0.0, 1.0, 1.0, Color::black());
    assert!(matches!(result, Err(PdfError::InvalidPage(1, 0))));
}
