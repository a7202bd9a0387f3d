//! Invoice PDF composition
//!
//! Fixed order: title, from/to addresses beside the invoice number and date,
//! the priced table with merged cells, bank information, remarks. Content
//! flows onto new A4 pages when it runs past the bottom margin.

use crate::bank::BankDetails;
use crate::line_items::PricedTable;
use crate::merge::CellSpan;
use crate::Result;
use pdf_core::{
    wrap_text, Align, Color, FontFamilyBuilder, FontWeight, PdfDocument, DEFAULT_FAMILY, INCH, MM,
};
use std::path::Path;
use text_format::format_english_date;

pub const TITLE: &str = "Invoice";

/// Fixed wording of the bank and remarks blocks
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct InvoiceTexts {
    pub bank_title: &'static str,
    pub bank_notice: &'static str,
    pub remarks_title: &'static str,
    pub remark: &'static str,
}

/// Printed with an embedded font
pub const CHINESE_TEXTS: InvoiceTexts = InvoiceTexts {
    bank_title: "Bank Info: 美元账户",
    bank_notice: "(接受银行转账,及第三方如PingPong,空中云汇,万里汇等转账.)",
    remarks_title: "备注:",
    remark: "我司不承担任何手续费",
};

/// Printed with the built-in Helvetica, which has no CJK glyphs
pub const ENGLISH_TEXTS: InvoiceTexts = InvoiceTexts {
    bank_title: "Bank Info: USD Account",
    bank_notice: "(Bank transfers accepted, as well as third-party transfers such as PingPong, Airwallex and WorldFirst.)",
    remarks_title: "Remarks:",
    remark: "We do not bear any handling fees.",
};

const FAMILY: &str = "invoice";
const MARGIN: f64 = 15.0 * MM;

const TITLE_SIZE: f32 = 36.0;
const TITLE_LEADING: f64 = 32.0;
const TITLE_SPACE: f64 = 10.0;
const ADDRESS_SIZE: f32 = 10.0;
const ADDRESS_LEADING: f64 = 12.0;
const NORMAL_SIZE: f32 = 9.0;
const NORMAL_LEADING: f64 = 11.0;
const INDENT: f64 = 3.0;

const ADDRESS_GAP: f64 = 0.08 * INCH;
const SMALL_GAP: f64 = 0.1 * INCH;
const SECTION_GAP: f64 = 0.4 * INCH;

const LABEL_WIDTH: f64 = 0.8 * INCH;
const INFO_ROW_HEIGHT: f64 = NORMAL_LEADING + 2.0;

const ROW_HEIGHT: f64 = 0.3 * INCH;
const CELL_PADDING: f64 = 5.0;
const GRID_WIDTH: f64 = 0.5;
const INFO_PADDING: f64 = 2.0;

/// Header data printed above the table
#[derive(Debug, Clone, PartialEq, Default)]
pub struct InvoiceDetails {
    /// Issuing company address
    pub from_address: String,
    /// Client address
    pub to_address: String,
    pub invoice_no: String,
    /// Date as entered; reformatted to `October 01, 2023` when recognised
    pub invoice_date: String,
    pub bank: BankDetails,
}

/// Put a line break after every `", "` in an address
pub fn address_lines(address: &str) -> Vec<String> {
    address
        .replace(", ", ",\n")
        .lines()
        .map(str::to_string)
        .collect()
}

/// Lays out invoices as PDF documents
#[derive(Default)]
pub struct InvoiceComposer {
    font_data: Option<Vec<u8>>,
}

impl InvoiceComposer {
    /// Composer using the built-in Helvetica family
    pub fn new() -> Self {
        Self::default()
    }

    /// Use a TrueType font for all text, e.g. for Chinese addresses
    pub fn with_font_data(mut self, ttf_data: Vec<u8>) -> Self {
        self.font_data = Some(ttf_data);
        self
    }

    /// Chinese wording when a TrueType font is set, English otherwise
    pub fn texts(&self) -> &'static InvoiceTexts {
        if self.font_data.is_some() {
            &CHINESE_TEXTS
        } else {
            &ENGLISH_TEXTS
        }
    }

    fn family(&self) -> &'static str {
        if self.font_data.is_some() {
            FAMILY
        } else {
            DEFAULT_FAMILY
        }
    }

    /// Build the invoice document
    pub fn compose(&self, details: &InvoiceDetails, table: &PricedTable) -> Result<PdfDocument> {
        let mut doc = PdfDocument::new();
        if let Some(data) = &self.font_data {
            doc.register_font_family(FAMILY, FontFamilyBuilder::new().regular(data.clone()))?;
        }
        doc.set_text_color(Color::navy());

        let mut flow = Flow::new(&mut doc, self.family())?;
        flow.title()?;
        flow.address_block(details)?;
        flow.advance(SECTION_GAP);
        flow.priced_table(table)?;
        flow.advance(SECTION_GAP);

        let texts = self.texts();
        let mut bank_lines = vec![texts.bank_title.to_string(), texts.bank_notice.to_string()];
        bank_lines.extend(details.bank.display_lines());
        flow.info_block(&bank_lines)?;
        flow.advance(SECTION_GAP);
        flow.info_block(&[texts.remarks_title.to_string(), texts.remark.to_string()])?;

        log::debug!(
            "composed invoice {} on {} page(s)",
            details.invoice_no,
            doc.page_count()
        );
        Ok(doc)
    }

    /// Compose and return PDF bytes
    pub fn render(&self, details: &InvoiceDetails, table: &PricedTable) -> Result<Vec<u8>> {
        Ok(self.compose(details, table)?.to_bytes()?)
    }

    /// Compose and write to a file
    pub fn save<P: AsRef<Path>>(
        &self,
        details: &InvoiceDetails,
        table: &PricedTable,
        path: P,
    ) -> Result<()> {
        let mut doc = self.compose(details, table)?;
        doc.save(path.as_ref())?;
        log::info!("saved invoice {}", path.as_ref().display());
        Ok(())
    }
}

/// Top-down cursor over the pages of a document
struct Flow<'a> {
    doc: &'a mut PdfDocument,
    family: &'static str,
    page: usize,
    y: f64,
    page_width: f64,
    bottom: f64,
}

impl<'a> Flow<'a> {
    fn new(doc: &'a mut PdfDocument, family: &'static str) -> Result<Self> {
        let page = doc.add_blank_page()?;
        let (page_width, page_height) = doc.page_size(page)?;
        Ok(Self {
            doc,
            family,
            page,
            y: MARGIN,
            page_width,
            bottom: page_height - MARGIN,
        })
    }

    fn content_width(&self) -> f64 {
        self.page_width - 2.0 * MARGIN
    }

    fn advance(&mut self, height: f64) {
        self.y += height;
    }

    /// Start a new page unless `height` still fits on this one
    fn ensure(&mut self, height: f64) -> Result<()> {
        if self.y + height > self.bottom && self.y > MARGIN {
            self.page = self.doc.add_blank_page()?;
            self.y = MARGIN;
        }
        Ok(())
    }

    fn font(&mut self, size: f32, weight: FontWeight) -> Result<()> {
        self.doc.set_font(self.family, size)?;
        self.doc.set_font_weight(weight);
        Ok(())
    }

    fn wrap(&self, text: &str, width: f64) -> Vec<String> {
        let doc = &*self.doc;
        wrap_text(text, width, |s| doc.text_width(s).unwrap_or(0.0))
    }

    fn title(&mut self) -> Result<()> {
        self.ensure(TITLE_SPACE + TITLE_LEADING + TITLE_SPACE)?;
        self.font(TITLE_SIZE, FontWeight::Bold)?;
        self.advance(TITLE_SPACE);
        let baseline = self.y + TITLE_LEADING * 0.8;
        self.doc
            .insert_text(TITLE, self.page, self.page_width / 2.0, baseline, Align::Center)?;
        self.advance(TITLE_LEADING + TITLE_SPACE + SMALL_GAP);
        Ok(())
    }

    /// Addresses in the left 60%, invoice number and date in the right 40%
    fn address_block(&mut self, details: &InvoiceDetails) -> Result<()> {
        let left_width = self.content_width() * 0.6;
        let right_x = MARGIN + left_width;

        self.ensure(INFO_ROW_HEIGHT * 2.0)?;
        let (start_page, start_y) = (self.page, self.y);

        self.font(NORMAL_SIZE, FontWeight::Regular)?;
        let date = format_english_date(&details.invoice_date);
        let rows = [
            ("Invoice No:", details.invoice_no.as_str()),
            ("Invoice Date:", date.as_str()),
        ];
        for (i, (label, value)) in rows.iter().enumerate() {
            let baseline = start_y + i as f64 * INFO_ROW_HEIGHT + 1.0 + NORMAL_LEADING * 0.8;
            self.doc
                .insert_text(label, start_page, right_x + INDENT, baseline, Align::Left)?;
            self.doc.insert_text(
                value,
                start_page,
                right_x + LABEL_WIDTH + INDENT,
                baseline,
                Align::Left,
            )?;
        }
        let right_end = start_y + rows.len() as f64 * INFO_ROW_HEIGHT;

        self.labelled_address("From:", &details.from_address, left_width)?;
        self.advance(ADDRESS_GAP);
        self.labelled_address("To:", &details.to_address, left_width)?;

        if self.page == start_page {
            self.y = self.y.max(right_end);
        }
        Ok(())
    }

    fn labelled_address(&mut self, label: &str, address: &str, width: f64) -> Result<()> {
        self.font(NORMAL_SIZE, FontWeight::Regular)?;
        self.line(label, MARGIN + INDENT, NORMAL_LEADING)?;

        self.font(ADDRESS_SIZE, FontWeight::Regular)?;
        for line in address_lines(address) {
            for wrapped in self.wrap(&line, width - 2.0 * INDENT) {
                self.line(&wrapped, MARGIN + INDENT, ADDRESS_LEADING)?;
            }
        }
        Ok(())
    }

    /// One left-aligned line of text in the current font
    fn line(&mut self, text: &str, x: f64, leading: f64) -> Result<()> {
        self.ensure(leading)?;
        let baseline = self.y + leading * 0.8;
        self.doc.insert_text(text, self.page, x, baseline, Align::Left)?;
        self.advance(leading);
        Ok(())
    }

    fn priced_table(&mut self, table: &PricedTable) -> Result<()> {
        let content_width = self.content_width();
        let widths: Vec<f64> = table
            .variant
            .column_ratios()
            .iter()
            .map(|ratio| ratio * content_width)
            .collect();
        let lefts: Vec<f64> = widths
            .iter()
            .scan(MARGIN, |x, width| {
                let left = *x;
                *x += width;
                Some(left)
            })
            .collect();

        // (page, top) of every row
        let mut placements = Vec::with_capacity(table.rows.len());
        for _ in &table.rows {
            self.ensure(ROW_HEIGHT)?;
            placements.push((self.page, self.y));
            self.advance(ROW_HEIGHT);
        }

        if let Some(&(page, top)) = placements.first() {
            self.doc.fill_rect(
                page,
                MARGIN,
                top,
                content_width,
                ROW_HEIGHT,
                Color::rgb(0.9, 0.9, 0.95),
            )?;
        }

        self.font(NORMAL_SIZE, FontWeight::Regular)?;
        let spans = table.spans();
        for column in 0..widths.len() {
            let mut row = 0;
            while row < table.rows.len() {
                let last = visual_cell_end(&spans, &placements, column, row);
                let (page, top) = placements[row];
                let height = (last - row + 1) as f64 * ROW_HEIGHT;

                self.doc.stroke_rect(
                    page,
                    lefts[column],
                    top,
                    widths[column],
                    height,
                    GRID_WIDTH,
                    Color::gray(0.5),
                )?;

                let text = table.rows[row].get(column).map(String::as_str).unwrap_or("");
                let lines = self.wrap(text, widths[column] - 2.0 * CELL_PADDING);
                let block_top = top + (height - lines.len() as f64 * NORMAL_LEADING) / 2.0;
                for (i, line) in lines.iter().enumerate() {
                    let baseline = block_top + (i as f64 + 0.8) * NORMAL_LEADING;
                    self.doc.insert_text(
                        line,
                        page,
                        lefts[column] + widths[column] / 2.0,
                        baseline,
                        Align::Center,
                    )?;
                }

                row = last + 1;
            }
        }

        log::debug!(
            "laid out {} table row(s) with {} merged cell(s)",
            table.rows.len(),
            spans.len()
        );
        Ok(())
    }

    /// Borderless rows of left-aligned text
    fn info_block(&mut self, lines: &[String]) -> Result<()> {
        self.font(NORMAL_SIZE, FontWeight::Regular)?;
        let width = self.content_width() - 2.0 * INDENT;
        for text in lines {
            let wrapped = self.wrap(text, width);
            self.ensure(wrapped.len() as f64 * NORMAL_LEADING + 2.0 * INFO_PADDING)?;
            self.advance(INFO_PADDING);
            for line in &wrapped {
                self.line(line, MARGIN + INDENT, NORMAL_LEADING)?;
            }
            self.advance(INFO_PADDING);
        }
        Ok(())
    }
}

/// Last row drawn as one cell with `row` in `column`
///
/// A merge span is cut where the table continues on a new page.
fn visual_cell_end(
    spans: &[CellSpan],
    placements: &[(usize, f64)],
    column: usize,
    row: usize,
) -> usize {
    let Some(span) = spans
        .iter()
        .find(|span| span.column == column && span.rows.contains(row))
    else {
        return row;
    };

    let page = placements[row].0;
    let mut last = row;
    while last < span.rows.last && placements[last + 1].0 == page {
        last += 1;
    }
    last
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::merge::RowSpan;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_address_lines() {
        assert_eq!(
            address_lines("Room 1, 2 Main St, Hong Kong"),
            vec!["Room 1,", "2 Main St,", "Hong Kong"]
        );
        assert_eq!(address_lines("No commas"), vec!["No commas"]);
        assert_eq!(address_lines("a,b"), vec!["a,b"]);
    }

    #[test]
    fn test_texts_follow_font() {
        assert_eq!(InvoiceComposer::new().texts(), &ENGLISH_TEXTS);
        assert_eq!(
            InvoiceComposer::new().with_font_data(vec![0; 4]).texts(),
            &CHINESE_TEXTS
        );
        assert_eq!(CHINESE_TEXTS.remark, "我司不承担任何手续费");
    }

    #[test]
    fn test_visual_cell_end_cut_at_page_break() {
        let spans = vec![CellSpan {
            column: 0,
            rows: RowSpan { first: 1, last: 4 },
        }];
        let placements = vec![(1, 0.0), (1, 10.0), (1, 20.0), (2, 0.0), (2, 10.0)];

        assert_eq!(visual_cell_end(&spans, &placements, 0, 0), 0);
        assert_eq!(visual_cell_end(&spans, &placements, 0, 1), 2);
        assert_eq!(visual_cell_end(&spans, &placements, 0, 3), 4);
        assert_eq!(visual_cell_end(&spans, &placements, 1, 1), 1);
    }
}
