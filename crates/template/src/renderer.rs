//! Rich paragraph rendering
//!
//! Lays filled paragraphs out on A4 pages: greedy word wrap per paragraph,
//! paragraph alignment, and per-segment bold/italic/underline/size/colour.

use crate::paragraph::{ParagraphAlign, RichParagraph, RunStyle};
use crate::Result;
use pdf_core::{
    Align, Color, FontFamilyBuilder, FontStyle, FontWeight, PdfDocument, DEFAULT_FAMILY, INCH,
};
use std::path::Path;

/// Family name used for a caller-supplied TrueType font
const BODY_FAMILY: &str = "body";

/// Page geometry and typographic defaults
#[derive(Debug, Clone, PartialEq)]
pub struct PageLayout {
    /// Margin on every side, in points
    pub margin: f64,
    /// Size used when a segment does not set one, in points
    pub default_font_size: f32,
    /// Line height as a multiple of the largest font size on the line
    pub line_spacing: f64,
    /// Extra space after each paragraph, in points
    pub paragraph_spacing: f64,
}

impl Default for PageLayout {
    fn default() -> Self {
        Self {
            margin: INCH,
            default_font_size: 11.0,
            line_spacing: 1.2,
            paragraph_spacing: 6.0,
        }
    }
}

/// A styled piece of a laid-out line
#[derive(Debug, Clone)]
struct Piece {
    text: String,
    style: RunStyle,
    width: f64,
}

enum Token<'a> {
    Word(&'a str),
    Space(String),
    Break,
}

/// Split text into words, whitespace runs (tabs widened to four spaces)
/// and hard line breaks
fn tokenize(text: &str) -> Vec<Token<'_>> {
    let mut tokens = Vec::new();
    let mut word_start: Option<usize> = None;

    for (index, c) in text.char_indices() {
        if c.is_whitespace() {
            if let Some(start) = word_start.take() {
                tokens.push(Token::Word(&text[start..index]));
            }
            match c {
                '\n' => tokens.push(Token::Break),
                '\r' => {}
                '\t' => tokens.push(Token::Space("    ".to_string())),
                other => tokens.push(Token::Space(other.to_string())),
            }
        } else if word_start.is_none() {
            word_start = Some(index);
        }
    }
    if let Some(start) = word_start {
        tokens.push(Token::Word(&text[start..]));
    }

    tokens
}

/// Renders rich paragraphs as a paginated PDF
#[derive(Default)]
pub struct ParagraphRenderer {
    layout: PageLayout,
    font_data: Option<Vec<u8>>,
}

impl ParagraphRenderer {
    /// Renderer using the built-in Helvetica family and default layout
    pub fn new() -> Self {
        Self::default()
    }

    /// Override margins, default size and spacing
    pub fn with_layout(mut self, layout: PageLayout) -> Self {
        self.layout = layout;
        self
    }

    /// Use a TrueType font for all text (required for non Latin-1 scripts)
    pub fn with_font_data(mut self, ttf_data: Vec<u8>) -> Self {
        self.font_data = Some(ttf_data);
        self
    }

    /// Render paragraphs and return the PDF bytes
    pub fn render(&self, paragraphs: &[RichParagraph]) -> Result<Vec<u8>> {
        let mut doc = self.new_document()?;
        self.render_into(&mut doc, paragraphs)?;
        Ok(doc.to_bytes()?)
    }

    /// Render paragraphs into a PDF file
    pub fn save<P: AsRef<Path>>(&self, paragraphs: &[RichParagraph], path: P) -> Result<()> {
        let mut doc = self.new_document()?;
        let pages = self.render_into(&mut doc, paragraphs)?;
        doc.save(path.as_ref())?;
        log::info!(
            "rendered {} paragraph(s) on {} page(s) to {}",
            paragraphs.len(),
            pages,
            path.as_ref().display()
        );
        Ok(())
    }

    fn new_document(&self) -> Result<PdfDocument> {
        let mut doc = PdfDocument::new();
        if let Some(data) = &self.font_data {
            doc.register_font_family(BODY_FAMILY, FontFamilyBuilder::new().regular(data.clone()))?;
        }
        Ok(doc)
    }

    fn family(&self) -> &'static str {
        if self.font_data.is_some() {
            BODY_FAMILY
        } else {
            DEFAULT_FAMILY
        }
    }

    fn font_size(&self, style: &RunStyle) -> f32 {
        style.font_size.unwrap_or(self.layout.default_font_size)
    }

    fn apply_style(&self, doc: &mut PdfDocument, style: &RunStyle) -> Result<()> {
        doc.set_font(self.family(), self.font_size(style))?;
        doc.set_font_weight(if style.is_bold() {
            FontWeight::Bold
        } else {
            FontWeight::Regular
        });
        doc.set_font_style(if style.is_italic() {
            FontStyle::Italic
        } else {
            FontStyle::Normal
        });
        doc.set_text_color(
            style
                .color
                .as_deref()
                .and_then(Color::from_hex)
                .unwrap_or_default(),
        );
        Ok(())
    }

    fn measure(&self, doc: &mut PdfDocument, text: &str, style: &RunStyle) -> Result<f64> {
        self.apply_style(doc, style)?;
        Ok(doc.text_width(text)?)
    }

    /// Render into an existing document, returning the number of pages used
    pub fn render_into(&self, doc: &mut PdfDocument, paragraphs: &[RichParagraph]) -> Result<usize> {
        let mut page = doc.add_blank_page()?;
        let (page_width, page_height) = doc.page_size(page)?;
        let margin = self.layout.margin;
        let max_width = page_width - 2.0 * margin;
        let bottom = page_height - margin;
        let mut y = margin;
        let mut pages = 1;

        for paragraph in paragraphs {
            for mut line in self.layout_paragraph(doc, paragraph, max_width)? {
                self.trim_trailing_space(doc, &mut line)?;

                let size = line
                    .iter()
                    .map(|piece| self.font_size(&piece.style))
                    .fold(self.layout.default_font_size, f32::max) as f64;
                let height = size * self.layout.line_spacing;

                if y + height > bottom && y > margin {
                    page = doc.add_blank_page()?;
                    pages += 1;
                    y = margin;
                }

                let line_width: f64 = line.iter().map(|piece| piece.width).sum();
                let mut x = match paragraph.align {
                    ParagraphAlign::Left | ParagraphAlign::Justify => margin,
                    ParagraphAlign::Center => margin + (max_width - line_width) / 2.0,
                    ParagraphAlign::Right => margin + max_width - line_width,
                };
                let baseline = y + size;

                for piece in &line {
                    self.apply_style(doc, &piece.style)?;
                    doc.insert_text(&piece.text, page, x, baseline, Align::Left)?;

                    if piece.style.is_underlined() && !piece.text.trim().is_empty() {
                        let piece_size = self.font_size(&piece.style) as f64;
                        let underline_y = baseline + piece_size * 0.12;
                        let color = piece
                            .style
                            .color
                            .as_deref()
                            .and_then(Color::from_hex)
                            .unwrap_or_default();
                        doc.draw_line(
                            page,
                            x,
                            underline_y,
                            x + piece.width,
                            underline_y,
                            (piece_size * 0.05).max(0.5),
                            color,
                        )?;
                    }
                    x += piece.width;
                }

                y += height;
            }
            y += self.layout.paragraph_spacing;
        }

        Ok(pages)
    }

    /// Break a paragraph into lines no wider than `max_width`
    fn layout_paragraph(
        &self,
        doc: &mut PdfDocument,
        paragraph: &RichParagraph,
        max_width: f64,
    ) -> Result<Vec<Vec<Piece>>> {
        let mut lines = Vec::new();
        let mut line: Vec<Piece> = Vec::new();
        let mut line_width = 0.0;
        let mut wrapped = false;

        for segment in &paragraph.segments {
            let style = &segment.style;
            for token in tokenize(&segment.text) {
                match token {
                    Token::Break => {
                        lines.push(std::mem::take(&mut line));
                        line_width = 0.0;
                        wrapped = false;
                    }
                    Token::Space(space) => {
                        if line.is_empty() && wrapped {
                            continue;
                        }
                        let width = self.measure(doc, &space, style)?;
                        push_piece(&mut line, &space, style, width);
                        line_width += width;
                    }
                    Token::Word(word) => {
                        let width = self.measure(doc, word, style)?;
                        if line_width + width > max_width && !line.is_empty() {
                            lines.push(std::mem::take(&mut line));
                            line_width = 0.0;
                            wrapped = true;
                        }

                        if width <= max_width {
                            push_piece(&mut line, word, style, width);
                            line_width += width;
                            continue;
                        }

                        for c in word.chars() {
                            let text = c.to_string();
                            let char_width = self.measure(doc, &text, style)?;
                            if line_width + char_width > max_width && !line.is_empty() {
                                lines.push(std::mem::take(&mut line));
                                line_width = 0.0;
                                wrapped = true;
                            }
                            push_piece(&mut line, &text, style, char_width);
                            line_width += char_width;
                        }
                    }
                }
            }
        }
        lines.push(line);

        Ok(lines)
    }

    fn trim_trailing_space(&self, doc: &mut PdfDocument, line: &mut Vec<Piece>) -> Result<()> {
        while let Some(last) = line.last_mut() {
            let trimmed = last.text.trim_end();
            if trimmed.len() == last.text.len() {
                break;
            }
            if trimmed.is_empty() {
                line.pop();
                continue;
            }
            let trimmed = trimmed.to_string();
            last.width = self.measure(doc, &trimmed, &last.style)?;
            last.text = trimmed;
            break;
        }
        Ok(())
    }
}

/// Append text to a line, merging with the previous piece when styles match
fn push_piece(line: &mut Vec<Piece>, text: &str, style: &RunStyle, width: f64) {
    if let Some(last) = line.last_mut() {
        if &last.style == style {
            last.text.push_str(text);
            last.width += width;
            return;
        }
    }
    line.push(Piece {
        text: text.to_string(),
        style: style.clone(),
        width,
    });
}
