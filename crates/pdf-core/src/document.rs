//! PDF Document wrapper

use crate::font::FontObjects;
use crate::text::{
    generate_line_operators, generate_rect_operators, generate_text_operators, RectPaint,
    TextRenderContext,
};
use crate::{Align, FontData, FontFamily, FontFamilyBuilder, PdfError, Result};
use crate::{FontStyle, FontWeight};
use flate2::write::ZlibEncoder;
use flate2::Compression;
use lopdf::{Dictionary, Document, Object, ObjectId, Stream};
use std::collections::{BTreeMap, HashMap};
use std::io::Write;
use std::path::Path;

/// A4 width in points
pub const A4_WIDTH: f64 = 595.28;
/// A4 height in points
pub const A4_HEIGHT: f64 = 841.89;
/// Name of the Helvetica family every document starts with
pub const DEFAULT_FAMILY: &str = "helvetica";

/// RGB Color (values 0.0 - 1.0)
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Color {
    pub r: f32,
    pub g: f32,
    pub b: f32,
}

impl Color {
    /// Create a new RGB color (values 0.0 - 1.0)
    pub fn rgb(r: f32, g: f32, b: f32) -> Self {
        Self { r, g, b }
    }

    /// Create color from RGB values (0-255)
    pub fn from_rgb(r: u8, g: u8, b: u8) -> Self {
        Self {
            r: r as f32 / 255.0,
            g: g as f32 / 255.0,
            b: b as f32 / 255.0,
        }
    }

    /// Parse a `RRGGBB` hex string (as used by word processors)
    pub fn from_hex(hex: &str) -> Option<Self> {
        let hex = hex.trim_start_matches('#');
        if hex.len() != 6 || !hex.is_ascii() {
            return None;
        }
        let channel = |range: std::ops::Range<usize>| u8::from_str_radix(&hex[range], 16).ok();
        Some(Self::from_rgb(channel(0..2)?, channel(2..4)?, channel(4..6)?))
    }

    /// Gray level shortcut
    pub fn gray(level: f32) -> Self {
        Self::rgb(level, level, level)
    }

    /// Black color
    pub fn black() -> Self {
        Self::rgb(0.0, 0.0, 0.0)
    }

    /// Navy blue
    pub fn navy() -> Self {
        Self::rgb(0.0, 0.0, 0.5)
    }
}

impl Default for Color {
    fn default() -> Self {
        Self::black()
    }
}

/// A page created by this document
struct PageEntry {
    id: ObjectId,
    contents_id: ObjectId,
    width: f64,
    height: f64,
    content: Vec<u8>,
}

/// PDF Document builder providing high-level drawing operations
///
/// Coordinates passed to drawing methods are measured from the top-left
/// corner of the page, in points.
pub struct PdfDocument {
    /// The underlying lopdf document
    inner: Document,
    /// Root Pages node
    pages_id: ObjectId,
    /// Pages in order
    pages: Vec<PageEntry>,
    /// Registered font families
    font_families: HashMap<String, FontFamily>,
    /// Current font family name
    current_family: String,
    /// Current font weight
    current_weight: FontWeight,
    /// Current font style
    current_style: FontStyle,
    /// Current font size
    current_font_size: f32,
    /// Current text color
    current_text_color: Color,
    /// Page font resources (page number -> font name -> resource name)
    page_font_resources: HashMap<usize, BTreeMap<String, String>>,
    /// Next font resource number
    next_font_resource: u32,
    /// Objects written for fonts by the last finalize
    font_object_ids: Vec<ObjectId>,
}

impl Default for PdfDocument {
    fn default() -> Self {
        Self::new()
    }
}

impl PdfDocument {
    /// Create an empty document with no pages
    ///
    /// The built-in Helvetica family is registered as [`DEFAULT_FAMILY`] and
    /// selected at 12pt.
    pub fn new() -> Self {
        let mut inner = Document::with_version("1.5");
        let pages_id = inner.new_object_id();
        inner.objects.insert(
            pages_id,
            Object::Dictionary(Dictionary::from_iter(vec![
                ("Type", "Pages".into()),
                ("Kids", Object::Array(vec![])),
                ("Count", 0.into()),
            ])),
        );
        let catalog_id = inner.add_object(Dictionary::from_iter(vec![
            ("Type", "Catalog".into()),
            ("Pages", Object::Reference(pages_id)),
        ]));
        inner.trailer.set("Root", Object::Reference(catalog_id));

        let mut font_families = HashMap::new();
        font_families.insert(
            DEFAULT_FAMILY.to_string(),
            FontFamily::helvetica(DEFAULT_FAMILY),
        );

        Self {
            inner,
            pages_id,
            pages: Vec::new(),
            font_families,
            current_family: DEFAULT_FAMILY.to_string(),
            current_weight: FontWeight::default(),
            current_style: FontStyle::default(),
            current_font_size: 12.0,
            current_text_color: Color::default(),
            page_font_resources: HashMap::new(),
            next_font_resource: 1,
            font_object_ids: Vec::new(),
        }
    }

    /// Get the number of pages in the document
    pub fn page_count(&self) -> usize {
        self.pages.len()
    }

    /// Width and height of a page in points
    pub fn page_size(&self, page: usize) -> Result<(f64, f64)> {
        let entry = self.page(page)?;
        Ok((entry.width, entry.height))
    }

    fn page(&self, page: usize) -> Result<&PageEntry> {
        page.checked_sub(1)
            .and_then(|index| self.pages.get(index))
            .ok_or(PdfError::InvalidPage(page, self.pages.len()))
    }

    fn page_mut(&mut self, page: usize) -> Result<&mut PageEntry> {
        let count = self.pages.len();
        page.checked_sub(1)
            .and_then(|index| self.pages.get_mut(index))
            .ok_or(PdfError::InvalidPage(page, count))
    }

    /// Add a blank A4 page and return its page number (1-indexed)
    ///
    /// # Example
    /// ```ignore
    /// let mut doc = PdfDocument::new();
    /// let first = doc.add_blank_page()?;
    /// assert_eq!(first, 1);
    /// ```
    pub fn add_blank_page(&mut self) -> Result<usize> {
        self.add_page_with_size(A4_WIDTH, A4_HEIGHT)
    }

    /// Add a blank page of the given size in points
    fn add_page_with_size(&mut self, width: f64, height: f64) -> Result<usize> {
        let contents_id = self
            .inner
            .add_object(Object::Stream(Stream::new(Dictionary::new(), vec![])));

        let mut page_dict = Dictionary::new();
        page_dict.set(b"Type", Object::Name(b"Page".to_vec()));
        page_dict.set(b"Parent", Object::Reference(self.pages_id));
        page_dict.set(
            b"MediaBox",
            Object::Array(vec![
                Object::Real(0.0),
                Object::Real(0.0),
                Object::Real(width as _),
                Object::Real(height as _),
            ]),
        );
        page_dict.set(b"Resources", Object::Dictionary(Dictionary::new()));
        page_dict.set(b"Contents", Object::Reference(contents_id));
        let page_id = self.inner.add_object(Object::Dictionary(page_dict));

        self.pages.push(PageEntry {
            id: page_id,
            contents_id,
            width,
            height,
            content: Vec::new(),
        });

        let kids: Vec<Object> = self
            .pages
            .iter()
            .map(|entry| Object::Reference(entry.id))
            .collect();
        let pages_obj = self.inner.get_object_mut(self.pages_id)?;
        let pages_dict = pages_obj
            .as_dict_mut()
            .map_err(|_| PdfError::ParseError("Pages object is not a dictionary".to_string()))?;
        pages_dict.set(b"Count", Object::Integer(kids.len() as i64));
        pages_dict.set(b"Kids", Object::Array(kids));

        Ok(self.pages.len())
    }

    /// Register a TrueType font family
    ///
    /// # Example
    /// ```ignore
    /// doc.register_font_family(
    ///     "noto",
    ///     FontFamilyBuilder::new()
    ///         .regular(std::fs::read("NotoSansSC-Regular.ttf")?)
    ///         .bold(std::fs::read("NotoSansSC-Bold.ttf")?)
    /// )?;
    /// ```
    pub fn register_font_family(&mut self, name: &str, builder: FontFamilyBuilder) -> Result<()> {
        if self.font_families.contains_key(name) {
            return Err(PdfError::FontAlreadyExists(name.to_string()));
        }

        let family = builder.build(name)?;
        self.font_families.insert(name.to_string(), family);

        Ok(())
    }

    /// Whether a family with this name is registered
    pub fn has_font_family(&self, name: &str) -> bool {
        self.font_families.contains_key(name)
    }

    /// Set the current font family and size
    ///
    /// # Arguments
    /// * `family` - Font family name
    /// * `size` - Font size in points
    pub fn set_font(&mut self, family: &str, size: f32) -> Result<()> {
        if !self.has_font_family(family) {
            return Err(PdfError::FontNotFound(family.to_string()));
        }

        self.current_family = family.to_string();
        self.current_font_size = size;

        Ok(())
    }

    /// Set the font weight (keeps current family/size/style)
    pub fn set_font_weight(&mut self, weight: FontWeight) {
        self.current_weight = weight;
    }

    /// Set the font style (keeps current family/size/weight)
    pub fn set_font_style(&mut self, style: FontStyle) {
        self.current_style = style;
    }

    /// Set the text color
    pub fn set_text_color(&mut self, color: Color) {
        self.current_text_color = color;
    }

    /// Current font size in points
    pub fn font_size(&self) -> f32 {
        self.current_font_size
    }

    fn current_font(&self) -> Result<&FontData> {
        self.font_families
            .get(&self.current_family)
            .and_then(|family| family.get_variant(self.current_weight, self.current_style))
            .ok_or_else(|| PdfError::FontNotFound(self.current_family.clone()))
    }

    fn current_font_mut(&mut self) -> Result<&mut FontData> {
        let (weight, style) = (self.current_weight, self.current_style);
        self.font_families
            .get_mut(&self.current_family)
            .and_then(|family| family.get_variant_mut(weight, style))
            .ok_or_else(|| PdfError::FontNotFound(self.current_family.clone()))
    }

    /// Get current font's text width for a string, in points
    pub fn text_width(&self, text: &str) -> Result<f64> {
        let font_data = self.current_font()?;
        Ok(font_data.text_width_points(text, self.current_font_size) as f64)
    }

    /// Insert text at a specific position
    ///
    /// # Arguments
    /// * `text` - Text to insert
    /// * `page` - Page number (1-indexed)
    /// * `x` - X coordinate in points
    /// * `y` - Baseline Y coordinate in points (from top)
    /// * `align` - Alignment of the text relative to `x`
    pub fn insert_text(
        &mut self,
        text: &str,
        page: usize,
        x: f64,
        y: f64,
        align: Align,
    ) -> Result<()> {
        let page_height = self.page(page)?.height;

        if text.is_empty() {
            return Ok(());
        }

        let (font_name, text_width, operand) = {
            let font_size = self.current_font_size;
            let font_data = self.current_font_mut()?;
            font_data.add_chars(text);
            (
                font_data.name.clone(),
                font_data.text_width_points(text, font_size) as f64,
                font_data.encode_text(text),
            )
        };

        let ctx = TextRenderContext {
            font_name: self.get_or_create_font_ref(&font_name, page),
            font_size: self.current_font_size,
            text_width,
            color: self.current_text_color,
        };

        let operators = generate_text_operators(&operand, x, page_height - y, align, &ctx);
        self.buffer_content(page, &operators)
    }

    /// Draw a straight line between two points (top-origin coordinates)
    #[allow(clippy::too_many_arguments)]
    pub fn draw_line(
        &mut self,
        page: usize,
        x1: f64,
        y1: f64,
        x2: f64,
        y2: f64,
        width: f64,
        color: Color,
    ) -> Result<()> {
        let page_height = self.page(page)?.height;
        let operators =
            generate_line_operators(x1, page_height - y1, x2, page_height - y2, width, color);
        self.buffer_content(page, &operators)
    }

    /// Fill a rectangle whose top-left corner is at `(x, y)`
    pub fn fill_rect(
        &mut self,
        page: usize,
        x: f64,
        y: f64,
        width: f64,
        height: f64,
        color: Color,
    ) -> Result<()> {
        let page_height = self.page(page)?.height;
        let operators = generate_rect_operators(
            x,
            page_height - y - height,
            width,
            height,
            RectPaint::Fill(color),
        );
        self.buffer_content(page, &operators)
    }

    /// Stroke the outline of a rectangle whose top-left corner is at `(x, y)`
    #[allow(clippy::too_many_arguments)]
    pub fn stroke_rect(
        &mut self,
        page: usize,
        x: f64,
        y: f64,
        width: f64,
        height: f64,
        line_width: f64,
        color: Color,
    ) -> Result<()> {
        let page_height = self.page(page)?.height;
        let operators = generate_rect_operators(
            x,
            page_height - y - height,
            width,
            height,
            RectPaint::Stroke(color, line_width),
        );
        self.buffer_content(page, &operators)
    }

    /// Save the document to a file
    ///
    /// # Arguments
    /// * `path` - Output file path
    pub fn save<P: AsRef<Path>>(&mut self, path: P) -> Result<()> {
        self.finalize()?;

        self.inner
            .save(path)
            .map_err(|e| PdfError::SaveError(e.to_string()))?;
        Ok(())
    }

    /// Save the document to bytes
    pub fn to_bytes(&mut self) -> Result<Vec<u8>> {
        self.finalize()?;

        let mut buffer = Vec::new();
        self.inner
            .save_to(&mut buffer)
            .map_err(|e| PdfError::SaveError(e.to_string()))?;

        Ok(buffer)
    }

    /// Get a reference to the underlying lopdf document
    pub fn inner(&self) -> &Document {
        &self.inner
    }

    /// Write content streams and fonts into the lopdf document
    fn finalize(&mut self) -> Result<()> {
        self.flush_content_buffers()?;
        self.embed_fonts()?;
        log::debug!(
            "finalized PDF with {} page(s) and {} font object(s)",
            self.pages.len(),
            self.font_object_ids.len()
        );
        Ok(())
    }

    /// Buffer content operators for a page
    fn buffer_content(&mut self, page: usize, content: &[u8]) -> Result<()> {
        self.page_mut(page)?.content.extend_from_slice(content);
        Ok(())
    }

    /// Write each page's buffered operators as a single compressed stream
    fn flush_content_buffers(&mut self) -> Result<()> {
        for entry in &self.pages {
            let mut encoder = ZlibEncoder::new(Vec::new(), Compression::default());
            encoder.write_all(&entry.content)?;
            let compressed = encoder.finish()?;

            let stream = Stream::new(
                Dictionary::from_iter(vec![("Filter", "FlateDecode".into())]),
                compressed,
            );
            self.inner
                .objects
                .insert(entry.contents_id, Object::Stream(stream));
        }

        Ok(())
    }

    /// Get or create the resource name (e.g., "F1") of a font on a page
    fn get_or_create_font_ref(&mut self, font_name: &str, page: usize) -> String {
        let page_resources = self.page_font_resources.entry(page).or_default();

        if let Some(resource_name) = page_resources.get(font_name) {
            return resource_name.clone();
        }

        let resource_name = format!("F{}", self.next_font_resource);
        self.next_font_resource += 1;
        page_resources.insert(font_name.to_string(), resource_name.clone());

        resource_name
    }

    /// Embed all used fonts and point page resources at them
    fn embed_fonts(&mut self) -> Result<()> {
        for id in self.font_object_ids.drain(..) {
            self.inner.objects.remove(&id);
        }

        let used: Vec<FontData> = self
            .font_families
            .values()
            .flat_map(|family| family.variants())
            .filter(|font_data| !font_data.used_chars.is_empty())
            .cloned()
            .collect();

        let mut embedded: HashMap<String, ObjectId> = HashMap::new();
        for font_data in used {
            let font_id = self.embed_font_object(&font_data)?;
            embedded.insert(font_data.name.clone(), font_id);
        }

        for (index, entry) in self.pages.iter().enumerate() {
            let Some(fonts) = self.page_font_resources.get(&(index + 1)) else {
                continue;
            };

            let mut font_dict = Dictionary::new();
            for (font_name, resource_name) in fonts {
                let font_ref = embedded
                    .get(font_name)
                    .ok_or_else(|| PdfError::FontNotFound(font_name.clone()))?;
                font_dict.set(resource_name.as_bytes(), Object::Reference(*font_ref));
            }

            let mut resources = Dictionary::new();
            resources.set(b"Font", Object::Dictionary(font_dict));

            let page_dict = self
                .inner
                .get_object_mut(entry.id)?
                .as_dict_mut()
                .map_err(|_| PdfError::SaveError("Page object is not a dictionary".to_string()))?;
            page_dict.set(b"Resources", Object::Dictionary(resources));
        }

        Ok(())
    }

    /// Embed a single font and return the id of its top-level font dictionary
    fn embed_font_object(&mut self, font_data: &FontData) -> Result<ObjectId> {
        match font_data.to_pdf_objects()? {
            FontObjects::Simple(dict) => {
                let font_id = self.inner.add_object(dict);
                self.font_object_ids.push(font_id);
                Ok(font_id)
            }
            FontObjects::Composite(objects) => {
                let objects = *objects;
                let font_file_id = self.inner.add_object(objects.font_file_stream);

                let mut font_descriptor = objects.font_descriptor;
                font_descriptor.set("FontFile2", Object::Reference(font_file_id));
                let font_descriptor_id = self.inner.add_object(font_descriptor);

                let mut cid_font = objects.cid_font;
                cid_font.set("FontDescriptor", Object::Reference(font_descriptor_id));
                let cid_font_id = self.inner.add_object(cid_font);

                let tounicode_id = self.inner.add_object(objects.tounicode_stream);

                let mut type0_font = objects.type0_font;
                type0_font.set(
                    "DescendantFonts",
                    Object::Array(vec![Object::Reference(cid_font_id)]),
                );
                type0_font.set("ToUnicode", Object::Reference(tounicode_id));
                let type0_font_id = self.inner.add_object(type0_font);

                self.font_object_ids.extend([
                    font_file_id,
                    font_descriptor_id,
                    cid_font_id,
                    tounicode_id,
                    type0_font_id,
                ]);
                Ok(type0_font_id)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_document_has_no_pages() {
        let doc = PdfDocument::new();
        assert_eq!(doc.page_count(), 0);
        assert!(doc.has_font_family(DEFAULT_FAMILY));
    }

    #[test]
    fn test_add_blank_page_numbers() {
        let mut doc = PdfDocument::new();
        assert_eq!(doc.add_blank_page().unwrap(), 1);
        assert_eq!(doc.add_blank_page().unwrap(), 2);
        assert_eq!(doc.page_count(), 2);
        assert_eq!(doc.page_size(1).unwrap(), (A4_WIDTH, A4_HEIGHT));
    }

    #[test]
    fn test_insert_text_invalid_page() {
        let mut doc = PdfDocument::new();
        doc.add_blank_page().unwrap();
        let result = doc.insert_text("x", 2, 0.0, 0.0, Align::Left);
        assert!(matches!(result, Err(PdfError::InvalidPage(2, 1))));
        let result = doc.insert_text("x", 0, 0.0, 0.0, Align::Left);
        assert!(matches!(result, Err(PdfError::InvalidPage(0, 1))));
    }

    #[test]
    fn test_set_unknown_font() {
        let mut doc = PdfDocument::new();
        let result = doc.set_font("missing", 10.0);
        assert!(matches!(result, Err(PdfError::FontNotFound(_))));
    }

    #[test]
    fn test_text_width_follows_weight() {
        let mut doc = PdfDocument::new();
        doc.set_font(DEFAULT_FAMILY, 10.0).unwrap();
        let regular = doc.text_width("b").unwrap();
        doc.set_font_weight(FontWeight::Bold);
        let bold = doc.text_width("b").unwrap();
        assert!((regular - 5.56).abs() < 0.001);
        assert!((bold - 6.11).abs() < 0.001);
    }

    #[test]
    fn test_font_resource_names_are_per_page() {
        let mut doc = PdfDocument::new();
        doc.add_blank_page().unwrap();
        let first = doc.get_or_create_font_ref("helvetica-regular", 1);
        let again = doc.get_or_create_font_ref("helvetica-regular", 1);
        let bold = doc.get_or_create_font_ref("helvetica-bold", 1);
        assert_eq!(first, "F1");
        assert_eq!(again, "F1");
        assert_eq!(bold, "F2");
    }

    #[test]
    fn test_color_from_hex() {
        assert_eq!(Color::from_hex("FF0000"), Some(Color::rgb(1.0, 0.0, 0.0)));
        assert_eq!(Color::from_hex("#000000"), Some(Color::black()));
        assert_eq!(Color::from_hex("auto"), None);
    }
}
