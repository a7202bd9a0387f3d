//! Font handling for PDF documents

use crate::{PdfError, Result};
use flate2::write::ZlibEncoder;
use flate2::Compression;
use lopdf::{Dictionary, Object, Stream};
use std::collections::BTreeSet;
use std::io::Write;

/// Font weight
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FontWeight {
    #[default]
    Regular,
    Bold,
}

/// Font style
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FontStyle {
    #[default]
    Normal,
    Italic,
}

/// Width used for characters outside the metric tables (1/1000 em)
const DEFAULT_WIDTH: u16 = 556;

/// Helvetica advance widths for ASCII 32..=126 (1/1000 em)
#[rustfmt::skip]
const HELVETICA_WIDTHS: [u16; 95] = [
    // space ! " # $ % & ' ( ) * + , - . /
    278, 278, 355, 556, 556, 889, 667, 191, 333, 333, 389, 584, 278, 333, 278, 278,
    // 0-9
    556, 556, 556, 556, 556, 556, 556, 556, 556, 556,
    // : ; < = > ? @
    278, 278, 584, 584, 584, 556, 1015,
    // A-Z
    667, 667, 722, 722, 667, 611, 778, 722, 278, 500, 667, 556, 833,
    722, 778, 667, 778, 722, 667, 611, 722, 667, 944, 667, 667, 611,
    // [ \ ] ^ _ `
    278, 278, 278, 469, 556, 333,
    // a-z
    556, 556, 500, 556, 556, 278, 556, 556, 222, 222, 500, 222, 833,
    556, 556, 556, 556, 333, 500, 278, 556, 500, 722, 500, 500, 500,
    // { | } ~
    334, 260, 334, 584,
];

/// Helvetica-Bold advance widths for ASCII 32..=126 (1/1000 em)
#[rustfmt::skip]
const HELVETICA_BOLD_WIDTHS: [u16; 95] = [
    278, 333, 474, 556, 556, 889, 722, 238, 333, 333, 389, 584, 278, 333, 278, 278,
    556, 556, 556, 556, 556, 556, 556, 556, 556, 556,
    333, 333, 584, 584, 584, 611, 975,
    722, 722, 722, 722, 667, 611, 778, 722, 278, 556, 722, 611, 833,
    722, 778, 667, 778, 722, 667, 611, 722, 667, 944, 667, 667, 611,
    333, 278, 333, 584, 556, 333,
    556, 611, 556, 611, 556, 333, 611, 611, 278, 278, 556, 278, 889,
    611, 611, 611, 611, 389, 556, 333, 611, 556, 778, 556, 556, 500,
    389, 280, 389, 584,
];

/// Standard 14 Helvetica faces, available in every PDF viewer without embedding
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BuiltinFont {
    Helvetica,
    HelveticaBold,
    HelveticaOblique,
    HelveticaBoldOblique,
}

impl BuiltinFont {
    /// PostScript name used as /BaseFont
    pub fn base_font(self) -> &'static str {
        match self {
            BuiltinFont::Helvetica => "Helvetica",
            BuiltinFont::HelveticaBold => "Helvetica-Bold",
            BuiltinFont::HelveticaOblique => "Helvetica-Oblique",
            BuiltinFont::HelveticaBoldOblique => "Helvetica-BoldOblique",
        }
    }

    /// Advance width of a character in 1/1000 em
    pub fn char_width(self, c: char) -> u16 {
        let table = match self {
            BuiltinFont::Helvetica | BuiltinFont::HelveticaOblique => &HELVETICA_WIDTHS,
            BuiltinFont::HelveticaBold | BuiltinFont::HelveticaBoldOblique => {
                &HELVETICA_BOLD_WIDTHS
            }
        };
        match c as u32 {
            code @ 32..=126 => table[(code - 32) as usize],
            0xA0 => table[0],
            _ => DEFAULT_WIDTH,
        }
    }
}

/// Map a character to its WinAnsiEncoding byte
pub(crate) fn winansi_byte(c: char) -> Option<u8> {
    let code = c as u32;
    match code {
        0x20..=0x7E | 0xA0..=0xFF => Some(code as u8),
        _ => match c {
            '€' => Some(0x80),
            '‚' => Some(0x82),
            'ƒ' => Some(0x83),
            '„' => Some(0x84),
            '…' => Some(0x85),
            '†' => Some(0x86),
            '‡' => Some(0x87),
            'ˆ' => Some(0x88),
            '‰' => Some(0x89),
            'Š' => Some(0x8A),
            '‹' => Some(0x8B),
            'Œ' => Some(0x8C),
            'Ž' => Some(0x8E),
            '‘' => Some(0x91),
            '’' => Some(0x92),
            '“' => Some(0x93),
            '”' => Some(0x94),
            '•' => Some(0x95),
            '–' => Some(0x96),
            '—' => Some(0x97),
            '˜' => Some(0x98),
            '™' => Some(0x99),
            'š' => Some(0x9A),
            '›' => Some(0x9B),
            'œ' => Some(0x9C),
            'ž' => Some(0x9E),
            'Ÿ' => Some(0x9F),
            _ => None,
        },
    }
}

/// Where the glyphs of a font come from
#[derive(Debug, Clone)]
enum FontSource {
    Builtin(BuiltinFont),
    TrueType(Vec<u8>),
}

/// Font data structure for a single font variant
#[derive(Debug, Clone)]
pub struct FontData {
    /// Font name/identifier (unique within a document)
    pub name: String,
    /// Characters used (ToUnicode map and /W array)
    pub used_chars: BTreeSet<char>,
    source: FontSource,
}

/// PDF objects generated for a font
pub enum FontObjects {
    /// Simple Type1 dictionary referencing a standard font
    Simple(Dictionary),
    /// Type0 font with its descendant CIDFont, descriptor, program and ToUnicode map
    Composite(Box<CompositeFont>),
}

/// Objects making up an embedded TrueType font
pub struct CompositeFont {
    /// Type0 font dictionary
    pub type0_font: Dictionary,
    /// CIDFont Type2 dictionary
    pub cid_font: Dictionary,
    /// Font descriptor dictionary
    pub font_descriptor: Dictionary,
    /// Font file stream (compressed TTF data)
    pub font_file_stream: Stream,
    /// ToUnicode CMap stream
    pub tounicode_stream: Stream,
}

/// Font family with variants
#[derive(Debug, Clone, Default)]
pub struct FontFamily {
    /// Regular variant (required)
    pub regular: Option<FontData>,
    /// Bold variant
    pub bold: Option<FontData>,
    /// Italic variant
    pub italic: Option<FontData>,
    /// Bold italic variant
    pub bold_italic: Option<FontData>,
}

impl FontFamily {
    /// The built-in Helvetica family with all four variants
    pub fn helvetica(family_name: &str) -> Self {
        Self {
            regular: Some(FontData::builtin(
                &format!("{family_name}-regular"),
                BuiltinFont::Helvetica,
            )),
            bold: Some(FontData::builtin(
                &format!("{family_name}-bold"),
                BuiltinFont::HelveticaBold,
            )),
            italic: Some(FontData::builtin(
                &format!("{family_name}-italic"),
                BuiltinFont::HelveticaOblique,
            )),
            bold_italic: Some(FontData::builtin(
                &format!("{family_name}-bold-italic"),
                BuiltinFont::HelveticaBoldOblique,
            )),
        }
    }

    /// Get the font data for the specified weight and style
    /// Falls back to regular if requested variant is not available
    pub fn get_variant(&self, weight: FontWeight, style: FontStyle) -> Option<&FontData> {
        match (weight, style) {
            (FontWeight::Bold, FontStyle::Italic) => self
                .bold_italic
                .as_ref()
                .or(self.bold.as_ref())
                .or(self.italic.as_ref())
                .or(self.regular.as_ref()),
            (FontWeight::Bold, FontStyle::Normal) => self.bold.as_ref().or(self.regular.as_ref()),
            (FontWeight::Regular, FontStyle::Italic) => {
                self.italic.as_ref().or(self.regular.as_ref())
            }
            (FontWeight::Regular, FontStyle::Normal) => self.regular.as_ref(),
        }
    }

    /// Get mutable reference to the font data for the specified weight and style
    pub fn get_variant_mut(
        &mut self,
        weight: FontWeight,
        style: FontStyle,
    ) -> Option<&mut FontData> {
        let name = self.get_variant(weight, style)?.name.clone();
        self.variants_mut().find(|variant| variant.name == name)
    }

    /// All loaded variants
    pub fn variants(&self) -> impl Iterator<Item = &FontData> {
        [
            &self.regular,
            &self.bold,
            &self.italic,
            &self.bold_italic,
        ]
        .into_iter()
        .flatten()
    }

    fn variants_mut(&mut self) -> impl Iterator<Item = &mut FontData> {
        [
            &mut self.regular,
            &mut self.bold,
            &mut self.italic,
            &mut self.bold_italic,
        ]
        .into_iter()
        .flatten()
    }
}

/// Builder for registering TrueType font families
#[derive(Default)]
pub struct FontFamilyBuilder {
    regular: Option<Vec<u8>>,
    bold: Option<Vec<u8>>,
    italic: Option<Vec<u8>>,
    bold_italic: Option<Vec<u8>>,
}

impl FontFamilyBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn regular(mut self, ttf_data: Vec<u8>) -> Self {
        self.regular = Some(ttf_data);
        self
    }

    pub fn bold(mut self, ttf_data: Vec<u8>) -> Self {
        self.bold = Some(ttf_data);
        self
    }

    pub fn italic(mut self, ttf_data: Vec<u8>) -> Self {
        self.italic = Some(ttf_data);
        self
    }

    pub fn bold_italic(mut self, ttf_data: Vec<u8>) -> Self {
        self.bold_italic = Some(ttf_data);
        self
    }

    /// Build the FontFamily from the provided TTF data
    pub fn build(self, family_name: &str) -> Result<FontFamily> {
        let Some(regular) = self.regular else {
            return Err(PdfError::FontParseError(
                "FontFamily must have at least a regular variant".to_string(),
            ));
        };

        let load = |suffix: &str, data: Option<Vec<u8>>| {
            data.map(|data| FontData::from_ttf(&format!("{family_name}-{suffix}"), data))
                .transpose()
        };

        Ok(FontFamily {
            regular: load("regular", Some(regular))?,
            bold: load("bold", self.bold)?,
            italic: load("italic", self.italic)?,
            bold_italic: load("bold-italic", self.bold_italic)?,
        })
    }
}

impl FontData {
    /// Create font data for a standard font
    pub fn builtin(name: &str, font: BuiltinFont) -> Self {
        Self {
            name: name.to_string(),
            used_chars: BTreeSet::new(),
            source: FontSource::Builtin(font),
        }
    }

    /// Create font data from TTF bytes
    ///
    /// The bytes are validated here and re-parsed on demand.
    pub fn from_ttf(name: &str, ttf_data: Vec<u8>) -> Result<Self> {
        ttf_parser::Face::parse(&ttf_data, 0)
            .map_err(|e| PdfError::FontParseError(format!("{name}: {e}")))?;

        Ok(Self {
            name: name.to_string(),
            used_chars: BTreeSet::new(),
            source: FontSource::TrueType(ttf_data),
        })
    }

    /// Whether this is one of the standard (non-embedded) fonts
    pub fn is_builtin(&self) -> bool {
        matches!(self.source, FontSource::Builtin(_))
    }

    fn face(&self) -> Option<ttf_parser::Face<'_>> {
        match &self.source {
            FontSource::TrueType(data) => ttf_parser::Face::parse(data, 0).ok(),
            FontSource::Builtin(_) => None,
        }
    }

    /// Add characters to the used set
    pub fn add_chars(&mut self, text: &str) {
        self.used_chars.extend(text.chars());
    }

    /// Get glyph ID for a character (TrueType fonts only)
    pub fn glyph_id(&self, c: char) -> Option<u16> {
        self.face()
            .and_then(|face| face.glyph_index(c).map(|id| id.0))
    }

    /// Check if font can render the given character
    pub fn has_glyph(&self, c: char) -> bool {
        match self.source {
            FontSource::Builtin(_) => winansi_byte(c).is_some(),
            FontSource::TrueType(_) => self.glyph_id(c).map(|id| id != 0).unwrap_or(false),
        }
    }

    /// Calculate text width in points for a given font size
    pub fn text_width_points(&self, text: &str, font_size: f32) -> f32 {
        match &self.source {
            FontSource::Builtin(font) => {
                let units: u32 = text.chars().map(|c| font.char_width(c) as u32).sum();
                units as f32 / 1000.0 * font_size
            }
            FontSource::TrueType(_) => {
                let Some(face) = self.face() else {
                    return 0.0;
                };
                let units: u32 = text
                    .chars()
                    .filter_map(|c| face.glyph_index(c))
                    .filter_map(|gid| face.glyph_hor_advance(gid))
                    .map(u32::from)
                    .sum();
                units as f32 / face.units_per_em() as f32 * font_size
            }
        }
    }

    /// Encode text as a string operand for the Tj operator
    ///
    /// Standard fonts use a WinAnsi literal string (unmappable characters
    /// become `?`); TrueType fonts use 2-byte glyph IDs in hex.
    pub fn encode_text(&self, text: &str) -> String {
        match &self.source {
            FontSource::Builtin(_) => {
                let mut result = String::from("(");
                for c in text.chars() {
                    let byte = winansi_byte(c).unwrap_or(b'?');
                    match byte {
                        b'(' | b')' | b'\\' => {
                            result.push('\\');
                            result.push(byte as char);
                        }
                        0x20..=0x7E => result.push(byte as char),
                        _ => result.push_str(&format!("\\{byte:03o}")),
                    }
                }
                result.push(')');
                result
            }
            FontSource::TrueType(_) => {
                let face = self.face();
                let mut result = String::from("<");
                for c in text.chars() {
                    let gid = face
                        .as_ref()
                        .and_then(|face| face.glyph_index(c))
                        .map(|id| id.0)
                        .unwrap_or(0);
                    result.push_str(&format!("{gid:04X}"));
                }
                result.push('>');
                result
            }
        }
    }

    /// Generate all PDF objects needed to reference this font
    pub fn to_pdf_objects(&self) -> Result<FontObjects> {
        match &self.source {
            FontSource::Builtin(font) => Ok(FontObjects::Simple(Dictionary::from_iter(vec![
                ("Type", "Font".into()),
                ("Subtype", "Type1".into()),
                ("BaseFont", Object::Name(font.base_font().as_bytes().to_vec())),
                ("Encoding", "WinAnsiEncoding".into()),
            ]))),
            FontSource::TrueType(data) => self.composite_objects(data),
        }
    }

    fn composite_objects(&self, ttf_data: &[u8]) -> Result<FontObjects> {
        let face = ttf_parser::Face::parse(ttf_data, 0)
            .map_err(|e| PdfError::FontParseError(format!("{}: {e}", self.name)))?;
        let font_name = Object::Name(self.name.clone().into_bytes());
        let scale = 1000.0 / face.units_per_em() as f64;
        let to_glyph_space = |v: i16| ((v as f64) * scale).round() as i64;

        let tounicode_content = self.generate_tounicode_cmap();
        let tounicode_stream = Stream::new(
            Dictionary::from_iter(vec![("Type", "CMap".into())]),
            tounicode_content.into_bytes(),
        );

        let mut encoder = ZlibEncoder::new(Vec::new(), Compression::default());
        encoder.write_all(ttf_data)?;
        let compressed = encoder.finish()?;
        let font_file_stream = Stream::new(
            Dictionary::from_iter(vec![
                ("Filter", "FlateDecode".into()),
                ("Length1", (ttf_data.len() as i64).into()),
            ]),
            compressed,
        );

        let bbox = face.global_bounding_box();
        let ascender = to_glyph_space(face.ascender());
        let descender = to_glyph_space(face.descender());
        let cap_height = face
            .capital_height()
            .map(to_glyph_space)
            .unwrap_or(ascender);

        let font_descriptor = Dictionary::from_iter(vec![
            ("Type", "FontDescriptor".into()),
            ("FontName", font_name.clone()),
            ("Flags", 4.into()),
            (
                "FontBBox",
                vec![
                    to_glyph_space(bbox.x_min).into(),
                    to_glyph_space(bbox.y_min).into(),
                    to_glyph_space(bbox.x_max).into(),
                    to_glyph_space(bbox.y_max).into(),
                ]
                .into(),
            ),
            ("ItalicAngle", 0.into()),
            ("Ascent", ascender.into()),
            ("Descent", descender.into()),
            ("CapHeight", cap_height.into()),
            ("StemV", 80.into()),
        ]);

        let cid_system_info = Dictionary::from_iter(vec![
            ("Registry", Object::string_literal("Adobe")),
            ("Ordering", Object::string_literal("Identity")),
            ("Supplement", 0.into()),
        ]);

        let cid_font = Dictionary::from_iter(vec![
            ("Type", "Font".into()),
            ("Subtype", "CIDFontType2".into()),
            ("BaseFont", font_name.clone()),
            ("CIDSystemInfo", cid_system_info.into()),
            ("CIDToGIDMap", "Identity".into()),
            ("W", self.generate_widths_array(&face, scale).into()),
            ("DW", 1000.into()),
        ]);

        let type0_font = Dictionary::from_iter(vec![
            ("Type", "Font".into()),
            ("Subtype", "Type0".into()),
            ("BaseFont", font_name),
            ("Encoding", "Identity-H".into()),
        ]);

        Ok(FontObjects::Composite(Box::new(CompositeFont {
            type0_font,
            cid_font,
            font_descriptor,
            font_file_stream,
            tounicode_stream,
        })))
    }

    /// Generate /W array for the glyphs used: `[gid [width] gid [width] ...]`
    fn generate_widths_array(&self, face: &ttf_parser::Face<'_>, scale: f64) -> Vec<Object> {
        let gids: BTreeSet<u16> = self
            .used_chars
            .iter()
            .filter_map(|&c| face.glyph_index(c).map(|id| id.0))
            .collect();

        let mut widths = Vec::with_capacity(gids.len() * 2);
        for gid in gids {
            let advance = face
                .glyph_hor_advance(ttf_parser::GlyphId(gid))
                .map(|w| (w as f64 * scale).round() as i64)
                .unwrap_or(1000);
            widths.push((gid as i64).into());
            widths.push(vec![advance.into()].into());
        }
        widths
    }

    /// Generate ToUnicode CMap stream content mapping glyph IDs back to text
    fn generate_tounicode_cmap(&self) -> String {
        let mut cmap = String::new();

        cmap.push_str("/CIDInit /ProcSet findresource begin\n");
        cmap.push_str("12 dict begin\n");
        cmap.push_str("begincmap\n");
        cmap.push_str("/CIDSystemInfo << /Registry (Adobe) /Ordering (UCS) /Supplement 0 >> def\n");
        cmap.push_str("/CMapName /Adobe-Identity-UCS def\n");
        cmap.push_str("/CMapType 2 def\n");
        cmap.push_str("1 begincodespacerange\n");
        cmap.push_str("<0000> <FFFF>\n");
        cmap.push_str("endcodespacerange\n");

        let face = self.face();
        let mappings: Vec<(u16, char)> = self
            .used_chars
            .iter()
            .filter_map(|&c| {
                let gid = face.as_ref()?.glyph_index(c)?.0;
                Some((gid, c))
            })
            .collect();

        // At most 100 entries per bfchar section
        for chunk in mappings.chunks(100) {
            cmap.push_str(&format!("{} beginbfchar\n", chunk.len()));
            for (gid, c) in chunk {
                let mut utf16 = [0u16; 2];
                let units: String = c
                    .encode_utf16(&mut utf16)
                    .iter()
                    .map(|unit| format!("{unit:04X}"))
                    .collect();
                cmap.push_str(&format!("<{gid:04X}> <{units}>\n"));
            }
            cmap.push_str("endbfchar\n");
        }

        cmap.push_str("endcmap\n");
        cmap.push_str("CMapName currentdict /CMap defineresource pop\n");
        cmap.push_str("end\n");
        cmap.push_str("end\n");

        cmap
    }
}
