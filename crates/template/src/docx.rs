//! `.docx` template reading and rewriting
//!
//! The package is kept as an ordered list of zip entries. Only
//! `word/document.xml` is ever modified, and within it only the byte ranges
//! of paragraphs that contained a placeholder are replaced.

use crate::paragraph::{ParagraphAlign, RichParagraph, RunStyle, Segment};
use crate::substitute::{substitute_paragraph, SubstitutionOptions};
use crate::{Result, TemplateError};
use quick_xml::events::{BytesStart, Event};
use quick_xml::Reader;
use std::collections::BTreeMap;
use std::io::{Cursor, Read, Write};
use std::ops::Range;
use std::path::Path;
use zip::write::SimpleFileOptions;
use zip::CompressionMethod;

/// Main document part inside the package
pub const DOCUMENT_PART: &str = "word/document.xml";

/// Schema order of `w:rPr` children (CT_RPr)
const RPR_ORDER: [&str; 39] = [
    "rStyle",
    "rFonts",
    "b",
    "bCs",
    "i",
    "iCs",
    "caps",
    "smallCaps",
    "strike",
    "dstrike",
    "outline",
    "shadow",
    "emboss",
    "imprint",
    "noProof",
    "snapToGrid",
    "vanish",
    "webHidden",
    "color",
    "spacing",
    "w",
    "kern",
    "position",
    "sz",
    "szCs",
    "highlight",
    "u",
    "effect",
    "bdr",
    "shd",
    "fitText",
    "vertAlign",
    "rtl",
    "cs",
    "em",
    "lang",
    "eastAsianLayout",
    "specVanish",
    "oMath",
];

fn xml_error(err: impl std::fmt::Display) -> TemplateError {
    TemplateError::XmlError(err.to_string())
}

struct ZipEntry {
    name: String,
    data: Vec<u8>,
    stored: bool,
}

/// An outermost `w:p` element of the document part
#[derive(Debug, Clone)]
struct ParsedParagraph {
    range: Range<usize>,
    start_tag: String,
    properties: String,
    paragraph: RichParagraph,
    /// Holds nested paragraphs (text boxes); never rewritten
    nested: bool,
}

/// Outcome of filling a template
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FillReport {
    /// Number of paragraphs that were rewritten
    pub changed_paragraphs: usize,
    /// Keys substituted, in document order (repeats included)
    pub substituted_keys: Vec<String>,
}

/// A word-processing template held in memory
pub struct DocxTemplate {
    entries: Vec<ZipEntry>,
    document_xml: String,
    paragraphs: Vec<ParsedParagraph>,
}

impl DocxTemplate {
    /// Open a template file
    ///
    /// Fails with [`TemplateError::NotFound`] when the file does not exist.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        if !path.is_file() {
            return Err(TemplateError::NotFound(path.to_path_buf()));
        }

        let bytes = std::fs::read(path)?;
        log::debug!("opened template {} ({} bytes)", path.display(), bytes.len());
        Self::from_bytes(&bytes)
    }

    /// Load a template from package bytes
    pub fn from_bytes(bytes: &[u8]) -> Result<Self> {
        let mut archive = zip::ZipArchive::new(Cursor::new(bytes))?;
        let mut entries = Vec::with_capacity(archive.len());

        for i in 0..archive.len() {
            let mut entry = archive.by_index(i)?;
            let mut data = Vec::new();
            entry.read_to_end(&mut data)?;
            entries.push(ZipEntry {
                name: entry.name().to_string(),
                stored: entry.compression() == CompressionMethod::Stored,
                data,
            });
        }

        let document = entries
            .iter()
            .find(|entry| entry.name == DOCUMENT_PART)
            .ok_or_else(|| TemplateError::MissingPart(DOCUMENT_PART.to_string()))?;
        let document_xml = String::from_utf8(document.data.clone()).map_err(xml_error)?;
        let paragraphs = parse_paragraphs(&document_xml)?;

        Ok(Self {
            entries,
            document_xml,
            paragraphs,
        })
    }

    /// The document part as currently held
    pub fn document_xml(&self) -> &str {
        &self.document_xml
    }

    /// All outermost paragraphs (body and table cells) in document order
    pub fn paragraphs(&self) -> Vec<RichParagraph> {
        self.paragraphs
            .iter()
            .map(|parsed| parsed.paragraph.clone())
            .collect()
    }

    /// Substitute placeholders in every paragraph
    ///
    /// Paragraphs without a placeholder keep their original XML byte for byte.
    pub fn fill(
        &mut self,
        values: &BTreeMap<String, String>,
        options: &SubstitutionOptions,
    ) -> Result<FillReport> {
        let mut report = FillReport::default();
        let mut replacements = Vec::new();

        for parsed in self.paragraphs.iter().filter(|parsed| !parsed.nested) {
            let Some(substitution) = substitute_paragraph(&parsed.paragraph, values, options)
            else {
                continue;
            };

            report.changed_paragraphs += 1;
            report
                .substituted_keys
                .extend(substitution.ranges.iter().map(|range| range.key.clone()));
            replacements.push((
                parsed.range.clone(),
                write_paragraph(
                    &parsed.start_tag,
                    &parsed.properties,
                    &substitution.paragraph,
                ),
            ));
        }

        if replacements.is_empty() {
            return Ok(report);
        }

        for (range, xml) in replacements.into_iter().rev() {
            self.document_xml.replace_range(range, &xml);
        }
        self.paragraphs = parse_paragraphs(&self.document_xml)?;

        log::info!(
            "filled {} paragraph(s) with {} value(s)",
            report.changed_paragraphs,
            report.substituted_keys.len()
        );
        Ok(report)
    }

    /// Serialize the package
    pub fn to_bytes(&self) -> Result<Vec<u8>> {
        let mut zip = zip::ZipWriter::new(Cursor::new(Vec::new()));
        let deflated = SimpleFileOptions::default().compression_method(CompressionMethod::Deflated);
        let stored = SimpleFileOptions::default().compression_method(CompressionMethod::Stored);

        for entry in &self.entries {
            let options = if entry.stored { stored } else { deflated };
            zip.start_file(entry.name.as_str(), options)?;
            if entry.name == DOCUMENT_PART {
                zip.write_all(self.document_xml.as_bytes())?;
            } else {
                zip.write_all(&entry.data)?;
            }
        }

        Ok(zip.finish()?.into_inner())
    }

    /// Write the package to a file
    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        std::fs::write(path.as_ref(), self.to_bytes()?)?;
        log::info!("saved filled document {}", path.as_ref().display());
        Ok(())
    }
}

fn qualified_name(e: &BytesStart) -> String {
    String::from_utf8_lossy(e.name().as_ref()).into_owned()
}

fn attribute(e: &BytesStart, name: &str) -> Result<Option<String>> {
    match e.try_get_attribute(name).map_err(xml_error)? {
        Some(attr) => Ok(Some(attr.unescape_value().map_err(xml_error)?.into_owned())),
        None => Ok(None),
    }
}

/// Collects one outermost paragraph while the document is scanned
struct ParagraphBuilder {
    start: usize,
    start_tag: String,
    depth: usize,
    nested: bool,
    properties: String,
    properties_start: Option<usize>,
    align: ParagraphAlign,
    run: Option<Segment>,
    run_properties_start: Option<usize>,
    in_text: bool,
    segments: Vec<Segment>,
}

impl ParagraphBuilder {
    fn new(start: usize, start_tag: &str) -> Self {
        Self {
            start,
            start_tag: start_tag.to_string(),
            depth: 1,
            nested: false,
            properties: String::new(),
            properties_start: None,
            align: ParagraphAlign::default(),
            run: None,
            run_properties_start: None,
            in_text: false,
            segments: Vec::new(),
        }
    }

    fn start(&mut self, e: &BytesStart, before: usize) -> Result<()> {
        let name = e.name();
        if name.as_ref() == b"w:p" {
            self.depth += 1;
            self.nested = true;
            return Ok(());
        }
        if self.depth > 1 {
            return Ok(());
        }

        match name.as_ref() {
            b"w:pPr" if self.run.is_none() => self.properties_start = Some(before),
            b"w:jc" if self.properties_start.is_some() => self.read_alignment(e)?,
            b"w:r" if self.run.is_none() => {
                self.run = Some(Segment::new(String::new(), RunStyle::default()))
            }
            b"w:rPr" if self.run.is_some() => self.run_properties_start = Some(before),
            b"w:t" if self.run.is_some() && self.run_properties_start.is_none() => {
                self.in_text = true
            }
            _ => {}
        }
        Ok(())
    }

    fn empty(&mut self, e: &BytesStart, raw: &str) -> Result<()> {
        if self.depth > 1 {
            return Ok(());
        }

        match e.name().as_ref() {
            b"w:pPr" if self.run.is_none() => self.properties = raw.to_string(),
            b"w:jc" if self.properties_start.is_some() => self.read_alignment(e)?,
            name if self.run_properties_start.is_none() => {
                if let Some(run) = self.run.as_mut() {
                    match name {
                        b"w:tab" => run.text.push('\t'),
                        b"w:br" | b"w:cr" => run.text.push('\n'),
                        b"w:noBreakHyphen" => run.text.push('-'),
                        _ => {}
                    }
                }
            }
            _ => {}
        }
        Ok(())
    }

    /// Returns true when the outermost paragraph closed
    fn end(&mut self, name: &[u8], after: usize, xml: &str) -> Result<bool> {
        if name == b"w:p" {
            self.depth -= 1;
            return Ok(self.depth == 0);
        }
        if self.depth > 1 {
            return Ok(false);
        }

        match name {
            b"w:pPr" => {
                if let Some(start) = self.properties_start.take() {
                    self.properties = xml[start..after].to_string();
                }
            }
            b"w:rPr" => {
                if let (Some(start), Some(run)) =
                    (self.run_properties_start.take(), self.run.as_mut())
                {
                    run.style = parse_run_properties(&xml[start..after])?;
                }
            }
            b"w:t" => self.in_text = false,
            b"w:r" => {
                if let Some(run) = self.run.take() {
                    if !run.text.is_empty() {
                        self.segments.push(run);
                    }
                }
            }
            _ => {}
        }
        Ok(false)
    }

    fn text(&mut self, text: &str) {
        if self.depth == 1 && self.in_text {
            if let Some(run) = self.run.as_mut() {
                run.text.push_str(text);
            }
        }
    }

    fn read_alignment(&mut self, e: &BytesStart) -> Result<()> {
        if let Some(value) = attribute(e, "w:val")? {
            self.align = ParagraphAlign::from_jc(&value);
        }
        Ok(())
    }

    fn finish(self, end: usize) -> ParsedParagraph {
        ParsedParagraph {
            range: self.start..end,
            start_tag: self.start_tag,
            properties: self.properties,
            paragraph: RichParagraph {
                align: self.align,
                segments: self.segments,
            },
            nested: self.nested,
        }
    }
}

/// Scan a document part for its outermost `w:p` elements
fn parse_paragraphs(xml: &str) -> Result<Vec<ParsedParagraph>> {
    let mut reader = Reader::from_str(xml);
    let mut paragraphs = Vec::new();
    let mut current: Option<ParagraphBuilder> = None;

    loop {
        let before = reader.buffer_position() as usize;
        let event = reader.read_event().map_err(xml_error)?;
        let after = reader.buffer_position() as usize;

        match event {
            Event::Start(e) => match current.as_mut() {
                Some(builder) => builder.start(&e, before)?,
                None if e.name().as_ref() == b"w:p" => {
                    current = Some(ParagraphBuilder::new(before, &xml[before..after]));
                }
                None => {}
            },
            Event::Empty(e) => {
                if let Some(builder) = current.as_mut() {
                    builder.empty(&e, &xml[before..after])?;
                }
            }
            Event::End(e) => {
                if let Some(builder) = current.as_mut() {
                    if builder.end(e.name().as_ref(), after, xml)? {
                        if let Some(builder) = current.take() {
                            paragraphs.push(builder.finish(after));
                        }
                    }
                }
            }
            Event::Text(t) => {
                if let Some(builder) = current.as_mut() {
                    builder.text(&t.unescape().map_err(xml_error)?);
                }
            }
            Event::Eof => break,
            _ => {}
        }
    }

    log::debug!("parsed {} paragraph(s) from document part", paragraphs.len());
    Ok(paragraphs)
}

fn is_off(value: Option<&str>) -> bool {
    matches!(value, Some("0") | Some("false") | Some("off"))
}

/// Parse a `<w:rPr>` element into a [`RunStyle`]
///
/// Bold, italic and underline become fields. Every other child is kept
/// verbatim in `passthrough`; font name, size and colour are read from their
/// elements as well.
fn parse_run_properties(raw: &str) -> Result<RunStyle> {
    let mut reader = Reader::from_str(raw);
    let mut style = RunStyle::default();
    let mut depth = 0usize;
    let mut child: Option<(String, usize)> = None;

    loop {
        let before = reader.buffer_position() as usize;
        let event = reader.read_event().map_err(xml_error)?;
        let after = reader.buffer_position() as usize;

        match event {
            Event::Start(e) => {
                depth += 1;
                if depth == 2 {
                    child = Some((qualified_name(&e), before));
                }
            }
            Event::Empty(e) if depth == 1 => {
                apply_run_property(&mut style, &e, &raw[before..after])?;
            }
            Event::End(_) => {
                if depth == 2 {
                    if let Some((name, start)) = child.take() {
                        style.passthrough.push((name, raw[start..after].to_string()));
                    }
                }
                depth = depth.saturating_sub(1);
            }
            Event::Eof => break,
            _ => {}
        }
    }

    Ok(style)
}

fn apply_run_property(style: &mut RunStyle, e: &BytesStart, raw: &str) -> Result<()> {
    let name = qualified_name(e);
    let value = attribute(e, "w:val")?;

    match name.as_str() {
        "w:b" => style.bold = Some(!is_off(value.as_deref())),
        "w:i" => style.italic = Some(!is_off(value.as_deref())),
        "w:u" => style.underline = Some(value.as_deref() != Some("none")),
        _ => {
            match name.as_str() {
                "w:rFonts" => {
                    style.font_name = match attribute(e, "w:ascii")? {
                        Some(font) => Some(font),
                        None => attribute(e, "w:eastAsia")?,
                    };
                }
                "w:sz" => {
                    style.font_size = value
                        .as_deref()
                        .and_then(|v| v.parse::<f32>().ok())
                        .map(|half_points| half_points / 2.0);
                }
                "w:color" => {
                    style.color = value.filter(|v| v != "auto");
                }
                _ => {}
            }
            style.passthrough.push((name, raw.to_string()));
        }
    }
    Ok(())
}

fn schema_rank(qualified: &str) -> usize {
    let local = qualified.rsplit(':').next().unwrap_or(qualified);
    RPR_ORDER
        .iter()
        .position(|name| *name == local)
        .unwrap_or(RPR_ORDER.len())
}

fn has_property(style: &RunStyle, name: &str) -> bool {
    style.passthrough.iter().any(|(n, _)| n == name)
}

/// Serialize the children of `<w:rPr>` for a style, in schema order
fn write_run_properties(style: &RunStyle) -> String {
    let mut children: Vec<(String, String)> = style.passthrough.clone();

    let toggle = |name: &str, value: Option<bool>| {
        value.map(|on| {
            let xml = if on {
                format!("<{name}/>")
            } else {
                format!("<{name} w:val=\"0\"/>")
            };
            (name.to_string(), xml)
        })
    };
    children.extend(toggle("w:b", style.bold));
    children.extend(toggle("w:i", style.italic));
    if let Some(underline) = style.underline {
        let value = if underline { "single" } else { "none" };
        children.push(("w:u".to_string(), format!("<w:u w:val=\"{value}\"/>")));
    }

    if let Some(font) = style.font_name.as_deref() {
        if !has_property(style, "w:rFonts") {
            let font = quick_xml::escape::escape(font);
            children.push((
                "w:rFonts".to_string(),
                format!("<w:rFonts w:ascii=\"{font}\" w:hAnsi=\"{font}\" w:eastAsia=\"{font}\"/>"),
            ));
        }
    }
    if let Some(size) = style.font_size {
        if !has_property(style, "w:sz") {
            let half_points = (size * 2.0).round() as u32;
            children.push(("w:sz".to_string(), format!("<w:sz w:val=\"{half_points}\"/>")));
        }
    }
    if let Some(color) = style.color.as_deref() {
        if !has_property(style, "w:color") {
            let color = quick_xml::escape::escape(color);
            children.push(("w:color".to_string(), format!("<w:color w:val=\"{color}\"/>")));
        }
    }

    children.sort_by_key(|(name, _)| schema_rank(name));
    children.into_iter().map(|(_, xml)| xml).collect()
}

fn flush_text(out: &mut String, buffer: &mut String) {
    if !buffer.is_empty() {
        out.push_str("<w:t xml:space=\"preserve\">");
        out.push_str(&quick_xml::escape::escape(buffer.as_str()));
        out.push_str("</w:t>");
        buffer.clear();
    }
}

fn write_run(out: &mut String, segment: &Segment) {
    out.push_str("<w:r>");
    let properties = write_run_properties(&segment.style);
    if !properties.is_empty() {
        out.push_str("<w:rPr>");
        out.push_str(&properties);
        out.push_str("</w:rPr>");
    }

    let mut buffer = String::new();
    for c in segment.text.chars() {
        match c {
            '\t' => {
                flush_text(out, &mut buffer);
                out.push_str("<w:tab/>");
            }
            '\n' => {
                flush_text(out, &mut buffer);
                out.push_str("<w:br/>");
            }
            '\r' => {}
            other => buffer.push(other),
        }
    }
    flush_text(out, &mut buffer);
    out.push_str("</w:r>");
}

/// Rebuild a paragraph from its original start tag and properties
fn write_paragraph(start_tag: &str, properties: &str, paragraph: &RichParagraph) -> String {
    let mut out = String::with_capacity(start_tag.len() + properties.len() + 64);
    out.push_str(start_tag);
    out.push_str(properties);
    for segment in &paragraph.segments {
        write_run(&mut out, segment);
    }
    out.push_str("</w:p>");
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    const BODY_START: &str = r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?><w:document xmlns:w="http://schemas.openxmlformats.org/wordprocessingml/2006/main"><w:body>"#;
    const BODY_END: &str = "</w:body></w:document>";

    fn document(body: &str) -> String {
        format!("{BODY_START}{body}{BODY_END}")
    }

    #[test]
    fn test_parse_runs_and_styles() {
        let xml = document(
            r#"<w:p><w:pPr><w:jc w:val="center"/></w:pPr><w:r><w:rPr><w:b/><w:sz w:val="28"/><w:color w:val="FF0000"/></w:rPr><w:t>Hello</w:t></w:r><w:r><w:t xml:space="preserve"> A&amp;B</w:t><w:tab/><w:t>x</w:t></w:r></w:p>"#,
        );
        let paragraphs = parse_paragraphs(&xml).unwrap();
        assert_eq!(paragraphs.len(), 1);

        let paragraph = &paragraphs[0].paragraph;
        assert_eq!(paragraph.align, ParagraphAlign::Center);
        assert_eq!(paragraph.text(), "Hello A&B\tx");
        let style = &paragraph.segments[0].style;
        assert_eq!(style.bold, Some(true));
        assert_eq!(style.font_size, Some(14.0));
        assert_eq!(style.color.as_deref(), Some("FF0000"));
        assert_eq!(paragraphs[0].properties, r#"<w:pPr><w:jc w:val="center"/></w:pPr>"#);
    }

    #[test]
    fn test_paragraph_ranges_cover_source() {
        let first = r#"<w:p w:rsidR="00AB"><w:r><w:t>One</w:t></w:r></w:p>"#;
        let second = r#"<w:p><w:r><w:t>Two</w:t></w:r></w:p>"#;
        let xml = document(&format!(
            "{first}<w:tbl><w:tr><w:tc>{second}</w:tc></w:tr></w:tbl>"
        ));

        let paragraphs = parse_paragraphs(&xml).unwrap();
        assert_eq!(paragraphs.len(), 2);
        assert_eq!(&xml[paragraphs[0].range.clone()], first);
        assert_eq!(&xml[paragraphs[1].range.clone()], second);
        assert_eq!(paragraphs[0].start_tag, r#"<w:p w:rsidR="00AB">"#);
    }

    #[test]
    fn test_nested_paragraphs_are_flagged() {
        let xml = document(
            r#"<w:p><w:r><w:t>Outer</w:t></w:r><w:r><w:txbxContent><w:p><w:r><w:t>Inner</w:t></w:r></w:p></w:txbxContent></w:r></w:p>"#,
        );
        let paragraphs = parse_paragraphs(&xml).unwrap();
        assert_eq!(paragraphs.len(), 1);
        assert!(paragraphs[0].nested);
        assert_eq!(paragraphs[0].paragraph.text(), "Outer");
    }

    #[test]
    fn test_run_properties_passthrough_and_order() {
        let style = parse_run_properties(
            r#"<w:rPr><w:rFonts w:ascii="Arial" w:eastAsia="SimSun"/><w:u w:val="none"/><w:szCs w:val="24"/></w:rPr>"#,
        )
        .unwrap();
        assert_eq!(style.font_name.as_deref(), Some("Arial"));
        assert_eq!(style.underline, Some(false));

        let written = write_run_properties(&style.underlined());
        assert_eq!(
            written,
            r#"<w:rFonts w:ascii="Arial" w:eastAsia="SimSun"/><w:szCs w:val="24"/><w:u w:val="single"/>"#
        );
    }

    #[test]
    fn test_off_toggles() {
        let style = parse_run_properties(r#"<w:rPr><w:b w:val="0"/><w:i w:val="false"/></w:rPr>"#)
            .unwrap();
        assert_eq!(style.bold, Some(false));
        assert_eq!(style.italic, Some(false));
        assert!(style.passthrough.is_empty());
    }

    #[test]
    fn test_write_paragraph_escapes_and_breaks() {
        let paragraph = RichParagraph::new(vec![Segment::plain("a<b\nc\td")]);
        let xml = write_paragraph("<w:p>", "", &paragraph);
        assert_eq!(
            xml,
            r#"<w:p><w:r><w:t xml:space="preserve">a&lt;b</w:t><w:br/><w:t xml:space="preserve">c</w:t><w:tab/><w:t xml:space="preserve">d</w:t></w:r></w:p>"#
        );
    }
}
