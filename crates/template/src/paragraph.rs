//! Rich paragraph model

/// Horizontal paragraph alignment
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ParagraphAlign {
    #[default]
    Left,
    Center,
    Right,
    Justify,
}

impl ParagraphAlign {
    /// Parse a WordprocessingML `w:jc` value
    pub fn from_jc(value: &str) -> Self {
        match value {
            "center" => ParagraphAlign::Center,
            "right" | "end" => ParagraphAlign::Right,
            "both" | "distribute" => ParagraphAlign::Justify,
            _ => ParagraphAlign::Left,
        }
    }
}

/// Character formatting of a run of text
///
/// `None` means "inherit from the paragraph/document defaults".
#[derive(Debug, Clone, PartialEq, Default)]
pub struct RunStyle {
    pub bold: Option<bool>,
    pub italic: Option<bool>,
    pub underline: Option<bool>,
    /// Latin font name
    pub font_name: Option<String>,
    /// Font size in points
    pub font_size: Option<f32>,
    /// `RRGGBB` colour
    pub color: Option<String>,
    /// Run properties not modelled above, as `(element name, verbatim XML)`
    pub passthrough: Vec<(String, String)>,
}

impl RunStyle {
    /// Copy of this style with underline switched on
    pub fn underlined(&self) -> Self {
        Self {
            underline: Some(true),
            ..self.clone()
        }
    }

    pub fn is_bold(&self) -> bool {
        self.bold.unwrap_or(false)
    }

    pub fn is_italic(&self) -> bool {
        self.italic.unwrap_or(false)
    }

    pub fn is_underlined(&self) -> bool {
        self.underline.unwrap_or(false)
    }
}

/// A run of text sharing one style
#[derive(Debug, Clone, PartialEq)]
pub struct Segment {
    pub text: String,
    pub style: RunStyle,
}

impl Segment {
    pub fn new(text: impl Into<String>, style: RunStyle) -> Self {
        Self {
            text: text.into(),
            style,
        }
    }

    /// Segment with default formatting
    pub fn plain(text: impl Into<String>) -> Self {
        Self::new(text, RunStyle::default())
    }
}

/// A paragraph as an ordered list of styled segments
#[derive(Debug, Clone, PartialEq, Default)]
pub struct RichParagraph {
    pub align: ParagraphAlign,
    pub segments: Vec<Segment>,
}

impl RichParagraph {
    pub fn new(segments: Vec<Segment>) -> Self {
        Self {
            align: ParagraphAlign::default(),
            segments,
        }
    }

    /// Single unstyled segment
    pub fn from_text(text: &str) -> Self {
        Self::new(vec![Segment::plain(text)])
    }

    pub fn with_align(mut self, align: ParagraphAlign) -> Self {
        self.align = align;
        self
    }

    /// Concatenated text of all segments
    pub fn text(&self) -> String {
        self.segments.iter().map(|s| s.text.as_str()).collect()
    }

    /// True when the paragraph holds no visible text
    pub fn is_blank(&self) -> bool {
        self.segments.iter().all(|s| s.text.trim().is_empty())
    }
}
