//! Segment-splice placeholder substitution
//!
//! A paragraph is treated as the concatenation of its segments. Placeholders
//! are located in that text, then the segment list is rebuilt by copying the
//! untouched byte ranges with their original styles and splicing each value
//! in as its own segment. Placeholders may straddle segment boundaries.

use crate::paragraph::{RichParagraph, RunStyle, Segment};
use std::collections::BTreeMap;

/// Field whose value is never underlined
pub const DEFAULT_EXEMPT_KEY: &str = "business_name";

const OPEN: &str = "{{";
const CLOSE: &str = "}}";

/// Options controlling how substituted values are styled
#[derive(Debug, Clone)]
pub struct SubstitutionOptions {
    /// Keys whose values keep the surrounding style instead of being underlined
    pub exempt_keys: Vec<String>,
}

impl Default for SubstitutionOptions {
    fn default() -> Self {
        Self {
            exempt_keys: vec![DEFAULT_EXEMPT_KEY.to_string()],
        }
    }
}

impl SubstitutionOptions {
    pub fn is_exempt(&self, key: &str) -> bool {
        self.exempt_keys.iter().any(|k| k == key)
    }
}

/// A placeholder found in the original text (byte offsets, `end` exclusive)
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlaceholderMatch {
    pub key: String,
    pub start: usize,
    pub end: usize,
}

/// Where a value landed in the rewritten text (byte offsets, `end` exclusive)
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SubstitutedRange {
    pub key: String,
    pub start: usize,
    pub end: usize,
}

/// Result of substituting a paragraph
#[derive(Debug, Clone, PartialEq)]
pub struct Substitution {
    pub paragraph: RichParagraph,
    pub ranges: Vec<SubstitutedRange>,
}

/// Find `{{key}}` occurrences for the keys in `values`
///
/// Matching is leftmost and non-overlapping. When several keys match at the
/// same position the longest one wins. Text such as `{{unknown}}` is left
/// alone and scanning resumes one byte later, so `{{{key}}}` still finds
/// `{{key}}`.
pub fn find_placeholders(text: &str, values: &BTreeMap<String, String>) -> Vec<PlaceholderMatch> {
    let mut matches = Vec::new();
    let mut pos = 0;

    while let Some(offset) = text[pos..].find(OPEN) {
        let start = pos + offset;
        let rest = &text[start + OPEN.len()..];

        let key = values
            .keys()
            .filter(|key| {
                rest.starts_with(key.as_str()) && rest[key.len()..].starts_with(CLOSE)
            })
            .max_by_key(|key| key.len());

        match key {
            Some(key) => {
                let end = start + OPEN.len() + key.len() + CLOSE.len();
                matches.push(PlaceholderMatch {
                    key: key.clone(),
                    start,
                    end,
                });
                pos = end;
            }
            // `{` is one byte, so start + 1 is a char boundary
            None => pos = start + 1,
        }
    }

    matches
}

/// Replace every known placeholder in a paragraph
///
/// Returns `None` when the paragraph contains no placeholder for the given
/// keys; the caller then keeps the original untouched. Otherwise text outside
/// placeholders keeps the style of the segment it came from, and each value
/// takes the style of the segment where its placeholder starts, underlined
/// unless the key is exempt. Values are inserted literally and never scanned
/// for further placeholders.
pub fn substitute_paragraph(
    paragraph: &RichParagraph,
    values: &BTreeMap<String, String>,
    options: &SubstitutionOptions,
) -> Option<Substitution> {
    let text = paragraph.text();
    let matches = find_placeholders(&text, values);
    if matches.is_empty() {
        return None;
    }

    let mut splicer = Splicer::new(paragraph);
    let mut ranges = Vec::with_capacity(matches.len());

    for placeholder in &matches {
        splicer.copy_original(placeholder.start);

        let value = values
            .get(&placeholder.key)
            .map(String::as_str)
            .unwrap_or_default();
        let origin = splicer.style_at(placeholder.start);
        let style = if options.is_exempt(&placeholder.key) {
            origin
        } else {
            origin.underlined()
        };

        let start = splicer.output_len;
        splicer.push(value, style);
        ranges.push(SubstitutedRange {
            key: placeholder.key.clone(),
            start,
            end: splicer.output_len,
        });

        splicer.cursor = placeholder.end;
    }
    splicer.copy_original(text.len());

    log::debug!(
        "substituted {} placeholder(s): {}",
        ranges.len(),
        ranges
            .iter()
            .map(|r| r.key.as_str())
            .collect::<Vec<_>>()
            .join(", ")
    );

    Some(Substitution {
        paragraph: RichParagraph {
            align: paragraph.align,
            segments: splicer.output,
        },
        ranges,
    })
}

/// Rebuilds a segment list from byte ranges of the original paragraph
struct Splicer<'a> {
    source: &'a RichParagraph,
    /// Byte range of each source segment in the concatenated text
    bounds: Vec<(usize, usize)>,
    /// Next original byte not yet copied or skipped
    cursor: usize,
    output: Vec<Segment>,
    output_len: usize,
}

impl<'a> Splicer<'a> {
    fn new(source: &'a RichParagraph) -> Self {
        let mut bounds = Vec::with_capacity(source.segments.len());
        let mut offset = 0;
        for segment in &source.segments {
            bounds.push((offset, offset + segment.text.len()));
            offset += segment.text.len();
        }

        Self {
            source,
            bounds,
            cursor: 0,
            output: Vec::new(),
            output_len: 0,
        }
    }

    /// Style of the segment holding byte `pos`
    fn style_at(&self, pos: usize) -> RunStyle {
        self.bounds
            .iter()
            .position(|&(start, end)| start <= pos && pos < end)
            .or_else(|| self.source.segments.len().checked_sub(1))
            .map(|index| self.source.segments[index].style.clone())
            .unwrap_or_default()
    }

    /// Copy original text from the cursor up to `until`, segment by segment
    fn copy_original(&mut self, until: usize) {
        for (index, &(start, end)) in self.bounds.iter().enumerate() {
            let from = start.max(self.cursor);
            let to = end.min(until);
            if from < to {
                let segment = &self.source.segments[index];
                let piece = &segment.text[from - start..to - start];
                self.output.push(Segment::new(piece, segment.style.clone()));
                self.output_len += piece.len();
            }
        }
        self.cursor = self.cursor.max(until);
    }

    fn push(&mut self, text: &str, style: RunStyle) {
        if text.is_empty() {
            return;
        }
        self.output.push(Segment::new(text, style));
        self.output_len += text.len();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn values(pairs: &[(&str, &str)]) -> BTreeMap<String, String> {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    fn bold() -> RunStyle {
        RunStyle {
            bold: Some(true),
            ..Default::default()
        }
    }

    fn red() -> RunStyle {
        RunStyle {
            color: Some("FF0000".to_string()),
            ..Default::default()
        }
    }

    #[test]
    fn test_find_placeholders_leftmost() {
        let found = find_placeholders(
            "{{a}} and {{b}} and {{missing}}",
            &values(&[("a", "1"), ("b", "2")]),
        );
        assert_eq!(
            found,
            vec![
                PlaceholderMatch {
                    key: "a".into(),
                    start: 0,
                    end: 5
                },
                PlaceholderMatch {
                    key: "b".into(),
                    start: 10,
                    end: 15
                },
            ]
        );
    }

    #[test]
    fn test_find_placeholders_with_extra_brace() {
        let found = find_placeholders("{{{name}}}", &values(&[("name", "x")]));
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].start, 1);
    }

    #[test]
    fn test_dear_seller_name() {
        let paragraph = RichParagraph::new(vec![Segment::new("Dear {{seller_name}},", bold())]);
        let result = substitute_paragraph(
            &paragraph,
            &values(&[("seller_name", "Acme")]),
            &SubstitutionOptions::default(),
        )
        .unwrap();

        assert_eq!(result.paragraph.text(), "Dear Acme,");
        assert_eq!(
            result.paragraph.segments,
            vec![
                Segment::new("Dear ", bold()),
                Segment::new("Acme", bold().underlined()),
                Segment::new(",", bold()),
            ]
        );
        assert_eq!(
            result.ranges,
            vec![SubstitutedRange {
                key: "seller_name".into(),
                start: 5,
                end: 9
            }]
        );
    }

    #[test]
    fn test_placeholder_split_across_segments() {
        let paragraph = RichParagraph::new(vec![
            Segment::new("Dear ", RunStyle::default()),
            Segment::new("{{seller", bold()),
            Segment::new("_name}}", red()),
            Segment::new(", welcome", red()),
        ]);
        let result = substitute_paragraph(
            &paragraph,
            &values(&[("seller_name", "Acme")]),
            &SubstitutionOptions::default(),
        )
        .unwrap();

        assert_eq!(
            result.paragraph.segments,
            vec![
                Segment::new("Dear ", RunStyle::default()),
                Segment::new("Acme", bold().underlined()),
                Segment::new(", welcome", red()),
            ]
        );
    }

    #[test]
    fn test_no_placeholder_returns_none() {
        let paragraph = RichParagraph::new(vec![Segment::new("Nothing {{here}}", bold())]);
        let result = substitute_paragraph(
            &paragraph,
            &values(&[("seller_name", "Acme")]),
            &SubstitutionOptions::default(),
        );
        assert!(result.is_none());
    }

    #[test]
    fn test_business_name_not_underlined() {
        let paragraph = RichParagraph::from_text("Party A: {{business_name}} / {{seller_name}}");
        let result = substitute_paragraph(
            &paragraph,
            &values(&[
                ("business_name", "Number Seven Trading Limited"),
                ("seller_name", "Acme"),
            ]),
            &SubstitutionOptions::default(),
        )
        .unwrap();

        let business = result
            .paragraph
            .segments
            .iter()
            .find(|s| s.text == "Number Seven Trading Limited")
            .unwrap();
        let seller = result
            .paragraph
            .segments
            .iter()
            .find(|s| s.text == "Acme")
            .unwrap();
        assert!(!business.style.is_underlined());
        assert!(seller.style.is_underlined());
    }

    #[test]
    fn test_values_are_not_rescanned() {
        let paragraph = RichParagraph::from_text("{{a}}-{{b}}");
        let result = substitute_paragraph(
            &paragraph,
            &values(&[("a", "{{b}}"), ("b", "B")]),
            &SubstitutionOptions::default(),
        )
        .unwrap();
        assert_eq!(result.paragraph.text(), "{{b}}-B");
    }

    #[test]
    fn test_repeated_and_empty_values() {
        let paragraph = RichParagraph::from_text("{{x}}|{{y}}|{{x}}");
        let result = substitute_paragraph(
            &paragraph,
            &values(&[("x", "中文"), ("y", "")]),
            &SubstitutionOptions::default(),
        )
        .unwrap();

        assert_eq!(result.paragraph.text(), "中文||中文");
        let spans: Vec<(usize, usize)> = result.ranges.iter().map(|r| (r.start, r.end)).collect();
        assert_eq!(spans, vec![(0, 6), (7, 7), (8, 14)]);
    }

    #[test]
    fn test_custom_exempt_keys() {
        let options = SubstitutionOptions {
            exempt_keys: vec!["agreement_date".to_string()],
        };
        let paragraph = RichParagraph::from_text("{{agreement_date}} {{business_name}}");
        let result = substitute_paragraph(
            &paragraph,
            &values(&[("agreement_date", "2024-01-01"), ("business_name", "Co")]),
            &options,
        )
        .unwrap();

        assert!(!result.paragraph.segments[0].style.is_underlined());
        assert!(result.paragraph.segments[2].style.is_underlined());
    }
}
