//! Content stream operators for text and simple vector graphics

use crate::document::Color;
use crate::Align;

/// Context for rendering text
pub struct TextRenderContext {
    /// PDF font resource name (e.g., "F1")
    pub font_name: String,
    /// Font size in points
    pub font_size: f32,
    /// Text width in points (for alignment)
    pub text_width: f64,
    /// Text color (RGB)
    pub color: Color,
}

/// How a rectangle path is painted
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum RectPaint {
    /// Fill with the given color
    Fill(Color),
    /// Stroke the outline with the given color and line width
    Stroke(Color, f64),
}

/// Format a number for a content stream: at most 2 decimals, no trailing zeros
pub(crate) fn fmt_num(value: f64) -> String {
    let formatted = format!("{value:.2}");
    let trimmed = if formatted.contains('.') {
        formatted.trim_end_matches('0').trim_end_matches('.')
    } else {
        formatted.as_str()
    };
    match trimmed {
        "-0" => "0".to_string(),
        other => other.to_string(),
    }
}

fn color_components(color: Color) -> String {
    format!(
        "{} {} {}",
        fmt_num(color.r as f64),
        fmt_num(color.g as f64),
        fmt_num(color.b as f64)
    )
}

/// Generate PDF operators for text insertion
///
/// Creates the text operators (BT, rg, Tf, Td, Tj, ET) to render text at a
/// specific position with alignment support.
///
/// # Arguments
/// * `text_operand` - Encoded string operand (e.g., "(Hello)" or "<00410042>")
/// * `x` - X coordinate in points (PDF coordinates, from left)
/// * `y` - Y coordinate in points (PDF coordinates, from bottom)
/// * `align` - Text alignment relative to `x`
/// * `ctx` - Text rendering context
pub fn generate_text_operators(
    text_operand: &str,
    x: f64,
    y: f64,
    align: Align,
    ctx: &TextRenderContext,
) -> Vec<u8> {
    let x_offset = match align {
        Align::Left => 0.0,
        Align::Center => -ctx.text_width / 2.0,
        Align::Right => -ctx.text_width,
    };

    let mut ops = String::new();
    ops.push_str("BT\n");
    ops.push_str(&format!("{} rg\n", color_components(ctx.color)));
    ops.push_str(&format!(
        "/{} {} Tf\n",
        ctx.font_name,
        fmt_num(ctx.font_size as f64)
    ));
    ops.push_str(&format!("{} {} Td\n", fmt_num(x + x_offset), fmt_num(y)));
    ops.push_str(&format!("{text_operand} Tj\n"));
    ops.push_str("ET\n");

    ops.into_bytes()
}

/// Generate operators for a straight stroked line (PDF coordinates)
pub fn generate_line_operators(
    x1: f64,
    y1: f64,
    x2: f64,
    y2: f64,
    width: f64,
    color: Color,
) -> Vec<u8> {
    format!(
        "q\n{} RG\n{} w\n{} {} m\n{} {} l\nS\nQ\n",
        color_components(color),
        fmt_num(width),
        fmt_num(x1),
        fmt_num(y1),
        fmt_num(x2),
        fmt_num(y2)
    )
    .into_bytes()
}

/// Generate operators for a rectangle with its lower-left corner at `(x, y)`
pub fn generate_rect_operators(x: f64, y: f64, width: f64, height: f64, paint: RectPaint) -> Vec<u8> {
    let rect = format!(
        "{} {} {} {} re",
        fmt_num(x),
        fmt_num(y),
        fmt_num(width),
        fmt_num(height)
    );
    match paint {
        RectPaint::Fill(color) => {
            format!("q\n{} rg\n{rect}\nf\nQ\n", color_components(color)).into_bytes()
        }
        RectPaint::Stroke(color, line_width) => format!(
            "q\n{} RG\n{} w\n{rect}\nS\nQ\n",
            color_components(color),
            fmt_num(line_width)
        )
        .into_bytes(),
    }
}

/// Split text into lines that fit within `max_width`
///
/// Words are packed greedily; a word wider than the line on its own is broken
/// between characters, which also covers scripts written without spaces.
/// Explicit newlines always start a new line.
///
/// # Arguments
/// * `text` - Text to split
/// * `max_width` - Maximum line width in points
/// * `measure` - Width of a string in points
pub fn wrap_text<F>(text: &str, max_width: f64, measure: F) -> Vec<String>
where
    F: Fn(&str) -> f64,
{
    let mut lines = Vec::new();

    for raw_line in text.split('\n') {
        let mut current = String::new();

        for word in raw_line.split_whitespace() {
            let candidate = if current.is_empty() {
                word.to_string()
            } else {
                format!("{current} {word}")
            };

            if measure(&candidate) <= max_width {
                current = candidate;
                continue;
            }

            if !current.is_empty() {
                lines.push(std::mem::take(&mut current));
            }

            if measure(word) <= max_width {
                current = word.to_string();
                continue;
            }

            for c in word.chars() {
                let mut extended = current.clone();
                extended.push(c);
                if !current.is_empty() && measure(&extended) > max_width {
                    lines.push(std::mem::take(&mut current));
                    current.push(c);
                } else {
                    current = extended;
                }
            }
        }

        lines.push(current);
    }

    lines
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ctx(text_width: f64) -> TextRenderContext {
        TextRenderContext {
            font_name: "F1".to_string(),
            font_size: 12.0,
            text_width,
            color: Color::black(),
        }
    }

    #[test]
    fn test_fmt_num() {
        assert_eq!(fmt_num(100.0), "100");
        assert_eq!(fmt_num(12.5), "12.5");
        assert_eq!(fmt_num(0.333333), "0.33");
        assert_eq!(fmt_num(-0.001), "0");
    }

    #[test]
    fn test_generate_text_operators_left() {
        let ops = generate_text_operators("(Hi)", 100.0, 700.0, Align::Left, &ctx(50.0));
        let ops_str = String::from_utf8(ops).unwrap();

        assert!(ops_str.contains("BT"));
        assert!(ops_str.contains("/F1 12 Tf"));
        assert!(ops_str.contains("100 700 Td"));
        assert!(ops_str.contains("(Hi) Tj"));
        assert!(ops_str.contains("ET"));
    }

    #[test]
    fn test_generate_text_operators_center() {
        let ops = generate_text_operators("(Hi)", 100.0, 700.0, Align::Center, &ctx(50.0));
        let ops_str = String::from_utf8(ops).unwrap();

        // Center alignment: x - width/2 = 100 - 25 = 75
        assert!(ops_str.contains("75 700 Td"));
    }

    #[test]
    fn test_generate_text_operators_right() {
        let ops = generate_text_operators("(Hi)", 100.0, 700.0, Align::Right, &ctx(50.0));
        let ops_str = String::from_utf8(ops).unwrap();

        assert!(ops_str.contains("50 700 Td"));
    }

    #[test]
    fn test_generate_line_operators() {
        let ops = generate_line_operators(10.0, 20.0, 110.0, 20.0, 0.5, Color::rgb(0.5, 0.5, 0.5));
        let ops_str = String::from_utf8(ops).unwrap();

        assert!(ops_str.contains("0.5 0.5 0.5 RG"));
        assert!(ops_str.contains("0.5 w"));
        assert!(ops_str.contains("10 20 m"));
        assert!(ops_str.contains("110 20 l"));
    }

    #[test]
    fn test_generate_rect_operators_fill() {
        let ops = generate_rect_operators(
            0.0,
            0.0,
            50.0,
            20.0,
            RectPaint::Fill(Color::rgb(0.9, 0.9, 0.95)),
        );
        let ops_str = String::from_utf8(ops).unwrap();

        assert!(ops_str.contains("0.9 0.9 0.95 rg"));
        assert!(ops_str.contains("0 0 50 20 re"));
        assert!(ops_str.contains("\nf\n"));
    }

    #[test]
    fn test_wrap_text_by_width() {
        // Every character is 1 point wide
        let measure = |s: &str| s.chars().count() as f64;
        let lines = wrap_text("hello world foo bar", 11.0, measure);
        assert_eq!(lines, vec!["hello world", "foo bar"]);
    }

    #[test]
    fn test_wrap_text_breaks_long_words() {
        let measure = |s: &str| s.chars().count() as f64;
        let lines = wrap_text("银行账户信息", 4.0, measure);
        assert_eq!(lines, vec!["银行账户", "信息"]);
    }

    #[test]
    fn test_wrap_text_keeps_newlines() {
        let measure = |s: &str| s.chars().count() as f64;
        let lines = wrap_text("a\n\nb", 10.0, measure);
        assert_eq!(lines, vec!["a", "", "b"]);
    }
}
