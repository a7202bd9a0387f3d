//! Output file naming

/// Longest seller name kept in an output file name, in characters
pub const MAX_COMPONENT_CHARS: usize = 50;

/// Make a user-supplied name safe to embed in a file name
///
/// `/`, `\` and `:` become `_` and the result is cut to
/// [`MAX_COMPONENT_CHARS`] characters.
pub fn sanitize_file_component(name: &str) -> String {
    name.chars()
        .map(|c| match c {
            '/' | '\\' | ':' => '_',
            other => other,
        })
        .take(MAX_COMPONENT_CHARS)
        .collect()
}

/// Base name of a template file: `General_Agreement_Template.docx` -> `General_Agreement`
pub fn template_base_name(template_file: &str) -> String {
    let file_name = template_file
        .rsplit(['/', '\\'])
        .next()
        .unwrap_or(template_file);
    file_name.replace(".docx", "").replace("_Template", "")
}

/// Output file prefix: `<seller>-<base>_<timestamp>`, or `<base>_<timestamp>`
/// when the seller name is absent or blank
pub fn file_prefix(seller_name: Option<&str>, base_name: &str, timestamp: &str) -> String {
    match seller_name.map(sanitize_file_component) {
        Some(seller) if !seller.trim().is_empty() => format!("{seller}-{base_name}_{timestamp}"),
        _ => format!("{base_name}_{timestamp}"),
    }
}
