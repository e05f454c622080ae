use once_cell::sync::Lazy;
use regex::Regex;

/// Maximum stored length for any free-text field, in characters.
const MAX_TEXT_LEN: usize = 2000;

static HTML_TAG: Lazy<Regex> = Lazy::new(|| Regex::new(r"<[^>]*>").expect("valid regex"));

/// Cleans a free-text value before it reaches storage: missing values
/// become the empty string, NUL bytes and HTML-tag-like fragments are
/// removed, surrounding whitespace is trimmed and the result is capped
/// at 2000 characters.
pub fn sanitize(value: Option<&str>) -> String {
    let Some(value) = value else {
        return String::new();
    };

    let without_nul = value.replace('\0', "");
    let without_tags = HTML_TAG.replace_all(&without_nul, "");

    without_tags.trim().chars().take(MAX_TEXT_LEN).collect()
}

/// Escapes SQL LIKE wildcards (`%` and `_`) so user input can be used
/// as a literal substring pattern. Queries embedding the result must
/// add `ESCAPE '\'`.
pub fn escape_like(value: &str) -> String {
    if value.is_empty() {
        return String::new();
    }
    value
        .replace('\\', "\\\\")
        .replace('%', "\\%")
        .replace('_', "\\_")
}
