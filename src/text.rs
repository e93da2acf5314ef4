//! Small text helpers shared by the history, context, and retrieval modules
//!
//! Domain text is Spanish and routinely contains multi-byte characters, so
//! all truncation here counts characters, never bytes.

/// Truncates `s` to at most `max` characters, appending an ellipsis when
/// anything was cut.
///
/// # Examples
///
/// ```
/// use vialy::text::truncate_with_ellipsis;
///
/// assert_eq!(truncate_with_ellipsis("hola", 10), "hola");
/// assert_eq!(truncate_with_ellipsis("señalización", 4), "seña...");
/// ```
pub fn truncate_with_ellipsis(s: &str, max: usize) -> String {
    if s.chars().count() <= max {
        s.to_string()
    } else {
        let truncated: String = s.chars().take(max).collect();
        format!("{}...", truncated)
    }
}

/// Truncates `s` to at most `max` characters without an ellipsis.
pub fn truncate_chars(s: &str, max: usize) -> String {
    s.chars().take(max).collect()
}

/// Collapses all runs of whitespace (including newlines) into single spaces
/// and trims the ends.
///
/// Retrieved passages arrive with the line breaks of the source PDF; the
/// prompt composer needs them flat.
///
/// # Examples
///
/// ```
/// use vialy::text::collapse_whitespace;
///
/// assert_eq!(collapse_whitespace("a\n b\t\tc "), "a b c");
/// ```
pub fn collapse_whitespace(s: &str) -> String {
    s.split_whitespace().collect::<Vec<_>>().join(" ")
}
