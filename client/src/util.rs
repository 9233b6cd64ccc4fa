use std::sync::LazyLock;

use regex::Regex;

/// Inline event handler attributes such as `onerror="alert(1)"`.
static INLINE_HANDLER: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#"\bon\w+="?[\w:()']+"?"#).expect("static regex compiles"));

/// Word search: every whitespace-separated word of `query` must occur,
/// case-insensitively, somewhere in `haystack`.
pub fn search_in_str(haystack: &str, query: &str) -> bool {
    if haystack.is_empty() {
        return false;
    }

    let haystack = haystack.to_lowercase();
    query
        .split_whitespace()
        .all(|word| haystack.contains(&word.to_lowercase()))
}

/// Strip inline javascript handlers from alias content before display.
pub fn sanitize(text: &str) -> String {
    INLINE_HANDLER.replace_all(text, "").into_owned()
}
