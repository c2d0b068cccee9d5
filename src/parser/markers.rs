use std::sync::LazyLock;

use regex::Regex;

pub const BEST_MONTHS_OPEN: &str = "<!-- BEST_MONTHS:";
pub const FAQ_START: &str = "<!-- FAQ_START -->";
pub const FAQ_END: &str = "<!-- FAQ_END -->";
pub const REFS_START: &str = "<!-- REFS_START -->";
pub const REFS_END: &str = "<!-- REFS_END -->";

/// Payload of the best-months marker. The marker must sit on one line.
pub static BEST_MONTHS_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(&format!(r"{}[ \t]*(.+?)[ \t]*-->", regex::escape(BEST_MONTHS_OPEN))).unwrap()
});
static BEST_MONTHS_LINE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(&format!(r"{}.*?-->\n?", regex::escape(BEST_MONTHS_OPEN))).unwrap());
static FAQ_BLOCK_RE: LazyLock<Regex> = LazyLock::new(|| block_re(FAQ_START, FAQ_END));
static REFS_BLOCK_RE: LazyLock<Regex> = LazyLock::new(|| block_re(REFS_START, REFS_END));

fn block_re(start: &str, end: &str) -> Regex {
    Regex::new(&format!(r"(?s){}(.*?){}", regex::escape(start), regex::escape(end))).unwrap()
}

/// Inner text of the first FAQ block, delimiters excluded.
pub fn faq_block(text: &str) -> Option<&str> {
    FAQ_BLOCK_RE.captures(text).and_then(|c| c.get(1)).map(|m| m.as_str())
}

/// Inner text of the first references block, delimiters excluded.
pub fn refs_block(text: &str) -> Option<&str> {
    REFS_BLOCK_RE.captures(text).and_then(|c| c.get(1)).map(|m| m.as_str())
}

/// Remove the best-months marker line, the FAQ block and the references
/// block (delimiters inclusive), then trim.
///
/// Each removal runs whether or not the previous one matched, and removes
/// every occurrence so the result never contains a complete marker.
pub fn strip_markers(text: &str) -> String {
    let out = BEST_MONTHS_LINE_RE.replace_all(text, "");
    let out = FAQ_BLOCK_RE.replace_all(&out, "");
    let out = REFS_BLOCK_RE.replace_all(&out, "");
    out.trim().to_string()
}
