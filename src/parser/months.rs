use std::sync::LazyLock;

use regex::Regex;

use super::markers::BEST_MONTHS_RE;

/// Returned when no month phrase can be recovered from the response.
pub const VARIES_BY_REGION: &str = "Varies by region";

pub const MONTHS: [&str; 12] = [
    "January", "February", "March", "April", "May", "June",
    "July", "August", "September", "October", "November", "December",
];

static MONTH_WORD_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(&format!(r"\b(?:{})\b", MONTHS.join("|"))).unwrap()
});

/// One month name, always case-sensitive even inside `(?i)` patterns.
fn month() -> String {
    format!(r"\b(?-i:{})\b", MONTHS.join("|"))
}

/// A run of month names joined by "to", "through", "and", commas or dashes.
fn month_run() -> String {
    let m = month();
    format!(r"((?:{m})(?:\s*(?:to|through|and|,|-)\s*(?:{m}))*)")
}

static BEST_TIME_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(&format!(
        r"(?i)best (?:time|months?) (?:to visit|for)[^.]*?(?:is|are)\s+{}",
        month_run()
    ))
    .unwrap()
});
static VISIT_WINDOW_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(&format!(
        r"(?i)(?:visit|go)[^.]*?(?:between|during|from|in)\s+{}",
        month_run()
    ))
    .unwrap()
});
static IDEAL_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(&format!(r"(?i)(?:ideal|perfect|optimal)[^.]*?{}", month_run())).unwrap()
});

type Matcher = fn(&str) -> Option<String>;

/// Prose fallbacks, tried in order; the first hit wins.
const PROSE_MATCHERS: [Matcher; 3] = [best_time_is, visit_window, ideal_months];

/// True if `text` names at least one calendar month as an exact,
/// case-sensitive word.
pub fn has_month(text: &str) -> bool {
    MONTH_WORD_RE.is_match(text)
}

/// Best-months phrase from the marker, falling back to prose patterns and
/// finally to [`VARIES_BY_REGION`].
pub fn extract_best_months(text: &str) -> String {
    if let Some(payload) = marker_payload(text) {
        return payload;
    }
    PROSE_MATCHERS
        .iter()
        .find_map(|matcher| matcher(text))
        .unwrap_or_else(|| VARIES_BY_REGION.to_string())
}

/// Marker payload, rejected when it carries no real month (e.g. the model
/// echoed the "Month1, Month2" placeholder).
fn marker_payload(text: &str) -> Option<String> {
    let caps = BEST_MONTHS_RE.captures(text)?;
    let payload = caps[1].trim();
    has_month(payload).then(|| payload.to_string())
}

fn first_capture(re: &Regex, text: &str) -> Option<String> {
    re.captures(text)
        .and_then(|c| c.get(1))
        .map(|m| m.as_str().trim().to_string())
}

fn best_time_is(text: &str) -> Option<String> {
    first_capture(&BEST_TIME_RE, text)
}

fn visit_window(text: &str) -> Option<String> {
    first_capture(&VISIT_WINDOW_RE, text)
}

fn ideal_months(text: &str) -> Option<String> {
    first_capture(&IDEAL_RE, text)
}
