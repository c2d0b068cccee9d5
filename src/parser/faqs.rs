use std::sync::LazyLock;

use regex::Regex;
use serde::{Deserialize, Serialize};

use super::markers::faq_block;

static QUESTION_SPLIT_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\n\s*Q:\s*").unwrap());
static ANSWER_SPLIT_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\n\s*A:\s*").unwrap());
static LEADING_Q_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"^\s*Q:\s*").unwrap());

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Faq {
    pub question: String,
    pub answer: String,
}

/// Question/answer pairs from the FAQ block, in order of appearance.
/// Chunks without an `A:` line are dropped.
pub fn parse_faqs(text: &str) -> Vec<Faq> {
    let Some(block) = faq_block(text) else {
        return Vec::new();
    };

    QUESTION_SPLIT_RE
        .split(block)
        .filter(|chunk| !chunk.trim().is_empty())
        .filter_map(|chunk| {
            let mut parts = ANSWER_SPLIT_RE.splitn(chunk, 3);
            let question = parts.next()?;
            let answer = parts.next()?;
            Some(Faq {
                question: LEADING_Q_RE.replace(question, "").trim().to_string(),
                answer: answer.trim().to_string(),
            })
        })
        .collect()
}
