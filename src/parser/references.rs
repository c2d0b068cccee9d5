use std::sync::LazyLock;

use regex::Regex;
use serde::{Deserialize, Serialize};

use super::markers::refs_block;

// - [Title](URL) - Description   (hyphen, en-dash or em-dash)
static REFERENCE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"- \[([^\]]+)\]\(([^)]+)\)\s*[-–—]\s*(.+)").unwrap());

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Reference {
    pub title: String,
    pub url: String,
    pub description: String,
}

pub fn parse_references(text: &str) -> Vec<Reference> {
    let Some(block) = refs_block(text) else {
        return Vec::new();
    };

    block
        .lines()
        .filter_map(|line| REFERENCE_RE.captures(line))
        .map(|caps| Reference {
            title: caps[1].trim().to_string(),
            url: caps[2].trim().to_string(),
            description: caps[3].trim().to_string(),
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn block(lines: &str) -> String {
        format!("<!-- REFS_START -->\n{lines}\n<!-- REFS_END -->")
    }

    #[test]
    fn factbook_line() {
        let refs = parse_references(&block(
            "- [CIA World Factbook](https://www.cia.gov/x) - Country overview",
        ));
        assert_eq!(
            refs,
            vec![Reference {
                title: "CIA World Factbook".into(),
                url: "https://www.cia.gov/x".into(),
                description: "Country overview".into(),
            }]
        );
    }

    #[test]
    fn missing_separator_skipped() {
        let refs = parse_references(&block(
            "- [No dash](https://a.example) Country overview\n- [Ok](https://b.example) - Fine",
        ));
        assert_eq!(refs.len(), 1);
        assert_eq!(refs[0].title, "Ok");
    }

    #[test]
    fn en_and_em_dashes() {
        let refs = parse_references(&block(
            "- [A](https://a.example) – en dash\n- [B](https://b.example)—em dash",
        ));
        assert_eq!(refs.len(), 2);
        assert_eq!(refs[0].description, "en dash");
        assert_eq!(refs[1].description, "em dash");
    }

    #[test]
    fn no_block_is_empty() {
        assert!(parse_references("- [A](https://a.example) - outside any block").is_empty());
    }

    #[test]
    fn fixture() {
        let md = std::fs::read_to_string("tests/fixtures/well_formed.md").unwrap();
        let refs = parse_references(&md);
        assert_eq!(refs.len(), 6);
        assert!(refs.iter().all(|r| r.url.starts_with("https://")));
    }
}
