pub mod faqs;
pub mod markers;
pub mod months;
pub mod references;

use faqs::Faq;
use references::Reference;

/// Structured fields recovered from one model response.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExtractedFields {
    pub best_months: String,
    pub faqs: Vec<Faq>,
    pub references: Vec<Reference>,
    pub cleaned_body: String,
}

/// Raw model text → extracted fields. Never fails; missing markers yield
/// empty lists or the best-months sentinel.
pub fn extract_fields(raw: &str) -> ExtractedFields {
    ExtractedFields {
        best_months: months::extract_best_months(raw),
        faqs: faqs::parse_faqs(raw),
        references: references::parse_references(raw),
        cleaned_body: markers::strip_markers(raw),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn well_formed_fixture() {
        let md = std::fs::read_to_string("tests/fixtures/well_formed.md").unwrap();
        let fields = extract_fields(&md);
        assert_eq!(fields.best_months, "April, May, September, October");
        assert_eq!(fields.faqs.len(), 5);
        assert_eq!(fields.references.len(), 6);
        assert!(fields.cleaned_body.starts_with("## At a Glance"));
        assert!(!fields.cleaned_body.contains("Q: "));
    }

    #[test]
    fn unmarked_fixture_degrades() {
        let md = std::fs::read_to_string("tests/fixtures/no_markers.md").unwrap();
        let fields = extract_fields(&md);
        assert_eq!(fields.best_months, "June to August");
        assert!(fields.faqs.is_empty());
        assert!(fields.references.is_empty());
        assert_eq!(fields.cleaned_body, md.trim());
    }

    #[test]
    fn empty_response() {
        let fields = extract_fields("");
        assert_eq!(fields.best_months, months::VARIES_BY_REGION);
        assert!(fields.faqs.is_empty());
        assert!(fields.references.is_empty());
        assert!(fields.cleaned_body.is_empty());
    }
}
