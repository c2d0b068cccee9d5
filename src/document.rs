use std::fmt::Write as _;
use std::sync::LazyLock;

use chrono::{DateTime, Datelike, SecondsFormat, Utc};
use regex::Regex;
use serde::Deserialize;
use thiserror::Error;

use crate::parser::faqs::Faq;
use crate::parser::references::Reference;
use crate::parser::ExtractedFields;
use crate::queue::{CountryProfile, WorkItem};

static FENCE_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"(?m)^---[ \t]*\r?$").unwrap());

/// Hero image obtained by the image collaborator.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MediaRef {
    pub path: String,
    pub alt: String,
    pub credit: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct Frontmatter {
    pub title: String,
    pub slug: String,
    pub date: String,
    pub lastmod: String,
    pub description: String,
    pub country_name: String,
    pub region: String,
    pub best_months: String,
    pub hero_image: String,
    pub hero_alt: String,
    pub hero_credit: String,
    pub climate_chart: String,
    pub tourradar_url: String,
    pub keywords: Vec<String>,
    pub related_countries: Vec<String>,
    pub faq: Vec<Faq>,
    pub references: Vec<Reference>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Document {
    pub frontmatter: Frontmatter,
    pub body: String,
}

#[derive(Debug, Error)]
pub enum DocumentError {
    #[error("Missing or malformed frontmatter: no opening ---")]
    MissingFrontmatter,
    #[error("Missing or malformed frontmatter: no closing ---")]
    UnterminatedFrontmatter,
    #[error("Missing or malformed frontmatter: {0}")]
    Yaml(#[from] serde_yaml::Error),
}

/// Combine extracted fields with country data and optional media into a
/// publishable document. Every value is copied or templated; nothing is
/// inferred here.
pub fn assemble(
    item: &WorkItem,
    profile: &CountryProfile,
    fields: ExtractedFields,
    hero: Option<&MediaRef>,
    climate_chart: Option<&str>,
    now: DateTime<Utc>,
) -> Document {
    let name = &item.name;
    let timestamp = now.to_rfc3339_opts(SecondsFormat::Millis, true);

    let frontmatter = Frontmatter {
        title: format!("Best Time to Visit {} ({} Guide)", name, now.year()),
        slug: format!("best-time-to-visit-{}", item.slug),
        date: timestamp.clone(),
        lastmod: timestamp,
        description: format!(
            "Discover the best time to visit {name}. Month-by-month weather guide, \
             top activities by season, and expert travel tips from Elena Vasquez."
        ),
        country_name: name.clone(),
        region: profile.region.clone(),
        best_months: fields.best_months,
        hero_image: hero.map(|h| site_relative(&h.path)).unwrap_or_default(),
        hero_alt: hero.map(|h| h.alt.clone()).unwrap_or_default(),
        hero_credit: hero.map(|h| h.credit.clone()).unwrap_or_default(),
        climate_chart: climate_chart.map(site_relative).unwrap_or_default(),
        tourradar_url: format!("https://www.tourradar.com/d/{}", profile.tourradar_slug),
        keywords: vec![
            format!("best time to visit {name}"),
            format!("when to go to {name}"),
            format!("{name} weather"),
            format!("{name} travel guide"),
        ],
        related_countries: profile.related.clone(),
        faq: fields.faqs,
        references: fields.references,
    };

    Document {
        frontmatter,
        body: fields.cleaned_body,
    }
}

fn site_relative(path: &str) -> String {
    path.trim_start_matches('/').to_string()
}

impl Document {
    /// `---`-fenced YAML frontmatter followed by the markdown body.
    /// Written by hand rather than through serde so that every string is
    /// double-quoted and escaped; [`Document::parse`] reads it back.
    pub fn render(&self) -> String {
        let fm = &self.frontmatter;
        let mut out = String::from("---\n");
        for (key, value) in [
            ("title", &fm.title),
            ("slug", &fm.slug),
            ("date", &fm.date),
            ("lastmod", &fm.lastmod),
            ("description", &fm.description),
            ("country_name", &fm.country_name),
            ("region", &fm.region),
            ("best_months", &fm.best_months),
            ("hero_image", &fm.hero_image),
            ("hero_alt", &fm.hero_alt),
            ("hero_credit", &fm.hero_credit),
            ("climate_chart", &fm.climate_chart),
            ("tourradar_url", &fm.tourradar_url),
        ] {
            let _ = writeln!(out, "{}: {}", key, quote(value));
        }

        write_list(&mut out, "keywords", &fm.keywords, |out, k| {
            let _ = writeln!(out, "  - {}", quote(k));
        });
        write_list(&mut out, "related_countries", &fm.related_countries, |out, r| {
            let _ = writeln!(out, "  - {}", quote(r));
        });
        write_list(&mut out, "faq", &fm.faq, |out, f| {
            let _ = writeln!(out, "  - question: {}", quote(&f.question));
            let _ = writeln!(out, "    answer: {}", quote(&f.answer));
        });
        write_list(&mut out, "references", &fm.references, |out, r| {
            let _ = writeln!(out, "  - title: {}", quote(&r.title));
            let _ = writeln!(out, "    url: {}", quote(&r.url));
            let _ = writeln!(out, "    description: {}", quote(&r.description));
        });

        out.push_str("---\n\n");
        out.push_str(&self.body);
        out.push('\n');
        out
    }

    pub fn parse(text: &str) -> Result<Document, DocumentError> {
        let rest = text
            .trim_start_matches('\u{feff}')
            .strip_prefix("---")
            .and_then(|r| r.strip_prefix('\n').or_else(|| r.strip_prefix("\r\n")))
            .ok_or(DocumentError::MissingFrontmatter)?;
        let fence = FENCE_RE
            .find(rest)
            .ok_or(DocumentError::UnterminatedFrontmatter)?;

        let yaml = &rest[..fence.start()];
        let frontmatter = if yaml.trim().is_empty() {
            Frontmatter::default()
        } else {
            serde_yaml::from_str(yaml)?
        };

        Ok(Document {
            frontmatter,
            body: rest[fence.end()..].trim().to_string(),
        })
    }
}

fn write_list<T>(out: &mut String, key: &str, items: &[T], mut entry: impl FnMut(&mut String, &T)) {
    if items.is_empty() {
        let _ = writeln!(out, "{}: []", key);
        return;
    }
    let _ = writeln!(out, "{}:", key);
    for item in items {
        entry(out, item);
    }
}

/// YAML double-quoted scalar.
fn quote(s: &str) -> String {
    let mut out = String::with_capacity(s.len() + 2);
    out.push('"');
    for c in s.chars() {
        match c {
            '"' => out.push_str("\\\""),
            '\\' => out.push_str("\\\\"),
            '\n' => out.push_str("\\n"),
            '\r' => out.push_str("\\r"),
            '\t' => out.push_str("\\t"),
            c if c.is_control() => {
                let _ = write!(out, "\\u{:04x}", c as u32);
            }
            c => out.push(c),
        }
    }
    out.push('"');
    out
}
