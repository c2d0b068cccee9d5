use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use regex::Regex;
use serde::Serialize;

use crate::document::Document;
use crate::parser::months::has_month;

pub const REQUIRED_SECTIONS: &[&str] = &["At a Glance", "Month-by-Month", "Activities", "Season"];

pub const REGIONS: &[&str] = &[
    "Africa",
    "Asia",
    "Caribbean",
    "Central America",
    "Europe",
    "Middle East",
    "North America",
    "Oceania",
    "South America",
];

/// Thresholds and checklists the rule set runs against.
#[derive(Debug, Clone)]
pub struct Rules {
    pub min_words: usize,
    pub max_words: usize,
    pub required_faqs: usize,
    pub min_references: usize,
    pub max_description: usize,
    pub keyword_min: usize,
    pub required_sections: &'static [&'static str],
    pub regions: &'static [&'static str],
    /// Media existence is checked under this directory; `None` skips the
    /// on-disk check but still warns about empty media fields.
    pub site_root: Option<PathBuf>,
}

impl Default for Rules {
    fn default() -> Self {
        Rules {
            min_words: 1400,
            max_words: 5000,
            required_faqs: 5,
            min_references: 5,
            max_description: 160,
            keyword_min: 2,
            required_sections: REQUIRED_SECTIONS,
            regions: REGIONS,
            site_root: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Verdict {
    pub slug: String,
    pub word_count: usize,
    pub errors: Vec<String>,
    pub warnings: Vec<String>,
    pub pass: bool,
}

impl Verdict {
    fn new(slug: &str, word_count: usize, findings: Findings) -> Self {
        Verdict {
            slug: slug.to_string(),
            word_count,
            pass: findings.errors.is_empty(),
            errors: findings.errors,
            warnings: findings.warnings,
        }
    }

    pub fn print(&self) {
        let status = if self.pass { "PASS" } else { "FAIL" };
        println!("[{}] {} ({} words)", status, self.slug, self.word_count);
        for e in &self.errors {
            println!("  ERROR: {}", e);
        }
        for w in &self.warnings {
            println!("  WARN: {}", w);
        }
    }
}

#[derive(Default)]
struct Findings {
    errors: Vec<String>,
    warnings: Vec<String>,
}

struct Ctx<'a> {
    doc: &'a Document,
    rules: &'a Rules,
    words: usize,
}

type Rule = fn(&Ctx, &mut Findings);

/// Every rule runs; none short-circuits the others.
const RULES: [Rule; 11] = [
    min_words,
    max_words,
    best_months,
    required_sections,
    faq_count,
    reference_count,
    media_files,
    region,
    description_length,
    booking_url,
    keyword_density,
];

pub fn word_count(text: &str) -> usize {
    text.split_whitespace().count()
}

pub fn validate(slug: &str, doc: &Document, rules: &Rules) -> Verdict {
    let ctx = Ctx {
        doc,
        rules,
        words: word_count(&doc.body),
    };
    let mut findings = Findings::default();
    for rule in RULES {
        rule(&ctx, &mut findings);
    }
    Verdict::new(slug, ctx.words, findings)
}

/// Read, parse and validate one document. Unreadable or malformed files
/// become failing verdicts so a batch run still reports every file.
pub fn validate_file(path: &Path, rules: &Rules) -> Verdict {
    let slug = path
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_default();

    let parsed = fs::read_to_string(path)
        .map_err(|e| format!("Failed to read {:?}: {}", path, e))
        .and_then(|text| Document::parse(&text).map_err(|e| e.to_string()));

    match parsed {
        Ok(doc) => validate(&slug, &doc, rules),
        Err(e) => Verdict::new(
            &slug,
            0,
            Findings {
                errors: vec![e],
                warnings: Vec::new(),
            },
        ),
    }
}

/// Article files under `dir`, sorted; partials (`_index.md` etc.) skipped.
pub fn list_documents(dir: &Path) -> Result<Vec<PathBuf>> {
    let mut files: Vec<PathBuf> = fs::read_dir(dir)
        .with_context(|| format!("Failed to list {:?}", dir))?
        .filter_map(|e| e.ok().map(|e| e.path()))
        .filter(|p| {
            let name = p.file_name().and_then(|n| n.to_str()).unwrap_or("");
            name.ends_with(".md") && !name.starts_with('_')
        })
        .collect();
    files.sort();
    Ok(files)
}

// ── Rules ──

fn min_words(ctx: &Ctx, f: &mut Findings) {
    if ctx.words < ctx.rules.min_words {
        f.errors.push(format!("Too short: {} words (min {})", ctx.words, ctx.rules.min_words));
    }
}

fn max_words(ctx: &Ctx, f: &mut Findings) {
    if ctx.words > ctx.rules.max_words {
        f.warnings.push(format!("Very long: {} words (max {})", ctx.words, ctx.rules.max_words));
    }
}

fn best_months(ctx: &Ctx, f: &mut Findings) {
    let months = &ctx.doc.frontmatter.best_months;
    if !has_month(months) {
        f.errors.push(format!("Best months \"{}\" names no calendar month", months));
    }
}

fn required_sections(ctx: &Ctx, f: &mut Findings) {
    let headings: Vec<String> = ctx
        .doc
        .body
        .lines()
        .filter(|l| l.starts_with("##"))
        .map(str::to_lowercase)
        .collect();
    for section in ctx.rules.required_sections {
        let needle = section.to_lowercase();
        if !headings.iter().any(|h| h.contains(&needle)) {
            f.errors.push(format!("Missing section containing \"{}\"", section));
        }
    }
}

fn faq_count(ctx: &Ctx, f: &mut Findings) {
    let found = ctx.doc.frontmatter.faq.len();
    if found != ctx.rules.required_faqs {
        f.errors.push(format!("Expected {} FAQs, found {}", ctx.rules.required_faqs, found));
    }
}

fn reference_count(ctx: &Ctx, f: &mut Findings) {
    let found = ctx.doc.frontmatter.references.len();
    if found < ctx.rules.min_references {
        f.warnings.push(format!(
            "Only {} references (recommend {}+)",
            found, ctx.rules.min_references
        ));
    }
}

fn media_files(ctx: &Ctx, f: &mut Findings) {
    let fm = &ctx.doc.frontmatter;
    for (label, path) in [("hero image", &fm.hero_image), ("climate chart", &fm.climate_chart)] {
        if path.is_empty() {
            f.warnings.push(format!("No {} set", label));
        } else if let Some(root) = &ctx.rules.site_root {
            let candidates = [root.join("static").join(path), root.join(path)];
            if !candidates.iter().any(|c| c.exists()) {
                f.warnings.push(format!("The {} file {} does not exist", label, path));
            }
        }
    }
}

fn region(ctx: &Ctx, f: &mut Findings) {
    let region = &ctx.doc.frontmatter.region;
    if !ctx.rules.regions.contains(&region.as_str()) {
        f.warnings.push(format!("Unknown region \"{}\"", region));
    }
}

fn description_length(ctx: &Ctx, f: &mut Findings) {
    let len = ctx.doc.frontmatter.description.chars().count();
    if len > ctx.rules.max_description {
        f.warnings.push(format!(
            "Description too long: {} chars (max {})",
            len, ctx.rules.max_description
        ));
    }
}

fn booking_url(ctx: &Ctx, f: &mut Findings) {
    if ctx.doc.frontmatter.tourradar_url.trim().is_empty() {
        f.warnings.push("No TourRadar URL set".to_string());
    }
}

fn keyword_density(ctx: &Ctx, f: &mut Findings) {
    let country = ctx.doc.frontmatter.country_name.trim();
    if country.is_empty() {
        return;
    }
    let keyword = format!("best time to visit {}", country).to_lowercase();
    let count = Regex::new(&format!("(?i){}", regex::escape(&keyword)))
        .map(|re| re.find_iter(&ctx.doc.body).count())
        .unwrap_or(0);
    if count < ctx.rules.keyword_min {
        f.warnings.push(format!(
            "Keyword \"{}\" only appears {} times (target: 4-6)",
            keyword, count
        ));
    }
}
