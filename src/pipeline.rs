use std::fs;
use std::path::PathBuf;

use anyhow::{anyhow, Context, Result};
use chrono::{Datelike, Utc};
use tracing::info;

use crate::config::{ApiKeys, Settings};
use crate::document::{assemble, MediaRef};
use crate::parser::extract_fields;
use crate::prompt::build_prompt;
use crate::providers::images::ImageClient;
use crate::providers::openrouter::{Generated, OpenRouterClient};
use crate::queue::{self, CountryProfile, QueueStore, Status, WorkItem};
use crate::validate::{validate, Verdict};

/// Produces the article text for a prompt.
pub trait ContentGenerator {
    async fn write_article(&self, prompt: &str) -> Result<Generated>;
}

impl ContentGenerator for OpenRouterClient {
    async fn write_article(&self, prompt: &str) -> Result<Generated> {
        Ok(self.generate(prompt).await?)
    }
}

/// Hero image and climate chart for a country. Absence is not an error.
pub trait MediaSource {
    async fn hero_image(&self, name: &str, slug: &str) -> Option<MediaRef>;
    async fn climate_chart(&self, name: &str, slug: &str) -> Option<String>;
}

/// Image providers gated on whichever API keys are configured.
pub struct ProviderMedia<'k> {
    client: ImageClient,
    keys: &'k ApiKeys,
}

impl<'k> ProviderMedia<'k> {
    pub fn new(settings: &Settings, keys: &'k ApiKeys) -> Result<Self> {
        Ok(ProviderMedia {
            client: ImageClient::new(&settings.static_dir)?,
            keys,
        })
    }
}

impl MediaSource for ProviderMedia<'_> {
    async fn hero_image(&self, name: &str, slug: &str) -> Option<MediaRef> {
        self.client.fetch_hero_image(name, slug, self.keys.gemini.as_deref()).await
    }

    async fn climate_chart(&self, name: &str, slug: &str) -> Option<String> {
        if self.keys.gemini.is_none() && self.keys.openai.is_none() {
            info!("Skipping climate chart (no GEMINI_API_KEY or OPENAI_API_KEY)");
            return None;
        }
        self.client
            .generate_climate_chart(name, slug, self.keys.gemini.as_deref(), self.keys.openai.as_deref())
            .await
    }
}

pub struct Summary {
    pub country: String,
    pub model: String,
    pub faqs: usize,
    pub references: usize,
    pub hero_image: bool,
    pub climate_chart: bool,
    pub remaining: usize,
    pub path: PathBuf,
    pub verdict: Verdict,
}

impl Summary {
    pub fn print(&self) {
        println!("Written to: {}", self.path.display());
        println!("Country:       {}", self.country);
        println!("Model:         {}", self.model);
        println!("FAQs:          {}", self.faqs);
        println!("References:    {}", self.references);
        println!("Hero image:    {}", yes_no(self.hero_image));
        println!("Climate chart: {}", yes_no(self.climate_chart));
        println!("Remaining:     {} countries", self.remaining);
        println!();
        self.verdict.print();
    }
}

fn yes_no(b: bool) -> &'static str {
    if b {
        "Yes"
    } else {
        "No"
    }
}

/// Generate one article: pick a work item, call the providers, write the
/// document and record the outcome in the queue. `Ok(None)` when nothing
/// is pending.
pub async fn generate(
    store: &dyn QueueStore,
    writer: &impl ContentGenerator,
    media: &impl MediaSource,
    settings: &Settings,
    slug: Option<&str>,
) -> Result<Option<Summary>> {
    let mut items = store.load()?;
    let countries = queue::load_countries(&settings.countries_path)?;

    let Some(idx) = queue::select(&items, slug)? else {
        return Ok(None);
    };
    let profile = countries
        .iter()
        .find(|c| c.slug == items[idx].slug)
        .ok_or_else(|| anyhow!("Country data not found for slug: {}", items[idx].slug))?;

    info!(slug = %items[idx].slug, tier = items[idx].tier, "Generating article for {}", items[idx].name);
    items[idx].mark_generating();
    store.save(&items)?;

    let related = queue::related_names(profile, &countries);
    let outcome = run(&items[idx], profile, &related, writer, media, settings).await;
    match outcome {
        Ok(mut summary) => {
            items[idx].mark_generated(Utc::now());
            store.save(&items)?;
            summary.remaining = items.iter().filter(|i| i.status == Status::Pending).count();
            Ok(Some(summary))
        }
        Err(e) => {
            items[idx].mark_failed(format!("{:#}", e));
            store.save(&items)?;
            Err(e.context(format!("Failed to generate article for {}", items[idx].name)))
        }
    }
}

async fn run(
    item: &WorkItem,
    profile: &CountryProfile,
    related: &[String],
    writer: &impl ContentGenerator,
    media: &impl MediaSource,
    settings: &Settings,
) -> Result<Summary> {
    let now = Utc::now();

    info!("Step 1: generating article content");
    let prompt = build_prompt(item, profile, related, now.year());
    let generated = writer.write_article(&prompt).await?;
    info!(model = %generated.model_used, chars = generated.content.len(), "Article generated");

    info!("Step 2: hero image");
    let hero = media.hero_image(&item.name, &item.slug).await;

    info!("Step 3: climate chart");
    let chart = media.climate_chart(&item.name, &item.slug).await;

    info!("Step 4: building document");
    let fields = extract_fields(&generated.content);
    let (faqs, references) = (fields.faqs.len(), fields.references.len());
    info!("Parsed {} FAQ items, {} references", faqs, references);

    let doc = assemble(item, profile, fields, hero.as_ref(), chart.as_deref(), now);
    fs::create_dir_all(&settings.content_dir)
        .with_context(|| format!("Failed to create {:?}", settings.content_dir))?;
    let path = settings.content_dir.join(format!("{}.md", item.slug));
    fs::write(&path, doc.render()).with_context(|| format!("Failed to write {:?}", path))?;

    let verdict = validate(&item.slug, &doc, &settings.rules());

    Ok(Summary {
        country: item.name.clone(),
        model: generated.model_used,
        faqs,
        references,
        hero_image: hero.is_some(),
        climate_chart: chart.is_some(),
        remaining: 0,
        path,
        verdict,
    })
}

#[cfg(test)]
mod tests {
    use std::cell::RefCell;

    use super::*;
    use crate::document::Document;

    struct MemoryStore {
        items: RefCell<Vec<WorkItem>>,
        saves: RefCell<usize>,
    }

    impl QueueStore for MemoryStore {
        fn load(&self) -> Result<Vec<WorkItem>> {
            Ok(self.items.borrow().clone())
        }

        fn save(&self, items: &[WorkItem]) -> Result<()> {
            *self.items.borrow_mut() = items.to_vec();
            *self.saves.borrow_mut() += 1;
            Ok(())
        }
    }

    struct Canned(Option<&'static str>);

    impl ContentGenerator for Canned {
        async fn write_article(&self, _prompt: &str) -> Result<Generated> {
            match self.0 {
                Some(path) => Ok(Generated {
                    content: std::fs::read_to_string(path)?,
                    model_used: "Gemini Flash".into(),
                }),
                None => Err(anyhow!("all providers failed: Gemini Flash (HTTP 429)")),
            }
        }
    }

    struct NoMedia;

    impl MediaSource for NoMedia {
        async fn hero_image(&self, _name: &str, _slug: &str) -> Option<MediaRef> {
            None
        }

        async fn climate_chart(&self, _name: &str, _slug: &str) -> Option<String> {
            None
        }
    }

    const COUNTRIES: &str = r#"[
      {"slug": "portugal", "name": "Portugal", "region": "Europe", "tourradar_slug": "portugal", "related": ["spain"]}
    ]"#;

    fn settings(dir: &std::path::Path) -> Settings {
        std::fs::write(dir.join("countries.json"), COUNTRIES).unwrap();
        Settings {
            content_dir: dir.join("content"),
            queue_path: dir.join("queue.json"),
            countries_path: dir.join("countries.json"),
            static_dir: dir.join("static"),
            site_root: dir.to_path_buf(),
            min_words: 1400,
            max_words: 5000,
        }
    }

    fn store(slug: &str, status: Status) -> MemoryStore {
        MemoryStore {
            items: RefCell::new(vec![
                WorkItem {
                    slug: slug.into(),
                    name: "Portugal".into(),
                    tier: 1,
                    status,
                    generated_at: None,
                    error: None,
                },
                WorkItem {
                    slug: "chad".into(),
                    name: "Chad".into(),
                    tier: 3,
                    status: Status::Pending,
                    generated_at: None,
                    error: None,
                },
            ]),
            saves: RefCell::new(0),
        }
    }

    #[tokio::test]
    async fn nothing_pending_is_noop() {
        let dir = tempfile::tempdir().unwrap();
        let s = MemoryStore {
            items: RefCell::new(Vec::new()),
            saves: RefCell::new(0),
        };
        let out = generate(&s, &Canned(None), &NoMedia, &settings(dir.path()), None).await.unwrap();
        assert!(out.is_none());
        assert_eq!(*s.saves.borrow(), 0);
    }

    #[tokio::test]
    async fn missing_country_data_leaves_queue_untouched() {
        let dir = tempfile::tempdir().unwrap();
        let s = store("peru", Status::Pending);
        let err = generate(&s, &Canned(None), &NoMedia, &settings(dir.path()), None)
            .await
            .err()
            .unwrap();
        assert_eq!(err.to_string(), "Country data not found for slug: peru");
        assert_eq!(s.items.borrow()[0].status, Status::Pending);
        assert_eq!(*s.saves.borrow(), 0);
    }

    #[tokio::test]
    async fn success_marks_generated_and_writes_document() {
        let dir = tempfile::tempdir().unwrap();
        let settings = settings(dir.path());
        let s = store("portugal", Status::Pending);
        let summary = generate(&s, &Canned(Some("tests/fixtures/well_formed.md")), &NoMedia, &settings, None)
            .await
            .unwrap()
            .unwrap();

        let items = s.items.borrow();
        assert_eq!(items[0].status, Status::Generated);
        assert!(items[0].generated_at.is_some());
        assert_eq!(items[0].error, None);
        assert_eq!(items[1].status, Status::Pending);
        assert_eq!(*s.saves.borrow(), 2);

        assert_eq!(summary.remaining, 1);
        assert_eq!(summary.faqs, 5);
        assert_eq!(summary.references, 6);
        assert!(!summary.hero_image);
        assert_eq!(summary.path, settings.content_dir.join("portugal.md"));

        let written = std::fs::read_to_string(&summary.path).unwrap();
        let doc = Document::parse(&written).unwrap();
        assert_eq!(doc.frontmatter.best_months, "April, May, September, October");
        assert_eq!(doc.frontmatter.hero_image, "");
        assert!(!written.contains("FAQ_START"));
    }

    #[tokio::test]
    async fn failure_marks_failed_with_error() {
        let dir = tempfile::tempdir().unwrap();
        let settings = settings(dir.path());
        let s = store("portugal", Status::Pending);
        let err = generate(&s, &Canned(None), &NoMedia, &settings, Some("portugal"))
            .await
            .err()
            .unwrap();
        assert_eq!(err.to_string(), "Failed to generate article for Portugal");

        let items = s.items.borrow();
        assert_eq!(items[0].status, Status::Failed);
        assert_eq!(items[0].error.as_deref(), Some("all providers failed: Gemini Flash (HTTP 429)"));
        assert!(items[0].generated_at.is_none());
        assert_eq!(*s.saves.borrow(), 2);
        assert!(!settings.content_dir.join("portugal.md").exists());
    }

    #[tokio::test]
    async fn failed_item_can_be_retried_by_slug() {
        let dir = tempfile::tempdir().unwrap();
        let settings = settings(dir.path());
        let s = store("portugal", Status::Failed);
        generate(&s, &Canned(Some("tests/fixtures/well_formed.md")), &NoMedia, &settings, Some("portugal"))
            .await
            .unwrap()
            .unwrap();
        assert_eq!(s.items.borrow()[0].status, Status::Generated);
    }

    #[tokio::test]
    async fn item_in_flight_is_not_regenerated() {
        let dir = tempfile::tempdir().unwrap();
        let s = store("portugal", Status::Generating);
        let err = generate(&s, &Canned(None), &NoMedia, &settings(dir.path()), Some("portugal"))
            .await
            .err()
            .unwrap();
        assert!(err.to_string().contains("already being generated"));
        assert_eq!(s.items.borrow()[0].status, Status::Generating);
        assert_eq!(*s.saves.borrow(), 0);
    }
}
