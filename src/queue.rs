use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{anyhow, bail, Context, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Status {
    Pending,
    Generating,
    Generated,
    Failed,
}

/// One queued country awaiting an article.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WorkItem {
    pub slug: String,
    pub name: String,
    pub tier: u32,
    pub status: Status,
    #[serde(rename = "generatedAt", default, skip_serializing_if = "Option::is_none")]
    pub generated_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub error: Option<String>,
}

impl WorkItem {
    pub fn mark_generating(&mut self) {
        self.status = Status::Generating;
    }

    pub fn mark_generated(&mut self, at: DateTime<Utc>) {
        self.status = Status::Generated;
        self.generated_at = Some(at);
        self.error = None;
    }

    pub fn mark_failed(&mut self, error: impl Into<String>) {
        self.status = Status::Failed;
        self.error = Some(error.into());
    }
}

/// Static reference data for one country.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CountryProfile {
    pub slug: String,
    pub name: String,
    pub region: String,
    pub tourradar_slug: String,
    #[serde(default)]
    pub related: Vec<String>,
}

/// Whole-queue persistence. The queue is always loaded and saved as a unit.
pub trait QueueStore {
    fn load(&self) -> Result<Vec<WorkItem>>;
    fn save(&self, items: &[WorkItem]) -> Result<()>;
}

/// Queue stored as a pretty-printed JSON array.
pub struct JsonQueueStore {
    path: PathBuf,
}

impl JsonQueueStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        JsonQueueStore { path: path.into() }
    }
}

impl QueueStore for JsonQueueStore {
    fn load(&self) -> Result<Vec<WorkItem>> {
        let raw = fs::read_to_string(&self.path)
            .with_context(|| format!("Failed to read queue {:?}", self.path))?;
        serde_json::from_str(&raw).with_context(|| format!("Malformed queue {:?}", self.path))
    }

    fn save(&self, items: &[WorkItem]) -> Result<()> {
        let json = serde_json::to_string_pretty(items)?;
        fs::write(&self.path, json).with_context(|| format!("Failed to write queue {:?}", self.path))
    }
}

pub fn load_countries(path: &Path) -> Result<Vec<CountryProfile>> {
    let raw = fs::read_to_string(path).with_context(|| format!("Failed to read {:?}", path))?;
    serde_json::from_str(&raw).with_context(|| format!("Malformed country list {:?}", path))
}

/// Index of the requested work item, or of the first pending one when no
/// slug is given. `Ok(None)` means nothing is left to generate.
///
/// An item already `generating` belongs to another run and is never handed
/// out again.
pub fn select(items: &[WorkItem], slug: Option<&str>) -> Result<Option<usize>> {
    let Some(slug) = slug else {
        return Ok(items.iter().position(|i| i.status == Status::Pending));
    };
    let idx = items
        .iter()
        .position(|i| i.slug == slug)
        .ok_or_else(|| anyhow!("Country \"{}\" not found in queue", slug))?;
    if items[idx].status == Status::Generating {
        bail!("Country \"{}\" is already being generated", slug);
    }
    Ok(Some(idx))
}

/// Display names for related slugs; unknown slugs are passed through.
pub fn related_names(profile: &CountryProfile, countries: &[CountryProfile]) -> Vec<String> {
    profile
        .related
        .iter()
        .map(|slug| {
            countries
                .iter()
                .find(|c| &c.slug == slug)
                .map(|c| c.name.clone())
                .unwrap_or_else(|| slug.clone())
        })
        .collect()
}

pub struct QueueStats {
    pub total: usize,
    pub pending: usize,
    pub generating: usize,
    pub generated: usize,
    pub failed: usize,
}

pub fn stats(items: &[WorkItem]) -> QueueStats {
    let count = |s: Status| items.iter().filter(|i| i.status == s).count();
    QueueStats {
        total: items.len(),
        pending: count(Status::Pending),
        generating: count(Status::Generating),
        generated: count(Status::Generated),
        failed: count(Status::Failed),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const QUEUE: &str = r#"[
      {"slug": "japan", "name": "Japan", "tier": 1, "status": "generated", "generatedAt": "2026-01-02T03:04:05Z", "error": null},
      {"slug": "peru", "name": "Peru", "tier": 1, "status": "pending"},
      {"slug": "chad", "name": "Chad", "tier": 3, "status": "pending"}
    ]"#;

    fn items() -> Vec<WorkItem> {
        serde_json::from_str(QUEUE).unwrap()
    }

    #[test]
    fn parses_queue_json() {
        let q = items();
        assert_eq!(q.len(), 3);
        assert_eq!(q[0].status, Status::Generated);
        assert!(q[0].generated_at.is_some());
        assert_eq!(q[1].error, None);
    }

    #[test]
    fn selects_first_pending() {
        assert_eq!(select(&items(), None).unwrap(), Some(1));
    }

    #[test]
    fn selects_finished_item_by_slug() {
        assert_eq!(select(&items(), Some("japan")).unwrap(), Some(0));
    }

    #[test]
    fn refuses_item_already_generating() {
        let mut q = items();
        q[1].mark_generating();
        let err = select(&q, Some("peru")).unwrap_err();
        assert_eq!(err.to_string(), "Country \"peru\" is already being generated");
        assert_eq!(select(&q, None).unwrap(), Some(2));
    }

    #[test]
    fn unknown_slug_is_error() {
        assert!(select(&items(), Some("atlantis")).is_err());
    }

    #[test]
    fn nothing_pending() {
        let mut q = items();
        q.iter_mut().for_each(|i| i.status = Status::Generated);
        assert_eq!(select(&q, None).unwrap(), None);
    }

    #[test]
    fn store_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let store = JsonQueueStore::new(dir.path().join("queue.json"));
        let mut q = items();
        q[1].mark_generating();
        q[2].mark_failed("All models failed");
        store.save(&q).unwrap();

        let loaded = store.load().unwrap();
        assert_eq!(loaded, q);
        let raw = std::fs::read_to_string(dir.path().join("queue.json")).unwrap();
        assert!(raw.contains("\"generatedAt\""));
        assert!(raw.contains("\"generating\""));
    }

    #[test]
    fn mark_generated_clears_error() {
        let mut item = items().remove(2);
        item.mark_failed("boom");
        item.mark_generated(Utc::now());
        assert_eq!(item.status, Status::Generated);
        assert_eq!(item.error, None);
        assert!(item.generated_at.is_some());
    }

    #[test]
    fn related_names_fall_back_to_slug() {
        let countries = vec![
            CountryProfile {
                slug: "peru".into(),
                name: "Peru".into(),
                region: "South America".into(),
                tourradar_slug: "peru".into(),
                related: vec!["bolivia".into(), "chile".into()],
            },
            CountryProfile {
                slug: "bolivia".into(),
                name: "Bolivia".into(),
                region: "South America".into(),
                tourradar_slug: "bolivia".into(),
                related: vec![],
            },
        ];
        assert_eq!(related_names(&countries[0], &countries), vec!["Bolivia", "chile"]);
    }

    #[test]
    fn counts_by_status() {
        let s = stats(&items());
        assert_eq!((s.total, s.pending, s.generated, s.failed), (3, 2, 1, 0));
    }
}
