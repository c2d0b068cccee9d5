use std::env;
use std::path::PathBuf;

use anyhow::{anyhow, Result};
use config::{Config, Environment};
use serde::Deserialize;

use crate::validate::Rules;

/// File locations and validation thresholds. Defaults suit running from the
/// site root; any field can be overridden with `WHENTOGO_<FIELD>`.
#[derive(Debug, Clone, Deserialize)]
pub struct Settings {
    pub content_dir: PathBuf,
    pub queue_path: PathBuf,
    pub countries_path: PathBuf,
    pub static_dir: PathBuf,
    pub site_root: PathBuf,
    pub min_words: usize,
    pub max_words: usize,
}

impl Settings {
    pub fn load() -> Result<Self> {
        Self::from_env(Environment::with_prefix("WHENTOGO"))
    }

    fn from_env(env: Environment) -> Result<Self> {
        let defaults = Rules::default();
        let settings = Config::builder()
            .set_default("content_dir", "content/countries")?
            .set_default("queue_path", "data/queue.json")?
            .set_default("countries_path", "data/countries.json")?
            .set_default("static_dir", "static")?
            .set_default("site_root", ".")?
            .set_default("min_words", defaults.min_words as u64)?
            .set_default("max_words", defaults.max_words as u64)?
            .add_source(env.try_parsing(true))
            .build()?;
        Ok(settings.try_deserialize()?)
    }

    pub fn rules(&self) -> Rules {
        Rules {
            min_words: self.min_words,
            max_words: self.max_words,
            site_root: Some(self.site_root.clone()),
            ..Rules::default()
        }
    }
}

/// Provider credentials. Only the OpenRouter key is mandatory, and only
/// for generation.
#[derive(Debug, Clone, Default)]
pub struct ApiKeys {
    pub openrouter: Option<String>,
    pub gemini: Option<String>,
    pub openai: Option<String>,
}

impl ApiKeys {
    pub fn from_env() -> Self {
        let var = |name: &str| env::var(name).ok().filter(|v| !v.trim().is_empty());
        ApiKeys {
            openrouter: var("OPENROUTER_API_KEY"),
            gemini: var("GEMINI_API_KEY"),
            openai: var("OPENAI_API_KEY"),
        }
    }

    pub fn openrouter_key(&self) -> Result<&str> {
        self.openrouter
            .as_deref()
            .ok_or_else(|| anyhow!("OPENROUTER_API_KEY not set"))
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    fn env(vars: &[(&str, &str)]) -> Environment {
        let map: HashMap<String, String> = vars.iter().map(|(k, v)| (k.to_string(), v.to_string())).collect();
        Environment::with_prefix("WHENTOGO").source(Some(map))
    }

    #[test]
    fn defaults() {
        let s = Settings::from_env(env(&[])).unwrap();
        assert_eq!(s.content_dir, PathBuf::from("content/countries"));
        assert_eq!(s.queue_path, PathBuf::from("data/queue.json"));
        assert_eq!(s.min_words, 1400);
        assert_eq!(s.max_words, 5000);
    }

    #[test]
    fn env_overrides() {
        let s = Settings::from_env(env(&[
            ("WHENTOGO_MIN_WORDS", "2000"),
            ("WHENTOGO_CONTENT_DIR", "site/content"),
        ]))
        .unwrap();
        assert_eq!(s.min_words, 2000);
        assert_eq!(s.content_dir, PathBuf::from("site/content"));

        let rules = s.rules();
        assert_eq!(rules.min_words, 2000);
        assert_eq!(rules.required_faqs, 5);
        assert_eq!(rules.site_root, Some(PathBuf::from(".")));
    }

    #[test]
    fn openrouter_key_is_required() {
        let err = ApiKeys::default().openrouter_key().unwrap_err();
        assert_eq!(err.to_string(), "OPENROUTER_API_KEY not set");

        let keys = ApiKeys {
            openrouter: Some("sk-or-1".into()),
            ..ApiKeys::default()
        };
        assert_eq!(keys.openrouter_key().unwrap(), "sk-or-1");
    }
}
