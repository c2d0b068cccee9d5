use std::fmt;
use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{anyhow, bail, Context, Result};
use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use serde::Deserialize;
use tracing::{info, warn};

use super::first_success;
use crate::document::MediaRef;

const GEMINI_IMAGE_URL: &str =
    "https://generativelanguage.googleapis.com/v1beta/models/gemini-2.5-flash-image:generateContent";
const DALLE_URL: &str = "https://api.openai.com/v1/images/generations";
const UNSPLASH_URL: &str = "https://source.unsplash.com/1600x900/";
/// Smaller payloads are placeholder or error images.
const MIN_STOCK_BYTES: usize = 10_000;

enum HeroSource<'k> {
    Gemini { key: &'k str },
    Unsplash { query: String },
}

impl fmt::Display for HeroSource<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            HeroSource::Gemini { .. } => f.write_str("Gemini"),
            HeroSource::Unsplash { query } => write!(f, "Unsplash \"{}\"", query),
        }
    }
}

enum ChartSource<'k> {
    Gemini { key: &'k str },
    Dalle { key: &'k str },
}

impl fmt::Display for ChartSource<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ChartSource::Gemini { .. } => f.write_str("Gemini"),
            ChartSource::Dalle { .. } => f.write_str("DALL-E"),
        }
    }
}

#[derive(Deserialize)]
struct GeminiResponse {
    #[serde(default)]
    candidates: Vec<GeminiCandidate>,
}

#[derive(Deserialize)]
struct GeminiCandidate {
    content: Option<GeminiContent>,
}

#[derive(Deserialize)]
struct GeminiContent {
    #[serde(default)]
    parts: Vec<GeminiPart>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct GeminiPart {
    inline_data: Option<InlineData>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct InlineData {
    mime_type: String,
    data: String,
}

#[derive(Deserialize)]
struct DalleResponse {
    data: Vec<DalleImage>,
}

#[derive(Deserialize)]
struct DalleImage {
    b64_json: String,
}

/// Hero and climate-chart images, written under `{static_dir}/images/countries/{slug}/`.
pub struct ImageClient {
    http: reqwest::Client,
    static_dir: PathBuf,
}

impl ImageClient {
    pub fn new(static_dir: impl Into<PathBuf>) -> Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(180))
            .build()
            .context("Failed to build HTTP client")?;
        Ok(ImageClient {
            http,
            static_dir: static_dir.into(),
        })
    }

    fn local_path(&self, slug: &str, file: &str) -> PathBuf {
        self.static_dir.join("images/countries").join(slug).join(file)
    }

    /// `None` when every source failed; callers treat that as "no image".
    pub async fn fetch_hero_image(&self, name: &str, slug: &str, gemini_key: Option<&str>) -> Option<MediaRef> {
        let path = self.local_path(slug, "hero.png");
        let public = format!("/images/countries/{}/hero.png", slug);
        let alt = format!("{} landscape - travel destination", name);

        if path.exists() {
            info!("Hero image already exists for {}", name);
            return Some(MediaRef { path: public, alt, credit: "AI-generated".into() });
        }

        let mut sources: Vec<HeroSource> = gemini_key.map(|key| HeroSource::Gemini { key }).into_iter().collect();
        sources.extend(
            [format!("{name} landscape"), format!("{name} travel"), name.to_string()]
                .into_iter()
                .map(|query| HeroSource::Unsplash { query }),
        );

        let target = path.as_path();
        let result = first_success(&sources, |source| async move {
            let bytes = match source {
                HeroSource::Gemini { key } => self.gemini_image(key, &hero_prompt(name)).await?,
                HeroSource::Unsplash { query } => self.unsplash(query).await?,
            };
            save(target, &bytes).await?;
            info!("Saved {} hero for {} ({} bytes)", source, name, bytes.len());
            Ok::<(), anyhow::Error>(())
        })
        .await;

        match result {
            Ok((source, ())) => {
                let credit = match source {
                    HeroSource::Gemini { .. } => "AI-generated via Gemini",
                    HeroSource::Unsplash { .. } => "Photo via Unsplash",
                };
                Some(MediaRef { path: public, alt, credit: credit.into() })
            }
            Err(e) => {
                warn!("No hero image found for {}: {}", name, e);
                None
            }
        }
    }

    /// Public path of the chart, or `None` when no source produced one.
    pub async fn generate_climate_chart(
        &self,
        name: &str,
        slug: &str,
        gemini_key: Option<&str>,
        openai_key: Option<&str>,
    ) -> Option<String> {
        let path = self.local_path(slug, "climate-chart.png");
        let public = format!("/images/countries/{}/climate-chart.png", slug);

        if path.exists() {
            info!("Climate chart already exists for {}", name);
            return Some(public);
        }

        let sources: Vec<ChartSource> = gemini_key
            .map(|key| ChartSource::Gemini { key })
            .into_iter()
            .chain(openai_key.map(|key| ChartSource::Dalle { key }))
            .collect();

        let target = path.as_path();
        let result = first_success(&sources, |source| async move {
            let bytes = match source {
                ChartSource::Gemini { key } => self.gemini_image(key, &gemini_chart_prompt(name)).await?,
                ChartSource::Dalle { key } => self.dalle_image(key, &dalle_chart_prompt(name)).await?,
            };
            save(target, &bytes).await?;
            info!("Saved {} climate chart for {} ({} bytes)", source, name, bytes.len());
            Ok::<(), anyhow::Error>(())
        })
        .await;

        match result {
            Ok(_) => Some(public),
            Err(e) => {
                warn!("Could not generate climate chart for {}: {}", name, e);
                None
            }
        }
    }

    async fn gemini_image(&self, key: &str, prompt: &str) -> Result<Vec<u8>> {
        let body = serde_json::json!({
            "contents": [{ "parts": [{ "text": prompt }] }],
            "generationConfig": { "responseModalities": ["TEXT", "IMAGE"] },
        });
        let resp = self
            .http
            .post(GEMINI_IMAGE_URL)
            .query(&[("key", key)])
            .json(&body)
            .send()
            .await
            .context("Gemini request failed")?;

        let status = resp.status();
        if !status.is_success() {
            let text = resp.text().await.unwrap_or_default();
            bail!("Gemini returned {}: {}", status, truncate(&text, 200));
        }
        let parsed: GeminiResponse = resp.json().await.context("Malformed Gemini response")?;
        inline_image(parsed)
    }

    async fn dalle_image(&self, key: &str, prompt: &str) -> Result<Vec<u8>> {
        let body = serde_json::json!({
            "model": "dall-e-3",
            "prompt": prompt,
            "n": 1,
            "size": "1792x1024",
            "quality": "standard",
            "response_format": "b64_json",
        });
        let resp = self
            .http
            .post(DALLE_URL)
            .bearer_auth(key)
            .json(&body)
            .send()
            .await
            .context("DALL-E request failed")?;

        let status = resp.status();
        if !status.is_success() {
            let text = resp.text().await.unwrap_or_default();
            bail!("DALL-E returned {}: {}", status, truncate(&text, 200));
        }
        let parsed: DalleResponse = resp.json().await.context("Malformed DALL-E response")?;
        let first = parsed.data.first().ok_or_else(|| anyhow!("DALL-E returned no images"))?;
        STANDARD.decode(&first.b64_json).context("DALL-E image is not valid base64")
    }

    async fn unsplash(&self, query: &str) -> Result<Vec<u8>> {
        let mut url = reqwest::Url::parse(UNSPLASH_URL)?;
        url.set_query(Some(query));
        let resp = self.http.get(url).send().await.context("Unsplash request failed")?;

        let status = resp.status();
        if !status.is_success() {
            bail!("Unsplash returned {}", status);
        }
        let content_type = resp
            .headers()
            .get(reqwest::header::CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .unwrap_or("")
            .to_string();
        if !content_type.contains("image") {
            bail!("Not an image ({})", content_type);
        }
        let bytes = resp.bytes().await?;
        if bytes.len() < MIN_STOCK_BYTES {
            bail!("Image too small ({} bytes)", bytes.len());
        }
        Ok(bytes.to_vec())
    }
}

/// First inline image part of a Gemini response, decoded.
fn inline_image(resp: GeminiResponse) -> Result<Vec<u8>> {
    let data = resp
        .candidates
        .into_iter()
        .filter_map(|c| c.content)
        .flat_map(|c| c.parts)
        .filter_map(|p| p.inline_data)
        .find(|d| d.mime_type.starts_with("image/"))
        .ok_or_else(|| anyhow!("No image found in Gemini response"))?;
    STANDARD.decode(data.data).context("Gemini image is not valid base64")
}

async fn save(path: &Path, bytes: &[u8]) -> Result<()> {
    if let Some(dir) = path.parent() {
        tokio::fs::create_dir_all(dir).await?;
    }
    tokio::fs::write(path, bytes)
        .await
        .with_context(|| format!("Failed to write {:?}", path))
}

fn truncate(s: &str, max: usize) -> String {
    s.chars().take(max).collect()
}

fn hero_prompt(name: &str) -> String {
    format!(
        "Generate a stunning, cinematic landscape photograph of {name}. Show an iconic, \
         breathtaking view that captures the essence of this country -- famous landmarks, natural \
         beauty, or cultural scenery. Wide-angle, golden hour lighting, vibrant but natural colors, \
         magazine cover quality. Photorealistic style, 16:9 aspect ratio."
    )
}

fn gemini_chart_prompt(name: &str) -> String {
    format!(
        "Create a clean, professional infographic climate chart for {name}. Show all 12 months \
         (Jan through Dec) in a horizontal layout. Use color coding: bright green for \"Best time \
         to visit\", warm yellow for \"Shoulder season\", soft coral/red for \"Less ideal\". Include \
         approximate temperature ranges (Celsius) and rainfall indicators for each month. Clean \
         white background, modern flat design with rounded elements, easy to read at a glance. \
         Title at top: \"Best Time to Visit {name}\". Subtitle: \"Monthly Climate Overview\". Use a \
         professional sans-serif font. No watermarks, no decorative borders. Make it look like a \
         high-quality travel magazine infographic."
    )
}

fn dalle_chart_prompt(name: &str) -> String {
    format!(
        "Create a clean, professional infographic climate chart for {name}. Show a horizontal bar \
         chart or visual calendar with all 12 months (Jan-Dec). Use color coding: green for \"Best \
         time to visit\", yellow for \"Shoulder season\", orange/red for \"Less ideal\". Include \
         approximate temperature ranges and rainfall indicators. Clean white background, modern \
         flat design, easy to read. Title: \"Best Time to Visit {name} - Monthly Overview\". No \
         watermarks."
    )
}
