mod config;
mod document;
mod parser;
mod pipeline;
mod prompt;
mod providers;
mod queue;
mod validate;

use std::process::ExitCode;
use std::time::Instant;

use anyhow::{bail, Context};
use chrono::{Datelike, Utc};
use clap::{Parser, Subcommand};

use crate::config::{ApiKeys, Settings};
use crate::pipeline::ProviderMedia;
use crate::providers::openrouter::OpenRouterClient;
use crate::queue::{JsonQueueStore, QueueStore};
use crate::validate::{Rules, Verdict};

#[derive(Parser)]
#[command(name = "whentogo", about = "Generate and validate \"best time to visit\" country guides")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Generate the next pending article (or the named country)
    Generate {
        /// Country slug from the queue
        slug: Option<String>,
    },
    /// Validate one article, or every article in the content directory
    Validate {
        slug: Option<String>,
        /// Print verdicts as a JSON array
        #[arg(long)]
        json: bool,
    },
    /// Print the generation prompt for a country without calling any provider
    Prompt { slug: String },
    /// Show queue progress
    Status,
}

#[tokio::main]
async fn main() -> anyhow::Result<ExitCode> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info".into()),
        )
        .init();

    let t0 = Instant::now();
    let cli = Cli::parse();
    let settings = Settings::load()?;

    let result = match cli.command {
        Commands::Generate { slug } => {
            let store = JsonQueueStore::new(&settings.queue_path);
            let keys = ApiKeys::from_env();
            let writer = OpenRouterClient::new(keys.openrouter_key()?)?;
            let media = ProviderMedia::new(&settings, &keys)?;
            match pipeline::generate(&store, &writer, &media, &settings, slug.as_deref()).await? {
                Some(summary) => {
                    summary.print();
                    Ok(ExitCode::SUCCESS)
                }
                None => {
                    println!("No pending countries in queue. All done!");
                    Ok(ExitCode::SUCCESS)
                }
            }
        }
        Commands::Validate { slug, json } => {
            let rules = settings.rules();
            let verdicts = match slug {
                Some(slug) => {
                    let path = settings.content_dir.join(format!("{}.md", slug));
                    if !path.exists() {
                        bail!("File not found: {}", path.display());
                    }
                    vec![validate::validate_file(&path, &rules)]
                }
                None => {
                    let paths = if settings.content_dir.is_dir() {
                        validate::list_documents(&settings.content_dir)?
                    } else {
                        Vec::new()
                    };
                    if paths.is_empty() {
                        println!("No articles to validate yet.");
                        return Ok(ExitCode::SUCCESS);
                    }
                    validate_all(&paths, &rules)?
                }
            };
            report(&verdicts, json)
        }
        Commands::Prompt { slug } => {
            let store = JsonQueueStore::new(&settings.queue_path);
            let items = store.load()?;
            let countries = queue::load_countries(&settings.countries_path)?;
            let idx = items
                .iter()
                .position(|i| i.slug == slug)
                .with_context(|| format!("Country \"{}\" not found in queue", slug))?;
            let profile = countries
                .iter()
                .find(|c| c.slug == slug)
                .with_context(|| format!("Country data not found for slug: {}", slug))?;
            let related = queue::related_names(profile, &countries);
            let year = Utc::now().year();
            println!("{}", prompt::build_prompt(&items[idx], profile, &related, year));
            Ok(ExitCode::SUCCESS)
        }
        Commands::Status => {
            let store = JsonQueueStore::new(&settings.queue_path);
            let items = store.load()?;
            let s = queue::stats(&items);
            println!("Total:      {}", s.total);
            println!("Pending:    {}", s.pending);
            println!("Generating: {}", s.generating);
            println!("Generated:  {}", s.generated);
            println!("Failed:     {}", s.failed);
            match queue::select(&items, None)? {
                Some(idx) => println!("\nNext: {} (tier {})", items[idx].name, items[idx].tier),
                None => println!("\nNothing pending."),
            }
            for item in items.iter().filter(|i| i.error.is_some()) {
                println!("  {}: {}", item.slug, item.error.as_deref().unwrap_or_default());
            }
            Ok(ExitCode::SUCCESS)
        }
    };

    let elapsed = t0.elapsed();
    if elapsed.as_secs() >= 1 {
        eprintln!("\nDone in {}", elapsed_label(elapsed));
    }

    result
}

fn validate_all(paths: &[std::path::PathBuf], rules: &Rules) -> anyhow::Result<Vec<Verdict>> {
    use indicatif::{ProgressBar, ProgressStyle};
    use rayon::prelude::*;

    let pb = ProgressBar::new(paths.len() as u64);
    pb.set_style(
        ProgressStyle::default_bar()
            .template("{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len}")?
            .progress_chars("#>-"),
    );

    let verdicts: Vec<Verdict> = paths
        .par_iter()
        .map(|path| {
            let verdict = validate::validate_file(path, rules);
            pb.inc(1);
            verdict
        })
        .collect();

    pb.finish_and_clear();
    Ok(verdicts)
}

fn report(verdicts: &[Verdict], json: bool) -> anyhow::Result<ExitCode> {
    let all_pass = verdicts.iter().all(|v| v.pass);
    if json {
        println!("{}", serde_json::to_string_pretty(verdicts)?);
    } else {
        for v in verdicts {
            v.print();
        }
        if verdicts.len() > 1 {
            let passed = verdicts.iter().filter(|v| v.pass).count();
            println!("\n{}/{} passed", passed, verdicts.len());
        }
        println!("\n{}", if all_pass { "ALL PASSED" } else { "SOME FAILED" });
    }
    Ok(if all_pass { ExitCode::SUCCESS } else { ExitCode::FAILURE })
}

/// Generation runs take minutes, validation runs seconds.
fn elapsed_label(d: std::time::Duration) -> String {
    match d.as_secs() {
        0..=59 => format!("{:.1}s", d.as_secs_f64()),
        secs => format!("{}m {:02}s", secs / 60, secs % 60),
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use super::*;

    #[test]
    fn elapsed_labels() {
        assert_eq!(elapsed_label(Duration::from_millis(2500)), "2.5s");
        assert_eq!(elapsed_label(Duration::from_secs(185)), "3m 05s");
        assert_eq!(elapsed_label(Duration::from_secs(7260)), "121m 00s");
    }
}
