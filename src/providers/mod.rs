pub mod images;
pub mod openrouter;

use std::fmt;
use std::future::Future;

use thiserror::Error;
use tracing::{info, warn};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Attempt {
    pub provider: String,
    pub error: String,
}

#[derive(Debug, Error)]
pub enum ProviderError {
    #[error("no providers configured")]
    NoProviders,
    #[error("all providers failed: {}", describe(.attempts))]
    Exhausted { attempts: Vec<Attempt> },
}

fn describe(attempts: &[Attempt]) -> String {
    attempts
        .iter()
        .map(|a| format!("{} ({})", a.provider, a.error))
        .collect::<Vec<_>>()
        .join("; ")
}

/// Call each provider in order until one succeeds. Every failure is kept so
/// the final error names all attempts, not just the last.
pub async fn first_success<'a, P, T, F, Fut>(
    providers: &'a [P],
    mut attempt: F,
) -> Result<(&'a P, T), ProviderError>
where
    P: fmt::Display,
    F: FnMut(&'a P) -> Fut,
    Fut: Future<Output = anyhow::Result<T>>,
{
    if providers.is_empty() {
        return Err(ProviderError::NoProviders);
    }

    let mut attempts = Vec::new();
    for provider in providers {
        info!("Trying {}...", provider);
        match attempt(provider).await {
            Ok(value) => return Ok((provider, value)),
            Err(e) => {
                warn!("{} failed: {:#}", provider, e);
                attempts.push(Attempt {
                    provider: provider.to_string(),
                    error: format!("{:#}", e),
                });
            }
        }
    }
    Err(ProviderError::Exhausted { attempts })
}

#[cfg(test)]
mod tests {
    use anyhow::anyhow;

    use super::*;

    #[tokio::test]
    async fn stops_at_first_success() {
        let providers = ["alpha", "beta", "gamma"];
        let mut called = Vec::new();
        let (p, v) = first_success(&providers, |p| {
            called.push(*p);
            let ok = *p == "beta";
            async move {
                if ok {
                    Ok(42)
                } else {
                    Err(anyhow!("down"))
                }
            }
        })
        .await
        .unwrap();
        assert_eq!((*p, v), ("beta", 42));
        assert_eq!(called, vec!["alpha", "beta"]);
    }

    #[tokio::test]
    async fn aggregates_every_failure() {
        let providers = ["alpha", "beta"];
        let err = first_success(&providers, |p| {
            let msg = format!("{p} returned 503");
            async move { Err::<(), _>(anyhow!(msg)) }
        })
        .await
        .unwrap_err();

        match &err {
            ProviderError::Exhausted { attempts } => {
                assert_eq!(attempts.len(), 2);
                assert_eq!(attempts[1].provider, "beta");
            }
            other => panic!("unexpected {other:?}"),
        }
        assert_eq!(
            err.to_string(),
            "all providers failed: alpha (alpha returned 503); beta (beta returned 503)"
        );
    }

    #[tokio::test]
    async fn empty_list() {
        let providers: [&str; 0] = [];
        let err = first_success(&providers, |_| async { Ok::<(), anyhow::Error>(()) }).await.unwrap_err();
        assert!(matches!(err, ProviderError::NoProviders));
    }
}
