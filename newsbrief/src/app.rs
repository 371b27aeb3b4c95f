// Startup wiring: credential lookup and provider construction
use common::{Config, LlmConfig};
use std::sync::Arc;
use tracing::info;

use crate::digest::{DigestGenerator, DigestSettings};
use crate::error::BriefError;
use crate::llm::remote::RemoteLlmProvider;
use crate::news::duckduckgo::DuckDuckGoNews;
use crate::repl::Driver;

/// Look up the model API key. Absent or blank values are a `MissingCredential`.
pub fn resolve_api_key<F>(cfg: &LlmConfig, lookup: F) -> Result<String, BriefError>
where
    F: Fn(&str) -> Option<String>,
{
    let var = cfg.api_key_env();
    match lookup(var) {
        Some(key) if !key.trim().is_empty() => Ok(key),
        _ => Err(BriefError::MissingCredential {
            var: var.to_string(),
        }),
    }
}

/// Build the driver from configuration. The credential is checked before any
/// provider is constructed.
pub fn build_driver<F>(
    config: &Config,
    max_results: Option<usize>,
    lookup: F,
) -> Result<Driver, BriefError>
where
    F: Fn(&str) -> Option<String>,
{
    let api_key = resolve_api_key(&config.llm, lookup)?;

    let settings = DigestSettings {
        model: config.llm.model().to_string(),
        ..DigestSettings::default()
    };
    let llm = RemoteLlmProvider::new(config.llm.api_url(), api_key, config.llm.model()).with_defaults(
        config.llm.timeout_seconds(),
        config.llm.max_tokens(),
        settings.temperature,
    );
    info!(model = %llm.model(), api_url = %config.llm.api_url(), "LLM provider initialized");

    let news = DuckDuckGoNews::from_config(&config.news);
    let max_results = max_results.unwrap_or_else(|| config.news.max_results());
    info!(base_url = %config.news.base_url(), max_results, "news provider initialized");

    Ok(Driver::new(
        Arc::new(news),
        DigestGenerator::new(Arc::new(llm), settings),
        max_results,
    ))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_resolve_api_key() {
        let cfg = LlmConfig::default();

        let key = resolve_api_key(&cfg, |var| {
            assert_eq!(var, "GOOGLE_API_KEY");
            Some("secret".to_string())
        });
        assert_eq!(key.unwrap(), "secret");

        let err = resolve_api_key(&cfg, |_| None).unwrap_err();
        assert!(matches!(err, BriefError::MissingCredential { ref var } if var == "GOOGLE_API_KEY"));
        assert_eq!(err.to_string(), "Missing GOOGLE_API_KEY in environment or .env");

        assert!(resolve_api_key(&cfg, |_| Some("   ".to_string())).is_err());
    }

    #[test]
    fn test_custom_key_variable() {
        let cfg = LlmConfig {
            api_key_env: Some("MY_LLM_KEY".to_string()),
            ..Default::default()
        };
        let err = resolve_api_key(&cfg, |_| None).unwrap_err();
        assert!(err.to_string().contains("MY_LLM_KEY"));
    }
}
