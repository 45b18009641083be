//! Default LLM configs loaded from environment variables.
//!
//! Only the **review** role exists: a chat model that turns a diff into a
//! short code review. It favours focused output, so the defaults keep the
//! temperature low and the output bounded.
//!
//! # Environment variables
//!
//! - `OPENAI_API_KEY`   = API key (mandatory)
//! - `OPENAI_BASE_URL`  = API base (default `https://api.openai.com`)
//! - `OPENAI_MODEL`     = model name (default `gpt-4o-mini`)
//! - `LLM_MAX_TOKENS`   = output token ceiling (default `500`)
//! - `LLM_TEMPERATURE`  = sampling temperature, `0.0..=2.0` (default `0.3`)
//! - `LLM_TIMEOUT_SECS` = request timeout (default `60`)

use crate::{
    config::{llm_model_config::LlmModelConfig, llm_provider::LlmProvider},
    error_handler::{
        AiLlmError, ConfigError, must_var, parse_opt, validate_http_endpoint, validate_range_f32,
    },
};

pub const DEFAULT_OPENAI_BASE_URL: &str = "https://api.openai.com";
pub const DEFAULT_OPENAI_MODEL: &str = "gpt-4o-mini";
pub const DEFAULT_MAX_TOKENS: u32 = 500;
pub const DEFAULT_TEMPERATURE: f32 = 0.3;
pub const DEFAULT_TIMEOUT_SECS: u64 = 60;

/// Constructs the review model config from values supplied by `lookup`
/// (usually the process environment).
///
/// # Errors
///
/// - [`ConfigError::MissingVar`] if `OPENAI_API_KEY` is missing
/// - [`ConfigError::InvalidNumber`] / [`ConfigError::OutOfRange`] for bad numbers
/// - [`ConfigError::InvalidFormat`] if the base URL has no http(s) scheme
pub fn config_openai_review_with<F>(lookup: F) -> Result<LlmModelConfig, AiLlmError>
where
    F: Fn(&'static str) -> Option<String>,
{
    let api_key = must_var("OPENAI_API_KEY", lookup("OPENAI_API_KEY"))?;

    let endpoint = lookup("OPENAI_BASE_URL")
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
        .unwrap_or_else(|| DEFAULT_OPENAI_BASE_URL.to_string());
    validate_http_endpoint("OPENAI_BASE_URL", &endpoint)?;

    let model = lookup("OPENAI_MODEL")
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
        .unwrap_or_else(|| DEFAULT_OPENAI_MODEL.to_string());

    let max_tokens = parse_opt::<u32>("LLM_MAX_TOKENS", lookup("LLM_MAX_TOKENS"), "expected u32")?
        .unwrap_or(DEFAULT_MAX_TOKENS);
    if max_tokens == 0 {
        return Err(ConfigError::OutOfRange {
            field: "LLM_MAX_TOKENS",
            detail: "expected a positive token ceiling",
        }
        .into());
    }

    let temperature =
        parse_opt::<f32>("LLM_TEMPERATURE", lookup("LLM_TEMPERATURE"), "expected f32")?
            .unwrap_or(DEFAULT_TEMPERATURE);
    validate_range_f32("LLM_TEMPERATURE", "expected 0.0..=2.0", temperature, 0.0, 2.0)?;

    let timeout_secs =
        parse_opt::<u64>("LLM_TIMEOUT_SECS", lookup("LLM_TIMEOUT_SECS"), "expected u64")?
            .unwrap_or(DEFAULT_TIMEOUT_SECS);

    Ok(LlmModelConfig {
        provider: LlmProvider::OpenAI,
        model,
        endpoint,
        api_key: Some(api_key),
        max_tokens: Some(max_tokens),
        temperature: Some(temperature),
        top_p: None,
        timeout_secs: Some(timeout_secs),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup_from(pairs: &[(&'static str, &str)]) -> impl Fn(&'static str) -> Option<String> {
        let map: HashMap<&'static str, String> =
            pairs.iter().map(|(k, v)| (*k, v.to_string())).collect();
        move |k| map.get(k).cloned()
    }

    #[test]
    fn defaults_apply_when_only_key_is_set() {
        let cfg =
            config_openai_review_with(lookup_from(&[("OPENAI_API_KEY", "sk-test")])).unwrap();
        assert_eq!(cfg.provider, LlmProvider::OpenAI);
        assert_eq!(cfg.model, DEFAULT_OPENAI_MODEL);
        assert_eq!(cfg.endpoint, DEFAULT_OPENAI_BASE_URL);
        assert_eq!(cfg.api_key.as_deref(), Some("sk-test"));
        assert_eq!(cfg.max_tokens, Some(500));
        assert_eq!(cfg.temperature, Some(0.3));
        assert_eq!(cfg.timeout_secs, Some(60));
    }

    #[test]
    fn missing_key_is_fatal() {
        let err = config_openai_review_with(lookup_from(&[])).unwrap_err();
        assert!(matches!(
            err,
            AiLlmError::Config(ConfigError::MissingVar("OPENAI_API_KEY"))
        ));
    }

    #[test]
    fn overrides_are_parsed_and_validated() {
        let cfg = config_openai_review_with(lookup_from(&[
            ("OPENAI_API_KEY", "sk-test"),
            ("OPENAI_BASE_URL", "http://localhost:9999"),
            ("OPENAI_MODEL", "gpt-4o"),
            ("LLM_MAX_TOKENS", "800"),
            ("LLM_TEMPERATURE", "0.5"),
        ]))
        .unwrap();
        assert_eq!(cfg.endpoint, "http://localhost:9999");
        assert_eq!(cfg.model, "gpt-4o");
        assert_eq!(cfg.max_tokens, Some(800));
        assert_eq!(cfg.temperature, Some(0.5));

        let err = config_openai_review_with(lookup_from(&[
            ("OPENAI_API_KEY", "sk-test"),
            ("LLM_TEMPERATURE", "3.0"),
        ]))
        .unwrap_err();
        assert!(matches!(err, AiLlmError::Config(ConfigError::OutOfRange { .. })));

        let err = config_openai_review_with(lookup_from(&[
            ("OPENAI_API_KEY", "sk-test"),
            ("LLM_MAX_TOKENS", "lots"),
        ]))
        .unwrap_err();
        assert!(matches!(err, AiLlmError::Config(ConfigError::InvalidNumber { .. })));
    }
}
