use ai_llm_service::{
    AiLlmError, LlmModelConfig, OpenAiService, config::default_config::config_openai_review_with,
};
use git_platform::{PlaceholderFile, PlatformError, ProviderClient, ProviderConfig, ProviderKind};
use mr_reviewer::{
    ReviewGenerator, ReviewPolicy, ReviewWorkflow, WorkflowSettings,
    workflow::DEFAULT_REVIEW_CONCURRENCY,
};
use thiserror::Error;
use tracing::info;

pub const DEFAULT_API_ADDRESS: &str = "0.0.0.0:8000";
pub const DEFAULT_GITLAB_API_BASE: &str = "https://gitlab.com/api/v4";

/// Startup configuration failures.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("missing required environment variable: {0}")]
    MissingEnv(&'static str),

    #[error("invalid value in {var}: {reason}")]
    Invalid { var: &'static str, reason: String },

    #[error(transparent)]
    Llm(#[from] AiLlmError),

    #[error(transparent)]
    Platform(#[from] PlatformError),
}

/// Everything read from the environment at startup.
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub api_address: String,
    pub gitlab: ProviderConfig,
    pub llm: LlmModelConfig,
    pub workflow: WorkflowSettings,
}

impl AppConfig {
    /// Load configuration from process environment variables.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Same as [`AppConfig::from_env`] with values supplied by `lookup`.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&'static str) -> Option<String>,
    {
        let var = |name: &'static str| {
            lookup(name)
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
        };

        let token = var("GITLAB_TOKEN").ok_or(ConfigError::MissingEnv("GITLAB_TOKEN"))?;
        let gitlab = ProviderConfig {
            kind: ProviderKind::GitLab,
            base_api: var("GITLAB_API_BASE").unwrap_or_else(|| DEFAULT_GITLAB_API_BASE.into()),
            token,
            timeout_secs: parse_var(
                "GITLAB_TIMEOUT_SECS",
                var("GITLAB_TIMEOUT_SECS"),
                git_platform::git_providers::DEFAULT_TIMEOUT_SECS,
            )?,
        };

        let llm = config_openai_review_with(&lookup)?;

        let policy = match var("REVIEW_POLICY") {
            Some(v) => v
                .parse::<ReviewPolicy>()
                .map_err(|reason| ConfigError::Invalid {
                    var: "REVIEW_POLICY",
                    reason,
                })?,
            None => ReviewPolicy::default(),
        };

        let review_concurrency = parse_var(
            "REVIEW_CONCURRENCY",
            var("REVIEW_CONCURRENCY"),
            DEFAULT_REVIEW_CONCURRENCY,
        )?;
        if review_concurrency == 0 {
            return Err(ConfigError::Invalid {
                var: "REVIEW_CONCURRENCY",
                reason: "must be at least 1".into(),
            });
        }

        let placeholder_commit = parse_flag(
            "REVIEW_PLACEHOLDER_COMMIT",
            var("REVIEW_PLACEHOLDER_COMMIT"),
        )?
        .then(PlaceholderFile::default);

        let suggest_labels = parse_flag("REVIEW_SUGGEST_LABELS", var("REVIEW_SUGGEST_LABELS"))?;

        Ok(Self {
            api_address: var("API_ADDRESS").unwrap_or_else(|| DEFAULT_API_ADDRESS.into()),
            gitlab,
            llm,
            workflow: WorkflowSettings {
                policy,
                review_concurrency,
                placeholder_commit,
                suggest_labels,
            },
        })
    }
}

/// Shared state for all HTTP handlers.
pub struct AppState {
    pub workflow: ReviewWorkflow,
}

impl AppState {
    /// Builds the platform and LLM clients and wires them into the workflow.
    pub fn from_config(cfg: &AppConfig) -> Result<Self, ConfigError> {
        let platform = ProviderClient::from_config(cfg.gitlab.clone())?;
        let llm = OpenAiService::new(cfg.llm.clone())?;

        info!(
            gitlab = %cfg.gitlab.base_api,
            model = %cfg.llm.model,
            policy = %cfg.workflow.policy,
            concurrency = cfg.workflow.review_concurrency,
            placeholder_commit = cfg.workflow.placeholder_commit.is_some(),
            suggest_labels = cfg.workflow.suggest_labels,
            "app state ready"
        );

        Ok(Self {
            workflow: ReviewWorkflow::new(
                platform,
                ReviewGenerator::new(llm),
                cfg.workflow.clone(),
            ),
        })
    }
}

fn parse_var<T>(var: &'static str, value: Option<String>, default: T) -> Result<T, ConfigError>
where
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
{
    match value {
        Some(v) => v.parse::<T>().map_err(|e| ConfigError::Invalid {
            var,
            reason: e.to_string(),
        }),
        None => Ok(default),
    }
}

fn parse_flag(var: &'static str, value: Option<String>) -> Result<bool, ConfigError> {
    match value.as_deref().map(str::to_ascii_lowercase).as_deref() {
        None | Some("0" | "false" | "no" | "off") => Ok(false),
        Some("1" | "true" | "yes" | "on") => Ok(true),
        Some(other) => Err(ConfigError::Invalid {
            var,
            reason: format!("expected a boolean, got `{other}`"),
        }),
    }
}
