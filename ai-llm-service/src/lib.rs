//! Shared LLM access for the review service.
//!
//! - [`config`] turns environment variables into an [`LlmModelConfig`]
//! - [`services::open_ai_service::OpenAiService`] runs chat completions
//! - [`error_handler`] holds the unified [`AiLlmError`]

pub mod config {
    pub mod default_config;
    pub mod llm_model_config;
    pub mod llm_provider;
}

pub mod error_handler;

pub mod services {
    pub mod open_ai_service;
}

pub use config::{llm_model_config::LlmModelConfig, llm_provider::LlmProvider};
pub use error_handler::AiLlmError;
pub use services::open_ai_service::{ChatCompletion, OpenAiService};
