/// Represents the provider (backend) used for large language model (LLM) inference.
///
/// Only OpenAI-compatible chat-completion APIs are supported today. Adding
/// more providers later is done by extending this enum and the matching
/// service under `services/`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LlmProvider {
    /// OpenAI's chat-completions API (or any compatible gateway).
    OpenAI,
}
