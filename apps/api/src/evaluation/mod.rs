// Evaluation Engine: scores one transcribed answer on five fixed criteria.
// All LLM calls go through llm_client; nothing here talks to Anthropic directly.

pub mod criteria;
pub mod engine;
pub mod prompts;
pub mod schema;
