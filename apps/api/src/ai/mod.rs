// AI writing features: summary suggestions, cover letters and
// job-description tailoring. All LLM calls go through llm_client.

pub mod handlers;
pub mod jd_text;
pub mod prompts;
