mod llm_extractive;

pub use llm_extractive::LlmExtractiveQa;
