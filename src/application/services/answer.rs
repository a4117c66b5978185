use std::sync::Arc;
use tracing::{debug, info, instrument, warn};

use crate::domain::{
    ports::{ExtractiveQa, LlmService},
    Lookup,
};

pub const DEFAULT_GENERATIVE_TEMPLATE: &str =
    "Answer the following question in a clear and concise manner: {query}";

/// Fills the template's `{history}` slot when earlier turns exist.
pub const DEFAULT_HISTORY_TEMPLATE: &str = "Conversation so far:\n{turns}\n";

/// The two answering strategies: pull a span out of known context, or let a
/// generative model answer from the question alone.
pub struct AnswerGenerator {
    qa: Arc<dyn ExtractiveQa>,
    llm: Arc<dyn LlmService>,
    system_prompt: Option<String>,
    template: String,
    history_template: String,
}

impl AnswerGenerator {
    pub fn new(qa: Arc<dyn ExtractiveQa>, llm: Arc<dyn LlmService>) -> Self {
        Self {
            qa,
            llm,
            system_prompt: None,
            template: DEFAULT_GENERATIVE_TEMPLATE.to_string(),
            history_template: DEFAULT_HISTORY_TEMPLATE.to_string(),
        }
    }

    pub fn with_system_prompt(mut self, prompt: impl Into<String>) -> Self {
        let prompt = prompt.into();
        self.system_prompt = (!prompt.trim().is_empty()).then_some(prompt);
        self
    }

    pub fn with_template(mut self, template: impl Into<String>) -> Self {
        self.template = template.into();
        self
    }

    pub fn with_history_template(mut self, template: impl Into<String>) -> Self {
        self.history_template = template.into();
        self
    }

    /// Answer span from `context`. A span that does not occur in the context
    /// is discarded.
    #[instrument(skip(self, context))]
    pub async fn extractive(&self, query: &str, context: &str) -> Lookup<String> {
        let answer = match self.qa.answer(query, context).await {
            Ok(answer) => answer,
            Err(e) => {
                warn!(error = %e, "extractive answer failed");
                return Lookup::Failed(e);
            }
        };

        let span = answer.trim();
        if span.is_empty() {
            return Lookup::NotFound;
        }
        if !context.to_lowercase().contains(&span.to_lowercase()) {
            debug!(span, "answer is not a span of the context");
            return Lookup::NotFound;
        }

        info!(answer = span, "extractive answer");
        Lookup::Found(span.to_string())
    }

    /// Answer from the model alone. `history` holds earlier turns as
    /// `Speaker: text` lines and only reaches the prompt through a
    /// `{history}` slot in the template.
    #[instrument(skip(self, history))]
    pub async fn generative(&self, query: &str, history: &str) -> Lookup<String> {
        let prompt = self.build_prompt(query, history);
        let result = match &self.system_prompt {
            Some(system) => self.llm.complete_with_system(system, &prompt).await,
            None => self.llm.complete(&prompt).await,
        };

        match result {
            Ok(text) => {
                let lookup = Lookup::Found(text.trim().to_string()).non_empty();
                if let Lookup::Found(answer) = &lookup {
                    info!(answer = %answer, "generated answer");
                }
                lookup
            }
            Err(e) => {
                warn!(error = %e, "generative answer failed");
                Lookup::Failed(e)
            }
        }
    }

    fn build_prompt(&self, query: &str, history: &str) -> String {
        let history = if history.trim().is_empty() {
            String::new()
        } else {
            self.history_template.replace("{turns}", history.trim_end())
        };
        let template = self.template.replace("{history}", &history);

        if template.contains("{query}") {
            template.replace("{query}", query)
        } else {
            format!("{template}\n\n{query}")
        }
    }
}
