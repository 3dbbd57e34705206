//! Prompt construction for a chat turn.
//!
//! Order matters: instructions first, reference material second,
//! conversation history last, so recency dominates the model's attention
//! within the bounded output budget.

use techpulse_llm::Message as LlmMessage;
use techpulse_persist::{KnowledgeSnippet, Message, MessageRole};

/// Fixed assistant persona and domain guidance.
pub const SYNTH_PERSONA: &str = "You are Synth, an automotive technical support assistant. \
You help with car problems, diagnostics, and repairs.";

const GUIDELINES: &str = "Guidelines:
- Be helpful and professional
- Provide specific automotive advice
- Ask clarifying questions when needed
- Reference VIN, make, model, year when relevant
- Suggest diagnostic steps when appropriate";

pub struct ContextAssembler {
    persona: String,
    history_limit: usize,
}

impl Default for ContextAssembler {
    fn default() -> Self {
        Self {
            persona: SYNTH_PERSONA.to_string(),
            history_limit: 10,
        }
    }
}

impl ContextAssembler {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_persona(mut self, persona: impl Into<String>) -> Self {
        self.persona = persona.into();
        self
    }

    pub fn with_history_limit(mut self, limit: usize) -> Self {
        self.history_limit = limit;
        self
    }

    /// Build the ordered prompt: one system block (persona + knowledge),
    /// then up to the last `history_limit` stored messages chronologically,
    /// then the in-flight user message. `history` must not contain the
    /// in-flight turn; the caller filters it out.
    pub fn assemble(
        &self,
        snippets: &[KnowledgeSnippet],
        history: &[Message],
        incoming: &str,
    ) -> Vec<LlmMessage> {
        let mut messages = vec![LlmMessage::system(self.system_prompt(snippets))];

        let skip = history.len().saturating_sub(self.history_limit);
        for msg in &history[skip..] {
            let llm_msg = match msg.role {
                MessageRole::User => LlmMessage::human(msg.content.as_str()),
                MessageRole::Assistant => LlmMessage::ai(msg.content.as_str()),
            };
            messages.push(llm_msg);
        }

        messages.push(LlmMessage::human(incoming));
        messages
    }

    fn system_prompt(&self, snippets: &[KnowledgeSnippet]) -> String {
        let knowledge = if snippets.is_empty() {
            "(none)".to_string()
        } else {
            snippets
                .iter()
                .map(|s| format!("- {}: {}", s.title, s.content))
                .collect::<Vec<_>>()
                .join("\n")
        };

        format!(
            "{}\n\nKnowledge Base Context:\n{}\n\n{}",
            self.persona, knowledge, GUIDELINES
        )
    }
}
