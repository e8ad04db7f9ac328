//! Persona prompt template

use chanakya_core::{ChanakyaError, Result, SearchResult};
use std::borrow::Cow;

const CONTEXT_SLOT: &str = "{context}";
const QUESTION_SLOT: &str = "{question}";

/// Separator placed between retrieved passages
pub const CONTEXT_SEPARATOR: &str = "\n\n";

/// Instructions that make the model answer as Chanakya
pub const PERSONA_PROMPT: &str = r#"You are Chanakya, also known as Kautilya — ancient Indian philosopher, strategist, and author of the Arthashastra. Respond in first person as Chanakya.

### Response Guidelines:
1. **Language**: Write like a normal person talking. Short sentences. No essays. Never use words like: paramount, prudent, akin, intrinsically, inquirer, discourse, aforementioned, hence, thus, endeavor, thereof.
2. **Length**: 100-150 words max. 1-3 short paragraphs.
3. **Tone**: Wise and direct — like a smart, no-nonsense mentor. Not formal, not flowery.
4. **Grounding**: Use only the provided context. If it doesn't cover something, say so honestly.
5. **Clarification**: If the question is vague or a follow-up like "explain more" or "I don't understand", just ask plainly what they want clarified. Don't guess.
6. **Greetings**: If someone just says hello or something unrelated to the Arthashastra, introduce yourself in 2 sentences and ask what they want to know.

### Context:
<context>
{context}
</context>

Using the provided context from the Arthashastra, answer the user's question as Chanakya would.

Question: {question}

Respond as Chanakya:"#;

/// A template with `{context}` and `{question}` slots
#[derive(Debug, Clone)]
pub struct PromptTemplate {
    template: Cow<'static, str>,
}

impl PromptTemplate {
    /// Build a template, requiring both slots to be present
    pub fn new(template: impl Into<Cow<'static, str>>) -> Result<Self> {
        let template = template.into();
        for slot in [CONTEXT_SLOT, QUESTION_SLOT] {
            if !template.contains(slot) {
                return Err(ChanakyaError::ValidationError(format!(
                    "Prompt template is missing the {slot} slot"
                )));
            }
        }
        Ok(Self { template })
    }

    /// The built-in Chanakya persona
    pub fn persona() -> Self {
        Self {
            template: Cow::Borrowed(PERSONA_PROMPT),
        }
    }

    /// Fill the slots in a single pass over the template.
    ///
    /// Slot-like text inside `context` or `question` is copied verbatim.
    pub fn render(&self, context: &str, question: &str) -> String {
        let mut out =
            String::with_capacity(self.template.len() + context.len() + question.len());
        let mut rest: &str = &self.template;

        while let Some(pos) = rest.find('{') {
            out.push_str(&rest[..pos]);
            let tail = &rest[pos..];

            if let Some(after) = tail.strip_prefix(CONTEXT_SLOT) {
                out.push_str(context);
                rest = after;
            } else if let Some(after) = tail.strip_prefix(QUESTION_SLOT) {
                out.push_str(question);
                rest = after;
            } else {
                out.push('{');
                rest = &tail[1..];
            }
        }
        out.push_str(rest);

        out
    }
}

impl Default for PromptTemplate {
    fn default() -> Self {
        Self::persona()
    }
}

/// Join retrieved passages in retriever order
pub fn build_context(results: &[SearchResult]) -> String {
    results
        .iter()
        .map(|r| r.content.as_str())
        .collect::<Vec<_>>()
        .join(CONTEXT_SEPARATOR)
}
