//! Chanakya RAG - Retrieval-Augmented Generation
//!
//! Retrieves the passages closest to a question, places them into the
//! persona prompt and asks the configured LLM for an answer.
//!
//! Author: hephaex@gmail.com

use chanakya_core::{LlmClient, RagConfig, Result, SearchBackend, SearchResult};
use serde::Serialize;
use std::sync::Arc;
use std::time::Instant;

pub mod llm;
pub mod prompt;

pub use llm::{create_llm_client, GeminiClient, OllamaClient, OpenAiClient};
pub use prompt::{build_context, PromptTemplate, PERSONA_PROMPT};

/// Answer plus the passages it was grounded on
#[derive(Debug, Clone, Serialize)]
pub struct RagAnswer {
    /// Generated text, unmodified
    pub response: String,

    /// Retrieved passages, best first
    pub sources: Vec<SearchResult>,

    /// Processing time in milliseconds
    pub processing_time_ms: u64,
}

/// Retrieve-then-generate pipeline
pub struct ChanakyaRag {
    retriever: Arc<dyn SearchBackend>,
    llm_client: Arc<dyn LlmClient>,
    template: PromptTemplate,
    top_k: usize,
}

impl ChanakyaRag {
    /// Create a pipeline using the persona template
    pub fn new(
        retriever: Arc<dyn SearchBackend>,
        llm_client: Arc<dyn LlmClient>,
        config: &RagConfig,
    ) -> Self {
        Self {
            retriever,
            llm_client,
            template: PromptTemplate::persona(),
            top_k: config.top_k,
        }
    }

    /// Number of passages retrieved per question
    pub fn top_k(&self) -> usize {
        self.top_k
    }

    /// Fetch at most `top_k` passages for `message`
    pub async fn retrieve(&self, message: &str) -> Result<Vec<SearchResult>> {
        let mut results = self.retriever.search(message, self.top_k).await?;
        results.truncate(self.top_k);
        tracing::debug!(
            backend = self.retriever.name(),
            count = results.len(),
            "Retrieved passages"
        );
        Ok(results)
    }

    /// Assemble the prompt for `message` from retrieved passages
    pub fn build_prompt(&self, message: &str, results: &[SearchResult]) -> String {
        self.template.render(&build_context(results), message)
    }

    /// Answer a message and report the passages used
    pub async fn ask(&self, message: &str) -> Result<RagAnswer> {
        let start = Instant::now();

        let sources = self.retrieve(message).await?;
        let prompt = self.build_prompt(message, &sources);

        tracing::info!(
            model = self.llm_client.model(),
            passages = sources.len(),
            prompt_chars = prompt.len(),
            "Calling LLM"
        );
        let response = self.llm_client.generate(&prompt).await?;
        tracing::info!(response_chars = response.len(), "LLM response received");

        Ok(RagAnswer {
            response,
            sources,
            processing_time_ms: start.elapsed().as_millis() as u64,
        })
    }

    /// Answer a message, returning only the generated text
    pub async fn answer(&self, message: &str) -> Result<String> {
        Ok(self.ask(message).await?.response)
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use chanakya_core::{ChanakyaError, SourceReference};
    use std::sync::Mutex;

    /// Backend that returns `n` fixed passages regardless of the limit
    struct FixedBackend(usize);

    #[async_trait]
    impl SearchBackend for FixedBackend {
        async fn search(&self, _query: &str, _limit: usize) -> Result<Vec<SearchResult>> {
            Ok((0..self.0)
                .map(|i| SearchResult {
                    content: format!("passage {i}"),
                    score: 1.0 - i as f32 * 0.1,
                    source: SourceReference::new("test.txt", i as u32),
                })
                .collect())
        }

        fn name(&self) -> &str {
            "fixed"
        }
    }

    struct FailingBackend;

    #[async_trait]
    impl SearchBackend for FailingBackend {
        async fn search(&self, _query: &str, _limit: usize) -> Result<Vec<SearchResult>> {
            Err(ChanakyaError::SearchError("index unavailable".to_string()))
        }

        fn name(&self) -> &str {
            "failing"
        }
    }

    /// LLM that records the prompt and echoes a canned answer
    #[derive(Default)]
    struct RecordingLlm {
        prompts: Mutex<Vec<String>>,
    }

    #[async_trait]
    impl LlmClient for RecordingLlm {
        async fn generate(&self, prompt: &str) -> Result<String> {
            self.prompts.lock().unwrap().push(prompt.to_string());
            Ok("  I am Chanakya.  ".to_string())
        }

        fn model(&self) -> &str {
            "recording"
        }
    }

    struct FailingLlm;

    #[async_trait]
    impl LlmClient for FailingLlm {
        async fn generate(&self, _prompt: &str) -> Result<String> {
            Err(ChanakyaError::LlmError("quota exceeded".to_string()))
        }

        fn model(&self) -> &str {
            "failing"
        }
    }

    #[tokio::test]
    async fn test_retrieval_capped_at_top_k() {
        let rag = ChanakyaRag::new(
            Arc::new(FixedBackend(12)),
            Arc::new(RecordingLlm::default()),
            &RagConfig::default(),
        );

        let results = rag.retrieve("anything").await.unwrap();
        assert_eq!(results.len(), 5);
        assert_eq!(results[0].content, "passage 0");
    }

    #[tokio::test]
    async fn test_prompt_contains_context_and_question() {
        let llm = Arc::new(RecordingLlm::default());
        let rag = ChanakyaRag::new(Arc::new(FixedBackend(2)), llm.clone(), &RagConfig::default());

        let answer = rag.ask("How should a king rule?").await.unwrap();

        // Response is returned untouched
        assert_eq!(answer.response, "  I am Chanakya.  ");
        assert_eq!(answer.sources.len(), 2);

        let prompts = llm.prompts.lock().unwrap();
        assert_eq!(prompts.len(), 1);
        assert!(prompts[0].contains("<context>\npassage 0\n\npassage 1\n</context>"));
        assert!(prompts[0].contains("Question: How should a king rule?"));
    }

    #[tokio::test]
    async fn test_empty_index_still_generates() {
        let llm = Arc::new(RecordingLlm::default());
        let rag = ChanakyaRag::new(Arc::new(FixedBackend(0)), llm.clone(), &RagConfig::default());

        let response = rag.answer("hello").await.unwrap();
        assert!(!response.is_empty());
        assert!(llm.prompts.lock().unwrap()[0].contains("<context>\n\n</context>"));
    }

    #[tokio::test]
    async fn test_retrieval_failure_propagates() {
        let llm = Arc::new(RecordingLlm::default());
        let rag = ChanakyaRag::new(Arc::new(FailingBackend), llm.clone(), &RagConfig::default());

        let err = rag.answer("hello").await.unwrap_err();
        assert!(matches!(err, ChanakyaError::SearchError(_)));
        assert!(llm.prompts.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_generation_failure_propagates() {
        let rag = ChanakyaRag::new(
            Arc::new(FixedBackend(1)),
            Arc::new(FailingLlm),
            &RagConfig::default(),
        );

        let err = rag.answer("hello").await.unwrap_err();
        assert!(matches!(err, ChanakyaError::LlmError(_)));
    }
}
