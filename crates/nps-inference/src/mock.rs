//! Mock inference backend for deterministic testing.
//!
//! Replies are chosen by substring match on the prompt, so a test can script
//! the classifier per comment without caring about prompt layout.
//!
//! ## Usage
//!
//! ```rust,ignore
//! use nps_inference::mock::MockGenerationBackend;
//!
//! let backend = MockGenerationBackend::new()
//!     .with_fixed_response(r#"{"themes":["overige"]}"#)
//!     .with_response_mapping("te laat", r#"{"themes":["bezorging"],"sentiment":-0.6}"#)
//!     .with_failure_on("boom");
//! ```

use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use nps_core::{EmbeddingBackend, Error, GenerationBackend, GenerationOptions, Result, Vector};

/// Mock generation and embedding backend for testing.
#[derive(Clone)]
pub struct MockGenerationBackend {
    config: Arc<MockConfig>,
    call_log: Arc<Mutex<Vec<MockCall>>>,
}

#[derive(Debug, Clone)]
struct MockConfig {
    dimension: usize,
    model: String,
    mappings: Vec<(String, String)>,
    default_response: String,
    fail_on: Vec<String>,
    config_error: Option<String>,
    latency_ms: u64,
    failure_rate: f64,
}

#[derive(Debug, Clone)]
pub struct MockCall {
    pub operation: String,
    pub system: String,
    pub input: String,
    pub options: GenerationOptions,
}

impl Default for MockConfig {
    fn default() -> Self {
        Self {
            dimension: 8,
            model: "mock-model".to_string(),
            mappings: Vec::new(),
            default_response: "{}".to_string(),
            fail_on: Vec::new(),
            config_error: None,
            latency_ms: 0,
            failure_rate: 0.0,
        }
    }
}

impl MockGenerationBackend {
    pub fn new() -> Self {
        Self {
            config: Arc::new(MockConfig::default()),
            call_log: Arc::new(Mutex::new(Vec::new())),
        }
    }

    /// Set the embedding dimension.
    pub fn with_dimension(mut self, dimension: usize) -> Self {
        Arc::make_mut(&mut self.config).dimension = dimension;
        self
    }

    /// Reply used when no mapping matches.
    pub fn with_fixed_response(mut self, response: impl Into<String>) -> Self {
        Arc::make_mut(&mut self.config).default_response = response.into();
        self
    }

    /// Reply with `output` whenever the prompt contains `needle`.
    ///
    /// Mappings are checked in insertion order.
    pub fn with_response_mapping(
        mut self,
        needle: impl Into<String>,
        output: impl Into<String>,
    ) -> Self {
        Arc::make_mut(&mut self.config)
            .mappings
            .push((needle.into(), output.into()));
        self
    }

    /// Fail with an inference error whenever the prompt contains `needle`.
    pub fn with_failure_on(mut self, needle: impl Into<String>) -> Self {
        Arc::make_mut(&mut self.config).fail_on.push(needle.into());
        self
    }

    /// Fail every call with a configuration error.
    pub fn with_config_error(mut self, message: impl Into<String>) -> Self {
        Arc::make_mut(&mut self.config).config_error = Some(message.into());
        self
    }

    pub fn with_latency_ms(mut self, latency_ms: u64) -> Self {
        Arc::make_mut(&mut self.config).latency_ms = latency_ms;
        self
    }

    /// Set failure rate (0.0 - 1.0) for testing error handling.
    pub fn with_failure_rate(mut self, rate: f64) -> Self {
        Arc::make_mut(&mut self.config).failure_rate = rate.clamp(0.0, 1.0);
        self
    }

    /// Get all logged calls for assertion.
    pub fn get_calls(&self) -> Vec<MockCall> {
        self.call_log
            .lock()
            .map(|log| log.clone())
            .unwrap_or_default()
    }

    pub fn generate_call_count(&self) -> usize {
        self.count("generate")
    }

    pub fn embed_call_count(&self) -> usize {
        self.count("embed")
    }

    fn count(&self, operation: &str) -> usize {
        self.call_log
            .lock()
            .map(|log| log.iter().filter(|c| c.operation == operation).count())
            .unwrap_or(0)
    }

    fn log_call(&self, operation: &str, system: &str, input: &str, options: GenerationOptions) {
        if let Ok(mut log) = self.call_log.lock() {
            log.push(MockCall {
                operation: operation.to_string(),
                system: system.to_string(),
                input: input.to_string(),
                options,
            });
        }
    }

    fn check_failure(&self, input: &str) -> Result<()> {
        use rand::Rng;

        if let Some(ref message) = self.config.config_error {
            return Err(Error::Config(message.clone()));
        }
        if self.config.fail_on.iter().any(|n| input.contains(n.as_str())) {
            return Err(Error::Inference("Simulated failure for testing".to_string()));
        }
        if self.config.failure_rate > 0.0
            && rand::thread_rng().gen::<f64>() < self.config.failure_rate
        {
            return Err(Error::Inference("Simulated failure for testing".to_string()));
        }
        Ok(())
    }

    async fn simulate_latency(&self) {
        if self.config.latency_ms > 0 {
            tokio::time::sleep(tokio::time::Duration::from_millis(self.config.latency_ms)).await;
        }
    }

    /// Deterministic unit vector derived from the characters of `text`.
    pub fn embedding_for(text: &str, dimension: usize) -> Vec<f32> {
        let mut vec = vec![0.0f32; dimension.max(1)];
        let len = vec.len();
        for (i, c) in text.chars().enumerate() {
            vec[(c as usize + i) % len] += 0.1;
        }
        let magnitude: f32 = vec.iter().map(|x| x * x).sum::<f32>().sqrt();
        if magnitude > 0.0 {
            vec.iter_mut().for_each(|x| *x /= magnitude);
        }
        vec
    }
}

impl Default for MockGenerationBackend {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl GenerationBackend for MockGenerationBackend {
    async fn generate(&self, prompt: &str) -> Result<String> {
        self.generate_with_options("", prompt, &GenerationOptions::default())
            .await
    }

    async fn generate_with_system(&self, system: &str, prompt: &str) -> Result<String> {
        self.generate_with_options(system, prompt, &GenerationOptions::default())
            .await
    }

    async fn generate_with_options(
        &self,
        system: &str,
        prompt: &str,
        options: &GenerationOptions,
    ) -> Result<String> {
        self.log_call("generate", system, prompt, *options);
        self.simulate_latency().await;
        self.check_failure(prompt)?;

        let reply = self
            .config
            .mappings
            .iter()
            .find(|(needle, _)| prompt.contains(needle.as_str()))
            .map(|(_, out)| out.clone())
            .unwrap_or_else(|| self.config.default_response.clone());
        Ok(reply)
    }

    fn model_name(&self) -> &str {
        &self.config.model
    }
}

#[async_trait]
impl EmbeddingBackend for MockGenerationBackend {
    async fn embed_texts(&self, texts: &[String]) -> Result<Vec<Vector>> {
        let mut out = Vec::with_capacity(texts.len());
        for text in texts {
            self.log_call("embed", "", text, GenerationOptions::default());
            self.check_failure(text)?;
            out.push(Vector::from(Self::embedding_for(
                text,
                self.config.dimension,
            )));
        }
        Ok(out)
    }

    fn dimension(&self) -> usize {
        self.config.dimension
    }

    fn model_name(&self) -> &str {
        &self.config.model
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_mapping_by_substring() {
        let backend = MockGenerationBackend::new()
            .with_fixed_response("default")
            .with_response_mapping("te laat", "late")
            .with_response_mapping("prijs", "price");

        assert_eq!(backend.generate("De krant kwam te laat").await.unwrap(), "late");
        assert_eq!(backend.generate("Hoge prijs").await.unwrap(), "price");
        assert_eq!(backend.generate("Prima").await.unwrap(), "default");
        assert_eq!(backend.generate_call_count(), 3);
    }

    #[tokio::test]
    async fn test_failure_injection() {
        let backend = MockGenerationBackend::new().with_failure_on("boom");
        let err = backend.generate("boom!").await.unwrap_err();
        assert!(err.is_classification_failure());
        assert!(backend.generate("fine").await.is_ok());
    }

    #[tokio::test]
    async fn test_config_error_fails_every_call() {
        let backend = MockGenerationBackend::new().with_config_error("OpenAI API key not configured");
        assert!(matches!(
            backend.generate("x").await.unwrap_err(),
            Error::Config(_)
        ));
    }

    #[tokio::test]
    async fn test_options_are_logged() {
        let backend = MockGenerationBackend::new();
        backend
            .generate_with_options("sys", "p", &GenerationOptions::json(0.0))
            .await
            .unwrap();
        let calls = backend.get_calls();
        assert_eq!(calls[0].system, "sys");
        assert!(calls[0].options.json_object);
        assert_eq!(calls[0].options.temperature, Some(0.0));
    }

    #[tokio::test]
    async fn test_embeddings_are_deterministic() {
        let backend = MockGenerationBackend::new().with_dimension(16);
        let a = backend.embed_texts(&["hallo".to_string()]).await.unwrap();
        let b = backend.embed_texts(&["hallo".to_string()]).await.unwrap();
        assert_eq!(a[0].as_slice().len(), 16);
        assert_eq!(a[0].as_slice(), b[0].as_slice());
        assert_eq!(backend.embed_call_count(), 2);
    }
}
