//! Shared job plumbing: context, progress reporting, run settings.

use std::time::Duration;

use uuid::Uuid;

use nps_core::defaults::{ENRICH_BATCH_SIZE, LLM_CALL_DELAY_MS};

/// Progress callback: `(processed, total)`.
pub type ProgressCallback = Box<dyn Fn(usize, usize) + Send + Sync>;

/// Kind of batch run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JobKind {
    Enrichment,
    SurveyProcessing,
}

impl JobKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Enrichment => "enrichment",
            Self::SurveyProcessing => "survey_processing",
        }
    }
}

/// Context provided to a running job.
pub struct JobContext {
    pub job_id: Uuid,
    pub kind: JobKind,
    progress_callback: Option<ProgressCallback>,
}

impl JobContext {
    pub fn new(kind: JobKind) -> Self {
        Self {
            job_id: Uuid::now_v7(),
            kind,
            progress_callback: None,
        }
    }

    pub fn with_progress_callback<F>(mut self, callback: F) -> Self
    where
        F: Fn(usize, usize) + Send + Sync + 'static,
    {
        self.progress_callback = Some(Box::new(callback));
        self
    }

    pub fn report_progress(&self, processed: usize, total: usize) {
        if let Some(ref callback) = self.progress_callback {
            callback(processed, total);
        }
    }
}

/// Pacing and sizing of batch runs.
#[derive(Debug, Clone, PartialEq)]
pub struct RunConfig {
    /// Responses taken per enrichment trigger.
    pub batch_size: i64,
    /// Pause between consecutive LLM calls.
    pub call_delay: Duration,
}

impl Default for RunConfig {
    fn default() -> Self {
        Self {
            batch_size: ENRICH_BATCH_SIZE,
            call_delay: Duration::from_millis(LLM_CALL_DELAY_MS),
        }
    }
}

impl RunConfig {
    /// Read `ENRICH_BATCH_SIZE` and `LLM_CALL_DELAY_MS`, falling back to defaults.
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            batch_size: std::env::var("ENRICH_BATCH_SIZE")
                .ok()
                .and_then(|v| v.parse().ok())
                .filter(|n: &i64| *n > 0)
                .unwrap_or(defaults.batch_size),
            call_delay: std::env::var("LLM_CALL_DELAY_MS")
                .ok()
                .and_then(|v| v.parse().ok())
                .map(Duration::from_millis)
                .unwrap_or(defaults.call_delay),
        }
    }

    pub fn with_batch_size(mut self, batch_size: i64) -> Self {
        self.batch_size = batch_size;
        self
    }

    pub fn with_call_delay(mut self, delay: Duration) -> Self {
        self.call_delay = delay;
        self
    }

    /// Sleep between calls; no-op for a zero delay.
    pub(crate) async fn pause(&self) {
        if !self.call_delay.is_zero() {
            tokio::time::sleep(self.call_delay).await;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    #[test]
    fn test_progress_callback() {
        let seen = Arc::new(AtomicUsize::new(0));
        let seen_clone = seen.clone();
        let ctx = JobContext::new(JobKind::Enrichment)
            .with_progress_callback(move |done, _| seen_clone.store(done, Ordering::SeqCst));
        ctx.report_progress(7, 10);
        assert_eq!(seen.load(Ordering::SeqCst), 7);
    }

    #[test]
    fn test_context_without_callback() {
        let ctx = JobContext::new(JobKind::SurveyProcessing);
        ctx.report_progress(1, 1);
        assert_eq!(ctx.kind.as_str(), "survey_processing");
    }

    #[test]
    fn test_run_config_defaults() {
        let config = RunConfig::default();
        assert_eq!(config.batch_size, 100);
        assert_eq!(config.call_delay, Duration::from_millis(100));
        let fast = config.with_call_delay(Duration::ZERO).with_batch_size(5);
        assert_eq!(fast.batch_size, 5);
        assert!(fast.call_delay.is_zero());
    }
}
