//! Theme Assigner run: classify, embed and store unenriched responses.

use std::sync::Arc;
use std::time::Instant;

use tracing::{error, info, trace, warn};

use nps_core::defaults::EMPTY_COMMENT_STOPLIST;
use nps_core::{
    EmbeddingBackend, EnrichRunSummary, EnrichmentRepository, Error, GenerationBackend,
    NewEnrichment, NpsResponse, ResponseRepository, Result, Vector,
};
use nps_inference::{ParsePath, ResponseClassifier, ThemeDiscovery};

use crate::handler::{JobContext, RunConfig};

/// What happened to one response in a run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum EnrichOutcome {
    Stored,
    /// Model output was unusable; the fallback theme was stored so the
    /// response is not picked up again.
    Defaulted,
    /// Another run stored this response first.
    AlreadyEnriched,
}

/// Whether an explanation is empty or a "no comment" placeholder.
pub fn is_empty_comment(comment: Option<&str>) -> bool {
    match comment {
        None => true,
        Some(text) => {
            let normalized = text.trim().to_lowercase();
            EMPTY_COMMENT_STOPLIST.contains(&normalized.as_str())
        }
    }
}

/// One Theme Assigner run over the unenriched backlog.
pub struct EnrichmentJob {
    responses: Arc<dyn ResponseRepository>,
    enrichments: Arc<dyn EnrichmentRepository>,
    generator: Arc<dyn GenerationBackend>,
    embedder: Option<Arc<dyn EmbeddingBackend>>,
    config: RunConfig,
}

impl EnrichmentJob {
    pub fn new(
        responses: Arc<dyn ResponseRepository>,
        enrichments: Arc<dyn EnrichmentRepository>,
        generator: Arc<dyn GenerationBackend>,
    ) -> Self {
        Self {
            responses,
            enrichments,
            generator,
            embedder: None,
            config: RunConfig::default(),
        }
    }

    /// Store embeddings of the comment text alongside each enrichment.
    pub fn with_embedder(mut self, embedder: Arc<dyn EmbeddingBackend>) -> Self {
        self.embedder = Some(embedder);
        self
    }

    pub fn with_config(mut self, config: RunConfig) -> Self {
        self.config = config;
        self
    }

    /// Process up to `batch_size` unenriched responses.
    ///
    /// Per-response failures are counted and skipped; so are responses whose
    /// model output could not be parsed at all. A configuration error
    /// (missing or rejected credentials) aborts the run.
    pub async fn run(&self, ctx: &JobContext) -> Result<EnrichRunSummary> {
        let start = Instant::now();
        let batch = self.responses.unenriched(self.config.batch_size).await?;
        let (commented, skipped): (Vec<NpsResponse>, Vec<NpsResponse>) = batch
            .into_iter()
            .partition(|r| !is_empty_comment(r.nps_explanation.as_deref()));

        let mut summary = EnrichRunSummary {
            skipped_no_comment: skipped.len(),
            ..Default::default()
        };
        if commented.is_empty() {
            info!(
                subsystem = "jobs",
                component = "theme_assigner",
                job_id = %ctx.job_id,
                skipped = summary.skipped_no_comment,
                "Nothing to enrich"
            );
            return Ok(summary);
        }

        summary.discovered_themes = self.discover(&commented).await?;
        let classifier =
            ResponseClassifier::new(self.generator.clone()).with_discovered(&summary.discovered_themes);

        let total = commented.len();
        for (i, response) in commented.iter().enumerate() {
            if i > 0 {
                self.config.pause().await;
            }
            match self.enrich_one(&classifier, response).await {
                Ok(EnrichOutcome::Stored) => summary.processed += 1,
                Ok(EnrichOutcome::Defaulted) => {
                    summary.failed += 1;
                    warn!(
                        subsystem = "jobs",
                        component = "theme_assigner",
                        response_id = %response.id,
                        "Classifier output unusable, fallback theme stored"
                    );
                }
                Ok(EnrichOutcome::AlreadyEnriched) => {}
                Err(e @ Error::Config(_)) => {
                    error!(
                        subsystem = "jobs",
                        component = "theme_assigner",
                        job_id = %ctx.job_id,
                        error = %e,
                        "Classifier not usable, aborting run"
                    );
                    return Err(e);
                }
                Err(e) => {
                    summary.failed += 1;
                    warn!(
                        subsystem = "jobs",
                        component = "theme_assigner",
                        response_id = %response.id,
                        error = %e,
                        "Response enrichment failed"
                    );
                }
            }
            ctx.report_progress(i + 1, total);
        }

        info!(
            subsystem = "jobs",
            component = "theme_assigner",
            op = "enrich",
            job_id = %ctx.job_id,
            processed = summary.processed,
            skipped = summary.skipped_no_comment,
            failed = summary.failed,
            discovered = summary.discovered_themes.len(),
            duration_ms = start.elapsed().as_millis() as u64,
            "Enrichment run complete"
        );
        Ok(summary)
    }

    /// One discovery call per run. Only configuration errors propagate; any
    /// other failure leaves the base taxonomy in place.
    async fn discover(&self, commented: &[NpsResponse]) -> Result<Vec<nps_core::DiscoveredTheme>> {
        let comments: Vec<String> = commented
            .iter()
            .filter_map(|r| r.nps_explanation.clone())
            .collect();
        match ThemeDiscovery::new(self.generator.clone()).discover(&comments).await {
            Ok(themes) => Ok(themes),
            Err(e @ Error::Config(_)) => Err(e),
            Err(e) => {
                warn!(
                    subsystem = "jobs",
                    component = "theme_assigner",
                    error = %e,
                    "Theme discovery failed, using base taxonomy"
                );
                Ok(Vec::new())
            }
        }
    }

    async fn enrich_one(
        &self,
        classifier: &ResponseClassifier,
        response: &NpsResponse,
    ) -> Result<EnrichOutcome> {
        let (classification, path) = classifier.classify(response).await?;
        let embedding = self.embed(response).await?;
        let inserted = self
            .enrichments
            .insert(NewEnrichment {
                response_id: response.id,
                category: response.category(),
                classification,
                model: classifier.model_name().to_string(),
                embedding,
            })
            .await?;
        trace!(
            subsystem = "jobs",
            component = "theme_assigner",
            response_id = %response.id,
            inserted = inserted.is_some(),
            "Response enriched"
        );
        Ok(match (inserted, path) {
            (None, _) => EnrichOutcome::AlreadyEnriched,
            (Some(_), ParsePath::Fallback) => EnrichOutcome::Defaulted,
            (Some(_), _) => EnrichOutcome::Stored,
        })
    }

    /// Embedding failures other than configuration errors leave the vector empty.
    async fn embed(&self, response: &NpsResponse) -> Result<Option<Vector>> {
        let (Some(embedder), Some(comment)) = (&self.embedder, &response.nps_explanation) else {
            return Ok(None);
        };
        match embedder.embed_texts(std::slice::from_ref(comment)).await {
            Ok(mut vectors) => Ok(vectors.pop()),
            Err(e @ Error::Config(_)) => Err(e),
            Err(e) => {
                warn!(
                    subsystem = "jobs",
                    component = "theme_assigner",
                    response_id = %response.id,
                    error = %e,
                    "Embedding failed, storing enrichment without vector"
                );
                Ok(None)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_stoplist_placeholders_are_empty() {
        for text in ["", "  ", "n.v.t.", "N.V.T.", " nvt ", "n/a", "NA", "-", "n.v.t"] {
            assert!(is_empty_comment(Some(text)), "{:?}", text);
        }
        assert!(is_empty_comment(None));
    }

    #[test]
    fn test_real_comments_are_not_empty() {
        assert!(!is_empty_comment(Some("Te duur")));
        assert!(!is_empty_comment(Some("nvt, maar de app is traag")));
    }
}
