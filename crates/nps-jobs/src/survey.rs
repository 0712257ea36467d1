//! Ad-hoc survey processing job.
//!
//! The survey record is the job: status `processing` until every uploaded
//! response has been analysed, with `processed_responses` persisted after
//! each one so the status endpoint can show progress.

use std::sync::Arc;
use std::time::Instant;

use serde::Serialize;
use tokio::task::JoinHandle;
use tracing::{error, info, warn};
use uuid::Uuid;

use nps_core::{
    AnalyzedResponse, Error, GenerationBackend, ResponseAnalysis, Result, SurveyAnalysisRepository,
};
use nps_inference::SurveyAnalyzer;
use nps_themes::InsightRenderer;

use crate::handler::{JobContext, JobKind, RunConfig};

/// Outcome of one processing run.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct SurveyRunSummary {
    pub processed: usize,
    /// Responses that fell back to the neutral default.
    pub defaulted: usize,
    pub themes: usize,
    pub insights: usize,
}

#[derive(Clone)]
pub struct SurveyProcessor {
    surveys: Arc<dyn SurveyAnalysisRepository>,
    analyzer: SurveyAnalyzer,
    renderer: InsightRenderer,
    config: RunConfig,
}

impl SurveyProcessor {
    pub fn new(surveys: Arc<dyn SurveyAnalysisRepository>, generator: Arc<dyn GenerationBackend>) -> Self {
        Self {
            surveys,
            analyzer: SurveyAnalyzer::new(generator),
            renderer: InsightRenderer::default(),
            config: RunConfig::default(),
        }
    }

    pub fn with_renderer(mut self, renderer: InsightRenderer) -> Self {
        self.renderer = renderer;
        self
    }

    pub fn with_config(mut self, config: RunConfig) -> Self {
        self.config = config;
        self
    }

    /// Run [`process`](Self::process) on the runtime and return immediately.
    pub fn spawn(&self, survey_id: Uuid) -> JoinHandle<()> {
        let processor = self.clone();
        tokio::spawn(async move {
            let ctx = JobContext::new(JobKind::SurveyProcessing);
            if let Err(e) = processor.process(survey_id, &ctx).await {
                error!(
                    subsystem = "jobs",
                    component = "survey_processor",
                    survey_id = %survey_id,
                    job_id = %ctx.job_id,
                    error = %e,
                    "Survey processing stopped"
                );
            }
        })
    }

    /// Analyse every response, then replace the survey's themes and insights
    /// and mark it completed.
    ///
    /// A failed analysis becomes a neutral, theme-less verdict. Only a
    /// configuration error or a storage failure of the final results stops
    /// the run.
    pub async fn process(&self, survey_id: Uuid, ctx: &JobContext) -> Result<SurveyRunSummary> {
        let start = Instant::now();
        self.surveys
            .get(survey_id)
            .await?
            .ok_or_else(|| Error::NotFound(format!("Survey {} not found", survey_id)))?;
        let rows = self.surveys.responses(survey_id).await?;
        let total = rows.len();

        let mut summary = SurveyRunSummary::default();
        let mut analyzed: Vec<AnalyzedResponse> = Vec::with_capacity(total);
        for (i, row) in rows.into_iter().enumerate() {
            if i > 0 {
                self.config.pause().await;
            }
            let analysis = match self.analyzer.analyze_response(&row.response_text).await {
                Ok(analysis) => analysis,
                Err(e @ Error::Config(_)) => return Err(e),
                Err(e) => {
                    summary.defaulted += 1;
                    warn!(
                        subsystem = "jobs",
                        component = "survey_processor",
                        survey_id = %survey_id,
                        response_id = %row.id,
                        error = %e,
                        "Response analysis failed, using neutral default"
                    );
                    ResponseAnalysis::neutral()
                }
            };

            if let Err(e) = self.surveys.record_analysis(row.id, &analysis).await {
                warn!(
                    subsystem = "jobs",
                    component = "survey_processor",
                    response_id = %row.id,
                    error = %e,
                    "Could not store response analysis"
                );
            }
            analyzed.push(AnalyzedResponse {
                response_id: row.id,
                text: row.response_text,
                analysis,
            });
            summary.processed += 1;

            if let Err(e) = self.surveys.record_progress(survey_id, (i + 1) as i32).await {
                warn!(
                    subsystem = "jobs",
                    component = "survey_processor",
                    survey_id = %survey_id,
                    error = %e,
                    "Could not persist progress"
                );
            }
            ctx.report_progress(i + 1, total);
        }

        let rendered = self.renderer.render(&analyzed);
        self.surveys
            .replace_results(survey_id, &rendered.themes, &rendered.insights)
            .await?;
        self.surveys.complete(survey_id, total as i32).await?;

        summary.themes = rendered.themes.len();
        summary.insights = rendered.insights.len();
        info!(
            subsystem = "jobs",
            component = "survey_processor",
            op = "process",
            survey_id = %survey_id,
            job_id = %ctx.job_id,
            processed = summary.processed,
            failed = summary.defaulted,
            result_count = summary.insights,
            duration_ms = start.elapsed().as_millis() as u64,
            "Survey processing complete"
        );
        Ok(summary)
    }
}
