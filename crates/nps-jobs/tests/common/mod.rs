//! In-memory repositories for driving jobs without PostgreSQL.

#![allow(dead_code)]

use std::collections::HashMap;
use std::sync::Mutex;

use async_trait::async_trait;
use chrono::{DateTime, TimeZone, Utc};
use uuid::Uuid;

use nps_core::{
    Enrichment, EnrichmentRepository, EnrichmentStats, Error, FilterContext, FilterOptions,
    GroupNps, Insight, MonthlyNps, NewEnrichment, NewNpsResponse, NewSurveyAnalysis, NpsBucket,
    NpsCategory, NpsKpis, NpsResponse, ResponseAnalysis, ResponseRepository, Result,
    SimilarResponse, StoredInsight, SurveyAnalysis, SurveyAnalysisRepository, SurveyResponseRow,
    SurveyStatus, SurveyTheme, ThemeAssignment, TitleMonthNps, Vector,
};

// =============================================================================
// RESPONSES + ENRICHMENTS
// =============================================================================

/// Responses and their enrichments behind one lock, so `unenriched` sees inserts.
#[derive(Default)]
pub struct MemoryStore {
    responses: Mutex<Vec<NpsResponse>>,
    enrichments: Mutex<HashMap<Uuid, NewEnrichment>>,
}

impl MemoryStore {
    pub fn with_comments(comments: &[(i16, Option<&str>)]) -> Self {
        let store = Self::default();
        {
            let mut responses = store.responses.lock().unwrap();
            for (i, (score, comment)) in comments.iter().enumerate() {
                responses.push(NpsResponse {
                    id: Uuid::new_v4(),
                    nps_score: *score,
                    nps_explanation: comment.map(str::to_string),
                    title_text: Some("Dagblad".to_string()),
                    survey_name: "Jaarlijks".to_string(),
                    creation_date: Utc.with_ymd_and_hms(2024, 3, 1, 9, i as u32 % 60, 0).unwrap(),
                });
            }
        }
        store
    }

    pub fn response_ids(&self) -> Vec<Uuid> {
        self.responses.lock().unwrap().iter().map(|r| r.id).collect()
    }

    pub fn enrichment_for(&self, response_id: Uuid) -> Option<NewEnrichment> {
        self.enrichments.lock().unwrap().get(&response_id).cloned()
    }

    pub fn enrichment_count(&self) -> usize {
        self.enrichments.lock().unwrap().len()
    }
}

#[async_trait]
impl ResponseRepository for MemoryStore {
    async fn insert(&self, req: NewNpsResponse) -> Result<Uuid> {
        let id = Uuid::new_v4();
        self.responses.lock().unwrap().push(NpsResponse {
            id,
            nps_score: req.nps_score,
            nps_explanation: req.nps_explanation,
            title_text: req.title_text,
            survey_name: req.survey_name,
            creation_date: req.creation_date,
        });
        Ok(id)
    }

    async fn list(&self, filter: &FilterContext, limit: i64, offset: i64) -> Result<Vec<NpsResponse>> {
        Ok(self
            .responses
            .lock()
            .unwrap()
            .iter()
            .filter(|r| filter.matches(r.creation_date, &r.survey_name, r.title_text.as_deref()))
            .skip(offset.max(0) as usize)
            .take(limit.max(0) as usize)
            .cloned()
            .collect())
    }

    async fn kpis(&self, _filter: &FilterContext) -> Result<NpsKpis> {
        Ok(NpsKpis::default())
    }

    async fn monthly_trend(&self, _filter: &FilterContext) -> Result<Vec<MonthlyNps>> {
        Ok(Vec::new())
    }

    async fn nps_by_survey(&self, _filter: &FilterContext) -> Result<Vec<GroupNps>> {
        Ok(Vec::new())
    }

    async fn nps_by_title(&self, _filter: &FilterContext, _min: i64) -> Result<Vec<GroupNps>> {
        Ok(Vec::new())
    }

    async fn title_month_nps(&self, _filter: &FilterContext) -> Result<Vec<TitleMonthNps>> {
        Ok(Vec::new())
    }

    async fn recent(&self, limit: i64) -> Result<Vec<NpsResponse>> {
        let mut rows = self.responses.lock().unwrap().clone();
        rows.sort_by(|a, b| b.creation_date.cmp(&a.creation_date));
        rows.truncate(limit.max(0) as usize);
        Ok(rows)
    }

    async fn filter_options(&self) -> Result<FilterOptions> {
        Ok(FilterOptions::default())
    }

    async fn responses_since(&self, since: DateTime<Utc>) -> Result<Vec<NpsResponse>> {
        let mut rows: Vec<NpsResponse> = self
            .responses
            .lock()
            .unwrap()
            .iter()
            .filter(|r| r.creation_date >= since)
            .cloned()
            .collect();
        rows.sort_by(|a, b| a.creation_date.cmp(&b.creation_date));
        Ok(rows)
    }

    async fn unenriched(&self, limit: i64) -> Result<Vec<NpsResponse>> {
        let enriched = self.enrichments.lock().unwrap();
        Ok(self
            .responses
            .lock()
            .unwrap()
            .iter()
            .filter(|r| r.nps_explanation.is_some() && !enriched.contains_key(&r.id))
            .take(limit.max(0) as usize)
            .cloned()
            .collect())
    }

    async fn sample_comments(&self, limit: i64, min_chars: i32) -> Result<Vec<String>> {
        Ok(self
            .responses
            .lock()
            .unwrap()
            .iter()
            .filter_map(|r| r.nps_explanation.clone())
            .filter(|c| c.chars().count() > min_chars.max(0) as usize)
            .take(limit.max(0) as usize)
            .collect())
    }
}

#[async_trait]
impl EnrichmentRepository for MemoryStore {
    async fn insert(&self, req: NewEnrichment) -> Result<Option<Uuid>> {
        let mut enrichments = self.enrichments.lock().unwrap();
        if enrichments.contains_key(&req.response_id) {
            return Ok(None);
        }
        enrichments.insert(req.response_id, req);
        Ok(Some(Uuid::new_v4()))
    }

    async fn get_for_response(&self, response_id: Uuid) -> Result<Option<Enrichment>> {
        Ok(self.enrichment_for(response_id).map(|req| Enrichment {
            id: Uuid::new_v4(),
            response_id,
            sentiment_label: req.sentiment_label(),
            themes: req.classification.themes,
            theme_scores: req.classification.theme_scores,
            sentiment_score: req.classification.sentiment,
            promoter_flag: req.category == NpsCategory::Promoter,
            passive_flag: req.category == NpsCategory::Passive,
            detractor_flag: req.category == NpsCategory::Detractor,
            keywords: req.classification.keywords,
            language: req.classification.language,
            model: req.model,
            created_at: Utc::now(),
        }))
    }

    async fn theme_assignments(
        &self,
        _filter: &FilterContext,
        _bucket: Option<NpsBucket>,
    ) -> Result<Vec<ThemeAssignment>> {
        Ok(Vec::new())
    }

    async fn stats(&self) -> Result<EnrichmentStats> {
        Ok(EnrichmentStats::default())
    }

    async fn similar(&self, _query: &Vector, _limit: i64) -> Result<Vec<SimilarResponse>> {
        Ok(Vec::new())
    }
}

// =============================================================================
// AD-HOC SURVEYS
// =============================================================================

#[derive(Default)]
struct SurveyState {
    surveys: HashMap<Uuid, SurveyAnalysis>,
    rows: HashMap<Uuid, Vec<SurveyResponseRow>>,
    analyses: HashMap<Uuid, ResponseAnalysis>,
    themes: HashMap<Uuid, Vec<SurveyTheme>>,
    insights: HashMap<Uuid, Vec<Insight>>,
    progress_log: Vec<i32>,
}

#[derive(Default)]
pub struct MemorySurveys {
    state: Mutex<SurveyState>,
    fail_results: bool,
}

impl MemorySurveys {
    /// Store whose `replace_results` always fails.
    pub fn failing_results() -> Self {
        Self {
            fail_results: true,
            ..Self::default()
        }
    }

    pub fn survey(&self, id: Uuid) -> Option<SurveyAnalysis> {
        self.state.lock().unwrap().surveys.get(&id).cloned()
    }

    pub fn progress_log(&self) -> Vec<i32> {
        self.state.lock().unwrap().progress_log.clone()
    }

    pub fn analysis_count(&self) -> usize {
        self.state.lock().unwrap().analyses.len()
    }

    pub fn stored_insights(&self, id: Uuid) -> Vec<Insight> {
        self.state
            .lock()
            .unwrap()
            .insights
            .get(&id)
            .cloned()
            .unwrap_or_default()
    }
}

#[async_trait]
impl SurveyAnalysisRepository for MemorySurveys {
    async fn create(&self, req: NewSurveyAnalysis) -> Result<SurveyAnalysis> {
        let id = Uuid::now_v7();
        let survey = SurveyAnalysis {
            id,
            name: req.name,
            original_filename: req.original_filename,
            total_responses: req.responses.len() as i32,
            processed_responses: 0,
            response_column: req.response_column,
            headers: req.headers,
            status: SurveyStatus::Processing,
            upload_date: Utc::now(),
        };
        let rows = req
            .responses
            .into_iter()
            .map(|r| SurveyResponseRow {
                id: Uuid::new_v4(),
                survey_id: id,
                response_text: r.response_text,
                question_text: r.question_text,
                row_number: r.row_number,
                participant_id: r.participant_id,
                metadata: r.metadata,
                ai_analysis: None,
            })
            .collect();
        let mut state = self.state.lock().unwrap();
        state.surveys.insert(id, survey.clone());
        state.rows.insert(id, rows);
        Ok(survey)
    }

    async fn get(&self, id: Uuid) -> Result<Option<SurveyAnalysis>> {
        Ok(self.survey(id))
    }

    async fn responses(&self, id: Uuid) -> Result<Vec<SurveyResponseRow>> {
        Ok(self
            .state
            .lock()
            .unwrap()
            .rows
            .get(&id)
            .cloned()
            .unwrap_or_default())
    }

    async fn sample_responses(&self, id: Uuid, limit: i64) -> Result<Vec<SurveyResponseRow>> {
        let mut rows = self.responses(id).await?;
        rows.truncate(limit.max(0) as usize);
        Ok(rows)
    }

    async fn record_analysis(&self, response_id: Uuid, analysis: &ResponseAnalysis) -> Result<()> {
        self.state
            .lock()
            .unwrap()
            .analyses
            .insert(response_id, analysis.clone());
        Ok(())
    }

    async fn record_progress(&self, id: Uuid, processed: i32) -> Result<()> {
        let mut state = self.state.lock().unwrap();
        if let Some(survey) = state.surveys.get_mut(&id) {
            survey.processed_responses = processed;
        }
        state.progress_log.push(processed);
        Ok(())
    }

    async fn replace_results(
        &self,
        id: Uuid,
        themes: &[SurveyTheme],
        insights: &[Insight],
    ) -> Result<()> {
        if self.fail_results {
            return Err(Error::Internal("results table unavailable".to_string()));
        }
        let mut state = self.state.lock().unwrap();
        state.themes.insert(id, themes.to_vec());
        state.insights.insert(id, insights.to_vec());
        Ok(())
    }

    async fn complete(&self, id: Uuid, total_responses: i32) -> Result<()> {
        let mut state = self.state.lock().unwrap();
        if let Some(survey) = state.surveys.get_mut(&id) {
            survey.status = SurveyStatus::Completed;
            survey.total_responses = total_responses;
        }
        Ok(())
    }

    async fn themes(&self, id: Uuid) -> Result<Vec<SurveyTheme>> {
        Ok(self
            .state
            .lock()
            .unwrap()
            .themes
            .get(&id)
            .cloned()
            .unwrap_or_default())
    }

    async fn insights(&self, id: Uuid) -> Result<Vec<StoredInsight>> {
        Ok(self
            .stored_insights(id)
            .into_iter()
            .map(|i| StoredInsight {
                id: Uuid::new_v4(),
                priority: i.priority(),
                insight_type: i.insight_type,
                title: i.title,
                description: i.content,
                related_themes: i.themes,
                impact_score: i.impact,
            })
            .collect())
    }
}
