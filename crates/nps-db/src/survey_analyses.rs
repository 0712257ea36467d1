//! Ad-hoc survey analysis store.
//!
//! A job is one `survey_analyses` row plus its uploaded `survey_responses`.
//! Each processing run replaces `survey_themes` and `survey_insights` wholesale.

use async_trait::async_trait;
use serde_json::json;
use sqlx::postgres::PgRow;
use sqlx::{Pool, Postgres, Row};
use tracing::{debug, info};
use uuid::Uuid;

use nps_core::{
    Error, Insight, NewSurveyAnalysis, ResponseAnalysis, Result, StoredInsight, SurveyAnalysis,
    SurveyAnalysisRepository, SurveyResponseRow, SurveyStatus, SurveyTheme,
};

/// PostgreSQL implementation of SurveyAnalysisRepository.
#[derive(Clone)]
pub struct PgSurveyAnalysisRepository {
    pool: Pool<Postgres>,
}

const SURVEY_COLUMNS: &str = "id, name, original_filename, total_responses, processed_responses, \
     response_column, headers, status, upload_date";

const RESPONSE_COLUMNS: &str = "id, survey_id, response_text, question_text, row_number, \
     participant_id, metadata, ai_analysis";

impl PgSurveyAnalysisRepository {
    pub fn new(pool: Pool<Postgres>) -> Self {
        Self { pool }
    }

    fn row_to_survey(row: &PgRow) -> Result<SurveyAnalysis> {
        let status: String = row.get("status");
        Ok(SurveyAnalysis {
            id: row.get("id"),
            name: row.get("name"),
            original_filename: row.get("original_filename"),
            total_responses: row.get("total_responses"),
            processed_responses: row.get("processed_responses"),
            response_column: row.get("response_column"),
            headers: row.get("headers"),
            status: status.parse::<SurveyStatus>()?,
            upload_date: row.get("upload_date"),
        })
    }

    fn row_to_response(row: &PgRow) -> SurveyResponseRow {
        SurveyResponseRow {
            id: row.get("id"),
            survey_id: row.get("survey_id"),
            response_text: row.get("response_text"),
            question_text: row.get("question_text"),
            row_number: row.get("row_number"),
            participant_id: row.get("participant_id"),
            metadata: row.get("metadata"),
            ai_analysis: row.get("ai_analysis"),
        }
    }

    fn row_to_insight(row: &PgRow) -> Result<StoredInsight> {
        let insight_type: String = row.get("insight_type");
        let supporting: serde_json::Value = row.get("supporting_data");
        let related_themes = supporting
            .get("related_themes")
            .and_then(|v| serde_json::from_value::<Vec<String>>(v.clone()).ok())
            .unwrap_or_default();
        let impact_score = supporting
            .get("impact_score")
            .and_then(|v| v.as_f64())
            .unwrap_or(0.0);

        Ok(StoredInsight {
            id: row.get("id"),
            insight_type: insight_type.parse()?,
            title: row.get("title"),
            description: row.get("description"),
            priority: row.get("priority"),
            related_themes,
            impact_score,
        })
    }
}

#[async_trait]
impl SurveyAnalysisRepository for PgSurveyAnalysisRepository {
    async fn create(&self, req: NewSurveyAnalysis) -> Result<SurveyAnalysis> {
        let id = Uuid::now_v7();
        let total = req.responses.len() as i32;
        let mut tx = self.pool.begin().await.map_err(Error::Database)?;

        let sql = format!(
            "INSERT INTO survey_analyses
                (id, name, original_filename, total_responses, processed_responses,
                 response_column, headers, status)
             VALUES ($1, $2, $3, $4, 0, $5, $6, 'processing')
             RETURNING {SURVEY_COLUMNS}"
        );
        let row = sqlx::query(&sql)
            .bind(id)
            .bind(&req.name)
            .bind(&req.original_filename)
            .bind(total)
            .bind(&req.response_column)
            .bind(&req.headers)
            .fetch_one(&mut *tx)
            .await
            .map_err(Error::Database)?;
        let survey = Self::row_to_survey(&row)?;

        for response in &req.responses {
            sqlx::query(
                "INSERT INTO survey_responses
                    (id, survey_id, response_text, question_text, row_number, participant_id, metadata)
                 VALUES ($1, $2, $3, $4, $5, $6, $7)",
            )
            .bind(Uuid::now_v7())
            .bind(id)
            .bind(&response.response_text)
            .bind(&response.question_text)
            .bind(response.row_number)
            .bind(&response.participant_id)
            .bind(&response.metadata)
            .execute(&mut *tx)
            .await
            .map_err(Error::Database)?;
        }

        tx.commit().await.map_err(Error::Database)?;

        info!(
            subsystem = "db",
            component = "surveys",
            op = "create",
            survey_id = %id,
            result_count = total,
            "Survey analysis created"
        );
        Ok(survey)
    }

    async fn get(&self, id: Uuid) -> Result<Option<SurveyAnalysis>> {
        let sql = format!("SELECT {SURVEY_COLUMNS} FROM survey_analyses WHERE id = $1");
        let row = sqlx::query(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(Error::Database)?;
        row.as_ref().map(Self::row_to_survey).transpose()
    }

    async fn responses(&self, id: Uuid) -> Result<Vec<SurveyResponseRow>> {
        let sql = format!(
            "SELECT {RESPONSE_COLUMNS} FROM survey_responses
             WHERE survey_id = $1 ORDER BY row_number"
        );
        let rows = sqlx::query(&sql)
            .bind(id)
            .fetch_all(&self.pool)
            .await
            .map_err(Error::Database)?;
        Ok(rows.iter().map(Self::row_to_response).collect())
    }

    async fn sample_responses(&self, id: Uuid, limit: i64) -> Result<Vec<SurveyResponseRow>> {
        let sql = format!(
            "SELECT {RESPONSE_COLUMNS} FROM survey_responses
             WHERE survey_id = $1 ORDER BY row_number LIMIT $2"
        );
        let rows = sqlx::query(&sql)
            .bind(id)
            .bind(limit)
            .fetch_all(&self.pool)
            .await
            .map_err(Error::Database)?;
        Ok(rows.iter().map(Self::row_to_response).collect())
    }

    async fn record_analysis(&self, response_id: Uuid, analysis: &ResponseAnalysis) -> Result<()> {
        let payload = serde_json::to_value(analysis)?;
        sqlx::query("UPDATE survey_responses SET ai_analysis = $2 WHERE id = $1")
            .bind(response_id)
            .bind(payload)
            .execute(&self.pool)
            .await
            .map_err(Error::Database)?;
        Ok(())
    }

    async fn record_progress(&self, id: Uuid, processed: i32) -> Result<()> {
        sqlx::query("UPDATE survey_analyses SET processed_responses = $2 WHERE id = $1")
            .bind(id)
            .bind(processed)
            .execute(&self.pool)
            .await
            .map_err(Error::Database)?;
        Ok(())
    }

    async fn replace_results(
        &self,
        id: Uuid,
        themes: &[SurveyTheme],
        insights: &[Insight],
    ) -> Result<()> {
        let mut tx = self.pool.begin().await.map_err(Error::Database)?;

        let removed_themes = sqlx::query("DELETE FROM survey_themes WHERE survey_id = $1")
            .bind(id)
            .execute(&mut *tx)
            .await
            .map_err(Error::Database)?
            .rows_affected();
        let removed_insights = sqlx::query("DELETE FROM survey_insights WHERE survey_id = $1")
            .bind(id)
            .execute(&mut *tx)
            .await
            .map_err(Error::Database)?
            .rows_affected();

        for theme in themes {
            sqlx::query(
                "INSERT INTO survey_themes
                    (id, survey_id, theme_name, mention_count, sentiment_score, sample_responses)
                 VALUES ($1, $2, $3, $4, $5, $6)",
            )
            .bind(Uuid::now_v7())
            .bind(id)
            .bind(&theme.theme_name)
            .bind(theme.mention_count)
            .bind(theme.sentiment_score)
            .bind(&theme.sample_responses)
            .execute(&mut *tx)
            .await
            .map_err(Error::Database)?;
        }

        for insight in insights {
            let supporting = json!({
                "related_themes": insight.themes,
                "impact_score": insight.impact,
            });
            sqlx::query(
                "INSERT INTO survey_insights
                    (id, survey_id, insight_type, title, description, priority, supporting_data)
                 VALUES ($1, $2, $3, $4, $5, $6, $7)",
            )
            .bind(Uuid::now_v7())
            .bind(id)
            .bind(insight.insight_type.as_str())
            .bind(&insight.title)
            .bind(&insight.content)
            .bind(insight.priority())
            .bind(supporting)
            .execute(&mut *tx)
            .await
            .map_err(Error::Database)?;
        }

        tx.commit().await.map_err(Error::Database)?;

        debug!(
            subsystem = "db",
            component = "surveys",
            op = "replace_results",
            survey_id = %id,
            removed_themes,
            removed_insights,
            themes = themes.len(),
            insights = insights.len(),
            "Survey results replaced"
        );
        Ok(())
    }

    async fn complete(&self, id: Uuid, total_responses: i32) -> Result<()> {
        let updated = sqlx::query(
            "UPDATE survey_analyses
             SET status = 'completed',
                 processed_responses = $2,
                 completed_at = COALESCE(completed_at, now())
             WHERE id = $1",
        )
        .bind(id)
        .bind(total_responses)
        .execute(&self.pool)
        .await
        .map_err(Error::Database)?
        .rows_affected();

        if updated == 0 {
            return Err(Error::NotFound(format!("Survey analysis {} not found", id)));
        }
        Ok(())
    }

    async fn themes(&self, id: Uuid) -> Result<Vec<SurveyTheme>> {
        let rows = sqlx::query(
            "SELECT theme_name, mention_count, sentiment_score, sample_responses
             FROM survey_themes
             WHERE survey_id = $1
             ORDER BY mention_count DESC, theme_name",
        )
        .bind(id)
        .fetch_all(&self.pool)
        .await
        .map_err(Error::Database)?;

        Ok(rows
            .iter()
            .map(|row| SurveyTheme {
                theme_name: row.get("theme_name"),
                mention_count: row.get("mention_count"),
                sentiment_score: row.get("sentiment_score"),
                sample_responses: row.get("sample_responses"),
            })
            .collect())
    }

    async fn insights(&self, id: Uuid) -> Result<Vec<StoredInsight>> {
        let rows = sqlx::query(
            "SELECT id, insight_type, title, description, priority, supporting_data
             FROM survey_insights
             WHERE survey_id = $1
             ORDER BY priority DESC, created_at, id",
        )
        .bind(id)
        .fetch_all(&self.pool)
        .await
        .map_err(Error::Database)?;

        rows.iter().map(Self::row_to_insight).collect()
    }
}
