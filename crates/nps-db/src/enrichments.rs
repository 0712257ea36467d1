//! Enrichment store: `nps_ai_enrichment`, one insert-only row per response.

use std::collections::BTreeMap;

use async_trait::async_trait;
use sqlx::postgres::PgRow;
use sqlx::{Pool, Postgres, Row};
use tracing::debug;
use uuid::Uuid;

use nps_core::{
    Enrichment, EnrichmentRepository, EnrichmentStats, Error, FilterContext, NewEnrichment,
    NpsBucket, NpsCategory, Result, SimilarResponse, ThemeAssignment, Vector,
};

use crate::responses::{bind_filter, FILTER_CLAUSE};

/// PostgreSQL implementation of EnrichmentRepository.
#[derive(Clone)]
pub struct PgEnrichmentRepository {
    pool: Pool<Postgres>,
}

impl PgEnrichmentRepository {
    pub fn new(pool: Pool<Postgres>) -> Self {
        Self { pool }
    }

    fn row_to_enrichment(row: &PgRow) -> Result<Enrichment> {
        let scores: serde_json::Value = row.get("theme_scores");
        let theme_scores: BTreeMap<String, f64> = serde_json::from_value(scores)?;
        let label: String = row.get("sentiment_label");
        Ok(Enrichment {
            id: row.get("id"),
            response_id: row.get("response_id"),
            themes: row.get("themes"),
            theme_scores,
            sentiment_score: row.get("sentiment_score"),
            sentiment_label: label.parse().unwrap_or_default(),
            promoter_flag: row.get("promoter_flag"),
            passive_flag: row.get("passive_flag"),
            detractor_flag: row.get("detractor_flag"),
            keywords: row.get("keywords"),
            language: row.get("language"),
            model: row.get("model"),
            created_at: row.get("created_at"),
        })
    }
}

#[async_trait]
impl EnrichmentRepository for PgEnrichmentRepository {
    async fn insert(&self, req: NewEnrichment) -> Result<Option<Uuid>> {
        let id = Uuid::now_v7();
        let label = req.sentiment_label();
        let classification = &req.classification;
        let theme_scores = serde_json::to_value(&classification.theme_scores)?;
        let sentiment = classification.sentiment.map(|s| s.clamp(-1.0, 1.0));

        let inserted: Option<Uuid> = sqlx::query_scalar(
            "INSERT INTO nps_ai_enrichment
                (id, response_id, themes, theme_scores, sentiment_score, sentiment_label,
                 promoter_flag, passive_flag, detractor_flag, keywords, language, model, embedding)
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13)
             ON CONFLICT (response_id) DO NOTHING
             RETURNING id",
        )
        .bind(id)
        .bind(req.response_id)
        .bind(&classification.themes)
        .bind(theme_scores)
        .bind(sentiment)
        .bind(label.as_str())
        .bind(req.category == NpsCategory::Promoter)
        .bind(req.category == NpsCategory::Passive)
        .bind(req.category == NpsCategory::Detractor)
        .bind(&classification.keywords)
        .bind(&classification.language)
        .bind(&req.model)
        .bind(req.embedding.as_ref())
        .fetch_optional(&self.pool)
        .await
        .map_err(Error::Database)?;

        if inserted.is_none() {
            debug!(
                subsystem = "db",
                component = "enrichments",
                op = "insert",
                response_id = %req.response_id,
                "Response already enriched, insert skipped"
            );
        }
        Ok(inserted)
    }

    async fn get_for_response(&self, response_id: Uuid) -> Result<Option<Enrichment>> {
        let row = sqlx::query(
            "SELECT id, response_id, themes, theme_scores, sentiment_score, sentiment_label,
                    promoter_flag, passive_flag, detractor_flag, keywords, language, model, created_at
             FROM nps_ai_enrichment
             WHERE response_id = $1",
        )
        .bind(response_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(Error::Database)?;

        row.as_ref().map(Self::row_to_enrichment).transpose()
    }

    async fn theme_assignments(
        &self,
        filter: &FilterContext,
        bucket: Option<NpsBucket>,
    ) -> Result<Vec<ThemeAssignment>> {
        let (low, high) = match bucket {
            Some(b) => {
                let (lo, hi) = b.score_range();
                (Some(lo), Some(hi))
            }
            None => (None, None),
        };

        let sql = format!(
            "SELECT r.id AS response_id, t.theme, r.nps_score, e.sentiment_score,
                    r.title_text, r.survey_name, r.creation_date, r.nps_explanation
             FROM nps_response r
             JOIN nps_ai_enrichment e ON e.response_id = r.id
             CROSS JOIN LATERAL unnest(e.themes) AS t(theme)
             WHERE {FILTER_CLAUSE}
               AND ($5::smallint IS NULL OR r.nps_score >= $5)
               AND ($6::smallint IS NULL OR r.nps_score <= $6)
               AND btrim(t.theme) <> ''
             ORDER BY r.creation_date, r.id, t.theme"
        );
        let rows = bind_filter!(sqlx::query(&sql), filter)
            .bind(low)
            .bind(high)
            .fetch_all(&self.pool)
            .await
            .map_err(Error::Database)?;

        Ok(rows
            .iter()
            .map(|row| ThemeAssignment {
                response_id: row.get("response_id"),
                theme: row.get("theme"),
                nps_score: row.get("nps_score"),
                sentiment_score: row.get("sentiment_score"),
                title_text: row.get("title_text"),
                survey_name: row.get("survey_name"),
                creation_date: row.get("creation_date"),
                comment: row.get("nps_explanation"),
            })
            .collect())
    }

    async fn stats(&self) -> Result<EnrichmentStats> {
        let row = sqlx::query(
            "SELECT
                (SELECT COUNT(*) FROM nps_response) AS total_responses,
                (SELECT COUNT(*) FROM nps_response
                  WHERE nps_explanation IS NOT NULL AND btrim(nps_explanation) <> '') AS with_comments,
                (SELECT COUNT(*) FROM nps_ai_enrichment) AS enriched,
                (SELECT MAX(created_at) FROM nps_ai_enrichment) AS last_run",
        )
        .fetch_one(&self.pool)
        .await
        .map_err(Error::Database)?;

        let with_comments: i64 = row.get("with_comments");
        let enriched: i64 = row.get("enriched");
        let enrichment_percentage = if with_comments > 0 {
            ((enriched as f64 / with_comments as f64) * 100.0).round() as i64
        } else {
            0
        };

        Ok(EnrichmentStats {
            total_responses: row.get("total_responses"),
            responses_with_comments: with_comments,
            enriched_responses: enriched,
            enrichment_percentage,
            last_run: row.get("last_run"),
        })
    }

    async fn similar(&self, query: &Vector, limit: i64) -> Result<Vec<SimilarResponse>> {
        let rows = sqlx::query(
            "SELECT r.id, r.title_text, r.survey_name, r.creation_date, r.nps_score,
                    r.nps_explanation, (1 - (e.embedding <=> $1))::float8 AS similarity
             FROM nps_ai_enrichment e
             JOIN nps_response r ON r.id = e.response_id
             WHERE e.embedding IS NOT NULL
             ORDER BY e.embedding <=> $1
             LIMIT $2",
        )
        .bind(query)
        .bind(limit)
        .fetch_all(&self.pool)
        .await
        .map_err(Error::Database)?;

        Ok(rows
            .iter()
            .map(|row| SimilarResponse {
                response_id: row.get("id"),
                title: row.get("title_text"),
                survey_name: row.get("survey_name"),
                creation_date: row.get("creation_date"),
                nps_score: row.get("nps_score"),
                comment: row.get("nps_explanation"),
                similarity: row.get("similarity"),
            })
            .collect())
    }
}
