//! Row Source: read access to `nps_response`.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::postgres::PgRow;
use sqlx::{Pool, Postgres, Row};
use tracing::debug;
use uuid::Uuid;

use nps_core::defaults::{EMPTY_COMMENT_STOPLIST, PASSIVE_MIN_SCORE, PROMOTER_MIN_SCORE};
use nps_core::{
    metrics, Error, FilterContext, FilterOptions, GroupNps, MonthlyNps, NewNpsResponse, NpsKpis,
    NpsResponse, ResponseRepository, Result, TitleMonthNps,
};

/// Filter predicate shared by every context-scoped query.
///
/// Binds `$1..$4` as start, end, survey, title. A NULL bind disables that clause.
pub(crate) const FILTER_CLAUSE: &str = "($1::timestamptz IS NULL OR r.creation_date >= $1) \
     AND ($2::timestamptz IS NULL OR r.creation_date <= $2) \
     AND ($3::text IS NULL OR r.survey_name = $3) \
     AND ($4::text IS NULL OR r.title_text = $4)";

/// Month bucket expression, `YYYY-MM` in UTC.
pub(crate) const MONTH_EXPR: &str =
    "to_char(date_trunc('month', r.creation_date AT TIME ZONE 'UTC'), 'YYYY-MM')";

/// Band counters; binds `$5` as the promoter threshold and `$6` as the passive threshold.
const BAND_COUNTS: &str = "COUNT(*) AS total, \
     COUNT(*) FILTER (WHERE r.nps_score >= $5) AS promoters, \
     COUNT(*) FILTER (WHERE r.nps_score >= $6 AND r.nps_score < $5) AS passives, \
     COUNT(*) FILTER (WHERE r.nps_score < $6) AS detractors";

/// Bind the four filter parameters onto a query.
macro_rules! bind_filter {
    ($query:expr, $filter:expr) => {
        $query
            .bind($filter.start)
            .bind($filter.end)
            .bind($filter.survey.clone())
            .bind($filter.title.clone())
    };
}
pub(crate) use bind_filter;

/// PostgreSQL implementation of ResponseRepository.
#[derive(Clone)]
pub struct PgResponseRepository {
    pool: Pool<Postgres>,
}

impl PgResponseRepository {
    pub fn new(pool: Pool<Postgres>) -> Self {
        Self { pool }
    }

    fn row_to_response(row: &PgRow) -> NpsResponse {
        NpsResponse {
            id: row.get("id"),
            nps_score: row.get("nps_score"),
            nps_explanation: row.get("nps_explanation"),
            title_text: row.get("title_text"),
            survey_name: row.get("survey_name"),
            creation_date: row.get("creation_date"),
        }
    }

    fn row_to_group(row: &PgRow) -> GroupNps {
        let total: i64 = row.get("total");
        let promoters: i64 = row.get("promoters");
        let detractors: i64 = row.get("detractors");
        GroupNps {
            name: row.get("name"),
            total,
            promoters,
            passives: row.get("passives"),
            detractors,
            nps: metrics::round_to(metrics::nps_score(promoters, detractors, total), 1),
        }
    }

    /// Group rows by an arbitrary expression, returning NPS per group.
    async fn grouped_nps(
        &self,
        filter: &FilterContext,
        group_expr: &str,
        min_responses: i64,
    ) -> Result<Vec<GroupNps>> {
        let sql = format!(
            "SELECT {group_expr} AS name, {BAND_COUNTS} \
             FROM nps_response r \
             WHERE {FILTER_CLAUSE} AND {group_expr} IS NOT NULL \
             GROUP BY {group_expr} \
             HAVING COUNT(*) >= $7"
        );
        let rows = bind_filter!(sqlx::query(&sql), filter)
            .bind(PROMOTER_MIN_SCORE)
            .bind(PASSIVE_MIN_SCORE)
            .bind(min_responses)
            .fetch_all(&self.pool)
            .await
            .map_err(Error::Database)?;

        let mut groups: Vec<GroupNps> = rows.iter().map(Self::row_to_group).collect();
        groups.sort_by(|a, b| {
            b.nps
                .total_cmp(&a.nps)
                .then_with(|| b.total.cmp(&a.total))
                .then_with(|| a.name.cmp(&b.name))
        });
        Ok(groups)
    }
}

#[async_trait]
impl ResponseRepository for PgResponseRepository {
    async fn insert(&self, req: NewNpsResponse) -> Result<Uuid> {
        let id = Uuid::now_v7();
        sqlx::query(
            "INSERT INTO nps_response (id, nps_score, nps_explanation, title_text, survey_name, creation_date)
             VALUES ($1, $2, $3, $4, $5, $6)",
        )
        .bind(id)
        .bind(req.nps_score)
        .bind(&req.nps_explanation)
        .bind(&req.title_text)
        .bind(&req.survey_name)
        .bind(req.creation_date)
        .execute(&self.pool)
        .await
        .map_err(Error::Database)?;
        Ok(id)
    }

    async fn list(
        &self,
        filter: &FilterContext,
        limit: i64,
        offset: i64,
    ) -> Result<Vec<NpsResponse>> {
        let sql = format!(
            "SELECT r.id, r.nps_score, r.nps_explanation, r.title_text, r.survey_name, r.creation_date
             FROM nps_response r
             WHERE {FILTER_CLAUSE}
             ORDER BY r.creation_date DESC, r.id
             LIMIT $5 OFFSET $6"
        );
        let rows = bind_filter!(sqlx::query(&sql), filter)
            .bind(limit)
            .bind(offset)
            .fetch_all(&self.pool)
            .await
            .map_err(Error::Database)?;
        Ok(rows.iter().map(Self::row_to_response).collect())
    }

    async fn kpis(&self, filter: &FilterContext) -> Result<NpsKpis> {
        let sql = format!(
            "SELECT {BAND_COUNTS}, COALESCE(AVG(r.nps_score)::float8, 0) AS avg_score
             FROM nps_response r
             WHERE {FILTER_CLAUSE}"
        );
        let row = bind_filter!(sqlx::query(&sql), filter)
            .bind(PROMOTER_MIN_SCORE)
            .bind(PASSIVE_MIN_SCORE)
            .fetch_one(&self.pool)
            .await
            .map_err(Error::Database)?;

        let total: i64 = row.get("total");
        let promoters: i64 = row.get("promoters");
        let detractors: i64 = row.get("detractors");
        let avg: f64 = row.get("avg_score");
        Ok(NpsKpis {
            total,
            promoters,
            passives: row.get("passives"),
            detractors,
            nps: metrics::round_to(metrics::nps_score(promoters, detractors, total), 1),
            avg_score: metrics::round_to(avg, 1),
        })
    }

    async fn monthly_trend(&self, filter: &FilterContext) -> Result<Vec<MonthlyNps>> {
        let sql = format!(
            "SELECT {MONTH_EXPR} AS month, {BAND_COUNTS}
             FROM nps_response r
             WHERE {FILTER_CLAUSE}
             GROUP BY 1
             ORDER BY 1"
        );
        let rows = bind_filter!(sqlx::query(&sql), filter)
            .bind(PROMOTER_MIN_SCORE)
            .bind(PASSIVE_MIN_SCORE)
            .fetch_all(&self.pool)
            .await
            .map_err(Error::Database)?;

        Ok(rows
            .iter()
            .map(|row| {
                let total: i64 = row.get("total");
                let promoters: i64 = row.get("promoters");
                let detractors: i64 = row.get("detractors");
                MonthlyNps {
                    month: row.get("month"),
                    total,
                    promoters,
                    passives: row.get("passives"),
                    detractors,
                    nps: metrics::round_to(metrics::nps_score(promoters, detractors, total), 1),
                }
            })
            .collect())
    }

    async fn nps_by_survey(&self, filter: &FilterContext) -> Result<Vec<GroupNps>> {
        self.grouped_nps(filter, "r.survey_name", 1).await
    }

    async fn nps_by_title(
        &self,
        filter: &FilterContext,
        min_responses: i64,
    ) -> Result<Vec<GroupNps>> {
        self.grouped_nps(filter, "r.title_text", min_responses.max(1))
            .await
    }

    async fn title_month_nps(&self, filter: &FilterContext) -> Result<Vec<TitleMonthNps>> {
        let sql = format!(
            "SELECT r.title_text AS title, {MONTH_EXPR} AS month,
                    COUNT(*) AS responses,
                    COUNT(*) FILTER (WHERE r.nps_score >= $5) AS promoters,
                    COUNT(*) FILTER (WHERE r.nps_score < $6) AS detractors
             FROM nps_response r
             WHERE {FILTER_CLAUSE} AND r.title_text IS NOT NULL
             GROUP BY 1, 2
             ORDER BY 1, 2"
        );
        let rows = bind_filter!(sqlx::query(&sql), filter)
            .bind(PROMOTER_MIN_SCORE)
            .bind(PASSIVE_MIN_SCORE)
            .fetch_all(&self.pool)
            .await
            .map_err(Error::Database)?;

        Ok(rows
            .iter()
            .map(|row| TitleMonthNps {
                title: row.get("title"),
                month: row.get("month"),
                responses: row.get("responses"),
                promoters: row.get("promoters"),
                detractors: row.get("detractors"),
            })
            .collect())
    }

    async fn recent(&self, limit: i64) -> Result<Vec<NpsResponse>> {
        let rows = sqlx::query(
            "SELECT r.id, r.nps_score, r.nps_explanation, r.title_text, r.survey_name, r.creation_date
             FROM nps_response r
             ORDER BY r.creation_date DESC, r.id
             LIMIT $1",
        )
        .bind(limit)
        .fetch_all(&self.pool)
        .await
        .map_err(Error::Database)?;
        Ok(rows.iter().map(Self::row_to_response).collect())
    }

    async fn responses_since(&self, since: DateTime<Utc>) -> Result<Vec<NpsResponse>> {
        let rows = sqlx::query(
            "SELECT r.id, r.nps_score, r.nps_explanation, r.title_text, r.survey_name, r.creation_date
             FROM nps_response r
             WHERE r.creation_date >= $1
             ORDER BY r.creation_date, r.id",
        )
        .bind(since)
        .fetch_all(&self.pool)
        .await
        .map_err(Error::Database)?;
        debug!(
            subsystem = "db",
            component = "responses",
            op = "responses_since",
            result_count = rows.len(),
            "Fetched audit rows"
        );
        Ok(rows.iter().map(Self::row_to_response).collect())
    }

    async fn filter_options(&self) -> Result<FilterOptions> {
        let surveys: Vec<String> = sqlx::query_scalar(
            "SELECT DISTINCT survey_name FROM nps_response ORDER BY survey_name",
        )
        .fetch_all(&self.pool)
        .await
        .map_err(Error::Database)?;

        let titles: Vec<String> = sqlx::query_scalar(
            "SELECT DISTINCT title_text FROM nps_response
             WHERE title_text IS NOT NULL AND title_text <> ''
             ORDER BY title_text",
        )
        .fetch_all(&self.pool)
        .await
        .map_err(Error::Database)?;

        Ok(FilterOptions { surveys, titles })
    }

    async fn unenriched(&self, limit: i64) -> Result<Vec<NpsResponse>> {
        // Placeholder comments sort last so they cannot starve real comments
        // out of the batch; the caller still counts them as skipped.
        let stoplist: Vec<String> = EMPTY_COMMENT_STOPLIST.iter().map(|s| s.to_string()).collect();
        let rows = sqlx::query(
            "SELECT r.id, r.nps_score, r.nps_explanation, r.title_text, r.survey_name, r.creation_date
             FROM nps_response r
             LEFT JOIN nps_ai_enrichment e ON e.response_id = r.id
             WHERE e.id IS NULL AND r.nps_explanation IS NOT NULL
             ORDER BY (lower(btrim(r.nps_explanation)) = ANY($1)) ASC, r.creation_date ASC, r.id
             LIMIT $2",
        )
        .bind(&stoplist)
        .bind(limit)
        .fetch_all(&self.pool)
        .await
        .map_err(Error::Database)?;

        debug!(
            subsystem = "db",
            component = "responses",
            op = "unenriched",
            result_count = rows.len(),
            "Fetched unenriched responses"
        );
        Ok(rows.iter().map(Self::row_to_response).collect())
    }

    async fn sample_comments(&self, limit: i64, min_chars: i32) -> Result<Vec<String>> {
        sqlx::query_scalar(
            "SELECT nps_explanation FROM nps_response
             WHERE nps_explanation IS NOT NULL AND length(btrim(nps_explanation)) > $2
             ORDER BY random()
             LIMIT $1",
        )
        .bind(limit)
        .bind(min_chars)
        .fetch_all(&self.pool)
        .await
        .map_err(Error::Database)
    }
}
