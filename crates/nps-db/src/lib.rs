//! # nps-db
//!
//! PostgreSQL database layer for nps-insights.
//!
//! This crate provides:
//! - Connection pool management
//! - The Row Source over `nps_response` (KPIs, trends, grouped NPS)
//! - The enrichment store with pgvector similarity lookups
//! - The ad-hoc survey analysis job store
//!
//! ## Example
//!
//! ```rust,ignore
//! use nps_db::{Database, FilterContext, ResponseRepository};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let db = Database::connect("postgres://localhost/nps").await?;
//!     let kpis = db.responses.kpis(&FilterContext::all()).await?;
//!     println!("NPS: {}", kpis.nps);
//!     Ok(())
//! }
//! ```
pub mod enrichments;
pub mod pool;
pub mod responses;
pub mod survey_analyses;

// Test fixtures for integration tests
// Note: Always compiled so integration tests (in tests/) can use DEFAULT_TEST_DATABASE_URL
pub mod test_fixtures;

// Re-export core types
pub use nps_core::*;

pub use enrichments::PgEnrichmentRepository;
pub use pool::{
    create_lazy_pool, create_pool, create_pool_with_config, log_pool_metrics, PoolConfig,
};
pub use responses::PgResponseRepository;
pub use survey_analyses::PgSurveyAnalysisRepository;

/// Combined database context with all repositories.
#[derive(Clone)]
pub struct Database {
    /// The underlying connection pool.
    pub pool: sqlx::Pool<sqlx::Postgres>,
    /// Row Source over raw survey responses.
    pub responses: PgResponseRepository,
    /// AI enrichment store.
    pub enrichments: PgEnrichmentRepository,
    /// Ad-hoc survey analysis jobs and results.
    pub surveys: PgSurveyAnalysisRepository,
}

impl Database {
    /// Create a new Database instance from a connection pool.
    pub fn new(pool: sqlx::Pool<sqlx::Postgres>) -> Self {
        Self {
            responses: PgResponseRepository::new(pool.clone()),
            enrichments: PgEnrichmentRepository::new(pool.clone()),
            surveys: PgSurveyAnalysisRepository::new(pool.clone()),
            pool,
        }
    }

    /// Create a new Database instance by connecting to the given URL.
    pub async fn connect(url: &str) -> Result<Self> {
        let pool = create_pool(url).await?;
        Ok(Self::new(pool))
    }

    /// Create with custom pool configuration.
    pub async fn connect_with_config(url: &str, config: PoolConfig) -> Result<Self> {
        let pool = create_pool_with_config(url, config).await?;
        Ok(Self::new(pool))
    }

    /// Create without connecting; the first query opens the connection.
    pub fn connect_lazy(url: &str, config: PoolConfig) -> Result<Self> {
        let pool = create_lazy_pool(url, config)?;
        Ok(Self::new(pool))
    }

    /// Run pending migrations.
    #[cfg(feature = "migrations")]
    pub async fn migrate(&self) -> Result<()> {
        sqlx::migrate!("../../migrations")
            .run(&self.pool)
            .await
            .map_err(|e| Error::Database(sqlx::Error::Migrate(Box::new(e))))?;
        Ok(())
    }

    /// Get the underlying connection pool.
    pub fn pool(&self) -> &sqlx::Pool<sqlx::Postgres> {
        &self.pool
    }
}
