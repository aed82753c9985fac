use async_trait::async_trait;
use sqlx::PgPool;
use tracing::{debug, error, instrument};

use crate::db::{DbError, Station, StationStore};

#[derive(Clone)]
pub struct StationRepository {
    pool: PgPool,
}

impl StationRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    #[instrument(skip(self), fields(code = %code))]
    pub async fn find_by_code(&self, code: &str) -> Result<Option<Station>, DbError> {
        let station = sqlx::query_as::<_, Station>(
            r#"
            SELECT id, code
            FROM weather_stations
            WHERE code = $1
            "#,
        )
        .bind(code)
        .fetch_optional(&self.pool)
        .await?;

        Ok(station)
    }
}

#[async_trait]
impl StationStore for StationRepository {
    /// The no-op `DO UPDATE` makes `RETURNING` yield the existing row on
    /// conflict, so concurrent resolvers of one code share a single identity.
    #[instrument(skip(self), fields(code = %code))]
    async fn resolve(&self, code: &str) -> Result<Station, DbError> {
        let station = sqlx::query_as::<_, Station>(
            r#"
            INSERT INTO weather_stations (code)
            VALUES ($1)
            ON CONFLICT (code) DO UPDATE SET code = EXCLUDED.code
            RETURNING id, code
            "#,
        )
        .bind(code)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| {
            error!(code = %code, error = %e, "Failed to resolve station");
            e
        })?;

        debug!("Resolved station {} to id {}", station.code, station.id);
        Ok(station)
    }
}
