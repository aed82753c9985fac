use async_trait::async_trait;
use rust_decimal::Decimal;
use sqlx::PgPool;
use tracing::{debug, error, instrument};

use crate::db::{
    DbError, PageRequest, Paginated, WeatherStatsRow, YearStats, YearStatsFilter, YearStatsStore,
};

#[derive(Clone)]
pub struct YearStatsRepository {
    pool: PgPool,
}

impl YearStatsRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl YearStatsStore for YearStatsRepository {
    #[instrument(skip(self, stats), fields(count = stats.len()))]
    async fn upsert_all(&self, stats: &[YearStats]) -> Result<u64, DbError> {
        if stats.is_empty() {
            return Ok(0);
        }

        let station_ids: Vec<i64> = stats.iter().map(|s| s.station_id).collect();
        let years: Vec<i32> = stats.iter().map(|s| s.year).collect();
        let avg_maxes: Vec<Option<Decimal>> = stats.iter().map(|s| s.avg_temperature_max).collect();
        let avg_mins: Vec<Option<Decimal>> = stats.iter().map(|s| s.avg_temperature_min).collect();
        let totals: Vec<Option<Decimal>> = stats.iter().map(|s| s.total_precipitation).collect();

        let mut tx = self.pool.begin().await?;

        let result = sqlx::query(
            r#"
            INSERT INTO weather_stats
                (station_id, year, avg_temperature_max, avg_temperature_min, total_precipitation)
            SELECT * FROM UNNEST($1::int8[], $2::int4[], $3::numeric[], $4::numeric[], $5::numeric[])
            ON CONFLICT (station_id, year) DO UPDATE SET
                avg_temperature_max = EXCLUDED.avg_temperature_max,
                avg_temperature_min = EXCLUDED.avg_temperature_min,
                total_precipitation = EXCLUDED.total_precipitation,
                updated_at = NOW()
            "#,
        )
        .bind(&station_ids)
        .bind(&years)
        .bind(&avg_maxes)
        .bind(&avg_mins)
        .bind(&totals)
        .execute(&mut *tx)
        .await
        .map_err(|e| {
            error!(count = stats.len(), error = %e, "Failed to upsert yearly stats");
            e
        })?;

        tx.commit().await?;

        debug!("Upserted {} yearly stats rows", result.rows_affected());
        Ok(result.rows_affected())
    }

    #[instrument(skip(self))]
    async fn list(
        &self,
        filter: &YearStatsFilter,
        page: PageRequest,
    ) -> Result<Paginated<WeatherStatsRow>, DbError> {
        let count: i64 = sqlx::query_scalar(
            r#"
            SELECT COUNT(*)
            FROM weather_stats w
            JOIN weather_stations s ON s.id = w.station_id
            WHERE ($1::text IS NULL OR s.code = $1)
              AND ($2::int4 IS NULL OR w.year = $2)
            "#,
        )
        .bind(filter.station_code.as_deref())
        .bind(filter.year)
        .fetch_one(&self.pool)
        .await?;

        let results = sqlx::query_as::<_, WeatherStatsRow>(
            r#"
            SELECT s.code AS station_code, w.year, w.avg_temperature_max,
                   w.avg_temperature_min, w.total_precipitation
            FROM weather_stats w
            JOIN weather_stations s ON s.id = w.station_id
            WHERE ($1::text IS NULL OR s.code = $1)
              AND ($2::int4 IS NULL OR w.year = $2)
            ORDER BY s.code, w.year
            LIMIT $3 OFFSET $4
            "#,
        )
        .bind(filter.station_code.as_deref())
        .bind(filter.year)
        .bind(page.limit)
        .bind(page.offset)
        .fetch_all(&self.pool)
        .await?;

        debug!("Found {} of {} yearly stats rows", results.len(), count);
        Ok(Paginated { count, results })
    }
}
