use async_trait::async_trait;
use chrono::NaiveDate;
use sqlx::PgPool;
use tracing::{debug, error, info, instrument};

use crate::db::{
    DayRecord, DayRecordFilter, DayRecordStore, DbError, PageRequest, Paginated, Station,
    WeatherDayRow,
};

#[derive(Clone)]
pub struct DayRecordRepository {
    pool: PgPool,
}

impl DayRecordRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// First day of `year` and first day of the following year
    fn year_date_range(year: i32) -> Option<(NaiveDate, NaiveDate)> {
        let start = NaiveDate::from_ymd_opt(year, 1, 1)?;
        let end = NaiveDate::from_ymd_opt(year + 1, 1, 1)?;
        Some((start, end))
    }
}

#[async_trait]
impl DayRecordStore for DayRecordRepository {
    #[instrument(skip(self, station, records), fields(station_code = %station.code, count = records.len()))]
    async fn upsert_all(&self, station: &Station, records: &[DayRecord]) -> Result<u64, DbError> {
        if records.is_empty() {
            debug!("No day records to upsert for station {}", station.code);
            return Ok(0);
        }

        let dates: Vec<NaiveDate> = records.iter().map(|r| r.date).collect();
        let maxes: Vec<Option<i32>> = records.iter().map(|r| r.temperature_max).collect();
        let mins: Vec<Option<i32>> = records.iter().map(|r| r.temperature_min).collect();
        let precipitation: Vec<Option<i32>> = records.iter().map(|r| r.precipitation).collect();

        debug!(
            "Beginning transaction to upsert {} day records for station {}",
            records.len(),
            station.code
        );
        let mut tx = self.pool.begin().await?;

        let result = sqlx::query(
            r#"
            INSERT INTO weather_days (station_id, date, temperature_max, temperature_min, precipitation)
            SELECT $1, input.date, input.temperature_max, input.temperature_min, input.precipitation
            FROM UNNEST($2::date[], $3::int4[], $4::int4[], $5::int4[])
                AS input(date, temperature_max, temperature_min, precipitation)
            ON CONFLICT (station_id, date) DO UPDATE SET
                temperature_max = EXCLUDED.temperature_max,
                temperature_min = EXCLUDED.temperature_min,
                precipitation = EXCLUDED.precipitation,
                updated_at = NOW()
            "#,
        )
        .bind(station.id)
        .bind(&dates)
        .bind(&maxes)
        .bind(&mins)
        .bind(&precipitation)
        .execute(&mut *tx)
        .await
        .map_err(|e| {
            error!(
                station = %station.code,
                count = records.len(),
                error = %e,
                "Failed to upsert day records"
            );
            e
        })?;

        tx.commit().await?;

        let written = result.rows_affected();
        info!("Upserted {} day records for station {}", written, station.code);
        Ok(written)
    }

    #[instrument(skip(self, station), fields(station_code = %station.code))]
    async fn find_by_station_year(
        &self,
        station: &Station,
        year: i32,
    ) -> Result<Vec<DayRecord>, DbError> {
        let Some((start, end)) = Self::year_date_range(year) else {
            return Ok(Vec::new());
        };

        let records = sqlx::query_as::<_, DayRecord>(
            r#"
            SELECT date, temperature_max, temperature_min, precipitation
            FROM weather_days
            WHERE station_id = $1 AND date >= $2 AND date < $3
            ORDER BY date ASC
            "#,
        )
        .bind(station.id)
        .bind(start)
        .bind(end)
        .fetch_all(&self.pool)
        .await?;

        debug!("Found {} day records for {}", records.len(), year);
        Ok(records)
    }

    #[instrument(skip(self))]
    async fn list(
        &self,
        filter: &DayRecordFilter,
        page: PageRequest,
    ) -> Result<Paginated<WeatherDayRow>, DbError> {
        debug!(
            "Querying day records with offset={}, limit={}",
            page.offset, page.limit
        );

        let count: i64 = sqlx::query_scalar(
            r#"
            SELECT COUNT(*)
            FROM weather_days d
            JOIN weather_stations s ON s.id = d.station_id
            WHERE ($1::text IS NULL OR s.code = $1)
              AND ($2::date IS NULL OR d.date = $2)
            "#,
        )
        .bind(filter.station_code.as_deref())
        .bind(filter.date)
        .fetch_one(&self.pool)
        .await?;

        let results = sqlx::query_as::<_, WeatherDayRow>(
            r#"
            SELECT s.code AS station_code, d.date, d.temperature_max, d.temperature_min, d.precipitation
            FROM weather_days d
            JOIN weather_stations s ON s.id = d.station_id
            WHERE ($1::text IS NULL OR s.code = $1)
              AND ($2::date IS NULL OR d.date = $2)
            ORDER BY s.code, d.date
            LIMIT $3 OFFSET $4
            "#,
        )
        .bind(filter.station_code.as_deref())
        .bind(filter.date)
        .bind(page.limit)
        .bind(page.offset)
        .fetch_all(&self.pool)
        .await?;

        debug!("Found {} of {} day records", results.len(), count);
        Ok(Paginated { count, results })
    }
}
