use std::collections::BTreeSet;
use std::sync::Arc;

use rust_decimal::{Decimal, RoundingStrategy};
use tracing::{debug, instrument};

use crate::db::{DayRecord, DayRecordStore, DbError, Station, YearStats, YearStatsStore};

/// Rebuilds yearly statistics from the stored day records
#[derive(Clone)]
pub struct StatsAggregator {
    days: Arc<dyn DayRecordStore>,
    stats: Arc<dyn YearStatsStore>,
}

impl StatsAggregator {
    pub fn new(days: Arc<dyn DayRecordStore>, stats: Arc<dyn YearStatsStore>) -> Self {
        Self { days, stats }
    }

    /// Recompute and upsert stats for each of `years` for one station.
    ///
    /// Every year is rebuilt from all of its currently stored day records.
    /// Years without any stored record produce no stats row.
    #[instrument(skip(self, station), fields(station_code = %station.code, years = years.len()))]
    pub async fn recompute(
        &self,
        station: &Station,
        years: &BTreeSet<i32>,
    ) -> Result<Vec<YearStats>, DbError> {
        let mut recomputed = Vec::with_capacity(years.len());

        for &year in years {
            let records = self.days.find_by_station_year(station, year).await?;
            match compute_year_stats(station.id, year, &records) {
                Some(stats) => recomputed.push(stats),
                None => debug!("No day records for {} in {}, skipping stats", station.code, year),
            }
        }

        self.stats.upsert_all(&recomputed).await?;

        debug!(
            "Recomputed {} yearly stats rows for station {}",
            recomputed.len(),
            station.code
        );
        Ok(recomputed)
    }
}

/// Aggregate one station-year of day records.
///
/// Missing values are left out of each aggregate rather than counted as
/// zero. Returns `None` when there are no records at all.
pub fn compute_year_stats(station_id: i64, year: i32, records: &[DayRecord]) -> Option<YearStats> {
    if records.is_empty() {
        return None;
    }

    Some(YearStats {
        station_id,
        year,
        avg_temperature_max: average_tenths(records.iter().filter_map(|r| r.temperature_max)),
        avg_temperature_min: average_tenths(records.iter().filter_map(|r| r.temperature_min)),
        total_precipitation: total_centimeters(records.iter().filter_map(|r| r.precipitation)),
    })
}

/// Mean of tenths-of-a-unit values, in whole units, to 2 decimal places
fn average_tenths(values: impl Iterator<Item = i32>) -> Option<Decimal> {
    let (sum, count) = values.fold((0i64, 0i64), |(sum, count), v| (sum + v as i64, count + 1));
    if count == 0 {
        return None;
    }

    let mut average = (Decimal::from(sum) / Decimal::from(count * 10))
        .round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero);
    average.rescale(2);
    Some(average)
}

/// Sum of tenths-of-a-millimeter values, in centimeters
fn total_centimeters(values: impl Iterator<Item = i32>) -> Option<Decimal> {
    let (sum, count) = values.fold((0i64, 0usize), |(sum, count), v| (sum + v as i64, count + 1));
    if count == 0 {
        return None;
    }
    Some(Decimal::new(sum, 2))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use std::str::FromStr;

    fn day(d: u32, max: Option<i32>, min: Option<i32>, precipitation: Option<i32>) -> DayRecord {
        DayRecord {
            date: NaiveDate::from_ymd_opt(1989, 3, d).unwrap(),
            temperature_max: max,
            temperature_min: min,
            precipitation,
        }
    }

    fn dec(s: &str) -> Decimal {
        Decimal::from_str(s).unwrap()
    }

    #[test]
    fn test_compute_excludes_missing_values() {
        let records = vec![
            day(13, Some(122), Some(-44), None),
            day(14, Some(189), None, Some(53)),
            day(15, None, Some(6), Some(0)),
            day(16, Some(94), Some(-33), Some(0)),
        ];

        let stats = compute_year_stats(7, 1989, &records).unwrap();

        assert_eq!(stats.station_id, 7);
        assert_eq!(stats.year, 1989);
        // (122 + 189 + 94) / 3 / 10 = 13.5
        assert_eq!(stats.avg_temperature_max, Some(dec("13.50")));
        // (-44 + 6 - 33) / 3 / 10 = -2.3666...
        assert_eq!(stats.avg_temperature_min, Some(dec("-2.37")));
        assert_eq!(stats.total_precipitation, Some(dec("0.53")));
    }

    #[test]
    fn test_compute_matches_two_day_station() {
        let records = vec![
            day(13, Some(122), Some(-44), None),
            day(14, Some(189), None, Some(53)),
        ];

        let stats = compute_year_stats(1, 1989, &records).unwrap();

        assert_eq!(stats.avg_temperature_max.unwrap().to_string(), "15.55");
        assert_eq!(stats.avg_temperature_min.unwrap().to_string(), "-4.40");
        assert_eq!(stats.total_precipitation.unwrap().to_string(), "0.53");
    }

    #[test]
    fn test_all_missing_field_is_none() {
        let records = vec![day(13, None, Some(10), None), day(14, None, Some(20), None)];

        let stats = compute_year_stats(1, 1989, &records).unwrap();

        assert_eq!(stats.avg_temperature_max, None);
        assert_eq!(stats.avg_temperature_min, Some(dec("1.50")));
        assert_eq!(stats.total_precipitation, None);
    }

    #[test]
    fn test_zero_precipitation_is_not_missing() {
        let records = vec![day(13, None, None, Some(0))];
        let stats = compute_year_stats(1, 1989, &records).unwrap();
        assert_eq!(stats.total_precipitation, Some(Decimal::ZERO));
    }

    #[test]
    fn test_no_records_yields_no_stats() {
        assert_eq!(compute_year_stats(1, 1989, &[]), None);
    }

    #[test]
    fn test_average_rounds_half_away_from_zero() {
        // 5 / 2 / 10 = 0.25 exactly; -1 / 4 / 10 = -0.025 -> -0.03
        assert_eq!(average_tenths([2, 3].into_iter()), Some(dec("0.25")));
        assert_eq!(average_tenths([-1, 0, 0, 0].into_iter()), Some(dec("-0.03")));
    }
}
