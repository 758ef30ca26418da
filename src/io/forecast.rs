// src/io/forecast.rs

//! Demand forecasters consumed by the simulation loop.

use crate::error::ForecastError;
use crate::io::demand::SalesRecord;
use crate::model::store::StoreId;
use chrono::{Datelike, Duration, NaiveDate};
use std::collections::BTreeMap;

/// Daily demand estimates per store.
pub trait Forecaster {
    /// One non-negative estimate per day, starting at `start_date`.
    ///
    /// Fails with `NotFound` for a store the forecaster has never seen and with
    /// `InvalidState` when it has not been trained yet.
    fn predict(
        &self,
        store: StoreId,
        start_date: NaiveDate,
        horizon_days: u32,
    ) -> Result<Vec<f64>, ForecastError>;

    /// Whether `predict` would accept this store.
    fn knows_store(&self, store: StoreId) -> Result<bool, ForecastError>;
}

impl<F: Forecaster + ?Sized> Forecaster for Box<F> {
    fn predict(
        &self,
        store: StoreId,
        start_date: NaiveDate,
        horizon_days: u32,
    ) -> Result<Vec<f64>, ForecastError> {
        (**self).predict(store, start_date, horizon_days)
    }

    fn knows_store(&self, store: StoreId) -> Result<bool, ForecastError> {
        (**self).knows_store(store)
    }
}

/// Checks a forecast before the loop relies on it.
pub fn validate_forecast(
    store: StoreId,
    values: &[f64],
    horizon_days: u32,
) -> Result<(), ForecastError> {
    if values.len() != horizon_days as usize {
        return Err(ForecastError::Malformed {
            store,
            reason: format!("expected {} values, got {}", horizon_days, values.len()),
        });
    }
    if let Some(bad) = values.iter().find(|v| !v.is_finite() || **v < 0.0) {
        return Err(ForecastError::Malformed {
            store,
            reason: format!("value {bad} is not a non-negative number"),
        });
    }
    Ok(())
}

// =========================================================================
// Constant
// =========================================================================

/// The same daily demand every day, per store.
#[derive(Debug, Clone, Default)]
pub struct ConstantForecaster {
    daily: BTreeMap<StoreId, f64>,
}

impl ConstantForecaster {
    pub fn new<I>(daily: I) -> Self
    where
        I: IntoIterator<Item = (StoreId, f64)>,
    {
        Self {
            daily: daily.into_iter().collect(),
        }
    }
}

impl Forecaster for ConstantForecaster {
    fn predict(
        &self,
        store: StoreId,
        _start_date: NaiveDate,
        horizon_days: u32,
    ) -> Result<Vec<f64>, ForecastError> {
        let value = self
            .daily
            .get(&store)
            .copied()
            .ok_or(ForecastError::NotFound(store))?;
        Ok(vec![value; horizon_days as usize])
    }

    fn knows_store(&self, store: StoreId) -> Result<bool, ForecastError> {
        Ok(self.daily.contains_key(&store))
    }
}

// =========================================================================
// Historical weekday average
// =========================================================================

#[derive(Debug, Clone, PartialEq)]
struct WeekdayProfile {
    // Monday first
    by_weekday: [Option<f64>; 7],
    overall: f64,
}

impl WeekdayProfile {
    fn estimate(&self, date: NaiveDate) -> f64 {
        let slot = date.weekday().num_days_from_monday() as usize;
        self.by_weekday[slot].unwrap_or(self.overall)
    }
}

/// Predicts each day as the store's mean historical sales on that weekday.
///
/// Weekdays with no history fall back to the store's overall mean.
#[derive(Debug, Clone, Default)]
pub struct HistoricalForecaster {
    profiles: Option<BTreeMap<StoreId, WeekdayProfile>>,
}

impl HistoricalForecaster {
    /// A forecaster that refuses to predict until trained.
    pub fn untrained() -> Self {
        Self::default()
    }

    pub fn fit(history: &[SalesRecord]) -> Result<Self, ForecastError> {
        let mut forecaster = Self::untrained();
        forecaster.train(history)?;
        Ok(forecaster)
    }

    pub fn is_trained(&self) -> bool {
        self.profiles.is_some()
    }

    pub fn train(&mut self, history: &[SalesRecord]) -> Result<(), ForecastError> {
        if history.is_empty() {
            return Err(ForecastError::InvalidState(
                "cannot train on an empty sales history".into(),
            ));
        }

        let mut sums: BTreeMap<StoreId, ([f64; 7], [u32; 7])> = BTreeMap::new();
        for record in history {
            let slot = record.date.weekday().num_days_from_monday() as usize;
            let (total, count) = sums.entry(record.store).or_insert(([0.0; 7], [0; 7]));
            total[slot] += f64::from(record.sales);
            count[slot] += 1;
        }

        let profiles = sums
            .into_iter()
            .map(|(store, (total, count))| {
                let mut by_weekday = [None; 7];
                for slot in 0..7 {
                    if count[slot] > 0 {
                        by_weekday[slot] = Some(total[slot] / f64::from(count[slot]));
                    }
                }
                let days: u32 = count.iter().sum();
                let overall = total.iter().sum::<f64>() / f64::from(days);
                (store, WeekdayProfile { by_weekday, overall })
            })
            .collect();

        self.profiles = Some(profiles);
        Ok(())
    }

    fn profiles(&self) -> Result<&BTreeMap<StoreId, WeekdayProfile>, ForecastError> {
        self.profiles
            .as_ref()
            .ok_or_else(|| ForecastError::InvalidState("forecaster has not been trained".into()))
    }
}

impl Forecaster for HistoricalForecaster {
    fn predict(
        &self,
        store: StoreId,
        start_date: NaiveDate,
        horizon_days: u32,
    ) -> Result<Vec<f64>, ForecastError> {
        let profile = self
            .profiles()?
            .get(&store)
            .ok_or(ForecastError::NotFound(store))?;
        Ok((0..horizon_days)
            .map(|offset| profile.estimate(start_date + Duration::days(i64::from(offset))))
            .collect())
    }

    fn knows_store(&self, store: StoreId) -> Result<bool, ForecastError> {
        Ok(self.profiles()?.contains_key(&store))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn constant_forecaster_repeats_value() {
        let fc = ConstantForecaster::new([(StoreId(1), 12.5)]);
        assert_eq!(fc.predict(StoreId(1), date(2025, 1, 1), 3).unwrap(), vec![12.5; 3]);
        assert_eq!(
            fc.predict(StoreId(2), date(2025, 1, 1), 3),
            Err(ForecastError::NotFound(StoreId(2)))
        );
    }

    #[test]
    fn untrained_forecaster_is_not_ready() {
        let fc = HistoricalForecaster::untrained();
        assert!(!fc.is_trained());
        assert!(matches!(
            fc.predict(StoreId(1), date(2025, 1, 1), 7),
            Err(ForecastError::InvalidState(_))
        ));
        assert!(fc.knows_store(StoreId(1)).is_err());
    }

    #[test]
    fn historical_forecaster_uses_weekday_means() {
        // 2024-12-30 is a Monday
        let history = vec![
            SalesRecord { store: StoreId(1), date: date(2024, 12, 30), sales: 10 },
            SalesRecord { store: StoreId(1), date: date(2025, 1, 6), sales: 20 },
            SalesRecord { store: StoreId(1), date: date(2024, 12, 31), sales: 40 },
        ];
        let fc = HistoricalForecaster::fit(&history).unwrap();
        assert!(fc.is_trained());

        // Monday, Tuesday, Wednesday (no data -> overall mean)
        let values = fc.predict(StoreId(1), date(2025, 1, 13), 3).unwrap();
        assert_eq!(values[0], 15.0);
        assert_eq!(values[1], 40.0);
        assert!((values[2] - 70.0 / 3.0).abs() < 1e-9);

        assert!(fc.knows_store(StoreId(1)).unwrap());
        assert!(!fc.knows_store(StoreId(2)).unwrap());
    }

    #[test]
    fn malformed_forecasts_are_caught() {
        assert!(validate_forecast(StoreId(1), &[1.0, 2.0], 2).is_ok());
        assert!(validate_forecast(StoreId(1), &[1.0], 2).is_err());
        assert!(validate_forecast(StoreId(1), &[1.0, -2.0], 2).is_err());
        assert!(validate_forecast(StoreId(1), &[f64::NAN, 2.0], 2).is_err());
    }
}
