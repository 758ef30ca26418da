// src/simulation/config.rs

use crate::error::{Result, SimError};
use crate::strategy::implementations::OptimizerConfig;
use crate::strategy::optimization::CostParams;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Where the units consumed each day come from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum ConsumptionMode {
    /// Ask the forecaster for a fresh 1-day forecast every day. The daily
    /// values need not add up to the weekly demand used for ordering.
    #[default]
    DailyReforecast,
    /// Consume the matching day of the 7-day forecast used for ordering.
    WeeklyProfile,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SimulationConfig {
    /// Cost per unit of unmet demand.
    pub alpha: f64,
    /// Cost per unit of leftover stock.
    pub beta: f64,
    /// Total units all stores may order in one week.
    pub q_max: u32,
    pub delivery_delay_days: u32,
    /// Units the supplier can release per day across all orders.
    pub daily_limit: u32,
    pub start_date: NaiveDate,
    /// Last day a week may start on (inclusive).
    pub end_date: NaiveDate,
    pub consumption: ConsumptionMode,
    pub optimizer: OptimizerConfig,
}

impl Default for SimulationConfig {
    fn default() -> Self {
        Self {
            alpha: 5.0,
            beta: 1.0,
            q_max: 30_000,
            delivery_delay_days: 2,
            daily_limit: 45_000,
            start_date: NaiveDate::from_ymd_opt(2025, 1, 1).unwrap_or_default(),
            end_date: NaiveDate::from_ymd_opt(2025, 3, 31).unwrap_or_default(),
            consumption: ConsumptionMode::default(),
            optimizer: OptimizerConfig::default(),
        }
    }
}

impl SimulationConfig {
    /// Reads a TOML file; keys left out keep their default.
    pub fn from_toml_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let text = std::fs::read_to_string(path)?;
        Self::from_toml_str(&text)
    }

    pub fn from_toml_str(text: &str) -> Result<Self> {
        let config: Self = toml::from_str(text)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        if !self.alpha.is_finite() || self.alpha <= 0.0 {
            return Err(SimError::Config(format!("alpha must be > 0, got {}", self.alpha)));
        }
        if !self.beta.is_finite() || self.beta <= 0.0 {
            return Err(SimError::Config(format!("beta must be > 0, got {}", self.beta)));
        }
        if self.q_max == 0 {
            return Err(SimError::Config("q_max must be > 0".into()));
        }
        if self.daily_limit == 0 {
            return Err(SimError::Config("daily_limit must be > 0".into()));
        }
        if self.end_date < self.start_date {
            return Err(SimError::Config(format!(
                "end_date {} is before start_date {}",
                self.end_date, self.start_date
            )));
        }
        self.optimizer.genetic.validate()
    }

    pub fn cost_params(&self) -> CostParams {
        CostParams {
            alpha: self.alpha,
            beta: self.beta,
            q_max: self.q_max,
        }
    }
}
