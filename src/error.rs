// src/error.rs

use crate::model::store::StoreId;
use thiserror::Error;

/// Failures raised by a demand forecaster.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ForecastError {
    #[error("store {0} is not known to the forecaster")]
    NotFound(StoreId),

    #[error("forecaster is not ready: {0}")]
    InvalidState(String),

    #[error("malformed forecast for store {store}: {reason}")]
    Malformed { store: StoreId, reason: String },
}

#[derive(Error, Debug)]
pub enum SimError {
    #[error("forecast failed: {0}")]
    Forecast(#[from] ForecastError),

    #[error("invalid configuration: {0}")]
    Config(String),

    #[error("invalid cost parameters: {0}")]
    CostParams(String),

    #[error("duplicate store {0} in stock table")]
    DuplicateStore(StoreId),

    #[error("store {0} in stock table is unknown to the forecaster")]
    UnknownStore(StoreId),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("config file error: {0}")]
    Toml(#[from] toml::de::Error),
}

pub type Result<T> = std::result::Result<T, SimError>;
