// src/simulation/engine.rs

use crate::error::{Result, SimError};
use crate::io::forecast::{validate_forecast, Forecaster};
use crate::model::queues::DeliveryQueue;
use crate::model::store::{DemandMap, OrderPlan, StockLedger, StoreId};
use crate::simulation::config::{ConsumptionMode, SimulationConfig};
use crate::simulation::metrics::{fill_rate, total_cost};
use crate::strategy::implementations::build_optimizer;
use crate::strategy::traits::OrderOptimizer;
use chrono::{Duration, NaiveDate};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use tracing::{debug, info};

pub const DAYS_PER_WEEK: u32 = 7;

/// One row of the run output.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SimulationRecord {
    pub week_start: NaiveDate,
    pub total_cost: f64,
    pub fill_rate: f64,
}

/// Bookkeeping for a week that the output table does not carry.
#[derive(Debug, Clone, PartialEq)]
pub struct WeekSummary {
    pub week_start: NaiveDate,
    pub demand: DemandMap,
    pub orders: OrderPlan,
    pub units_delivered: u64,
    pub units_consumed: u64,
    pub units_pending: u64,
}

/// A single replenishment run over `[start_date, end_date]`.
///
/// Owns the stock ledger and the delivery queue; nothing is shared between
/// runs, so several runs can proceed side by side.
pub struct InventorySimulation<F: Forecaster> {
    config: SimulationConfig,

    // The Actors
    forecaster: F,
    optimizer: Box<dyn OrderOptimizer>,
    supplier: DeliveryQueue,

    // State
    stores: Vec<StoreId>,
    pub stock: StockLedger,
    pub current_date: NaiveDate,
    pub history: Vec<SimulationRecord>,
    pub weeks: Vec<WeekSummary>,
}

impl<F: Forecaster> InventorySimulation<F> {
    /// Validates the setup and builds the optimizer named by the config.
    pub fn new(config: SimulationConfig, initial_stock: StockLedger, forecaster: F) -> Result<Self> {
        let optimizer = build_optimizer(&config.optimizer)?;
        Self::with_optimizer(config, initial_stock, forecaster, optimizer)
    }

    pub fn with_optimizer(
        config: SimulationConfig,
        initial_stock: StockLedger,
        forecaster: F,
        optimizer: Box<dyn OrderOptimizer>,
    ) -> Result<Self> {
        config.validate()?;
        if initial_stock.is_empty() {
            return Err(SimError::Config("initial stock table has no stores".into()));
        }
        for store in initial_stock.stores() {
            if !forecaster.knows_store(store)? {
                return Err(SimError::UnknownStore(store));
            }
        }

        let supplier = DeliveryQueue::new(config.delivery_delay_days, config.daily_limit);
        let stores = initial_stock.stores().collect();
        let current_date = config.start_date;

        Ok(Self {
            config,
            forecaster,
            optimizer,
            supplier,
            stores,
            stock: initial_stock,
            current_date,
            history: Vec::new(),
            weeks: Vec::new(),
        })
    }

    pub fn config(&self) -> &SimulationConfig {
        &self.config
    }

    pub fn supplier(&self) -> &DeliveryQueue {
        &self.supplier
    }

    pub fn is_finished(&self) -> bool {
        self.current_date > self.config.end_date
    }

    /// Runs every remaining week. The first forecast failure aborts the run.
    pub fn run(&mut self) -> Result<()> {
        info!(
            stores = self.stores.len(),
            start = %self.config.start_date,
            end = %self.config.end_date,
            optimizer = self.optimizer.name(),
            "simulation started"
        );
        while !self.is_finished() {
            self.step()?;
        }
        info!(
            weeks = self.history.len(),
            total_cost = self.total_cost(),
            mean_fill_rate = self.mean_fill_rate(),
            "simulation finished"
        );
        Ok(())
    }

    /// Simulates one week starting at `current_date`.
    ///
    /// Every forecast the week needs is fetched before any order is placed or
    /// any day is processed. On error the run is left exactly as it was, so the
    /// same week can be stepped again.
    pub fn step(&mut self) -> Result<SimulationRecord> {
        let week_start = self.current_date;

        // =================================================================
        // PHASE 1: FORECAST
        // =================================================================
        let mut demands = DemandMap::new();
        let mut daily_sales: BTreeMap<StoreId, Vec<f64>> = BTreeMap::new();
        for &store in &self.stores {
            let weekly = self.forecast(store, week_start, DAYS_PER_WEEK)?;
            demands.insert(store, weekly.iter().sum::<f64>() as u32);

            let sales = match self.config.consumption {
                ConsumptionMode::WeeklyProfile => weekly,
                ConsumptionMode::DailyReforecast => (0..DAYS_PER_WEEK)
                    .map(|offset| {
                        let day = week_start + Duration::days(i64::from(offset));
                        Ok(self.forecast(store, day, 1)?[0])
                    })
                    .collect::<Result<Vec<f64>>>()?,
            };
            daily_sales.insert(store, sales);
        }

        // =================================================================
        // PHASE 2: DECIDE & ORDER
        // =================================================================
        let params = self.config.cost_params();
        let orders = self.optimizer.optimize(&demands, &self.stock, &params)?;
        for (&store, &qty) in &orders {
            self.supplier.place_order(store, qty, week_start);
        }
        debug!(
            %week_start,
            ordered = orders.values().map(|&q| u64::from(q)).sum::<u64>(),
            "weekly orders placed"
        );

        // =================================================================
        // PHASE 3: DAYS (deliver, then sell)
        // =================================================================
        let mut units_delivered = 0;
        let mut units_consumed = 0;
        for day_offset in 0..DAYS_PER_WEEK {
            let day = week_start + Duration::days(i64::from(day_offset));
            units_delivered += self.supplier.process_day(day, &mut self.stock).total();

            for (&store, sales) in &daily_sales {
                let sold = sales[day_offset as usize] as u32;
                units_consumed += u64::from(self.stock.consume(store, sold));
            }
        }

        // =================================================================
        // PHASE 4: RECORD & ADVANCE
        // =================================================================
        let record = SimulationRecord {
            week_start,
            total_cost: total_cost(&self.stock, &demands, params.alpha, params.beta),
            fill_rate: fill_rate(&self.stock, &demands),
        };
        info!(
            %week_start,
            cost = record.total_cost,
            fill_rate = record.fill_rate,
            "week simulated"
        );

        self.weeks.push(WeekSummary {
            week_start,
            demand: demands,
            orders,
            units_delivered,
            units_consumed,
            units_pending: self.supplier.pending_units(),
        });
        self.history.push(record.clone());
        self.current_date = week_start + Duration::days(i64::from(DAYS_PER_WEEK));
        Ok(record)
    }

    fn forecast(&self, store: StoreId, start: NaiveDate, horizon_days: u32) -> Result<Vec<f64>> {
        let values = self.forecaster.predict(store, start, horizon_days)?;
        validate_forecast(store, &values, horizon_days)?;
        Ok(values)
    }

    /// Sum of weekly costs over the run so far.
    pub fn total_cost(&self) -> f64 {
        self.history.iter().map(|record| record.total_cost).sum()
    }

    pub fn mean_fill_rate(&self) -> f64 {
        if self.history.is_empty() {
            return 0.0;
        }
        self.history.iter().map(|record| record.fill_rate).sum::<f64>() / self.history.len() as f64
    }

    pub fn into_history(self) -> Vec<SimulationRecord> {
        self.history
    }
}
