//! Weekly retail replenishment simulation.
//!
//! Each simulated week forecasts demand per store, picks order quantities under
//! a shared weekly supply cap, queues the orders with a supplier that has a
//! fixed lead time and a daily throughput limit, sells stock day by day and
//! records cost and fill rate.

pub mod error;
pub mod io;
pub mod model;
pub mod simulation;
pub mod strategy;

pub use error::{ForecastError, Result, SimError};
pub use io::forecast::{ConstantForecaster, Forecaster, HistoricalForecaster};
pub use model::queues::{DeliveryQueue, Order};
pub use model::store::{DemandMap, OrderPlan, StockLedger, StoreId};
pub use simulation::config::{ConsumptionMode, SimulationConfig};
pub use simulation::engine::{InventorySimulation, SimulationRecord};
pub use strategy::implementations::{GeneticOptimizer, GreedyOptimizer};
pub use strategy::optimization::CostParams;
pub use strategy::traits::OrderOptimizer;
