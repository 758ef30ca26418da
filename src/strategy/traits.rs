// src/strategy/traits.rs

use crate::error::Result;
use crate::model::store::{DemandMap, OrderPlan, StockLedger};
use crate::strategy::optimization::CostParams;
use std::fmt::Debug;

/// Decides how much each store should order for the coming period.
///
/// We require `Send` so independent runs (parameter sweeps) can each own an
/// optimizer on their own thread.
pub trait OrderOptimizer: Debug + Send {
    /// Computes an order quantity per store.
    ///
    /// # Arguments
    /// * `demands` - Forecast demand per store for the period.
    /// * `stock` - On-hand stock at decision time. Never mutated.
    /// * `params` - Shortage/overage unit costs and the aggregate cap.
    ///
    /// Every returned quantity lies in `[0, params.q_max]`. Empty inputs give an
    /// empty plan.
    fn optimize(
        &mut self,
        demands: &DemandMap,
        stock: &StockLedger,
        params: &CostParams,
    ) -> Result<OrderPlan>;

    /// Short label for logs.
    fn name(&self) -> &'static str;
}
