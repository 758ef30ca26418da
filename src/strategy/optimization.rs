// src/strategy/optimization.rs

//! Cost model shared by the order optimizers.
//!
//! A candidate order vector is scored with a newsvendor-style piecewise linear
//! cost: every unit of demand left uncovered costs `alpha`, every unit left on
//! the shelf costs `beta`, and every unit ordered above the aggregate cap costs
//! [`CAP_PENALTY_PER_UNIT`].

use crate::error::{Result, SimError};
use crate::model::store::{DemandMap, StockLedger, StoreId};
use serde::{Deserialize, Serialize};

/// Penalty per unit ordered beyond `q_max` in a period.
pub const CAP_PENALTY_PER_UNIT: f64 = 1000.0;

/// Unit costs and the aggregate order cap for one optimization.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CostParams {
    /// Cost per unit of unmet demand.
    pub alpha: f64,
    /// Cost per unit of leftover stock.
    pub beta: f64,
    /// Maximum total units orderable in the period.
    pub q_max: u32,
}

impl CostParams {
    pub fn new(alpha: f64, beta: f64, q_max: u32) -> Result<Self> {
        let params = Self { alpha, beta, q_max };
        params.validate()?;
        Ok(params)
    }

    pub fn validate(&self) -> Result<()> {
        if !self.alpha.is_finite() || self.alpha < 0.0 {
            return Err(SimError::CostParams(format!(
                "alpha must be a non-negative number, got {}",
                self.alpha
            )));
        }
        if !self.beta.is_finite() || self.beta < 0.0 {
            return Err(SimError::CostParams(format!(
                "beta must be a non-negative number, got {}",
                self.beta
            )));
        }
        Ok(())
    }
}

/// Shortage and overage cost for one store once `ordered` units are on hand.
pub fn store_cost(demand: u32, stock: u32, ordered: u32, alpha: f64, beta: f64) -> f64 {
    let available = u64::from(stock) + u64::from(ordered);
    let demand = u64::from(demand);
    let deficit = demand.saturating_sub(available);
    let overage = available.saturating_sub(demand);
    alpha * deficit as f64 + beta * overage as f64
}

/// Penalty for exceeding the aggregate cap.
pub fn cap_penalty(total_ordered: u64, q_max: u32) -> f64 {
    total_ordered.saturating_sub(u64::from(q_max)) as f64 * CAP_PENALTY_PER_UNIT
}

/// A fixed optimization instance: stores in a stable order with their demand
/// and decision-time stock.
#[derive(Debug, Clone, PartialEq)]
pub struct Problem {
    pub stores: Vec<StoreId>,
    pub demand: Vec<u32>,
    pub stock: Vec<u32>,
    pub params: CostParams,
}

impl Problem {
    /// Builds an instance over the union of stores in `demands` and `stock`.
    /// A store missing from either side counts as zero there.
    pub fn new(
        demands: &DemandMap,
        stock: &StockLedger,
        params: CostParams,
    ) -> Self {
        let mut stores: Vec<StoreId> = demands.keys().copied().chain(stock.stores()).collect();
        stores.sort_unstable();
        stores.dedup();

        let demand = stores
            .iter()
            .map(|id| demands.get(id).copied().unwrap_or(0))
            .collect();
        let stock_levels = stores.iter().map(|id| stock.level(*id)).collect();

        Self {
            stores,
            demand,
            stock: stock_levels,
            params,
        }
    }

    pub fn len(&self) -> usize {
        self.stores.len()
    }

    pub fn is_empty(&self) -> bool {
        self.stores.is_empty()
    }

    /// Full objective for a candidate order vector (same order as `stores`).
    pub fn cost(&self, orders: &[u32]) -> f64 {
        let CostParams { alpha, beta, q_max } = self.params;
        let mut cost = 0.0;
        for ((&d, &s), &q) in self.demand.iter().zip(&self.stock).zip(orders) {
            cost += store_cost(d, s, q, alpha, beta);
        }
        let total: u64 = orders.iter().map(|&q| u64::from(q)).sum();
        cost + cap_penalty(total, q_max)
    }

    /// Per-store shortfall `max(demand - stock, 0)`.
    pub fn shortfall(&self) -> Vec<u32> {
        self.demand
            .iter()
            .zip(&self.stock)
            .map(|(&d, &s)| d.saturating_sub(s))
            .collect()
    }
}
