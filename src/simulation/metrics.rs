// src/simulation/metrics.rs

use crate::model::store::{DemandMap, StockLedger};
use crate::strategy::optimization::store_cost;

/// Shortage/overage cost of the stock actually on hand against `demands`.
pub fn total_cost(stock: &StockLedger, demands: &DemandMap, alpha: f64, beta: f64) -> f64 {
    demands
        .iter()
        .map(|(&store, &demand)| store_cost(demand, stock.level(store), 0, alpha, beta))
        .sum()
}

/// Share of demand the stock on hand can cover, `Σ min(s, d) / Σ d`.
///
/// With no demand at all the period counts as fully served.
pub fn fill_rate(stock: &StockLedger, demands: &DemandMap) -> f64 {
    let mut total_demand = 0u64;
    let mut fulfilled = 0u64;
    for (&store, &demand) in demands {
        total_demand += u64::from(demand);
        fulfilled += u64::from(stock.level(store).min(demand));
    }
    if total_demand == 0 {
        return 1.0;
    }
    fulfilled as f64 / total_demand as f64
}
