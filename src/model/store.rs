// src/model/store.rs

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// Store identifier, as it appears in the `Store` column of the input tables.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct StoreId(pub u32);

impl fmt::Display for StoreId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(&self.0, f)
    }
}

/// Demand per store for one period (units).
pub type DemandMap = BTreeMap<StoreId, u32>;

/// Order quantity per store, as returned by an optimizer.
pub type OrderPlan = BTreeMap<StoreId, u32>;

/// On-hand stock of every store in one simulation run.
///
/// The ledger is owned by the run. The delivery queue only ever sees it through
/// `&mut StockLedger` while processing a day, and the loop consumes from it
/// afterwards; quantities can never go below zero.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StockLedger {
    levels: BTreeMap<StoreId, u32>,
}

impl StockLedger {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_levels<I>(levels: I) -> Self
    where
        I: IntoIterator<Item = (StoreId, u32)>,
    {
        Self {
            levels: levels.into_iter().collect(),
        }
    }

    /// Current stock of a store; unknown stores hold nothing.
    pub fn level(&self, store: StoreId) -> u32 {
        self.levels.get(&store).copied().unwrap_or(0)
    }

    pub fn contains(&self, store: StoreId) -> bool {
        self.levels.contains_key(&store)
    }

    /// Goods arrive from the supplier.
    pub fn receive(&mut self, store: StoreId, quantity: u32) {
        let level = self.levels.entry(store).or_insert(0);
        *level = level.saturating_add(quantity);
    }

    /// Sell up to `quantity` units.
    ///
    /// Returns what was actually taken off the shelf; unmet demand is lost,
    /// not backlogged.
    pub fn consume(&mut self, store: StoreId, quantity: u32) -> u32 {
        match self.levels.get_mut(&store) {
            Some(level) => {
                let taken = (*level).min(quantity);
                *level -= taken;
                taken
            }
            None => 0,
        }
    }

    pub fn stores(&self) -> impl Iterator<Item = StoreId> + '_ {
        self.levels.keys().copied()
    }

    pub fn iter(&self) -> impl Iterator<Item = (StoreId, u32)> + '_ {
        self.levels.iter().map(|(id, qty)| (*id, *qty))
    }

    pub fn len(&self) -> usize {
        self.levels.len()
    }

    pub fn is_empty(&self) -> bool {
        self.levels.is_empty()
    }

    pub fn total_units(&self) -> u64 {
        self.levels.values().map(|&q| u64::from(q)).sum()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn consume_clamps_at_zero() {
        let mut ledger = StockLedger::from_levels([(StoreId(1), 30)]);
        assert_eq!(ledger.consume(StoreId(1), 50), 30);
        assert_eq!(ledger.level(StoreId(1)), 0);
        assert_eq!(ledger.consume(StoreId(1), 10), 0);
    }

    #[test]
    fn receive_adds_and_creates_missing_stores() {
        let mut ledger = StockLedger::from_levels([(StoreId(1), 5)]);
        ledger.receive(StoreId(1), 10);
        ledger.receive(StoreId(2), 7);
        assert_eq!(ledger.level(StoreId(1)), 15);
        assert_eq!(ledger.level(StoreId(2)), 7);
        assert_eq!(ledger.total_units(), 22);
    }

    #[test]
    fn unknown_store_has_no_stock() {
        let mut ledger = StockLedger::new();
        assert_eq!(ledger.level(StoreId(9)), 0);
        assert_eq!(ledger.consume(StoreId(9), 3), 0);
        assert!(!ledger.contains(StoreId(9)));
    }
}
