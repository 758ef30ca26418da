// src/model/queues.rs

use crate::model::store::{StockLedger, StoreId};
use chrono::{Duration, NaiveDate};
use tracing::{debug, warn};

/// Position of an order in the delivery queue (insertion order).
pub type OrderId = usize;

/// A replenishment order waiting for (or done with) delivery.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Order {
    pub store_id: StoreId,
    pub quantity: u32,
    pub order_date: NaiveDate,
    remaining: u32,
}

impl Order {
    fn new(store_id: StoreId, quantity: u32, order_date: NaiveDate) -> Self {
        Self {
            store_id,
            quantity,
            order_date,
            remaining: quantity,
        }
    }

    pub fn remaining_quantity(&self) -> u32 {
        self.remaining
    }

    pub fn delivered(&self) -> bool {
        self.remaining == 0
    }
}

/// One partial or full shipment released on a given day.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Shipment {
    pub order: OrderId,
    pub store_id: StoreId,
    pub quantity: u32,
}

/// What happened when a day was processed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DayDeliveries {
    pub date: NaiveDate,
    pub shipments: Vec<Shipment>,
    /// False when the date had already been processed and the call did nothing.
    pub processed: bool,
}

impl DayDeliveries {
    pub fn total(&self) -> u64 {
        self.shipments.iter().map(|s| u64::from(s.quantity)).sum()
    }
}

/// Supplier side of the run: fixed lead time, capped daily throughput.
///
/// Orders live in an append-only arena. `active` holds the arena indices of
/// orders that still have units outstanding, in placement order, so delivered
/// orders are never rescanned. Capacity goes to orders strictly FIFO and unused
/// capacity does not roll over to the next day.
#[derive(Debug, Clone)]
pub struct DeliveryQueue {
    orders: Vec<Order>,
    active: Vec<OrderId>,
    lead_time: Duration,
    daily_limit: u32,
    last_processed: Option<NaiveDate>,
}

impl DeliveryQueue {
    pub fn new(lead_time_days: u32, daily_limit: u32) -> Self {
        Self {
            orders: Vec::new(),
            active: Vec::new(),
            lead_time: Duration::days(i64::from(lead_time_days)),
            daily_limit,
            last_processed: None,
        }
    }

    /// Append an order. A zero-quantity order is born delivered.
    pub fn place_order(&mut self, store_id: StoreId, quantity: u32, order_date: NaiveDate) -> OrderId {
        let id = self.orders.len();
        self.orders.push(Order::new(store_id, quantity, order_date));
        if quantity > 0 {
            self.active.push(id);
        }
        debug!(order = id, store = %store_id, quantity, %order_date, "order placed");
        id
    }

    /// Release eligible inventory for `current_date` into `stock`.
    ///
    /// A date that is not after the last processed one is ignored, so a
    /// repeated call can never deliver twice.
    pub fn process_day(&mut self, current_date: NaiveDate, stock: &mut StockLedger) -> DayDeliveries {
        if let Some(last) = self.last_processed {
            if current_date <= last {
                warn!(%current_date, %last, "delivery day already processed, ignoring");
                return DayDeliveries {
                    date: current_date,
                    shipments: Vec::new(),
                    processed: false,
                };
            }
        }
        self.last_processed = Some(current_date);

        let mut capacity = self.daily_limit;
        let mut shipments = Vec::new();

        for &id in &self.active {
            if capacity == 0 {
                break;
            }
            let order = &mut self.orders[id];
            if order.order_date + self.lead_time > current_date {
                continue;
            }
            let to_send = order.remaining.min(capacity);
            stock.receive(order.store_id, to_send);
            order.remaining -= to_send;
            capacity -= to_send;
            shipments.push(Shipment {
                order: id,
                store_id: order.store_id,
                quantity: to_send,
            });
        }

        let orders = &self.orders;
        self.active.retain(|&id| !orders[id].delivered());

        let report = DayDeliveries {
            date: current_date,
            shipments,
            processed: true,
        };
        if !report.shipments.is_empty() {
            debug!(
                %current_date,
                units = report.total(),
                outstanding = self.pending_units(),
                "deliveries released"
            );
        }
        report
    }

    pub fn orders(&self) -> &[Order] {
        &self.orders
    }

    pub fn order(&self, id: OrderId) -> Option<&Order> {
        self.orders.get(id)
    }

    /// Orders with units still outstanding.
    pub fn open_orders(&self) -> impl Iterator<Item = &Order> + '_ {
        self.active.iter().map(move |&id| &self.orders[id])
    }

    pub fn pending_units(&self) -> u64 {
        self.open_orders().map(|o| u64::from(o.remaining)).sum()
    }

    pub fn daily_limit(&self) -> u32 {
        self.daily_limit
    }

    pub fn lead_time_days(&self) -> i64 {
        self.lead_time.num_days()
    }
}
