//! # Order Ledger
//!
//! In-memory copy of the orders the front-end is currently showing.
//!
//! Commands that write orders also patch the ledger, so dependent views
//! (the pedidos list, a stock item's sales) reflect a sale or conversion
//! without reloading from the database.
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    Ledger Operations                                    │
//! │                                                                         │
//! │  Command                     Ledger Change                              │
//! │  ───────                     ─────────────                              │
//! │  list_orders ──────────────► replace(page.items)                        │
//! │  sell_from_stock ──────────► upsert(order)                              │
//! │  convert_quote ────────────► upsert(pedido), upsert(quote)              │
//! │  update_order_* ───────────► upsert(order)                              │
//! │  delete_order ─────────────► remove(id)                                 │
//! │  get_ledger ───────────────► (read only)                                │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use std::sync::{Arc, Mutex, PoisonError};

use atelie_core::OrderRecord;

/// Orders currently loaded, newest first.
#[derive(Debug, Clone, Default)]
pub struct OrderLedger {
    orders: Arc<Mutex<Vec<OrderRecord>>>,
}

impl OrderLedger {
    pub fn new() -> Self {
        Self::default()
    }

    /// Executes a function with read access to the loaded orders.
    pub fn with_orders<F, R>(&self, f: F) -> R
    where
        F: FnOnce(&[OrderRecord]) -> R,
    {
        let orders = self.orders.lock().unwrap_or_else(PoisonError::into_inner);
        f(&orders)
    }

    fn with_orders_mut<F, R>(&self, f: F) -> R
    where
        F: FnOnce(&mut Vec<OrderRecord>) -> R,
    {
        let mut orders = self.orders.lock().unwrap_or_else(PoisonError::into_inner);
        f(&mut orders)
    }

    /// Replaces the ledger with a freshly listed page.
    pub fn replace(&self, fresh: Vec<OrderRecord>) {
        self.with_orders_mut(|orders| *orders = fresh);
    }

    /// Inserts a new order at the top, or updates it in place.
    pub fn upsert(&self, order: OrderRecord) {
        self.with_orders_mut(|orders| match orders.iter_mut().find(|o| o.id == order.id) {
            Some(existing) => *existing = order,
            None => orders.insert(0, order),
        });
    }

    pub fn remove(&self, id: &str) -> bool {
        self.with_orders_mut(|orders| {
            let before = orders.len();
            orders.retain(|o| o.id != id);
            orders.len() != before
        })
    }

    pub fn snapshot(&self) -> Vec<OrderRecord> {
        self.with_orders(|orders| orders.to_vec())
    }

    pub fn len(&self) -> usize {
        self.with_orders(|orders| orders.len())
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
