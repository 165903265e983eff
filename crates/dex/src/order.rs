//! Order types and management.

use crate::types::{Address, Amount, Price};
use std::fmt;

/// Unique identifier for an order.
///
/// Ids are assigned per book in arrival sequence, starting at 1.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct OrderId(pub u64);

impl fmt::Display for OrderId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Side of the order (buy or sell).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum OrderSide {
    /// Buy order: offers quote token for base token.
    Buy,
    /// Sell order: offers base token for quote token.
    Sell,
}

impl OrderSide {
    pub fn opposite(&self) -> Self {
        match self {
            OrderSide::Buy => OrderSide::Sell,
            OrderSide::Sell => OrderSide::Buy,
        }
    }
}

/// Status of an order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OrderStatus {
    /// Order is open and can be matched.
    Open,
    /// Order has been partially filled.
    PartiallyFilled,
    /// Order has been completely filled.
    Filled,
    /// Order has been cancelled.
    Cancelled,
}

/// A resting order in the book.
///
/// Amounts are in the token the order offers: quote units for buys, base
/// units for sells.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Order {
    /// Unique order identifier.
    pub id: OrderId,
    /// Address that submitted the order.
    pub owner: Address,
    /// Address receiving fill proceeds and refunds.
    pub beneficiary: Address,
    /// Buy or sell.
    pub side: OrderSide,
    /// Limit price.
    pub price: Price,
    pub amount_offered: Amount,
    pub amount_remaining: Amount,
    /// Current status of the order.
    pub status: OrderStatus,
}

impl Order {
    pub fn new(id: OrderId, owner: Address, beneficiary: Address, side: OrderSide, price: Price, amount: Amount) -> Self {
        Self {
            id,
            owner,
            beneficiary,
            side,
            price,
            amount_offered: amount,
            amount_remaining: amount,
            status: OrderStatus::Open,
        }
    }

    /// Check if the order is still active (can be matched).
    pub fn is_active(&self) -> bool {
        matches!(self.status, OrderStatus::Open | OrderStatus::PartiallyFilled)
    }

    /// Fill some amount of the order.
    pub fn fill(&mut self, amount: Amount) {
        self.amount_remaining = self.amount_remaining.saturating_sub(amount);
        if self.amount_remaining.is_zero() {
            self.status = OrderStatus::Filled;
        } else {
            self.status = OrderStatus::PartiallyFilled;
        }
    }

    /// Close the order with whatever remains unfilled, returning it.
    pub fn close(&mut self, status: OrderStatus) -> Amount {
        let remaining = self.amount_remaining;
        self.amount_remaining = Amount::ZERO;
        self.status = status;
        remaining
    }

    /// Get the filled amount.
    pub fn filled_amount(&self) -> Amount {
        self.amount_offered.saturating_sub(self.amount_remaining)
    }
}
