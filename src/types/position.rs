use serde::{Deserialize, Serialize};

/// A single holding in a client's portfolio.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Position {
    /// Unique within the client's portfolio.
    pub id: i64,
    /// Ticker symbol.
    pub symbol: String,
    /// Units held (may be fractional).
    pub quantity: f64,
    /// Average unit acquisition price.
    pub cost_basis: f64,
    /// Latest unit price.
    pub current_price: f64,
    /// `quantity * current_price`, as supplied by the backend.
    pub market_value: f64,
}

impl Position {
    /// Build a position, deriving `market_value` from quantity and price.
    pub fn new(
        id: i64,
        symbol: impl Into<String>,
        quantity: f64,
        cost_basis: f64,
        current_price: f64,
    ) -> Self {
        Self {
            id,
            symbol: symbol.into(),
            quantity,
            cost_basis,
            current_price,
            market_value: quantity * current_price,
        }
    }

    /// Market value recomputed from quantity and price.
    pub fn computed_market_value(&self) -> f64 {
        self.quantity * self.current_price
    }

    /// Whether the supplied `market_value` agrees with `quantity * current_price`
    /// to within a cent.
    pub fn market_value_consistent(&self) -> bool {
        (self.market_value - self.computed_market_value()).abs() < 0.005
    }

    /// Total acquisition cost of the holding.
    pub fn total_cost(&self) -> f64 {
        self.cost_basis * self.quantity
    }

    /// Copy of this position repriced at `price`.
    pub fn repriced(&self, price: f64) -> Self {
        Self {
            current_price: price,
            market_value: self.quantity * price,
            ..self.clone()
        }
    }

    /// Percentage gain/loss against cost basis.
    ///
    /// `None` when there is no positive cost basis to compare against or the
    /// result is not finite.
    pub fn gain_loss_percent(&self) -> Option<f64> {
        if !(self.cost_basis > 0.0) {
            return None;
        }
        let pct = (self.current_price - self.cost_basis) / self.cost_basis * 100.0;
        pct.is_finite().then_some(pct)
    }

    /// Denormalized snapshot used inside a margin status.
    pub fn snapshot(&self) -> PositionSnapshot {
        PositionSnapshot {
            symbol: self.symbol.clone(),
            quantity: self.quantity,
            current_price: self.current_price,
            position_value: self.market_value,
        }
    }
}

/// Per-symbol snapshot carried by a margin status for display and audit.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PositionSnapshot {
    pub symbol: String,
    pub quantity: f64,
    pub current_price: f64,
    pub position_value: f64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_derives_market_value() {
        let pos = Position::new(1, "AAPL", 100.0, 150.0, 175.0);
        assert_eq!(pos.market_value, 17_500.0);
        assert!(pos.market_value_consistent());
    }

    #[test]
    fn test_repriced_keeps_identity() {
        let pos = Position::new(7, "MSFT", 50.0, 280.0, 285.0);
        let moved = pos.repriced(300.0);

        assert_eq!(moved.id, 7);
        assert_eq!(moved.symbol, "MSFT");
        assert_eq!(moved.cost_basis, 280.0);
        assert_eq!(moved.market_value, 15_000.0);
        assert_eq!(pos.current_price, 285.0);
    }

    #[test]
    fn test_gain_loss_percent() {
        let pos = Position::new(1, "AAPL", 100.0, 150.0, 165.0);
        let pct = pos.gain_loss_percent().unwrap();
        assert!((pct - 10.0).abs() < 1e-9);
    }

    #[test]
    fn test_gain_loss_percent_zero_cost_basis() {
        let gifted = Position::new(2, "SPIN", 10.0, 0.0, 42.0);
        assert_eq!(gifted.gain_loss_percent(), None);

        let negative = Position::new(3, "ODD", 10.0, -1.0, 42.0);
        assert_eq!(negative.gain_loss_percent(), None);
    }

    #[test]
    fn test_deserialize_integer_quantity() {
        let json = r#"{"id":1,"symbol":"AAPL","quantity":100,"cost_basis":150.0,"current_price":155.0,"market_value":15500.0}"#;
        let pos: Position = serde_json::from_str(json).unwrap();
        assert_eq!(pos.quantity, 100.0);
        assert!(pos.market_value_consistent());
    }
}
