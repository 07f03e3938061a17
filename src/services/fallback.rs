//! Designated fallback dataset, shown when a refresh fails and nothing has
//! been fetched yet.

use super::MarginCalculator;
use crate::types::{MarginStatus, Position};

/// Loan balance of the fallback account.
const FALLBACK_LOAN_AMOUNT: f64 = 50_000.0;

/// Positions and margin status to fall back to.
#[derive(Debug, Clone, PartialEq)]
pub struct FallbackDataset {
    pub positions: Vec<Position>,
    pub margin_status: MarginStatus,
}

impl FallbackDataset {
    /// Build a dataset from positions and a loan, deriving the margin status
    /// with `calculator`.
    pub fn new(positions: Vec<Position>, loan_amount: f64, calculator: &MarginCalculator) -> Self {
        let margin_status = calculator.calculate_for_positions(&positions, loan_amount);
        Self {
            positions,
            margin_status,
        }
    }

    /// Demo portfolio: 100 AAPL and 50 GOOGL against a 50k loan.
    pub fn demo(calculator: &MarginCalculator) -> Self {
        Self::new(
            vec![
                Position::new(1, "AAPL", 100.0, 150.0, 175.0),
                Position::new(2, "GOOGL", 50.0, 2_800.0, 2_900.0),
            ],
            FALLBACK_LOAN_AMOUNT,
            calculator,
        )
    }
}

impl Default for FallbackDataset {
    fn default() -> Self {
        Self::demo(&MarginCalculator::default())
    }
}
