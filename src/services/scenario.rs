//! What-if scenario engine.
//!
//! Applies a hypothetical price move (to every position or one symbol) and a
//! loan override, then re-runs the margin calculator. Inputs are never mutated.

use super::MarginCalculator;
use crate::types::{Position, ScenarioInput, ScenarioResult, ScenarioTarget};

/// Runs margin simulations at a fixed maintenance rate.
#[derive(Debug, Clone, Copy, Default)]
pub struct ScenarioEngine {
    calculator: MarginCalculator,
}

impl ScenarioEngine {
    pub fn new(calculator: MarginCalculator) -> Self {
        Self { calculator }
    }

    pub fn calculator(&self) -> &MarginCalculator {
        &self.calculator
    }

    /// Reprice the targeted positions and recompute market values for all of
    /// them.
    pub fn adjust_positions(positions: &[Position], input: &ScenarioInput) -> Vec<Position> {
        let factor = 1.0 + input.market_change_percent / 100.0;
        positions
            .iter()
            .map(|pos| {
                let price = if input.target.matches(&pos.symbol) {
                    pos.current_price * factor
                } else {
                    pos.current_price
                };
                pos.repriced(price)
            })
            .collect()
    }

    /// Simulate margin status under `input`.
    pub fn simulate(&self, positions: &[Position], input: &ScenarioInput) -> ScenarioResult {
        let adjusted_positions = Self::adjust_positions(positions, input);
        let status = self
            .calculator
            .calculate_for_positions(&adjusted_positions, input.loan_amount);

        ScenarioResult {
            input: input.clone(),
            status,
            adjusted_positions,
        }
    }

    /// Price move (in percent) on `target` at which the margin shortfall
    /// crosses zero for the given loan.
    ///
    /// Shortfall is `loan - (1 - rate) * V`, so the boundary is
    /// `V* = loan / (1 - rate)`. Returns `None` when no move on the target can
    /// reach it: nothing is targeted, or the rate leaves no equity share.
    pub fn breakeven_change_percent(
        &self,
        positions: &[Position],
        target: &ScenarioTarget,
        loan_amount: f64,
    ) -> Option<f64> {
        let equity_share = 1.0 - self.calculator.maintenance_margin_rate();
        if equity_share <= 0.0 {
            return None;
        }

        let (affected, unaffected) = positions.iter().fold((0.0, 0.0), |(hit, miss), pos| {
            let value = pos.computed_market_value();
            if target.matches(&pos.symbol) {
                (hit + value, miss)
            } else {
                (hit, miss + value)
            }
        });
        if affected == 0.0 {
            return None;
        }

        let boundary_value = loan_amount / equity_share;
        let pct = ((boundary_value - unaffected) / affected - 1.0) * 100.0;
        pct.is_finite().then_some(pct)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> Vec<Position> {
        vec![
            Position::new(1, "AAPL", 100.0, 150.0, 175.0),
            Position::new(2, "GOOGL", 50.0, 2_800.0, 2_900.0),
        ]
    }

    #[test]
    fn test_adjust_all() {
        let input = ScenarioInput::new(0.0).with_change(10.0);
        let adjusted = ScenarioEngine::adjust_positions(&sample(), &input);

        assert!((adjusted[0].current_price - 192.5).abs() < 1e-9);
        assert!((adjusted[1].market_value - 159_500.0).abs() < 1e-6);
    }

    #[test]
    fn test_adjust_single_symbol_leaves_others() {
        let input = ScenarioInput::new(0.0).with_change(-20.0).with_target("AAPL");
        let adjusted = ScenarioEngine::adjust_positions(&sample(), &input);

        assert!((adjusted[0].current_price - 140.0).abs() < 1e-9);
        assert_eq!(adjusted[1].current_price, 2_900.0);
        assert_eq!(adjusted[1].market_value, 145_000.0);
    }

    #[test]
    fn test_simulate_does_not_mutate_input() {
        let positions = sample();
        let before = positions.clone();
        let input = ScenarioInput::new(50_000.0).with_change(-30.0);

        let _ = ScenarioEngine::default().simulate(&positions, &input);
        assert_eq!(positions, before);
    }

    #[test]
    fn test_unknown_symbol_changes_nothing() {
        let engine = ScenarioEngine::default();
        let input = ScenarioInput::new(50_000.0).with_change(-50.0).with_target("TSLA");
        let result = engine.simulate(&sample(), &input);

        assert_eq!(result.status.portfolio_market_value(), 162_500.0);
        assert_eq!(
            engine.breakeven_change_percent(&sample(), &input.target, 50_000.0),
            None
        );
    }

    #[test]
    fn test_breakeven_without_equity_share() {
        let engine = ScenarioEngine::new(MarginCalculator::new(1.0));
        assert_eq!(
            engine.breakeven_change_percent(&sample(), &ScenarioTarget::All, 50_000.0),
            None
        );
    }
}
