use super::{MarginStatus, Position};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Wildcard target meaning "every position".
pub const ALL_POSITIONS: &str = "all";

/// Which positions a simulated price shock applies to.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(from = "String", into = "String")]
pub enum ScenarioTarget {
    #[default]
    All,
    Symbol(String),
}

impl ScenarioTarget {
    /// Whether the shock applies to a position with this symbol.
    pub fn matches(&self, symbol: &str) -> bool {
        match self {
            ScenarioTarget::All => true,
            ScenarioTarget::Symbol(target) => target == symbol,
        }
    }
}

impl From<String> for ScenarioTarget {
    fn from(value: String) -> Self {
        if value == ALL_POSITIONS {
            ScenarioTarget::All
        } else {
            ScenarioTarget::Symbol(value)
        }
    }
}

impl From<&str> for ScenarioTarget {
    fn from(value: &str) -> Self {
        ScenarioTarget::from(value.to_string())
    }
}

impl From<ScenarioTarget> for String {
    fn from(target: ScenarioTarget) -> Self {
        target.to_string()
    }
}

impl fmt::Display for ScenarioTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ScenarioTarget::All => write!(f, "{}", ALL_POSITIONS),
            ScenarioTarget::Symbol(symbol) => write!(f, "{}", symbol),
        }
    }
}

/// Inputs for one what-if simulation run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScenarioInput {
    /// Signed percentage move applied as `price * (1 + pct / 100)`.
    pub market_change_percent: f64,
    #[serde(rename = "targetSymbol")]
    pub target: ScenarioTarget,
    /// Loan balance to simulate with.
    pub loan_amount: f64,
}

impl ScenarioInput {
    /// Neutral input: no price move, all positions, the given loan.
    pub fn new(loan_amount: f64) -> Self {
        Self {
            market_change_percent: 0.0,
            target: ScenarioTarget::All,
            loan_amount,
        }
    }

    /// Neutral input seeded with the live loan balance.
    pub fn from_status(status: &MarginStatus) -> Self {
        Self::new(status.loan_amount())
    }

    pub fn with_change(mut self, market_change_percent: f64) -> Self {
        self.market_change_percent = market_change_percent;
        self
    }

    pub fn with_target(mut self, target: impl Into<ScenarioTarget>) -> Self {
        self.target = target.into();
        self
    }

    pub fn with_loan(mut self, loan_amount: f64) -> Self {
        self.loan_amount = loan_amount;
        self
    }

    /// Step the price move by `delta`, keeping it inside `[-limit, limit]`.
    pub fn nudge_change(&mut self, delta: f64, limit: f64) {
        self.market_change_percent = (self.market_change_percent + delta).clamp(-limit, limit);
    }

    /// Step the loan override by `delta`, never below zero.
    pub fn nudge_loan(&mut self, delta: f64) {
        self.loan_amount = (self.loan_amount + delta).max(0.0);
    }
}

/// Outcome of a simulation run.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ScenarioResult {
    /// The input the result was computed from.
    pub input: ScenarioInput,
    /// Simulated margin status; its position snapshot carries adjusted prices.
    pub status: MarginStatus,
    /// Positions with adjusted prices and recomputed market values.
    pub adjusted_positions: Vec<Position>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_target_matches() {
        assert!(ScenarioTarget::All.matches("AAPL"));
        assert!(ScenarioTarget::from("AAPL").matches("AAPL"));
        assert!(!ScenarioTarget::from("AAPL").matches("MSFT"));
    }

    #[test]
    fn test_wildcard_is_case_sensitive() {
        // "ALL" is a real ticker, only lowercase "all" is the wildcard
        assert_eq!(ScenarioTarget::from("all"), ScenarioTarget::All);
        assert_eq!(
            ScenarioTarget::from("ALL"),
            ScenarioTarget::Symbol("ALL".to_string())
        );
    }

    #[test]
    fn test_input_serialization() {
        let input = ScenarioInput::new(50_000.0)
            .with_change(-10.0)
            .with_target("GOOGL");
        let value = serde_json::to_value(&input).unwrap();

        assert_eq!(value["marketChangePercent"], -10.0);
        assert_eq!(value["targetSymbol"], "GOOGL");
        assert_eq!(value["loanAmount"], 50_000.0);

        let parsed: ScenarioInput = serde_json::from_value(value).unwrap();
        assert_eq!(parsed, input);
    }

    #[test]
    fn test_nudge_change_clamps() {
        let mut input = ScenarioInput::new(0.0);
        for _ in 0..80 {
            input.nudge_change(1.0, 50.0);
        }
        assert_eq!(input.market_change_percent, 50.0);

        input.nudge_change(-200.0, 50.0);
        assert_eq!(input.market_change_percent, -50.0);
    }

    #[test]
    fn test_nudge_loan_floor() {
        let mut input = ScenarioInput::new(500.0);
        input.nudge_loan(-1_000.0);
        assert_eq!(input.loan_amount, 0.0);
    }
}
