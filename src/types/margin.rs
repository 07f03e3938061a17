use super::PositionSnapshot;
use serde::{Deserialize, Serialize};
use tracing::warn;

/// Snapshot of one client's account risk state.
///
/// `margin_call_triggered` is not settable: it is always derived from
/// `margin_shortfall`, both when built by the margin calculator and when
/// decoded from the backend.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(from = "MarginStatusWire")]
pub struct MarginStatus {
    portfolio_market_value: f64,
    loan_amount: f64,
    net_equity: f64,
    margin_requirement: f64,
    margin_shortfall: f64,
    margin_call_triggered: bool,
    positions: Vec<PositionSnapshot>,
}

/// Margin status as it appears on the wire.
#[derive(Debug, Clone, Deserialize)]
struct MarginStatusWire {
    portfolio_market_value: f64,
    loan_amount: f64,
    net_equity: f64,
    margin_requirement: f64,
    margin_shortfall: f64,
    #[serde(default)]
    margin_call_triggered: Option<bool>,
    #[serde(default)]
    positions: Vec<PositionSnapshot>,
}

impl From<MarginStatusWire> for MarginStatus {
    fn from(wire: MarginStatusWire) -> Self {
        let status = MarginStatus::from_components(
            wire.portfolio_market_value,
            wire.loan_amount,
            wire.net_equity,
            wire.margin_requirement,
            wire.margin_shortfall,
            wire.positions,
        );

        if let Some(reported) = wire.margin_call_triggered {
            if reported != status.margin_call_triggered {
                warn!(
                    reported,
                    shortfall = status.margin_shortfall,
                    "Backend margin-call flag disagrees with shortfall; using shortfall"
                );
            }
        }

        status
    }
}

impl MarginStatus {
    /// Assemble a status from already-computed components. The call flag is
    /// derived here and nowhere else.
    pub(crate) fn from_components(
        portfolio_market_value: f64,
        loan_amount: f64,
        net_equity: f64,
        margin_requirement: f64,
        margin_shortfall: f64,
        positions: Vec<PositionSnapshot>,
    ) -> Self {
        Self {
            portfolio_market_value,
            loan_amount,
            net_equity,
            margin_requirement,
            margin_shortfall,
            margin_call_triggered: margin_shortfall > 0.0,
            positions,
        }
    }

    pub fn portfolio_market_value(&self) -> f64 {
        self.portfolio_market_value
    }

    pub fn loan_amount(&self) -> f64 {
        self.loan_amount
    }

    pub fn net_equity(&self) -> f64 {
        self.net_equity
    }

    pub fn margin_requirement(&self) -> f64 {
        self.margin_requirement
    }

    /// Requirement minus net equity. Negative means surplus.
    pub fn margin_shortfall(&self) -> f64 {
        self.margin_shortfall
    }

    pub fn margin_call_triggered(&self) -> bool {
        self.margin_call_triggered
    }

    /// Per-symbol snapshot.
    pub fn positions(&self) -> &[PositionSnapshot] {
        &self.positions
    }

    /// Replace the per-symbol snapshot.
    pub fn with_positions(mut self, positions: Vec<PositionSnapshot>) -> Self {
        self.positions = positions;
        self
    }

    /// Amount the account can absorb before a margin call.
    pub fn buffer_before_call(&self) -> f64 {
        (-self.margin_shortfall).max(0.0)
    }
}
