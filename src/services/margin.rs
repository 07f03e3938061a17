//! Margin calculator.
//!
//! The one place margin status is computed on the client. The scenario
//! simulator and the fallback dataset both go through it.

use crate::config::DEFAULT_MAINTENANCE_MARGIN_RATE;
use crate::types::{MarginStatus, Position};
use std::fmt;

/// Computes margin status from portfolio value and loan balance.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MarginCalculator {
    maintenance_margin_rate: f64,
}

impl MarginCalculator {
    /// Create a calculator for the given maintenance rate (fraction in (0, 1)).
    pub fn new(maintenance_margin_rate: f64) -> Self {
        Self {
            maintenance_margin_rate,
        }
    }

    pub fn maintenance_margin_rate(&self) -> f64 {
        self.maintenance_margin_rate
    }

    /// Compute a margin status. Inputs are taken as-is: negative or zero values
    /// propagate arithmetically.
    pub fn compute(
        portfolio_market_value: f64,
        loan_amount: f64,
        maintenance_margin_rate: f64,
    ) -> MarginStatus {
        let net_equity = portfolio_market_value - loan_amount;
        let margin_requirement = maintenance_margin_rate * portfolio_market_value;
        let margin_shortfall = margin_requirement - net_equity;

        MarginStatus::from_components(
            portfolio_market_value,
            loan_amount,
            net_equity,
            margin_requirement,
            margin_shortfall,
            Vec::new(),
        )
    }

    /// Compute a margin status at this calculator's rate.
    pub fn calculate(&self, portfolio_market_value: f64, loan_amount: f64) -> MarginStatus {
        Self::compute(
            portfolio_market_value,
            loan_amount,
            self.maintenance_margin_rate,
        )
    }

    /// Compute a margin status for a position list, summing the positions'
    /// market values and attaching their snapshot.
    pub fn calculate_for_positions(&self, positions: &[Position], loan_amount: f64) -> MarginStatus {
        let portfolio_market_value: f64 = positions.iter().map(|p| p.market_value).sum();
        self.calculate(portfolio_market_value, loan_amount)
            .with_positions(positions.iter().map(Position::snapshot).collect())
    }
}

impl Default for MarginCalculator {
    fn default() -> Self {
        Self::new(DEFAULT_MAINTENANCE_MARGIN_RATE)
    }
}

/// Display classification of a margin status.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HealthLevel {
    Healthy,
    Caution,
    AtRisk,
    MarginCall,
}

impl HealthLevel {
    /// Classify a status, using its health percentage.
    pub fn classify(status: &MarginStatus) -> Self {
        if status.margin_call_triggered() {
            return HealthLevel::MarginCall;
        }
        let health = health_percentage(status);
        if health > 50.0 {
            HealthLevel::Healthy
        } else if health > 20.0 {
            HealthLevel::Caution
        } else {
            HealthLevel::AtRisk
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            HealthLevel::Healthy => "HEALTHY",
            HealthLevel::Caution => "CAUTION",
            HealthLevel::AtRisk => "AT RISK",
            HealthLevel::MarginCall => "MARGIN CALL",
        }
    }
}

impl fmt::Display for HealthLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Equity buffer above the requirement as a percentage of the requirement,
/// clamped to `[0, 100]` for display.
pub fn health_percentage(status: &MarginStatus) -> f64 {
    let requirement = status.margin_requirement();
    let buffer = status.net_equity() - requirement;
    if buffer <= 0.0 {
        return 0.0;
    }
    if requirement == 0.0 {
        return 100.0;
    }
    // a negative requirement gives a negative ratio, shown as zero health
    (buffer / requirement * 100.0).clamp(0.0, 100.0)
}
