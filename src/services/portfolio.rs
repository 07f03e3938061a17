//! Portfolio aggregation: totals, gain/loss, best and worst performers and
//! composition weights. Pure derivations, recomputed on demand.

use crate::types::{CompositionSlice, PortfolioSummary, Position, PositionPerformance};
use tracing::debug;

pub struct PortfolioAggregator;

impl PortfolioAggregator {
    /// Summarize a position list.
    ///
    /// Positions without a positive cost basis still count toward the totals
    /// but are left out of best/worst ranking and reported in `unranked`.
    pub fn summarize(positions: &[Position]) -> PortfolioSummary {
        let total_cost: f64 = positions.iter().map(Position::total_cost).sum();
        let total_value: f64 = positions
            .iter()
            .map(|p| p.current_price * p.quantity)
            .sum();
        let total_gain_loss = total_value - total_cost;
        let total_gain_loss_percent = if total_cost > 0.0 {
            total_gain_loss / total_cost * 100.0
        } else {
            0.0
        };

        let mut best: Option<PositionPerformance> = None;
        let mut worst: Option<PositionPerformance> = None;
        let mut unranked = Vec::new();

        for pos in positions {
            let Some(pct) = pos.gain_loss_percent() else {
                debug!(symbol = %pos.symbol, cost_basis = pos.cost_basis, "Skipping position without usable cost basis");
                unranked.push(pos.symbol.clone());
                continue;
            };
            let perf = PositionPerformance {
                id: pos.id,
                symbol: pos.symbol.clone(),
                gain_loss_percent: pct,
            };

            // strict comparisons keep the first occurrence on ties
            if best.as_ref().map_or(true, |b| pct > b.gain_loss_percent) {
                best = Some(perf.clone());
            }
            if worst.as_ref().map_or(true, |w| pct < w.gain_loss_percent) {
                worst = Some(perf);
            }
        }

        PortfolioSummary {
            total_cost,
            total_value,
            total_gain_loss,
            total_gain_loss_percent,
            best_position: best,
            worst_position: worst,
            unranked,
        }
    }

    /// Share of total market value held in each position, in input order.
    pub fn composition(positions: &[Position]) -> Vec<CompositionSlice> {
        let total: f64 = positions.iter().map(|p| p.market_value).sum();
        positions
            .iter()
            .map(|p| CompositionSlice {
                symbol: p.symbol.clone(),
                market_value: p.market_value,
                weight_percent: if total > 0.0 {
                    p.market_value / total * 100.0
                } else {
                    0.0
                },
            })
            .collect()
    }
}
