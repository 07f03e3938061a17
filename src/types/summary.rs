use serde::{Deserialize, Serialize};

/// Gain/loss of one position against its cost basis.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PositionPerformance {
    pub id: i64,
    pub symbol: String,
    pub gain_loss_percent: f64,
}

/// Aggregate metrics over a position list.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PortfolioSummary {
    pub total_cost: f64,
    pub total_value: f64,
    pub total_gain_loss: f64,
    pub total_gain_loss_percent: f64,
    pub best_position: Option<PositionPerformance>,
    pub worst_position: Option<PositionPerformance>,
    /// Symbols left out of best/worst ranking because they have no usable
    /// cost basis.
    pub unranked: Vec<String>,
}

/// Share of portfolio value held in one position.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CompositionSlice {
    pub symbol: String,
    pub market_value: f64,
    pub weight_percent: f64,
}
