//! Data sources for positions, margin status, market data and loan operations.

pub mod risk_api;

pub use risk_api::RiskApiClient;

use crate::error::Result;
use crate::types::{
    IncreaseLoanRequest, LoanResponse, MarginStatus, MarketQuote, PayLoanRequest, Position,
};
use std::future::Future;
use std::pin::Pin;

/// Boxed future returned by data source methods.
pub type BoxFuture<'a, T> = Pin<Box<dyn Future<Output = T> + Send + 'a>>;

/// Backend operations the dashboard depends on.
pub trait RiskDataSource: Send + Sync {
    /// Current positions for a client.
    fn fetch_positions(&self, client_id: u64) -> BoxFuture<'_, Result<Vec<Position>>>;

    /// Server-computed margin status for a client.
    fn fetch_margin_status(&self, client_id: u64) -> BoxFuture<'_, Result<MarginStatus>>;

    /// Latest stored market prices.
    fn fetch_market_data(&self) -> BoxFuture<'_, Result<Vec<MarketQuote>>>;

    /// Pay down part of the outstanding loan.
    fn pay_loan(&self, request: PayLoanRequest) -> BoxFuture<'_, Result<LoanResponse>>;

    /// Borrow more against the portfolio.
    fn increase_loan(&self, request: IncreaseLoanRequest) -> BoxFuture<'_, Result<LoanResponse>>;
}
