//! HTTP client for the risk monitoring backend.

use super::{BoxFuture, RiskDataSource};
use crate::config::Config;
use crate::error::{AppError, Result};
use crate::types::{
    ApiErrorBody, IncreaseLoanRequest, LoanResponse, MarginStatus, MarketQuote, PayLoanRequest,
    Position,
};
use reqwest::{Client, Response};
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::time::Duration;
use tracing::{debug, warn};

/// Risk backend API client.
#[derive(Debug, Clone)]
pub struct RiskApiClient {
    client: Client,
    base_url: String,
}

impl RiskApiClient {
    /// Create a client for `base_url` (including the `/api` prefix).
    pub fn new(base_url: impl Into<String>, timeout: Duration) -> Result<Self> {
        let client = Client::builder().timeout(timeout).build()?;
        Ok(Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
        })
    }

    /// Create a client from application configuration.
    pub fn from_config(config: &Config) -> Result<Self> {
        Self::new(config.api_base_url.clone(), config.request_timeout)
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Get positions for a client.
    pub async fn positions(&self, client_id: u64) -> Result<Vec<Position>> {
        let positions: Vec<Position> = self.get_json(&format!("/positions/{}", client_id)).await?;
        for pos in positions.iter().filter(|p| !p.market_value_consistent()) {
            warn!(
                symbol = %pos.symbol,
                market_value = pos.market_value,
                computed = pos.computed_market_value(),
                "Position market value disagrees with quantity * price"
            );
        }
        Ok(positions)
    }

    /// Get margin status for a client.
    pub async fn margin_status(&self, client_id: u64) -> Result<MarginStatus> {
        self.get_json(&format!("/margin-status/{}", client_id)).await
    }

    /// Get latest market data.
    pub async fn market_data(&self) -> Result<Vec<MarketQuote>> {
        self.get_json("/market-data").await
    }

    /// Pay down a client's loan.
    pub async fn pay(&self, request: &PayLoanRequest) -> Result<LoanResponse> {
        self.post_json("/loan/pay", request).await
    }

    /// Increase a client's loan.
    pub async fn increase(&self, request: &IncreaseLoanRequest) -> Result<LoanResponse> {
        self.post_json("/loan/increase", request).await
    }

    async fn get_json<T: DeserializeOwned>(&self, path: &str) -> Result<T> {
        let url = format!("{}{}", self.base_url, path);
        debug!("GET {}", url);

        let response = self.client.get(&url).send().await?;
        Self::decode(response).await
    }

    async fn post_json<B: Serialize, T: DeserializeOwned>(&self, path: &str, body: &B) -> Result<T> {
        let url = format!("{}{}", self.base_url, path);
        debug!("POST {}", url);

        let response = self.client.post(&url).json(body).send().await?;
        Self::decode(response).await
    }

    async fn decode<T: DeserializeOwned>(response: Response) -> Result<T> {
        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            let message = serde_json::from_str::<ApiErrorBody>(&body)
                .map(|b| b.error)
                .unwrap_or_else(|_| {
                    if body.trim().is_empty() {
                        status.canonical_reason().unwrap_or("request failed").to_string()
                    } else {
                        body
                    }
                });
            return Err(AppError::Api {
                status: status.as_u16(),
                message,
            });
        }

        let bytes = response.bytes().await?;
        Ok(serde_json::from_slice(&bytes)?)
    }
}

impl RiskDataSource for RiskApiClient {
    fn fetch_positions(&self, client_id: u64) -> BoxFuture<'_, Result<Vec<Position>>> {
        Box::pin(self.positions(client_id))
    }

    fn fetch_margin_status(&self, client_id: u64) -> BoxFuture<'_, Result<MarginStatus>> {
        Box::pin(self.margin_status(client_id))
    }

    fn fetch_market_data(&self) -> BoxFuture<'_, Result<Vec<MarketQuote>>> {
        Box::pin(self.market_data())
    }

    fn pay_loan(&self, request: PayLoanRequest) -> BoxFuture<'_, Result<LoanResponse>> {
        Box::pin(async move { self.pay(&request).await })
    }

    fn increase_loan(&self, request: IncreaseLoanRequest) -> BoxFuture<'_, Result<LoanResponse>> {
        Box::pin(async move { self.increase(&request).await })
    }
}
