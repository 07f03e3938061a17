//! HTTP client tests against a mock backend.

use margin_monitor::error::AppError;
use margin_monitor::services::{LoanManager, MarginCalculator};
use margin_monitor::sources::{RiskApiClient, RiskDataSource};
use margin_monitor::types::{IncreaseLoanRequest, LoanAction, PayLoanRequest};
use serde_json::json;
use std::sync::Arc;
use std::time::Duration;
use tokio_test::{assert_err, assert_ok};
use wiremock::matchers::{body_json, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

async fn client(server: &MockServer) -> RiskApiClient {
    RiskApiClient::new(format!("{}/api", server.uri()), Duration::from_secs(5)).unwrap()
}

#[tokio::test]
async fn test_fetch_positions() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/positions/1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            {
                "id": 1,
                "symbol": "AAPL",
                "quantity": 100.0,
                "cost_basis": 150.0,
                "current_price": 175.0,
                "market_value": 17500.0
            },
            {
                "id": 2,
                "symbol": "GOOGL",
                "quantity": 50.0,
                "cost_basis": 2800.0,
                "current_price": 2900.0,
                "market_value": 145000.0
            }
        ])))
        .expect(1)
        .mount(&server)
        .await;

    let positions = assert_ok!(client(&server).await.fetch_positions(1).await);
    assert_eq!(positions.len(), 2);
    assert_eq!(positions[0].symbol, "AAPL");
    assert_eq!(positions[1].market_value, 145_000.0);
}

#[tokio::test]
async fn test_fetch_margin_status() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/margin-status/1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "portfolio_market_value": 162500.0,
            "loan_amount": 50000.0,
            "net_equity": 112500.0,
            "margin_requirement": 40625.0,
            "margin_shortfall": -71875.0,
            "margin_call_triggered": false,
            "positions": [
                {"symbol": "AAPL", "quantity": 100.0, "current_price": 175.0, "position_value": 17500.0}
            ]
        })))
        .mount(&server)
        .await;

    let status = assert_ok!(client(&server).await.fetch_margin_status(1).await);
    assert_eq!(status.net_equity(), 112_500.0);
    assert!(!status.margin_call_triggered());
    assert_eq!(status.positions()[0].position_value, 17_500.0);
}

#[tokio::test]
async fn test_fetch_market_data() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/market-data"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            {"symbol": "AAPL", "current_price": 176.25, "timestamp": "Sun, 18 Oct 2026 09:30:00 GMT"}
        ])))
        .mount(&server)
        .await;

    let quotes = assert_ok!(client(&server).await.fetch_market_data().await);
    assert_eq!(quotes.len(), 1);
    assert_eq!(quotes[0].current_price, 176.25);
    assert!(quotes[0].timestamp_utc().is_some());
}

#[tokio::test]
async fn test_not_found_error_body() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/margin-status/99"))
        .respond_with(
            ResponseTemplate::new(404)
                .set_body_json(json!({"error": "Margin information not found for this client"})),
        )
        .mount(&server)
        .await;

    let err = assert_err!(client(&server).await.fetch_margin_status(99).await);
    match err {
        AppError::Api { status, message } => {
            assert_eq!(status, 404);
            assert_eq!(message, "Margin information not found for this client");
        }
        other => panic!("unexpected error: {other:?}"),
    }
}

#[tokio::test]
async fn test_plain_text_error_body() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/positions/1"))
        .respond_with(ResponseTemplate::new(500).set_body_string("boom"))
        .mount(&server)
        .await;

    let err = client(&server).await.fetch_positions(1).await.unwrap_err();
    assert!(err.is_fetch_failure());
    assert!(matches!(err, AppError::Api { status: 500, ref message } if message == "boom"));
}

#[tokio::test]
async fn test_empty_error_body_uses_reason() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/positions/1"))
        .respond_with(ResponseTemplate::new(503))
        .mount(&server)
        .await;

    let err = client(&server).await.fetch_positions(1).await.unwrap_err();
    assert!(matches!(err, AppError::Api { status: 503, ref message } if message == "Service Unavailable"));
}

#[tokio::test]
async fn test_malformed_payload() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/positions/1"))
        .respond_with(ResponseTemplate::new(200).set_body_string("not json"))
        .mount(&server)
        .await;

    let err = client(&server).await.fetch_positions(1).await.unwrap_err();
    assert!(matches!(err, AppError::SerdeJson(_)));
    assert!(err.is_fetch_failure());
}

#[tokio::test]
async fn test_pay_loan_request_body() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/loan/pay"))
        .and(body_json(json!({"client_id": 1, "payment_amount": 5000.0})))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "message": "Loan payment successful",
            "new_loan_amount": 45000.0
        })))
        .expect(1)
        .mount(&server)
        .await;

    let response = client(&server)
        .await
        .pay_loan(PayLoanRequest {
            client_id: 1,
            payment_amount: 5_000.0,
        })
        .await
        .unwrap();
    assert_eq!(response.new_loan_amount, 45_000.0);
    assert_eq!(response.message, "Loan payment successful");
}

#[tokio::test]
async fn test_increase_loan_rejected_by_backend() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/loan/increase"))
        .respond_with(
            ResponseTemplate::new(400)
                .set_body_json(json!({"error": "Loan increase exceeds maximum allowable loan amount"})),
        )
        .mount(&server)
        .await;

    let err = client(&server)
        .await
        .increase_loan(IncreaseLoanRequest {
            client_id: 1,
            loan_increase_amount: 1.0,
        })
        .await
        .unwrap_err();
    assert!(err.to_string().contains("exceeds maximum allowable"));
}

#[tokio::test]
async fn test_loan_manager_blocks_over_cap_without_request() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/loan/increase"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&server)
        .await;

    let source: Arc<dyn RiskDataSource> = Arc::new(client(&server).await);
    let manager = LoanManager::new(source, 1, 0.5);
    // headroom: 162500 * 0.5 - 50000 = 31250
    let status = MarginCalculator::new(0.25).calculate(162_500.0, 50_000.0);

    let err = manager
        .submit(LoanAction::Increase, 31_250.01, &status)
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::Validation(_)));
}
