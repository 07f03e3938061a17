use serde::{Deserialize, Serialize};

/// Body of `POST /loan/pay`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PayLoanRequest {
    pub client_id: u64,
    pub payment_amount: f64,
}

/// Body of `POST /loan/increase`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IncreaseLoanRequest {
    pub client_id: u64,
    pub loan_increase_amount: f64,
}

/// Successful response to either loan operation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LoanResponse {
    pub message: String,
    pub new_loan_amount: f64,
}

/// Error body returned by the backend on non-2xx responses.
#[derive(Debug, Clone, Deserialize)]
pub struct ApiErrorBody {
    pub error: String,
}

/// Which loan operation a request is for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoanAction {
    Pay,
    Increase,
}

impl LoanAction {
    pub fn label(&self) -> &'static str {
        match self {
            LoanAction::Pay => "Pay Loan",
            LoanAction::Increase => "Loan More",
        }
    }
}
