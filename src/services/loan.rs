//! Loan management: client-side guards and the pay/increase operations.

use crate::config::DEFAULT_INITIAL_MARGIN_CAP;
use crate::error::{LoanValidationError, Result};
use crate::sources::RiskDataSource;
use crate::types::{IncreaseLoanRequest, LoanAction, LoanResponse, MarginStatus, PayLoanRequest};
use std::sync::Arc;
use tracing::{info, warn};

/// Validates and submits loan changes for one client.
pub struct LoanManager {
    source: Arc<dyn RiskDataSource>,
    client_id: u64,
    initial_margin_cap: f64,
}

impl LoanManager {
    pub fn new(source: Arc<dyn RiskDataSource>, client_id: u64, initial_margin_cap: f64) -> Self {
        Self {
            source,
            client_id,
            initial_margin_cap,
        }
    }

    pub fn client_id(&self) -> u64 {
        self.client_id
    }

    /// Largest additional loan allowed: `pmv * cap - loan`. May be negative
    /// when the account is already over the cap.
    pub fn max_loan_increase(&self, status: &MarginStatus) -> f64 {
        max_loan_increase(status, self.initial_margin_cap)
    }

    /// Check an amount for `action` against the current status without
    /// sending anything.
    pub fn validate(
        &self,
        action: LoanAction,
        amount: f64,
        status: &MarginStatus,
    ) -> std::result::Result<(), LoanValidationError> {
        if !(amount.is_finite() && amount > 0.0) {
            return Err(LoanValidationError::NonPositiveAmount);
        }
        match action {
            LoanAction::Increase => {
                let available = self.max_loan_increase(status);
                if amount > available {
                    return Err(LoanValidationError::ExceedsIncreaseCap {
                        requested: amount,
                        available,
                    });
                }
            }
            LoanAction::Pay => {
                if amount > status.loan_amount() {
                    return Err(LoanValidationError::ExceedsOutstandingLoan {
                        requested: amount,
                        outstanding: status.loan_amount(),
                    });
                }
            }
        }
        Ok(())
    }

    /// Validate and submit a loan change.
    pub async fn submit(
        &self,
        action: LoanAction,
        amount: f64,
        status: &MarginStatus,
    ) -> Result<LoanResponse> {
        self.validate(action, amount, status)?;

        let result = match action {
            LoanAction::Pay => {
                self.source
                    .pay_loan(PayLoanRequest {
                        client_id: self.client_id,
                        payment_amount: amount,
                    })
                    .await
            }
            LoanAction::Increase => {
                self.source
                    .increase_loan(IncreaseLoanRequest {
                        client_id: self.client_id,
                        loan_increase_amount: amount,
                    })
                    .await
            }
        };

        match &result {
            Ok(response) => info!(
                action = action.label(),
                amount,
                new_loan_amount = response.new_loan_amount,
                "{}",
                response.message
            ),
            Err(e) => warn!(action = action.label(), amount, "Loan operation failed: {}", e),
        }

        result
    }
}

/// `pmv * cap - loan` for a status.
pub fn max_loan_increase(status: &MarginStatus, initial_margin_cap: f64) -> f64 {
    status.portfolio_market_value() * initial_margin_cap - status.loan_amount()
}

/// Loan headroom at the default 50% cap.
pub fn default_max_loan_increase(status: &MarginStatus) -> f64 {
    max_loan_increase(status, DEFAULT_INITIAL_MARGIN_CAP)
}
