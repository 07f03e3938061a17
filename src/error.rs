use thiserror::Error;

/// Reasons a loan request is rejected before it is sent.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum LoanValidationError {
    #[error("Amount must be a positive number")]
    NonPositiveAmount,

    #[error("Amount exceeds maximum allowable loan: requested {requested:.2}, available {available:.2}")]
    ExceedsIncreaseCap { requested: f64, available: f64 },

    #[error("Payment amount exceeds loan amount: requested {requested:.2}, outstanding {outstanding:.2}")]
    ExceedsOutstandingLoan { requested: f64, outstanding: f64 },
}

/// Application error types.
#[derive(Error, Debug)]
pub enum AppError {
    #[error("Backend error ({status}): {message}")]
    Api { status: u16, message: String },

    #[error("Invalid configuration: {0}")]
    Config(String),

    #[error(transparent)]
    Validation(#[from] LoanValidationError),

    #[error("Refresh controller stopped")]
    ControllerStopped,

    #[error(transparent)]
    Http(#[from] reqwest::Error),

    #[error(transparent)]
    SerdeJson(#[from] serde_json::Error),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl AppError {
    /// Whether the error came from talking to the backend (transport, status
    /// or payload), as opposed to a local rejection.
    pub fn is_fetch_failure(&self) -> bool {
        matches!(
            self,
            AppError::Api { .. } | AppError::Http(_) | AppError::SerdeJson(_)
        )
    }
}

pub type Result<T> = std::result::Result<T, AppError>;
