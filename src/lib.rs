//! Margin Monitor - margin risk dashboard for a brokerage client account.
//!
//! Polls a risk backend for positions and margin status, computes margin
//! requirements and what-if scenarios locally, and raises a margin-call alert
//! when equity falls below the maintenance requirement.

pub mod config;
pub mod error;
pub mod services;
pub mod sources;
pub mod tui;
pub mod types;

pub use error::{AppError, Result};
pub use types::*;
