//! Synthetic price history.
//!
//! There is no historical feed behind the dashboard; the history view plots a
//! random walk that ends near the current price.

use crate::config::PriceHistoryConfig;
use crate::types::PricePoint;
use chrono::{Duration, NaiveDate, Utc};
use rand::Rng;

/// Daily upward drift added to each step.
const DAILY_DRIFT: f64 = 0.001;

/// Generates random-walk price series.
#[derive(Debug, Clone)]
pub struct PriceHistoryGenerator {
    config: PriceHistoryConfig,
}

impl PriceHistoryGenerator {
    pub fn new(config: PriceHistoryConfig) -> Self {
        Self { config }
    }

    /// Series of `days + 1` daily points ending today.
    pub fn generate(&self, current_price: f64) -> Vec<PricePoint> {
        let today = Utc::now().date_naive();
        self.generate_with_rng(&mut rand::thread_rng(), current_price, today)
    }

    /// Series of `days + 1` daily points ending at `end`, drawing from `rng`.
    pub fn generate_with_rng<R: Rng>(
        &self,
        rng: &mut R,
        current_price: f64,
        end: NaiveDate,
    ) -> Vec<PricePoint> {
        let days = self.config.days;
        let vol = self.config.volatility;

        let mut price = current_price * (1.0 - rng.gen::<f64>() * vol * f64::from(days));
        let mut history = Vec::with_capacity(days as usize + 1);

        for back in (0..=days).rev() {
            price *= 1.0 + (rng.gen::<f64>() * vol - vol / 2.0 + DAILY_DRIFT);
            history.push(PricePoint {
                date: end - Duration::days(i64::from(back)),
                price: round_cents(price),
            });
        }

        history
    }
}

impl Default for PriceHistoryGenerator {
    fn default() -> Self {
        Self::new(PriceHistoryConfig::default())
    }
}

fn round_cents(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}
