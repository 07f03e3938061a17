use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

/// Latest stored price for a symbol, as served by `GET /market-data`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MarketQuote {
    pub symbol: String,
    pub current_price: f64,
    /// HTTP-date string (e.g. `Sun, 18 Oct 2026 09:30:00 GMT`).
    #[serde(default)]
    pub timestamp: Option<String>,
}

impl MarketQuote {
    /// Parse the quote timestamp, accepting HTTP-date or RFC 3339.
    pub fn timestamp_utc(&self) -> Option<DateTime<Utc>> {
        let raw = self.timestamp.as_deref()?;
        DateTime::parse_from_rfc2822(raw)
            .or_else(|_| DateTime::parse_from_rfc3339(raw))
            .map(|dt| dt.with_timezone(&Utc))
            .ok()
    }
}

/// One point of a (synthetic) daily price series.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PricePoint {
    pub date: NaiveDate,
    pub price: f64,
}
