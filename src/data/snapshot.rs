use anyhow::{Context, Result};
use serde::Deserialize;
use std::fs;
use crate::data::types::{EnsembleForecast, ForecastSet, PointForecast, RawMarket};

/// One immutable scan input, as written by the discovery and weather fetchers.
#[derive(Debug, Clone, Deserialize)]
pub struct MarketSnapshot {
    pub markets: Vec<RawMarket>,
    pub primary: Vec<EnsembleForecast>,
    #[serde(default)]
    pub secondary: Vec<EnsembleForecast>,
    #[serde(default)]
    pub point_forecasts: Vec<PointForecast>,
}

impl MarketSnapshot {
    pub fn load(path: &str) -> Result<Self> {
        let contents = fs::read_to_string(path)
            .with_context(|| format!("Failed to read snapshot: {}", path))?;

        Self::from_json(&contents).with_context(|| format!("Failed to parse snapshot: {}", path))
    }

    pub fn from_json(contents: &str) -> Result<Self> {
        Ok(serde_json::from_str(contents)?)
    }

    /// Split into markets and indexed forecasts.
    pub fn into_parts(self) -> (Vec<RawMarket>, ForecastSet) {
        let forecasts = ForecastSet::new(self.primary, self.secondary, self.point_forecasts);
        (self.markets, forecasts)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    const SNAPSHOT: &str = r#"{
        "markets": [{
            "condition_id": "0x01",
            "title": "Will the highest temperature in Chicago be between 30-31°F on January 15?",
            "tokens": [
                {"token_id": "y", "outcome": "Yes", "price": 0.2},
                {"token_id": "n", "outcome": "No", "price": 0.8}
            ],
            "volume": 900.0,
            "end_time": "2026-01-16T05:00:00Z"
        }],
        "primary": [{
            "city": "chicago",
            "fetched_at": "2026-01-14T06:00:00Z",
            "daily": [{
                "date": "2026-01-15",
                "highs": [30.1, 31.5, 29.0],
                "lows": [20.0, 21.0, 19.5]
            }]
        }],
        "point_forecasts": [{"city": "chicago", "date": "2026-01-15", "high": 30.4, "low": 20.2}]
    }"#;

    #[test]
    fn test_parse_snapshot() {
        let snapshot = MarketSnapshot::from_json(SNAPSHOT).unwrap();
        assert_eq!(snapshot.markets.len(), 1);
        assert_eq!(snapshot.markets[0].tokens[0].outcome.as_deref(), Some("Yes"));
        assert!(snapshot.secondary.is_empty());

        let (markets, forecasts) = snapshot.into_parts();
        assert_eq!(markets[0].condition_id, "0x01");
        assert_eq!(forecasts.primary["chicago"].daily[0].highs.len(), 3);
        assert!(forecasts.secondary.is_empty());

        let date = NaiveDate::from_ymd_opt(2026, 1, 15).unwrap();
        assert!((forecasts.point("chicago", date).unwrap().high - 30.4).abs() < 1e-12);
        assert!(forecasts.point("nyc", date).is_none());
    }

    #[test]
    fn test_malformed_snapshot_is_error() {
        assert!(MarketSnapshot::from_json("{\"markets\": 3}").is_err());
        assert!(MarketSnapshot::load("/nonexistent/snapshot.json").is_err());
    }
}
