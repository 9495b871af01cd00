use serde::{Deserialize, Serialize};
use chrono::{DateTime, NaiveDate, Utc};
use std::collections::HashMap;

/// Market record as handed over by market discovery.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RawMarket {
    pub condition_id: String,
    pub title: String,
    pub tokens: Vec<MarketToken>,
    #[serde(default)]
    pub volume: f64,
    pub end_time: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MarketToken {
    pub token_id: String,
    #[serde(default)]
    pub outcome: Option<String>,
    pub price: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Metric {
    High,
    Low,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BracketType {
    Above,
    Below,
    Between,
}

/// Structured form of a temperature-bracket market.
///
/// The bracket is the half-open interval `[bracket_min, bracket_max)`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BracketDescriptor {
    pub condition_id: String,
    pub city: String,
    pub date: NaiveDate,
    pub metric: Metric,
    pub bracket_type: BracketType,
    pub bracket_min: f64,
    pub bracket_max: f64,
    pub yes_token_id: String,
    pub no_token_id: String,
    pub yes_price: f64,
    pub no_price: f64,
    pub volume: f64,
    pub settlement_time: DateTime<Utc>,
}

impl BracketDescriptor {
    pub fn contains(&self, value: f64) -> bool {
        value >= self.bracket_min && value < self.bracket_max
    }
}

/// Per-member daily extrema for one forecast date.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DailyEnsemble {
    pub date: NaiveDate,
    pub highs: Vec<f64>,
    pub lows: Vec<f64>,
}

impl DailyEnsemble {
    pub fn members(&self, metric: Metric) -> &[f64] {
        match metric {
            Metric::High => &self.highs,
            Metric::Low => &self.lows,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EnsembleForecast {
    pub city: String,
    pub fetched_at: DateTime<Utc>,
    pub daily: Vec<DailyEnsemble>,
}

impl EnsembleForecast {
    pub fn for_date(&self, date: NaiveDate) -> Option<&DailyEnsemble> {
        self.daily.iter().find(|d| d.date == date)
    }
}

/// Deterministic forecast from an independent source, used as a tiebreaker.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PointForecast {
    pub city: String,
    pub date: NaiveDate,
    pub high: f64,
    pub low: f64,
}

impl PointForecast {
    pub fn value(&self, metric: Metric) -> f64 {
        match metric {
            Metric::High => self.high,
            Metric::Low => self.low,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OpenPosition {
    pub condition_id: String,
    pub city: String,
    pub size: f64,
    pub opened_at: DateTime<Utc>,
}

/// Forecasts available for one scan, indexed by city id.
#[derive(Debug, Clone, Default)]
pub struct ForecastSet {
    pub primary: HashMap<String, EnsembleForecast>,
    pub secondary: HashMap<String, EnsembleForecast>,
    pub points: HashMap<(String, NaiveDate), PointForecast>,
}

impl ForecastSet {
    pub fn new(
        primary: Vec<EnsembleForecast>,
        secondary: Vec<EnsembleForecast>,
        points: Vec<PointForecast>,
    ) -> Self {
        Self {
            primary: primary.into_iter().map(|f| (f.city.clone(), f)).collect(),
            secondary: secondary.into_iter().map(|f| (f.city.clone(), f)).collect(),
            points: points
                .into_iter()
                .map(|p| ((p.city.clone(), p.date), p))
                .collect(),
        }
    }

    pub fn point(&self, city: &str, date: NaiveDate) -> Option<&PointForecast> {
        self.points.get(&(city.to_string(), date))
    }
}
