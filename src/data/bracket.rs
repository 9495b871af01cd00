use anyhow::Result;
use chrono::{Datelike, NaiveDate};
use regex::Regex;
use tracing::debug;
use crate::data::types::{BracketDescriptor, BracketType, MarketToken, Metric, RawMarket};

const MONTHS: [&str; 12] = [
    "january", "february", "march", "april", "may", "june",
    "july", "august", "september", "october", "november", "december",
];

/// The three bracket shapes a market title can describe.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum BracketPattern {
    /// "between X-Y": covers whole degrees X through Y.
    Between { low: f64, high: f64 },
    /// "X or higher"
    Above { threshold: f64 },
    /// "X or below"
    Below { threshold: f64 },
    Unrecognized,
}

impl BracketPattern {
    /// Half-open `[min, max)` bounds for the pattern.
    pub fn bounds(&self) -> Option<(BracketType, f64, f64)> {
        match *self {
            BracketPattern::Between { low, high } => Some((BracketType::Between, low, high + 1.0)),
            BracketPattern::Above { threshold } => {
                Some((BracketType::Above, threshold, f64::INFINITY))
            }
            BracketPattern::Below { threshold } => {
                Some((BracketType::Below, f64::NEG_INFINITY, threshold + 1.0))
            }
            BracketPattern::Unrecognized => None,
        }
    }
}

/// City id with the lowercase phrases that refer to it.
#[derive(Debug, Clone)]
pub struct CityAlias {
    pub city: String,
    pub aliases: Vec<String>,
}

impl CityAlias {
    pub fn new(city: &str, aliases: &[&str]) -> Self {
        Self {
            city: city.to_string(),
            aliases: aliases.iter().map(|a| a.to_lowercase()).collect(),
        }
    }
}

pub fn default_city_aliases() -> Vec<CityAlias> {
    vec![
        CityAlias::new("nyc", &["new york city", "new york", "nyc", "manhattan"]),
        CityAlias::new("chicago", &["chicago"]),
        CityAlias::new("london", &["london"]),
        CityAlias::new("seoul", &["seoul"]),
        CityAlias::new("miami", &["miami"]),
        CityAlias::new("dallas", &["dallas"]),
        CityAlias::new("atlanta", &["atlanta"]),
        CityAlias::new("seattle", &["seattle"]),
        CityAlias::new("toronto", &["toronto"]),
        CityAlias::new("buenos_aires", &["buenos aires"]),
        CityAlias::new("wellington", &["wellington"]),
    ]
}

/// Turns market titles into bracket descriptors.
pub struct BracketParser {
    between: Regex,
    below: Regex,
    above: Regex,
    location: Regex,
    date: Regex,
    cities: Vec<CityAlias>,
}

impl BracketParser {
    pub fn new(cities: Vec<CityAlias>) -> Result<Self> {
        Ok(Self {
            between: Regex::new(
                r"(?i)\bbetween\s+(-?\d+(?:\.\d+)?)\s*(?:°\s*[fc]?)?\s*[-–]\s*(-?\d+(?:\.\d+)?)",
            )?,
            below: Regex::new(r"(?i)(-?\d+(?:\.\d+)?)\s*(?:°\s*[fc]?)?\s+or\s+below\b")?,
            above: Regex::new(r"(?i)(-?\d+(?:\.\d+)?)\s*(?:°\s*[fc]?)?\s+or\s+higher\b")?,
            location: Regex::new(r"(?i)\bin\s+(.+?)\s+(?:be|on)\b")?,
            date: Regex::new(r"(?i)\bon\s+([a-z]+)\.?\s+(\d{1,2})\b")?,
            cities,
        })
    }

    /// Parser over the built-in city table.
    pub fn with_default_cities() -> Result<Self> {
        Self::new(default_city_aliases())
    }

    /// Classify the bracket wording of a title.
    pub fn parse_pattern(&self, text: &str) -> BracketPattern {
        if let Some(cap) = self.between.captures(text) {
            return match (cap[1].parse::<f64>(), cap[2].parse::<f64>()) {
                (Ok(low), Ok(high)) if high >= low => BracketPattern::Between { low, high },
                _ => BracketPattern::Unrecognized,
            };
        }

        if let Some(cap) = self.below.captures(text) {
            return cap[1]
                .parse::<f64>()
                .map(|threshold| BracketPattern::Below { threshold })
                .unwrap_or(BracketPattern::Unrecognized);
        }

        if let Some(cap) = self.above.captures(text) {
            return cap[1]
                .parse::<f64>()
                .map(|threshold| BracketPattern::Above { threshold })
                .unwrap_or(BracketPattern::Unrecognized);
        }

        BracketPattern::Unrecognized
    }

    /// Resolve a location phrase: exact alias match first, then substring either way.
    pub fn resolve_city(&self, phrase: &str) -> Option<&str> {
        let normalized = phrase.trim().to_lowercase();
        if normalized.is_empty() {
            return None;
        }

        let exact = self
            .cities
            .iter()
            .find(|c| c.aliases.iter().any(|a| *a == normalized));

        exact
            .or_else(|| {
                self.cities.iter().find(|c| {
                    c.aliases
                        .iter()
                        .any(|a| normalized.contains(a.as_str()) || a.contains(normalized.as_str()))
                })
            })
            .map(|c| c.city.as_str())
    }

    /// Extract "Month Day" and pin it to the year of `today`.
    ///
    /// No year rollover: a January title read in December resolves to the current January.
    pub fn parse_date(&self, text: &str, today: NaiveDate) -> Option<NaiveDate> {
        let cap = self.date.captures(text)?;
        let word = cap[1].to_lowercase();
        if word.len() < 3 {
            return None;
        }

        let month = MONTHS.iter().position(|m| m.starts_with(word.as_str()))? as u32 + 1;
        let day = cap[2].parse::<u32>().ok()?;

        NaiveDate::from_ymd_opt(today.year(), month, day)
    }

    /// Build a descriptor from a raw market, or `None` if any part is unusable.
    pub fn parse_market(&self, market: &RawMarket, today: NaiveDate) -> Option<BracketDescriptor> {
        let bounds = self.parse_pattern(&market.title).bounds();
        let (bracket_type, bracket_min, bracket_max) = match bounds {
            Some(bounds) => bounds,
            None => {
                debug!("No bracket pattern in title: {}", market.title);
                return None;
            }
        };

        let location = self.location.captures(&market.title)?;
        let city = match self.resolve_city(&location[1]) {
            Some(city) => city.to_string(),
            None => {
                debug!("Unknown city '{}' in title: {}", &location[1], market.title);
                return None;
            }
        };

        let date = match self.parse_date(&market.title, today) {
            Some(date) => date,
            None => {
                debug!("Unparsable date in title: {}", market.title);
                return None;
            }
        };

        let title_lower = market.title.to_lowercase();
        let metric = if title_lower.contains("lowest") || title_lower.contains("low temp") {
            Metric::Low
        } else {
            Metric::High
        };

        let (yes, no) = match outcome_tokens(market) {
            Some(pair) => pair,
            None => {
                debug!("Missing or ambiguous Yes/No tokens for {}", market.condition_id);
                return None;
            }
        };

        Some(BracketDescriptor {
            condition_id: market.condition_id.clone(),
            city,
            date,
            metric,
            bracket_type,
            bracket_min,
            bracket_max,
            yes_token_id: yes.token_id.clone(),
            no_token_id: no.token_id.clone(),
            yes_price: yes.price,
            no_price: no.price,
            volume: market.volume,
            settlement_time: market.end_time,
        })
    }
}

/// Pick the YES and NO tokens by outcome label; exactly one of each, priced in (0, 1).
fn outcome_tokens(market: &RawMarket) -> Option<(&MarketToken, &MarketToken)> {
    let labelled = |label: &str| {
        let mut matches = market.tokens.iter().filter(|t| {
            t.outcome
                .as_deref()
                .map(|o| o.trim().eq_ignore_ascii_case(label))
                .unwrap_or(false)
        });
        let first = matches.next()?;
        match matches.next() {
            Some(_) => None,
            None => Some(first),
        }
    };

    let yes = labelled("yes")?;
    let no = labelled("no")?;

    let priced = |p: f64| p > 0.0 && p < 1.0;
    if !priced(yes.price) || !priced(no.price) {
        return None;
    }

    Some((yes, no))
}
