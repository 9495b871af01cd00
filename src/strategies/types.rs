use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use crate::data::types::BracketDescriptor;
use crate::strategies::consensus::ConsensusTier;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Side {
    Yes,
    No,
}

impl fmt::Display for Side {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Side::Yes => write!(f, "YES"),
            Side::No => write!(f, "NO"),
        }
    }
}

/// Label attached to an emitted signal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ConfidenceLabel {
    Lock,
    Strong,
    Safe,
    NearSafe,
}

impl fmt::Display for ConfidenceLabel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfidenceLabel::Lock => write!(f, "LOCK"),
            ConfidenceLabel::Strong => write!(f, "STRONG"),
            ConfidenceLabel::Safe => write!(f, "SAFE"),
            ConfidenceLabel::NearSafe => write!(f, "NEAR-SAFE"),
        }
    }
}

/// A sized trade decision for one market. Built once per scan and never modified.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Signal {
    pub id: String,
    pub market: BracketDescriptor,
    pub side: Side,
    /// Blended probability that the chosen side wins.
    pub probability: f64,
    pub entry_price: f64,
    pub edge: f64,
    pub size: f64,
    pub raw_kelly: f64,
    pub confidence: ConfidenceLabel,
    pub consensus_tier: ConsensusTier,
    pub created_at: DateTime<Utc>,
}

impl Signal {
    pub fn token_id(&self) -> &str {
        match self.side {
            Side::Yes => &self.market.yes_token_id,
            Side::No => &self.market.no_token_id,
        }
    }
}
