use chrono::{DateTime, Utc};
use crate::strategies::types::{Side, Signal};

#[derive(Debug, Clone)]
pub struct Order {
    pub signal_id: String,
    pub condition_id: String,
    pub token_id: String,
    pub side: Side,
    pub price: f64,
    pub shares: f64,
}

impl Order {
    /// Limit buy of the signal's token for its dollar size.
    pub fn from_signal(signal: &Signal) -> Self {
        Self {
            signal_id: signal.id.clone(),
            condition_id: signal.market.condition_id.clone(),
            token_id: signal.token_id().to_string(),
            side: signal.side,
            price: signal.entry_price,
            shares: signal.size / signal.entry_price,
        }
    }
}

#[derive(Debug, Clone)]
pub struct Fill {
    pub signal_id: String,
    pub condition_id: String,
    pub side: Side,
    pub shares: f64,
    pub price: f64,
    pub cost: f64,
    pub timestamp: DateTime<Utc>,
}
