/// Fractional-Kelly parameters.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SizingConfig {
    pub kelly_fraction: f64,
    pub max_position_pct: f64,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SizingResult {
    pub raw_kelly: f64,
    pub adjusted_kelly: f64,
    /// Dollars, rounded down to the cent.
    pub size: f64,
}

impl SizingResult {
    fn zero(raw_kelly: f64) -> Self {
        Self {
            raw_kelly,
            adjusted_kelly: 0.0,
            size: 0.0,
        }
    }
}

/// Round a dollar amount down to whole cents, never below zero.
pub fn floor_to_cents(amount: f64) -> f64 {
    if !amount.is_finite() || amount <= 0.0 {
        return 0.0;
    }
    // Absorb f64 noise such as 0.29 * 100 = 28.999999999999996.
    ((amount * 100.0) + 1e-9).floor() / 100.0
}

/// Position size using the Kelly Criterion
/// Formula: f* = (bp - q) / b
/// where b = (1 - price) / price, p = win probability, q = 1 - p
pub fn kelly_size(
    probability: f64,
    price: f64,
    bankroll: f64,
    config: &SizingConfig,
) -> SizingResult {
    if !(price > 0.0) || !bankroll.is_finite() || bankroll <= 0.0 {
        return SizingResult::zero(0.0);
    }

    let odds = (1.0 - price) / price;
    if odds <= 0.0 {
        return SizingResult::zero(0.0);
    }

    let lose_prob = 1.0 - probability;
    let raw_kelly = (odds * probability - lose_prob) / odds;
    if raw_kelly <= 0.0 {
        return SizingResult::zero(raw_kelly);
    }

    let adjusted_kelly = (raw_kelly * config.kelly_fraction).min(config.max_position_pct);

    SizingResult {
        raw_kelly,
        adjusted_kelly,
        size: floor_to_cents(adjusted_kelly * bankroll),
    }
}
