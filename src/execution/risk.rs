use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use crate::config::RiskConfig;
use crate::strategies::types::Signal;
use tracing::{error, info};

/// Why new signals are halted.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum HaltReason {
    ConsecutiveLosses(u32),
    DailyLoss(f64),
}

impl std::fmt::Display for HaltReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            HaltReason::ConsecutiveLosses(n) => write!(f, "ConsecutiveLosses({})", n),
            HaltReason::DailyLoss(loss) => write!(f, "DailyLoss(${:.2})", loss),
        }
    }
}

/// Circuit-breaker state. Passed into each scan and replaced, never shared mutably.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RiskState {
    pub consecutive_losses: u32,
    pub daily_realized_pnl: f64,
    pub trading_day: Option<NaiveDate>,
    pub halted: Option<HaltReason>,
    pub halted_at: Option<DateTime<Utc>>,
}

impl RiskState {
    pub fn is_halted(&self) -> bool {
        self.halted.is_some()
    }
}

/// Produces new risk states from settled outcomes.
#[derive(Debug, Clone)]
pub struct RiskTracker {
    config: RiskConfig,
}

impl RiskTracker {
    pub fn new(config: RiskConfig) -> Self {
        Self { config }
    }

    /// Fold one settled position's P&L into the state.
    pub fn record_settlement(&self, state: &RiskState, pnl: f64, at: DateTime<Utc>) -> RiskState {
        let day = at.date_naive();
        let mut next = state.clone();

        if next.trading_day != Some(day) {
            next.trading_day = Some(day);
            next.daily_realized_pnl = 0.0;
        }

        next.daily_realized_pnl += pnl;
        next.consecutive_losses = if pnl < 0.0 { next.consecutive_losses + 1 } else { 0 };

        if next.halted.is_none() {
            let reason = if next.consecutive_losses >= self.config.max_consecutive_losses {
                Some(HaltReason::ConsecutiveLosses(next.consecutive_losses))
            } else if next.daily_realized_pnl <= -self.config.max_daily_loss_usd {
                Some(HaltReason::DailyLoss(next.daily_realized_pnl))
            } else {
                None
            };

            if let Some(reason) = reason {
                error!("🔴 CIRCUIT BREAKER TRIGGERED: {}", reason);
                next.halted = Some(reason);
                next.halted_at = Some(at);
            }
        }

        next
    }

    pub fn reset(&self, state: &RiskState) -> RiskState {
        info!("Circuit breaker reset");
        RiskState {
            consecutive_losses: 0,
            halted: None,
            halted_at: None,
            ..state.clone()
        }
    }

    /// Pre-trade checks an executor runs before acting on a signal.
    pub fn validate_signal(
        &self,
        state: &RiskState,
        signal: &Signal,
        current_balance: f64,
    ) -> Result<(), ValidationError> {
        if let Some(reason) = &state.halted {
            return Err(ValidationError::Halted(reason.to_string()));
        }

        if signal.size > current_balance {
            return Err(ValidationError::InsufficientBalance(signal.size, current_balance));
        }

        let limit = self.config.bankroll * self.config.max_position_pct;
        if signal.size > limit + 1e-9 {
            return Err(ValidationError::PositionExceedsPercentage(signal.size, limit));
        }

        Ok(())
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ValidationError {
    #[error("Trading halted: {0}")]
    Halted(String),

    #[error("Insufficient balance: need ${0:.2}, have ${1:.2}")]
    InsufficientBalance(f64, f64),

    #[error("Position exceeds percentage: ${0:.2} > ${1:.2}")]
    PositionExceedsPercentage(f64, f64),
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn tracker() -> RiskTracker {
        RiskTracker::new(RiskConfig {
            bankroll: 100.0,
            max_position_pct: 0.05,
            max_open_positions: 5,
            max_consecutive_losses: 3,
            max_daily_loss_usd: 20.0,
        })
    }

    fn at(day: u32, hour: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 1, day, hour, 0, 0).unwrap()
    }

    #[test]
    fn test_consecutive_losses_trip() {
        let tracker = tracker();
        let mut state = RiskState::default();

        state = tracker.record_settlement(&state, -1.0, at(10, 1));
        state = tracker.record_settlement(&state, -1.0, at(10, 2));
        assert!(!state.is_halted());

        state = tracker.record_settlement(&state, -1.0, at(10, 3));
        assert_eq!(state.halted, Some(HaltReason::ConsecutiveLosses(3)));
        assert_eq!(state.halted_at, Some(at(10, 3)));
    }

    #[test]
    fn test_win_resets_streak() {
        let tracker = tracker();
        let state = RiskState::default();

        let state = tracker.record_settlement(&state, -1.0, at(10, 1));
        let state = tracker.record_settlement(&state, -1.0, at(10, 2));
        let state = tracker.record_settlement(&state, 3.0, at(10, 3));
        assert_eq!(state.consecutive_losses, 0);
        assert!((state.daily_realized_pnl - 1.0).abs() < 1e-12);
    }

    #[test]
    fn test_daily_loss_trip_and_rollover() {
        let tracker = tracker();

        let state = tracker.record_settlement(&RiskState::default(), -15.0, at(10, 1));
        let state = tracker.record_settlement(&state, 2.0, at(11, 1));
        assert!((state.daily_realized_pnl - 2.0).abs() < 1e-12);
        assert!(!state.is_halted());

        let state = tracker.record_settlement(&state, -25.0, at(11, 2));
        assert!(matches!(state.halted, Some(HaltReason::DailyLoss(_))));
    }

    #[test]
    fn test_previous_state_untouched() {
        let tracker = tracker();
        let before = RiskState::default();
        let _after = tracker.record_settlement(&before, -50.0, at(10, 1));
        assert_eq!(before, RiskState::default());
    }

    #[test]
    fn test_reset_clears_halt() {
        let tracker = tracker();
        let halted = tracker.record_settlement(&RiskState::default(), -50.0, at(10, 1));
        assert!(halted.is_halted());

        let state = tracker.reset(&halted);
        assert!(!state.is_halted());
        assert_eq!(state.trading_day, halted.trading_day);
    }
}
