use chrono::{DateTime, Duration, NaiveDate, Utc};
use std::collections::HashSet;
use crate::config::{ConfigError, PipelineConfig};
use crate::data::bracket::BracketParser;
use crate::data::types::{BracketDescriptor, ForecastSet, OpenPosition, RawMarket};
use crate::execution::risk::RiskState;
use crate::strategies::confidence::resolve_label;
use crate::strategies::consensus::{ConsensusEngine, ConsensusTier};
use crate::strategies::edge::EdgeCalculator;
use crate::strategies::sizing::{floor_to_cents, kelly_size, SizingConfig};
use crate::strategies::types::Signal;
use tracing::{debug, info, warn};

/// Clock for one scan. Fixing it up front keeps every filter in the scan consistent.
#[derive(Debug, Clone, Copy)]
pub struct ScanContext {
    pub now: DateTime<Utc>,
    pub today: NaiveDate,
}

impl ScanContext {
    pub fn at(now: DateTime<Utc>) -> Self {
        Self {
            now,
            today: now.date_naive(),
        }
    }
}

/// Why a parsed market produced no signal.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SkipReason {
    OpenPosition,
    LowVolume,
    TooCloseToSettlement,
    BeyondHorizon,
    NoForecast,
    ModelsDisagree,
    NoEdge,
    BelowMinTrade,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct ScanStats {
    pub markets: usize,
    pub unparsable: usize,
    pub open_position: usize,
    pub low_volume: usize,
    pub too_close: usize,
    pub beyond_horizon: usize,
    pub no_forecast: usize,
    pub models_disagree: usize,
    pub no_edge: usize,
    pub below_min_trade: usize,
    pub emitted: usize,
}

impl ScanStats {
    fn record(&mut self, reason: SkipReason) {
        match reason {
            SkipReason::OpenPosition => self.open_position += 1,
            SkipReason::LowVolume => self.low_volume += 1,
            SkipReason::TooCloseToSettlement => self.too_close += 1,
            SkipReason::BeyondHorizon => self.beyond_horizon += 1,
            SkipReason::NoForecast => self.no_forecast += 1,
            SkipReason::ModelsDisagree => self.models_disagree += 1,
            SkipReason::NoEdge => self.no_edge += 1,
            SkipReason::BelowMinTrade => self.below_min_trade += 1,
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct ScanOutcome {
    pub signals: Vec<Signal>,
    pub stats: ScanStats,
}

#[derive(Debug, thiserror::Error)]
pub enum PipelineError {
    #[error("Invalid pipeline config: {0}")]
    InvalidConfig(#[from] ConfigError),
}

/// Weather bracket signal generator.
///
/// For every market: parse the title, filter on eligibility, blend the ensemble
/// models, price the edge and size the position.
pub struct SignalGenerator {
    config: PipelineConfig,
    parser: BracketParser,
}

impl SignalGenerator {
    pub fn new(config: PipelineConfig, parser: BracketParser) -> Self {
        Self { config, parser }
    }

    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    /// Run one scan over a snapshot. Signals keep the input order of `markets`.
    pub fn generate(
        &self,
        markets: &[RawMarket],
        forecasts: &ForecastSet,
        open_positions: &[OpenPosition],
        risk: &RiskState,
        ctx: &ScanContext,
    ) -> Result<ScanOutcome, PipelineError> {
        self.config.validate()?;

        let mut outcome = ScanOutcome::default();
        outcome.stats.markets = markets.len();

        if let Some(reason) = &risk.halted {
            warn!("Circuit breaker active ({}), no new signals", reason);
            return Ok(outcome);
        }

        let slots = self.config.max_open_positions.saturating_sub(open_positions.len());
        if slots == 0 {
            info!(
                "Max open positions reached ({}/{}), skipping scan",
                open_positions.len(),
                self.config.max_open_positions
            );
            return Ok(outcome);
        }

        let open_ids: HashSet<&str> = open_positions
            .iter()
            .map(|p| p.condition_id.as_str())
            .collect();

        for market in markets {
            let descriptor = match self.parser.parse_market(market, ctx.today) {
                Some(descriptor) => descriptor,
                None => {
                    outcome.stats.unparsable += 1;
                    continue;
                }
            };

            match self.evaluate(&descriptor, forecasts, &open_ids, ctx) {
                Ok(signal) => {
                    outcome.signals.push(signal);
                    if outcome.signals.len() >= slots {
                        info!("Open position slots filled ({}), stopping scan", slots);
                        break;
                    }
                }
                Err(reason) => {
                    debug!("Skipping {} ({}): {:?}", descriptor.condition_id, market.title, reason);
                    outcome.stats.record(reason);
                }
            }
        }

        outcome.stats.emitted = outcome.signals.len();
        info!(
            "Scan complete: {} markets, {} unparsable, {} signals",
            outcome.stats.markets, outcome.stats.unparsable, outcome.stats.emitted
        );

        Ok(outcome)
    }

    /// Filters, consensus, edge and sizing for one parsed market.
    fn evaluate(
        &self,
        market: &BracketDescriptor,
        forecasts: &ForecastSet,
        open_ids: &HashSet<&str>,
        ctx: &ScanContext,
    ) -> Result<Signal, SkipReason> {
        // 1. Eligibility, in order
        if open_ids.contains(market.condition_id.as_str()) {
            return Err(SkipReason::OpenPosition);
        }

        if market.volume < self.config.min_volume {
            return Err(SkipReason::LowVolume);
        }

        let hours_left = (market.settlement_time - ctx.now).num_seconds() as f64 / 3600.0;
        if hours_left < self.config.min_hours_to_settlement {
            return Err(SkipReason::TooCloseToSettlement);
        }

        if market.date > ctx.today + Duration::days(self.config.forecast_horizon_days) {
            return Err(SkipReason::BeyondHorizon);
        }

        let primary = forecasts
            .primary
            .get(&market.city)
            .ok_or(SkipReason::NoForecast)?;

        // 2. Model consensus
        let secondary = forecasts.secondary.get(&market.city);
        let point_in_bracket = forecasts
            .point(&market.city, market.date)
            .map(|p| market.contains(p.value(market.metric)));

        let consensus = ConsensusEngine::evaluate(market, primary, secondary, point_in_bracket)
            .ok_or(SkipReason::NoForecast)?;

        if consensus.tier == ConsensusTier::Skip {
            return Err(SkipReason::ModelsDisagree);
        }

        // 3. Edge on the blended probability
        let edge = EdgeCalculator::evaluate(
            consensus.blended_probability,
            market.yes_price,
            market.no_price,
        )
        .ok_or(SkipReason::NoEdge)?;

        if edge.edge < self.config.min_edge {
            return Err(SkipReason::NoEdge);
        }

        // 4. Size: fractional Kelly scaled by consensus, re-capped
        let sizing = kelly_size(
            edge.probability,
            edge.price,
            self.config.bankroll,
            &SizingConfig {
                kelly_fraction: self.config.kelly_fraction,
                max_position_pct: self.config.max_position_pct,
            },
        );

        let cap = self.config.max_position_pct * self.config.bankroll;
        let size = floor_to_cents((sizing.size * consensus.kelly_multiplier).min(cap));
        if size <= 0.0 || size < self.config.min_trade_usd {
            return Err(SkipReason::BelowMinTrade);
        }

        let confidence = resolve_label(edge.edge, consensus.tier);

        info!(
            "Signal generated: {} {} {} [{}, {}) side={} price=${:.2} size=${:.2} \
             edge={:.1}% tier={} label={}",
            market.city,
            market.date,
            format!("{:?}", market.metric).to_lowercase(),
            market.bracket_min,
            market.bracket_max,
            edge.side,
            edge.price,
            size,
            edge.edge * 100.0,
            consensus.tier,
            confidence
        );

        Ok(Signal {
            id: uuid::Uuid::new_v4().to_string(),
            market: market.clone(),
            side: edge.side,
            probability: edge.probability,
            entry_price: edge.price,
            edge: edge.edge,
            size,
            raw_kelly: sizing.raw_kelly,
            confidence,
            consensus_tier: consensus.tier,
            created_at: ctx.now,
        })
    }
}
