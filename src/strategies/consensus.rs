use serde::{Deserialize, Serialize};
use std::fmt;
use crate::data::types::{BracketDescriptor, EnsembleForecast};
use crate::data::weather::ProbabilityEngine;

pub const PRIMARY_WEIGHT: f64 = 1.0;
pub const SECONDARY_WEIGHT: f64 = 1.2;

/// Agreement between forecast sources, from strongest to none.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ConsensusTier {
    Lock,
    Strong,
    Safe,
    NearSafe,
    Skip,
}

impl ConsensusTier {
    /// Tier for `agreeing` of `consulted` sources voting with the primary model.
    ///
    /// Rules are checked top to bottom; the first match wins.
    pub fn classify(consulted: usize, agreeing: usize) -> Self {
        if consulted == 0 {
            return ConsensusTier::Skip;
        }
        let ratio = agreeing as f64 / consulted as f64;

        if consulted >= 2 && agreeing == consulted {
            ConsensusTier::Lock
        } else if consulted >= 2 && ratio >= 0.66 {
            ConsensusTier::Strong
        } else if consulted == 1 {
            ConsensusTier::Safe
        } else if ratio >= 0.5 {
            ConsensusTier::NearSafe
        } else {
            ConsensusTier::Skip
        }
    }

    pub fn kelly_multiplier(&self) -> f64 {
        match self {
            ConsensusTier::Lock => 1.5,
            ConsensusTier::Strong => 1.2,
            ConsensusTier::Safe => 1.0,
            ConsensusTier::NearSafe => 0.7,
            ConsensusTier::Skip => 0.0,
        }
    }
}

impl fmt::Display for ConsensusTier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConsensusTier::Lock => write!(f, "LOCK"),
            ConsensusTier::Strong => write!(f, "STRONG"),
            ConsensusTier::Safe => write!(f, "SAFE"),
            ConsensusTier::NearSafe => write!(f, "NEAR-SAFE"),
            ConsensusTier::Skip => write!(f, "SKIP"),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ConsensusResult {
    pub primary_probability: f64,
    pub secondary_probability: Option<f64>,
    pub point_in_bracket: Option<bool>,
    pub models_consulted: usize,
    pub models_agreeing: usize,
    pub blended_probability: f64,
    pub tier: ConsensusTier,
    pub kelly_multiplier: f64,
}

pub struct ConsensusEngine;

impl ConsensusEngine {
    /// Blend the ensemble models for a bracket and grade their agreement.
    ///
    /// `None` only when the primary model has no forecast for the bracket's date.
    /// A secondary forecast missing that date is treated as not supplied.
    pub fn evaluate(
        descriptor: &BracketDescriptor,
        primary: &EnsembleForecast,
        secondary: Option<&EnsembleForecast>,
        point_in_bracket: Option<bool>,
    ) -> Option<ConsensusResult> {
        let primary_probability = ProbabilityEngine::descriptor_probability(primary, descriptor)?;
        let secondary_probability =
            secondary.and_then(|f| ProbabilityEngine::descriptor_probability(f, descriptor));

        Some(Self::combine(primary_probability, secondary_probability, point_in_bracket))
    }

    pub fn combine(
        primary_probability: f64,
        secondary_probability: Option<f64>,
        point_in_bracket: Option<bool>,
    ) -> ConsensusResult {
        let primary_vote = primary_probability >= 0.5;

        let mut consulted = 1;
        let mut agreeing = 1;
        let mut weighted = primary_probability * PRIMARY_WEIGHT;
        let mut weights = PRIMARY_WEIGHT;

        if let Some(p) = secondary_probability {
            consulted += 1;
            if (p >= 0.5) == primary_vote {
                agreeing += 1;
            }
            weighted += p * SECONDARY_WEIGHT;
            weights += SECONDARY_WEIGHT;
        }

        // The point forecast votes but never enters the blend.
        if let Some(inside) = point_in_bracket {
            consulted += 1;
            if inside == primary_vote {
                agreeing += 1;
            }
        }

        let tier = ConsensusTier::classify(consulted, agreeing);

        ConsensusResult {
            primary_probability,
            secondary_probability,
            point_in_bracket,
            models_consulted: consulted,
            models_agreeing: agreeing,
            blended_probability: weighted / weights,
            tier,
            kelly_multiplier: tier.kelly_multiplier(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_primary_only_is_safe() {
        let result = ConsensusEngine::combine(0.64, None, None);
        assert_eq!(result.tier, ConsensusTier::Safe);
        assert_eq!(result.models_consulted, 1);
        assert_eq!(result.kelly_multiplier, 1.0);
        assert!((result.blended_probability - 0.64).abs() < 1e-12);
    }

    #[test]
    fn test_two_models_agreeing_is_lock() {
        let result = ConsensusEngine::combine(0.6, Some(0.7), None);
        assert_eq!(result.tier, ConsensusTier::Lock);
        assert_eq!(result.models_agreeing, 2);
        assert_eq!(result.kelly_multiplier, 1.5);
        assert!((result.blended_probability - (0.6 + 0.7 * 1.2) / 2.2).abs() < 1e-12);
    }

    #[test]
    fn test_two_models_split_is_near_safe() {
        let result = ConsensusEngine::combine(0.6, Some(0.2), None);
        assert_eq!(result.tier, ConsensusTier::NearSafe);
        assert_eq!(result.kelly_multiplier, 0.7);
    }

    #[test]
    fn test_two_of_three_is_strong() {
        let result = ConsensusEngine::combine(0.6, Some(0.55), Some(false));
        assert_eq!(result.models_consulted, 3);
        assert_eq!(result.models_agreeing, 2);
        assert_eq!(result.tier, ConsensusTier::Strong);
        assert_eq!(result.kelly_multiplier, 1.2);
    }

    #[test]
    fn test_outvoted_primary_is_skip() {
        let result = ConsensusEngine::combine(0.6, Some(0.1), Some(false));
        assert_eq!(result.models_agreeing, 1);
        assert_eq!(result.tier, ConsensusTier::Skip);
        assert_eq!(result.kelly_multiplier, 0.0);
    }

    #[test]
    fn test_point_forecast_votes_without_blending() {
        let result = ConsensusEngine::combine(0.3, None, Some(false));
        assert_eq!(result.tier, ConsensusTier::Lock);
        assert!((result.blended_probability - 0.3).abs() < 1e-12);
    }

    #[test]
    fn test_half_probability_votes_yes() {
        let result = ConsensusEngine::combine(0.5, Some(0.5), Some(true));
        assert_eq!(result.models_agreeing, 3);
        assert_eq!(result.tier, ConsensusTier::Lock);
    }

    #[test]
    fn test_classify_order() {
        assert_eq!(ConsensusTier::classify(3, 3), ConsensusTier::Lock);
        assert_eq!(ConsensusTier::classify(3, 2), ConsensusTier::Strong);
        assert_eq!(ConsensusTier::classify(1, 1), ConsensusTier::Safe);
        assert_eq!(ConsensusTier::classify(2, 1), ConsensusTier::NearSafe);
        assert_eq!(ConsensusTier::classify(3, 1), ConsensusTier::Skip);
        assert_eq!(ConsensusTier::classify(0, 0), ConsensusTier::Skip);
    }
}
