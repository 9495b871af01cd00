use chrono::NaiveDate;
use crate::data::types::{BracketDescriptor, BracketType, EnsembleForecast, Metric};

/// Share of ensemble members satisfying a condition.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MemberProbability {
    pub probability: f64,
    pub members_in: usize,
    pub members_total: usize,
}

impl MemberProbability {
    fn count(members: &[f64], predicate: impl Fn(f64) -> bool) -> Self {
        let members_total = members.len();
        if members_total == 0 {
            return Self {
                probability: 0.0,
                members_in: 0,
                members_total: 0,
            };
        }

        let members_in = members.iter().filter(|v| predicate(**v)).count();

        Self {
            probability: members_in as f64 / members_total as f64,
            members_in,
            members_total,
        }
    }
}

/// Counts ensemble members against bracket bounds.
///
/// All bounds are half-open: a member equal to `min` is in, a member equal to `max` is out.
pub struct ProbabilityEngine;

impl ProbabilityEngine {
    /// Fraction of members with `min <= value < max`.
    pub fn bucket_probability(members: &[f64], min: f64, max: f64) -> MemberProbability {
        MemberProbability::count(members, |v| v >= min && v < max)
    }

    /// Fraction of members with `value >= threshold`.
    pub fn above_probability(members: &[f64], threshold: f64) -> MemberProbability {
        MemberProbability::count(members, |v| v >= threshold)
    }

    /// Fraction of members with `value < threshold`.
    pub fn below_probability(members: &[f64], threshold: f64) -> MemberProbability {
        MemberProbability::count(members, |v| v < threshold)
    }

    /// Probability that `metric` on `date` lands in the descriptor's bracket.
    ///
    /// Returns `None` when the forecast has no entry for the date.
    pub fn bracket_probability(
        forecast: &EnsembleForecast,
        date: NaiveDate,
        metric: Metric,
        bracket_type: BracketType,
        min: f64,
        max: f64,
    ) -> Option<MemberProbability> {
        let members = forecast.for_date(date)?.members(metric);

        Some(match bracket_type {
            BracketType::Above => Self::above_probability(members, min),
            BracketType::Below => Self::below_probability(members, max),
            BracketType::Between => Self::bucket_probability(members, min, max),
        })
    }

    pub fn descriptor_probability(
        forecast: &EnsembleForecast,
        descriptor: &BracketDescriptor,
    ) -> Option<f64> {
        Self::bracket_probability(
            forecast,
            descriptor.date,
            descriptor.metric,
            descriptor.bracket_type,
            descriptor.bracket_min,
            descriptor.bracket_max,
        )
        .map(|p| p.probability)
    }
}
