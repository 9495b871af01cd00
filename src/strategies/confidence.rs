use crate::strategies::consensus::ConsensusTier;
use crate::strategies::types::ConfidenceLabel;

/// One row of the label table. A row with neither condition always matches.
#[derive(Debug, Clone, Copy)]
pub struct LabelRule {
    pub label: ConfidenceLabel,
    pub min_edge: Option<f64>,
    pub tier: Option<ConsensusTier>,
}

impl LabelRule {
    pub fn matches(&self, edge: f64, tier: ConsensusTier) -> bool {
        if self.min_edge.is_none() && self.tier.is_none() {
            return true;
        }
        let by_edge = self.min_edge.map_or(false, |min| edge >= min);
        let by_tier = self.tier.map_or(false, |t| t == tier);
        by_edge || by_tier
    }
}

/// Checked in order; the first matching row labels the signal.
pub const LABEL_RULES: [LabelRule; 4] = [
    LabelRule {
        label: ConfidenceLabel::Lock,
        min_edge: Some(0.25),
        tier: Some(ConsensusTier::Lock),
    },
    LabelRule {
        label: ConfidenceLabel::Strong,
        min_edge: Some(0.15),
        tier: Some(ConsensusTier::Strong),
    },
    LabelRule { label: ConfidenceLabel::Safe, min_edge: Some(0.10), tier: None },
    LabelRule { label: ConfidenceLabel::NearSafe, min_edge: None, tier: None },
];

pub fn resolve_label(edge: f64, tier: ConsensusTier) -> ConfidenceLabel {
    LABEL_RULES
        .iter()
        .find(|rule| rule.matches(edge, tier))
        .map(|rule| rule.label)
        .unwrap_or(ConfidenceLabel::NearSafe)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_lock_by_edge() {
        assert_eq!(resolve_label(0.25, ConsensusTier::NearSafe), ConfidenceLabel::Lock);
    }

    #[test]
    fn test_lock_by_tier() {
        assert_eq!(resolve_label(0.06, ConsensusTier::Lock), ConfidenceLabel::Lock);
    }

    #[test]
    fn test_strong_by_edge() {
        assert_eq!(resolve_label(0.15, ConsensusTier::Safe), ConfidenceLabel::Strong);
        assert_eq!(resolve_label(0.2499, ConsensusTier::NearSafe), ConfidenceLabel::Strong);
    }

    #[test]
    fn test_strong_by_tier() {
        assert_eq!(resolve_label(0.07, ConsensusTier::Strong), ConfidenceLabel::Strong);
    }

    #[test]
    fn test_safe_by_edge_only() {
        assert_eq!(resolve_label(0.10, ConsensusTier::NearSafe), ConfidenceLabel::Safe);
        // A SAFE tier alone does not earn the SAFE label.
        assert_eq!(resolve_label(0.08, ConsensusTier::Safe), ConfidenceLabel::NearSafe);
    }

    #[test]
    fn test_fallback_near_safe() {
        assert_eq!(resolve_label(0.05, ConsensusTier::NearSafe), ConfidenceLabel::NearSafe);
    }
}
