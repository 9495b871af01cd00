use crate::strategies::types::Side;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EdgeResult {
    pub side: Side,
    /// Probability minus price on the chosen side.
    pub edge: f64,
    pub probability: f64,
    pub price: f64,
}

pub struct EdgeCalculator;

impl EdgeCalculator {
    /// Edges for buying YES and buying NO at the quoted prices.
    pub fn edges(probability: f64, yes_price: f64, no_price: f64) -> (f64, f64) {
        (probability - yes_price, (1.0 - probability) - no_price)
    }

    /// Pick the better-priced side, YES on ties. `None` when neither side has positive edge.
    pub fn evaluate(probability: f64, yes_price: f64, no_price: f64) -> Option<EdgeResult> {
        let (yes_edge, no_edge) = Self::edges(probability, yes_price, no_price);

        if yes_edge >= no_edge && yes_edge > 0.0 {
            Some(EdgeResult {
                side: Side::Yes,
                edge: yes_edge,
                probability,
                price: yes_price,
            })
        } else if no_edge > 0.0 {
            Some(EdgeResult {
                side: Side::No,
                edge: no_edge,
                probability: 1.0 - probability,
                price: no_price,
            })
        } else {
            None
        }
    }
}
