use chrono::Utc;
use rand::Rng;
use crate::config::PaperTradingConfig;
use crate::execution::types::{Fill, Order};
use crate::strategies::types::Signal;
use tracing::info;

pub struct PaperTradingSimulator {
    config: PaperTradingConfig,
    balance: f64,
}

impl PaperTradingSimulator {
    pub fn new(config: PaperTradingConfig, initial_balance: f64) -> Self {
        info!("Paper trading simulator initialized with ${:.2}", initial_balance);

        Self {
            config,
            balance: initial_balance,
        }
    }

    /// Simulate buying the signal's token
    pub fn execute_signal(&mut self, signal: &Signal) -> Option<Fill> {
        self.execute_order(&Order::from_signal(signal))
    }

    /// Simulate order execution
    pub fn execute_order(&mut self, order: &Order) -> Option<Fill> {
        let mut rng = rand::thread_rng();
        let will_fill = rng.gen::<f64>() < self.config.fill_rate;

        if !will_fill {
            info!("Order not filled (simulated rejection)");
            return None;
        }

        // Slippage only ever worsens the price; a token never costs $1 or more.
        let slippage = rng.gen::<f64>() * self.config.slippage_pct;
        let executed_price = (order.price * (1.0 + slippage)).min(0.999);

        let cost = order.shares * executed_price;

        if cost > self.balance {
            info!("Insufficient balance for order");
            return None;
        }

        self.balance -= cost;

        info!(
            "Order filled: {} {} {:.2} shares @ ${:.3} (slippage: {:.2}%)",
            order.condition_id,
            order.side,
            order.shares,
            executed_price,
            slippage * 100.0
        );

        Some(Fill {
            signal_id: order.signal_id.clone(),
            condition_id: order.condition_id.clone(),
            side: order.side,
            shares: order.shares,
            price: executed_price,
            cost,
            timestamp: Utc::now(),
        })
    }

    pub fn balance(&self) -> f64 {
        self.balance
    }

    /// Credit a settled position's payout
    pub fn add_to_balance(&mut self, amount: f64) {
        self.balance += amount;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::strategies::types::Side;

    fn order(shares: f64) -> Order {
        Order {
            signal_id: "sig-1".to_string(),
            condition_id: "0xabc".to_string(),
            token_id: "yes-1".to_string(),
            side: Side::Yes,
            price: 0.20,
            shares,
        }
    }

    fn simulator(fill_rate: f64) -> PaperTradingSimulator {
        PaperTradingSimulator::new(
            PaperTradingConfig {
                enabled: true,
                fill_rate,
                slippage_pct: 0.0,
            },
            100.0,
        )
    }

    #[test]
    fn test_certain_fill_debits_balance() {
        let mut sim = simulator(1.0);
        let fill = sim.execute_order(&order(25.0)).unwrap();

        assert!((fill.cost - 5.0).abs() < 1e-9);
        assert_eq!(fill.signal_id, "sig-1");
        assert!((sim.balance() - 95.0).abs() < 1e-9);
    }

    #[test]
    fn test_never_fill() {
        let mut sim = simulator(0.0);
        assert!(sim.execute_order(&order(25.0)).is_none());
        assert!((sim.balance() - 100.0).abs() < 1e-9);
    }

    #[test]
    fn test_insufficient_balance() {
        let mut sim = simulator(1.0);
        assert!(sim.execute_order(&order(1000.0)).is_none());

        sim.add_to_balance(200.0);
        assert!(sim.execute_order(&order(1000.0)).is_some());
    }
}
