use anyhow::Result;
use chrono::{DateTime, Utc};
use rusqlite::{params, Connection};
use crate::data::types::OpenPosition;
use crate::strategies::types::Signal;

/// SQLite record of emitted signals. A signal stays an open position until settled.
pub struct SignalStore {
    conn: Connection,
}

impl SignalStore {
    pub fn new(db_path: &str) -> Result<Self> {
        let conn = Connection::open(db_path)?;

        conn.execute_batch(
            r#"
            CREATE TABLE IF NOT EXISTS signals (
                id TEXT PRIMARY KEY,
                condition_id TEXT NOT NULL,
                city TEXT NOT NULL,
                market_date TEXT NOT NULL,
                side TEXT NOT NULL,
                token_id TEXT NOT NULL,
                probability REAL NOT NULL,
                entry_price REAL NOT NULL,
                edge REAL NOT NULL,
                size REAL NOT NULL,
                raw_kelly REAL NOT NULL,
                confidence TEXT NOT NULL,
                consensus_tier TEXT NOT NULL,
                created_at TIMESTAMP NOT NULL,
                settled_at TIMESTAMP,
                pnl REAL,
                status TEXT NOT NULL DEFAULT 'open'
            );

            CREATE INDEX IF NOT EXISTS idx_signals_status ON signals(status);
            CREATE INDEX IF NOT EXISTS idx_signals_condition_id ON signals(condition_id);
            "#
        )?;

        Ok(Self { conn })
    }

    pub fn insert_signal(&self, signal: &Signal) -> Result<()> {
        self.conn.execute(
            "INSERT INTO signals (id, condition_id, city, market_date, side, token_id,
                                  probability, entry_price, edge, size, raw_kelly,
                                  confidence, consensus_tier, created_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14)",
            params![
                signal.id,
                signal.market.condition_id,
                signal.market.city,
                signal.market.date.to_string(),
                signal.side.to_string(),
                signal.token_id(),
                signal.probability,
                signal.entry_price,
                signal.edge,
                signal.size,
                signal.raw_kelly,
                signal.confidence.to_string(),
                signal.consensus_tier.to_string(),
                signal.created_at.to_rfc3339(),
            ],
        )?;

        Ok(())
    }

    pub fn open_positions(&self) -> Result<Vec<OpenPosition>> {
        let mut stmt = self.conn.prepare(
            "SELECT condition_id, city, size, created_at
             FROM signals
             WHERE status = 'open'
             ORDER BY created_at"
        )?;

        let rows = stmt.query_map([], |row| {
            Ok((
                row.get::<_, String>(0)?,
                row.get::<_, String>(1)?,
                row.get::<_, f64>(2)?,
                row.get::<_, String>(3)?,
            ))
        })?;

        let mut positions = Vec::new();
        for row in rows {
            let (condition_id, city, size, created_at) = row?;
            let opened_at = DateTime::parse_from_rfc3339(&created_at)?.with_timezone(&Utc);
            positions.push(OpenPosition {
                condition_id,
                city,
                size,
                opened_at,
            });
        }

        Ok(positions)
    }

    pub fn count_open_positions(&self) -> Result<usize> {
        let count: usize = self.conn.query_row(
            "SELECT COUNT(*) FROM signals WHERE status = 'open'",
            [],
            |row| row.get(0),
        )?;
        Ok(count)
    }

    /// Mark every open signal on a market as settled. Returns rows updated.
    pub fn close_position(&self, condition_id: &str, pnl: f64) -> Result<usize> {
        let updated = self.conn.execute(
            "UPDATE signals
             SET status = 'settled', settled_at = ?1, pnl = ?2
             WHERE condition_id = ?3 AND status = 'open'",
            params![Utc::now().to_rfc3339(), pnl, condition_id],
        )?;
        Ok(updated)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::types::{BracketDescriptor, BracketType, Metric};
    use crate::strategies::consensus::ConsensusTier;
    use crate::strategies::types::{ConfidenceLabel, Side};
    use chrono::{NaiveDate, TimeZone};

    fn signal(id: &str, condition_id: &str) -> Signal {
        let created_at = Utc.with_ymd_and_hms(2026, 1, 13, 12, 0, 0).unwrap();
        Signal {
            id: id.to_string(),
            market: BracketDescriptor {
                condition_id: condition_id.to_string(),
                city: "nyc".to_string(),
                date: NaiveDate::from_ymd_opt(2026, 1, 15).unwrap(),
                metric: Metric::High,
                bracket_type: BracketType::Above,
                bracket_min: 50.0,
                bracket_max: f64::INFINITY,
                yes_token_id: "y".to_string(),
                no_token_id: "n".to_string(),
                yes_price: 0.2,
                no_price: 0.8,
                volume: 1000.0,
                settlement_time: created_at,
            },
            side: Side::No,
            probability: 0.9,
            entry_price: 0.8,
            edge: 0.1,
            size: 4.25,
            raw_kelly: 0.5,
            confidence: ConfidenceLabel::Safe,
            consensus_tier: ConsensusTier::Safe,
            created_at,
        }
    }

    #[test]
    fn test_insert_and_read_open_positions() {
        let store = SignalStore::new(":memory:").unwrap();
        store.insert_signal(&signal("s1", "0x1")).unwrap();
        store.insert_signal(&signal("s2", "0x2")).unwrap();

        let open = store.open_positions().unwrap();
        assert_eq!(open.len(), 2);
        assert_eq!(open[0].city, "nyc");
        assert!((open[0].size - 4.25).abs() < 1e-12);
        assert_eq!(store.count_open_positions().unwrap(), 2);
    }

    #[test]
    fn test_close_position() {
        let store = SignalStore::new(":memory:").unwrap();
        store.insert_signal(&signal("s1", "0x1")).unwrap();

        assert_eq!(store.close_position("0x1", -4.25).unwrap(), 1);
        assert_eq!(store.close_position("0x1", -4.25).unwrap(), 0);
        assert!(store.open_positions().unwrap().is_empty());
    }

    #[test]
    fn test_duplicate_signal_id_rejected() {
        let store = SignalStore::new(":memory:").unwrap();
        store.insert_signal(&signal("s1", "0x1")).unwrap();
        assert!(store.insert_signal(&signal("s1", "0x1")).is_err());
    }
}
