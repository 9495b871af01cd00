use anyhow::Result;
use chrono::Utc;
use std::fs::OpenOptions;
use std::io::Write;
use crate::strategies::types::Signal;

const HEADER: &str = "timestamp,signal_id,condition_id,city,date,bracket_min,bracket_max,\
side,price,probability,edge,size,raw_kelly,tier,confidence";

pub struct CsvLogger {
    log_path: String,
}

impl CsvLogger {
    pub fn new(log_path: String) -> Result<Self> {
        // Create CSV file with headers if it doesn't exist
        if !std::path::Path::new(&log_path).exists() {
            let mut file = OpenOptions::new()
                .create(true)
                .write(true)
                .open(&log_path)?;

            writeln!(file, "{}", HEADER)?;
        }

        Ok(Self { log_path })
    }

    /// Append one emitted signal
    pub fn log_signal(&self, signal: &Signal) -> Result<()> {
        let mut file = OpenOptions::new()
            .append(true)
            .open(&self.log_path)?;

        writeln!(
            file,
            "{},{},{},{},{},{},{},{},{:.3},{:.4},{:.4},{:.2},{:.4},{},{}",
            signal.created_at.to_rfc3339(),
            signal.id,
            signal.market.condition_id,
            signal.market.city,
            signal.market.date,
            signal.market.bracket_min,
            signal.market.bracket_max,
            signal.side,
            signal.entry_price,
            signal.probability,
            signal.edge,
            signal.size,
            signal.raw_kelly,
            signal.consensus_tier,
            signal.confidence
        )?;

        Ok(())
    }

    /// Log a free-form event
    pub fn log_event(&self, event: &str) -> Result<()> {
        let mut file = OpenOptions::new()
            .append(true)
            .open(&self.log_path)?;

        writeln!(file, "{},EVENT,{},,,,,,,,,,,,", Utc::now().to_rfc3339(), event)?;

        Ok(())
    }
}
