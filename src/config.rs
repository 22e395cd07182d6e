use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use std::time::Duration;

/// Tuning knobs for the job engine.
#[derive(Debug, Clone)]
pub struct EngineConfig {
    /// Amount demanded per job.
    pub price: Decimal,
    /// Payment unit the demand is denominated in.
    pub unit: String,
    /// Minimum length of the trimmed query text.
    pub min_input_len: usize,
    /// Delay between payment status polls in the monitor loop.
    pub poll_interval: Duration,
    /// If set, a monitor that has watched an unpaid job for this long
    /// cancels itself. The job record is left in `awaiting_payment`, exactly
    /// as if the caller had cancelled. `None` means watch indefinitely.
    pub awaiting_payment_timeout: Option<Duration>,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            price: dec!(10_000_000),
            unit: "lovelace".to_string(),
            min_input_len: 5,
            poll_interval: Duration::from_secs(5),
            awaiting_payment_timeout: None,
        }
    }
}
