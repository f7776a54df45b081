//! Metrics collection for observability
//!
//! Prometheus counters for the teller operations. Counters are incremented
//! by the actor; the service itself never logs or prints on the
//! success/failure path.
//!
//! # Metrics
//!
//! - `teller_deposits_total` - Successful deposits
//! - `teller_withdrawals_total` - Successful withdrawals
//! - `teller_transfers_total` - Successful transfers
//! - `teller_accounts_opened_total` - Accounts opened
//! - `teller_rejections_total` - Business rejections (validation, not-found, insufficient funds)
//! - `teller_op_duration_seconds` - Histogram of operation latencies

use prometheus::{Histogram, HistogramOpts, IntCounter, Registry};
use std::sync::Arc;

/// Metrics collector
#[derive(Clone, Debug)]
pub struct Metrics {
    /// Successful deposits
    pub deposits_total: IntCounter,

    /// Successful withdrawals
    pub withdrawals_total: IntCounter,

    /// Successful transfers
    pub transfers_total: IntCounter,

    /// Accounts opened
    pub accounts_opened_total: IntCounter,

    /// Business rejections
    pub rejections_total: IntCounter,

    /// Operation duration histogram
    pub op_duration: Histogram,

    /// Prometheus registry
    pub registry: Arc<Registry>,
}

impl Metrics {
    /// Create new metrics collector
    pub fn new() -> prometheus::Result<Self> {
        let registry = Arc::new(Registry::new());

        let deposits_total =
            IntCounter::new("teller_deposits_total", "Successful deposits")?;
        registry.register(Box::new(deposits_total.clone()))?;

        let withdrawals_total =
            IntCounter::new("teller_withdrawals_total", "Successful withdrawals")?;
        registry.register(Box::new(withdrawals_total.clone()))?;

        let transfers_total =
            IntCounter::new("teller_transfers_total", "Successful transfers")?;
        registry.register(Box::new(transfers_total.clone()))?;

        let accounts_opened_total =
            IntCounter::new("teller_accounts_opened_total", "Accounts opened")?;
        registry.register(Box::new(accounts_opened_total.clone()))?;

        let rejections_total = IntCounter::new(
            "teller_rejections_total",
            "Business rejections (validation, not-found, insufficient funds)",
        )?;
        registry.register(Box::new(rejections_total.clone()))?;

        let op_duration = Histogram::with_opts(
            HistogramOpts::new(
                "teller_op_duration_seconds",
                "Histogram of operation latencies",
            )
            .buckets(vec![0.001, 0.005, 0.010, 0.025, 0.050, 0.100, 0.250, 0.500, 1.0]),
        )?;
        registry.register(Box::new(op_duration.clone()))?;

        Ok(Self {
            deposits_total,
            withdrawals_total,
            transfers_total,
            accounts_opened_total,
            rejections_total,
            op_duration,
            registry,
        })
    }

    /// Record a successful deposit
    pub fn record_deposit(&self) {
        self.deposits_total.inc();
    }

    /// Record a successful withdrawal
    pub fn record_withdrawal(&self) {
        self.withdrawals_total.inc();
    }

    /// Record a successful transfer
    pub fn record_transfer(&self) {
        self.transfers_total.inc();
    }

    /// Record an opened account
    pub fn record_account_opened(&self) {
        self.accounts_opened_total.inc();
    }

    /// Record a business rejection
    pub fn record_rejection(&self) {
        self.rejections_total.inc();
    }

    /// Record operation duration
    pub fn record_op_duration(&self, duration_seconds: f64) {
        self.op_duration.observe(duration_seconds);
    }

    /// Get metrics registry
    pub fn registry(&self) -> &Registry {
        &self.registry
    }
}

impl Default for Metrics {
    fn default() -> Self {
        Self::new().expect("Failed to create metrics")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_metrics_creation() {
        let metrics = Metrics::new().unwrap();
        assert_eq!(metrics.deposits_total.get(), 0);
        assert_eq!(metrics.rejections_total.get(), 0);
    }

    #[test]
    fn test_record_operations() {
        let metrics = Metrics::new().unwrap();

        metrics.record_deposit();
        metrics.record_deposit();
        metrics.record_withdrawal();
        metrics.record_rejection();

        assert_eq!(metrics.deposits_total.get(), 2);
        assert_eq!(metrics.withdrawals_total.get(), 1);
        assert_eq!(metrics.rejections_total.get(), 1);
    }

    #[test]
    fn test_independent_instances() {
        let a = Metrics::new().unwrap();
        let b = Metrics::new().unwrap();

        a.record_transfer();
        assert_eq!(a.transfers_total.get(), 1);
        assert_eq!(b.transfers_total.get(), 0);
    }
}
