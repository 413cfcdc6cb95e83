//! Gateway metrics

use prometheus::{register_counter_vec, register_histogram_vec, CounterVec, HistogramVec};

lazy_static::lazy_static! {
    /// Mirror attempts by operation and outcome (mirrored | absorbed)
    pub static ref LEDGER_MIRROR_TOTAL: CounterVec = register_counter_vec!(
        "ledger_mirror_total",
        "Total ledger mirror attempts",
        &["operation", "outcome"]
    )
    .unwrap();

    /// RPC call duration per operation
    pub static ref LEDGER_RPC_DURATION: HistogramVec = register_histogram_vec!(
        "ledger_rpc_duration_seconds",
        "Ledger RPC call duration",
        &["operation"]
    )
    .unwrap();
}
