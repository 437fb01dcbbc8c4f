use lazy_static::lazy_static;

use crate::consistency::Consistency;
use prometheus::{
    register_histogram_vec, register_int_counter_vec, HistogramVec, IntCounterVec,
};

lazy_static! {
    pub static ref QUERY_DURATION: HistogramVec = register_histogram_vec!(
        "cqlkit_query_duration_seconds",
        "Query execution duration in seconds",
        &["driver", "consistency", "status"]
    ).unwrap();

    pub static ref QUERY_COUNTER: IntCounterVec = register_int_counter_vec!(
        "cqlkit_queries_total",
        "Total number of executed queries",
        &["consistency", "status"]
    ).unwrap();

    pub static ref BIND_FAILURES: IntCounterVec = register_int_counter_vec!(
        "cqlkit_bind_failures_total",
        "Queries rejected before reaching the driver",
        &["reason"]
    ).unwrap();
}

pub fn record_query(driver: &str, consistency: Consistency, success: bool, duration: f64) {
    let status = if success { "success" } else { "failure" };
    let consistency = consistency.label();
    QUERY_DURATION
        .with_label_values(&[driver, consistency, status])
        .observe(duration);
    QUERY_COUNTER
        .with_label_values(&[consistency, status])
        .inc();
}

pub fn record_rejected(reason: &str) {
    BIND_FAILURES.with_label_values(&[reason]).inc();
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_record_query_counts() {
        let before = QUERY_COUNTER
            .with_label_values(&["EACH_QUORUM", "failure"])
            .get();
        record_query("memory", Consistency::EACH_QUORUM, false, 0.002);
        let after = QUERY_COUNTER
            .with_label_values(&["EACH_QUORUM", "failure"])
            .get();
        assert_eq!(after, before + 1);
    }

    #[test]
    fn test_unknown_consistency_shares_label() {
        let before = QUERY_COUNTER.with_label_values(&["UNKNOWN", "success"]).get();
        record_query("memory", Consistency::from_code(0x42), true, 0.001);
        record_query("memory", Consistency::from_code(0xFF), true, 0.001);
        let after = QUERY_COUNTER.with_label_values(&["UNKNOWN", "success"]).get();
        assert_eq!(after, before + 2);

        let stray = QUERY_COUNTER.with_label_values(&["UNKNOWN_CONS_0x42", "success"]).get();
        assert_eq!(stray, 0);
    }
}
