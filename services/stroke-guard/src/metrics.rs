use lazy_static::lazy_static;
use prometheus::{
    register_int_counter, register_int_counter_vec, Encoder, IntCounter, IntCounterVec,
    TextEncoder,
};

lazy_static! {
    // Scoring
    pub static ref RISK_ASSESSMENTS: IntCounterVec = register_int_counter_vec!(
        "risk_assessments_total",
        "Risk assessments by resulting label and originating flow",
        &["risk_level", "source"]
    ).expect("metric can be created");

    // Records
    pub static ref PATIENT_RECORDS_CHANGED: IntCounterVec = register_int_counter_vec!(
        "patient_records_changed_total",
        "Patient record writes by operation",
        &["operation"]
    ).expect("metric can be created");

    pub static ref PATIENTS_IMPORTED: IntCounter = register_int_counter!(
        "patients_imported_total",
        "Patients created by bulk import"
    ).expect("metric can be created");

    // Auth
    pub static ref AUTH_ATTEMPTS: IntCounterVec = register_int_counter_vec!(
        "auth_attempts_total",
        "Login attempts by outcome",
        &["outcome"]
    ).expect("metric can be created");

    pub static ref RATE_LIMITED: IntCounter = register_int_counter!(
        "rate_limited_requests_total",
        "Requests rejected by the rate limiter"
    ).expect("metric can be created");
}

/// Generate metrics output in Prometheus text format
pub fn render() -> Result<String, Box<dyn std::error::Error>> {
    let encoder = TextEncoder::new();
    let metric_families = prometheus::gather();
    let mut buffer = vec![];
    encoder.encode(&metric_families, &mut buffer)?;
    Ok(String::from_utf8(buffer)?)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_render_includes_counters() {
        RISK_ASSESSMENTS.with_label_values(&["High Risk", "test"]).inc();
        PATIENTS_IMPORTED.inc();

        let output = render().unwrap();
        assert!(output.contains("risk_assessments_total"));
        assert!(output.contains("patients_imported_total"));
    }
}
