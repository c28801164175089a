use crate::time_series::WpmTrace;

/// Compute X (seconds) and Y (WPM) bounds for the results chart
pub fn compute_chart_params(trace: &WpmTrace, fallback_secs: f64) -> (f64, f64) {
    let highest_wpm = trace.peak();

    let overall_duration = match trace.points().last() {
        Some(p) => p.t,
        None => fallback_secs,
    };

    (overall_duration.max(1.0), highest_wpm.round().max(1.0))
}

/// Format a simple numeric label consistently
pub fn format_label(val: f64) -> String {
    if (val - val.round()).abs() < f64::EPSILON {
        format!("{}", val.round())
    } else {
        format!("{val:.2}")
    }
}
