//! NPS arithmetic shared by the SQL and in-memory aggregation paths.

/// Net Promoter Score: `(promoters - detractors) / total * 100`.
///
/// Always within [-100, 100]; returns 0 when `total` is zero.
pub fn nps_score(promoters: i64, detractors: i64, total: i64) -> f64 {
    if total <= 0 {
        return 0.0;
    }
    let raw = (promoters - detractors) as f64 / total as f64 * 100.0;
    raw.clamp(-100.0, 100.0)
}

/// `part / whole * 100`, or 0 when `whole` is zero.
pub fn percentage(part: i64, whole: i64) -> f64 {
    if whole <= 0 {
        return 0.0;
    }
    part as f64 / whole as f64 * 100.0
}

/// Round to a fixed number of decimal places. Non-finite input becomes 0.
pub fn round_to(value: f64, decimals: u32) -> f64 {
    if !value.is_finite() {
        return 0.0;
    }
    let factor = 10f64.powi(decimals as i32);
    (value * factor).round() / factor
}

/// Mean of a sum over a count, or 0 when the count is zero.
pub fn mean(sum: f64, count: i64) -> f64 {
    if count <= 0 {
        return 0.0;
    }
    sum / count as f64
}
