/// Format hashrate with appropriate unit (H/s, kH/s, MH/s, GH/s, TH/s)
///
/// Negative and non-finite rates render as `0.00 H/s`.
pub fn format_hashrate(hashrate: f64) -> String {
    let hashrate = if hashrate.is_finite() && hashrate > 0.0 {
        hashrate
    } else {
        0.0
    };

    if hashrate >= 1e12 {
        format!("{:.2} TH/s", hashrate / 1e12)
    } else if hashrate >= 1e9 {
        format!("{:.2} GH/s", hashrate / 1e9)
    } else if hashrate >= 1e6 {
        format!("{:.2} MH/s", hashrate / 1e6)
    } else if hashrate >= 1e3 {
        format!("{:.2} kH/s", hashrate / 1e3)
    } else {
        format!("{:.2} H/s", hashrate)
    }
}

/// Format a USD amount with two decimals, e.g. `$12.34`
pub fn format_usd(amount: f64) -> String {
    if amount.is_finite() {
        format!("${:.2}", amount)
    } else {
        "$0.00".to_string()
    }
}
