const BYTES_PER_GB: f64 = (1024u64 * 1024 * 1024) as f64;

const SECONDS_PER_DAY: u64 = 86_400;

// Rounded to one decimal place.
pub fn bytes_to_gb(bytes: u64) -> f64 {
    round1(bytes as f64 / BYTES_PER_GB)
}

pub fn round1(value: f64) -> f64 {
    (value * 10.0).round() / 10.0
}

// NaN and out-of-range readings are pinned into [0, 100].
pub fn clamp_percent(value: f64) -> f64 {
    if value.is_nan() {
        return 0.0;
    }

    round1(value.clamp(0.0, 100.0))
}

pub fn ratio_percent(part: u64, whole: u64) -> f64 {
    if whole == 0 {
        return 0.0;
    }

    clamp_percent(part as f64 / whole as f64 * 100.0)
}

/// Renders a duration as `H:MM:SS`, prefixed with `N day, ` or `N days, `
/// once a full day has passed.
pub fn format_uptime(total_seconds: u64) -> String {
    let days = total_seconds / SECONDS_PER_DAY;
    let rest = total_seconds % SECONDS_PER_DAY;

    let hours = rest / 3600;
    let minutes = (rest % 3600) / 60;
    let seconds = rest % 60;

    let clock = format!("{}:{:02}:{:02}", hours, minutes, seconds);

    match days {
        0 => clock,
        1 => format!("1 day, {}", clock),
        _ => format!("{} days, {}", days, clock),
    }
}
