//! Display formatting for flow rows

use chrono::{DateTime, Local, TimeZone, Utc};

use crate::flow::Timestamp;

/// Pretty-print a flow duration given in microseconds.
///
/// Three significant digits, in milliseconds below one second and in seconds
/// above.
pub fn format_duration_us(duration_us: i64) -> String {
    let ms = duration_us as f64 / 1000.0;
    if ms > 1000.0 {
        format!("{} s", to_precision(ms / 1000.0, 3))
    } else {
        format!("{} ms", to_precision(ms, 3))
    }
}

/// Wall-clock time of a flow start with tenths of a second, in local time.
pub fn format_flow_time(ts: Timestamp) -> String {
    format_flow_time_in(ts, &Local)
}

/// Same as [`format_flow_time`] with an explicit timezone.
pub fn format_flow_time_in<Tz: TimeZone>(ts: Timestamp, tz: &Tz) -> String
where
    Tz::Offset: std::fmt::Display,
{
    match DateTime::<Utc>::from_timestamp_micros(ts) {
        Some(dt) => {
            let local = dt.with_timezone(tz);
            let tenths = local.timestamp_subsec_millis() / 100;
            format!("{}.{}", local.format("%H:%M:%S"), tenths)
        }
        None => "--:--:--.-".to_string(),
    }
}

/// Format `value` with `digits` significant digits, without exponent.
///
/// Integer parts wider than `digits` are printed in full (`1234567`), and a
/// value rounding up to the next power of ten keeps the plain form
/// (`999.6` gives `1000`).
fn to_precision(value: f64, digits: i32) -> String {
    if value == 0.0 || !value.is_finite() {
        return format!("{:.*}", (digits - 1).max(0) as usize, 0.0);
    }
    let magnitude = value.abs().log10().floor() as i32;
    let decimals = (digits - 1 - magnitude).max(0) as usize;
    format!("{value:.decimals$}")
}
