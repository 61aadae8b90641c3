//! Human-readable duration formatting for log output
//!
//! Format is chosen by magnitude:
//! - Short (`X.XXs`): below 100 seconds
//! - Medium (`M:SS.Xs`): below 100 minutes
//! - Long (`H:MM:SS`): anything longer

use std::time::Duration;

/// Hundredths of a second at which the short format ends (100 s)
const SHORT_FORMAT_MAX_CENTIS: u128 = 10_000;
/// Tenths of a second at which the medium format ends (100 min)
const MEDIUM_FORMAT_MAX_TENTHS: u128 = 60_000;

/// Format a duration for log messages.
///
/// # Examples
///
/// ```
/// use std::time::Duration;
/// use loopfade_common::human_time::format_duration;
///
/// assert_eq!(format_duration(Duration::from_millis(10)), "0.01s");
/// assert_eq!(format_duration(Duration::from_secs(10)), "10.00s");
/// assert_eq!(format_duration(Duration::from_secs(330)), "5:30.0s");
/// assert_eq!(format_duration(Duration::from_secs(7200)), "2:00:00");
/// ```
pub fn format_duration(duration: Duration) -> String {
    let ms = duration.as_millis();

    // Round to the displayed precision before splitting into fields
    let centis = (ms + 5) / 10;
    if centis < SHORT_FORMAT_MAX_CENTIS {
        return format!("{}.{:02}s", centis / 100, centis % 100);
    }

    let tenths = (ms + 50) / 100;
    if tenths < MEDIUM_FORMAT_MAX_TENTHS {
        let minutes = tenths / 600;
        let rest = tenths % 600;
        return format!("{}:{:02}.{}s", minutes, rest / 10, rest % 10);
    }

    let total_secs = (ms + 500) / 1000;
    let hours = total_secs / 3600;
    let mins = (total_secs % 3600) / 60;
    let secs = total_secs % 60;
    format!("{}:{:02}:{:02}", hours, mins, secs)
}

/// Format a millisecond count, as carried in config files
pub fn format_millis(ms: u64) -> String {
    format_duration(Duration::from_millis(ms))
}
