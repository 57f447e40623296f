//! Conversion between seconds and `HH:MM:SS.ff` timecodes.

/// The number of fractional digits used when none is configured.
pub const DEFAULT_PRECISION: usize = 2;

/// The largest supported number of fractional digits.
pub const MAX_PRECISION: usize = 6;

const WEIGHTS: [f64; 3] = [1.0, 60.0, 3600.0];

/// Renders `seconds` as `HH:MM:SS` followed by `precision` fractional
/// digits. Negative and non-finite input renders as zero.
///
/// ```
/// use proofing::timecode::format;
/// assert_eq!(format(12.5, 2), "00:00:12.50");
/// assert_eq!(format(3725.0, 3), "01:02:05.000");
/// ```
pub fn format(seconds: f64, precision: usize) -> String {
    let precision = precision.min(MAX_PRECISION);
    let seconds = if seconds.is_finite() {
        seconds.max(0.0)
    } else {
        0.0
    };

    // round the total first so carries propagate into the seconds
    let scale = 10u64.pow(precision as u32);
    let ticks = (seconds * scale as f64).round() as u64;
    let whole = ticks / scale;
    let fraction = ticks % scale;

    let hours = whole / 3600;
    let minutes = (whole / 60) % 60;
    let secs = whole % 60;

    if precision == 0 {
        format!("{:02}:{:02}:{:02}", hours, minutes, secs)
    } else {
        format!(
            "{:02}:{:02}:{:02}.{:0width$}",
            hours,
            minutes,
            secs,
            fraction,
            width = precision
        )
    }
}

/// Parses `H:M:S(.frac)`, `M:S(.frac)` or a bare number of seconds.
/// Returns `None` when the text cannot be interpreted.
///
/// ```
/// use proofing::timecode::parse;
/// assert_eq!(parse("00:01:00.00"), Some(60.0));
/// assert_eq!(parse("1:30"), Some(90.0));
/// assert_eq!(parse("7.25"), Some(7.25));
/// assert_eq!(parse("soon"), None);
/// ```
pub fn parse(text: &str) -> Option<f64> {
    let text = text.trim();

    if text.is_empty() {
        return None;
    }

    let segments = text.split(':').collect::<Vec<_>>();

    if segments.len() > WEIGHTS.len() {
        return None;
    }

    let mut total = 0.0;

    for (segment, weight) in segments.iter().rev().zip(WEIGHTS.iter()) {
        let value = segment.trim().parse::<f64>().ok()?;

        if !value.is_finite() || value < 0.0 {
            return None;
        }

        total += value * weight;
    }

    Some(total)
}
