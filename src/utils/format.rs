//! Elapsed time formatting shared by both endpoints

/// Format a duration in seconds as `MM:SS.d`, or `HH:MM:SS.d` from one hour up.
///
/// Tenths are truncated, never rounded. Negative or non-finite input is shown as zero.
pub fn format_elapsed(seconds: f64) -> String {
    let seconds = if seconds.is_finite() && seconds > 0.0 { seconds } else { 0.0 };

    let whole = seconds.trunc() as u64;
    let hours = whole / 3600;
    let minutes = whole / 60 % 60;
    let secs = whole % 60;
    let tenths = ((seconds.fract() * 10.0) as u64).min(9);

    if hours > 0 {
        format!("{:02}:{:02}:{:02}.{}", hours, minutes, secs, tenths)
    } else {
        format!("{:02}:{:02}.{}", minutes, secs, tenths)
    }
}
