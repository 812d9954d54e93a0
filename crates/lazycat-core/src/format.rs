//! Text helpers for renderers.

use crate::phase::Phase;

/// `mm:ss`, truncating fractional seconds. Minutes are not wrapped into
/// hours, so 90 minutes renders as `90:00`.
pub fn format_clock(secs: f64) -> String {
    let total = whole_secs(secs);
    format!("{:02}:{:02}", total / 60, total % 60)
}

/// Hours with one decimal, e.g. `1.5h`.
pub fn format_hours(secs: f64) -> String {
    format!("{:.1}h", secs.max(0.0) / 3600.0)
}

/// `2h 5m`, or just `5m` under an hour.
pub fn format_hours_minutes(secs: f64) -> String {
    let total = whole_secs(secs);
    let hours = total / 3600;
    let minutes = (total % 3600) / 60;
    if hours > 0 {
        format!("{hours}h {minutes}m")
    } else {
        format!("{minutes}m")
    }
}

pub fn status_text(phase: Phase) -> &'static str {
    match phase {
        Phase::Onboarding => "Welcome",
        Phase::Working => "Focused work",
        Phase::Resting => "Stretch break",
        Phase::Paused(_) => "Paused",
    }
}

fn whole_secs(secs: f64) -> u64 {
    if secs.is_finite() && secs > 0.0 {
        secs as u64
    } else {
        0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::phase::BasePhase;

    #[test]
    fn clock_format() {
        assert_eq!(format_clock(2700.0), "45:00");
        assert_eq!(format_clock(599.9), "09:59");
        assert_eq!(format_clock(5400.0), "90:00");
        assert_eq!(format_clock(0.0), "00:00");
        assert_eq!(format_clock(-3.0), "00:00");
    }

    #[test]
    fn hours_format() {
        assert_eq!(format_hours(5400.0), "1.5h");
        assert_eq!(format_hours(0.0), "0.0h");
        assert_eq!(format_hours_minutes(7500.0), "2h 5m");
        assert_eq!(format_hours_minutes(300.0), "5m");
        assert_eq!(format_hours_minutes(59.0), "0m");
    }

    #[test]
    fn paused_status_wins() {
        assert_eq!(status_text(Phase::Paused(BasePhase::Resting)), "Paused");
        assert_eq!(status_text(Phase::Working), "Focused work");
    }
}
