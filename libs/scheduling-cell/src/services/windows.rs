use tracing::warn;

use crate::error::SchedulingError;
use crate::models::WorkingWindow;

/// Write-time checks for a professional's weekly schedule: every window has
/// `start < end`, and no two windows on the same weekday overlap (enabled or not).
pub fn validate_weekly_windows(windows: &[WorkingWindow]) -> Result<(), SchedulingError> {
    for window in windows {
        window.check_bounds()?;
    }

    for (i, window) in windows.iter().enumerate() {
        if let Some(other) = windows[i + 1..].iter().find(|other| window.overlaps(other)) {
            warn!(
                "Rejected overlapping windows on {:?}: {}-{} and {}-{}",
                window.weekday, window.start, window.end, other.start, other.end
            );
            return Err(SchedulingError::invalid(format!(
                "working windows overlap on {:?}: {}-{} and {}-{}",
                window.weekday, window.start, window.end, other.start, other.end
            )));
        }
    }

    Ok(())
}
