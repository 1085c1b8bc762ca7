// src/utils/deadline.rs

//! Host deadline helpers.

use std::time::{Duration, SystemTime};

use tokio::time::Instant;

use crate::error::{AppError, Result};

/// Convert a wall-clock deadline into a monotonic one, reserving `margin`.
///
/// A deadline already inside the margin maps to "now".
pub fn deadline_from_system_time(deadline: SystemTime, margin: Duration) -> Instant {
    let remaining = deadline
        .duration_since(SystemTime::now())
        .unwrap_or_default()
        .saturating_sub(margin);
    Instant::now() + remaining
}

/// Whether `deadline` is set and has passed.
pub fn expired(deadline: Option<Instant>) -> bool {
    deadline.is_some_and(|deadline| Instant::now() >= deadline)
}

/// Fail with [`AppError::DeadlineExceeded`] if `deadline` has passed.
pub fn check(deadline: Option<Instant>, stage: &'static str) -> Result<()> {
    if expired(deadline) {
        return Err(AppError::DeadlineExceeded { stage });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_no_deadline_always_passes() {
        assert!(check(None, "publishing").is_ok());
        assert!(!expired(None));
    }

    #[tokio::test(start_paused = true)]
    async fn test_deadline_expires() {
        let deadline = Instant::now() + Duration::from_millis(100);
        assert!(check(Some(deadline), "publishing").is_ok());

        tokio::time::advance(Duration::from_millis(100)).await;
        assert!(matches!(
            check(Some(deadline), "publishing"),
            Err(AppError::DeadlineExceeded { stage: "publishing" })
        ));
    }

    #[test]
    fn test_past_system_deadline_maps_to_now() {
        let past = SystemTime::now() - Duration::from_secs(5);
        let before = Instant::now();
        let deadline = deadline_from_system_time(past, Duration::from_millis(500));
        assert!(deadline >= before);
        assert!(deadline <= Instant::now());
    }
}
