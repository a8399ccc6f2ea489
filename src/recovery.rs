//! Recovery helpers for optional loader code paths

use std::thread;
use std::time::Duration;

use tracing::warn;

use crate::error::{GuidelineError, Result};

/// Run `primary`, falling back to `fallback` when it fails.
///
/// When both fail the error carries both causes.
pub(crate) fn with_fallback<T, P, F>(primary: P, fallback: F, label: &str) -> Result<T>
where
    P: FnOnce() -> Result<T>,
    F: FnOnce() -> Result<T>,
{
    match primary() {
        Ok(value) => Ok(value),
        Err(primary_err) => {
            warn!(operation = label, error = %primary_err, "primary source failed, using fallback");
            fallback().map_err(|fallback_err| GuidelineError::Fallback {
                label: label.to_string(),
                primary: Box::new(primary_err),
                fallback: Box::new(fallback_err),
            })
        }
    }
}

/// Run `op` up to `max_retries + 1` times, doubling the delay after each failure
pub(crate) fn retry<T, F>(mut op: F, max_retries: u32, backoff: Duration) -> Result<T>
where
    F: FnMut() -> Result<T>,
{
    let mut delay = backoff;
    let mut attempt = 0;
    loop {
        match op() {
            Ok(value) => return Ok(value),
            Err(e) if attempt < max_retries => {
                attempt += 1;
                warn!(attempt, max_retries, error = %e, "operation failed, retrying");
                thread::sleep(delay);
                delay = delay.saturating_mul(2);
            }
            Err(e) => return Err(e),
        }
    }
}

/// Use `preferred` when available, otherwise continue with `degraded`
pub(crate) fn graceful_degradation<T, P, D>(preferred: P, degraded: D, feature: &str) -> T
where
    P: FnOnce() -> Result<T>,
    D: FnOnce() -> T,
{
    match preferred() {
        Ok(value) => value,
        Err(e) => {
            warn!(feature, error = %e, "feature unavailable, continuing without it");
            degraded()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn failing(message: &str) -> Result<u32> {
        Err(GuidelineError::Data(message.to_string()))
    }

    #[test]
    fn fallback_used_when_primary_fails() {
        let value = with_fallback(|| failing("primary"), || Ok(7), "answer").unwrap();
        assert_eq!(value, 7);
    }

    #[test]
    fn fallback_error_keeps_both_causes() {
        let err = with_fallback(|| failing("first"), || failing("second"), "answer").unwrap_err();
        let rendered = err.to_string();
        assert!(rendered.contains("first"));
        assert!(rendered.contains("second"));
    }

    #[test]
    fn retry_succeeds_after_transient_failures() {
        let mut calls = 0;
        let value = retry(
            || {
                calls += 1;
                if calls < 3 {
                    failing("transient")
                } else {
                    Ok(calls)
                }
            },
            3,
            Duration::from_millis(1),
        )
        .unwrap();
        assert_eq!(value, 3);
    }

    #[test]
    fn retry_gives_up() {
        let mut calls = 0;
        let result = retry(
            || {
                calls += 1;
                failing("always")
            },
            2,
            Duration::ZERO,
        );
        assert!(result.is_err());
        assert_eq!(calls, 3);
    }

    #[test]
    fn degraded_value_when_feature_missing() {
        let rules: Vec<String> = graceful_degradation(|| Err(GuidelineError::Data("gone".into())), Vec::new, "axe");
        assert!(rules.is_empty());
    }
}
