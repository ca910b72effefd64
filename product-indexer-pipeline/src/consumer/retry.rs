//! Linear-backoff retry for page fetches.

use std::future::Future;
use std::time::Duration;

use tracing::{info, warn};

use crate::errors::FetchError;

/// Run `operation` up to `max_attempts` times.
///
/// After failed attempt `n` the helper sleeps `base_delay * n` before trying
/// again; there is no sleep after the final attempt. The operation receives
/// the 1-based attempt number.
///
/// # Returns
///
/// * `Ok(T)` - The first successful result
/// * `Err(FetchError)` - The last cause, with the page and the number of attempts made
pub async fn retry_with_backoff<T, F, Fut>(
    page: u32,
    max_attempts: u32,
    base_delay: Duration,
    mut operation: F,
) -> Result<T, FetchError>
where
    F: FnMut(u32) -> Fut,
    Fut: Future<Output = Result<T, String>>,
{
    let attempts = max_attempts.max(1);
    let mut last_cause = String::new();

    for attempt in 1..=attempts {
        match operation(attempt).await {
            Ok(value) => {
                if attempt > 1 {
                    info!(page, attempt, "Fetch succeeded after retry");
                }
                return Ok(value);
            }
            Err(cause) => {
                if attempt < attempts {
                    let delay = base_delay * attempt;
                    warn!(
                        page,
                        attempt,
                        max_attempts = attempts,
                        delay_ms = delay.as_millis() as u64,
                        error = %cause,
                        "Fetch failed, retrying"
                    );
                    tokio::time::sleep(delay).await;
                }
                last_cause = cause;
            }
        }
    }

    Err(FetchError::new(page, attempts, last_cause))
}
