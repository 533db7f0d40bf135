//! Bounded retry for transient BLE stack failures.

use std::future::Future;
use std::time::Duration;
use tracing::{debug, warn};

use crate::error::Result;

/// Run `op` up to `max_attempts` times, retrying only transient errors.
///
/// Non-transient errors (decode failures, missing characteristics) are
/// returned straight away. A `max_attempts` of zero is treated as one.
pub async fn retry_transient<T, F, Fut>(max_attempts: u32, delay: Duration, mut op: F) -> Result<T>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T>>,
{
    let max_attempts = max_attempts.max(1);
    let mut attempts = 0;

    loop {
        attempts += 1;

        match op().await {
            Ok(value) => return Ok(value),
            Err(e) if e.is_transient() && attempts < max_attempts => {
                warn!("Attempt {} of {} failed: {}", attempts, max_attempts, e);
                tokio::time::sleep(delay).await;
            }
            Err(e) => {
                debug!("Giving up after {} attempt(s): {}", attempts, e);
                return Err(e);
            }
        }
    }
}
