//! Race a network call against a fixed-duration timer.
//!
//! Only one outcome is ever observed: the operation's value if it finishes
//! first, otherwise [`TimedOut`]. Whichever side loses is dropped.

use futures::future::{self, Either};
use std::fmt;
use std::future::Future;
use std::pin::pin;
use std::time::Duration;
use tokio::time::sleep;
use tracing::{debug, warn};

/// The timer elapsed before the operation completed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TimedOut {
    pub after: Duration,
}

impl fmt::Display for TimedOut {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "operation timed out after {:?}", self.after)
    }
}

impl std::error::Error for TimedOut {}

/// Run `operation` and a timer of `limit` concurrently.
///
/// # Example
///
/// ```ignore
/// let body = race_with_timeout(client.get(url).send(), Duration::from_secs(10)).await?;
/// ```
pub async fn race_with_timeout<F>(operation: F, limit: Duration) -> Result<F::Output, TimedOut>
where
    F: Future,
{
    let operation = pin!(operation);
    let timer = pin!(sleep(limit));

    match future::select(operation, timer).await {
        Either::Left((value, _timer)) => {
            debug!(?limit, "operation finished before timer");
            Ok(value)
        }
        Either::Right(((), _operation)) => {
            warn!(?limit, "operation lost the race against the timer");
            Err(TimedOut { after: limit })
        }
    }
}
