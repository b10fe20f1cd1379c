//! Poll-until-stable engine.
//!
//! The platform provisions most objects asynchronously: a create call is
//! accepted long before the object is usable. [`await_state`] re-reads the
//! object on a fixed interval until it reaches one of the requested
//! [`LifecycleState`]s, the timeout elapses, or the operation is cancelled.
//!
//! # Example
//!
//! ```
//! use std::time::Duration;
//! use confluent_provider::status::LifecycleState;
//! use confluent_provider::wait::{await_state, Observation, WaitOptions};
//! use tokio_util::sync::CancellationToken;
//!
//! # #[tokio::main(flavor = "current_thread")]
//! # async fn main() {
//! let options = WaitOptions::new(Duration::from_secs(60), Duration::from_millis(10));
//! let cancel = CancellationToken::new();
//! let result = await_state(
//!     || async { Ok(Observation::new(LifecycleState::Stable, "ready")) },
//!     &[LifecycleState::Stable],
//!     options,
//!     &cancel,
//! )
//! .await
//! .unwrap();
//! assert_eq!(result.state, LifecycleState::Stable);
//! # }
//! ```

use std::future::Future;
use std::time::Duration;

use tokio::time::Instant;
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

use crate::error::ProviderError;
use crate::status::LifecycleState;

/// Timing parameters for a wait.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WaitOptions {
    /// Maximum time to keep polling.
    pub timeout: Duration,
    /// Fixed delay between reads.
    pub poll_interval: Duration,
}

impl WaitOptions {
    /// Create wait options.
    pub const fn new(timeout: Duration, poll_interval: Duration) -> Self {
        Self {
            timeout,
            poll_interval,
        }
    }

    /// Override the timeout.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Override the poll interval.
    pub fn with_poll_interval(mut self, poll_interval: Duration) -> Self {
        self.poll_interval = poll_interval;
        self
    }
}

impl Default for WaitOptions {
    fn default() -> Self {
        Self::new(Duration::from_secs(20 * 60), Duration::from_secs(10))
    }
}

/// One read of a remote object.
#[derive(Debug, Clone, PartialEq)]
pub struct Observation<T> {
    /// The classified state.
    pub state: LifecycleState,
    /// The remote representation. `None` when the object is gone.
    pub remote: Option<T>,
}

impl<T> Observation<T> {
    /// An observation of an existing object.
    pub fn new(state: LifecycleState, remote: T) -> Self {
        Self {
            state,
            remote: Some(remote),
        }
    }

    /// An observation of an object that no longer exists.
    pub fn deleted() -> Self {
        Self {
            state: LifecycleState::Deleted,
            remote: None,
        }
    }
}

/// Poll `read` until the object reaches one of `targets`.
///
/// - `read` is called immediately; if the first observation is already a
///   target it is returned without sleeping.
/// - A [`ProviderError::NotFound`] from `read` counts as
///   [`LifecycleState::Deleted`] when that state is a target. Every other error
///   is returned immediately and never retried.
/// - Between reads the engine sleeps `poll_interval`, never past the deadline.
///   Once `timeout` has elapsed without reaching a target, a
///   [`ProviderError::Timeout`] carrying the last observed state is returned.
/// - `cancel` is checked before each read and interrupts each sleep, yielding
///   [`ProviderError::Cancelled`].
pub async fn await_state<T, F, Fut>(
    mut read: F,
    targets: &[LifecycleState],
    options: WaitOptions,
    cancel: &CancellationToken,
) -> Result<Observation<T>, ProviderError>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<Observation<T>, ProviderError>>,
{
    let start = Instant::now();
    let accepts_deleted = targets.contains(&LifecycleState::Deleted);
    let mut reads: u32 = 0;

    loop {
        if cancel.is_cancelled() {
            return Err(ProviderError::Cancelled);
        }

        reads += 1;
        let observation = match read().await {
            Ok(observation) => observation,
            Err(err) if accepts_deleted && err.is_not_found() => {
                debug!(reads, "Object not found, treating as deleted");
                Observation::deleted()
            }
            Err(err) => return Err(err),
        };

        if targets.contains(&observation.state) {
            debug!(
                state = %observation.state,
                reads,
                elapsed_ms = start.elapsed().as_millis() as u64,
                "Reached target state"
            );
            return Ok(observation);
        }
        let elapsed = start.elapsed();
        if elapsed >= options.timeout {
            warn!(
                last_state = %observation.state,
                reads,
                elapsed_ms = elapsed.as_millis() as u64,
                "Timed out waiting for target state"
            );
            return Err(ProviderError::Timeout {
                last_state: Some(observation.state),
                elapsed,
            });
        }

        let delay = options.poll_interval.min(options.timeout - elapsed);
        debug!(
            state = %observation.state,
            reads,
            delay_ms = delay.as_millis() as u64,
            "Waiting before next poll"
        );
        tokio::select! {
            _ = cancel.cancelled() => return Err(ProviderError::Cancelled),
            _ = tokio::time::sleep(delay) => {}
        }
    }
}
