//! Bounded retry for inserts that reference a freshly created identity.
//!
//! The identity provider commits the identity row on its own schedule, so a
//! profile insert issued right after sign-up can fail its foreign key for a
//! short while. Only that failure is retried; each attempt is a separate
//! store call and no transaction is held across the wait.

use std::fmt;
use std::future::Future;
use std::time::Duration;

use infra::StoreError;
use thiserror::Error;
use tracing::{error, warn};

/// Attempts in total, including the first one.
pub const MAX_ATTEMPTS: u32 = 5;

/// Wait before attempt `n + 1` is `n * BACKOFF_STEP`.
pub const BACKOFF_STEP: Duration = Duration::from_millis(200);

/// Errors that can tell whether they are a foreign-key violation.
pub trait ForeignKeyAware {
    fn is_foreign_key_violation(&self) -> bool;
}

impl ForeignKeyAware for StoreError {
    fn is_foreign_key_violation(&self) -> bool {
        StoreError::is_foreign_key_violation(self)
    }
}

#[derive(Debug, Error)]
pub enum PropagationError<E: fmt::Display> {
    #[error("identity not visible after {attempts} attempts: {last_error}")]
    Exhausted { last_error: E, attempts: u32 },

    #[error("{0}")]
    Failed(E),
}

/// Run `op` until it succeeds, fails with a non-foreign-key error, or has
/// been tried [`MAX_ATTEMPTS`] times.
pub async fn with_identity_propagation<T, E, F, Fut>(
    label: &str,
    mut op: F,
) -> Result<T, PropagationError<E>>
where
    E: ForeignKeyAware + fmt::Display,
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, E>>,
{
    let mut attempt: u32 = 1;

    loop {
        match op().await {
            Ok(value) => return Ok(value),
            Err(e) if e.is_foreign_key_violation() => {
                if attempt >= MAX_ATTEMPTS {
                    error!(attempts = attempt, "{label}: giving up waiting for identity: {e}");
                    return Err(PropagationError::Exhausted {
                        last_error: e,
                        attempts: attempt,
                    });
                }

                let wait = BACKOFF_STEP * attempt;
                warn!(
                    attempt,
                    wait_ms = wait.as_millis() as u64,
                    "{label}: identity not visible yet, retrying"
                );
                tokio::time::sleep(wait).await;
                attempt += 1;
            }
            Err(e) => return Err(PropagationError::Failed(e)),
        }
    }
}
