//! Exactly-once initialization
//!
//! The first caller runs the initialization sequence; concurrent callers
//! wait for it and every caller, then and later, sees the same outcome.
//!
//! | State | Meaning |
//! |-------|---------|
//! | Uninitialized | nobody asked yet |
//! | Initializing | the leader is running the sequence |
//! | Ready | sequence succeeded (terminal) |
//! | Failed | sequence failed, error shared with all callers (terminal) |

use crate::error::{TgoError, TgoResult};
use std::fmt;
use std::future::Future;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tokio::sync::OnceCell;

/// Observable guard state
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LifecycleState {
    Uninitialized,
    Initializing,
    Ready,
    Failed,
}

impl fmt::Display for LifecycleState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Uninitialized => "uninitialized",
            Self::Initializing => "initializing",
            Self::Ready => "ready",
            Self::Failed => "failed",
        };
        write!(f, "{}", name)
    }
}

/// Runs an initialization sequence at most once and caches its outcome
pub struct LifecycleGuard<T> {
    started: AtomicBool,
    outcome: OnceCell<Result<T, Arc<TgoError>>>,
}

impl<T> LifecycleGuard<T> {
    pub fn new() -> Self {
        Self {
            started: AtomicBool::new(false),
            outcome: OnceCell::new(),
        }
    }

    /// Run `init` unless it already ran, then return the shared outcome.
    ///
    /// A failure is returned as `InitFailed` to every caller, including the
    /// one whose call ran the sequence.
    pub async fn get_or_init<F, Fut>(&self, init: F) -> TgoResult<&T>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = TgoResult<T>>,
    {
        let outcome = self
            .outcome
            .get_or_init(|| async {
                self.started.store(true, Ordering::SeqCst);
                init().await.map_err(Arc::new)
            })
            .await;

        match outcome {
            Ok(value) => Ok(value),
            Err(e) => Err(TgoError::InitFailed(Arc::clone(e))),
        }
    }

    pub fn state(&self) -> LifecycleState {
        match self.outcome.get() {
            Some(Ok(_)) => LifecycleState::Ready,
            Some(Err(_)) => LifecycleState::Failed,
            None if self.started.load(Ordering::SeqCst) => LifecycleState::Initializing,
            None => LifecycleState::Uninitialized,
        }
    }
}

impl<T> Default for LifecycleGuard<T> {
    fn default() -> Self {
        Self::new()
    }
}
