//! Deadlines and cancellation for facade operations
//!
//! A multi-step operation checks its [`OpContext`] before every step. A step
//! that has started (a store call) always runs to completion; the remaining
//! steps are skipped once the context is cancelled or its deadline passes.

use std::{future::Future, time::Duration};

use tokio::time::Instant;
use tokio_util::sync::CancellationToken;

use crate::{
    Result,
    storage::{
        StorageError,
        locks::{KeyGuard, KeyLocks, LockKey},
    },
};

/// The caller's deadline and cancellation signal for one operation.
///
/// ```
/// use std::time::Duration;
/// use filekeep::OpContext;
///
/// let ctx = OpContext::new().with_timeout(Duration::from_secs(5));
/// assert!(ctx.deadline().is_some());
/// ctx.cancel();
/// assert!(ctx.is_cancelled());
/// ```
#[derive(Debug, Clone, Default)]
pub struct OpContext {
    deadline: Option<Instant>,
    cancel: CancellationToken,
}

impl OpContext {
    /// A context with no deadline and its own cancellation token.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the deadline to `timeout` from now, keeping any earlier deadline.
    ///
    /// A timeout too large to represent as an instant sets no deadline.
    pub fn with_timeout(self, timeout: Duration) -> Self {
        match Instant::now().checked_add(timeout) {
            Some(deadline) => self.with_deadline(deadline),
            None => self,
        }
    }

    /// Set an absolute deadline, keeping any earlier deadline.
    pub fn with_deadline(mut self, deadline: Instant) -> Self {
        self.deadline = Some(match self.deadline {
            Some(existing) => existing.min(deadline),
            None => deadline,
        });
        self
    }

    /// Use a caller-owned cancellation token.
    pub fn with_cancellation(mut self, token: CancellationToken) -> Self {
        self.cancel = token;
        self
    }

    pub fn deadline(&self) -> Option<Instant> {
        self.deadline
    }

    pub fn cancellation_token(&self) -> &CancellationToken {
        &self.cancel
    }

    /// Signal cancellation to every operation using this context.
    pub fn cancel(&self) {
        self.cancel.cancel();
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancel.is_cancelled()
    }

    /// This context, with `timeout` applied only if no deadline is set.
    pub(crate) fn or_timeout(&self, timeout: Option<Duration>) -> OpContext {
        match (self.deadline, timeout) {
            (None, Some(timeout)) => self.clone().with_timeout(timeout),
            _ => self.clone(),
        }
    }

    pub(crate) fn is_past_deadline(&self) -> bool {
        self.deadline.is_some_and(|d| Instant::now() >= d)
    }
}

/// Step tracker for one multi-step operation.
pub(crate) struct Steps<'a> {
    ctx: &'a OpContext,
    operation: &'static str,
    completed: usize,
}

impl<'a> Steps<'a> {
    pub(crate) fn new(ctx: &'a OpContext, operation: &'static str) -> Self {
        Self {
            ctx,
            operation,
            completed: 0,
        }
    }

    /// Number of writes applied so far.
    pub(crate) fn completed(&self) -> usize {
        self.completed
    }

    /// Record that a write step was applied.
    pub(crate) fn complete(&mut self) {
        self.completed += 1;
    }

    /// Gate before starting the next step.
    pub(crate) fn check(&self) -> Result<()> {
        if self.ctx.is_cancelled() {
            return Err(self.cancelled().into());
        }
        if self.ctx.is_past_deadline() {
            return Err(self.deadline_exceeded().into());
        }
        Ok(())
    }

    /// Wait for a key's lock, giving up on cancellation or deadline.
    pub(crate) async fn lock(&self, locks: &KeyLocks, key: LockKey) -> Result<KeyGuard> {
        self.check()?;
        self.race(locks.lock(key)).await
    }

    async fn race<F: Future>(&self, fut: F) -> Result<F::Output> {
        let deadline = async {
            match self.ctx.deadline {
                Some(deadline) => tokio::time::sleep_until(deadline).await,
                None => std::future::pending().await,
            }
        };
        tokio::select! {
            biased;
            _ = self.ctx.cancel.cancelled() => Err(self.cancelled().into()),
            _ = deadline => Err(self.deadline_exceeded().into()),
            out = fut => Ok(out),
        }
    }

    fn cancelled(&self) -> StorageError {
        StorageError::Cancelled {
            operation: self.operation,
            completed: self.completed,
        }
    }

    fn deadline_exceeded(&self) -> StorageError {
        StorageError::DeadlineExceeded {
            operation: self.operation,
            completed: self.completed,
        }
    }
}
