//! Cancellation and deadline propagation for outgoing calls.
//!
//! # Design
//! A `Context` is a cheap, cloneable value passed into every network call.
//! Cancellation is signalled through `tokio::sync::watch` channels; a child
//! context keeps every receiver of its parent plus its own, so cancelling any
//! ancestor cancels the child too. Deadlines only ever shrink when derived.

use std::time::Duration;

use futures::future::select_all;
use tokio::sync::watch;
use tokio::time::Instant;

use crate::error::ContextError;

/// Carries a deadline and cancellation signals into a call.
#[derive(Debug, Clone, Default)]
pub struct Context {
    deadline: Option<Instant>,
    cancel: Vec<watch::Receiver<bool>>,
}

/// Cancels the context returned alongside it by [`Context::with_cancel`].
///
/// Dropping the handle without calling [`cancel`](Self::cancel) leaves the
/// context live.
#[derive(Debug)]
pub struct CancelHandle(watch::Sender<bool>);

impl CancelHandle {
    pub fn cancel(&self) {
        self.0.send_replace(true);
    }
}

impl Context {
    /// A context that is never cancelled and has no deadline.
    pub fn background() -> Self {
        Self::default()
    }

    /// Derives a child that can be cancelled through the returned handle.
    pub fn with_cancel(&self) -> (Self, CancelHandle) {
        let (tx, rx) = watch::channel(false);
        let mut child = self.clone();
        child.cancel.push(rx);
        (child, CancelHandle(tx))
    }

    /// Derives a child that expires after `timeout` from now.
    pub fn with_timeout(&self, timeout: Duration) -> Self {
        self.with_deadline(Instant::now() + timeout)
    }

    /// Derives a child that expires at `deadline`, or earlier if the parent does.
    pub fn with_deadline(&self, deadline: Instant) -> Self {
        let mut child = self.clone();
        child.deadline = Some(match self.deadline {
            Some(parent) => parent.min(deadline),
            None => deadline,
        });
        child
    }

    pub fn deadline(&self) -> Option<Instant> {
        self.deadline
    }

    /// Current state without waiting. `None` while the context is live.
    pub fn err(&self) -> Option<ContextError> {
        if self.cancel.iter().any(|rx| *rx.borrow()) {
            return Some(ContextError::Cancelled);
        }
        match self.deadline {
            Some(deadline) if deadline <= Instant::now() => Some(ContextError::DeadlineExceeded),
            _ => None,
        }
    }

    /// Resolves once the context is cancelled or its deadline passes.
    ///
    /// Never resolves for [`Context::background`].
    pub async fn done(&self) -> ContextError {
        let cancelled = async {
            if self.cancel.is_empty() {
                std::future::pending::<()>().await;
            }
            let waits = self
                .cancel
                .iter()
                .cloned()
                .map(|rx| Box::pin(wait_cancelled(rx)));
            select_all(waits).await;
        };

        match self.deadline {
            Some(deadline) => tokio::select! {
                _ = cancelled => ContextError::Cancelled,
                _ = tokio::time::sleep_until(deadline) => ContextError::DeadlineExceeded,
            },
            None => {
                cancelled.await;
                ContextError::Cancelled
            }
        }
    }
}

async fn wait_cancelled(mut rx: watch::Receiver<bool>) {
    // A dropped handle can no longer cancel.
    if rx.wait_for(|cancelled| *cancelled).await.is_err() {
        std::future::pending::<()>().await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn background_is_live() {
        let ctx = Context::background();
        assert!(ctx.err().is_none());
        assert!(ctx.deadline().is_none());
    }

    #[tokio::test]
    async fn cancel_marks_context_done() {
        let (ctx, handle) = Context::background().with_cancel();
        assert!(ctx.err().is_none());
        handle.cancel();
        assert_eq!(ctx.err(), Some(ContextError::Cancelled));
        assert_eq!(ctx.done().await, ContextError::Cancelled);
    }

    #[tokio::test]
    async fn parent_cancel_reaches_child() {
        let (parent, handle) = Context::background().with_cancel();
        let (child, _child_handle) = parent.with_cancel();
        let child = child.with_timeout(Duration::from_secs(60));

        let waiter = tokio::spawn(async move { child.done().await });
        handle.cancel();
        assert_eq!(waiter.await.unwrap(), ContextError::Cancelled);
    }

    #[tokio::test]
    async fn child_cancel_leaves_parent_live() {
        let (parent, _handle) = Context::background().with_cancel();
        let (child, child_handle) = parent.with_cancel();
        child_handle.cancel();
        assert_eq!(child.err(), Some(ContextError::Cancelled));
        assert!(parent.err().is_none());
    }

    #[tokio::test(start_paused = true)]
    async fn timeout_expires() {
        let ctx = Context::background().with_timeout(Duration::from_millis(50));
        assert!(ctx.err().is_none());
        assert_eq!(ctx.done().await, ContextError::DeadlineExceeded);
        assert_eq!(ctx.err(), Some(ContextError::DeadlineExceeded));
    }

    #[tokio::test(start_paused = true)]
    async fn derived_deadline_never_extends_parent() {
        let parent = Context::background().with_timeout(Duration::from_secs(1));
        let child = parent.with_timeout(Duration::from_secs(10));
        assert_eq!(child.deadline(), parent.deadline());

        let tighter = parent.with_timeout(Duration::from_millis(10));
        assert!(tighter.deadline() < parent.deadline());
    }

    #[tokio::test(start_paused = true)]
    async fn dropped_handle_does_not_cancel() {
        let (ctx, handle) = Context::background().with_cancel();
        drop(handle);
        let ctx = ctx.with_timeout(Duration::from_millis(5));
        assert_eq!(ctx.done().await, ContextError::DeadlineExceeded);
    }
}
