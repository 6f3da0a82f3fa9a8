//! Cancellation scopes.
//!
//! A [`Scope`] bounds one or more calls: cancelling it, or letting its
//! deadline pass, ends every call that runs under it at its next await point.

use std::future::Future;
use std::time::Duration;

use tokio::time::Instant;
use tokio_util::sync::CancellationToken;

use crate::{Error, Result};

/// Cancellation token with an optional deadline.
///
/// # Example
///
/// ```ignore
/// use std::time::Duration;
/// use osprey::Scope;
///
/// let scope = Scope::with_timeout(Duration::from_secs(5));
/// let info = client.send(&scope, Info::new()).await?;
/// ```
#[derive(Debug, Clone, Default)]
pub struct Scope {
    token: CancellationToken,
    deadline: Option<Instant>,
}

impl Scope {
    /// A scope that only ends when cancelled.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// A scope that ends after `timeout`.
    #[must_use]
    pub fn with_timeout(timeout: Duration) -> Self {
        Self::with_deadline(Instant::now() + timeout)
    }

    /// A scope that ends at `deadline`.
    #[must_use]
    pub fn with_deadline(deadline: Instant) -> Self {
        Self {
            token: CancellationToken::new(),
            deadline: Some(deadline),
        }
    }

    /// A scope driven by an existing token.
    #[must_use]
    pub const fn from_token(token: CancellationToken) -> Self {
        Self {
            token,
            deadline: None,
        }
    }

    /// A child scope: cancelled with this one, but cancelling it leaves this
    /// one running. The deadline is inherited.
    #[must_use]
    pub fn child(&self) -> Self {
        Self {
            token: self.token.child_token(),
            deadline: self.deadline,
        }
    }

    /// Narrow the deadline; an earlier existing deadline is kept.
    #[must_use]
    pub fn timeout(mut self, timeout: Duration) -> Self {
        let deadline = Instant::now() + timeout;
        self.deadline = Some(self.deadline.map_or(deadline, |d| d.min(deadline)));
        self
    }

    /// Cancel this scope and its children.
    pub fn cancel(&self) {
        self.token.cancel();
    }

    /// The underlying token.
    #[must_use]
    pub const fn token(&self) -> &CancellationToken {
        &self.token
    }

    /// The deadline, if any.
    #[must_use]
    pub const fn deadline(&self) -> Option<Instant> {
        self.deadline
    }

    /// Returns `true` once cancelled or past the deadline.
    #[must_use]
    pub fn is_cancelled(&self) -> bool {
        self.check().is_err()
    }

    /// Fail fast if the scope has ended.
    ///
    /// # Errors
    ///
    /// Returns a cancellation error, or a deadline error once the deadline
    /// has passed.
    pub fn check(&self) -> Result<()> {
        if self.token.is_cancelled() {
            return Err(Error::cancelled());
        }
        if self.deadline.is_some_and(|d| Instant::now() >= d) {
            return Err(Error::deadline_exceeded());
        }
        Ok(())
    }

    /// Resolves with the matching error when the scope ends.
    pub async fn done(&self) -> Error {
        match self.deadline {
            Some(deadline) => {
                tokio::select! {
                    () = self.token.cancelled() => Error::cancelled(),
                    () = tokio::time::sleep_until(deadline) => Error::deadline_exceeded(),
                }
            }
            None => {
                self.token.cancelled().await;
                Error::cancelled()
            }
        }
    }

    /// Race `fut` against the scope. The future is dropped if the scope
    /// ends first.
    ///
    /// # Errors
    ///
    /// Returns the error of `fut`, or a cancellation error.
    pub async fn run<F, T>(&self, fut: F) -> Result<T>
    where
        F: Future<Output = Result<T>>,
    {
        tokio::select! {
            biased;
            err = self.done() => Err(err),
            out = fut => out,
        }
    }
}

#[cfg(test)]
mod tests {
    use assert2::{check, let_assert};

    use super::*;
    use crate::{ErrorKind, TransportErrorKind};

    #[tokio::test]
    async fn fresh_scope_is_open() {
        let scope = Scope::new();
        check!(scope.check().is_ok());
        check!(scope.run(async { Ok(42) }).await.ok() == Some(42));
    }

    #[tokio::test]
    async fn cancelled_scope_short_circuits() {
        let scope = Scope::new();
        scope.cancel();

        let_assert!(Err(err) = scope.check());
        check!(err.kind() == ErrorKind::Cancelled);

        let_assert!(Err(err) = scope.run(std::future::pending::<Result<()>>()).await);
        check!(err.transport_kind() == Some(TransportErrorKind::Cancelled));
    }

    #[tokio::test]
    async fn child_follows_parent_only() {
        let parent = Scope::new();
        let child = parent.child();
        child.cancel();
        check!(child.is_cancelled());
        check!(!parent.is_cancelled());

        let child = parent.child();
        parent.cancel();
        check!(child.is_cancelled());
    }

    #[tokio::test(start_paused = true)]
    async fn deadline_ends_the_scope() {
        let scope = Scope::with_timeout(Duration::from_millis(50));
        let_assert!(Err(err) = scope.run(std::future::pending::<Result<()>>()).await);
        check!(err.transport_kind() == Some(TransportErrorKind::DeadlineExceeded));
        check!(err.is_cancelled());
        check!(scope.is_cancelled());
    }

    #[tokio::test(start_paused = true)]
    async fn timeout_keeps_the_earlier_deadline() {
        let scope = Scope::with_timeout(Duration::from_secs(1));
        let narrowed = scope.clone().timeout(Duration::from_secs(10));
        check!(narrowed.deadline() == scope.deadline());

        let narrowed = scope.clone().timeout(Duration::from_millis(10));
        check!(narrowed.deadline() < scope.deadline());
    }
}
