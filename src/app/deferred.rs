//! A promise-like value: settled once, by a [`Resolver`] or by a wrapped
//! future, and chainable with `then` / `and_then` / `catch`.

use crate::domain::model::Tick;
use crate::utils::error::{EventflowError, Result};
use std::future::Future;
use std::pin::Pin;
use std::task::{Context, Poll};
use std::time::Duration;
use tokio::sync::oneshot;

pub struct Deferred<T> {
    inner: Pin<Box<dyn Future<Output = Result<T>>>>,
}

pub struct Resolver<T> {
    sender: oneshot::Sender<Result<T>>,
}

impl<T> Resolver<T> {
    pub fn resolve(self, value: T) {
        let _ = self.sender.send(Ok(value));
    }

    pub fn reject(self, reason: impl Into<String>) {
        let _ = self.sender.send(Err(EventflowError::DeferredRejected {
            reason: reason.into(),
        }));
    }
}

impl<T: 'static> Deferred<T> {
    /// A pending deferred and the handle that settles it. Dropping the
    /// resolver without settling rejects the deferred.
    pub fn pending() -> (Resolver<T>, Deferred<T>) {
        let (sender, receiver) = oneshot::channel();
        let deferred = Deferred::from_future(async move {
            match receiver.await {
                Ok(result) => result,
                Err(_) => Err(EventflowError::DeferredRejected {
                    reason: "resolver dropped without settling".to_string(),
                }),
            }
        });
        (Resolver { sender }, deferred)
    }

    pub fn from_future<F>(future: F) -> Self
    where
        F: Future<Output = Result<T>> + 'static,
    {
        Self {
            inner: Box::pin(future),
        }
    }

    pub fn resolved(value: T) -> Self {
        Self::from_future(async move { Ok(value) })
    }

    pub fn rejected(reason: impl Into<String>) -> Self {
        let reason = reason.into();
        Self::from_future(async move { Err(EventflowError::DeferredRejected { reason }) })
    }

    /// Resolves with `value` after `delay`, from a timer task on the current
    /// `LocalSet`.
    pub fn delay(delay: Duration, value: T) -> Self {
        let (resolver, deferred) = Self::pending();
        tokio::task::spawn_local(async move {
            tokio::time::sleep(delay).await;
            resolver.resolve(value);
        });
        deferred
    }

    pub fn then<U, F>(self, f: F) -> Deferred<U>
    where
        U: 'static,
        F: FnOnce(T) -> Result<U> + 'static,
    {
        Deferred::from_future(async move { f(self.await?) })
    }

    pub fn and_then<U, F>(self, f: F) -> Deferred<U>
    where
        U: 'static,
        F: FnOnce(T) -> Deferred<U> + 'static,
    {
        Deferred::from_future(async move { f(self.await?).await })
    }

    pub fn catch<F>(self, f: F) -> Deferred<T>
    where
        F: FnOnce(EventflowError) -> Result<T> + 'static,
    {
        Deferred::from_future(async move {
            match self.await {
                Ok(value) => Ok(value),
                Err(e) => f(e),
            }
        })
    }
}

impl<T> Future for Deferred<T> {
    type Output = Result<T>;

    fn poll(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
        self.inner.as_mut().poll(cx)
    }
}

/// Fails right away for odd input.
pub fn square_even(value: Tick) -> Result<Tick> {
    if value % 2 != 0 {
        return Err(EventflowError::ComputationFailed {
            stage: "square_even".to_string(),
            details: format!("{} is odd", value),
        });
    }
    Ok(value * value)
}

/// Same rule as [`square_even`], but settled after `delay`.
pub fn square_even_later(value: Tick, delay: Duration) -> Deferred<Tick> {
    let (resolver, deferred) = Deferred::pending();
    tokio::task::spawn_local(async move {
        tokio::time::sleep(delay).await;
        match square_even(value) {
            Ok(square) => resolver.resolve(square),
            Err(e) => resolver.reject(e.to_string()),
        }
    });
    deferred
}

/// Awaits [`square_even_later`] and falls back to `fallback` on rejection.
pub async fn square_even_or(value: Tick, delay: Duration, fallback: Tick) -> Tick {
    match square_even_later(value, delay).await {
        Ok(square) => square,
        Err(e) => {
            tracing::warn!("⚠️ {}, using {}", e, fallback);
            fallback
        }
    }
}
