use std::error::Error as StdError;
use std::fmt;

use thiserror::Error;

/// The pool's own error type. Carries the sentinel identities from the spec
/// that a `Get` or `Close` call can actually produce, plus a wrapper for
/// borrow-time connector failures.
///
/// Matching on a specific variant (`matches!(err, PoolError::PoolFull)`) is
/// the supported way to distinguish these from each other; the
/// [`connect`](PoolError::Connect) variant carries whatever error the
/// `StubConnector` in use produced. The `ClientClosed` sentinel belongs to
/// [`ClientError`] instead, since it's the handle, not the pool, that is
/// closed.
#[derive(Error, Debug)]
pub enum PoolError {
    /// The picker's instance sequence was empty at `Pick()` time.
    #[error("no instance available")]
    NoInstance,
    /// `maxActive` was reached and block mode is off.
    #[error("pool is full")]
    PoolFull,
    /// The pool has been closed; no further borrows are possible.
    #[error("pool is closed")]
    PoolClosed,
    /// Dialing, wrapping, or opening a fresh connection failed.
    #[error("failed to connect: {0}")]
    Connect(#[source] Box<dyn StdError + Send + Sync>),
}

/// An error surfaced by a [`Client`](crate::client::Client) RPC call.
///
/// Wraps the stub's own error type so a closed handle can still report the
/// `ClientClosed` sentinel (spec.md §6) even though that identity isn't a
/// variant of the caller-supplied stub error. A successful call never
/// produces this type; `Rpc` carries the stub's raw error verbatim, matching
/// spec.md §4.1 point 4, which says to return the raw result and error to
/// the caller.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ClientError<E: std::error::Error + 'static> {
    /// The handle was already closed (`IsClosed() == true`).
    #[error("client is closed")]
    Closed,
    /// The stub's RPC call itself failed.
    #[error(transparent)]
    Rpc(E),
}

/// A per-handle, deduplicated bag of RPC errors.
///
/// Adding an error already present (by value equality) is a no-op; adding a
/// nested `ErrorList` flattens it in; adding nothing is a no-op. The sole
/// thing the pool cares about is [`ErrorList::is_empty`] at `Close` time: a
/// non-empty list forces the handle's stub to be destroyed rather than
/// recycled.
#[derive(Debug)]
pub struct ErrorList<E> {
    errors: Vec<E>,
}

impl<E> Default for ErrorList<E> {
    fn default() -> Self {
        Self { errors: Vec::new() }
    }
}

impl<E: PartialEq> ErrorList<E> {
    /// Creates an empty list.
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a single error, skipping it if it's already present.
    pub fn add(&mut self, err: E) {
        if !self.errors.contains(&err) {
            self.errors.push(err);
        }
    }

    /// Adds every error from another list, deduplicating against this one.
    pub fn extend(&mut self, other: ErrorList<E>) {
        for err in other.errors {
            self.add(err);
        }
    }

    /// Adds an `Option<E>`, treating `None` as a no-op, the direct analog
    /// of the reference's "adding `nil` is a no-op".
    pub fn add_result(&mut self, result: Option<E>) {
        if let Some(err) = result {
            self.add(err);
        }
    }

    /// Number of distinct errors recorded.
    pub fn len(&self) -> usize {
        self.errors.len()
    }

    /// Whether any error has been recorded. The pool's release path treats
    /// a non-empty list as "force destroy this stub".
    pub fn is_empty(&self) -> bool {
        self.errors.is_empty()
    }

    /// Borrows the recorded errors in insertion order.
    pub fn as_slice(&self) -> &[E] {
        &self.errors
    }
}

impl<E: fmt::Display> fmt::Display for ErrorList<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let strs: Vec<String> = self.errors.iter().map(|e| e.to_string()).collect();
        write!(f, "{}", strs.join("; "))
    }
}
