//! Transient user-facing notices

use serde::Serialize;
use std::time::{Duration, Instant};

/// How long a toast stays visible
pub const TOAST_TTL: Duration = Duration::from_secs(3);

/// Identifier of a toast, local to one queue
pub type ToastId = u64;

/// Kind of notice
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ToastKind {
    /// Operation succeeded
    Success,
    /// Operation failed
    Error,
    /// Neutral information
    Info,
}

/// One notice
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Toast {
    /// Queue-local identifier
    pub id: ToastId,
    /// Kind of notice
    pub kind: ToastKind,
    /// Text shown to the operator
    pub message: String,
    /// When it was raised
    pub raised_at: Instant,
}

/// Ordered queue of live toasts
#[derive(Debug, Clone)]
pub struct ToastQueue {
    next_id: ToastId,
    ttl: Duration,
    toasts: Vec<Toast>,
}

impl Default for ToastQueue {
    fn default() -> Self {
        Self::new(TOAST_TTL)
    }
}

impl ToastQueue {
    /// Create an empty queue with a custom lifetime
    #[must_use]
    pub const fn new(ttl: Duration) -> Self {
        Self {
            next_id: 1,
            ttl,
            toasts: Vec::new(),
        }
    }

    /// Raise a toast at `now`
    pub fn push(&mut self, kind: ToastKind, message: impl Into<String>, now: Instant) -> ToastId {
        let id = self.next_id;
        self.next_id += 1;
        self.toasts.push(Toast {
            id,
            kind,
            message: message.into(),
            raised_at: now,
        });
        id
    }

    /// Raise a success toast
    pub fn success(&mut self, message: impl Into<String>) -> ToastId {
        self.push(ToastKind::Success, message, Instant::now())
    }

    /// Raise an error toast
    pub fn error(&mut self, message: impl Into<String>) -> ToastId {
        self.push(ToastKind::Error, message, Instant::now())
    }

    /// Raise an info toast
    pub fn info(&mut self, message: impl Into<String>) -> ToastId {
        self.push(ToastKind::Info, message, Instant::now())
    }

    /// Remove a toast early
    pub fn dismiss(&mut self, id: ToastId) -> bool {
        let before = self.toasts.len();
        self.toasts.retain(|t| t.id != id);
        self.toasts.len() != before
    }

    /// Drop toasts older than the lifetime, returning how many went
    pub fn expire(&mut self, now: Instant) -> usize {
        let before = self.toasts.len();
        let ttl = self.ttl;
        self.toasts
            .retain(|t| now.saturating_duration_since(t.raised_at) < ttl);
        before - self.toasts.len()
    }

    /// Remove and return every toast, oldest first
    pub fn drain(&mut self) -> Vec<Toast> {
        std::mem::take(&mut self.toasts)
    }

    /// Live toasts, oldest first
    pub fn iter(&self) -> impl Iterator<Item = &Toast> {
        self.toasts.iter()
    }

    /// Number of live toasts
    #[must_use]
    pub fn len(&self) -> usize {
        self.toasts.len()
    }

    /// Whether no toast is live
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.toasts.is_empty()
    }
}
