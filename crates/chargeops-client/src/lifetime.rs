//! Screen lifetime guard

use std::future::Future;
use tokio_util::sync::CancellationToken;

/// Cancellation scope of one screen
///
/// Clones share the same scope. Work started for a screen runs through
/// [`guard`](Self::guard) so that results arriving after teardown are
/// dropped instead of written into state nobody owns.
#[derive(Debug, Clone, Default)]
pub struct ScreenLifetime {
    token: CancellationToken,
}

impl ScreenLifetime {
    /// Create a live scope
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Token cancelled by [`teardown`](Self::teardown) of this scope
    #[must_use]
    pub fn child_token(&self) -> CancellationToken {
        self.token.child_token()
    }

    /// End the scope
    pub fn teardown(&self) {
        self.token.cancel();
    }

    /// Whether the scope has ended
    #[must_use]
    pub fn is_torn_down(&self) -> bool {
        self.token.is_cancelled()
    }

    /// Run `fut` unless the screen goes away first
    ///
    /// Returns `None` when teardown happens before `fut` resolves, including
    /// when it already happened.
    pub async fn guard<F: Future>(&self, fut: F) -> Option<F::Output> {
        tokio::select! {
            biased;
            () = self.token.cancelled() => None,
            out = fut => Some(out),
        }
    }
}
