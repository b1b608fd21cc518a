//! A list screen bound to its lifetime and toast queue

use crate::api_client::ApiClient;
use crate::error::{ClientError, ClientResult};
use crate::lifetime::ScreenLifetime;
use crate::poller::PollEvent;
use chargeops_core::config::ViewConfig;
use chargeops_core::EntityKind;
use chargeops_view::{ListView, ToastQueue};
use tracing::{info, warn};

/// One open screen
///
/// Dropping the screen tears down its lifetime, so any fetch still guarded
/// by it resolves to nothing.
#[derive(Debug)]
pub struct Screen {
    view: ListView,
    toasts: ToastQueue,
    lifetime: ScreenLifetime,
}

impl Screen {
    /// Open an empty screen for an entity kind
    #[must_use]
    pub fn open(kind: EntityKind, view: &ViewConfig) -> Self {
        Self::from_view(ListView::for_kind(kind, view.page_size_for(kind)))
    }

    /// Wrap an existing view
    #[must_use]
    pub fn from_view(view: ListView) -> Self {
        Self {
            view,
            toasts: ToastQueue::default(),
            lifetime: ScreenLifetime::new(),
        }
    }

    /// Entity kind shown
    #[must_use]
    pub const fn kind(&self) -> EntityKind {
        self.view.kind()
    }

    /// View state
    #[must_use]
    pub const fn view(&self) -> &ListView {
        &self.view
    }

    /// Mutable view state
    pub const fn view_mut(&mut self) -> &mut ListView {
        &mut self.view
    }

    /// Pending notices
    #[must_use]
    pub const fn toasts(&self) -> &ToastQueue {
        &self.toasts
    }

    /// Mutable notices
    pub const fn toasts_mut(&mut self) -> &mut ToastQueue {
        &mut self.toasts
    }

    /// Lifetime scope of this screen
    #[must_use]
    pub const fn lifetime(&self) -> &ScreenLifetime {
        &self.lifetime
    }

    /// Initial fetch, showing a loading state while it runs
    ///
    /// Returns `Ok(false)` when the screen was torn down before the
    /// response arrived; nothing is written in that case.
    ///
    /// # Errors
    ///
    /// Returns the fetch error after recording it on the view and the
    /// toast queue. The collection is left as it was.
    pub async fn load(&mut self, api: &ApiClient) -> ClientResult<bool> {
        let kind = self.kind();
        self.view.begin_load();

        let Some(result) = self.lifetime.guard(api.list(kind)).await else {
            info!(%kind, "Screen closed before load finished");
            return Ok(false);
        };

        match result {
            Ok(records) => {
                info!(%kind, count = records.len(), "Loaded screen");
                self.view.replace_collection(records);
                Ok(true)
            }
            Err(e) => {
                let message = e.user_message();
                self.view.fail_load(message.clone());
                self.toasts.error(message);
                Err(e)
            }
        }
    }

    /// Apply a background poll result
    ///
    /// A refresh replaces the collection silently. A failure keeps the
    /// collection and is returned to the caller without a toast.
    ///
    /// # Errors
    ///
    /// Returns the error carried by a failed poll.
    pub fn apply(&mut self, event: PollEvent) -> ClientResult<()> {
        if self.lifetime.is_torn_down() {
            return Ok(());
        }
        match event {
            PollEvent::Refreshed(records) => {
                self.view.replace_collection(records);
                Ok(())
            }
            PollEvent::Failed(e) => {
                warn!(kind = %self.kind(), error = %e, "Background refresh failed");
                Err(e)
            }
        }
    }

    /// Turn a mutation result into a toast
    pub(crate) fn report<T>(
        &mut self,
        result: ClientResult<T>,
        success: impl FnOnce() -> String,
    ) -> ClientResult<T> {
        match result {
            Ok(value) => {
                self.toasts.success(success());
                Ok(value)
            }
            Err(e) => {
                warn!(kind = %self.kind(), error = %e, "Mutation failed");
                self.toasts.error(e.user_message());
                Err(e)
            }
        }
    }

    /// Tear down the screen explicitly
    pub fn close(&self) {
        self.lifetime.teardown();
    }
}

impl Drop for Screen {
    fn drop(&mut self) {
        self.lifetime.teardown();
    }
}

/// Reject mutations on a screen that has been closed
pub(crate) fn ensure_open(screen: &Screen) -> ClientResult<()> {
    if screen.lifetime.is_torn_down() {
        return Err(ClientError::validation("screen", "Screen is closed"));
    }
    Ok(())
}
