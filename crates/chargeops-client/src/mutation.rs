//! Mutation dispatcher
//!
//! Every mutation validates locally, calls the owning service, then
//! reconciles the screen's collection. The server's record is authoritative;
//! a response body counts as the record only when it is an object carrying
//! the record's id. Otherwise create re-fetches the collection and update
//! keeps the local copy. Nothing is retried.

use crate::api_client::ApiClient;
use crate::error::{ClientError, ClientResult};
use crate::screen::{Screen, ensure_open};
use chargeops_core::types::{CommandEnvelope, ID_FIELD};
use chargeops_core::{ChargerCommand, EntityKind, Record, RecordId};
use chargeops_view::validate::{prepare, validate};
use chargeops_view::{Intent, ListView};
use parking_lot::Mutex;
use std::collections::HashSet;
use std::sync::Arc;
use tracing::{debug, info, warn};

const ENABLED_FIELD: &str = "enabled";
const PASSWORD_FIELD: &str = "password";

/// Charger ids with a command outstanding
#[derive(Debug, Clone, Default)]
pub struct InFlight {
    ids: Arc<Mutex<HashSet<RecordId>>>,
}

impl InFlight {
    /// Claim `id`, or `None` when it is already claimed
    #[must_use]
    pub fn try_acquire(&self, id: &RecordId) -> Option<InFlightGuard> {
        self.ids.lock().insert(id.clone()).then(|| InFlightGuard {
            ids: Arc::clone(&self.ids),
            id: id.clone(),
        })
    }

    /// Whether a command for `id` is outstanding
    #[must_use]
    pub fn contains(&self, id: &RecordId) -> bool {
        self.ids.lock().contains(id)
    }

    /// Number of outstanding commands
    #[must_use]
    pub fn len(&self) -> usize {
        self.ids.lock().len()
    }

    /// Whether no command is outstanding
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.ids.lock().is_empty()
    }
}

/// Releases an [`InFlight`] claim on drop
#[derive(Debug)]
pub struct InFlightGuard {
    ids: Arc<Mutex<HashSet<RecordId>>>,
    id: RecordId,
}

impl Drop for InFlightGuard {
    fn drop(&mut self) {
        self.ids.lock().remove(&self.id);
    }
}

/// Dispatches create, update, delete and command requests
#[derive(Debug, Clone)]
pub struct MutationDispatcher {
    api: ApiClient,
    in_flight: InFlight,
}

impl MutationDispatcher {
    /// Create a dispatcher over a client
    #[must_use]
    pub fn new(api: ApiClient) -> Self {
        Self {
            api,
            in_flight: InFlight::default(),
        }
    }

    /// Outstanding charger commands
    #[must_use]
    pub const fn in_flight(&self) -> &InFlight {
        &self.in_flight
    }

    /// Create a record on the screen's service
    ///
    /// Returns the server's record, or `None` when the response carried no
    /// record and the collection was re-fetched instead. A failed re-fetch
    /// leaves the create successful with an info toast.
    ///
    /// # Errors
    ///
    /// Returns a validation error before dispatch, or the request error. The
    /// collection is unchanged and the error is pushed as a toast.
    pub async fn create(&self, screen: &mut Screen, record: Record) -> ClientResult<Option<Record>> {
        let kind = screen.kind();
        let result = match ensure_open(screen) {
            Ok(()) => self.try_create(screen.view_mut(), record).await,
            Err(e) => Err(e),
        };
        let (result, stale) = match result {
            Ok(Created { record, stale }) => (Ok(record), stale),
            Err(e) => (Err(e), false),
        };
        let outcome = screen.report(result, || format!("{} created successfully", noun(kind)));
        if stale {
            screen
                .toasts_mut()
                .info("The list could not be refreshed and may be out of date");
        }
        outcome
    }

    /// Replace a record with a full local copy
    ///
    /// # Errors
    ///
    /// Returns a validation error before dispatch, or the request error.
    pub async fn update(&self, screen: &mut Screen, record: Record) -> ClientResult<Record> {
        let kind = screen.kind();
        let result = match ensure_open(screen) {
            Ok(()) => self.try_update(screen.view_mut(), record).await,
            Err(e) => Err(e),
        };
        screen.report(result, || format!("{} updated successfully", noun(kind)))
    }

    /// Delete a record
    ///
    /// # Errors
    ///
    /// Returns the request error; the record stays in the collection.
    pub async fn delete(&self, screen: &mut Screen, id: &RecordId) -> ClientResult<()> {
        let kind = screen.kind();
        let result = match ensure_open(screen) {
            Ok(()) => self.try_delete(screen.view_mut(), id).await,
            Err(e) => Err(e),
        };
        screen.report(result, || format!("{} deleted successfully", noun(kind)))
    }

    /// Flip a charger's `enabled` flag
    ///
    /// # Errors
    ///
    /// Returns [`ClientError::NotFound`] when the charger is not on the
    /// screen, or the request error.
    pub async fn toggle_enabled(&self, screen: &mut Screen, id: &RecordId) -> ClientResult<Record> {
        let result = match ensure_open(screen) {
            Ok(()) => self.try_toggle(screen.view_mut(), id).await,
            Err(e) => Err(e),
        };
        screen.report(result, || format!("Charging point {id} toggled"))
    }

    /// Send a command and report the outcome on the screen
    ///
    /// # Errors
    ///
    /// See [`send_command`](Self::send_command).
    pub async fn command(
        &self,
        screen: &mut Screen,
        id: &RecordId,
        command: ChargerCommand,
    ) -> ClientResult<()> {
        let result = match ensure_open(screen) {
            Ok(()) => self.send_command(id, command).await,
            Err(e) => Err(e),
        };
        screen.report(result, || format!("Command '{command}' sent to charger {id}"))
    }

    /// Send a start or stop command to a charger
    ///
    /// The collection is not touched; status changes arrive with the next
    /// poll.
    ///
    /// # Errors
    ///
    /// Returns [`ClientError::CommandInFlight`] while a command for the same
    /// charger is outstanding, or the request error.
    pub async fn send_command(&self, id: &RecordId, command: ChargerCommand) -> ClientResult<()> {
        let _claim = self
            .in_flight
            .try_acquire(id)
            .ok_or_else(|| ClientError::CommandInFlight { id: id.clone() })?;

        let envelope = CommandEnvelope {
            charger_id: id.clone(),
            command,
        };
        self.api.send_command(&envelope).await?;
        Ok(())
    }

    async fn try_create(&self, view: &mut ListView, record: Record) -> ClientResult<Created> {
        let kind = view.kind();
        validate(kind, &record, Intent::Create)?;
        let payload = prepare(kind, &record, Intent::Create);

        let body = self.api.create(kind, &payload).await?;
        if let Some(created) = server_record(body, None) {
            view.upsert(created.clone());
            return Ok(Created {
                record: Some(created),
                stale: false,
            });
        }

        debug!(%kind, "Create returned no record, re-fetching");
        let stale = match self.api.list(kind).await {
            Ok(records) => {
                view.replace_collection(records);
                false
            }
            Err(e) => {
                warn!(%kind, error = %e, "Record created but the collection could not be re-fetched");
                true
            }
        };
        Ok(Created {
            record: None,
            stale,
        })
    }

    async fn try_update(&self, view: &mut ListView, record: Record) -> ClientResult<Record> {
        let kind = view.kind();
        let id = record
            .id()
            .ok_or_else(|| ClientError::validation(ID_FIELD, "Record has no id"))?;
        validate(kind, &record, Intent::Update)?;
        let payload = prepare(kind, &record, Intent::Update);

        let body = self.api.update(kind, &id, &payload).await?;
        let updated = match server_record(body, Some(&id)) {
            Some(server) => server,
            None => {
                let mut local = payload;
                local.remove(PASSWORD_FIELD);
                local
            }
        };
        view.upsert(updated.clone());
        Ok(updated)
    }

    async fn try_delete(&self, view: &mut ListView, id: &RecordId) -> ClientResult<()> {
        self.api.delete(view.kind(), id).await?;
        if view.remove(id).is_none() {
            debug!(%id, "Deleted record was not in the collection");
        }
        Ok(())
    }

    async fn try_toggle(&self, view: &mut ListView, id: &RecordId) -> ClientResult<Record> {
        if view.kind() != EntityKind::Charger {
            return Err(ClientError::validation(
                ENABLED_FIELD,
                "Only charging points can be enabled or disabled",
            ));
        }
        let current = view
            .find(id)
            .cloned()
            .ok_or_else(|| ClientError::not_found(id.clone()))?;
        let enabled = current.boolean(ENABLED_FIELD).unwrap_or(false);
        let flipped = current.with(ENABLED_FIELD, !enabled);

        let body = self.api.update(EntityKind::Charger, id, &flipped).await?;
        let updated = server_record(body, Some(id)).unwrap_or(flipped);
        info!(%id, enabled = !enabled, "Toggled charger");
        view.upsert(updated.clone());
        Ok(updated)
    }
}

/// Outcome of a create before it is reported
struct Created {
    record: Option<Record>,
    stale: bool,
}

/// The response body when it is the record itself
///
/// Status bodies such as `{"message": "..."}` carry no id and are dropped.
/// With `expected` set the body must carry that id.
fn server_record(body: Option<Record>, expected: Option<&RecordId>) -> Option<Record> {
    let record = body?;
    let accepted = match (record.id(), expected) {
        (Some(id), Some(expected)) => &id == expected,
        (Some(_), None) => true,
        (None, _) => false,
    };
    if !accepted {
        debug!("Response body is not the record, ignoring it");
        return None;
    }
    Some(record)
}

const fn noun(kind: EntityKind) -> &'static str {
    match kind {
        EntityKind::User => "User",
        EntityKind::Charger => "Charging point",
        EntityKind::Feedback => "Feedback",
        EntityKind::Transaction => "Transaction",
    }
}
