//! Dashboard loader

use crate::api_client::ApiClient;
use crate::error::ClientResult;
use chargeops_core::{EntityKind, Record};
use chargeops_view::{ChargerStats, FeedbackStats, UserStats};
use chrono::{DateTime, Utc};
use serde::Serialize;
use tracing::{info, warn};

/// KPI snapshot for the dashboard
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DashboardSnapshot {
    /// User statistics
    pub users: UserStats,
    /// Charger statistics
    pub chargers: ChargerStats,
    /// Feedback statistics
    pub feedback: FeedbackStats,
    /// Secondary sources that failed and were treated as empty
    pub degraded: Vec<EntityKind>,
    /// When the snapshot was computed
    pub loaded_at: DateTime<Utc>,
}

impl DashboardSnapshot {
    /// Whether any secondary source failed
    #[must_use]
    pub fn is_degraded(&self) -> bool {
        !self.degraded.is_empty()
    }
}

/// Fetches the dashboard sources concurrently
#[derive(Debug, Clone)]
pub struct DashboardLoader {
    api: ApiClient,
}

impl DashboardLoader {
    /// Create a loader over a client
    #[must_use]
    pub const fn new(api: ApiClient) -> Self {
        Self { api }
    }

    /// Fetch users, chargers and feedback and compute their statistics
    ///
    /// # Errors
    ///
    /// Returns the users fetch error. Charger and feedback failures degrade
    /// to empty collections and are listed in
    /// [`DashboardSnapshot::degraded`].
    pub async fn load(&self, now: DateTime<Utc>) -> ClientResult<DashboardSnapshot> {
        let (users, chargers, feedback) = tokio::join!(
            self.api.list(EntityKind::User),
            self.api.list(EntityKind::Charger),
            self.api.list(EntityKind::Feedback),
        );

        let users = users?;
        let mut degraded = Vec::new();
        let chargers = secondary(EntityKind::Charger, chargers, &mut degraded);
        let feedback = secondary(EntityKind::Feedback, feedback, &mut degraded);

        info!(
            users = users.len(),
            chargers = chargers.len(),
            feedback = feedback.len(),
            degraded = degraded.len(),
            "Loaded dashboard"
        );

        Ok(DashboardSnapshot {
            users: UserStats::compute(&users, now),
            chargers: ChargerStats::compute(&chargers),
            feedback: FeedbackStats::compute(&feedback),
            degraded,
            loaded_at: now,
        })
    }
}

fn secondary(
    kind: EntityKind,
    result: ClientResult<Vec<Record>>,
    degraded: &mut Vec<EntityKind>,
) -> Vec<Record> {
    result.unwrap_or_else(|e| {
        warn!(%kind, error = %e, "Dashboard source unavailable, showing empty");
        degraded.push(kind);
        Vec::new()
    })
}
