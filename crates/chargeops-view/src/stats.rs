//! Dashboard KPI statistics

use chargeops_core::{
    Record,
    utils::{parse_instant, percentage, round_to, same_month},
};
use chrono::{DateTime, Utc};
use serde::Serialize;

/// User account statistics
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct UserStats {
    /// All users
    pub total: usize,
    /// Users considered active
    pub active: usize,
    /// Administrators
    pub admins: usize,
    /// `total - active`
    pub inactive: usize,
    /// Users created in the calendar month of `now`
    pub new_this_month: usize,
    /// `new_this_month` as a percentage of `total`, one decimal
    pub growth_rate: f64,
}

impl UserStats {
    /// Compute from the users collection
    ///
    /// A user with neither `status` nor `is_active` counts as active.
    #[must_use]
    pub fn compute(users: &[Record], now: DateTime<Utc>) -> Self {
        let total = users.len();
        let active = users.iter().filter(|u| is_active_user(u)).count();
        let admins = users.iter().filter(|u| is_admin_user(u)).count();
        let new_this_month = users
            .iter()
            .filter_map(|u| parse_instant(u.text("created_at")))
            .filter(|created| same_month(created, &now))
            .count();

        Self {
            total,
            active,
            admins,
            inactive: total - active,
            new_this_month,
            growth_rate: round_to(percentage(new_this_month, total), 1),
        }
    }
}

fn is_active_user(user: &Record) -> bool {
    let status = user.text("status");
    status == "active"
        || user.boolean("is_active") == Some(true)
        || (status.is_empty() && !user.contains("is_active"))
}

fn is_admin_user(user: &Record) -> bool {
    user.text("role") == "admin"
        || user.text("user_type") == "admin"
        || user.boolean("is_admin") == Some(true)
}

/// Map backend charger status spellings onto display categories
#[must_use]
pub fn normalize_charger_status(raw: &str) -> &str {
    match raw {
        "active" => "Available",
        "charging" => "Charging",
        "finishing" => "Finishing",
        other => other,
    }
}

/// Charging-point statistics
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ChargerStats {
    /// All chargers
    pub total: usize,
    /// Chargers in `Available`
    pub available: usize,
    /// Chargers in `Charging`
    pub charging: usize,
    /// Chargers in `Finishing`
    pub finishing: usize,
    /// Chargers administratively enabled
    pub enabled: usize,
    /// `charging` as a rounded percentage of `total`
    pub utilization: f64,
    /// Sum of session counters
    pub total_sessions: f64,
    /// Sum of delivered energy
    pub total_energy: f64,
}

impl ChargerStats {
    /// Compute from the chargers collection
    #[must_use]
    pub fn compute(chargers: &[Record]) -> Self {
        let count = |status: &str| {
            chargers
                .iter()
                .filter(|c| normalize_charger_status(c.text("status")) == status)
                .count()
        };
        let total = chargers.len();
        let charging = count("Charging");

        Self {
            total,
            available: count("Available"),
            charging,
            finishing: count("Finishing"),
            enabled: chargers
                .iter()
                .filter(|c| c.boolean("enabled") == Some(true))
                .count(),
            utilization: percentage(charging, total).round(),
            total_sessions: chargers
                .iter()
                .map(|c| first_nonzero(c, &["total_sessions", "session_count", "sessions"]))
                .sum(),
            total_energy: chargers
                .iter()
                .map(|c| first_nonzero(c, &["total_energy", "energy_delivered"]))
                .sum(),
        }
    }
}

fn first_nonzero(record: &Record, fields: &[&str]) -> f64 {
    fields
        .iter()
        .filter_map(|f| record.number(f))
        .find(|n| *n != 0.0)
        .unwrap_or(0.0)
}

/// Feedback statistics
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct FeedbackStats {
    /// All feedback
    pub total: usize,
    /// Mean rating, one decimal; missing ratings count as 0
    pub average_rating: f64,
    /// Status `New`
    pub new: usize,
    /// Status `Resolved`
    pub resolved: usize,
    /// Status `New` or `In Progress`
    pub pending: usize,
    /// Ratings of 4 or more as a rounded percentage
    pub satisfaction: f64,
}

impl FeedbackStats {
    /// Compute from the feedback collection
    #[must_use]
    #[allow(clippy::cast_precision_loss)]
    pub fn compute(feedback: &[Record]) -> Self {
        let total = feedback.len();
        let status = |s: &str| feedback.iter().filter(|f| f.text("status") == s).count();
        let rating_sum: f64 = feedback.iter().filter_map(|f| f.number("rating")).sum();
        let satisfied = feedback
            .iter()
            .filter(|f| f.number("rating").is_some_and(|r| r >= 4.0))
            .count();
        let new = status("New");

        Self {
            total,
            average_rating: if total == 0 {
                0.0
            } else {
                round_to(rating_sum / total as f64, 1)
            },
            new,
            resolved: status("Resolved"),
            pending: new + status("In Progress"),
            satisfaction: percentage(satisfied, total).round(),
        }
    }
}

/// Transaction statistics
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct TransactionStats {
    /// All transactions
    pub total: usize,
    /// Transactions of type `user`
    pub user: usize,
    /// Transactions of type `cp`
    pub cp: usize,
    /// Sum of `amount`
    pub total_amount: f64,
    /// Status `completed`
    pub completed: usize,
    /// Status `pending`
    pub pending: usize,
    /// Status `failed`
    pub failed: usize,
}

impl TransactionStats {
    /// Compute from the transactions collection
    #[must_use]
    pub fn compute(transactions: &[Record]) -> Self {
        let by = |field: &str, value: &str| {
            transactions
                .iter()
                .filter(|t| t.text(field) == value)
                .count()
        };

        Self {
            total: transactions.len(),
            user: by("type", "user"),
            cp: by("type", "cp"),
            total_amount: transactions.iter().filter_map(|t| t.number("amount")).sum(),
            completed: by("status", "completed"),
            pending: by("status", "pending"),
            failed: by("status", "failed"),
        }
    }
}
