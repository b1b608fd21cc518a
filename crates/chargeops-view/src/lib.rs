//! List view-state pipeline for the `ChargeOps` console
//!
//! A screen's canonical collection flows through enrichment, filtering,
//! sorting and pagination to produce the visible page. Everything here is
//! synchronous and owned by a single [`ListView`]; fetching lives in
//! `chargeops-client`.

#![forbid(unsafe_code)]
#![warn(
    clippy::all,
    clippy::pedantic,
    clippy::nursery,
    missing_docs,
    rust_2018_idioms
)]

pub mod enrich;
pub mod filter;
pub mod list_view;
pub mod paginate;
pub mod screens;
pub mod sort;
pub mod stats;
pub mod toast;
pub mod validate;

pub use filter::{Constraint, FilterSpec, MatchKind, Selection};
pub use list_view::{ListView, LoadState, Page};
pub use paginate::{PageError, PageInfo, Paginator};
pub use screens::ScreenDef;
pub use sort::{Direction, FieldKind, SortSpec};
pub use stats::{ChargerStats, FeedbackStats, TransactionStats, UserStats};
pub use toast::{Toast, ToastKind, ToastQueue};
pub use validate::Intent;

/// Errors raised by view-state operations
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ViewError {
    /// The screen has no filter on this field
    #[error("'{field}' is not a filter on the {screen} screen")]
    UnknownFilter {
        /// Screen label
        screen: String,
        /// Field asked for
        field: String,
    },

    /// Pagination error
    #[error(transparent)]
    Page(#[from] PageError),
}
