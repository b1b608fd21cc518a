//! Async service layer for the `ChargeOps` operator console
//!
//! Wraps the users, charging-points, feedback and command services behind
//! one [`ApiClient`], and drives [`chargeops_view::ListView`] screens from
//! it: initial loads, mutations, and background polling.

#![forbid(unsafe_code)]
#![warn(
    clippy::all,
    clippy::pedantic,
    clippy::nursery,
    missing_docs,
    rust_2018_idioms
)]

pub mod api_client;
pub mod auth;
pub mod credentials;
pub mod dashboard;
pub mod error;
pub mod jwt;
pub mod lifetime;
pub mod mutation;
pub mod normalize;
pub mod poller;
pub mod screen;

pub use api_client::ApiClient;
pub use auth::{Authenticator, Registration, SessionInfo};
pub use credentials::{CredentialProvider, FileCredentials, MemoryCredentials};
pub use dashboard::{DashboardLoader, DashboardSnapshot};
pub use error::{ClientError, ClientResult};
pub use lifetime::ScreenLifetime;
pub use mutation::{InFlight, MutationDispatcher};
pub use normalize::ResponseShape;
pub use poller::{PollEvent, Poller, PollerStats};
pub use screen::Screen;
