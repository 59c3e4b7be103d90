//! # Contracts
//!
//! Frozen interface contracts shared by every crate in the workspace.
//! Business crates depend on this crate only; reverse dependencies are prohibited.
//!
//! ## Dispatch model
//! - A [`Notification`] is an immutable payload shared as `Arc<N>`
//! - A [`NotificationHandler<N>`] reacts to one concrete notification type
//! - A [`HandlerLookup`] maps a [`HandlerContract`] ("handles N") to the registered instances
//! - Failures are reported through [`HandlerError`] (per handler) and [`PublishError`] (per publish)

mod config;
mod error;
mod handler;
mod lookup;
mod notification;

pub use config::*;
pub use error::*;
pub use handler::{HandlerFn, NotificationHandler};
pub use lookup::{HandlerContract, HandlerLookup, ResolvedHandler};
pub use notification::Notification;

/// Re-exported so downstream crates and handler authors share one token type.
pub use tokio_util::sync::CancellationToken;
