//! Command layer
//!
//! Ties the game layer to a host: commands are serialized through a single
//! gate, bulk refreshes can be cancelled between games, and every failure a
//! host needs to show is folded into [`error::TrackerError`].
//!
//! # Modules
//!
//! - [`command`]: Mutual exclusion between user commands
//! - [`error`]: Host-facing error type
//! - [`refresh`]: Bulk and single refresh with cancellation
//! - [`tracker`]: Service running commands against the collection

pub mod command;
pub mod error;
pub mod refresh;
pub mod tracker;

pub use error::TrackerError;
pub use tracker::Tracker;
