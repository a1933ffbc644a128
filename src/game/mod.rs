//! Game tracking layer
//!
//! This module holds the tracked game entity and everything that operates on
//! a single game or on the collection as a whole.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────┐     ┌─────────────┐     ┌─────────────┐
//! │ TitleSource │────▶│   Checker   │────▶│ GameRecord  │
//! │  (fetch)    │     │ (reconcile) │     │  (entity)   │
//! └─────────────┘     └─────────────┘     └─────────────┘
//!        │                                       │
//!        ▼                                       ▼
//! ┌─────────────┐     ┌─────────────┐     ┌─────────────┐
//! │   Sources   │     │    Store    │◀───▶│ Collection  │
//! │   (http)    │     │   (json)    │     │ (+ sorting) │
//! └─────────────┘     └─────────────┘     └─────────────┘
//! ```
//!
//! # Modules
//!
//! - [`checker`]: Single game refresh and first-time initialization
//! - [`collection`]: Ordered, name-unique set of games with change events
//! - [`error`]: Error types for fetching, initialization and storage
//! - [`record`]: The tracked game entity and its sentinel values
//! - [`sort`]: Display order comparators
//! - [`source`]: Trait for fetching thread titles
//! - [`sources`]: Concrete title sources (forum over HTTP)
//! - [`store`]: JSON persistence of the collection
//! - [`timestamp`]: Serde helpers for stored timestamps

pub mod checker;
pub mod collection;
pub mod error;
pub mod record;
pub mod sort;
pub mod source;
pub mod sources;
pub mod store;
pub mod timestamp;
