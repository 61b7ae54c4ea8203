//! Type-keyed factory table for objreg.
//!
//! Independent subsystems contribute factories by subscribing an
//! initializer to a [`CreatorRegistry`]. The table is rebuilt lazily: any
//! subscribe or unsubscribe marks it dirty, and the next lookup replays
//! every live initializer into a fresh table before answering.
//!
//! # Modules
//!
//! - [`error`] — [`CreatorError`] (table consistency) and [`CreateError`]
//!   (factory failures)
//! - [`factory`] — The [`ObjectFactory`] trait and its call context
//! - [`registry`] — [`CreatorRegistry`], [`CreatorTable`] and subscriptions

pub mod error;
pub mod factory;
pub mod registry;

pub use error::{CreateError, CreatorError, CreatorResult};
pub use factory::{CreateContext, CreatorEntry, ObjectFactory};
pub use registry::{CreatorInitializer, CreatorRegistry, CreatorTable, CreatorTableBuilder, SubscriptionId};
