//! Foundation types for objreg.
//!
//! This crate provides the identity and input types shared by every other
//! objreg crate. It has no notion of a registry; it only defines what gets
//! stored and how it is named.
//!
//! # Key Types
//!
//! - [`TypeDescriptor`] — Stable identity for a class of storable object
//! - [`Recipe`] — Ordered, named input blocks a factory rebuilds an object from
//! - [`validate_object_name`] — Rules every registry key must satisfy

pub mod descriptor;
pub mod error;
pub mod names;
pub mod recipe;

pub use descriptor::TypeDescriptor;
pub use error::TypeError;
pub use names::validate_object_name;
pub use recipe::Recipe;
