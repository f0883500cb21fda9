//! Shared foundational types used across the probebake workspace.
//!
//! This crate provides the 128-bit content hash every bake decision is keyed on,
//! the streaming hasher used to fingerprint probe settings, and stable entity ids.

#![warn(missing_docs)]

pub mod hash;
pub mod ident;

pub use hash::{ContentHasher, Hash128, ParseHashError};
pub use ident::EntityId;
