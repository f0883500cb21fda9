//! Persistent bake state and content-addressed texture storage.
//!
//! This crate holds the sorted record of which probe outputs are currently
//! baked, persists it between runs, and stores the baked texture payloads on
//! disk keyed by their output hash.

#![warn(missing_docs)]

pub mod artifact;
pub mod error;
pub mod manifest;
pub mod store;

pub use artifact::{TextureHeader, TextureStore};
pub use error::CacheError;
pub use manifest::BakeManifest;
pub use store::{BakedRecord, BakedStateStore};
