//! Incremental reflection-probe baking.
//!
//! Each probe's settings are fingerprinted into a state hash, folded with a
//! scene-wide dependency hash into an output hash, and the sorted set of
//! required output hashes is diffed against what is already baked. Only the
//! difference is rendered or pruned, one probe per [`BakeScheduler::tick`].

#![warn(missing_docs)]

pub mod collab;
pub mod disk;
pub mod entity;
pub mod error;
pub mod fingerprint;
pub mod reconcile;
pub mod scheduler;

pub use collab::{EntityEnumerator, Renderer, TextureCache};
pub use disk::{DiskTextureCache, ImportedTexture};
pub use entity::{BakeableEntity, CustomTexture, PlanarProbe, ProbeKind, ReflectionProbe, SceneStateHash};
pub use error::{BakeError, RenderError};
pub use fingerprint::Fingerprinter;
pub use reconcile::{compare, BakeDiff};
pub use scheduler::{BakePhase, BakeProgress, BakeScheduler, BakeSettings, CommitSummary, TickReport};
