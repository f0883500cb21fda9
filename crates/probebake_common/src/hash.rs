//! Content hashing for bake invalidation.
//!
//! Every decision the bake pipeline makes is a comparison between [`Hash128`]
//! values: a probe is rebaked exactly when its output hash is absent from the
//! baked state, and a cached texture is pruned exactly when its output hash is
//! no longer produced by any active probe.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use xxhash_rust::xxh3::{xxh3_128, Xxh3};

/// A 128-bit content hash computed using XXH3.
///
/// Two values that compare equal are assumed to describe identical content.
/// The bytes are stored big-endian so that the derived lexicographic ordering
/// matches the numeric ordering of the underlying digest; the reconciler only
/// requires that the order is total.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize)]
pub struct Hash128([u8; 16]);

impl Hash128 {
    /// The all-zero hash. Seed value for every fold.
    pub const EMPTY: Hash128 = Hash128([0; 16]);

    /// Computes the hash of a byte buffer using XXH3-128.
    pub fn of(data: &[u8]) -> Self {
        Self::from_u128(xxh3_128(data))
    }

    /// Wraps a raw 128-bit digest.
    pub const fn from_u128(value: u128) -> Self {
        Self(value.to_be_bytes())
    }

    /// Returns the raw 128-bit digest.
    pub const fn as_u128(&self) -> u128 {
        u128::from_be_bytes(self.0)
    }

    /// Returns the raw bytes of the hash.
    pub const fn as_bytes(&self) -> &[u8; 16] {
        &self.0
    }

    /// Folds `other` into `self`, producing a new hash.
    ///
    /// The result depends on both operands and on their order:
    /// `a.append(b)` and `b.append(a)` differ in general.
    #[must_use]
    pub fn append(self, other: Hash128) -> Self {
        let mut buf = [0u8; 32];
        buf[..16].copy_from_slice(&self.0);
        buf[16..].copy_from_slice(&other.0);
        Self::of(&buf)
    }

    /// Folds an ordered sequence of hashes into one summary value.
    ///
    /// Starts from [`Hash128::EMPTY`] and appends each element in turn, so an
    /// empty sequence combines to `EMPTY`.
    pub fn combine<I>(hashes: I) -> Self
    where
        I: IntoIterator<Item = Hash128>,
    {
        hashes.into_iter().fold(Self::EMPTY, Self::append)
    }

    /// Returns `true` for the all-zero hash.
    pub fn is_empty(&self) -> bool {
        *self == Self::EMPTY
    }
}

impl fmt::Display for Hash128 {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for byte in &self.0 {
            write!(f, "{byte:02x}")?;
        }
        Ok(())
    }
}

impl fmt::Debug for Hash128 {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Hash128({:02x}{:02x}{:02x}{:02x}..)", self.0[0], self.0[1], self.0[2], self.0[3])
    }
}

/// Error returned when parsing a [`Hash128`] from its hex form fails.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ParseHashError {
    /// The input is not exactly 32 characters long.
    #[error("expected 32 hex digits, got {0} characters")]
    Length(usize),
    /// The input contains a non-hex character.
    #[error("invalid hex digit in hash")]
    InvalidDigit,
}

impl FromStr for Hash128 {
    type Err = ParseHashError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s.len() != 32 {
            return Err(ParseHashError::Length(s.len()));
        }
        if !s.bytes().all(|b| b.is_ascii_hexdigit()) {
            return Err(ParseHashError::InvalidDigit);
        }
        u128::from_str_radix(s, 16)
            .map(Self::from_u128)
            .map_err(|_| ParseHashError::InvalidDigit)
    }
}

/// Streaming hasher for fingerprinting structured settings.
///
/// Fields are written one at a time in a fixed order; the caller is
/// responsible for keeping that order stable between runs.
pub struct ContentHasher {
    inner: Xxh3,
}

impl ContentHasher {
    /// Creates an empty hasher.
    pub fn new() -> Self {
        Self { inner: Xxh3::new() }
    }

    /// Feeds raw bytes.
    pub fn write_bytes(&mut self, bytes: &[u8]) -> &mut Self {
        self.inner.update(bytes);
        self
    }

    /// Feeds a `u8` tag.
    pub fn write_u8(&mut self, value: u8) -> &mut Self {
        self.write_bytes(&[value])
    }

    /// Feeds a little-endian `u32`.
    pub fn write_u32(&mut self, value: u32) -> &mut Self {
        self.write_bytes(&value.to_le_bytes())
    }

    /// Feeds a little-endian `u64`.
    pub fn write_u64(&mut self, value: u64) -> &mut Self {
        self.write_bytes(&value.to_le_bytes())
    }

    /// Feeds an existing hash.
    pub fn write_hash(&mut self, hash: Hash128) -> &mut Self {
        self.write_bytes(hash.as_bytes())
    }

    /// Feeds a float after scaling by `scale` and rounding to the nearest integer.
    ///
    /// Jitter smaller than `0.5 / scale` therefore never changes the digest.
    pub fn write_quantized(&mut self, value: f32, scale: f32) -> &mut Self {
        self.write_bytes(&quantize(value, scale).to_le_bytes())
    }

    /// Returns the digest of everything written so far.
    pub fn finish(&self) -> Hash128 {
        Hash128::from_u128(self.inner.digest128())
    }
}

impl Default for ContentHasher {
    fn default() -> Self {
        Self::new()
    }
}

/// Scales and rounds a float to an integer lattice point.
///
/// Computed in `f64` so large scales do not lose precision before rounding.
/// `-0.0` and `0.0` map to the same value; NaN maps to zero.
pub fn quantize(value: f32, scale: f32) -> i64 {
    let scaled = (f64::from(value) * f64::from(scale)).round();
    if scaled.is_nan() {
        0
    } else {
        scaled as i64
    }
}
