//! # destruct
//!
//! Deterministic identity hashing of structured values.
//!
//! `destruct` answers one question:
//!
//! > Do these two values have the same **canonical content**?
//!
//! ## Core Contract
//!
//! 1. Reduce a value to a canonical byte stream through an ordered strategy chain
//! 2. Feed the stream into a cryptographic digest (SHA-512 by default)
//! 3. Return the digest as lowercase hex, stable across process runs
//!
//! ## Architecture
//!
//! ```text
//! hash_identity → Traversal → StrategyChain → (FieldFilter + Canonicalizer) → HashSink
//!                     ↑______________ children ______________|
//! ```
//!
//! ## Determinism Guarantees
//!
//! - Struct fields are ordered by name, never by declaration order
//! - Map and set entries are ordered by their canonical bytes, never by insertion order
//! - Pointer addresses never reach the digest
//! - Fields marked `#[identity = "-"]` contribute nothing
//!
//! ## Example
//!
//! ```rust
//! use chrono::{DateTime, TimeZone, Utc};
//! use destruct::{hash_identity, Identity};
//!
//! #[derive(Clone, Identity)]
//! struct Person {
//!     first_name: String,
//!     last_name: String,
//!     #[identity = "-"]
//!     created_at: DateTime<Utc>,
//! }
//!
//! let a = Person {
//!     first_name: "Ada".into(),
//!     last_name: "Lovelace".into(),
//!     created_at: Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap(),
//! };
//! let b = Person { created_at: Utc::now(), ..a.clone() };
//!
//! assert_eq!(hash_identity(&a).unwrap(), hash_identity(&b).unwrap());
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]

// Lets the derive macro's `::destruct` paths resolve inside this crate.
extern crate self as destruct;

pub mod canonical;
pub mod config;
pub mod dispatch;
pub mod error;
pub mod filter;
pub mod hasher;
pub mod sink;
pub mod strategy;
pub mod value;

// Re-exports
pub use config::{ConfigError, DigestAlgorithm, IdentityConfig};
pub use destruct_derive::Identity;
pub use dispatch::{Outcome, Traversal};
pub use error::{ErrorKind, IdentityError};
pub use filter::{include_field, EXCLUDE_SENTINEL, IDENTITY_MARKER};
pub use hasher::{canonical_bytes, hash_identity, must_hash_identity, IdentityHasher};
pub use sink::HashSink;
pub use strategy::{Strategy, StrategyChain};
pub use value::{
    Field, Identity, Node, Pointer, Primitive, StructValue, Value, ValueKind, ZeroValue,
};
