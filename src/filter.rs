//! Field filter: decides whether a struct field contributes to the fingerprint.
//!
//! A field is excluded only when its `identity` marker is exactly `-`:
//!
//! ```rust
//! use destruct::Identity;
//!
//! #[derive(Identity)]
//! struct Session {
//!     user: String,
//!     #[identity = "-"]
//!     created_at: u64,
//! }
//! ```

/// Name of the per-field marker attribute.
pub const IDENTITY_MARKER: &str = "identity";

/// Marker value that excludes a field.
pub const EXCLUDE_SENTINEL: &str = "-";

/// Whether a field with the given marker is part of the identity.
///
/// Absence of a marker, or any value other than `-`, includes the field.
pub fn include_field(marker: Option<&str>) -> bool {
    marker != Some(EXCLUDE_SENTINEL)
}
