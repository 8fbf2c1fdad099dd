//! Procedural macros for destruct
//!
//! This crate provides one macro:
//! - `#[derive(Identity)]` - Expose a struct's fields to the identity strategy chain

use proc_macro::TokenStream;

mod identity;

/// Derive `destruct::Identity` for a struct.
///
/// Every field type must implement `Identity`. Fields are hashed by name order,
/// not declaration order. Tuple struct fields are named by their index.
///
/// # Attributes
///
/// - `#[identity = "-"]` - Exclude the field from the fingerprint
/// - `#[identity = "..."]` - Any other value keeps the field
///
/// # Example
///
/// ```ignore
/// #[derive(Identity)]
/// pub struct Person {
///     first_name: String,
///     #[identity = "-"]
///     created_at: DateTime<Utc>,
/// }
/// ```
#[proc_macro_derive(Identity, attributes(identity))]
pub fn derive_identity(input: TokenStream) -> TokenStream {
    identity::derive_identity_impl(input)
}
