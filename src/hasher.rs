//! Entry points: identity hashes and canonical byte streams.
//!
//! ## Contract
//!
//! - An absent root (`None`, a dead weak reference) fails with `NilInput`.
//! - Any failure anywhere in the traversal aborts the call: no partial digest.
//! - Each call owns a fresh [`HashSink`]; hashers can be shared across threads.

use std::io::Write;

use crate::config::IdentityConfig;
use crate::dispatch::Traversal;
use crate::error::IdentityError;
use crate::sink::HashSink;
use crate::strategy::StrategyChain;
use crate::value::Identity;

/// Identity hasher bound to a strategy chain and a configuration.
#[derive(Debug, Clone)]
pub struct IdentityHasher<'c> {
    chain: &'c StrategyChain,
    config: IdentityConfig,
}

impl IdentityHasher<'static> {
    /// Hasher using the standard strategy chain.
    pub fn new(config: IdentityConfig) -> Self {
        Self {
            chain: StrategyChain::standard(),
            config,
        }
    }
}

impl Default for IdentityHasher<'static> {
    fn default() -> Self {
        Self::new(IdentityConfig::default())
    }
}

impl<'c> IdentityHasher<'c> {
    /// Hasher using a custom strategy chain.
    pub fn with_chain(chain: &'c StrategyChain, config: IdentityConfig) -> Self {
        Self { chain, config }
    }

    /// Configuration in use.
    pub fn config(&self) -> &IdentityConfig {
        &self.config
    }

    /// Strategy chain in use.
    pub fn chain(&self) -> &'c StrategyChain {
        self.chain
    }

    /// Compute the hex-encoded identity hash of `value`.
    pub fn hash<T: Identity + ?Sized>(&self, value: &T) -> Result<String, IdentityError> {
        let mut sink = HashSink::new(self.config.algorithm);
        self.write_canonical(value, &mut sink)?;

        tracing::trace!(
            algorithm = %sink.algorithm(),
            bytes = sink.bytes_written(),
            "identity hash computed"
        );
        Ok(sink.finalize_hex())
    }

    /// Like [`hash`](Self::hash), but panics on failure.
    pub fn must_hash<T: Identity + ?Sized>(&self, value: &T) -> String {
        match self.hash(value) {
            Ok(digest) => digest,
            Err(e) => {
                tracing::error!(error = %e, kind = %e.kind(), "identity hash failed");
                panic!("identity hash failed: {e}");
            }
        }
    }

    /// Stream the canonical bytes of `value` into `writer`.
    pub fn write_canonical<T, W>(&self, value: &T, writer: &mut W) -> Result<(), IdentityError>
    where
        T: Identity + ?Sized,
        W: Write,
    {
        let root = value.identity_value();
        if root.is_absent() {
            let err = IdentityError::NilInput;
            tracing::error!(error = %err, kind = %err.kind(), "refusing to hash absent value");
            return Err(err);
        }

        let mut traversal = Traversal::new(self.chain, writer, self.config.max_depth);
        traversal.dispatch(&root).map_err(|e| {
            tracing::error!(error = %e, kind = %e.kind(), root = %root.kind(), "identity traversal failed");
            e
        })
    }

    /// Canonical bytes of `value`.
    pub fn canonical_bytes<T: Identity + ?Sized>(&self, value: &T) -> Result<Vec<u8>, IdentityError> {
        let mut buffer = Vec::new();
        self.write_canonical(value, &mut buffer)?;
        Ok(buffer)
    }
}

/// Compute the SHA-512 identity hash of `value` as lowercase hex.
///
/// # Example
///
/// ```rust
/// use std::collections::HashMap;
/// use destruct::hash_identity;
///
/// let mut a = HashMap::new();
/// a.insert("x", 1u32);
/// a.insert("y", 2u32);
///
/// let mut b = HashMap::new();
/// b.insert("y", 2u32);
/// b.insert("x", 1u32);
///
/// assert_eq!(hash_identity(&a).unwrap(), hash_identity(&b).unwrap());
/// ```
pub fn hash_identity<T: Identity + ?Sized>(value: &T) -> Result<String, IdentityError> {
    IdentityHasher::default().hash(value)
}

/// Like [`hash_identity`], but panics on failure.
pub fn must_hash_identity<T: Identity + ?Sized>(value: &T) -> String {
    IdentityHasher::default().must_hash(value)
}

/// Canonical bytes of `value` under the default configuration.
pub fn canonical_bytes<T: Identity + ?Sized>(value: &T) -> Result<Vec<u8>, IdentityError> {
    IdentityHasher::default().canonical_bytes(value)
}
