//! Strategy chain: ordered type handlers.
//!
//! ## Standard Order
//!
//! ```text
//! primitive → pointer → map → instant → struct → dynamic → sequence → raw
//! ```
//!
//! The first strategy whose predicate matches and which encodes the value wins.
//! Instants are tried before structs so a point in time is always hashed through
//! its canonical text, never field by field.
//!
//! ## Encodings
//!
//! | Kind | Bytes |
//! |------|-------|
//! | string | UTF-8, no length prefix, no terminator |
//! | integer / float | big-endian, native width (`usize`/`isize` as 64-bit) |
//! | bool | one byte, `0x00` or `0x01` |
//! | pointer | pointee, or the pointee type's zero value when absent |
//! | map / set | entries sorted by encoded key, then encoded value; key bytes then value bytes |
//! | instant | RFC 3339 with nanoseconds (see [`crate::canonical::format_instant`]) |
//! | struct | included fields sorted by name; values only |
//! | dynamic | the unwrapped concrete value |
//! | sequence | elements in index order |
//! | raw | the bytes as-is |

use std::borrow::Cow;
use std::fmt;

use crate::canonical::{format_instant, ordered_entries, ordered_fields};
use crate::dispatch::{Outcome, Traversal};
use crate::error::IdentityError;
use crate::value::{Primitive, Value};

/// Applicability predicate of a strategy.
pub type Applies = fn(&Value<'_>) -> bool;

/// Encoder of a strategy.
///
/// May return [`Outcome::Declined`] only if nothing was written.
pub type Encode = fn(&mut Traversal<'_>, &Value<'_>) -> Result<Outcome, IdentityError>;

/// A named predicate/encoder pair.
#[derive(Clone, Copy)]
pub struct Strategy {
    name: &'static str,
    applies: Applies,
    encode: Encode,
}

impl Strategy {
    /// Create a strategy.
    pub const fn new(name: &'static str, applies: Applies, encode: Encode) -> Self {
        Self {
            name,
            applies,
            encode,
        }
    }

    /// Strategy name.
    pub fn name(&self) -> &'static str {
        self.name
    }

    /// Whether this strategy handles the value.
    pub fn applies(&self, value: &Value<'_>) -> bool {
        (self.applies)(value)
    }

    /// Encode the value.
    pub fn encode(
        &self,
        traversal: &mut Traversal<'_>,
        value: &Value<'_>,
    ) -> Result<Outcome, IdentityError> {
        (self.encode)(traversal, value)
    }
}

impl fmt::Debug for Strategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("Strategy").field(&self.name).finish()
    }
}

/// Strategies in the standard priority order.
pub const STANDARD_STRATEGIES: [Strategy; 8] = [
    Strategy::new("primitive", is_primitive, encode_primitive),
    Strategy::new("pointer", is_pointer, encode_pointer),
    Strategy::new("map", is_map, encode_map),
    Strategy::new("instant", is_instant, encode_instant),
    Strategy::new("struct", is_struct, encode_struct),
    Strategy::new("dynamic", is_dynamic, encode_dynamic),
    Strategy::new("sequence", is_sequence, encode_sequence),
    Strategy::new("raw", is_raw, encode_raw),
];

static STANDARD_CHAIN: StrategyChain = StrategyChain {
    strategies: Cow::Borrowed(&STANDARD_STRATEGIES),
};

/// Ordered, immutable list of strategies.
#[derive(Debug, Clone)]
pub struct StrategyChain {
    strategies: Cow<'static, [Strategy]>,
}

impl StrategyChain {
    /// The process-wide standard chain.
    pub fn standard() -> &'static StrategyChain {
        &STANDARD_CHAIN
    }

    /// Build a custom chain; strategies are tried in the given order.
    pub fn new(strategies: Vec<Strategy>) -> Self {
        Self {
            strategies: Cow::Owned(strategies),
        }
    }

    /// Copy of this chain with `strategy` inserted before the one named `before`.
    ///
    /// Appends when no strategy has that name.
    pub fn with_strategy_before(&self, before: &str, strategy: Strategy) -> Self {
        let mut strategies = self.strategies.to_vec();
        let position = strategies
            .iter()
            .position(|existing| existing.name == before)
            .unwrap_or(strategies.len());
        strategies.insert(position, strategy);
        Self::new(strategies)
    }

    /// Strategies in priority order.
    pub fn iter(&self) -> impl Iterator<Item = &Strategy> {
        self.strategies.iter()
    }

    /// Strategy names in priority order.
    pub fn names(&self) -> Vec<&'static str> {
        self.strategies.iter().map(Strategy::name).collect()
    }

    /// Number of strategies.
    pub fn len(&self) -> usize {
        self.strategies.len()
    }

    /// Whether the chain has no strategies.
    pub fn is_empty(&self) -> bool {
        self.strategies.is_empty()
    }
}

impl Default for StrategyChain {
    fn default() -> Self {
        STANDARD_CHAIN.clone()
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Primitive
// ─────────────────────────────────────────────────────────────────────────────

fn is_primitive(value: &Value<'_>) -> bool {
    matches!(value, Value::Primitive(_))
}

fn encode_primitive(traversal: &mut Traversal<'_>, value: &Value<'_>) -> Result<Outcome, IdentityError> {
    let Value::Primitive(primitive) = value else {
        return Ok(Outcome::Declined);
    };
    traversal.write(&primitive_bytes(primitive))?;
    Ok(Outcome::Encoded)
}

/// Canonical bytes of a primitive.
pub fn primitive_bytes<'p>(primitive: &'p Primitive<'_>) -> Cow<'p, [u8]> {
    match primitive {
        Primitive::Str(text) => Cow::Borrowed(text.as_bytes()),
        Primitive::I8(v) => Cow::Owned(v.to_be_bytes().to_vec()),
        Primitive::I16(v) => Cow::Owned(v.to_be_bytes().to_vec()),
        Primitive::I32(v) => Cow::Owned(v.to_be_bytes().to_vec()),
        Primitive::I64(v) => Cow::Owned(v.to_be_bytes().to_vec()),
        Primitive::I128(v) => Cow::Owned(v.to_be_bytes().to_vec()),
        Primitive::U8(v) => Cow::Owned(v.to_be_bytes().to_vec()),
        Primitive::U16(v) => Cow::Owned(v.to_be_bytes().to_vec()),
        Primitive::U32(v) => Cow::Owned(v.to_be_bytes().to_vec()),
        Primitive::U64(v) => Cow::Owned(v.to_be_bytes().to_vec()),
        Primitive::U128(v) => Cow::Owned(v.to_be_bytes().to_vec()),
        Primitive::F32(v) => Cow::Owned(v.to_be_bytes().to_vec()),
        Primitive::F64(v) => Cow::Owned(v.to_be_bytes().to_vec()),
        Primitive::Bool(v) => Cow::Owned(vec![u8::from(*v)]),
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Pointer / optional
// ─────────────────────────────────────────────────────────────────────────────

fn is_pointer(value: &Value<'_>) -> bool {
    matches!(value, Value::Pointer(_))
}

fn encode_pointer(traversal: &mut Traversal<'_>, value: &Value<'_>) -> Result<Outcome, IdentityError> {
    let Value::Pointer(pointer) = value else {
        return Ok(Outcome::Declined);
    };

    match (&pointer.target, pointer.address) {
        (Some(target), Some(address)) => {
            traversal.enter_shared(address)?;
            traversal.dispatch_node(target)?;
            traversal.leave_shared();
            Ok(Outcome::Encoded)
        }
        (Some(target), None) => {
            traversal.dispatch_node(target)?;
            Ok(Outcome::Encoded)
        }
        // Absent reference hashes as the pointee's zero value, if it has one.
        (None, _) => match pointer.zero.as_deref() {
            Some(zero) => traversal.try_dispatch(zero),
            None => Ok(Outcome::Declined),
        },
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Map
// ─────────────────────────────────────────────────────────────────────────────

fn is_map(value: &Value<'_>) -> bool {
    matches!(value, Value::Map(_))
}

fn encode_map(traversal: &mut Traversal<'_>, value: &Value<'_>) -> Result<Outcome, IdentityError> {
    let Value::Map(entries) = value else {
        return Ok(Outcome::Declined);
    };

    let mut encoded = Vec::with_capacity(entries.len());
    for (key, item) in entries {
        let key_bytes = traversal.capture(key)?;
        let item_bytes = traversal.capture(item)?;
        encoded.push((key_bytes, item_bytes));
    }

    for (key_bytes, item_bytes) in ordered_entries(encoded) {
        traversal.write(&key_bytes)?;
        traversal.write(&item_bytes)?;
    }
    Ok(Outcome::Encoded)
}

// ─────────────────────────────────────────────────────────────────────────────
// Instant
// ─────────────────────────────────────────────────────────────────────────────

fn is_instant(value: &Value<'_>) -> bool {
    matches!(value, Value::Instant(_))
}

fn encode_instant(traversal: &mut Traversal<'_>, value: &Value<'_>) -> Result<Outcome, IdentityError> {
    let Value::Instant(instant) = value else {
        return Ok(Outcome::Declined);
    };
    traversal.write(format_instant(instant).as_bytes())?;
    Ok(Outcome::Encoded)
}

// ─────────────────────────────────────────────────────────────────────────────
// Struct
// ─────────────────────────────────────────────────────────────────────────────

fn is_struct(value: &Value<'_>) -> bool {
    matches!(value, Value::Struct(_))
}

fn encode_struct(traversal: &mut Traversal<'_>, value: &Value<'_>) -> Result<Outcome, IdentityError> {
    let Value::Struct(record) = value else {
        return Ok(Outcome::Declined);
    };

    tracing::debug!(
        name = record.name,
        fields = record.fields.len(),
        depth = traversal.depth(),
        "encoding struct"
    );

    for field in ordered_fields(&record.fields) {
        tracing::trace!(field = field.name, type_name = field.type_name, "encoding field");
        traversal.dispatch_node(&field.value)?;
    }
    Ok(Outcome::Encoded)
}

// ─────────────────────────────────────────────────────────────────────────────
// Dynamic
// ─────────────────────────────────────────────────────────────────────────────

fn is_dynamic(value: &Value<'_>) -> bool {
    matches!(value, Value::Dynamic(Some(_)))
}

fn encode_dynamic(traversal: &mut Traversal<'_>, value: &Value<'_>) -> Result<Outcome, IdentityError> {
    let Value::Dynamic(Some(inner)) = value else {
        return Ok(Outcome::Declined);
    };
    traversal.dispatch_node(inner)?;
    Ok(Outcome::Encoded)
}

// ─────────────────────────────────────────────────────────────────────────────
// Sequence
// ─────────────────────────────────────────────────────────────────────────────

fn is_sequence(value: &Value<'_>) -> bool {
    matches!(value, Value::Sequence(_))
}

fn encode_sequence(traversal: &mut Traversal<'_>, value: &Value<'_>) -> Result<Outcome, IdentityError> {
    let Value::Sequence(items) = value else {
        return Ok(Outcome::Declined);
    };
    for item in items {
        traversal.dispatch_node(item)?;
    }
    Ok(Outcome::Encoded)
}

// ─────────────────────────────────────────────────────────────────────────────
// Raw fallback
// ─────────────────────────────────────────────────────────────────────────────

fn is_raw(value: &Value<'_>) -> bool {
    matches!(value, Value::Raw(_))
}

fn encode_raw(traversal: &mut Traversal<'_>, value: &Value<'_>) -> Result<Outcome, IdentityError> {
    let Value::Raw(bytes) = value else {
        return Ok(Outcome::Declined);
    };
    tracing::trace!(len = bytes.len(), "writing raw bytes");
    traversal.write(bytes)?;
    Ok(Outcome::Encoded)
}
