//! Runtime view of a value, tagged by kind.
//!
//! ## Model
//!
//! Every hashable type implements [`Identity`], which exposes the value as a
//! [`Value`]: one of a closed set of kinds (primitive, pointer, map, instant,
//! struct, dynamic, sequence, raw bytes, opaque). Composite kinds hold their
//! children as [`Node`]s, which the dispatcher resolves lazily. That keeps the
//! depth guard and cycle detection in a single place.
//!
//! ## Zero Values
//!
//! [`Identity::zero_value`] describes what an absent reference to the type hashes
//! as: `""`, `0`, `false`, empty collections, a struct of zero fields, and
//! `0001-01-01T00:00:00Z` for instants. Types without a sensible zero return
//! `None`, and an absent reference to them cannot be encoded.
//!
//! Derived structs resolve the zero of each field lazily ([`Node::Zero`]), so
//! recursive types such as linked nodes have a finite zero value. A type whose
//! zero is already being expanded further up contributes no bytes.

mod impls;

use std::borrow::Cow;
use std::fmt;

use chrono::{DateTime, FixedOffset};

use crate::filter::include_field;

/// A type whose canonical content can be fingerprinted.
///
/// Usually derived:
///
/// ```rust
/// use destruct::{hash_identity, Identity};
///
/// #[derive(Identity)]
/// struct Account {
///     name: String,
///     #[identity = "-"]
///     last_login: u64,
/// }
///
/// let a = Account { name: "ops".into(), last_login: 1 };
/// let b = Account { name: "ops".into(), last_login: 2 };
/// assert_eq!(hash_identity(&a).unwrap(), hash_identity(&b).unwrap());
/// ```
pub trait Identity {
    /// Expose this value to the strategy chain.
    fn identity_value(&self) -> Value<'_>;

    /// Value hashed in place of an absent reference to this type.
    fn zero_value() -> Option<Value<'static>>
    where
        Self: Sized,
    {
        None
    }
}

/// Zero value lookup that also covers unsized types.
///
/// [`Identity::zero_value`] needs `Self: Sized`, so a borrowed `&str` or
/// `&[T]` cannot reach it through its pointee. Every sized [`Identity`] type
/// gets this for free; `str`, slices and trait objects implement it directly.
pub trait ZeroValue {
    /// Value hashed in place of an absent reference to this type.
    fn zero() -> Option<Value<'static>>;
}

impl<T: Identity> ZeroValue for T {
    fn zero() -> Option<Value<'static>> {
        T::zero_value()
    }
}

/// Kind tag of a [`Value`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ValueKind {
    /// String, integer, float or boolean.
    Primitive,
    /// Optional or pointer-like reference.
    Pointer,
    /// Unordered key/value collection.
    Map,
    /// Point in time.
    Instant,
    /// Record with named fields.
    Struct,
    /// Value behind a dynamically typed container.
    Dynamic,
    /// Ordered collection.
    Sequence,
    /// Raw byte representation.
    Raw,
    /// Unrecognized value.
    Opaque,
}

impl ValueKind {
    /// Lowercase name of the kind.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Primitive => "primitive",
            Self::Pointer => "pointer",
            Self::Map => "map",
            Self::Instant => "instant",
            Self::Struct => "struct",
            Self::Dynamic => "dynamic",
            Self::Sequence => "sequence",
            Self::Raw => "raw",
            Self::Opaque => "opaque",
        }
    }
}

impl fmt::Display for ValueKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A value as seen by the strategy chain.
#[derive(Debug)]
pub enum Value<'a> {
    /// String, integer, float or boolean.
    Primitive(Primitive<'a>),
    /// Optional or pointer-like reference.
    Pointer(Pointer<'a>),
    /// Key/value entries in arbitrary order.
    Map(Vec<(Node<'a>, Node<'a>)>),
    /// Point in time with its UTC offset.
    Instant(DateTime<FixedOffset>),
    /// Record with named fields.
    Struct(StructValue<'a>),
    /// Value behind a dynamically typed container. `None` when the concrete
    /// value cannot be safely extracted.
    Dynamic(Option<Node<'a>>),
    /// Elements in positional order.
    Sequence(Vec<Node<'a>>),
    /// Raw bytes, hashed as-is.
    Raw(Cow<'a, [u8]>),
    /// Unrecognized value, identified by its type name.
    Opaque(&'static str),
}

impl<'a> Value<'a> {
    /// Kind tag of this value.
    pub fn kind(&self) -> ValueKind {
        match self {
            Self::Primitive(_) => ValueKind::Primitive,
            Self::Pointer(_) => ValueKind::Pointer,
            Self::Map(_) => ValueKind::Map,
            Self::Instant(_) => ValueKind::Instant,
            Self::Struct(_) => ValueKind::Struct,
            Self::Dynamic(_) => ValueKind::Dynamic,
            Self::Sequence(_) => ValueKind::Sequence,
            Self::Raw(_) => ValueKind::Raw,
            Self::Opaque(_) => ValueKind::Opaque,
        }
    }

    /// Whether this is an absent reference.
    pub fn is_absent(&self) -> bool {
        matches!(self, Self::Pointer(pointer) if pointer.is_absent())
    }

    /// Short human-readable description, used in errors and logs.
    pub fn describe(&self) -> String {
        match self {
            Self::Primitive(primitive) => format!("primitive {}", primitive.type_label()),
            Self::Pointer(pointer) if pointer.is_absent() => "absent pointer".to_string(),
            Self::Pointer(_) => "pointer".to_string(),
            Self::Map(entries) => format!("map with {} entries", entries.len()),
            Self::Instant(instant) => format!("instant {instant}"),
            Self::Struct(record) => format!("struct {}", record.name),
            Self::Dynamic(None) => "dynamic value that cannot be extracted".to_string(),
            Self::Dynamic(Some(_)) => "dynamic value".to_string(),
            Self::Sequence(items) => format!("sequence of {} elements", items.len()),
            Self::Raw(bytes) => format!("{} raw bytes", bytes.len()),
            Self::Opaque(type_name) => type_name.to_string(),
        }
    }
}

/// Scalar values.
#[derive(Debug, Clone, PartialEq)]
pub enum Primitive<'a> {
    /// UTF-8 text.
    Str(Cow<'a, str>),
    /// 8-bit signed integer.
    I8(i8),
    /// 16-bit signed integer.
    I16(i16),
    /// 32-bit signed integer.
    I32(i32),
    /// 64-bit signed integer.
    I64(i64),
    /// 128-bit signed integer.
    I128(i128),
    /// 8-bit unsigned integer.
    U8(u8),
    /// 16-bit unsigned integer.
    U16(u16),
    /// 32-bit unsigned integer.
    U32(u32),
    /// 64-bit unsigned integer.
    U64(u64),
    /// 128-bit unsigned integer.
    U128(u128),
    /// 32-bit float.
    F32(f32),
    /// 64-bit float.
    F64(f64),
    /// Boolean.
    Bool(bool),
}

impl Primitive<'_> {
    fn type_label(&self) -> &'static str {
        match self {
            Self::Str(_) => "str",
            Self::I8(_) => "i8",
            Self::I16(_) => "i16",
            Self::I32(_) => "i32",
            Self::I64(_) => "i64",
            Self::I128(_) => "i128",
            Self::U8(_) => "u8",
            Self::U16(_) => "u16",
            Self::U32(_) => "u32",
            Self::U64(_) => "u64",
            Self::U128(_) => "u128",
            Self::F32(_) => "f32",
            Self::F64(_) => "f64",
            Self::Bool(_) => "bool",
        }
    }
}

/// Optional or pointer-like reference.
#[derive(Debug)]
pub struct Pointer<'a> {
    /// The pointee, when present.
    pub target: Option<Node<'a>>,
    /// Zero value of the pointee type, hashed when the target is absent.
    pub zero: Option<Box<Value<'static>>>,
    /// Allocation address of a shared pointer, used for cycle detection.
    pub address: Option<usize>,
}

impl<'a> Pointer<'a> {
    /// A present, uniquely owned or borrowed target.
    pub fn present(target: Node<'a>) -> Self {
        Self {
            target: Some(target),
            zero: None,
            address: None,
        }
    }

    /// A present target behind a shared allocation.
    pub fn shared(target: Node<'a>, address: usize) -> Self {
        Self {
            target: Some(target),
            zero: None,
            address: Some(address),
        }
    }

    /// An absent target with the pointee type's zero value.
    pub fn absent(zero: Option<Value<'static>>) -> Self {
        Self {
            target: None,
            zero: zero.map(Box::new),
            address: None,
        }
    }

    /// Whether the target is absent.
    pub fn is_absent(&self) -> bool {
        self.target.is_none()
    }
}

/// A struct and its field descriptors, in declaration order.
#[derive(Debug)]
pub struct StructValue<'a> {
    /// Type name.
    pub name: &'static str,
    /// Fields in declaration order.
    pub fields: Vec<Field<'a>>,
}

impl<'a> StructValue<'a> {
    /// Create a struct value.
    pub fn new(name: &'static str, fields: Vec<Field<'a>>) -> Self {
        Self { name, fields }
    }
}

/// Field descriptor: name, declared type, identity marker and value.
#[derive(Debug)]
pub struct Field<'a> {
    /// Field name (tuple fields use their index).
    pub name: &'static str,
    /// Declared type of the field.
    pub type_name: &'static str,
    /// Value of the `identity` marker, if any.
    pub marker: Option<&'static str>,
    /// The field value.
    pub value: Node<'a>,
}

impl<'a> Field<'a> {
    /// Create a field descriptor.
    pub fn new(
        name: &'static str,
        type_name: &'static str,
        marker: Option<&'static str>,
        value: Node<'a>,
    ) -> Self {
        Self {
            name,
            type_name,
            marker,
            value,
        }
    }

    /// Whether this field contributes to the fingerprint.
    pub fn is_included(&self) -> bool {
        include_field(self.marker)
    }
}

/// A child of a composite value, resolved by the dispatcher on demand.
pub enum Node<'a> {
    /// A borrowed child.
    Borrowed(&'a dyn Identity),
    /// An owned child, such as a lock guard or an upgraded weak reference.
    Owned(Box<dyn Identity + 'a>),
    /// An already materialized value.
    Value(Box<Value<'a>>),
    /// The zero value of a type, built when the child is dispatched.
    Zero {
        /// Name of the type whose zero value this is.
        type_name: &'static str,
        /// Builds the zero value.
        zero: fn() -> Option<Value<'static>>,
    },
}

impl<'a> Node<'a> {
    /// Borrow a child.
    pub fn borrowed<T: Identity + 'a>(value: &'a T) -> Self {
        Self::Borrowed(value)
    }

    /// Wrap a materialized value.
    pub fn value(value: Value<'a>) -> Self {
        Self::Value(Box::new(value))
    }

    /// Lazily resolved zero value of `T`.
    pub fn zero_of<T: Identity>() -> Self {
        Self::Zero {
            type_name: std::any::type_name::<T>(),
            zero: T::zero_value,
        }
    }
}

impl fmt::Debug for Node<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Borrowed(_) => f.write_str("Borrowed(..)"),
            Self::Owned(_) => f.write_str("Owned(..)"),
            Self::Value(value) => f.debug_tuple("Value").field(value).finish(),
            Self::Zero { type_name, .. } => f.debug_tuple("Zero").field(type_name).finish(),
        }
    }
}
