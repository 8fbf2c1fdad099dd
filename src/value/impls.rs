//! [`Identity`] implementations for standard library and ecosystem types.

use std::any::{type_name, Any};
use std::borrow::Cow;
use std::cell::{Ref, RefCell};
use std::collections::{BTreeMap, BTreeSet, HashMap, HashSet, VecDeque};
use std::hash::BuildHasher;
use std::net::{IpAddr, Ipv4Addr, Ipv6Addr};
use std::rc::{self, Rc};
use std::sync::{self, mpsc, Arc, Mutex, MutexGuard, RwLock, RwLockReadGuard};
use std::time::{SystemTime, UNIX_EPOCH};

use chrono::{DateTime, NaiveDateTime, Offset, TimeZone, Utc};
use uuid::Uuid;

use super::{Identity, Node, Pointer, Primitive, Value, ZeroValue};
use crate::canonical::zero_instant;

// ─────────────────────────────────────────────────────────────────────────────
// Primitives
// ─────────────────────────────────────────────────────────────────────────────

macro_rules! impl_primitive {
    ($($ty:ty => $variant:ident),* $(,)?) => {
        $(
            impl Identity for $ty {
                fn identity_value(&self) -> Value<'_> {
                    Value::Primitive(Primitive::$variant(*self))
                }

                fn zero_value() -> Option<Value<'static>> {
                    Some(Value::Primitive(Primitive::$variant(<$ty>::default())))
                }
            }
        )*
    };
}

impl_primitive! {
    i8 => I8,
    i16 => I16,
    i32 => I32,
    i64 => I64,
    i128 => I128,
    u8 => U8,
    u16 => U16,
    u32 => U32,
    u64 => U64,
    u128 => U128,
    f32 => F32,
    f64 => F64,
    bool => Bool,
}

// Platform-sized integers are widened so output does not depend on the target.
impl Identity for usize {
    fn identity_value(&self) -> Value<'_> {
        Value::Primitive(Primitive::U64(*self as u64))
    }

    fn zero_value() -> Option<Value<'static>> {
        Some(Value::Primitive(Primitive::U64(0)))
    }
}

impl Identity for isize {
    fn identity_value(&self) -> Value<'_> {
        Value::Primitive(Primitive::I64(*self as i64))
    }

    fn zero_value() -> Option<Value<'static>> {
        Some(Value::Primitive(Primitive::I64(0)))
    }
}

impl Identity for char {
    fn identity_value(&self) -> Value<'_> {
        Value::Primitive(Primitive::Str(Cow::Owned(self.to_string())))
    }

    fn zero_value() -> Option<Value<'static>> {
        Some(Value::Primitive(Primitive::Str(Cow::Owned(char::default().to_string()))))
    }
}

impl Identity for str {
    fn identity_value(&self) -> Value<'_> {
        Value::Primitive(Primitive::Str(Cow::Borrowed(self)))
    }
}

impl Identity for String {
    fn identity_value(&self) -> Value<'_> {
        Value::Primitive(Primitive::Str(Cow::Borrowed(self.as_str())))
    }

    fn zero_value() -> Option<Value<'static>> {
        Some(empty_str())
    }
}

impl Identity for Cow<'_, str> {
    fn identity_value(&self) -> Value<'_> {
        Value::Primitive(Primitive::Str(Cow::Borrowed(self.as_ref())))
    }

    fn zero_value() -> Option<Value<'static>> {
        Some(empty_str())
    }
}

fn empty_str() -> Value<'static> {
    Value::Primitive(Primitive::Str(Cow::Borrowed("")))
}

// ─────────────────────────────────────────────────────────────────────────────
// References and pointers
// ─────────────────────────────────────────────────────────────────────────────

// Borrowed references are transparent; an absent one hashes as the pointee's zero.
impl<T: Identity + ZeroValue + ?Sized> Identity for &T {
    fn identity_value(&self) -> Value<'_> {
        (**self).identity_value()
    }

    fn zero_value() -> Option<Value<'static>> {
        T::zero()
    }
}

impl<T: Identity + ZeroValue + ?Sized> Identity for &mut T {
    fn identity_value(&self) -> Value<'_> {
        (**self).identity_value()
    }

    fn zero_value() -> Option<Value<'static>> {
        T::zero()
    }
}

impl ZeroValue for str {
    fn zero() -> Option<Value<'static>> {
        Some(empty_str())
    }
}

impl<T: Identity> ZeroValue for [T] {
    fn zero() -> Option<Value<'static>> {
        Some(Value::Sequence(Vec::new()))
    }
}

impl<'b> ZeroValue for dyn Identity + 'b {
    fn zero() -> Option<Value<'static>> {
        None
    }
}

impl<'b> ZeroValue for dyn Identity + Send + Sync + 'b {
    fn zero() -> Option<Value<'static>> {
        None
    }
}

impl ZeroValue for dyn Any {
    fn zero() -> Option<Value<'static>> {
        None
    }
}

impl ZeroValue for dyn Any + Send {
    fn zero() -> Option<Value<'static>> {
        None
    }
}

impl<T: Identity> Identity for Option<T> {
    fn identity_value(&self) -> Value<'_> {
        match self {
            Some(value) => Value::Pointer(Pointer::present(Node::borrowed(value))),
            None => Value::Pointer(Pointer::absent(T::zero_value())),
        }
    }

    fn zero_value() -> Option<Value<'static>> {
        Some(Value::Pointer(Pointer::absent(T::zero_value())))
    }
}

impl<T: Identity> Identity for Box<T> {
    fn identity_value(&self) -> Value<'_> {
        Value::Pointer(Pointer::present(Node::borrowed(&**self)))
    }

    fn zero_value() -> Option<Value<'static>> {
        Some(Value::Pointer(Pointer::absent(T::zero_value())))
    }
}

impl<T: Identity> Identity for Rc<T> {
    fn identity_value(&self) -> Value<'_> {
        let address = Rc::as_ptr(self) as *const () as usize;
        Value::Pointer(Pointer::shared(Node::borrowed(&**self), address))
    }

    fn zero_value() -> Option<Value<'static>> {
        Some(Value::Pointer(Pointer::absent(T::zero_value())))
    }
}

impl<T: Identity> Identity for Arc<T> {
    fn identity_value(&self) -> Value<'_> {
        let address = Arc::as_ptr(self) as *const () as usize;
        Value::Pointer(Pointer::shared(Node::borrowed(&**self), address))
    }

    fn zero_value() -> Option<Value<'static>> {
        Some(Value::Pointer(Pointer::absent(T::zero_value())))
    }
}

impl<T: Identity> Identity for rc::Weak<T> {
    fn identity_value(&self) -> Value<'_> {
        match self.upgrade() {
            Some(strong) => Value::Pointer(Pointer::present(Node::Owned(Box::new(strong)))),
            None => Value::Pointer(Pointer::absent(T::zero_value())),
        }
    }

    fn zero_value() -> Option<Value<'static>> {
        Some(Value::Pointer(Pointer::absent(T::zero_value())))
    }
}

impl<T: Identity> Identity for sync::Weak<T> {
    fn identity_value(&self) -> Value<'_> {
        match self.upgrade() {
            Some(strong) => Value::Pointer(Pointer::present(Node::Owned(Box::new(strong)))),
            None => Value::Pointer(Pointer::absent(T::zero_value())),
        }
    }

    fn zero_value() -> Option<Value<'static>> {
        Some(Value::Pointer(Pointer::absent(T::zero_value())))
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Dynamic containers
// ─────────────────────────────────────────────────────────────────────────────

impl<'b> Identity for Box<dyn Identity + 'b> {
    fn identity_value(&self) -> Value<'_> {
        Value::Dynamic(Some(Node::Borrowed(&**self)))
    }
}

impl<'b> Identity for Rc<dyn Identity + 'b> {
    fn identity_value(&self) -> Value<'_> {
        let address = Rc::as_ptr(self) as *const () as usize;
        let inner = Value::Dynamic(Some(Node::Borrowed(&**self)));
        Value::Pointer(Pointer::shared(Node::value(inner), address))
    }
}

impl<'b> Identity for Arc<dyn Identity + Send + Sync + 'b> {
    fn identity_value(&self) -> Value<'_> {
        let address = Arc::as_ptr(self) as *const () as usize;
        let inner = Value::Dynamic(Some(Node::Borrowed(&**self)));
        Value::Pointer(Pointer::shared(Node::value(inner), address))
    }
}

impl Identity for dyn Any {
    fn identity_value(&self) -> Value<'_> {
        Value::Dynamic(downcast_known(self))
    }
}

impl Identity for dyn Any + Send {
    fn identity_value(&self) -> Value<'_> {
        Value::Dynamic(downcast_known(self))
    }
}

impl Identity for Box<dyn Any> {
    fn identity_value(&self) -> Value<'_> {
        Value::Dynamic(downcast_known(&**self))
    }
}

/// Extract a concrete value from `dyn Any`, if its type is one we can encode.
fn downcast_known(value: &dyn Any) -> Option<Node<'_>> {
    macro_rules! try_downcast {
        ($($ty:ty),* $(,)?) => {
            $(
                if let Some(concrete) = value.downcast_ref::<$ty>() {
                    return Some(Node::borrowed(concrete));
                }
            )*
        };
    }

    try_downcast!(
        String,
        &'static str,
        bool,
        char,
        i8,
        i16,
        i32,
        i64,
        i128,
        isize,
        u8,
        u16,
        u32,
        u64,
        u128,
        usize,
        f32,
        f64,
        Uuid,
        SystemTime,
        DateTime<Utc>,
        serde_json::Value,
    );
    None
}

impl<T: Identity> Identity for RefCell<T> {
    fn identity_value(&self) -> Value<'_> {
        match self.try_borrow() {
            Ok(guard) => Value::Dynamic(Some(Node::Owned(Box::new(guard)))),
            Err(_) => Value::Dynamic(None),
        }
    }

    fn zero_value() -> Option<Value<'static>> {
        T::zero_value()
    }
}

impl<T: Identity + ?Sized> Identity for Ref<'_, T> {
    fn identity_value(&self) -> Value<'_> {
        (**self).identity_value()
    }
}

impl<T: Identity> Identity for Mutex<T> {
    fn identity_value(&self) -> Value<'_> {
        match self.try_lock() {
            Ok(guard) => Value::Dynamic(Some(Node::Owned(Box::new(guard)))),
            Err(_) => Value::Dynamic(None),
        }
    }

    fn zero_value() -> Option<Value<'static>> {
        T::zero_value()
    }
}

impl<T: Identity + ?Sized> Identity for MutexGuard<'_, T> {
    fn identity_value(&self) -> Value<'_> {
        (**self).identity_value()
    }
}

impl<T: Identity> Identity for RwLock<T> {
    fn identity_value(&self) -> Value<'_> {
        match self.try_read() {
            Ok(guard) => Value::Dynamic(Some(Node::Owned(Box::new(guard)))),
            Err(_) => Value::Dynamic(None),
        }
    }

    fn zero_value() -> Option<Value<'static>> {
        T::zero_value()
    }
}

impl<T: Identity + ?Sized> Identity for RwLockReadGuard<'_, T> {
    fn identity_value(&self) -> Value<'_> {
        (**self).identity_value()
    }
}

impl<T: Identity> Identity for parking_lot::Mutex<T> {
    fn identity_value(&self) -> Value<'_> {
        match self.try_lock() {
            Some(guard) => Value::Dynamic(Some(Node::Owned(Box::new(guard)))),
            None => Value::Dynamic(None),
        }
    }

    fn zero_value() -> Option<Value<'static>> {
        T::zero_value()
    }
}

impl<T: Identity + ?Sized> Identity for parking_lot::MutexGuard<'_, T> {
    fn identity_value(&self) -> Value<'_> {
        (**self).identity_value()
    }
}

impl<T: Identity> Identity for parking_lot::RwLock<T> {
    fn identity_value(&self) -> Value<'_> {
        match self.try_read() {
            Some(guard) => Value::Dynamic(Some(Node::Owned(Box::new(guard)))),
            None => Value::Dynamic(None),
        }
    }

    fn zero_value() -> Option<Value<'static>> {
        T::zero_value()
    }
}

impl<T: Identity + ?Sized> Identity for parking_lot::RwLockReadGuard<'_, T> {
    fn identity_value(&self) -> Value<'_> {
        (**self).identity_value()
    }
}

/// JSON documents are dynamically typed: each node is unwrapped on dispatch.
impl Identity for serde_json::Value {
    fn identity_value(&self) -> Value<'_> {
        Value::Dynamic(Some(Node::value(json_value(self))))
    }

    fn zero_value() -> Option<Value<'static>> {
        Some(Value::Dynamic(Some(Node::value(Value::Raw(Cow::Borrowed(&[]))))))
    }
}

fn json_value(value: &serde_json::Value) -> Value<'_> {
    use serde_json::Value as Json;

    match value {
        // null carries no content
        Json::Null => Value::Raw(Cow::Borrowed(&[])),
        Json::Bool(flag) => Value::Primitive(Primitive::Bool(*flag)),
        Json::Number(number) => {
            if let Some(unsigned) = number.as_u64() {
                Value::Primitive(Primitive::U64(unsigned))
            } else if let Some(signed) = number.as_i64() {
                Value::Primitive(Primitive::I64(signed))
            } else {
                match number.as_f64() {
                    Some(float) => Value::Primitive(Primitive::F64(float)),
                    None => Value::Primitive(Primitive::Str(Cow::Owned(number.to_string()))),
                }
            }
        }
        Json::String(text) => Value::Primitive(Primitive::Str(Cow::Borrowed(text.as_str()))),
        Json::Array(items) => Value::Sequence(items.iter().map(Node::borrowed).collect()),
        Json::Object(object) => Value::Map(
            object
                .iter()
                .map(|(key, item)| (Node::borrowed(key), Node::borrowed(item)))
                .collect(),
        ),
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Sequences
// ─────────────────────────────────────────────────────────────────────────────

impl<T: Identity> Identity for [T] {
    fn identity_value(&self) -> Value<'_> {
        Value::Sequence(self.iter().map(Node::borrowed).collect())
    }
}

impl<T: Identity, const N: usize> Identity for [T; N] {
    fn identity_value(&self) -> Value<'_> {
        Value::Sequence(self.iter().map(Node::borrowed).collect())
    }

    fn zero_value() -> Option<Value<'static>> {
        let items = (0..N)
            .map(|_| T::zero_value().map(Node::value))
            .collect::<Option<Vec<_>>>()?;
        Some(Value::Sequence(items))
    }
}

impl<T: Identity> Identity for Vec<T> {
    fn identity_value(&self) -> Value<'_> {
        Value::Sequence(self.iter().map(Node::borrowed).collect())
    }

    fn zero_value() -> Option<Value<'static>> {
        Some(Value::Sequence(Vec::new()))
    }
}

impl<T: Identity> Identity for VecDeque<T> {
    fn identity_value(&self) -> Value<'_> {
        Value::Sequence(self.iter().map(Node::borrowed).collect())
    }

    fn zero_value() -> Option<Value<'static>> {
        Some(Value::Sequence(Vec::new()))
    }
}

impl Identity for () {
    fn identity_value(&self) -> Value<'_> {
        unit()
    }

    fn zero_value() -> Option<Value<'static>> {
        Some(unit())
    }
}

fn unit() -> Value<'static> {
    Value::Sequence(Vec::new())
}

macro_rules! impl_tuple {
    ($($name:ident . $index:tt),+) => {
        impl<$($name: Identity),+> Identity for ($($name,)+) {
            fn identity_value(&self) -> Value<'_> {
                Value::Sequence(vec![$(Node::borrowed(&self.$index)),+])
            }

            fn zero_value() -> Option<Value<'static>> {
                Some(Value::Sequence(vec![$(Node::value($name::zero_value()?)),+]))
            }
        }
    };
}

impl_tuple!(A.0);
impl_tuple!(A.0, B.1);
impl_tuple!(A.0, B.1, C.2);
impl_tuple!(A.0, B.1, C.2, D.3);
impl_tuple!(A.0, B.1, C.2, D.3, E.4);
impl_tuple!(A.0, B.1, C.2, D.3, E.4, F.5);

// ─────────────────────────────────────────────────────────────────────────────
// Maps and sets
// ─────────────────────────────────────────────────────────────────────────────

impl<K: Identity, V: Identity, S: BuildHasher> Identity for HashMap<K, V, S> {
    fn identity_value(&self) -> Value<'_> {
        Value::Map(
            self.iter()
                .map(|(key, item)| (Node::borrowed(key), Node::borrowed(item)))
                .collect(),
        )
    }

    fn zero_value() -> Option<Value<'static>> {
        Some(Value::Map(Vec::new()))
    }
}

impl<K: Identity, V: Identity> Identity for BTreeMap<K, V> {
    fn identity_value(&self) -> Value<'_> {
        Value::Map(
            self.iter()
                .map(|(key, item)| (Node::borrowed(key), Node::borrowed(item)))
                .collect(),
        )
    }

    fn zero_value() -> Option<Value<'static>> {
        Some(Value::Map(Vec::new()))
    }
}

// Sets are maps from each member to the unit value.
impl<T: Identity, S: BuildHasher> Identity for HashSet<T, S> {
    fn identity_value(&self) -> Value<'_> {
        Value::Map(
            self.iter()
                .map(|member| (Node::borrowed(member), Node::value(unit())))
                .collect(),
        )
    }

    fn zero_value() -> Option<Value<'static>> {
        Some(Value::Map(Vec::new()))
    }
}

impl<T: Identity> Identity for BTreeSet<T> {
    fn identity_value(&self) -> Value<'_> {
        Value::Map(
            self.iter()
                .map(|member| (Node::borrowed(member), Node::value(unit())))
                .collect(),
        )
    }

    fn zero_value() -> Option<Value<'static>> {
        Some(Value::Map(Vec::new()))
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Time
// ─────────────────────────────────────────────────────────────────────────────

impl<Tz: TimeZone> Identity for DateTime<Tz> {
    fn identity_value(&self) -> Value<'_> {
        Value::Instant(self.with_timezone(&self.offset().fix()))
    }

    fn zero_value() -> Option<Value<'static>> {
        zero_instant().map(Value::Instant)
    }
}

/// Naive timestamps are interpreted as UTC.
impl Identity for NaiveDateTime {
    fn identity_value(&self) -> Value<'_> {
        Value::Instant(Utc.fix().from_utc_datetime(self))
    }

    fn zero_value() -> Option<Value<'static>> {
        zero_instant().map(Value::Instant)
    }
}

impl Identity for SystemTime {
    fn identity_value(&self) -> Value<'_> {
        match system_time_utc(*self) {
            Some(instant) => Value::Instant(instant.with_timezone(&Utc.fix())),
            None => Value::Dynamic(None),
        }
    }

    fn zero_value() -> Option<Value<'static>> {
        zero_instant().map(Value::Instant)
    }
}

/// `None` when the time is outside chrono's representable range.
fn system_time_utc(time: SystemTime) -> Option<DateTime<Utc>> {
    let (secs, nanos) = match time.duration_since(UNIX_EPOCH) {
        Ok(after) => (i64::try_from(after.as_secs()).ok()?, after.subsec_nanos()),
        Err(before) => {
            let before = before.duration();
            let secs = i64::try_from(before.as_secs()).ok()?;
            match before.subsec_nanos() {
                0 => (secs.checked_neg()?, 0),
                nanos => (secs.checked_neg()?.checked_sub(1)?, 1_000_000_000 - nanos),
            }
        }
    };
    DateTime::<Utc>::from_timestamp(secs, nanos)
}

// ─────────────────────────────────────────────────────────────────────────────
// Raw byte representations
// ─────────────────────────────────────────────────────────────────────────────

impl Identity for Uuid {
    fn identity_value(&self) -> Value<'_> {
        Value::Raw(Cow::Borrowed(self.as_bytes().as_slice()))
    }

    fn zero_value() -> Option<Value<'static>> {
        Some(Value::Raw(Cow::Owned(Uuid::nil().as_bytes().to_vec())))
    }
}

impl Identity for Ipv4Addr {
    fn identity_value(&self) -> Value<'_> {
        Value::Raw(Cow::Owned(self.octets().to_vec()))
    }

    fn zero_value() -> Option<Value<'static>> {
        Some(Value::Raw(Cow::Owned(Ipv4Addr::UNSPECIFIED.octets().to_vec())))
    }
}

impl Identity for Ipv6Addr {
    fn identity_value(&self) -> Value<'_> {
        Value::Raw(Cow::Owned(self.octets().to_vec()))
    }

    fn zero_value() -> Option<Value<'static>> {
        Some(Value::Raw(Cow::Owned(Ipv6Addr::UNSPECIFIED.octets().to_vec())))
    }
}

impl Identity for IpAddr {
    fn identity_value(&self) -> Value<'_> {
        match self {
            IpAddr::V4(addr) => addr.identity_value(),
            IpAddr::V6(addr) => addr.identity_value(),
        }
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Unsupported kinds
// ─────────────────────────────────────────────────────────────────────────────

macro_rules! impl_opaque {
    ($(impl<$($param:ident),*> for $ty:ty;)*) => {
        $(
            impl<$($param),*> Identity for $ty {
                fn identity_value(&self) -> Value<'_> {
                    Value::Opaque(type_name::<Self>())
                }
            }
        )*
    };
}

impl_opaque! {
    impl<R> for fn() -> R;
    impl<A, R> for fn(A) -> R;
    impl<A, B, R> for fn(A, B) -> R;
    impl<T> for mpsc::Sender<T>;
    impl<T> for mpsc::SyncSender<T>;
    impl<T> for mpsc::Receiver<T>;
}
