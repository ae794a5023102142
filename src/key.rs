//! Buffer key resolution.

use std::{
    collections::{BTreeMap, HashMap},
    hash::{DefaultHasher, Hasher},
};

use crate::{
    FermataError,
    common::{ArgSignature, BufferKey, BufferOptions, CallableId},
};

// Framing tags keep structurally different values from colliding, e.g.
// ("foo",) vs ("fo", "o") or Some(0) vs 0.
const TAG_UNIT: u8 = 0x01;
const TAG_BOOL: u8 = 0x02;
const TAG_UINT: u8 = 0x03;
const TAG_INT: u8 = 0x04;
const TAG_FLOAT: u8 = 0x05;
const TAG_CHAR: u8 = 0x06;
const TAG_STR: u8 = 0x07;
const TAG_NONE: u8 = 0x08;
const TAG_SOME: u8 = 0x09;
const TAG_SEQ: u8 = 0x0a;
const TAG_MAP: u8 = 0x0b;

/// Accumulates a canonical encoding of call arguments into a 64-bit digest.
///
/// Uses [`DefaultHasher::new`], which is deterministic within a build, so
/// signatures agree across threads and across processes running the same
/// binary (the shared backend relies on this).
pub struct ArgHasher {
    inner: DefaultHasher,
}

impl ArgHasher {
    pub(crate) fn new() -> Self {
        Self {
            inner: DefaultHasher::new(),
        }
    }

    fn tag(&mut self, tag: u8) {
        self.inner.write_u8(tag);
    }

    /// Feed a unit value.
    pub fn write_unit(&mut self) {
        self.tag(TAG_UNIT);
    }

    /// Feed a boolean.
    pub fn write_bool(&mut self, v: bool) {
        self.tag(TAG_BOOL);
        self.inner.write_u8(v as u8);
    }

    /// Feed an unsigned integer.
    pub fn write_u128(&mut self, v: u128) {
        self.tag(TAG_UINT);
        self.inner.write_u128(v);
    }

    /// Feed a signed integer.
    pub fn write_i128(&mut self, v: i128) {
        self.tag(TAG_INT);
        self.inner.write_i128(v);
    }

    /// Feed a float.
    ///
    /// Fails on NaN: NaN compares unequal to itself, so no stable signature
    /// exists for it. Negative zero is folded into positive zero to keep the
    /// signature consistent with `==`.
    pub fn write_f64(&mut self, v: f64) -> Result<(), FermataError> {
        if v.is_nan() {
            return Err(FermataError::KeyResolution(
                "NaN has no stable signature".to_string(),
            ));
        }

        let v = if v == 0.0 { 0.0 } else { v };
        self.tag(TAG_FLOAT);
        self.inner.write_u64(v.to_bits());
        Ok(())
    }

    /// Feed a character.
    pub fn write_char(&mut self, v: char) {
        self.tag(TAG_CHAR);
        self.inner.write_u32(v as u32);
    }

    /// Feed a string, length-framed.
    pub fn write_str(&mut self, v: &str) {
        self.tag(TAG_STR);
        self.inner.write_u64(v.len() as u64);
        self.inner.write(v.as_bytes());
    }

    /// Feed an absent optional value.
    pub fn write_none(&mut self) {
        self.tag(TAG_NONE);
    }

    /// Mark a present optional value; the value itself follows.
    pub fn write_some(&mut self) {
        self.tag(TAG_SOME);
    }

    /// Open an ordered sequence of `len` values.
    pub fn begin_seq(&mut self, len: usize) {
        self.tag(TAG_SEQ);
        self.inner.write_u64(len as u64);
    }

    /// Open a name-sorted map of `len` entries.
    pub fn begin_map(&mut self, len: usize) {
        self.tag(TAG_MAP);
        self.inner.write_u64(len as u64);
    }

    pub(crate) fn finish(self) -> ArgSignature {
        ArgSignature(self.inner.finish())
    }
}

/// Values usable as (part of) a buffer key when `key_on_arguments` is on.
///
/// The encoding must be canonical: equal values produce equal signatures and
/// the signature is independent of irrelevant representation details (map
/// insertion order in particular). Implementations for unordered maps sort
/// entries by name before feeding them.
///
/// Values with no deterministic identity fail with
/// [`FermataError::KeyResolution`]; the wrapped callable is not invoked.
pub trait ArgKey {
    /// Feed this value's canonical encoding into `hasher`.
    fn write_signature(&self, hasher: &mut ArgHasher) -> Result<(), FermataError>;
}

impl ArgKey for () {
    fn write_signature(&self, hasher: &mut ArgHasher) -> Result<(), FermataError> {
        hasher.write_unit();
        Ok(())
    }
}

impl ArgKey for bool {
    fn write_signature(&self, hasher: &mut ArgHasher) -> Result<(), FermataError> {
        hasher.write_bool(*self);
        Ok(())
    }
}

impl ArgKey for char {
    fn write_signature(&self, hasher: &mut ArgHasher) -> Result<(), FermataError> {
        hasher.write_char(*self);
        Ok(())
    }
}

macro_rules! impl_arg_key_uint {
    ($($t:ty),*) => {$(
        impl ArgKey for $t {
            fn write_signature(&self, hasher: &mut ArgHasher) -> Result<(), FermataError> {
                hasher.write_u128(*self as u128);
                Ok(())
            }
        }
    )*};
}

macro_rules! impl_arg_key_int {
    ($($t:ty),*) => {$(
        impl ArgKey for $t {
            fn write_signature(&self, hasher: &mut ArgHasher) -> Result<(), FermataError> {
                hasher.write_i128(*self as i128);
                Ok(())
            }
        }
    )*};
}

impl_arg_key_uint!(u8, u16, u32, u64, u128, usize);
impl_arg_key_int!(i8, i16, i32, i64, i128, isize);

impl ArgKey for f32 {
    fn write_signature(&self, hasher: &mut ArgHasher) -> Result<(), FermataError> {
        hasher.write_f64(*self as f64)
    }
}

impl ArgKey for f64 {
    fn write_signature(&self, hasher: &mut ArgHasher) -> Result<(), FermataError> {
        hasher.write_f64(*self)
    }
}

impl ArgKey for str {
    fn write_signature(&self, hasher: &mut ArgHasher) -> Result<(), FermataError> {
        hasher.write_str(self);
        Ok(())
    }
}

impl ArgKey for String {
    fn write_signature(&self, hasher: &mut ArgHasher) -> Result<(), FermataError> {
        hasher.write_str(self);
        Ok(())
    }
}

impl<T: ArgKey + ?Sized> ArgKey for &T {
    fn write_signature(&self, hasher: &mut ArgHasher) -> Result<(), FermataError> {
        (**self).write_signature(hasher)
    }
}

impl<T: ArgKey> ArgKey for Option<T> {
    fn write_signature(&self, hasher: &mut ArgHasher) -> Result<(), FermataError> {
        match self {
            None => hasher.write_none(),
            Some(v) => {
                hasher.write_some();
                v.write_signature(hasher)?;
            }
        }
        Ok(())
    }
}

impl<T: ArgKey> ArgKey for [T] {
    fn write_signature(&self, hasher: &mut ArgHasher) -> Result<(), FermataError> {
        hasher.begin_seq(self.len());
        for v in self {
            v.write_signature(hasher)?;
        }
        Ok(())
    }
}

impl<T: ArgKey> ArgKey for Vec<T> {
    fn write_signature(&self, hasher: &mut ArgHasher) -> Result<(), FermataError> {
        self.as_slice().write_signature(hasher)
    }
}

impl<T: ArgKey, const N: usize> ArgKey for [T; N] {
    fn write_signature(&self, hasher: &mut ArgHasher) -> Result<(), FermataError> {
        self.as_slice().write_signature(hasher)
    }
}

// Maps are unordered by contract: entries are fed name-sorted, so two maps
// built in different insertion orders share one signature.
impl<K: ArgKey + Ord, V: ArgKey, S> ArgKey for HashMap<K, V, S> {
    fn write_signature(&self, hasher: &mut ArgHasher) -> Result<(), FermataError> {
        let mut entries: Vec<(&K, &V)> = self.iter().collect();
        entries.sort_by(|a, b| a.0.cmp(b.0));

        hasher.begin_map(entries.len());
        for (name, value) in entries {
            name.write_signature(hasher)?;
            value.write_signature(hasher)?;
        }
        Ok(())
    }
}

impl<K: ArgKey + Ord, V: ArgKey> ArgKey for BTreeMap<K, V> {
    fn write_signature(&self, hasher: &mut ArgHasher) -> Result<(), FermataError> {
        hasher.begin_map(self.len());
        for (name, value) in self {
            name.write_signature(hasher)?;
            value.write_signature(hasher)?;
        }
        Ok(())
    }
}

macro_rules! impl_arg_key_tuple {
    ($len:expr; $($t:ident . $idx:tt),+) => {
        impl<$($t: ArgKey),+> ArgKey for ($($t,)+) {
            fn write_signature(&self, hasher: &mut ArgHasher) -> Result<(), FermataError> {
                hasher.begin_seq($len);
                $(self.$idx.write_signature(hasher)?;)+
                Ok(())
            }
        }
    };
}

impl_arg_key_tuple!(1; A.0);
impl_arg_key_tuple!(2; A.0, B.1);
impl_arg_key_tuple!(3; A.0, B.1, C.2);
impl_arg_key_tuple!(4; A.0, B.1, C.2, D.3);
impl_arg_key_tuple!(5; A.0, B.1, C.2, D.3, E.4);
impl_arg_key_tuple!(6; A.0, B.1, C.2, D.3, E.4, F.5);

/// Wrapper for argument types that must not participate in keying.
///
/// Passes through freely when `key_on_arguments` is off; with keying on, a
/// call carrying an `Opaque` argument fails resolution instead of silently
/// producing an unstable key.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Opaque<T>(pub T);

impl<T> ArgKey for Opaque<T> {
    fn write_signature(&self, _hasher: &mut ArgHasher) -> Result<(), FermataError> {
        Err(FermataError::KeyResolution(
            "opaque argument cannot be keyed".to_string(),
        ))
    }
}

/// Resolve the buffer key for one call. No side effects.
pub(crate) fn resolve<A: ArgKey>(
    callable: CallableId,
    args: &A,
    options: &BufferOptions,
) -> Result<BufferKey, FermataError> {
    if !options.key_on_arguments {
        return Ok(BufferKey {
            callable,
            args: None,
        });
    }

    let mut hasher = ArgHasher::new();
    args.write_signature(&mut hasher)?;

    Ok(BufferKey {
        callable,
        args: Some(hasher.finish()),
    })
}
