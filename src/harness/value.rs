//! Runtime value representation shared between the harness and engines.

use fhex::ToHex;
use once_cell::sync::OnceCell;
use std::fmt;

/// Address of a function instance inside an engine's store.
pub type FuncAddr = u32;

/// Runtime representation of WebAssembly values.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    I32(i32),
    I64(i64),
    F32(f32),
    F64(f64),
    V128(u128),
    Ref(RefValue),
}

/// A reference value: a possibly-null funcref or externref.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum RefValue {
    Func(Option<FuncAddr>),
    Extern(Option<ExternPayload>),
}

/// Payload of a non-null externref.
///
/// Two externrefs compare equal only when both brand and payload match,
/// so references minted by this harness never alias foreign ones.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ExternPayload {
    pub brand: Brand,
    pub value: u32,
}

/// Opaque identity token distinguishing one externref producer from another.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Brand(usize);

static HOST_BRAND: OnceCell<Brand> = OnceCell::new();

/// The process-wide brand for externrefs minted by this harness.
///
/// Allocated once on first use as an address-identity token and immutable
/// afterwards.
pub fn host_brand() -> Brand {
    *HOST_BRAND.get_or_init(|| {
        let token: &'static mut u8 = Box::leak(Box::new(0));
        Brand(token as *mut u8 as usize)
    })
}

/// A brand guaranteed not to be the host brand (the host brand is a real
/// heap address).
#[cfg(test)]
pub(crate) fn foreign_brand() -> Brand {
    Brand(usize::MAX)
}

/// Mint a host-branded externref carrying `value`.
pub fn host_extern(value: u32) -> Value {
    Value::Ref(RefValue::Extern(Some(ExternPayload {
        brand: host_brand(),
        value,
    })))
}

impl Value {
    /// The value's type, as spelled in the text format.
    pub fn type_name(&self) -> &'static str {
        match self {
            Value::I32(_) => "i32",
            Value::I64(_) => "i64",
            Value::F32(_) => "f32",
            Value::F64(_) => "f64",
            Value::V128(_) => "v128",
            Value::Ref(RefValue::Func(_)) => "funcref",
            Value::Ref(RefValue::Extern(_)) => "externref",
        }
    }

    /// Convert to i32, returning None if wrong type.
    pub fn as_i32(&self) -> Option<i32> {
        match self {
            Value::I32(v) => Some(*v),
            _ => None,
        }
    }

    /// Convert to i64, returning None if wrong type.
    pub fn as_i64(&self) -> Option<i64> {
        match self {
            Value::I64(v) => Some(*v),
            _ => None,
        }
    }

    /// Convert to f32, returning None if wrong type.
    pub fn as_f32(&self) -> Option<f32> {
        match self {
            Value::F32(v) => Some(*v),
            _ => None,
        }
    }

    /// Convert to f64, returning None if wrong type.
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Value::F64(v) => Some(*v),
            _ => None,
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::I32(v) => write!(f, "i32:{v}"),
            Value::I64(v) => write!(f, "i64:{v}"),
            Value::F32(v) => write!(f, "f32:{}", v.to_hex()),
            Value::F64(v) => write!(f, "f64:{}", v.to_hex()),
            Value::V128(v) => write!(f, "v128:0x{v:032x}"),
            Value::Ref(RefValue::Func(None)) => write!(f, "funcref:null"),
            Value::Ref(RefValue::Func(Some(addr))) => write!(f, "funcref:{addr}"),
            Value::Ref(RefValue::Extern(None)) => write!(f, "externref:null"),
            Value::Ref(RefValue::Extern(Some(p))) => write!(f, "externref:{}", p.value),
        }
    }
}
