//! Result oracle: does a produced value stack satisfy the expectations?
//!
//! Comparison is positional over lists of equal length. Callers reverse
//! the produced stack out of interpreter push order before comparing.

use crate::harness::value::{host_brand, RefValue, Value};
use crate::script::{Const, Expected, HeapType, NanWidth};
use std::fmt;

/// Bits of the canonical positive NaN, per float width. An arithmetic NaN
/// is any float with all of these bits set, sign bit ignored.
const CANONICAL_NAN_F32: u32 = 0x7fc0_0000;
const CANONICAL_NAN_F64: u64 = 0x7ff8_0000_0000_0000;

/// Compare a produced result list against the expected results.
///
/// True iff the lists have equal length and every position satisfies
/// [`match_one`].
pub fn match_results(expected: &[Expected], produced: &[Value]) -> bool {
    expected.len() == produced.len()
        && expected.iter().zip(produced).all(|(e, v)| match_one(e, v))
}

/// Whether a single produced value satisfies a single expectation.
pub fn match_one(expected: &Expected, value: &Value) -> bool {
    match expected {
        Expected::Literal(literal) => match_literal(literal, value),
        Expected::NanCanonical(NanWidth::F32) => matches!(value, Value::F32(f) if f.is_nan()),
        Expected::NanCanonical(NanWidth::F64) => matches!(value, Value::F64(f) if f.is_nan()),
        Expected::NanArithmetic(NanWidth::F32) => {
            matches!(value, Value::F32(f) if f.to_bits() & CANONICAL_NAN_F32 == CANONICAL_NAN_F32)
        }
        Expected::NanArithmetic(NanWidth::F64) => {
            matches!(value, Value::F64(f) if f.to_bits() & CANONICAL_NAN_F64 == CANONICAL_NAN_F64)
        }
    }
}

fn match_literal(literal: &Const, value: &Value) -> bool {
    match literal {
        Const::I32(n) => matches!(value, Value::I32(m) if m == n),
        Const::I64(n) => matches!(value, Value::I64(m) if m == n),
        Const::F32(x) => match value {
            // Bit-identical, or the runtime reconstructed a literal whose
            // bits differ but whose canonical decimal renders the same.
            Value::F32(y) => x.to_bits() == y.to_bits() || decimal(x) == decimal(y),
            _ => false,
        },
        Const::F64(x) => match value {
            Value::F64(y) => x.to_bits() == y.to_bits() || decimal(x) == decimal(y),
            _ => false,
        },
        Const::V128(n) => matches!(value, Value::V128(m) if m == n),
        Const::NullRef(HeapType::Func) => matches!(value, Value::Ref(RefValue::Func(None))),
        Const::NullRef(HeapType::Extern) => matches!(value, Value::Ref(RefValue::Extern(None))),
        Const::Extern(n) => matches!(
            value,
            Value::Ref(RefValue::Extern(Some(p))) if p.brand == host_brand() && p.value == *n
        ),
    }
}

/// Canonical decimal rendering (shortest round-trip form).
fn decimal<T: fmt::Display>(value: T) -> String {
    format!("{value}")
}
