// Copyright 2019 The Skylark in Rust Authors
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     https://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

//! Shared numeric machinery: int/float coercion, the division and modulo
//! sign rules, and the hash scheme that keeps equal numbers hashing equal.

use crate::values::error::ValueError;
use crate::values::Value;
use num_bigint::BigInt;
use num_traits::{FromPrimitive, Signed, ToPrimitive, Zero};
use std::cmp::Ordering;

/// A number extracted from a value: exact integer or IEEE double.
/// Booleans deliberately do not qualify.
pub(crate) enum Num {
    Int(BigInt),
    Float(f64),
}

pub(crate) fn get_num(v: &Value) -> Option<Num> {
    if let Some(i) = v.downcast_ref::<BigInt>() {
        return Some(Num::Int(i.clone()));
    }
    if let Some(f) = v.downcast_ref::<f64>() {
        return Some(Num::Float(*f));
    }
    None
}

pub(crate) fn to_f64(n: &Num) -> f64 {
    match n {
        Num::Float(f) => *f,
        Num::Int(i) => match i.to_f64() {
            Some(f) => f,
            None => {
                if i.is_negative() {
                    f64::NEG_INFINITY
                } else {
                    f64::INFINITY
                }
            }
        },
    }
}

/// Hash of an integer. Values fitting a machine word hash as that word so
/// that the scheme is stable and cheap; larger values fold their little
/// endian bytes through the same 31-polynomial used for strings.
pub(crate) fn hash_int(i: &BigInt) -> u64 {
    match i.to_i64() {
        Some(x) => x as u64,
        None => i
            .to_signed_bytes_le()
            .iter()
            .fold(0u64, |h, b| h.wrapping_mul(31).wrapping_add(u64::from(*b))),
    }
}

/// Hash of a float, agreeing with `hash_int` on mathematically integral
/// values so that `1 == 1.0` implies `hash(1) == hash(1.0)`.
pub(crate) fn hash_float(f: f64) -> u64 {
    if f.is_finite() && f == f.trunc() {
        match BigInt::from_f64(f) {
            Some(i) => hash_int(&i),
            None => f.to_bits(),
        }
    } else {
        f.to_bits()
    }
}

pub(crate) fn int_equals_float(i: &BigInt, f: f64) -> bool {
    f.is_finite() && f == f.trunc() && BigInt::from_f64(f).map_or(false, |b| b == *i)
}

/// Three-way numeric comparison. Exact between two ints; through doubles
/// otherwise. `NaN` is unordered, which surfaces as an unsupported
/// comparison.
pub(crate) fn compare(a: &Num, b: &Num) -> Result<Ordering, ValueError> {
    match (a, b) {
        (Num::Int(x), Num::Int(y)) => Ok(x.cmp(y)),
        _ => {
            let x = to_f64(a);
            let y = to_f64(b);
            x.partial_cmp(&y).ok_or(ValueError::OperationNotSupported {
                op: "compare".to_owned(),
                left: "float".to_owned(),
                right: Some("float".to_owned()),
            })
        }
    }
}

/// Floored integer division: rounds toward negative infinity.
pub(crate) fn floor_div_int(a: &BigInt, b: &BigInt) -> Result<BigInt, ValueError> {
    if b.is_zero() {
        return Err(ValueError::DivisionByZero);
    }
    let q = a / b;
    let r = a % b;
    if !r.is_zero() && r.sign() != b.sign() {
        Ok(q - 1)
    } else {
        Ok(q)
    }
}

/// Integer remainder carrying the sign of the divisor, so that
/// `(a // b) * b + (a % b) == a`.
pub(crate) fn mod_int(a: &BigInt, b: &BigInt) -> Result<BigInt, ValueError> {
    if b.is_zero() {
        return Err(ValueError::DivisionByZero);
    }
    let r = a % b;
    if !r.is_zero() && r.sign() != b.sign() {
        Ok(r + b)
    } else {
        Ok(r)
    }
}

pub(crate) fn div_float(a: f64, b: f64) -> Result<f64, ValueError> {
    if b == 0.0 {
        return Err(ValueError::DivisionByZero);
    }
    Ok(a / b)
}

pub(crate) fn floor_div_float(a: f64, b: f64) -> Result<f64, ValueError> {
    if b == 0.0 {
        return Err(ValueError::DivisionByZero);
    }
    Ok((a / b).floor())
}

pub(crate) fn mod_float(a: f64, b: f64) -> Result<f64, ValueError> {
    if b == 0.0 {
        return Err(ValueError::DivisionByZero);
    }
    let r = a % b;
    if r != 0.0 && (r < 0.0) != (b < 0.0) {
        Ok(r + b)
    } else {
        Ok(r)
    }
}

/// Write a float the way `str()` shows it: integral values keep a `.0`
/// suffix to stay visibly floats.
pub(crate) fn write_float(buf: &mut String, f: f64) -> std::fmt::Result {
    use std::fmt::Write as _;
    if f.is_nan() {
        buf.push_str("nan");
        Ok(())
    } else if f.is_infinite() {
        buf.push_str(if f > 0.0 { "+inf" } else { "-inf" });
        Ok(())
    } else if f == f.trunc() && f.abs() < 1e17 {
        write!(buf, "{:.1}", f)
    } else {
        write!(buf, "{}", f)
    }
}

/// Repetition count for `seq * n`: negative counts are treated as zero.
pub(crate) fn repetition_count(n: &BigInt) -> Result<usize, ValueError> {
    if n.is_negative() {
        Ok(0)
    } else {
        n.to_usize().ok_or(ValueError::IntegerOverflow)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use num_bigint::Sign;

    fn b(x: i64) -> BigInt {
        BigInt::from(x)
    }

    /// The sign of an integer as -1, 0 or 1.
    fn sign(i: &BigInt) -> i32 {
        match i.sign() {
            Sign::Minus => -1,
            Sign::NoSign => 0,
            Sign::Plus => 1,
        }
    }

    #[test]
    fn division_identity_holds() {
        for &x in &[-7i64, -3, -1, 0, 1, 3, 7, 100] {
            for &y in &[-3i64, -2, -1, 1, 2, 3, 10] {
                let q = floor_div_int(&b(x), &b(y)).unwrap();
                let r = mod_int(&b(x), &b(y)).unwrap();
                assert_eq!(b(x), q * b(y) + &r, "for {} and {}", x, y);
                if !r.is_zero() {
                    assert_eq!(sign(&b(y)), sign(&r), "for {} and {}", x, y);
                }
            }
        }
    }

    #[test]
    fn division_by_zero_is_an_error() {
        assert_eq!(
            Err(ValueError::DivisionByZero),
            floor_div_int(&b(1), &b(0))
        );
        assert_eq!(Err(ValueError::DivisionByZero), mod_int(&b(1), &b(0)));
        assert_eq!(Err(ValueError::DivisionByZero), div_float(1.0, 0.0));
    }

    #[test]
    fn equal_numbers_hash_alike() {
        assert_eq!(hash_int(&b(7)), hash_float(7.0));
        assert_eq!(hash_int(&b(-3)), hash_float(-3.0));
        let big = BigInt::parse_bytes(b"10000000000000000000000000000000", 10).unwrap();
        let big_f = 1e31f64;
        if int_equals_float(&big, big_f) {
            assert_eq!(hash_int(&big), hash_float(big_f));
        }
    }

    #[test]
    fn nan_is_unordered() {
        assert!(compare(&Num::Float(f64::NAN), &Num::Float(1.0)).is_err());
        assert!(compare(&Num::Float(f64::NAN), &Num::Float(f64::NAN)).is_err());
    }
}
