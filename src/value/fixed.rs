//! Fixed-point arithmetic helpers.
//!
//! A real-valued quantity is represented as a small integer plus a
//! power-of-two scale, and every arithmetic op on two differently-scaled
//! operands needs an explicit shift to re-align them before combining.
//!
//! `MSB` is the bit position of the sign bit in the stored integer type;
//! widen this (and the target integer width) together if a model needs a
//! wider fixed-point type than `i32`.
pub const MSB: i32 = 30;

/// A fixed-point scalar: a raw `i32` whose most-significant bit sits at
/// power-of-two position `exponent + MSB` ("the power-of-two
/// position of the MSB of its stored value").
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Fixed {
    pub raw: i32,
    pub exponent: i32,
}

impl Fixed {
    pub fn from_f64(value: f64, exponent: i32) -> Self {
        let scale = 2f64.powi(MSB - exponent);
        Fixed {
            raw: (value * scale).round() as i32,
            exponent,
        }
    }

    pub fn to_f64(self) -> f64 {
        let scale = 2f64.powi(MSB - self.exponent);
        self.raw as f64 / scale
    }

    /// Shift `self` to `target_exponent`, losing precision if moving to a
    /// coarser (larger) exponent.
    pub fn rescale(self, target_exponent: i32) -> Fixed {
        let shift = self.exponent - target_exponent;
        let raw = if shift >= 0 {
            self.raw.checked_shl(shift as u32).unwrap_or(self.raw)
        } else {
            self.raw >> (-shift) as u32
        };
        Fixed {
            raw,
            exponent: target_exponent,
        }
    }
}

/// Exponent of `a * b` before alignment to a declared target exponent:
/// multiplying operands with exponents a,b produces a raw result of
/// exponent a+b-MSB.
pub fn multiply_raw_exponent(a: i32, b: i32) -> i32 {
    a + b - MSB
}

/// Exponent of `a / b` before alignment, reversing [`multiply_raw_exponent`].
pub fn divide_raw_exponent(a: i32, b: i32) -> i32 {
    a - b + MSB
}

/// Shift amount to align a raw result at `raw_exponent` to `target_exponent`.
/// Positive means shift left (toward more significant bits): a shift by
/// (raw − target) aligns it.
pub fn alignment_shift(raw_exponent: i32, target_exponent: i32) -> i32 {
    raw_exponent - target_exponent
}

/// Multiply two fixed-point values, producing a result scaled to
/// `target_exponent`.
pub fn multiply(a: Fixed, b: Fixed, target_exponent: i32) -> Fixed {
    let raw_exponent = multiply_raw_exponent(a.exponent, b.exponent);
    let raw_product = (i64::from(a.raw) * i64::from(b.raw) >> MSB) as i32;
    Fixed {
        raw: raw_product,
        exponent: raw_exponent,
    }
    .rescale(target_exponent)
}

/// Addition requires matched exponents: rescale both operands
/// to `target_exponent` before adding.
pub fn add(a: Fixed, b: Fixed, target_exponent: i32) -> Fixed {
    let a = a.rescale(target_exponent);
    let b = b.rescale(target_exponent);
    Fixed {
        raw: a.raw.saturating_add(b.raw),
        exponent: target_exponent,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn round_trips_through_f64_within_tolerance() {
        let f = Fixed::from_f64(3.25, -2);
        assert!((f.to_f64() - 3.25).abs() < 1e-3);
    }

    #[test]
    fn rescale_to_same_exponent_is_identity() {
        let f = Fixed::from_f64(1.0, 0);
        assert_eq!(f.rescale(0), f);
    }

    #[test]
    fn multiply_result_rescaled_to_target_has_stored_exponent_match() {
        // Every emitted multiply/divide/integrate shift aligns operand
        // exponents so that stored_exponent(result) == declared_exponent(v).
        let a = Fixed::from_f64(2.0, 0);
        let b = Fixed::from_f64(3.0, 0);
        let target = 1;
        let result = multiply(a, b, target);
        assert_eq!(result.exponent, target);
        assert!((result.to_f64() - 6.0).abs() < 0.5);
    }

    #[test]
    fn add_requires_rescale_before_combining() {
        let a = Fixed::from_f64(1.0, 0);
        let b = Fixed::from_f64(1.0, -4);
        let sum = add(a, b, 0);
        assert!((sum.to_f64() - 2.0).abs() < 1e-2);
    }
}
