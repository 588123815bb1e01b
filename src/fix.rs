//! Free functions over [`Fix`] with the exact rounding behaviour the control
//! code relies on.
//!
//! None of these report errors. Division by zero panics and must be ruled
//! out by the caller when the configuration is validated.

use core::f64::consts::PI;

use num_traits::Float;

use fixed::traits::ToFixed;

use crate::types::Fix;

pub const FRAC_BITS: u32 = Fix::FRAC_NBITS;
pub const ONE: Fix = Fix::ONE;
pub const HALF: Fix = Fix::from_bits(1 << (FRAC_BITS - 1));

const FAST_SHIFT: u32 = FRAC_BITS >> 1;

/// Saturates outside the representable range. Panics on NaN.
pub fn from_f32(val: f32) -> Fix {
    val.saturating_to_fixed()
}

pub fn to_f32(val: Fix) -> f32 {
    val.to_num()
}

/// Wraps like a plain shift when `val` does not fit in 16 integer bits.
pub fn from_int(val: i32) -> Fix {
    val.wrapping_to_fixed()
}

/// Rounds half up.
pub fn to_int(val: Fix) -> i32 {
    val.wrapping_add(HALF).to_bits() >> FRAC_BITS
}

/// Full precision product through a 64-bit intermediate, rounded towards
/// negative infinity.
pub fn mul(a: Fix, b: Fix) -> Fix {
    a.wide_mul(b).wrapping_to_fixed()
}

/// Full precision quotient through a 64-bit intermediate, truncated towards
/// zero.
///
/// # Panics
///
/// When `b` is zero.
pub fn div(a: Fix, b: Fix) -> Fix {
    let num = i64::from(a.to_bits()) << FRAC_BITS;
    Fix::from_bits((num / i64::from(b.to_bits())) as i32)
}

/// Drops the low 8 fractional bits of both operands before multiplying.
pub fn mul_fast(a: Fix, b: Fix) -> Fix {
    Fix::from_bits((a.to_bits() >> FAST_SHIFT).wrapping_mul(b.to_bits() >> FAST_SHIFT))
}

/// Keeps only 8 fractional bits of the divisor.
///
/// # Panics
///
/// When `|b|` is below 1/256.
pub fn div_fast(a: Fix, b: Fix) -> Fix {
    Fix::from_bits((a.to_bits() << FAST_SHIFT) / (b.to_bits() >> FAST_SHIFT))
}

/// Smoothing factor `1 - e^(-2π·f·T)` of a single pole filter with cutoff
/// `freq_hz` sampled every `period_ms`.
///
/// Double precision: near Nyquist at long periods the factor sits within
/// 1e-13 of one.
pub fn time_constant(freq_hz: f64, period_ms: u16) -> f64 {
    let period_s = f64::from(period_ms) / 1000.0;
    -Float::exp_m1(-2.0 * PI * freq_hz * period_s)
}

/// Inverse of [`time_constant`].
pub fn cutoff_frequency(tc: f64, period_ms: u16) -> f64 {
    -Float::ln_1p(-tc) * 1000.0 / f64::from(period_ms) / (2.0 * PI)
}

pub fn time_constant_from_cutoff(freq_hz: f32, period_ms: u16) -> Fix {
    from_f32(time_constant(f64::from(freq_hz), period_ms) as f32)
}

/// `tc` must lie in `[0, 1)`.
pub fn cutoff_from_time_constant(tc: Fix, period_ms: u16) -> f32 {
    cutoff_frequency(tc.to_num::<f64>(), period_ms) as f32
}

#[cfg(test)]
mod tests {
    use approx::assert_relative_eq;
    use rstest::rstest;

    use super::*;

    const RESOLUTION: f32 = 1.0 / 65536.0;

    #[test]
    fn float_round_trip_stays_within_resolution() {
        let mut val = -100.0f32;
        while val < 100.0 {
            let back = to_f32(from_f32(val));
            assert!((back - val).abs() <= RESOLUTION, "{val} came back as {back}");
            val += 0.371;
        }
    }

    #[test]
    fn int_conversions() {
        assert_eq!(from_int(3).to_bits(), 3 << 16);
        assert_eq!(from_int(-2), Fix::from_num(-2));
        assert_eq!(to_int(Fix::from_num(2.49)), 2);
        assert_eq!(to_int(Fix::from_num(2.5)), 3);
        assert_eq!(to_int(Fix::from_num(-2.5)), -2);
        assert_eq!(to_int(Fix::from_num(-2.51)), -3);
    }

    #[test]
    fn mul_widens_and_floors() {
        assert_eq!(mul(Fix::from_num(1.5), Fix::from_num(-4)), Fix::from_num(-6));
        assert_eq!(mul(Fix::from_num(200), Fix::from_num(100)), Fix::from_num(20000));
        assert_eq!(mul(Fix::from_bits(1), Fix::from_bits(-1)), Fix::from_bits(-1));
        assert_eq!(mul(Fix::from_bits(1), Fix::from_bits(1)), Fix::ZERO);
    }

    #[test]
    fn div_widens_and_truncates() {
        assert_eq!(div(Fix::from_num(7), Fix::from_num(2)), Fix::from_num(3.5));
        assert_eq!(div(Fix::from_num(1), Fix::from_num(3)).to_bits(), 21845);
        assert_eq!(div(Fix::from_num(-1), Fix::from_num(3)).to_bits(), -21845);
        assert_eq!(div(Fix::from_num(20000), Fix::from_num(10000)), Fix::from_num(2));
    }

    #[test]
    #[should_panic]
    fn div_by_zero_panics() {
        div(ONE, Fix::ZERO);
    }

    #[test]
    fn fast_variants_lose_low_bits_only() {
        assert_eq!(mul_fast(Fix::from_num(1.5), Fix::from_num(4)), Fix::from_num(6));
        assert_eq!(div_fast(Fix::from_num(6), Fix::from_num(4)), Fix::from_num(1.5));
        assert_eq!(mul_fast(Fix::from_bits(0xff), Fix::from_num(100)), Fix::ZERO);
    }

    #[rstest]
    fn cutoff_round_trip(
        #[values(0.1, 0.5, 1.0, 2.0, 4.5, 10.0, 20.0, 25.0, 30.0, 49.0)] freq_hz: f64,
        #[values(1, 10, 100)] period_ms: u16,
    ) {
        let tc = time_constant(freq_hz, period_ms);
        assert!(tc > 0.0 && tc < 1.0);
        assert_relative_eq!(cutoff_frequency(tc, period_ms), freq_hz, max_relative = 1e-3);
    }

    #[rstest]
    #[case(2.0, 10)]
    #[case(10.0, 10)]
    #[case(20.0, 1)]
    #[case(1.0, 100)]
    fn cutoff_round_trip_through_fix(#[case] freq_hz: f32, #[case] period_ms: u16) {
        let tc = time_constant_from_cutoff(freq_hz, period_ms);
        assert_relative_eq!(
            cutoff_from_time_constant(tc, period_ms),
            freq_hz,
            max_relative = 1e-2
        );
    }

    #[test]
    fn time_constant_of_known_filter() {
        // 2 Hz sampled at 100 Hz
        assert_relative_eq!(time_constant(2.0, 10), 0.118_089, max_relative = 1e-4);
    }
}
