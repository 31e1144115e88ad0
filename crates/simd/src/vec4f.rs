//! The [`Vec4f`] register type.

use std::ops::{Add, AddAssign, Div, Mul, MulAssign, Neg, Sub, SubAssign};

use bytemuck::{Pod, Zeroable};
use wide::{CmpEq, CmpGe, CmpGt, CmpLe, CmpLt, f32x4};

use crate::accuracy::{AccuracyClass, MathAcc};
use crate::vec4b::Vec4b;

/// Four single-precision lanes processed together.
///
/// `Vec4f` is a plain value type: copying it is free and it never owns heap
/// memory. Lane-wise operations never mix lanes.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
#[repr(transparent)]
pub struct Vec4f(f32x4);

// SAFETY: `Vec4f` is a transparent wrapper over `f32x4`, which is itself
// `Pod` (four `f32` with 16-byte alignment and no padding).
unsafe impl Zeroable for Vec4f {}
unsafe impl Pod for Vec4f {}

impl Vec4f {
    /// All lanes `0.0`.
    pub fn zero() -> Self {
        Self(f32x4::splat(0.0))
    }

    /// Broadcasts `value` to all four lanes.
    pub fn splat(value: f32) -> Self {
        Self(f32x4::splat(value))
    }

    /// Builds a register from four lanes.
    pub fn new(x: f32, y: f32, z: f32, w: f32) -> Self {
        Self(f32x4::from([x, y, z, w]))
    }

    pub fn from_array(lanes: [f32; 4]) -> Self {
        Self(f32x4::from(lanes))
    }

    /// Lanes in order.
    pub fn to_array(self) -> [f32; 4] {
        self.0.to_array()
    }

    /// Loads the first `N` floats of `src`; lanes `N..4` are set to `0.0`.
    ///
    /// # Panics
    ///
    /// Panics if `src` holds fewer than `N` values.
    pub fn load<const N: usize>(src: &[f32]) -> Self {
        const { assert!(N >= 1 && N <= 4, "lane count must be 1..=4") };
        let mut lanes = [0.0; 4];
        lanes[..N].copy_from_slice(&src[..N]);
        Self::from_array(lanes)
    }

    /// Stores the first `N` lanes into `dst`.
    ///
    /// # Panics
    ///
    /// Panics if `dst` holds fewer than `N` values.
    pub fn store<const N: usize>(self, dst: &mut [f32]) {
        const { assert!(N >= 1 && N <= 4, "lane count must be 1..=4") };
        dst[..N].copy_from_slice(&self.to_array()[..N]);
    }

    pub fn x(self) -> f32 {
        self.to_array()[0]
    }

    pub fn y(self) -> f32 {
        self.to_array()[1]
    }

    pub fn z(self) -> f32 {
        self.to_array()[2]
    }

    pub fn w(self) -> f32 {
        self.to_array()[3]
    }

    /// Returns lane `index` (0..4).
    pub fn lane(self, index: usize) -> f32 {
        self.to_array()[index]
    }

    /// Applies a scalar function to every lane.
    #[inline]
    pub fn map(self, f: impl Fn(f32) -> f32) -> Self {
        Self::from_array(self.to_array().map(f))
    }

    /// Combines two registers lane by lane with a scalar function.
    #[inline]
    pub fn zip_map(self, other: Self, f: impl Fn(f32, f32) -> f32) -> Self {
        let a = self.to_array();
        let b = other.to_array();
        Self::from_array(std::array::from_fn(|lane| f(a[lane], b[lane])))
    }

    // === Elementwise arithmetic ===

    pub fn abs(self) -> Self {
        Self(self.0.abs())
    }

    pub fn min(self, other: Self) -> Self {
        Self(self.0.min(other.0))
    }

    pub fn max(self, other: Self) -> Self {
        Self(self.0.max(other.0))
    }

    /// Lane-wise multiplication.
    pub fn comp_mul(self, other: Self) -> Self {
        Self(self.0 * other.0)
    }

    /// Lane-wise division using the requested accuracy class.
    #[inline]
    pub fn comp_div<A: MathAcc>(self, other: Self) -> Self {
        match A::CLASS {
            AccuracyClass::Full => Self(self.0 / other.0),
            AccuracyClass::Bits23 | AccuracyClass::Bits12 => {
                self.comp_mul(other.reciprocal::<A>())
            }
        }
    }

    /// Lane-wise `1/x`.
    ///
    /// The approximate classes start from the hardware reciprocal estimate
    /// (about 12 bits) and apply [`MathAcc::REFINEMENT_STEPS`] Newton-Raphson
    /// steps. The estimate is already exact for zero and infinite lanes, so
    /// those lanes bypass refinement, which would turn them into NaN.
    #[inline]
    pub fn reciprocal<A: MathAcc>(self) -> Self {
        if A::CLASS == AccuracyClass::Full {
            return Self(f32x4::splat(1.0) / self.0);
        }

        let estimate = self.0.recip();
        if A::REFINEMENT_STEPS == 0 {
            return Self(estimate);
        }

        let two = f32x4::splat(2.0);
        let mut y = estimate;
        for _ in 0..A::REFINEMENT_STEPS {
            y = y * (two - self.0 * y);
        }
        let special = self.0.cmp_eq(f32x4::splat(0.0)) | self.0.is_inf();
        Self(special.blend(estimate, y))
    }

    /// Lane-wise `1/sqrt(x)`.
    ///
    /// Same scheme as [`reciprocal`](Self::reciprocal), seeded from the
    /// hardware reciprocal square root estimate.
    #[inline]
    pub fn inv_sqrt<A: MathAcc>(self) -> Self {
        if A::CLASS == AccuracyClass::Full {
            return Self(f32x4::splat(1.0) / self.0.sqrt());
        }

        let estimate = self.0.recip_sqrt();
        if A::REFINEMENT_STEPS == 0 {
            return Self(estimate);
        }

        let half_x = self.0 * f32x4::splat(0.5);
        let three_halves = f32x4::splat(1.5);
        let mut y = estimate;
        for _ in 0..A::REFINEMENT_STEPS {
            y = y * (three_halves - half_x * y * y);
        }
        let special = self.0.cmp_eq(f32x4::splat(0.0)) | self.0.is_inf();
        Self(special.blend(estimate, y))
    }

    /// Lane-wise square root using the requested accuracy class.
    ///
    /// The approximate classes compute `x * (1/sqrt(x))`. Zero and `+inf`
    /// lanes are their own square root and are passed through unchanged.
    #[inline]
    pub fn sqrt<A: MathAcc>(self) -> Self {
        match A::CLASS {
            AccuracyClass::Full => Self(self.0.sqrt()),
            AccuracyClass::Bits23 | AccuracyClass::Bits12 => {
                let approx = self.0 * self.inv_sqrt::<A>().0;
                let fixed = self.0.cmp_eq(f32x4::splat(0.0))
                    | self.0.cmp_eq(f32x4::splat(f32::INFINITY));
                Self(fixed.blend(self.0, approx))
            }
        }
    }

    /// `self * b + c`, fused where the target supports it.
    pub fn mul_add(self, b: Self, c: Self) -> Self {
        Self(self.0.mul_add(b.0, c.0))
    }

    /// `self * b - c`, fused where the target supports it.
    pub fn mul_sub(self, b: Self, c: Self) -> Self {
        Self(self.0.mul_sub(b.0, c.0))
    }

    // === Transcendentals and rounding (lane-wise through std) ===

    pub fn sin(self) -> Self {
        self.map(f32::sin)
    }

    pub fn cos(self) -> Self {
        self.map(f32::cos)
    }

    pub fn tan(self) -> Self {
        self.map(f32::tan)
    }

    pub fn asin(self) -> Self {
        self.map(f32::asin)
    }

    pub fn acos(self) -> Self {
        self.map(f32::acos)
    }

    pub fn atan(self) -> Self {
        self.map(f32::atan)
    }

    pub fn exp(self) -> Self {
        self.map(f32::exp)
    }

    /// Natural logarithm.
    pub fn ln(self) -> Self {
        self.map(f32::ln)
    }

    pub fn log2(self) -> Self {
        self.map(f32::log2)
    }

    pub fn log10(self) -> Self {
        self.map(f32::log10)
    }

    /// `2^x` per lane.
    pub fn pow2(self) -> Self {
        self.map(f32::exp2)
    }

    pub fn floor(self) -> Self {
        self.map(f32::floor)
    }

    pub fn ceil(self) -> Self {
        self.map(f32::ceil)
    }

    /// Rounds to nearest, ties to even.
    pub fn round(self) -> Self {
        self.map(f32::round_ties_even)
    }

    pub fn trunc(self) -> Self {
        self.map(f32::trunc)
    }

    // === Horizontal operations ===

    /// Sum of the first `N` lanes, reduced pairwise.
    pub fn horizontal_sum<const N: usize>(self) -> f32 {
        const { assert!(N >= 1 && N <= 4, "lane count must be 1..=4") };
        let [x, y, z, w] = self.to_array();
        match N {
            1 => x,
            2 => x + y,
            3 => (x + y) + z,
            _ => (x + y) + (z + w),
        }
    }

    /// Minimum of the first `N` lanes.
    pub fn horizontal_min<const N: usize>(self) -> f32 {
        const { assert!(N >= 1 && N <= 4, "lane count must be 1..=4") };
        let lanes = self.to_array();
        lanes[1..N].iter().fold(lanes[0], |acc, &lane| acc.min(lane))
    }

    /// Maximum of the first `N` lanes.
    pub fn horizontal_max<const N: usize>(self) -> f32 {
        const { assert!(N >= 1 && N <= 4, "lane count must be 1..=4") };
        let lanes = self.to_array();
        lanes[1..N].iter().fold(lanes[0], |acc, &lane| acc.max(lane))
    }

    /// Dot product over the first `N` lanes.
    pub fn dot<const N: usize>(self, other: Self) -> f32 {
        self.comp_mul(other).horizontal_sum::<N>()
    }

    // === Comparisons ===

    pub fn cmp_eq(self, other: Self) -> Vec4b {
        Vec4b(self.0.cmp_eq(other.0))
    }

    /// Lane-wise `!=`. NaN lanes compare unequal to everything.
    pub fn cmp_ne(self, other: Self) -> Vec4b {
        !self.cmp_eq(other)
    }

    pub fn cmp_lt(self, other: Self) -> Vec4b {
        Vec4b(self.0.cmp_lt(other.0))
    }

    pub fn cmp_le(self, other: Self) -> Vec4b {
        Vec4b(self.0.cmp_le(other.0))
    }

    pub fn cmp_gt(self, other: Self) -> Vec4b {
        Vec4b(self.0.cmp_gt(other.0))
    }

    pub fn cmp_ge(self, other: Self) -> Vec4b {
        Vec4b(self.0.cmp_ge(other.0))
    }

    /// Lanes where `|self - other| <= epsilon`.
    pub fn is_equal(self, other: Self, epsilon: f32) -> Vec4b {
        (self - other).abs().cmp_le(Self::splat(epsilon))
    }

    /// Picks `if_true` where `mask` is set and `if_false` elsewhere.
    pub fn select(mask: Vec4b, if_true: Self, if_false: Self) -> Self {
        Self(mask.0.blend(if_true.0, if_false.0))
    }

    // === Validity ===

    /// True only if every one of the first `N` lanes is NaN.
    pub fn is_nan<const N: usize>(self) -> bool {
        const { assert!(N >= 1 && N <= 4, "lane count must be 1..=4") };
        self.to_array()[..N].iter().all(|lane| lane.is_nan())
    }

    /// True if any of the first `N` lanes is NaN.
    pub fn has_nan<const N: usize>(self) -> bool {
        const { assert!(N >= 1 && N <= 4, "lane count must be 1..=4") };
        self.to_array()[..N].iter().any(|lane| lane.is_nan())
    }

    /// True only if every one of the first `N` lanes is finite.
    pub fn is_valid<const N: usize>(self) -> bool {
        const { assert!(N >= 1 && N <= 4, "lane count must be 1..=4") };
        self.to_array()[..N].iter().all(|lane| lane.is_finite())
    }
}

impl From<[f32; 4]> for Vec4f {
    fn from(lanes: [f32; 4]) -> Self {
        Self::from_array(lanes)
    }
}

impl From<Vec4f> for [f32; 4] {
    fn from(value: Vec4f) -> Self {
        value.to_array()
    }
}

impl Add for Vec4f {
    type Output = Self;

    fn add(self, rhs: Self) -> Self {
        Self(self.0 + rhs.0)
    }
}

impl Sub for Vec4f {
    type Output = Self;

    fn sub(self, rhs: Self) -> Self {
        Self(self.0 - rhs.0)
    }
}

impl Mul for Vec4f {
    type Output = Self;

    fn mul(self, rhs: Self) -> Self {
        self.comp_mul(rhs)
    }
}

impl Mul<f32> for Vec4f {
    type Output = Self;

    fn mul(self, rhs: f32) -> Self {
        Self(self.0 * f32x4::splat(rhs))
    }
}

/// `/` is exact IEEE division; use [`Vec4f::comp_div`] for the fast classes.
impl Div for Vec4f {
    type Output = Self;

    fn div(self, rhs: Self) -> Self {
        Self(self.0 / rhs.0)
    }
}

impl Neg for Vec4f {
    type Output = Self;

    fn neg(self) -> Self {
        Self(-self.0)
    }
}

impl AddAssign for Vec4f {
    fn add_assign(&mut self, rhs: Self) {
        *self = *self + rhs;
    }
}

impl SubAssign for Vec4f {
    fn sub_assign(&mut self, rhs: Self) {
        *self = *self - rhs;
    }
}

impl MulAssign for Vec4f {
    fn mul_assign(&mut self, rhs: Self) {
        *self = *self * rhs;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{Bits12, Bits23, Full};

    fn relative_error(approx: f32, numerator: f32, divisor: f32) -> f64 {
        let reference = numerator as f64 / divisor as f64;
        ((approx as f64 - reference) / reference).abs()
    }

    fn max_div_error<A: MathAcc>(divisors: &[f32]) -> f64 {
        let numerator = Vec4f::splat(3.7);
        divisors
            .chunks(4)
            .flat_map(|chunk| {
                let mut lanes = [1.0; 4];
                lanes[..chunk.len()].copy_from_slice(chunk);
                let quotient = numerator.comp_div::<A>(Vec4f::from_array(lanes));
                (0..chunk.len())
                    .map(move |lane| relative_error(quotient.lane(lane), 3.7, lanes[lane]))
                    .collect::<Vec<_>>()
            })
            .fold(0.0, f64::max)
    }

    #[test]
    fn test_construction_and_lanes() {
        let v = Vec4f::new(1.0, 2.0, 3.0, 4.0);
        assert_eq!(v.to_array(), [1.0, 2.0, 3.0, 4.0]);
        assert_eq!((v.x(), v.y(), v.z(), v.w()), (1.0, 2.0, 3.0, 4.0));
        assert_eq!(Vec4f::splat(2.5).to_array(), [2.5; 4]);
        assert_eq!(Vec4f::zero().to_array(), [0.0; 4]);
    }

    #[test]
    fn test_partial_load_and_store() {
        let src = [7.0, 8.0, 9.0];
        let v = Vec4f::load::<3>(&src);
        assert_eq!(&v.to_array()[..3], &src);

        let mut dst = [0.0f32; 4];
        Vec4f::new(1.0, 2.0, 3.0, 4.0).store::<2>(&mut dst);
        assert_eq!(dst, [1.0, 2.0, 0.0, 0.0]);
    }

    #[test]
    fn test_register_runs_cast_to_lane_order() {
        let run = [Vec4f::new(1.0, 2.0, 3.0, 4.0), Vec4f::new(5.0, 6.0, 7.0, 8.0)];
        let lanes: &[f32] = bytemuck::cast_slice(&run);
        assert_eq!(lanes, &[1.0, 2.0, 3.0, 4.0, 5.0, 6.0, 7.0, 8.0]);
    }

    #[test]
    fn test_elementwise_arithmetic() {
        let a = Vec4f::new(1.0, -2.0, 3.0, -4.0);
        let b = Vec4f::new(2.0, 2.0, 2.0, 2.0);
        assert_eq!((a + b).to_array(), [3.0, 0.0, 5.0, -2.0]);
        assert_eq!((a - b).to_array(), [-1.0, -4.0, 1.0, -6.0]);
        assert_eq!((a * b).to_array(), [2.0, -4.0, 6.0, -8.0]);
        assert_eq!((a / b).to_array(), [0.5, -1.0, 1.5, -2.0]);
        assert_eq!(a.abs().to_array(), [1.0, 2.0, 3.0, 4.0]);
        assert_eq!(a.min(b).to_array(), [1.0, -2.0, 2.0, -4.0]);
        assert_eq!(a.max(b).to_array(), [2.0, 2.0, 3.0, 2.0]);
        assert_eq!((-a).to_array(), [-1.0, 2.0, -3.0, 4.0]);
    }

    #[test]
    fn test_mul_add_and_mul_sub() {
        let a = Vec4f::new(1.0, 2.0, 3.0, 4.0);
        let b = Vec4f::splat(2.0);
        let c = Vec4f::splat(0.5);
        assert_eq!(a.mul_add(b, c).to_array(), [2.5, 4.5, 6.5, 8.5]);
        assert_eq!(a.mul_sub(b, c).to_array(), [1.5, 3.5, 5.5, 7.5]);
    }

    #[test]
    fn test_transcendentals_match_std() {
        let v = Vec4f::new(0.1, 0.4, -0.7, 0.95);
        let lanes = v.to_array();
        for lane in 0..4 {
            assert_eq!(v.sin().lane(lane), lanes[lane].sin());
            assert_eq!(v.cos().lane(lane), lanes[lane].cos());
            assert_eq!(v.tan().lane(lane), lanes[lane].tan());
            assert_eq!(v.asin().lane(lane), lanes[lane].asin());
            assert_eq!(v.acos().lane(lane), lanes[lane].acos());
            assert_eq!(v.atan().lane(lane), lanes[lane].atan());
            assert_eq!(v.exp().lane(lane), lanes[lane].exp());
            assert_eq!(v.pow2().lane(lane), lanes[lane].exp2());
        }
        assert_eq!(Vec4f::splat(4.0).sqrt::<Full>().to_array(), [2.0; 4]);
    }

    #[test]
    fn test_rounding() {
        let v = Vec4f::new(1.5, 2.5, -1.5, -0.4);
        assert_eq!(v.round().to_array(), [2.0, 2.0, -2.0, -0.0]);
        assert_eq!(v.floor().to_array(), [1.0, 2.0, -2.0, -1.0]);
        assert_eq!(v.ceil().to_array(), [2.0, 3.0, -1.0, -0.0]);
        assert_eq!(v.trunc().to_array(), [1.0, 2.0, -1.0, -0.0]);
    }

    #[test]
    fn test_division_accuracy_ordering() {
        let divisors: Vec<f32> = (1..=400)
            .map(|i| {
                let magnitude = 0.013 * i as f32 * (1.0 + (i % 7) as f32 * 0.37);
                if i % 3 == 0 { -magnitude } else { magnitude }
            })
            .collect();

        let full = max_div_error::<Full>(&divisors);
        let bits23 = max_div_error::<Bits23>(&divisors);
        let bits12 = max_div_error::<Bits12>(&divisors);

        assert!(full <= bits23, "full {full} > bits23 {bits23}");
        assert!(bits23 <= bits12, "bits23 {bits23} > bits12 {bits12}");
        assert!(full < 1e-7);
        assert!(bits23 < 1e-6);
        // The hardware estimate is specified to within 1.5 * 2^-12.
        assert!(bits12 < 2.0 / 4096.0);
    }

    #[test]
    fn test_single_refinement_squares_estimate_error() {
        let values: Vec<f32> = (1..=512).map(|i| 0.37 + i as f32 * 1.913).collect();
        let mut worst_coarse = 0.0f64;
        let mut worst_refined = 0.0f64;
        for chunk in values.chunks_exact(4) {
            let x = Vec4f::load::<4>(chunk);
            let coarse = x.inv_sqrt::<Bits12>();
            let refined = x.inv_sqrt::<Bits23>();
            for lane in 0..4 {
                let reference = 1.0 / (chunk[lane] as f64).sqrt();
                let error = |approx: f32| ((approx as f64 - reference) / reference).abs();
                worst_coarse = worst_coarse.max(error(coarse.lane(lane)));
                worst_refined = worst_refined.max(error(refined.lane(lane)));
            }
        }
        assert!(worst_coarse < 2.0 / 4096.0, "coarse {worst_coarse}");
        assert!(worst_refined < 1e-6, "refined {worst_refined}");
        assert!(worst_refined <= worst_coarse);
    }

    #[test]
    fn test_inv_sqrt_special_values() {
        let v = Vec4f::new(0.0, f32::INFINITY, -4.0, f32::NAN);
        for r in [v.inv_sqrt::<Bits12>(), v.inv_sqrt::<Bits23>(), v.inv_sqrt::<Full>()] {
            let lanes = r.to_array();
            assert_eq!(lanes[0], f32::INFINITY);
            assert_eq!(lanes[1], 0.0);
            assert!(lanes[2].is_nan());
            assert!(lanes[3].is_nan());
        }

        let roots = Vec4f::new(0.0, -0.0, f32::INFINITY, -1.0);
        for r in [roots.sqrt::<Bits12>(), roots.sqrt::<Bits23>()] {
            let lanes = r.to_array();
            assert_eq!(lanes[0].to_bits(), 0.0f32.to_bits());
            assert_eq!(lanes[1].to_bits(), (-0.0f32).to_bits());
            assert_eq!(lanes[2], f32::INFINITY);
            assert!(lanes[3].is_nan());
        }
    }

    #[test]
    fn test_reciprocal_special_values() {
        let v = Vec4f::new(0.0, -0.0, f32::INFINITY, f32::NEG_INFINITY);
        for r in [v.reciprocal::<Bits12>(), v.reciprocal::<Bits23>(), v.reciprocal::<Full>()] {
            let lanes = r.to_array();
            assert_eq!(lanes[0], f32::INFINITY);
            assert_eq!(lanes[1], f32::NEG_INFINITY);
            assert_eq!(lanes[2], 0.0);
            assert_eq!(lanes[3], 0.0);
            assert!(lanes[3].is_sign_negative());
        }
    }

    #[test]
    fn test_approximate_sqrt() {
        let v = Vec4f::new(0.0, 1.0, 2.0, 100.0);
        let approx = v.sqrt::<Bits12>();
        assert_eq!(approx.x(), 0.0);
        for lane in 1..4 {
            let exact = v.lane(lane).sqrt();
            assert!(((approx.lane(lane) - exact) / exact).abs() < 2.0 / 4096.0);
        }
        let inv = v.inv_sqrt::<Bits23>();
        assert!((inv.lane(3) - 0.1).abs() < 1e-6);
    }

    #[test]
    fn test_horizontal_reductions() {
        let v = Vec4f::new(1.0, 2.0, 4.0, 8.0);
        assert_eq!(v.horizontal_sum::<2>(), 3.0);
        assert_eq!(v.horizontal_sum::<3>(), 7.0);
        assert_eq!(v.horizontal_sum::<4>(), 15.0);

        let w = Vec4f::new(3.0, -1.0, 5.0, -7.0);
        assert_eq!(w.horizontal_min::<2>(), -1.0);
        assert_eq!(w.horizontal_min::<4>(), -7.0);
        assert_eq!(w.horizontal_max::<3>(), 5.0);
        assert_eq!(w.horizontal_max::<2>(), 3.0);

        assert_eq!(v.dot::<3>(Vec4f::splat(1.0)), 7.0);
        assert_eq!(v.dot::<4>(v), 85.0);
    }

    #[test]
    fn test_comparisons_and_select() {
        let a = Vec4f::new(1.0, 2.0, 3.0, 4.0);
        let b = Vec4f::new(2.0, 2.0, 2.0, 2.0);
        assert_eq!(a.cmp_eq(b).to_array(), [false, true, false, false]);
        assert_eq!(a.cmp_ne(b).to_array(), [true, false, true, true]);
        assert_eq!(a.cmp_lt(b).to_array(), [true, false, false, false]);
        assert_eq!(a.cmp_le(b).to_array(), [true, true, false, false]);
        assert_eq!(a.cmp_gt(b).to_array(), [false, false, true, true]);
        assert_eq!(a.cmp_ge(b).to_array(), [false, true, true, true]);

        let picked = Vec4f::select(a.cmp_gt(b), a, b);
        assert_eq!(picked.to_array(), [2.0, 2.0, 3.0, 4.0]);

        let nan = Vec4f::splat(f32::NAN);
        assert!(nan.cmp_ne(nan).all::<4>());
        assert!(nan.cmp_eq(nan).none::<4>());
    }

    #[test]
    fn test_is_equal_with_epsilon() {
        let a = Vec4f::new(1.0, 2.0, 3.0, 4.0);
        let b = Vec4f::new(1.0005, 2.5, 3.0, 3.9995);
        assert_eq!(a.is_equal(b, 1e-3).to_array(), [true, false, true, true]);
    }

    #[test]
    fn test_validity_requires_all_lanes() {
        for position in 0..4 {
            let mut lanes = [1.0f32; 4];
            lanes[position] = f32::NAN;
            let v = Vec4f::from_array(lanes);

            assert!(!v.is_valid::<4>());
            assert!(!v.is_nan::<4>());
            assert!(v.has_nan::<4>());
            // Lanes before the NaN are still valid on their own.
            if position >= 2 {
                assert!(v.is_valid::<2>());
                assert!(!v.has_nan::<2>());
            }

            let mut inf = [1.0f32; 4];
            inf[position] = f32::INFINITY;
            let v = Vec4f::from_array(inf);
            assert!(!v.is_valid::<4>());
            assert!(!v.has_nan::<4>());
        }

        let all_nan = Vec4f::splat(f32::NAN);
        assert!(all_nan.is_nan::<4>());
        assert!(all_nan.is_nan::<2>());
        assert!(Vec4f::new(f32::NAN, f32::NAN, 0.0, 0.0).is_nan::<2>());
        assert!(!Vec4f::new(f32::NAN, f32::NAN, 0.0, 0.0).is_nan::<3>());
        assert!(Vec4f::splat(3.0).is_valid::<4>());
    }

    #[test]
    fn test_division_by_zero_is_data() {
        let r = Vec4f::splat(1.0) / Vec4f::new(0.0, 1.0, -0.0, 2.0);
        assert_eq!(r.x(), f32::INFINITY);
        assert_eq!(r.z(), f32::NEG_INFINITY);
        assert!(!r.is_valid::<4>());
        assert!(!r.is_valid::<1>());
    }
}
