//! Stateless per-instance random numbers.
//!
//! `Random(point_index, seed)` hashes the integer parts of both arguments
//! with SplitMix64, so the same point and seed always give the same value no
//! matter how instances are batched or chunked.

use lanes_simd::Vec4f;
use lanes_vm::GlobalData;

/// SplitMix64 state increment.
const GOLDEN_GAMMA: u64 = 0x9E3779B97F4A7C15;

/// SplitMix64 mixing function.
#[inline]
const fn splitmix64_mix(mut z: u64) -> u64 {
    z = (z ^ (z >> 30)).wrapping_mul(0xBF58476D1CE4E5B9);
    z = (z ^ (z >> 27)).wrapping_mul(0x94D049BB133111EB);
    z ^ (z >> 31)
}

/// Convert a u64 to a uniform f32 in [0, 1).
///
/// Uses the upper 24 bits (f32 mantissa precision).
#[inline]
const fn u64_to_f32_01(x: u64) -> f32 {
    (x >> 40) as f32 * (1.0 / (1u32 << 24) as f32)
}

/// Hashes `(point_index, seed)` to a 64-bit value.
#[inline]
pub const fn hash_point(point_index: u64, seed: u64) -> u64 {
    let state = splitmix64_mix(point_index.wrapping_add(GOLDEN_GAMMA));
    splitmix64_mix(state ^ seed.wrapping_mul(GOLDEN_GAMMA))
}

/// Uniform value in `[0, 1)` for one point.
///
/// Fractional parts are ignored; NaN counts as zero and out-of-range values
/// saturate.
#[inline]
pub fn random_value(point_index: f32, seed: f32) -> f32 {
    let index = point_index as i64 as u64;
    let seed = seed as i64 as u64;
    u64_to_f32_01(hash_point(index, seed))
}

/// `Random(point_index, seed)` function body.
pub fn random(args: &[&[Vec4f]], out: &mut [Vec4f], _global_data: &GlobalData) {
    let (indices, seeds) = (args[0], args[1]);
    for ((o, &index), &seed) in out.iter_mut().zip(indices).zip(seeds) {
        *o = index.zip_map(seed, random_value);
    }
}
