//! Fractal gradient noise.
//!
//! `PerlinNoise(x, y, z, octaves)` sums `octaves` layers of improved Perlin
//! noise, each at twice the frequency and half the amplitude of the previous
//! one, and remaps the normalized sum from `[-1, 1]` to `[0, 1]`.

use lanes_simd::Vec4f;
use lanes_vm::GlobalData;

/// Octave count range accepted by [`perlin_fbm`].
pub const MIN_OCTAVES: u32 = 1;
pub const MAX_OCTAVES: u32 = 16;

const PERMUTATION_SEED: u64 = 0x5EED_0F_D1CE;

/// Lattice permutation, repeated once so `perm[i + 1]` never wraps.
static PERM: [u8; 512] = build_permutation(PERMUTATION_SEED);

/// Fisher-Yates shuffle of `0..256` driven by SplitMix64.
const fn build_permutation(seed: u64) -> [u8; 512] {
    let mut base = [0u8; 256];
    let mut i = 0;
    while i < 256 {
        base[i] = i as u8;
        i += 1;
    }

    let mut state = seed;
    let mut i = 255;
    while i > 0 {
        state = state.wrapping_add(0x9E3779B97F4A7C15);
        let mut z = state;
        z = (z ^ (z >> 30)).wrapping_mul(0xBF58476D1CE4E5B9);
        z = (z ^ (z >> 27)).wrapping_mul(0x94D049BB133111EB);
        z ^= z >> 31;
        let j = (z % (i as u64 + 1)) as usize;
        let tmp = base[i];
        base[i] = base[j];
        base[j] = tmp;
        i -= 1;
    }

    let mut table = [0u8; 512];
    let mut i = 0;
    while i < 512 {
        table[i] = base[i & 255];
        i += 1;
    }
    table
}

#[inline]
fn fade(t: f32) -> f32 {
    t * t * t * (t * (t * 6.0 - 15.0) + 10.0)
}

#[inline]
fn lerp(t: f32, a: f32, b: f32) -> f32 {
    a + t * (b - a)
}

/// Dot product of the offset with one of twelve edge gradients.
#[inline]
fn grad(hash: u8, x: f32, y: f32, z: f32) -> f32 {
    let h = hash & 15;
    let u = if h < 8 { x } else { y };
    let v = match h {
        0..=3 => y,
        12 | 14 => x,
        _ => z,
    };
    (if h & 1 == 0 { u } else { -u }) + (if h & 2 == 0 { v } else { -v })
}

/// Lattice cell and offset inside it for one coordinate.
#[inline]
fn cell(value: f32) -> (usize, f32) {
    let floor = value.floor();
    ((floor as i64 & 255) as usize, value - floor)
}

/// Single octave of improved Perlin noise, roughly in `[-1, 1]`.
///
/// Zero at every integer lattice point.
pub fn noise3(x: f32, y: f32, z: f32) -> f32 {
    let (xi, x) = cell(x);
    let (yi, y) = cell(y);
    let (zi, z) = cell(z);
    let (u, v, w) = (fade(x), fade(y), fade(z));

    let p = |i: usize| PERM[i] as usize;
    let a = p(xi) + yi;
    let aa = p(a) + zi;
    let ab = p(a + 1) + zi;
    let b = p(xi + 1) + yi;
    let ba = p(b) + zi;
    let bb = p(b + 1) + zi;

    lerp(
        w,
        lerp(
            v,
            lerp(u, grad(PERM[aa], x, y, z), grad(PERM[ba], x - 1.0, y, z)),
            lerp(u, grad(PERM[ab], x, y - 1.0, z), grad(PERM[bb], x - 1.0, y - 1.0, z)),
        ),
        lerp(
            v,
            lerp(
                u,
                grad(PERM[aa + 1], x, y, z - 1.0),
                grad(PERM[ba + 1], x - 1.0, y, z - 1.0),
            ),
            lerp(
                u,
                grad(PERM[ab + 1], x, y - 1.0, z - 1.0),
                grad(PERM[bb + 1], x - 1.0, y - 1.0, z - 1.0),
            ),
        ),
    )
}

/// Clamps a raw octave argument to `MIN_OCTAVES..=MAX_OCTAVES`.
///
/// The fraction is dropped; NaN maps to the minimum.
#[inline]
pub fn octave_count(raw: f32) -> u32 {
    (raw as u32).clamp(MIN_OCTAVES, MAX_OCTAVES)
}

/// Fractal sum of `octaves` noise layers remapped to `[0, 1]`.
pub fn perlin_fbm(x: f32, y: f32, z: f32, octaves: u32) -> f32 {
    let mut sum = 0.0;
    let mut amplitude = 1.0;
    let mut total = 0.0;
    let mut frequency = 1.0;
    for _ in 0..octaves.clamp(MIN_OCTAVES, MAX_OCTAVES) {
        sum += noise3(x * frequency, y * frequency, z * frequency) * amplitude;
        total += amplitude;
        amplitude *= 0.5;
        frequency *= 2.0;
    }
    (sum / total * 0.5 + 0.5).clamp(0.0, 1.0)
}

/// `PerlinNoise(x, y, z, octaves)` function body.
pub fn perlin_noise(args: &[&[Vec4f]], out: &mut [Vec4f], _global_data: &GlobalData) {
    let (xs, ys, zs, octaves) = (args[0], args[1], args[2], args[3]);
    for (group, o) in out.iter_mut().enumerate() {
        let (x, y, z, n) = (
            xs[group].to_array(),
            ys[group].to_array(),
            zs[group].to_array(),
            octaves[group].to_array(),
        );
        *o = Vec4f::from_array(std::array::from_fn(|lane| {
            perlin_fbm(x[lane], y[lane], z[lane], octave_count(n[lane]))
        }));
    }
}
