//! Four-lane vector register for the lanes expression VM.
//!
//! [`Vec4f`] is the only numeric type the interpreter operates on. Every
//! instruction is applied to a run of `Vec4f` registers, one register per
//! group of four instances. Lanes never observe each other except through
//! the explicit horizontal operations ([`Vec4f::horizontal_sum`],
//! [`Vec4f::dot`], ...).
//!
//! Arithmetic is backed by [`wide::f32x4`], which lowers to SSE/NEON/WASM
//! SIMD where available and to a scalar loop otherwise. Transcendentals are
//! evaluated lane by lane through `std` so results are identical on every
//! target.
//!
//! # Accuracy classes
//!
//! Reciprocal, division and square root take an accuracy class as a type
//! parameter:
//!
//! ```
//! use lanes_simd::{Bits12, Full, Vec4f};
//!
//! let x = Vec4f::new(1.0, 2.0, 4.0, 8.0);
//! let exact = x.reciprocal::<Full>();
//! let fast = x.reciprocal::<Bits12>();
//! assert_eq!(exact.x(), 1.0);
//! assert!((fast.w() - 0.125).abs() < 1e-3);
//! ```

mod accuracy;
mod vec4b;
mod vec4f;

pub use accuracy::{AccuracyClass, Bits12, Bits23, Full, MathAcc};
pub use vec4b::Vec4b;
pub use vec4f::Vec4f;

/// Number of lanes in a vector register.
pub const LANES: usize = 4;
