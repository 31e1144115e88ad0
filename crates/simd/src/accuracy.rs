//! Compile-time accuracy classes for reciprocal, division and square root.

/// Precision strategy selected by an accuracy tag type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AccuracyClass {
    /// IEEE-754 division and square root.
    Full,
    /// Refined estimate with relative error around 2^-23.
    Bits23,
    /// Coarse estimate with relative error around 2^-12 (at most 1.5 * 2^-12).
    Bits12,
}

/// Tag trait implemented by the accuracy marker types.
///
/// The class is a constant, so `match A::CLASS` in a generic function folds
/// away at monomorphization time.
pub trait MathAcc: Copy + Send + Sync + 'static {
    /// Strategy associated with this tag.
    const CLASS: AccuracyClass;
    /// Newton-Raphson refinement steps applied after the hardware estimate.
    const REFINEMENT_STEPS: u32;
}

/// Exact IEEE-754 results.
#[derive(Debug, Clone, Copy, Default)]
pub struct Full;

/// Near full precision using the hardware estimate plus one refinement step.
#[derive(Debug, Clone, Copy, Default)]
pub struct Bits23;

/// Low precision using the raw hardware estimate.
#[derive(Debug, Clone, Copy, Default)]
pub struct Bits12;

impl MathAcc for Full {
    const CLASS: AccuracyClass = AccuracyClass::Full;
    const REFINEMENT_STEPS: u32 = 0;
}

impl MathAcc for Bits23 {
    const CLASS: AccuracyClass = AccuracyClass::Bits23;
    const REFINEMENT_STEPS: u32 = 1;
}

impl MathAcc for Bits12 {
    const CLASS: AccuracyClass = AccuracyClass::Bits12;
    const REFINEMENT_STEPS: u32 = 0;
}
