//! Lane-wise boolean mask produced by [`Vec4f`](crate::Vec4f) comparisons.

use std::ops::{BitAnd, BitOr, BitXor, Not};

use wide::f32x4;

/// Four-lane boolean mask.
///
/// Each lane is stored as all-ones (true) or all-zeros (false) bits so the
/// mask can feed [`Vec4f::select`](crate::Vec4f::select) directly.
#[derive(Clone, Copy, Debug, Default)]
pub struct Vec4b(pub(crate) f32x4);

const TRUE_BITS: u32 = u32::MAX;

impl Vec4b {
    /// Builds a mask from four explicit lanes.
    pub fn new(x: bool, y: bool, z: bool, w: bool) -> Self {
        Self::from_array([x, y, z, w])
    }

    /// Broadcasts one flag to all lanes.
    pub fn splat(value: bool) -> Self {
        Self::from_array([value; 4])
    }

    /// Builds a mask from four flags.
    pub fn from_array(lanes: [bool; 4]) -> Self {
        let bits = lanes.map(|lane| f32::from_bits(if lane { TRUE_BITS } else { 0 }));
        Self(f32x4::from(bits))
    }

    /// Flags in lane order.
    pub fn to_array(self) -> [bool; 4] {
        let bits = self.bitmask();
        std::array::from_fn(|lane| bits & (1 << lane) != 0)
    }

    /// Returns lane `index` (0..4).
    pub fn lane(self, index: usize) -> bool {
        self.to_array()[index]
    }

    /// Packs the lanes into the low four bits, lane 0 in bit 0.
    pub fn bitmask(self) -> u32 {
        (self.0.move_mask() as u32) & 0b1111
    }

    /// True when every one of the first `N` lanes is set.
    pub fn all<const N: usize>(self) -> bool {
        const { assert!(N >= 1 && N <= 4, "lane count must be 1..=4") };
        let wanted = (1u32 << N) - 1;
        self.bitmask() & wanted == wanted
    }

    /// True when any of the first `N` lanes is set.
    pub fn any<const N: usize>(self) -> bool {
        const { assert!(N >= 1 && N <= 4, "lane count must be 1..=4") };
        self.bitmask() & ((1u32 << N) - 1) != 0
    }

    /// True when none of the first `N` lanes is set.
    pub fn none<const N: usize>(self) -> bool {
        !self.any::<N>()
    }
}

impl PartialEq for Vec4b {
    fn eq(&self, other: &Self) -> bool {
        self.bitmask() == other.bitmask()
    }
}

impl Eq for Vec4b {}

impl BitAnd for Vec4b {
    type Output = Self;

    fn bitand(self, rhs: Self) -> Self {
        Self(self.0 & rhs.0)
    }
}

impl BitOr for Vec4b {
    type Output = Self;

    fn bitor(self, rhs: Self) -> Self {
        Self(self.0 | rhs.0)
    }
}

impl BitXor for Vec4b {
    type Output = Self;

    fn bitxor(self, rhs: Self) -> Self {
        Self(self.0 ^ rhs.0)
    }
}

impl Not for Vec4b {
    type Output = Self;

    fn not(self) -> Self {
        self ^ Self::splat(true)
    }
}
