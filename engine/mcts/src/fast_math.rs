//! Cheap numeric approximations used in the selection hot loop.

/// Approximate square root by halving the float exponent.
///
/// Monotonic for positive inputs and within a few percent of `f32::sqrt`,
/// which is plenty for the exploration term.
#[inline]
pub fn fast_sqrt(x: f32) -> f32 {
    let bits = x.to_bits();
    f32::from_bits(((1u32 << 29) + (bits >> 1)).wrapping_sub(1 << 22))
}

/// Reciprocal of a visit count.
#[inline]
pub fn fast_recip(n: u32) -> f32 {
    1.0 / n as f32
}
