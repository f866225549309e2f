//! Utility maths functions

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

use num_traits::Float;

/// Map a value from one range into another.
///
/// If the source range is degenerate (both ends equal) the start of the target range is
/// returned, rather than dividing by zero.
pub fn lin_map<T>(source_range: (T, T), target_range: (T, T), value: T) -> T
where
    T: Float,
{
    let source_span = source_range.1 - source_range.0;

    if source_span == T::zero() {
        return target_range.0;
    }

    target_range.0 + ((value - source_range.0) * (target_range.1 - target_range.0) / source_span)
}

/// Clamp a value into the range `[min, max]`.
pub fn clamp<T>(value: T, min: T, max: T) -> T
where
    T: Float,
{
    value.max(min).min(max)
}
