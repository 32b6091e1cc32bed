pub use pid::{AxisController, NonFiniteMeasurement};

mod pid;

/// Linear interpolation.
#[inline]
pub fn lerp(a: f32, b: f32, t: f32) -> f32 {
    a + (b - a) * t
}

/// Truncate a correction towards zero.
///
/// Non-finite values are mapped to zero.
#[inline]
pub fn truncate(value: f32) -> i32 {
    if value.is_finite() {
        value.trunc().clamp(i32::MIN as f32, i32::MAX as f32) as i32
    } else {
        0
    }
}
