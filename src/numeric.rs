//! Numeric conversion helpers used when quantising world positions.
//!
//! These utilities guard conversions between floating-point and integer
//! domains so grid keys stay well defined for non-finite or huge inputs.

/// Floor an `f32` and clamp it into the `i32` domain.
///
/// Non-finite inputs map to `0` so they still produce a deterministic key.
#[expect(
    clippy::cast_possible_truncation,
    reason = "The value is clamped to the i32 bounds before casting."
)]
#[must_use]
pub fn floor_to_i32(value: f32) -> i32 {
    if !value.is_finite() {
        return 0;
    }
    let floored = f64::from(value).floor();
    let clamped = floored.clamp(f64::from(i32::MIN), f64::from(i32::MAX));
    clamped as i32
}

/// Index of the cell of width `cell_size` containing `value`.
#[must_use]
pub fn cell_index(value: f32, cell_size: f32) -> i32 {
    debug_assert!(cell_size > 0.0, "cell size must be positive");
    floor_to_i32(value / cell_size)
}

/// Lower edge of the cell `index` for cells of width `cell_size`.
#[expect(
    clippy::cast_precision_loss,
    reason = "Cell indices stay far below the f32 mantissa limit in practice."
)]
#[must_use]
pub fn cell_origin(index: i32, cell_size: f32) -> f32 {
    index as f32 * cell_size
}

/// Number of whole steps of at most `max_step` needed to cover `length`.
///
/// Zero-length spans and non-positive step sizes take a single step. Returns
/// `None` for a non-finite `length` or when the count does not fit a `u32`;
/// the span cannot be sampled at the requested resolution.
#[expect(
    clippy::cast_possible_truncation,
    clippy::cast_sign_loss,
    reason = "The step count is checked against the u32 range before casting."
)]
#[must_use]
pub fn step_count(length: f32, max_step: f32) -> Option<u32> {
    if !length.is_finite() {
        return None;
    }
    if !max_step.is_finite() || max_step <= 0.0 {
        return Some(1);
    }
    let steps = (f64::from(length.abs()) / f64::from(max_step)).ceil().max(1.0);
    (steps <= f64::from(u32::MAX)).then(|| steps as u32)
}

/// Converts a step index or count to `f32` for interpolation.
#[expect(
    clippy::cast_precision_loss,
    reason = "Rounding above 2^24 only blurs interpolation parameters."
)]
#[must_use]
pub const fn count_to_f32(count: u32) -> f32 {
    count as f32
}
