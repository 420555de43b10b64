//! Numeric conversion helpers used by the formation maths and the runner.
//!
//! Sibling counts arrive as `usize` from the roster but slot angles are
//! computed in `f32`. These helpers keep the conversions in one place.

/// Largest count converted exactly; rosters never approach it.
const MAX_EXACT_COUNT: usize = 1 << 24;

/// Convert a roster index or count into `f32`.
///
/// Values above 2^24 saturate, which keeps the conversion exact for every
/// realistic roster.
#[expect(
    clippy::cast_precision_loss,
    reason = "Input is clamped to the range f32 represents exactly."
)]
#[must_use]
pub fn count_to_f32(value: usize) -> f32 {
    value.min(MAX_EXACT_COUNT) as f32
}

/// Clamp a sibling count to at least one so slot maths never divides by zero.
///
/// # Examples
/// ```
/// use menagerie::numeric::sibling_count;
/// assert_eq!(sibling_count(0), 1);
/// assert_eq!(sibling_count(4), 4);
/// ```
#[must_use]
pub fn sibling_count(count: usize) -> usize {
    if count == 0 {
        log::warn!("formation roster reported zero siblings; treating as one");
    }
    count.max(1)
}

/// Number of whole ticks of `step` seconds covering `duration` seconds.
///
/// Non-positive or non-finite inputs yield zero ticks.
#[expect(
    clippy::cast_possible_truncation,
    clippy::cast_sign_loss,
    reason = "Value is finite, non-negative and rounded up before conversion."
)]
#[must_use]
pub fn ticks_for(duration: f32, step: f32) -> u64 {
    if !(duration > 0.0 && step > 0.0) {
        return 0;
    }
    let ticks = (f64::from(duration) / f64::from(step)).ceil();
    if ticks.is_finite() {
        ticks as u64
    } else {
        0
    }
}
