//! # Quantization Codec
//!
//! Fixed-point encodings used on the radio link.
//!
//! | Quantity | Wire type | Scale | Range |
//! |----------|-----------|-------|-------|
//! | Position | i16 | mm | ±32.767 m |
//! | Velocity | i16 | mm/s | ±32.767 m/s |
//! | Battery | u8 | ×200 | 0.0-1.0 at 0.5% steps |
//! | Position quality | u8 | ×255 | 0.0-1.0 |
//!
//! Encoders clamp before truncating toward zero, so out-of-range inputs
//! saturate instead of wrapping. `32.767` is not exact in f32 and scales to
//! just under 32767, so distances saturate at ±32766 mm.

/// Largest distance representable on the wire, in meters.
pub const DISTANCE_LIMIT_M: f32 = 32.767;

/// Battery fraction scale (0-200).
pub const BATTERY_SCALE: f32 = 200.0;

/// Position quality scale (0-255).
pub const QUALITY_SCALE: f32 = 255.0;

/// Encode meters (or m/s) as integer millimeters (mm/s).
///
/// # Examples
///
/// ```
/// use pattern_pilot::protocol::quantize::encode_distance;
///
/// assert_eq!(encode_distance(1.5), 1500);
/// assert_eq!(encode_distance(-0.0019), -1); // truncates toward zero
/// ```
#[must_use]
pub fn encode_distance(meters: f32) -> i16 {
    let clamped = meters.clamp(-DISTANCE_LIMIT_M, DISTANCE_LIMIT_M);
    (clamped * 1000.0) as i16
}

/// Decode integer millimeters (mm/s) into meters (m/s).
#[must_use]
pub fn decode_distance(mm: i16) -> f32 {
    mm as f32 / 1000.0
}

/// Encode a battery fraction on the ×200 scale.
#[must_use]
pub fn encode_battery(fraction: f32) -> u8 {
    (fraction * BATTERY_SCALE).clamp(0.0, BATTERY_SCALE) as u8
}

/// Decode a ×200 battery value back into a fraction.
#[must_use]
pub fn decode_battery(raw: u8) -> f32 {
    raw as f32 / BATTERY_SCALE
}

/// Encode a position quality fraction on the ×255 scale.
#[must_use]
pub fn encode_quality(fraction: f32) -> u8 {
    (fraction * QUALITY_SCALE).clamp(0.0, QUALITY_SCALE) as u8
}

/// Decode a ×255 quality value back into a fraction.
#[must_use]
pub fn decode_quality(raw: u8) -> f32 {
    raw as f32 / QUALITY_SCALE
}
