//! Print scale normalization.

use serde::Serialize;
use std::fmt;

/// Smallest accepted scale, in percent
pub const MIN_SCALE_PERCENT: i64 = 10;
/// Largest accepted scale, in percent
pub const MAX_SCALE_PERCENT: i64 = 100;
/// Scale used when a request does not name one
pub const DEFAULT_SCALE_PERCENT: i64 = 100;

/// The clamped, normalized scale applied to the printed body.
///
/// Always within `[0.10, 1.00]`, whatever percentage it was built from.
///
/// ```
/// use printframe::EffectiveScale;
///
/// assert_eq!(EffectiveScale::from_percent(80).value(), 0.8);
/// assert_eq!(EffectiveScale::from_percent(-5).value(), 0.1);
/// assert_eq!(EffectiveScale::from_percent(1000).value(), 1.0);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd, Serialize)]
pub struct EffectiveScale(f64);

impl EffectiveScale {
    pub fn from_percent(percent: i64) -> Self {
        let clamped = percent.clamp(MIN_SCALE_PERCENT, MAX_SCALE_PERCENT);
        EffectiveScale(clamped as f64 / 100.0)
    }

    pub fn value(self) -> f64 {
        self.0
    }

    /// Width in percent that compensates a `transform: scale(..)` so the
    /// scaled body still spans the page.
    pub fn compensating_width_percent(self) -> f64 {
        100.0 / self.0
    }
}

impl Default for EffectiveScale {
    fn default() -> Self {
        Self::from_percent(DEFAULT_SCALE_PERCENT)
    }
}

// Shortest round-trip form: 0.8, 1, 125
impl fmt::Display for EffectiveScale {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}
