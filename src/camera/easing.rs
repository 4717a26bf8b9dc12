//! Easing curves
//!
//! Each curve maps [0, 1] onto [0, 1] with `apply(0) == 0` and `apply(1) == 1`.

use serde::{Deserialize, Serialize};
use std::f32::consts::PI;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum Easing {
    #[default]
    Linear,
    QuadIn,
    QuadOut,
    QuadInOut,
    CubicIn,
    CubicOut,
    CubicInOut,
    SineIn,
    SineOut,
    SineInOut,
}

impl Easing {
    pub const ALL: [Easing; 10] = [
        Easing::Linear,
        Easing::QuadIn,
        Easing::QuadOut,
        Easing::QuadInOut,
        Easing::CubicIn,
        Easing::CubicOut,
        Easing::CubicInOut,
        Easing::SineIn,
        Easing::SineOut,
        Easing::SineInOut,
    ];

    /// Eased value of `t`, clamped to [0, 1] first
    pub fn apply(self, t: f32) -> f32 {
        let t = if t.is_nan() { 0.0 } else { t.clamp(0.0, 1.0) };
        match self {
            Easing::Linear => t,
            Easing::QuadIn => t * t,
            Easing::QuadOut => 1.0 - (1.0 - t) * (1.0 - t),
            Easing::QuadInOut => {
                if t < 0.5 {
                    2.0 * t * t
                } else {
                    -1.0 + (4.0 - 2.0 * t) * t
                }
            }
            Easing::CubicIn => t * t * t,
            Easing::CubicOut => 1.0 - (1.0 - t).powi(3),
            Easing::CubicInOut => {
                if t < 0.5 {
                    4.0 * t * t * t
                } else {
                    let u = 2.0 * t - 2.0;
                    (t - 1.0) * u * u + 1.0
                }
            }
            Easing::SineIn => 1.0 - (t * PI / 2.0).cos(),
            Easing::SineOut => (t * PI / 2.0).sin(),
            Easing::SineInOut => -((PI * t).cos() - 1.0) / 2.0,
        }
    }

    /// Look up a curve by its conventional name (`"easeOutQuad"`, `"linear"`).
    /// Unknown names fall back to [`Easing::Linear`].
    pub fn from_name(name: &str) -> Self {
        match name {
            "easeInQuad" => Easing::QuadIn,
            "easeOutQuad" => Easing::QuadOut,
            "easeInOutQuad" => Easing::QuadInOut,
            "easeInCubic" => Easing::CubicIn,
            "easeOutCubic" => Easing::CubicOut,
            "easeInOutCubic" => Easing::CubicInOut,
            "easeInSine" => Easing::SineIn,
            "easeOutSine" => Easing::SineOut,
            "easeInOutSine" => Easing::SineInOut,
            "linear" => Easing::Linear,
            other => {
                log::debug!("Unknown easing '{}', using linear", other);
                Easing::Linear
            }
        }
    }
}
