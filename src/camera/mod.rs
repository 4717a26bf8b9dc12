//! Camera and screen-space effects
//!
//! - `easing`: easing curves
//! - `tween`: keyed tween scheduler
//! - `controller`: shake, zoom, rotation, flash, time and post effects

pub mod controller;
pub mod easing;
pub mod tween;

pub use controller::{
    CameraEffectController, CameraPass, CameraRig, CameraState, CameraStatus, Flash, PostEffect,
    PostEffectKind, SlowMotionPhase,
};
pub use easing::Easing;
pub use tween::{Tween, TweenScheduler};
