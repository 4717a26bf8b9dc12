//! Drawing abstraction
//!
//! The effect core never talks to a graphics API directly. It issues
//! primitive draw calls through [`DrawContext`]; [`VertexCanvas`] is the
//! bundled implementation that tessellates into GPU-ready triangle batches.

pub mod canvas;
pub mod shapes;
pub mod vertex;

pub use canvas::{DrawBatch, VertexCanvas};
pub use vertex::Vertex;

use glam::Vec2;

/// Linear RGBA color, each channel in 0..=1
pub type Rgba = [f32; 4];

/// How a draw call composites with what is already on screen
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum BlendMode {
    #[default]
    Alpha,
    Additive,
    Multiply,
}

/// Primitive drawing surface with an affine transform stack.
///
/// `push`/`pop` save and restore both the transform and the blend mode.
pub trait DrawContext {
    fn push(&mut self);
    fn pop(&mut self);
    fn translate(&mut self, offset: Vec2);
    fn scale(&mut self, factor: f32);
    fn rotate(&mut self, radians: f32);
    fn set_blend(&mut self, mode: BlendMode);

    fn fill_circle(&mut self, center: Vec2, radius: f32, color: Rgba);
    /// Axis-aligned rectangle with `min` as its top-left corner
    fn fill_rect(&mut self, min: Vec2, size: Vec2, color: Rgba);
    /// Convex or star-shaped polygon, fanned from its first point's centroid
    fn fill_polygon(&mut self, points: &[Vec2], color: Rgba);
    fn line(&mut self, from: Vec2, to: Vec2, width: f32, color: Rgba);
}

/// Convert a 0..=255 color plus 0..=255 alpha into a linear [`Rgba`]
#[inline]
pub fn rgba_from_bytes(color: [f32; 3], alpha: f32) -> Rgba {
    [
        (color[0] / 255.0).clamp(0.0, 1.0),
        (color[1] / 255.0).clamp(0.0, 1.0),
        (color[2] / 255.0).clamp(0.0, 1.0),
        (alpha / 255.0).clamp(0.0, 1.0),
    ]
}
