//! Tessellating draw context
//!
//! Collects draw calls into triangle batches, one batch per run of calls with
//! the same blend mode, ready to upload with [`Vertex::desc`].

use glam::{Affine2, Vec2};

use super::shapes;
use super::vertex::Vertex;
use super::{BlendMode, DrawContext, Rgba};

/// A run of triangles sharing one blend mode
#[derive(Debug, Clone, PartialEq)]
pub struct DrawBatch {
    pub blend: BlendMode,
    pub vertices: Vec<Vertex>,
}

#[derive(Debug, Clone, Copy)]
struct CanvasState {
    transform: Affine2,
    blend: BlendMode,
}

impl Default for CanvasState {
    fn default() -> Self {
        Self {
            transform: Affine2::IDENTITY,
            blend: BlendMode::Alpha,
        }
    }
}

/// [`DrawContext`] that produces GPU vertex batches
#[derive(Debug, Default)]
pub struct VertexCanvas {
    state: CanvasState,
    stack: Vec<CanvasState>,
    batches: Vec<DrawBatch>,
}

impl VertexCanvas {
    pub fn new() -> Self {
        Self::default()
    }

    /// Batches recorded since the last [`VertexCanvas::clear`]
    pub fn batches(&self) -> &[DrawBatch] {
        &self.batches
    }

    /// Total vertex count across all batches
    pub fn vertex_count(&self) -> usize {
        self.batches.iter().map(|b| b.vertices.len()).sum()
    }

    /// Current transform stack depth (0 when every push was popped)
    pub fn depth(&self) -> usize {
        self.stack.len()
    }

    /// Current transform (local → screen)
    pub fn transform(&self) -> Affine2 {
        self.state.transform
    }

    /// Start a new frame; the transform stack should already be balanced
    pub fn clear(&mut self) {
        if !self.stack.is_empty() {
            log::warn!("VertexCanvas cleared with {} unbalanced push(es)", self.stack.len());
        }
        self.state = CanvasState::default();
        self.stack.clear();
        self.batches.clear();
    }

    fn emit(&mut self, mut vertices: Vec<Vertex>) {
        if vertices.is_empty() {
            return;
        }
        let transform = self.state.transform;
        for v in vertices.iter_mut() {
            v.position = transform.transform_point2(Vec2::from(v.position)).to_array();
        }
        match self.batches.last_mut() {
            Some(batch) if batch.blend == self.state.blend => batch.vertices.extend(vertices),
            _ => self.batches.push(DrawBatch {
                blend: self.state.blend,
                vertices,
            }),
        }
    }

    /// Approximate uniform scale of the current transform (for circle detail)
    fn scale_factor(&self) -> f32 {
        self.state.transform.matrix2.x_axis.length()
    }
}

impl DrawContext for VertexCanvas {
    fn push(&mut self) {
        self.stack.push(self.state);
    }

    fn pop(&mut self) {
        match self.stack.pop() {
            Some(state) => self.state = state,
            None => log::warn!("VertexCanvas::pop without matching push"),
        }
    }

    fn translate(&mut self, offset: Vec2) {
        self.state.transform = self.state.transform * Affine2::from_translation(offset);
    }

    fn scale(&mut self, factor: f32) {
        self.state.transform = self.state.transform * Affine2::from_scale(Vec2::splat(factor));
    }

    fn rotate(&mut self, radians: f32) {
        self.state.transform = self.state.transform * Affine2::from_angle(radians);
    }

    fn set_blend(&mut self, mode: BlendMode) {
        self.state.blend = mode;
    }

    fn fill_circle(&mut self, center: Vec2, radius: f32, color: Rgba) {
        if radius <= 0.0 {
            return;
        }
        let segments = shapes::circle_segments(radius * self.scale_factor());
        self.emit(shapes::circle(center, radius, color, segments));
    }

    fn fill_rect(&mut self, min: Vec2, size: Vec2, color: Rgba) {
        self.emit(shapes::rect(min, size, color));
    }

    fn fill_polygon(&mut self, points: &[Vec2], color: Rgba) {
        self.emit(shapes::polygon(points, color));
    }

    fn line(&mut self, from: Vec2, to: Vec2, width: f32, color: Rgba) {
        self.emit(shapes::line(from, to, width, color));
    }
}
