//! Vertex type for 2D rendering

use bytemuck::{Pod, Zeroable};

/// Simple 2D vertex with position and color
#[repr(C)]
#[derive(Copy, Clone, Debug, PartialEq, Pod, Zeroable)]
pub struct Vertex {
    pub position: [f32; 2],
    pub color: [f32; 4],
}

impl Vertex {
    pub const fn new(x: f32, y: f32, color: [f32; 4]) -> Self {
        Self {
            position: [x, y],
            color,
        }
    }

    /// Buffer layout for uploading canvas batches to a wgpu pipeline
    pub fn desc() -> wgpu::VertexBufferLayout<'static> {
        wgpu::VertexBufferLayout {
            array_stride: std::mem::size_of::<Vertex>() as wgpu::BufferAddress,
            step_mode: wgpu::VertexStepMode::Vertex,
            attributes: &[
                wgpu::VertexAttribute {
                    offset: 0,
                    shader_location: 0,
                    format: wgpu::VertexFormat::Float32x2,
                },
                wgpu::VertexAttribute {
                    offset: std::mem::size_of::<[f32; 2]>() as wgpu::BufferAddress,
                    shader_location: 1,
                    format: wgpu::VertexFormat::Float32x4,
                },
            ],
        }
    }
}

/// Colors used by the effect overlays (0..=255 channels)
pub mod colors {
    pub const WHITE: [f32; 3] = [255.0, 255.0, 255.0];
    pub const EXPLOSION: [f32; 3] = [255.0, 100.0, 100.0];
    pub const MUZZLE: [f32; 3] = [255.0, 255.0, 100.0];
    pub const HIT: [f32; 3] = [255.0, 255.0, 100.0];
    pub const TRAIL: [f32; 3] = [100.0, 150.0, 255.0];
    pub const WAVE_CLEAR: [f32; 3] = [255.0, 255.0, 100.0];
    pub const SELECTION_DIM: [f32; 4] = [0.0, 0.0, 0.0, 200.0 / 255.0];
    pub const SELECTION_CARD: [f32; 4] = [50.0 / 255.0, 50.0 / 255.0, 100.0 / 255.0, 150.0 / 255.0];
    pub const SELECTION_BORDER: [f32; 4] = [1.0, 1.0, 1.0, 1.0];
    pub const PENALTY: [f32; 4] = [1.0, 100.0 / 255.0, 100.0 / 255.0, 1.0];
}
