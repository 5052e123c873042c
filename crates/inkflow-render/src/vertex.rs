//! GPU-facing vertex format.

use kurbo::Point;

/// One vertex of a stroke ribbon: position plus premixed RGBA.
///
/// Derived data only; regenerated from the stroke model on demand, never
/// persisted.
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, bytemuck::Pod, bytemuck::Zeroable)]
pub struct Vertex {
    pub x: f32,
    pub y: f32,
    pub r: f32,
    pub g: f32,
    pub b: f32,
    pub a: f32,
}

impl Vertex {
    const ATTRIBUTES: [wgpu::VertexAttribute; 2] =
        wgpu::vertex_attr_array![0 => Float32x2, 1 => Float32x4];

    pub fn new(pos: Point, color: [f32; 4]) -> Self {
        Self {
            x: pos.x as f32,
            y: pos.y as f32,
            r: color[0],
            g: color[1],
            b: color[2],
            a: color[3],
        }
    }

    pub fn with_alpha(pos: Point, color: [f32; 4], alpha: f32) -> Self {
        Self::new(pos, [color[0], color[1], color[2], alpha])
    }

    pub fn layout() -> wgpu::VertexBufferLayout<'static> {
        wgpu::VertexBufferLayout {
            array_stride: std::mem::size_of::<Self>() as wgpu::BufferAddress,
            step_mode: wgpu::VertexStepMode::Vertex,
            attributes: &Self::ATTRIBUTES,
        }
    }
}
