//! Layered wgpu ink surface.
//!
//! Owns the GPU surface and three vertex buffers with distinct upload
//! policies:
//!
//! * **Static**: committed ink; grows when a stroke commits, uploaded only
//!   then, never per frame.
//! * **Active**: the in-progress stroke; replaced wholesale as samples
//!   arrive.
//! * **Phantom**: the prediction overlay; rebuilt every frame and
//!   discarded after each draw.
//!
//! Draw order is static, active, phantom, back to front, with source-over
//! alpha blending so phantom ink reads as a translucent preview.

use crate::vertex::Vertex;
use std::sync::Arc;
use thiserror::Error;
use winit::window::Window;

/// Errors from surface setup and per-frame rendering.
#[derive(Debug, Error)]
pub enum SurfaceError {
    #[error("failed to create surface: {0}")]
    CreateSurface(#[from] wgpu::CreateSurfaceError),
    #[error("no compatible graphics adapter")]
    NoAdapter,
    #[error("failed to acquire device: {0}")]
    RequestDevice(#[from] wgpu::RequestDeviceError),
    #[error("failed to acquire frame: {0}")]
    Frame(#[from] wgpu::SurfaceError),
}

/// The three logical geometry layers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LayerUsage {
    Static,
    Active,
    Phantom,
}

/// One layer's CPU mirror plus GPU buffer.
struct LayerBuffer {
    usage: LayerUsage,
    vertices: Vec<Vertex>,
    buffer: wgpu::Buffer,
    /// Buffer capacity in vertices.
    capacity: usize,
    /// Vertex range already uploaded; re-upload starts here.
    uploaded: usize,
}

/// Initial per-layer buffer capacity in vertices.
const INITIAL_CAPACITY: usize = 4096;

impl LayerBuffer {
    fn new(device: &wgpu::Device, usage: LayerUsage) -> Self {
        Self {
            usage,
            vertices: Vec::new(),
            buffer: Self::allocate(device, usage, INITIAL_CAPACITY),
            capacity: INITIAL_CAPACITY,
            uploaded: 0,
        }
    }

    fn allocate(device: &wgpu::Device, usage: LayerUsage, capacity: usize) -> wgpu::Buffer {
        device.create_buffer(&wgpu::BufferDescriptor {
            label: Some(match usage {
                LayerUsage::Static => "static ink",
                LayerUsage::Active => "active stroke",
                LayerUsage::Phantom => "phantom ink",
            }),
            size: (capacity * std::mem::size_of::<Vertex>()) as u64,
            usage: wgpu::BufferUsages::VERTEX | wgpu::BufferUsages::COPY_DST,
            mapped_at_creation: false,
        })
    }

    /// Append vertices, keeping `uploaded` as the re-upload watermark.
    fn append(&mut self, vertices: &[Vertex]) {
        bridge_extend(&mut self.vertices, vertices);
    }

    /// Replace the layer's content entirely.
    fn replace(&mut self, vertices: Vec<Vertex>) {
        self.vertices = vertices;
        self.uploaded = 0;
    }

    fn clear(&mut self) {
        self.vertices.clear();
        self.uploaded = 0;
    }

    /// Push un-uploaded vertices to the GPU, growing the buffer when needed.
    fn upload(&mut self, device: &wgpu::Device, queue: &wgpu::Queue) {
        if self.uploaded >= self.vertices.len() {
            return;
        }
        if self.vertices.len() > self.capacity {
            let mut capacity = self.capacity.max(1);
            while capacity < self.vertices.len() {
                capacity *= 2;
            }
            log::debug!("{:?} layer grows to {capacity} vertices", self.usage);
            self.buffer = Self::allocate(device, self.usage, capacity);
            self.capacity = capacity;
            self.uploaded = 0;
        }
        let offset = (self.uploaded * std::mem::size_of::<Vertex>()) as u64;
        queue.write_buffer(
            &self.buffer,
            offset,
            bytemuck::cast_slice(&self.vertices[self.uploaded..]),
        );
        self.uploaded = self.vertices.len();
    }

    fn draw(&self, pass: &mut wgpu::RenderPass<'_>) {
        let count = self.vertices.len();
        if count < 3 {
            return;
        }
        let bytes = (count * std::mem::size_of::<Vertex>()) as u64;
        pass.set_vertex_buffer(0, self.buffer.slice(..bytes));
        pass.draw(0..count as u32, 0..1);
    }
}

/// Join two strips with two zero-area triangles so separate strokes in one
/// buffer never connect visually.
fn bridge_extend(vertices: &mut Vec<Vertex>, strip: &[Vertex]) {
    if strip.is_empty() {
        return;
    }
    if let (Some(last), Some(first)) = (vertices.last().copied(), strip.first()) {
        vertices.push(last);
        vertices.push(*first);
    }
    vertices.extend_from_slice(strip);
}

/// Column-major orthographic projection mapping `(0,0)..(w,h)` with the
/// origin top-left onto clip space.
fn orthographic(width: f32, height: f32) -> [[f32; 4]; 4] {
    [
        [2.0 / width, 0.0, 0.0, 0.0],
        [0.0, -2.0 / height, 0.0, 0.0],
        [0.0, 0.0, 1.0, 0.0],
        [-1.0, 1.0, 0.0, 1.0],
    ]
}

/// The window-backed ink renderer.
pub struct InkSurface {
    surface: wgpu::Surface<'static>,
    device: wgpu::Device,
    queue: wgpu::Queue,
    config: wgpu::SurfaceConfiguration,
    pipeline: wgpu::RenderPipeline,
    projection_buffer: wgpu::Buffer,
    projection_bind_group: wgpu::BindGroup,
    static_layer: LayerBuffer,
    active_layer: LayerBuffer,
    phantom_layer: LayerBuffer,
    pub background: wgpu::Color,
}

impl InkSurface {
    pub async fn new(window: Arc<Window>) -> Result<Self, SurfaceError> {
        let size = window.inner_size();

        let instance = wgpu::Instance::new(wgpu::InstanceDescriptor {
            backends: wgpu::Backends::all(),
            ..Default::default()
        });
        let surface = instance.create_surface(window.clone())?;

        let adapter = instance
            .request_adapter(&wgpu::RequestAdapterOptions {
                power_preference: wgpu::PowerPreference::default(),
                compatible_surface: Some(&surface),
                force_fallback_adapter: false,
            })
            .await
            .ok_or(SurfaceError::NoAdapter)?;
        log::info!("adapter: {}", adapter.get_info().name);

        let (device, queue) = adapter
            .request_device(
                &wgpu::DeviceDescriptor {
                    label: Some("inkflow device"),
                    required_features: wgpu::Features::empty(),
                    required_limits: wgpu::Limits::default(),
                    memory_hints: wgpu::MemoryHints::default(),
                },
                None,
            )
            .await?;

        let surface_caps = surface.get_capabilities(&adapter);
        let surface_format = surface_caps.formats[0];
        let config = wgpu::SurfaceConfiguration {
            usage: wgpu::TextureUsages::RENDER_ATTACHMENT,
            format: surface_format,
            width: size.width.max(1),
            height: size.height.max(1),
            present_mode: wgpu::PresentMode::Fifo,
            alpha_mode: surface_caps.alpha_modes[0],
            view_formats: vec![],
            desired_maximum_frame_latency: 2,
        };
        surface.configure(&device, &config);

        let shader = device.create_shader_module(wgpu::ShaderModuleDescriptor {
            label: Some("ink shader"),
            source: wgpu::ShaderSource::Wgsl(include_str!("shaders/ink.wgsl").into()),
        });

        let projection_buffer = device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("projection"),
            size: std::mem::size_of::<[[f32; 4]; 4]>() as u64,
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
            mapped_at_creation: false,
        });
        queue.write_buffer(
            &projection_buffer,
            0,
            bytemuck::cast_slice(&orthographic(config.width as f32, config.height as f32)),
        );

        let projection_layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("projection layout"),
            entries: &[wgpu::BindGroupLayoutEntry {
                binding: 0,
                visibility: wgpu::ShaderStages::VERTEX,
                ty: wgpu::BindingType::Buffer {
                    ty: wgpu::BufferBindingType::Uniform,
                    has_dynamic_offset: false,
                    min_binding_size: None,
                },
                count: None,
            }],
        });
        let projection_bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("projection bind group"),
            layout: &projection_layout,
            entries: &[wgpu::BindGroupEntry {
                binding: 0,
                resource: projection_buffer.as_entire_binding(),
            }],
        });

        let pipeline_layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
            label: Some("ink pipeline layout"),
            bind_group_layouts: &[&projection_layout],
            push_constant_ranges: &[],
        });
        let pipeline = device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
            label: Some("ink pipeline"),
            layout: Some(&pipeline_layout),
            vertex: wgpu::VertexState {
                module: &shader,
                entry_point: Some("vs_main"),
                buffers: &[Vertex::layout()],
                compilation_options: wgpu::PipelineCompilationOptions::default(),
            },
            fragment: Some(wgpu::FragmentState {
                module: &shader,
                entry_point: Some("fs_main"),
                targets: &[Some(wgpu::ColorTargetState {
                    format: config.format,
                    // Source-over so phantom ink reads as translucent preview.
                    blend: Some(wgpu::BlendState::ALPHA_BLENDING),
                    write_mask: wgpu::ColorWrites::ALL,
                })],
                compilation_options: wgpu::PipelineCompilationOptions::default(),
            }),
            primitive: wgpu::PrimitiveState {
                topology: wgpu::PrimitiveTopology::TriangleStrip,
                strip_index_format: None,
                front_face: wgpu::FrontFace::Ccw,
                cull_mode: None,
                polygon_mode: wgpu::PolygonMode::Fill,
                unclipped_depth: false,
                conservative: false,
            },
            depth_stencil: None,
            multisample: wgpu::MultisampleState {
                count: 1,
                mask: !0,
                alpha_to_coverage_enabled: false,
            },
            multiview: None,
            cache: None,
        });

        Ok(Self {
            surface,
            static_layer: LayerBuffer::new(&device, LayerUsage::Static),
            active_layer: LayerBuffer::new(&device, LayerUsage::Active),
            phantom_layer: LayerBuffer::new(&device, LayerUsage::Phantom),
            device,
            queue,
            config,
            pipeline,
            projection_buffer,
            projection_bind_group,
            background: wgpu::Color {
                r: 0.1,
                g: 0.1,
                b: 0.12,
                a: 1.0,
            },
        })
    }

    pub fn resize(&mut self, width: u32, height: u32) {
        if width == 0 || height == 0 {
            return;
        }
        self.config.width = width;
        self.config.height = height;
        self.surface.configure(&self.device, &self.config);
        self.queue.write_buffer(
            &self.projection_buffer,
            0,
            bytemuck::cast_slice(&orthographic(width as f32, height as f32)),
        );
    }

    /// Fold a committed stroke's geometry into the static layer. The upload
    /// happens on the next frame and covers only the appended range.
    pub fn append_static(&mut self, vertices: &[Vertex]) {
        self.static_layer.append(vertices);
    }

    /// Replace the active layer with the newest tessellation of the
    /// in-progress stroke.
    pub fn set_active(&mut self, vertices: Vec<Vertex>) {
        self.active_layer.replace(vertices);
    }

    pub fn clear_active(&mut self) {
        self.active_layer.clear();
    }

    /// Set this frame's prediction overlay. The layer is discarded after
    /// the draw regardless of whether it changed.
    pub fn set_phantom(&mut self, vertices: Vec<Vertex>) {
        self.phantom_layer.replace(vertices);
    }

    /// Reset all ink, e.g. after loading a note.
    pub fn clear_all(&mut self) {
        self.static_layer.clear();
        self.active_layer.clear();
        self.phantom_layer.clear();
    }

    /// Draw one frame: static, then active, then phantom.
    pub fn render(&mut self) -> Result<(), SurfaceError> {
        self.static_layer.upload(&self.device, &self.queue);
        self.active_layer.upload(&self.device, &self.queue);
        self.phantom_layer.upload(&self.device, &self.queue);

        let frame = self.surface.get_current_texture()?;
        let view = frame
            .texture
            .create_view(&wgpu::TextureViewDescriptor::default());

        let mut encoder = self
            .device
            .create_command_encoder(&wgpu::CommandEncoderDescriptor {
                label: Some("ink encoder"),
            });
        {
            let mut pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
                label: Some("ink pass"),
                color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                    view: &view,
                    resolve_target: None,
                    ops: wgpu::Operations {
                        load: wgpu::LoadOp::Clear(self.background),
                        store: wgpu::StoreOp::Store,
                    },
                })],
                depth_stencil_attachment: None,
                occlusion_query_set: None,
                timestamp_writes: None,
            });

            pass.set_pipeline(&self.pipeline);
            pass.set_bind_group(0, &self.projection_bind_group, &[]);
            self.static_layer.draw(&mut pass);
            self.active_layer.draw(&mut pass);
            self.phantom_layer.draw(&mut pass);
        }

        self.queue.submit(std::iter::once(encoder.finish()));
        frame.present();

        // Phantom geometry is ephemeral by design.
        self.phantom_layer.clear();
        Ok(())
    }

    /// Reconfigure after a lost/outdated swapchain.
    pub fn recover(&mut self) {
        self.surface.configure(&self.device, &self.config);
    }

    pub fn size(&self) -> (u32, u32) {
        (self.config.width, self.config.height)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use kurbo::Point;

    fn v(x: f64) -> Vertex {
        Vertex::new(Point::new(x, 0.0), [1.0, 1.0, 1.0, 1.0])
    }

    #[test]
    fn test_bridge_first_strip_unchanged() {
        let mut buffer = Vec::new();
        bridge_extend(&mut buffer, &[v(0.0), v(1.0), v(2.0)]);
        assert_eq!(buffer.len(), 3);
    }

    #[test]
    fn test_bridge_inserts_degenerates() {
        let mut buffer = Vec::new();
        bridge_extend(&mut buffer, &[v(0.0), v(1.0)]);
        bridge_extend(&mut buffer, &[v(10.0), v(11.0)]);

        // last-of-first and first-of-second are repeated between the strips.
        assert_eq!(buffer.len(), 6);
        assert_eq!(buffer[2], v(1.0));
        assert_eq!(buffer[3], v(10.0));
    }

    #[test]
    fn test_bridge_empty_strip_noop() {
        let mut buffer = vec![v(0.0)];
        bridge_extend(&mut buffer, &[]);
        assert_eq!(buffer.len(), 1);
    }

    #[test]
    fn test_orthographic_corners() {
        let m = orthographic(800.0, 600.0);
        let apply = |x: f32, y: f32| {
            (
                m[0][0] * x + m[1][0] * y + m[3][0],
                m[0][1] * x + m[1][1] * y + m[3][1],
            )
        };

        // Top-left of the viewport is clip (-1, 1), bottom-right (1, -1).
        let close = |(x, y): (f32, f32), (ex, ey): (f32, f32)| {
            (x - ex).abs() < 1e-5 && (y - ey).abs() < 1e-5
        };
        assert!(close(apply(0.0, 0.0), (-1.0, 1.0)));
        assert!(close(apply(800.0, 600.0), (1.0, -1.0)));
        assert!(close(apply(400.0, 300.0), (0.0, 0.0)));
    }
}
