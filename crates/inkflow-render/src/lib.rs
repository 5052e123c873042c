//! InkFlow Render Library
//!
//! Turns stroke point sequences into triangle-strip geometry and draws it
//! through a three-layer wgpu surface: static (committed ink), active
//! (in-progress stroke), phantom (prediction overlay).

mod surface;
mod tessellate;
mod vertex;
mod worker;

pub use surface::{InkSurface, LayerUsage, SurfaceError};
pub use tessellate::StrokeGeometryBuilder;
pub use vertex::Vertex;
pub use worker::{TessellationJob, TessellationResult, TessellationWorker};
