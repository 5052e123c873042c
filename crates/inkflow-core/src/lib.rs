//! InkFlow Core Library
//!
//! Platform-agnostic ink input pipeline and stroke model: kinetic input
//! prediction, Douglas-Peucker path simplification, the stroke input state
//! machine, and the note/page document model.

pub mod config;
pub mod controller;
pub mod input;
pub mod note;
pub mod page;
pub mod predictor;
pub mod simplify;
pub mod stroke;

pub use config::{InkConfig, PredictorConfig, ToolConfig, ToolKind};
pub use controller::{StrokeInputController, StrokePhase};
pub use input::{PointerEvent, RawSample};
pub use note::{Note, NoteError, NotePage};
pub use page::PageLayout;
pub use predictor::KineticPredictor;
pub use simplify::simplify;
pub use stroke::{Rgba8, Stroke};
