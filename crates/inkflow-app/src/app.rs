//! Core application state and lifecycle.

use inkflow_core::config::{InkConfig, ToolConfig};
use inkflow_core::note::Note;
use inkflow_core::page::PageLayout;
use inkflow_core::stroke::{Rgba8, Stroke};
use inkflow_core::StrokeInputController;
use inkflow_render::{InkSurface, StrokeGeometryBuilder, SurfaceError, TessellationJob, TessellationWorker};
use kurbo::Point;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Instant;
use winit::application::ApplicationHandler;
use winit::dpi::{LogicalSize, PhysicalPosition};
use winit::event::{ElementState, KeyEvent, MouseButton, TouchPhase, WindowEvent};
use winit::event_loop::{ActiveEventLoop, ControlFlow, EventLoop};
use winit::keyboard::{Key, ModifiersState, NamedKey};
use winit::window::{Window, WindowId};

/// The application: window, GPU surface, stroke pipeline, note document.
pub struct App {
    window: Option<Arc<Window>>,
    surface: Option<InkSurface>,
    controller: StrokeInputController,
    worker: TessellationWorker,
    note: Note,
    note_path: Option<PathBuf>,
    dirty: bool,
    start: Instant,
    cursor: Point,
    mouse_down: bool,
    modifiers: ModifiersState,
}

impl App {
    /// Build the app and run the event loop until the window closes.
    pub fn run() -> Result<(), winit::error::EventLoopError> {
        let event_loop = EventLoop::new()?;
        event_loop.set_control_flow(ControlFlow::Wait);

        let mut app = Self::new();
        event_loop.run_app(&mut app)
    }

    fn new() -> Self {
        let note_path = std::env::args().nth(1).map(PathBuf::from);
        let note = match &note_path {
            Some(path) => Note::load(path).unwrap_or_else(|err| {
                log::warn!("could not load {}: {err}, starting empty", path.display());
                Note::default()
            }),
            None => Note::default(),
        };

        let mut controller =
            StrokeInputController::new(InkConfig::default(), PageLayout::infinite());
        // White ink reads best on the dark canvas.
        controller.set_tool(ToolConfig::pen(3.0, Rgba8::white()));

        Self {
            window: None,
            surface: None,
            controller,
            worker: TessellationWorker::spawn(),
            note,
            note_path,
            dirty: false,
            start: Instant::now(),
            cursor: Point::ZERO,
            mouse_down: false,
            modifiers: ModifiersState::empty(),
        }
    }

    /// Milliseconds since app start; the monotonic clock every sample uses.
    fn now_ms(&self) -> u64 {
        self.start.elapsed().as_millis() as u64
    }

    /// Color the given stroke style renders with. Erasers paint in the
    /// background color.
    fn render_color(&self, color: Rgba8, is_eraser: bool) -> [f32; 4] {
        if is_eraser {
            let bg = self
                .surface
                .as_ref()
                .map(|s| s.background)
                .unwrap_or(wgpu::Color::BLACK);
            [bg.r as f32, bg.g as f32, bg.b as f32, 1.0]
        } else {
            color.to_f32_array()
        }
    }

    fn request_redraw(&self) {
        if let Some(window) = &self.window {
            window.request_redraw();
        }
    }

    fn pointer_down(&mut self, pos: Point, pressure: f64) {
        if self.controller.pointer_down(pos, self.now_ms(), pressure) {
            self.submit_active();
            self.request_redraw();
        }
    }

    fn pointer_move(&mut self, pos: Point, pressure: f64) {
        if !self.controller.is_drawing() {
            return;
        }
        if self.controller.pointer_move(pos, self.now_ms(), pressure) {
            self.submit_active();
        }
        // Phantom tracks the predictor even when the raw sample was
        // distance-filtered.
        self.request_redraw();
    }

    fn pointer_up(&mut self, pos: Point) {
        if let Some(stroke) = self.controller.pointer_up(pos, self.now_ms()) {
            self.commit(stroke);
        }
    }

    fn cancel_stroke(&mut self) {
        self.controller.cancel();
        if let Some(surface) = &mut self.surface {
            surface.clear_active();
        }
        self.request_redraw();
    }

    /// Ship the current raw buffer to the tessellation worker.
    fn submit_active(&mut self) {
        let tool = self.controller.tool();
        self.worker.submit(TessellationJob {
            generation: self.controller.generation(),
            samples: self.controller.raw_samples().to_vec(),
            width: tool.width,
            color: self.render_color(tool.color, tool.is_eraser()),
        });
    }

    /// Fold a committed stroke into the static layer and the note model.
    fn commit(&mut self, stroke: Stroke) {
        let color = self.render_color(stroke.color, stroke.is_eraser);
        if let Some(surface) = &mut self.surface {
            let builder = StrokeGeometryBuilder::new(stroke.width, color);
            surface.append_static(&builder.build_ribbon(&stroke.points));
            surface.clear_active();
        }

        self.note.add_stroke(stroke);
        self.dirty = true;
        log::debug!("content modified, {} strokes total", self.note.stroke_count());
        self.request_redraw();
    }

    /// Rebuild the static layer from the note, e.g. after loading.
    fn rebuild_static(&mut self) {
        let Some(surface) = &mut self.surface else {
            return;
        };
        surface.clear_all();
        for page in &self.note.pages {
            for stroke in &page.strokes {
                let color = if stroke.is_eraser {
                    let bg = surface.background;
                    [bg.r as f32, bg.g as f32, bg.b as f32, 1.0]
                } else {
                    stroke.color.to_f32_array()
                };
                let builder = StrokeGeometryBuilder::new(stroke.width, color);
                surface.append_static(&builder.build_ribbon(&stroke.points));
            }
        }
    }

    fn save(&mut self) {
        let path = self
            .note_path
            .clone()
            .unwrap_or_else(|| PathBuf::from("note.json"));
        match self.note.save(&path) {
            Ok(()) => {
                self.note_path = Some(path);
                self.dirty = false;
            }
            Err(err) => log::error!("save failed: {err}"),
        }
    }

    fn handle_key(&mut self, event: KeyEvent) {
        if event.state != ElementState::Pressed {
            return;
        }
        match event.logical_key {
            Key::Named(NamedKey::Escape) => self.cancel_stroke(),
            Key::Character(ref c) => {
                let white = Rgba8::white();
                match c.as_str() {
                    "s" if self.modifiers.control_key() => self.save(),
                    "1" => self.controller.set_tool(ToolConfig::pen(3.0, white)),
                    "2" => self
                        .controller
                        .set_tool(ToolConfig::highlighter(3.0, Rgba8::new(255, 230, 0, 255))),
                    "3" => self.controller.set_tool(ToolConfig::eraser(20.0)),
                    _ => {}
                }
            }
            _ => {}
        }
    }

    fn redraw(&mut self) {
        // Merge the newest worker geometry, unless it outlived its stroke.
        if let Some(result) = self.worker.poll_latest() {
            if self.controller.is_drawing() && result.generation == self.controller.generation() {
                if let Some(surface) = &mut self.surface {
                    surface.set_active(result.vertices);
                }
            } else {
                log::trace!("discarding stale geometry for generation {}", result.generation);
            }
        }

        // Phantom overlay, rebuilt from the predictor every frame.
        if let (Some(anchor), Some(predicted)) = (
            self.controller.smoothed_point(),
            self.controller.predicted_point(),
        ) {
            let tool = self.controller.tool();
            let color = self.render_color(tool.color, tool.is_eraser());
            let builder = StrokeGeometryBuilder::new(tool.width, color);
            if let Some(surface) = &mut self.surface {
                surface.set_phantom(builder.build_phantom(anchor, predicted));
            }
        }

        if let Some(surface) = &mut self.surface {
            match surface.render() {
                Ok(()) => {}
                Err(SurfaceError::Frame(
                    wgpu::SurfaceError::Lost | wgpu::SurfaceError::Outdated,
                )) => surface.recover(),
                Err(err) => log::error!("render failed: {err}"),
            }
        }

        // Keep the phantom overlay moving at display rate while drawing.
        if self.controller.is_drawing() {
            self.request_redraw();
        }
    }
}

impl Default for App {
    fn default() -> Self {
        Self::new()
    }
}

impl ApplicationHandler for App {
    fn resumed(&mut self, event_loop: &ActiveEventLoop) {
        if self.window.is_some() {
            return;
        }
        let attributes = Window::default_attributes()
            .with_title("InkFlow")
            .with_inner_size(LogicalSize::new(1200.0, 800.0));
        let window = match event_loop.create_window(attributes) {
            Ok(window) => Arc::new(window),
            Err(err) => {
                log::error!("window creation failed: {err}");
                event_loop.exit();
                return;
            }
        };

        match pollster::block_on(InkSurface::new(window.clone())) {
            Ok(surface) => {
                self.surface = Some(surface);
                self.window = Some(window);
                self.rebuild_static();
                self.request_redraw();
            }
            Err(err) => {
                log::error!("gpu setup failed: {err}");
                event_loop.exit();
            }
        }
    }

    fn window_event(
        &mut self,
        event_loop: &ActiveEventLoop,
        _window_id: WindowId,
        event: WindowEvent,
    ) {
        match event {
            WindowEvent::CloseRequested => {
                if self.dirty {
                    self.save();
                }
                event_loop.exit();
            }
            WindowEvent::Resized(size) => {
                if let Some(surface) = &mut self.surface {
                    surface.resize(size.width, size.height);
                }
                self.request_redraw();
            }
            WindowEvent::ModifiersChanged(modifiers) => {
                self.modifiers = modifiers.state();
            }
            WindowEvent::KeyboardInput { event, .. } => self.handle_key(event),
            WindowEvent::CursorMoved { position, .. } => {
                self.cursor = to_point(position);
                if self.mouse_down {
                    self.pointer_move(self.cursor, 1.0);
                }
            }
            WindowEvent::MouseInput {
                state,
                button: MouseButton::Left,
                ..
            } => match state {
                ElementState::Pressed => {
                    self.mouse_down = true;
                    self.pointer_down(self.cursor, 1.0);
                }
                ElementState::Released => {
                    self.mouse_down = false;
                    self.pointer_up(self.cursor);
                }
            },
            WindowEvent::Touch(touch) => {
                let pos = to_point(touch.location);
                let pressure = touch
                    .force
                    .map(|force| force.normalized())
                    .unwrap_or(1.0);
                match touch.phase {
                    TouchPhase::Started => self.pointer_down(pos, pressure),
                    TouchPhase::Moved => self.pointer_move(pos, pressure),
                    TouchPhase::Ended => self.pointer_up(pos),
                    TouchPhase::Cancelled => self.cancel_stroke(),
                }
            }
            WindowEvent::RedrawRequested => self.redraw(),
            _ => {}
        }
    }
}

fn to_point(position: PhysicalPosition<f64>) -> Point {
    Point::new(position.x, position.y)
}
