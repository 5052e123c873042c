//! Raw pointer input types.
//!
//! The input source (window shell, tablet driver) delivers positions already
//! mapped into scene coordinates, with monotonic millisecond timestamps.

use kurbo::Point;
use serde::{Deserialize, Serialize};

/// One raw input sample as produced by the device.
///
/// Samples are ephemeral: they live in the controller's per-stroke buffer
/// until the stroke completes and the buffer is replaced by the simplified
/// point set.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RawSample {
    /// Position in scene coordinates.
    pub pos: Point,
    /// Monotonic timestamp in milliseconds.
    pub timestamp_ms: u64,
    /// Contact pressure in `[0, 1]`; 1.0 for devices without pressure.
    pub pressure: f64,
}

impl RawSample {
    pub fn new(pos: Point, timestamp_ms: u64, pressure: f64) -> Self {
        Self {
            pos,
            timestamp_ms,
            pressure: pressure.clamp(0.0, 1.0),
        }
    }
}

/// Pointer event for unified stylus/touch/mouse handling.
///
/// A stroke is delivered as `Down`, zero or more `Move`s, then `Up` or
/// `Cancel` (gesture conflict, palm rejection).
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum PointerEvent {
    Down {
        pos: Point,
        timestamp_ms: u64,
        pressure: f64,
    },
    Move {
        pos: Point,
        timestamp_ms: u64,
        pressure: f64,
    },
    Up {
        pos: Point,
        timestamp_ms: u64,
    },
    Cancel,
}
