//! InkFlow application shell.
//!
//! Wires raw window input through the core stroke pipeline into the layered
//! ink surface.

pub mod app;

pub use app::App;
