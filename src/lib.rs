//! Orrery
//!
//! A small wgpu scene renderer: procedurally tessellated meshes, a
//! transform-stack scene graph and two-pass shadow mapping, drawn as a
//! textured, lit solar system.

pub mod app;
pub mod config;
pub mod error;
pub mod gfx;
pub mod prelude;

// Re-export main types for convenience
pub use app::{load_scene, OrreryApp};
pub use config::DemoConfig;
pub use error::{Error, Result};
