pub mod camera;

// Re-export main types
pub use camera::{Camera, OPENGL_TO_WGPU_MATRIX};
