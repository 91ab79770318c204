//! Core rendering functionality
//!
//! The scene code only ever talks to a [`RenderBackend`]. [`RenderEngine`]
//! is the wgpu implementation; [`RecordingBackend`] keeps everything on the
//! CPU and records what it was asked to draw.

use std::path::Path;

use crate::error::Result;
use crate::gfx::geometry::Mesh;
use crate::gfx::resources::MaterialLibrary;
use crate::gfx::scene::FramePlan;

pub mod gpu_mesh;
pub mod pipeline_manager;
pub mod recording;
pub mod render_engine;
pub mod vertex;

// Re-export main types
pub use gpu_mesh::{DrawGpuMesh, GpuMesh};
pub use pipeline_manager::{PipelineConfig, PipelineManager};
pub use recording::RecordingBackend;
pub use render_engine::RenderEngine;
pub use vertex::Vertex3D;

/// Handle to a mesh uploaded through [`RenderBackend::upload_mesh`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct MeshId(pub usize);

/// Handle to a texture loaded through [`RenderBackend::load_texture`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TextureId(pub usize);

/// What the scene needs from a graphics API.
pub trait RenderBackend {
    /// Validates and uploads a mesh, returning a handle for draw commands.
    fn upload_mesh(&mut self, mesh: &Mesh) -> Result<MeshId>;

    /// Decodes and uploads an image file.
    fn load_texture(&mut self, path: &Path) -> Result<TextureId>;

    /// Executes one frame: every command of the depth pass, then every
    /// command of the shaded pass, in list order.
    fn submit(&mut self, plan: &FramePlan, materials: &MaterialLibrary) -> Result<()>;
}
