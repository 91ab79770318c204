//! # Orrery Prelude
//!
//! Common imports for building scenes and frames:
//!
//! ```rust
//! use orrery::prelude::*;
//!
//! let sphere = generate_sphere(16).unwrap();
//! assert_eq!(sphere.vertex_count(), 17 * 17);
//! ```

pub use crate::config::DemoConfig;
pub use crate::error::{Error, Result};
pub use crate::gfx::camera::Camera;
pub use crate::gfx::geometry::{
    generate_cube, generate_pyramid, generate_sphere, generate_torus, load_obj, Mesh, Winding,
};
pub use crate::gfx::rendering::{MeshId, RecordingBackend, RenderBackend, TextureId};
pub use crate::gfx::resources::{Light, Material, MaterialId, MaterialLibrary};
pub use crate::gfx::scene::{
    DrawCommand, FrameContext, FramePlan, Pass, RenderFeatures, Scalar, Scene, SceneNode, Step,
};
pub use crate::gfx::shadow::ShadowPass;
pub use crate::gfx::transform_stack::TransformStack;
