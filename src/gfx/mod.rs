//! # Graphics Module
//!
//! Everything between mesh data and pixels.
//!
//! ## Architecture Overview
//!
//! - **Geometry** ([`geometry`]) - procedural sphere, torus, cube and pyramid
//!   meshes plus the OBJ importer
//! - **Transform Stack** ([`transform_stack`]) - scoped matrix stack used by
//!   scene traversal
//! - **Scene** ([`scene`]) - node hierarchy, frame context and the traversal
//!   producing draw commands
//! - **Shadows** ([`shadow`]) - light-space matrices and two-pass frame
//!   planning
//! - **Rendering** ([`rendering`]) - the [`RenderBackend`] trait and its wgpu
//!   implementation
//! - **Resources** ([`resources`]) - materials, the light and GPU textures
//!
//! Geometry, scene and shadow code never touch the GPU, so they run and test
//! without an adapter.
//!
//! [`RenderBackend`]: rendering::RenderBackend

pub mod camera;
pub mod geometry;
pub mod rendering;
pub mod resources;
pub mod scene;
pub mod shadow;
pub mod transform_stack;

// Re-export commonly used types
pub use camera::Camera;
pub use rendering::render_engine::RenderEngine;
pub use shadow::ShadowPass;
pub use transform_stack::TransformStack;
