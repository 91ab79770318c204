//! # Scene Module
//!
//! The scene graph, the per-frame context and the traversal that turns both
//! into draw commands.
//!
//! ## Key Components
//!
//! - [`Scene`] - node arena with parent/child links and the reference
//!   solar-system builder
//! - [`SceneNode`] - mesh, material, texture and transform recipe of one node
//! - [`FrameContext`] - time, camera, light, viewport and feature flags for
//!   one frame
//! - [`SceneRenderer`] - transform-stack traversal emitting [`DrawCommand`]s
//!
//! ## Usage
//!
//! ```rust
//! use orrery::gfx::rendering::MeshId;
//! use orrery::gfx::scene::{FrameContext, Scene, SolarSystemAssets};
//! use orrery::gfx::shadow::ShadowPass;
//!
//! let assets = SolarSystemAssets {
//!     pyramid: MeshId(0),
//!     cube: MeshId(1),
//!     sphere: MeshId(2),
//!     torus: MeshId(3),
//!     model: None,
//!     brick: None,
//!     earth: None,
//!     model_texture: None,
//! };
//! let scene = Scene::solar_system(&assets);
//! let plan = ShadowPass::render_frame(&scene, &FrameContext::new(0.0, (800, 600)));
//! assert_eq!(plan.shadow_pass.len(), plan.shaded_pass.len());
//! ```

pub mod frame;
pub mod node;
pub mod renderer;
pub mod scene;

// Re-export main types
pub use frame::{DrawCommand, FrameContext, FramePlan, MatrixSet, Pass, RenderFeatures};
pub use node::{NodeId, Scalar, SceneNode, Step};
pub use renderer::{normal_matrix, SceneRenderer};
pub use scene::{Scene, SolarSystemAssets};
