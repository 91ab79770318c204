//! CPU-side rendering resources
//!
//! Materials and the scene light. GPU textures live in
//! [`texture_resource`].

pub mod light;
pub mod material;
pub mod texture_resource;

// Re-export main types
pub use light::Light;
pub use material::{Material, MaterialId, MaterialLibrary};
pub use texture_resource::TextureResource;
