//! Per-frame inputs and outputs of scene rendering.
//!
//! [`FrameContext`] carries everything a frame depends on, so traversal
//! needs no global state. [`FramePlan`] is what comes out: the ordered draw
//! commands of the shadow-depth pass followed by the shaded pass.

use std::fmt;
use std::str::FromStr;

use cgmath::{Matrix4, Point3};

use crate::error::{Error, Result};
use crate::gfx::camera::Camera;
use crate::gfx::geometry::Winding;
use crate::gfx::rendering::{MeshId, TextureId};
use crate::gfx::resources::{Light, MaterialId};
use crate::gfx::shadow::LightSpace;

use super::node::NodeId;

/// Capability flags selecting which demo features a frame uses.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RenderFeatures {
    pub textured: bool,
    pub lit: bool,
    pub shadowed: bool,
}

impl RenderFeatures {
    pub const ALL: Self = Self {
        textured: true,
        lit: true,
        shadowed: true,
    };

    pub const NONE: Self = Self {
        textured: false,
        lit: false,
        shadowed: false,
    };

    /// Parses a comma separated feature list such as `"textured,lit"`.
    ///
    /// `"all"` and `"none"` are accepted as shorthands; whitespace and case
    /// are ignored. Unknown names fail with [`Error::Config`].
    pub fn parse(list: &str) -> Result<Self> {
        let mut features = Self::NONE;
        for name in list.split(',').map(str::trim).filter(|name| !name.is_empty()) {
            match name.to_ascii_lowercase().as_str() {
                "all" => features = Self::ALL,
                "none" => {}
                "textured" | "texture" => features.textured = true,
                "lit" | "lighting" => features.lit = true,
                "shadowed" | "shadows" => features.shadowed = true,
                other => {
                    return Err(Error::Config {
                        key: "features".to_string(),
                        reason: format!(
                            "unknown feature `{}` (expected textured, lit, shadowed, all or none)",
                            other
                        ),
                    })
                }
            }
        }
        Ok(features)
    }
}

impl Default for RenderFeatures {
    fn default() -> Self {
        Self::ALL
    }
}

impl FromStr for RenderFeatures {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        Self::parse(s)
    }
}

impl fmt::Display for RenderFeatures {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let names: Vec<&str> = [
            (self.textured, "textured"),
            (self.lit, "lit"),
            (self.shadowed, "shadowed"),
        ]
        .into_iter()
        .filter_map(|(on, name)| on.then_some(name))
        .collect();

        if names.is_empty() {
            write!(f, "none")
        } else {
            write!(f, "{}", names.join(","))
        }
    }
}

/// Everything one frame of the scene depends on.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FrameContext {
    /// Seconds since the demo started
    pub elapsed: f32,
    pub camera: Camera,
    pub light: Light,
    /// Framebuffer size in pixels
    pub viewport: (u32, u32),
    pub features: RenderFeatures,
}

impl FrameContext {
    pub fn new(elapsed: f32, viewport: (u32, u32)) -> Self {
        Self {
            elapsed,
            camera: Camera::default(),
            light: Light::default(),
            viewport,
            features: RenderFeatures::default(),
        }
    }

    pub fn with_features(mut self, features: RenderFeatures) -> Self {
        self.features = features;
        self
    }

    /// Width over height. A collapsed viewport reports 1.
    pub fn aspect(&self) -> f32 {
        match self.viewport {
            (0, _) | (_, 0) => 1.0,
            (width, height) => width as f32 / height as f32,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Pass {
    /// Depth-only render from the light into the shadow map
    ShadowDepth,
    /// Final render from the camera
    Shaded,
}

/// Matrices bound for one draw, all in OpenGL clip convention.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MatrixSet {
    pub model: Matrix4<f32>,
    pub view: Matrix4<f32>,
    pub projection: Matrix4<f32>,
    /// Inverse-transpose of `model`; shaded pass only
    pub normal: Option<Matrix4<f32>>,
    /// Model to shadow-map texture space; shaded pass with shadows only
    pub shadow: Option<Matrix4<f32>>,
}

impl MatrixSet {
    pub fn clip(&self) -> Matrix4<f32> {
        self.projection * self.view * self.model
    }
}

/// One draw of one node in one pass.
#[derive(Debug, Clone, PartialEq)]
pub struct DrawCommand {
    pub pass: Pass,
    pub node: NodeId,
    pub mesh: MeshId,
    pub material: Option<MaterialId>,
    pub texture: Option<TextureId>,
    pub lit: bool,
    pub winding: Winding,
    pub matrices: MatrixSet,
}

/// Ordered output of one frame.
#[derive(Debug, Clone, PartialEq)]
pub struct FramePlan {
    pub elapsed: f32,
    pub eye: Point3<f32>,
    pub light: Light,
    pub features: RenderFeatures,
    /// Present when the frame renders shadows
    pub light_space: Option<LightSpace>,
    pub shadow_pass: Vec<DrawCommand>,
    pub shaded_pass: Vec<DrawCommand>,
}

impl FramePlan {
    /// All commands in submission order.
    pub fn commands(&self) -> impl Iterator<Item = &DrawCommand> {
        self.shadow_pass.iter().chain(self.shaded_pass.iter())
    }

    pub fn len(&self) -> usize {
        self.shadow_pass.len() + self.shaded_pass.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_feature_lists_parse() {
        assert_eq!(RenderFeatures::parse("all").unwrap(), RenderFeatures::ALL);
        assert_eq!(RenderFeatures::parse("none").unwrap(), RenderFeatures::NONE);
        assert_eq!(RenderFeatures::parse("").unwrap(), RenderFeatures::NONE);
        assert_eq!(
            "Textured, lit".parse::<RenderFeatures>().unwrap(),
            RenderFeatures {
                textured: true,
                lit: true,
                shadowed: false
            }
        );
    }

    #[test]
    fn test_unknown_feature_is_a_config_error() {
        match RenderFeatures::parse("lit,bloom") {
            Err(Error::Config { reason, .. }) => assert!(reason.contains("bloom")),
            other => panic!("expected config error, got {:?}", other),
        }
    }

    #[test]
    fn test_features_display_round_trips() {
        for features in [
            RenderFeatures::ALL,
            RenderFeatures::NONE,
            RenderFeatures {
                textured: false,
                lit: true,
                shadowed: true,
            },
        ] {
            assert_eq!(features.to_string().parse::<RenderFeatures>().unwrap(), features);
        }
        assert_eq!(RenderFeatures::ALL.to_string(), "textured,lit,shadowed");
    }

    #[test]
    fn test_aspect_handles_collapsed_viewport() {
        assert_eq!(FrameContext::new(0.0, (800, 400)).aspect(), 2.0);
        assert_eq!(FrameContext::new(0.0, (800, 0)).aspect(), 1.0);
    }
}
