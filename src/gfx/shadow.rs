//! Two-pass shadow mapping.
//!
//! The first pass renders every node's depth from the light into the shadow
//! map. The second renders from the camera and carries, per node, the matrix
//! that takes a model-space position to shadow-map texture coordinates:
//!
//! ```text
//! shadow = bias * light_projection * light_view * model
//! ```
//!
//! `bias` remaps clip space `[-1, 1]` to texture space `[0, 1]` on all three
//! axes, so the resulting `z` is directly comparable against stored depth.

use cgmath::{Deg, InnerSpace, Matrix4, Point3, Vector3};
use log::trace;

use crate::gfx::resources::Light;
use crate::gfx::scene::{FrameContext, FramePlan, Scene, SceneRenderer};

/// Clip-to-texture remap: `translate(0.5, 0.5, 0.5) * scale(0.5)`.
pub fn bias_matrix() -> Matrix4<f32> {
    Matrix4::from_translation(Vector3::new(0.5, 0.5, 0.5)) * Matrix4::from_scale(0.5)
}

/// The light's view and projection for one frame.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LightSpace {
    pub view: Matrix4<f32>,
    pub projection: Matrix4<f32>,
}

impl LightSpace {
    pub const FOVY: Deg<f32> = Deg(60.0);
    pub const ZNEAR: f32 = 0.1;
    pub const ZFAR: f32 = 1000.0;

    /// Perspective view from the light towards the world origin.
    pub fn new(light: &Light, aspect: f32) -> Self {
        let target = Point3::new(0.0, 0.0, 0.0);
        // looking straight along Y would make +Y a degenerate up vector
        let direction = target - light.position;
        let up = if direction.cross(Vector3::unit_y()).magnitude2() > 1e-12 {
            Vector3::unit_y()
        } else {
            Vector3::unit_z()
        };

        Self {
            view: Matrix4::look_at_rh(light.position, target, up),
            projection: cgmath::perspective(Self::FOVY, aspect, Self::ZNEAR, Self::ZFAR),
        }
    }

    pub fn view_projection(&self) -> Matrix4<f32> {
        self.projection * self.view
    }

    pub fn shadow_matrix(&self, model: &Matrix4<f32>) -> Matrix4<f32> {
        bias_matrix() * self.view_projection() * model
    }
}

/// Orchestrates one frame: light-space setup, the optional depth pass and
/// the shaded pass.
pub struct ShadowPass;

impl ShadowPass {
    /// Builds the ordered command list for one frame.
    ///
    /// Both passes traverse the same scene at the same time value, so they
    /// list nodes in the same order with identical model matrices. Without
    /// the `shadowed` feature the depth pass is empty and no shadow matrices
    /// are produced.
    pub fn render_frame(scene: &Scene, ctx: &FrameContext) -> FramePlan {
        let light_space = ctx
            .features
            .shadowed
            .then(|| LightSpace::new(&ctx.light, ctx.aspect()));

        let shadow_pass = match &light_space {
            Some(light) => SceneRenderer::depth_commands(scene, ctx.elapsed, light),
            None => Vec::new(),
        };
        let shaded_pass = SceneRenderer::shaded_commands(scene, ctx, light_space.as_ref());

        trace!(
            "Frame at {:.3}s: {} depth draws, {} shaded draws",
            ctx.elapsed,
            shadow_pass.len(),
            shaded_pass.len()
        );

        FramePlan {
            elapsed: ctx.elapsed,
            eye: ctx.camera.eye,
            light: ctx.light,
            features: ctx.features,
            light_space,
            shadow_pass,
            shaded_pass,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::gfx::scene::scene::test_assets;
    use crate::gfx::scene::{Pass, RenderFeatures};
    use cgmath::{SquareMatrix, Vector4};

    fn scene() -> Scene {
        Scene::solar_system(&test_assets(true))
    }

    #[test]
    fn test_bias_maps_clip_corners_to_unit_cube() {
        let bias = bias_matrix();
        assert_eq!(
            bias * Vector4::new(-1.0, -1.0, -1.0, 1.0),
            Vector4::new(0.0, 0.0, 0.0, 1.0)
        );
        assert_eq!(
            bias * Vector4::new(1.0, 1.0, 1.0, 1.0),
            Vector4::new(1.0, 1.0, 1.0, 1.0)
        );
        assert_eq!(
            bias * Vector4::new(0.0, 0.0, 0.0, 1.0),
            Vector4::new(0.5, 0.5, 0.5, 1.0)
        );
    }

    #[test]
    fn test_passes_share_order_and_model_matrices() {
        for t in [0.0, 0.37, 2.5, 11.0] {
            let plan = ShadowPass::render_frame(&scene(), &FrameContext::new(t, (1024, 768)));
            assert_eq!(plan.shadow_pass.len(), 6);
            assert_eq!(plan.shaded_pass.len(), 6);

            for (depth, shaded) in plan.shadow_pass.iter().zip(&plan.shaded_pass) {
                assert_eq!(depth.pass, Pass::ShadowDepth);
                assert_eq!(shaded.pass, Pass::Shaded);
                assert_eq!(depth.node, shaded.node);
                assert_eq!(depth.mesh, shaded.mesh);
                assert_eq!(depth.matrices.model, shaded.matrices.model);
            }
        }
    }

    #[test]
    fn test_depth_pass_uses_light_matrices_only() {
        let ctx = FrameContext::new(1.0, (800, 600));
        let plan = ShadowPass::render_frame(&scene(), &ctx);
        let light = plan.light_space.unwrap();
        assert_eq!(light, LightSpace::new(&ctx.light, ctx.aspect()));

        for command in &plan.shadow_pass {
            assert_eq!(command.matrices.view, light.view);
            assert_eq!(command.matrices.projection, light.projection);
            assert!(command.matrices.normal.is_none());
            assert!(command.matrices.shadow.is_none());
            assert!(command.material.is_none());
            assert!(command.texture.is_none());
        }
    }

    #[test]
    fn test_shaded_pass_carries_shadow_matrix() {
        let ctx = FrameContext::new(0.8, (800, 600));
        let plan = ShadowPass::render_frame(&scene(), &ctx);
        let light = plan.light_space.unwrap();

        for command in &plan.shaded_pass {
            let model = command.matrices.model;
            assert_eq!(
                command.matrices.shadow,
                Some(bias_matrix() * light.projection * light.view * model)
            );
            assert_eq!(command.matrices.view, ctx.camera.view());
            assert!(command.material.is_some());
            assert!(command.lit);
        }
    }

    #[test]
    fn test_light_space_looks_at_origin() {
        let light = Light::default();
        let space = LightSpace::new(&light, 1.0);
        let origin = space.view * Vector4::new(0.0, 0.0, 0.0, 1.0);
        let distance = (light.position - Point3::new(0.0, 0.0, 0.0)).magnitude();
        assert!(origin.x.abs() < 1e-5 && origin.y.abs() < 1e-5);
        assert!((origin.z + distance).abs() < 1e-4);

        // overhead light must still produce a finite view
        let overhead = LightSpace::new(&Light::new(Point3::new(0.0, 5.0, 0.0)), 1.0);
        assert!(overhead.view.invert().is_some());
    }

    #[test]
    fn test_shadows_off_skips_depth_pass() {
        let ctx = FrameContext::new(0.5, (640, 480)).with_features(RenderFeatures {
            textured: true,
            lit: true,
            shadowed: false,
        });
        let plan = ShadowPass::render_frame(&scene(), &ctx);
        assert!(plan.shadow_pass.is_empty());
        assert!(plan.light_space.is_none());
        assert_eq!(plan.shaded_pass.len(), 6);
        assert!(plan.shaded_pass.iter().all(|c| c.matrices.shadow.is_none()));
        assert!(plan.shaded_pass.iter().all(|c| c.matrices.normal.is_some()));
    }

    #[test]
    fn test_texturing_and_lighting_follow_features() {
        let plain = FrameContext::new(0.5, (640, 480)).with_features(RenderFeatures::NONE);
        let plan = ShadowPass::render_frame(&scene(), &plain);
        assert!(plan.shaded_pass.iter().all(|c| c.texture.is_none() && !c.lit));

        let textured = plain.with_features(RenderFeatures::ALL);
        let plan = ShadowPass::render_frame(&scene(), &textured);
        let sun = &plan.shaded_pass[0];
        assert!(sun.texture.is_some());
        assert!(sun.lit);
        assert_eq!(plan.len(), 12);
    }

    #[test]
    fn test_shadow_matrix_of_lit_origin_lands_in_map() {
        let ctx = FrameContext::new(0.0, (800, 800));
        let plan = ShadowPass::render_frame(&scene(), &ctx);
        let sun = &plan.shaded_pass[0];
        let s = sun.matrices.shadow.unwrap() * Vector4::new(0.0, 0.0, 0.0, 1.0);
        let (u, v, depth) = (s.x / s.w, s.y / s.w, s.z / s.w);
        assert!((u - 0.5).abs() < 1e-4 && (v - 0.5).abs() < 1e-4);
        assert!(depth > 0.0 && depth < 1.0);
        assert_eq!(
            sun.matrices.model,
            Matrix4::identity(),
            "sun sits at the origin at t = 0"
        );
    }
}
