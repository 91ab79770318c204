//! Scene traversal and draw command emission.

use cgmath::{Matrix, Matrix4, SquareMatrix};
use log::{error, warn};

use super::frame::{DrawCommand, FrameContext, MatrixSet, Pass};
use super::node::{NodeId, SceneNode};
use super::scene::Scene;
use crate::gfx::shadow::LightSpace;
use crate::gfx::transform_stack::TransformStack;

/// Walks a [`Scene`] with a [`TransformStack`] and turns nodes into draw
/// commands.
///
/// Every node enters two scoped levels: its anchor is composed on the first
/// and stays visible to the children, its local recipe is composed on the
/// second and popped again before the children are visited.
pub struct SceneRenderer;

impl SceneRenderer {
    /// Visits every node depth-first, roots and children in insertion order,
    /// with the node's world matrix.
    pub fn traverse<F>(scene: &Scene, elapsed: f32, mut visit: F)
    where
        F: FnMut(NodeId, &SceneNode, &Matrix4<f32>),
    {
        let mut stack = TransformStack::new();
        for &root in scene.roots() {
            Self::visit_node(scene, root, elapsed, &mut stack, &mut visit);
        }

        let depth = stack.depth();
        if depth != 1 {
            error!("Transform stack unbalanced after traversal (depth {})", depth);
        }
        debug_assert_eq!(depth, 1, "transform stack unbalanced after traversal");
    }

    fn visit_node<F>(
        scene: &Scene,
        id: NodeId,
        elapsed: f32,
        stack: &mut TransformStack,
        visit: &mut F,
    ) where
        F: FnMut(NodeId, &SceneNode, &Matrix4<f32>),
    {
        let Some(node) = scene.node(id) else {
            error!("Scene references missing node {}", id.0);
            return;
        };

        let mut anchor = stack.scope();
        anchor.compose(node.anchor_matrix(elapsed));
        {
            let mut local = anchor.scope();
            local.compose(node.local_matrix(elapsed));
            visit(id, node, local.top());
        }

        for &child in scene.children(id) {
            Self::visit_node(scene, child, elapsed, &mut anchor, visit);
        }
    }

    /// Depth-only commands rendered from the light.
    pub fn depth_commands(scene: &Scene, elapsed: f32, light: &LightSpace) -> Vec<DrawCommand> {
        let mut commands = Vec::with_capacity(scene.len());
        Self::traverse(scene, elapsed, |id, node, world| {
            commands.push(DrawCommand {
                pass: Pass::ShadowDepth,
                node: id,
                mesh: node.mesh,
                material: None,
                texture: None,
                lit: false,
                winding: node.winding,
                matrices: MatrixSet {
                    model: *world,
                    view: light.view,
                    projection: light.projection,
                    normal: None,
                    shadow: None,
                },
            });
        });
        commands
    }

    /// Camera-view commands. Texturing and lighting follow the context's
    /// features; shadow matrices are attached only when `light` is given.
    pub fn shaded_commands(
        scene: &Scene,
        ctx: &FrameContext,
        light: Option<&LightSpace>,
    ) -> Vec<DrawCommand> {
        let view = ctx.camera.view();
        let projection = ctx.camera.projection(ctx.aspect());
        let features = ctx.features;

        let mut commands = Vec::with_capacity(scene.len());
        Self::traverse(scene, ctx.elapsed, |id, node, world| {
            commands.push(DrawCommand {
                pass: Pass::Shaded,
                node: id,
                mesh: node.mesh,
                material: Some(node.material),
                texture: if features.textured { node.texture } else { None },
                lit: features.lit,
                winding: node.winding,
                matrices: MatrixSet {
                    model: *world,
                    view,
                    projection,
                    normal: Some(normal_matrix(world)),
                    shadow: light.map(|light| light.shadow_matrix(world)),
                },
            });
        });
        commands
    }
}

/// Inverse-transpose of `model`, for transforming normals.
///
/// A singular model matrix has no inverse; identity is used instead.
pub fn normal_matrix(model: &Matrix4<f32>) -> Matrix4<f32> {
    match model.invert() {
        Some(inverse) => inverse.transpose(),
        None => {
            warn!("Singular model matrix, using identity normal matrix");
            Matrix4::identity()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::gfx::rendering::MeshId;
    use crate::gfx::scene::node::Step;
    use crate::gfx::scene::scene::test_assets;
    use cgmath::{Vector3, Vector4};

    fn world_matrices(scene: &Scene, elapsed: f32) -> Vec<(NodeId, Matrix4<f32>)> {
        let mut out = Vec::with_capacity(scene.len());
        SceneRenderer::traverse(scene, elapsed, |id, _, world| out.push((id, *world)));
        out
    }

    fn origin_of(m: &Matrix4<f32>) -> Vector4<f32> {
        m * Vector4::new(0.0, 0.0, 0.0, 1.0)
    }

    fn close(a: Vector4<f32>, b: Vector4<f32>) -> bool {
        (a - b).x.abs() < 1e-5 && (a - b).y.abs() < 1e-5 && (a - b).z.abs() < 1e-5
    }

    #[test]
    fn test_traversal_order_is_depth_first() {
        let scene = Scene::solar_system(&test_assets(true));
        let names: Vec<String> = world_matrices(&scene, 0.0)
            .into_iter()
            .map(|(id, _)| scene.node(id).unwrap().name.clone())
            .collect();
        assert_eq!(names, ["sun", "planet", "moon", "sphere", "torus", "model"]);
    }

    #[test]
    fn test_sun_is_identity_at_time_zero() {
        let scene = Scene::solar_system(&test_assets(false));
        let worlds = world_matrices(&scene, 0.0);
        assert_eq!(worlds[0].1, Matrix4::identity());
    }

    #[test]
    fn test_children_inherit_anchor_but_not_local() {
        let scene = Scene::solar_system(&test_assets(false));
        let worlds = world_matrices(&scene, 0.0);

        // planet sits at (0,0,4), the moon two further out along z
        assert!(close(origin_of(&worlds[1].1), Vector4::new(0.0, 0.0, 4.0, 1.0)));
        assert!(close(origin_of(&worlds[2].1), Vector4::new(0.0, 0.0, 6.0, 1.0)));

        // the moon's scale is 0.25 only, not 0.25 * 0.75
        let unit_x = worlds[2].1 * Vector4::new(1.0, 0.0, 0.0, 0.0);
        assert!((unit_x.x - 0.25).abs() < 1e-6);
    }

    #[test]
    fn test_orbit_follows_time() {
        let scene = Scene::solar_system(&test_assets(false));
        let t = std::f32::consts::FRAC_PI_2;
        let worlds = world_matrices(&scene, t);
        let planet = origin_of(&worlds[1].1);
        assert!(close(planet, Vector4::new(4.0 * t.sin(), 0.0, 4.0 * t.cos(), 1.0)));
    }

    #[test]
    fn test_stack_is_balanced_for_deep_chains() {
        let mut scene = Scene::new();
        let mut parent = scene.add_root(
            SceneNode::new("link0", MeshId(0)).with_anchor([Step::offset(1.0, 0.0, 0.0)]),
        );
        for i in 1..32 {
            let node = SceneNode::new(&format!("link{}", i), MeshId(0))
                .with_anchor([Step::offset(1.0, 0.0, 0.0)])
                .with_local([Step::scale(0.5)]);
            parent = scene.add_child(parent, node).unwrap();
        }

        let worlds = world_matrices(&scene, 0.0);
        assert_eq!(worlds.len(), 32);
        assert!(close(origin_of(&worlds[31].1), Vector4::new(32.0, 0.0, 0.0, 1.0)));
    }

    #[test]
    fn test_normal_matrix_is_inverse_transpose() {
        let model = Matrix4::from_translation(Vector3::new(3.0, -1.0, 2.0))
            * Matrix4::from_nonuniform_scale(2.0, 1.0, 4.0);
        let normal = normal_matrix(&model);
        let n = normal * Vector4::new(1.0, 0.0, 1.0, 0.0);
        assert!(close(n, Vector4::new(0.5, 0.0, 0.25, 0.0)));
    }

    #[test]
    fn test_singular_model_falls_back_to_identity() {
        let flat = Matrix4::from_nonuniform_scale(1.0, 0.0, 1.0);
        assert_eq!(normal_matrix(&flat), Matrix4::identity());
    }
}
