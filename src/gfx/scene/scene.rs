use std::f32::consts::FRAC_PI_2;

use cgmath::Vector3;
use log::debug;

use super::node::{NodeId, Scalar, SceneNode, Step};
use crate::error::{Error, Result};
use crate::gfx::geometry::Winding;
use crate::gfx::rendering::{MeshId, TextureId};
use crate::gfx::resources::MaterialLibrary;

/// Node arena with explicit parent/child links.
///
/// Roots and children keep insertion order, which is also the draw order.
#[derive(Debug, Clone, Default)]
pub struct Scene {
    nodes: Vec<SceneNode>,
    children: Vec<Vec<NodeId>>,
    roots: Vec<NodeId>,
}

/// Uploaded meshes and textures the reference scene is assembled from.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SolarSystemAssets {
    pub pyramid: MeshId,
    pub cube: MeshId,
    pub sphere: MeshId,
    pub torus: MeshId,
    /// Imported model; the `model` node is only added when present.
    pub model: Option<MeshId>,
    pub brick: Option<TextureId>,
    pub earth: Option<TextureId>,
    pub model_texture: Option<TextureId>,
}

impl Scene {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_root(&mut self, node: SceneNode) -> NodeId {
        self.insert(node, None)
    }

    /// Adds `node` as the last child of `parent`.
    pub fn add_child(&mut self, parent: NodeId, node: SceneNode) -> Result<NodeId> {
        if parent.0 >= self.nodes.len() {
            return Err(Error::precondition(
                "parent",
                format!("node {} does not exist ({} nodes)", parent.0, self.nodes.len()),
            ));
        }
        Ok(self.insert(node, Some(parent)))
    }

    fn insert(&mut self, mut node: SceneNode, parent: Option<NodeId>) -> NodeId {
        let id = NodeId(self.nodes.len());
        node.parent = parent;
        self.nodes.push(node);
        self.children.push(Vec::new());
        match parent {
            Some(parent) => self.children[parent.0].push(id),
            None => self.roots.push(id),
        }
        id
    }

    pub fn node(&self, id: NodeId) -> Option<&SceneNode> {
        self.nodes.get(id.0)
    }

    pub fn children(&self, id: NodeId) -> &[NodeId] {
        self.children.get(id.0).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn roots(&self) -> &[NodeId] {
        &self.roots
    }

    pub fn find(&self, name: &str) -> Option<NodeId> {
        self.nodes
            .iter()
            .position(|node| node.name == name)
            .map(NodeId)
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// The demo scene: a spinning pyramid sun, a cube planet orbiting it and
    /// a small cube moon orbiting the planet, with the sphere, torus and
    /// optional imported model hung off the sun's anchor.
    pub fn solar_system(assets: &SolarSystemAssets) -> Self {
        let mut scene = Scene::new();

        let sun = scene.add_root(
            SceneNode::new("sun", assets.pyramid)
                .with_anchor([Step::offset(0.0, 0.0, 0.0)])
                .with_local([Step::rotate_x(Scalar::Time)])
                .with_material(MaterialLibrary::GOLD)
                .with_texture(assets.brick),
        );

        let planet = scene.insert(
            SceneNode::new("planet", assets.cube)
                .with_anchor([Step::translate(
                    Scalar::Sin(4.0),
                    Scalar::Const(0.0),
                    Scalar::Cos(4.0),
                )])
                .with_local([Step::rotate_y(Scalar::Time), Step::scale(0.75)])
                .with_material(MaterialLibrary::SILVER)
                .with_winding(Winding::Clockwise),
            Some(sun),
        );

        scene.insert(
            SceneNode::new("moon", assets.cube)
                .with_anchor([Step::translate(
                    Scalar::Const(0.0),
                    Scalar::Sin(2.0),
                    Scalar::Cos(2.0),
                )])
                .with_local([Step::rotate_z(Scalar::Time), Step::scale(0.25)])
                .with_material(MaterialLibrary::BRONZE)
                .with_winding(Winding::Clockwise),
            Some(planet),
        );

        scene.insert(
            SceneNode::new("sphere", assets.sphere)
                .with_anchor([Step::offset(-2.0, 0.0, 0.0)])
                .with_local([Step::scale(1.0)])
                .with_material(MaterialLibrary::SILVER)
                .with_texture(assets.earth),
            Some(sun),
        );

        scene.insert(
            SceneNode::new("torus", assets.torus)
                .with_anchor([Step::offset(2.0, 0.0, 0.0)])
                .with_local([Step::scale(2.0), Step::rotate_x(Scalar::Const(FRAC_PI_2))])
                .with_material(MaterialLibrary::GOLD)
                .with_texture(assets.brick),
            Some(sun),
        );

        if let Some(model) = assets.model {
            scene.insert(
                SceneNode::new("model", model)
                    .with_anchor([Step::translate(
                        Scalar::Cos(4.0),
                        Scalar::Sin(4.0),
                        Scalar::Cos(4.0),
                    )])
                    .with_local([
                        Step::rotate(Vector3::new(1.0, 1.0, 0.0), Scalar::Time),
                        Step::scale(4.0),
                    ])
                    .with_material(MaterialLibrary::SILVER)
                    .with_texture(assets.model_texture),
                Some(sun),
            );
        }

        debug!("Built solar system scene with {} nodes", scene.len());
        scene
    }
}

/// Asset handles for tests that never touch a backend.
#[cfg(test)]
pub(crate) fn test_assets(model: bool) -> SolarSystemAssets {
    SolarSystemAssets {
        pyramid: MeshId(0),
        cube: MeshId(1),
        sphere: MeshId(2),
        torus: MeshId(3),
        model: model.then_some(MeshId(4)),
        brick: Some(TextureId(0)),
        earth: Some(TextureId(1)),
        model_texture: None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_children_keep_insertion_order() {
        let mut scene = Scene::new();
        let root = scene.add_root(SceneNode::new("root", MeshId(0)));
        let a = scene.add_child(root, SceneNode::new("a", MeshId(0))).unwrap();
        let b = scene.add_child(root, SceneNode::new("b", MeshId(0))).unwrap();
        assert_eq!(scene.children(root), &[a, b]);
        assert_eq!(scene.node(b).unwrap().parent, Some(root));
        assert!(scene.children(b).is_empty());
    }

    #[test]
    fn test_unknown_parent_is_rejected() {
        let mut scene = Scene::new();
        assert!(matches!(
            scene.add_child(NodeId(3), SceneNode::new("orphan", MeshId(0))),
            Err(Error::Precondition { name: "parent", .. })
        ));
        assert!(scene.is_empty());
    }

    #[test]
    fn test_solar_system_hierarchy() {
        let scene = Scene::solar_system(&test_assets(false));
        assert_eq!(scene.len(), 5);
        assert!(scene.find("model").is_none());

        let sun = scene.find("sun").unwrap();
        let planet = scene.find("planet").unwrap();
        let moon = scene.find("moon").unwrap();
        assert_eq!(scene.roots(), &[sun]);
        assert_eq!(scene.node(moon).unwrap().parent, Some(planet));
        assert_eq!(scene.node(planet).unwrap().winding, Winding::Clockwise);
        assert_eq!(scene.node(sun).unwrap().texture, Some(TextureId(0)));
        assert_eq!(scene.node(planet).unwrap().texture, None);
    }

    #[test]
    fn test_imported_model_is_optional() {
        let scene = Scene::solar_system(&test_assets(true));
        let model = scene.find("model").unwrap();
        assert_eq!(scene.len(), 6);
        assert_eq!(scene.node(model).unwrap().mesh, MeshId(4));
        assert_eq!(scene.node(model).unwrap().parent, scene.find("sun"));
    }
}
