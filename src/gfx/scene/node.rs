//! Scene nodes and their transform recipes.
//!
//! A node's placement is data: two short lists of [`Step`]s evaluated
//! against the elapsed time every frame. The `anchor` steps position the
//! node and are inherited by its children; the `local` steps orient and
//! scale the node itself and are never seen by children.

use cgmath::{InnerSpace, Matrix4, Rad, SquareMatrix, Vector3};

use crate::gfx::geometry::Winding;
use crate::gfx::rendering::{MeshId, TextureId};
use crate::gfx::resources::{MaterialId, MaterialLibrary};

/// Index of a node inside its [`Scene`](super::Scene).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct NodeId(pub usize);

/// A time-dependent scalar. `t` is the elapsed time in seconds.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Scalar {
    Const(f32),
    /// `t`
    Time,
    /// `a * sin(t)`
    Sin(f32),
    /// `a * cos(t)`
    Cos(f32),
}

impl Scalar {
    pub fn eval(self, t: f32) -> f32 {
        match self {
            Scalar::Const(value) => value,
            Scalar::Time => t,
            Scalar::Sin(amplitude) => amplitude * t.sin(),
            Scalar::Cos(amplitude) => amplitude * t.cos(),
        }
    }
}

impl From<f32> for Scalar {
    fn from(value: f32) -> Self {
        Scalar::Const(value)
    }
}

/// One factor of a node transform.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Step {
    Translate([Scalar; 3]),
    /// Rotation about `axis` by `angle` radians.
    Rotate {
        axis: Vector3<f32>,
        angle: Scalar,
    },
    Scale([f32; 3]),
}

impl Step {
    pub fn translate(x: Scalar, y: Scalar, z: Scalar) -> Self {
        Step::Translate([x, y, z])
    }

    /// Constant translation.
    pub fn offset(x: f32, y: f32, z: f32) -> Self {
        Self::translate(Scalar::Const(x), Scalar::Const(y), Scalar::Const(z))
    }

    pub fn rotate(axis: Vector3<f32>, angle: Scalar) -> Self {
        Step::Rotate { axis, angle }
    }

    pub fn rotate_x(angle: Scalar) -> Self {
        Self::rotate(Vector3::unit_x(), angle)
    }

    pub fn rotate_y(angle: Scalar) -> Self {
        Self::rotate(Vector3::unit_y(), angle)
    }

    pub fn rotate_z(angle: Scalar) -> Self {
        Self::rotate(Vector3::unit_z(), angle)
    }

    pub fn scale(factor: f32) -> Self {
        Step::Scale([factor; 3])
    }

    pub fn matrix(&self, t: f32) -> Matrix4<f32> {
        match *self {
            Step::Translate([x, y, z]) => {
                Matrix4::from_translation(Vector3::new(x.eval(t), y.eval(t), z.eval(t)))
            }
            Step::Rotate { axis, angle } => {
                let angle = Rad(angle.eval(t));
                if axis == Vector3::unit_x() {
                    Matrix4::from_angle_x(angle)
                } else if axis == Vector3::unit_y() {
                    Matrix4::from_angle_y(angle)
                } else if axis == Vector3::unit_z() {
                    Matrix4::from_angle_z(angle)
                } else if axis.magnitude2() > 0.0 {
                    Matrix4::from_axis_angle(axis.normalize(), angle)
                } else {
                    // a zero axis has no rotation to apply
                    Matrix4::identity()
                }
            }
            Step::Scale([x, y, z]) => Matrix4::from_nonuniform_scale(x, y, z),
        }
    }
}

/// Multiplies the steps left to right, so the last step applies first to a
/// vertex.
pub fn compose_steps(steps: &[Step], t: f32) -> Matrix4<f32> {
    steps
        .iter()
        .fold(Matrix4::identity(), |acc, step| acc * step.matrix(t))
}

/// A drawable node of the scene graph.
#[derive(Debug, Clone, PartialEq)]
pub struct SceneNode {
    pub name: String,
    pub parent: Option<NodeId>,
    pub anchor: Vec<Step>,
    pub local: Vec<Step>,
    pub mesh: MeshId,
    pub material: MaterialId,
    pub texture: Option<TextureId>,
    pub winding: Winding,
}

impl SceneNode {
    pub fn new(name: &str, mesh: MeshId) -> Self {
        Self {
            name: name.to_string(),
            parent: None,
            anchor: Vec::new(),
            local: Vec::new(),
            mesh,
            material: MaterialLibrary::DEFAULT,
            texture: None,
            winding: Winding::CounterClockwise,
        }
    }

    /// Builder pattern: Set the inherited placement steps
    pub fn with_anchor(mut self, steps: impl IntoIterator<Item = Step>) -> Self {
        self.anchor = steps.into_iter().collect();
        self
    }

    /// Builder pattern: Set the node-only orientation/scale steps
    pub fn with_local(mut self, steps: impl IntoIterator<Item = Step>) -> Self {
        self.local = steps.into_iter().collect();
        self
    }

    pub fn with_material(mut self, material: MaterialId) -> Self {
        self.material = material;
        self
    }

    pub fn with_texture(mut self, texture: Option<TextureId>) -> Self {
        self.texture = texture;
        self
    }

    pub fn with_winding(mut self, winding: Winding) -> Self {
        self.winding = winding;
        self
    }

    pub fn anchor_matrix(&self, t: f32) -> Matrix4<f32> {
        compose_steps(&self.anchor, t)
    }

    pub fn local_matrix(&self, t: f32) -> Matrix4<f32> {
        compose_steps(&self.local, t)
    }
}
