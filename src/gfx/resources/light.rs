//! Positional light shared by both passes.

use cgmath::Point3;

/// A single positional light plus the scene-wide ambient term.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Light {
    pub position: Point3<f32>,
    pub ambient: [f32; 4],
    pub diffuse: [f32; 4],
    pub specular: [f32; 4],
    /// Ambient contribution applied to every lit surface regardless of the
    /// light.
    pub global_ambient: [f32; 4],
}

impl Light {
    pub fn new(position: Point3<f32>) -> Self {
        Self {
            position,
            ..Default::default()
        }
    }

    pub fn position_array(&self) -> [f32; 3] {
        self.position.into()
    }
}

impl Default for Light {
    /// White light up and to the left of the scene.
    fn default() -> Self {
        Self {
            position: Point3::new(-3.8, 2.2, 1.1),
            ambient: [0.0, 0.0, 0.0, 1.0],
            diffuse: [1.0, 1.0, 1.0, 1.0],
            specular: [1.0, 1.0, 1.0, 1.0],
            global_ambient: [0.7, 0.7, 0.7, 1.0],
        }
    }
}
