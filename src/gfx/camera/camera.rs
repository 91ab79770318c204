//! Fixed perspective camera.

use cgmath::*;

/// Converts a projection built for the OpenGL clip volume (z in [-1, 1]) to
/// the one wgpu expects (z in [0, 1]): `z' = 0.5 z + 0.5 w`. Arguments are
/// column-major. Only the GPU upload applies it; the matrices handed around
/// the CPU side stay in OpenGL convention.
#[rustfmt::skip]
pub const OPENGL_TO_WGPU_MATRIX: Matrix4<f32> = Matrix4::new(
    1.0, 0.0, 0.0, 0.0,
    0.0, 1.0, 0.0, 0.0,
    0.0, 0.0, 0.5, 0.0,
    0.0, 0.0, 0.5, 1.0,
);

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Camera {
    pub eye: Point3<f32>,
    pub target: Point3<f32>,
    pub up: Vector3<f32>,
    pub fovy: Rad<f32>,
    pub znear: f32,
    pub zfar: f32,
}

impl Camera {
    /// Camera at `eye` looking at `target`, 60° vertical field of view.
    pub fn new(eye: Point3<f32>, target: Point3<f32>) -> Self {
        Self {
            eye,
            target,
            up: Vector3::unit_y(),
            fovy: Rad(1.0472),
            znear: 0.1,
            zfar: 1000.0,
        }
    }

    pub fn view(&self) -> Matrix4<f32> {
        Matrix4::look_at_rh(self.eye, self.target, self.up)
    }

    pub fn projection(&self, aspect: f32) -> Matrix4<f32> {
        perspective(self.fovy, aspect, self.znear, self.zfar)
    }
}

impl Default for Camera {
    /// Eight units back along +Z, looking at the origin.
    fn default() -> Self {
        Self::new(Point3::new(0.0, 0.0, 8.0), Point3::origin())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn approx(a: Matrix4<f32>, b: Matrix4<f32>) -> bool {
        let a: [[f32; 4]; 4] = a.into();
        let b: [[f32; 4]; 4] = b.into();
        a.iter()
            .flatten()
            .zip(b.iter().flatten())
            .all(|(x, y)| (x - y).abs() < 1e-5)
    }

    #[test]
    fn test_default_view_is_a_pull_back() {
        let camera = Camera::default();
        assert!(approx(
            camera.view(),
            Matrix4::from_translation(Vector3::new(0.0, 0.0, -8.0))
        ));
    }

    #[test]
    fn test_projection_maps_near_and_far_to_gl_clip() {
        let camera = Camera::default();
        let proj = camera.projection(1.5);

        let near = proj * Vector4::new(0.0, 0.0, -camera.znear, 1.0);
        assert!((near.z / near.w + 1.0).abs() < 1e-4);
        let far = proj * Vector4::new(0.0, 0.0, -camera.zfar, 1.0);
        assert!((far.z / far.w - 1.0).abs() < 1e-4);
    }

    #[test]
    fn test_wgpu_correction_halves_depth_range() {
        let proj = OPENGL_TO_WGPU_MATRIX * Camera::default().projection(1.0);
        let near = proj * Vector4::new(0.0, 0.0, -0.1, 1.0);
        assert!((near.z / near.w).abs() < 1e-4);
        let far = proj * Vector4::new(0.0, 0.0, -1000.0, 1.0);
        assert!((far.z / far.w - 1.0).abs() < 1e-4);
    }

    #[test]
    fn test_wgpu_correction_keeps_xy_and_w() {
        let clip = Vector4::new(0.3, -0.7, 0.4, 2.0);
        let corrected = OPENGL_TO_WGPU_MATRIX * clip;
        assert_eq!(corrected.x, 0.3);
        assert_eq!(corrected.y, -0.7);
        assert_eq!(corrected.w, 2.0);
        assert!((corrected.z - (0.5 * 0.4 + 0.5 * 2.0)).abs() < 1e-6);

        // the same NDC point lands at the same xy before and after
        assert!((corrected.x / corrected.w - clip.x / clip.w).abs() < 1e-6);
        assert!((corrected.y / corrected.w - clip.y / clip.w).abs() < 1e-6);
    }
}
