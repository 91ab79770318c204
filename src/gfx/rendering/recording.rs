//! Headless backend that validates and records submitted frames.

use std::path::{Path, PathBuf};

use log::debug;

use super::{MeshId, RenderBackend, TextureId};
use crate::error::{Error, Result};
use crate::gfx::geometry::Mesh;
use crate::gfx::resources::texture_resource::{check_texture_size, MAX_TEXTURE_DIMENSION};
use crate::gfx::resources::MaterialLibrary;
use crate::gfx::scene::{DrawCommand, FramePlan, Pass};

/// Shape of an uploaded mesh.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MeshSummary {
    pub vertex_count: usize,
    pub draw_count: usize,
    pub indexed: bool,
}

/// A [`RenderBackend`] with no GPU behind it.
///
/// Meshes and textures are checked the same way the wgpu backend checks them
/// and every submitted frame is kept, so scene assembly and frame planning
/// can run where no adapter is available.
#[derive(Debug)]
pub struct RecordingBackend {
    meshes: Vec<MeshSummary>,
    textures: Vec<(PathBuf, u32, u32)>,
    frames: Vec<FramePlan>,
    max_texture_dimension: u32,
}

impl Default for RecordingBackend {
    fn default() -> Self {
        Self {
            meshes: Vec::new(),
            textures: Vec::new(),
            frames: Vec::new(),
            max_texture_dimension: MAX_TEXTURE_DIMENSION,
        }
    }
}

impl RecordingBackend {
    pub fn new() -> Self {
        Self::default()
    }

    /// Stands in for a device with a smaller 2D texture limit.
    pub fn with_max_texture_dimension(mut self, max: u32) -> Self {
        self.max_texture_dimension = max;
        self
    }

    pub fn meshes(&self) -> &[MeshSummary] {
        &self.meshes
    }

    pub fn mesh(&self, id: MeshId) -> Option<&MeshSummary> {
        self.meshes.get(id.0)
    }

    /// Loaded texture paths with their pixel dimensions.
    pub fn textures(&self) -> &[(PathBuf, u32, u32)] {
        &self.textures
    }

    pub fn frames(&self) -> &[FramePlan] {
        &self.frames
    }

    /// Total draw calls over all recorded frames.
    pub fn draw_calls(&self) -> usize {
        self.frames.iter().map(FramePlan::len).sum()
    }

    fn check_command(
        &self,
        command: &DrawCommand,
        expected: Pass,
        materials: &MaterialLibrary,
    ) -> Result<()> {
        if command.pass != expected {
            return Err(Error::Backend(format!(
                "{:?} command for node {} queued in the {:?} pass",
                command.pass, command.node.0, expected
            )));
        }
        if self.mesh(command.mesh).is_none() {
            return Err(Error::Backend(format!(
                "unknown mesh {} for node {}",
                command.mesh.0, command.node.0
            )));
        }
        if let Some(texture) = command.texture {
            if texture.0 >= self.textures.len() {
                return Err(Error::Backend(format!(
                    "unknown texture {} for node {}",
                    texture.0, command.node.0
                )));
            }
        }
        if let Some(material) = command.material {
            if materials.get(material).is_none() {
                return Err(Error::Backend(format!(
                    "unknown material {} for node {}",
                    material.0, command.node.0
                )));
            }
        }
        Ok(())
    }
}

impl RenderBackend for RecordingBackend {
    fn upload_mesh(&mut self, mesh: &Mesh) -> Result<MeshId> {
        mesh.validate()?;
        self.meshes.push(MeshSummary {
            vertex_count: mesh.vertex_count(),
            draw_count: mesh.draw_count(),
            indexed: mesh.is_indexed(),
        });
        Ok(MeshId(self.meshes.len() - 1))
    }

    fn load_texture(&mut self, path: &Path) -> Result<TextureId> {
        let (width, height) = image::image_dimensions(path).map_err(|source| Error::Texture {
            path: path.to_path_buf(),
            source,
        })?;
        check_texture_size(path, width, height, self.max_texture_dimension)?;
        self.textures.push((path.to_path_buf(), width, height));
        Ok(TextureId(self.textures.len() - 1))
    }

    fn submit(&mut self, plan: &FramePlan, materials: &MaterialLibrary) -> Result<()> {
        for command in &plan.shadow_pass {
            self.check_command(command, Pass::ShadowDepth, materials)?;
        }
        for command in &plan.shaded_pass {
            self.check_command(command, Pass::Shaded, materials)?;
        }
        debug!(
            "Recorded frame {} ({} draws)",
            self.frames.len(),
            plan.len()
        );
        self.frames.push(plan.clone());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::gfx::geometry::{generate_cube, generate_sphere};
    use crate::gfx::scene::{FrameContext, Scene, SceneNode};
    use crate::gfx::shadow::ShadowPass;

    #[test]
    fn test_uploads_are_validated() {
        let mut backend = RecordingBackend::new();
        let sphere = backend.upload_mesh(&generate_sphere(8).unwrap()).unwrap();
        assert_eq!(sphere, MeshId(0));
        assert!(backend.mesh(sphere).unwrap().indexed);

        let mut broken = generate_cube();
        broken.normals.pop();
        assert!(matches!(
            backend.upload_mesh(&broken),
            Err(Error::Precondition { .. })
        ));
        assert_eq!(backend.meshes().len(), 1);
    }

    #[test]
    fn test_missing_texture_is_reported() {
        let mut backend = RecordingBackend::new();
        assert!(matches!(
            backend.load_texture(Path::new("nowhere/brick1.jpg")),
            Err(Error::Texture { .. })
        ));
        assert!(backend.textures().is_empty());
    }

    #[test]
    fn test_oversized_texture_is_refused() {
        let dir = std::env::temp_dir().join(format!("orrery-recording-{}", std::process::id()));
        std::fs::create_dir_all(&dir).unwrap();
        let path = dir.join("wide.png");
        image::RgbaImage::from_pixel(3, 2, image::Rgba([0, 0, 255, 255]))
            .save(&path)
            .unwrap();

        let mut backend = RecordingBackend::new().with_max_texture_dimension(2);
        match backend.load_texture(&path) {
            Err(Error::TextureTooLarge { width, height, max, .. }) => {
                assert_eq!((width, height, max), (3, 2, 2));
            }
            other => panic!("expected an oversized texture error, got {:?}", other),
        }
        assert!(backend.textures().is_empty());

        let mut backend = RecordingBackend::new().with_max_texture_dimension(3);
        assert_eq!(backend.load_texture(&path).unwrap(), TextureId(0));

        std::fs::remove_dir_all(&dir).ok();
    }

    #[test]
    fn test_frames_are_recorded_in_order() {
        let mut backend = RecordingBackend::new();
        let cube = backend.upload_mesh(&generate_cube()).unwrap();
        let mut scene = Scene::new();
        scene.add_root(SceneNode::new("cube", cube));

        let materials = MaterialLibrary::standard();
        for t in [0.0, 0.5] {
            let plan = ShadowPass::render_frame(&scene, &FrameContext::new(t, (320, 240)));
            backend.submit(&plan, &materials).unwrap();
        }
        assert_eq!(backend.frames().len(), 2);
        assert_eq!(backend.frames()[1].elapsed, 0.5);
        assert_eq!(backend.draw_calls(), 4);
    }

    #[test]
    fn test_unknown_handles_are_rejected() {
        let mut backend = RecordingBackend::new();
        let mut scene = Scene::new();
        scene.add_root(SceneNode::new("ghost", MeshId(7)));

        let plan = ShadowPass::render_frame(&scene, &FrameContext::new(0.0, (320, 240)));
        let err = backend
            .submit(&plan, &MaterialLibrary::standard())
            .unwrap_err();
        assert!(err.to_string().contains("unknown mesh 7"));
        assert!(backend.frames().is_empty());
    }
}
