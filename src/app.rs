use std::sync::Arc;
use std::time::Instant;

use log::{error, info, warn};
use winit::{
    application::ApplicationHandler,
    dpi::PhysicalSize,
    event::WindowEvent,
    event_loop::{ActiveEventLoop, ControlFlow, EventLoop},
    keyboard::{KeyCode, PhysicalKey},
    window::{Window, WindowAttributes, WindowId},
};

use crate::config::DemoConfig;
use crate::error::{Error, Result};
use crate::gfx::{
    geometry::{generate_cube, generate_pyramid, generate_sphere, generate_torus, load_obj},
    rendering::{RenderBackend, RenderEngine, TextureId},
    resources::MaterialLibrary,
    scene::{FrameContext, Scene, SolarSystemAssets},
    shadow::ShadowPass,
};

/// Generates and uploads every mesh, loads the textures and assembles the
/// reference scene on `backend`.
///
/// Mesh and model failures are fatal. A texture that fails to load is logged
/// and the nodes using it are drawn untextured.
pub fn load_scene<B: RenderBackend>(backend: &mut B, config: &DemoConfig) -> Result<Scene> {
    let pyramid = backend.upload_mesh(&generate_pyramid())?;
    let cube = backend.upload_mesh(&generate_cube())?;
    let sphere = backend.upload_mesh(&generate_sphere(config.sphere_slices)?)?;
    let torus = backend.upload_mesh(&generate_torus(
        config.torus.inner_radius,
        config.torus.outer_radius,
        config.torus.rings,
    )?)?;

    let model = match config.model_path() {
        Some(path) => Some(backend.upload_mesh(&load_obj(&path)?)?),
        None => None,
    };

    let brick = load_texture_or_skip(backend, config, &config.brick_texture);
    let earth = load_texture_or_skip(backend, config, &config.earth_texture);
    let model_texture = match model {
        Some(_) => load_texture_or_skip(backend, config, &config.model_texture),
        None => None,
    };

    let scene = Scene::solar_system(&SolarSystemAssets {
        pyramid,
        cube,
        sphere,
        torus,
        model,
        brick,
        earth,
        model_texture,
    });
    info!("Scene ready with {} nodes", scene.len());
    Ok(scene)
}

fn load_texture_or_skip<B: RenderBackend>(
    backend: &mut B,
    config: &DemoConfig,
    name: &str,
) -> Option<TextureId> {
    match backend.load_texture(&config.resource_path(name)) {
        Ok(id) => Some(id),
        Err(e) => {
            warn!("{}; drawing without it", e);
            None
        }
    }
}

pub struct OrreryApp {
    event_loop: Option<EventLoop<()>>,
    app_state: AppState,
}

struct AppState {
    config: DemoConfig,
    window: Option<Arc<Window>>,
    render_engine: Option<RenderEngine>,
    scene: Scene,
    materials: MaterialLibrary,
    start: Instant,
    failure: Option<Error>,
}

impl OrreryApp {
    pub fn new(config: DemoConfig) -> Result<Self> {
        let event_loop = EventLoop::new()
            .map_err(|e| Error::Backend(format!("failed to create event loop: {}", e)))?;

        Ok(Self {
            event_loop: Some(event_loop),
            app_state: AppState {
                config,
                window: None,
                render_engine: None,
                scene: Scene::new(),
                materials: MaterialLibrary::standard(),
                start: Instant::now(),
                failure: None,
            },
        })
    }

    /// Runs the event loop until the window closes. Returns the error that
    /// stopped it, if any.
    pub fn run(mut self) -> Result<()> {
        let event_loop = self
            .event_loop
            .take()
            .ok_or_else(|| Error::Backend("event loop already consumed".to_string()))?;
        event_loop.set_control_flow(ControlFlow::Poll);

        event_loop
            .run_app(&mut self.app_state)
            .map_err(|e| Error::Backend(format!("event loop failed: {}", e)))?;

        match self.app_state.failure.take() {
            Some(e) => Err(e),
            None => Ok(()),
        }
    }
}

impl AppState {
    fn init(&mut self, window: Arc<Window>) -> Result<()> {
        let (width, height) = window.inner_size().into();
        let shadow_map_size = self.config.shadow_map_size;

        let window_clone = window.clone();
        let mut renderer = pollster::block_on(async move {
            RenderEngine::new(window_clone, width, height, shadow_map_size).await
        })?;

        self.scene = load_scene(&mut renderer, &self.config)?;
        self.render_engine = Some(renderer);
        self.start = Instant::now();
        info!("Rendering with features: {}", self.config.features);
        Ok(())
    }

    fn fail(&mut self, event_loop: &ActiveEventLoop, e: Error) {
        error!("{}", e);
        self.failure = Some(e);
        event_loop.exit();
    }
}

impl ApplicationHandler for AppState {
    fn resumed(&mut self, event_loop: &ActiveEventLoop) {
        if self.window.is_some() {
            return;
        }

        let (width, height) = self.config.window_size;
        let attributes = WindowAttributes::default()
            .with_title(self.config.title.clone())
            .with_inner_size(winit::dpi::LogicalSize::new(width, height));

        match event_loop.create_window(attributes) {
            Ok(window) => {
                let window_handle = Arc::new(window);
                self.window = Some(window_handle.clone());
                if let Err(e) = self.init(window_handle) {
                    self.fail(event_loop, e);
                }
            }
            Err(e) => self.fail(
                event_loop,
                Error::Backend(format!("failed to create window: {}", e)),
            ),
        }
    }

    fn window_event(
        &mut self,
        event_loop: &ActiveEventLoop,
        _window_id: WindowId,
        event: WindowEvent,
    ) {
        let Some(render_engine) = self.render_engine.as_mut() else {
            return;
        };

        match event {
            WindowEvent::KeyboardInput {
                event:
                    winit::event::KeyEvent {
                        physical_key: PhysicalKey::Code(KeyCode::Escape),
                        ..
                    },
                ..
            }
            | WindowEvent::CloseRequested => {
                event_loop.exit();
            }
            WindowEvent::Resized(PhysicalSize { width, height }) => {
                render_engine.resize(width, height);
            }
            WindowEvent::RedrawRequested => {
                let ctx = FrameContext::new(
                    self.start.elapsed().as_secs_f32(),
                    render_engine.get_surface_size(),
                )
                .with_features(self.config.features);

                let plan = ShadowPass::render_frame(&self.scene, &ctx);
                if let Err(e) = render_engine.submit(&plan, &self.materials) {
                    self.fail(event_loop, e);
                }
            }
            _ => (),
        }
    }

    fn about_to_wait(&mut self, _event_loop: &ActiveEventLoop) {
        if let Some(ref window) = self.window {
            window.request_redraw();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::gfx::rendering::RecordingBackend;
    use std::path::PathBuf;

    fn scratch_dir(name: &str) -> PathBuf {
        let dir = std::env::temp_dir().join(format!("orrery-{}-{}", name, std::process::id()));
        std::fs::create_dir_all(&dir).unwrap();
        dir
    }

    #[test]
    fn test_scene_loads_without_textures() {
        let mut backend = RecordingBackend::new();
        let config = DemoConfig::default()
            .with_resources("definitely/not/here")
            .with_model(None);

        let scene = load_scene(&mut backend, &config).unwrap();
        assert_eq!(scene.len(), 5);
        assert_eq!(backend.meshes().len(), 4);
        assert!(backend.textures().is_empty());

        let sun = scene.node(scene.find("sun").unwrap()).unwrap();
        assert_eq!(sun.texture, None);

        let plan = ShadowPass::render_frame(&scene, &FrameContext::new(1.0, (800, 600)));
        backend.submit(&plan, &MaterialLibrary::standard()).unwrap();
        assert_eq!(backend.draw_calls(), 10);
    }

    #[test]
    fn test_scene_uses_loaded_textures_and_model() {
        let dir = scratch_dir("scene");
        image::RgbaImage::from_pixel(2, 2, image::Rgba([200, 60, 40, 255]))
            .save(dir.join("brick1.png"))
            .unwrap();
        std::fs::write(
            dir.join("tri.obj"),
            "v 0 0 0\nv 1 0 0\nv 0 1 0\nvt 0 0\nvn 0 0 1\nf 1/1/1 2/1/1 3/1/1\n",
        )
        .unwrap();

        let mut config = DemoConfig::default()
            .with_resources(&dir)
            .with_model(Some(PathBuf::from("tri.obj")));
        config.sphere_slices = 8;
        config.brick_texture = "brick1.png".to_string();

        let mut backend = RecordingBackend::new();
        let scene = load_scene(&mut backend, &config).unwrap();

        assert_eq!(scene.len(), 6);
        assert_eq!(backend.meshes().len(), 5);
        assert_eq!(backend.meshes()[4].vertex_count, 3);
        assert_eq!(backend.textures().len(), 1);
        assert_eq!(backend.textures()[0].1, 2);

        let sun = scene.node(scene.find("sun").unwrap()).unwrap();
        assert_eq!(sun.texture, Some(TextureId(0)));
        let sphere = scene.node(scene.find("sphere").unwrap()).unwrap();
        assert_eq!(sphere.texture, None);

        std::fs::remove_dir_all(&dir).ok();
    }

    #[test]
    fn test_oversized_texture_is_skipped() {
        let dir = scratch_dir("oversized");
        image::RgbaImage::from_pixel(3, 3, image::Rgba([200, 60, 40, 255]))
            .save(dir.join("brick1.png"))
            .unwrap();

        let mut config = DemoConfig::default().with_resources(&dir).with_model(None);
        config.sphere_slices = 8;
        config.brick_texture = "brick1.png".to_string();

        let mut backend = RecordingBackend::new().with_max_texture_dimension(2);
        let scene = load_scene(&mut backend, &config).unwrap();

        assert!(backend.textures().is_empty());
        let sun = scene.node(scene.find("sun").unwrap()).unwrap();
        assert_eq!(sun.texture, None);

        std::fs::remove_dir_all(&dir).ok();
    }

    #[test]
    fn test_bad_tessellation_or_model_is_fatal() {
        let mut backend = RecordingBackend::new();
        let mut config = DemoConfig::default();
        config.sphere_slices = 0;
        assert!(matches!(
            load_scene(&mut backend, &config),
            Err(Error::Precondition { .. })
        ));

        let config = DemoConfig::default()
            .with_resources("definitely/not/here")
            .with_model(Some(PathBuf::from("ship.obj")));
        assert!(matches!(
            load_scene(&mut RecordingBackend::new(), &config),
            Err(Error::Io { .. })
        ));
    }
}
