//! Demo configuration
//!
//! Defaults reproduce the reference scene. Environment variables override
//! them at startup:
//!
//! - `ORRERY_RESOURCES` - directory holding textures and models
//! - `ORRERY_FEATURES` - comma-separated feature list (`all`, `none`,
//!   `textured,lit,shadowed`)
//! - `ORRERY_SHADOW_MAP_SIZE` - shadow map edge length in texels
//! - `ORRERY_MODEL` - OBJ file to show as the `model` node, relative to the
//!   resource directory unless absolute; set it empty to leave the node out

use std::path::{Path, PathBuf};

use crate::error::{Error, Result};
use crate::gfx::scene::RenderFeatures;

pub const RESOURCES_VAR: &str = "ORRERY_RESOURCES";
pub const FEATURES_VAR: &str = "ORRERY_FEATURES";
pub const SHADOW_MAP_SIZE_VAR: &str = "ORRERY_SHADOW_MAP_SIZE";
pub const MODEL_VAR: &str = "ORRERY_MODEL";

#[derive(Debug, Clone, PartialEq)]
pub struct TorusConfig {
    pub inner_radius: f32,
    pub outer_radius: f32,
    pub rings: u32,
}

impl Default for TorusConfig {
    fn default() -> Self {
        Self {
            inner_radius: 0.5,
            outer_radius: 0.2,
            rings: 48,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct DemoConfig {
    pub title: String,
    pub window_size: (u32, u32),
    pub resources: PathBuf,
    pub features: RenderFeatures,
    pub shadow_map_size: u32,
    pub sphere_slices: u32,
    pub torus: TorusConfig,
    /// Imported model; no `model` node when `None`
    pub model: Option<PathBuf>,
    pub brick_texture: String,
    pub earth_texture: String,
    pub model_texture: String,
}

impl Default for DemoConfig {
    fn default() -> Self {
        Self {
            title: "Orrery".to_string(),
            window_size: (800, 600),
            resources: PathBuf::from("resources"),
            features: RenderFeatures::ALL,
            shadow_map_size: 2048,
            sphere_slices: 48,
            torus: TorusConfig::default(),
            model: Some(PathBuf::from("shuttle.obj")),
            brick_texture: "brick1.jpg".to_string(),
            earth_texture: "earthmap1k.jpg".to_string(),
            model_texture: "spstob_1.jpg".to_string(),
        }
    }
}

impl DemoConfig {
    pub fn with_resources(mut self, dir: impl Into<PathBuf>) -> Self {
        self.resources = dir.into();
        self
    }

    pub fn with_model(mut self, model: Option<PathBuf>) -> Self {
        self.model = model;
        self
    }

    /// Defaults overridden by the process environment.
    pub fn from_env() -> Result<Self> {
        Self::default().apply_overrides(|key| std::env::var(key).ok())
    }

    /// Applies overrides from `lookup`, which maps a variable name to its
    /// value. Empty values are treated as unset, except for the model where
    /// an empty value disables it.
    pub fn apply_overrides<F>(mut self, lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(model) = lookup(MODEL_VAR) {
            let model = model.trim();
            self = self.with_model((!model.is_empty()).then(|| PathBuf::from(model)));
        }

        let lookup = |key: &str| lookup(key).filter(|value| !value.trim().is_empty());

        if let Some(dir) = lookup(RESOURCES_VAR) {
            self = self.with_resources(dir);
        }

        if let Some(list) = lookup(FEATURES_VAR) {
            self.features = list.parse()?;
        }

        if let Some(size) = lookup(SHADOW_MAP_SIZE_VAR) {
            self.shadow_map_size = match size.trim().parse::<u32>() {
                Ok(size) if size > 0 => size,
                _ => {
                    return Err(Error::Config {
                        key: SHADOW_MAP_SIZE_VAR.to_string(),
                        reason: format!("`{}` is not a positive texel count", size),
                    })
                }
            };
        }

        Ok(self)
    }

    /// Resolves `name` against the resource directory.
    pub fn resource_path(&self, name: impl AsRef<Path>) -> PathBuf {
        let name = name.as_ref();
        if name.is_absolute() {
            name.to_path_buf()
        } else {
            self.resources.join(name)
        }
    }

    pub fn model_path(&self) -> Option<PathBuf> {
        self.model.as_ref().map(|model| self.resource_path(model))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| vars.get(key).cloned()
    }

    #[test]
    fn test_defaults_match_reference_scene() {
        let config = DemoConfig::default();
        assert_eq!(config.window_size, (800, 600));
        assert_eq!(config.sphere_slices, 48);
        assert_eq!(config.torus.rings, 48);
        assert_eq!(config.features, RenderFeatures::ALL);
        assert_eq!(
            config.model_path(),
            Some(PathBuf::from("resources/shuttle.obj"))
        );
        assert_eq!(config.model_texture, "spstob_1.jpg");
        assert_eq!(
            config.resource_path(&config.earth_texture),
            PathBuf::from("resources/earthmap1k.jpg")
        );
    }

    #[test]
    fn test_no_overrides_keeps_defaults() {
        let config = DemoConfig::default().apply_overrides(lookup(&[])).unwrap();
        assert_eq!(config, DemoConfig::default());
    }

    #[test]
    fn test_env_overrides_apply() {
        let config = DemoConfig::default()
            .apply_overrides(lookup(&[
                (RESOURCES_VAR, "/opt/orrery"),
                (FEATURES_VAR, "lit,textured"),
                (SHADOW_MAP_SIZE_VAR, "1024"),
                (MODEL_VAR, "shuttle.obj"),
            ]))
            .unwrap();

        assert_eq!(config.resources, PathBuf::from("/opt/orrery"));
        assert!(config.features.lit && config.features.textured);
        assert!(!config.features.shadowed);
        assert_eq!(config.shadow_map_size, 1024);
        assert_eq!(
            config.model_path(),
            Some(PathBuf::from("/opt/orrery/shuttle.obj"))
        );
    }

    #[test]
    fn test_empty_values_are_ignored() {
        let config = DemoConfig::default()
            .apply_overrides(lookup(&[(RESOURCES_VAR, ""), (FEATURES_VAR, "  ")]))
            .unwrap();
        assert_eq!(config.resources, PathBuf::from("resources"));
        assert_eq!(config.features, RenderFeatures::ALL);
        assert!(config.model.is_some());
    }

    #[test]
    fn test_empty_model_disables_it() {
        let config = DemoConfig::default()
            .apply_overrides(lookup(&[(MODEL_VAR, "")]))
            .unwrap();
        assert!(config.model.is_none());
        assert!(config.model_path().is_none());
    }

    #[test]
    fn test_bad_values_are_config_errors() {
        for size in ["0", "-5", "big"] {
            match DemoConfig::default().apply_overrides(lookup(&[(SHADOW_MAP_SIZE_VAR, size)])) {
                Err(Error::Config { key, .. }) => assert_eq!(key, SHADOW_MAP_SIZE_VAR),
                other => panic!("expected config error for {:?}, got {:?}", size, other),
            }
        }

        assert!(matches!(
            DemoConfig::default().apply_overrides(lookup(&[(FEATURES_VAR, "lit,fog")])),
            Err(Error::Config { .. })
        ));
    }

    #[test]
    fn test_absolute_model_paths_are_kept() {
        let config = DemoConfig::default().with_model(Some(PathBuf::from("/models/ship.obj")));
        assert_eq!(config.model_path(), Some(PathBuf::from("/models/ship.obj")));
    }
}
