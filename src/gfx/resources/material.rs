//! ADS materials
//!
//! Materials are plain data. Scene nodes refer to them by [`MaterialId`] and
//! the backend resolves the id against a [`MaterialLibrary`] when it packs
//! per-draw uniforms.

use log::warn;

/// Index of a material inside a [`MaterialLibrary`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct MaterialId(pub usize);

/// Ambient/diffuse/specular reflectance with a Phong shininess exponent.
#[derive(Debug, Clone, PartialEq)]
pub struct Material {
    pub name: String,
    pub ambient: [f32; 4],
    pub diffuse: [f32; 4],
    pub specular: [f32; 4],
    pub shininess: f32,
}

impl Default for Material {
    fn default() -> Self {
        Self {
            name: "Default".to_string(),
            ambient: [0.2, 0.2, 0.2, 1.0],
            diffuse: [0.8, 0.8, 0.8, 1.0],
            specular: [0.0, 0.0, 0.0, 1.0],
            shininess: 1.0,
        }
    }
}

impl Material {
    /// Creates a material; `shininess` is clamped to at least 1.
    pub fn new(
        name: &str,
        ambient: [f32; 4],
        diffuse: [f32; 4],
        specular: [f32; 4],
        shininess: f32,
    ) -> Self {
        Self {
            name: name.to_string(),
            ambient,
            diffuse,
            specular,
            shininess: shininess.max(1.0),
        }
    }

    pub fn gold() -> Self {
        Self::new(
            "gold",
            [0.2473, 0.1995, 0.0745, 1.0],
            [0.7516, 0.6065, 0.2265, 1.0],
            [0.6283, 0.5559, 0.3661, 1.0],
            51.2,
        )
    }

    pub fn silver() -> Self {
        Self::new(
            "silver",
            [0.1923, 0.1923, 0.1923, 1.0],
            [0.5075, 0.5075, 0.5075, 1.0],
            [0.5083, 0.5083, 0.5083, 1.0],
            51.2,
        )
    }

    pub fn bronze() -> Self {
        Self::new(
            "bronze",
            [0.2125, 0.1275, 0.0540, 1.0],
            [0.7140, 0.4284, 0.1814, 1.0],
            [0.3936, 0.2719, 0.1667, 1.0],
            25.6,
        )
    }
}

/// Owns every material a scene can reference.
///
/// Slot 0 always holds the default material, which also serves as the
/// fallback for ids that do not resolve.
#[derive(Debug, Clone)]
pub struct MaterialLibrary {
    materials: Vec<Material>,
}

impl MaterialLibrary {
    pub const DEFAULT: MaterialId = MaterialId(0);
    pub const GOLD: MaterialId = MaterialId(1);
    pub const SILVER: MaterialId = MaterialId(2);
    pub const BRONZE: MaterialId = MaterialId(3);

    /// Library holding only the default material.
    pub fn new() -> Self {
        Self {
            materials: vec![Material::default()],
        }
    }

    /// Library with the default material followed by gold, silver and bronze
    /// at the ids named by the associated constants.
    pub fn standard() -> Self {
        let mut library = Self::new();
        library.add(Material::gold());
        library.add(Material::silver());
        library.add(Material::bronze());
        library
    }

    pub fn add(&mut self, material: Material) -> MaterialId {
        self.materials.push(material);
        MaterialId(self.materials.len() - 1)
    }

    pub fn get(&self, id: MaterialId) -> Option<&Material> {
        self.materials.get(id.0)
    }

    /// Gets a material with fallback to the default
    pub fn resolve(&self, id: Option<MaterialId>) -> &Material {
        match id {
            Some(id) => self.get(id).unwrap_or_else(|| {
                warn!("Unknown material id {}, using default", id.0);
                &self.materials[0]
            }),
            None => &self.materials[0],
        }
    }

    pub fn len(&self) -> usize {
        self.materials.len()
    }

    pub fn is_empty(&self) -> bool {
        self.materials.is_empty()
    }
}

impl Default for MaterialLibrary {
    fn default() -> Self {
        Self::standard()
    }
}
