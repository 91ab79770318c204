//! # Procedural and Imported Geometry
//!
//! This module owns the CPU-side mesh representation and everything that
//! produces one: the closed-form sphere and torus tessellators, the fixed cube
//! and pyramid used by the solar-system scene, and the OBJ importer.
//!
//! ## Supported Sources
//!
//! - **Sphere**: latitude/longitude UV sphere of radius 1
//! - **Torus**: ring swept around the Y axis, with tangent frame
//! - **Cube** / **Pyramid**: pre-expanded triangle lists
//! - **OBJ**: triangulated `v`/`vt`/`vn`/`f` subset
//!
//! ## Usage
//!
//! ```rust
//! use orrery::gfx::geometry::{generate_sphere, generate_torus};
//!
//! let sphere = generate_sphere(48).unwrap();
//! assert_eq!(sphere.vertex_count(), 49 * 49);
//!
//! let torus = generate_torus(0.5, 0.2, 48).unwrap();
//! assert_eq!(torus.draw_count(), 48 * 48 * 6);
//! ```

pub mod obj;
pub mod primitives;

pub use obj::{load_obj, parse_obj};
pub use primitives::*;

use crate::error::{Error, Result};
use crate::gfx::rendering::vertex::Vertex3D;

/// Triangulated surface ready for GPU upload.
///
/// Attribute arrays are parallel: entry `i` of every array describes vertex
/// `i`. When `indices` is `None` the positions are already expanded per
/// triangle and are drawn in order.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Mesh {
    /// Vertex positions (x, y, z)
    pub positions: Vec<[f32; 3]>,
    /// Normal vectors (x, y, z)
    pub normals: Vec<[f32; 3]>,
    /// Texture coordinates (s, t)
    pub tex_coords: Vec<[f32; 2]>,
    /// S tangents, empty unless the generator provides a tangent frame
    pub s_tangents: Vec<[f32; 3]>,
    /// T tangents, empty unless the generator provides a tangent frame
    pub t_tangents: Vec<[f32; 3]>,
    /// Triangle indices, three per triangle
    pub indices: Option<Vec<u32>>,
}

impl Mesh {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn vertex_count(&self) -> usize {
        self.positions.len()
    }

    pub fn is_indexed(&self) -> bool {
        self.indices.is_some()
    }

    /// Number of elements a draw call consumes: the index count for indexed
    /// meshes, the vertex count otherwise.
    pub fn draw_count(&self) -> usize {
        match &self.indices {
            Some(indices) => indices.len(),
            None => self.positions.len(),
        }
    }

    pub fn triangle_count(&self) -> usize {
        self.draw_count() / 3
    }

    /// Checks the structural invariants every consumer relies on.
    ///
    /// Out-of-range indices are reported here rather than at draw time.
    pub fn validate(&self) -> Result<()> {
        let len = self.positions.len();
        if self.normals.len() != len || self.tex_coords.len() != len {
            return Err(Error::precondition(
                "mesh",
                format!(
                    "attribute lengths differ: {} positions, {} normals, {} tex coords",
                    len,
                    self.normals.len(),
                    self.tex_coords.len()
                ),
            ));
        }

        for (name, tangents) in [("s tangents", &self.s_tangents), ("t tangents", &self.t_tangents)]
        {
            if !tangents.is_empty() && tangents.len() != len {
                return Err(Error::precondition(
                    "mesh",
                    format!("{} has {} entries for {} vertices", name, tangents.len(), len),
                ));
            }
        }

        match &self.indices {
            Some(indices) => {
                if indices.len() % 3 != 0 {
                    return Err(Error::precondition(
                        "mesh",
                        format!("index count {} is not a multiple of 3", indices.len()),
                    ));
                }
                if let Some(&bad) = indices.iter().find(|&&i| i as usize >= len) {
                    return Err(Error::precondition(
                        "mesh",
                        format!("index {} out of range for {} vertices", bad, len),
                    ));
                }
            }
            None => {
                if len % 3 != 0 {
                    return Err(Error::precondition(
                        "mesh",
                        format!("unindexed mesh has {} vertices, not a multiple of 3", len),
                    ));
                }
            }
        }

        Ok(())
    }

    /// Interleaves the attribute arrays into the vertex layout used by the
    /// render pipelines.
    pub fn to_vertices(&self) -> Vec<Vertex3D> {
        self.positions
            .iter()
            .zip(&self.normals)
            .zip(&self.tex_coords)
            .map(|((&position, &normal), &tex_coord)| Vertex3D {
                position,
                normal,
                tex_coord,
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn triangle() -> Mesh {
        Mesh {
            positions: vec![[0.0, 0.0, 0.0], [1.0, 0.0, 0.0], [0.0, 1.0, 0.0]],
            normals: vec![[0.0, 0.0, 1.0]; 3],
            tex_coords: vec![[0.0, 0.0], [1.0, 0.0], [0.0, 1.0]],
            ..Default::default()
        }
    }

    #[test]
    fn test_unindexed_triangle_is_valid() {
        let mesh = triangle();
        assert!(mesh.validate().is_ok());
        assert_eq!(mesh.draw_count(), 3);
        assert_eq!(mesh.triangle_count(), 1);
    }

    #[test]
    fn test_out_of_range_index_is_rejected() {
        let mut mesh = triangle();
        mesh.indices = Some(vec![0, 1, 3]);
        let err = mesh.validate().unwrap_err();
        assert!(err.to_string().contains("index 3 out of range"));
    }

    #[test]
    fn test_mismatched_attributes_are_rejected() {
        let mut mesh = triangle();
        mesh.tex_coords.pop();
        assert!(mesh.validate().is_err());
    }

    #[test]
    fn test_interleaved_vertices_keep_attribute_order() {
        let vertices = triangle().to_vertices();
        assert_eq!(vertices.len(), 3);
        assert_eq!(vertices[1].position, [1.0, 0.0, 0.0]);
        assert_eq!(vertices[2].tex_coord, [0.0, 1.0]);
    }
}
