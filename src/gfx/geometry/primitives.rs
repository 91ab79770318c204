//! # Primitive Shape Generation
//!
//! Closed-form tessellation of the sphere and torus, plus the fixed cube and
//! pyramid triangle lists used by the solar-system scene. Every generator is a
//! pure function: identical parameters give bit-identical arrays.

use cgmath::{Deg, InnerSpace, Matrix4, Rad, Vector3, Vector4};

use super::Mesh;
use crate::error::{Error, Result};

/// Front-face orientation of a mesh's triangles as seen from outside.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Winding {
    #[default]
    CounterClockwise,
    Clockwise,
}

/// Generate a UV sphere of radius 1 centered at the origin
///
/// # Arguments
/// * `slices` - Number of latitude and longitude steps
///
/// Produces `(slices + 1)^2` vertices and `slices^2 * 6` indices. The first
/// and last columns share positions so texture coordinates can run 0..1
/// without wrapping. Triangles touching the poles have zero area.
pub fn generate_sphere(slices: u32) -> Result<Mesh> {
    grid_index_count("slices", slices)?;

    let n = slices as usize;
    let steps = slices as f32;
    let mut data = Mesh::new();
    data.positions.reserve((n + 1) * (n + 1));
    data.normals.reserve((n + 1) * (n + 1));
    data.tex_coords.reserve((n + 1) * (n + 1));

    for i in 0..=n {
        let y = (180.0 - i as f32 * 180.0 / steps).to_radians().cos();
        // |cos(asin(y))| is the ring radius at this latitude
        let ring = y.clamp(-1.0, 1.0).asin().cos().abs();

        for j in 0..=n {
            let longitude = (j as f32 * 360.0 / steps).to_radians();
            let x = -longitude.cos() * ring;
            let z = longitude.sin() * ring;

            data.positions.push([x, y, z]);
            data.normals.push([x, y, z]);
            data.tex_coords.push([j as f32 / steps, i as f32 / steps]);
        }
    }

    data.indices = Some(grid_indices(slices)?);
    Ok(data)
}

/// Generate a torus lying in the XZ plane
///
/// # Arguments
/// * `inner_radius` - Distance from the origin to the center of the tube
/// * `outer_radius` - Radius of the tube itself
/// * `num_rings` - Subdivisions both around the tube and around the Y axis
///
/// A generator ring is built in the XY plane and swept around Y. Every vertex
/// carries S and T tangents with `normal = T x S`. The last ring repeats the
/// first so the seam is closed exactly.
pub fn generate_torus(inner_radius: f32, outer_radius: f32, num_rings: u32) -> Result<Mesh> {
    grid_index_count("num_rings", num_rings)?;
    for (name, value) in [("inner_radius", inner_radius), ("outer_radius", outer_radius)] {
        if !value.is_finite() || value <= 0.0 {
            return Err(Error::precondition(
                name,
                format!("must be a positive finite number, got {}", value),
            ));
        }
    }

    let n = num_rings as usize;
    let steps = num_rings as f32;
    let stride = n + 1;
    let total = stride * stride;

    let mut data = Mesh::new();
    data.positions.reserve(total);
    data.normals.reserve(total);
    data.tex_coords.reserve(total);
    data.s_tangents.reserve(total);
    data.t_tangents.reserve(total);

    // First ring, in the XY plane around (inner_radius, 0, 0)
    for i in 0..=n {
        let angle = Deg(i as f32 * 360.0 / steps);
        let around_z = Matrix4::from_angle_z(angle);
        let position = (around_z * Vector4::new(0.0, outer_radius, 0.0, 1.0)).truncate()
            + Vector3::new(inner_radius, 0.0, 0.0);

        let tangent_rotation = Matrix4::from_angle_z(Rad::from(angle) + Rad(std::f32::consts::FRAC_PI_2));
        let t_tangent = (tangent_rotation * Vector4::new(0.0, -1.0, 0.0, 0.0)).truncate();
        let s_tangent = Vector3::new(0.0, 0.0, -1.0);
        let normal = t_tangent.cross(s_tangent);

        data.positions.push(position.into());
        data.tex_coords.push([0.0, i as f32 / steps]);
        data.t_tangents.push(t_tangent.into());
        data.s_tangents.push(s_tangent.into());
        data.normals.push(normal.into());
    }

    // Sweep the first ring around Y
    for ring in 1..=n {
        let s = ring as f32 * 2.0 / steps;

        if ring == n {
            for vert in 0..stride {
                data.positions.push(data.positions[vert]);
                data.normals.push(data.normals[vert]);
                data.s_tangents.push(data.s_tangents[vert]);
                data.t_tangents.push(data.t_tangents[vert]);
                data.tex_coords.push([s, data.tex_coords[vert][1]]);
            }
            continue;
        }

        let around_y = Matrix4::from_angle_y(Deg(ring as f32 * 360.0 / steps));
        for vert in 0..stride {
            let rotate_point = |p: [f32; 3]| -> [f32; 3] {
                (around_y * Vector3::from(p).extend(1.0)).truncate().into()
            };
            let rotate_dir = |v: [f32; 3]| -> [f32; 3] {
                (around_y * Vector3::from(v).extend(0.0)).truncate().into()
            };

            data.positions.push(rotate_point(data.positions[vert]));
            data.normals.push(rotate_dir(data.normals[vert]));
            data.s_tangents.push(rotate_dir(data.s_tangents[vert]));
            data.t_tangents.push(rotate_dir(data.t_tangents[vert]));
            data.tex_coords.push([s, data.tex_coords[vert][1]]);
        }
    }

    data.indices = Some(torus_indices(num_rings)?);
    Ok(data)
}

/// Index count of a `steps x steps` cell grid.
///
/// Fails when `steps` is zero, or when the vertex count `(steps + 1)^2` or
/// the index count `steps^2 * 6` does not fit a `u32` index buffer.
pub fn grid_index_count(name: &'static str, steps: u32) -> Result<usize> {
    if steps == 0 {
        return Err(Error::precondition(name, "must be at least 1, got 0"));
    }

    let vertices = steps
        .checked_add(1)
        .and_then(|stride| stride.checked_mul(stride));
    let indices = steps
        .checked_mul(steps)
        .and_then(|cells| cells.checked_mul(6));

    match (vertices, indices) {
        (Some(_), Some(count)) => Ok(count as usize),
        _ => Err(Error::precondition(
            name,
            format!("{} is too large for 32-bit indices", steps),
        )),
    }
}

/// Two triangles per cell of a `(steps + 1) x (steps + 1)` vertex grid,
/// wound `(i,j) (i,j+1) (i+1,j)` and `(i,j+1) (i+1,j+1) (i+1,j)`.
pub fn grid_indices(steps: u32) -> Result<Vec<u32>> {
    let count = grid_index_count("steps", steps)?;
    let stride = steps + 1;
    let mut indices = Vec::with_capacity(count);
    for i in 0..steps {
        for j in 0..steps {
            let here = i * stride + j;
            let below = (i + 1) * stride + j;
            indices.extend_from_slice(&[here, here + 1, below, here + 1, below + 1, below]);
        }
    }
    Ok(indices)
}

/// Torus cell triangulation: `(r,v) (r+1,v) (r,v+1)` and
/// `(r,v+1) (r+1,v) (r+1,v+1)`.
pub fn torus_indices(num_rings: u32) -> Result<Vec<u32>> {
    let count = grid_index_count("num_rings", num_rings)?;
    let stride = num_rings + 1;
    let mut indices = Vec::with_capacity(count);
    for ring in 0..num_rings {
        for vert in 0..num_rings {
            let here = ring * stride + vert;
            let next_ring = (ring + 1) * stride + vert;
            indices.extend_from_slice(&[
                here,
                next_ring,
                here + 1,
                here + 1,
                next_ring,
                next_ring + 1,
            ]);
        }
    }
    Ok(indices)
}

#[rustfmt::skip]
const CUBE_POSITIONS: [[f32; 3]; 36] = [
    [-1.0,  1.0, -1.0], [-1.0, -1.0, -1.0], [ 1.0, -1.0, -1.0],
    [ 1.0, -1.0, -1.0], [ 1.0,  1.0, -1.0], [-1.0,  1.0, -1.0],
    [ 1.0, -1.0, -1.0], [ 1.0, -1.0,  1.0], [ 1.0,  1.0, -1.0],
    [ 1.0, -1.0,  1.0], [ 1.0,  1.0,  1.0], [ 1.0,  1.0, -1.0],
    [ 1.0, -1.0,  1.0], [-1.0, -1.0,  1.0], [ 1.0,  1.0,  1.0],
    [-1.0, -1.0,  1.0], [-1.0,  1.0,  1.0], [ 1.0,  1.0,  1.0],
    [-1.0, -1.0,  1.0], [-1.0, -1.0, -1.0], [-1.0,  1.0,  1.0],
    [-1.0, -1.0, -1.0], [-1.0,  1.0, -1.0], [-1.0,  1.0,  1.0],
    [-1.0, -1.0,  1.0], [ 1.0, -1.0,  1.0], [ 1.0, -1.0, -1.0],
    [ 1.0, -1.0, -1.0], [-1.0, -1.0, -1.0], [-1.0, -1.0,  1.0],
    [-1.0,  1.0, -1.0], [ 1.0,  1.0, -1.0], [ 1.0,  1.0,  1.0],
    [ 1.0,  1.0,  1.0], [-1.0,  1.0,  1.0], [-1.0,  1.0, -1.0],
];

#[rustfmt::skip]
const PYRAMID_POSITIONS: [[f32; 3]; 18] = [
    [-1.0, -1.0,  1.0], [ 1.0, -1.0,  1.0], [ 0.0,  1.0,  0.0], // front
    [ 1.0, -1.0,  1.0], [ 1.0, -1.0, -1.0], [ 0.0,  1.0,  0.0], // right
    [ 1.0, -1.0, -1.0], [-1.0, -1.0, -1.0], [ 0.0,  1.0,  0.0], // back
    [-1.0, -1.0, -1.0], [-1.0, -1.0,  1.0], [ 0.0,  1.0,  0.0], // left
    [-1.0, -1.0, -1.0], [ 1.0, -1.0,  1.0], [-1.0, -1.0,  1.0], // base, left front
    [ 1.0, -1.0,  1.0], [-1.0, -1.0, -1.0], [ 1.0, -1.0, -1.0], // base, right back
];

#[rustfmt::skip]
const PYRAMID_TEX_COORDS: [[f32; 2]; 18] = [
    [0.0, 0.0], [1.0, 0.0], [0.5, 1.0],
    [0.0, 0.0], [1.0, 0.0], [0.5, 1.0],
    [0.0, 0.0], [1.0, 0.0], [0.5, 1.0],
    [0.0, 0.0], [1.0, 0.0], [0.5, 1.0],
    [0.0, 0.0], [1.0, 1.0], [0.0, 1.0],
    [1.0, 1.0], [0.0, 0.0], [1.0, 0.0],
];

/// Generate the 2x2x2 cube centered at the origin as 12 pre-expanded
/// triangles with clockwise front faces.
///
/// Texture coordinates are the face-plane projection of each corner.
pub fn generate_cube() -> Mesh {
    let positions = CUBE_POSITIONS.to_vec();
    let normals = flat_normals(&positions, Winding::Clockwise);
    let tex_coords = positions
        .iter()
        .zip(&normals)
        .map(|(p, n)| {
            // drop the axis the face is perpendicular to
            let (u, v) = if n[0].abs() > 0.5 {
                (p[2], p[1])
            } else if n[1].abs() > 0.5 {
                (p[0], p[2])
            } else {
                (p[0], p[1])
            };
            [(u + 1.0) * 0.5, (v + 1.0) * 0.5]
        })
        .collect();

    Mesh {
        positions,
        normals,
        tex_coords,
        ..Default::default()
    }
}

/// Generate the square pyramid (apex at +Y) as 6 pre-expanded triangles
/// with counter-clockwise front faces.
pub fn generate_pyramid() -> Mesh {
    let positions = PYRAMID_POSITIONS.to_vec();
    let normals = flat_normals(&positions, Winding::CounterClockwise);

    Mesh {
        positions,
        normals,
        tex_coords: PYRAMID_TEX_COORDS.to_vec(),
        ..Default::default()
    }
}

/// Per-triangle face normals for a pre-expanded triangle list, oriented
/// towards the side the given winding treats as front.
pub fn flat_normals(positions: &[[f32; 3]], winding: Winding) -> Vec<[f32; 3]> {
    let mut normals = Vec::with_capacity(positions.len());
    for triangle in positions.chunks_exact(3) {
        let a = Vector3::from(triangle[0]);
        let b = Vector3::from(triangle[1]);
        let c = Vector3::from(triangle[2]);
        let mut normal = (b - a).cross(c - a);
        if winding == Winding::Clockwise {
            normal = -normal;
        }
        let normal: [f32; 3] = if normal.magnitude2() > 0.0 {
            normal.normalize().into()
        } else {
            [0.0, 0.0, 0.0]
        };
        normals.extend_from_slice(&[normal; 3]);
    }
    normals
}
