//! Triangulated OBJ import.
//!
//! Parsing is done by `tobj` with separate attribute indices. Only
//! three-corner `f p/t/n` faces are accepted; the result is
//! triangle-expanded, so shared corners are duplicated per face and no index
//! buffer is produced.

use std::path::Path;

use log::{debug, info};

use super::Mesh;
use crate::error::{Error, Result};

/// Reads and parses an OBJ file.
pub fn load_obj(path: impl AsRef<Path>) -> Result<Mesh> {
    let path = path.as_ref();
    let text = std::fs::read_to_string(path).map_err(|source| Error::Io {
        path: path.to_path_buf(),
        source,
    })?;
    let mesh = parse_obj(&text)?;
    info!(
        "Loaded model {} ({} triangles)",
        path.display(),
        mesh.triangle_count()
    );
    Ok(mesh)
}

/// Parses OBJ text into a triangle-expanded mesh.
///
/// Any face that is not a triangle, that leaves out its texture coordinate
/// or normal reference, or that references an attribute the file does not
/// declare fails the whole parse. Material libraries are not read.
pub fn parse_obj(text: &str) -> Result<Mesh> {
    let face_lines = face_lines(text)?;

    let options = tobj::LoadOptions {
        triangulate: false,
        single_index: false,
        ..Default::default()
    };
    let (models, _materials) = tobj::load_obj_buf(&mut text.as_bytes(), &options, |_| {
        Err(tobj::LoadError::OpenFileFailed)
    })
    .map_err(|e| Error::malformed(None, e.to_string()))?;

    let mut mesh = Mesh::new();
    let mut face_offset = 0;

    for model in &models {
        let source = &model.mesh;

        // tobj leaves the arity list empty when every face is a triangle
        let face_count = if source.face_arities.is_empty() {
            source.indices.len() / 3
        } else {
            source.face_arities.len()
        };

        for (face, arity) in source.face_arities.iter().enumerate() {
            if *arity != 3 {
                return Err(Error::malformed(
                    face_lines.get(face_offset + face).copied(),
                    format!(
                        "face has {} corners, only triangulated faces are supported",
                        arity
                    ),
                ));
            }
        }
        if source.indices.len() != face_count * 3 {
            return Err(Error::malformed(
                None,
                format!("model `{}` has a partial face", model.name),
            ));
        }
        if source.texcoord_indices.len() != source.indices.len() {
            return Err(Error::malformed(
                None,
                format!(
                    "model `{}` has face corners without a texture coordinate reference",
                    model.name
                ),
            ));
        }
        if source.normal_indices.len() != source.indices.len() {
            return Err(Error::malformed(
                None,
                format!(
                    "model `{}` has face corners without a normal reference",
                    model.name
                ),
            ));
        }

        for corner in 0..source.indices.len() {
            mesh.positions
                .push(attribute(&source.positions, source.indices[corner], "position")?);
            mesh.tex_coords.push(attribute(
                &source.texcoords,
                source.texcoord_indices[corner],
                "texture coordinate",
            )?);
            mesh.normals
                .push(attribute(&source.normals, source.normal_indices[corner], "normal")?);
        }

        face_offset += face_count;
    }

    debug!(
        "OBJ: {} models, {} faces -> {} corners",
        models.len(),
        face_offset,
        mesh.vertex_count()
    );
    Ok(mesh)
}

/// Line numbers of the `f` records in file order. Every reference on them
/// must be a positive, absolute index; relative (negative) references are
/// not supported.
fn face_lines(text: &str) -> Result<Vec<usize>> {
    let mut lines = Vec::new();

    for (number, line) in text.lines().enumerate() {
        let line_no = number + 1;
        let mut tokens = line.split_whitespace();
        if tokens.next() != Some("f") {
            continue;
        }

        for corner in tokens {
            for reference in corner.split('/').filter(|r| !r.is_empty()) {
                if !matches!(reference.parse::<i64>(), Ok(index) if index > 0) {
                    return Err(Error::malformed(
                        line_no,
                        format!(
                            "`{}` in face corner `{}` is not a positive index",
                            reference, corner
                        ),
                    ));
                }
            }
        }
        lines.push(line_no);
    }

    Ok(lines)
}

/// Reads element `index` of a flat attribute pool with `N` components each.
fn attribute<const N: usize>(pool: &[f32], index: u32, what: &str) -> Result<[f32; N]> {
    let start = index as usize * N;
    pool.get(start..start + N)
        .and_then(|values| <[f32; N]>::try_from(values).ok())
        .ok_or_else(|| {
            Error::malformed(
                None,
                format!("{} index {} out of range", what, index as usize + 1),
            )
        })
}

#[cfg(test)]
mod tests {
    use super::*;

    const TRIANGLE: &str = "\
# one triangle
v 0.0 0.0 0.0
vt 0.0 0.0
vn 0.0 0.0 1.0
v 1.0 0.0 0.0
vt 1.0 0.0
vn 0.0 1.0 0.0
v 0.0 1.0 0.0
vt 0.0 1.0
vn 1.0 0.0 0.0
f 1/1/1 2/2/2 3/3/3
";

    #[test]
    fn test_single_triangle_import() {
        let mesh = parse_obj(TRIANGLE).unwrap();
        assert_eq!(mesh.positions, vec![[0.0, 0.0, 0.0], [1.0, 0.0, 0.0], [0.0, 1.0, 0.0]]);
        assert_eq!(mesh.tex_coords, vec![[0.0, 0.0], [1.0, 0.0], [0.0, 1.0]]);
        assert_eq!(mesh.normals, vec![[0.0, 0.0, 1.0], [0.0, 1.0, 0.0], [1.0, 0.0, 0.0]]);
        assert!(mesh.indices.is_none());
        assert!(mesh.validate().is_ok());
    }

    #[test]
    fn test_attributes_are_indexed_separately() {
        let text = "\
v 0 0 0
v 1 0 0
v 0 1 0
vt 0.25 0.75
vn 0 0 1
vn 0 0 -1
f 3/1/2 1/1/1 2/1/2
";
        let mesh = parse_obj(text).unwrap();
        assert_eq!(mesh.positions, vec![[0.0, 1.0, 0.0], [0.0, 0.0, 0.0], [1.0, 0.0, 0.0]]);
        assert_eq!(mesh.tex_coords, vec![[0.25, 0.75]; 3]);
        assert_eq!(mesh.normals[0], [0.0, 0.0, -1.0]);
        assert_eq!(mesh.normals[1], [0.0, 0.0, 1.0]);
    }

    #[test]
    fn test_shared_corners_are_duplicated_in_face_order() {
        let text = format!("{}f 3/3/3 2/2/2 1/1/1\n", TRIANGLE);
        let mesh = parse_obj(&text).unwrap();
        assert_eq!(mesh.vertex_count(), 6);
        assert_eq!(mesh.positions[3], [0.0, 1.0, 0.0]);
        assert_eq!(mesh.positions[5], [0.0, 0.0, 0.0]);
    }

    #[test]
    fn test_unrelated_lines_are_ignored() {
        let text = format!("mtllib ship.mtl\no Ship\ns off\nusemtl hull\r\n{}", TRIANGLE);
        assert_eq!(parse_obj(&text).unwrap().vertex_count(), 3);
    }

    #[test]
    fn test_quads_are_rejected_at_their_line() {
        let text = "v 0 0 0\nv 1 0 0\nv 1 1 0\nv 0 1 0\nvt 0 0\nvn 0 0 1\nf 1/1/1 2/1/1 3/1/1 4/1/1\n";
        match parse_obj(text) {
            Err(Error::MalformedInput { line, reason }) => {
                assert_eq!(line, Some(7));
                assert!(reason.contains("4 corners"));
            }
            other => panic!("expected malformed input, got {:?}", other),
        }
    }

    #[test]
    fn test_later_faces_are_reported_at_their_line() {
        let text = format!("{}f 3/3/3 2/2/2 1/1/1\nf 1/1/1 2/2/2 3/3/3 1/1/1 2/2/2\n", TRIANGLE);
        match parse_obj(&text) {
            Err(Error::MalformedInput { line, reason }) => {
                assert_eq!(line, Some(13));
                assert!(reason.contains("5 corners"));
            }
            other => panic!("expected malformed input, got {:?}", other),
        }
        let text = format!("{}f 1/1/1 2/2/2\n", TRIANGLE);
        assert!(matches!(parse_obj(&text), Err(Error::MalformedInput { .. })));
    }

    #[test]
    fn test_out_of_range_and_non_positive_indices_are_rejected() {
        let text = TRIANGLE.replace("f 1/1/1 2/2/2 3/3/3", "f 1/1/1 2/2/2 4/3/3");
        assert!(matches!(parse_obj(&text), Err(Error::MalformedInput { .. })));

        let text = TRIANGLE.replace("f 1/1/1 2/2/2 3/3/3", "f 0/1/1 2/2/2 3/3/3");
        assert!(matches!(
            parse_obj(&text),
            Err(Error::MalformedInput { line: Some(11), .. })
        ));

        let text = TRIANGLE.replace("f 1/1/1 2/2/2 3/3/3", "f -1/1/1 2/2/2 3/3/3");
        assert!(matches!(
            parse_obj(&text),
            Err(Error::MalformedInput { line: Some(11), .. })
        ));
    }

    #[test]
    fn test_missing_corner_components_are_rejected() {
        let text = TRIANGLE.replace("f 1/1/1 2/2/2 3/3/3", "f 1//1 2/2/2 3/3/3");
        assert!(matches!(parse_obj(&text), Err(Error::MalformedInput { .. })));

        let text = TRIANGLE.replace("f 1/1/1 2/2/2 3/3/3", "f 1/1 2/2 3/3");
        assert!(matches!(parse_obj(&text), Err(Error::MalformedInput { .. })));

        let text = TRIANGLE.replace("f 1/1/1 2/2/2 3/3/3", "f 1 2 3");
        assert!(matches!(parse_obj(&text), Err(Error::MalformedInput { .. })));
    }

    #[test]
    fn test_bad_numbers_are_rejected() {
        assert!(matches!(
            parse_obj("v 1.0 nope 0.0\n"),
            Err(Error::MalformedInput { .. })
        ));
        assert!(matches!(
            parse_obj(&TRIANGLE.replace("f 1/1/1", "f x/1/1")),
            Err(Error::MalformedInput { line: Some(11), .. })
        ));
    }

    #[test]
    fn test_missing_file_is_an_io_error() {
        assert!(matches!(
            load_obj("definitely/not/here.obj"),
            Err(Error::Io { .. })
        ));
    }
}
