//! Error types shared by the geometry, scene and rendering layers.

use std::path::PathBuf;

/// Result alias used throughout the crate.
pub type Result<T> = std::result::Result<T, Error>;

/// Everything that can go wrong while building meshes, loading assets or
/// talking to the GPU backend.
///
/// Scene traversal itself is infallible once its inputs are validated, so
/// there are no render-time variants here.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Model text that does not follow the supported OBJ subset. `line` is
    /// 1-based and absent when the parser cannot point at a single record.
    #[error("malformed input{}: {reason}", at_line(.line))]
    MalformedInput { line: Option<usize>, reason: String },

    /// A caller-supplied parameter outside its valid range, or mesh data
    /// that breaks the mesh invariants.
    #[error("invalid {name}: {reason}")]
    Precondition { name: &'static str, reason: String },

    #[error("failed to read `{}`", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to decode texture `{}`", path.display())]
    Texture {
        path: PathBuf,
        #[source]
        source: image::ImageError,
    },

    #[error(
        "texture `{}` is {width}x{height}, larger than the {max} texel limit",
        path.display()
    )]
    TextureTooLarge {
        path: PathBuf,
        width: u32,
        height: u32,
        max: u32,
    },

    #[error("shader `{label}` failed to compile: {message}")]
    Shader { label: String, message: String },

    #[error("invalid configuration value for {key}: {reason}")]
    Config { key: String, reason: String },

    /// The GPU collaborator rejected a request (surface lost, unknown handle).
    #[error("render backend error: {0}")]
    Backend(String),
}

impl Error {
    pub(crate) fn precondition(name: &'static str, reason: impl Into<String>) -> Self {
        Error::Precondition {
            name,
            reason: reason.into(),
        }
    }

    pub(crate) fn malformed(line: impl Into<Option<usize>>, reason: impl Into<String>) -> Self {
        Error::MalformedInput {
            line: line.into(),
            reason: reason.into(),
        }
    }
}

fn at_line(line: &Option<usize>) -> String {
    line.map(|line| format!(" at line {}", line))
        .unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_messages_name_the_offending_value() {
        let err = Error::precondition("slices", "must be at least 1, got 0");
        assert_eq!(err.to_string(), "invalid slices: must be at least 1, got 0");

        let err = Error::malformed(7, "face has 4 corners");
        assert_eq!(err.to_string(), "malformed input at line 7: face has 4 corners");

        let err = Error::malformed(None, "unexpected end of file");
        assert_eq!(err.to_string(), "malformed input: unexpected end of file");
    }

    #[test]
    fn test_io_errors_keep_their_source() {
        use std::error::Error as _;

        let err = Error::Io {
            path: PathBuf::from("missing.obj"),
            source: std::io::Error::new(std::io::ErrorKind::NotFound, "gone"),
        };
        assert!(err.to_string().contains("missing.obj"));
        assert!(err.source().is_some());
    }
}
