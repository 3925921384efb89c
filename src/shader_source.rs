use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use thiserror::Error;

#[derive(Debug, Clone)]
pub struct ShaderSources {
    pub vertex: String,
    pub fragment: String,
}

impl ShaderSources {
    pub fn load<P: AsRef<Path>, Q: AsRef<Path>>(vert: P, frag: Q) -> Result<Self, SourceError> {
        Ok(Self {
            vertex: read_source(vert.as_ref())?,
            fragment: read_source(frag.as_ref())?,
        })
    }

    /// Cheap sanity check before handing the text to the driver.
    pub fn validate(&self) -> Result<(), SourceError> {
        check_version("vertex", &self.vertex)?;
        check_version("fragment", &self.fragment)
    }
}

fn read_source(path: &Path) -> Result<String, SourceError> {
    std::fs::read_to_string(path).map_err(|e| match e.kind() {
        ErrorKind::NotFound => SourceError::NotFound(path.to_owned()),
        _ => SourceError::Io(path.to_owned(), e),
    })
}

fn check_version(stage: &'static str, src: &str) -> Result<(), SourceError> {
    let first = src
        .lines()
        .map(str::trim)
        .find(|l| !l.is_empty() && !l.starts_with("//"));

    match first {
        Some(line) if line.starts_with("#version") => Ok(()),
        _ => Err(SourceError::MissingVersion(stage)),
    }
}

#[derive(Debug, Error)]
pub enum SourceError {
    #[error("shader file not found: {0:?}")]
    NotFound(PathBuf),
    #[error("could not read shader {0:?}: {1}")]
    Io(PathBuf, #[source] std::io::Error),
    #[error("{0} shader does not start with a #version directive")]
    MissingVersion(&'static str),
}

#[cfg(test)]
mod tests {
    use super::*;

    const SHADER_DIR: &str = concat!(env!("CARGO_MANIFEST_DIR"), "/shaders");

    #[test]
    fn bundled_shaders_are_valid() {
        let sources = ShaderSources::load(
            format!("{SHADER_DIR}/basic.vert"),
            format!("{SHADER_DIR}/basic.frag"),
        )
        .unwrap();

        sources.validate().unwrap();

        assert!(sources.vertex.contains("layout(location = 0) in vec3"));
        assert!(sources.vertex.contains("layout(location = 1) in vec2"));
        assert!(sources.vertex.contains("u_transform"));
        assert!(sources.fragment.contains("uniform sampler2D u_texture"));
    }

    #[test]
    fn missing_file_is_reported() {
        let err = ShaderSources::load("does/not/exist.vert", "neither.frag").unwrap_err();

        assert!(matches!(err, SourceError::NotFound(p) if p == Path::new("does/not/exist.vert")));
    }

    #[test]
    fn version_may_follow_comments() {
        check_version("vertex", "// header\n\n#version 330 core\nvoid main() {}").unwrap();
    }

    #[test]
    fn version_is_required() {
        let sources = ShaderSources {
            vertex: "#version 330 core\n".to_owned(),
            fragment: "void main() {}\n".to_owned(),
        };

        assert!(matches!(
            sources.validate(),
            Err(SourceError::MissingVersion("fragment"))
        ));
    }
}
