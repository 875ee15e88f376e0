//! Reads shader artifacts from named resources.
//!
//! The name → path mapping follows the build mode: source text lives under a
//! search root with the source suffix, precompiled binaries sit next to the
//! executable (or under a configured root) with the binary suffix. Actual
//! byte access goes through [`ResourceLoader`] so callers can swap the
//! filesystem for a romfs or archive reader.

use std::fs;
use std::io::{self, Read};
use std::path::{Path, PathBuf};

use shader_config::LoaderConfig;

use crate::error::ShaderError;
use crate::types::BuildMode;

/// Opens a resource by path and returns its full contents.
pub trait ResourceLoader {
    fn open(&self, path: &Path) -> io::Result<Vec<u8>>;
}

/// Plain filesystem access.
#[derive(Debug, Clone, Copy, Default)]
pub struct FsLoader;

impl ResourceLoader for FsLoader {
    fn open(&self, path: &Path) -> io::Result<Vec<u8>> {
        fs::read(path)
    }
}

/// Resolves shader names to paths and reads them.
pub struct ShaderLoader {
    config: LoaderConfig,
    resources: Box<dyn ResourceLoader>,
}

impl ShaderLoader {
    pub fn new(config: LoaderConfig) -> Self {
        Self::with_resources(config, FsLoader)
    }

    pub fn with_resources(config: LoaderConfig, resources: impl ResourceLoader + 'static) -> Self {
        Self {
            config,
            resources: Box::new(resources),
        }
    }

    pub fn config(&self) -> &LoaderConfig {
        &self.config
    }

    pub fn resolve(&self, name: &str, mode: BuildMode) -> PathBuf {
        match mode {
            BuildMode::Source => self.config.source_path(name),
            BuildMode::Binary => self.config.binary_path(name),
        }
    }

    /// Reads the artifact for `name`, returning the resolved path alongside it.
    pub fn read(&self, name: &str, mode: BuildMode) -> Result<(PathBuf, Vec<u8>), ShaderError> {
        let path = self.resolve(name, mode);
        match self.resources.open(&path) {
            Ok(bytes) => {
                tracing::debug!(path = %path.display(), len = bytes.len(), "read shader file");
                Ok((path, bytes))
            }
            Err(source) => Err(ShaderError::ResourceNotFound { path, source }),
        }
    }
}

impl Default for ShaderLoader {
    fn default() -> Self {
        Self::new(LoaderConfig::default())
    }
}

impl std::fmt::Debug for ShaderLoader {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ShaderLoader")
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

/// Drains a reader into a buffer, mapping failures onto the resource error.
pub(crate) fn read_stream(
    mut reader: impl Read,
    label: &Path,
) -> Result<Vec<u8>, ShaderError> {
    let mut buffer = Vec::new();
    reader
        .read_to_end(&mut buffer)
        .map_err(|source| ShaderError::ResourceNotFound {
            path: label.to_path_buf(),
            source,
        })?;
    Ok(buffer)
}

pub(crate) fn source_text(bytes: Vec<u8>, path: &Path) -> Result<String, ShaderError> {
    String::from_utf8(bytes).map_err(|_| ShaderError::InvalidUtf8 {
        path: path.to_path_buf(),
    })
}
