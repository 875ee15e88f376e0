use std::path::PathBuf;

use thiserror::Error;

use crate::types::{BuildMode, Stage};

#[derive(Debug, Error)]
pub enum ShaderError {
    #[error("failed to open shader file \"{}\": {source}", path.display())]
    ResourceNotFound {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("shader source \"{}\" is not valid UTF-8", path.display())]
    InvalidUtf8 { path: PathBuf },

    #[error("failed to compile {stage} shader:\n{log}")]
    CompileFailed { stage: Stage, log: String },

    #[error("failed to link shader:\n{log}")]
    LinkFailed { log: String },

    #[error("shaders are not supported by the active graphics driver")]
    CapabilityUnavailable,

    #[error("no shader source or binary data provided")]
    EmptySource,

    #[error("{stage} stage cannot be loaded in {mode} mode")]
    UnsupportedStage { stage: Stage, mode: BuildMode },

    #[error("this shader builds in {mode} mode and cannot take the other build path")]
    WrongBuildPath { mode: BuildMode },

    #[error("graphics driver error: {0}")]
    Driver(String),
}

/// Adding a new texture binding would exceed the driver's unit budget.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("all {max_units} texture units are in use")]
pub struct TextureUnitsExhausted {
    pub max_units: u32,
}
