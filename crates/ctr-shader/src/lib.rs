//! Shader resources for the handheld's GPU backends.
//!
//! The crate is organised leaf to root:
//! - `loader` maps shader names onto files (source text or precompiled
//!   binaries) and reads them through a swappable [`ResourceLoader`].
//! - `driver` is the narrow backend seam; `headless` is a driver with no GPU
//!   behind it that records every call.
//! - `params` memoizes parameter locations per build; `textures` tracks which
//!   texture each sampler receives and which unit it gets.
//! - `program` is the [`Shader`] itself: build paths, parameter setters,
//!   lifecycle.
//! - `bind` holds [`ShaderBinder`], which makes programs current for drawing.
//!
//! Everything here assumes the calling thread owns the current GPU context.
//! Shaders share their driver through `Rc` and are neither `Send` nor `Sync`.

mod bind;
pub mod driver;
mod error;
pub mod headless;
mod loader;
mod params;
mod program;
mod textures;
mod types;

pub use bind::ShaderBinder;
pub use driver::{is_available, Capabilities, Driver};
pub use error::{ShaderError, TextureUnitsExhausted};
pub use headless::{DriverCall, HeadlessDriver};
pub use loader::{FsLoader, ResourceLoader, ShaderLoader};
pub use program::Shader;
pub use shader_config::{ConfigError, LoaderConfig, ModeSetting, ShaderConfig};
pub use types::{
    BuildMode, Color, CurrentTexture, Parameter, ProgramHandle, ShaderObject, Stage,
    TextureHandle, Transform, UniformLocation, UniformValue, Vector2f, Vector3f,
};
