//! The narrow seam between shader resources and a graphics backend.
//!
//! One implementation exists per target (the console's binary-shader GPU, a
//! desktop GL emulation build, [`crate::headless::HeadlessDriver`]) and it is
//! chosen when the driver value is constructed, never per call.
//!
//! All methods take `&self`: the driver stands for the thread's current
//! context, which is external, mutable state owned by the GPU and not by Rust.

use crate::types::{
    BuildMode, ProgramHandle, ShaderObject, Stage, TextureHandle, UniformLocation, UniformValue,
};

/// What the backend can do, queried once per shader instance.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Capabilities {
    pub shaders: bool,
    pub build_mode: BuildMode,
}

pub trait Driver {
    fn capabilities(&self) -> Capabilities;

    fn create_program(&self) -> Result<ProgramHandle, String>;
    fn delete_program(&self, program: ProgramHandle);

    fn create_shader(&self, stage: Stage) -> Result<ShaderObject, String>;
    fn shader_source(&self, shader: ShaderObject, source: &str);
    fn compile_shader(&self, shader: ShaderObject);
    fn compile_status(&self, shader: ShaderObject) -> bool;
    fn shader_info_log(&self, shader: ShaderObject) -> String;
    fn attach_shader(&self, program: ProgramHandle, shader: ShaderObject);
    fn delete_shader(&self, shader: ShaderObject);

    fn link_program(&self, program: ProgramHandle);
    fn link_status(&self, program: ProgramHandle) -> bool;
    fn program_info_log(&self, program: ProgramHandle) -> String;

    /// Loads a precompiled stage blob. The driver validates the bytes.
    fn program_binary(&self, program: ProgramHandle, stage: Stage, data: &[u8]);

    fn uniform_location(&self, program: ProgramHandle, name: &str) -> Option<UniformLocation>;
    /// Pushes a value into the program that is currently in use.
    fn set_uniform(&self, location: UniformLocation, value: UniformValue);

    fn max_combined_texture_units(&self) -> u32;
    fn active_texture(&self, unit: u32);
    /// Binds `texture` to `unit`, leaving `unit` active.
    fn bind_texture(&self, unit: u32, texture: TextureHandle);

    fn current_program(&self) -> Option<ProgramHandle>;
    fn use_program(&self, program: Option<ProgramHandle>);

    fn flush(&self);
}

/// Whether the backend behind `driver` can run shaders at all.
pub fn is_available<D: Driver + ?Sized>(driver: &D) -> bool {
    driver.capabilities().shaders
}
