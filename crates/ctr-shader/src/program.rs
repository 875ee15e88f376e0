//! Shader programs and their per-program parameter state.
//!
//! A [`Shader`] owns at most one driver program. Its build path is fixed at
//! construction: `Source` shaders compile and link text, `Binary` shaders
//! feed precompiled per-stage blobs to the driver, one stage at a time.
//!
//! Parameters are resolved by name once per build and remembered, including
//! names the program does not declare. Scalar, vector and matrix values are
//! pushed immediately; textures are recorded and only committed to texture
//! units when the shader is bound for drawing (see [`crate::ShaderBinder`]).
//!
//! Failures are reported twice: as a `tracing` diagnostic at the point of
//! failure and as the `Err` of the build call. Setting parameters never fails
//! loudly; problems there are diagnostics only.

use std::fmt;
use std::io::Read;
use std::path::Path;
use std::rc::Rc;

use shader_config::{ModeSetting, ShaderConfig};

use crate::driver::{self, Driver};
use crate::error::ShaderError;
use crate::loader::{read_stream, source_text, ShaderLoader};
use crate::params::ParameterCache;
use crate::textures::{TextureBindings, CURRENT_TEXTURE_UNIT};
use crate::types::{
    BuildMode, Parameter, ProgramHandle, Stage, TextureHandle, UniformLocation, UniformValue,
};

const STREAM_LABEL: &str = "<stream>";

pub struct Shader<D: Driver + ?Sized> {
    driver: Rc<D>,
    mode: BuildMode,
    loader: ShaderLoader,
    program: Option<ProgramHandle>,
    params: ParameterCache,
    textures: TextureBindings,
    current_texture: Option<UniformLocation>,
    loaded_stages: Vec<Stage>,
}

impl<D: Driver + ?Sized> Shader<D> {
    /// Creates an empty shader that builds the way `driver` reports it can.
    pub fn new(driver: Rc<D>) -> Self {
        let mode = driver.capabilities().build_mode;
        Self::with_loader(driver, mode, ShaderLoader::default())
    }

    pub fn from_config(driver: Rc<D>, config: &ShaderConfig) -> Self {
        let mode = match config.mode {
            ModeSetting::Auto => driver.capabilities().build_mode,
            ModeSetting::Source => BuildMode::Source,
            ModeSetting::Binary => BuildMode::Binary,
        };
        Self::with_loader(driver, mode, ShaderLoader::new(config.loader.clone()))
    }

    /// Creates an empty shader with an explicit loader.
    ///
    /// `mode` is a request: a driver only offers one build path, and when it
    /// differs the driver's path wins and a warning is emitted.
    pub fn with_loader(driver: Rc<D>, mode: BuildMode, loader: ShaderLoader) -> Self {
        let supported = driver.capabilities().build_mode;
        if mode != supported {
            tracing::warn!(
                requested = %mode,
                supported = %supported,
                "graphics driver cannot build {mode} shaders, using {supported} mode instead"
            );
        }
        Self {
            driver,
            mode: supported,
            loader,
            program: None,
            params: ParameterCache::default(),
            textures: TextureBindings::default(),
            current_texture: None,
            loaded_stages: Vec::new(),
        }
    }

    pub fn build_mode(&self) -> BuildMode {
        self.mode
    }

    pub fn is_available(&self) -> bool {
        driver::is_available(&*self.driver)
    }

    pub fn is_built(&self) -> bool {
        self.program.is_some()
    }

    pub fn program(&self) -> Option<ProgramHandle> {
        self.program
    }

    /// Driver name of the program, `0` while nothing is built.
    pub fn native_handle(&self) -> u32 {
        self.program.map_or(0, ProgramHandle::get)
    }

    /// Binary stages loaded into the current program, in load order.
    pub fn loaded_stages(&self) -> &[Stage] {
        &self.loaded_stages
    }

    pub fn cached_parameter_count(&self) -> usize {
        self.params.len()
    }

    pub fn bound_texture_count(&self) -> usize {
        self.textures.len()
    }

    /// Loads the named shader file for `stage`.
    ///
    /// In source mode `name` resolves to `<search_root>/<name>.<source_ext>`
    /// and is compiled as a single-stage program; in binary mode it resolves
    /// to `<binary_root>/<name>.<binary_ext>` and is loaded into the program.
    pub fn load_from_file(&mut self, name: &str, stage: Stage) -> Result<(), ShaderError> {
        self.ensure_available()
            .and_then(|()| {
                let (path, bytes) = self.loader.read(name, self.mode)?;
                self.build_from_bytes(bytes, &path, stage)
            })
            .map_err(diagnose)
    }

    /// Compiles a vertex and a fragment source file into one program.
    pub fn load_from_files(
        &mut self,
        vertex_name: &str,
        fragment_name: &str,
    ) -> Result<(), ShaderError> {
        self.ensure_available()
            .and_then(|()| {
                if self.mode == BuildMode::Binary {
                    return Err(ShaderError::UnsupportedStage {
                        stage: Stage::Fragment,
                        mode: self.mode,
                    });
                }
                let (vertex_path, vertex) = self.loader.read(vertex_name, self.mode)?;
                let (fragment_path, fragment) = self.loader.read(fragment_name, self.mode)?;
                let vertex = source_text(vertex, &vertex_path)?;
                let fragment = source_text(fragment, &fragment_path)?;
                self.compile(Some(&vertex), Some(&fragment))
            })
            .map_err(diagnose)
    }

    /// Compiles in-memory source text for a single stage.
    pub fn load_from_memory(&mut self, source: &str, stage: Stage) -> Result<(), ShaderError> {
        self.compile_stage_source(source, stage).map_err(diagnose)
    }

    pub fn load_from_memory_pair(&mut self, vertex: &str, fragment: &str) -> Result<(), ShaderError> {
        self.compile(Some(vertex), Some(fragment)).map_err(diagnose)
    }

    /// Reads `reader` to the end and builds from its contents as
    /// [`Shader::load_from_file`] would.
    pub fn load_from_reader(&mut self, reader: impl Read, stage: Stage) -> Result<(), ShaderError> {
        self.ensure_available()
            .and_then(|()| {
                let label = Path::new(STREAM_LABEL);
                let bytes = read_stream(reader, label)?;
                self.build_from_bytes(bytes, label, stage)
            })
            .map_err(diagnose)
    }

    /// Compiles and links a program from source text.
    ///
    /// Any previous program is released first, so a failed rebuild leaves the
    /// shader empty rather than holding the old program.
    pub fn compile_from_source(
        &mut self,
        vertex: Option<&str>,
        fragment: Option<&str>,
    ) -> Result<(), ShaderError> {
        self.compile(vertex, fragment).map_err(diagnose)
    }

    /// Hands one precompiled stage to the driver.
    ///
    /// The program is created on first use and kept across stages, so a
    /// vertex and a geometry binary can be loaded one after the other.
    pub fn load_precompiled(&mut self, data: &[u8], stage: Stage) -> Result<(), ShaderError> {
        self.load_binary(data, stage).map_err(diagnose)
    }

    /// Sets a named parameter. Does nothing until a program is built.
    ///
    /// Textures are only recorded here; they reach texture units when the
    /// shader is bound.
    pub fn set_parameter(&mut self, name: &str, value: impl Into<Parameter>) {
        let Some(program) = self.program else {
            return;
        };

        match value.into() {
            Parameter::Uniform(value) => self.set_uniform(program, name, value),
            Parameter::Texture(texture) => self.set_texture(program, name, texture),
            Parameter::CurrentTexture => {
                self.current_texture = self.resolve(program, name);
            }
        }
    }

    /// Makes this program current and commits its textures.
    pub(crate) fn activate(&self) {
        self.driver.use_program(self.program);
        self.commit_textures();
    }

    fn commit_textures(&self) {
        if self.textures.is_empty() && self.current_texture.is_none() {
            return;
        }

        for (unit, location, texture) in self.textures.units() {
            self.driver.set_uniform(location, UniformValue::Sampler(unit));
            self.driver.bind_texture(unit, texture);
        }

        if let Some(location) = self.current_texture {
            self.driver
                .set_uniform(location, UniformValue::Sampler(CURRENT_TEXTURE_UNIT));
        }

        self.driver.active_texture(CURRENT_TEXTURE_UNIT);
    }

    fn set_uniform(&mut self, program: ProgramHandle, name: &str, value: UniformValue) {
        let Some(location) = self.resolve(program, name) else {
            return;
        };

        let previous = self.driver.current_program();
        self.driver.use_program(Some(program));
        self.driver.set_uniform(location, value);
        self.driver.use_program(previous);
    }

    fn set_texture(&mut self, program: ProgramHandle, name: &str, texture: TextureHandle) {
        let Some(location) = self.resolve(program, name) else {
            return;
        };

        let driver = &self.driver;
        if let Err(exhausted) = self
            .textures
            .set(location, texture, || driver.max_combined_texture_units())
        {
            tracing::warn!(
                parameter = name,
                max_units = exhausted.max_units,
                "impossible to use texture \"{name}\" for shader: all available texture units are used"
            );
        }
    }

    fn resolve(&mut self, program: ProgramHandle, name: &str) -> Option<UniformLocation> {
        let driver = &self.driver;
        self.params
            .resolve(name, |name| driver.uniform_location(program, name))
    }

    fn ensure_available(&self) -> Result<(), ShaderError> {
        if self.is_available() {
            Ok(())
        } else {
            Err(ShaderError::CapabilityUnavailable)
        }
    }

    fn build_from_bytes(
        &mut self,
        bytes: Vec<u8>,
        path: &Path,
        stage: Stage,
    ) -> Result<(), ShaderError> {
        match self.mode {
            BuildMode::Source => {
                let source = source_text(bytes, path)?;
                self.compile_stage_source(&source, stage)
            }
            BuildMode::Binary => self.load_binary(&bytes, stage),
        }
    }

    fn compile_stage_source(&mut self, source: &str, stage: Stage) -> Result<(), ShaderError> {
        self.ensure_available()?;
        if self.mode != BuildMode::Source {
            return Err(ShaderError::WrongBuildPath { mode: self.mode });
        }
        match stage {
            Stage::Vertex => self.compile(Some(source), None),
            Stage::Fragment => self.compile(None, Some(source)),
            Stage::Geometry => Err(ShaderError::UnsupportedStage {
                stage,
                mode: BuildMode::Source,
            }),
        }
    }

    fn compile(&mut self, vertex: Option<&str>, fragment: Option<&str>) -> Result<(), ShaderError> {
        self.ensure_available()?;
        if self.mode != BuildMode::Source {
            return Err(ShaderError::WrongBuildPath { mode: self.mode });
        }

        let vertex = vertex.filter(|source| !source.is_empty());
        let fragment = fragment.filter(|source| !source.is_empty());
        if vertex.is_none() && fragment.is_none() {
            return Err(ShaderError::EmptySource);
        }

        self.release();

        let program = self.driver.create_program().map_err(ShaderError::Driver)?;
        for (stage, source) in [(Stage::Vertex, vertex), (Stage::Fragment, fragment)] {
            let Some(source) = source else {
                continue;
            };
            if let Err(err) = self.attach_stage(program, stage, source) {
                self.driver.delete_program(program);
                return Err(err);
            }
        }

        self.driver.link_program(program);
        if !self.driver.link_status(program) {
            let log = self.driver.program_info_log(program);
            self.driver.delete_program(program);
            return Err(ShaderError::LinkFailed { log });
        }

        self.program = Some(program);
        // Other contexts sharing this program must observe the new build immediately.
        self.driver.flush();
        tracing::debug!(program = program.get(), "linked shader program");
        Ok(())
    }

    fn attach_stage(
        &self,
        program: ProgramHandle,
        stage: Stage,
        source: &str,
    ) -> Result<(), ShaderError> {
        let shader = self
            .driver
            .create_shader(stage)
            .map_err(ShaderError::Driver)?;
        self.driver.shader_source(shader, source);
        self.driver.compile_shader(shader);

        if !self.driver.compile_status(shader) {
            let log = self.driver.shader_info_log(shader);
            self.driver.delete_shader(shader);
            return Err(ShaderError::CompileFailed { stage, log });
        }

        self.driver.attach_shader(program, shader);
        self.driver.delete_shader(shader);
        Ok(())
    }

    fn load_binary(&mut self, data: &[u8], stage: Stage) -> Result<(), ShaderError> {
        self.ensure_available()?;
        if self.mode != BuildMode::Binary {
            return Err(ShaderError::WrongBuildPath { mode: self.mode });
        }
        if data.is_empty() {
            return Err(ShaderError::EmptySource);
        }
        if !matches!(stage, Stage::Vertex | Stage::Geometry) {
            return Err(ShaderError::UnsupportedStage {
                stage,
                mode: self.mode,
            });
        }

        let program = match self.program {
            Some(program) => program,
            None => {
                let program = self.driver.create_program().map_err(ShaderError::Driver)?;
                tracing::debug!(program = program.get(), "created shader program");
                self.program = Some(program);
                program
            }
        };

        self.reset_parameters();
        self.driver.program_binary(program, stage, data);
        if !self.loaded_stages.contains(&stage) {
            self.loaded_stages.push(stage);
        }
        tracing::debug!(program = program.get(), %stage, len = data.len(), "loaded shader binary");
        Ok(())
    }

    fn release(&mut self) {
        if let Some(program) = self.program.take() {
            self.driver.delete_program(program);
            tracing::debug!(program = program.get(), "released shader program");
        }
        self.loaded_stages.clear();
        self.reset_parameters();
    }

    fn reset_parameters(&mut self) {
        self.current_texture = None;
        self.textures.clear();
        self.params.clear();
    }
}

impl<D: Driver + ?Sized> Drop for Shader<D> {
    fn drop(&mut self) {
        if let Some(program) = self.program.take() {
            self.driver.delete_program(program);
        }
    }
}

impl<D: Driver + ?Sized> fmt::Debug for Shader<D> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Shader")
            .field("mode", &self.mode)
            .field("program", &self.program)
            .field("parameters", &self.params.len())
            .field("textures", &self.textures.len())
            .field("current_texture", &self.current_texture)
            .field("loaded_stages", &self.loaded_stages)
            .finish()
    }
}

fn diagnose(error: ShaderError) -> ShaderError {
    tracing::error!(error = %error, "{error}");
    error
}
