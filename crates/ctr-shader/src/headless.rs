//! A driver with no GPU behind it.
//!
//! `HeadlessDriver` keeps just enough state to behave like a real context:
//! program and shader-object names, compile/link status with logs, uniform
//! locations, the current program and per-unit texture bindings. Every call
//! that would reach hardware is appended to a log so tools and tests can
//! inspect exactly what a shader resource asked the driver to do.
//!
//! Source "compilation" only checks that the text is non-empty and that its
//! brackets balance; uniform locations are assigned from `uniform`
//! declarations in attachment order. Binary programs expose whatever uniform
//! names the driver was configured with.

use std::cell::RefCell;
use std::collections::{BTreeMap, HashMap};
use std::num::NonZeroU32;

use crate::driver::{Capabilities, Driver};
use crate::types::{
    BuildMode, ProgramHandle, ShaderObject, Stage, TextureHandle, UniformLocation, UniformValue,
};

/// Matches the combined unit count of common GLES2-class hardware.
pub const DEFAULT_MAX_TEXTURE_UNITS: u32 = 8;

/// One recorded driver call.
#[derive(Debug, Clone, PartialEq)]
pub enum DriverCall {
    CreateProgram(ProgramHandle),
    DeleteProgram(ProgramHandle),
    CreateShader(Stage),
    CompileShader(Stage),
    DeleteShader(ShaderObject),
    AttachShader(ProgramHandle, ShaderObject),
    LinkProgram(ProgramHandle),
    ProgramBinary {
        program: ProgramHandle,
        stage: Stage,
        len: usize,
    },
    UniformLocation(String),
    SetUniform {
        program: Option<ProgramHandle>,
        location: UniformLocation,
        value: UniformValue,
    },
    MaxTextureUnits,
    ActiveTexture(u32),
    BindTexture {
        unit: u32,
        texture: TextureHandle,
    },
    CurrentProgram,
    UseProgram(Option<ProgramHandle>),
    Flush,
}

#[derive(Debug)]
pub struct HeadlessDriver {
    capabilities: Capabilities,
    max_texture_units: u32,
    binary_uniforms: Vec<String>,
    state: RefCell<State>,
}

#[derive(Debug)]
struct State {
    next_name: NonZeroU32,
    programs: HashMap<ProgramHandle, ProgramRecord>,
    shaders: HashMap<ShaderObject, ShaderRecord>,
    current: Option<ProgramHandle>,
    active_unit: u32,
    texture_units: BTreeMap<u32, TextureHandle>,
    link_failure: Option<String>,
    calls: Vec<DriverCall>,
}

#[derive(Debug, Default)]
struct ProgramRecord {
    attached: Vec<AttachedStage>,
    binaries: Vec<Stage>,
    linked: bool,
    log: String,
    uniforms: Vec<String>,
}

#[derive(Debug)]
struct AttachedStage {
    compiled: bool,
    uniforms: Vec<String>,
}

#[derive(Debug)]
struct ShaderRecord {
    stage: Stage,
    source: String,
    compiled: bool,
    log: String,
}

impl HeadlessDriver {
    pub fn new(build_mode: BuildMode) -> Self {
        Self {
            capabilities: Capabilities {
                shaders: true,
                build_mode,
            },
            max_texture_units: DEFAULT_MAX_TEXTURE_UNITS,
            binary_uniforms: Vec::new(),
            state: RefCell::new(State {
                next_name: NonZeroU32::MIN,
                programs: HashMap::new(),
                shaders: HashMap::new(),
                current: None,
                active_unit: 0,
                texture_units: BTreeMap::new(),
                link_failure: None,
                calls: Vec::new(),
            }),
        }
    }

    pub fn with_max_texture_units(mut self, units: u32) -> Self {
        self.max_texture_units = units;
        self
    }

    pub fn without_shader_support(mut self) -> Self {
        self.capabilities.shaders = false;
        self
    }

    /// Uniform names every precompiled program reports, in location order.
    pub fn with_binary_uniforms<I, S>(mut self, names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.binary_uniforms = names.into_iter().map(Into::into).collect();
        self
    }

    /// Makes the next link fail with `log`, whatever the sources look like.
    pub fn fail_next_link(&self, log: impl Into<String>) {
        self.state.borrow_mut().link_failure = Some(log.into());
    }

    pub fn calls(&self) -> Vec<DriverCall> {
        self.state.borrow().calls.clone()
    }

    pub fn clear_calls(&self) {
        self.state.borrow_mut().calls.clear();
    }

    pub fn count_calls(&self, predicate: impl Fn(&DriverCall) -> bool) -> usize {
        self.state
            .borrow()
            .calls
            .iter()
            .filter(|call| predicate(*call))
            .count()
    }

    /// Program in use, read without recording a call.
    pub fn bound_program(&self) -> Option<ProgramHandle> {
        self.state.borrow().current
    }

    pub fn live_programs(&self) -> usize {
        self.state.borrow().programs.len()
    }

    pub fn live_shader_objects(&self) -> usize {
        self.state.borrow().shaders.len()
    }

    pub fn bound_textures(&self) -> Vec<(u32, TextureHandle)> {
        self.state
            .borrow()
            .texture_units
            .iter()
            .map(|(unit, texture)| (*unit, *texture))
            .collect()
    }

    pub fn active_unit(&self) -> u32 {
        self.state.borrow().active_unit
    }

    pub fn loaded_binary_stages(&self, program: ProgramHandle) -> Vec<Stage> {
        self.state
            .borrow()
            .programs
            .get(&program)
            .map(|record| record.binaries.clone())
            .unwrap_or_default()
    }

    fn record(&self, call: DriverCall) {
        self.state.borrow_mut().calls.push(call);
    }
}

impl State {
    fn allocate_name(&mut self) -> Result<NonZeroU32, String> {
        let name = self.next_name;
        self.next_name = name
            .checked_add(1)
            .ok_or_else(|| "headless driver ran out of object names".to_string())?;
        Ok(name)
    }
}

impl Driver for HeadlessDriver {
    fn capabilities(&self) -> Capabilities {
        self.capabilities
    }

    fn create_program(&self) -> Result<ProgramHandle, String> {
        let mut state = self.state.borrow_mut();
        let program = ProgramHandle(state.allocate_name()?);
        state.programs.insert(program, ProgramRecord::default());
        state.calls.push(DriverCall::CreateProgram(program));
        Ok(program)
    }

    fn delete_program(&self, program: ProgramHandle) {
        let mut state = self.state.borrow_mut();
        state.programs.remove(&program);
        if state.current == Some(program) {
            state.current = None;
        }
        state.calls.push(DriverCall::DeleteProgram(program));
    }

    fn create_shader(&self, stage: Stage) -> Result<ShaderObject, String> {
        let mut state = self.state.borrow_mut();
        let shader = ShaderObject(state.allocate_name()?);
        state.shaders.insert(
            shader,
            ShaderRecord {
                stage,
                source: String::new(),
                compiled: false,
                log: String::new(),
            },
        );
        state.calls.push(DriverCall::CreateShader(stage));
        Ok(shader)
    }

    fn shader_source(&self, shader: ShaderObject, source: &str) {
        if let Some(record) = self.state.borrow_mut().shaders.get_mut(&shader) {
            record.source = source.to_string();
        }
    }

    fn compile_shader(&self, shader: ShaderObject) {
        let mut state = self.state.borrow_mut();
        let Some(record) = state.shaders.get_mut(&shader) else {
            return;
        };
        let stage = record.stage;
        match check_source(&record.source) {
            Ok(()) => {
                record.compiled = true;
                record.log.clear();
            }
            Err(log) => {
                record.compiled = false;
                record.log = log;
            }
        }
        state.calls.push(DriverCall::CompileShader(stage));
    }

    fn compile_status(&self, shader: ShaderObject) -> bool {
        self.state
            .borrow()
            .shaders
            .get(&shader)
            .is_some_and(|record| record.compiled)
    }

    fn shader_info_log(&self, shader: ShaderObject) -> String {
        self.state
            .borrow()
            .shaders
            .get(&shader)
            .map(|record| record.log.clone())
            .unwrap_or_default()
    }

    fn attach_shader(&self, program: ProgramHandle, shader: ShaderObject) {
        let mut state = self.state.borrow_mut();
        let attached = match state.shaders.get(&shader) {
            Some(record) => AttachedStage {
                compiled: record.compiled,
                uniforms: declared_uniforms(&record.source),
            },
            None => return,
        };
        if let Some(program_record) = state.programs.get_mut(&program) {
            program_record.attached.push(attached);
        }
        state.calls.push(DriverCall::AttachShader(program, shader));
    }

    fn delete_shader(&self, shader: ShaderObject) {
        let mut state = self.state.borrow_mut();
        state.shaders.remove(&shader);
        state.calls.push(DriverCall::DeleteShader(shader));
    }

    fn link_program(&self, program: ProgramHandle) {
        let mut state = self.state.borrow_mut();
        let forced_failure = state.link_failure.take();
        state.calls.push(DriverCall::LinkProgram(program));
        let Some(record) = state.programs.get_mut(&program) else {
            return;
        };

        let outcome = if let Some(log) = forced_failure {
            Err(log)
        } else if record.attached.is_empty() {
            Err("error: no shaders attached to program".to_string())
        } else if record.attached.iter().any(|stage| !stage.compiled) {
            Err("error: attached shader failed to compile".to_string())
        } else {
            Ok(())
        };

        match outcome {
            Ok(()) => {
                let mut uniforms: Vec<String> = Vec::new();
                for name in record.attached.iter().flat_map(|stage| &stage.uniforms) {
                    if !uniforms.contains(name) {
                        uniforms.push(name.clone());
                    }
                }
                record.uniforms = uniforms;
                record.linked = true;
                record.log.clear();
            }
            Err(log) => {
                record.uniforms.clear();
                record.linked = false;
                record.log = log;
            }
        }
    }

    fn link_status(&self, program: ProgramHandle) -> bool {
        self.state
            .borrow()
            .programs
            .get(&program)
            .is_some_and(|record| record.linked)
    }

    fn program_info_log(&self, program: ProgramHandle) -> String {
        self.state
            .borrow()
            .programs
            .get(&program)
            .map(|record| record.log.clone())
            .unwrap_or_default()
    }

    fn program_binary(&self, program: ProgramHandle, stage: Stage, data: &[u8]) {
        let mut state = self.state.borrow_mut();
        state.calls.push(DriverCall::ProgramBinary {
            program,
            stage,
            len: data.len(),
        });
        if let Some(record) = state.programs.get_mut(&program) {
            if !record.binaries.contains(&stage) {
                record.binaries.push(stage);
            }
            record.uniforms = self.binary_uniforms.clone();
            record.linked = true;
        }
    }

    fn uniform_location(&self, program: ProgramHandle, name: &str) -> Option<UniformLocation> {
        let mut state = self.state.borrow_mut();
        state.calls.push(DriverCall::UniformLocation(name.to_string()));
        let record = state.programs.get(&program)?;
        if !record.linked {
            return None;
        }
        record
            .uniforms
            .iter()
            .position(|uniform| uniform == name)
            .and_then(|index| u32::try_from(index).ok())
            .map(UniformLocation)
    }

    fn set_uniform(&self, location: UniformLocation, value: UniformValue) {
        let mut state = self.state.borrow_mut();
        let program = state.current;
        state.calls.push(DriverCall::SetUniform {
            program,
            location,
            value,
        });
    }

    fn max_combined_texture_units(&self) -> u32 {
        self.record(DriverCall::MaxTextureUnits);
        self.max_texture_units
    }

    fn active_texture(&self, unit: u32) {
        let mut state = self.state.borrow_mut();
        state.active_unit = unit;
        state.calls.push(DriverCall::ActiveTexture(unit));
    }

    fn bind_texture(&self, unit: u32, texture: TextureHandle) {
        let mut state = self.state.borrow_mut();
        state.active_unit = unit;
        state.texture_units.insert(unit, texture);
        state.calls.push(DriverCall::BindTexture { unit, texture });
    }

    fn current_program(&self) -> Option<ProgramHandle> {
        let mut state = self.state.borrow_mut();
        state.calls.push(DriverCall::CurrentProgram);
        state.current
    }

    fn use_program(&self, program: Option<ProgramHandle>) {
        let mut state = self.state.borrow_mut();
        state.current = program;
        state.calls.push(DriverCall::UseProgram(program));
    }

    fn flush(&self) {
        self.record(DriverCall::Flush);
    }
}

/// Accepts any non-blank source whose brackets balance.
fn check_source(source: &str) -> Result<(), String> {
    if source.trim().is_empty() {
        return Err("0:0: error: empty shader source".to_string());
    }

    let mut open: Vec<(char, usize)> = Vec::new();
    for (index, line) in strip_comments(source).lines().enumerate() {
        let line_number = index + 1;
        for ch in line.chars() {
            match ch {
                '{' | '(' | '[' => open.push((ch, line_number)),
                '}' | ')' | ']' => {
                    let expected = match ch {
                        '}' => '{',
                        ')' => '(',
                        _ => '[',
                    };
                    match open.pop() {
                        Some((opened, _)) if opened == expected => {}
                        _ => {
                            return Err(format!(
                                "0:{line_number}: error: unexpected '{ch}'"
                            ))
                        }
                    }
                }
                _ => {}
            }
        }
    }

    match open.pop() {
        Some((ch, line_number)) => Err(format!(
            "0:{line_number}: error: unexpected end of file, '{ch}' is never closed"
        )),
        None => Ok(()),
    }
}

/// Names from `uniform` declarations, in source order.
fn declared_uniforms(source: &str) -> Vec<String> {
    let mut names = Vec::new();
    for statement in strip_comments(source).split(';') {
        let statement = statement.trim();
        let Some(rest) = statement
            .rsplit(|ch| ch == '{' || ch == '}')
            .next()
            .map(str::trim)
            .and_then(|tail| tail.strip_prefix("uniform"))
        else {
            continue;
        };
        if !rest.starts_with(char::is_whitespace) {
            continue;
        }

        let mut declarators = rest.split(',');
        let Some(first) = declarators.next() else {
            continue;
        };
        // The first declarator carries qualifiers and the type; its last word is the name.
        let first_name = first.split_whitespace().last();
        for raw in first_name.into_iter().chain(declarators.map(str::trim)) {
            let name = raw.split('[').next().unwrap_or(raw).trim();
            if !name.is_empty() && !names.iter().any(|known| known == name) {
                names.push(name.to_string());
            }
        }
    }
    names
}

fn strip_comments(source: &str) -> String {
    let mut output = String::with_capacity(source.len());
    let mut chars = source.chars().peekable();
    while let Some(ch) = chars.next() {
        if ch == '/' {
            match chars.peek() {
                Some('/') => {
                    for next in chars.by_ref() {
                        if next == '\n' {
                            output.push('\n');
                            break;
                        }
                    }
                    continue;
                }
                Some('*') => {
                    chars.next();
                    let mut previous = '\0';
                    for next in chars.by_ref() {
                        if next == '\n' {
                            output.push('\n');
                        }
                        if previous == '*' && next == '/' {
                            break;
                        }
                        previous = next;
                    }
                    continue;
                }
                _ => {}
            }
        }
        output.push(ch);
    }
    output
}
