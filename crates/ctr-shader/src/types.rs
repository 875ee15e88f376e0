use std::fmt;
use std::num::NonZeroU32;

/// Pipeline phase a shader artifact targets.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Stage {
    Vertex,
    Fragment,
    Geometry,
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Stage::Vertex => f.write_str("vertex"),
            Stage::Fragment => f.write_str("fragment"),
            Stage::Geometry => f.write_str("geometry"),
        }
    }
}

/// How a program gets built on the active backend.
///
/// The two paths never coexist on one shader instance: `Source` compiles and
/// links text, `Binary` hands precompiled per-stage blobs to the driver.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BuildMode {
    Source,
    Binary,
}

impl fmt::Display for BuildMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BuildMode::Source => f.write_str("source"),
            BuildMode::Binary => f.write_str("binary"),
        }
    }
}

/// Driver name of a linked program.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ProgramHandle(pub NonZeroU32);

impl ProgramHandle {
    pub fn get(self) -> u32 {
        self.0.get()
    }
}

/// Driver name of a single compiled stage, only alive while a program is built.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ShaderObject(pub NonZeroU32);

/// Resolved index of a named parameter inside a linked program.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct UniformLocation(pub u32);

/// Non-owning reference to a texture owned by the caller.
///
/// The texture must outlive every bind that uses it; nothing here checks that.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TextureHandle(pub NonZeroU32);

/// Tag selecting "whatever texture is active when drawing" for a sampler.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct CurrentTexture;

#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Vector2f {
    pub x: f32,
    pub y: f32,
}

impl Vector2f {
    pub const fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Vector3f {
    pub x: f32,
    pub y: f32,
    pub z: f32,
}

impl Vector3f {
    pub const fn new(x: f32, y: f32, z: f32) -> Self {
        Self { x, y, z }
    }
}

/// 8-bit RGBA color, normalized to `[0, 1]` when pushed to a shader.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Color {
    pub r: u8,
    pub g: u8,
    pub b: u8,
    pub a: u8,
}

impl Color {
    pub const BLACK: Color = Color::rgb(0, 0, 0);
    pub const WHITE: Color = Color::rgb(255, 255, 255);
    pub const RED: Color = Color::rgb(255, 0, 0);
    pub const GREEN: Color = Color::rgb(0, 255, 0);
    pub const BLUE: Color = Color::rgb(0, 0, 255);
    pub const TRANSPARENT: Color = Color::rgba(0, 0, 0, 0);

    pub const fn rgb(r: u8, g: u8, b: u8) -> Self {
        Self::rgba(r, g, b, 255)
    }

    pub const fn rgba(r: u8, g: u8, b: u8, a: u8) -> Self {
        Self { r, g, b, a }
    }

    pub fn normalized(self) -> [f32; 4] {
        [
            f32::from(self.r) / 255.0,
            f32::from(self.g) / 255.0,
            f32::from(self.b) / 255.0,
            f32::from(self.a) / 255.0,
        ]
    }
}

/// 2D affine transform stored as a column-major 4×4 matrix.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Transform {
    matrix: [f32; 16],
}

impl Transform {
    pub const IDENTITY: Transform = Transform::new(1.0, 0.0, 0.0, 0.0, 1.0, 0.0, 0.0, 0.0, 1.0);

    /// Builds the transform from a row-major 3×3 matrix.
    #[allow(clippy::too_many_arguments)]
    pub const fn new(
        a00: f32,
        a01: f32,
        a02: f32,
        a10: f32,
        a11: f32,
        a12: f32,
        a20: f32,
        a21: f32,
        a22: f32,
    ) -> Self {
        Self {
            matrix: [
                a00, a10, 0.0, a20, //
                a01, a11, 0.0, a21, //
                0.0, 0.0, 1.0, 0.0, //
                a02, a12, 0.0, a22,
            ],
        }
    }

    pub const fn translation(x: f32, y: f32) -> Self {
        Self::new(1.0, 0.0, x, 0.0, 1.0, y, 0.0, 0.0, 1.0)
    }

    pub const fn scaling(x: f32, y: f32) -> Self {
        Self::new(x, 0.0, 0.0, 0.0, y, 0.0, 0.0, 0.0, 1.0)
    }

    pub fn matrix(&self) -> &[f32; 16] {
        &self.matrix
    }
}

impl Default for Transform {
    fn default() -> Self {
        Self::IDENTITY
    }
}

/// Typed value pushed through a driver's uniform-set entry points.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum UniformValue {
    Float(f32),
    Vec2([f32; 2]),
    Vec3([f32; 3]),
    Vec4([f32; 4]),
    Mat4([f32; 16]),
    /// Texture unit index for a sampler.
    Sampler(u32),
}

/// Everything `Shader::set_parameter` accepts.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Parameter {
    Uniform(UniformValue),
    Texture(TextureHandle),
    CurrentTexture,
}

impl From<f32> for Parameter {
    fn from(value: f32) -> Self {
        Parameter::Uniform(UniformValue::Float(value))
    }
}

impl From<(f32, f32)> for Parameter {
    fn from((x, y): (f32, f32)) -> Self {
        Parameter::Uniform(UniformValue::Vec2([x, y]))
    }
}

impl From<(f32, f32, f32)> for Parameter {
    fn from((x, y, z): (f32, f32, f32)) -> Self {
        Parameter::Uniform(UniformValue::Vec3([x, y, z]))
    }
}

impl From<(f32, f32, f32, f32)> for Parameter {
    fn from((x, y, z, w): (f32, f32, f32, f32)) -> Self {
        Parameter::Uniform(UniformValue::Vec4([x, y, z, w]))
    }
}

impl From<Vector2f> for Parameter {
    fn from(v: Vector2f) -> Self {
        Parameter::Uniform(UniformValue::Vec2([v.x, v.y]))
    }
}

impl From<Vector3f> for Parameter {
    fn from(v: Vector3f) -> Self {
        Parameter::Uniform(UniformValue::Vec3([v.x, v.y, v.z]))
    }
}

impl From<Color> for Parameter {
    fn from(color: Color) -> Self {
        Parameter::Uniform(UniformValue::Vec4(color.normalized()))
    }
}

impl From<&Transform> for Parameter {
    fn from(transform: &Transform) -> Self {
        Parameter::Uniform(UniformValue::Mat4(*transform.matrix()))
    }
}

impl From<Transform> for Parameter {
    fn from(transform: Transform) -> Self {
        Parameter::from(&transform)
    }
}

impl From<TextureHandle> for Parameter {
    fn from(texture: TextureHandle) -> Self {
        Parameter::Texture(texture)
    }
}

impl From<CurrentTexture> for Parameter {
    fn from(_: CurrentTexture) -> Self {
        Parameter::CurrentTexture
    }
}
