use std::fmt;
use std::rc::Rc;

use crate::driver::{self, Driver};
use crate::program::Shader;

/// Makes shader programs current before draw calls.
///
/// Binding `None` (or a shader that never built) falls back to the default
/// program the render target supplied, or to no program at all when there is
/// none. Textures are only committed for the program that was just made
/// current.
///
/// The binder owns its default program; update its parameters through
/// [`ShaderBinder::default_shader_mut`].
pub struct ShaderBinder<D: Driver + ?Sized> {
    driver: Rc<D>,
    default: Option<Shader<D>>,
}

impl<D: Driver + ?Sized> ShaderBinder<D> {
    /// A binder that unbinds when asked for no shader.
    pub fn new(driver: Rc<D>) -> Self {
        Self {
            driver,
            default: None,
        }
    }

    /// A binder that activates `default` when asked for no shader.
    pub fn with_default(driver: Rc<D>, default: Shader<D>) -> Self {
        Self {
            driver,
            default: Some(default),
        }
    }

    pub fn default_shader(&self) -> Option<&Shader<D>> {
        self.default.as_ref()
    }

    pub fn default_shader_mut(&mut self) -> Option<&mut Shader<D>> {
        self.default.as_mut()
    }

    /// Replaces the default program, returning the previous one.
    pub fn set_default(&mut self, default: Option<Shader<D>>) -> Option<Shader<D>> {
        std::mem::replace(&mut self.default, default)
    }

    pub fn bind(&self, shader: Option<&Shader<D>>) {
        if !driver::is_available(&*self.driver) {
            tracing::error!(
                "failed to bind or unbind shader: the graphics driver doesn't support shaders \
                 (check Shader::is_available before using shaders)"
            );
            return;
        }

        let target = shader
            .filter(|shader| shader.is_built())
            .or_else(|| self.default_shader().filter(|shader| shader.is_built()));

        match target {
            Some(shader) => shader.activate(),
            None => self.driver.use_program(None),
        }
    }
}

impl<D: Driver + ?Sized> fmt::Debug for ShaderBinder<D> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ShaderBinder")
            .field("default", &self.default)
            .finish_non_exhaustive()
    }
}
