// Not every helper is used by every test binary.
#![allow(dead_code)]
use std::io::{self, Write};
use std::num::NonZeroU32;
use std::rc::Rc;
use std::sync::{Arc, Mutex};

use ctr_shader::{BuildMode, HeadlessDriver, Shader, TextureHandle};

pub const VERTEX: &str = r"uniform mat4 u_projection;
attribute vec2 a_position;

void main() {
    gl_Position = u_projection * vec4(a_position, 0.0, 1.0);
}
";

pub const FRAGMENT: &str = r"uniform vec4 u_color;
uniform sampler2D u_texture;
uniform sampler2D u_mask;
uniform sampler2D u_current;

void main() {
    gl_FragColor = u_color * texture2D(u_texture, vec2(0.5)) * texture2D(u_mask, vec2(0.5));
}
";

/// Same as `FRAGMENT` without its closing brace.
pub const BROKEN_FRAGMENT: &str = r"uniform vec4 u_color;

void main() {
    gl_FragColor = u_color;
";

pub fn source_driver() -> Rc<HeadlessDriver> {
    Rc::new(HeadlessDriver::new(BuildMode::Source))
}

pub fn built_shader(driver: &Rc<HeadlessDriver>) -> Shader<HeadlessDriver> {
    let mut shader = Shader::new(Rc::clone(driver));
    shader
        .load_from_memory_pair(VERTEX, FRAGMENT)
        .expect("reference shader builds");
    shader
}

pub fn texture(id: u32) -> TextureHandle {
    TextureHandle(NonZeroU32::new(id).expect("texture ids start at 1"))
}

/// Collects formatted `tracing` output at WARN and above.
#[derive(Clone, Default)]
pub struct Diagnostics(Arc<Mutex<Vec<u8>>>);

impl Diagnostics {
    pub fn text(&self) -> String {
        String::from_utf8_lossy(&self.0.lock().unwrap()).into_owned()
    }
}

impl Write for Diagnostics {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.0.lock().unwrap().extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

/// Runs `f` with a subscriber that records diagnostics, returning both.
pub fn capture<T>(f: impl FnOnce() -> T) -> (T, String) {
    let diagnostics = Diagnostics::default();
    let writer = diagnostics.clone();
    let subscriber = tracing_subscriber::fmt()
        .with_writer(move || writer.clone())
        .with_ansi(false)
        .with_max_level(tracing::Level::WARN)
        .finish();
    let result = tracing::subscriber::with_default(subscriber, f);
    (result, diagnostics.text())
}
