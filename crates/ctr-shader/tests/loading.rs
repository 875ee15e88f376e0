mod support;

use std::fs;
use std::io::Cursor;
use std::path::Path;
use std::rc::Rc;

use ctr_shader::{
    BuildMode, DriverCall, HeadlessDriver, LoaderConfig, ModeSetting, Shader, ShaderConfig,
    ShaderError, ShaderLoader, Stage,
};
use support::{capture, source_driver, BROKEN_FRAGMENT, FRAGMENT, VERTEX};
use tempfile::TempDir;

fn shader_dir() -> TempDir {
    let root = tempfile::tempdir().unwrap();
    fs::write(root.path().join("sprite.glsl"), VERTEX).unwrap();
    fs::write(root.path().join("tint.glsl"), FRAGMENT).unwrap();
    fs::write(root.path().join("broken.glsl"), BROKEN_FRAGMENT).unwrap();
    root
}

fn loader_for(root: &Path) -> ShaderLoader {
    ShaderLoader::new(LoaderConfig {
        search_root: root.to_path_buf(),
        ..LoaderConfig::default()
    })
}

#[test]
fn loads_a_vertex_source_file() {
    let root = shader_dir();
    let driver = source_driver();
    let mut shader = Shader::with_loader(Rc::clone(&driver), BuildMode::Source, loader_for(root.path()));

    shader.load_from_file("sprite", Stage::Vertex).expect("load vertex file");

    assert!(shader.is_built());
    assert_eq!(
        driver.count_calls(|call| *call == DriverCall::CreateShader(Stage::Vertex)),
        1
    );
    assert_eq!(
        driver.count_calls(|call| *call == DriverCall::CreateShader(Stage::Fragment)),
        0
    );
}

#[test]
fn loads_a_fragment_source_file() {
    let root = shader_dir();
    let driver = source_driver();
    let mut shader = Shader::with_loader(Rc::clone(&driver), BuildMode::Source, loader_for(root.path()));

    shader.load_from_file("tint", Stage::Fragment).expect("load fragment file");

    assert!(shader.is_built());
    assert_eq!(
        driver.count_calls(|call| *call == DriverCall::CreateShader(Stage::Fragment)),
        1
    );
}

#[test]
fn loads_a_vertex_and_fragment_file_pair() {
    let root = shader_dir();
    let driver = source_driver();
    let mut shader = Shader::with_loader(Rc::clone(&driver), BuildMode::Source, loader_for(root.path()));

    shader.load_from_files("sprite", "tint").expect("load pair");

    assert!(shader.is_built());
    assert_eq!(
        driver.count_calls(|call| matches!(call, DriverCall::CompileShader(_))),
        2
    );
}

#[test]
fn missing_file_names_the_resolved_path() {
    let root = shader_dir();
    let driver = source_driver();
    let mut shader = Shader::with_loader(Rc::clone(&driver), BuildMode::Source, loader_for(root.path()));

    let (result, diagnostics) = capture(|| shader.load_from_file("absent", Stage::Vertex));

    let expected = root.path().join("absent.glsl");
    match result {
        Err(ShaderError::ResourceNotFound { path, .. }) => assert_eq!(path, expected),
        other => panic!("expected ResourceNotFound, got {other:?}"),
    }
    assert!(diagnostics.contains(&expected.display().to_string()), "{diagnostics}");
    assert!(driver.calls().is_empty());
}

#[test]
fn broken_file_surfaces_the_compile_log() {
    let root = shader_dir();
    let driver = source_driver();
    let mut shader = Shader::with_loader(Rc::clone(&driver), BuildMode::Source, loader_for(root.path()));

    let (result, diagnostics) = capture(|| shader.load_from_file("broken", Stage::Fragment));

    assert!(matches!(result, Err(ShaderError::CompileFailed { .. })));
    assert!(diagnostics.contains("never closed"), "{diagnostics}");
    assert_eq!(shader.native_handle(), 0);
}

#[test]
fn geometry_source_files_are_unsupported() {
    let root = shader_dir();
    let driver = source_driver();
    let mut shader = Shader::with_loader(Rc::clone(&driver), BuildMode::Source, loader_for(root.path()));

    let result = shader.load_from_file("sprite", Stage::Geometry);

    assert!(matches!(
        result,
        Err(ShaderError::UnsupportedStage {
            stage: Stage::Geometry,
            mode: BuildMode::Source,
        })
    ));
}

#[test]
fn non_utf8_source_is_rejected() {
    let root = shader_dir();
    fs::write(root.path().join("garbage.glsl"), [0xC3, 0x28, 0xFF]).unwrap();
    let driver = source_driver();
    let mut shader = Shader::with_loader(Rc::clone(&driver), BuildMode::Source, loader_for(root.path()));

    let result = shader.load_from_file("garbage", Stage::Vertex);

    assert!(matches!(result, Err(ShaderError::InvalidUtf8 { .. })));
    assert!(driver.calls().is_empty());
}

#[test]
fn loads_from_a_reader() {
    let driver = source_driver();
    let mut shader = Shader::new(Rc::clone(&driver));

    shader
        .load_from_reader(Cursor::new(FRAGMENT.as_bytes()), Stage::Fragment)
        .expect("load from stream");

    assert!(shader.is_built());
}

#[test]
fn config_selects_paths_and_mode() {
    let root = shader_dir();
    fs::create_dir_all(root.path().join("bin")).unwrap();
    fs::write(root.path().join("bin/sprite.shbin"), b"DVLB-vertex").unwrap();

    let config = ShaderConfig::from_toml_str(&format!(
        r#"
version = 1
mode = "binary"

[loader]
search_root = "{root}"
binary_root = "{root}/bin"
"#,
        root = root.path().display().to_string().replace('\\', "/")
    ))
    .expect("valid config");
    assert_eq!(config.mode, ModeSetting::Binary);

    let driver = Rc::new(HeadlessDriver::new(BuildMode::Binary));
    let mut shader = Shader::from_config(Rc::clone(&driver), &config);
    assert_eq!(shader.build_mode(), BuildMode::Binary);

    shader
        .load_from_file("sprite", Stage::Vertex)
        .expect("load binary through config paths");

    assert_eq!(shader.loaded_stages(), &[Stage::Vertex]);
    assert!(driver.calls().contains(&DriverCall::ProgramBinary {
        program: shader.program().expect("program created"),
        stage: Stage::Vertex,
        len: b"DVLB-vertex".len(),
    }));
}

#[test]
fn auto_mode_follows_the_driver() {
    let driver = Rc::new(HeadlessDriver::new(BuildMode::Binary));
    let shader = Shader::from_config(driver, &ShaderConfig::default());
    assert_eq!(shader.build_mode(), BuildMode::Binary);
}

#[test]
fn config_mode_the_driver_lacks_falls_back_to_the_driver() {
    let config = ShaderConfig {
        mode: ModeSetting::Source,
        ..ShaderConfig::default()
    };
    let driver = Rc::new(HeadlessDriver::new(BuildMode::Binary));

    let (mut shader, diagnostics) = capture(|| Shader::from_config(Rc::clone(&driver), &config));

    assert_eq!(shader.build_mode(), BuildMode::Binary);
    assert!(diagnostics.contains("cannot build source shaders"), "{diagnostics}");
    assert!(matches!(
        shader.compile_from_source(Some(VERTEX), None),
        Err(ShaderError::WrongBuildPath {
            mode: BuildMode::Binary
        })
    ));
    assert_eq!(
        driver.count_calls(|call| matches!(call, DriverCall::CompileShader(_))),
        0
    );
}
