use std::{env, fs, path::Path};

type Result<T> = std::result::Result<T, Box<dyn std::error::Error>>;

fn main() {
    if let Err(e) = try_main() {
        eprintln!("error: {e}");
        std::process::exit(1);
    }
}

fn try_main() -> Result<()> {
    match env::args().nth(1).as_deref() {
        Some("shaders") => compile_shaders(),
        _ => {
            eprintln!("Usage: cargo xtask <task>\n");
            eprintln!("Tasks:");
            eprintln!("  shaders    compile the SPIR-V blobs into shaders/");
            std::process::exit(1);
        }
    }
}

// The app reads these blobs from shaders/ at startup; run this task once
// before the first `cargo run`.
fn compile_shaders() -> Result<()> {
    // Vertex shader: no vertex input; the triangle comes from gl_VertexIndex.
    let vs_src = r#"
#version 450
layout(location = 0) out vec3 vColor;

vec2 positions[3] = vec2[](
    vec2( 0.0, -0.6),
    vec2( 0.5,  0.4),
    vec2(-0.5,  0.4)
);
vec3 colors[3] = vec3[](
    vec3(1.0, 0.0, 0.0),
    vec3(0.0, 1.0, 0.0),
    vec3(0.0, 0.0, 1.0)
);

void main() {
    vColor = colors[gl_VertexIndex];
    gl_Position = vec4(positions[gl_VertexIndex], 0.0, 1.0);
}
"#;

    let fs_src = r#"
#version 450
layout(location = 0) in vec3 vColor;
layout(location = 0) out vec4 outColor;

void main() {
    outColor = vec4(vColor, 1.0);
}
"#;

    let comp = shaderc::Compiler::new().unwrap();
    let mut opts = shaderc::CompileOptions::new().unwrap();
    opts.set_target_env(
        shaderc::TargetEnv::Vulkan,
        shaderc::EnvVersion::Vulkan1_0 as u32,
    );
    opts.set_optimization_level(shaderc::OptimizationLevel::Performance);

    let vs_spv = comp.compile_into_spirv(
        vs_src,
        shaderc::ShaderKind::Vertex,
        "tri.vert",
        "main",
        Some(&opts),
    )?;
    let fs_spv = comp.compile_into_spirv(
        fs_src,
        shaderc::ShaderKind::Fragment,
        "tri.frag",
        "main",
        Some(&opts),
    )?;

    let out = Path::new("shaders");
    fs::create_dir_all(out)?;
    fs::write(out.join("v.spv"), vs_spv.as_binary_u8())?;
    fs::write(out.join("f.spv"), fs_spv.as_binary_u8())?;
    println!("Wrote shaders/v.spv and shaders/f.spv");
    Ok(())
}
