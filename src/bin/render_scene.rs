//! Offscreen renderer: generates a voxel world and writes one frame as PNG.
//!
//! Usage: cargo run --release --bin render_scene -- [OPTIONS]
//!
//! Options:
//!   --config <FILE>   Scene config JSON (default: built-in terrain scene)
//!   --out <FILE>      Output image (default: "frame.png")
//!   --width <N>       Override image width
//!   --height <N>      Override image height
//!   --mode <MODE>     faces | diffuse | shadowed
//!   --lod <FACTOR>    Stop refining distant hits
//!   --mipmap          Use the step-budgeted mipmap tracer
//!   --jobs <N>        Render threads (default: all cores)

use std::path::PathBuf;
use std::process::ExitCode;
use std::str::FromStr;
use std::time::Instant;

use voxray::render::{render_frame, ShadingMode, Traversal};
use voxray::scene::{Scene, SceneConfig};

fn main() -> ExitCode {
    env_logger::Builder::from_env(
        env_logger::Env::default().default_filter_or("info"),
    )
    .format_timestamp_millis()
    .init();

    let args: Vec<String> = std::env::args().collect();
    match run(&args) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            log::error!("{}", e);
            ExitCode::FAILURE
        }
    }
}

fn run(args: &[String]) -> voxray::core::Result<()> {
    let mut config = match parse_arg::<PathBuf>(args, "--config") {
        Some(path) => SceneConfig::load(&path)?,
        None => SceneConfig::default(),
    };

    if let Some(width) = parse_arg(args, "--width") {
        config.width = width;
    }
    if let Some(height) = parse_arg(args, "--height") {
        config.height = height;
    }
    if let Some(mode) = parse_arg::<String>(args, "--mode") {
        config.render.mode = parse_mode(&mode)?;
    }
    if let Some(factor) = parse_arg(args, "--lod") {
        config.render.lod_factor = Some(factor);
    }
    if args.iter().any(|a| a == "--mipmap") {
        config.render.traversal = Traversal::Mipmap;
    }
    let out = parse_arg(args, "--out").unwrap_or_else(|| PathBuf::from("frame.png"));

    if let Some(jobs) = parse_arg::<usize>(args, "--jobs") {
        if let Err(e) = rayon::ThreadPoolBuilder::new().num_threads(jobs).build_global() {
            log::warn!("Could not configure thread pool: {}", e);
        }
    }

    println!("=== Voxray Scene Renderer ===");
    println!("World:  {:?} {}^3 (voxel size {})", config.world, config.world_size, config.voxel_size);
    println!("Image:  {}x{}", config.width, config.height);
    println!("Mode:   {:?} / {:?}", config.render.mode, config.render.traversal);
    println!("Output: {}", out.display());
    println!();

    let start = Instant::now();
    let scene = Scene::from_config(&config)?;
    println!("Levels: {:?}", scene.hierarchy.level_dims());
    println!("Memory: {:.1} KB", scene.hierarchy.memory_usage() as f64 / 1024.0);
    println!("Built in {:.1}s", start.elapsed().as_secs_f64());

    let frame = render_frame(&scene, &config.render);
    frame.save_png(&out)?;

    println!("Wrote {}", out.display());
    Ok(())
}

fn parse_mode(s: &str) -> voxray::core::Result<ShadingMode> {
    match s {
        "faces" => Ok(ShadingMode::Faces),
        "diffuse" => Ok(ShadingMode::Diffuse),
        "shadowed" => Ok(ShadingMode::Shadowed),
        other => Err(voxray::core::Error::Config(format!("unknown shading mode '{}'", other))),
    }
}

fn parse_arg<T: FromStr>(args: &[String], flag: &str) -> Option<T> {
    args.iter().position(|a| a == flag)
        .and_then(|i| args.get(i + 1))
        .and_then(|s| s.parse().ok())
}
