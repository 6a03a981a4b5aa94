use anyhow::{Context, Result};
use renderer::{embedded_source, Renderer, RendererConfig, ShaderProgram, StageKind};
use tracing_subscriber::EnvFilter;

use crate::cli::RunArgs;
use crate::settings::Settings;

pub fn run(args: RunArgs) -> Result<()> {
    let settings = match args.config.as_deref() {
        Some(path) => {
            let settings = Settings::load(path)
                .with_context(|| format!("failed to load settings from {}", path.display()))?;
            tracing::debug!(path = %path.display(), "loaded settings file");
            settings
        }
        None => Settings::default(),
    };
    let config = resolve_config(&args, &settings);
    tracing::info!(
        width = config.surface_size.0,
        height = config.surface_size.1,
        time_step = config.time_step,
        power = %config.power,
        vsync = config.vsync,
        "starting tilewave"
    );

    let mut renderer = Renderer::new(config);
    renderer.run()?;
    tracing::info!("window closed; shutting down");
    Ok(())
}

/// Merges CLI flags over file settings over built-in defaults.
pub fn resolve_config(args: &RunArgs, settings: &Settings) -> RendererConfig {
    let defaults = RendererConfig::default();
    let surface_size = args.size.unwrap_or((
        settings.window.width.unwrap_or(defaults.surface_size.0),
        settings.window.height.unwrap_or(defaults.surface_size.1),
    ));
    let title = args
        .title
        .clone()
        .or_else(|| settings.window.title.clone())
        .unwrap_or(defaults.title);
    let time_step = args
        .time_step
        .or(settings.clock.time_step)
        .unwrap_or(defaults.time_step);
    let power = args
        .power
        .or(settings.gpu.power.map(Into::into))
        .unwrap_or(defaults.power);
    let vsync = if args.no_vsync {
        false
    } else {
        settings.gpu.vsync.unwrap_or(defaults.vsync)
    };

    RendererConfig {
        surface_size,
        title,
        time_step,
        power,
        vsync,
    }
}

/// Compiles and links the embedded shaders without touching the GPU.
pub fn check() -> Result<()> {
    let program = ShaderProgram::embedded().context("embedded shaders failed to build")?;

    println!("Shader program OK");
    println!("Attributes:");
    for (name, location) in program.attribute_names() {
        println!("  {name:<10} location={}", location.index());
    }
    println!("Uniforms:");
    for (name, location) in program.uniform_names() {
        println!("  {name:<10} offset={}", location.offset());
    }
    if let Some(block) = program.uniform_block() {
        println!(
            "Uniform block: group={} binding={} size={}",
            block.group, block.binding, block.size
        );
    }
    Ok(())
}

pub fn print_source(kind: StageKind) {
    print!("{}", embedded_source(kind));
}

pub fn initialise_tracing(level: Option<&str>) {
    let filter = match level {
        Some(level) => EnvFilter::try_new(level).unwrap_or_else(|err| {
            eprintln!("ignoring invalid log level '{level}': {err}");
            EnvFilter::new("info")
        }),
        None => EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();
}
