use std::path::PathBuf;

use clap::{Parser, Subcommand, ValueEnum};
use renderer::{GpuPowerPreference, StageKind};

#[derive(Parser, Debug)]
#[command(
    name = "tilewave",
    author,
    version,
    about = "Full-screen animated tile shader",
    arg_required_else_help = false
)]
pub struct Cli {
    #[command(flatten)]
    pub run: RunArgs,
    #[command(subcommand)]
    pub command: Option<Command>,
}

#[derive(Parser, Debug, Default)]
pub struct RunArgs {
    /// Initial window size (e.g. `1280x720`).
    #[arg(long, value_name = "WIDTHxHEIGHT", value_parser = parse_surface_size)]
    pub size: Option<(u32, u32)>,

    /// Seconds added to the shader clock every frame (default 0.02).
    #[arg(long, value_name = "SECONDS", value_parser = parse_time_step)]
    pub time_step: Option<f32>,

    /// GPU adapter preference: `low` or `high`.
    #[arg(long, value_name = "POWER", value_parser = parse_power)]
    pub power: Option<GpuPowerPreference>,

    /// Present as fast as possible instead of waiting for the display refresh.
    #[arg(long)]
    pub no_vsync: bool,

    /// Window title.
    #[arg(long, value_name = "TEXT")]
    pub title: Option<String>,

    /// TOML settings file; can also be supplied via `TILEWAVE_CONFIG`.
    #[arg(long, value_name = "FILE", env = "TILEWAVE_CONFIG")]
    pub config: Option<PathBuf>,

    /// Log filter (e.g. `debug`, `renderer=trace`); overrides `RUST_LOG`.
    #[arg(long, value_name = "LEVEL", global = true)]
    pub log_level: Option<String>,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Compile and link the embedded shaders without opening a window.
    Check,
    /// Print one of the embedded shader sources.
    Source {
        #[arg(value_enum)]
        stage: StageArg,
    },
}

#[derive(ValueEnum, Clone, Copy, Debug, PartialEq, Eq)]
pub enum StageArg {
    Vertex,
    Fragment,
}

impl From<StageArg> for StageKind {
    fn from(value: StageArg) -> Self {
        match value {
            StageArg::Vertex => StageKind::Vertex,
            StageArg::Fragment => StageKind::Fragment,
        }
    }
}

pub fn parse() -> Cli {
    Cli::parse()
}

pub fn parse_surface_size(value: &str) -> Result<(u32, u32), String> {
    let trimmed = value.trim();
    let (width, height) = trimmed
        .split_once(['x', 'X', '×'])
        .ok_or_else(|| "expected WxH format, e.g. 1920x1080".to_string())?;

    let width: u32 = width
        .trim()
        .parse()
        .map_err(|_| "invalid width in size".to_string())?;
    let height: u32 = height
        .trim()
        .parse()
        .map_err(|_| "invalid height in size".to_string())?;

    if width == 0 || height == 0 {
        return Err("surface dimensions must be greater than zero".into());
    }

    Ok((width, height))
}

pub fn parse_time_step(value: &str) -> Result<f32, String> {
    let step: f32 = value
        .trim()
        .parse()
        .map_err(|_| format!("invalid time step '{}'", value.trim()))?;
    if !step.is_finite() || step <= 0.0 {
        return Err("time step must be a positive number of seconds".into());
    }
    Ok(step)
}

pub fn parse_power(value: &str) -> Result<GpuPowerPreference, String> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err("power preference must not be empty".to_string());
    }

    let normalized = trimmed.to_ascii_lowercase();
    match normalized.as_str() {
        "low" | "low-power" | "integrated" => Ok(GpuPowerPreference::Low),
        "high" | "high-performance" | "discrete" => Ok(GpuPowerPreference::High),
        other => Err(format!(
            "unknown power preference '{other}'; expected low or high"
        )),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_surface_sizes() {
        assert_eq!(parse_surface_size("1280x720").unwrap(), (1280, 720));
        assert_eq!(parse_surface_size(" 800 X 600 ").unwrap(), (800, 600));
        assert!(parse_surface_size("1280").is_err());
        assert!(parse_surface_size("0x600").is_err());
        assert!(parse_surface_size("widexhigh").is_err());
    }

    #[test]
    fn rejects_non_positive_time_steps() {
        assert_eq!(parse_time_step("0.02").unwrap(), 0.02);
        assert!(parse_time_step("0").is_err());
        assert!(parse_time_step("-1").is_err());
        assert!(parse_time_step("inf").is_err());
        assert!(parse_time_step("fast").is_err());
    }

    #[test]
    fn parses_power_aliases() {
        assert_eq!(parse_power("HIGH").unwrap(), GpuPowerPreference::High);
        assert_eq!(parse_power("integrated").unwrap(), GpuPowerPreference::Low);
        assert!(parse_power("").is_err());
        assert!(parse_power("turbo").is_err());
    }

    #[test]
    fn subcommands_parse() {
        let cli = Cli::try_parse_from(["tilewave", "source", "fragment"]).unwrap();
        assert!(matches!(
            cli.command,
            Some(Command::Source {
                stage: StageArg::Fragment
            })
        ));

        let cli = Cli::try_parse_from(["tilewave", "--size", "640x480", "--no-vsync"]).unwrap();
        assert!(cli.command.is_none());
        assert_eq!(cli.run.size, Some((640, 480)));
        assert!(cli.run.no_vsync);
    }
}
