use crate::clock::DEFAULT_TIME_STEP;

/// Adapter selection hint forwarded to wgpu.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum GpuPowerPreference {
    /// Prefer integrated / power-saving adapters.
    #[default]
    Low,
    /// Prefer discrete / high-performance adapters.
    High,
}

impl std::fmt::Display for GpuPowerPreference {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            GpuPowerPreference::Low => f.write_str("low"),
            GpuPowerPreference::High => f.write_str("high"),
        }
    }
}

/// Immutable configuration passed to the renderer at start-up.
///
/// `RendererConfig` mirrors CLI flags and config-file settings: the initial
/// window size, the clock step and a couple of GPU knobs.
#[derive(Debug, Clone, PartialEq)]
pub struct RendererConfig {
    /// Initial window size in physical pixels.
    pub surface_size: (u32, u32),
    /// Window title.
    pub title: String,
    /// Seconds added to `u_time` per rendered frame.
    pub time_step: f32,
    /// Adapter selection preference.
    pub power: GpuPowerPreference,
    /// Present with FIFO (display-synchronised) when true; otherwise prefer
    /// the lowest-latency mode the surface offers.
    pub vsync: bool,
}

impl Default for RendererConfig {
    /// An 800x600 vsynced window stepping 0.02 per frame.
    fn default() -> Self {
        Self {
            surface_size: (800, 600),
            title: "tilewave".to_string(),
            time_step: DEFAULT_TIME_STEP,
            power: GpuPowerPreference::default(),
            vsync: true,
        }
    }
}
