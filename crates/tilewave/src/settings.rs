use std::fs;
use std::path::Path;

use renderer::GpuPowerPreference;
use serde::Deserialize;

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("failed to read configuration at {path}: {source}")]
    Read {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to parse configuration: {0}")]
    Parse(#[from] toml::de::Error),
    #[error("invalid configuration: {0}")]
    Invalid(String),
}

/// Optional on-disk settings; every field falls back to the built-in default.
#[derive(Debug, Clone, Default, Deserialize, PartialEq)]
#[serde(default, deny_unknown_fields)]
pub struct Settings {
    pub window: WindowSettings,
    pub clock: ClockSettings,
    pub gpu: GpuSettings,
}

#[derive(Debug, Clone, Default, Deserialize, PartialEq)]
#[serde(default, deny_unknown_fields)]
pub struct WindowSettings {
    pub width: Option<u32>,
    pub height: Option<u32>,
    pub title: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize, PartialEq)]
#[serde(default, deny_unknown_fields)]
pub struct ClockSettings {
    pub time_step: Option<f32>,
}

#[derive(Debug, Clone, Default, Deserialize, PartialEq)]
#[serde(default, deny_unknown_fields)]
pub struct GpuSettings {
    pub power: Option<PowerSetting>,
    pub vsync: Option<bool>,
}

#[derive(Debug, Clone, Copy, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum PowerSetting {
    Low,
    High,
}

impl From<PowerSetting> for GpuPowerPreference {
    fn from(value: PowerSetting) -> Self {
        match value {
            PowerSetting::Low => GpuPowerPreference::Low,
            PowerSetting::High => GpuPowerPreference::High,
        }
    }
}

impl Settings {
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let contents = fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.display().to_string(),
            source,
        })?;
        Self::from_toml_str(&contents)
    }

    pub fn from_toml_str(contents: &str) -> Result<Self, ConfigError> {
        let settings: Self = toml::from_str(contents)?;
        settings.validate()?;
        Ok(settings)
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if self.window.width == Some(0) || self.window.height == Some(0) {
            return Err(ConfigError::Invalid(
                "window dimensions must be greater than zero".into(),
            ));
        }
        if let Some(step) = self.clock.time_step {
            if !step.is_finite() || step <= 0.0 {
                return Err(ConfigError::Invalid(format!(
                    "clock.time_step must be a positive number of seconds (got {step})"
                )));
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn empty_file_is_all_defaults() {
        let settings = Settings::from_toml_str("").unwrap();
        assert_eq!(settings, Settings::default());
    }

    #[test]
    fn parses_every_section() {
        let settings = Settings::from_toml_str(
            r#"
[window]
width = 1024
height = 768
title = "waves"

[clock]
time_step = 0.01

[gpu]
power = "high"
vsync = false
"#,
        )
        .unwrap();

        assert_eq!(settings.window.width, Some(1024));
        assert_eq!(settings.window.height, Some(768));
        assert_eq!(settings.window.title.as_deref(), Some("waves"));
        assert_eq!(settings.clock.time_step, Some(0.01));
        assert_eq!(settings.gpu.power, Some(PowerSetting::High));
        assert_eq!(settings.gpu.vsync, Some(false));
    }

    #[test]
    fn rejects_zero_sized_window() {
        let err = Settings::from_toml_str("[window]\nwidth = 0\n").unwrap_err();
        assert!(matches!(err, ConfigError::Invalid(_)));
    }

    #[test]
    fn rejects_non_positive_time_step() {
        let err = Settings::from_toml_str("[clock]\ntime_step = -0.5\n").unwrap_err();
        assert!(matches!(err, ConfigError::Invalid(_)));
    }

    #[test]
    fn unknown_keys_are_parse_errors() {
        let err = Settings::from_toml_str("[window]\ndepth = 3\n").unwrap_err();
        assert!(matches!(err, ConfigError::Parse(_)));

        let err = Settings::from_toml_str("[gpu]\npower = \"turbo\"\n").unwrap_err();
        assert!(matches!(err, ConfigError::Parse(_)));
    }

    #[test]
    fn loads_from_disk() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "[window]\ntitle = \"from disk\"").unwrap();

        let settings = Settings::load(file.path()).unwrap();
        assert_eq!(settings.window.title.as_deref(), Some("from disk"));
    }

    #[test]
    fn missing_file_is_read_error() {
        let dir = tempfile::tempdir().unwrap();
        let err = Settings::load(&dir.path().join("absent.toml")).unwrap_err();
        assert!(matches!(err, ConfigError::Read { .. }));
    }
}
