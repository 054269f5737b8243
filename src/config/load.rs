use std::{env, path::PathBuf};

use log::LevelFilter;

use super::schema::Settings;
use crate::color::HexColor;

/// Upper bound for every `audio.*_ms` fade and delay.
pub const MAX_FADE_MS: u64 = 60_000;

/// Configuration loading helpers.
///
/// `Settings::load` tries environment variables first (prefix `WAVEDECK__`), then an
/// optional config file and falls back to struct defaults.
impl Settings {
    /// Load settings from environment and optional config file.
    pub fn load() -> Result<Self, ::config::ConfigError> {
        let config_path = resolve_config_path();

        let mut builder = ::config::Config::builder();

        if let Some(path) = &config_path {
            builder = builder.add_source(::config::File::from(path.as_path()).required(false));
        }

        builder = builder.add_source(
            ::config::Environment::with_prefix("WAVEDECK")
                .separator("__")
                .try_parsing(true),
        );

        let cfg = builder.build()?;
        let settings: Settings = cfg.try_deserialize()?;
        Ok(settings)
    }

    /// Perform basic validation checks on loaded settings.
    pub fn validate(&self) -> Result<(), String> {
        if self.waveform.peaks == 0 {
            return Err("waveform.peaks must be >= 1".to_string());
        }
        let secs = self.waveform.short_track_secs;
        if !secs.is_finite() || secs < 0.0 {
            return Err(format!(
                "waveform.short_track_secs must be a finite number >= 0, got {secs}"
            ));
        }
        let a = &self.audio;
        for (name, value) in [
            ("play_fade_delay_ms", a.play_fade_delay_ms),
            ("play_fade_ms", a.play_fade_ms),
            ("pause_fade_ms", a.pause_fade_ms),
            ("mute_fade_ms", a.mute_fade_ms),
            ("quit_fade_out_ms", a.quit_fade_out_ms),
        ] {
            if value > MAX_FADE_MS {
                return Err(format!("audio.{name} must be <= {MAX_FADE_MS}, got {value}"));
            }
        }
        if let Err(e) = HexColor::parse(&self.ui.neutral_color) {
            return Err(format!("ui.neutral_color: {e}"));
        }
        if parse_level(&self.logging.level).is_none() {
            return Err(format!("logging.level: unknown level `{}`", self.logging.level));
        }
        Ok(())
    }

    /// The neutral swatch colour; validated settings always parse.
    pub fn neutral_color(&self) -> HexColor {
        HexColor::parse(&self.ui.neutral_color).unwrap_or_else(|_| HexColor::black())
    }
}

/// Parse a textual log level.
pub fn parse_level(level: &str) -> Option<LevelFilter> {
    match level.trim().to_ascii_lowercase().as_str() {
        "off" => Some(LevelFilter::Off),
        "error" => Some(LevelFilter::Error),
        "warn" | "warning" => Some(LevelFilter::Warn),
        "info" => Some(LevelFilter::Info),
        "debug" => Some(LevelFilter::Debug),
        "trace" => Some(LevelFilter::Trace),
        _ => None,
    }
}

/// Resolve the config path from `WAVEDECK_CONFIG_PATH` or XDG defaults.
pub fn resolve_config_path() -> Option<PathBuf> {
    if let Some(p) = env::var_os("WAVEDECK_CONFIG_PATH") {
        let p = PathBuf::from(p);
        return Some(p);
    }
    default_config_path()
}

/// Compute the default config path under `$XDG_CONFIG_HOME/wavedeck/config.toml`
/// or `~/.config/wavedeck/config.toml` when `XDG_CONFIG_HOME` is not set.
pub fn default_config_path() -> Option<PathBuf> {
    let config_home = if let Some(xdg) = env::var_os("XDG_CONFIG_HOME") {
        Some(PathBuf::from(xdg))
    } else {
        env::var_os("HOME").map(|home| PathBuf::from(home).join(".config"))
    };

    config_home.map(|d| d.join("wavedeck").join("config.toml"))
}

/// Default log file under `$XDG_STATE_HOME/wavedeck/` or `~/.local/state/wavedeck/`.
pub fn default_log_path() -> Option<PathBuf> {
    let state_home = if let Some(xdg) = env::var_os("XDG_STATE_HOME") {
        Some(PathBuf::from(xdg))
    } else {
        env::var_os("HOME").map(|home| PathBuf::from(home).join(".local").join("state"))
    };

    state_home.map(|d| d.join("wavedeck").join("wavedeck.log"))
}
