//! Configuration vault – reads/writes `~/.seamtrack/config.toml`.

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

use seamtrack_perception::{NoiseSource, SurfaceProfile};
use seamtrack_runtime::{Traverse, TraverseConfig};
use seamtrack_types::TrackError;

/// Persisted driver configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Config {
    /// Noise seed.  Absent means a fresh entropy-seeded run each time.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub seed: Option<u64>,

    /// Steps between status lines while `/run` is executing.
    #[serde(default = "default_report_interval")]
    pub report_interval: u64,

    /// Profile being tracked.
    #[serde(default)]
    pub surface: SurfaceProfile,

    /// Rig parameters.
    #[serde(default)]
    pub traverse: TraverseConfig,
}

fn default_report_interval() -> u64 {
    20
}

impl Default for Config {
    fn default() -> Self {
        Self {
            seed: None,
            report_interval: default_report_interval(),
            surface: SurfaceProfile::default(),
            traverse: TraverseConfig::default(),
        }
    }
}

impl Config {
    /// Build a fresh traverse from this configuration.
    pub fn build_traverse(&self) -> Result<Traverse<SurfaceProfile>, TrackError> {
        let noise = match self.seed {
            Some(seed) => NoiseSource::seeded(seed),
            None => NoiseSource::from_entropy(),
        };
        Traverse::new(self.surface, self.traverse.clone(), noise)
    }
}

/// Return the path to `~/.seamtrack/config.toml`.
pub fn config_path() -> PathBuf {
    config_path_for_home(
        &std::env::var("HOME")
            .or_else(|_| std::env::var("USERPROFILE"))
            .unwrap_or_else(|_| ".".to_string()),
    )
}

pub(crate) fn config_path_for_home(home: &str) -> PathBuf {
    PathBuf::from(home).join(".seamtrack").join("config.toml")
}

/// Load the config from disk.  Returns `None` if the file does not exist.
pub fn load() -> Result<Option<Config>, String> {
    load_from(&config_path())
}

/// Load the config from a specific path, applying environment overrides.
pub fn load_from(path: &Path) -> Result<Option<Config>, String> {
    if !path.exists() {
        return Ok(None);
    }
    let raw = fs::read_to_string(path)
        .map_err(|e| format!("Failed to read config at {}: {}", path.display(), e))?;
    let mut cfg: Config =
        toml::from_str(&raw).map_err(|e| format!("Failed to parse config: {}", e))?;
    apply_env_overrides(&mut cfg);
    Ok(Some(cfg))
}

/// Apply `SEAMTRACK_*` environment variable overrides to `cfg`.
///
/// | Variable | Config field |
/// |---|---|
/// | `SEAMTRACK_SEED` | `seed` |
/// | `SEAMTRACK_NOISE_STD` | `traverse.noise_std` |
/// | `SEAMTRACK_SMOOTHING` | `traverse.smoothing_enabled` (`on`/`off`, `true`/`false`, `1`/`0`) |
/// | `SEAMTRACK_WINDOW` | `traverse.smoothing_window` |
///
/// Values that do not parse are ignored.
pub fn apply_env_overrides(cfg: &mut Config) {
    if let Ok(v) = std::env::var("SEAMTRACK_SEED")
        && let Ok(seed) = v.trim().parse::<u64>()
    {
        cfg.seed = Some(seed);
    }
    if let Ok(v) = std::env::var("SEAMTRACK_NOISE_STD")
        && let Ok(sigma) = v.trim().parse::<f64>()
    {
        cfg.traverse.noise_std = sigma;
    }
    if let Ok(v) = std::env::var("SEAMTRACK_SMOOTHING")
        && let Some(on) = parse_switch(&v)
    {
        cfg.traverse.smoothing_enabled = on;
    }
    if let Ok(v) = std::env::var("SEAMTRACK_WINDOW")
        && let Ok(w) = v.trim().parse::<usize>()
    {
        cfg.traverse.smoothing_window = w;
    }
}

/// Parse an on/off switch value.
pub fn parse_switch(raw: &str) -> Option<bool> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "on" | "true" | "1" | "yes" => Some(true),
        "off" | "false" | "0" | "no" => Some(false),
        _ => None,
    }
}

/// Save the config to disk, creating `~/.seamtrack/` if necessary.
pub fn save(cfg: &Config) -> Result<(), String> {
    save_to(cfg, &config_path())
}

/// Save the config to a specific path.
pub fn save_to(cfg: &Config, path: &Path) -> Result<(), String> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)
            .map_err(|e| format!("Failed to create config directory: {}", e))?;
        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            fs::set_permissions(parent, fs::Permissions::from_mode(0o700))
                .map_err(|e| format!("Failed to set config directory permissions: {}", e))?;
        }
    }
    let raw =
        toml::to_string_pretty(cfg).map_err(|e| format!("Failed to serialize config: {}", e))?;
    #[cfg(unix)]
    {
        use std::os::unix::fs::OpenOptionsExt;
        fs::OpenOptions::new()
            .write(true)
            .create(true)
            .truncate(true)
            .mode(0o600)
            .open(path)
            .and_then(|mut f| {
                use std::io::Write;
                f.write_all(raw.as_bytes())
            })
            .map_err(|e| format!("Failed to write config at {}: {}", path.display(), e))?;
    }
    #[cfg(not(unix))]
    fs::write(path, raw)
        .map_err(|e| format!("Failed to write config at {}: {}", path.display(), e))?;
    Ok(())
}
