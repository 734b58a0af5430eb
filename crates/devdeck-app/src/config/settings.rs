//! Settings parser for config.toml

use std::path::{Path, PathBuf};

use devdeck_core::prelude::*;

use super::types::Settings;

const CONFIG_FILENAME: &str = "config.toml";

/// Default configuration directory (`<config_dir>/devdeck`)
pub fn default_config_dir() -> Option<PathBuf> {
    dirs::config_dir().map(|d| d.join("devdeck"))
}

/// Load settings from `<dir>/config.toml`
///
/// Returns default settings if the file doesn't exist or can't be parsed.
pub fn load_settings(dir: &Path) -> Settings {
    let config_path = dir.join(CONFIG_FILENAME);

    if !config_path.exists() {
        debug!("No config file at {:?}, using defaults", config_path);
        return Settings::default();
    }

    match std::fs::read_to_string(&config_path) {
        Ok(content) => match toml::from_str(&content) {
            Ok(settings) => {
                debug!("Loaded settings from {:?}", config_path);
                settings
            }
            Err(e) => {
                warn!("Failed to parse {:?}: {}", config_path, e);
                Settings::default()
            }
        },
        Err(e) => {
            warn!("Failed to read {:?}: {}", config_path, e);
            Settings::default()
        }
    }
}

/// Create `<dir>/config.toml` with commented defaults if it is missing
pub fn init_config_dir(dir: &Path) -> Result<()> {
    if !dir.exists() {
        std::fs::create_dir_all(dir).context("Failed to create config dir")?;
    }

    let config_path = dir.join(CONFIG_FILENAME);
    if !config_path.exists() {
        let default_content = r#"# devdeck configuration

[cache]
default_ttl_secs = 30   # Age at which cached device data is refreshed
persist = true          # Keep a copy of the cache on disk between runs
# file = "/path/to/cache.json"

# Per-panel overrides
[cache.ttl_secs]
# ble_status = 10
# system_info = 300

[rpc]
read_timeout_secs = 10  # Status fetches
write_timeout_secs = 30 # Saves, factory reset, leave network

[devices]
known = []              # e.g. ["10.0.0.5", "10.0.0.6"]

[behavior]
revalidate_on_tick = true
"#;
        std::fs::write(&config_path, default_content)
            .with_context(|| format!("Failed to write {:?}", config_path))?;
        info!("Created default config at {:?}", config_path);
    }

    Ok(())
}
