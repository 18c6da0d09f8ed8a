//! Configuration file resolution.
//!
//! The file is TOML, looked up in order:
//! - `$RAPIDCOMM_CONFIG`
//! - `~/.config/rapidcomm/uploader.toml` (`%APPDATA%\rapidcomm\uploader.toml` on Windows)
//!
//! `$RAPIDCOMM_ENDPOINT`, when set, overrides the configured endpoint.

use std::path::PathBuf;

use rapidcomm_upload::UploaderConfig;

const CONFIG_ENV: &str = "RAPIDCOMM_CONFIG";
const ENDPOINT_ENV: &str = "RAPIDCOMM_ENDPOINT";

/// Loads the configuration and applies environment overrides.
pub fn load() -> anyhow::Result<UploaderConfig> {
    let path = config_path(std::env::var(CONFIG_ENV).ok());
    let mut config = UploaderConfig::load(&path)?;
    apply_endpoint_override(&mut config, std::env::var(ENDPOINT_ENV).ok());
    Ok(config)
}

fn apply_endpoint_override(config: &mut UploaderConfig, endpoint: Option<String>) {
    if let Some(endpoint) = endpoint.filter(|e| !e.trim().is_empty()) {
        tracing::debug!(%endpoint, "endpoint overridden from environment");
        config.endpoint = endpoint;
    }
}

fn config_path(explicit: Option<String>) -> PathBuf {
    if let Some(path) = explicit.filter(|p| !p.is_empty()) {
        return PathBuf::from(path);
    }

    #[cfg(target_os = "windows")]
    {
        let appdata =
            std::env::var("APPDATA").unwrap_or_else(|_| "C:\\Users\\Default\\AppData".into());
        PathBuf::from(appdata).join("rapidcomm").join("uploader.toml")
    }

    #[cfg(not(target_os = "windows"))]
    {
        let home = std::env::var("HOME").unwrap_or_else(|_| "/tmp".into());
        PathBuf::from(home)
            .join(".config")
            .join("rapidcomm")
            .join("uploader.toml")
    }
}
