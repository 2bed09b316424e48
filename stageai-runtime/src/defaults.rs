use std::path::PathBuf;

pub const ENV_BASE_URL: &str = "STAGEAI_BASE_URL";
pub const ENV_CONFIG_PATH: &str = "STAGEAI_CONFIG";

/// `<config dir>/stageai/config.json`, falling back to the working directory.
pub fn default_config_path() -> PathBuf {
    dirs::config_dir()
        .map(|d| d.join("stageai"))
        .unwrap_or_else(|| PathBuf::from("."))
        .join("config.json")
}
