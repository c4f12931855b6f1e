use crate::variety::VarietyConfig;
use serde::Deserialize;
use std::path::Path;

pub const CONFIG_FILE: &str = "timetabled.toml";

/// Per-workspace configuration, read from `timetabled.toml` next to the
/// database. Everything has a default; a missing file is not an error.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct AppConfig {
    #[serde(default)]
    pub generation: GenerationSettings,
    #[serde(default)]
    pub variety: VarietyConfig,
}

/// Text-generation service settings. The API key itself never lives in the
/// file; only the name of the environment variable that holds it does.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct GenerationSettings {
    pub base_url: String,
    pub model: String,
    pub api_key_env: String,
    pub temperature: f64,
    pub timeout_secs: u64,
}

impl Default for GenerationSettings {
    fn default() -> Self {
        Self {
            base_url: "https://openrouter.ai/api/v1".to_string(),
            model: "google/gemini-2.0-flash-001".to_string(),
            api_key_env: "TIMETABLED_API_KEY".to_string(),
            temperature: 0.7,
            timeout_secs: 60,
        }
    }
}

impl AppConfig {
    /// Load the workspace config, falling back to defaults when the file is
    /// absent. A present-but-invalid file is an error; silently ignoring a
    /// typo'd config is worse than refusing the workspace.
    pub fn load(workspace: &Path) -> anyhow::Result<Self> {
        let path = workspace.join(CONFIG_FILE);
        if !path.is_file() {
            return Ok(Self::default());
        }
        let text = std::fs::read_to_string(&path)?;
        let cfg = toml::from_str(&text)?;
        log::info!("loaded workspace config from {}", path.to_string_lossy());
        Ok(cfg)
    }
}
