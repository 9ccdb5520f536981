use docchat_agent::{ModelConfig, DEFAULT_SYSTEM_PROMPT};
use docchat_gateway::{AuthConfig, GatewayOptions};
use docchat_session::PairingMode;
use serde::Deserialize;
use std::path::{Path, PathBuf};

/// Environment variable consulted when `model.api_key` is empty.
pub const API_KEY_ENV: &str = "DOCCHAT_API_KEY";

#[derive(Debug, Deserialize, Default)]
pub struct DocchatConfig {
    #[serde(default)]
    pub model: ModelConfig,
    #[serde(default)]
    pub assistant: AssistantConfig,
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub security: SecurityConfig,
    #[serde(default)]
    pub session: SessionConfig,
}

#[derive(Debug, Deserialize)]
pub struct AssistantConfig {
    #[serde(default = "default_system_prompt")]
    pub system_prompt: String,
}

impl Default for AssistantConfig {
    fn default() -> Self {
        Self {
            system_prompt: default_system_prompt(),
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_host")]
    pub host: String,
    #[serde(default = "default_port")]
    pub port: u16,
    #[serde(default = "default_upload_dir")]
    pub upload_dir: PathBuf,
    #[serde(default = "default_max_upload_bytes")]
    pub max_upload_bytes: usize,
    #[serde(default = "default_cors_origins")]
    pub cors_origins: Vec<String>,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            upload_dir: default_upload_dir(),
            max_upload_bytes: default_max_upload_bytes(),
            cors_origins: default_cors_origins(),
        }
    }
}

#[derive(Debug, Deserialize, Default)]
pub struct SecurityConfig {
    #[serde(default)]
    pub api_keys: Vec<String>,
}

#[derive(Debug, Deserialize)]
pub struct SessionConfig {
    #[serde(default = "default_session_key")]
    pub default_key: String,
    #[serde(default = "default_transcript_path")]
    pub transcript_path: PathBuf,
    #[serde(default)]
    pub pairing: PairingMode,
    /// Write the default session's transcript when `serve` shuts down.
    #[serde(default)]
    pub export_on_shutdown: bool,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            default_key: default_session_key(),
            transcript_path: default_transcript_path(),
            pairing: PairingMode::default(),
            export_on_shutdown: false,
        }
    }
}

fn default_system_prompt() -> String {
    DEFAULT_SYSTEM_PROMPT.to_string()
}
fn default_host() -> String {
    "0.0.0.0".to_string()
}
fn default_port() -> u16 {
    5000
}
fn default_upload_dir() -> PathBuf {
    PathBuf::from("./data")
}
fn default_max_upload_bytes() -> usize {
    25 * 1024 * 1024
}
fn default_cors_origins() -> Vec<String> {
    vec!["http://localhost:3000".to_string()]
}
fn default_session_key() -> String {
    "acc_setup".to_string()
}
fn default_transcript_path() -> PathBuf {
    PathBuf::from("./agent_stup.json")
}

impl DocchatConfig {
    /// Read `path`, falling back to defaults when the file does not exist.
    pub async fn load(path: &Path) -> anyhow::Result<Self> {
        let config_str = match tokio::fs::read_to_string(path).await {
            Ok(s) => s,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => String::new(),
            Err(e) => {
                return Err(anyhow::anyhow!(
                    "Failed to read config file '{}': {e}",
                    path.display()
                ))
            }
        };
        let mut config = Self::parse(&config_str)
            .map_err(|e| anyhow::anyhow!("Invalid config file '{}': {e}", path.display()))?;
        config.apply_env(std::env::var(API_KEY_ENV).ok());
        Ok(config)
    }

    pub fn parse(s: &str) -> Result<Self, toml::de::Error> {
        toml::from_str(s)
    }

    /// Fill the model API key from the environment when the file left it empty.
    pub fn apply_env(&mut self, api_key: Option<String>) {
        if self.model.api_key.is_empty() {
            if let Some(key) = api_key.filter(|k| !k.is_empty()) {
                self.model.api_key = key;
            }
        }
    }

    pub fn gateway_options(&self) -> GatewayOptions {
        GatewayOptions {
            default_session: self.session.default_key.clone(),
            upload_dir: self.server.upload_dir.clone(),
            max_upload_bytes: self.server.max_upload_bytes,
            cors_origins: self.server.cors_origins.clone(),
        }
    }

    pub fn auth_config(&self) -> AuthConfig {
        AuthConfig::new(self.security.api_keys.clone())
    }
}
