use std::collections::HashMap;
use std::path::Path;

use config::{Config as ConfigLoader, ConfigError, Environment, File};
use serde::Deserialize;

#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub server: ServerConfig,
    pub cors: CorsConfig,
    pub mongodb: MongoDbConfig,
    pub llm: LlmConfig,
    pub transcription: TranscriptionConfig,
    /// Webhook type -> outbound URL. Unlisted types are rejected.
    #[serde(default)]
    pub webhooks: HashMap<String, String>,
    pub logging: LoggingConfig,

    // Secrets (from ENV only)
    #[serde(default)]
    pub mongodb_uri: String,
    #[serde(default)]
    pub openai_api_key: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CorsConfig {
    pub enabled: bool,
    pub origins: Vec<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct MongoDbConfig {
    pub database: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct LlmConfig {
    pub model: String,
    pub temperature: f32,
    pub max_tokens: u32,
    pub timeout_secs: u64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct TranscriptionConfig {
    pub language: String,
    pub temperature: f32,
    pub timeout_secs: u64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct LoggingConfig {
    pub level: String,
    pub format: String,
}

impl Config {
    /// Load configuration from TOML files and environment variables
    ///
    /// Hierarchy (weakest to strongest):
    /// 1. config/default.toml
    /// 2. config/{ENV}.toml (if ENV is set)
    /// 3. Environment variables (SERVER_, MONGODB_, LLM_, LOG_ prefixes)
    pub fn load() -> Result<Self, ConfigError> {
        let env = std::env::var("ENV").unwrap_or_else(|_| "dev".to_string());

        let builder = ConfigLoader::builder()
            .add_source(File::with_name("config/default").required(false))
            .add_source(File::with_name(&format!("config/{}", env)).required(false))
            .add_source(
                Environment::default()
                    .prefix("SERVER")
                    .separator("_")
                    .try_parsing(true),
            )
            .add_source(
                Environment::default()
                    .prefix("MONGODB")
                    .separator("_")
                    .try_parsing(true),
            )
            .add_source(
                Environment::default()
                    .prefix("LLM")
                    .separator("_")
                    .try_parsing(true),
            )
            .add_source(
                Environment::default()
                    .prefix("LOG")
                    .separator("_")
                    .try_parsing(true),
            );

        let config = builder.build()?;
        let mut cfg: Config = config.try_deserialize()?;

        // Secrets never live in TOML. The upstream API key stays on the
        // server; clients only ever see this process's endpoints.
        cfg.openai_api_key = std::env::var("OPENAI_API_KEY").map_err(|_| {
            ConfigError::Message("OPENAI_API_KEY environment variable is required".to_string())
        })?;
        // Optional: without it the server runs on the in-memory store.
        cfg.mongodb_uri = std::env::var("MONGODB_URI").unwrap_or_default();

        Ok(cfg)
    }

    /// Load config from a specific path (useful for testing)
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let builder = ConfigLoader::builder().add_source(File::from(path.as_ref()));
        let config = builder.build()?;
        config.try_deserialize()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn config_deserializes_from_toml() {
        let toml = r#"
            [server]
            host = "127.0.0.1"
            port = 3000

            [cors]
            enabled = true
            origins = ["http://localhost:3000"]

            [mongodb]
            database = "techpulse"

            [llm]
            model = "gpt-4"
            temperature = 0.7
            max_tokens = 1000
            timeout_secs = 60

            [transcription]
            language = "en"
            temperature = 0.2
            timeout_secs = 30

            [webhooks]
            customer-support = "https://workflows.example.com/hook/support"
            analytics = "https://workflows.example.com/hook/analytics"

            [logging]
            level = "debug"
            format = "json"
        "#;

        let config: Config = toml::from_str(toml).unwrap();
        assert_eq!(config.server.port, 3000);
        assert_eq!(config.llm.timeout_secs, 60);
        assert_eq!(
            config.webhooks.get("analytics").unwrap(),
            "https://workflows.example.com/hook/analytics"
        );
    }
}
