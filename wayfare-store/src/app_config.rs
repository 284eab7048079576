use serde::Deserialize;
use std::env;

#[derive(Debug, Deserialize, Clone)]
pub struct Config {
    pub server: ServerConfig,
    pub database: DatabaseConfig,
    pub llm: LlmSettings,
    #[serde(default)]
    pub providers: ProvidersConfig,
    #[serde(default)]
    pub http: HttpSettings,
}

#[derive(Debug, Deserialize, Clone)]
pub struct ServerConfig {
    pub port: u16,
}

#[derive(Debug, Deserialize, Clone)]
pub struct DatabaseConfig {
    pub url: String,
}

/// Chat-completion endpoint settings. The api key has no default; a
/// missing key fails configuration loading at startup rather than
/// surfacing per request.
#[derive(Debug, Deserialize, Clone)]
pub struct LlmSettings {
    pub api_key: String,
    pub model: String,
    #[serde(default = "default_llm_base_url")]
    pub base_url: String,
    #[serde(default = "default_temperature")]
    pub temperature: f32,
    #[serde(default = "default_max_tokens")]
    pub max_tokens: u32,
}

fn default_llm_base_url() -> String {
    "https://api.openai.com/v1".to_string()
}

fn default_temperature() -> f32 {
    0.7
}

fn default_max_tokens() -> u32 {
    700
}

/// Flight-data backends, in priority order: amadeus first, then kiwi.
/// Each is optional, but startup validation requires at least one.
#[derive(Debug, Deserialize, Clone, Default)]
pub struct ProvidersConfig {
    pub amadeus: Option<ProviderSettings>,
    pub kiwi: Option<ProviderSettings>,
}

#[derive(Debug, Deserialize, Clone)]
pub struct ProviderSettings {
    pub api_key: String,
    pub base_url: String,
}

#[derive(Debug, Deserialize, Clone)]
pub struct HttpSettings {
    #[serde(default = "default_max_attempts")]
    pub max_attempts: u32,
    #[serde(default = "default_base_delay_ms")]
    pub base_delay_ms: u64,
    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,
}

impl Default for HttpSettings {
    fn default() -> Self {
        Self {
            max_attempts: default_max_attempts(),
            base_delay_ms: default_base_delay_ms(),
            request_timeout_secs: default_request_timeout_secs(),
        }
    }
}

fn default_max_attempts() -> u32 {
    3
}

fn default_base_delay_ms() -> u64 {
    1000
}

fn default_request_timeout_secs() -> u64 {
    30
}

impl Config {
    pub fn load() -> Result<Self, config::ConfigError> {
        let run_mode = env::var("RUN_MODE").unwrap_or_else(|_| "development".into());

        let s = config::Config::builder()
            .add_source(config::File::with_name("config/default"))
            .add_source(config::File::with_name(&format!("config/{}", run_mode)).required(false))
            .add_source(config::File::with_name("config/local").required(false))
            .add_source(config::Environment::with_prefix("WAYFARE").separator("__"))
            .build()?;

        let parsed: Config = s.try_deserialize()?;
        parsed.validate()?;
        Ok(parsed)
    }

    fn validate(&self) -> Result<(), config::ConfigError> {
        if self.llm.api_key.trim().is_empty() {
            return Err(config::ConfigError::Message(
                "llm.api_key must be set".to_string(),
            ));
        }
        if self.providers.amadeus.is_none() && self.providers.kiwi.is_none() {
            return Err(config::ConfigError::Message(
                "at least one flight provider must be configured".to_string(),
            ));
        }
        Ok(())
    }
}
