use crate::core::ChatError;
use ::config::{Environment, File, FileFormat, Map};
use serde::Deserialize;
use std::path::Path;

include!(concat!(env!("OUT_DIR"), "/default_config.rs"));

const CONFIG_FILE: &str = "config.toml";
const ENV_PREFIX: &str = "CLAUDE_PROXY";
const ENV_SEPARATOR: &str = "__";

#[derive(Debug, Deserialize, Clone)]
pub struct ServerConfig {
    pub bind: String,
    pub route: String,
    pub max_body_bytes: usize,
}

/// Where and how the proxy reaches the Messages API. The credential is not
/// part of it; see [`crate::proxy::ProxyForwarder::new`].
#[derive(Debug, Deserialize, Clone)]
pub struct UpstreamConfig {
    pub base_url: String,
    pub api_version: String,
    pub max_tokens: u32,
}

#[derive(Debug, Deserialize, Clone)]
pub struct ClientConfig {
    pub proxy_url: String,
    pub default_model: String,
    pub read_timeout_secs: Option<u64>,
}

#[derive(Debug, Deserialize, Clone)]
pub struct AttachmentPolicy {
    pub max_size_bytes: u64,
    pub allowed_types: Vec<String>,
}

#[derive(Debug, Deserialize, Clone)]
pub struct Config {
    pub server: ServerConfig,
    pub upstream: UpstreamConfig,
    pub client: ClientConfig,
    pub attachments: AttachmentPolicy,
}

impl Default for Config {
    fn default() -> Self {
        Self::builder(None, None)
            .build()
            .and_then(::config::Config::try_deserialize)
            .expect("Invalid default config")
    }
}

impl Config {
    /// Loads the built-in defaults, then `config.toml` from the working
    /// directory if present, then `CLAUDE_PROXY__*` environment variables.
    pub fn load() -> Result<Self, ChatError> {
        Self::load_from(Path::new(CONFIG_FILE), None)
    }

    /// Like [`Config::load`] with an explicit file path. `env` replaces the
    /// process environment as the override source when given.
    pub fn load_from(path: &Path, env: Option<Map<String, String>>) -> Result<Self, ChatError> {
        Self::builder(Some(path), env)
            .build()
            .map_err(|e| ChatError::ConfigError(format!("Failed to read config: {e}")))?
            .try_deserialize()
            .map_err(|e| ChatError::ConfigError(format!("Failed to parse config: {e}")))
    }

    fn builder(
        path: Option<&Path>,
        env: Option<Map<String, String>>,
    ) -> ::config::ConfigBuilder<::config::builder::DefaultState> {
        let mut builder = ::config::Config::builder()
            .add_source(File::from_str(DEFAULT_CONFIG, FileFormat::Toml));

        if let Some(path) = path {
            builder = builder.add_source(
                File::from(path)
                    .format(FileFormat::Toml)
                    .required(false),
            );
            let environment = Environment::with_prefix(ENV_PREFIX)
                .prefix_separator(ENV_SEPARATOR)
                .separator(ENV_SEPARATOR)
                .try_parsing(true)
                .list_separator(",")
                .with_list_parse_key("attachments.allowed_types")
                .source(env);
            builder = builder.add_source(environment);
        }

        builder
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.server.route, "/api/claude");
        assert_eq!(config.upstream.max_tokens, 4096);
        assert_eq!(config.upstream.api_version, "2023-06-01");
        assert_eq!(config.attachments.max_size_bytes, 25 * 1024 * 1024);
        assert_eq!(config.attachments.allowed_types, vec!["*/*".to_string()]);
    }

    #[test]
    fn test_missing_file_falls_back_to_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let config = Config::load_from(&dir.path().join("absent.toml"), Some(Map::new())).unwrap();
        assert_eq!(config.server.bind, "127.0.0.1:3000");
    }

    #[test]
    fn test_file_overrides_defaults() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(
            file,
            "[upstream]\nmax_tokens = 1024\n\n[server]\nbind = \"0.0.0.0:8080\""
        )
        .unwrap();

        let config = Config::load_from(file.path(), Some(Map::new())).unwrap();
        assert_eq!(config.upstream.max_tokens, 1024);
        assert_eq!(config.server.bind, "0.0.0.0:8080");
        // Untouched keys keep their defaults.
        assert_eq!(config.server.route, "/api/claude");
    }

    #[test]
    fn test_env_overrides_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "[upstream]\nmax_tokens = 1024").unwrap();

        let mut env = Map::new();
        env.insert("CLAUDE_PROXY__UPSTREAM__MAX_TOKENS".to_string(), "2048".to_string());
        env.insert(
            "CLAUDE_PROXY__CLIENT__PROXY_URL".to_string(),
            "http://proxy.internal/api/claude".to_string(),
        );

        let config = Config::load_from(file.path(), Some(env)).unwrap();
        assert_eq!(config.upstream.max_tokens, 2048);
        assert_eq!(config.client.proxy_url, "http://proxy.internal/api/claude");
    }

    #[test]
    fn test_invalid_file_is_config_error() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "[upstream]\nmax_tokens = \"lots\"").unwrap();

        let result = Config::load_from(file.path(), Some(Map::new()));
        assert!(matches!(result, Err(ChatError::ConfigError(_))));
    }
}
