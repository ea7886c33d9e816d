//! Loader for factstream configuration with YAML + environment overlays.
//!
//! Sources are merged in this order, later ones winning:
//!
//! 1. built-in defaults (Perplexity endpoint, `sonar-pro`, no timeout, no retries)
//! 2. an optional or required YAML file (`factstream.yaml` by convention)
//! 3. inline YAML snippets (tests, CLI overrides)
//! 4. `FACTSTREAM__`-prefixed environment variables, `__` separating levels
//!    (`FACTSTREAM__PROVIDER__MODEL=sonar`)
//!
//! String values then go through `${VAR}` expansion. A provider key left
//! unresolved falls back to `PERPLEXITY_API_KEY`; if that is unset too the
//! key stays absent and the first completion call fails upstream.
use config::{Config, ConfigError, Environment, File};
use factstream_common::observability::{LogConfig, LogFormat};
use factstream_common::{API_KEY_ENV, DEFAULT_BASE_URL, DEFAULT_MODEL, LlmConfig};
use serde::Deserialize;
use serde_json::Value;
use std::path::{Path, PathBuf};
use std::time::Duration;

const MAXIMUM_ENV_EXPANSION_DEPTH: usize = 8;

#[derive(Debug, Default, Deserialize)]
pub struct FactsConfig {
    #[serde(default)]
    pub version: Option<String>,
    #[serde(default)]
    pub provider: ProviderConfig,
    #[serde(default)]
    pub search: SearchKeys,
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// The hosted chat-completion endpoint.
#[derive(Debug, Deserialize)]
pub struct ProviderConfig {
    #[serde(default)]
    pub api_key: Option<String>,
    #[serde(default = "default_base_url")]
    pub base_url: String,
    #[serde(default = "default_model")]
    pub model: String,
    #[serde(default)]
    pub request_timeout_secs: Option<u64>,
    #[serde(default)]
    pub retries: usize,
}

impl Default for ProviderConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            base_url: default_base_url(),
            model: default_model(),
            request_timeout_secs: None,
            retries: 0,
        }
    }
}

impl ProviderConfig {
    pub fn request_timeout(&self) -> Option<Duration> {
        self.request_timeout_secs.map(Duration::from_secs)
    }
}

/// Keys for alternative search providers. Only their presence is recorded;
/// no code path issues search requests.
#[derive(Debug, Default, Deserialize)]
pub struct SearchKeys {
    #[serde(default)]
    pub serp_api_key: Option<String>,
    #[serde(default)]
    pub tavily_api_key: Option<String>,
    #[serde(default)]
    pub perplexity_api_key: Option<String>,
}

impl SearchKeys {
    pub fn any_configured(&self) -> bool {
        self.serp_api_key.is_some()
            || self.tavily_api_key.is_some()
            || self.perplexity_api_key.is_some()
    }
}

#[derive(Debug, Deserialize)]
pub struct LoggingConfig {
    #[serde(default = "default_log_format")]
    pub format: String,
    #[serde(default)]
    pub emit_stderr: bool,
    #[serde(default)]
    pub dir: Option<PathBuf>,
    #[serde(default = "default_log_filter")]
    pub filter: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            format: default_log_format(),
            emit_stderr: false,
            dir: None,
            filter: default_log_filter(),
        }
    }
}

impl LoggingConfig {
    /// Translate into the observability initializer's settings. Unknown
    /// formats fall back to plain text.
    pub fn to_log_config(&self) -> LogConfig {
        LogConfig {
            log_dir: self.dir.clone(),
            emit_stderr: self.emit_stderr,
            format: LogFormat::parse(&self.format).unwrap_or_default(),
            default_filter: self.filter.clone(),
            ..LogConfig::default()
        }
    }
}

impl FactsConfig {
    /// Project the provider section into the shared client configuration.
    pub fn llm_config(&self) -> LlmConfig {
        LlmConfig::ChatCompletions {
            api_key: self.provider.api_key.clone(),
            base_url: self.provider.base_url.clone(),
            model: self.provider.model.clone(),
        }
    }

    /// Fill absent secrets from the conventional process variables and drop
    /// placeholders that `${VAR}` expansion could not resolve.
    fn resolve_secrets(&mut self) {
        let resolve = |slot: &mut Option<String>, var: &str| {
            let current = slot.take().filter(|v| !v.trim().is_empty() && !v.contains("${"));
            *slot = current.or_else(|| std::env::var(var).ok().filter(|v| !v.trim().is_empty()));
        };
        resolve(&mut self.provider.api_key, API_KEY_ENV);
        resolve(&mut self.search.serp_api_key, "SERP_API_KEY");
        resolve(&mut self.search.tavily_api_key, "TAVILY_API_KEY");
        resolve(&mut self.search.perplexity_api_key, API_KEY_ENV);
    }
}

fn default_base_url() -> String {
    DEFAULT_BASE_URL.into()
}
fn default_model() -> String {
    DEFAULT_MODEL.into()
}
fn default_log_format() -> String {
    "text".into()
}
fn default_log_filter() -> String {
    "info".into()
}

fn expand_env_in_value(v: &mut Value) {
    match v {
        Value::String(s) => {
            if s.contains('$') {
                let mut cur = std::mem::take(s);
                for _ in 0..MAXIMUM_ENV_EXPANSION_DEPTH {
                    let expanded = match shellexpand::env(&cur) {
                        Ok(cow) => cow.into_owned(),
                        Err(_) => cur.clone(),
                    };
                    if expanded == cur {
                        break;
                    }
                    cur = expanded;
                }
                *s = cur;
            }
        }
        Value::Array(arr) => arr.iter_mut().for_each(expand_env_in_value),
        Value::Object(obj) => obj.values_mut().for_each(expand_env_in_value),
        _ => {}
    }
}

/// Builder hiding the `config` crate wiring (YAML + env overrides).
pub struct FactsConfigLoader {
    builder: config::ConfigBuilder<config::builder::DefaultState>,
    env_prefix: &'static str,
}

impl Default for FactsConfigLoader {
    fn default() -> Self {
        Self::new()
    }
}

impl FactsConfigLoader {
    /// Start from defaults; `FACTSTREAM__` env overrides are applied last.
    ///
    /// ```
    /// use factstream_config::FactsConfigLoader;
    ///
    /// let config = FactsConfigLoader::new()
    ///     .with_yaml_str("version: '1'")
    ///     .load()
    ///     .expect("valid config");
    ///
    /// assert_eq!(config.version.as_deref(), Some("1"));
    /// assert_eq!(config.provider.model, "sonar-pro");
    /// assert_eq!(config.provider.retries, 0);
    /// ```
    pub fn new() -> Self {
        Self {
            builder: Config::builder(),
            env_prefix: "FACTSTREAM",
        }
    }

    /// Attach a file that must exist; the `config` crate infers format by suffix.
    pub fn with_file<P: AsRef<Path>>(mut self, path: P) -> Self {
        self.builder = self
            .builder
            .add_source(File::from(path.as_ref()).required(true));
        self
    }

    /// Attach a file that may be missing, so headless runs can rely on
    /// environment variables alone.
    pub fn with_optional_file<P: AsRef<Path>>(mut self, path: P) -> Self {
        self.builder = self
            .builder
            .add_source(File::from(path.as_ref()).required(false));
        self
    }

    /// Allow tests/CLI to merge inline YAML snippets.
    ///
    /// ```
    /// use factstream_config::FactsConfigLoader;
    ///
    /// let cfg = FactsConfigLoader::new()
    ///     .with_yaml_str(
    ///         r#"
    /// provider:
    ///   base_url: "http://localhost:9999/v1"
    ///   model: "local-model"
    ///   request_timeout_secs: 30
    /// logging:
    ///   format: json
    /// "#,
    ///     )
    ///     .load()
    ///     .unwrap();
    ///
    /// assert_eq!(cfg.provider.model, "local-model");
    /// assert_eq!(cfg.provider.request_timeout().unwrap().as_secs(), 30);
    /// assert_eq!(cfg.logging.format, "json");
    /// ```
    pub fn with_yaml_str(mut self, yaml: &str) -> Self {
        self.builder = self
            .builder
            .add_source(File::from_str(yaml, config::FileFormat::Yaml));
        self
    }

    /// Consume the builder and deserialize the merged sources.
    pub fn load(self) -> Result<FactsConfig, ConfigError> {
        let cfg = self
            .builder
            .add_source(
                Environment::with_prefix(self.env_prefix)
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?;

        let mut v: Value = cfg.try_deserialize()?;
        expand_env_in_value(&mut v);

        let mut typed: FactsConfig =
            serde_json::from_value(v).map_err(|e| ConfigError::Message(e.to_string()))?;
        typed.resolve_secrets();

        Ok(typed)
    }
}
