//! Settings structures for Perplexity-RS configuration

use anyhow::{bail, Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;
use url::Url;

/// Default chat completions endpoint
pub const DEFAULT_ENDPOINT: &str = "https://api.perplexity.ai/chat/completions";

/// Upper bound on the request timeout, in seconds
pub const MAX_TIMEOUT_SECS: f64 = 3600.0;

/// Fast, low cost model used for plain web search
pub const MODEL_SONAR: &str = "sonar";
/// Higher capability model used by the specialized searches
pub const MODEL_SONAR_PRO: &str = "sonar-pro";

/// Models accepted as configured defaults
pub const KNOWN_MODELS: &[&str] = &[
    MODEL_SONAR,
    MODEL_SONAR_PRO,
    "sonar-reasoning",
    "sonar-reasoning-pro",
    "sonar-deep-research",
];

/// Main settings structure, loaded once at startup and shared immutably
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub api: ApiSettings,
    pub search: SearchSettings,
    pub cache: CacheSettings,
    pub server: ServerSettings,
}

impl Settings {
    /// Load settings from a YAML file
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read settings file {}", path.display()))?;
        let settings: Settings = serde_yaml::from_str(&content)
            .with_context(|| format!("failed to parse settings file {}", path.display()))?;
        Ok(settings)
    }

    /// Merge with process environment variables (PERPLEXITY_* prefix)
    pub fn merge_env(&mut self) -> Result<()> {
        self.merge_vars(|key| std::env::var(key).ok())
    }

    /// Merge values from an arbitrary variable lookup.
    ///
    /// Empty values are treated as unset. Values that fail to parse are
    /// reported with the variable name so startup can abort with context.
    pub fn merge_vars<F>(&mut self, lookup: F) -> Result<()>
    where
        F: Fn(&str) -> Option<String>,
    {
        let var = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        if let Some(val) = var("PERPLEXITY_API_KEY") {
            self.api.api_key = val;
        }
        if let Some(val) = var("PERPLEXITY_API_URL") {
            self.api.endpoint = val;
        }
        if let Some(val) = var("PERPLEXITY_TIMEOUT") {
            let timeout = parse_duration(&val)
                .with_context(|| format!("invalid PERPLEXITY_TIMEOUT '{}'", val))?;
            self.api.timeout = timeout.as_secs_f64();
        }
        if let Some(val) = var("PERPLEXITY_DEFAULT_MODEL") {
            self.search.default_model = val;
        }
        if let Some(val) = var("PERPLEXITY_PRO_MODEL") {
            self.search.pro_model = val;
        }
        if let Some(val) = var("PERPLEXITY_MAX_TOKENS") {
            self.search.max_tokens = val
                .trim()
                .parse()
                .with_context(|| format!("invalid PERPLEXITY_MAX_TOKENS '{}'", val))?;
        }
        if let Some(val) = var("PERPLEXITY_TEMPERATURE") {
            self.search.temperature = val
                .trim()
                .parse()
                .with_context(|| format!("invalid PERPLEXITY_TEMPERATURE '{}'", val))?;
        }
        if let Some(val) = var("PERPLEXITY_TOP_P") {
            self.search.top_p = val
                .trim()
                .parse()
                .with_context(|| format!("invalid PERPLEXITY_TOP_P '{}'", val))?;
        }
        if let Some(val) = var("PERPLEXITY_TOP_K") {
            self.search.top_k = val
                .trim()
                .parse()
                .with_context(|| format!("invalid PERPLEXITY_TOP_K '{}'", val))?;
        }
        if let Some(val) = var("PERPLEXITY_RETURN_IMAGES") {
            self.search.return_images = parse_bool(&val)
                .with_context(|| format!("invalid PERPLEXITY_RETURN_IMAGES '{}'", val))?;
        }
        if let Some(val) = var("PERPLEXITY_RETURN_RELATED") {
            self.search.return_related = parse_bool(&val)
                .with_context(|| format!("invalid PERPLEXITY_RETURN_RELATED '{}'", val))?;
        }
        if let Some(val) = var("PERPLEXITY_RESULTS_ROOT_FOLDER") {
            self.cache.results_root_folder = Some(PathBuf::from(val));
        }
        if let Some(val) = var("PERPLEXITY_BIND_ADDRESS") {
            self.server.bind_address = val;
        }
        if let Some(val) = var("PERPLEXITY_PORT") {
            self.server.port = val
                .trim()
                .parse()
                .with_context(|| format!("invalid PERPLEXITY_PORT '{}'", val))?;
        }

        Ok(())
    }

    /// Check every value for range and presence
    pub fn validate(&self) -> Result<()> {
        if self.api.api_key.trim().is_empty() {
            bail!("PERPLEXITY_API_KEY environment variable is required");
        }
        Url::parse(&self.api.endpoint)
            .with_context(|| format!("invalid API endpoint '{}'", self.api.endpoint))?;
        if !(self.api.timeout.is_finite() && self.api.timeout > 0.0) {
            bail!("timeout must be positive");
        }
        if self.api.timeout > MAX_TIMEOUT_SECS {
            bail!("timeout must be at most {} seconds", MAX_TIMEOUT_SECS);
        }

        validate_model("default_model", &self.search.default_model)?;
        validate_model("pro_model", &self.search.pro_model)?;

        if self.search.max_tokens == 0 {
            bail!("max_tokens must be positive");
        }
        if !(0.0..=2.0).contains(&self.search.temperature) {
            bail!("temperature must be between 0 and 2");
        }
        if !(0.0..=1.0).contains(&self.search.top_p) {
            bail!("top_p must be between 0 and 1");
        }

        Ok(())
    }

    /// Request timeout for outbound API calls
    pub fn timeout(&self) -> Result<Duration> {
        self.api.timeout()
    }

    /// Root folder of the result cache, if caching is enabled
    pub fn results_root(&self) -> Option<&Path> {
        self.cache
            .results_root_folder
            .as_deref()
            .filter(|p| !p.as_os_str().is_empty())
    }
}

/// Remote API settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ApiSettings {
    /// Bearer token for the Perplexity API
    pub api_key: String,
    /// Chat completions endpoint
    pub endpoint: String,
    /// Request timeout in seconds
    pub timeout: f64,
}

impl ApiSettings {
    /// Timeout as a `Duration`; fails for values no `Duration` can hold
    pub fn timeout(&self) -> Result<Duration> {
        Duration::try_from_secs_f64(self.timeout)
            .with_context(|| format!("invalid timeout {} seconds", self.timeout))
    }
}

impl Default for ApiSettings {
    fn default() -> Self {
        Self {
            api_key: String::new(),
            endpoint: DEFAULT_ENDPOINT.to_string(),
            timeout: 30.0,
        }
    }
}

/// Defaults applied to every search unless a call overrides them
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SearchSettings {
    /// Model for general search
    pub default_model: String,
    /// Model for academic, financial and filtered search
    pub pro_model: String,
    pub max_tokens: u32,
    pub temperature: f64,
    pub top_p: f64,
    /// Zero disables top-k sampling and is not sent
    pub top_k: u32,
    pub return_images: bool,
    pub return_related: bool,
}

impl Default for SearchSettings {
    fn default() -> Self {
        Self {
            default_model: MODEL_SONAR.to_string(),
            pro_model: MODEL_SONAR_PRO.to_string(),
            max_tokens: 1024,
            temperature: 0.2,
            top_p: 0.9,
            top_k: 0,
            return_images: false,
            return_related: false,
        }
    }
}

/// Result cache settings
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct CacheSettings {
    /// Directory holding one folder per cached result
    pub results_root_folder: Option<PathBuf>,
}

/// HTTP transport settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerSettings {
    pub bind_address: String,
    pub port: u16,
}

impl Default for ServerSettings {
    fn default() -> Self {
        Self {
            bind_address: "127.0.0.1".to_string(),
            port: 8808,
        }
    }
}

fn validate_model(field: &str, model: &str) -> Result<()> {
    if !KNOWN_MODELS.contains(&model) {
        bail!(
            "invalid {}: model '{}' is not valid (expected one of {})",
            field,
            model,
            KNOWN_MODELS.join(", ")
        );
    }
    Ok(())
}

fn parse_bool(value: &str) -> Result<bool> {
    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "t" | "true" | "yes" | "on" => Ok(true),
        "0" | "f" | "false" | "no" | "off" => Ok(false),
        other => bail!("'{}' is not a boolean", other),
    }
}

/// Parse a duration such as `30s`, `500ms`, `2m`, `1h` or a bare number of seconds
pub fn parse_duration(value: &str) -> Result<Duration> {
    let value = value.trim();
    let (number, unit) = match value.find(|c: char| c.is_ascii_alphabetic()) {
        Some(idx) => value.split_at(idx),
        None => (value, "s"),
    };
    let number: f64 = number
        .trim()
        .parse()
        .with_context(|| format!("'{}' is not a duration", value))?;
    let seconds = match unit {
        "ms" => number / 1000.0,
        "s" => number,
        "m" => number * 60.0,
        "h" => number * 3600.0,
        other => bail!("unknown duration unit '{}'", other),
    };
    if !(seconds.is_finite() && seconds > 0.0) {
        bail!("duration must be positive");
    }
    Duration::try_from_secs_f64(seconds)
        .with_context(|| format!("duration '{}' is out of range", value))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn merged(vars: &[(&str, &str)]) -> Result<Settings> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        let mut settings = Settings::default();
        settings.merge_vars(|key| vars.get(key).cloned())?;
        Ok(settings)
    }

    #[test]
    fn test_default_settings() {
        let settings = Settings::default();
        assert_eq!(settings.search.default_model, "sonar");
        assert_eq!(settings.search.pro_model, "sonar-pro");
        assert_eq!(settings.search.max_tokens, 1024);
        assert_eq!(settings.timeout().unwrap(), Duration::from_secs(30));
        assert!(settings.results_root().is_none());
    }

    #[test]
    fn test_api_key_required() {
        let err = Settings::default().validate().unwrap_err();
        assert!(err.to_string().contains("PERPLEXITY_API_KEY"));

        let settings = merged(&[("PERPLEXITY_API_KEY", "pplx-test")]).unwrap();
        assert!(settings.validate().is_ok());
    }

    #[test]
    fn test_env_overrides() {
        let settings = merged(&[
            ("PERPLEXITY_API_KEY", "pplx-test"),
            ("PERPLEXITY_DEFAULT_MODEL", "sonar-pro"),
            ("PERPLEXITY_MAX_TOKENS", "2048"),
            ("PERPLEXITY_TEMPERATURE", "0.7"),
            ("PERPLEXITY_TIMEOUT", "45s"),
            ("PERPLEXITY_RETURN_IMAGES", "true"),
            ("PERPLEXITY_RESULTS_ROOT_FOLDER", "/tmp/results"),
        ])
        .unwrap();

        assert_eq!(settings.search.default_model, "sonar-pro");
        assert_eq!(settings.search.max_tokens, 2048);
        assert_eq!(settings.search.temperature, 0.7);
        assert_eq!(settings.timeout().unwrap(), Duration::from_secs(45));
        assert!(settings.search.return_images);
        assert_eq!(settings.results_root(), Some(Path::new("/tmp/results")));
        assert!(settings.validate().is_ok());
    }

    #[test]
    fn test_invalid_values_rejected() {
        assert!(merged(&[("PERPLEXITY_MAX_TOKENS", "lots")]).is_err());
        assert!(merged(&[("PERPLEXITY_TIMEOUT", "soon")]).is_err());
        assert!(merged(&[("PERPLEXITY_RETURN_RELATED", "maybe")]).is_err());

        let settings = merged(&[
            ("PERPLEXITY_API_KEY", "pplx-test"),
            ("PERPLEXITY_TEMPERATURE", "2.5"),
        ])
        .unwrap();
        assert!(settings.validate().is_err());

        let settings = merged(&[
            ("PERPLEXITY_API_KEY", "pplx-test"),
            ("PERPLEXITY_DEFAULT_MODEL", "gpt-4"),
        ])
        .unwrap();
        assert!(settings.validate().is_err());

        let settings = merged(&[
            ("PERPLEXITY_API_KEY", "pplx-test"),
            ("PERPLEXITY_MAX_TOKENS", "0"),
        ])
        .unwrap();
        assert!(settings.validate().is_err());
    }

    #[test]
    fn test_empty_root_folder_disables_cache() {
        let mut settings = Settings::default();
        settings.cache.results_root_folder = Some(PathBuf::new());
        assert!(settings.results_root().is_none());
    }

    #[test]
    fn test_parse_duration() {
        assert_eq!(parse_duration("500ms").unwrap(), Duration::from_millis(500));
        assert_eq!(parse_duration("2m").unwrap(), Duration::from_secs(120));
        assert_eq!(parse_duration("15").unwrap(), Duration::from_secs(15));
        assert!(parse_duration("0s").is_err());
        assert!(parse_duration("10y").is_err());
        assert!(parse_duration("99999999999999999999999h").is_err());
    }

    #[test]
    fn test_huge_env_timeout_is_an_error() {
        let err = merged(&[
            ("PERPLEXITY_API_KEY", "pplx-test"),
            ("PERPLEXITY_TIMEOUT", "99999999999999999999999h"),
        ])
        .unwrap_err();
        assert!(format!("{:#}", err).contains("PERPLEXITY_TIMEOUT"));

        let settings = merged(&[
            ("PERPLEXITY_API_KEY", "pplx-test"),
            ("PERPLEXITY_TIMEOUT", "2h"),
        ])
        .unwrap();
        assert!(settings.validate().is_err());
    }

    #[test]
    fn test_huge_file_timeout_is_an_error() {
        let yaml = r#"
api:
  api_key: pplx-file
  timeout: 1e30
"#;
        let settings: Settings = serde_yaml::from_str(yaml).unwrap();
        let err = settings.validate().unwrap_err();
        assert!(err.to_string().contains("at most"));
        assert!(settings.timeout().is_err());
    }

    #[test]
    fn test_settings_from_yaml() {
        let yaml = r#"
api:
  api_key: pplx-file
search:
  max_tokens: 512
cache:
  results_root_folder: /var/cache/perplexity
"#;
        let settings: Settings = serde_yaml::from_str(yaml).unwrap();
        assert_eq!(settings.api.api_key, "pplx-file");
        assert_eq!(settings.api.endpoint, DEFAULT_ENDPOINT);
        assert_eq!(settings.search.max_tokens, 512);
        assert_eq!(settings.search.default_model, "sonar");
        assert!(settings.results_root().is_some());
    }
}
