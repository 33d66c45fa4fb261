use std::time::Duration;

use serde_aux::field_attributes::deserialize_number_from_string;

use crate::services::{BrowserConfig, FetcherConfig, SelectorSet, SessionConfig};

#[derive(serde::Deserialize, Clone)]
pub struct Settings {
    pub application: ApplicationSettings,
    pub session: SessionSettings,
    pub fetcher: FetcherSettings,
    #[serde(default)]
    pub selectors: SelectorSet,
    pub webdriver: WebDriverSettings,
}

#[derive(serde::Deserialize, Clone)]
pub struct ApplicationSettings {
    #[serde(deserialize_with = "deserialize_number_from_string")]
    pub port: u16,
    pub host: String,
}

#[derive(serde::Deserialize, Clone)]
pub struct SessionSettings {
    #[serde(deserialize_with = "deserialize_number_from_string")]
    pub max_retries: usize,
    #[serde(deserialize_with = "deserialize_number_from_string")]
    pub backoff_factor: f64,
    pub retry_statuses: Vec<u16>,
    #[serde(deserialize_with = "deserialize_number_from_string")]
    pub timeout_secs: u64,
    pub accept_language: String,
    pub rotate_user_agent: bool,
}

#[derive(serde::Deserialize, Clone)]
pub struct FetcherSettings {
    #[serde(deserialize_with = "deserialize_number_from_string")]
    pub delay_min_secs: f64,
    #[serde(deserialize_with = "deserialize_number_from_string")]
    pub delay_max_secs: f64,
    #[serde(deserialize_with = "deserialize_number_from_string")]
    pub cooldown_secs: u64,
    #[serde(deserialize_with = "deserialize_number_from_string")]
    pub forbidden_retries: u32,
}

#[derive(serde::Deserialize, Clone)]
pub struct WebDriverSettings {
    pub url: String,
    pub headless: bool,
    #[serde(deserialize_with = "deserialize_number_from_string")]
    pub render_wait_min_ms: u64,
    #[serde(deserialize_with = "deserialize_number_from_string")]
    pub render_wait_max_ms: u64,
}

impl SessionSettings {
    pub fn session_config(&self) -> SessionConfig {
        SessionConfig {
            max_retries: self.max_retries,
            backoff_factor: self.backoff_factor,
            retry_statuses: self.retry_statuses.clone(),
            timeout: Duration::from_secs(self.timeout_secs),
            accept_language: self.accept_language.clone(),
            rotate_user_agent: self.rotate_user_agent,
        }
    }
}

impl FetcherSettings {
    pub fn fetcher_config(&self) -> FetcherConfig {
        FetcherConfig {
            delay_range: (
                secs_f64(self.delay_min_secs).unwrap_or_default(),
                secs_f64(self.delay_max_secs).unwrap_or_default(),
            ),
            cooldown: Duration::from_secs(self.cooldown_secs),
            forbidden_retries: self.forbidden_retries,
        }
    }
}

impl WebDriverSettings {
    pub fn browser_config(&self) -> BrowserConfig {
        BrowserConfig {
            url: self.url.clone(),
            headless: self.headless,
            render_wait: (
                Duration::from_millis(self.render_wait_min_ms),
                Duration::from_millis(self.render_wait_max_ms),
            ),
        }
    }
}

/// Negative values clamp to zero; `None` when the value does not fit a `Duration`.
fn secs_f64(secs: f64) -> Option<Duration> {
    Duration::try_from_secs_f64(secs.max(0.0)).ok()
}

impl Settings {
    /// Rejects second counts that cannot be turned into a `Duration`.
    pub fn validate(&self) -> Result<(), config::ConfigError> {
        let seconds = [
            ("session.backoff_factor", self.session.backoff_factor),
            ("fetcher.delay_min_secs", self.fetcher.delay_min_secs),
            ("fetcher.delay_max_secs", self.fetcher.delay_max_secs),
        ];
        for (key, value) in seconds {
            if secs_f64(value).is_none() {
                return Err(config::ConfigError::Message(format!(
                    "{} = {} is not a usable number of seconds",
                    key, value
                )));
            }
        }
        Ok(())
    }
}

pub enum Environment {
    Local,
    Production,
}

impl Environment {
    pub fn as_str(&self) -> &'static str {
        match self {
            Environment::Local => "local",
            Environment::Production => "production",
        }
    }
}

impl TryFrom<String> for Environment {
    type Error = String;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        match s.to_lowercase().as_str() {
            "local" => Ok(Self::Local),
            "production" => Ok(Self::Production),
            other => Err(format!(
                "{} is not a supported environment. Use either `local` or `production`.",
                other
            )),
        }
    }
}

pub fn get_configuration() -> Result<Settings, config::ConfigError> {
    let base_path = std::env::current_dir()
        .map_err(|e| config::ConfigError::Message(format!("No current directory: {}", e)))?;
    let configuration_directory = base_path.join("configuration");

    let environment: Environment = std::env::var("APP_ENVIRONMENT")
        .unwrap_or_else(|_| "local".into())
        .try_into()
        .map_err(config::ConfigError::Message)?;
    let environment_filename = format!("{}.yaml", environment.as_str());

    let settings = config::Config::builder()
        .add_source(config::File::from(configuration_directory.join("base.yaml")))
        .add_source(config::File::from(
            configuration_directory.join(environment_filename),
        ))
        // e.g. `APP_APPLICATION__PORT=5001` sets `Settings.application.port`
        .add_source(
            config::Environment::with_prefix("APP")
                .prefix_separator("_")
                .separator("__")
                .try_parsing(true)
                .list_separator(",")
                .with_list_parse_key("session.retry_statuses"),
        )
        .build()?;

    let settings = settings.try_deserialize::<Settings>()?;
    settings.validate()?;
    Ok(settings)
}
