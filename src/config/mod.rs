//! Settings for the brigade binary.
//!
//! Sources are merged lowest first: `config/default`, `brigade` in the working
//! directory, `--config-file`, `BRIGADE__*` variables, then global CLI flags.
//! Everything is read into optional raw fields and validated once.

use std::{
    num::{NonZeroU32, NonZeroU64, NonZeroUsize},
    str::FromStr,
    time::Duration,
};

use config::{Config, Environment, File};
use serde::Deserialize;
use thiserror::Error;
use tracing::level_filters::LevelFilter;
use url::Url;

use crate::domain::RestaurantId;
use crate::domain::error::DomainError;
use crate::domain::session::{SelectedRestaurant, SessionContext, UserSession};

mod cli;

pub use cli::{
    CliArgs, Command, CreateArgs, DeleteArgs, FilterModeArg, GlobalOverrides, IngredientSortArg,
    IngredientsArgs, MenuItemSortArg, MenuItemsArgs, RecipeSortArg, RecipesArgs, RestaurantArg,
    SnapshotArgs, UpdateArgs, ViewArgs,
};

const DEFAULT_CONFIG_BASENAME: &str = "config/default";
const LOCAL_CONFIG_BASENAME: &str = "brigade";
const ENV_PREFIX: &str = "BRIGADE";
const DEFAULT_API_TIMEOUT_SECS: u64 = 30;
const DEFAULT_PAGE_SIZE: u64 = 20;
const DEFAULT_QUERY_PAGE_SIZE: u64 = 10;
const DEFAULT_QUERY_TTL_SECS: u64 = 300;
const DEFAULT_QUERY_CACHE_LIMIT: u64 = 64;
const DEFAULT_RESTAURANT_SLOTS: u64 = 1;
const DEFAULT_FETCH_LIMIT: u64 = 1000;

#[derive(Debug, Clone)]
pub struct Settings {
    pub api: ApiSettings,
    pub logging: LoggingSettings,
    pub cache: CacheSettings,
    pub session: SessionSettings,
}

#[derive(Debug, Clone)]
pub struct ApiSettings {
    pub base_url: Option<Url>,
    pub token: Option<String>,
    pub timeout: Duration,
}

impl ApiSettings {
    /// Base URL for commands that talk to the backend.
    pub fn require_base_url(&self) -> Result<&Url, LoadError> {
        self.base_url
            .as_ref()
            .ok_or_else(|| LoadError::invalid("api.base_url", "is required for this command"))
    }
}

#[derive(Debug, Clone)]
pub struct LoggingSettings {
    pub level: LevelFilter,
    pub format: LogFormat,
}

#[derive(Debug, Clone, Copy)]
pub enum LogFormat {
    Json,
    Compact,
}

#[derive(Debug, Clone)]
pub struct CacheSettings {
    pub page_size: NonZeroUsize,
    pub query_page_size: NonZeroUsize,
    pub query_ttl: Duration,
    pub query_cache_limit: NonZeroUsize,
    pub restaurant_slots: NonZeroUsize,
    pub fetch_limit: NonZeroU32,
}

/// Default session used when a command does not name one.
#[derive(Debug, Clone, Default)]
pub struct SessionSettings {
    pub restaurant_id: Option<RestaurantId>,
    pub restaurant_name: Option<String>,
    pub user: Option<String>,
}

impl SessionSettings {
    /// Session context for a command. `restaurant` replaces the configured
    /// restaurant when given.
    pub fn context(&self, restaurant: Option<&str>) -> Result<SessionContext, DomainError> {
        let selected = match restaurant {
            Some(id) => Some(SelectedRestaurant::new(id)?),
            None => match &self.restaurant_id {
                Some(id) => {
                    let selected = SelectedRestaurant::new(id.clone())?;
                    Some(match &self.restaurant_name {
                        Some(name) => selected.with_name(name.clone()),
                        None => selected,
                    })
                }
                None => None,
            },
        };
        let user = self.user.clone().map(UserSession::new);
        Ok(SessionContext::new(selected, user))
    }
}

#[derive(Debug, Error)]
pub enum LoadError {
    #[error("could not read settings: {0}")]
    Sources(#[from] config::ConfigError),
    #[error("setting `{key}` {reason}")]
    Invalid { key: &'static str, reason: String },
}

impl LoadError {
    fn invalid(key: &'static str, reason: impl Into<String>) -> Self {
        Self::Invalid {
            key,
            reason: reason.into(),
        }
    }
}

/// Merge every settings source for `cli` and validate the result.
pub fn load(cli: &CliArgs) -> Result<Settings, LoadError> {
    let mut sources = Config::builder()
        .add_source(File::with_name(DEFAULT_CONFIG_BASENAME).required(false))
        .add_source(File::with_name(LOCAL_CONFIG_BASENAME).required(false));
    if let Some(path) = cli.config_file.as_deref() {
        sources = sources.add_source(File::from(path).required(true));
    }

    let mut raw: RawSettings = sources
        .add_source(Environment::with_prefix(ENV_PREFIX).separator("__"))
        .build()?
        .try_deserialize()?;
    raw.apply_overrides(&cli.overrides);

    Settings::from_raw(raw)
}

#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
struct RawSettings {
    api: RawApiSettings,
    logging: RawLoggingSettings,
    cache: RawCacheSettings,
    session: RawSessionSettings,
}

impl RawSettings {
    fn apply_overrides(&mut self, overrides: &GlobalOverrides) {
        if let Some(level) = overrides.log_level.as_ref() {
            self.logging.level = Some(level.clone());
        }
        if let Some(json) = overrides.log_json {
            self.logging.json = Some(json);
        }
        if let Some(url) = overrides.api_base_url.as_ref() {
            self.api.base_url = Some(url.clone());
        }
        if let Some(token) = overrides.api_token.as_ref() {
            self.api.token = Some(token.clone());
        }
        if let Some(seconds) = overrides.api_timeout_seconds {
            self.api.timeout_seconds = Some(seconds);
        }
        if let Some(user) = overrides.user.as_ref() {
            self.session.user = Some(user.clone());
        }
        if let Some(slots) = overrides.restaurant_slots {
            self.cache.restaurant_slots = Some(slots);
        }
    }
}

impl Settings {
    fn from_raw(raw: RawSettings) -> Result<Self, LoadError> {
        Ok(Self {
            api: build_api_settings(raw.api)?,
            logging: build_logging_settings(raw.logging)?,
            cache: build_cache_settings(raw.cache)?,
            session: build_session_settings(raw.session),
        })
    }
}

fn build_api_settings(api: RawApiSettings) -> Result<ApiSettings, LoadError> {
    let base_url = match non_blank(api.base_url) {
        Some(value) => {
            // Relative endpoint paths only join below the base when it ends
            // with a slash.
            let value = if value.ends_with('/') {
                value
            } else {
                format!("{value}/")
            };
            let url = Url::parse(&value)
                .map_err(|err| LoadError::invalid("api.base_url", format!("{err}")))?;
            if url.cannot_be_a_base() || !matches!(url.scheme(), "http" | "https") {
                return Err(LoadError::invalid(
                    "api.base_url",
                    "must be an absolute http or https URL",
                ));
            }
            Some(url)
        }
        None => None,
    };

    Ok(ApiSettings {
        base_url,
        token: non_blank(api.token),
        timeout: seconds(
            api.timeout_seconds.unwrap_or(DEFAULT_API_TIMEOUT_SECS),
            "api.timeout_seconds",
        )?,
    })
}

fn build_logging_settings(logging: RawLoggingSettings) -> Result<LoggingSettings, LoadError> {
    let level = logging
        .level
        .as_deref()
        .map(LevelFilter::from_str)
        .transpose()
        .map_err(|err| LoadError::invalid("logging.level", err.to_string()))?
        .unwrap_or(LevelFilter::INFO);

    Ok(LoggingSettings {
        level,
        format: match logging.json {
            Some(true) => LogFormat::Json,
            _ => LogFormat::Compact,
        },
    })
}

fn build_cache_settings(cache: RawCacheSettings) -> Result<CacheSettings, LoadError> {
    Ok(CacheSettings {
        page_size: non_zero_usize(
            cache.page_size.unwrap_or(DEFAULT_PAGE_SIZE),
            "cache.page_size",
        )?,
        query_page_size: non_zero_usize(
            cache.query_page_size.unwrap_or(DEFAULT_QUERY_PAGE_SIZE),
            "cache.query_page_size",
        )?,
        query_ttl: seconds(
            cache.query_ttl_seconds.unwrap_or(DEFAULT_QUERY_TTL_SECS),
            "cache.query_ttl_seconds",
        )?,
        query_cache_limit: non_zero_usize(
            cache.query_cache_limit.unwrap_or(DEFAULT_QUERY_CACHE_LIMIT),
            "cache.query_cache_limit",
        )?,
        restaurant_slots: non_zero_usize(
            cache.restaurant_slots.unwrap_or(DEFAULT_RESTAURANT_SLOTS),
            "cache.restaurant_slots",
        )?,
        fetch_limit: non_zero_u32(
            cache.fetch_limit.unwrap_or(DEFAULT_FETCH_LIMIT),
            "cache.fetch_limit",
        )?,
    })
}

fn build_session_settings(session: RawSessionSettings) -> SessionSettings {
    SessionSettings {
        restaurant_id: non_blank(session.restaurant_id).map(RestaurantId::new),
        restaurant_name: non_blank(session.restaurant_name),
        user: non_blank(session.user),
    }
}

#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
struct RawApiSettings {
    base_url: Option<String>,
    token: Option<String>,
    timeout_seconds: Option<u64>,
}

#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
struct RawLoggingSettings {
    level: Option<String>,
    json: Option<bool>,
}

#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
struct RawCacheSettings {
    page_size: Option<u64>,
    query_page_size: Option<u64>,
    query_ttl_seconds: Option<u64>,
    query_cache_limit: Option<u64>,
    restaurant_slots: Option<u64>,
    fetch_limit: Option<u64>,
}

#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
struct RawSessionSettings {
    restaurant_id: Option<String>,
    restaurant_name: Option<String>,
    user: Option<String>,
}

fn non_blank(value: Option<String>) -> Option<String> {
    value.and_then(|value| {
        let trimmed = value.trim();
        (!trimmed.is_empty()).then(|| trimmed.to_string())
    })
}

fn positive(value: u64, key: &'static str) -> Result<NonZeroU64, LoadError> {
    NonZeroU64::new(value).ok_or_else(|| LoadError::invalid(key, "must be at least 1"))
}

fn seconds(value: u64, key: &'static str) -> Result<Duration, LoadError> {
    positive(value, key).map(|secs| Duration::from_secs(secs.get()))
}

fn non_zero_u32(value: u64, key: &'static str) -> Result<NonZeroU32, LoadError> {
    NonZeroU32::try_from(positive(value, key)?)
        .map_err(|_| LoadError::invalid(key, "does not fit in 32 bits"))
}

fn non_zero_usize(value: u64, key: &'static str) -> Result<NonZeroUsize, LoadError> {
    NonZeroUsize::try_from(positive(value, key)?)
        .map_err(|_| LoadError::invalid(key, "is too large for this platform"))
}

/// Parse the command line, then load settings with its overrides applied.
pub fn load_with_cli() -> Result<(CliArgs, Settings), LoadError> {
    let args = <CliArgs as clap::Parser>::parse();
    load(&args).map(|settings| (args, settings))
}

#[cfg(test)]
mod tests;
