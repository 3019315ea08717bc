//! Configuration loading from environment variables.

use thiserror::Error;

use pricebook_observability::{LogFormat, UnknownLogFormat};

pub const ENV_LOG_FORMAT: &str = "PRICEBOOK_LOG_FORMAT";
pub const ENV_DEFAULT_PAGE_SIZE: &str = "PRICEBOOK_DEFAULT_PAGE_SIZE";
pub const ENV_MAX_PAGE_SIZE: &str = "PRICEBOOK_MAX_PAGE_SIZE";
pub const ENV_BACKEND: &str = "PRICEBOOK_BACKEND";
pub const ENV_DATABASE_URL: &str = "DATABASE_URL";

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigError {
    #[error(transparent)]
    LogFormat(#[from] UnknownLogFormat),

    #[error("{var} must be a positive integer, got '{value}'")]
    InvalidNumber { var: &'static str, value: String },

    #[error("default page size {default} exceeds max page size {max}")]
    PageSizeOrder { default: usize, max: usize },

    #[error("unknown backend '{0}' (expected 'memory' or 'postgres')")]
    UnknownBackend(String),

    #[error("DATABASE_URL is required for the postgres backend")]
    MissingDatabaseUrl,
}

/// Page-size bounds for list queries.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageLimits {
    pub default_page_size: usize,
    pub max_page_size: usize,
}

impl Default for PageLimits {
    fn default() -> Self {
        Self {
            default_page_size: 50,
            max_page_size: 1000,
        }
    }
}

impl PageLimits {
    /// Missing or zero means the default; anything above the max is capped.
    pub fn clamp(&self, requested: Option<usize>) -> usize {
        match requested {
            None | Some(0) => self.default_page_size,
            Some(n) => n.min(self.max_page_size),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Backend {
    Memory,
    Postgres { database_url: String },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CatalogConfig {
    pub log_format: LogFormat,
    pub page_limits: PageLimits,
    pub backend: Backend,
}

impl CatalogConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build from an arbitrary variable lookup (tests pass a map).
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let log_format = match lookup(ENV_LOG_FORMAT) {
            Some(value) => value.parse()?,
            None => LogFormat::default(),
        };

        let defaults = PageLimits::default();
        let page_limits = PageLimits {
            default_page_size: parse_size(&lookup, ENV_DEFAULT_PAGE_SIZE, defaults.default_page_size)?,
            max_page_size: parse_size(&lookup, ENV_MAX_PAGE_SIZE, defaults.max_page_size)?,
        };
        if page_limits.default_page_size > page_limits.max_page_size {
            return Err(ConfigError::PageSizeOrder {
                default: page_limits.default_page_size,
                max: page_limits.max_page_size,
            });
        }

        let backend = match lookup(ENV_BACKEND).as_deref().map(str::trim) {
            None | Some("") | Some("memory") => Backend::Memory,
            Some("postgres") => Backend::Postgres {
                database_url: lookup(ENV_DATABASE_URL)
                    .filter(|url| !url.trim().is_empty())
                    .ok_or(ConfigError::MissingDatabaseUrl)?,
            },
            Some(other) => return Err(ConfigError::UnknownBackend(other.to_string())),
        };

        Ok(Self {
            log_format,
            page_limits,
            backend,
        })
    }
}

fn parse_size(
    lookup: &impl Fn(&str) -> Option<String>,
    var: &'static str,
    default: usize,
) -> Result<usize, ConfigError> {
    match lookup(var) {
        None => Ok(default),
        Some(value) => match value.trim().parse::<usize>() {
            Ok(n) if n > 0 => Ok(n),
            _ => Err(ConfigError::InvalidNumber { var, value }),
        },
    }
}
