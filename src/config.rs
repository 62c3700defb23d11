//! Spider runtime configuration (spec.md §4.5/§6).
//!
//! Grounded on the teacher's `Config::from_env` — same `env_required` /
//! `env_parse_or` / `env_bool` helper trio and `thiserror`-based
//! `ConfigError` — rebuilt around the handful of knobs
//! `grab.spider.base.Spider.__init__` actually exposes: worker count, retry
//! limits, priority assignment mode, and cookie reuse.

use std::env;

use thiserror::Error;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("missing required environment variable: {0}")]
    MissingEnvVar(String),

    #[error("invalid value for {var}: {message}")]
    InvalidValue { var: String, message: String },
}

/// How a newly-added task without an explicit priority is assigned one
/// (`grab.spider.base.Spider`'s `priority_mode`).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PriorityMode {
    /// Every such task gets a fixed priority (the default, `DEFAULT_PRIORITY`).
    Const,
    /// Every such task gets a uniformly random priority in a fixed range,
    /// spreading load across the priority heap instead of stacking it at one
    /// level.
    Random,
}

impl std::str::FromStr for PriorityMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "const" => Ok(PriorityMode::Const),
            "random" => Ok(PriorityMode::Random),
            other => Err(format!("must be 'const' or 'random', got '{other}'")),
        }
    }
}

/// Default task priority under [`PriorityMode::Const`].
pub const DEFAULT_PRIORITY: u32 = 100;

fn env_parse_or<T: std::str::FromStr>(name: &str, default: T) -> Result<T, ConfigError>
where
    T::Err: std::fmt::Display,
{
    match env::var(name) {
        Ok(val) => val.parse().map_err(|e: T::Err| ConfigError::InvalidValue {
            var: name.into(),
            message: e.to_string(),
        }),
        Err(_) => Ok(default),
    }
}

fn env_bool(name: &str, default: bool) -> bool {
    env::var(name)
        .unwrap_or_else(|_| default.to_string())
        .to_lowercase()
        == "true"
}

/// Runtime configuration for a [`crate::spider::Spider`].
#[derive(Debug, Clone)]
pub struct SpiderConfig {
    /// Number of concurrent network workers (`Spider.thread_number`).
    pub thread_number: usize,
    /// Max retries after a transport failure before a task is abandoned.
    pub network_try_limit: u32,
    /// Max retries after a handler-raised integrity failure before a task is
    /// abandoned.
    pub task_try_limit: u32,
    /// How tasks added without an explicit priority are assigned one.
    pub priority_mode: PriorityMode,
    /// Whether `Client` instances reuse cookies received across requests.
    pub reuse_cookies: bool,
}

impl Default for SpiderConfig {
    fn default() -> Self {
        Self {
            thread_number: 1,
            network_try_limit: 10,
            task_try_limit: 10,
            priority_mode: PriorityMode::Const,
            reuse_cookies: true,
        }
    }
}

impl SpiderConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        let defaults = Self::default();

        let thread_number = env_parse_or("SPIDER_THREAD_NUMBER", defaults.thread_number)?;
        let network_try_limit =
            env_parse_or("SPIDER_NETWORK_TRY_LIMIT", defaults.network_try_limit)?;
        let task_try_limit = env_parse_or("SPIDER_TASK_TRY_LIMIT", defaults.task_try_limit)?;
        let priority_mode_str: String = env_parse_or("SPIDER_PRIORITY_MODE", "const".to_string())?;
        let priority_mode = priority_mode_str
            .parse()
            .map_err(|message| ConfigError::InvalidValue {
                var: "SPIDER_PRIORITY_MODE".into(),
                message,
            })?;
        let reuse_cookies = env_bool("SPIDER_REUSE_COOKIES", defaults.reuse_cookies);

        Ok(Self {
            thread_number,
            network_try_limit,
            task_try_limit,
            priority_mode,
            reuse_cookies,
        })
    }
}
