use std::env;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::time::Duration;

use thiserror::Error;

// Default configuration constants
pub const DEFAULT_DATA_API_BASE_URL: &str = "https://apis.data.go.kr/6260000";
pub const DEFAULT_MAX_PAGES: u32 = 10;
pub const DEFAULT_PAGE_SIZE: u32 = 100;
/// Largest `numOfRows` the open-data listings accept
pub const MAX_PAGE_SIZE: u32 = 100;
pub const DEFAULT_PAGE_DELAY_MS: u64 = 500;
pub const DEFAULT_TIMEOUT_SECS: u64 = 30;
pub const DEFAULT_OUTPUT_DIR: &str = "data";
pub const DEFAULT_LLM_BASE_URL: &str = "https://api.upstage.ai/v1";
pub const DEFAULT_LLM_MODEL: &str = "solar-pro2";

pub const DATA_API_KEY_VAR: &str = "DATA_API_KEY";
pub const LLM_API_KEY_VAR: &str = "LLM_API_KEY";

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("{0} is not configured")]
    Missing(&'static str),
}

pub fn load_env_file(env_file: Option<&str>) {
    if let Some(path) = env_file {
        dotenvy::from_path(Path::new(path)).ok();
    } else {
        dotenvy::dotenv().ok();
    }
}

pub fn get_data_api_key() -> Option<String> {
    non_blank_var(DATA_API_KEY_VAR)
}

pub fn get_data_api_base_url() -> String {
    sanitize_base_url(
        &env::var("DATA_API_BASE_URL").unwrap_or_else(|_| DEFAULT_DATA_API_BASE_URL.to_string()),
        DEFAULT_DATA_API_BASE_URL,
    )
}

pub fn get_max_pages() -> u32 {
    parse_var("COLLECT_MAX_PAGES", DEFAULT_MAX_PAGES)
}

pub fn get_page_size() -> u32 {
    clamp_page_size(parse_var("COLLECT_PAGE_SIZE", DEFAULT_PAGE_SIZE))
}

/// Keep a page size within `1..=MAX_PAGE_SIZE`, warning when it had to move.
pub fn clamp_page_size(requested: u32) -> u32 {
    let size = requested.clamp(1, MAX_PAGE_SIZE);
    if size != requested {
        tracing::warn!(requested, used = size, "Page size out of range");
    }
    size
}

pub fn get_page_delay() -> Duration {
    Duration::from_millis(parse_var("COLLECT_PAGE_DELAY_MS", DEFAULT_PAGE_DELAY_MS))
}

pub fn get_request_timeout() -> Duration {
    Duration::from_secs(parse_var("COLLECT_TIMEOUT_SECS", DEFAULT_TIMEOUT_SECS))
}

pub fn get_output_dir() -> PathBuf {
    PathBuf::from(non_blank_var("OUTPUT_DIR").unwrap_or_else(|| DEFAULT_OUTPUT_DIR.to_string()))
}

pub fn get_llm_api_key() -> Option<String> {
    non_blank_var(LLM_API_KEY_VAR)
}

pub fn get_llm_base_url() -> String {
    sanitize_base_url(
        &env::var("LLM_BASE_URL").unwrap_or_else(|_| DEFAULT_LLM_BASE_URL.to_string()),
        DEFAULT_LLM_BASE_URL,
    )
}

pub fn get_llm_model() -> String {
    non_blank_var("LLM_MODEL").unwrap_or_else(|| DEFAULT_LLM_MODEL.to_string())
}

/// Trim whitespace and trailing slashes; fall back when nothing is left.
pub fn sanitize_base_url(raw: &str, fallback: &str) -> String {
    let trimmed = raw.trim().trim_end_matches('/');
    if trimmed.is_empty() {
        fallback.to_string()
    } else {
        trimmed.to_string()
    }
}

fn non_blank_var(name: &str) -> Option<String> {
    env::var(name)
        .ok()
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

fn parse_var<T: FromStr + Copy + std::fmt::Display>(name: &str, default: T) -> T {
    match non_blank_var(name) {
        Some(raw) => raw.parse::<T>().unwrap_or_else(|_| {
            tracing::warn!(var = name, value = %raw, %default, "Ignoring unparseable value");
            default
        }),
        None => default,
    }
}

/// How a present-but-unparseable item field affects a collection run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ItemPolicy {
    /// Abort the remaining pagination; the failing page contributes nothing.
    #[default]
    Strict,
    /// Drop the offending item with a warning and keep going.
    Skip,
}

/// Settings for one collector run.
#[derive(Debug, Clone)]
pub struct CollectorConfig {
    pub api_key: String,
    pub base_url: String,
    pub max_pages: u32,
    pub page_size: u32,
    pub page_delay: Duration,
    pub timeout: Duration,
    pub output_dir: PathBuf,
    pub item_policy: ItemPolicy,
}

impl CollectorConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        let api_key = get_data_api_key().ok_or(ConfigError::Missing(DATA_API_KEY_VAR))?;
        Ok(Self {
            api_key,
            base_url: get_data_api_base_url(),
            max_pages: get_max_pages(),
            page_size: get_page_size(),
            page_delay: get_page_delay(),
            timeout: get_request_timeout(),
            output_dir: get_output_dir(),
            item_policy: ItemPolicy::default(),
        })
    }
}

/// Settings for the chat probe.
#[derive(Debug, Clone)]
pub struct ProbeConfig {
    pub api_key: String,
    pub base_url: String,
    pub model: String,
}

impl ProbeConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        let api_key = get_llm_api_key().ok_or(ConfigError::Missing(LLM_API_KEY_VAR))?;
        Ok(Self {
            api_key,
            base_url: get_llm_base_url(),
            model: get_llm_model(),
        })
    }
}
