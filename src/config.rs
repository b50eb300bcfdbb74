use std::env;
use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::time::Duration;

use crate::domain::diff::{DEFAULT_EXCLUDED_PATHS, DEFAULT_MAX_DIFF_CHARS, OversizedDiffPolicy};
use crate::error::{AppError, AppResult};

pub const API_KEY_VAR: &str = "OPENAI_API_KEY";
const MODEL_VAR: &str = "COMMITGEN_MODEL";
const API_BASE_VAR: &str = "COMMITGEN_API_BASE";
const MAX_TOKENS_VAR: &str = "COMMITGEN_MAX_TOKENS";
const MAX_DIFF_CHARS_VAR: &str = "COMMITGEN_MAX_DIFF_CHARS";
const OVERSIZED_DIFF_VAR: &str = "COMMITGEN_OVERSIZED_DIFF";
const EXCLUDE_VAR: &str = "COMMITGEN_EXCLUDE";
const TIMEOUT_VAR: &str = "COMMITGEN_TIMEOUT";

const DEFAULT_MODEL: &str = "gpt-4o";
const DEFAULT_API_BASE: &str = "https://api.openai.com/v1";
const DEFAULT_MAX_TOKENS: u32 = 10_000;
const DEFAULT_TIMEOUT_SECS: u64 = 120;

#[derive(Clone)]
pub struct AppConfig {
    pub api_key: Option<String>,
    pub model: String,
    pub api_base: String,
    pub max_tokens: u32,
    pub request_timeout: Duration,
    pub max_diff_chars: usize,
    pub oversized_diff: OversizedDiffPolicy,
    pub excluded_paths: Vec<String>,
    pub workspace_root: PathBuf,
}

/// Values supplied on the command line; each one wins over the environment.
#[derive(Debug, Clone, Default)]
pub struct ConfigOverrides {
    pub model: Option<String>,
    pub api_base: Option<String>,
    pub max_diff_chars: Option<usize>,
    pub oversized_diff: Option<OversizedDiffPolicy>,
    pub excluded_paths: Vec<String>,
}

impl AppConfig {
    pub fn load(workspace_hint: &Path) -> AppResult<Self> {
        let api_key = non_empty_var(API_KEY_VAR);

        let oversized_diff = match non_empty_var(OVERSIZED_DIFF_VAR) {
            Some(value) => OversizedDiffPolicy::from_str(&value).ok_or_else(|| {
                AppError::Configuration(format!(
                    "{OVERSIZED_DIFF_VAR} must be 'truncate' or 'reject', got '{value}'"
                ))
            })?,
            None => OversizedDiffPolicy::Truncate,
        };

        let excluded_paths = match non_empty_var(EXCLUDE_VAR) {
            Some(value) => value
                .split(',')
                .map(str::trim)
                .filter(|path| !path.is_empty())
                .map(str::to_string)
                .collect(),
            None => DEFAULT_EXCLUDED_PATHS
                .iter()
                .map(|path| path.to_string())
                .collect(),
        };

        Ok(Self {
            api_key,
            model: non_empty_var(MODEL_VAR).unwrap_or_else(|| DEFAULT_MODEL.to_string()),
            api_base: non_empty_var(API_BASE_VAR).unwrap_or_else(|| DEFAULT_API_BASE.to_string()),
            max_tokens: parse_var(MAX_TOKENS_VAR)?.unwrap_or(DEFAULT_MAX_TOKENS),
            request_timeout: Duration::from_secs(
                parse_var(TIMEOUT_VAR)?.unwrap_or(DEFAULT_TIMEOUT_SECS),
            ),
            max_diff_chars: parse_var(MAX_DIFF_CHARS_VAR)?.unwrap_or(DEFAULT_MAX_DIFF_CHARS),
            oversized_diff,
            excluded_paths,
            workspace_root: workspace_hint.to_path_buf(),
        })
    }

    pub fn apply_overrides(mut self, overrides: ConfigOverrides) -> AppResult<Self> {
        if let Some(model) = overrides.model {
            self.model = model;
        }
        if let Some(api_base) = overrides.api_base {
            self.api_base = api_base;
        }
        if let Some(limit) = overrides.max_diff_chars {
            self.max_diff_chars = limit;
        }
        if let Some(policy) = overrides.oversized_diff {
            self.oversized_diff = policy;
        }
        if !overrides.excluded_paths.is_empty() {
            self.excluded_paths = overrides.excluded_paths;
        }

        if self.max_diff_chars == 0 {
            return Err(AppError::Configuration(
                "maximum diff size must be greater than zero".to_string(),
            ));
        }
        Ok(self)
    }
}

impl fmt::Debug for AppConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AppConfig")
            .field("api_key", &mask_secret(&self.api_key))
            .field("model", &self.model)
            .field("api_base", &self.api_base)
            .field("max_tokens", &self.max_tokens)
            .field("request_timeout", &self.request_timeout)
            .field("max_diff_chars", &self.max_diff_chars)
            .field("oversized_diff", &self.oversized_diff)
            .field("excluded_paths", &self.excluded_paths)
            .field("workspace_root", &self.workspace_root)
            .finish()
    }
}

fn non_empty_var(name: &str) -> Option<String> {
    env::var(name)
        .ok()
        .map(|value| value.trim().to_string())
        .filter(|value| !value.is_empty())
}

fn parse_var<T: FromStr>(name: &str) -> AppResult<Option<T>> {
    match non_empty_var(name) {
        Some(value) => value.parse::<T>().map(Some).map_err(|_| {
            AppError::Configuration(format!("{name} must be a positive number, got '{value}'"))
        }),
        None => Ok(None),
    }
}

fn mask_secret(value: &Option<String>) -> String {
    let Some(token) = value.as_deref().filter(|token| !token.is_empty()) else {
        return "<not set>".to_string();
    };
    let chars: Vec<char> = token.chars().collect();
    if chars.len() <= 6 {
        return "***".to_string();
    }
    let prefix: String = chars[..3].iter().collect();
    let suffix: String = chars[chars.len() - 3..].iter().collect();
    format!("{prefix}***{suffix}")
}
