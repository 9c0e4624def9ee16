use std::env;
use std::path::PathBuf;

pub const LOG_FILE_NAME: &str = "pipeshell.log";

const DEFAULT_PROMPT: &str = "$ ";
const DEFAULT_LOG_FILTER: &str = "warn";

/// Start-up settings read from `PIPESHELL_*` environment variables.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    pub prompt: String,
    pub log_filter: String,
    pub log_dir: PathBuf,
}

impl Config {
    pub fn from_env() -> Self {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Builds a config from any key lookup. Empty values count as unset.
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|value| !value.is_empty());

        Self {
            prompt: get("PIPESHELL_PROMPT").unwrap_or_else(|| DEFAULT_PROMPT.to_string()),
            log_filter: get("PIPESHELL_LOG").unwrap_or_else(|| DEFAULT_LOG_FILTER.to_string()),
            log_dir: get("PIPESHELL_LOG_DIR")
                .map(PathBuf::from)
                .unwrap_or_else(env::temp_dir),
        }
    }
}
