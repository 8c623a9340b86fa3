use std::path::PathBuf;

use thiserror::Error;

/// Application-level constants
pub const APP_NAME: &str = "VacancyEnrich";
pub const APP_VERSION: &str = env!("CARGO_PKG_VERSION");

/// Foundation-models completion endpoint used by the classification passes.
pub const DEFAULT_COMPLETION_URL: &str =
    "https://llm.api.cloud.yandex.net/foundationModels/v1/completion";

/// Model path appended to `gpt://{folder_id}/`.
pub const DEFAULT_MODEL: &str = "yandexgpt-lite/rc";

/// Prefix under which the upstream exporter drops raw CSV files.
pub const SOURCE_PREFIX: &str = "vacancies/";

/// Prefix for enriched outputs.
pub const OUTPUT_PREFIX: &str = "processed/normalized/";

const ENV_STORE_ROOT: &str = "VACANCY_ENRICH_STORE_ROOT";
const ENV_API_KEY: &str = "YANDEX_GPT_API_KEY";
const ENV_FOLDER_ID: &str = "YANDEX_GPT_FOLDER_ID";
const ENV_ENDPOINT: &str = "YANDEX_GPT_ENDPOINT";
const ENV_MAX_FILES: &str = "VACANCY_ENRICH_MAX_FILES";

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Required environment variable {0} is not set")]
    MissingVar(&'static str),

    #[error("Invalid value for {name}: {value}")]
    InvalidValue { name: &'static str, value: String },

    #[error("Cannot determine home directory")]
    NoHomeDir,
}

/// Filter used when `RUST_LOG` is absent.
pub fn default_log_filter() -> &'static str {
    "vacancy_enrich=info,warn"
}

/// Get the application data directory (~/VacancyEnrich/).
pub fn app_data_dir() -> Result<PathBuf, ConfigError> {
    let home = dirs::home_dir().ok_or(ConfigError::NoHomeDir)?;
    Ok(home.join(APP_NAME))
}

/// Default root of the directory-backed object store.
pub fn default_store_root() -> Result<PathBuf, ConfigError> {
    Ok(app_data_dir()?.join("store"))
}

/// API key plus the folder the model is billed to. Both are opaque to the engine.
#[derive(Clone)]
pub struct Credentials {
    pub api_key: String,
    pub folder_id: String,
}

impl std::fmt::Debug for Credentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Credentials")
            .field("api_key", &"<redacted>")
            .field("folder_id", &self.folder_id)
            .finish()
    }
}

/// Everything the binary needs to run one pipeline pass.
#[derive(Debug, Clone)]
pub struct Settings {
    pub store_root: PathBuf,
    pub credentials: Credentials,
    pub endpoint: String,
    pub max_source_files: usize,
}

impl Settings {
    /// Read settings from the process environment.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Read settings through an arbitrary lookup (tests pass a map).
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let required = |name: &'static str| {
            lookup(name)
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
                .ok_or(ConfigError::MissingVar(name))
        };

        let credentials = Credentials {
            api_key: required(ENV_API_KEY)?,
            folder_id: required(ENV_FOLDER_ID)?,
        };

        let store_root = match lookup(ENV_STORE_ROOT) {
            Some(dir) if !dir.trim().is_empty() => PathBuf::from(dir),
            _ => default_store_root()?,
        };

        let endpoint = lookup(ENV_ENDPOINT)
            .filter(|v| !v.trim().is_empty())
            .unwrap_or_else(|| DEFAULT_COMPLETION_URL.to_string());

        let max_source_files = match lookup(ENV_MAX_FILES) {
            Some(raw) => match raw.trim().parse::<usize>() {
                Ok(n) if n > 0 => n,
                _ => {
                    return Err(ConfigError::InvalidValue {
                        name: ENV_MAX_FILES,
                        value: raw,
                    })
                }
            },
            None => crate::pipeline::ingest::DEFAULT_MAX_SOURCE_FILES,
        };

        Ok(Self {
            store_root,
            credentials,
            endpoint,
            max_source_files,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |name| map.get(name).cloned()
    }

    #[test]
    fn app_name_is_vacancy_enrich() {
        assert_eq!(APP_NAME, "VacancyEnrich");
    }

    #[test]
    fn settings_require_api_key() {
        let err = Settings::from_lookup(lookup_from(&[(ENV_FOLDER_ID, "b1g")])).unwrap_err();
        assert!(matches!(err, ConfigError::MissingVar(ENV_API_KEY)));
    }

    #[test]
    fn settings_reject_blank_folder() {
        let err = Settings::from_lookup(lookup_from(&[
            (ENV_API_KEY, "key"),
            (ENV_FOLDER_ID, "   "),
        ]))
        .unwrap_err();
        assert!(matches!(err, ConfigError::MissingVar(ENV_FOLDER_ID)));
    }

    #[test]
    fn settings_apply_defaults() {
        let settings = Settings::from_lookup(lookup_from(&[
            (ENV_API_KEY, "key"),
            (ENV_FOLDER_ID, "b1g"),
            (ENV_STORE_ROOT, "/tmp/store"),
        ]))
        .unwrap();
        assert_eq!(settings.store_root, PathBuf::from("/tmp/store"));
        assert_eq!(settings.endpoint, DEFAULT_COMPLETION_URL);
        assert_eq!(settings.max_source_files, 4);
        assert_eq!(settings.credentials.folder_id, "b1g");
    }

    #[test]
    fn settings_reject_zero_max_files() {
        let err = Settings::from_lookup(lookup_from(&[
            (ENV_API_KEY, "key"),
            (ENV_FOLDER_ID, "b1g"),
            (ENV_STORE_ROOT, "/tmp/store"),
            (ENV_MAX_FILES, "0"),
        ]))
        .unwrap_err();
        assert!(matches!(err, ConfigError::InvalidValue { .. }));
    }

    #[test]
    fn credentials_debug_hides_key() {
        let creds = Credentials {
            api_key: "secret-key".into(),
            folder_id: "b1g".into(),
        };
        let printed = format!("{creds:?}");
        assert!(!printed.contains("secret-key"));
        assert!(printed.contains("b1g"));
    }
}
