//! pf-config: string-keyed configuration consulted when models and
//! prognosers are constructed.
//!
//! Every key maps to an ordered list of string values. Files are read from the
//! line-oriented `key:value1,value2` format, or from YAML/JSON documents whose
//! values are scalars or lists of scalars.

pub mod map;
mod raw;

pub use map::ConfigMap;

pub type ConfigResult<T> = Result<T, ConfigError>;

#[derive(thiserror::Error, Debug)]
pub enum ConfigError {
    #[error("Missing required configuration key(s): {}", .keys.join(", "))]
    Missing { keys: Vec<String> },

    #[error("Parse error on line {line}: {reason}")]
    Parse { line: usize, reason: String },

    #[error("Invalid value: {key} = {value} ({reason})")]
    InvalidValue {
        key: String,
        value: String,
        reason: String,
    },

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

pub fn load(path: &std::path::Path) -> ConfigResult<ConfigMap> {
    let content = std::fs::read_to_string(path)?;
    match path.extension().and_then(|e| e.to_str()) {
        Some("yaml") | Some("yml") => ConfigMap::from_yaml_str(&content),
        Some("json") => ConfigMap::from_json_str(&content),
        _ => ConfigMap::parse(&content),
    }
}

pub fn save_yaml(path: &std::path::Path, config: &ConfigMap) -> ConfigResult<()> {
    let content = serde_yaml::to_string(config)?;
    std::fs::write(path, content)?;
    Ok(())
}

impl From<ConfigError> for pf_core::PfError {
    fn from(err: ConfigError) -> Self {
        pf_core::PfError::InvalidArg {
            what: err.to_string(),
        }
    }
}
