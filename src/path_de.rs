use serde::de::DeserializeOwned;

use crate::error::ConfigError;

/// Deserialize with JSON-path context in error messages.
pub fn from_str_with_path<T: DeserializeOwned>(src: &str) -> Result<T, ConfigError> {
    let de = &mut serde_json::Deserializer::from_str(src);
    serde_path_to_error::deserialize::<_, T>(de).map_err(with_path)
}

/// Same, from an already parsed document.
pub fn from_value_with_path<T: DeserializeOwned>(
    value: serde_json::Value,
) -> Result<T, ConfigError> {
    serde_path_to_error::deserialize::<_, T>(value).map_err(with_path)
}

fn with_path<E: std::fmt::Display>(err: serde_path_to_error::Error<E>) -> ConfigError {
    let path = err.path().to_string();
    ConfigError::Manifest(format!("at JSON path {path} → {}", err.into_inner()))
}
