use std::{fmt::Display, fs, path::Path};

use serde::{Deserialize, Serialize};

use crate::{
    error::{ConfigError, Result},
    utils,
};

pub const DEFAULT_API_URL: &str = "https://api.twitter.com/1.1";

const PLACEHOLDER_PREFIX: &str = "your_";

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    pub consumer_key: String,
    pub consumer_secret: String,
    pub access_token: String,
    pub access_secret: String,
    #[serde(default = "default_api_url")]
    pub api_url: String,
}

fn default_api_url() -> String {
    DEFAULT_API_URL.to_string()
}

impl Config {
    pub fn load() -> Result<Self> {
        let config_file = utils::get_config_file()?;
        Self::from_file(&config_file)
    }

    pub fn from_file(path: &Path) -> Result<Self> {
        let data = fs::read_to_string(path).map_err(|e| ConfigError::ReadFailed {
            path: path.to_string_lossy().to_string(),
            source: e,
        })?;
        Self::from_toml(&data)
    }

    pub fn from_toml(data: &str) -> Result<Self> {
        let cfg: Config =
            toml::from_str(data).map_err(|source| ConfigError::InvalidFormat { source })?;
        Ok(cfg)
    }

    /// Template written by `config --init`.
    pub fn template() -> Self {
        Self {
            consumer_key: "your_consumer_key".to_string(),
            consumer_secret: "your_consumer_secret".to_string(),
            access_token: "your_access_token".to_string(),
            access_secret: "your_access_secret".to_string(),
            api_url: default_api_url(),
        }
    }

    /// Rejects empty credentials and ones still holding the template values.
    pub fn validate(&self) -> std::result::Result<(), ConfigError> {
        let fields = [
            ("consumer_key", &self.consumer_key),
            ("consumer_secret", &self.consumer_secret),
            ("access_token", &self.access_token),
            ("access_secret", &self.access_secret),
        ];
        for (field, value) in fields {
            let value = value.trim();
            if value.is_empty() || value.starts_with(PLACEHOLDER_PREFIX) {
                return Err(ConfigError::MissingField {
                    field: field.to_string(),
                });
            }
        }
        Ok(())
    }
}

fn mask(secret: &str) -> String {
    let visible: String = secret.chars().take(4).collect();
    if secret.chars().count() <= 4 {
        "****".to_string()
    } else {
        format!("{visible}****")
    }
}

impl Display for Config {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "Consumer Key: {}\nConsumer Secret: {}\nAccess Token: {}\nAccess Token Secret: {}\nAPI URL: {}",
            mask(&self.consumer_key),
            mask(&self.consumer_secret),
            mask(&self.access_token),
            mask(&self.access_secret),
            self.api_url
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::FollowbackError;

    const FULL: &str = r#"
        consumer_key = "abcdefgh"
        consumer_secret = "secret-1"
        access_token = "token-1"
        access_secret = "secret-2"
    "#;

    #[test]
    fn test_from_toml_defaults_api_url() {
        let cfg = Config::from_toml(FULL).unwrap();
        assert_eq!(cfg.consumer_key, "abcdefgh");
        assert_eq!(cfg.api_url, DEFAULT_API_URL);
        assert!(cfg.validate().is_ok());
    }

    #[test]
    fn test_missing_field_is_invalid_format() {
        let err = Config::from_toml("consumer_key = \"x\"").unwrap_err();
        assert!(matches!(
            err,
            FollowbackError::ConfigError(ConfigError::InvalidFormat { .. })
        ));
    }

    #[test]
    fn test_template_fails_validation() {
        let err = Config::template().validate().unwrap_err();
        assert_eq!(
            err.to_string(),
            "Missing required field in config: consumer_key"
        );
    }

    #[test]
    fn test_display_masks_secrets() {
        let cfg = Config::from_toml(FULL).unwrap();
        let shown = cfg.to_string();
        assert!(shown.contains("Consumer Key: abcd****"));
        assert!(!shown.contains("secret-2"));
        assert!(!shown.contains("token-1"));
    }
}
