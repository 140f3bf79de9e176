//! CLI configuration management.
//!
//! Configuration is stored as TOML:
//! - Linux: `~/.config/pan123/config.toml`
//! - Windows: `%APPDATA%/pan123/config.toml`

use std::path::{Path, PathBuf};

use pan123_client::{Platform, SessionConfig};
use serde::{Deserialize, Serialize};

/// Persisted account and device settings.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub user_name: String,

    #[serde(default)]
    pub password: String,

    /// Full `Authorization` header value of the last sign-in.
    #[serde(default)]
    pub authorization: String,

    /// Device model presented on the Android protocol (random when empty).
    #[serde(default)]
    pub device_type: String,

    #[serde(default)]
    pub os_version: String,

    #[serde(default)]
    pub protocol: Platform,
}

impl Config {
    /// Loads configuration from `path`, or defaults if the file is missing.
    pub fn load(path: &Path) -> anyhow::Result<Self> {
        if !path.exists() {
            tracing::debug!(path = %path.display(), "no configuration file, using defaults");
            return Ok(Self::default());
        }
        let content = std::fs::read_to_string(path)?;
        let config: Config = toml::from_str(&content)?;
        Ok(config)
    }

    /// Saves the configuration to `path`.
    pub fn save(&self, path: &Path) -> anyhow::Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let content = toml::to_string_pretty(self)?;
        std::fs::write(path, content)?;

        // Holds the password and token.
        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            std::fs::set_permissions(path, std::fs::Permissions::from_mode(0o600))?;
        }

        tracing::debug!(path = %path.display(), "configuration saved");
        Ok(())
    }

    pub fn session(&self) -> SessionConfig {
        SessionConfig {
            user_name: self.user_name.clone(),
            password: self.password.clone(),
            authorization: self.authorization.clone(),
            device_type: self.device_type.clone(),
            os_version: self.os_version.clone(),
            protocol: self.protocol,
        }
    }

    pub fn set_session(&mut self, session: SessionConfig) {
        self.user_name = session.user_name;
        self.password = session.password;
        self.authorization = session.authorization;
        self.device_type = session.device_type;
        self.os_version = session.os_version;
        self.protocol = session.protocol;
    }
}

/// Returns the platform-specific configuration file path.
pub fn default_path() -> PathBuf {
    #[cfg(target_os = "windows")]
    {
        let appdata =
            std::env::var("APPDATA").unwrap_or_else(|_| "C:\\Users\\Default\\AppData".into());
        PathBuf::from(appdata).join("pan123").join("config.toml")
    }

    #[cfg(not(target_os = "windows"))]
    {
        let home = std::env::var("HOME").unwrap_or_else(|_| "/tmp".into());
        PathBuf::from(home)
            .join(".config")
            .join("pan123")
            .join("config.toml")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config() {
        let config = Config::default();
        assert!(config.user_name.is_empty());
        assert!(config.authorization.is_empty());
        assert_eq!(config.protocol, Platform::Android);
    }

    #[test]
    fn config_roundtrip_toml() {
        let config = Config {
            user_name: "13800000000".into(),
            password: "secret".into(),
            authorization: "Bearer abc".into(),
            device_type: "M2004J11G".into(),
            os_version: "Android_11".into(),
            protocol: Platform::Web,
        };

        let toml_str = toml::to_string_pretty(&config).unwrap();
        assert!(toml_str.contains("protocol = \"web\""));
        let parsed: Config = toml::from_str(&toml_str).unwrap();
        assert_eq!(parsed, config);
    }

    #[test]
    fn config_partial_toml() {
        let config: Config = toml::from_str(r#"user_name = "alice""#).unwrap();
        assert_eq!(config.user_name, "alice");
        assert!(config.password.is_empty());
        assert_eq!(config.protocol, Platform::Android);
    }

    #[test]
    fn unknown_protocol_rejected() {
        assert!(toml::from_str::<Config>(r#"protocol = "ios""#).is_err());
    }

    #[test]
    fn missing_file_yields_defaults() {
        let tmp = tempfile::tempdir().unwrap();
        let config = Config::load(&tmp.path().join("absent.toml")).unwrap();
        assert_eq!(config, Config::default());
    }

    #[test]
    fn config_save_and_load() {
        let tmp = tempfile::tempdir().unwrap();
        let path = tmp.path().join("nested").join("config.toml");

        let config = Config {
            user_name: "SaveTest".into(),
            ..Config::default()
        };
        config.save(&path).unwrap();

        let loaded = Config::load(&path).unwrap();
        assert_eq!(loaded.user_name, "SaveTest");

        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            let mode = std::fs::metadata(&path).unwrap().permissions().mode();
            assert_eq!(mode & 0o777, 0o600);
        }
    }

    #[test]
    fn session_fields_carry_over() {
        let mut config = Config::default();
        let session = SessionConfig {
            user_name: "bob".into(),
            authorization: "Bearer t".into(),
            protocol: Platform::Web,
            ..SessionConfig::default()
        };
        config.set_session(session.clone());
        assert_eq!(config.session(), session);
    }

    #[test]
    fn default_path_names_the_app() {
        assert!(default_path().to_string_lossy().contains("pan123"));
    }
}
