//! TOML configuration parsing and validation.
//!
//! Every section except `[db]` is optional. When no config file exists the
//! CLI falls back to [`Config::minimal`].
//!
//! ```toml
//! [db]
//! path = "./data/devtoolbox.sqlite"
//!
//! [server]
//! bind = "127.0.0.1:7340"
//!
//! [log]
//! level = "info"
//!
//! [lorem]
//! count = 3
//! min_words_per_sentence = 4
//! max_words_per_sentence = 12
//!
//! [favicon]
//! app_name = "My App"
//! theme_color = "#ffffff"
//!
//! [auth]
//! uid = "local"
//! ```

use anyhow::{Context, Result};
use devtoolbox_core::lorem::GenerationRequest;
use devtoolbox_core::models::User;
use serde::Deserialize;
use std::path::{Path, PathBuf};

#[derive(Debug, Deserialize, Clone)]
pub struct Config {
    pub db: DbConfig,
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub log: LogConfig,
    #[serde(default)]
    pub lorem: GenerationRequest,
    #[serde(default)]
    pub favicon: FaviconConfig,
    #[serde(default)]
    pub auth: AuthConfig,
}

#[derive(Debug, Deserialize, Clone)]
pub struct DbConfig {
    pub path: PathBuf,
}

#[derive(Debug, Deserialize, Clone)]
pub struct ServerConfig {
    #[serde(default = "default_bind")]
    pub bind: String,
    #[serde(default = "default_max_upload_bytes")]
    pub max_upload_bytes: usize,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind: default_bind(),
            max_upload_bytes: default_max_upload_bytes(),
        }
    }
}

fn default_bind() -> String {
    "127.0.0.1:7340".to_string()
}
fn default_max_upload_bytes() -> usize {
    10 * 1024 * 1024
}

#[derive(Debug, Deserialize, Clone)]
pub struct LogConfig {
    #[serde(default = "default_level")]
    pub level: String,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            level: default_level(),
        }
    }
}

fn default_level() -> String {
    "warn".to_string()
}

#[derive(Debug, Deserialize, Clone)]
pub struct FaviconConfig {
    #[serde(default = "default_app_name")]
    pub app_name: String,
    #[serde(default)]
    pub short_name: Option<String>,
    #[serde(default = "default_color")]
    pub theme_color: String,
    #[serde(default = "default_color")]
    pub background_color: String,
}

impl Default for FaviconConfig {
    fn default() -> Self {
        Self {
            app_name: default_app_name(),
            short_name: None,
            theme_color: default_color(),
            background_color: default_color(),
        }
    }
}

impl FaviconConfig {
    /// Colours end up in the manifest and the HTML snippet, so only hex
    /// values are accepted.
    pub fn validate(&self) -> Result<()> {
        for (field, color) in [
            ("favicon.theme_color", &self.theme_color),
            ("favicon.background_color", &self.background_color),
        ] {
            if !is_hex_color(color) {
                anyhow::bail!("{} must be a hex color like #1a2b3c (got '{}')", field, color);
            }
        }
        Ok(())
    }
}

fn default_app_name() -> String {
    "My App".to_string()
}
fn default_color() -> String {
    "#ffffff".to_string()
}

/// Identity signed in by the local auth provider.
#[derive(Debug, Deserialize, Clone)]
pub struct AuthConfig {
    #[serde(default = "default_uid")]
    pub uid: String,
    #[serde(default)]
    pub display_name: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            uid: default_uid(),
            display_name: None,
            email: None,
        }
    }
}

fn default_uid() -> String {
    "local".to_string()
}

impl AuthConfig {
    pub fn user(&self) -> User {
        User {
            uid: self.uid.clone(),
            display_name: self.display_name.clone(),
            email: self.email.clone(),
        }
    }
}

impl Config {
    /// Defaults for every section, with the database under `./data`.
    pub fn minimal() -> Self {
        Self {
            db: DbConfig {
                path: PathBuf::from("./data/devtoolbox.sqlite"),
            },
            server: ServerConfig::default(),
            log: LogConfig::default(),
            lorem: GenerationRequest::default(),
            favicon: FaviconConfig::default(),
            auth: AuthConfig::default(),
        }
    }
}

pub fn load_config(path: &Path) -> Result<Config> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read config file: {}", path.display()))?;

    let config: Config = toml::from_str(&content).with_context(|| "Failed to parse config file")?;
    validate(&config)?;
    Ok(config)
}

/// Load `path` if it exists, otherwise use [`Config::minimal`].
pub fn load_or_minimal(path: &Path) -> Result<Config> {
    if path.exists() {
        load_config(path)
    } else {
        Ok(Config::minimal())
    }
}

fn validate(config: &Config) -> Result<()> {
    if config.server.bind.trim().is_empty() {
        anyhow::bail!("server.bind must not be empty");
    }
    if config.server.max_upload_bytes == 0 {
        anyhow::bail!("server.max_upload_bytes must be > 0");
    }

    config
        .lorem
        .validate()
        .with_context(|| "Invalid [lorem] defaults")?;

    config.favicon.validate()?;

    if config.auth.uid.trim().is_empty() {
        anyhow::bail!("auth.uid must not be empty");
    }

    Ok(())
}

fn is_hex_color(s: &str) -> bool {
    s.strip_prefix('#').is_some_and(|hex| {
        matches!(hex.len(), 3 | 6 | 8) && hex.chars().all(|c| c.is_ascii_hexdigit())
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(toml_text: &str) -> Result<Config> {
        let config: Config = toml::from_str(toml_text)?;
        validate(&config)?;
        Ok(config)
    }

    #[test]
    fn test_minimal_file() {
        let cfg = parse("[db]\npath = \"x.sqlite\"\n").unwrap();
        assert_eq!(cfg.server.bind, "127.0.0.1:7340");
        assert_eq!(cfg.lorem, GenerationRequest::default());
        assert_eq!(cfg.auth.uid, "local");
    }

    #[test]
    fn test_partial_lorem_section_keeps_defaults() {
        let cfg = parse("[db]\npath = \"x\"\n[lorem]\ncount = 5\nunit = \"words\"\n").unwrap();
        assert_eq!(cfg.lorem.count, 5);
        assert_eq!(cfg.lorem.max_words_per_sentence, 12);
    }

    #[test]
    fn test_rejects_inverted_lorem_bounds() {
        let err = parse(
            "[db]\npath = \"x\"\n[lorem]\nmin_words_per_sentence = 9\nmax_words_per_sentence = 2\n",
        )
        .unwrap_err();
        assert!(format!("{:#}", err).contains("words per sentence"));
    }

    #[test]
    fn test_rejects_bad_color() {
        assert!(parse("[db]\npath = \"x\"\n[favicon]\ntheme_color = \"blue\"\n").is_err());
        assert!(is_hex_color("#fff"));
        assert!(!is_hex_color("\"><script>"));
        assert!(is_hex_color("#1a2B3c"));
    }

    #[test]
    fn test_favicon_overrides_are_validated() {
        let mut favicon = FaviconConfig::default();
        assert!(favicon.validate().is_ok());
        favicon.theme_color = "\"><script>alert(1)</script>".to_string();
        let err = favicon.validate().unwrap_err();
        assert!(err.to_string().contains("favicon.theme_color"));
    }

    #[test]
    fn test_load_or_minimal_without_file() {
        let cfg = load_or_minimal(Path::new("/definitely/not/here.toml")).unwrap();
        assert_eq!(cfg.db.path, PathBuf::from("./data/devtoolbox.sqlite"));
    }
}
