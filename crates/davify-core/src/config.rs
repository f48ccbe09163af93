//! Connection and output configuration.
//!
//! Credentials and patterns come from the environment, optionally seeded
//! from a dotenv-style user config file (`davify setup` writes one). Real
//! environment variables always win over file entries.

use std::env;
use std::path::PathBuf;

use crate::filename::UploadFilename;

pub const DEFAULT_FILE_URL_PATTERN: &str = "{protocol}://{server}{path}{filename}";
pub const DEFAULT_NOTIFICATION_PATTERN: &str =
    "{url}\\n{hash}(Note: The file will be available for {lifetime}.)";

const DEFAULT_PROTOCOL: &str = "https";
const DEFAULT_PORT: u16 = 443;
const DEFAULT_REMOTE_PATH: &str = "/";

/// WebDAV connection settings plus the URL/notification templates.
#[derive(Clone, Debug)]
pub struct WebDavConfig {
    pub protocol: String,
    pub server: String,
    pub port: u16,
    /// Server-side directory the uploads land in. Always `/`-wrapped.
    pub remote_path: String,
    pub username: String,
    pub password: String,
    pub file_url_pattern: String,
    pub notification_pattern: String,
}

impl WebDavConfig {
    /// Path of the user config file: `$DAVIFY_CONFIG`, else
    /// `$XDG_CONFIG_HOME/davify/config.env`, else `~/.config/davify/config.env`.
    pub fn user_config_path() -> Option<PathBuf> {
        if let Ok(explicit) = env::var("DAVIFY_CONFIG") {
            return Some(PathBuf::from(explicit));
        }
        let base = env::var("XDG_CONFIG_HOME")
            .map(PathBuf::from)
            .or_else(|_| env::var("HOME").map(|h| PathBuf::from(h).join(".config")))
            .ok()?;
        Some(base.join("davify").join("config.env"))
    }

    pub fn from_env() -> Result<Self, anyhow::Error> {
        dotenvy::dotenv().ok();
        if let Some(path) = Self::user_config_path() {
            dotenvy::from_path(&path).ok();
        }

        let mut remote_path =
            env::var("DAVIFY_REMOTE_PATH").unwrap_or_else(|_| DEFAULT_REMOTE_PATH.to_string());
        if !remote_path.ends_with('/') {
            remote_path.push('/');
        }

        let config = WebDavConfig {
            protocol: env::var("DAVIFY_PROTOCOL")
                .unwrap_or_else(|_| DEFAULT_PROTOCOL.to_string())
                .to_lowercase(),
            server: env::var("DAVIFY_SERVER")
                .map_err(|_| anyhow::anyhow!("DAVIFY_SERVER must be set (run `davify setup`)"))?,
            port: env::var("DAVIFY_PORT")
                .unwrap_or_else(|_| DEFAULT_PORT.to_string())
                .parse()
                .map_err(|_| anyhow::anyhow!("DAVIFY_PORT must be a valid port number"))?,
            remote_path,
            username: env::var("DAVIFY_USERNAME")
                .map_err(|_| anyhow::anyhow!("DAVIFY_USERNAME must be set (run `davify setup`)"))?,
            password: env::var("DAVIFY_PASSWORD")
                .map_err(|_| anyhow::anyhow!("DAVIFY_PASSWORD must be set (run `davify setup`)"))?,
            file_url_pattern: env::var("DAVIFY_FILE_URL_PATTERN")
                .unwrap_or_else(|_| DEFAULT_FILE_URL_PATTERN.to_string()),
            notification_pattern: env::var("DAVIFY_NOTIFICATION_PATTERN")
                .unwrap_or_else(|_| DEFAULT_NOTIFICATION_PATTERN.to_string()),
        };

        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), anyhow::Error> {
        if self.protocol != "http" && self.protocol != "https" {
            return Err(anyhow::anyhow!(
                "DAVIFY_PROTOCOL must be 'http' or 'https', got {:?}",
                self.protocol
            ));
        }
        if self.server.is_empty() || self.server.contains('/') {
            return Err(anyhow::anyhow!(
                "DAVIFY_SERVER must be a bare host name, got {:?}",
                self.server
            ));
        }
        if self.port == 0 {
            return Err(anyhow::anyhow!("DAVIFY_PORT must be non-zero"));
        }
        if !self.remote_path.starts_with('/') {
            return Err(anyhow::anyhow!(
                "DAVIFY_REMOTE_PATH must start with '/', got {:?}",
                self.remote_path
            ));
        }
        Ok(())
    }

    /// Whether the configured port is the scheme default and can be omitted
    /// from rendered URLs.
    fn is_default_port(&self) -> bool {
        matches!(
            (self.protocol.as_str(), self.port),
            ("https", 443) | ("http", 80)
        )
    }

    /// Authority part for the upload endpoint, with the port only when it
    /// differs from the scheme default.
    pub fn authority(&self) -> String {
        if self.is_default_port() {
            self.server.clone()
        } else {
            format!("{}:{}", self.server, self.port)
        }
    }

    /// Full PUT target for a percent-encoded remote name.
    pub fn endpoint_url(&self, encoded_name: &str) -> String {
        format!(
            "{}://{}{}{}",
            self.protocol,
            self.authority(),
            self.remote_path,
            encoded_name
        )
    }

    /// Retrieval URL for a composed name, rendered from `file_url_pattern`.
    pub fn file_url(&self, filename: &UploadFilename) -> String {
        self.file_url_pattern
            .replace("{protocol}", &self.protocol)
            .replace("{server}", &self.authority())
            .replace("{path}", &self.remote_path)
            .replace("{filename}", &filename.encoded_name())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config() -> WebDavConfig {
        WebDavConfig {
            protocol: "https".to_string(),
            server: "dav.example.org".to_string(),
            port: 443,
            remote_path: "/shared/".to_string(),
            username: "alice".to_string(),
            password: "secret".to_string(),
            file_url_pattern: DEFAULT_FILE_URL_PATTERN.to_string(),
            notification_pattern: DEFAULT_NOTIFICATION_PATTERN.to_string(),
        }
    }

    fn filename() -> UploadFilename {
        UploadFilename {
            random_prefix: "EIcL".to_string(),
            lifetime_code: 'm',
            base: "buchungen".to_string(),
            version_suffix: String::new(),
            ext: ".pdf".to_string(),
        }
    }

    #[test]
    fn default_port_is_omitted_from_urls() {
        let config = config();
        assert_eq!(
            config.file_url(&filename()),
            "https://dav.example.org/shared/EIcLm-buchungen.pdf"
        );
        assert_eq!(
            config.endpoint_url("EIcLm-buchungen.pdf"),
            "https://dav.example.org/shared/EIcLm-buchungen.pdf"
        );
    }

    #[test]
    fn explicit_port_is_kept() {
        let mut config = config();
        config.port = 8443;
        assert_eq!(
            config.endpoint_url("x"),
            "https://dav.example.org:8443/shared/x"
        );
    }

    #[test]
    fn validate_rejects_bad_protocol_and_path() {
        let mut config = config();
        config.protocol = "ftp".to_string();
        assert!(config.validate().is_err());

        let mut config = self::config();
        config.remote_path = "shared/".to_string();
        assert!(config.validate().is_err());

        let mut config = self::config();
        config.server = "dav.example.org/dav".to_string();
        assert!(config.validate().is_err());
    }
}
