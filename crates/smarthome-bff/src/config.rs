//! Configuration file handling for smarthome-bff

use std::path::Path;
use std::time::Duration;

use anyhow::{bail, Context, Result};
use serde::{Deserialize, Serialize};
use smarthome_client::{ServiceUrl, TransportConfig};

/// Gateway configuration, as read from TOML
///
/// ```toml
/// [server]
/// host = "0.0.0.0"
/// port = 8080
///
/// [device_service]
/// url = "http://localhost:8000"
///
/// [telemetry_service]
/// url = "http://localhost:5000"
///
/// [http]
/// timeout_secs = 10
/// connect_timeout_secs = 5
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GatewayConfig {
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default = "ServiceConfig::device_registry")]
    pub device_service: ServiceConfig,
    #[serde(default = "ServiceConfig::telemetry_store")]
    pub telemetry_service: ServiceConfig,
    #[serde(default)]
    pub http: HttpConfig,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 8080,
        }
    }
}

/// Location of an upstream service
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ServiceConfig {
    pub url: String,
}

impl ServiceConfig {
    fn device_registry() -> Self {
        Self {
            url: "http://localhost:8000".to_string(),
        }
    }

    fn telemetry_store() -> Self {
        Self {
            url: "http://localhost:5000".to_string(),
        }
    }
}

/// Outbound HTTP timeouts
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct HttpConfig {
    pub timeout_secs: u64,
    pub connect_timeout_secs: u64,
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            timeout_secs: smarthome_client::DEFAULT_TIMEOUT.as_secs(),
            connect_timeout_secs: smarthome_client::DEFAULT_CONNECT_TIMEOUT.as_secs(),
        }
    }
}

impl Default for GatewayConfig {
    fn default() -> Self {
        Self {
            server: ServerConfig::default(),
            device_service: ServiceConfig::device_registry(),
            telemetry_service: ServiceConfig::telemetry_store(),
            http: HttpConfig::default(),
        }
    }
}

/// Values given on the command line or through the environment; each one
/// set wins over the file
#[derive(Debug, Clone, Default)]
pub struct Overrides {
    pub port: Option<u16>,
    pub device_service_url: Option<String>,
    pub telemetry_service_url: Option<String>,
    pub timeout_secs: Option<u64>,
}

impl GatewayConfig {
    /// Load configuration from a specific path
    pub fn load_from(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;
        toml::from_str(&content)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))
    }

    /// Load from `path` if given, otherwise start from the defaults
    pub fn load(path: Option<&Path>) -> Result<Self> {
        match path {
            Some(path) => Self::load_from(path),
            None => Ok(Self::default()),
        }
    }

    /// Merge command-line overrides over config file values
    pub fn merge_with_args(mut self, overrides: &Overrides) -> Self {
        if let Some(port) = overrides.port {
            self.server.port = port;
        }
        if let Some(url) = &overrides.device_service_url {
            self.device_service.url = url.clone();
        }
        if let Some(url) = &overrides.telemetry_service_url {
            self.telemetry_service.url = url.clone();
        }
        if let Some(timeout) = overrides.timeout_secs {
            self.http.timeout_secs = timeout;
        }
        self
    }

    /// Reject settings the gateway cannot run with
    pub fn validate(&self) -> Result<()> {
        if self.http.timeout_secs == 0 {
            bail!("http.timeout_secs must be greater than zero");
        }
        if self.http.connect_timeout_secs == 0 {
            bail!("http.connect_timeout_secs must be greater than zero");
        }
        check_service_url("device_service.url", &self.device_service.url)?;
        check_service_url("telemetry_service.url", &self.telemetry_service.url)?;
        Ok(())
    }

    /// Address the HTTP listener binds to
    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.server.host, self.server.port)
    }

    /// Timeouts for the shared outbound transport
    pub fn transport_config(&self) -> TransportConfig {
        TransportConfig {
            timeout: Duration::from_secs(self.http.timeout_secs),
            connect_timeout: Duration::from_secs(self.http.connect_timeout_secs),
        }
    }
}

fn check_service_url(key: &str, url: &str) -> Result<()> {
    let parsed = ServiceUrl::parse(url).with_context(|| format!("{key}: invalid URL '{url}'"))?;
    let scheme_ok = ["http://", "https://"]
        .iter()
        .any(|scheme| parsed.as_str().starts_with(scheme));
    if !scheme_ok {
        bail!("{key}: expected an http or https URL, got '{url}'");
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use std::io::Write;

    fn write_config(content: &str) -> tempfile::NamedTempFile {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(content.as_bytes()).unwrap();
        file
    }

    #[test]
    fn test_defaults() {
        let config = GatewayConfig::default();
        assert_eq!(config.bind_addr(), "0.0.0.0:8080");
        assert_eq!(config.device_service.url, "http://localhost:8000");
        assert_eq!(config.telemetry_service.url, "http://localhost:5000");
        assert_eq!(
            config.transport_config(),
            TransportConfig {
                timeout: Duration::from_secs(10),
                connect_timeout: Duration::from_secs(5),
            }
        );
        config.validate().unwrap();
    }

    #[test]
    fn test_load_full_file() {
        let file = write_config(
            r#"
            [server]
            host = "127.0.0.1"
            port = 9000

            [device_service]
            url = "http://devices.internal:8000"

            [telemetry_service]
            url = "http://telemetry.internal:5000/v2"

            [http]
            timeout_secs = 3
            connect_timeout_secs = 1
            "#,
        );

        let config = GatewayConfig::load(Some(file.path())).unwrap();
        assert_eq!(config.bind_addr(), "127.0.0.1:9000");
        assert_eq!(config.device_service.url, "http://devices.internal:8000");
        assert_eq!(config.telemetry_service.url, "http://telemetry.internal:5000/v2");
        assert_eq!(config.http.timeout_secs, 3);
        assert_eq!(config.http.connect_timeout_secs, 1);
    }

    #[test]
    fn test_partial_file_keeps_defaults() {
        let file = write_config("[server]\nport = 9100\n");

        let config = GatewayConfig::load_from(file.path()).unwrap();
        assert_eq!(config.bind_addr(), "0.0.0.0:9100");
        assert_eq!(config.device_service, GatewayConfig::default().device_service);
        assert_eq!(config.http, HttpConfig::default());
    }

    #[test]
    fn test_load_without_path_uses_defaults() {
        assert_eq!(GatewayConfig::load(None).unwrap(), GatewayConfig::default());
    }

    #[test]
    fn test_load_errors_name_the_file() {
        let file = write_config("[server\nport = ");
        let err = GatewayConfig::load_from(file.path()).unwrap_err();
        assert!(err.to_string().starts_with("Failed to parse config file"));

        let missing = Path::new("/nonexistent/smarthome-bff.toml");
        let err = GatewayConfig::load_from(missing).unwrap_err();
        assert!(err.to_string().contains("/nonexistent/smarthome-bff.toml"));
    }

    #[test]
    fn test_overrides_win() {
        let overrides = Overrides {
            port: Some(7000),
            device_service_url: Some("http://registry:8000".to_string()),
            telemetry_service_url: None,
            timeout_secs: Some(30),
        };

        let config = GatewayConfig::default().merge_with_args(&overrides);
        assert_eq!(config.server.port, 7000);
        assert_eq!(config.device_service.url, "http://registry:8000");
        assert_eq!(config.telemetry_service.url, "http://localhost:5000");
        assert_eq!(config.http.timeout_secs, 30);
        assert_eq!(config.http.connect_timeout_secs, 5);
    }

    #[test]
    fn test_validate_rejects_zero_timeout() {
        let overrides = Overrides {
            timeout_secs: Some(0),
            ..Overrides::default()
        };
        let config = GatewayConfig::default().merge_with_args(&overrides);
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_validate_rejects_bad_urls() {
        let mut config = GatewayConfig::default();
        config.device_service.url = "not a url".to_string();
        let err = config.validate().unwrap_err();
        assert!(err.to_string().starts_with("device_service.url"));

        let mut config = GatewayConfig::default();
        config.telemetry_service.url = "ftp://telemetry:21".to_string();
        let err = config.validate().unwrap_err();
        assert!(err.to_string().starts_with("telemetry_service.url"));
    }
}
