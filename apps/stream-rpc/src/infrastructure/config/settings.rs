//! Service Configuration Settings
//!
//! Configuration types for the server and the demo caller, loaded from
//! environment variables. Unparseable numeric values fall back to their
//! defaults.

use std::path::PathBuf;
use std::time::Duration;

use crate::application::services::{CalculatorSettings, GreeterSettings};
use crate::infrastructure::grpc::{ClientTls, ServerTls, TlsError};

/// Server listen settings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServerSettings {
    /// Bind host.
    pub host: String,
    /// gRPC server port.
    pub grpc_port: u16,
    /// Health check and metrics HTTP port.
    pub health_port: u16,
    /// Time allowed for in-flight calls to drain on shutdown.
    pub shutdown_timeout: Duration,
}

impl Default for ServerSettings {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            grpc_port: 50051,
            health_port: 8083,
            shutdown_timeout: Duration::from_secs(30),
        }
    }
}

impl ServerSettings {
    /// `host:grpc_port`.
    #[must_use]
    pub fn grpc_addr(&self) -> String {
        format!("{}:{}", self.host, self.grpc_port)
    }

    /// `host:health_port`.
    #[must_use]
    pub fn health_addr(&self) -> String {
        format!("{}:{}", self.host, self.health_port)
    }
}

/// Pacing and buffering of the streaming operations.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StreamSettings {
    /// Outbound channel capacity per call.
    pub stream_buffer: usize,
    /// Delay between `GreetManyTimes` items.
    pub greet_interval: Duration,
    /// Items emitted by `GreetManyTimes`.
    pub greet_repeat: u32,
    /// Duration of one `GreetWithDeadline` work step.
    pub deadline_step: Duration,
    /// Trial divisions per factorization slice.
    pub factor_budget: u32,
}

impl Default for StreamSettings {
    fn default() -> Self {
        Self {
            stream_buffer: 16,
            greet_interval: Duration::from_secs(1),
            greet_repeat: 10,
            deadline_step: Duration::from_secs(1),
            factor_budget: 10_000,
        }
    }
}

impl StreamSettings {
    /// Calculator use case settings.
    #[must_use]
    pub const fn calculator(&self) -> CalculatorSettings {
        CalculatorSettings {
            stream_buffer: self.stream_buffer,
            factor_budget: self.factor_budget,
        }
    }

    /// Greeter use case settings.
    #[must_use]
    pub const fn greeter(&self) -> GreeterSettings {
        GreeterSettings {
            stream_buffer: self.stream_buffer,
            interval: self.greet_interval,
            repeat: self.greet_repeat,
            step_delay: self.deadline_step,
        }
    }
}

/// Server identity file paths.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TlsSettings {
    /// PEM certificate path.
    pub cert_path: Option<PathBuf>,
    /// PEM private key path.
    pub key_path: Option<PathBuf>,
}

impl TlsSettings {
    /// Load the configured identity, if any.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if the files cannot be loaded.
    pub fn identity(&self) -> Result<Option<ServerTls>, ConfigError> {
        match (&self.cert_path, &self.key_path) {
            (Some(cert), Some(key)) => Ok(Some(ServerTls::from_files(cert, key)?)),
            _ => Ok(None),
        }
    }
}

/// Complete server configuration.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RpcConfig {
    /// Listen settings.
    pub server: ServerSettings,
    /// Stream pacing.
    pub streams: StreamSettings,
    /// Optional TLS identity.
    pub tls: TlsSettings,
}

impl RpcConfig {
    /// Create configuration from environment variables.
    ///
    /// # Errors
    ///
    /// Returns an error if only one half of the TLS pair is set.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_source(|key| std::env::var(key).ok())
    }

    /// Create configuration from an arbitrary key lookup.
    ///
    /// # Errors
    ///
    /// Returns an error if only one half of the TLS pair is set.
    pub fn from_source(get: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let server_defaults = ServerSettings::default();
        let server = ServerSettings {
            host: get("STREAM_RPC_HOST").unwrap_or(server_defaults.host),
            grpc_port: parse_u16(&get, "STREAM_RPC_GRPC_PORT", server_defaults.grpc_port),
            health_port: parse_u16(&get, "STREAM_RPC_HEALTH_PORT", server_defaults.health_port),
            shutdown_timeout: parse_duration_secs(
                &get,
                "STREAM_RPC_SHUTDOWN_TIMEOUT_SECS",
                server_defaults.shutdown_timeout,
            ),
        };

        let stream_defaults = StreamSettings::default();
        let streams = StreamSettings {
            stream_buffer: parse_usize(
                &get,
                "STREAM_RPC_STREAM_BUFFER",
                stream_defaults.stream_buffer,
            ),
            greet_interval: parse_duration_millis(
                &get,
                "STREAM_RPC_GREET_INTERVAL_MS",
                stream_defaults.greet_interval,
            ),
            greet_repeat: parse_u32(&get, "STREAM_RPC_GREET_REPEAT", stream_defaults.greet_repeat),
            deadline_step: parse_duration_millis(
                &get,
                "STREAM_RPC_DEADLINE_STEP_MS",
                stream_defaults.deadline_step,
            ),
            factor_budget: parse_u32(
                &get,
                "STREAM_RPC_FACTOR_BUDGET",
                stream_defaults.factor_budget,
            ),
        };

        let cert_path = get("STREAM_RPC_TLS_CERT").map(PathBuf::from);
        let key_path = get("STREAM_RPC_TLS_KEY").map(PathBuf::from);
        match (&cert_path, &key_path) {
            (Some(_), None) => return Err(ConfigError::IncompleteTls("STREAM_RPC_TLS_KEY")),
            (None, Some(_)) => return Err(ConfigError::IncompleteTls("STREAM_RPC_TLS_CERT")),
            _ => {}
        }

        Ok(Self {
            server,
            streams,
            tls: TlsSettings {
                cert_path,
                key_path,
            },
        })
    }
}

/// Demo caller configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientSettings {
    /// Server URL.
    pub server_url: String,
    /// CA certificate to trust; TLS is used when set or when the URL is `https`.
    pub ca_cert: Option<PathBuf>,
    /// Server name checked against the certificate.
    pub tls_domain: String,
    /// Delay between the caller's own stream items.
    pub pacing: Duration,
}

impl Default for ClientSettings {
    fn default() -> Self {
        Self {
            server_url: "http://localhost:50051".to_string(),
            ca_cert: None,
            tls_domain: "localhost".to_string(),
            pacing: Duration::from_secs(1),
        }
    }
}

impl ClientSettings {
    /// Create configuration from environment variables.
    #[must_use]
    pub fn from_env() -> Self {
        Self::from_source(|key| std::env::var(key).ok())
    }

    /// Create configuration from an arbitrary key lookup.
    #[must_use]
    pub fn from_source(get: impl Fn(&str) -> Option<String>) -> Self {
        let defaults = Self::default();
        Self {
            server_url: get("STREAM_RPC_SERVER_URL").unwrap_or(defaults.server_url),
            ca_cert: get("STREAM_RPC_CA_CERT").map(PathBuf::from),
            tls_domain: get("STREAM_RPC_TLS_DOMAIN").unwrap_or(defaults.tls_domain),
            pacing: parse_duration_millis(&get, "STREAM_RPC_CLIENT_PACING_MS", defaults.pacing),
        }
    }

    /// TLS trust settings, if the caller should use TLS.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if the CA file cannot be loaded.
    pub fn tls(&self) -> Result<Option<ClientTls>, ConfigError> {
        if let Some(ca) = &self.ca_cert {
            return Ok(Some(ClientTls::from_ca_file(ca, self.tls_domain.clone())?));
        }
        if self.server_url.starts_with("https://") {
            return Ok(Some(ClientTls::native_roots(self.tls_domain.clone())));
        }
        Ok(None)
    }
}

/// Configuration error.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// Only one half of the TLS certificate/key pair was configured.
    #[error("incomplete TLS configuration: {0} is not set")]
    IncompleteTls(&'static str),

    /// TLS files could not be loaded.
    #[error(transparent)]
    Tls(#[from] TlsError),
}

fn parse_u16(get: &impl Fn(&str) -> Option<String>, key: &str, default: u16) -> u16 {
    get(key).and_then(|v| v.parse().ok()).unwrap_or(default)
}

fn parse_u32(get: &impl Fn(&str) -> Option<String>, key: &str, default: u32) -> u32 {
    get(key).and_then(|v| v.parse().ok()).unwrap_or(default)
}

fn parse_usize(get: &impl Fn(&str) -> Option<String>, key: &str, default: usize) -> usize {
    get(key).and_then(|v| v.parse().ok()).unwrap_or(default)
}

fn parse_duration_secs(
    get: &impl Fn(&str) -> Option<String>,
    key: &str,
    default: Duration,
) -> Duration {
    get(key)
        .and_then(|v| v.parse::<u64>().ok())
        .map_or(default, Duration::from_secs)
}

fn parse_duration_millis(
    get: &impl Fn(&str) -> Option<String>,
    key: &str,
    default: Duration,
) -> Duration {
    get(key)
        .and_then(|v| v.parse::<u64>().ok())
        .map_or(default, Duration::from_millis)
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    fn source(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn defaults_when_unset() {
        let config = RpcConfig::from_source(source(&[])).unwrap();
        assert_eq!(config, RpcConfig::default());
        assert_eq!(config.server.grpc_addr(), "0.0.0.0:50051");
        assert_eq!(config.server.health_addr(), "0.0.0.0:8083");
    }

    #[test]
    fn reads_overrides() {
        let config = RpcConfig::from_source(source(&[
            ("STREAM_RPC_HOST", "127.0.0.1"),
            ("STREAM_RPC_GRPC_PORT", "6000"),
            ("STREAM_RPC_GREET_INTERVAL_MS", "5"),
            ("STREAM_RPC_GREET_REPEAT", "3"),
            ("STREAM_RPC_FACTOR_BUDGET", "7"),
        ]))
        .unwrap();

        assert_eq!(config.server.grpc_addr(), "127.0.0.1:6000");
        assert_eq!(config.streams.greet_interval, Duration::from_millis(5));
        assert_eq!(config.streams.greeter().repeat, 3);
        assert_eq!(config.streams.calculator().factor_budget, 7);
    }

    #[test]
    fn invalid_numbers_fall_back() {
        let config = RpcConfig::from_source(source(&[
            ("STREAM_RPC_GRPC_PORT", "not-a-port"),
            ("STREAM_RPC_STREAM_BUFFER", "-1"),
        ]))
        .unwrap();
        assert_eq!(config.server.grpc_port, 50051);
        assert_eq!(config.streams.stream_buffer, 16);
    }

    #[test]
    fn half_tls_pair_is_rejected() {
        let err = RpcConfig::from_source(source(&[("STREAM_RPC_TLS_CERT", "/tmp/c.pem")]))
            .unwrap_err();
        assert!(matches!(err, ConfigError::IncompleteTls("STREAM_RPC_TLS_KEY")));
    }

    #[test]
    fn no_tls_without_paths() {
        assert!(TlsSettings::default().identity().unwrap().is_none());
    }

    #[test]
    fn client_defaults_and_tls_choice() {
        let plain = ClientSettings::from_source(source(&[]));
        assert_eq!(plain, ClientSettings::default());
        assert!(plain.tls().unwrap().is_none());

        let https = ClientSettings::from_source(source(&[(
            "STREAM_RPC_SERVER_URL",
            "https://example.test:443",
        )]));
        assert!(https.tls().unwrap().is_some());

        let missing_ca =
            ClientSettings::from_source(source(&[("STREAM_RPC_CA_CERT", "/nonexistent/ca.pem")]));
        assert!(matches!(missing_ca.tls(), Err(ConfigError::Tls(_))));
    }
}
