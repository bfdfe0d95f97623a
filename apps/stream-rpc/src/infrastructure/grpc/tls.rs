//! TLS Material for gRPC
//!
//! Server identity (certificate + private key) and the caller's trust
//! anchor, both loaded from PEM files.

use std::fs;
use std::path::{Path, PathBuf};

use tonic::transport::{Certificate, ClientTlsConfig, Identity, ServerTlsConfig};

/// TLS configuration errors.
#[derive(Debug, thiserror::Error)]
pub enum TlsError {
    /// Failed to read a PEM file.
    #[error("failed to read {path}: {source}")]
    Read {
        /// File that could not be read.
        path: PathBuf,
        /// Underlying I/O error.
        source: std::io::Error,
    },

    /// The file was read but holds no PEM block.
    #[error("{0} does not contain PEM data")]
    NotPem(PathBuf),
}

fn read_pem(path: &Path) -> Result<String, TlsError> {
    let pem = fs::read_to_string(path).map_err(|source| TlsError::Read {
        path: path.to_path_buf(),
        source,
    })?;
    if !pem.contains("-----BEGIN ") {
        return Err(TlsError::NotPem(path.to_path_buf()));
    }
    Ok(pem)
}

/// Certificate and private key presented by the server.
#[derive(Clone)]
pub struct ServerTls {
    cert: String,
    key: String,
}

impl std::fmt::Debug for ServerTls {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ServerTls")
            .field("cert_len", &self.cert.len())
            .field("key", &"[REDACTED]")
            .finish()
    }
}

impl ServerTls {
    /// Load the identity from PEM files.
    ///
    /// # Errors
    ///
    /// Returns `TlsError` if either file cannot be read or is not PEM.
    pub fn from_files(
        cert_path: impl AsRef<Path>,
        key_path: impl AsRef<Path>,
    ) -> Result<Self, TlsError> {
        let cert = read_pem(cert_path.as_ref())?;
        let key = read_pem(key_path.as_ref())?;
        tracing::info!(
            cert_path = %cert_path.as_ref().display(),
            "Loaded server TLS identity"
        );
        Ok(Self { cert, key })
    }

    /// Identity from PEM strings.
    pub fn from_pem(cert: impl Into<String>, key: impl Into<String>) -> Self {
        Self {
            cert: cert.into(),
            key: key.into(),
        }
    }

    /// Tonic server configuration.
    #[must_use]
    pub fn server_config(&self) -> ServerTlsConfig {
        ServerTlsConfig::new().identity(Identity::from_pem(&self.cert, &self.key))
    }
}

/// Trust settings used by the caller.
#[derive(Debug, Clone)]
pub struct ClientTls {
    ca_cert: Option<String>,
    domain: String,
}

impl ClientTls {
    /// Trust the platform's native roots.
    pub fn native_roots(domain: impl Into<String>) -> Self {
        Self {
            ca_cert: None,
            domain: domain.into(),
        }
    }

    /// Trust a single CA certificate loaded from `ca_path`.
    ///
    /// # Errors
    ///
    /// Returns `TlsError` if the file cannot be read or is not PEM.
    pub fn from_ca_file(
        ca_path: impl AsRef<Path>,
        domain: impl Into<String>,
    ) -> Result<Self, TlsError> {
        Ok(Self {
            ca_cert: Some(read_pem(ca_path.as_ref())?),
            domain: domain.into(),
        })
    }

    /// Tonic client configuration.
    #[must_use]
    pub fn client_config(&self) -> ClientTlsConfig {
        let config = ClientTlsConfig::new().domain_name(self.domain.clone());
        match &self.ca_cert {
            Some(ca) => config.ca_certificate(Certificate::from_pem(ca)),
            None => config.with_native_roots(),
        }
    }
}

#[cfg(test)]
mod tests {
    use std::io::Write;

    use super::*;

    fn self_signed() -> (String, String) {
        let certified = rcgen::generate_simple_self_signed(vec!["localhost".to_string()]).unwrap();
        (certified.cert.pem(), certified.key_pair.serialize_pem())
    }

    fn write(dir: &tempfile::TempDir, name: &str, contents: &str) -> PathBuf {
        let path = dir.path().join(name);
        let mut file = fs::File::create(&path).unwrap();
        file.write_all(contents.as_bytes()).unwrap();
        path
    }

    #[test]
    fn loads_identity_from_files() {
        let (cert, key) = self_signed();
        let dir = tempfile::tempdir().unwrap();
        let cert_path = write(&dir, "server.crt", &cert);
        let key_path = write(&dir, "server.key", &key);

        let tls = ServerTls::from_files(&cert_path, &key_path).unwrap();
        let _config = tls.server_config();
        assert!(!format!("{tls:?}").contains("PRIVATE KEY"));
    }

    #[test]
    fn missing_file_is_read_error() {
        let dir = tempfile::tempdir().unwrap();
        let err = ServerTls::from_files(dir.path().join("nope.crt"), dir.path().join("nope.key"))
            .unwrap_err();
        assert!(matches!(err, TlsError::Read { .. }));
    }

    #[test]
    fn non_pem_file_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let path = write(&dir, "ca.crt", "definitely not a certificate");
        let err = ClientTls::from_ca_file(&path, "localhost").unwrap_err();
        assert!(matches!(err, TlsError::NotPem(_)));
    }

    #[test]
    fn loads_client_trust_anchor() {
        let (cert, _) = self_signed();
        let dir = tempfile::tempdir().unwrap();
        let path = write(&dir, "ca.crt", &cert);

        let tls = ClientTls::from_ca_file(&path, "localhost").unwrap();
        let _config = tls.client_config();
        let _native = ClientTls::native_roots("localhost").client_config();
    }
}
