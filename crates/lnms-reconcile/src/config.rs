// ── Runtime connection configuration ──
//
// Describes how to reach a LibreNMS instance. Carries the API token and
// transport tuning but never touches disk; `lnms-config` builds one from
// a profile.

use std::path::PathBuf;
use std::time::Duration;

use secrecy::SecretString;
use url::Url;

use lnms_api::transport::{TlsMode, TransportConfig};
use lnms_api::NmsClient;

/// TLS verification strategy.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum TlsVerification {
    /// System CA store (strict).
    #[default]
    SystemDefaults,
    /// Custom CA certificate file.
    CustomCa(PathBuf),
    /// Skip verification (self-signed certs).
    DangerAcceptInvalid,
}

/// Configuration for talking to a single LibreNMS instance.
#[derive(Debug, Clone)]
pub struct ConnectionConfig {
    /// Instance URL (e.g. `https://librenms.example.net`). `/api/v0/` is
    /// appended when missing.
    pub url: Url,
    /// Value of the `X-Auth-Token` header.
    pub token: Option<SecretString>,
    pub tls: TlsVerification,
    pub timeout: Duration,
}

impl ConnectionConfig {
    pub fn new(url: Url, token: SecretString) -> Self {
        Self {
            url,
            token: Some(token),
            tls: TlsVerification::default(),
            timeout: Duration::from_secs(30),
        }
    }

    pub fn build_transport(&self) -> TransportConfig {
        TransportConfig {
            tls: tls_to_transport(&self.tls),
            timeout: self.timeout,
        }
    }

    /// Build the HTTP client. Without a token, requests go out
    /// unauthenticated.
    pub fn build_client(&self) -> Result<NmsClient, lnms_api::Error> {
        let transport = self.build_transport();
        match &self.token {
            Some(token) => NmsClient::from_token(self.url.as_str(), token, &transport),
            None => NmsClient::from_reqwest(self.url.as_str(), transport.build_client()?),
        }
    }
}

fn tls_to_transport(tls: &TlsVerification) -> TlsMode {
    match tls {
        TlsVerification::SystemDefaults => TlsMode::System,
        TlsVerification::CustomCa(path) => TlsMode::CustomCa(path.clone()),
        TlsVerification::DangerAcceptInvalid => TlsMode::DangerAcceptInvalid,
    }
}
